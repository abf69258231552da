//! Named-placeholder rewriting.
//!
//! A query that mentions `:name` more than once cannot be handed to the
//! native driver as-is when each mention needs its own bound slot. The
//! rewriter renames the 1st..kth occurrence of every repeated name to
//! `:name1`..`:namek` and reports the multiplicity of every placeholder so
//! the binding layer can fan values out.

use std::collections::HashMap;

mod scanner;

use scanner::{
    State, is_block_comment_end, is_block_comment_start, is_line_comment_start, scan_placeholder,
};

/// Output of [`rewrite`]: the (possibly) renamed SQL plus the multiplicity of
/// every named placeholder it found, including count-1 entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenQuery {
    pub sql: String,
    pub expected: HashMap<String, usize>,
}

/// Rewrite repeated named placeholders into uniquely numbered ones.
///
/// Placeholders are `:` followed by a non-digit word character and any
/// further word characters; a `:%` prefix (format specifier) is ignored.
/// String literals, quoted identifiers, and comments are skipped via a
/// lightweight state machine, so `:word` text inside them is never renamed.
/// Names occurring once are left textually unchanged; a name occurring k>1
/// times has each occurrence, left to right, suffixed with its 1-based
/// index. Pure and deterministic, so the result can be cached per query
/// text.
#[must_use]
pub fn rewrite(sql: &str) -> RewrittenQuery {
    let bytes = sql.as_bytes();
    let mut spans: Vec<(usize, usize, &str)> = Vec::new();
    let mut state = State::Normal;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b'`' => state = State::BacktickQuoted,
                b'[' => state = State::BracketQuoted,
                _ if is_line_comment_start(bytes, idx) => state = State::LineComment,
                _ if is_block_comment_start(bytes, idx) => state = State::BlockComment(1),
                b':' => {
                    if bytes.get(idx + 1) == Some(&b':') {
                        // cast operator, not a placeholder
                        idx += 2;
                        continue;
                    }
                    if let Some((name, end)) = scan_placeholder(bytes, idx + 1) {
                        spans.push((idx, end, name));
                        idx = end;
                        continue;
                    }
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::BacktickQuoted => {
                if b == b'`' {
                    if bytes.get(idx + 1) == Some(&b'`') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::BracketQuoted => {
                if b == b']' {
                    state = State::Normal;
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                } else if is_block_comment_end(bytes, idx) {
                    if depth == 1 {
                        state = State::Normal;
                    } else {
                        state = State::BlockComment(depth - 1);
                    }
                }
            }
        }
        idx += 1;
    }

    let mut expected: HashMap<String, usize> = HashMap::new();
    for (_, _, name) in &spans {
        *expected.entry((*name).to_string()).or_insert(0) += 1;
    }

    if spans
        .iter()
        .all(|(_, _, name)| expected.get(*name).copied() == Some(1))
    {
        return RewrittenQuery {
            sql: sql.to_string(),
            expected,
        };
    }

    let mut out = String::with_capacity(sql.len() + spans.len() * 2);
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut last = 0;
    for (start, end, name) in &spans {
        out.push_str(&sql[last..*start]);
        out.push(':');
        out.push_str(name);
        if expected.get(*name).copied().unwrap_or(0) > 1 {
            let occurrence = seen.entry(*name).or_insert(0);
            *occurrence += 1;
            out.push_str(&occurrence.to_string());
        }
        last = *end;
    }
    out.push_str(&sql[last..]);

    RewrittenQuery { sql: out, expected }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_occurrence_is_unchanged() {
        let res = rewrite("SELECT * FROM t WHERE id = :id");
        assert_eq!(res.sql, "SELECT * FROM t WHERE id = :id");
        assert_eq!(res.expected.get("id"), Some(&1));
    }

    #[test]
    fn repeats_are_numbered_left_to_right() {
        let res = rewrite("SELECT * FROM t WHERE a = :v OR b = :v");
        assert_eq!(res.sql, "SELECT * FROM t WHERE a = :v1 OR b = :v2");
        assert_eq!(res.expected.get("v"), Some(&2));
    }

    #[test]
    fn triple_repeat_produces_three_variants() {
        let res = rewrite("INSERT INTO t VALUES (:x, :x, :x)");
        assert_eq!(res.sql, "INSERT INTO t VALUES (:x1, :x2, :x3)");
        assert_eq!(res.expected.get("x"), Some(&3));
    }

    #[test]
    fn mixed_names_only_repeated_ones_change() {
        let res = rewrite("UPDATE t SET a = :a, b = :b WHERE a = :a");
        assert_eq!(res.sql, "UPDATE t SET a = :a1, b = :b WHERE a = :a2");
        assert_eq!(res.expected.get("a"), Some(&2));
        assert_eq!(res.expected.get("b"), Some(&1));
    }

    #[test]
    fn skips_literals_and_comments() {
        let sql = "SELECT ':v' FROM t WHERE a = :v -- :v\n/* :v */ OR b = :v";
        let res = rewrite(sql);
        assert_eq!(
            res.sql,
            "SELECT ':v' FROM t WHERE a = :v1 -- :v\n/* :v */ OR b = :v2"
        );
        assert_eq!(res.expected.get("v"), Some(&2));
    }

    #[test]
    fn skips_quoted_identifiers() {
        let sql = r#"SELECT ":v", `:v`, [:v] FROM t WHERE a = :v"#;
        let res = rewrite(sql);
        assert_eq!(res.sql, sql);
        assert_eq!(res.expected.get("v"), Some(&1));
    }

    #[test]
    fn ignores_format_specifiers_and_casts() {
        let res = rewrite("SELECT strftime(':%s', c), x::int FROM t WHERE a = :a");
        assert_eq!(res.expected.len(), 1);
        assert_eq!(res.expected.get("a"), Some(&1));
    }

    #[test]
    fn leading_digit_is_not_a_name() {
        let res = rewrite("SELECT * FROM t WHERE a = :1");
        assert!(res.expected.is_empty());
        assert_eq!(res.sql, "SELECT * FROM t WHERE a = :1");
    }

    #[test]
    fn word_boundary_is_respected() {
        // :id and :idx are distinct names; neither repeats.
        let res = rewrite("SELECT * FROM t WHERE a = :id AND b = :idx");
        assert_eq!(res.sql, "SELECT * FROM t WHERE a = :id AND b = :idx");
        assert_eq!(res.expected.get("id"), Some(&1));
        assert_eq!(res.expected.get("idx"), Some(&1));
    }

    #[test]
    fn is_deterministic() {
        let sql = "SELECT * FROM t WHERE a = :v OR b = :v OR c = :w";
        assert_eq!(rewrite(sql), rewrite(sql));
    }
}
