//! Bind-time multiplicity resolution and null-policy coercion.

use crate::error::SessionError;
use crate::session::lock;
use crate::types::{BindArg, Bound, NullPolicy, ParamKey, ParamType, ParamValue};

use super::{BoundParam, Statement, StatementState};

impl Statement {
    /// Bind a value (or sequence of values) to a placeholder.
    ///
    /// - A one-element sequence unwraps to its scalar.
    /// - A longer sequence fans out across the numbered variants of the
    ///   placeholder, cycling through its elements until the statement's
    ///   expected multiplicity is satisfied; returns the final fan-out
    ///   counter as [`Bound::Expanded`].
    /// - A scalar bound to a name the rewriter expanded k>1 times binds to
    ///   every `name1..namek` variant.
    /// - Otherwise the scalar goes through type-directed coercion (see
    ///   [`NullPolicy`]), is recorded in the input ledger, and is applied to
    ///   the native statement at execute time.
    ///
    /// # Errors
    /// Reserved for bind-time validation; the native bind itself happens at
    /// [`execute`](Self::execute), where unknown placeholders surface as
    /// [`SessionError::BindError`].
    pub fn bind_value(
        &self,
        param: impl Into<ParamKey>,
        value: impl Into<BindArg>,
        ty: ParamType,
        policy: NullPolicy,
    ) -> Result<Bound, SessionError> {
        self.bind_value_with_length(param, value, ty, policy, None)
    }

    /// [`bind_value`](Self::bind_value) with a maximum length for string
    /// values, applied before binding.
    ///
    /// # Errors
    /// See [`bind_value`](Self::bind_value).
    pub fn bind_value_with_length(
        &self,
        param: impl Into<ParamKey>,
        value: impl Into<BindArg>,
        ty: ParamType,
        policy: NullPolicy,
        length: Option<usize>,
    ) -> Result<Bound, SessionError> {
        let key = param.into();
        let arg = value.into();
        let mut state = lock(&self.inner.state);
        Ok(bind_into(&mut state, &key, arg, ty, policy, length))
    }
}

fn expected_of(state: &StatementState, key: &ParamKey) -> usize {
    match key {
        ParamKey::Name(name) => state.expected.get(name).copied().unwrap_or(0),
        ParamKey::Position(_) => 0,
    }
}

fn derived_key(key: &ParamKey, n: usize) -> ParamKey {
    match key {
        ParamKey::Name(name) => ParamKey::Name(format!("{name}{n}")),
        ParamKey::Position(position) => ParamKey::Position(position + n - 1),
    }
}

pub(super) fn bind_into(
    state: &mut StatementState,
    key: &ParamKey,
    arg: BindArg,
    ty: ParamType,
    policy: NullPolicy,
    length: Option<usize>,
) -> Bound {
    let arg = match arg {
        BindArg::Sequence(seq) if seq.len() == 1 => {
            BindArg::Scalar(seq.into_iter().next().unwrap_or(ParamValue::Null))
        }
        other => other,
    };

    match arg {
        BindArg::Sequence(seq) => {
            if seq.is_empty() {
                return Bound::Expanded(1);
            }
            let expected = expected_of(state, key);
            let mut n = 1usize;
            loop {
                for value in &seq {
                    let derived = derived_key(key, n);
                    bind_into(
                        state,
                        &derived,
                        BindArg::Scalar(value.clone()),
                        ty,
                        policy,
                        length,
                    );
                    n += 1;
                }
                if n > expected {
                    break;
                }
            }
            Bound::Expanded(n)
        }
        BindArg::Scalar(value) => {
            if let ParamKey::Name(name) = key {
                let multiplicity = state.expected.get(name).copied().unwrap_or(0);
                if multiplicity > 1 {
                    let mut last = Bound::Single;
                    for n in 1..=multiplicity {
                        last = bind_into(
                            state,
                            &ParamKey::Name(format!("{name}{n}")),
                            BindArg::Scalar(value.clone()),
                            ty,
                            policy,
                            length,
                        );
                    }
                    return last;
                }
            }

            let (value, ty) = coerce(value, ty, policy, length);
            state.ledger.insert(
                key.clone(),
                BoundParam {
                    value: value.clone(),
                    ty,
                },
            );
            state.pending.insert(key.clone(), value);
            Bound::Single
        }
    }
}

/// Apply the declared type's null-policy coercion to a scalar.
///
/// Only `Int` and `Str` carry rules; every other declared type passes its
/// value through unchanged.
pub(crate) fn coerce(
    value: ParamValue,
    ty: ParamType,
    policy: NullPolicy,
    length: Option<usize>,
) -> (ParamValue, ParamType) {
    match ty {
        ParamType::Int => coerce_int(value, policy),
        ParamType::Str => coerce_str(value, policy, length),
        _ => (value, ty),
    }
}

fn coerce_int(value: ParamValue, policy: NullPolicy) -> (ParamValue, ParamType) {
    let is_empty_text = matches!(&value, ParamValue::Text(s) if s.is_empty());
    if int_cast(&value) == 0 && policy == NullPolicy::Force {
        (ParamValue::Null, ParamType::Null)
    } else if is_empty_text || (value.is_null() && policy == NullPolicy::Disallow) {
        (ParamValue::Int(0), ParamType::Int)
    } else if value.is_null() {
        (ParamValue::Null, ParamType::Null)
    } else {
        (ParamValue::Int(int_cast(&value)), ParamType::Int)
    }
}

fn coerce_str(
    value: ParamValue,
    policy: NullPolicy,
    length: Option<usize>,
) -> (ParamValue, ParamType) {
    let mut value = value;
    if policy == NullPolicy::Force && matches!(&value, ParamValue::Text(s) if s.is_empty()) {
        value = ParamValue::Null;
    } else if policy == NullPolicy::Disallow && value.is_null() {
        value = ParamValue::Text(String::new());
    } else if let Some(max) = length
        && !value.is_null()
    {
        value = ParamValue::Text(value.to_text().chars().take(max).collect());
    }

    if value.is_null() {
        (ParamValue::Null, ParamType::Null)
    } else {
        // Legacy callers double-escape; undo one backslash layer.
        (
            ParamValue::Text(strip_slashes(&value.to_text())),
            ParamType::Str,
        )
    }
}

fn int_cast(value: &ParamValue) -> i64 {
    match value {
        ParamValue::Int(i) => *i,
        ParamValue::Float(f) => *f as i64,
        ParamValue::Bool(b) => i64::from(*b),
        ParamValue::Text(s) => parse_leading_int(s),
        _ => 0,
    }
}

fn parse_leading_int(s: &str) -> i64 {
    let t = s.trim_start();
    let bytes = t.as_bytes();
    let mut end = 0;
    if bytes.first() == Some(&b'+') || bytes.first() == Some(&b'-') {
        end = 1;
    }
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    t[..end].parse::<i64>().unwrap_or(0)
}

fn strip_slashes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}
