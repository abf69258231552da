use sql_session::prelude::*;

fn session() -> Session {
    let session = SessionConfig::in_memory().connect().unwrap();
    session
        .exec("CREATE TABLE items (id INTEGER PRIMARY KEY, label TEXT)")
        .unwrap();
    session
        .exec("INSERT INTO items (id, label) VALUES (7, 'seven'), (8, 'eight')")
        .unwrap();
    session
}

#[test]
fn identical_query_and_options_share_one_statement() {
    let session = session();

    let first = session.prepare("SELECT * FROM items WHERE id = :id").unwrap();
    let second = session.prepare("SELECT * FROM items WHERE id = :id").unwrap();
    assert_eq!(first, second);
    assert_eq!(session.statement_cache_len(), 1);
}

#[test]
fn different_options_produce_a_distinct_statement() {
    let session = session();
    let query = "SELECT * FROM items WHERE id = :id";

    let cached = session.prepare(query).unwrap();
    let raw = session
        .prepare_with_options(query, StatementOptions::default().with_rewrite(RewriteMode::Off))
        .unwrap();
    assert_ne!(cached, raw);
    assert_eq!(session.statement_cache_len(), 2);
}

#[test]
fn bypass_never_touches_the_cache() {
    let session = session();
    let query = "SELECT * FROM items WHERE id = :id";

    let cached = session.prepare(query).unwrap();
    let bypassed = session
        .prepare_with_options(query, StatementOptions::default().with_cache(CachePolicy::Bypass))
        .unwrap();
    assert_ne!(cached, bypassed);
    assert_eq!(session.statement_cache_len(), 1);
}

#[test]
fn clearing_the_cache_forces_a_fresh_statement() {
    let session = session();
    let query = "SELECT * FROM items WHERE id = :id";

    let before = session.prepare(query).unwrap();
    session.clear_statement_cache();
    assert_eq!(session.statement_cache_len(), 0);

    let after = session.prepare(query).unwrap();
    assert_ne!(before, after);
}

#[test]
fn expected_multiplicities_are_reapplied_on_every_prepare() {
    let session = session();
    let query = "SELECT * FROM items WHERE id = :v OR label = :v";

    let first = session.prepare(query).unwrap();
    assert_eq!(first.expected_parameters().get("v"), Some(&2));
    assert_eq!(first.sql(), "SELECT * FROM items WHERE id = :v1 OR label = :v2");

    let second = session.prepare(query).unwrap();
    assert_eq!(second, first);
    assert_eq!(second.expected_parameters().get("v"), Some(&2));
}

#[test]
fn prepare_failure_is_captured() {
    let session = session();
    let err = session.prepare("SELECT FROM");
    assert!(matches!(err, Err(SessionError::PreparationError(_))));
    assert!(session.has_error());
}

#[test]
fn registry_defaults_bind_at_prepare_time() {
    let session = session();
    session.bind_value("id", ParamValue::Int(7), ParamType::Int, NullPolicy::None);

    let stmt = session.prepare("SELECT label FROM items WHERE id = :id").unwrap();
    stmt.execute().unwrap();
    assert_eq!(
        stmt.fetch_column_value(None),
        Some(ParamValue::Text("seven".into()))
    );
}

#[test]
fn registry_defaults_can_be_overridden_per_statement() {
    let session = session();
    session.bind_value("id", ParamValue::Int(7), ParamType::Int, NullPolicy::None);

    let stmt = session.prepare("SELECT label FROM items WHERE id = :id").unwrap();
    stmt.bind_value("id", ParamValue::Int(8), ParamType::Int, NullPolicy::None)
        .unwrap();
    stmt.execute().unwrap();
    assert_eq!(
        stmt.fetch_column_value(None),
        Some(ParamValue::Text("eight".into()))
    );
}

#[test]
fn unbound_registry_entries_stop_applying() {
    let session = session();
    session.bind_value("id", ParamValue::Int(7), ParamType::Int, NullPolicy::None);
    assert!(session.unbind_value("id"));
    assert!(!session.unbind_value("id"));

    let stmt = session.prepare("SELECT label FROM items WHERE id = :id").unwrap();
    stmt.execute().unwrap();
    // No default bound: the placeholder stays NULL and matches nothing.
    assert_eq!(stmt.fetch_column_value(None), None);
}

#[test]
fn registry_defaults_fan_out_over_repeated_placeholders() {
    let session = session();
    session.bind_value("v", ParamValue::Int(8), ParamType::Int, NullPolicy::None);

    let stmt = session
        .prepare("SELECT label FROM items WHERE id = :v OR id = :v")
        .unwrap();
    stmt.execute().unwrap();
    assert_eq!(
        stmt.fetch_column_value(None),
        Some(ParamValue::Text("eight".into()))
    );
}
