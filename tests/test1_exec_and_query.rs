use sql_session::prelude::*;

fn session() -> Session {
    let session = SessionConfig::in_memory().connect().unwrap();
    session
        .exec("CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT, age INTEGER)")
        .unwrap();
    session
}

#[test]
fn exec_reports_affected_rows() {
    let session = session();
    let n = session
        .exec("INSERT INTO people (name, age) VALUES ('alice', 30), ('bob', 41)")
        .unwrap();
    assert_eq!(n, 2);
    assert_eq!(session.last_insert_rowid(), 2);
}

#[test]
fn query_materializes_rows() {
    let session = session();
    session
        .exec("INSERT INTO people (name, age) VALUES ('alice', 30), ('bob', 41)")
        .unwrap();

    let res = session.query("SELECT id, name, age FROM people ORDER BY id").unwrap();
    assert_eq!(res.len(), 2);
    assert_eq!(res.results[0].get("name").unwrap().as_text().unwrap(), "alice");
    assert_eq!(*res.results[1].get("age").unwrap().as_int().unwrap(), 41);
    // Index access works alongside name access.
    assert_eq!(*res.results[0].get_by_index(0).unwrap().as_int().unwrap(), 1);
}

#[test]
fn run_accepts_only_safe_fetch_modes() {
    let session = session();
    session
        .exec("INSERT INTO people (name, age) VALUES ('alice', 30)")
        .unwrap();

    for mode in [FetchMode::Assoc, FetchMode::Num, FetchMode::Both] {
        let res = session.run("SELECT * FROM people", mode).unwrap();
        assert_eq!(res.len(), 1);
    }

    let err = session.run("SELECT * FROM people", FetchMode::Column);
    assert!(matches!(err, Err(SessionError::UsageError(_))));
    // A usage fault is rejected before the driver; it is not an execution
    // error and does not raise the sticky flag.
    assert!(!session.has_error());
}

#[test]
fn exec_failure_raises_the_error_flag() {
    let session = session();
    let err = session.exec("INSERT INTO missing_table VALUES (1)");
    assert!(matches!(err, Err(SessionError::ExecutionError(_))));
    assert!(session.has_error());

    session.clear_error();
    assert!(!session.has_error());
}

#[test]
fn query_failure_raises_the_error_flag() {
    let session = session();
    let err = session.query("SELECT nope FROM missing_table");
    assert!(matches!(err, Err(SessionError::ExecutionError(_))));
    assert!(session.has_error());
}

#[test]
fn mark_error_is_manual_override() {
    let session = session();
    assert!(!session.has_error());
    session.mark_error();
    assert!(session.has_error());
}
