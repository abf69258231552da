use sql_session::prelude::*;

fn session() -> Session {
    let session = SessionConfig::in_memory().connect().unwrap();
    session.exec("CREATE TABLE entries (v INTEGER)").unwrap();
    session
}

fn count(session: &Session) -> i64 {
    let res = session.query("SELECT COUNT(*) AS n FROM entries").unwrap();
    *res.results[0].get("n").unwrap().as_int().unwrap()
}

#[test]
fn nested_begin_commit_commits_once() {
    let session = session();

    session.begin().unwrap();
    assert_eq!(session.transaction_depth(), 1);
    session.exec("INSERT INTO entries VALUES (1)").unwrap();

    session.begin().unwrap();
    assert_eq!(session.transaction_depth(), 2);
    session.exec("INSERT INTO entries VALUES (2)").unwrap();

    session.commit().unwrap();
    assert_eq!(session.transaction_depth(), 1);
    session.commit().unwrap();
    assert_eq!(session.transaction_depth(), 0);
    assert!(!session.in_transaction());

    assert_eq!(count(&session), 2);
}

#[test]
fn inner_rollback_keeps_outer_work() {
    let session = session();

    session.begin().unwrap();
    session.exec("INSERT INTO entries VALUES (1)").unwrap();

    session.begin().unwrap();
    session.exec("INSERT INTO entries VALUES (2)").unwrap();
    session.rollback().unwrap();
    assert_eq!(session.transaction_depth(), 1);

    session.commit().unwrap();
    assert_eq!(count(&session), 1);
}

#[test]
fn outer_rollback_discards_everything() {
    let session = session();

    session.begin().unwrap();
    session.exec("INSERT INTO entries VALUES (1)").unwrap();
    session.begin().unwrap();
    session.exec("INSERT INTO entries VALUES (2)").unwrap();

    session.rollback().unwrap();
    session.rollback().unwrap();
    assert_eq!(session.transaction_depth(), 0);
    assert_eq!(count(&session), 0);
}

#[test]
fn rollback_without_transaction_is_a_usage_error() {
    let session = session();
    let err = session.rollback();
    assert!(matches!(err, Err(SessionError::UsageError(_))));
    assert_eq!(session.transaction_depth(), 0);
}

#[test]
fn commit_without_transaction_is_a_no_op() {
    let session = session();
    session.commit().unwrap();
    assert_eq!(session.transaction_depth(), 0);
}

#[test]
fn flagged_error_forces_rollback_at_commit() {
    let session = session();

    session.begin().unwrap();
    session.exec("INSERT INTO entries VALUES (1)").unwrap();

    // Statement failure inside the transaction raises the sticky flag.
    assert!(session.exec("INSERT INTO missing_table VALUES (1)").is_err());
    assert!(session.has_error());

    // Intervening statements may still succeed...
    session.exec("INSERT INTO entries VALUES (2)").unwrap();

    // ...but the outermost commit must roll back, then clear the flag.
    let err = session.commit();
    assert!(matches!(err, Err(SessionError::ExecutionError(_))));
    assert!(!session.has_error());
    assert_eq!(session.transaction_depth(), 0);
    assert_eq!(count(&session), 0);
}

#[test]
fn flagged_error_inside_nested_level_still_rolls_back_outermost() {
    let session = session();

    session.begin().unwrap();
    session.exec("INSERT INTO entries VALUES (1)").unwrap();

    session.begin().unwrap();
    assert!(session.exec("bogus sql").is_err());
    // The nested commit releases its savepoint and "succeeds" logically.
    session.commit().unwrap();

    assert!(session.commit().is_err());
    assert_eq!(count(&session), 0);
}

#[test]
fn error_flag_clears_after_explicit_outer_rollback() {
    let session = session();

    session.begin().unwrap();
    assert!(session.exec("bogus sql").is_err());
    assert!(session.has_error());

    session.rollback().unwrap();
    assert!(!session.has_error());
    assert_eq!(session.transaction_depth(), 0);
}

#[test]
fn work_after_commit_is_durable_across_transactions() {
    let session = session();

    session.begin().unwrap();
    session.exec("INSERT INTO entries VALUES (1)").unwrap();
    session.commit().unwrap();

    session.begin().unwrap();
    session.exec("INSERT INTO entries VALUES (2)").unwrap();
    session.rollback().unwrap();

    assert_eq!(count(&session), 1);
}
