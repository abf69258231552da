use sql_session::prelude::*;

#[test]
fn file_backed_sessions_persist_across_connects() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.db");
    let config = SessionConfig::new(path.to_string_lossy().into_owned()).with_wal(true);

    {
        let session = config.connect().unwrap();
        session.exec("CREATE TABLE t (v INTEGER)").unwrap();
        session.exec("INSERT INTO t VALUES (41)").unwrap();
    }

    let session = config.connect().unwrap();
    let res = session.query("SELECT v FROM t").unwrap();
    assert_eq!(*res.results[0].get("v").unwrap().as_int().unwrap(), 41);
}

#[test]
fn read_only_sessions_reject_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ro.db");
    let writable = SessionConfig::new(path.to_string_lossy().into_owned());
    writable
        .connect()
        .unwrap()
        .exec("CREATE TABLE t (v INTEGER)")
        .unwrap();

    let session = writable.with_read_only(true).connect().unwrap();
    assert!(session.exec("INSERT INTO t VALUES (1)").is_err());
    assert!(session.has_error());
}

#[test]
fn missing_database_without_create_is_a_connection_fault() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.db");
    let err = SessionConfig::new(path.to_string_lossy().into_owned())
        .with_create_if_missing(false)
        .connect();
    assert!(matches!(err, Err(SessionError::ConnectionError(_))));
}

#[test]
fn config_deserializes_with_defaults() {
    let config: SessionConfig = serde_json::from_str(r#"{"path": "app.db"}"#).unwrap();
    assert_eq!(config.path, "app.db");
    assert!(config.create_if_missing);
    assert!(!config.read_only);
    assert!(!config.wal);
}

#[test]
fn collection_hands_out_named_sessions() {
    let collection: ConnectionCollection = [
        ConnectionHolder::new("main", SessionConfig::in_memory()),
        ConnectionHolder::new("audit", SessionConfig::in_memory()),
    ]
    .into_iter()
    .collect();

    let main = collection.get("main").unwrap().session().unwrap();
    main.exec("CREATE TABLE only_main (v INTEGER)").unwrap();

    // Distinct holders open distinct databases.
    let audit = collection.get("audit").unwrap().session().unwrap();
    assert!(audit.query("SELECT * FROM only_main").is_err());

    // The same holder hands out the same session.
    let again = collection.get("main").unwrap().session().unwrap();
    assert!(again.query("SELECT * FROM only_main").is_ok());
}
