use rollcall_db::{create_pool, run_migrations, DbRuntimeSettings};

#[test]
fn pooled_connections_share_migrated_schema() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("registry.db");
    let pool = create_pool(
        path.to_str().expect("utf-8 path"),
        DbRuntimeSettings::default(),
    )
    .expect("failed to create pool");

    {
        let conn = pool.get().expect("failed to get connection");
        let applied = run_migrations(&conn).expect("failed to run migrations");
        assert!(applied > 0);
    }

    // A second checkout must see the tables created through the first.
    let first = pool.get().expect("failed to get first connection");
    let second = pool.get().expect("failed to get second connection");
    for conn in [&first, &second] {
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))
            .expect("events table should be visible");
        assert_eq!(count, 0);
    }
}

#[test]
fn reopening_a_migrated_file_applies_nothing() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("registry.db");
    let path = path.to_str().expect("utf-8 path");

    {
        let pool = create_pool(path, DbRuntimeSettings::default()).expect("pool");
        let conn = pool.get().expect("conn");
        run_migrations(&conn).expect("first migration run");
    }

    let pool = create_pool(path, DbRuntimeSettings::default()).expect("pool");
    let conn = pool.get().expect("conn");
    assert_eq!(run_migrations(&conn).expect("second migration run"), 0);
}
