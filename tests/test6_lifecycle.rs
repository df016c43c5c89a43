use sqlite_service::Connection;
use tempfile::tempdir;

#[tokio::test]
async fn dropping_the_connection_drains_work_and_releases_the_file() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("lifecycle.db");
    let url = path.to_string_lossy().into_owned();

    let conn = Connection::new().expect("spawn worker");
    conn.open(&url).await.expect("open file db");
    conn.exec("CREATE TABLE t (v INTEGER)").await.expect("ddl");
    conn.exec("INSERT INTO t (v) VALUES (7)").await.expect("dml");
    drop(conn); // joins the worker thread and closes the engine handle

    // A fresh connection sees the committed data; the old handle is gone.
    let conn = Connection::new().expect("spawn worker");
    conn.open(&url).await.expect("reopen file db");
    let mut stmt = conn.prepare("SELECT v FROM t").await;
    let row: Option<(i64,)> = stmt.fetch_next().await.expect("fetch");
    assert_eq!(row, Some((7,)));
}

#[tokio::test]
async fn a_statement_keeps_its_connection_worker_alive() {
    let conn = Connection::new().expect("spawn worker");
    conn.open(":memory:").await.expect("open");
    let mut stmt = conn.prepare("SELECT 7").await;
    drop(conn);

    // The statement shares ownership of the worker, so the engine handle is
    // still valid here.
    let row: Option<(i64,)> = stmt.fetch_next().await.expect("fetch");
    assert_eq!(row, Some((7,)));
}

#[tokio::test]
async fn each_connection_gets_its_own_worker() {
    let mut conns = Vec::new();
    for _ in 0..3 {
        let conn = Connection::new().expect("spawn worker");
        conn.open(":memory:").await.expect("open");
        conn.exec("CREATE TABLE t (v INTEGER)").await.expect("ddl");
        conns.push(conn);
    }
    for conn in &conns {
        conn.exec("INSERT INTO t (v) VALUES (1)").await.expect("dml");
    }
}

#[test]
fn blocking_drop_also_joins_cleanly() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("blocking.db");
    let url = path.to_string_lossy().into_owned();

    let conn = Connection::new().expect("spawn worker");
    conn.open_blocking(&url).expect("open");
    conn.exec_blocking("CREATE TABLE t (v INTEGER)").expect("ddl");
    drop(conn);

    let conn = Connection::new().expect("spawn worker");
    conn.open_blocking(&url).expect("reopen");
    conn.fetch_blocking("SELECT v FROM t").expect("table exists");
}
