use sqlite_service::{Connection, ErrorKind};

#[tokio::test]
async fn fetch_before_open_is_a_logic_error() {
    let conn = Connection::new().expect("spawn worker");
    let err = conn.fetch("SELECT 1").await.expect_err("no open handle");
    assert_eq!(err.kind(), ErrorKind::LogicError);
}

#[tokio::test]
async fn fetch_validates_a_simple_select() {
    let conn = Connection::new().expect("spawn worker");
    conn.open(":memory:").await.expect("open");
    conn.fetch("SELECT 1").await.expect("select one row");
}

#[tokio::test]
async fn fetch_drains_multiple_rows() {
    let conn = Connection::new().expect("spawn worker");
    conn.open(":memory:").await.expect("open");
    conn.fetch("SELECT 1 UNION SELECT 2 UNION SELECT 3")
        .await
        .expect("three-row union");
}

#[tokio::test]
async fn fetch_reports_malformed_sql() {
    let conn = Connection::new().expect("spawn worker");
    conn.open(":memory:").await.expect("open");
    let err = conn
        .fetch("I dont know what I am doing")
        .await
        .expect_err("malformed SQL");
    assert_eq!(err.kind(), ErrorKind::SyntaxError);
    assert!(err.message().contains("syntax error"), "{err}");
}

#[test]
fn blocking_fetch_matches_async_surface() {
    let conn = Connection::new().expect("spawn worker");
    assert!(conn.fetch_blocking("SELECT 1").is_err());
    conn.open_blocking(":memory:").expect("open");
    conn.fetch_blocking("SELECT 1").expect("select");
}
