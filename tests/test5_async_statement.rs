use std::sync::{Arc, Mutex};

use sqlite_service::{Connection, ErrorKind};

#[tokio::test]
async fn async_prepare_then_fetch_a_typed_row() {
    let conn = Connection::new().expect("spawn worker");
    conn.open(":memory:").await.expect("open");

    let mut stmt = conn.prepare("SELECT 1, 2, 3").await;
    assert!(stmt.error().is_none());
    assert_eq!(stmt.last_error(), "");

    let row: Option<(i64, i64, i64)> = stmt.fetch_next().await.expect("fetch");
    assert_eq!(row, Some((1, 2, 3)));

    let row: Option<(i64, i64, i64)> = stmt.fetch_next().await.expect("end of rows");
    assert_eq!(row, None);
}

#[tokio::test]
async fn async_prepare_failure_lands_in_the_statement_error_state() {
    let conn = Connection::new().expect("spawn worker");
    conn.open(":memory:").await.expect("open");

    let mut stmt = conn.prepare("I dont know what I am doing").await;
    let err = stmt.error().expect("prepare failure recorded");
    assert_eq!(err.kind(), ErrorKind::SyntaxError);
    assert!(stmt.last_error().contains("syntax error"), "{err}");

    let outcome = stmt.fetch_next::<(i64,)>().await;
    let err = outcome.expect_err("fetch on errored statement");
    assert_eq!(err.kind(), ErrorKind::SyntaxError);
}

#[tokio::test]
async fn prepare_before_open_records_a_logic_error() {
    let conn = Connection::new().expect("spawn worker");
    let stmt = conn.prepare("SELECT 1").await;
    assert_eq!(
        stmt.error().expect("no open connection").kind(),
        ErrorKind::LogicError
    );
}

#[tokio::test]
async fn completions_arrive_in_submission_order() {
    let conn = Connection::new().expect("spawn worker");
    conn.open(":memory:").await.expect("open");
    conn.exec("CREATE TABLE log (label TEXT)").await.expect("ddl");

    let order: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

    let a = {
        let conn = conn.clone();
        let order = Arc::clone(&order);
        async move {
            conn.exec("INSERT INTO log (label) VALUES ('a')")
                .await
                .expect("insert a");
            order.lock().expect("lock").push("a");
        }
    };
    let b = {
        let conn = conn.clone();
        let order = Arc::clone(&order);
        async move {
            conn.exec("INSERT INTO log (label) VALUES ('b')")
                .await
                .expect("insert b");
            order.lock().expect("lock").push("b");
        }
    };

    // join! polls a first, so a's command is enqueued before b's; the FIFO
    // worker then finishes a before it starts b.
    tokio::join!(a, b);

    let observed = order.lock().expect("lock").clone();
    assert_eq!(observed, vec!["a", "b"], "each completion fired exactly once, in order");

    // The worker executed the inserts in the same order.
    let mut stmt = conn.prepare("SELECT label FROM log ORDER BY rowid").await;
    let first: Option<(String,)> = stmt.fetch_next().await.expect("row 1");
    let second: Option<(String,)> = stmt.fetch_next().await.expect("row 2");
    let rest: Option<(String,)> = stmt.fetch_next().await.expect("end");
    assert_eq!(first, Some(("a".to_owned(),)));
    assert_eq!(second, Some(("b".to_owned(),)));
    assert_eq!(rest, None);
}

#[tokio::test]
async fn fetch_next_conversion_failure_is_an_explicit_error() {
    let conn = Connection::new().expect("spawn worker");
    conn.open(":memory:").await.expect("open");

    let mut stmt = conn.prepare("SELECT 3000000000").await;
    let err = stmt
        .fetch_next::<(i32,)>()
        .await
        .expect_err("overflow must not truncate");
    assert_eq!(err.kind(), ErrorKind::ConversionFailure);
}
