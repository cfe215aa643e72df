//! The retry-once-uncached fallback for statements the server refuses to
//! cache, and the statement-cache behavior around it.

mod support;

use mssql_odbc::prelude::*;
use support::{MockTransport, statement_error};

fn opts() -> QueryOptions {
    QueryOptions::default()
}

fn feature_rejected() -> Error {
    Error::FeatureNotSupported("server-side statement caching rejected".into())
}

#[tokio::test]
async fn healthy_connection_falls_back_to_uncached() {
    let (transport, script) = MockTransport::scripted();
    let mut conn = Connection::from_transport(transport);
    script.lock().prepare.push_back(Err(feature_rejected()));

    let statement = Statement::cached("q1", "SELECT 1");
    let result = conn
        .prepare_execute(&statement, &[], &opts())
        .await
        .expect("fallback should succeed");
    assert_eq!(result.row_count(), 0);

    // One rejected cached prepare, one uncached retry, one execute.
    assert_eq!(script.calls_named("prepare:SELECT 1"), 2);
    assert_eq!(script.calls_named("execute:"), 1);
    assert_eq!(conn.status(), ConnectionStatus::Ok);
}

#[tokio::test]
async fn known_bad_connection_surfaces_the_original_error() {
    let (transport, script) = MockTransport::scripted();
    let mut conn = Connection::from_transport(transport);

    // Drive the connection into error status organically: a failing
    // statement whose rollback also fails leaves the transaction in doubt.
    conn.begin().await.unwrap();
    {
        let mut s = script.lock();
        s.execute
            .push_back(Err(statement_error(547, "constraint violated")));
        s.rollback
            .push_back(Err(statement_error(3903, "rollback failed")));
    }
    let err = conn
        .query("INSERT INTO t VALUES (1)", &[], &opts())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Statement { code: 547, .. }));
    assert_eq!(conn.status(), ConnectionStatus::Error);

    // Now the server rejects the cached path: no retry, original error.
    script.lock().prepare.push_back(Err(feature_rejected()));
    let prepares_before = script.calls_named("prepare:");
    let statement = Statement::cached("q1", "SELECT 1");
    let err = conn
        .prepare_execute(&statement, &[], &opts())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::FeatureNotSupported(_)));
    assert_eq!(script.calls_named("prepare:"), prepares_before + 1);
}

#[tokio::test]
async fn cached_statement_reuses_the_prepared_handle() {
    let (transport, script) = MockTransport::scripted();
    let mut conn = Connection::from_transport(transport);

    let statement = Statement::cached("lookup", "SELECT x FROM t WHERE id = ?");
    conn.prepare_execute(&statement, &[Value::Int(1)], &opts())
        .await
        .unwrap();
    conn.prepare_execute(&statement, &[Value::Int(2)], &opts())
        .await
        .unwrap();

    assert_eq!(script.calls_named("prepare:"), 1);
    assert_eq!(script.calls_named("execute:"), 2);
}

#[tokio::test]
async fn execute_time_rejection_also_falls_back_and_evicts() {
    let (transport, script) = MockTransport::scripted();
    let mut conn = Connection::from_transport(transport);
    script.lock().execute.push_back(Err(feature_rejected()));

    let statement = Statement::cached("q1", "SELECT 1");
    conn.prepare_execute(&statement, &[], &opts())
        .await
        .expect("fallback should succeed");
    assert_eq!(script.calls_named("prepare:"), 2);
    assert_eq!(script.calls_named("execute:"), 2);

    // The rejected handle was evicted, so the next call prepares again.
    conn.prepare_execute(&statement, &[], &opts()).await.unwrap();
    assert_eq!(script.calls_named("prepare:"), 3);
}

#[tokio::test]
async fn one_shot_statements_are_never_cached() {
    let (transport, script) = MockTransport::scripted();
    let mut conn = Connection::from_transport(transport);

    conn.query("SELECT 1", &[], &opts()).await.unwrap();
    conn.query("SELECT 1", &[], &opts()).await.unwrap();
    assert_eq!(script.calls_named("prepare:"), 2);
}

#[tokio::test]
async fn cache_statement_option_selects_the_cached_path() {
    let (transport, script) = MockTransport::scripted();
    let mut conn = Connection::from_transport(transport);

    let options = QueryOptions::default().with_cache_statement("q1");
    conn.query("SELECT 1", &[], &options).await.unwrap();
    conn.query("SELECT 1", &[], &options).await.unwrap();
    assert_eq!(script.calls_named("prepare:"), 1);
}
