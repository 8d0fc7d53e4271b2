//! Batching, threshold and shutdown behavior of the writer.

mod helpers;

use std::time::Duration;

use helpers::{hello, idle_dumper_config, wait_for, TestEnv};
use spillway::{DatabaseError, EventKind, Writer, WriterConfig};

#[tokio::test]
async fn test_threshold_flush_inserts_batch() {
    let env = TestEnv::new();
    env.create_table("CREATE TABLE events (test TEXT)").await;
    let writer = env.writer("events", 5, env.dumper(idle_dumper_config()).await).await;

    for _ in 0..5 {
        writer.submit(hello());
    }

    assert!(
        wait_for(Duration::from_secs(5), || env.count_events(EventKind::Inserted) == 1).await,
        "threshold flush should commit one batch"
    );
    assert_eq!(env.count_rows("events").await, 5);
    assert_eq!(writer.queued(), 0);

    writer.shutdown().await;
    assert_eq!(env.count_events(EventKind::Inserted), 1);
    assert!(env.artifacts().is_empty());
}

#[tokio::test]
async fn test_below_threshold_stays_queued() {
    let env = TestEnv::new();
    env.create_table("CREATE TABLE events (test TEXT)").await;
    let writer = env.writer("events", 5, env.dumper(idle_dumper_config()).await).await;

    for _ in 0..4 {
        writer.submit(hello());
    }

    assert!(wait_for(Duration::from_secs(5), || writer.queued() == 4).await);
    assert_eq!(env.count_rows("events").await, 0);
    writer.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_forces_final_flush() {
    let env = TestEnv::new();
    env.create_table("CREATE TABLE events (test TEXT)").await;
    let writer = env.writer("events", 100, env.dumper(idle_dumper_config()).await).await;

    for _ in 0..3 {
        writer.submit(hello());
    }
    writer.shutdown().await;

    assert_eq!(env.count_rows("events").await, 3);
    assert_eq!(writer.queued(), 0);
    assert!(writer.connection().is_closed());
}

#[tokio::test]
async fn test_records_still_in_intake_are_flushed_at_shutdown() {
    let env = TestEnv::new();
    env.create_table("CREATE TABLE events (test TEXT)").await;
    let writer = env.writer("events", 1000, env.dumper(idle_dumper_config()).await).await;

    // Shut down right away; most of these are still in the channel.
    for _ in 0..50 {
        writer.submit(hello());
    }
    writer.shutdown().await;

    assert_eq!(env.count_rows("events").await, 50);
}

#[tokio::test]
async fn test_shutdown_keeps_batch_size_for_pending_records() {
    let env = TestEnv::new();
    env.create_table("CREATE TABLE events (test TEXT)").await;
    let writer = env.writer("events", 2, env.dumper(idle_dumper_config()).await).await;

    for _ in 0..6 {
        writer.submit(hello());
    }
    writer.shutdown().await;

    // Three threshold flushes of two records; the forced flush has nothing left.
    assert_eq!(env.count_events(EventKind::Inserted), 3);
    assert_eq!(env.count_rows("events").await, 6);
}

#[tokio::test]
async fn test_empty_shutdown_writes_nothing() {
    let env = TestEnv::new();
    env.create_table("CREATE TABLE events (test TEXT)").await;
    let writer = env.writer("events", 5, env.dumper(idle_dumper_config()).await).await;

    writer.shutdown().await;
    // Second call is a no-op.
    writer.shutdown().await;

    assert_eq!(env.count_events(EventKind::Inserted), 0);
    assert_eq!(env.count_events(EventKind::FlushFailed), 0);
    assert!(env.artifacts().is_empty());
    assert_eq!(env.count_rows("events").await, 0);
}

#[tokio::test]
async fn test_submit_after_shutdown_is_rejected() {
    let env = TestEnv::new();
    env.create_table("CREATE TABLE events (test TEXT)").await;
    let writer = env.writer("events", 5, env.dumper(idle_dumper_config()).await).await;

    writer.shutdown().await;
    writer.submit(hello());

    assert_eq!(env.count_events(EventKind::SubmitRejected), 1);
    assert_eq!(env.count_rows("events").await, 0);
}

#[tokio::test]
async fn test_concurrent_batches_all_commit() {
    let env = TestEnv::new();
    env.create_table("CREATE TABLE events (test TEXT)").await;
    let writer = env.writer("events", 10, env.dumper(idle_dumper_config()).await).await;

    for _ in 0..200 {
        writer.submit(hello());
    }
    writer.shutdown().await;

    assert_eq!(env.count_rows("events").await, 200);
    assert!(env.artifacts().is_empty());
}

#[tokio::test]
async fn test_invalid_table_fails_start() {
    let env = TestEnv::new();
    let config = WriterConfig {
        table: "page-views".to_string(),
        database_url: env.database_url.clone(),
        ..Default::default()
    };
    let result = Writer::start(config, env.dumper(idle_dumper_config()).await, env.callback()).await;
    assert!(matches!(result, Err(DatabaseError::InvalidTableName(_))));
}

#[tokio::test]
async fn test_unreachable_database_fails_start() {
    let env = TestEnv::new();
    let config = WriterConfig {
        database_url: format!("sqlite:{}", env.dir.path().join("no/such/dir/x.db").display()),
        connect_timeout: Duration::from_millis(500),
        ..Default::default()
    };
    let result = Writer::start(config, env.dumper(idle_dumper_config()).await, env.callback()).await;
    assert!(matches!(result, Err(DatabaseError::SqlError(_))));
}
