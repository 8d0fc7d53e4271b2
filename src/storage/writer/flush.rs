//! Batch flushing.

use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::Semaphore;

use crate::dumper::Dumper;
use crate::events::{EventCallback, SaverEvent};
use crate::storage::insert;
use crate::storage::record::Batch;

/// Writes detached batches and hands rejected ones to the dumper.
///
/// Cloned into every dispatched flush task. The semaphore bounds how many
/// flush transactions run at once; a task waits for its permit, the control
/// loop never does.
#[derive(Clone)]
pub(crate) struct Flusher {
    table: Arc<str>,
    dumper: Arc<Dumper>,
    events: EventCallback,
    permits: Arc<Semaphore>,
}

impl Flusher {
    pub(crate) fn new(
        table: Arc<str>,
        dumper: Arc<Dumper>,
        events: EventCallback,
        max_concurrent: usize,
    ) -> Self {
        Self {
            table,
            dumper,
            events,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Inserts `batch`, spilling it on failure. Never fails.
    pub(crate) async fn flush(&self, pool: &SqlitePool, batch: Batch) {
        if batch.is_empty() {
            return;
        }

        // The semaphore is never closed, so acquire cannot fail.
        let permit = self.permits.acquire().await.ok();
        let result = insert::save_queue(pool, &self.table, &batch).await;
        drop(permit);

        match result {
            Ok(rows) => (self.events)(&SaverEvent::Inserted {
                table: &self.table,
                rows,
            }),
            Err(error) => {
                (self.events)(&SaverEvent::FlushFailed {
                    table: &self.table,
                    rows: batch.len(),
                    error: &error,
                });
                self.dumper.dump(&self.table, &batch).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DumperConfig;
    use crate::events::EventKind;
    use crate::spill::FsAdapter;
    use crate::spill::{AdapterOptions, DataAdapter};
    use crate::storage::pool;
    use crate::storage::record::{Record, Value};
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        pool: SqlitePool,
        dumper: Arc<Dumper>,
        seen: Arc<Mutex<Vec<EventKind>>>,
    }

    async fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let url = format!("sqlite:{}", dir.path().join("flush.db").display());
        let pool = pool::connect(&url, 2, Duration::from_secs(5)).await.unwrap();
        sqlx::query("CREATE TABLE events (test TEXT)")
            .execute(&pool)
            .await
            .unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let events: EventCallback = Arc::new(move |event: &SaverEvent<'_>| {
            sink.lock().unwrap().push(event.kind());
        });

        let mut adapter = FsAdapter::new(dir.path().join("spill"));
        adapter.init(&AdapterOptions::new()).await.unwrap();
        let dumper = Arc::new(Dumper::new(
            Box::new(adapter),
            DumperConfig::default(),
            events,
        ));

        Fixture {
            _dir: dir,
            pool,
            dumper,
            seen,
        }
    }

    fn flusher(fixture: &Fixture, table: &str) -> Flusher {
        let sink = fixture.seen.clone();
        let events: EventCallback = Arc::new(move |event: &SaverEvent<'_>| {
            sink.lock().unwrap().push(event.kind());
        });
        Flusher::new(Arc::from(table), fixture.dumper.clone(), events, 2)
    }

    fn hello(n: usize) -> Batch {
        vec![Record::from([("test".to_string(), Value::from("hello"))]); n]
    }

    #[tokio::test]
    async fn test_flush_inserts_and_reports() {
        let fixture = fixture().await;
        flusher(&fixture, "events").flush(&fixture.pool, hello(3)).await;

        assert_eq!(*fixture.seen.lock().unwrap(), vec![EventKind::Inserted]);
        assert!(fixture.dumper.adapter().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_flush_spills_the_batch() {
        let fixture = fixture().await;
        flusher(&fixture, "missing").flush(&fixture.pool, hello(3)).await;

        assert_eq!(
            *fixture.seen.lock().unwrap(),
            vec![EventKind::FlushFailed, EventKind::Spilled]
        );
        let artifacts = fixture.dumper.adapter().list().await.unwrap();
        assert_eq!(artifacts.len(), 1);
        assert!(artifacts[0].starts_with("missing-"));
    }

    #[tokio::test]
    async fn test_empty_flush_does_nothing() {
        let fixture = fixture().await;
        flusher(&fixture, "events").flush(&fixture.pool, Vec::new()).await;
        assert!(fixture.seen.lock().unwrap().is_empty());
    }
}
