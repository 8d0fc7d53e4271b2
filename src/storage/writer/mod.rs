//! Batching writer.
//!
//! Callers submit records without ever waiting on the datastore. Records are
//! queued and written in batches of `batch_size` by background flush tasks;
//! a batch the datastore rejects goes to the [`Dumper`], whose replay loop
//! writes it back once the datastore recovers.
//!
//! The writer owns its connection. Flushes and replays take a snapshot of the
//! current handle; only the control loop replaces it after a failed ping.

mod control;
mod flush;
mod queue;

use std::sync::Arc;

use futures::FutureExt;
use sqlx::SqlitePool;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::WriterConfig;
use crate::dumper::Dumper;
use crate::error_handling::DatabaseError;
use crate::events::{EventCallback, SaverEvent};
use crate::spill::ReplayCallback;
use crate::storage::insert;
use crate::storage::pool;
use crate::storage::record::{is_valid_table_name, Batch, Record};

use control::{pool_size, ControlLoop};
use flush::Flusher;
use queue::RecordQueue;

/// Handle to a running batching writer.
///
/// Dropping the handle without calling [`Writer::shutdown`] still flushes
/// queued records in the background, but nothing waits for it.
pub struct Writer {
    table: Arc<str>,
    intake: mpsc::UnboundedSender<Record>,
    queue: Arc<RecordQueue>,
    connection: watch::Receiver<Arc<SqlitePool>>,
    cancel: CancellationToken,
    control: Mutex<Option<JoinHandle<()>>>,
    events: EventCallback,
}

/// Replays spilled batches through the writer's current connection.
fn replay_callback(connection: watch::Receiver<Arc<SqlitePool>>) -> ReplayCallback {
    Arc::new(move |table: String, batch: Batch| {
        let pool = connection.borrow().clone();
        async move {
            insert::save_queue(&pool, &table, &batch).await?;
            Ok(())
        }
        .boxed()
    })
}

impl Writer {
    /// Connects to the datastore and starts the writer and the dumper's
    /// replay loop.
    ///
    /// # Errors
    ///
    /// Fails if the table name is invalid or the first connection cannot be
    /// opened. Nothing is spawned in that case.
    pub async fn start(
        config: WriterConfig,
        dumper: Arc<Dumper>,
        events: EventCallback,
    ) -> Result<Self, DatabaseError> {
        if !is_valid_table_name(&config.table) {
            return Err(DatabaseError::InvalidTableName(config.table));
        }
        let config = WriterConfig {
            batch_size: config.batch_size.max(1),
            max_concurrent_flushes: config.max_concurrent_flushes.max(1),
            ..config
        };

        let initial = pool::connect(
            &config.database_url,
            pool_size(config.max_concurrent_flushes),
            config.connect_timeout,
        )
        .await?;
        let (connection_tx, connection_rx) = watch::channel(Arc::new(initial));

        let replay = replay_callback(connection_rx.clone());
        let watcher = dumper.clone();
        let watch_task = tokio::spawn(async move { watcher.watch(replay).await });

        let table: Arc<str> = Arc::from(config.table.as_str());
        let queue = Arc::new(RecordQueue::default());
        let (intake_tx, intake_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        log::info!(
            "Writer started: table={}, batch_size={}, max_concurrent_flushes={}",
            table,
            config.batch_size,
            config.max_concurrent_flushes
        );

        let control = ControlLoop {
            flusher: Flusher::new(
                table.clone(),
                dumper.clone(),
                events.clone(),
                config.max_concurrent_flushes,
            ),
            config,
            queue: queue.clone(),
            intake: intake_rx,
            connection: connection_tx,
            tracker: TaskTracker::new(),
            dumper,
            watch_task,
            cancel: cancel.clone(),
            events: events.clone(),
        };
        let handle = tokio::spawn(control.run());

        Ok(Self {
            table,
            intake: intake_tx,
            queue,
            connection: connection_rx,
            cancel,
            control: Mutex::new(Some(handle)),
            events,
        })
    }

    /// Queues a record for insertion. Never blocks.
    ///
    /// After shutdown the record is dropped and a `SubmitRejected` event is
    /// reported.
    pub fn submit(&self, record: Record) {
        if self.intake.send(record).is_err() {
            (self.events)(&SaverEvent::SubmitRejected);
        }
    }

    /// Flushes everything still queued and releases the connection.
    ///
    /// Returns once the final flush (or its spill) has finished, in-flight
    /// flushes have completed and the replay loop has stopped. Calling it
    /// again is a no-op.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let mut control = self.control.lock().await;
        if let Some(handle) = control.take() {
            if let Err(e) = handle.await {
                log::error!("Writer control loop for '{}' failed: {e}", self.table);
            }
        }
    }

    /// Number of records queued and not yet dispatched in a flush.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Destination table.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The current connection handle.
    pub fn connection(&self) -> Arc<SqlitePool> {
        self.connection.borrow().clone()
    }
}
