//! The writer's control loop.
//!
//! One task per writer owns the intake channel, the queue pointer and the
//! connection handle. It reacts to three things:
//! - a submitted record: enqueue it and dispatch a flush at the threshold
//! - the ping tick: check the connection, schedule a reconnect on failure
//! - the reconnect deadline: replace the connection once
//!
//! On cancellation it drains the intake channel, waits for dispatched flushes,
//! force-flushes whatever is left, stops the dumper and closes the connection.

use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::WriterConfig;
use crate::dumper::Dumper;
use crate::error_handling::StorageError;
use crate::events::{EventCallback, SaverEvent};
use crate::storage::pool;
use crate::storage::record::Record;

use super::flush::Flusher;
use super::queue::RecordQueue;

pub(crate) struct ControlLoop {
    pub(crate) config: WriterConfig,
    pub(crate) queue: Arc<RecordQueue>,
    pub(crate) intake: mpsc::UnboundedReceiver<Record>,
    pub(crate) connection: watch::Sender<Arc<SqlitePool>>,
    pub(crate) flusher: Flusher,
    pub(crate) tracker: TaskTracker,
    pub(crate) dumper: Arc<Dumper>,
    pub(crate) watch_task: JoinHandle<Result<(), StorageError>>,
    pub(crate) cancel: CancellationToken,
    pub(crate) events: EventCallback,
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

impl ControlLoop {
    fn current(&self) -> Arc<SqlitePool> {
        self.connection.borrow().clone()
    }

    pub(crate) async fn run(mut self) {
        let period = self.config.ping_interval;
        let mut ping = interval_at(Instant::now() + period, period);
        ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut reconnect_at: Option<Instant> = None;

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                received = self.intake.recv() => match received {
                    Some(record) => self.enqueue(record),
                    // Every writer handle is gone.
                    None => break,
                },
                _ = ping.tick() => {
                    if reconnect_at.is_none() && !self.check_connection().await {
                        reconnect_at = Some(Instant::now() + self.config.reconnect_backoff);
                    }
                }
                _ = wait_until(reconnect_at) => {
                    reconnect_at = None;
                    self.reconnect().await;
                }
            }
        }

        self.finish().await;
    }

    fn enqueue(&self, record: Record) {
        if self.queue.push(record) >= self.config.batch_size {
            self.dispatch();
        }
    }

    fn dispatch(&self) {
        let batch = self.queue.detach();
        if batch.is_empty() {
            return;
        }
        log::debug!("Dispatching flush of {} records", batch.len());
        let flusher = self.flusher.clone();
        let pool = self.current();
        self.tracker.spawn(async move {
            flusher.flush(&pool, batch).await;
        });
    }

    async fn check_connection(&self) -> bool {
        match pool::ping(&self.current(), self.config.ping_timeout).await {
            Ok(()) => true,
            Err(error) => {
                (self.events)(&SaverEvent::PingFailed { error: &error });
                false
            }
        }
    }

    async fn reconnect(&self) {
        pool::close(&self.current()).await;
        match pool::connect(
            &self.config.database_url,
            pool_size(self.config.max_concurrent_flushes),
            self.config.connect_timeout,
        )
        .await
        {
            Ok(fresh) => {
                self.connection.send_replace(Arc::new(fresh));
                (self.events)(&SaverEvent::Reconnected);
            }
            Err(error) => (self.events)(&SaverEvent::ReconnectFailed { error: &error }),
        }
    }

    async fn finish(mut self) {
        self.intake.close();
        let mut drained = 0usize;
        // Drained records still go through the threshold, so no flush
        // carries more than `batch_size` records except the forced one.
        while let Ok(record) = self.intake.try_recv() {
            self.enqueue(record);
            drained += 1;
        }
        if drained > 0 {
            log::debug!("Drained {drained} submitted records at shutdown");
        }

        self.tracker.close();
        self.tracker.wait().await;

        let remaining = self.queue.detach();
        if !remaining.is_empty() {
            log::info!("Flushing {} queued records before shutdown", remaining.len());
        }
        self.flusher.flush(&self.current(), remaining).await;

        self.dumper.stop();
        match (&mut self.watch_task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::warn!("Replay loop had already stopped: {e}"),
            Err(e) => log::error!("Replay loop task failed: {e}"),
        }

        pool::close(&self.current()).await;
        log::info!("Writer for '{}' shut down", self.config.table);
    }
}

/// Connections per pool: one per concurrent flush plus one for pings and replay.
pub(crate) fn pool_size(max_concurrent_flushes: usize) -> u32 {
    u32::try_from(max_concurrent_flushes.max(1))
        .unwrap_or(u32::MAX - 1)
        .saturating_add(1)
}
