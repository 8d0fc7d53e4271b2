//! Emergency dumper.
//!
//! The dumper is the writer's only retry path. A batch the datastore rejected
//! is spilled through a [`DataAdapter`]; a background loop periodically walks
//! the spill store and replays every artifact through a callback, deleting
//! those that replay cleanly.
//!
//! A failing artifact (bad bytes, rejected replay, failed delete) is reported
//! and skipped. The loop itself only gives up when the store cannot be
//! enumerated on `max_list_failures` consecutive ticks.

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::DumperConfig;
use crate::error_handling::StorageError;
use crate::events::{EventCallback, SaverEvent};
use crate::spill::{build_adapter, AdapterOptions, DataAdapter, ReplayCallback, RestoreReport};
use crate::storage::record::Record;

/// Spills failed batches and replays them later.
pub struct Dumper {
    adapter: Box<dyn DataAdapter>,
    config: DumperConfig,
    events: EventCallback,
    cancel: CancellationToken,
}

impl Dumper {
    /// Creates a dumper over an initialized adapter.
    pub fn new(adapter: Box<dyn DataAdapter>, config: DumperConfig, events: EventCallback) -> Self {
        Self {
            adapter,
            config,
            events,
            cancel: CancellationToken::new(),
        }
    }

    /// Selects and initializes the adapter named by `options`.
    pub async fn from_options(
        options: &AdapterOptions,
        config: DumperConfig,
        events: EventCallback,
    ) -> Result<Self, StorageError> {
        let adapter = build_adapter(options).await?;
        Ok(Self::new(adapter, config, events))
    }

    /// The underlying spill adapter.
    pub fn adapter(&self) -> &dyn DataAdapter {
        self.adapter.as_ref()
    }

    /// Spills `batch` for `table`.
    ///
    /// Best effort: a failure is reported through the event callback and the
    /// batch is dropped. Returns the artifact name on success, `None` for an
    /// empty batch or a failed spill.
    pub async fn dump(&self, table: &str, batch: &[Record]) -> Option<String> {
        match self.adapter.write(table, batch).await {
            Ok(Some(artifact)) => {
                (self.events)(&SaverEvent::Spilled {
                    table,
                    rows: batch.len(),
                    artifact: &artifact,
                });
                Some(artifact)
            }
            Ok(None) => None,
            Err(error) => {
                (self.events)(&SaverEvent::SpillFailed {
                    table,
                    rows: batch.len(),
                    error: &error,
                });
                None
            }
        }
    }

    /// Runs a single restore pass, reporting every artifact's outcome.
    ///
    /// Returns `Err` only if the spill store could not be enumerated.
    pub async fn restore_once(&self, replay: &ReplayCallback) -> Result<RestoreReport, StorageError> {
        let report = self.adapter.restore(replay).await?;

        for artifact in &report.replayed {
            (self.events)(&SaverEvent::Replayed {
                table: &artifact.table,
                rows: artifact.rows,
                artifact: &artifact.name,
            });
        }
        for failure in &report.failures {
            (self.events)(&SaverEvent::ReplayFailed {
                artifact: &failure.name,
                error: &failure.error,
            });
        }
        if !report.is_empty() {
            log::debug!(
                "Restore pass: {} artifacts replayed ({} rows), {} left in place",
                report.replayed.len(),
                report.rows(),
                report.failures.len()
            );
        }
        Ok(report)
    }

    /// Replays pending artifacts every `check_interval` until stopped.
    ///
    /// The first pass runs one interval after the call. Returns the last
    /// enumeration error once `max_list_failures` consecutive passes could not
    /// list the store; a successful pass resets the count.
    pub async fn watch(&self, replay: ReplayCallback) -> Result<(), StorageError> {
        let period = self.config.check_interval;
        let budget = self.config.max_list_failures.max(1);
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut failures = 0u32;

        log::info!(
            "Replay loop started ({} adapter, every {:?})",
            self.adapter.kind(),
            period
        );

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self.restore_once(&replay).await {
                Ok(_) => failures = 0,
                Err(error) => {
                    failures += 1;
                    (self.events)(&SaverEvent::ListFailed {
                        attempt: failures,
                        error: &error,
                    });
                    if failures >= budget {
                        (self.events)(&SaverEvent::WatchAborted { error: &error });
                        return Err(error);
                    }
                }
            }
        }

        log::info!("Replay loop stopped");
        Ok(())
    }

    /// Asks the replay loop to end at its next check.
    ///
    /// Safe to call repeatedly, and before `watch` starts, in which case
    /// `watch` returns immediately.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Returns `true` once `stop` was called.
    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
