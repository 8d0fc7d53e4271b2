// Shared test helpers for writer and dumper integration tests.
//
// Every test gets its own temp directory holding a file-backed SQLite database
// and a spill directory; in-memory SQLite is per-connection and can't be shared
// between the writer's pool and the assertions.

#![allow(dead_code)] // Each test file uses a different subset

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sqlx::{Row, SqlitePool};
use tempfile::TempDir;

use spillway::config::DumperConfig;
use spillway::spill::options::KEY_FS_DIR;
use spillway::storage::pool;
use spillway::{
    AdapterOptions, Dumper, EventCallback, EventKind, Record, SaverEvent, Value, Writer,
    WriterConfig,
};

pub struct TestEnv {
    pub dir: TempDir,
    pub database_url: String,
    pub spill_dir: PathBuf,
    pub events: Arc<Mutex<Vec<EventKind>>>,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let database_url = format!("sqlite:{}", dir.path().join("test.db").display());
        let spill_dir = dir.path().join("spill");
        Self {
            dir,
            database_url,
            spill_dir,
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Callback recording every event kind.
    pub fn callback(&self) -> EventCallback {
        let sink = self.events.clone();
        Arc::new(move |event: &SaverEvent<'_>| {
            sink.lock().unwrap().push(event.kind());
        })
    }

    pub fn count_events(&self, kind: EventKind) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|k| **k == kind)
            .count()
    }

    /// Opens a separate pool for setup and assertions.
    pub async fn pool(&self) -> SqlitePool {
        pool::connect(&self.database_url, 2, Duration::from_secs(5))
            .await
            .expect("Failed to open test database")
    }

    pub async fn create_table(&self, ddl: &str) {
        let pool = self.pool().await;
        sqlx::query(ddl)
            .execute(&pool)
            .await
            .expect("Failed to create table");
        pool.close().await;
    }

    pub async fn count_rows(&self, table: &str) -> i64 {
        let pool = self.pool().await;
        let count = sqlx::query(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .expect("Failed to count rows")
            .get(0);
        pool.close().await;
        count
    }

    pub async fn dumper(&self, config: DumperConfig) -> Arc<Dumper> {
        let options = AdapterOptions::new().with(KEY_FS_DIR, self.spill_dir.to_string_lossy());
        Arc::new(
            Dumper::from_options(&options, config, self.callback())
                .await
                .expect("Failed to create dumper"),
        )
    }

    pub async fn writer(&self, table: &str, batch_size: usize, dumper: Arc<Dumper>) -> Writer {
        let config = WriterConfig {
            table: table.to_string(),
            database_url: self.database_url.clone(),
            batch_size,
            ..Default::default()
        };
        Writer::start(config, dumper, self.callback())
            .await
            .expect("Failed to start writer")
    }

    /// Names of spilled artifacts currently on disk.
    pub fn artifacts(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.spill_dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".bin"))
            .collect();
        names.sort();
        names
    }
}

/// Dumper config whose replay loop never fires during a test.
pub fn idle_dumper_config() -> DumperConfig {
    DumperConfig {
        check_interval: Duration::from_secs(3600),
        ..Default::default()
    }
}

pub fn hello() -> Record {
    Record::from([("test".to_string(), Value::from("hello"))])
}

/// Polls `condition` every 10ms until it holds or `timeout` elapses.
pub async fn wait_for<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
