pub mod types;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// One complete load of the analyzer dataset. Opaque to the store; equality is
/// structural, which is what change detection relies on.
pub type Snapshot = Value;

/// Derives the agent instructions from a snapshot. Kept as a plain function
/// pointer so the compare-then-rebuild path is testable without prompt text.
pub type InstructionBuilder = fn(&Snapshot, DateTime<Utc>) -> String;

struct RefreshState {
    snapshot: Snapshot,
    instructions: String,
    /// Advanced only when the dataset actually changed.
    refreshed_at: DateTime<Utc>,
    /// Advanced on every successful load, changed or not. Drives staleness so
    /// an unchanged source does not force a reload on every query.
    checked_at: Instant,
}

/// The active dataset snapshot, its derived agent instructions, and the
/// refresh machinery. Shared between the periodic daemon and the query path;
/// the write lock makes the {snapshot, instructions, timestamp} swap atomic,
/// so readers never see instructions built from a different snapshot.
pub struct KnowledgeBase {
    paths: Vec<PathBuf>,
    build: InstructionBuilder,
    state: RwLock<RefreshState>,
}

/// Read the dataset from the first candidate path that exists.
pub fn load_snapshot(paths: &[PathBuf]) -> Result<Snapshot> {
    for path in paths {
        if !path.exists() {
            continue;
        }
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read dataset at {}", path.display()))?;
        let snapshot = serde_json::from_slice(&bytes)
            .with_context(|| format!("invalid dataset JSON at {}", path.display()))?;
        debug!(path = %path.display(), "dataset loaded");
        return Ok(snapshot);
    }
    anyhow::bail!(
        "dataset not found in any candidate path: {}",
        paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    )
}

/// Hex digest of the serialized snapshot, for correlating refresh log lines.
fn snapshot_digest(snapshot: &Snapshot) -> String {
    let bytes = serde_json::to_vec(snapshot).unwrap_or_default();
    blake3::hash(&bytes).to_hex().to_string()
}

impl KnowledgeBase {
    /// Eager initial load. Fails if no dataset source exists — the process
    /// must not start without a snapshot.
    pub fn init(paths: Vec<PathBuf>, build: InstructionBuilder) -> Result<Self> {
        let snapshot = load_snapshot(&paths).context("initial dataset load failed")?;
        let refreshed_at = Utc::now();
        let instructions = build(&snapshot, refreshed_at);
        info!(
            digest = %snapshot_digest(&snapshot),
            tokens = types::tokens_in(&snapshot).len(),
            "knowledge base initialized"
        );
        Ok(Self {
            paths,
            build,
            state: RwLock::new(RefreshState {
                snapshot,
                instructions,
                refreshed_at,
                checked_at: Instant::now(),
            }),
        })
    }

    /// The active snapshot.
    pub async fn current(&self) -> Snapshot {
        self.state.read().await.snapshot.clone()
    }

    /// The agent instructions derived from the active snapshot.
    pub async fn instructions(&self) -> String {
        self.state.read().await.instructions.clone()
    }

    /// When the dataset last actually changed.
    pub async fn refreshed_at(&self) -> DateTime<Utc> {
        self.state.read().await.refreshed_at
    }

    /// Number of analyzed tokens in the active snapshot.
    pub async fn token_count(&self) -> usize {
        types::tokens_in(&self.state.read().await.snapshot).len()
    }

    /// Reload the dataset and swap it in if it differs from the active
    /// snapshot. Returns whether anything changed. Load failures are logged
    /// and treated as "no change" so the last-good state stays available;
    /// this never returns an error.
    pub async fn refresh_if_changed(&self) -> bool {
        let fresh = match load_snapshot(&self.paths) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "dataset refresh failed, keeping last-good snapshot");
                return false;
            }
        };

        let mut state = self.state.write().await;
        state.checked_at = Instant::now();
        if fresh == state.snapshot {
            debug!("dataset unchanged");
            return false;
        }

        let refreshed_at = Utc::now();
        let instructions = (self.build)(&fresh, refreshed_at);
        let digest = snapshot_digest(&fresh);
        state.snapshot = fresh;
        state.instructions = instructions;
        state.refreshed_at = refreshed_at;
        info!(digest = %digest, "knowledge base refreshed with new dataset");
        true
    }

    /// Query-path staleness check: refresh synchronously when the last
    /// successful load is older than `max_age`. Adds at most one
    /// load-and-compare cycle to the query.
    pub async fn refresh_if_stale(&self, max_age: Duration) {
        let age = self.state.read().await.checked_at.elapsed();
        if age >= max_age {
            debug!(age_secs = age.as_secs(), "snapshot stale, refreshing before query");
            self.refresh_if_changed().await;
        }
    }

    /// Background refresh daemon: sleep `interval`, reload, repeat. Runs until
    /// the owning task is aborted at shutdown.
    pub async fn run_periodic(&self, interval: Duration) {
        info!(interval_secs = interval.as_secs(), "refresh daemon started");
        loop {
            tokio::time::sleep(interval).await;
            if self.refresh_if_changed().await {
                info!("periodic refresh picked up new memecoin data");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write_dataset(dir: &TempDir, name: &str, value: &Value) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
        path
    }

    fn test_builder(snapshot: &Snapshot, refreshed_at: DateTime<Utc>) -> String {
        format!(
            "updated {} :: {}",
            refreshed_at.format("%Y-%m-%d %H:%M:%S"),
            serde_json::to_string(snapshot).unwrap()
        )
    }

    fn two_token_dataset() -> Value {
        json!({ "data": [
            { "symbol": "DOGE", "risk": 3, "overall": 70 },
            { "symbol": "PEPE", "risk": 6, "overall": 62 }
        ] })
    }

    #[tokio::test]
    async fn test_init_fails_without_source() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(KnowledgeBase::init(vec![missing], test_builder).is_err());
    }

    #[tokio::test]
    async fn test_init_loads_first_available_path() {
        let dir = TempDir::new().unwrap();
        let dataset = two_token_dataset();
        let real = write_dataset(&dir, "ai_analyzer.json", &dataset);
        let missing = dir.path().join("preferred.json");

        let kb = KnowledgeBase::init(vec![missing, real], test_builder).unwrap();
        assert_eq!(kb.current().await, dataset);
        assert_eq!(kb.token_count().await, 2);

        let instructions = kb.instructions().await;
        assert!(instructions.contains("DOGE"));
        assert!(instructions.contains("PEPE"));
    }

    #[tokio::test]
    async fn test_refresh_unchanged_source_is_noop() {
        let dir = TempDir::new().unwrap();
        let path = write_dataset(&dir, "ai_analyzer.json", &two_token_dataset());
        let kb = KnowledgeBase::init(vec![path], test_builder).unwrap();

        let before = kb.refreshed_at().await;
        // Idempotent: twice in a row, no source change.
        assert!(!kb.refresh_if_changed().await);
        assert!(!kb.refresh_if_changed().await);
        assert_eq!(kb.refreshed_at().await, before);
        assert_eq!(kb.current().await, two_token_dataset());
    }

    #[tokio::test]
    async fn test_refresh_swaps_snapshot_and_instructions_together() {
        let dir = TempDir::new().unwrap();
        let path = write_dataset(&dir, "ai_analyzer.json", &two_token_dataset());
        let kb = KnowledgeBase::init(vec![path.clone()], test_builder).unwrap();
        let before = kb.refreshed_at().await;

        let updated = json!({ "data": [{ "symbol": "FLOKI", "risk": 8, "overall": 40 }] });
        write_dataset(&dir, "ai_analyzer.json", &updated);

        assert!(kb.refresh_if_changed().await);
        assert_eq!(kb.current().await, updated);
        assert!(kb.refreshed_at().await > before);

        // Instructions rebuilt from exactly the new snapshot.
        let instructions = kb.instructions().await;
        assert!(instructions.contains("FLOKI"));
        assert!(!instructions.contains("DOGE"));
        assert!(!instructions.contains("PEPE"));
    }

    #[tokio::test]
    async fn test_refresh_survives_deleted_source() {
        let dir = TempDir::new().unwrap();
        let path = write_dataset(&dir, "ai_analyzer.json", &two_token_dataset());
        let kb = KnowledgeBase::init(vec![path.clone()], test_builder).unwrap();

        fs::remove_file(&path).unwrap();
        assert!(!kb.refresh_if_changed().await);
        // Last-good snapshot retained.
        assert_eq!(kb.current().await, two_token_dataset());
    }

    #[tokio::test]
    async fn test_refresh_survives_corrupt_source() {
        let dir = TempDir::new().unwrap();
        let path = write_dataset(&dir, "ai_analyzer.json", &two_token_dataset());
        let kb = KnowledgeBase::init(vec![path.clone()], test_builder).unwrap();

        fs::write(&path, b"{ not json").unwrap();
        assert!(!kb.refresh_if_changed().await);
        assert_eq!(kb.current().await, two_token_dataset());
    }

    #[tokio::test(start_paused = true)]
    async fn test_staleness_boundary() {
        let dir = TempDir::new().unwrap();
        let path = write_dataset(&dir, "ai_analyzer.json", &two_token_dataset());
        let kb = KnowledgeBase::init(vec![path.clone()], test_builder).unwrap();
        let max_age = Duration::from_secs(600);

        let updated = json!({ "data": [{ "symbol": "WIF", "risk": 9 }] });
        write_dataset(&dir, "ai_analyzer.json", &updated);

        // 9m59s old: still fresh, no refresh on the query path.
        tokio::time::advance(Duration::from_secs(599)).await;
        kb.refresh_if_stale(max_age).await;
        assert_eq!(kb.current().await, two_token_dataset());

        // 10m01s old: stale, query triggers a synchronous refresh.
        tokio::time::advance(Duration::from_secs(2)).await;
        kb.refresh_if_stale(max_age).await;
        assert_eq!(kb.current().await, updated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_noop_refresh_still_resets_staleness() {
        let dir = TempDir::new().unwrap();
        let path = write_dataset(&dir, "ai_analyzer.json", &two_token_dataset());
        let kb = KnowledgeBase::init(vec![path], test_builder).unwrap();

        tokio::time::advance(Duration::from_secs(601)).await;
        kb.refresh_if_stale(Duration::from_secs(600)).await;

        // The unchanged load reset checked_at, so the next query must not
        // reload again even though refreshed_at never moved.
        let age = kb.state.read().await.checked_at.elapsed();
        assert!(age < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_concurrent_refresh_applies_exactly_one_update() {
        let dir = TempDir::new().unwrap();
        let path = write_dataset(&dir, "ai_analyzer.json", &two_token_dataset());
        let kb = std::sync::Arc::new(KnowledgeBase::init(vec![path.clone()], test_builder).unwrap());

        let updated = json!({ "data": [{ "symbol": "BONK", "risk": 7, "overall": 55 }] });
        write_dataset(&dir, "ai_analyzer.json", &updated);

        let (a, b) = tokio::join!(kb.refresh_if_changed(), kb.refresh_if_changed());
        assert_eq!(a as u8 + b as u8, 1, "exactly one invocation applies the update");

        // No torn state: instructions match the active snapshot.
        assert_eq!(kb.current().await, updated);
        let instructions = kb.instructions().await;
        assert!(instructions.contains("BONK"));
        assert!(!instructions.contains("DOGE"));
    }
}
