//! Durable storage for standings.
//!
//! A store is read and rewritten in full; it never sees partial updates.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::{LeaderboardEntry, LeaderboardError};

/// Somewhere standings survive between process runs.
///
/// Implementations are only ever driven by one aggregator task, so they
/// need not guard against concurrent read-modify-write themselves.
pub trait LeaderboardStore: Send + Sync + 'static {
    /// Reads every persisted entry. A store that was never written reads
    /// as empty.
    fn load(
        &self,
    ) -> impl Future<Output = Result<Vec<LeaderboardEntry>, LeaderboardError>> + Send;

    /// Replaces the persisted standings with `entries`.
    fn save(
        &self,
        entries: &[LeaderboardEntry],
    ) -> impl Future<Output = Result<(), LeaderboardError>> + Send;
}

/// Standings kept as a pretty-printed JSON array in one file.
///
/// Writes go to a sibling temp file that is then renamed over the real
/// one, so a crash mid-write leaves the previous standings intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "leaderboard".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> LeaderboardError {
        LeaderboardError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl LeaderboardStore for JsonFileStore {
    async fn load(&self) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no leaderboard yet, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        // A freshly touched file counts as an empty leaderboard.
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        serde_json::from_slice(&bytes).map_err(|source| LeaderboardError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    async fn save(&self, entries: &[LeaderboardEntry]) -> Result<(), LeaderboardError> {
        let mut body = serde_json::to_vec_pretty(entries).map_err(LeaderboardError::Encode)?;
        body.push(b'\n');

        let temp = self.temp_path();
        tokio::fs::write(&temp, &body)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        Ok(())
    }
}

/// A store that lives only as long as the process. Useful for tests and
/// for running without a leaderboard file.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<Vec<LeaderboardEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with `entries` already persisted.
    pub fn with_entries(entries: Vec<LeaderboardEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LeaderboardEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl LeaderboardStore for MemoryStore {
    async fn load(&self) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        Ok(self.lock().clone())
    }

    async fn save(&self, entries: &[LeaderboardEntry]) -> Result<(), LeaderboardError> {
        *self.lock() = entries.to_vec();
        Ok(())
    }
}
