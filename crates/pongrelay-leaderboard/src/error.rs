//! Error types for the leaderboard.

use std::path::PathBuf;

/// Errors that can occur while reading, merging or writing standings.
#[derive(Debug, thiserror::Error)]
pub enum LeaderboardError {
    /// Reading or writing the store file failed.
    #[error("leaderboard store {path} i/o failed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store file exists but is not a valid leaderboard. It is left
    /// untouched.
    #[error("leaderboard store {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Standings could not be serialized.
    #[error("failed to encode leaderboard: {0}")]
    Encode(#[source] serde_json::Error),

    /// The aggregator task has stopped.
    #[error("leaderboard aggregator is unavailable")]
    Unavailable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupt_names_the_file() {
        let source = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = LeaderboardError::Corrupt {
            path: PathBuf::from("/var/lib/pong/leaderboard.json"),
            source,
        };
        let msg = err.to_string();
        assert!(msg.contains("/var/lib/pong/leaderboard.json"));
        assert!(msg.contains("corrupt"));
    }

    #[test]
    fn test_io_error_exposes_source() {
        use std::error::Error;

        let err = LeaderboardError::Io {
            path: PathBuf::from("x.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.source().is_some());
    }
}
