//! TOML-file-backed implementation of the high-score store.

use std::{fs, io::ErrorKind, path::PathBuf};

use serde::{Deserialize, Serialize};
use taxi_dash_core::HighScoreStore;
use tracing::warn;

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize)]
struct HighScoreRecord {
    best: u32,
}

/// Persists the best score to a small TOML file.
///
/// The store is best-effort: a missing or unreadable file loads as zero and
/// a failed write is logged and dropped, so persistence problems never reach
/// the game loop.
#[derive(Clone, Debug)]
pub(crate) struct FileHighScoreStore {
    path: PathBuf,
}

impl FileHighScoreStore {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl HighScoreStore for FileHighScoreStore {
    fn load(&self) -> u32 {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(error) if error.kind() == ErrorKind::NotFound => return 0,
            Err(error) => {
                warn!(path = %self.path.display(), %error, "high-score file unreadable");
                return 0;
            }
        };

        match toml::from_str::<HighScoreRecord>(&text) {
            Ok(record) => record.best,
            Err(error) => {
                warn!(path = %self.path.display(), %error, "high-score file malformed");
                0
            }
        }
    }

    fn store(&mut self, score: u32) {
        let record = HighScoreRecord { best: score };
        let text = match toml::to_string(&record) {
            Ok(text) => text,
            Err(error) => {
                warn!(%error, "high-score record failed to serialize");
                return;
            }
        };
        if let Err(error) = fs::write(&self.path, text) {
            warn!(path = %self.path.display(), %error, "high-score file write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn scratch_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("taxi-dash-{}-{name}.toml", std::process::id()))
    }

    fn cleanup(path: &Path) {
        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_loads_as_zero() {
        let path = scratch_file("missing");
        cleanup(&path);
        let store = FileHighScoreStore::new(path);
        assert_eq!(store.load(), 0);
    }

    #[test]
    fn stored_score_survives_a_reload() {
        let path = scratch_file("round-trip");
        let mut store = FileHighScoreStore::new(path.clone());
        store.store(4350);

        let reopened = FileHighScoreStore::new(path.clone());
        assert_eq!(reopened.load(), 4350);
        cleanup(&path);
    }

    #[test]
    fn malformed_file_loads_as_zero() {
        let path = scratch_file("malformed");
        fs::write(&path, "best = \"not a number\"").expect("write scratch file");
        let store = FileHighScoreStore::new(path.clone());
        assert_eq!(store.load(), 0);
        cleanup(&path);
    }
}
