use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

const HIGHSCORE_FILE: &str = "highscore.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct HighScore {
    pub(crate) name: String,
    pub(crate) score: u32,
}

#[derive(Debug, Error)]
pub(crate) enum ScoreError {
    #[error("failed to read high score {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("high score {path} is not valid json: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode high score: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to write high score {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Best score on this machine, kept as one JSON object in the cache dir.
#[derive(Debug, Clone)]
pub(crate) struct ScoreBoard {
    path: PathBuf,
}

impl ScoreBoard {
    pub(crate) fn new(cache_dir: &Path) -> Self {
        Self {
            path: cache_dir.join(HIGHSCORE_FILE),
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn best(&self) -> Result<Option<HighScore>, ScoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ScoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| ScoreError::Parse {
                path: self.path.clone(),
                source,
            })
    }

    /// Stores `score` when it beats the current best. Returns whether it did.
    pub(crate) fn record(&self, name: &str, score: u32) -> Result<bool, ScoreError> {
        if let Some(best) = self.best()? {
            if best.score >= score {
                return Ok(false);
            }
        }
        let entry = HighScore {
            name: name.to_string(),
            score,
        };
        let json = serde_json::to_string_pretty(&entry).map_err(ScoreError::Encode)?;
        write_text_atomic(&self.path, &json).map_err(|source| ScoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        info!(name, score, path = %self.path.display(), "highscore_saved");
        Ok(true)
    }
}

fn write_text_atomic(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, text)?;
    if let Err(error) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_has_no_best() {
        let dir = tempfile::tempdir().expect("tempdir");
        let board = ScoreBoard::new(dir.path());
        assert_eq!(board.best().expect("read"), None);
    }

    #[test]
    fn record_keeps_only_the_best_score() {
        let dir = tempfile::tempdir().expect("tempdir");
        let board = ScoreBoard::new(&dir.path().join("cache"));

        assert!(board.record("ADA", 120).expect("first"));
        assert!(!board.record("BOB", 80).expect("lower"));
        assert!(!board.record("BOB", 120).expect("tie"));
        assert_eq!(
            board.best().expect("read"),
            Some(HighScore {
                name: "ADA".to_string(),
                score: 120
            })
        );
        assert!(board.record("CY", 200).expect("higher"));
        assert_eq!(board.best().expect("read").map(|best| best.score), Some(200));
    }

    #[test]
    fn stored_file_uses_name_and_score_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let board = ScoreBoard::new(dir.path());
        board.record("ADA", 7).expect("record");
        let raw = fs::read_to_string(board.path()).expect("file");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["name"], "ADA");
        assert_eq!(value["score"], 7);
    }

    #[test]
    fn corrupt_file_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let board = ScoreBoard::new(dir.path());
        fs::write(board.path(), "{not json").expect("write");
        assert!(matches!(board.best(), Err(ScoreError::Parse { .. })));
        assert!(matches!(
            board.record("ADA", 1),
            Err(ScoreError::Parse { .. })
        ));
    }
}
