//! High score persistence
//!
//! A single plain decimal integer in a text file. A missing file means no
//! score has been recorded yet.

use crate::settings::Settings;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

const FILE_NAME: &str = "highscore.txt";

#[derive(Debug, Error)]
pub enum HighScoreError {
    #[error("could not determine the data directory")]
    NoDataDir,
    #[error("failed to read high score from {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("high score file {path} does not hold a number: {contents:?}")]
    Parse { path: PathBuf, contents: String },
    #[error("failed to write high score to {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct HighScoreStore {
    path: PathBuf,
}

impl HighScoreStore {
    /// `highscore.txt` in the platform data directory
    pub fn default_location() -> Result<Self, HighScoreError> {
        let dir = Settings::data_dir().ok_or(HighScoreError::NoDataDir)?;
        Ok(Self::at(dir.join(FILE_NAME)))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored high score, 0 if nothing was saved yet
    pub fn load(&self) -> Result<u64, HighScoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(source) => {
                return Err(HighScoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let parsed = contents.trim().parse::<u64>();
        parsed.map_err(|_| HighScoreError::Parse {
            path: self.path.clone(),
            contents,
        })
    }

    /// Write `score` if it beats the stored one. Returns true when written.
    pub fn submit(&self, score: u64) -> Result<bool, HighScoreError> {
        let best = match self.load() {
            Ok(best) => best,
            Err(HighScoreError::Parse { .. }) => {
                tracing::warn!(path = %self.path.display(), "replacing unreadable high score");
                0
            }
            Err(e) => return Err(e),
        };

        if score <= best {
            return Ok(false);
        }

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|source| HighScoreError::Write {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        fs::write(&self.path, score.to_string()).map_err(|source| HighScoreError::Write {
            path: self.path.clone(),
            source,
        })?;

        tracing::info!(score, previous = best, "new high score");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join("tetronimo-tests")
            .join(format!("{}-{:08x}", name, rand::random::<u32>()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_missing_file_is_zero() {
        let store = HighScoreStore::at(scratch("missing").join(FILE_NAME));
        assert_eq!(store.load().unwrap(), 0);
    }

    #[test]
    fn test_submit_only_writes_higher_scores() {
        let dir = scratch("submit");
        let store = HighScoreStore::at(dir.join(FILE_NAME));

        assert!(store.submit(120).unwrap());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "120");
        assert!(!store.submit(80).unwrap());
        assert!(!store.submit(120).unwrap());
        assert_eq!(store.load().unwrap(), 120);
        assert!(store.submit(400).unwrap());
        assert_eq!(store.load().unwrap(), 400);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_garbage_is_a_parse_error() {
        let dir = scratch("garbage");
        fs::create_dir_all(&dir).unwrap();
        let store = HighScoreStore::at(dir.join(FILE_NAME));
        fs::write(store.path(), "lots").unwrap();

        assert!(matches!(store.load(), Err(HighScoreError::Parse { .. })));
        // A submit repairs the file
        assert!(store.submit(40).unwrap());
        assert_eq!(store.load().unwrap(), 40);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        let dir = scratch("whitespace");
        fs::create_dir_all(&dir).unwrap();
        let store = HighScoreStore::at(dir.join(FILE_NAME));
        fs::write(store.path(), "  960\n").unwrap();
        assert_eq!(store.load().unwrap(), 960);

        let _ = fs::remove_dir_all(dir);
    }
}
