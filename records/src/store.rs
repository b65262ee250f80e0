use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sweeper_core::{Completion, Difficulty};

use crate::*;

const FILE_VERSION: u8 = 1;

#[derive(Serialize)]
struct StoreFile<'a> {
    version: u8,
    best: &'a BestTimes,
}

#[derive(Deserialize)]
struct StoreFileRaw {
    version: u8,
    #[serde(default)]
    best: serde_json::Value,
}

/// [`BestTimes`] kept in a versioned JSON file.
///
/// A missing file starts an empty store. A file that cannot be read or parsed,
/// or that has another version, is logged and ignored; it is overwritten by the
/// next successful write.
#[derive(Debug)]
pub struct BestTimeStore {
    path: Option<PathBuf>,
    times: BestTimes,
}

impl BestTimeStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let times = load_times(&path);
        Self {
            path: Some(path),
            times,
        }
    }

    /// Store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            times: BestTimes::new(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn times(&self) -> &BestTimes {
        &self.times
    }

    pub fn best_time(&self, difficulty: Difficulty) -> Option<u64> {
        self.times.best_time(difficulty)
    }

    pub fn best_time_ms(&self, difficulty: Difficulty) -> Option<u64> {
        self.times.best_time_ms(difficulty)
    }

    /// Records a win and saves when it is a new best. On a failed write the
    /// store keeps its previous times.
    pub fn record(&mut self, completion: Completion) -> Result<bool> {
        let mut next = self.times.clone();
        if !next.record(completion) {
            return Ok(false);
        }
        self.save(&next)?;
        self.times = next;
        Ok(true)
    }

    pub fn reset_all(&mut self) -> Result<()> {
        let cleared = BestTimes::new();
        self.save(&cleared)?;
        self.times = cleared;
        Ok(())
    }

    fn save(&self, times: &BestTimes) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let io_error = |source: io::Error| RecordsError::Io {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        let text = serde_json::to_string_pretty(&StoreFile {
            version: FILE_VERSION,
            best: times,
        })?;
        fs::write(path, text).map_err(io_error)?;
        log::trace!("Saved best times to {}", path.display());
        Ok(())
    }
}

fn load_times(path: &Path) -> BestTimes {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(error) => {
            if error.kind() != io::ErrorKind::NotFound {
                log::warn!("Failed to read best times {}: {}", path.display(), error);
            }
            return BestTimes::new();
        }
    };

    let raw = match serde_json::from_str::<StoreFileRaw>(&text) {
        Ok(raw) if raw.version == FILE_VERSION => raw,
        Ok(raw) => {
            log::warn!(
                "Unsupported best times version {} at {}",
                raw.version,
                path.display()
            );
            return BestTimes::new();
        }
        Err(error) => {
            log::warn!("Failed to parse best times {}: {}", path.display(), error);
            return BestTimes::new();
        }
    };

    if raw.best.is_null() {
        return BestTimes::new();
    }
    serde_json::from_value(raw.best).unwrap_or_else(|error| {
        log::warn!("Dropping malformed best times in {}: {}", path.display(), error);
        BestTimes::new()
    })
}
