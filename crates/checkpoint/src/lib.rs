//! File backed store of the last block height processed per network.
//!
//! Each network owns one JSON record, `<state_dir>/<network>_state.json`. Reads never fail:
//! a missing or corrupt record yields the network's starting block. Writes go to a temporary
//! file in the same directory which is then renamed over the record, so a reader only ever
//! observes the previous or the new record.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Record persisted for one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub last_processed_block: u64,
    /// absent in records written by hand or by older tooling
    #[serde(default)]
    pub network: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("checkpoint io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot serialize checkpoint for {network}: {source}")]
    Serialization {
        network: String,
        #[source]
        source: serde_json::Error,
    },
    /// checkpoints only move forward
    #[error("refusing to move checkpoint of {network} back from {current} to {requested}")]
    Regression {
        network: String,
        current: u64,
        requested: u64,
    },
}

/// Persists [Checkpoint]s under a state directory, one file per network.
///
/// The store is not safe against concurrent writers of the same network; at most one
/// processor may run per network at a time.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    state_dir: PathBuf,
    /// block returned for a network that has no readable record yet
    starting_blocks: HashMap<String, u64>,
}

impl CheckpointStore {
    pub fn new(state_dir: impl Into<PathBuf>, starting_blocks: HashMap<String, u64>) -> Self {
        Self {
            state_dir: state_dir.into(),
            starting_blocks,
        }
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// Location of the record for `network`.
    pub fn record_path(&self, network: &str) -> PathBuf {
        self.state_dir.join(format!("{network}_state.json"))
    }

    /// Starting block used when `network` has no usable record. Unknown networks start at 0.
    pub fn starting_block(&self, network: &str) -> u64 {
        self.starting_blocks.get(network).copied().unwrap_or(0)
    }

    /// Last processed block of `network`, or its starting block if none was recorded.
    pub fn get(&self, network: &str) -> u64 {
        match self.read_record(network) {
            Ok(Some(checkpoint)) => checkpoint.last_processed_block,
            Ok(None) => {
                let block = self.starting_block(network);
                debug!(target: "checkpoint", network, block, "no checkpoint recorded, using starting block");
                block
            }
            Err(e) => {
                let block = self.starting_block(network);
                warn!(target: "checkpoint", network, block, "could not read checkpoint, using starting block: {e}");
                block
            }
        }
    }

    /// Record `block` as the last processed block of `network`.
    pub fn set(&self, network: &str, block: u64) -> Result<(), CheckpointError> {
        let path = self.record_path(network);

        // keep unrelated keys of a readable record, drop a corrupt one
        let mut record = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice::<serde_json::Map<String, serde_json::Value>>(&bytes)
                .unwrap_or_else(|e| {
                    warn!(target: "checkpoint", network, "overwriting unreadable checkpoint: {e}");
                    serde_json::Map::new()
                }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => serde_json::Map::new(),
            Err(source) => return Err(CheckpointError::Io { path, source }),
        };

        if let Some(current) = record.get("last_processed_block").and_then(|v| v.as_u64()) {
            if block < current {
                return Err(CheckpointError::Regression {
                    network: network.to_string(),
                    current,
                    requested: block,
                });
            }
        }

        record.insert("last_processed_block".to_string(), block.into());
        record.insert("network".to_string(), network.into());
        let bytes = serde_json::to_vec_pretty(&record).map_err(|source| {
            CheckpointError::Serialization {
                network: network.to_string(),
                source,
            }
        })?;

        self.write_atomic(&path, &bytes)?;
        info!(target: "checkpoint", network, block, path = %path.display(), "checkpoint advanced");
        Ok(())
    }

    fn read_record(&self, network: &str) -> Result<Option<Checkpoint>, String> {
        let path = self.record_path(network);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(format!("{}: {e}", path.display())),
        };
        serde_json::from_slice::<Checkpoint>(&bytes)
            .map(Some)
            .map_err(|e| format!("{}: {e}", path.display()))
    }

    // Write to temp, fsync, then rename over the record.
    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), CheckpointError> {
        let io_err = |source| CheckpointError::Io {
            path: path.to_path_buf(),
            source,
        };

        fs::create_dir_all(&self.state_dir).map_err(io_err)?;
        let mut tmp = NamedTempFile::new_in(&self.state_dir).map_err(io_err)?;
        tmp.write_all(bytes).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}
