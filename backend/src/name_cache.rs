use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use game_core::NameCache;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task;
use tracing::warn;

/// Remembers the last roster as a JSON array of strings in a single file.
/// Each save overwrites the file; any read problem counts as "no names".
#[derive(Debug, Clone)]
pub struct JsonFileNameCache {
    path: PathBuf,
}

impl JsonFileNameCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Runs file I/O without stalling the other tasks on a multi-threaded runtime.
/// `block_in_place` is unavailable on a current-thread runtime, where the
/// call runs inline.
fn blocking_io<T>(io: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            task::block_in_place(io)
        }
        _ => io(),
    }
}

impl NameCache for JsonFileNameCache {
    fn load(&self) -> Option<Vec<String>> {
        let bytes = match blocking_io(|| fs::read(&self.path)) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "name cache unreadable");
                return None;
            }
        };

        match serde_json::from_slice::<Vec<String>>(&bytes) {
            Ok(names) => Some(names),
            Err(err) => {
                warn!(path = %self.path.display(), %err, "name cache corrupt, ignoring");
                None
            }
        }
    }

    fn save(&mut self, names: &[String]) {
        let json = match serde_json::to_vec(names) {
            Ok(json) => json,
            Err(err) => {
                warn!(%err, "could not encode player names");
                return;
            }
        };
        if let Err(err) = blocking_io(|| fs::write(&self.path, json)) {
            warn!(path = %self.path.display(), %err, "name cache write failed");
        }
    }
}
