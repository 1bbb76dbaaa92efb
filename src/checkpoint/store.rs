use std::path::PathBuf;

use crate::checkpoint::format::Checkpoint;
use crate::error::{CheckpointError, CheckpointResult};

/// Where checkpoints live: a listing of identifiers and a way to fetch the
/// raw bytes of one.
pub trait CheckpointStore: Send + Sync {
    /// Short human-readable description, e.g. the directory or registry URL.
    fn describe(&self) -> String;

    /// Available checkpoint identifiers, sorted.
    fn list(&self) -> CheckpointResult<Vec<String>>;

    fn fetch(&self, id: &str) -> CheckpointResult<Vec<u8>>;
}

/// Rejects empty identifiers and anything that could escape the store root.
pub fn validate_id(id: &str) -> CheckpointResult<()> {
    if id.is_empty() || id.contains('/') || id.contains('\\') || id.contains("..") {
        return Err(CheckpointError::InvalidId(id.to_owned()));
    }
    Ok(())
}

/// A directory of `<id>.json` checkpoint files.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        LocalStore { dir: dir.into() }
    }

    fn path_for(&self, id: &str) -> CheckpointResult<PathBuf> {
        validate_id(id)?;
        Ok(self.dir.join(format!("{}.json", id)))
    }

    /// Writes `checkpoint` as `<id>.json`, creating the directory if needed.
    pub fn save(&self, id: &str, checkpoint: &Checkpoint) -> CheckpointResult<PathBuf> {
        let path = self.path_for(id)?;
        std::fs::create_dir_all(&self.dir)?;
        checkpoint.save_json(&path)?;
        log::info!("saved checkpoint '{}' to {}", id, path.display());
        Ok(path)
    }
}

impl CheckpointStore for LocalStore {
    fn describe(&self) -> String {
        self.dir.display().to_string()
    }

    fn list(&self) -> CheckpointResult<Vec<String>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut names: Vec<String> = entries.flatten()
            .filter_map(|e| {
                let path = e.path();
                if path.extension().and_then(|s| s.to_str()) == Some("json") {
                    path.file_stem().and_then(|s| s.to_str()).map(|s| s.to_owned())
                } else {
                    None
                }
            })
            .collect();
        names.sort();
        Ok(names)
    }

    fn fetch(&self, id: &str) -> CheckpointResult<Vec<u8>> {
        let path = self.path_for(id)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CheckpointError::NotFound(id.to_owned()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
