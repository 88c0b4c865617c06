//! Isolated per-submission working directories

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::JudgeError;

/// Isolated filesystem scope for one submission.
///
/// The directory name embeds a fresh v4 UUID, so no two submissions ever
/// share a directory. Removal is guaranteed on every exit path: dropping a
/// `Workspace` removes the directory recursively, and the explicit
/// [`destroy`](Workspace::destroy) logs a removal failure instead of
/// propagating it.
#[derive(Debug)]
pub struct Workspace {
    id: Uuid,
    dir: tempfile::TempDir,
}

impl Workspace {
    /// Allocate a fresh, uniquely named directory
    pub fn create() -> Result<Self, JudgeError> {
        let id = Uuid::new_v4();
        let dir = tempfile::Builder::new()
            .prefix(&format!("sub-{}-", id))
            .tempdir()?;

        debug!("Created workspace {} at {:?}", id, dir.path());
        Ok(Self { id, dir })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file into the workspace.
    /// `name` must be a plain filename; anything that could escape the
    /// directory is rejected.
    pub fn write_file(&self, name: &str, contents: &[u8]) -> Result<PathBuf, JudgeError> {
        if name.is_empty()
            || name.contains('/')
            || name.contains('\\')
            || name == "."
            || name == ".."
        {
            return Err(JudgeError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid workspace file name: {:?}", name),
            )));
        }

        let path = self.dir.path().join(name);
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    /// Best-effort removal. Never propagates: a failure here must not mask
    /// the grading outcome, so it is logged and swallowed.
    pub fn destroy(self) {
        let id = self.id;
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            warn!("Failed to remove workspace {} at {:?}: {}", id, path, e);
        } else {
            debug!("Removed workspace {}", id);
        }
    }
}
