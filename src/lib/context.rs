//! Module implementing the request-scoped context of an operation.

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::{self, TempDir};
use uuid::Uuid;


/// Context of a single operation.
///
/// Holds the task identifier and a private working directory
/// which is removed when the context is dropped.
pub struct Context {
    id: String,
    workdir: TempDir,
}

impl Context {
    /// Create a context with a working directory in the system's temp dir.
    #[inline]
    pub fn new() -> io::Result<Self> {
        Self::in_directory(env::temp_dir())
    }

    /// Create a context with a working directory under given parent directory.
    pub fn in_directory<P: AsRef<Path>>(parent: P) -> io::Result<Self> {
        let parent = parent.as_ref();
        fs::create_dir_all(parent)?;

        let id = Uuid::new_v4().simple().to_string();
        let workdir = tempfile::Builder::new()
            .prefix(&format!("pixl-{}-", id))
            .tempdir_in(parent)?;
        trace!("Created working directory {} for task {}", workdir.path().display(), id);
        Ok(Context{id, workdir})
    }
}

impl Context {
    /// Identifier of the task.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn workdir(&self) -> &Path {
        self.workdir.path()
    }

    /// Path for a working file of given name.
    #[inline]
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.workdir().join(name)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("Context")
            .field("id", &self.id)
            .field("workdir", &self.workdir.path())
            .finish()
    }
}
