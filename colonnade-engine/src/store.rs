//! Artifact store.
//!
//! Compiled programs live under the cache directory at the template's
//! relative path:
//!
//! ```text
//! <cache_dir>/
//!   index.html
//!   partials/
//!     row.html
//! ```
//!
//! Each write goes to its own temporary file next to the artifact
//! (`.<name>.XXXXXX.colonnade.tmp`) and is renamed into place. Readers never
//! observe a half-written artifact, and concurrent compiles of the same
//! template race to an identical result with the last rename winning.

use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use crate::error::{io_err, EngineError};

/// Suffix of the temporary files written before the atomic rename.
pub const TMP_SUFFIX: &str = ".colonnade.tmp";

/// Stand-in for `..` components so artifacts never escape the store.
const PARENT_TOKEN: &str = "__parent__";

/// Filesystem store of compiled programs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<template>`: pure, no I/O.
    ///
    /// Root and prefix components are dropped and `..` maps to a fixed
    /// directory name, so every template lands inside the store.
    pub fn artifact_path(&self, template: &str) -> PathBuf {
        let mut path = self.root.clone();
        for component in Path::new(template).components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::ParentDir => path.push(PARENT_TOKEN),
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }
        path
    }

    /// Modification time of the stored artifact, `None` when absent.
    pub fn modified(&self, template: &str) -> Result<Option<SystemTime>, EngineError> {
        let path = self.artifact_path(template);
        match std::fs::metadata(&path) {
            Ok(meta) => meta.modified().map(Some).map_err(|e| io_err(&path, e)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_err(&path, err)),
        }
    }

    /// Read a stored program.
    pub fn load(&self, template: &str) -> Result<String, EngineError> {
        let path = self.artifact_path(template);
        std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))
    }

    /// Atomically store `program` for `template`, creating missing
    /// directories. Returns the artifact path.
    pub fn save(&self, template: &str, program: &str) -> Result<PathBuf, EngineError> {
        let path = self.artifact_path(template);
        let dir = path.parent().unwrap_or(self.root.as_path());
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

        let prefix = match path.file_name() {
            Some(name) => format!(".{}.", name.to_string_lossy()),
            None => ".".to_string(),
        };
        let mut tmp = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(TMP_SUFFIX)
            .tempfile_in(dir)
            .map_err(|e| io_err(dir, e))?;
        tmp.write_all(program.as_bytes())
            .map_err(|e| io_err(tmp.path(), e))?;

        // A failed persist drops the temporary file, which deletes it.
        tmp.persist(&path).map_err(|e| io_err(&path, e.error))?;

        tracing::info!("wrote artifact: {}", path.display());
        Ok(path)
    }
}
