//! Engine configuration.
//!
//! Read from `colonnade.yaml` in the project directory. Every key is optional:
//!
//! ```yaml
//! template_dir: templates   # default "."
//! cache_dir: bin            # default "bin"
//! root_var: data            # default "data"
//! extensions: [html, htm]   # default [html]
//! max_include_depth: 32     # default 32
//! ```
//!
//! Relative directories resolve against the directory holding the file.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use colonnade_core::types::is_identifier;

use crate::error::{io_err, EngineError};

/// File name looked up by [`EngineConfig::load_at`].
pub const CONFIG_FILE: &str = "colonnade.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Root that template names and includes resolve against.
    pub template_dir: PathBuf,
    /// Root of the artifact store.
    pub cache_dir: PathBuf,
    /// Name of the outermost scope variable.
    pub root_var: String,
    /// File extensions treated as templates when scanning `template_dir`.
    pub extensions: Vec<String>,
    /// Maximum nesting of `include` directives.
    pub max_include_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            template_dir: PathBuf::from("."),
            cache_dir: PathBuf::from("bin"),
            root_var: "data".to_string(),
            extensions: vec!["html".to_string()],
            max_include_depth: 32,
        }
    }
}

impl EngineConfig {
    /// Load `<dir>/colonnade.yaml`, falling back to defaults when absent.
    ///
    /// Directories in the result are resolved against `dir`.
    pub fn load_at(dir: &Path) -> Result<Self, EngineError> {
        let path = dir.join(CONFIG_FILE);
        let config = match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => Self::default(),
            Ok(text) => serde_yaml::from_str(&text).map_err(|source| EngineError::Config {
                path: path.clone(),
                source,
            })?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!("no {} in {}, using defaults", CONFIG_FILE, dir.display());
                Self::default()
            }
            Err(err) => return Err(io_err(&path, err)),
        };
        let config = config.resolved_against(dir);
        config.validate()?;
        Ok(config)
    }

    /// Resolve relative directories against `base`.
    pub fn resolved_against(mut self, base: &Path) -> Self {
        self.template_dir = normalize(&base.join(&self.template_dir));
        self.cache_dir = normalize(&base.join(&self.cache_dir));
        self
    }

    /// Replace the artifact store root, e.g. from a command-line override.
    pub fn with_cache_dir(mut self, dir: &Path) -> Self {
        self.cache_dir = normalize(dir);
        self
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !is_identifier(&self.root_var) {
            return Err(EngineError::InvalidConfig(format!(
                "root_var '{}' must be a non-empty [a-z0-9_] identifier",
                self.root_var
            )));
        }
        if self.extensions.is_empty() {
            return Err(EngineError::InvalidConfig(
                "extensions must list at least one file extension".to_string(),
            ));
        }
        Ok(())
    }

    /// `true` when `path` has one of the configured template extensions.
    pub fn is_template(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }
}

/// Drop `.` components so that joined paths compare equal to their plain
/// spelling. A path made only of `.` stays `.`.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let normalized: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    if normalized.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn defaults_when_file_missing() {
        let dir = TempDir::new().expect("tempdir");
        let config = EngineConfig::load_at(dir.path()).expect("load");
        assert_eq!(config.template_dir, normalize(dir.path()));
        assert_eq!(config.cache_dir, normalize(&dir.path().join("bin")));
        assert_eq!(config.root_var, "data");
        assert_eq!(config.max_include_depth, 32);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "template_dir: views\nroot_var: page\n",
        )
        .expect("write");
        let config = EngineConfig::load_at(dir.path()).expect("load");
        assert_eq!(config.template_dir, dir.path().join("views"));
        assert_eq!(config.root_var, "page");
        assert_eq!(config.extensions, ["html"]);
    }

    #[test]
    fn absolute_cache_dir_is_kept() {
        let dir = TempDir::new().expect("tempdir");
        let cache = TempDir::new().expect("cache");
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            format!("cache_dir: {}\n", cache.path().display()),
        )
        .expect("write");
        let config = EngineConfig::load_at(dir.path()).expect("load");
        assert_eq!(config.cache_dir, cache.path());
    }

    #[test]
    fn unknown_key_is_a_parse_error_with_path() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(dir.path().join(CONFIG_FILE), "templates: x\n").expect("write");
        let err = EngineConfig::load_at(dir.path()).unwrap_err();
        assert!(matches!(err, EngineError::Config { .. }), "got: {err}");
        assert!(err.to_string().contains(CONFIG_FILE));
    }

    #[rstest]
    #[case("root_var: ''\n")]
    #[case("root_var: Data\n")]
    #[case("root_var: my-data\n")]
    #[case("extensions: []\n")]
    fn invalid_values_are_rejected(#[case] yaml: &str) {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(dir.path().join(CONFIG_FILE), yaml).expect("write");
        let err = EngineConfig::load_at(dir.path()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)), "got: {err}");
    }

    #[test]
    fn relative_project_dir_normalizes() {
        let config = EngineConfig::default().resolved_against(Path::new("."));
        assert_eq!(config.template_dir, Path::new("."));
        assert_eq!(config.cache_dir, Path::new("bin"));

        let config = config.with_cache_dir(Path::new("./out/./cache"));
        assert_eq!(config.cache_dir, Path::new("out/cache"));
    }

    #[test]
    fn template_extension_check() {
        let config = EngineConfig::default();
        assert!(config.is_template(Path::new("a/b.html")));
        assert!(!config.is_template(Path::new("a/b.htm")));
        assert!(!config.is_template(Path::new("README")));
    }
}
