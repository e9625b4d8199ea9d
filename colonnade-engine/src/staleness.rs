//! Artifact freshness.
//!
//! An artifact is current when it exists and its modification time is not
//! older than the template source's. Content is never compared.

use std::path::Path;
use std::time::{Duration, SystemTime};

use crate::error::{io_err, EngineError};
use crate::store::ArtifactStore;

/// Freshness of one template's artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// No artifact stored yet.
    Missing,
    /// The source was modified after the artifact was written.
    Stale {
        source_modified: SystemTime,
        artifact_modified: SystemTime,
    },
    Current { artifact_modified: SystemTime },
}

impl Freshness {
    /// `true` when the template must be compiled before use.
    pub fn needs_compile(&self) -> bool {
        !matches!(self, Freshness::Current { .. })
    }

    /// Modification time of the stored artifact, if any.
    pub fn artifact_modified(&self) -> Option<SystemTime> {
        match self {
            Freshness::Missing => None,
            Freshness::Stale {
                artifact_modified, ..
            }
            | Freshness::Current { artifact_modified } => Some(*artifact_modified),
        }
    }
}

/// Compare `source` against the stored artifact for `template`.
///
/// A missing source is an error: there is nothing to compile from.
pub fn check(
    source: &Path,
    store: &ArtifactStore,
    template: &str,
) -> Result<Freshness, EngineError> {
    let Some(artifact_modified) = store.modified(template)? else {
        return Ok(Freshness::Missing);
    };
    let source_modified = std::fs::metadata(source)
        .and_then(|meta| meta.modified())
        .map_err(|e| io_err(source, e))?;

    if source_modified > artifact_modified {
        Ok(Freshness::Stale {
            source_modified,
            artifact_modified,
        })
    } else {
        Ok(Freshness::Current { artifact_modified })
    }
}

/// Format age from a filesystem timestamp.
pub fn format_system_time_age(timestamp: SystemTime) -> String {
    let age = SystemTime::now()
        .duration_since(timestamp)
        .unwrap_or_default();
    format_duration(age)
}

fn format_duration(duration: Duration) -> String {
    format_seconds(duration.as_secs())
}

fn format_seconds(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{seconds}s");
    }
    if seconds < 60 * 60 {
        return format!("{}m", seconds / 60);
    }
    if seconds < 60 * 60 * 24 {
        return format!("{}h", seconds / (60 * 60));
    }
    format!("{}d", seconds / (60 * 60 * 24))
}
