//! Error types for colonnade-core.

use thiserror::Error;

/// All errors that can arise while reading template markup into a tree.
#[derive(Debug, Error)]
pub enum MarkupError {
    /// The underlying reader rejected the input.
    #[error("markup parse error at byte {position}: {source}")]
    Parse {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },
}
