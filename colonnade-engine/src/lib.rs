//! # colonnade-engine
//!
//! Compile-once template rendering over a project directory.
//!
//! An [`Engine`] compiles each template's markup into a program the first
//! time it is rendered, stores the result under the cache directory, and
//! recompiles only when the source file is newer than its artifact.
//! [`warm`] pre-compiles a whole project and [`status`] reports which
//! artifacts are current.

pub mod config;
pub mod engine;
pub mod error;
pub mod staleness;
pub mod store;
pub mod warm;

pub use config::{EngineConfig, CONFIG_FILE};
pub use engine::Engine;
pub use error::EngineError;
pub use staleness::Freshness;
pub use store::ArtifactStore;
pub use warm::{status, templates, warm, TemplateStatus, WarmResult};
