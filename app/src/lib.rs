//! # Cinder App
//!
//! The `cinder-inspect` command line tool.
//!
//! ## Overview
//!
//! - [`InspectArgs`] - Command line arguments (clap)
//! - [`inspect`] - Load, snapshot, free and shut down, producing an [`InspectReport`]
//! - [`AppError`] - Failures that stop the tool before anything is loaded

mod args;
mod inspect;

pub use args::{CliBackend, InspectArgs};
pub use inspect::{Failure, InspectReport, ModelSummary, TextureSummary, inspect};

/// Errors that abort the inspector before loading starts.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The graphics backend could not be created.
    #[error("graphics backend unavailable: {0}")]
    Graphics(#[from] cinder_graphics::GraphicsError),
    /// The cache configuration was rejected.
    #[error(transparent)]
    Resource(#[from] cinder_resources::ResourceError),
    /// The requested backend was not compiled in.
    #[error("backend '{0}' not compiled in (rebuild with --features wgpu)")]
    BackendDisabled(&'static str),
}

/// App library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
