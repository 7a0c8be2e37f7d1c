//! # Cinder Core
//!
//! Core crate for the Cinder resource layer.
//!
//! - [`error`] - the error taxonomy shared by every crate in the workspace
//! - [`pool`] - fixed-capacity slot pools with generation-checked handles and
//!   an intrusive hash index over in-use slots
//! - [`hash`] - the path hash used to pick hash buckets
//! - [`math`] - math type aliases

pub mod error;
pub mod hash;
pub mod math;
pub mod pool;

pub use error::ErrorKind;
pub use pool::{Handle, PoolError, ResourcePool};

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the core library version.
pub fn init() {
    log::info!("Cinder Core v{} initialized", VERSION);
}
