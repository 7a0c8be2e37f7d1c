//! Command line arguments.
//!
//! Uses clap for parsing with:
//! - Help text (`--help`)
//! - Validation and clear error messages
//! - A warning when the wgpu backend was requested but not compiled in

use clap::{ArgAction, Parser};
use cinder_resources::CacheConfig;

/// Graphics backend selection for CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CliBackend {
    /// In-memory backend that records uploads. Needs no GPU.
    #[default]
    Dummy,
    /// Headless wgpu device (build with `--features wgpu`).
    Wgpu,
}

/// Cinder inspector arguments.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "cinder-inspect",
    about = "Load models and textures through the Cinder caches and report what happened",
    long_about = "Loads each model and texture through the reference-counted caches, \
        then frees them again and prints what was loaded, what was shared and what leaked.\n\
        \n\
        EXAMPLES:\n\
          # Inspect a model with the recording backend\n\
          cinder-inspect assets/crate/crate.gltf\n\
        \n\
          # Load twice to see deduplication, keep references to see the leak report\n\
          cinder-inspect assets/crate/crate.gltf --repeat 2 --keep\n\
        \n\
          # Stress a tiny texture pool\n\
          cinder-inspect --texture a.png --texture b.png --texture-capacity 1",
    version
)]
pub struct InspectArgs {
    /// Model files (.gltf / .glb) to load.
    pub models: Vec<String>,

    /// Texture files to load directly.
    #[arg(long = "texture", value_name = "PATH")]
    pub textures: Vec<String>,

    /// Texture pool slots.
    #[arg(long, default_value_t = 512)]
    pub texture_capacity: usize,

    /// Model pool slots.
    #[arg(long, default_value_t = 512)]
    pub model_capacity: usize,

    /// Hash buckets per cache.
    #[arg(long, default_value_t = 16)]
    pub buckets: usize,

    /// Load every path this many times.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub repeat: u32,

    /// Keep every reference instead of freeing, so shutdown reports leaks.
    #[arg(long)]
    pub keep: bool,

    /// Graphics backend to use.
    #[arg(long, default_value = "dummy", value_enum)]
    pub backend: CliBackend,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl InspectArgs {
    /// Cache sizes requested on the command line.
    pub fn config(&self) -> CacheConfig {
        CacheConfig::default()
            .with_capacity(self.texture_capacity, self.model_capacity)
            .with_buckets(self.buckets)
    }

    /// Default `env_logger` filter for the requested verbosity. `RUST_LOG`
    /// still takes precedence.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    /// Whether there is anything to load.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty() && self.textures.is_empty()
    }
}
