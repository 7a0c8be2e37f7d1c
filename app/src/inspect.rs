//! Drive the caches and summarise the outcome.

use std::fmt;

use cinder_core::ErrorKind;
use cinder_graphics::GraphicsDevice;
use cinder_resources::{CacheStats, LeakReport, ModelRef, ResourceContext, TextureRef};

use crate::args::InspectArgs;

/// One loaded model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSummary {
    /// Cache key.
    pub path: String,
    /// Outstanding references before freeing.
    pub refs: u32,
    /// Submodel count.
    pub meshes: usize,
    /// Vertices in the shared buffer.
    pub vertices: u32,
    /// Triangles across all submodels.
    pub faces: u32,
    /// Bone names in index order.
    pub bones: Vec<String>,
    /// Diffuse texture path per submodel.
    pub textures: Vec<String>,
}

/// One loaded texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureSummary {
    /// Cache key.
    pub path: String,
    /// Outstanding references before freeing, model-owned ones included.
    pub refs: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Channels per pixel.
    pub channels: u8,
}

/// A load that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Path passed to the load.
    pub path: String,
    /// Error category.
    pub kind: ErrorKind,
    /// Error text, with its source when there is one.
    pub message: String,
}

/// Everything `inspect` observed.
#[derive(Debug, Clone, PartialEq)]
pub struct InspectReport {
    /// Graphics backend name.
    pub backend: &'static str,
    /// Live models, in slot order.
    pub models: Vec<ModelSummary>,
    /// Live textures, in slot order.
    pub textures: Vec<TextureSummary>,
    /// Loads that failed, in call order.
    pub failures: Vec<Failure>,
    /// Occupancy with everything loaded.
    pub peak: CacheStats,
    /// Errors raised while freeing.
    pub free_errors: Vec<String>,
    /// What shutdown still found held.
    pub leaks: LeakReport,
}

impl InspectReport {
    /// Whether every load and free succeeded.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.free_errors.is_empty()
    }
}

/// Load every path `args.repeat` times, snapshot the caches, free what was
/// loaded unless `args.keep` is set, then shut the context down.
pub fn inspect<D: GraphicsDevice>(
    mut ctx: ResourceContext<D>,
    args: &InspectArgs,
) -> InspectReport {
    let backend = ctx.device().name();
    let mut failures = Vec::new();
    let mut held_models: Vec<ModelRef> = Vec::new();
    let mut held_textures: Vec<TextureRef> = Vec::new();

    for _ in 0..args.repeat {
        for path in &args.models {
            match ctx.load_model(path) {
                Ok(model) => held_models.push(model),
                Err(e) => failures.push(failure(path, &e)),
            }
        }
        for path in &args.textures {
            match ctx.load_texture(path) {
                Ok(texture) => held_textures.push(texture),
                Err(e) => failures.push(failure(path, &e)),
            }
        }
    }

    let models = ctx
        .models()
        .map(|(_, model)| ModelSummary {
            path: model.path().to_string(),
            refs: model.refs(),
            meshes: model.submodels().len(),
            vertices: model.vertex_count(),
            faces: model.face_count(),
            bones: model.bones().iter().map(|b| b.name.clone()).collect(),
            textures: model
                .submodels()
                .iter()
                .map(|s| ctx.texture_path(s.diffuse).unwrap_or("?").to_string())
                .collect(),
        })
        .collect();
    let textures = ctx
        .textures()
        .map(|(_, texture)| {
            let (width, height) = texture.size();
            TextureSummary {
                path: texture.path().to_string(),
                refs: texture.refs(),
                width,
                height,
                channels: texture.channels(),
            }
        })
        .collect();
    let peak = ctx.stats();

    let mut free_errors = Vec::new();
    if !args.keep {
        for model in held_models {
            if let Err(e) = ctx.free_model(Some(model)) {
                free_errors.push(e.to_string());
            }
        }
        for texture in held_textures {
            if let Err(e) = ctx.free_texture(texture) {
                free_errors.push(e.to_string());
            }
        }
    }
    let leaks = ctx.shutdown();

    InspectReport {
        backend,
        models,
        textures,
        failures,
        peak,
        free_errors,
        leaks,
    }
}

fn failure(path: &str, error: &cinder_resources::ResourceError) -> Failure {
    let message = match std::error::Error::source(error) {
        Some(source) => format!("{error}: {source}"),
        None => error.to_string(),
    };
    Failure {
        path: path.to_string(),
        kind: error.kind(),
        message,
    }
}

impl fmt::Display for InspectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "backend: {}", self.backend)?;
        writeln!(
            f,
            "models: {}/{} slots, textures: {}/{} slots",
            self.peak.models.live,
            self.peak.models.capacity,
            self.peak.textures.live,
            self.peak.textures.capacity
        )?;
        for model in &self.models {
            writeln!(
                f,
                "model {} (refs {}): {} meshes, {} vertices, {} tris, {} bones",
                model.path,
                model.refs,
                model.meshes,
                model.vertices,
                model.faces,
                model.bones.len()
            )?;
            for (i, texture) in model.textures.iter().enumerate() {
                writeln!(f, "  submodel {i}: {texture}")?;
            }
        }
        for texture in &self.textures {
            writeln!(
                f,
                "texture {} (refs {}): {}x{}, {} channels",
                texture.path, texture.refs, texture.width, texture.height, texture.channels
            )?;
        }
        for failure in &self.failures {
            writeln!(
                f,
                "FAILED {} [{} ({})]: {}",
                failure.path,
                failure.kind.description(),
                failure.kind.code(),
                failure.message
            )?;
        }
        for error in &self.free_errors {
            writeln!(f, "FREE FAILED: {error}")?;
        }
        if self.leaks.is_clean() {
            write!(f, "shutdown clean")
        } else {
            write!(
                f,
                "leaked {} model(s), {} texture(s)",
                self.leaks.models.len(),
                self.leaks.textures.len()
            )
        }
    }
}
