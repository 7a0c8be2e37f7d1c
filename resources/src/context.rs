//! The resource context: both caches, the graphics device and the asset
//! collaborators behind one owner.

use cinder_assets::{ImageDecoder, SceneImporter};
use cinder_graphics::{GraphicsDevice, TextureId};

use crate::config::CacheConfig;
use crate::error::ResourceError;
use crate::model::{Model, ModelCache, ModelRef};
use crate::texture::{Texture, TextureCache, TextureRef};

/// Live entries and capacity of one pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Entries in use.
    pub live: usize,
    /// Total slots.
    pub capacity: usize,
}

/// Occupancy of both caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Texture pool.
    pub textures: PoolStats,
    /// Model pool.
    pub models: PoolStats,
}

/// Entries still referenced when the context shut down.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeakReport {
    /// Leaked models as `(path, refs)`.
    pub models: Vec<(String, u32)>,
    /// Leaked textures as `(path, refs)`, not counting references owned by
    /// leaked models.
    pub textures: Vec<(String, u32)>,
}

impl LeakReport {
    /// Whether nothing leaked.
    pub fn is_clean(&self) -> bool {
        self.models.is_empty() && self.textures.is_empty()
    }
}

/// Owns the texture and model caches together with everything they need to
/// load: the graphics device, the scene importer and the image decoder.
///
/// All calls must come from the thread that owns the graphics device.
/// Dropping the context without calling [`shutdown`](Self::shutdown) shuts
/// it down implicitly.
pub struct ResourceContext<D: GraphicsDevice> {
    device: D,
    importer: Box<dyn SceneImporter>,
    decoder: Box<dyn ImageDecoder>,
    textures: TextureCache,
    models: ModelCache,
    shut_down: bool,
}

impl<D: GraphicsDevice> ResourceContext<D> {
    /// Validate `config` and preallocate both pools.
    pub fn new(
        config: CacheConfig,
        device: D,
        importer: Box<dyn SceneImporter>,
        decoder: Box<dyn ImageDecoder>,
    ) -> Result<Self, ResourceError> {
        config.validate()?;
        log::debug!(
            "resource context on {}: {} textures / {} models",
            device.name(),
            config.texture_capacity,
            config.model_capacity
        );
        Ok(Self {
            device,
            importer,
            decoder,
            textures: TextureCache::new(config.texture_capacity, config.texture_buckets)?,
            models: ModelCache::new(config.model_capacity, config.model_buckets)?,
            shut_down: false,
        })
    }

    /// Load a texture, sharing it if `path` is already cached.
    pub fn load_texture(&mut self, path: &str) -> Result<TextureRef, ResourceError> {
        self.textures
            .load(&mut self.device, self.decoder.as_ref(), path)
    }

    /// Return one texture reference.
    pub fn free_texture(&mut self, texture: TextureRef) -> Result<(), ResourceError> {
        self.textures.free(&mut self.device, texture)
    }

    /// Load a model, sharing it if `path` is already cached.
    pub fn load_model(&mut self, path: &str) -> Result<ModelRef, ResourceError> {
        self.models.load(
            &mut self.textures,
            &mut self.device,
            self.importer.as_ref(),
            self.decoder.as_ref(),
            path,
        )
    }

    /// Return one model reference. `None` is a no-op.
    pub fn free_model(&mut self, model: Option<ModelRef>) -> Result<(), ResourceError> {
        self.models.free(&mut self.textures, &mut self.device, model)
    }

    /// Reference count of a live texture.
    pub fn texture_refs(&self, texture: TextureRef) -> Result<u32, ResourceError> {
        self.textures.get(texture).map(Texture::refs)
    }

    /// Reference count of a live model.
    pub fn model_refs(&self, model: ModelRef) -> Result<u32, ResourceError> {
        self.models.get(model).map(Model::refs)
    }

    /// GPU id of a live texture.
    pub fn texture_gpu_id(&self, texture: TextureRef) -> Result<TextureId, ResourceError> {
        self.textures.get(texture).map(Texture::gpu_id)
    }

    /// Path of a live texture.
    pub fn texture_path(&self, texture: TextureRef) -> Result<&str, ResourceError> {
        self.textures.get(texture).map(Texture::path)
    }

    /// A live texture.
    pub fn texture(&self, texture: TextureRef) -> Result<&Texture, ResourceError> {
        self.textures.get(texture)
    }

    /// A live model.
    pub fn model(&self, model: ModelRef) -> Result<&Model, ResourceError> {
        self.models.get(model)
    }

    /// Cached texture for `path`, without taking a reference.
    pub fn find_texture(&self, path: &str) -> Option<TextureRef> {
        self.textures.find(path)
    }

    /// Cached model for `path`, without taking a reference.
    pub fn find_model(&self, path: &str) -> Option<ModelRef> {
        self.models.find(path)
    }

    /// Live textures in slot order.
    pub fn textures(&self) -> impl Iterator<Item = (TextureRef, &Texture)> {
        self.textures.iter()
    }

    /// Live models in slot order.
    pub fn models(&self) -> impl Iterator<Item = (ModelRef, &Model)> {
        self.models.iter()
    }

    /// Pool occupancy.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            textures: PoolStats {
                live: self.textures.len(),
                capacity: self.textures.capacity(),
            },
            models: PoolStats {
                live: self.models.len(),
                capacity: self.models.capacity(),
            },
        }
    }

    /// The graphics device.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// The graphics device, mutably.
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Release everything still cached and report what was leaked.
    ///
    /// Models go first so their texture references are returned before the
    /// texture pool is drained. Calling this again returns an empty report.
    pub fn shutdown(&mut self) -> LeakReport {
        if self.shut_down {
            return LeakReport::default();
        }
        self.shut_down = true;

        let models = self.models.drain(&mut self.textures, &mut self.device);
        for (path, refs) in &models {
            log::warn!("leaked model {path} ({refs} reference(s))");
        }
        let textures = self.textures.drain(&mut self.device);
        for (path, refs) in &textures {
            log::warn!("leaked texture {path} ({refs} reference(s))");
        }
        let report = LeakReport { models, textures };
        if report.is_clean() {
            log::debug!("resource context shut down cleanly");
        }
        report
    }
}

impl<D: GraphicsDevice> Drop for ResourceContext<D> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<D: GraphicsDevice> std::fmt::Debug for ResourceContext<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceContext")
            .field("device", &self.device.name())
            .field("textures", &self.textures.len())
            .field("models", &self.models.len())
            .field("shut_down", &self.shut_down)
            .finish()
    }
}
