//! Path-keyed, reference-counted texture cache.
//!
//! The cache key is the literal path string. Two spellings of the same file
//! are two entries.

use std::path::Path;

use cinder_assets::ImageDecoder;
use cinder_core::hash::bucket_of;
use cinder_core::{Handle, ResourcePool};
use cinder_graphics::types::{TextureDescriptor, TextureFormat, TextureUsage};
use cinder_graphics::{GraphicsDevice, SamplerDescriptor, TextureId};

use crate::config::check_size;
use crate::error::ResourceError;

const CACHE: &str = "texture";

/// Counted reference to a cached texture.
///
/// Every successful load hands out one reference that must be given back to
/// [`TextureCache::free`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureRef(pub(crate) Handle);

impl TextureRef {
    /// Underlying pool handle.
    pub fn handle(&self) -> Handle {
        self.0
    }

    /// Rebuild a reference from a raw handle. It is validated on use.
    pub fn from_handle(handle: Handle) -> Self {
        Self(handle)
    }
}

/// A cached texture.
#[derive(Debug)]
pub struct Texture {
    gpu: TextureId,
    refs: u32,
    path: String,
    width: u32,
    height: u32,
    channels: u8,
}

impl Texture {
    /// GPU texture id.
    pub fn gpu_id(&self) -> TextureId {
        self.gpu
    }

    /// Outstanding references.
    pub fn refs(&self) -> u32 {
        self.refs
    }

    /// Cache key.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Size in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Channels per pixel (3 or 4).
    pub fn channels(&self) -> u8 {
        self.channels
    }
}

/// Fixed-capacity texture cache.
#[derive(Debug)]
pub struct TextureCache {
    pool: ResourcePool<Texture>,
}

impl TextureCache {
    /// Preallocate the cache. Zero slots or buckets are rejected.
    pub fn new(capacity: usize, buckets: usize) -> Result<Self, ResourceError> {
        check_size("texture_capacity", capacity)?;
        check_size("texture_buckets", buckets)?;
        Ok(Self {
            pool: ResourcePool::new(capacity, buckets),
        })
    }

    /// Load `path`, or take another reference to it if already cached.
    ///
    /// Pool space is checked before decoding: a miss on a full cache fails
    /// with an exhausted error even when `path` is unreadable.
    pub fn load(
        &mut self,
        device: &mut dyn GraphicsDevice,
        decoder: &dyn ImageDecoder,
        path: &str,
    ) -> Result<TextureRef, ResourceError> {
        if path.is_empty() {
            return Err(ResourceError::NullArgument.report());
        }

        let bucket = bucket_of(path, self.pool.bucket_count());
        if let Some(handle) = self.pool.find(bucket, |t| t.path == path) {
            let texture = self
                .pool
                .get_mut(handle)
                .map_err(|e| ResourceError::from_pool(CACHE, e).report())?;
            texture.refs += 1;
            log::trace!("texture cache hit {path} (refs {})", texture.refs);
            return Ok(TextureRef(handle));
        }

        if self.pool.is_full() {
            return Err(ResourceError::Exhausted {
                cache: CACHE,
                capacity: self.pool.capacity(),
            }
            .report());
        }

        let image = decoder
            .decode(Path::new(path))
            .map_err(|source| {
                ResourceError::Decode {
                    path: path.to_string(),
                    source,
                }
                .report()
            })?;
        let format = match image.channels {
            3 => TextureFormat::Rgb8Unorm,
            4 => TextureFormat::Rgba8Unorm,
            channels => {
                return Err(ResourceError::UnsupportedChannels {
                    path: path.to_string(),
                    channels,
                }
                .report());
            }
        };

        let graphics_error = |source| {
            ResourceError::Graphics {
                path: path.to_string(),
                source,
            }
            .report()
        };
        let descriptor = TextureDescriptor::new_2d(
            image.width,
            image.height,
            format,
            TextureUsage::COPY_DST | TextureUsage::TEXTURE_BINDING,
        )
        .with_label(path);
        let gpu = device
            .create_texture(&descriptor, &SamplerDescriptor::cache_default())
            .map_err(graphics_error)?;
        if let Err(source) = device.write_texture(gpu, &image.pixels) {
            destroy_gpu_texture(device, gpu);
            return Err(graphics_error(source));
        }

        let texture = Texture {
            gpu,
            refs: 1,
            path: path.to_string(),
            width: image.width,
            height: image.height,
            channels: image.channels,
        };
        let handle = match self.pool.acquire(texture) {
            Ok(handle) => handle,
            Err(e) => {
                destroy_gpu_texture(device, gpu);
                return Err(ResourceError::from_pool(CACHE, e).report());
            }
        };
        if let Err(e) = self.pool.insert(handle, bucket) {
            let _ = self.pool.release(handle);
            destroy_gpu_texture(device, gpu);
            return Err(ResourceError::from_pool(CACHE, e).report());
        }

        log::info!(
            "Newly loaded texture {path} ({}x{}, {} channels) as {gpu}",
            image.width,
            image.height,
            image.channels
        );
        Ok(TextureRef(handle))
    }

    /// Give back one reference. The texture is destroyed when the last one
    /// is returned.
    pub fn free(
        &mut self,
        device: &mut dyn GraphicsDevice,
        texture: TextureRef,
    ) -> Result<(), ResourceError> {
        let handle = texture.0;
        let buckets = self.pool.bucket_count();
        let entry = self
            .pool
            .get_mut(handle)
            .map_err(|e| ResourceError::from_pool(CACHE, e).report())?;
        if entry.refs == 0 {
            return Err(ResourceError::RefcountUnderflow {
                cache: CACHE,
                path: entry.path.clone(),
            }
            .report());
        }
        entry.refs -= 1;
        if entry.refs > 0 {
            log::trace!("texture {} released (refs {})", entry.path, entry.refs);
            return Ok(());
        }

        let bucket = bucket_of(&entry.path, buckets);
        self.pool
            .remove(handle, bucket)
            .map_err(|e| ResourceError::from_pool(CACHE, e).report())?;
        let entry = self
            .pool
            .release(handle)
            .map_err(|e| ResourceError::from_pool(CACHE, e).report())?;
        destroy_gpu_texture(device, entry.gpu);
        log::info!("Unloaded texture {}", entry.path);
        Ok(())
    }

    /// Look up a live texture.
    pub fn get(&self, texture: TextureRef) -> Result<&Texture, ResourceError> {
        self.pool
            .get(texture.0)
            .map_err(|e| ResourceError::from_pool(CACHE, e))
    }

    /// Find a cached texture by path without taking a reference.
    pub fn find(&self, path: &str) -> Option<TextureRef> {
        let bucket = bucket_of(path, self.pool.bucket_count());
        self.pool.find(bucket, |t| t.path == path).map(TextureRef)
    }

    /// Live textures in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (TextureRef, &Texture)> {
        self.pool.iter().map(|(h, t)| (TextureRef(h), t))
    }

    /// Number of live textures.
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    /// Whether no textures are live.
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Pool capacity.
    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Drop every live texture regardless of its count, returning the
    /// paths and counts that were still held.
    pub(crate) fn drain(&mut self, device: &mut dyn GraphicsDevice) -> Vec<(String, u32)> {
        let live: Vec<TextureRef> = self.iter().map(|(r, _)| r).collect();
        let mut leaked = Vec::with_capacity(live.len());
        for texture in live {
            let handle = texture.0;
            let Ok(bucket) = self.pool.bucket_of(handle) else {
                continue;
            };
            if let Some(bucket) = bucket
                && let Err(e) = self.pool.remove(handle, bucket)
            {
                log::error!("texture drain: {e}");
            }
            match self.pool.release(handle) {
                Ok(entry) => {
                    destroy_gpu_texture(device, entry.gpu);
                    leaked.push((entry.path, entry.refs));
                }
                Err(e) => log::error!("texture drain: {e}"),
            }
        }
        leaked
    }
}

/// Best-effort GPU cleanup; failures are logged, not escalated.
fn destroy_gpu_texture(device: &mut dyn GraphicsDevice, gpu: TextureId) {
    if let Err(e) = device.destroy_texture(gpu) {
        log::error!("failed to destroy texture {gpu}: {e}");
    }
}
