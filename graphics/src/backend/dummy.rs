//! Dummy GPU backend for testing and development.
//!
//! This backend doesn't touch a GPU. It keeps every live resource and its
//! uploaded bytes in memory so callers can inspect exactly what would have
//! reached the device, and it can be told to refuse allocations.
//!
//! Ids are handed out from a single monotonic counter and are never reused.

use std::collections::HashMap;

use crate::error::GraphicsError;
use crate::types::{BufferDescriptor, SamplerDescriptor, TextureDescriptor, VertexLayout};

use super::{BufferId, GraphicsDevice, TextureId, VertexArrayId};

/// A texture held by the dummy backend.
#[derive(Debug, Clone)]
pub struct DummyTexture {
    /// Creation descriptor.
    pub descriptor: TextureDescriptor,
    /// Sampling state attached at creation.
    pub sampler: SamplerDescriptor,
    /// Last uploaded pixel data.
    pub data: Option<Vec<u8>>,
}

/// A buffer held by the dummy backend.
#[derive(Debug, Clone)]
pub struct DummyBuffer {
    /// Creation descriptor.
    pub descriptor: BufferDescriptor,
    /// Buffer contents, zero-initialised.
    pub data: Vec<u8>,
}

/// Buffers and layout bound to a vertex array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexBinding {
    /// Vertex buffer.
    pub vertex_buffer: BufferId,
    /// Index buffer.
    pub index_buffer: BufferId,
    /// Attribute layout.
    pub layout: VertexLayout,
}

/// Running totals of backend calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DummyStats {
    /// Textures successfully created.
    pub textures_created: usize,
    /// Textures destroyed.
    pub textures_destroyed: usize,
    /// Buffers successfully created.
    pub buffers_created: usize,
    /// Buffers destroyed.
    pub buffers_destroyed: usize,
    /// Vertex arrays successfully created.
    pub vertex_arrays_created: usize,
    /// Vertex arrays destroyed.
    pub vertex_arrays_destroyed: usize,
    /// Texture uploads.
    pub texture_writes: usize,
    /// Buffer uploads.
    pub buffer_writes: usize,
}

/// Allocation countdown. `Some(0)` refuses every request until cleared.
#[derive(Debug, Clone, Copy, Default)]
struct Countdown(Option<usize>);

impl Countdown {
    fn tick(&mut self) -> bool {
        match &mut self.0 {
            None => true,
            Some(0) => false,
            Some(n) => {
                *n -= 1;
                true
            }
        }
    }
}

/// Dummy GPU backend.
#[derive(Debug, Default)]
pub struct DummyBackend {
    next_id: u32,
    textures: HashMap<TextureId, DummyTexture>,
    buffers: HashMap<BufferId, DummyBuffer>,
    vertex_arrays: HashMap<VertexArrayId, Option<VertexBinding>>,
    texture_budget: Countdown,
    buffer_budget: Countdown,
    vertex_array_budget: Countdown,
    stats: DummyStats,
}

impl DummyBackend {
    /// Create a new dummy backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `successes` more texture allocations, then refuse the rest.
    pub fn fail_texture_allocations_after(&mut self, successes: usize) {
        self.texture_budget = Countdown(Some(successes));
    }

    /// Allow `successes` more buffer allocations, then refuse the rest.
    pub fn fail_buffer_allocations_after(&mut self, successes: usize) {
        self.buffer_budget = Countdown(Some(successes));
    }

    /// Allow `successes` more vertex array allocations, then refuse the rest.
    pub fn fail_vertex_array_allocations_after(&mut self, successes: usize) {
        self.vertex_array_budget = Countdown(Some(successes));
    }

    /// Remove every injected failure.
    pub fn clear_failures(&mut self) {
        self.texture_budget = Countdown::default();
        self.buffer_budget = Countdown::default();
        self.vertex_array_budget = Countdown::default();
    }

    /// Call totals so far.
    pub fn stats(&self) -> DummyStats {
        self.stats
    }

    /// Look up a live texture.
    pub fn texture(&self, id: TextureId) -> Option<&DummyTexture> {
        self.textures.get(&id)
    }

    /// Look up a live buffer.
    pub fn buffer(&self, id: BufferId) -> Option<&DummyBuffer> {
        self.buffers.get(&id)
    }

    /// Contents of a live buffer.
    pub fn buffer_data(&self, id: BufferId) -> Option<&[u8]> {
        self.buffers.get(&id).map(|b| b.data.as_slice())
    }

    /// Binding of a live vertex array, if it has been configured.
    pub fn vertex_binding(&self, id: VertexArrayId) -> Option<&VertexBinding> {
        self.vertex_arrays.get(&id).and_then(Option::as_ref)
    }

    /// Whether the texture is live.
    pub fn is_texture_live(&self, id: TextureId) -> bool {
        self.textures.contains_key(&id)
    }

    /// Whether the buffer is live.
    pub fn is_buffer_live(&self, id: BufferId) -> bool {
        self.buffers.contains_key(&id)
    }

    /// Whether the vertex array is live.
    pub fn is_vertex_array_live(&self, id: VertexArrayId) -> bool {
        self.vertex_arrays.contains_key(&id)
    }

    /// Number of live textures.
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// Number of live buffers.
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Number of live vertex arrays.
    pub fn live_vertex_arrays(&self) -> usize {
        self.vertex_arrays.len()
    }

    fn next_raw_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn refused(resource: &'static str) -> GraphicsError {
        log::error!("DummyBackend: refusing {resource} allocation");
        GraphicsError::AllocationRefused {
            resource,
            reason: "injected failure".to_string(),
        }
    }
}

impl GraphicsDevice for DummyBackend {
    fn name(&self) -> &'static str {
        "Dummy Backend"
    }

    fn create_texture(
        &mut self,
        descriptor: &TextureDescriptor,
        sampler: &SamplerDescriptor,
    ) -> Result<TextureId, GraphicsError> {
        if !self.texture_budget.tick() {
            return Err(Self::refused("texture"));
        }
        if descriptor.size.texel_count() == 0 {
            return Err(GraphicsError::InvalidParameter(format!(
                "empty texture {}x{}",
                descriptor.size.width, descriptor.size.height
            )));
        }
        let id = TextureId::new(self.next_raw_id())
            .ok_or_else(|| Self::refused("texture"))?;
        log::trace!(
            "DummyBackend: creating texture {id} {:?} ({}x{} {:?})",
            descriptor.label,
            descriptor.size.width,
            descriptor.size.height,
            descriptor.format
        );
        self.textures.insert(
            id,
            DummyTexture {
                descriptor: descriptor.clone(),
                sampler: *sampler,
                data: None,
            },
        );
        self.stats.textures_created += 1;
        Ok(id)
    }

    fn write_texture(&mut self, texture: TextureId, data: &[u8]) -> Result<(), GraphicsError> {
        let entry = self
            .textures
            .get_mut(&texture)
            .ok_or(GraphicsError::UnknownTexture(texture))?;
        let expected = entry.descriptor.upload_size();
        if data.len() as u64 != expected {
            return Err(GraphicsError::InvalidUploadSize {
                expected,
                actual: data.len() as u64,
            });
        }
        log::trace!("DummyBackend: writing {} bytes to {texture}", data.len());
        entry.data = Some(data.to_vec());
        self.stats.texture_writes += 1;
        Ok(())
    }

    fn destroy_texture(&mut self, texture: TextureId) -> Result<(), GraphicsError> {
        self.textures
            .remove(&texture)
            .ok_or(GraphicsError::UnknownTexture(texture))?;
        log::trace!("DummyBackend: destroyed {texture}");
        self.stats.textures_destroyed += 1;
        Ok(())
    }

    fn create_buffer(&mut self, descriptor: &BufferDescriptor) -> Result<BufferId, GraphicsError> {
        if !self.buffer_budget.tick() {
            return Err(Self::refused("buffer"));
        }
        let size = usize::try_from(descriptor.size).map_err(|_| {
            GraphicsError::InvalidParameter(format!("buffer size {} too large", descriptor.size))
        })?;
        let id = BufferId::new(self.next_raw_id()).ok_or_else(|| Self::refused("buffer"))?;
        log::trace!(
            "DummyBackend: creating buffer {id} {:?} (size: {})",
            descriptor.label,
            descriptor.size
        );
        self.buffers.insert(
            id,
            DummyBuffer {
                descriptor: descriptor.clone(),
                data: vec![0; size],
            },
        );
        self.stats.buffers_created += 1;
        Ok(id)
    }

    fn write_buffer(
        &mut self,
        buffer: BufferId,
        offset: u64,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        let entry = self
            .buffers
            .get_mut(&buffer)
            .ok_or(GraphicsError::UnknownBuffer(buffer))?;
        let size = entry.data.len() as u64;
        let end = offset.saturating_add(data.len() as u64);
        if end > size {
            return Err(GraphicsError::InvalidUploadSize {
                expected: size.saturating_sub(offset),
                actual: data.len() as u64,
            });
        }
        let start = offset as usize;
        entry.data[start..start + data.len()].copy_from_slice(data);
        log::trace!(
            "DummyBackend: writing {} bytes to {buffer} at {offset}",
            data.len()
        );
        self.stats.buffer_writes += 1;
        Ok(())
    }

    fn destroy_buffer(&mut self, buffer: BufferId) -> Result<(), GraphicsError> {
        self.buffers
            .remove(&buffer)
            .ok_or(GraphicsError::UnknownBuffer(buffer))?;
        log::trace!("DummyBackend: destroyed {buffer}");
        self.stats.buffers_destroyed += 1;
        Ok(())
    }

    fn create_vertex_array(&mut self, label: Option<&str>) -> Result<VertexArrayId, GraphicsError> {
        if !self.vertex_array_budget.tick() {
            return Err(Self::refused("vertex array"));
        }
        let id = VertexArrayId::new(self.next_raw_id())
            .ok_or_else(|| Self::refused("vertex array"))?;
        log::trace!("DummyBackend: creating vertex array {id} {label:?}");
        self.vertex_arrays.insert(id, None);
        self.stats.vertex_arrays_created += 1;
        Ok(id)
    }

    fn configure_vertex_layout(
        &mut self,
        vertex_array: VertexArrayId,
        vertex_buffer: BufferId,
        index_buffer: BufferId,
        layout: &VertexLayout,
    ) -> Result<(), GraphicsError> {
        for id in [vertex_buffer, index_buffer] {
            if !self.buffers.contains_key(&id) {
                return Err(GraphicsError::UnknownBuffer(id));
            }
        }
        layout.validate().map_err(GraphicsError::InvalidParameter)?;
        let binding = self
            .vertex_arrays
            .get_mut(&vertex_array)
            .ok_or(GraphicsError::UnknownVertexArray(vertex_array))?;
        *binding = Some(VertexBinding {
            vertex_buffer,
            index_buffer,
            layout: layout.clone(),
        });
        Ok(())
    }

    fn destroy_vertex_array(&mut self, vertex_array: VertexArrayId) -> Result<(), GraphicsError> {
        self.vertex_arrays
            .remove(&vertex_array)
            .ok_or(GraphicsError::UnknownVertexArray(vertex_array))?;
        log::trace!("DummyBackend: destroyed {vertex_array}");
        self.stats.vertex_arrays_destroyed += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BufferUsage, TextureFormat, TextureUsage};

    fn rgba(width: u32, height: u32) -> TextureDescriptor {
        TextureDescriptor::new_2d(width, height, TextureFormat::Rgba8Unorm, TextureUsage::COPY_DST)
    }

    #[test]
    fn test_texture_lifecycle() {
        let mut backend = DummyBackend::new();
        let id = backend
            .create_texture(&rgba(2, 2), &SamplerDescriptor::cache_default())
            .unwrap();
        backend.write_texture(id, &[0xff; 16]).unwrap();
        assert_eq!(backend.texture(id).unwrap().data.as_deref(), Some(&[0xff; 16][..]));

        backend.destroy_texture(id).unwrap();
        assert!(!backend.is_texture_live(id));
        assert_eq!(
            backend.destroy_texture(id),
            Err(GraphicsError::UnknownTexture(id))
        );
    }

    #[test]
    fn test_ids_never_reused() {
        let mut backend = DummyBackend::new();
        let sampler = SamplerDescriptor::default();
        let first = backend.create_texture(&rgba(1, 1), &sampler).unwrap();
        backend.destroy_texture(first).unwrap();
        let second = backend.create_texture(&rgba(1, 1), &sampler).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_texture_upload_size_checked() {
        let mut backend = DummyBackend::new();
        let id = backend
            .create_texture(&rgba(2, 1), &SamplerDescriptor::default())
            .unwrap();
        assert_eq!(
            backend.write_texture(id, &[0; 7]),
            Err(GraphicsError::InvalidUploadSize {
                expected: 8,
                actual: 7
            })
        );
    }

    #[test]
    fn test_injected_failure() {
        let mut backend = DummyBackend::new();
        backend.fail_buffer_allocations_after(1);
        let desc = BufferDescriptor::new(4, BufferUsage::VERTEX);
        assert!(backend.create_buffer(&desc).is_ok());
        assert!(matches!(
            backend.create_buffer(&desc),
            Err(GraphicsError::AllocationRefused { .. })
        ));
        backend.clear_failures();
        assert!(backend.create_buffer(&desc).is_ok());
        assert_eq!(backend.stats().buffers_created, 2);
    }

    #[test]
    fn test_buffer_write_bounds() {
        let mut backend = DummyBackend::new();
        let id = backend
            .create_buffer(&BufferDescriptor::new(8, BufferUsage::INDEX))
            .unwrap();
        backend.write_buffer(id, 4, &[1, 2, 3, 4]).unwrap();
        assert_eq!(backend.buffer_data(id), Some(&[0, 0, 0, 0, 1, 2, 3, 4][..]));
        assert!(backend.write_buffer(id, 6, &[0; 4]).is_err());
    }

    #[test]
    fn test_vertex_layout_binding() {
        let mut backend = DummyBackend::new();
        let vao = backend.create_vertex_array(None).unwrap();
        let vbo = backend
            .create_buffer(&BufferDescriptor::new(64, BufferUsage::VERTEX))
            .unwrap();
        let ebo = backend
            .create_buffer(&BufferDescriptor::new(12, BufferUsage::INDEX))
            .unwrap();
        let layout = VertexLayout::new(64);
        backend
            .configure_vertex_layout(vao, vbo, ebo, &layout)
            .unwrap();
        let binding = backend.vertex_binding(vao).unwrap();
        assert_eq!(binding.vertex_buffer, vbo);
        assert_eq!(binding.index_buffer, ebo);
    }
}
