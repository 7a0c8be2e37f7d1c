//! wgpu GPU backend implementation.
//!
//! This backend uses wgpu for cross-platform GPU access, supporting
//! Vulkan, Metal, DX12, and WebGPU.
//!
//! wgpu has no vertex array objects; a vertex array here is the recorded
//! buffer pair plus the translated attribute list, ready to be turned into a
//! [`wgpu::VertexBufferLayout`] by a pipeline builder.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::GraphicsError;
use crate::types::{
    AddressMode, BufferDescriptor, BufferUsage, FilterMode, SamplerDescriptor, TextureDescriptor,
    TextureFormat, TextureUsage, VertexAttributeFormat, VertexLayout,
};

use super::{BufferId, GraphicsDevice, TextureId, VertexArrayId};

struct WgpuTexture {
    texture: wgpu::Texture,
    #[allow(dead_code)]
    view: wgpu::TextureView,
    #[allow(dead_code)]
    sampler: wgpu::Sampler,
    descriptor: TextureDescriptor,
}

struct WgpuBuffer {
    buffer: wgpu::Buffer,
    size: u64,
}

/// Buffers and translated attributes bound to a vertex array.
#[derive(Debug, Clone)]
pub struct WgpuVertexBinding {
    /// Vertex buffer.
    pub vertex_buffer: BufferId,
    /// Index buffer.
    pub index_buffer: BufferId,
    /// Bytes between vertices.
    pub stride: u64,
    /// Attributes in wgpu form.
    pub attributes: Vec<wgpu::VertexAttribute>,
}

impl WgpuVertexBinding {
    /// Layout for a render pipeline's vertex state.
    pub fn buffer_layout(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &self.attributes,
        }
    }
}

/// wgpu-based GPU backend.
pub struct WgpuBackend {
    #[allow(dead_code)]
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    next_id: u32,
    textures: HashMap<TextureId, WgpuTexture>,
    buffers: HashMap<BufferId, WgpuBuffer>,
    vertex_arrays: HashMap<VertexArrayId, Option<WgpuVertexBinding>>,
}

impl std::fmt::Debug for WgpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuBackend")
            .field("adapter", &self.adapter.get_info().name)
            .field("textures", &self.textures.len())
            .field("buffers", &self.buffers.len())
            .finish()
    }
}

impl WgpuBackend {
    /// Create a new headless wgpu backend.
    pub fn new() -> Result<Self, GraphicsError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            backend_options: wgpu::BackendOptions::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| GraphicsError::InitializationFailed(format!("no compatible GPU adapter: {e}")))?;

        log::info!("wgpu adapter: {:?}", adapter.get_info());

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Cinder Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            trace: wgpu::Trace::Off,
        }))
        .map_err(|e| GraphicsError::InitializationFailed(format!("device creation failed: {e}")))?;

        Ok(Self {
            instance,
            adapter,
            device: Arc::new(device),
            queue: Arc::new(queue),
            next_id: 0,
            textures: HashMap::new(),
            buffers: HashMap::new(),
            vertex_arrays: HashMap::new(),
        })
    }

    /// Get the wgpu device.
    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    /// Get the wgpu queue.
    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }

    /// Underlying wgpu buffer for an id.
    pub fn wgpu_buffer(&self, id: BufferId) -> Option<&wgpu::Buffer> {
        self.buffers.get(&id).map(|b| &b.buffer)
    }

    /// Configured binding of a vertex array.
    pub fn vertex_binding(&self, id: VertexArrayId) -> Option<&WgpuVertexBinding> {
        self.vertex_arrays.get(&id).and_then(Option::as_ref)
    }

    fn next_raw_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl GraphicsDevice for WgpuBackend {
    fn name(&self) -> &'static str {
        "wgpu Backend"
    }

    fn create_texture(
        &mut self,
        descriptor: &TextureDescriptor,
        sampler: &SamplerDescriptor,
    ) -> Result<TextureId, GraphicsError> {
        if descriptor.size.texel_count() == 0 {
            return Err(GraphicsError::InvalidParameter(format!(
                "empty texture {}x{}",
                descriptor.size.width, descriptor.size.height
            )));
        }
        check_texture_limits(&self.device.limits(), descriptor)?;
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: descriptor.label.as_deref(),
            size: wgpu::Extent3d {
                width: descriptor.size.width,
                height: descriptor.size.height,
                depth_or_array_layers: descriptor.size.depth,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: convert_texture_format(descriptor.format),
            usage: convert_texture_usage(descriptor.usage),
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: descriptor.label.as_deref(),
            address_mode_u: convert_address_mode(sampler.address_mode_u),
            address_mode_v: convert_address_mode(sampler.address_mode_v),
            mag_filter: convert_filter_mode(sampler.mag_filter),
            min_filter: convert_filter_mode(sampler.min_filter),
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let id = TextureId::new(self.next_raw_id()).ok_or_else(|| {
            GraphicsError::AllocationRefused {
                resource: "texture",
                reason: "id space exhausted".to_string(),
            }
        })?;
        self.textures.insert(
            id,
            WgpuTexture {
                texture,
                view,
                sampler,
                descriptor: descriptor.clone(),
            },
        );
        Ok(id)
    }

    fn write_texture(&mut self, texture: TextureId, data: &[u8]) -> Result<(), GraphicsError> {
        let entry = self
            .textures
            .get(&texture)
            .ok_or(GraphicsError::UnknownTexture(texture))?;
        let desc = &entry.descriptor;
        let expected = desc.upload_size();
        if data.len() as u64 != expected {
            return Err(GraphicsError::InvalidUploadSize {
                expected,
                actual: data.len() as u64,
            });
        }

        // wgpu has no 3-channel 8-bit format.
        let expanded;
        let (bytes, bytes_per_pixel) = if desc.format == TextureFormat::Rgb8Unorm {
            expanded = expand_rgb_to_rgba(data);
            (expanded.as_slice(), 4)
        } else {
            (data, desc.format.block_size())
        };

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &entry.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytes,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(desc.size.width * bytes_per_pixel),
                rows_per_image: Some(desc.size.height),
            },
            wgpu::Extent3d {
                width: desc.size.width,
                height: desc.size.height,
                depth_or_array_layers: desc.size.depth,
            },
        );
        Ok(())
    }

    fn destroy_texture(&mut self, texture: TextureId) -> Result<(), GraphicsError> {
        let entry = self
            .textures
            .remove(&texture)
            .ok_or(GraphicsError::UnknownTexture(texture))?;
        entry.texture.destroy();
        Ok(())
    }

    fn create_buffer(&mut self, descriptor: &BufferDescriptor) -> Result<BufferId, GraphicsError> {
        // Writes through the queue need 4-byte aligned sizes.
        let size = descriptor.size.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);
        check_buffer_limits(&self.device.limits(), size)?;
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: descriptor.label.as_deref(),
            size,
            usage: convert_buffer_usage(descriptor.usage),
            mapped_at_creation: false,
        });
        let id = BufferId::new(self.next_raw_id()).ok_or_else(|| {
            GraphicsError::AllocationRefused {
                resource: "buffer",
                reason: "id space exhausted".to_string(),
            }
        })?;
        self.buffers.insert(
            id,
            WgpuBuffer {
                buffer,
                size: descriptor.size,
            },
        );
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
            .get(&buffer)
            .ok_or(GraphicsError::UnknownBuffer(buffer))?;
        if offset.saturating_add(data.len() as u64) > entry.size {
            return Err(GraphicsError::InvalidUploadSize {
                expected: entry.size.saturating_sub(offset),
                actual: data.len() as u64,
            });
        }
        if offset % wgpu::COPY_BUFFER_ALIGNMENT != 0 {
            return Err(GraphicsError::InvalidParameter(format!(
                "buffer write offset {offset} is not 4-byte aligned"
            )));
        }
        if data.len() as u64 % wgpu::COPY_BUFFER_ALIGNMENT == 0 {
            self.queue.write_buffer(&entry.buffer, offset, data);
        } else {
            let mut padded = data.to_vec();
            padded.resize(
                (data.len() as u64).next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT) as usize,
                0,
            );
            self.queue.write_buffer(&entry.buffer, offset, &padded);
        }
        Ok(())
    }

    fn destroy_buffer(&mut self, buffer: BufferId) -> Result<(), GraphicsError> {
        let entry = self
            .buffers
            .remove(&buffer)
            .ok_or(GraphicsError::UnknownBuffer(buffer))?;
        entry.buffer.destroy();
        Ok(())
    }

    fn create_vertex_array(&mut self, _label: Option<&str>) -> Result<VertexArrayId, GraphicsError> {
        let id = VertexArrayId::new(self.next_raw_id()).ok_or_else(|| {
            GraphicsError::AllocationRefused {
                resource: "vertex array",
                reason: "id space exhausted".to_string(),
            }
        })?;
        self.vertex_arrays.insert(id, None);
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
        *binding = Some(WgpuVertexBinding {
            vertex_buffer,
            index_buffer,
            stride: u64::from(layout.stride),
            attributes: layout
                .attributes
                .iter()
                .map(|attr| wgpu::VertexAttribute {
                    format: convert_vertex_format(attr.format),
                    offset: u64::from(attr.offset),
                    shader_location: attr.location,
                })
                .collect(),
        });
        Ok(())
    }

    fn destroy_vertex_array(&mut self, vertex_array: VertexArrayId) -> Result<(), GraphicsError> {
        self.vertex_arrays
            .remove(&vertex_array)
            .ok_or(GraphicsError::UnknownVertexArray(vertex_array))?;
        Ok(())
    }
}

fn expand_rgb_to_rgba(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() / 3 * 4);
    for px in data.chunks_exact(3) {
        out.extend_from_slice(px);
        out.push(0xff);
    }
    out
}

fn convert_buffer_usage(usage: BufferUsage) -> wgpu::BufferUsages {
    let mut result = wgpu::BufferUsages::empty();

    if usage.contains(BufferUsage::VERTEX) {
        result |= wgpu::BufferUsages::VERTEX;
    }
    if usage.contains(BufferUsage::INDEX) {
        result |= wgpu::BufferUsages::INDEX;
    }
    if usage.contains(BufferUsage::COPY_DST) {
        result |= wgpu::BufferUsages::COPY_DST;
    }

    result
}

fn convert_texture_format(format: TextureFormat) -> wgpu::TextureFormat {
    match format {
        TextureFormat::R8Unorm => wgpu::TextureFormat::R8Unorm,
        TextureFormat::Rg8Unorm => wgpu::TextureFormat::Rg8Unorm,
        TextureFormat::Rgb8Unorm | TextureFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
    }
}

fn convert_texture_usage(usage: TextureUsage) -> wgpu::TextureUsages {
    let mut result = wgpu::TextureUsages::empty();

    if usage.contains(TextureUsage::COPY_DST) {
        result |= wgpu::TextureUsages::COPY_DST;
    }
    if usage.contains(TextureUsage::TEXTURE_BINDING) {
        result |= wgpu::TextureUsages::TEXTURE_BINDING;
    }

    result
}

fn convert_address_mode(mode: AddressMode) -> wgpu::AddressMode {
    match mode {
        AddressMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        AddressMode::Repeat => wgpu::AddressMode::Repeat,
        AddressMode::MirrorRepeat => wgpu::AddressMode::MirrorRepeat,
    }
}

fn convert_filter_mode(mode: FilterMode) -> wgpu::FilterMode {
    match mode {
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
        FilterMode::Linear => wgpu::FilterMode::Linear,
    }
}

fn convert_vertex_format(format: VertexAttributeFormat) -> wgpu::VertexFormat {
    match format {
        VertexAttributeFormat::Float2 => wgpu::VertexFormat::Float32x2,
        VertexAttributeFormat::Float3 => wgpu::VertexFormat::Float32x3,
        VertexAttributeFormat::Float4 => wgpu::VertexFormat::Float32x4,
        VertexAttributeFormat::Int4 => wgpu::VertexFormat::Sint32x4,
    }
}

/// wgpu reports oversized resources through the uncaptured error handler,
/// so they are refused here first.
fn check_texture_limits(
    limits: &wgpu::Limits,
    descriptor: &TextureDescriptor,
) -> Result<(), GraphicsError> {
    let size = descriptor.size;
    let max = limits.max_texture_dimension_2d;
    if size.width > max || size.height > max {
        return Err(GraphicsError::AllocationRefused {
            resource: "texture",
            reason: format!(
                "{}x{} exceeds the {max} texel dimension limit",
                size.width, size.height
            ),
        });
    }
    if size.depth > limits.max_texture_array_layers {
        return Err(GraphicsError::AllocationRefused {
            resource: "texture",
            reason: format!(
                "{} layers exceeds the {} layer limit",
                size.depth, limits.max_texture_array_layers
            ),
        });
    }
    Ok(())
}

fn check_buffer_limits(limits: &wgpu::Limits, size: u64) -> Result<(), GraphicsError> {
    if size > limits.max_buffer_size {
        return Err(GraphicsError::AllocationRefused {
            resource: "buffer",
            reason: format!(
                "{size} bytes exceeds the {} byte limit",
                limits.max_buffer_size
            ),
        });
    }
    Ok(())
}
