//! Path-keyed, reference-counted model cache.
//!
//! A model is every mesh of an imported scene flattened into one vertex
//! buffer and one index buffer, with one [`Submodel`] draw range per mesh.
//! Each submodel holds a counted reference to its diffuse texture, so a
//! model keeps its textures alive until it is freed.

use std::path::Path;

use cinder_assets::{ImageDecoder, ImportFlags, ImportedScene, SceneImporter};
use cinder_core::hash::bucket_of;
use cinder_core::{Handle, ResourcePool};
use cinder_graphics::{
    BufferDescriptor, BufferId, BufferUsage, GraphicsDevice, GraphicsError, TextureId,
    VertexArrayId,
};

use crate::config::check_size;
use crate::error::ResourceError;
use crate::skinning::{Bone, SkinAssembler};
use crate::texture::{TextureCache, TextureRef};
use crate::vertex::Vertex;

const CACHE: &str = "model";

/// Bytes per index in the index buffer.
pub const INDEX_SIZE: u64 = std::mem::size_of::<u32>() as u64;

/// Counted reference to a cached model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelRef(pub(crate) Handle);

impl ModelRef {
    /// Underlying pool handle.
    pub fn handle(&self) -> Handle {
        self.0
    }

    /// Rebuild a reference from a raw handle. It is validated on use.
    pub fn from_handle(handle: Handle) -> Self {
        Self(handle)
    }
}

/// One mesh's range of the shared index buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Submodel {
    /// Indices to draw, three per triangle.
    pub index_count: u32,
    /// Byte offset of the first index.
    pub byte_offset: u64,
    /// Owned reference to the diffuse texture.
    pub diffuse: TextureRef,
    /// GPU id of the diffuse texture.
    pub diffuse_gpu: TextureId,
}

/// Everything the draw submitter needs for one submodel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawRange {
    /// Vertex array to bind.
    pub vertex_array: VertexArrayId,
    /// Indices to draw.
    pub index_count: u32,
    /// Byte offset into the index buffer.
    pub index_byte_offset: u64,
    /// Texture to bind.
    pub texture: TextureId,
}

/// A cached model.
#[derive(Debug)]
pub struct Model {
    path: String,
    refs: u32,
    vertex_array: VertexArrayId,
    vertex_buffer: BufferId,
    index_buffer: BufferId,
    submodels: Vec<Submodel>,
    bones: Vec<Bone>,
    vertex_count: u32,
    face_count: u32,
}

impl Model {
    /// Cache key.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Outstanding references.
    pub fn refs(&self) -> u32 {
        self.refs
    }

    /// Vertex array id.
    pub fn vertex_array(&self) -> VertexArrayId {
        self.vertex_array
    }

    /// Shared vertex buffer id.
    pub fn vertex_buffer(&self) -> BufferId {
        self.vertex_buffer
    }

    /// Shared index buffer id.
    pub fn index_buffer(&self) -> BufferId {
        self.index_buffer
    }

    /// Submodels in scene order.
    pub fn submodels(&self) -> &[Submodel] {
        &self.submodels
    }

    /// Bones in first-seen order.
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    /// Vertices across all submodels.
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Triangles across all submodels.
    pub fn face_count(&self) -> u32 {
        self.face_count
    }

    /// Draw ranges in scene order.
    pub fn draw_ranges(&self) -> impl Iterator<Item = DrawRange> + '_ {
        self.submodels.iter().map(|s| DrawRange {
            vertex_array: self.vertex_array,
            index_count: s.index_count,
            index_byte_offset: s.byte_offset,
            texture: s.diffuse_gpu,
        })
    }
}

/// Directory part of `path`, including the trailing separator, and whether
/// that separator is a backslash. Empty when `path` has no separator.
pub fn model_directory(path: &str) -> (&str, bool) {
    match path.rfind(['/', '\\']) {
        Some(at) => (&path[..=at], path.as_bytes()[at] == b'\\'),
        None => ("", false),
    }
}

/// Fixed-capacity model cache.
#[derive(Debug)]
pub struct ModelCache {
    pool: ResourcePool<Model>,
}

impl ModelCache {
    /// Preallocate the cache. Zero slots or buckets are rejected.
    pub fn new(capacity: usize, buckets: usize) -> Result<Self, ResourceError> {
        check_size("model_capacity", capacity)?;
        check_size("model_buckets", buckets)?;
        Ok(Self {
            pool: ResourcePool::new(capacity, buckets),
        })
    }

    /// Load `path`, or take another reference to it if already cached.
    ///
    /// A miss on a full cache fails with an exhausted error before the
    /// importer runs, so an unreadable file is never opened in that case.
    pub fn load(
        &mut self,
        textures: &mut TextureCache,
        device: &mut dyn GraphicsDevice,
        importer: &dyn SceneImporter,
        decoder: &dyn ImageDecoder,
        path: &str,
    ) -> Result<ModelRef, ResourceError> {
        if path.is_empty() {
            return Err(ResourceError::NullArgument.report());
        }

        let bucket = bucket_of(path, self.pool.bucket_count());
        if let Some(handle) = self.pool.find(bucket, |m| m.path == path) {
            let model = self
                .pool
                .get_mut(handle)
                .map_err(|e| ResourceError::from_pool(CACHE, e).report())?;
            model.refs += 1;
            log::trace!("model cache hit {path} (refs {})", model.refs);
            return Ok(ModelRef(handle));
        }

        if self.pool.is_full() {
            return Err(ResourceError::Exhausted {
                cache: CACHE,
                capacity: self.pool.capacity(),
            }
            .report());
        }

        let mut allocations = Allocations::default();
        let model = match assemble(textures, device, importer, decoder, path, &mut allocations) {
            Ok(model) => model,
            Err(e) => {
                allocations.unwind(textures, device);
                return Err(e);
            }
        };

        let handle = match self.pool.acquire(model) {
            Ok(handle) => handle,
            Err(e) => {
                allocations.unwind(textures, device);
                return Err(ResourceError::from_pool(CACHE, e).report());
            }
        };
        if let Err(e) = self.pool.insert(handle, bucket) {
            let _ = self.pool.release(handle);
            allocations.unwind(textures, device);
            return Err(ResourceError::from_pool(CACHE, e).report());
        }
        Ok(ModelRef(handle))
    }

    /// Give back one reference. `None` is accepted and does nothing.
    ///
    /// When the last reference goes, the GPU geometry is destroyed and each
    /// submodel's texture reference is returned to `textures`.
    pub fn free(
        &mut self,
        textures: &mut TextureCache,
        device: &mut dyn GraphicsDevice,
        model: Option<ModelRef>,
    ) -> Result<(), ResourceError> {
        let Some(ModelRef(handle)) = model else {
            return Ok(());
        };
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
            log::trace!("model {} released (refs {})", entry.path, entry.refs);
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
        let result = teardown(entry, textures, device);
        if let Ok(path) = &result {
            log::info!("Unloaded model {path}");
        }
        result.map(drop)
    }

    /// Look up a live model.
    pub fn get(&self, model: ModelRef) -> Result<&Model, ResourceError> {
        self.pool
            .get(model.0)
            .map_err(|e| ResourceError::from_pool(CACHE, e))
    }

    /// Find a cached model by path without taking a reference.
    pub fn find(&self, path: &str) -> Option<ModelRef> {
        let bucket = bucket_of(path, self.pool.bucket_count());
        self.pool.find(bucket, |m| m.path == path).map(ModelRef)
    }

    /// Live models in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (ModelRef, &Model)> {
        self.pool.iter().map(|(h, m)| (ModelRef(h), m))
    }

    /// Number of live models.
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    /// Whether no models are live.
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Pool capacity.
    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Tear down every live model regardless of its count, returning the
    /// paths and counts that were still held.
    pub(crate) fn drain(
        &mut self,
        textures: &mut TextureCache,
        device: &mut dyn GraphicsDevice,
    ) -> Vec<(String, u32)> {
        let live: Vec<ModelRef> = self.iter().map(|(r, _)| r).collect();
        let mut leaked = Vec::with_capacity(live.len());
        for model in live {
            let handle = model.0;
            if let Ok(Some(bucket)) = self.pool.bucket_of(handle)
                && let Err(e) = self.pool.remove(handle, bucket)
            {
                log::error!("model drain: {e}");
            }
            match self.pool.release(handle) {
                Ok(entry) => {
                    let refs = entry.refs;
                    match teardown(entry, textures, device) {
                        Ok(path) => leaked.push((path, refs)),
                        Err(e) => log::error!("model drain: {e}"),
                    }
                }
                Err(e) => log::error!("model drain: {e}"),
            }
        }
        leaked
    }
}

/// Destroy a released model's GPU objects and return its texture
/// references. Every step runs; the first texture error is returned.
fn teardown(
    model: Model,
    textures: &mut TextureCache,
    device: &mut dyn GraphicsDevice,
) -> Result<String, ResourceError> {
    destroy_logged(device.destroy_vertex_array(model.vertex_array));
    destroy_logged(device.destroy_buffer(model.vertex_buffer));
    destroy_logged(device.destroy_buffer(model.index_buffer));

    let mut first_error = None;
    for submodel in &model.submodels {
        if let Err(e) = textures.free(device, submodel.diffuse) {
            first_error.get_or_insert(e);
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(model.path),
    }
}

fn destroy_logged(result: Result<(), GraphicsError>) {
    if let Err(e) = result {
        log::error!("failed to destroy model resource: {e}");
    }
}

/// What a model load has allocated so far.
#[derive(Debug, Default)]
struct Allocations {
    vertex_array: Option<VertexArrayId>,
    vertex_buffer: Option<BufferId>,
    index_buffer: Option<BufferId>,
    textures: Vec<TextureRef>,
}

impl Allocations {
    /// Best-effort release of everything recorded.
    fn unwind(self, textures: &mut TextureCache, device: &mut dyn GraphicsDevice) {
        for texture in self.textures {
            if let Err(e) = textures.free(device, texture) {
                log::error!("cleanup after failed model load: {e}");
            }
        }
        if let Some(vao) = self.vertex_array {
            destroy_logged(device.destroy_vertex_array(vao));
        }
        for buffer in [self.vertex_buffer, self.index_buffer].into_iter().flatten() {
            destroy_logged(device.destroy_buffer(buffer));
        }
    }
}

/// Import `path` and build a fully uploaded model with `refs == 1`.
fn assemble(
    textures: &mut TextureCache,
    device: &mut dyn GraphicsDevice,
    importer: &dyn SceneImporter,
    decoder: &dyn ImageDecoder,
    path: &str,
    allocations: &mut Allocations,
) -> Result<Model, ResourceError> {
    let (directory, backslash) = model_directory(path);
    if backslash {
        log::warn!("Windows style paths are largely untested: {path}");
    }

    let scene = importer
        .import(Path::new(path), ImportFlags::MODEL_DEFAULT)
        .map_err(|source| {
            ResourceError::Import {
                path: path.to_string(),
                source,
            }
            .report()
        })?;
    if scene.meshes.is_empty() {
        return Err(ResourceError::NoMeshes {
            path: path.to_string(),
        }
        .report());
    }

    let invalid = |reason: String| {
        ResourceError::InvalidScene {
            path: path.to_string(),
            reason,
        }
        .report()
    };
    let (vertex_count, face_count, index_count) = scene_totals(&scene).map_err(invalid)?;
    log::info!(
        "Loading model {path} ({} meshes, {face_count} tris)",
        scene.meshes.len()
    );

    let graphics = |source| {
        ResourceError::Graphics {
            path: path.to_string(),
            source,
        }
        .report()
    };
    let vertex_array = device.create_vertex_array(Some(path)).map_err(graphics)?;
    allocations.vertex_array = Some(vertex_array);
    let vertex_buffer = device
        .create_buffer(
            &BufferDescriptor::new(
                u64::from(vertex_count) * u64::from(Vertex::STRIDE),
                BufferUsage::VERTEX | BufferUsage::COPY_DST,
            )
            .with_label(format!("{path} vertices")),
        )
        .map_err(graphics)?;
    allocations.vertex_buffer = Some(vertex_buffer);
    let index_buffer = device
        .create_buffer(
            &BufferDescriptor::new(
                u64::from(index_count) * INDEX_SIZE,
                BufferUsage::INDEX | BufferUsage::COPY_DST,
            )
            .with_label(format!("{path} indices")),
        )
        .map_err(graphics)?;
    allocations.index_buffer = Some(index_buffer);

    let mut vertices = Vec::with_capacity(vertex_count as usize);
    let mut indices: Vec<u32> = Vec::with_capacity(index_count as usize);
    let mut submodels = Vec::with_capacity(scene.meshes.len());
    let mut skin = SkinAssembler::new();

    for (mesh_index, mesh) in scene.meshes.iter().enumerate() {
        let vertex_offset = vertices.len();
        let element_offset = indices.len();
        let mesh_vertices = mesh.vertex_count();

        vertices.extend((0..mesh_vertices).map(|i| Vertex {
            position: mesh.positions[i],
            tex_coord: mesh.tex_coords.get(i).copied().unwrap_or_default(),
            normal: mesh.normals.get(i).copied().unwrap_or_default(),
            ..Vertex::default()
        }));
        for face in &mesh.faces {
            for &index in face {
                if index as usize >= mesh_vertices {
                    return Err(invalid(format!(
                        "mesh {mesh_index} index {index} out of {mesh_vertices} vertices"
                    )));
                }
                indices.push(index + vertex_offset as u32);
            }
        }

        let Some(relative) = mesh.material.diffuse_texture.as_deref() else {
            return Err(ResourceError::MissingDiffuse {
                path: path.to_string(),
                mesh: mesh_index,
            }
            .report());
        };
        let texture_path = format!("{directory}{relative}");
        let diffuse = textures.load(device, decoder, &texture_path)?;
        allocations.textures.push(diffuse);
        let diffuse_gpu = textures.get(diffuse)?.gpu_id();

        submodels.push(Submodel {
            index_count: (mesh.face_count() * 3) as u32,
            byte_offset: element_offset as u64 * INDEX_SIZE,
            diffuse,
            diffuse_gpu,
        });

        skin.add_mesh(&mesh.bones, &mut vertices[vertex_offset..])
            .map_err(|e| {
                invalid(format!(
                    "mesh {mesh_index} weight for vertex {} out of {} vertices",
                    e.vertex_id, e.vertex_count
                ))
            })?;
    }

    let (bones, report) = skin.finish(&mut vertices);
    if report.dropped_influences > 0 {
        log::warn!(
            "{path}: dropped {} bone influence(s) beyond {} per vertex",
            report.dropped_influences,
            crate::vertex::MAX_INFLUENCES
        );
    }
    if report.under_influenced > 0 {
        log::warn!(
            "{path}: {} vertex(es) under-influenced (weight sum below {})",
            report.under_influenced,
            crate::skinning::UNDER_INFLUENCED_THRESHOLD
        );
    }

    device
        .write_buffer(vertex_buffer, 0, bytemuck::cast_slice(&vertices))
        .map_err(graphics)?;
    device
        .write_buffer(index_buffer, 0, bytemuck::cast_slice(&indices))
        .map_err(graphics)?;
    device
        .configure_vertex_layout(vertex_array, vertex_buffer, index_buffer, &Vertex::layout())
        .map_err(graphics)?;

    log::info!(
        "Newly loaded model {path} ({vertex_count} vertices, {} bones) as {vertex_array}",
        bones.len()
    );
    Ok(Model {
        path: path.to_string(),
        refs: 1,
        vertex_array,
        vertex_buffer,
        index_buffer,
        submodels,
        bones,
        vertex_count,
        face_count,
    })
}

/// Vertex, face and index totals, each of which must fit a `u32`.
fn scene_totals(scene: &ImportedScene) -> Result<(u32, u32, u32), String> {
    let vertices = scene.total_vertices();
    let faces = scene.total_faces();
    let too_large = |what: &str, n: usize| format!("{n} {what} exceed 32-bit indexing");
    let vertex_count = u32::try_from(vertices).map_err(|_| too_large("vertices", vertices))?;
    let face_count = u32::try_from(faces).map_err(|_| too_large("faces", faces))?;
    let index_count = face_count
        .checked_mul(3)
        .ok_or_else(|| too_large("faces", faces))?;
    Ok((vertex_count, face_count, index_count))
}
