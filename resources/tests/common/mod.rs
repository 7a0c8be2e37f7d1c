//! In-memory collaborators for cache tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use cinder_assets::{
    DecodedImage, ImageDecoder, ImageError, ImportError, ImportFlags, ImportedBone,
    ImportedMaterial, ImportedMesh, ImportedScene, SceneImporter, VertexWeight,
};
use cinder_core::math::Mat4;
use cinder_graphics::DummyBackend;
use cinder_resources::{CacheConfig, ResourceContext, Vertex};

/// Serves scenes registered by path. Unknown paths fail to import.
#[derive(Default, Clone)]
pub struct FakeImporter {
    scenes: Rc<RefCell<HashMap<String, ImportedScene>>>,
    calls: Rc<RefCell<Vec<(String, ImportFlags)>>>,
}

impl FakeImporter {
    pub fn add(&self, path: &str, scene: ImportedScene) {
        self.scenes.borrow_mut().insert(path.to_string(), scene);
    }

    pub fn calls(&self) -> Vec<(String, ImportFlags)> {
        self.calls.borrow().clone()
    }
}

impl SceneImporter for FakeImporter {
    fn import(&self, path: &Path, flags: ImportFlags) -> Result<ImportedScene, ImportError> {
        let key = path.to_string_lossy().into_owned();
        self.calls.borrow_mut().push((key.clone(), flags));
        self.scenes
            .borrow()
            .get(&key)
            .cloned()
            .ok_or(ImportError::NoMeshes {
                path: PathBuf::from(path),
            })
    }
}

/// Decodes any path to a solid 2x2 image. Channel counts can be overridden
/// per path and paths can be made to fail.
#[derive(Default, Clone)]
pub struct FakeDecoder {
    channels: Rc<RefCell<HashMap<String, u8>>>,
    failing: Rc<RefCell<Vec<String>>>,
    decoded: Rc<RefCell<Vec<String>>>,
}

impl FakeDecoder {
    pub fn set_channels(&self, path: &str, channels: u8) {
        self.channels.borrow_mut().insert(path.to_string(), channels);
    }

    pub fn fail(&self, path: &str) {
        self.failing.borrow_mut().push(path.to_string());
    }

    /// Every path decoded so far, in order.
    pub fn decoded(&self) -> Vec<String> {
        self.decoded.borrow().clone()
    }

    pub fn decode_count(&self, path: &str) -> usize {
        self.decoded.borrow().iter().filter(|p| *p == path).count()
    }
}

impl ImageDecoder for FakeDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage, ImageError> {
        let key = path.to_string_lossy().into_owned();
        self.decoded.borrow_mut().push(key.clone());
        if self.failing.borrow().contains(&key) {
            return Err(ImageError::Empty {
                path: PathBuf::from(path),
            });
        }
        let channels = self.channels.borrow().get(&key).copied().unwrap_or(4);
        Ok(DecodedImage {
            width: 2,
            height: 2,
            channels,
            pixels: vec![0xAB; 4 * channels as usize],
        })
    }
}

pub struct Harness {
    pub ctx: ResourceContext<DummyBackend>,
    pub importer: FakeImporter,
    pub decoder: FakeDecoder,
}

pub fn harness(textures: usize, models: usize) -> Harness {
    let _ = env_logger::builder().is_test(true).try_init();
    let importer = FakeImporter::default();
    let decoder = FakeDecoder::default();
    let ctx = ResourceContext::new(
        CacheConfig::default()
            .with_capacity(textures, models)
            .with_buckets(4),
        DummyBackend::new(),
        Box::new(importer.clone()),
        Box::new(decoder.clone()),
    )
    .unwrap();
    Harness {
        ctx,
        importer,
        decoder,
    }
}

/// A mesh of `vertex_count` vertices spread along x, textured with `diffuse`.
pub fn mesh(vertex_count: usize, faces: Vec<[u32; 3]>, diffuse: Option<&str>) -> ImportedMesh {
    ImportedMesh {
        name: None,
        positions: (0..vertex_count).map(|i| [i as f32, 0.0, 0.0]).collect(),
        tex_coords: vec![[0.5, 0.5]; vertex_count],
        normals: vec![[0.0, 0.0, 1.0]; vertex_count],
        tangents: Vec::new(),
        faces,
        bones: Vec::new(),
        material: ImportedMaterial {
            name: None,
            diffuse_texture: diffuse.map(str::to_string),
        },
    }
}

pub fn triangle(diffuse: &str) -> ImportedMesh {
    mesh(3, vec![[0, 1, 2]], Some(diffuse))
}

pub fn bone(name: &str, weights: &[(u32, f32)]) -> ImportedBone {
    ImportedBone {
        name: name.to_string(),
        offset_matrix: Mat4::identity(),
        weights: weights
            .iter()
            .map(|&(vertex_id, weight)| VertexWeight { vertex_id, weight })
            .collect(),
    }
}

pub fn scene(meshes: Vec<ImportedMesh>) -> ImportedScene {
    ImportedScene { meshes }
}

/// Vertex rows uploaded to a dummy buffer.
pub fn uploaded_vertices(device: &DummyBackend, buffer: cinder_graphics::BufferId) -> Vec<Vertex> {
    bytemuck::pod_collect_to_vec(device.buffer_data(buffer).unwrap())
}

/// Indices uploaded to a dummy buffer.
pub fn uploaded_indices(device: &DummyBackend, buffer: cinder_graphics::BufferId) -> Vec<u32> {
    bytemuck::pod_collect_to_vec(device.buffer_data(buffer).unwrap())
}
