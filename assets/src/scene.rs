//! Imported scene data and the importer trait.

use std::path::Path;

use bitflags::bitflags;
use cinder_core::math::Mat4;

use crate::error::ImportError;

bitflags! {
    /// Post-processing steps applied while importing.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ImportFlags: u32 {
        /// Compute per-vertex tangents.
        const CALC_TANGENT_SPACE = 1 << 0;
        /// Split strips and fans into triangle lists.
        const TRIANGULATE = 1 << 1;
        /// Weld vertices whose every attribute is bit-identical.
        const JOIN_IDENTICAL_VERTICES = 1 << 2;
        /// Keep only triangle primitives, dropping points and lines.
        const SORT_BY_PRIMITIVE_TYPE = 1 << 3;

        /// The fixed configuration used by the model cache.
        const MODEL_DEFAULT = Self::CALC_TANGENT_SPACE.bits()
            | Self::TRIANGULATE.bits()
            | Self::JOIN_IDENTICAL_VERTICES.bits()
            | Self::SORT_BY_PRIMITIVE_TYPE.bits();
    }
}

/// One bone's influence on one vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexWeight {
    /// Vertex index within the mesh.
    pub vertex_id: u32,
    /// Influence weight.
    pub weight: f32,
}

/// A bone as seen by one mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedBone {
    /// Bone name, the identity used to merge bones across meshes.
    pub name: String,
    /// Inverse bind-pose transform.
    pub offset_matrix: Mat4,
    /// Vertices this bone influences.
    pub weights: Vec<VertexWeight>,
}

/// Material data the caches care about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportedMaterial {
    /// Material name.
    pub name: Option<String>,
    /// Diffuse texture path relative to the model file.
    pub diffuse_texture: Option<String>,
}

/// A triangle mesh.
///
/// `positions`, `tex_coords` and `normals` always have the same length;
/// missing attributes are zero-filled. `tangents` is empty unless tangent
/// computation was requested.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedMesh {
    /// Mesh name.
    pub name: Option<String>,
    /// Vertex positions.
    pub positions: Vec<[f32; 3]>,
    /// First texture coordinate set.
    pub tex_coords: Vec<[f32; 2]>,
    /// Vertex normals.
    pub normals: Vec<[f32; 3]>,
    /// Vertex tangents.
    pub tangents: Vec<[f32; 3]>,
    /// Triangles as indices into the vertex arrays.
    pub faces: Vec<[u32; 3]>,
    /// Bones influencing this mesh.
    pub bones: Vec<ImportedBone>,
    /// Material.
    pub material: ImportedMaterial,
}

impl ImportedMesh {
    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }
}

/// The result of importing a model file. Dropping it releases everything
/// the importer allocated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedScene {
    /// Meshes in scene order.
    pub meshes: Vec<ImportedMesh>,
}

impl ImportedScene {
    /// Total vertices across all meshes.
    pub fn total_vertices(&self) -> usize {
        self.meshes.iter().map(ImportedMesh::vertex_count).sum()
    }

    /// Total triangles across all meshes.
    pub fn total_faces(&self) -> usize {
        self.meshes.iter().map(ImportedMesh::face_count).sum()
    }
}

/// Scene-import service.
pub trait SceneImporter {
    /// Import the model at `path` with the given post-processing.
    fn import(&self, path: &Path, flags: ImportFlags) -> Result<ImportedScene, ImportError>;
}

impl<T: SceneImporter + ?Sized> SceneImporter for Box<T> {
    fn import(&self, path: &Path, flags: ImportFlags) -> Result<ImportedScene, ImportError> {
        (**self).import(path, flags)
    }
}
