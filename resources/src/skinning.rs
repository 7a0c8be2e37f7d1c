//! Skinning assembly.
//!
//! Bones are merged across the meshes of one model by exact name, in
//! first-seen order. Each bone's per-vertex weights are written into the
//! first empty influence slot of the target vertex; a vertex can hold
//! [`MAX_INFLUENCES`] influences and further contributions are dropped.
//! After every mesh has been added, occupied weights are normalised to sum
//! to one.

use cinder_assets::ImportedBone;
use cinder_core::math::Mat4;

use crate::vertex::{MAX_INFLUENCES, NO_BONE, Vertex};

/// Weight sum below which a vertex is reported as under-influenced.
pub const UNDER_INFLUENCED_THRESHOLD: f32 = 0.5;

/// A bone of a model.
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    /// Unique name within the model.
    pub name: String,
    /// Stable index, assigned at first encounter.
    pub index: u32,
    /// Inverse bind-pose transform.
    pub bind_matrix: Mat4,
}

/// Counters gathered while assembling one model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkinningReport {
    /// Contributions dropped because all slots were taken.
    pub dropped_influences: usize,
    /// Vertices whose weights summed below [`UNDER_INFLUENCED_THRESHOLD`].
    pub under_influenced: usize,
}

/// A weight refers to a vertex outside its mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexOutOfRange {
    /// Offending vertex id.
    pub vertex_id: u32,
    /// Vertices in the mesh.
    pub vertex_count: usize,
}

/// Accumulates bones and influences across the meshes of one model.
#[derive(Debug, Default)]
pub struct SkinAssembler {
    bones: Vec<Bone>,
    report: SkinningReport,
}

impl SkinAssembler {
    /// Create an empty assembler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the bone called `name`, appending it if unseen.
    pub fn resolve_bone(&mut self, name: &str, bind_matrix: &Mat4) -> u32 {
        if let Some(bone) = self.bones.iter().find(|b| b.name == name) {
            return bone.index;
        }
        let index = self.bones.len() as u32;
        self.bones.push(Bone {
            name: name.to_string(),
            index,
            bind_matrix: *bind_matrix,
        });
        index
    }

    /// Add one mesh's bones. `vertices` is that mesh's slice of the
    /// combined vertex array.
    pub fn add_mesh(
        &mut self,
        bones: &[ImportedBone],
        vertices: &mut [Vertex],
    ) -> Result<(), VertexOutOfRange> {
        for bone in bones {
            let index = self.resolve_bone(&bone.name, &bone.offset_matrix) as i32;
            for weight in &bone.weights {
                let vertex_count = vertices.len();
                let vertex = vertices
                    .get_mut(weight.vertex_id as usize)
                    .ok_or(VertexOutOfRange {
                        vertex_id: weight.vertex_id,
                        vertex_count,
                    })?;
                if !add_influence(vertex, index, weight.weight) {
                    self.report.dropped_influences += 1;
                }
            }
        }
        Ok(())
    }

    /// Normalise every vertex and hand back the bone table.
    pub fn finish(mut self, vertices: &mut [Vertex]) -> (Vec<Bone>, SkinningReport) {
        for (i, vertex) in vertices.iter_mut().enumerate() {
            if let Normalized::UnderInfluenced(sum) = normalize_weights(vertex) {
                log::debug!("vertex {i} under-influenced (weight sum {sum})");
                self.report.under_influenced += 1;
            }
        }
        (self.bones, self.report)
    }
}

/// Record `(bone, weight)` in the first empty slot. Returns `false` when all
/// slots are taken.
pub fn add_influence(vertex: &mut Vertex, bone: i32, weight: f32) -> bool {
    match vertex.bone_ids.iter().position(|&id| id == NO_BONE) {
        Some(slot) => {
            vertex.bone_ids[slot] = bone;
            vertex.bone_weights[slot] = weight;
            true
        }
        None => false,
    }
}

/// Outcome of normalising one vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Normalized {
    /// No influences; nothing to do.
    Unskinned,
    /// Weights now sum to one.
    Ok,
    /// Weights summed below the threshold. They are still normalised when
    /// the sum is positive.
    UnderInfluenced(f32),
}

/// Scale occupied weights so they sum to one.
pub fn normalize_weights(vertex: &mut Vertex) -> Normalized {
    let occupied = vertex.bone_ids.iter().filter(|&&id| id != NO_BONE).count();
    if occupied == 0 {
        return Normalized::Unskinned;
    }
    let sum: f32 = vertex.influences().map(|(_, w)| w).sum();
    if sum > 0.0 {
        for slot in 0..MAX_INFLUENCES {
            if vertex.bone_ids[slot] != NO_BONE {
                vertex.bone_weights[slot] /= sum;
            }
        }
    }
    if sum < UNDER_INFLUENCED_THRESHOLD {
        Normalized::UnderInfluenced(sum)
    } else {
        Normalized::Ok
    }
}
