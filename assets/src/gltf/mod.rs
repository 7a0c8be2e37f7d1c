//! glTF 2.0 scene importer.
//!
//! Loads `.gltf`/`.glb` files into an [`ImportedScene`]. Every primitive
//! becomes one [`ImportedMesh`], in document mesh order and then primitive
//! order. Buffers may be embedded, data URIs, or files next to the model.
//!
//! # Skins
//!
//! A mesh picks up the skin of the first node that instances it. Each joint
//! with at least one nonzero weight on the mesh becomes an [`ImportedBone`]
//! named after the joint node (or `joint_<node index>` when unnamed), with
//! the skin's inverse bind matrix as its offset matrix.
//!
//! # Materials
//!
//! The diffuse texture is the percent-decoded URI of the base color
//! texture's image, left relative to the model file. Images embedded in
//! buffer views have no path and are reported as missing.

use std::collections::HashMap;
use std::path::Path;

use cinder_core::math::Mat4;
use gltf_dep::mesh::Mode;

use crate::error::ImportError;
use crate::postprocess::{self, RawVertex, Topology};
use crate::scene::{
    ImportFlags, ImportedBone, ImportedMaterial, ImportedMesh, ImportedScene, SceneImporter,
    VertexWeight,
};

/// [`SceneImporter`] for glTF 2.0 files.
#[derive(Debug, Clone, Copy, Default)]
pub struct GltfImporter;

impl GltfImporter {
    /// Create a new importer.
    pub fn new() -> Self {
        Self
    }
}

impl SceneImporter for GltfImporter {
    fn import(&self, path: &Path, flags: ImportFlags) -> Result<ImportedScene, ImportError> {
        let parse_error = |source| ImportError::Parse {
            path: path.to_path_buf(),
            source,
        };
        let gltf_dep::Gltf { document, blob } = gltf_dep::Gltf::open(path).map_err(parse_error)?;
        let buffers =
            gltf_dep::import_buffers(&document, path.parent(), blob).map_err(parse_error)?;
        let buffer_data = |buffer: gltf_dep::Buffer<'_>| {
            buffers.get(buffer.index()).map(|data| data.0.as_slice())
        };

        let mut mesh_skins = HashMap::new();
        for node in document.nodes() {
            if let (Some(mesh), Some(skin)) = (node.mesh(), node.skin()) {
                mesh_skins.entry(mesh.index()).or_insert(skin);
            }
        }

        let mut meshes = Vec::new();
        let mut dropped = 0usize;

        for (mesh_idx, mesh) in document.meshes().enumerate() {
            let primitive_count = mesh.primitives().count();
            for (prim_idx, primitive) in mesh.primitives().enumerate() {
                let topology = match primitive.mode() {
                    Mode::Triangles => Topology::Triangles,
                    Mode::TriangleStrip if flags.contains(ImportFlags::TRIANGULATE) => {
                        Topology::TriangleStrip
                    }
                    Mode::TriangleFan if flags.contains(ImportFlags::TRIANGULATE) => {
                        Topology::TriangleFan
                    }
                    Mode::Points | Mode::Lines | Mode::LineLoop | Mode::LineStrip
                        if flags.contains(ImportFlags::SORT_BY_PRIMITIVE_TYPE) =>
                    {
                        dropped += 1;
                        continue;
                    }
                    mode => {
                        return Err(ImportError::UnsupportedTopology {
                            mesh: mesh_idx,
                            primitive: prim_idx,
                            mode: mode_name(mode),
                        });
                    }
                };

                let accessor_error = |message: String| ImportError::Accessor {
                    mesh: mesh_idx,
                    primitive: prim_idx,
                    message,
                };

                let reader = primitive.reader(buffer_data);
                let positions: Vec<[f32; 3]> = reader
                    .read_positions()
                    .ok_or(ImportError::MissingPositions {
                        mesh: mesh_idx,
                        primitive: prim_idx,
                    })?
                    .collect();
                let count = positions.len();

                let normals: Vec<[f32; 3]> = match reader.read_normals() {
                    Some(iter) => iter.collect(),
                    None => vec![[0.0; 3]; count],
                };
                let tex_coords: Vec<[f32; 2]> = match reader.read_tex_coords(0) {
                    Some(tc) => tc.into_f32().collect(),
                    None => vec![[0.0; 2]; count],
                };
                if normals.len() != count || tex_coords.len() != count {
                    return Err(accessor_error(format!(
                        "attribute counts differ from {count} positions"
                    )));
                }

                let skin = mesh_skins.get(&mesh.index());
                let (joints, weights): (Vec<[u16; 4]>, Vec<[f32; 4]>) =
                    match (skin, reader.read_joints(0), reader.read_weights(0)) {
                        (Some(_), Some(j), Some(w)) => {
                            (j.into_u16().collect(), w.into_f32().collect())
                        }
                        _ => (vec![[0; 4]; count], vec![[0.0; 4]; count]),
                    };
                if joints.len() != count || weights.len() != count {
                    return Err(accessor_error(format!(
                        "skin attribute counts differ from {count} positions"
                    )));
                }

                let indices: Vec<u32> = match reader.read_indices() {
                    Some(indices) => indices.into_u32().collect(),
                    None => (0..count as u32).collect(),
                };
                if let Some(bad) = indices.iter().find(|&&i| i as usize >= count) {
                    return Err(accessor_error(format!(
                        "index {bad} out of range for {count} vertices"
                    )));
                }

                let raw: Vec<RawVertex> = (0..count)
                    .map(|i| RawVertex {
                        position: positions[i],
                        tex_coord: tex_coords[i],
                        normal: normals[i],
                        joints: joints[i],
                        weights: weights[i],
                    })
                    .collect();
                let mut faces = postprocess::triangulate(topology, &indices);
                let vertices = if flags.contains(ImportFlags::JOIN_IDENTICAL_VERTICES) {
                    postprocess::join_identical_vertices(&raw, &mut faces)
                } else {
                    raw
                };

                let mut out = ImportedMesh {
                    name: mesh.name().map(|name| {
                        if primitive_count > 1 {
                            format!("{name}_prim{prim_idx}")
                        } else {
                            name.to_string()
                        }
                    }),
                    positions: vertices.iter().map(|v| v.position).collect(),
                    tex_coords: vertices.iter().map(|v| v.tex_coord).collect(),
                    normals: vertices.iter().map(|v| v.normal).collect(),
                    tangents: Vec::new(),
                    faces,
                    bones: Vec::new(),
                    material: read_material(&primitive),
                };
                if flags.contains(ImportFlags::CALC_TANGENT_SPACE) {
                    out.tangents = postprocess::compute_tangents(
                        &out.positions,
                        &out.tex_coords,
                        &out.normals,
                        &out.faces,
                    );
                }
                if let Some(skin) = skin {
                    out.bones = read_bones(skin, &vertices, buffer_data).map_err(accessor_error)?;
                }
                meshes.push(out);
            }
        }

        if dropped > 0 {
            log::warn!(
                "{}: dropped {dropped} point/line primitive(s)",
                path.display()
            );
        }
        if meshes.is_empty() {
            return Err(ImportError::NoMeshes {
                path: path.to_path_buf(),
            });
        }
        log::debug!("imported {}: {} meshes", path.display(), meshes.len());
        Ok(ImportedScene { meshes })
    }
}

fn read_material(primitive: &gltf_dep::Primitive<'_>) -> ImportedMaterial {
    let material = primitive.material();
    let diffuse_texture = material
        .pbr_metallic_roughness()
        .base_color_texture()
        .and_then(|info| match info.texture().source().source() {
            gltf_dep::image::Source::Uri { uri, .. } if !uri.starts_with("data:") => {
                Some(decode_uri(uri))
            }
            _ => {
                log::warn!(
                    "material {:?}: embedded base color image has no path",
                    material.name()
                );
                None
            }
        });
    ImportedMaterial {
        name: material.name().map(String::from),
        diffuse_texture,
    }
}

/// URIs in glTF are percent-encoded; texture paths are not.
fn decode_uri(uri: &str) -> String {
    match urlencoding::decode(uri) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            log::warn!("texture uri {uri:?} is not valid UTF-8 once decoded: {e}");
            uri.to_string()
        }
    }
}

/// Group per-vertex joint slots into per-joint weight lists.
fn read_bones<'a, 's>(
    skin: &'a gltf_dep::Skin<'a>,
    vertices: &[RawVertex],
    buffer_data: impl Clone + Fn(gltf_dep::Buffer<'a>) -> Option<&'s [u8]>,
) -> Result<Vec<ImportedBone>, String> {
    let joints: Vec<gltf_dep::Node<'_>> = skin.joints().collect();
    let inverse_bind: Vec<Mat4> = match skin.reader(buffer_data).read_inverse_bind_matrices() {
        Some(iter) => iter.map(|cols| Mat4::from_fn(|r, c| cols[c][r])).collect(),
        None => vec![Mat4::identity(); joints.len()],
    };
    if inverse_bind.len() < joints.len() {
        return Err(format!(
            "skin has {} joints but {} inverse bind matrices",
            joints.len(),
            inverse_bind.len()
        ));
    }

    let mut per_joint: Vec<Vec<VertexWeight>> = vec![Vec::new(); joints.len()];
    for (vertex_id, vertex) in vertices.iter().enumerate() {
        for (&joint, &weight) in vertex.joints.iter().zip(&vertex.weights) {
            if weight <= 0.0 {
                continue;
            }
            let list = per_joint
                .get_mut(joint as usize)
                .ok_or_else(|| format!("joint {joint} out of range for {} joints", joints.len()))?;
            list.push(VertexWeight {
                vertex_id: vertex_id as u32,
                weight,
            });
        }
    }

    Ok(joints
        .iter()
        .zip(inverse_bind)
        .zip(per_joint)
        .filter(|(_, weights)| !weights.is_empty())
        .map(|((node, offset_matrix), weights)| ImportedBone {
            name: node
                .name()
                .map(String::from)
                .unwrap_or_else(|| format!("joint_{}", node.index())),
            offset_matrix,
            weights,
        })
        .collect())
}

fn mode_name(mode: Mode) -> &'static str {
    match mode {
        Mode::Points => "points",
        Mode::Lines => "lines",
        Mode::LineLoop => "line loop",
        Mode::LineStrip => "line strip",
        Mode::Triangles => "triangles",
        Mode::TriangleStrip => "triangle strip",
        Mode::TriangleFan => "triangle fan",
    }
}
