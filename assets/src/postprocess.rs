//! Format-independent post-processing steps.

use std::collections::HashMap;

/// Primitive topology of incoming index data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Topology {
    Triangles,
    TriangleStrip,
    TriangleFan,
}

/// A vertex before it is split into attribute arrays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RawVertex {
    pub position: [f32; 3],
    pub tex_coord: [f32; 2],
    pub normal: [f32; 3],
    pub joints: [u16; 4],
    pub weights: [f32; 4],
}

impl RawVertex {
    fn key(&self) -> [u32; 16] {
        let mut key = [0u32; 16];
        let floats = self
            .position
            .iter()
            .chain(&self.tex_coord)
            .chain(&self.normal)
            .chain(&self.weights);
        for (slot, value) in key.iter_mut().zip(floats) {
            *slot = value.to_bits();
        }
        key[12] = u32::from(self.joints[0]) | (u32::from(self.joints[1]) << 16);
        key[13] = u32::from(self.joints[2]) | (u32::from(self.joints[3]) << 16);
        key
    }
}

/// Turn an index stream into triangles. Degenerate strip and fan triangles
/// are skipped.
pub(crate) fn triangulate(topology: Topology, indices: &[u32]) -> Vec<[u32; 3]> {
    match topology {
        Topology::Triangles => indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect(),
        Topology::TriangleStrip => indices
            .windows(3)
            .enumerate()
            .map(|(i, w)| {
                // Alternate winding to keep every triangle front-facing.
                if i % 2 == 0 {
                    [w[0], w[1], w[2]]
                } else {
                    [w[1], w[0], w[2]]
                }
            })
            .filter(|t| !is_degenerate(t))
            .collect(),
        Topology::TriangleFan => match indices.split_first() {
            Some((&center, rest)) => rest
                .windows(2)
                .map(|w| [center, w[0], w[1]])
                .filter(|t| !is_degenerate(t))
                .collect(),
            None => Vec::new(),
        },
    }
}

fn is_degenerate(t: &[u32; 3]) -> bool {
    t[0] == t[1] || t[1] == t[2] || t[0] == t[2]
}

/// Weld bit-identical vertices and rewrite `faces` to the welded indices.
///
/// The result is ordered by first reference from `faces`; vertices no face
/// references are dropped.
pub(crate) fn join_identical_vertices(
    vertices: &[RawVertex],
    faces: &mut [[u32; 3]],
) -> Vec<RawVertex> {
    let mut welded = Vec::with_capacity(vertices.len());
    let mut by_key: HashMap<[u32; 16], u32> = HashMap::with_capacity(vertices.len());
    let mut remap: Vec<Option<u32>> = vec![None; vertices.len()];

    for face in faces.iter_mut() {
        for index in face.iter_mut() {
            let old = *index as usize;
            let new = match remap[old] {
                Some(new) => new,
                None => {
                    let vertex = vertices[old];
                    let new = *by_key.entry(vertex.key()).or_insert_with(|| {
                        welded.push(vertex);
                        (welded.len() - 1) as u32
                    });
                    remap[old] = Some(new);
                    new
                }
            };
            *index = new;
        }
    }

    log::trace!(
        "joined identical vertices: {} -> {}",
        vertices.len(),
        welded.len()
    );
    welded
}

/// Per-vertex tangents from position and texture coordinate gradients,
/// orthogonalised against the normal. Vertices without usable UVs get a
/// zero tangent.
pub(crate) fn compute_tangents(
    positions: &[[f32; 3]],
    tex_coords: &[[f32; 2]],
    normals: &[[f32; 3]],
    faces: &[[u32; 3]],
) -> Vec<[f32; 3]> {
    let mut accum = vec![[0.0f32; 3]; positions.len()];

    for face in faces {
        let [a, b, c] = face.map(|i| i as usize);
        let e1 = sub(positions[b], positions[a]);
        let e2 = sub(positions[c], positions[a]);
        let du1 = tex_coords[b][0] - tex_coords[a][0];
        let dv1 = tex_coords[b][1] - tex_coords[a][1];
        let du2 = tex_coords[c][0] - tex_coords[a][0];
        let dv2 = tex_coords[c][1] - tex_coords[a][1];

        let det = du1 * dv2 - du2 * dv1;
        if det.abs() <= f32::EPSILON {
            continue;
        }
        let r = 1.0 / det;
        let tangent = [
            (e1[0] * dv2 - e2[0] * dv1) * r,
            (e1[1] * dv2 - e2[1] * dv1) * r,
            (e1[2] * dv2 - e2[2] * dv1) * r,
        ];
        for v in [a, b, c] {
            for k in 0..3 {
                accum[v][k] += tangent[k];
            }
        }
    }

    accum
        .iter()
        .zip(normals)
        .map(|(t, n)| {
            // Gram-Schmidt against the normal.
            let d = dot(*t, *n);
            let ortho = [t[0] - n[0] * d, t[1] - n[1] * d, t[2] - n[2] * d];
            let len = dot(ortho, ortho).sqrt();
            if len > f32::EPSILON {
                [ortho[0] / len, ortho[1] / len, ortho[2] / len]
            } else {
                [0.0; 3]
            }
        })
        .collect()
}

fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}
