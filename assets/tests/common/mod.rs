//! Writes small glTF fixtures (JSON + external .bin) for tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// glTF primitive modes.
pub const MODE_POINTS: u32 = 0;
pub const MODE_LINES: u32 = 1;
pub const MODE_TRIANGLES: u32 = 4;
pub const MODE_TRIANGLE_STRIP: u32 = 5;
pub const MODE_TRIANGLE_FAN: u32 = 6;

#[derive(Debug, Clone)]
pub struct PrimitiveSpec {
    pub mode: u32,
    pub positions: Vec<[f32; 3]>,
    pub tex_coords: Option<Vec<[f32; 2]>>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub indices: Option<Vec<u32>>,
    pub joints: Option<Vec<[u16; 4]>>,
    pub weights: Option<Vec<[f32; 4]>>,
    pub texture_uri: Option<String>,
}

impl PrimitiveSpec {
    pub fn triangles(positions: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        Self {
            mode: MODE_TRIANGLES,
            positions,
            tex_coords: None,
            normals: None,
            indices: Some(indices),
            joints: None,
            weights: None,
            texture_uri: None,
        }
    }

    pub fn with_texture(mut self, uri: &str) -> Self {
        self.texture_uri = Some(uri.to_string());
        self
    }

    pub fn with_skin(mut self, joints: Vec<[u16; 4]>, weights: Vec<[f32; 4]>) -> Self {
        self.joints = Some(joints);
        self.weights = Some(weights);
        self
    }
}

#[derive(Debug, Clone)]
pub struct MeshSpec {
    pub name: Option<String>,
    pub primitives: Vec<PrimitiveSpec>,
    pub skin: Option<usize>,
}

impl MeshSpec {
    pub fn new(name: &str, primitives: Vec<PrimitiveSpec>) -> Self {
        Self {
            name: Some(name.to_string()),
            primitives,
            skin: None,
        }
    }

    pub fn with_skin(mut self, skin: usize) -> Self {
        self.skin = Some(skin);
        self
    }
}

#[derive(Debug, Clone)]
pub struct SkinSpec {
    /// Joint node names; `None` leaves the node unnamed.
    pub joints: Vec<Option<String>>,
    /// Column-major inverse bind matrices, one per joint.
    pub inverse_bind: Vec<[f32; 16]>,
}

pub const IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
];

/// A unit triangle in the XY plane.
pub fn triangle() -> Vec<[f32; 3]> {
    vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
}

/// Fresh, empty directory under the system temp dir.
pub fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "cinder_test_{}_{name}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

struct Builder {
    bin: Vec<u8>,
    views: Vec<String>,
    accessors: Vec<String>,
}

impl Builder {
    fn push_view(&mut self, bytes: &[u8]) -> usize {
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        let offset = self.bin.len();
        self.bin.extend_from_slice(bytes);
        self.views.push(format!(
            r#"{{"buffer":0,"byteOffset":{offset},"byteLength":{}}}"#,
            bytes.len()
        ));
        self.views.len() - 1
    }

    fn push_accessor(&mut self, bytes: &[u8], component: u32, ty: &str, count: usize, extra: &str) -> usize {
        let view = self.push_view(bytes);
        self.accessors.push(format!(
            r#"{{"bufferView":{view},"componentType":{component},"count":{count},"type":"{ty}"{extra}}}"#
        ));
        self.accessors.len() - 1
    }

    fn floats<const N: usize>(&mut self, data: &[[f32; N]], ty: &str, extra: &str) -> usize {
        let bytes: Vec<u8> = data.iter().flatten().flat_map(|f| f.to_le_bytes()).collect();
        self.push_accessor(&bytes, 5126, ty, data.len(), extra)
    }
}

fn json_floats(values: &[f32]) -> String {
    let items: Vec<String> = values.iter().map(|v| format!("{v:?}")).collect();
    format!("[{}]", items.join(","))
}

/// Write `<dir>/<name>.gltf` and `<dir>/<name>.bin`, returning the .gltf path.
pub fn write_gltf(dir: &Path, name: &str, meshes: &[MeshSpec], skins: &[SkinSpec]) -> PathBuf {
    let mut b = Builder {
        bin: Vec::new(),
        views: Vec::new(),
        accessors: Vec::new(),
    };
    let mut images = Vec::new();
    let mut materials = Vec::new();
    let mut mesh_json = Vec::new();

    for mesh in meshes {
        let mut prims = Vec::new();
        for p in &mesh.primitives {
            let mut min = [f32::MAX; 3];
            let mut max = [f32::MIN; 3];
            for pos in &p.positions {
                for k in 0..3 {
                    min[k] = min[k].min(pos[k]);
                    max[k] = max[k].max(pos[k]);
                }
            }
            let bounds = format!(r#","min":{},"max":{}"#, json_floats(&min), json_floats(&max));
            let mut attrs = vec![format!(r#""POSITION":{}"#, b.floats(&p.positions, "VEC3", &bounds))];
            if let Some(n) = &p.normals {
                attrs.push(format!(r#""NORMAL":{}"#, b.floats(n, "VEC3", "")));
            }
            if let Some(t) = &p.tex_coords {
                attrs.push(format!(r#""TEXCOORD_0":{}"#, b.floats(t, "VEC2", "")));
            }
            if let Some(j) = &p.joints {
                let bytes: Vec<u8> = j.iter().flatten().flat_map(|v| v.to_le_bytes()).collect();
                attrs.push(format!(
                    r#""JOINTS_0":{}"#,
                    b.push_accessor(&bytes, 5123, "VEC4", j.len(), "")
                ));
            }
            if let Some(w) = &p.weights {
                attrs.push(format!(r#""WEIGHTS_0":{}"#, b.floats(w, "VEC4", "")));
            }
            let mut prim = format!(r#"{{"attributes":{{{}}},"mode":{}"#, attrs.join(","), p.mode);
            if let Some(idx) = &p.indices {
                let bytes: Vec<u8> = idx.iter().flat_map(|v| v.to_le_bytes()).collect();
                let acc = b.push_accessor(&bytes, 5125, "SCALAR", idx.len(), "");
                prim.push_str(&format!(r#","indices":{acc}"#));
            }
            if let Some(uri) = &p.texture_uri {
                images.push(format!(r#"{{"uri":"{uri}"}}"#));
                let tex = images.len() - 1;
                materials.push(format!(
                    r#"{{"pbrMetallicRoughness":{{"baseColorTexture":{{"index":{tex}}}}}}}"#
                ));
                prim.push_str(&format!(r#","material":{}"#, materials.len() - 1));
            }
            prim.push('}');
            prims.push(prim);
        }
        let name = mesh
            .name
            .as_ref()
            .map(|n| format!(r#""name":"{n}","#))
            .unwrap_or_default();
        mesh_json.push(format!(r#"{{{name}"primitives":[{}]}}"#, prims.join(",")));
    }

    // Nodes: one per mesh first, then the joints of every skin.
    let mut nodes = Vec::new();
    let mut joint_base = Vec::new();
    let mut next_joint = meshes.len();
    for skin in skins {
        joint_base.push(next_joint);
        next_joint += skin.joints.len();
    }
    for (i, mesh) in meshes.iter().enumerate() {
        let skin = mesh
            .skin
            .map(|s| format!(r#","skin":{s}"#))
            .unwrap_or_default();
        nodes.push(format!(r#"{{"mesh":{i}{skin}}}"#));
    }
    let mut skin_json = Vec::new();
    for (s, skin) in skins.iter().enumerate() {
        let mut joint_ids = Vec::new();
        for (j, joint) in skin.joints.iter().enumerate() {
            joint_ids.push((joint_base[s] + j).to_string());
            nodes.push(match joint {
                Some(name) => format!(r#"{{"name":"{name}"}}"#),
                None => "{}".to_string(),
            });
        }
        let ibm = b.floats(&skin.inverse_bind, "MAT4", "");
        skin_json.push(format!(
            r#"{{"joints":[{}],"inverseBindMatrices":{ibm}}}"#,
            joint_ids.join(",")
        ));
    }
    let scene_nodes: Vec<String> = (0..nodes.len()).map(|i| i.to_string()).collect();

    let bin_name = format!("{name}.bin");
    std::fs::write(dir.join(&bin_name), &b.bin).unwrap();

    let mut json = format!(
        r#"{{"asset":{{"version":"2.0"}},"scene":0,"scenes":[{{"nodes":[{}]}}],"nodes":[{}],"meshes":[{}],"buffers":[{{"uri":"{bin_name}","byteLength":{}}}],"bufferViews":[{}],"accessors":[{}]"#,
        scene_nodes.join(","),
        nodes.join(","),
        mesh_json.join(","),
        b.bin.len(),
        b.views.join(","),
        b.accessors.join(","),
    );
    if !skin_json.is_empty() {
        json.push_str(&format!(r#","skins":[{}]"#, skin_json.join(",")));
    }
    if !images.is_empty() {
        let textures: Vec<String> = (0..images.len())
            .map(|i| format!(r#"{{"source":{i}}}"#))
            .collect();
        json.push_str(&format!(
            r#","images":[{}],"textures":[{}],"materials":[{}]"#,
            images.join(","),
            textures.join(","),
            materials.join(",")
        ));
    }
    json.push('}');

    let path = dir.join(format!("{name}.gltf"));
    std::fs::write(&path, json).unwrap();
    path
}
