//! glTF importer and image decoder against files written to a temp dir.

mod common;

use cinder_assets::{
    GltfImporter, ImageCrateDecoder, ImageDecoder, ImportError, ImportFlags, SceneImporter,
};
use common::*;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn imports_single_triangle_with_defaults() {
    init_logger();
    let dir = temp_dir("single_triangle");
    let path = write_gltf(
        &dir,
        "tri",
        &[MeshSpec::new("tri", vec![PrimitiveSpec::triangles(triangle(), vec![0, 1, 2])])],
        &[],
    );

    let scene = GltfImporter::new()
        .import(&path, ImportFlags::MODEL_DEFAULT)
        .unwrap();
    assert_eq!(scene.meshes.len(), 1);
    let mesh = &scene.meshes[0];
    assert_eq!(mesh.name.as_deref(), Some("tri"));
    assert_eq!(mesh.vertex_count(), 3);
    assert_eq!(mesh.faces, vec![[0, 1, 2]]);
    // Missing attributes are zero-filled.
    assert_eq!(mesh.normals, vec![[0.0; 3]; 3]);
    assert_eq!(mesh.tex_coords, vec![[0.0; 2]; 3]);
    assert_eq!(mesh.tangents.len(), 3);
    assert!(mesh.bones.is_empty());
    assert_eq!(mesh.material.diffuse_texture, None);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn one_mesh_per_primitive_in_order() {
    let dir = temp_dir("primitives");
    let path = write_gltf(
        &dir,
        "body",
        &[
            MeshSpec::new(
                "body",
                vec![
                    PrimitiveSpec::triangles(triangle(), vec![0, 1, 2]).with_texture("skin.png"),
                    PrimitiveSpec::triangles(triangle(), vec![2, 1, 0]).with_texture("cloth.png"),
                ],
            ),
            MeshSpec::new("hat", vec![PrimitiveSpec::triangles(triangle(), vec![0, 1, 2])]),
        ],
        &[],
    );

    let scene = GltfImporter::new()
        .import(&path, ImportFlags::MODEL_DEFAULT)
        .unwrap();
    let names: Vec<_> = scene.meshes.iter().map(|m| m.name.clone().unwrap()).collect();
    assert_eq!(names, ["body_prim0", "body_prim1", "hat"]);
    assert_eq!(
        scene.meshes[0].material.diffuse_texture.as_deref(),
        Some("skin.png")
    );
    assert_eq!(
        scene.meshes[1].material.diffuse_texture.as_deref(),
        Some("cloth.png")
    );

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn strips_and_fans_need_triangulate() {
    let dir = temp_dir("strip");
    let mut strip = PrimitiveSpec::triangles(
        vec![[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]],
        vec![0, 1, 2, 3],
    );
    strip.mode = MODE_TRIANGLE_STRIP;
    let path = write_gltf(&dir, "strip", &[MeshSpec::new("strip", vec![strip])], &[]);

    let scene = GltfImporter::new()
        .import(&path, ImportFlags::MODEL_DEFAULT)
        .unwrap();
    assert_eq!(scene.meshes[0].faces, vec![[0, 1, 2], [2, 1, 3]]);

    let err = GltfImporter::new()
        .import(&path, ImportFlags::JOIN_IDENTICAL_VERTICES)
        .unwrap_err();
    assert!(matches!(err, ImportError::UnsupportedTopology { .. }));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn point_primitives_dropped_or_rejected() {
    let dir = temp_dir("points");
    let mut points = PrimitiveSpec::triangles(triangle(), vec![0, 1, 2]);
    points.mode = MODE_POINTS;
    let path = write_gltf(
        &dir,
        "mixed",
        &[MeshSpec::new(
            "mixed",
            vec![points.clone(), PrimitiveSpec::triangles(triangle(), vec![0, 1, 2])],
        )],
        &[],
    );

    let scene = GltfImporter::new()
        .import(&path, ImportFlags::MODEL_DEFAULT)
        .unwrap();
    assert_eq!(scene.meshes.len(), 1);

    let err = GltfImporter::new()
        .import(&path, ImportFlags::TRIANGULATE)
        .unwrap_err();
    assert!(matches!(err, ImportError::UnsupportedTopology { .. }));

    // Nothing left after dropping.
    let only_points = write_gltf(&dir, "points", &[MeshSpec::new("p", vec![points])], &[]);
    let err = GltfImporter::new()
        .import(&only_points, ImportFlags::MODEL_DEFAULT)
        .unwrap_err();
    assert!(matches!(err, ImportError::NoMeshes { .. }));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn identical_vertices_are_joined() {
    let dir = temp_dir("weld");
    // A quad as two triangles with the diagonal duplicated.
    let positions = vec![
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
    ];
    let path = write_gltf(
        &dir,
        "quad",
        &[MeshSpec::new(
            "quad",
            vec![PrimitiveSpec::triangles(positions, (0..6).collect())],
        )],
        &[],
    );

    let welded = GltfImporter::new()
        .import(&path, ImportFlags::MODEL_DEFAULT)
        .unwrap();
    assert_eq!(welded.meshes[0].vertex_count(), 4);
    assert_eq!(welded.meshes[0].faces, vec![[0, 1, 2], [0, 2, 3]]);

    let raw = GltfImporter::new()
        .import(&path, ImportFlags::TRIANGULATE)
        .unwrap();
    assert_eq!(raw.meshes[0].vertex_count(), 6);
    assert!(raw.meshes[0].tangents.is_empty());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn skin_becomes_bone_list() {
    let dir = temp_dir("skin");
    let mut shifted = IDENTITY;
    shifted[12] = 2.0;
    let prim = PrimitiveSpec::triangles(triangle(), vec![0, 1, 2]).with_skin(
        vec![[0, 1, 2, 0], [0, 0, 0, 0], [1, 0, 0, 0]],
        vec![
            [0.5, 0.5, 0.0, 0.0],
            [1.0, 0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0, 0.0],
        ],
    );
    let path = write_gltf(
        &dir,
        "skinned",
        &[MeshSpec::new("skinned", vec![prim]).with_skin(0)],
        &[SkinSpec {
            joints: vec![Some("Root".into()), None, Some("Unused".into())],
            inverse_bind: vec![IDENTITY, shifted, IDENTITY],
        }],
    );

    let scene = GltfImporter::new()
        .import(&path, ImportFlags::MODEL_DEFAULT)
        .unwrap();
    let bones = &scene.meshes[0].bones;
    // Joint 2 only appears with zero weight, so it has no bone.
    let names: Vec<_> = bones.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, ["Root", "joint_2"]);

    let root: Vec<_> = bones[0].weights.iter().map(|w| (w.vertex_id, w.weight)).collect();
    assert_eq!(root, [(0, 0.5), (1, 1.0)]);
    let second: Vec<_> = bones[1].weights.iter().map(|w| (w.vertex_id, w.weight)).collect();
    assert_eq!(second, [(0, 0.5), (2, 1.0)]);
    assert_eq!(bones[1].offset_matrix[(0, 3)], 2.0);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn decoder_keeps_channel_count() {
    let dir = temp_dir("decode");
    let gray = dir.join("gray.png");
    image::GrayImage::from_pixel(2, 2, image::Luma([7])).save(&gray).unwrap();
    let rgb = dir.join("rgb.png");
    image::RgbImage::from_pixel(3, 1, image::Rgb([1, 2, 3])).save(&rgb).unwrap();
    let rgba = dir.join("rgba.png");
    image::RgbaImage::from_pixel(1, 2, image::Rgba([1, 2, 3, 4])).save(&rgba).unwrap();

    let decoder = ImageCrateDecoder::new();
    let img = decoder.decode(&gray).unwrap();
    assert_eq!((img.width, img.height, img.channels), (2, 2, 1));
    assert_eq!(img.pixels, vec![7; 4]);

    let img = decoder.decode(&rgb).unwrap();
    assert_eq!(img.channels, 3);
    assert_eq!(img.pixels, vec![1, 2, 3, 1, 2, 3, 1, 2, 3]);
    assert_eq!(img.pixels.len(), img.expected_len());

    let img = decoder.decode(&rgba).unwrap();
    assert_eq!(img.channels, 4);
    assert_eq!(img.pixels.len(), 8);

    let _ = std::fs::remove_dir_all(&dir);
}
