//! Math type aliases and helper functions.

pub use nalgebra;

/// 2D vector (f32).
pub type Vec2 = nalgebra::Vector2<f32>;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// 4x4 matrix (f32).
pub type Mat4 = nalgebra::Matrix4<f32>;

/// Build a matrix from 16 floats in column-major order (glTF layout).
pub fn mat4_from_cols_array(values: &[f32; 16]) -> Mat4 {
    Mat4::from_column_slice(values)
}

/// Flatten a matrix into 16 floats in column-major order.
pub fn mat4_to_cols_array(matrix: &Mat4) -> [f32; 16] {
    let mut out = [0.0f32; 16];
    out.copy_from_slice(matrix.as_slice());
    out
}
