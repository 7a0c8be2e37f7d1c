//! Backend integration tests.
//!
//! Every test runs against each backend through `Box<dyn GraphicsDevice>`.
//! The wgpu case is skipped unless the `wgpu-backend` feature is enabled and
//! a GPU adapter is available.
//!
//! ```bash
//! cargo test -p cinder-graphics --test backend_tests
//! cargo test -p cinder-graphics --features wgpu-backend --test backend_tests
//! ```

use rstest::rstest;

use cinder_graphics::types::{VertexAttribute, VertexAttributeFormat};
use cinder_graphics::{
    BufferDescriptor, BufferUsage, DummyBackend, GraphicsDevice, GraphicsError,
    SamplerDescriptor, TextureDescriptor, TextureFormat, TextureUsage, VertexLayout,
};

#[derive(Debug, Clone, Copy)]
enum Backend {
    Dummy,
    Wgpu,
}

impl Backend {
    fn create(self) -> Option<Box<dyn GraphicsDevice>> {
        match self {
            Backend::Dummy => Some(Box::new(DummyBackend::new())),
            Backend::Wgpu => wgpu_device(),
        }
    }
}

#[cfg(feature = "wgpu-backend")]
fn wgpu_device() -> Option<Box<dyn GraphicsDevice>> {
    match cinder_graphics::WgpuBackend::new() {
        Ok(backend) => Some(Box::new(backend)),
        Err(e) => {
            eprintln!("skipping wgpu: {e}");
            None
        }
    }
}

#[cfg(not(feature = "wgpu-backend"))]
fn wgpu_device() -> Option<Box<dyn GraphicsDevice>> {
    None
}

fn texture_desc(width: u32, height: u32, format: TextureFormat) -> TextureDescriptor {
    TextureDescriptor::new_2d(
        width,
        height,
        format,
        TextureUsage::COPY_DST | TextureUsage::TEXTURE_BINDING,
    )
    .with_label("test texture")
}

#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::wgpu(Backend::Wgpu)]
fn test_texture_lifecycle(#[case] backend: Backend) {
    let Some(mut device) = backend.create() else {
        return;
    };
    let sampler = SamplerDescriptor::cache_default();
    let rgba = device
        .create_texture(&texture_desc(2, 2, TextureFormat::Rgba8Unorm), &sampler)
        .unwrap();
    let rgb = device
        .create_texture(&texture_desc(3, 1, TextureFormat::Rgb8Unorm), &sampler)
        .unwrap();
    assert_ne!(rgba, rgb);

    device.write_texture(rgba, &[255; 16]).unwrap();
    device.write_texture(rgb, &[1, 2, 3, 4, 5, 6, 7, 8, 9]).unwrap();

    device.destroy_texture(rgba).unwrap();
    assert_eq!(
        device.destroy_texture(rgba),
        Err(GraphicsError::UnknownTexture(rgba))
    );
    assert_eq!(
        device.write_texture(rgba, &[0; 16]),
        Err(GraphicsError::UnknownTexture(rgba))
    );
    device.destroy_texture(rgb).unwrap();
}

#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::wgpu(Backend::Wgpu)]
fn test_texture_upload_must_match(#[case] backend: Backend) {
    let Some(mut device) = backend.create() else {
        return;
    };
    let id = device
        .create_texture(
            &texture_desc(2, 2, TextureFormat::Rgb8Unorm),
            &SamplerDescriptor::cache_default(),
        )
        .unwrap();
    assert_eq!(
        device.write_texture(id, &[0; 16]),
        Err(GraphicsError::InvalidUploadSize {
            expected: 12,
            actual: 16
        })
    );
}

#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::wgpu(Backend::Wgpu)]
fn test_empty_texture_rejected(#[case] backend: Backend) {
    let Some(mut device) = backend.create() else {
        return;
    };
    let result = device.create_texture(
        &texture_desc(0, 4, TextureFormat::Rgba8Unorm),
        &SamplerDescriptor::cache_default(),
    );
    assert!(matches!(result, Err(GraphicsError::InvalidParameter(_))));
}

#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::wgpu(Backend::Wgpu)]
fn test_buffer_writes_bounded(#[case] backend: Backend) {
    let Some(mut device) = backend.create() else {
        return;
    };
    let id = device
        .create_buffer(&BufferDescriptor::new(
            12,
            BufferUsage::INDEX | BufferUsage::COPY_DST,
        ))
        .unwrap();
    device.write_buffer(id, 0, &[0; 12]).unwrap();
    device.write_buffer(id, 4, &[1; 8]).unwrap();
    assert_eq!(
        device.write_buffer(id, 8, &[0; 8]),
        Err(GraphicsError::InvalidUploadSize {
            expected: 4,
            actual: 8
        })
    );
    device.destroy_buffer(id).unwrap();
    assert_eq!(
        device.write_buffer(id, 0, &[0; 4]),
        Err(GraphicsError::UnknownBuffer(id))
    );
}

#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::wgpu(Backend::Wgpu)]
fn test_vertex_array_binding(#[case] backend: Backend) {
    let Some(mut device) = backend.create() else {
        return;
    };
    let vbo = device
        .create_buffer(&BufferDescriptor::new(
            60,
            BufferUsage::VERTEX | BufferUsage::COPY_DST,
        ))
        .unwrap();
    let ebo = device
        .create_buffer(&BufferDescriptor::new(
            12,
            BufferUsage::INDEX | BufferUsage::COPY_DST,
        ))
        .unwrap();
    let vao = device.create_vertex_array(Some("quad")).unwrap();

    let layout = VertexLayout::new(20)
        .with_attribute(VertexAttribute::new(0, VertexAttributeFormat::Float3, 0))
        .with_attribute(VertexAttribute::new(1, VertexAttributeFormat::Float2, 12));
    device.configure_vertex_layout(vao, vbo, ebo, &layout).unwrap();

    let overlapping = VertexLayout::new(12)
        .with_attribute(VertexAttribute::new(0, VertexAttributeFormat::Float4, 0));
    assert!(matches!(
        device.configure_vertex_layout(vao, vbo, ebo, &overlapping),
        Err(GraphicsError::InvalidParameter(_))
    ));

    device.destroy_vertex_array(vao).unwrap();
    assert_eq!(
        device.configure_vertex_layout(vao, vbo, ebo, &layout),
        Err(GraphicsError::UnknownVertexArray(vao))
    );
    device.destroy_buffer(vbo).unwrap();
    device.destroy_buffer(ebo).unwrap();
}
