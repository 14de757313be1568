//! Common utilities for the frame pipeline integration tests.
//!
//! Everything runs against [`DummyBackend`], so the full submit → sort →
//! stream → draw path is exercised without GPU hardware.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};

use imdraw::backend::DummyBackend;
use imdraw::{
    BufferUsage, PrimitiveTopology, RenderContext, RenderableId, ScalarType, Shader, VertexLayout,
};

/// Initialize logging once for a test binary.
#[allow(dead_code)]
pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Vertex Data
// ============================================================================

/// Position-only test vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
}

impl Vertex {
    pub const STRIDE: u32 = std::mem::size_of::<Self>() as u32;
}

/// One clip-space triangle.
pub const TRIANGLE_VERTICES: [Vertex; 3] = [
    Vertex {
        position: [0.0, 0.5, 0.0],
    },
    Vertex {
        position: [-0.5, -0.5, 0.0],
    },
    Vertex {
        position: [0.5, -0.5, 0.0],
    },
];

/// Vertex bytes for a triangle whose coordinates are all `value`.
pub fn solid_triangle_bytes(value: f32) -> Vec<u8> {
    let vertices = [Vertex {
        position: [value; 3],
    }; 3];
    bytemuck::cast_slice(&vertices).to_vec()
}

// ============================================================================
// Shaders
// ============================================================================

/// Vertex shader matching [`position_layout`].
pub const POSITION_VS: &str = "\
attribute vec3 a_position;
uniform mat4 u_mvp;
";

/// Fragment shader with a tint, a sampler, and nothing else.
pub const TINT_FS: &str = "\
uniform vec4 u_tint;
uniform sampler2D u_texture;
";

// ============================================================================
// Construction Helpers
// ============================================================================

/// Position-only layout with the given vertex capacity and usage.
pub fn position_layout(capacity: u32, usage: BufferUsage) -> VertexLayout {
    let mut layout = VertexLayout::new(
        capacity,
        Vertex::STRIDE,
        PrimitiveTopology::Triangles,
        usage,
    );
    layout
        .add_attribute("a_position", 3, ScalarType::Float, 0)
        .unwrap();
    layout
}

/// Load the standard test shader.
pub fn load_shader(device: &mut DummyBackend) -> Arc<Shader> {
    Arc::new(Shader::load(device, POSITION_VS, TINT_FS).unwrap())
}

/// Create a bound renderable with the given capacity and usage.
pub fn bound_renderable(
    ctx: &mut RenderContext,
    device: &mut DummyBackend,
    shader: &Arc<Shader>,
    capacity: u32,
    usage: BufferUsage,
) -> RenderableId {
    let id = ctx.create_renderable(position_layout(capacity, usage));
    ctx.bind_shader(device, id, Arc::clone(shader)).unwrap();
    id
}
