//! # imdraw
//!
//! An immediate-mode rendering façade on top of an abstract GPU device:
//! vertex-buffer streaming through fence-gated ring buffers, hashed
//! shader/uniform binding with bind-time layout validation, and
//! draw-call batching sorted by a packed render-state key.
//!
//! ## Overview
//!
//! - [`VertexLayout`] declares named, hashed vertex attributes plus the
//!   buffer capacity, stride, topology, and usage hint.
//! - [`Shader`] compiles and links through the device and introspects its
//!   uniform table for hashed lookup.
//! - [`RenderContext`] owns renderables and the fixed-capacity frame
//!   queue; [`DrawCall`]s submitted during a frame are sorted by
//!   [`RenderState`] key and streamed to the device at flush.
//! - [`backend::GpuBackend`] is the device boundary: window/context
//!   creation, swap mechanics, and the real API binding stay outside the
//!   crate. [`backend::DummyBackend`] is a recording mock for tests.
//!
//! ## Example
//!
//! ```
//! use imdraw::backend::DummyBackend;
//! use imdraw::{
//!     BufferUsage, DrawCall, PrimitiveTopology, RenderContext, RenderState, ScalarType,
//!     Shader, VertexLayout,
//! };
//! use std::sync::Arc;
//!
//! let mut device = DummyBackend::new();
//! let mut ctx = RenderContext::new(128);
//!
//! let mut layout = VertexLayout::new(
//!     1024,
//!     12,
//!     PrimitiveTopology::Triangles,
//!     BufferUsage::Streamed,
//! );
//! layout.add_attribute("a_position", 3, ScalarType::Float, 0)?;
//!
//! let shader = Arc::new(Shader::load(
//!     &mut device,
//!     "attribute vec3 a_position;\nuniform mat4 u_mvp;",
//!     "uniform vec4 u_tint;",
//! )?);
//!
//! let triangle = ctx.create_renderable(layout);
//! ctx.bind_shader(&mut device, triangle, Arc::clone(&shader))?;
//! ctx.set_render_state(triangle, RenderState::new().with_depth(7))?;
//!
//! shader.activate(&mut device);
//! let mvp = imdraw::math::perspective(1.0, 16.0 / 9.0, 0.1, 100.0);
//! shader.set_matrix(&mut device, "u_mvp", &mvp.to_cols_array())?;
//! shader.set_f32(&mut device, "u_tint", &[1.0, 1.0, 1.0, 1.0])?;
//!
//! let vertices: [f32; 9] = [0.0, 0.5, 0.0, -0.5, -0.5, 0.0, 0.5, -0.5, 0.0];
//! ctx.submit(DrawCall::new(triangle, bytemuck::cast_slice(&vertices)))?;
//! ctx.flush(&mut device, || { /* swap buffers here */ })?;
//! # Ok::<(), imdraw::GraphicsError>(())
//! ```

pub mod backend;
pub mod context;
pub mod error;
pub mod hash;
pub mod math;
pub mod renderable;
pub mod shader;
pub mod types;

// Re-export main types for convenience
pub use backend::{DummyBackend, GpuBackend};
pub use context::{DrawCall, RenderContext, RenderableId, MAX_DRAW_CALL_TEXTURES};
pub use error::{GraphicsError, ShaderStage};
pub use hash::name_hash;
pub use renderable::{Renderable, FENCE_TIMEOUT, STREAM_SLOT_COUNT};
pub use shader::{Shader, Uniform, MAX_UNIFORMS};
pub use types::{
    BufferUsage, PrimitiveTopology, RenderState, ScalarType, VertexAttribute, VertexLayout,
    MAX_VERTEX_ATTRIBUTES,
};
