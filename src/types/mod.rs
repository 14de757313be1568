//! Core value types shared across the crate.

mod state;
mod vertex;

pub use state::RenderState;
pub use vertex::{
    BufferUsage, PrimitiveTopology, ScalarType, VertexAttribute, VertexLayout,
    MAX_VERTEX_ATTRIBUTES,
};
