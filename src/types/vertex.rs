//! Vertex layout definitions.
//!
//! A [`VertexLayout`] describes one interleaved vertex buffer: its
//! capacity in vertices, per-vertex stride, primitive topology, usage
//! hint, and a bounded list of named attributes. Attribute names are
//! hashed once at registration ([`crate::hash::name_hash`]) and matched
//! against the shader's introspected interface at bind time.
//!
//! # Example
//!
//! ```
//! use imdraw::{BufferUsage, PrimitiveTopology, ScalarType, VertexLayout};
//!
//! let mut layout = VertexLayout::new(
//!     1024,
//!     20,
//!     PrimitiveTopology::Triangles,
//!     BufferUsage::Streamed,
//! );
//! layout.add_attribute("a_position", 3, ScalarType::Float, 0).unwrap();
//! layout.add_attribute("a_texcoord", 2, ScalarType::Float, 12).unwrap();
//! ```

use crate::error::GraphicsError;
use crate::hash::name_hash;

/// Maximum number of attributes in one vertex layout.
pub const MAX_VERTEX_ATTRIBUTES: usize = 16;

/// Scalar category of an attribute or uniform.
///
/// Vector and matrix declarations collapse to their scalar category; the
/// per-attribute element count carries the width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// 32-bit float.
    Float,
    /// 32-bit signed integer.
    Int,
    /// Boolean.
    Bool,
    /// Texture sampler (uniforms only).
    Sampler,
}

/// Primitive topology used to interpret the vertex stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Each vertex is a point.
    Points,
    /// Every two vertices form a line.
    Lines,
    /// Vertices form a connected line strip.
    LineStrip,
    /// Every three vertices form a triangle (default).
    #[default]
    Triangles,
    /// Vertices form a connected triangle strip.
    TriangleStrip,
}

/// Usage hint controlling how a renderable's storage is managed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferUsage {
    /// Uploaded once, drawn many times. Backed by a single buffer slot
    /// sized for exactly one region; overflowing it is an error.
    Static,
    /// Rewritten every frame (default). Backed by a ring of buffer slots
    /// with fence-gated reuse.
    #[default]
    Streamed,
}

/// A single named vertex attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexAttribute {
    name: String,
    hash: u32,
    elements: u32,
    scalar: ScalarType,
    offset: u32,
    location: u32,
}

impl VertexAttribute {
    /// The attribute name as declared by the caller.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The 32-bit name hash used for shader matching.
    pub fn hash(&self) -> u32 {
        self.hash
    }

    /// Number of scalar elements per vertex (e.g. 3 for a vec3).
    pub fn elements(&self) -> u32 {
        self.elements
    }

    /// Scalar category of the attribute.
    pub fn scalar(&self) -> ScalarType {
        self.scalar
    }

    /// Byte offset of the attribute within one vertex.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Binding location reported by the shader.
    ///
    /// Assigned when the owning renderable is bound to a shader; zero
    /// before that.
    pub fn location(&self) -> u32 {
        self.location
    }

    pub(crate) fn set_location(&mut self, location: u32) {
        self.location = location;
    }
}

/// Layout of one interleaved vertex buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    capacity: u32,
    stride: u32,
    topology: PrimitiveTopology,
    usage: BufferUsage,
    attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    /// Create a new layout.
    ///
    /// * `capacity` - maximum number of vertices one buffer slot holds
    /// * `stride` - bytes per vertex
    /// * `topology` - how the vertex stream is assembled into primitives
    /// * `usage` - static (upload once) or streamed (rewritten per frame)
    pub fn new(
        capacity: u32,
        stride: u32,
        topology: PrimitiveTopology,
        usage: BufferUsage,
    ) -> Self {
        Self {
            capacity,
            stride,
            topology,
            usage,
            attributes: Vec::with_capacity(MAX_VERTEX_ATTRIBUTES),
        }
    }

    /// Append an attribute to the layout.
    ///
    /// * `name` - attribute name, matched by hash against the shader
    /// * `elements` - scalar elements per vertex (1-4)
    /// * `scalar` - scalar category
    /// * `offset` - byte offset within one vertex
    ///
    /// # Errors
    ///
    /// [`GraphicsError::CapacityExceeded`] when the layout already holds
    /// [`MAX_VERTEX_ATTRIBUTES`] attributes, and (with the `debug-checks`
    /// feature) [`GraphicsError::HashCollision`] when the new name hashes
    /// equal to an already registered attribute.
    pub fn add_attribute(
        &mut self,
        name: &str,
        elements: u32,
        scalar: ScalarType,
        offset: u32,
    ) -> Result<(), GraphicsError> {
        if self.attributes.len() >= MAX_VERTEX_ATTRIBUTES {
            return Err(GraphicsError::CapacityExceeded(format!(
                "vertex layout holds at most {MAX_VERTEX_ATTRIBUTES} attributes"
            )));
        }

        let hash = name_hash(name);

        #[cfg(feature = "debug-checks")]
        if let Some(existing) = self.attributes.iter().find(|a| a.hash == hash) {
            return Err(GraphicsError::HashCollision {
                first: existing.name.clone(),
                second: name.to_string(),
            });
        }

        self.attributes.push(VertexAttribute {
            name: name.to_string(),
            hash,
            elements,
            scalar,
            offset,
            location: 0,
        });
        Ok(())
    }

    /// Maximum number of vertices one buffer slot holds.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Bytes per vertex.
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Primitive topology of the vertex stream.
    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    /// Usage hint.
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// The registered attributes, in declaration order.
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// Look up an attribute by name hash.
    pub fn attribute_by_hash(&self, hash: u32) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|a| a.hash == hash)
    }

    pub(crate) fn attribute_by_hash_mut(&mut self, hash: u32) -> Option<&mut VertexAttribute> {
        self.attributes.iter_mut().find(|a| a.hash == hash)
    }

    /// Size in bytes of one full buffer slot (`capacity * stride`).
    pub fn slot_size_bytes(&self) -> u64 {
        u64::from(self.capacity) * u64::from(self.stride)
    }
}
