//! GPU device abstraction layer.
//!
//! The façade never talks to a graphics API directly; everything it needs
//! from the hardware is expressed as the [`GpuBackend`] trait: program
//! compilation and introspection, buffer allocation and range mapping,
//! one-shot fences, and the per-draw binding/draw/clear primitives.
//!
//! # Available Backends
//!
//! - [`DummyBackend`]: recording mock device for tests and development.
//!   No GPU hardware required.
//!
//! Platform window/context creation, buffer swapping, and real API
//! bindings live outside this crate; an integration supplies its own
//! `GpuBackend` implementation on top of whatever API it owns.

pub mod dummy;

use std::time::Duration;

use bitflags::bitflags;

use crate::error::GraphicsError;
use crate::types::{BufferUsage, PrimitiveTopology, ScalarType};

pub use dummy::DummyBackend;

/// Handle to a compiled and linked shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u64);

/// Handle to a device buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u64);

/// Handle to a one-shot GPU completion fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FenceHandle(pub u64);

/// Handle to a device texture.
///
/// Textures are created and owned outside this crate; the façade only
/// binds them to texture units at draw time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

bitflags! {
    /// Flags for [`GpuBackend::map_range`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MapFlags: u32 {
        /// The caller will write to the mapped range.
        const WRITE = 1 << 0;
        /// The device must not synchronize against in-flight GPU work;
        /// the caller guarantees non-overlap (via fences).
        const UNSYNCHRONIZED = 1 << 1;
    }
}

/// Result of waiting on a fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FenceStatus {
    /// The fence signaled within the timeout.
    Signaled,
    /// The timeout elapsed before the fence signaled.
    TimedOut,
    /// The wait itself failed (lost device, invalid fence).
    Failed,
}

/// One active vertex attribute reported by program introspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeInfo {
    /// Attribute name as it appears in the shader.
    pub name: String,
    /// Scalar category.
    pub scalar: ScalarType,
    /// Scalar elements per vertex (vector width).
    pub elements: u32,
}

/// One active uniform reported by program introspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformInfo {
    /// Uniform name as it appears in the shader.
    pub name: String,
    /// Scalar category.
    pub scalar: ScalarType,
    /// Declared element count (array length; 1 for non-arrays).
    pub size: u32,
    /// Bound location.
    pub location: u32,
}

/// A fully resolved vertex attribute binding for one draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeBinding {
    /// Shader-assigned binding location.
    pub location: u32,
    /// Scalar elements per vertex.
    pub elements: u32,
    /// Scalar category.
    pub scalar: ScalarType,
    /// Bytes between consecutive vertices.
    pub stride: u32,
    /// Byte offset of the attribute within one vertex.
    pub offset: u32,
}

/// A typed uniform value forwarded to the device.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    /// Single float.
    Float(f32),
    /// Two floats.
    Vec2([f32; 2]),
    /// Three floats.
    Vec3([f32; 3]),
    /// Four floats.
    Vec4([f32; 4]),
    /// Signed integer (also used for sampler unit indices).
    Int(i32),
    /// Column-major 4x4 float matrix.
    Mat4([f32; 16]),
}

/// Abstract GPU device.
///
/// The trait models the ambient-state style of GL-family APIs: a current
/// program, a bound vertex buffer, and per-unit texture bindings. The
/// façade brackets every draw with explicit unbinds so no state leaks
/// between draw calls.
///
/// Fences are one-shot: created after a draw, waited on at most once,
/// then deleted. [`GpuBackend::wait_fence`] takes a bounded timeout and
/// reports expiry instead of blocking forever.
pub trait GpuBackend {
    /// Backend name, for logs.
    fn name(&self) -> &'static str;

    /// Compile both shader stages and link them into a program.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::CompileError`] or [`GraphicsError::LinkError`]
    /// carrying the device diagnostic text.
    fn compile_program(
        &mut self,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<ProgramHandle, GraphicsError>;

    /// Delete a program.
    fn delete_program(&mut self, program: ProgramHandle);

    /// List the program's active vertex attributes. The position of each
    /// entry is its binding location.
    fn active_attributes(
        &self,
        program: ProgramHandle,
    ) -> Result<Vec<AttributeInfo>, GraphicsError>;

    /// List the program's active uniforms.
    fn active_uniforms(&self, program: ProgramHandle) -> Result<Vec<UniformInfo>, GraphicsError>;

    /// Set (or with `None` clear) the current program.
    fn use_program(&mut self, program: Option<ProgramHandle>);

    /// Set a uniform on the current program.
    fn set_uniform(&mut self, location: u32, value: &UniformValue);

    /// Allocate a device buffer of `size` bytes.
    fn allocate_buffer(
        &mut self,
        size: u64,
        usage: BufferUsage,
    ) -> Result<BufferHandle, GraphicsError>;

    /// Delete a buffer.
    fn delete_buffer(&mut self, buffer: BufferHandle);

    /// Bind (or with `None` unbind) the current vertex buffer.
    fn bind_buffer(&mut self, buffer: Option<BufferHandle>);

    /// Map `size` bytes of `buffer` starting at `offset` for client
    /// access. At most one range may be mapped at a time.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::MapFailed`] with the device diagnostic when the
    /// range cannot be mapped.
    fn map_range(
        &mut self,
        buffer: BufferHandle,
        offset: u64,
        size: u64,
        flags: MapFlags,
    ) -> Result<&mut [u8], GraphicsError>;

    /// End the current mapping of `buffer`.
    fn unmap(&mut self, buffer: BufferHandle);

    /// Record a fence that signals when all commands issued so far have
    /// completed on the GPU.
    fn create_fence(&mut self) -> FenceHandle;

    /// Wait for a fence with a bounded timeout.
    fn wait_fence(&mut self, fence: FenceHandle, timeout: Duration) -> FenceStatus;

    /// Delete a fence.
    fn delete_fence(&mut self, fence: FenceHandle);

    /// Bind a texture to a texture unit.
    fn bind_texture(&mut self, unit: u32, texture: TextureHandle);

    /// Enable and configure one vertex attribute binding.
    fn enable_attribute(&mut self, binding: &AttributeBinding);

    /// Disable a vertex attribute binding.
    fn disable_attribute(&mut self, location: u32);

    /// Draw `count` vertices starting at `first` from the bound buffer.
    fn draw_arrays(&mut self, topology: PrimitiveTopology, first: u32, count: u32);

    /// Clear the full render target.
    fn clear(&mut self);
}
