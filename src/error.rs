//! Graphics error types.
//!
//! Contract violations (capacity overruns, layout/shader skew, uniform
//! type mismatches, fence timeouts) indicate a caller bug or a broken
//! device, not a retryable runtime condition. They are reported as typed
//! errors rather than aborts so callers can decide how to fail.

use std::time::Duration;

use thiserror::Error;

/// Shader stage, used in compile diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex stage.
    Vertex,
    /// Fragment stage.
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vertex => write!(f, "vertex"),
            Self::Fragment => write!(f, "fragment"),
        }
    }
}

/// Errors that can occur in the graphics system.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphicsError {
    /// A fixed capacity (attribute table, uniform table, frame queue,
    /// vertex buffer) was exceeded.
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),
    /// The declared vertex layout does not match the shader's interface.
    #[error("vertex layout does not match shader interface: {0}")]
    LayoutMismatch(String),
    /// A uniform was set with a value incompatible with its declaration.
    #[error("uniform type mismatch: {0}")]
    UniformTypeMismatch(String),
    /// A fence wait exceeded its budget or failed outright. The CPU is
    /// too far ahead of the GPU, or the device is in a broken state.
    #[error("fence wait timed out or failed after {0:?}")]
    FenceTimeout(Duration),
    /// A shader stage failed to compile. Carries the device diagnostic.
    #[error("{stage} shader failed to compile: {diagnostic}")]
    CompileError {
        /// Stage that failed.
        stage: ShaderStage,
        /// Compiler diagnostic text reported by the device.
        diagnostic: String,
    },
    /// The program failed to link. Carries the device diagnostic.
    #[error("program failed to link: {diagnostic}")]
    LinkError {
        /// Linker diagnostic text reported by the device.
        diagnostic: String,
    },
    /// A renderable's shader can be set at most once.
    #[error("renderable already has a shader bound")]
    ShaderAlreadyBound,
    /// The operation requires a shader to be bound first.
    #[error("renderable has no shader bound")]
    ShaderNotBound,
    /// Two distinct names hash to the same identifier within one table.
    #[error("name hash collision between \"{first}\" and \"{second}\"")]
    HashCollision {
        /// Name already registered.
        first: String,
        /// Name whose hash collides with `first`.
        second: String,
    },
    /// No uniform with the given name exists in the shader.
    #[error("unknown uniform \"{0}\"")]
    UnknownUniform(String),
    /// The device could not map the requested buffer range.
    #[error("buffer mapping failed: {0}")]
    MapFailed(String),
    /// The referenced renderable does not exist (never created, or
    /// already destroyed).
    #[error("renderable not found")]
    RenderableNotFound,
    /// An invalid parameter was provided.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}
