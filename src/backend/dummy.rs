//! Dummy GPU backend for testing and development.
//!
//! [`DummyBackend`] implements the full [`GpuBackend`] trait without GPU
//! hardware. Programs are "compiled" by parsing a small GLSL-like
//! declaration subset (`attribute`/`in` and `uniform` lines), buffers are
//! plain byte vectors with real range mapping, and fences are
//! deterministic flags with a configurable auto-signal policy.
//!
//! Every draw is recorded with a snapshot of the bound program, buffer,
//! attribute bindings, and texture units, and uniform values are stored
//! per location, so tests can assert on exactly what reached the device.
//!
//! # Example
//!
//! ```
//! use imdraw::backend::{DummyBackend, GpuBackend};
//!
//! let mut device = DummyBackend::new();
//! let program = device
//!     .compile_program(
//!         "attribute vec3 a_position;\nuniform mat4 u_mvp;",
//!         "uniform vec4 u_tint;",
//!     )
//!     .unwrap();
//! assert_eq!(device.active_attributes(program).unwrap().len(), 1);
//! assert_eq!(device.active_uniforms(program).unwrap().len(), 2);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use crate::error::{GraphicsError, ShaderStage};
use crate::types::{BufferUsage, PrimitiveTopology, ScalarType};

use super::{
    AttributeBinding, AttributeInfo, BufferHandle, FenceHandle, FenceStatus, GpuBackend, MapFlags,
    ProgramHandle, TextureHandle, UniformInfo, UniformValue,
};

/// One draw recorded by the dummy device.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    /// Program active at draw time.
    pub program: Option<ProgramHandle>,
    /// Vertex buffer bound at draw time.
    pub buffer: Option<BufferHandle>,
    /// Primitive topology.
    pub topology: PrimitiveTopology,
    /// First vertex of the drawn region.
    pub first: u32,
    /// Vertex count of the drawn region.
    pub count: u32,
    /// Texture bindings (unit, handle) at draw time, by unit.
    pub textures: Vec<(u32, TextureHandle)>,
    /// Enabled attribute bindings at draw time, by location.
    pub attributes: Vec<AttributeBinding>,
}

#[derive(Debug)]
struct DummyProgram {
    attributes: Vec<AttributeInfo>,
    uniforms: Vec<UniformInfo>,
    uniform_values: HashMap<u32, UniformValue>,
}

#[derive(Debug)]
struct DummyBuffer {
    data: Vec<u8>,
    usage: BufferUsage,
}

#[derive(Debug, Clone, Copy)]
struct MappedRange {
    buffer: u64,
    offset: usize,
    len: usize,
}

/// Recording mock device.
#[derive(Debug)]
pub struct DummyBackend {
    next_handle: u64,
    programs: HashMap<u64, DummyProgram>,
    buffers: HashMap<u64, DummyBuffer>,
    fences: HashMap<u64, bool>,
    auto_signal_fences: bool,
    active_program: Option<ProgramHandle>,
    bound_buffer: Option<BufferHandle>,
    bound_textures: BTreeMap<u32, TextureHandle>,
    enabled_attributes: BTreeMap<u32, AttributeBinding>,
    mapped: Option<MappedRange>,
    draws: Vec<DrawRecord>,
    clear_count: u32,
}

impl Default for DummyBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DummyBackend {
    /// Create a new dummy device. Fences auto-signal on creation (the
    /// simulated GPU finishes work instantly).
    pub fn new() -> Self {
        Self {
            next_handle: 0,
            programs: HashMap::new(),
            buffers: HashMap::new(),
            fences: HashMap::new(),
            auto_signal_fences: true,
            active_program: None,
            bound_buffer: None,
            bound_textures: BTreeMap::new(),
            enabled_attributes: BTreeMap::new(),
            mapped: None,
            draws: Vec::new(),
            clear_count: 0,
        }
    }

    /// Control whether newly created fences start signaled.
    ///
    /// With auto-signal off the simulated GPU never finishes on its own;
    /// use [`signal_fence`] to complete work explicitly. This makes
    /// fence-timeout paths deterministic in tests.
    ///
    /// [`signal_fence`]: Self::signal_fence
    pub fn set_auto_signal_fences(&mut self, auto_signal: bool) {
        self.auto_signal_fences = auto_signal;
    }

    /// Signal a fence, as if the GPU completed the guarded commands.
    pub fn signal_fence(&mut self, fence: FenceHandle) {
        if let Some(signaled) = self.fences.get_mut(&fence.0) {
            *signaled = true;
        }
    }

    /// Signal every live fence.
    pub fn signal_all_fences(&mut self) {
        for signaled in self.fences.values_mut() {
            *signaled = true;
        }
    }

    /// Whether a fence is currently signaled.
    pub fn is_fence_signaled(&self, fence: FenceHandle) -> bool {
        self.fences.get(&fence.0).copied().unwrap_or(false)
    }

    /// Number of live (not yet deleted) fences.
    pub fn live_fence_count(&self) -> usize {
        self.fences.len()
    }

    /// Number of live buffers.
    pub fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// The recorded draws, in submission order.
    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    /// Forget all recorded draws.
    pub fn clear_draw_log(&mut self) {
        self.draws.clear();
    }

    /// Number of clears issued.
    pub fn clear_count(&self) -> u32 {
        self.clear_count
    }

    /// The value last set for a uniform location of `program`.
    pub fn uniform_value(
        &self,
        program: ProgramHandle,
        location: u32,
    ) -> Option<&UniformValue> {
        self.programs
            .get(&program.0)?
            .uniform_values
            .get(&location)
    }

    /// The current contents of a buffer.
    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(&buffer.0).map(|b| b.data.as_slice())
    }

    /// The usage hint a buffer was allocated with.
    pub fn buffer_usage(&self, buffer: BufferHandle) -> Option<BufferUsage> {
        self.buffers.get(&buffer.0).map(|b| b.usage)
    }

    fn next_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl GpuBackend for DummyBackend {
    fn name(&self) -> &'static str {
        "Dummy Backend"
    }

    fn compile_program(
        &mut self,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<ProgramHandle, GraphicsError> {
        let vertex = parse_stage(vertex_src, ShaderStage::Vertex)?;
        let fragment = parse_stage(fragment_src, ShaderStage::Fragment)?;

        // Link: merge uniform declarations across stages.
        let mut uniforms: Vec<UniformInfo> = Vec::new();
        for decl in vertex.uniforms.into_iter().chain(fragment.uniforms) {
            match uniforms.iter().find(|u| u.name == decl.name) {
                Some(existing) => {
                    if existing.scalar != decl.scalar || existing.size != decl.size {
                        return Err(GraphicsError::LinkError {
                            diagnostic: format!(
                                "uniform '{}' declared with mismatched types across stages",
                                decl.name
                            ),
                        });
                    }
                }
                None => uniforms.push(decl),
            }
        }
        for (location, uniform) in uniforms.iter_mut().enumerate() {
            uniform.location = location as u32;
        }

        let handle = ProgramHandle(self.next_handle());
        log::debug!(
            "DummyBackend: linked program {:?} ({} attributes, {} uniforms)",
            handle,
            vertex.attributes.len(),
            uniforms.len()
        );
        self.programs.insert(
            handle.0,
            DummyProgram {
                attributes: vertex.attributes,
                uniforms,
                uniform_values: HashMap::new(),
            },
        );
        Ok(handle)
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        if self.programs.remove(&program.0).is_none() {
            log::warn!("DummyBackend: delete of unknown program {program:?}");
        }
        if self.active_program == Some(program) {
            self.active_program = None;
        }
    }

    fn active_attributes(
        &self,
        program: ProgramHandle,
    ) -> Result<Vec<AttributeInfo>, GraphicsError> {
        self.programs
            .get(&program.0)
            .map(|p| p.attributes.clone())
            .ok_or_else(|| GraphicsError::InvalidParameter("unknown program".to_string()))
    }

    fn active_uniforms(&self, program: ProgramHandle) -> Result<Vec<UniformInfo>, GraphicsError> {
        self.programs
            .get(&program.0)
            .map(|p| p.uniforms.clone())
            .ok_or_else(|| GraphicsError::InvalidParameter("unknown program".to_string()))
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        self.active_program = program;
    }

    fn set_uniform(&mut self, location: u32, value: &UniformValue) {
        let Some(program) = self.active_program else {
            log::warn!("DummyBackend: set_uniform with no active program");
            return;
        };
        if let Some(entry) = self.programs.get_mut(&program.0) {
            log::trace!("DummyBackend: uniform {location} of {program:?} = {value:?}");
            entry.uniform_values.insert(location, value.clone());
        }
    }

    fn allocate_buffer(
        &mut self,
        size: u64,
        usage: BufferUsage,
    ) -> Result<BufferHandle, GraphicsError> {
        if size == 0 {
            return Err(GraphicsError::InvalidParameter(
                "buffer size cannot be zero".to_string(),
            ));
        }
        let handle = BufferHandle(self.next_handle());
        log::debug!("DummyBackend: allocated buffer {handle:?}, size={size}, usage={usage:?}");
        self.buffers.insert(
            handle.0,
            DummyBuffer {
                data: vec![0; size as usize],
                usage,
            },
        );
        Ok(handle)
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        if self.buffers.remove(&buffer.0).is_none() {
            log::warn!("DummyBackend: delete of unknown buffer {buffer:?}");
        }
        if self.bound_buffer == Some(buffer) {
            self.bound_buffer = None;
        }
    }

    fn bind_buffer(&mut self, buffer: Option<BufferHandle>) {
        self.bound_buffer = buffer;
    }

    fn map_range(
        &mut self,
        buffer: BufferHandle,
        offset: u64,
        size: u64,
        flags: MapFlags,
    ) -> Result<&mut [u8], GraphicsError> {
        if let Some(mapped) = self.mapped {
            return Err(GraphicsError::MapFailed(format!(
                "buffer {} is still mapped",
                mapped.buffer
            )));
        }
        if !flags.contains(MapFlags::WRITE) {
            return Err(GraphicsError::MapFailed(
                "mapping requested without WRITE access".to_string(),
            ));
        }
        let buffer_len = self
            .buffers
            .get(&buffer.0)
            .map(|b| b.data.len())
            .ok_or_else(|| GraphicsError::MapFailed("unknown buffer".to_string()))?;

        let offset = offset as usize;
        let size = size as usize;
        let end = offset
            .checked_add(size)
            .filter(|&end| end <= buffer_len)
            .ok_or_else(|| {
                GraphicsError::MapFailed(format!(
                    "range {}..{} exceeds buffer size {buffer_len}",
                    offset,
                    offset + size
                ))
            })?;

        log::trace!("DummyBackend: mapped {buffer:?} range {offset}..{end}");
        self.mapped = Some(MappedRange {
            buffer: buffer.0,
            offset,
            len: size,
        });
        match self.buffers.get_mut(&buffer.0) {
            Some(entry) => Ok(&mut entry.data[offset..end]),
            None => Err(GraphicsError::MapFailed("unknown buffer".to_string())),
        }
    }

    fn unmap(&mut self, buffer: BufferHandle) {
        match self.mapped.take() {
            Some(mapped) if mapped.buffer == buffer.0 => {
                log::trace!(
                    "DummyBackend: unmapped {buffer:?} range {}..{}",
                    mapped.offset,
                    mapped.offset + mapped.len
                );
            }
            Some(mapped) => {
                log::warn!(
                    "DummyBackend: unmap of {buffer:?} while buffer {} is mapped",
                    mapped.buffer
                );
            }
            None => log::warn!("DummyBackend: unmap with no mapped range"),
        }
    }

    fn create_fence(&mut self) -> FenceHandle {
        let handle = FenceHandle(self.next_handle());
        self.fences.insert(handle.0, self.auto_signal_fences);
        log::trace!(
            "DummyBackend: created fence {handle:?} (signaled={})",
            self.auto_signal_fences
        );
        handle
    }

    fn wait_fence(&mut self, fence: FenceHandle, timeout: Duration) -> FenceStatus {
        match self.fences.get(&fence.0) {
            Some(true) => FenceStatus::Signaled,
            Some(false) => {
                // Nothing else runs in the dummy device, so an unsignaled
                // fence can only time out.
                log::trace!("DummyBackend: wait on {fence:?} expired after {timeout:?}");
                FenceStatus::TimedOut
            }
            None => {
                log::warn!("DummyBackend: wait on unknown fence {fence:?}");
                FenceStatus::Failed
            }
        }
    }

    fn delete_fence(&mut self, fence: FenceHandle) {
        let removed = self.fences.remove(&fence.0);
        debug_assert!(removed.is_some(), "double delete of fence {fence:?}");
        if removed.is_none() {
            log::warn!("DummyBackend: delete of unknown fence {fence:?}");
        }
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        self.bound_textures.insert(unit, texture);
    }

    fn enable_attribute(&mut self, binding: &AttributeBinding) {
        self.enabled_attributes.insert(binding.location, *binding);
    }

    fn disable_attribute(&mut self, location: u32) {
        self.enabled_attributes.remove(&location);
    }

    fn draw_arrays(&mut self, topology: PrimitiveTopology, first: u32, count: u32) {
        log::trace!(
            "DummyBackend: draw_arrays {topology:?} first={first} count={count} program={:?}",
            self.active_program
        );
        self.draws.push(DrawRecord {
            program: self.active_program,
            buffer: self.bound_buffer,
            topology,
            first,
            count,
            textures: self
                .bound_textures
                .iter()
                .map(|(&unit, &texture)| (unit, texture))
                .collect(),
            attributes: self.enabled_attributes.values().copied().collect(),
        });
    }

    fn clear(&mut self) {
        self.clear_count += 1;
    }
}

struct StageInterface {
    attributes: Vec<AttributeInfo>,
    uniforms: Vec<UniformInfo>,
}

/// Parse the declaration subset of one shader stage.
///
/// Recognized lines: `attribute <type> <name>;` / `in <type> <name>;`
/// (vertex stage only) and `uniform <type> <name>[N];`. Everything else
/// is ignored, as a real compiler's reflection would collapse it away.
fn parse_stage(source: &str, stage: ShaderStage) -> Result<StageInterface, GraphicsError> {
    let mut attributes = Vec::new();
    let mut uniforms = Vec::new();

    for (line_index, raw) in source.lines().enumerate() {
        let line = raw.split("//").next().unwrap_or("").trim();
        let Some(decl) = line.strip_suffix(';') else {
            continue;
        };
        let mut tokens = decl.split_whitespace();
        let keyword = tokens.next().unwrap_or("");
        let compile_err = |message: String| GraphicsError::CompileError {
            stage,
            diagnostic: format!("0:{}: error: {message}", line_index + 1),
        };

        match keyword {
            "attribute" | "in" if stage == ShaderStage::Vertex => {
                let (Some(ty), Some(name)) = (tokens.next(), tokens.next()) else {
                    return Err(compile_err(format!("malformed declaration '{line}'")));
                };
                let (scalar, elements) = attribute_type(ty)
                    .ok_or_else(|| compile_err(format!("unknown type name '{ty}'")))?;
                attributes.push(AttributeInfo {
                    name: name.to_string(),
                    scalar,
                    elements,
                });
            }
            "uniform" => {
                let (Some(ty), Some(name)) = (tokens.next(), tokens.next()) else {
                    return Err(compile_err(format!("malformed declaration '{line}'")));
                };
                let scalar = uniform_type(ty)
                    .ok_or_else(|| compile_err(format!("unknown type name '{ty}'")))?;
                let (name, size) = split_array_suffix(name)
                    .ok_or_else(|| compile_err(format!("malformed array declarator '{name}'")))?;
                uniforms.push(UniformInfo {
                    name: name.to_string(),
                    scalar,
                    size,
                    location: 0,
                });
            }
            _ => {}
        }
    }

    Ok(StageInterface {
        attributes,
        uniforms,
    })
}

fn attribute_type(ty: &str) -> Option<(ScalarType, u32)> {
    Some(match ty {
        "float" => (ScalarType::Float, 1),
        "vec2" => (ScalarType::Float, 2),
        "vec3" => (ScalarType::Float, 3),
        "vec4" => (ScalarType::Float, 4),
        "int" => (ScalarType::Int, 1),
        "ivec2" => (ScalarType::Int, 2),
        "ivec3" => (ScalarType::Int, 3),
        "ivec4" => (ScalarType::Int, 4),
        "bool" => (ScalarType::Bool, 1),
        _ => return None,
    })
}

fn uniform_type(ty: &str) -> Option<ScalarType> {
    Some(match ty {
        "float" | "vec2" | "vec3" | "vec4" | "mat2" | "mat3" | "mat4" => ScalarType::Float,
        "int" | "ivec2" | "ivec3" | "ivec4" => ScalarType::Int,
        "bool" | "bvec2" | "bvec3" | "bvec4" => ScalarType::Bool,
        "sampler1D" | "sampler2D" | "sampler3D" | "samplerCube" => ScalarType::Sampler,
        _ => return None,
    })
}

/// Split `name[N]` into `(name, N)`; a bare name has size 1.
fn split_array_suffix(name: &str) -> Option<(&str, u32)> {
    match name.split_once('[') {
        None => Some((name, 1)),
        Some((base, rest)) => {
            let digits = rest.strip_suffix(']')?;
            let size: u32 = digits.parse().ok()?;
            Some((base, size))
        }
    }
}
