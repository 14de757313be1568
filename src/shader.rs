//! Shader objects.
//!
//! A [`Shader`] wraps a compiled and linked device program together with
//! its introspected uniform table. The table is bounded
//! ([`MAX_UNIFORMS`]) and indexed by name hash, so uniform setters never
//! compare strings on the hot path.
//!
//! Lifecycle: [`Shader::load`] compiles, links, and introspects;
//! [`Shader::activate`] / [`Shader::deactivate`] toggle the device's
//! current program; [`Shader::unload`] releases the program. Binding a
//! shader to a renderable (which validates the vertex layout against the
//! program's attribute interface) goes through
//! [`RenderContext::bind_shader`](crate::context::RenderContext::bind_shader).
//!
//! # Example
//!
//! ```
//! use imdraw::backend::DummyBackend;
//! use imdraw::Shader;
//!
//! let mut device = DummyBackend::new();
//! let shader = Shader::load(
//!     &mut device,
//!     "attribute vec3 a_position;\nuniform mat4 u_mvp;",
//!     "uniform vec4 u_tint;",
//! )
//! .unwrap();
//!
//! shader.activate(&mut device);
//! shader.set_f32(&mut device, "u_tint", &[1.0, 0.5, 0.25, 1.0]).unwrap();
//! Shader::deactivate(&mut device);
//! ```

use crate::backend::{GpuBackend, ProgramHandle, UniformValue};
use crate::error::GraphicsError;
use crate::hash::name_hash;
use crate::types::ScalarType;

/// Maximum number of active uniforms one shader may declare.
pub const MAX_UNIFORMS: usize = 16;

/// One entry of a shader's uniform table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uniform {
    name: String,
    hash: u32,
    size: u32,
    scalar: ScalarType,
    location: u32,
    index: u32,
}

impl Uniform {
    /// Uniform name as declared in the shader.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 32-bit name hash used for lookup.
    pub fn hash(&self) -> u32 {
        self.hash
    }

    /// Declared element count (array length; 1 for non-arrays).
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Scalar category.
    pub fn scalar(&self) -> ScalarType {
        self.scalar
    }

    /// Bound location.
    pub fn location(&self) -> u32 {
        self.location
    }

    /// Declaration index in the introspected uniform list.
    pub fn index(&self) -> u32 {
        self.index
    }
}

/// A compiled program plus its introspected uniform table.
#[derive(Debug)]
pub struct Shader {
    program: ProgramHandle,
    uniforms: Vec<Uniform>,
}

impl Shader {
    /// Compile and link a program from vertex and fragment source, then
    /// introspect its active uniforms.
    ///
    /// # Errors
    ///
    /// - [`GraphicsError::CompileError`] / [`GraphicsError::LinkError`]
    ///   with the device diagnostic (also logged at error level when the
    ///   `debug-checks` feature is on).
    /// - [`GraphicsError::CapacityExceeded`] when the program declares
    ///   more than [`MAX_UNIFORMS`] active uniforms.
    /// - [`GraphicsError::HashCollision`] (`debug-checks`) when two
    ///   uniform names hash identically.
    pub fn load(
        device: &mut dyn GpuBackend,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<Self, GraphicsError> {
        let program = match device.compile_program(vertex_src, fragment_src) {
            Ok(program) => program,
            Err(err) => {
                #[cfg(feature = "debug-checks")]
                log_device_diagnostic(&err);
                return Err(err);
            }
        };

        let infos = device.active_uniforms(program)?;
        if infos.len() > MAX_UNIFORMS {
            device.delete_program(program);
            return Err(GraphicsError::CapacityExceeded(format!(
                "program declares {} uniforms, table holds at most {MAX_UNIFORMS}",
                infos.len()
            )));
        }

        let uniforms: Vec<Uniform> = infos
            .into_iter()
            .enumerate()
            .map(|(index, info)| Uniform {
                hash: name_hash(&info.name),
                name: info.name,
                size: info.size,
                scalar: info.scalar,
                location: info.location,
                index: index as u32,
            })
            .collect();

        #[cfg(feature = "debug-checks")]
        for (i, a) in uniforms.iter().enumerate() {
            if let Some(b) = uniforms[i + 1..].iter().find(|b| b.hash == a.hash) {
                let err = GraphicsError::HashCollision {
                    first: a.name.clone(),
                    second: b.name.clone(),
                };
                device.delete_program(program);
                return Err(err);
            }
        }

        log::debug!(
            "loaded shader program {:?} with {} uniforms",
            program,
            uniforms.len()
        );
        Ok(Self { program, uniforms })
    }

    /// The compiled program handle.
    pub fn program(&self) -> ProgramHandle {
        self.program
    }

    /// The introspected uniform table, in declaration order.
    pub fn uniforms(&self) -> &[Uniform] {
        &self.uniforms
    }

    /// Look up a uniform by name (hashed lookup).
    pub fn find_uniform(&self, name: &str) -> Option<&Uniform> {
        let hash = name_hash(name);
        self.uniforms.iter().find(|u| u.hash == hash)
    }

    /// Make this program the device's current program.
    pub fn activate(&self, device: &mut dyn GpuBackend) {
        device.use_program(Some(self.program));
    }

    /// Clear the device's current program.
    pub fn deactivate(device: &mut dyn GpuBackend) {
        device.use_program(None);
    }

    /// Set a float uniform from 1-4 components.
    ///
    /// The uniform must be declared as a non-array float quantity
    /// (`float`/`vec2`/`vec3`/`vec4`).
    ///
    /// # Errors
    ///
    /// [`GraphicsError::UnknownUniform`] on a name miss,
    /// [`GraphicsError::UniformTypeMismatch`] on a scalar-type or
    /// element-size mismatch or an unsupported component count.
    pub fn set_f32(
        &self,
        device: &mut dyn GpuBackend,
        name: &str,
        values: &[f32],
    ) -> Result<(), GraphicsError> {
        let uniform = self.checked_lookup(name, ScalarType::Float)?;
        if uniform.size != 1 {
            return Err(GraphicsError::UniformTypeMismatch(format!(
                "uniform \"{name}\" has element size {}, expected 1",
                uniform.size
            )));
        }

        let value = match *values {
            [x] => UniformValue::Float(x),
            [x, y] => UniformValue::Vec2([x, y]),
            [x, y, z] => UniformValue::Vec3([x, y, z]),
            [x, y, z, w] => UniformValue::Vec4([x, y, z, w]),
            _ => {
                return Err(GraphicsError::UniformTypeMismatch(format!(
                    "unsupported component count {} for uniform \"{name}\"",
                    values.len()
                )))
            }
        };
        device.set_uniform(uniform.location, &value);
        Ok(())
    }

    /// Set a 4x4 float matrix uniform (column-major, 16 floats).
    ///
    /// The uniform must be declared as a non-array float quantity.
    pub fn set_matrix(
        &self,
        device: &mut dyn GpuBackend,
        name: &str,
        matrix: &[f32; 16],
    ) -> Result<(), GraphicsError> {
        let uniform = self.checked_lookup(name, ScalarType::Float)?;
        if uniform.size != 1 {
            return Err(GraphicsError::UniformTypeMismatch(format!(
                "uniform \"{name}\" has element size {}, expected 1",
                uniform.size
            )));
        }
        device.set_uniform(uniform.location, &UniformValue::Mat4(*matrix));
        Ok(())
    }

    /// Bind a sampler uniform to a texture unit index.
    ///
    /// The texture itself is bound to that unit at draw time.
    pub fn set_texture(
        &self,
        device: &mut dyn GpuBackend,
        name: &str,
        unit: i32,
    ) -> Result<(), GraphicsError> {
        let uniform = self.checked_lookup(name, ScalarType::Sampler)?;
        device.set_uniform(uniform.location, &UniformValue::Int(unit));
        Ok(())
    }

    /// Release the program. The shader must no longer be referenced by
    /// any renderable.
    pub fn unload(self, device: &mut dyn GpuBackend) {
        log::debug!("unloading shader program {:?}", self.program);
        device.delete_program(self.program);
    }

    fn checked_lookup(
        &self,
        name: &str,
        expected: ScalarType,
    ) -> Result<&Uniform, GraphicsError> {
        let uniform = self
            .find_uniform(name)
            .ok_or_else(|| GraphicsError::UnknownUniform(name.to_string()))?;
        if uniform.scalar != expected {
            return Err(GraphicsError::UniformTypeMismatch(format!(
                "uniform \"{name}\" is {:?}, expected {expected:?}",
                uniform.scalar
            )));
        }
        Ok(uniform)
    }
}

#[cfg(feature = "debug-checks")]
fn log_device_diagnostic(err: &GraphicsError) {
    match err {
        GraphicsError::CompileError { stage, diagnostic } => {
            log::error!("{stage} shader failed to compile:\n{diagnostic}");
        }
        GraphicsError::LinkError { diagnostic } => {
            log::error!("program failed to link:\n{diagnostic}");
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DummyBackend;

    const VS: &str = "attribute vec3 a_position;\nuniform mat4 u_mvp;\nuniform vec3 u_eye;";
    const FS: &str = "uniform vec4 u_tint;\nuniform sampler2D u_texture;\nuniform int u_mode;";

    fn load_test_shader(device: &mut DummyBackend) -> Shader {
        Shader::load(device, VS, FS).unwrap()
    }

    #[test]
    fn test_load_populates_uniform_table() {
        let mut device = DummyBackend::new();
        let shader = load_test_shader(&mut device);

        assert_eq!(shader.uniforms().len(), 5);
        let mvp = shader.find_uniform("u_mvp").unwrap();
        assert_eq!(mvp.scalar(), ScalarType::Float);
        assert_eq!(mvp.size(), 1);
        assert_eq!(mvp.index(), 0);

        let texture = shader.find_uniform("u_texture").unwrap();
        assert_eq!(texture.scalar(), ScalarType::Sampler);

        assert!(shader.find_uniform("u_missing").is_none());
    }

    #[test]
    fn test_uniform_table_capacity() {
        let mut device = DummyBackend::new();
        let mut vs = String::new();
        for i in 0..(MAX_UNIFORMS + 1) {
            vs.push_str(&format!("uniform float u_{i};\n"));
        }
        let err = Shader::load(&mut device, &vs, "").unwrap_err();
        assert!(matches!(err, GraphicsError::CapacityExceeded(_)));
    }

    #[cfg(feature = "debug-checks")]
    #[test]
    fn test_colliding_uniform_names_rejected_at_link() {
        let mut device = DummyBackend::new();
        // "ab" and "bA" hash identically; a program declaring both must
        // be rejected, not silently mis-looked-up later.
        let err =
            Shader::load(&mut device, "uniform float ab;\nuniform float bA;", "").unwrap_err();
        assert!(matches!(err, GraphicsError::HashCollision { .. }));
    }

    #[test]
    fn test_set_f32() {
        let mut device = DummyBackend::new();
        let shader = load_test_shader(&mut device);
        shader.activate(&mut device);

        shader
            .set_f32(&mut device, "u_tint", &[0.1, 0.2, 0.3, 0.4])
            .unwrap();
        let location = shader.find_uniform("u_tint").unwrap().location();
        assert_eq!(
            device.uniform_value(shader.program(), location),
            Some(&UniformValue::Vec4([0.1, 0.2, 0.3, 0.4]))
        );

        shader.set_f32(&mut device, "u_eye", &[1.0, 2.0, 3.0]).unwrap();
    }

    #[test]
    fn test_set_f32_rejects_bad_counts_and_types() {
        let mut device = DummyBackend::new();
        let shader = load_test_shader(&mut device);
        shader.activate(&mut device);

        let err = shader.set_f32(&mut device, "u_tint", &[0.0; 5]).unwrap_err();
        assert!(matches!(err, GraphicsError::UniformTypeMismatch(_)));

        let err = shader.set_f32(&mut device, "u_mode", &[1.0]).unwrap_err();
        assert!(matches!(err, GraphicsError::UniformTypeMismatch(_)));

        let err = shader.set_f32(&mut device, "u_nope", &[1.0]).unwrap_err();
        assert!(matches!(err, GraphicsError::UnknownUniform(_)));
    }

    #[test]
    fn test_set_matrix() {
        let mut device = DummyBackend::new();
        let shader = load_test_shader(&mut device);
        shader.activate(&mut device);

        let matrix: [f32; 16] = std::array::from_fn(|i| i as f32);
        shader.set_matrix(&mut device, "u_mvp", &matrix).unwrap();

        let location = shader.find_uniform("u_mvp").unwrap().location();
        assert_eq!(
            device.uniform_value(shader.program(), location),
            Some(&UniformValue::Mat4(matrix))
        );
    }

    #[test]
    fn test_set_matrix_requires_scalar_size_one() {
        let mut device = DummyBackend::new();
        let shader =
            Shader::load(&mut device, "uniform mat4 u_bones[4];", "").unwrap();
        shader.activate(&mut device);

        let err = shader
            .set_matrix(&mut device, "u_bones", &[0.0; 16])
            .unwrap_err();
        assert!(matches!(err, GraphicsError::UniformTypeMismatch(_)));
    }

    #[test]
    fn test_set_texture() {
        let mut device = DummyBackend::new();
        let shader = load_test_shader(&mut device);
        shader.activate(&mut device);

        shader.set_texture(&mut device, "u_texture", 2).unwrap();
        let location = shader.find_uniform("u_texture").unwrap().location();
        assert_eq!(
            device.uniform_value(shader.program(), location),
            Some(&UniformValue::Int(2))
        );

        let err = shader.set_texture(&mut device, "u_tint", 0).unwrap_err();
        assert!(matches!(err, GraphicsError::UniformTypeMismatch(_)));
    }
}
