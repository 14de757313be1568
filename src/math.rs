//! Projection helpers for callers feeding matrix uniforms.

use glam::Mat4;

/// Build a right-handed perspective projection with the OpenGL clip-space
/// convention (depth range [-1, 1]).
///
/// * `y_fov_radians` - vertical field of view
/// * `aspect` - width / height
/// * `near` / `far` - clip plane distances (both positive)
///
/// Pass the result to a matrix uniform as its column-major float array:
///
/// ```
/// use imdraw::math::perspective;
///
/// let projection = perspective(std::f32::consts::FRAC_PI_2, 16.0 / 9.0, 0.1, 100.0);
/// let floats: [f32; 16] = projection.to_cols_array();
/// assert_eq!(floats[11], -1.0);
/// ```
pub fn perspective(y_fov_radians: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    Mat4::perspective_rh_gl(y_fov_radians, aspect, near, far)
}
