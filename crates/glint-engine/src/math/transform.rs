use glam::{Mat4, Vec3};

/// `m` followed by a translation by `v`.
pub fn translate(m: Mat4, v: Vec3) -> Mat4 {
    m * Mat4::from_translation(v)
}

/// `m` followed by a rotation of `radians` around `axis`.
///
/// A zero axis leaves `m` unchanged.
pub fn rotate(m: Mat4, radians: f32, axis: Vec3) -> Mat4 {
    let axis = axis.normalize_or_zero();
    if axis == Vec3::ZERO {
        return m;
    }
    m * Mat4::from_axis_angle(axis, radians)
}

/// `m` followed by a non-uniform scale.
pub fn scale(m: Mat4, v: Vec3) -> Mat4 {
    m * Mat4::from_scale(v)
}

/// View matrix looking from `eye` towards `center`.
pub fn look_at(eye: Vec3, center: Vec3, up: Vec3) -> Mat4 {
    Mat4::look_at_rh(eye, center, up)
}

/// Perspective projection; `fov_y` in radians.
pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    Mat4::perspective_rh_gl(fov_y, aspect, near, far)
}

pub fn ortho(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    Mat4::orthographic_rh_gl(left, right, bottom, top, near, far)
}
