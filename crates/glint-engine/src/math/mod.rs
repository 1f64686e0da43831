//! Transform helpers on top of `glam`.
//!
//! Conventions follow OpenGL: right-handed, column vectors, clip depth in
//! `[-1, 1]`. Composition post-multiplies, so the last transform applied to a
//! matrix is the first one a vertex sees.

mod stack;
pub mod transform;

pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};
pub use stack::TransformStack;
