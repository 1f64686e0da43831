use glam::{Mat4, Vec3};

use super::transform;

/// Matrix stack for hierarchical drawing.
///
/// Always holds at least one matrix; the bottom entry is the identity after
/// construction or [`TransformStack::reset`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransformStack {
    stack: Vec<Mat4>,
}

impl Default for TransformStack {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformStack {
    pub fn new() -> Self {
        Self {
            stack: vec![Mat4::IDENTITY],
        }
    }

    /// Duplicates the top matrix.
    pub fn push(&mut self) {
        let top = self.top();
        self.stack.push(top);
    }

    /// Discards the top matrix. The last matrix is never popped; returns
    /// whether anything was removed.
    pub fn pop(&mut self) -> bool {
        if self.stack.len() > 1 {
            self.stack.pop();
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.stack.clear();
        self.stack.push(Mat4::IDENTITY);
    }

    pub fn top(&self) -> Mat4 {
        self.stack.last().copied().unwrap_or(Mat4::IDENTITY)
    }

    pub fn set(&mut self, m: Mat4) {
        if let Some(top) = self.stack.last_mut() {
            *top = m;
        }
    }

    /// Post-multiplies the top matrix by `m`.
    pub fn mul(&mut self, m: Mat4) {
        self.set(self.top() * m);
    }

    pub fn translate(&mut self, v: Vec3) {
        self.set(transform::translate(self.top(), v));
    }

    pub fn rotate(&mut self, radians: f32, axis: Vec3) {
        self.set(transform::rotate(self.top(), radians, axis));
    }

    pub fn scale(&mut self, v: Vec3) {
        self.set(transform::scale(self.top(), v));
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}
