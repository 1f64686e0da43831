/// GL context creation parameters.
///
/// Keep this structure minimal. Add flags only when a concrete platform or
/// driver requirement exists.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextParams {
    /// Wait for vertical blank on swap.
    pub vsync: bool,

    /// Multisample count; `0` disables multisampling.
    pub samples: u8,

    /// Requested core-profile version `(major, minor)`.
    pub gl_version: (u8, u8),
}

impl Default for ContextParams {
    fn default() -> Self {
        Self {
            vsync: true,
            samples: 4,
            gl_version: (3, 3),
        }
    }
}
