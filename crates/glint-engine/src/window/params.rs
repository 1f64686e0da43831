use crate::device::ContextParams;

/// Window and GL context configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowParams {
    pub title: String,
    /// Inner size in logical pixels.
    pub width: u32,
    pub height: u32,
    /// Borderless fullscreen on the current monitor.
    pub fullscreen: bool,
    pub vsync: bool,
    /// Multisample count; `0` disables multisampling.
    pub samples: u8,
    /// Requested core-profile version `(major, minor)`.
    pub gl_version: (u8, u8),
}

impl Default for WindowParams {
    fn default() -> Self {
        let gl = ContextParams::default();
        Self {
            title: "glint".to_string(),
            width: 1280,
            height: 720,
            fullscreen: false,
            vsync: gl.vsync,
            samples: gl.samples,
            gl_version: gl.gl_version,
        }
    }
}

impl WindowParams {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }

    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    pub fn with_samples(mut self, samples: u8) -> Self {
        self.samples = samples;
        self
    }

    pub fn with_gl_version(mut self, major: u8, minor: u8) -> Self {
        self.gl_version = (major, minor);
        self
    }

    /// Applies command-line flags on top of the current values.
    ///
    /// Recognized flags are matched exactly: `--fullscreen`, `--windowed`,
    /// `--vsync`, `--no-vsync`. Later flags win. Anything else is ignored.
    pub fn apply_args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for arg in args {
            match arg.as_ref() {
                "--fullscreen" => self.fullscreen = true,
                "--windowed" => self.fullscreen = false,
                "--vsync" => self.vsync = true,
                "--no-vsync" => self.vsync = false,
                other => log::debug!("ignoring argument {other:?}"),
            }
        }
        self
    }

    pub fn context_params(&self) -> ContextParams {
        ContextParams {
            vsync: self.vsync,
            samples: self.samples,
            gl_version: self.gl_version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let p = WindowParams::default().apply_args(["--fullscreen", "--no-vsync"]);
        assert!(p.fullscreen);
        assert!(!p.vsync);
    }

    #[test]
    fn later_flags_win() {
        let p = WindowParams::default()
            .with_vsync(false)
            .apply_args(["--fullscreen", "--vsync", "--windowed"]);
        assert!(!p.fullscreen);
        assert!(p.vsync);
    }

    #[test]
    fn unknown_and_near_miss_flags_are_ignored() {
        let base = WindowParams::default().with_title("t");
        let p = base
            .clone()
            .apply_args(["demo", "--Fullscreen", "--fullscreen=1", "-f", ""]);
        assert_eq!(p, base);
    }

    #[test]
    fn context_params_follow_window_params() {
        let p = WindowParams::default().with_samples(0).with_gl_version(4, 1);
        assert_eq!(
            p.context_params(),
            ContextParams {
                vsync: true,
                samples: 0,
                gl_version: (4, 1),
            }
        );
    }
}
