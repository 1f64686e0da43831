use std::ffi::CStr;
use std::num::NonZeroU32;

use glutin::config::{Config, ConfigTemplateBuilder};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, PossiblyCurrentContext, Version,
};
use glutin::display::{Display, DisplayApiPreference};
use glutin::prelude::*;
use glutin::surface::{Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawWindowHandle};
use winit::window::Window;

use super::ContextParams;
use crate::error::{Error, Result};

/// The single GL context shared by every window.
///
/// Owns the platform display, the framebuffer config every window surface is
/// created with, and the context itself. Windows own their surfaces.
pub(crate) struct GlContext {
    display: Display,
    config: Config,
    context: PossiblyCurrentContext,
}

fn context_err(e: impl std::fmt::Display) -> Error {
    Error::Context(e.to_string())
}

fn raw_window(window: &Window) -> Result<RawWindowHandle> {
    Ok(window.window_handle().map_err(context_err)?.as_raw())
}

fn surface_size(window: &Window) -> (NonZeroU32, NonZeroU32) {
    let size = window.inner_size();
    (
        NonZeroU32::new(size.width).unwrap_or(NonZeroU32::MIN),
        NonZeroU32::new(size.height).unwrap_or(NonZeroU32::MIN),
    )
}

impl GlContext {
    /// Creates the display, picks a config, creates the context and makes it
    /// current on a surface for `window`.
    pub(crate) fn create(
        window: &Window,
        params: &ContextParams,
    ) -> Result<(Self, Surface<WindowSurface>, glow::Context)> {
        let display_handle = window.display_handle().map_err(context_err)?.as_raw();
        let raw_window_handle = raw_window(window)?;

        #[cfg(target_os = "windows")]
        let preference = DisplayApiPreference::Wgl(Some(raw_window_handle));
        #[cfg(target_os = "macos")]
        let preference = DisplayApiPreference::Cgl;
        #[cfg(all(unix, not(target_os = "macos")))]
        let preference = DisplayApiPreference::Egl;

        let display = unsafe { Display::new(display_handle, preference) }.map_err(context_err)?;

        let mut template = ConfigTemplateBuilder::new()
            .with_alpha_size(8)
            .with_depth_size(24)
            .with_transparency(false);
        if params.samples > 0 {
            template = template.with_multisampling(params.samples);
        }

        // Prefer the config with the most samples among the matches.
        let config = unsafe { display.find_configs(template.build()) }
            .map_err(context_err)?
            .reduce(|best, c| if c.num_samples() > best.num_samples() { c } else { best })
            .ok_or_else(|| Error::Context("no suitable GL framebuffer config".into()))?;
        log::debug!("GL config: {} sample(s)", config.num_samples());

        let (major, minor) = params.gl_version;
        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(major, minor))))
            .with_profile(GlProfile::Core)
            .build(Some(raw_window_handle));

        let not_current = unsafe { display.create_context(&config, &context_attributes) }
            .map_err(context_err)?;

        let surface = create_window_surface(&display, &config, window)?;
        let context = not_current.make_current(&surface).map_err(context_err)?;

        let ctx = Self {
            display,
            config,
            context,
        };
        ctx.set_vsync(&surface, params.vsync);

        let gl = unsafe {
            glow::Context::from_loader_function_cstr(|s: &CStr| ctx.display.get_proc_address(s))
        };

        log::info!("GL {major}.{minor} core context created");
        Ok((ctx, surface, gl))
    }

    /// Creates a surface for an additional window with the shared config.
    pub(crate) fn create_surface(&self, window: &Window) -> Result<Surface<WindowSurface>> {
        create_window_surface(&self.display, &self.config, window)
    }

    pub(crate) fn make_current(&self, surface: &Surface<WindowSurface>) -> Result<()> {
        self.context.make_current(surface).map_err(context_err)
    }

    pub(crate) fn swap_buffers(&self, surface: &Surface<WindowSurface>) -> Result<()> {
        surface.swap_buffers(&self.context).map_err(context_err)
    }

    pub(crate) fn resize(&self, surface: &Surface<WindowSurface>, width: u32, height: u32) {
        let (Some(w), Some(h)) = (NonZeroU32::new(width), NonZeroU32::new(height)) else {
            log::debug!("ignoring resize to zero dimensions");
            return;
        };
        surface.resize(&self.context, w, h);
    }

    pub(crate) fn set_vsync(&self, surface: &Surface<WindowSurface>, vsync: bool) {
        let interval = if vsync {
            SwapInterval::Wait(NonZeroU32::MIN)
        } else {
            SwapInterval::DontWait
        };

        if let Err(e) = surface.set_swap_interval(&self.context, interval) {
            log::warn!("failed to set swap interval (vsync={vsync}): {e}");
        }
    }
}

fn create_window_surface(
    display: &Display,
    config: &Config,
    window: &Window,
) -> Result<Surface<WindowSurface>> {
    let (w, h) = surface_size(window);
    let attrs = SurfaceAttributesBuilder::<WindowSurface>::new().build(raw_window(window)?, w, h);
    unsafe { display.create_window_surface(config, &attrs) }.map_err(context_err)
}
