use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use glutin::surface::{Surface, WindowSurface};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Fullscreen, Window, WindowId};

use super::WindowParams;
use crate::device::{GlContext, GlowBackend, Gpu};
use crate::error::{Error, Result};
use crate::input::{translate_window_event, InputState};
use crate::time::{Clock, MonotonicClock};

/// Pumps allowed for the event loop to hand out an `ActiveEventLoop` before
/// `open_window` gives up.
const MAX_OPEN_PUMPS: usize = 64;

/// Owns the event loop, every open window and the shared GPU context.
///
/// Events are only delivered inside [`Platform::poll`], on the calling thread.
/// Dropping the platform tears the GL context down; GPU handles that outlive
/// it release their arena slots without touching the driver.
pub struct Platform {
    handler: Handler,
    event_loop: EventLoop<()>,
    clock: MonotonicClock,
}

struct WindowEntry {
    // Dropped before the window it renders to.
    surface: Surface<WindowSurface>,
    window: Window,
    input: InputState,
    should_close: bool,
}

struct GlState {
    context: GlContext,
    gpu: Rc<Gpu>,
    current: Option<WindowId>,
}

#[derive(Default)]
struct Handler {
    windows: HashMap<WindowId, WindowEntry>,
    gl: Option<GlState>,
    pending: VecDeque<WindowParams>,
    opened: VecDeque<Result<WindowId>>,
}

impl Platform {
    pub fn new() -> Result<Self> {
        let event_loop = EventLoop::new()?;
        Ok(Self {
            handler: Handler::default(),
            event_loop,
            clock: MonotonicClock::new(),
        })
    }

    /// Opens a window. The first window also creates the GL context and the
    /// [`Gpu`]; later windows share it. The new window becomes active.
    pub fn open_window(&mut self, params: WindowParams) -> Result<WindowId> {
        self.handler.pending.push_back(params);

        for _ in 0..MAX_OPEN_PUMPS {
            let status = self
                .event_loop
                .pump_app_events(Some(Duration::ZERO), &mut self.handler);

            if let Some(result) = self.handler.opened.pop_front() {
                return result;
            }
            if let PumpStatus::Exit(code) = status {
                return Err(Error::Window(format!("event loop exited with code {code}")));
            }
        }

        self.handler.pending.clear();
        Err(Error::Window("event loop never became ready".into()))
    }

    /// Destroys a window. Its input state is discarded.
    pub fn close_window(&mut self, id: WindowId) -> Result<()> {
        self.handler
            .windows
            .remove(&id)
            .ok_or(Error::UnknownWindow(id))?;

        if let Some(gl) = &mut self.handler.gl {
            if gl.current == Some(id) {
                gl.current = None;
            }
        }
        log::debug!("closed window {id:?}");
        Ok(())
    }

    /// Shared GPU context; `None` until the first window is open.
    pub fn gpu(&self) -> Option<&Rc<Gpu>> {
        self.handler.gl.as_ref().map(|gl| &gl.gpu)
    }

    /// Resets per-poll input of every window, then delivers pending events.
    ///
    /// Edge counters cover exactly the events of one poll: call this once per
    /// frame.
    pub fn poll(&mut self) {
        for entry in self.handler.windows.values_mut() {
            entry.input.begin_poll();
        }

        let status = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.handler);

        if let PumpStatus::Exit(code) = status {
            log::warn!("event loop exited with code {code}; closing all windows");
            for entry in self.handler.windows.values_mut() {
                entry.should_close = true;
            }
        }
    }

    pub fn input(&self, id: WindowId) -> Result<&InputState> {
        Ok(&self.entry(id)?.input)
    }

    pub fn set_title(&self, id: WindowId, title: &str) -> Result<()> {
        self.entry(id)?.window.set_title(title);
        Ok(())
    }

    /// Makes the GL context current on `id`'s surface and sizes the viewport
    /// to it. Draw calls go to the active window until another is activated.
    pub fn activate(&mut self, id: WindowId) -> Result<()> {
        let entry = self
            .handler
            .windows
            .get(&id)
            .ok_or(Error::UnknownWindow(id))?;
        let gl = self
            .handler
            .gl
            .as_mut()
            .ok_or_else(|| Error::Context("no GL context".into()))?;

        if gl.current != Some(id) {
            gl.context.make_current(&entry.surface)?;
            gl.current = Some(id);
        }
        let size = entry.window.inner_size();
        gl.gpu.set_viewport(size.width, size.height);
        Ok(())
    }

    pub fn swap_buffers(&self, id: WindowId) -> Result<()> {
        let entry = self.entry(id)?;
        let gl = self.gl()?;
        entry.window.pre_present_notify();
        gl.context.swap_buffers(&entry.surface)
    }

    pub fn set_vsync(&mut self, id: WindowId, vsync: bool) -> Result<()> {
        self.activate(id)?;
        let entry = self.entry(id)?;
        self.gl()?.context.set_vsync(&entry.surface, vsync);
        Ok(())
    }

    /// Whether the user asked to close `id`. Unknown windows count as closed.
    pub fn should_close(&self, id: WindowId) -> bool {
        self.handler
            .windows
            .get(&id)
            .is_none_or(|entry| entry.should_close)
    }

    /// Inner size in physical pixels.
    pub fn size(&self, id: WindowId) -> Result<(u32, u32)> {
        let size = self.entry(id)?.window.inner_size();
        Ok((size.width, size.height))
    }

    pub fn window_ids(&self) -> impl Iterator<Item = WindowId> + '_ {
        self.handler.windows.keys().copied()
    }

    /// Seconds since the platform was created.
    pub fn time(&self) -> f64 {
        self.clock.now()
    }

    /// The clock behind [`Platform::time`], for sharing with a scheduler.
    pub fn clock(&self) -> MonotonicClock {
        self.clock
    }

    fn entry(&self, id: WindowId) -> Result<&WindowEntry> {
        self.handler
            .windows
            .get(&id)
            .ok_or(Error::UnknownWindow(id))
    }

    fn gl(&self) -> Result<&GlState> {
        self.handler
            .gl
            .as_ref()
            .ok_or_else(|| Error::Context("no GL context".into()))
    }
}

impl Drop for Platform {
    fn drop(&mut self) {
        if let Some(gl) = &self.handler.gl {
            gl.gpu.invalidate();
            log::debug!(
                "GL context destroyed with {} live resource(s)",
                gl.gpu.live_resources()
            );
        }
    }
}

impl Handler {
    fn open_pending(&mut self, event_loop: &ActiveEventLoop) {
        while let Some(params) = self.pending.pop_front() {
            let result = self.open(event_loop, params);
            if let Err(e) = &result {
                log::error!("failed to open window: {e}");
            }
            self.opened.push_back(result);
        }
    }

    fn open(&mut self, event_loop: &ActiveEventLoop, params: WindowParams) -> Result<WindowId> {
        let fullscreen = params.fullscreen.then_some(Fullscreen::Borderless(None));
        let attrs = Window::default_attributes()
            .with_title(params.title.as_str())
            .with_inner_size(LogicalSize::new(params.width, params.height))
            .with_fullscreen(fullscreen);

        let window = event_loop
            .create_window(attrs)
            .map_err(|e| Error::Window(e.to_string()))?;
        let id = window.id();

        let surface = match &mut self.gl {
            Some(gl) => {
                let surface = gl.context.create_surface(&window)?;
                gl.context.make_current(&surface)?;
                gl.context.set_vsync(&surface, params.vsync);
                gl.current = Some(id);
                surface
            }
            None => {
                let (context, surface, functions) =
                    GlContext::create(&window, &params.context_params())?;
                let gpu = Gpu::new(GlowBackend::new(functions));
                self.gl = Some(GlState {
                    context,
                    gpu,
                    current: Some(id),
                });
                surface
            }
        };

        let size = window.inner_size();
        if let Some(gl) = &self.gl {
            gl.gpu.set_viewport(size.width, size.height);
        }

        log::info!(
            "opened window {id:?} \"{}\" ({}x{} physical)",
            params.title,
            size.width,
            size.height
        );

        self.windows.insert(
            id,
            WindowEntry {
                surface,
                window,
                input: InputState::default(),
                should_close: false,
            },
        );
        Ok(id)
    }
}

impl ApplicationHandler for Handler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Poll);
        self.open_pending(event_loop);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.open_pending(event_loop);
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(entry) = self.windows.get_mut(&window_id) else {
            return;
        };

        let scale = entry.window.scale_factor();
        let input = &mut entry.input;
        translate_window_event(scale, &event, |ev| input.apply_event(&ev));

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                entry.should_close = true;
            }

            WindowEvent::Resized(size) => {
                if let Some(gl) = &self.gl {
                    gl.context.resize(&entry.surface, size.width, size.height);
                    if gl.current == Some(window_id) {
                        gl.gpu.set_viewport(size.width, size.height);
                    }
                }
            }

            _ => {}
        }
    }
}
