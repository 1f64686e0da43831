use std::path::Path;
use std::rc::Rc;

use anyhow::Context;
use glint_engine::input::Key;
use glint_engine::logging::{init_logging, LoggingConfig};
use glint_engine::math::{transform, TransformStack, Vec3, Vec4};
use glint_engine::{
    Assets, Geometry, Gpu, Image, Mesh, Pixel, Platform, Scheduler, Shader, Texture, Tick,
    WindowId, WindowParams,
};

/// Simulation rate of the update callback.
const UPDATE_HZ: f64 = 60.0;

const CLEAR: [f32; 4] = [0.08, 0.08, 0.1, 1.0];

struct Demo {
    platform: Platform,
    window: WindowId,
    gpu: Rc<Gpu>,
    shader: Shader,
    texture: Texture,
    quad: Mesh,
    transforms: TransformStack,
    angle: f32,
    paused: bool,
}

fn main() {
    init_logging(LoggingConfig::default());

    if let Err(e) = run() {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let params = WindowParams::default()
        .with_title("glint demo")
        .with_size(960, 640)
        .apply_args(std::env::args().skip(1));

    let mut platform = Platform::new().context("failed to start the platform layer")?;
    let window = platform
        .open_window(params)
        .context("failed to open the main window")?;
    let gpu = Rc::clone(platform.gpu().context("no GPU context after opening a window")?);

    let mut assets = Assets::new(
        Rc::clone(&gpu),
        Path::new(env!("CARGO_MANIFEST_DIR")).join("assets"),
    );
    let shader = assets
        .shader("textured")
        .context("failed to build the textured shader")?;
    let texture = Texture::new(&gpu, &checkerboard(64, 8)?).context("failed to upload texture")?;
    let quad = Mesh::new(&gpu, &Geometry::from_rect(1.0, 1.0, 0.5, 0.5))
        .context("failed to upload quad")?;

    gpu.set_depth_test(true);
    log::info!("uniforms: {:?}", shader.uniform_names().collect::<Vec<_>>());

    let mut scheduler = Scheduler::with_clock(platform.clock());
    scheduler.add_callback(render, -1.0);
    scheduler.add_callback(update, UPDATE_HZ);

    let mut demo = Demo {
        platform,
        window,
        gpu,
        shader,
        texture,
        quad,
        transforms: TransformStack::new(),
        angle: 0.0,
        paused: false,
    };
    scheduler.go(&mut demo)
}

/// Polls input and draws one frame, every scheduler pass.
fn render(demo: &mut Demo, tick: &mut Tick) -> anyhow::Result<()> {
    demo.platform.poll();

    let input = demo.platform.input(demo.window)?;
    if demo.platform.should_close(demo.window) || input.pressed(Key::Escape) {
        log::info!("exiting after {} frame(s)", tick.frame_index());
        tick.stop();
        return Ok(());
    }
    if input.pressed(Key::Space) {
        demo.paused = !demo.paused;
    }

    demo.platform.activate(demo.window)?;
    demo.gpu.clear(CLEAR);

    let (width, height) = demo.platform.size(demo.window)?;
    let aspect = width as f32 / height.max(1) as f32;
    let projection = transform::perspective(45f32.to_radians(), aspect, 0.1, 100.0);
    let view = transform::look_at(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, Vec3::Y);

    demo.transforms.reset();
    demo.transforms.mul(projection * view);

    demo.shader.bind();
    demo.texture.bind(0)?;
    demo.shader.set("u_texture", 0)?;

    let tints = [
        Vec4::new(1.0, 0.5, 0.5, 1.0),
        Vec4::new(0.5, 1.0, 0.5, 1.0),
        Vec4::new(0.5, 0.5, 1.0, 1.0),
    ];
    for (i, tint) in tints.into_iter().enumerate() {
        let offset = i as f32 - 1.0;

        demo.transforms.push();
        demo.transforms.translate(Vec3::new(offset * 1.2, 0.0, 0.0));
        demo.transforms
            .rotate(demo.angle * (i + 1) as f32, Vec3::new(0.0, 1.0, 0.3));

        demo.shader.set("u_mvp", demo.transforms.top())?;
        demo.shader.set("u_tint", tint)?;
        demo.quad.draw();
        demo.transforms.pop();
    }

    demo.platform.swap_buffers(demo.window)?;

    if tick.frame_index() % 120 == 0 {
        let title = format!("glint demo - {:.0} fps", tick.average_fps());
        demo.platform.set_title(demo.window, &title)?;
    }
    Ok(())
}

/// Fixed-rate animation step.
fn update(demo: &mut Demo, tick: &mut Tick) -> anyhow::Result<()> {
    if demo.paused {
        return Ok(());
    }

    // Scrolling speeds the spin up or down.
    let (_, scroll) = demo.platform.input(demo.window)?.scroll();
    let speed = (1.0 + scroll * 0.1).max(0.0) as f32;
    demo.angle += speed * tick.dt() as f32;
    Ok(())
}

fn checkerboard(size: u32, cell: u32) -> glint_engine::Result<Image> {
    let mut image = Image::new(size, size)?;
    let light = Pixel::gray(230);
    let dark = light * Pixel::new(90, 90, 110, 255);

    for y in 0..size {
        for x in 0..size {
            let pixel = if (x / cell + y / cell) % 2 == 0 { light } else { dark };
            image.set(x, y, pixel)?;
        }
    }
    Ok(image)
}
