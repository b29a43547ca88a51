//! Meadow - instanced grass field viewer

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use meadow::core::{
    camera::Camera,
    error::Error,
    frame::FrameContext,
    input::PointerMapping,
    logging,
    time::FrameTimer,
};
use meadow::grass::{GrassSystem, MeadowConfig};
use meadow::render::{context::GpuContext, MeadowRenderer};
use meadow::terrain::HeightField;

struct App {
    window: Option<Arc<Window>>,
    gpu: Option<GpuContext>,
    renderer: Option<MeadowRenderer>,
    grass: GrassSystem,
    heights: HeightField,
    camera: Camera,
    pointer: Option<PointerMapping>,
    frame: FrameContext,
    timer: FrameTimer,
    /// First fatal error; reported once the event loop returns.
    error: Option<Error>,
}

impl App {
    fn new(grass: GrassSystem, heights: HeightField) -> Self {
        let cam = &grass.config().camera;
        let camera = Camera::overhead(cam.height, cam.fov_degrees, 16.0 / 9.0, cam.near, cam.far);
        let frame = grass.frame_context();
        Self {
            window: None,
            gpu: None,
            renderer: None,
            grass,
            heights,
            camera,
            pointer: None,
            frame,
            timer: FrameTimer::new(),
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: Error) {
        if self.error.is_none() {
            self.error = Some(error);
        }
        event_loop.exit();
    }

    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> Result<(), Error> {
        let window_attrs = Window::default_attributes()
            .with_title("Meadow")
            .with_inner_size(PhysicalSize::new(1280, 720));
        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .map_err(|e| Error::Window(format!("Failed to create window: {}", e)))?,
        );

        let gpu = pollster::block_on(GpuContext::new(window.clone()))?;
        let renderer = MeadowRenderer::new(&gpu, &self.grass, &self.heights)?;

        let size = window.inner_size();
        log::info!("Window created: {}x{}", size.width, size.height);
        self.update_projection(size.width, size.height)?;

        self.window = Some(window);
        self.renderer = Some(renderer);
        self.gpu = Some(gpu);
        Ok(())
    }

    /// New aspect ratio: camera projection and pointer calibration follow.
    fn update_projection(&mut self, width: u32, height: u32) -> Result<(), Error> {
        self.camera.set_aspect(width as f32, height as f32);
        self.pointer = Some(PointerMapping::from_camera(&self.camera)?);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        let Some(gpu) = &mut self.gpu else {
            return Ok(());
        };
        if !gpu.resize(width, height) {
            return Ok(());
        }
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(&gpu.device, width, height);
        }
        self.update_projection(width, height)
    }

    fn redraw(&mut self) -> Result<(), Error> {
        self.timer.tick();
        self.frame.advance(self.timer.delta_secs());

        let uniforms = self.grass.build_uniforms(&self.frame);
        if let (Some(gpu), Some(renderer)) = (&self.gpu, &self.renderer) {
            renderer.render(gpu, &self.camera, &uniforms)?;
        }

        if let Some(window) = &self.window {
            if self.timer.frame_count() % 30 == 0 {
                window.set_title(&format!(
                    "Meadow - {:.1} FPS | {} blades",
                    self.timer.fps(),
                    self.grass.field().len()
                ));
            }
            window.request_redraw();
        }
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init_graphics(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let (Some(mapping), Some(gpu)) = (&self.pointer, &self.gpu) {
            let (w, h) = gpu.size();
            if let Some(pointer) = mapping.process_event(&event, (w as f32, h as f32)) {
                self.frame.set_pointer(pointer);
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Err(e) = self.resize(size.width, size.height) {
                    self.fail(event_loop, e);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state.is_pressed() && event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                    event_loop.exit();
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    self.fail(event_loop, e);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn run() -> Result<(), Error> {
    let args: Vec<String> = std::env::args().collect();
    let config = match parse_config_arg(&args)? {
        Some(path) => {
            log::info!("Loading config from: {}", path.display());
            MeadowConfig::load(&path)?
        }
        None => MeadowConfig::default(),
    };

    let start = Instant::now();
    let grass = GrassSystem::new(config)?;
    log::info!("Field generated in {:.1} ms", start.elapsed().as_secs_f64() * 1000.0);

    let terrain = &grass.config().terrain;
    match &terrain.texture_path {
        Some(path) => log::info!("Height field from image: {}", path.display()),
        None => log::info!(
            "Height field: {}x{} fBm, seed {}",
            terrain.texture_size,
            terrain.texture_size,
            terrain.seed
        ),
    }
    let heights = HeightField::from_config(terrain)?;

    let event_loop = EventLoop::new()
        .map_err(|e| Error::Window(format!("Failed to create event loop: {}", e)))?;
    let mut app = App::new(grass, heights);

    event_loop
        .run_app(&mut app)
        .map_err(|e| Error::Window(format!("Event loop error: {}", e)))?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn main() {
    logging::init();
    log::info!("Meadow starting...");

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

/// Parse --config argument from command line
fn parse_config_arg(args: &[String]) -> Result<Option<PathBuf>, Error> {
    for i in 0..args.len() {
        if args[i] == "--config" || args[i] == "-c" {
            return match args.get(i + 1) {
                Some(path) => Ok(Some(PathBuf::from(path))),
                None => Err(Error::Config("--config needs a path".into())),
            };
        }
    }
    Ok(None)
}
