//! VR Ring - a curved virtual screen viewed through a simulated headset lens
//!
//! The library builds the ring screen from a Bézier patch, drives a fly camera
//! from keyboard, mouse and gamepad input, and renders the scene offscreen
//! before a barrel distortion pass puts it on the window.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, error, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{CursorGrabMode, Window, WindowId};

pub mod camera;
pub mod config;
pub mod desktop;
pub mod effects;
pub mod error;
pub mod input;
pub mod mesh;
pub mod renderer;
pub mod shading;
pub mod ui;

pub use camera::{Direction, FlyCamera};
pub use config::AppConfig;
pub use effects::{EffectFlags, EffectToggle};
pub use error::{AppError, ConfigError, RenderError};
pub use mesh::{ControlGrid, Mesh, Vertex};

use desktop::DesktopPayload;
use input::{Command, InputState};
use renderer::Renderer;
use ui::{FpsCounter, Hud};

const KEY_HELP: &str = "WASD/Space/Shift move | Tab mouse | 1/2/3/Backspace effects | H HUD | Esc quit";

/// Builds the ring screen mesh described by `config`.
pub fn build_ring_mesh(config: &AppConfig) -> Mesh {
    let ring = &config.ring;
    let grid = ControlGrid::ring(ring.radius, ring.height, ring.span_degrees.to_radians());
    mesh::tessellate(&grid, ring.segments_u, ring.segments_v)
}

/// Main application state
struct VrApp {
    config: AppConfig,
    ring_mesh: Mesh,
    camera: FlyCamera,
    flags: EffectFlags,
    input: InputState,
    desktop: DesktopPayload,

    // UI State
    egui_state: Option<egui_winit::State>,
    hud: Option<Hud>,

    renderer: Option<Renderer>,
    window: Option<Arc<Window>>,

    start_time: Instant,
    last_frame_time: Instant,
    fps: FpsCounter,
    cursor_captured: bool,
    fatal: Option<AppError>,
}

impl VrApp {
    fn new(config: AppConfig) -> Self {
        let ring_mesh = build_ring_mesh(&config);
        info!(
            "Ring mesh: {} vertices, {} indices",
            ring_mesh.vertices.len(),
            ring_mesh.indices.len()
        );
        let now = Instant::now();

        Self {
            camera: config.camera.build(),
            desktop: DesktopPayload::new(config.screen_width, config.screen_height),
            flags: EffectFlags::default(),
            input: InputState::new(),
            ring_mesh,
            config,
            egui_state: None,
            hud: None,
            renderer: None,
            window: None,
            start_time: now,
            last_frame_time: now,
            fps: FpsCounter::new(now),
            cursor_captured: false,
            fatal: None,
        }
    }

    /// Records a fatal error and leaves the event loop.
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: impl Into<AppError>) {
        let err = err.into();
        error!("{err}");
        self.fatal.get_or_insert(err);
        event_loop.exit();
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.as_str())
            .with_inner_size(LogicalSize::new(
                self.config.window_width,
                self.config.window_height,
            ));
        let window = Arc::new(event_loop.create_window(attrs)?);
        info!("Window created");

        let renderer = pollster::block_on(Renderer::new(
            window.clone(),
            &self.config,
            &self.ring_mesh,
        ))?;
        info!("Renderer initialized");

        let ctx = egui::Context::default();
        let hud = Hud::new(&ctx);
        let state = egui_winit::State::new(
            ctx,
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        self.hud = Some(hud);
        self.egui_state = Some(state);
        self.renderer = Some(renderer);
        self.window = Some(window);
        self.last_frame_time = Instant::now();
        Ok(())
    }

    fn set_cursor_captured(&mut self, captured: bool) {
        let Some(window) = &self.window else {
            return;
        };
        let result = if captured {
            window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined))
        } else {
            window.set_cursor_grab(CursorGrabMode::None)
        };
        if let Err(e) = result {
            warn!("Cursor grab failed: {e}");
            return;
        }
        window.set_cursor_visible(!captured);
        self.cursor_captured = captured;
        info!("Mouse look {}", if captured { "on" } else { "off" });
    }

    fn run_command(&mut self, event_loop: &ActiveEventLoop, command: Command) {
        match command {
            Command::Exit => {
                info!("Exit requested");
                event_loop.exit();
            }
            Command::ToggleCursorCapture => self.set_cursor_captured(!self.cursor_captured),
            Command::ToggleHud => {
                if let Some(hud) = &mut self.hud {
                    hud.toggle();
                    info!("HUD {}", if hud.is_visible() { "shown" } else { "hidden" });
                }
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let dt = (now - self.last_frame_time).as_secs_f32();
        self.last_frame_time = now;

        // 1. Input intents
        self.input.poll_gamepad();
        let frame = self.input.take_frame(dt, self.config.camera.gamepad_look_rate);
        for command in frame.commands {
            self.run_command(event_loop, command);
        }

        let speed = self.config.camera.speed;
        for (direction, factor) in frame.moves {
            self.camera.translate(direction, speed * factor, dt);
        }
        if frame.look != glam::Vec2::ZERO {
            self.camera
                .rotate(frame.look.x, frame.look.y, self.config.camera.sensitivity, true);
        }
        if frame.scroll != 0.0 {
            self.camera.zoom_by(frame.scroll);
        }
        self.flags.apply_all(frame.toggles);

        // 2. HUD
        let mut egui_ctx = None;
        let mut full_output = None;
        if let (Some(state), Some(hud), Some(window)) =
            (&mut self.egui_state, &mut self.hud, &self.window)
        {
            let raw_input = state.take_egui_input(window);
            let mut toggles = Vec::new();
            let fps = self.fps.fps();
            let output = state.egui_ctx().run(raw_input, |ctx| {
                toggles = hud.render(ctx, fps, &self.camera, &self.flags);
            });
            state.handle_platform_output(window, output.platform_output.clone());
            self.flags.apply_all(toggles);
            egui_ctx = Some(state.egui_ctx().clone());
            full_output = Some(output);
        }

        // 3. Frame
        let Some(renderer) = &mut self.renderer else {
            return;
        };
        let result = renderer
            .upload_screen_texture(self.desktop.next_frame())
            .and_then(|()| {
                let elapsed = self.start_time.elapsed().as_secs_f32();
                let ui_data = match (full_output, &egui_ctx) {
                    (Some(out), Some(ctx)) => Some((ctx, out)),
                    _ => None,
                };
                renderer.render(&self.camera, &self.flags, elapsed, ui_data)
            });
        if let Err(e) = result {
            self.fail(event_loop, e);
            return;
        }

        // 4. Once-per-second stats
        if let Some(fps) = self.fps.tick(now) {
            if let Some(window) = &self.window {
                window.set_title(&format!("{} | {fps:.0} FPS | {KEY_HELP}", self.config.title));
            }
            let pos = self.camera.position();
            debug!(
                "Camera pos=({:.2}, {:.2}, {:.2}) yaw={:.1} pitch={:.1} zoom={:.1}",
                pos.x,
                pos.y,
                pos.z,
                self.camera.yaw(),
                self.camera.pitch(),
                self.camera.zoom()
            );
        }
    }
}

impl ApplicationHandler for VrApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        info!("App resumed - creating window");
        if let Err(e) = self.create_window(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        info!("App suspended - releasing GPU resources");
        self.egui_state = None;
        self.hud = None;
        self.renderer = None;
        self.window = None;
        self.cursor_captured = false;
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        // Pass event to egui
        let response = if let (Some(state), Some(window)) = (&mut self.egui_state, &self.window) {
            state.on_window_event(window, &event)
        } else {
            Default::default()
        };

        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested");
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            WindowEvent::Resized(size) => {
                if let Some(renderer) = &mut self.renderer {
                    if let Err(e) = renderer.resize(size.width, size.height) {
                        self.fail(event_loop, e);
                    }
                }
            }
            WindowEvent::Focused(false) => self.input.release_all(),
            WindowEvent::KeyboardInput { event, .. } if !response.consumed => {
                self.input.handle_keyboard_input(&event);
            }
            WindowEvent::MouseWheel { delta, .. } if !response.consumed => {
                self.input.handle_scroll(delta);
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.cursor_captured {
                self.input.handle_mouse_motion(delta.0, delta.1);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Validates `config`, opens the window and runs until it closes.
///
/// Returns the first fatal error hit inside the event loop.
pub fn run(config: AppConfig) -> Result<(), AppError> {
    config.validate()?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = VrApp::new(config);
    event_loop.run_app(&mut app)?;

    match app.fatal.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
