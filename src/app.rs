//! Application shell: window, event loop and the wiring between winit, the wgpu
//! backend and the [`Game`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use glam::Vec2;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{CursorGrabMode, Fullscreen, Window, WindowAttributes, WindowId};

use crate::backend::WgpuBackend;
use crate::config::GameConfig;
use crate::error::{Error, Result};
use crate::font::{FontAtlas, load_font_data};
use crate::game::{FrameOutcome, Game};
use crate::gpu::GpuContext;
use crate::input::Input;

/// Window and asset settings.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub title: String,
    /// Use a decorated window of `width × height` instead of borderless fullscreen.
    pub windowed: bool,
    pub width: u32,
    pub height: u32,
    /// Font file for the telemetry text. System fonts are searched when unset.
    pub font_path: Option<PathBuf>,
    /// Pixel size glyphs are rasterised at before `text_scale` is applied.
    pub font_size: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Aimlab".to_string(),
            windowed: false,
            width: 1280,
            height: 720,
            font_path: None,
            font_size: 48.0,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn windowed(mut self, width: u32, height: u32) -> Self {
        self.windowed = true;
        self.width = width;
        self.height = height;
        self
    }

    pub fn font(mut self, path: Option<PathBuf>) -> Self {
        self.font_path = path;
        self
    }
}

/// Open the window and run the game until Escape or close.
///
/// # Errors
///
/// Startup failures (window, surface, adapter, device, target placement) and
/// fatal presentation errors are returned once the event loop has stopped.
pub fn run(config: AppConfig, game: GameConfig) -> Result<()> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = AimlabApp {
        state: AppState::Pending { config, game },
        failure: None,
    };
    event_loop.run_app(&mut app)?;

    match app.failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct AimlabApp {
    state: AppState,
    failure: Option<Error>,
}

enum AppState {
    Pending { config: AppConfig, game: GameConfig },
    Running(Box<Session>),
    Stopped,
}

struct Session {
    window: Arc<Window>,
    backend: WgpuBackend,
    game: Game,
    input: Input,
    start_time: Instant,
    /// Virtual pointer position accumulated from raw motion while the cursor is grabbed.
    pointer: Vec2,
    cursor_grabbed: bool,
}

impl Session {
    fn start(
        event_loop: &ActiveEventLoop,
        config: AppConfig,
        game_config: GameConfig,
    ) -> Result<Self> {
        let mut attrs = WindowAttributes::default().with_title(&config.title);
        attrs = if config.windowed {
            attrs.with_inner_size(LogicalSize::new(config.width, config.height))
        } else {
            attrs.with_fullscreen(Some(Fullscreen::Borderless(event_loop.primary_monitor())))
        };

        let window = Arc::new(event_loop.create_window(attrs)?);
        let cursor_grabbed = grab_cursor(&window);

        let gpu = GpuContext::new(window.clone())?;
        let atlas = load_atlas(&config);
        let mut backend = WgpuBackend::new(gpu, atlas);

        let (width, height) = (backend.width() as f32, backend.height() as f32);
        let mut game = Game::new(game_config, width, height);
        game.init(&mut backend)?;

        tracing::info!(width, height, windowed = config.windowed, "session started");
        window.request_redraw();

        Ok(Self {
            window,
            backend,
            game,
            input: Input::new(),
            start_time: Instant::now(),
            pointer: Vec2::new(width / 2.0, height / 2.0),
            cursor_grabbed,
        })
    }
}

fn grab_cursor(window: &Window) -> bool {
    window.set_cursor_visible(false);
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
    match grabbed {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!("cursor grab unavailable, using absolute pointer: {err}");
            false
        }
    }
}

fn load_atlas(config: &AppConfig) -> Option<FontAtlas> {
    let loaded = load_font_data(config.font_path.as_deref()).and_then(|(path, data)| {
        FontAtlas::from_bytes(&data, config.font_size).map(|atlas| (path, atlas))
    });
    match loaded {
        Ok((path, atlas)) => {
            tracing::info!(path = %path.display(), "loaded font");
            Some(atlas)
        }
        Err(err) => {
            tracing::warn!("text disabled: {err}");
            None
        }
    }
}

impl AimlabApp {
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: Error) {
        tracing::error!("{err}");
        self.failure = Some(err);
        self.state = AppState::Stopped;
        event_loop.exit();
    }
}

impl ApplicationHandler for AimlabApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !matches!(self.state, AppState::Pending { .. }) {
            return;
        }
        let pending = std::mem::replace(&mut self.state, AppState::Stopped);
        let AppState::Pending { config, game } = pending else {
            return;
        };

        match Session::start(event_loop, config, game) {
            Ok(session) => self.state = AppState::Running(Box::new(session)),
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let AppState::Running(session) = &mut self.state else {
            return;
        };
        session.input.handle_event(&event);

        let result = match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
                Ok(())
            }
            WindowEvent::Focused(focused) => {
                session.game.on_focus_change(focused);
                Ok(())
            }
            WindowEvent::Resized(size) => {
                session.backend.resize(size.width, size.height);
                session
                    .game
                    .resize(&mut session.backend, size.width as f32, size.height as f32);
                Ok(())
            }
            WindowEvent::CursorMoved { position, .. } if !session.cursor_grabbed => {
                session.game.on_pointer_move(position.x as f32, position.y as f32);
                Ok(())
            }
            WindowEvent::MouseInput { state, button, .. } => {
                session.game.on_pointer_button(button, state).map(|_| ())
            }
            WindowEvent::RedrawRequested => {
                let now = session.start_time.elapsed().as_secs_f64();
                match session.game.frame(now, &session.input, &mut session.backend) {
                    Ok(FrameOutcome::Continue) => {
                        session.window.request_redraw();
                        Ok(())
                    }
                    Ok(FrameOutcome::Quit) => {
                        event_loop.exit();
                        Ok(())
                    }
                    Err(err) => Err(err),
                }
            }
            _ => Ok(()),
        };

        if let Err(err) = result {
            self.fail(event_loop, err);
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        let AppState::Running(session) = &mut self.state else {
            return;
        };
        if let DeviceEvent::MouseMotion { delta } = event {
            if session.cursor_grabbed {
                session.pointer += Vec2::new(delta.0 as f32, delta.1 as f32);
                session.game.on_pointer_move(session.pointer.x, session.pointer.y);
            }
        }
    }
}
