//! The game world and its frame loop.
//!
//! [`Game`] owns every piece of session state: camera, light, grid occupancy,
//! targets, room geometry, crosshair and statistics. The application shell feeds
//! it three kinds of calls, all on the event-loop thread:
//!
//! - [`Game::frame`] once per redraw, with the current time and held keys
//! - [`Game::on_pointer_move`] for every pointer position
//! - [`Game::on_pointer_button`] for every mouse button transition
//!
//! The game draws through the [`RenderBackend`] and [`TextRenderer`] traits only,
//! so tests run it against a recording backend.

use rand::SeedableRng;
use rand::rngs::StdRng;
use winit::event::{ElementState, MouseButton};
use winit::keyboard::KeyCode;

use crate::camera::{Camera, Movement};
use crate::config::GameConfig;
use crate::crosshair::Crosshair;
use crate::error::{Error, Result};
use crate::grid::SlotGrid;
use crate::input::{KeyState, PointerTracker};
use crate::light::DirectLight;
use crate::render::{Program, RenderBackend, SceneParams, TextRenderer};
use crate::stats::SessionStats;
use crate::target::Target;
use crate::wall::Wall;

const MOVEMENT_BINDINGS: [(KeyCode, Movement); 6] = [
    (KeyCode::KeyW, Movement::Forward),
    (KeyCode::KeyS, Movement::Backward),
    (KeyCode::KeyA, Movement::Left),
    (KeyCode::KeyD, Movement::Right),
    (KeyCode::Space, Movement::WorldUp),
    (KeyCode::ShiftLeft, Movement::WorldDown),
];

const QUIT_KEY: KeyCode = KeyCode::Escape;

const TEXT_LEFT: f32 = 10.0;
/// Distance from the top edge to the first telemetry line.
const TEXT_TOP_MARGIN: f32 = 40.0;
const TEXT_LINE_SPACING: f32 = 20.0;
const QUIT_HINT_Y: f32 = 25.0;
const QUIT_HINT: &str = "PRESS ESC TO QUIT";

/// What the shell should do after a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    Continue,
    Quit,
}

pub struct Game {
    config: GameConfig,
    camera: Camera,
    light: DirectLight,
    grid: SlotGrid,
    targets: Vec<Target>,
    walls: Vec<Wall>,
    crosshair: Crosshair,
    stats: SessionStats,
    pointer: PointerTracker,
    rng: StdRng,
    start_time: Option<f64>,
    last_frame: Option<f64>,
    quit_requested: bool,
    width: f32,
    height: f32,
}

impl Game {
    /// A game for a `width × height` pixel viewport, seeded from the OS.
    pub fn new(config: GameConfig, width: f32, height: f32) -> Self {
        Self::with_rng(config, width, height, StdRng::from_entropy())
    }

    /// Same as [`Game::new`] with an explicit random source for target placement.
    pub fn with_rng(config: GameConfig, width: f32, height: f32, rng: StdRng) -> Self {
        let camera = config.build_camera(width, height);
        let targets = (0..config.target_count)
            .map(|_| Target::new(config.target_radius, config.target_color, config.smoothness))
            .collect();
        let walls = Wall::room(config.wall_color);
        let crosshair = Crosshair::new(
            config.crosshair_length,
            config.crosshair_color,
            width,
            height,
        );

        Self {
            light: config.light,
            camera,
            grid: SlotGrid::new(),
            targets,
            walls,
            crosshair,
            stats: SessionStats::new(),
            pointer: PointerTracker::new(),
            rng,
            start_time: None,
            last_frame: None,
            quit_requested: false,
            width,
            height,
            config,
        }
    }

    /// Check the backend, generate and upload all geometry, and place the targets.
    ///
    /// # Errors
    ///
    /// [`Error::ProgramUnavailable`] when a shader program is missing, or
    /// [`Error::SlotPoolExhausted`] when there are more targets than grid slots.
    pub fn init<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> Result<()> {
        for program in [Program::Lit, Program::Overlay] {
            if !backend.has_program(program) {
                return Err(Error::ProgramUnavailable(program));
            }
        }

        for target in &mut self.targets {
            target.init(backend);
            target.assign_grid_slot(&mut self.grid, &mut self.rng)?;
        }
        for wall in &mut self.walls {
            wall.upload(backend);
        }
        self.crosshair.upload(backend);

        tracing::info!(
            targets = self.targets.len(),
            smoothness = self.config.smoothness,
            "game initialised"
        );
        Ok(())
    }

    /// Run one iteration of the frame loop at time `now` (seconds).
    ///
    /// Escape is only acted on at the start of the following call, so the frame
    /// in which it is first seen is still drawn.
    pub fn frame<B, K>(&mut self, now: f64, keys: &K, backend: &mut B) -> Result<FrameOutcome>
    where
        B: RenderBackend + TextRenderer + ?Sized,
        K: KeyState + ?Sized,
    {
        if self.quit_requested {
            return Ok(FrameOutcome::Quit);
        }

        let dt = self.last_frame.map_or(0.0, |last| (now - last).max(0.0));
        self.last_frame = Some(now);
        let start = *self.start_time.get_or_insert(now);

        if keys.is_down(QUIT_KEY) {
            tracing::info!("quit requested");
            self.quit_requested = true;
        }
        for (key, movement) in MOVEMENT_BINDINGS {
            if keys.is_down(key) {
                self.camera.apply_movement(movement, dt as f32);
            }
        }

        backend.begin_frame(self.config.background);

        let scene = SceneParams {
            camera: &self.camera,
            light: &self.light,
        };
        for target in &mut self.targets {
            target.render(backend, &scene);
        }
        for wall in &self.walls {
            wall.render(backend, &scene);
        }
        self.crosshair.render(backend);

        self.stats.sample_fps(now, dt);
        self.draw_telemetry(backend, now - start);

        backend.end_frame()?;
        Ok(FrameOutcome::Continue)
    }

    fn draw_telemetry<T: TextRenderer + ?Sized>(&self, text: &mut T, elapsed: f64) {
        let scale = self.config.text_scale;
        let color = self.config.text_color;
        for (row, line) in self.stats.telemetry_lines(elapsed).iter().enumerate() {
            let y = self.height - TEXT_TOP_MARGIN - row as f32 * TEXT_LINE_SPACING;
            text.render_text(line, TEXT_LEFT, y, scale, color);
        }
        text.render_text(QUIT_HINT, TEXT_LEFT, QUIT_HINT_Y, scale, color);
    }

    /// Feed an absolute pointer position. The first one only primes the tracker.
    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        if let Some(offset) = self.pointer.update(x, y) {
            self.camera.apply_look(offset.x, offset.y);
        }
    }

    /// Window focus changed. Regaining focus restarts the first-sample rule so
    /// the pointer travel made elsewhere does not turn the camera.
    pub fn on_focus_change(&mut self, focused: bool) {
        if focused {
            self.pointer.reset();
        }
    }

    /// Handle a mouse button transition. Left presses fire; everything else is
    /// ignored. Returns the number of targets hit.
    pub fn on_pointer_button(&mut self, button: MouseButton, state: ElementState) -> Result<u32> {
        match (button, state) {
            (MouseButton::Left, ElementState::Pressed) => self.fire(),
            _ => Ok(0),
        }
    }

    /// Shoot along the camera's look ray.
    ///
    /// Counts one click, and one hit for every target the line passes through.
    /// Each hit target moves to a new free slot.
    pub fn fire(&mut self) -> Result<u32> {
        self.stats.record_click();
        let ray = self.camera.look_ray();

        let mut hits = 0;
        for target in &mut self.targets {
            if target.is_hit_by(&ray) {
                self.stats.record_hit();
                hits += 1;
                let from = target.center();
                target.assign_grid_slot(&mut self.grid, &mut self.rng)?;
                tracing::debug!(from = ?from, to = ?target.center(), "target hit");
            }
        }
        Ok(hits)
    }

    /// Adapt to a new viewport size.
    pub fn resize<B: RenderBackend + ?Sized>(&mut self, backend: &mut B, width: f32, height: f32) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        self.width = width;
        self.height = height;
        self.camera.set_aspect(width / height);
        self.crosshair.resize(backend, width, height);
    }

    pub fn request_quit(&mut self) {
        self.quit_requested = true;
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn grid(&self) -> &SlotGrid {
        &self.grid
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use crate::grid::SLOT_COUNT;
    use crate::input::Input;
    use crate::render::recorder::{Call, RecordingBackend};
    use crate::render::{Primitive, uniforms};

    fn game(targets: usize) -> Game {
        Game::with_rng(
            GameConfig::new().targets(targets).smoothness(8),
            1600.0,
            900.0,
            StdRng::seed_from_u64(1234),
        )
    }

    fn ready_game(targets: usize) -> (Game, RecordingBackend) {
        let mut backend = RecordingBackend::new();
        let mut game = game(targets);
        game.init(&mut backend).unwrap();
        backend.clear_calls();
        (game, backend)
    }

    #[test]
    fn init_requires_both_programs() {
        let mut backend = RecordingBackend::new().without_program(Program::Overlay);
        let result = game(3).init(&mut backend);
        assert!(matches!(result, Err(Error::ProgramUnavailable(Program::Overlay))));
        assert_eq!(backend.buffer_count(), 0);
    }

    #[test]
    fn init_places_targets_in_distinct_slots() {
        let mut backend = RecordingBackend::new();
        let mut game = game(3);
        game.init(&mut backend).unwrap();

        let mut slots: Vec<usize> = game.targets().iter().filter_map(Target::slot).collect();
        assert_eq!(slots.len(), 3);
        slots.sort_unstable();
        slots.dedup();
        assert_eq!(slots.len(), 3);
        for target in game.targets() {
            let slot = target.slot().unwrap();
            assert_eq!(target.center(), SlotGrid::slot_position(slot));
        }
        // three targets, four room boxes, one crosshair
        assert_eq!(backend.buffer_count(), 8);
    }

    #[test]
    fn too_many_targets_fail_initialisation() {
        let mut backend = RecordingBackend::new();
        let mut game = game(SLOT_COUNT + 1);
        assert!(matches!(game.init(&mut backend), Err(Error::SlotPoolExhausted(_))));
    }

    #[test]
    fn frame_draws_in_fixed_order() {
        let (mut game, mut backend) = ready_game(3);
        let keys = Input::new();
        let outcome = game.frame(0.0, &keys, &mut backend).unwrap();
        assert_eq!(outcome, FrameOutcome::Continue);

        let calls = backend.calls();
        assert!(matches!(calls.first(), Some(Call::BeginFrame(_))));
        assert_eq!(calls.last(), Some(&Call::EndFrame));

        let primitives: Vec<Primitive> = calls
            .iter()
            .filter_map(|call| match call {
                Call::Draw { primitive, .. } => Some(*primitive),
                _ => None,
            })
            .collect();
        let mut expected = vec![Primitive::Triangles; 7];
        expected.push(Primitive::Lines);
        assert_eq!(primitives, expected);

        let last_draw = calls.iter().rposition(|c| matches!(c, Call::Draw { .. })).unwrap();
        let first_text = calls.iter().position(|c| matches!(c, Call::Text { .. })).unwrap();
        assert!(last_draw < first_text);

        let texts = backend.texts();
        assert_eq!(texts.len(), 6);
        assert!(texts[0].starts_with("FPS"));
        assert_eq!(texts[5], QUIT_HINT);
    }

    #[test]
    fn first_frame_uploads_moved_targets() {
        let (mut game, mut backend) = ready_game(3);
        game.frame(0.0, &Input::new(), &mut backend).unwrap();
        let updates = backend
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::UpdateBuffer { .. }))
            .count();
        assert_eq!(updates, 3);
    }

    #[test]
    fn telemetry_is_laid_out_from_the_top() {
        let (mut game, mut backend) = ready_game(1);
        game.frame(0.0, &Input::new(), &mut backend).unwrap();
        let ys: Vec<f32> = backend
            .calls()
            .iter()
            .filter_map(|call| match call {
                Call::Text { y, .. } => Some(*y),
                _ => None,
            })
            .collect();
        assert_eq!(ys, vec![860.0, 840.0, 820.0, 800.0, 780.0, 25.0]);
    }

    #[test]
    fn escape_quits_on_the_next_frame() {
        let (mut game, mut backend) = ready_game(1);
        let mut keys = Input::new();
        keys.set_key(KeyCode::Escape, true);

        assert_eq!(game.frame(0.0, &keys, &mut backend).unwrap(), FrameOutcome::Continue);
        assert_eq!(backend.calls().last(), Some(&Call::EndFrame));
        assert!(game.quit_requested());

        backend.clear_calls();
        assert_eq!(game.frame(0.016, &keys, &mut backend).unwrap(), FrameOutcome::Quit);
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn held_keys_move_by_elapsed_time() {
        let (mut game, mut backend) = ready_game(1);
        let mut keys = Input::new();
        keys.set_key(KeyCode::KeyW, true);

        game.frame(10.0, &keys, &mut backend).unwrap();
        assert_eq!(game.camera().position(), Vec3::new(20.0, 1.0, 18.0));

        game.frame(11.0, &keys, &mut backend).unwrap();
        assert!(game.camera().position().distance(Vec3::new(20.0, 1.0, 15.5)) < 1e-4);

        keys.set_key(KeyCode::KeyW, false);
        keys.set_key(KeyCode::Space, true);
        game.frame(11.5, &keys, &mut backend).unwrap();
        assert!(game.camera().position().distance(Vec3::new(20.0, 2.25, 15.5)) < 1e-4);
    }

    #[test]
    fn pointer_moves_turn_the_camera() {
        let (mut game, _) = ready_game(1);
        let front = game.camera().front();
        game.on_pointer_move(100.0, 100.0);
        assert_eq!(game.camera().front(), front);

        game.on_pointer_move(150.0, 80.0);
        assert!((game.camera().yaw() - (-90.0 + 50.0 * 0.08)).abs() < 1e-4);
        assert!((game.camera().pitch() - 20.0 * 0.08).abs() < 1e-4);
    }

    #[test]
    fn regaining_focus_ignores_the_next_pointer_jump() {
        let (mut game, _) = ready_game(1);
        game.on_pointer_move(100.0, 100.0);
        game.on_focus_change(false);
        game.on_focus_change(true);

        let front = game.camera().front();
        game.on_pointer_move(900.0, 700.0);
        assert_eq!(game.camera().front(), front);

        game.on_pointer_move(910.0, 700.0);
        assert!((game.camera().yaw() - (-90.0 + 10.0 * 0.08)).abs() < 1e-4);
    }

    #[test]
    fn shooting_a_target_scores_and_moves_it() {
        let (mut game, _) = ready_game(1);

        game.grid = SlotGrid::new();
        game.targets[0].place_in_slot(&mut game.grid, 12).unwrap();
        assert_eq!(game.targets[0].center(), Vec3::new(17.5, 7.5, 1.0));

        // Aim from (20, 1, 18) at the slot centre.
        let to_target = (Vec3::new(17.5, 7.5, 1.0) - game.camera().position()).normalize();
        let yaw = to_target.z.atan2(to_target.x).to_degrees();
        let pitch = to_target.y.asin().to_degrees();
        let sensitivity = game.camera().sensitivity;
        let dx = (yaw - game.camera().yaw()) / sensitivity;
        let dy = (pitch - game.camera().pitch()) / sensitivity;
        game.on_pointer_move(0.0, 0.0);
        game.on_pointer_move(dx, -dy);
        assert!(game.camera().front().distance(to_target) < 1e-3);

        let hits = game.on_pointer_button(MouseButton::Left, ElementState::Pressed).unwrap();
        assert_eq!(hits, 1);
        assert_eq!(game.stats().clicks(), 1);
        assert_eq!(game.stats().hits(), 1);

        let target = &game.targets()[0];
        let slot = target.slot().unwrap();
        assert_ne!(slot, 12);
        assert!(!game.grid().is_occupied(12));
        assert!(game.grid().is_occupied(slot));
        assert_eq!(target.center(), SlotGrid::slot_position(slot));
    }

    #[test]
    fn missing_counts_a_click_only() {
        let (mut game, _) = ready_game(1);
        game.grid = SlotGrid::new();
        game.targets[0].place_in_slot(&mut game.grid, 12).unwrap();

        let hits = game.fire().unwrap();
        assert_eq!(hits, 0);
        assert_eq!(game.stats().clicks(), 1);
        assert_eq!(game.stats().hits(), 0);
        assert_eq!(game.targets()[0].slot(), Some(12));
    }

    #[test]
    fn other_buttons_do_not_fire() {
        let (mut game, _) = ready_game(1);
        assert_eq!(game.on_pointer_button(MouseButton::Right, ElementState::Pressed).unwrap(), 0);
        assert_eq!(game.on_pointer_button(MouseButton::Left, ElementState::Released).unwrap(), 0);
        assert_eq!(game.stats().clicks(), 0);
    }

    #[test]
    fn resize_updates_aspect_and_overlay() {
        let (mut game, mut backend) = ready_game(1);
        game.resize(&mut backend, 1000.0, 1000.0);
        assert_eq!(game.camera().aspect, 1.0);

        game.frame(0.0, &Input::new(), &mut backend).unwrap();
        let projection = backend.last_uniform(uniforms::PROJECTION);
        assert!(matches!(projection, Some(crate::render::Uniform::Mat4(m))
            if m == glam::Mat4::orthographic_rh(0.0, 1000.0, 0.0, 1000.0, -1.0, 1.0)));
    }
}
