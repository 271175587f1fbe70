//! # Aimlab
//!
//! **A first-person aim trainer on wgpu.**
//!
//! Lit sphere targets sit in a 5×5 grid of slots in front of a walled room.
//! Shooting a target moves it to a random free slot; the corner telemetry
//! reports frame rate, clicks, accuracy and hits per minute.
//!
//! ## Quick Start
//!
//! ```no_run
//! use aimlab::{AppConfig, GameConfig, run};
//!
//! fn main() -> aimlab::Result<()> {
//!     let game = GameConfig::new().targets(3).smoothness(64);
//!     run(AppConfig::new().windowed(1280, 720), game)
//! }
//! ```
//!
//! ## Layout
//!
//! - **Geometry**: [`mesh`] tessellates UV spheres and boxes into flat
//!   position/normal vertex buffers.
//! - **Game core**: [`Camera`], [`SlotGrid`], [`Target`], [`Wall`],
//!   [`Crosshair`] and [`SessionStats`] are driven by [`Game`], which knows
//!   nothing about the GPU.
//! - **Render protocol**: [`RenderBackend`] is the seam between the game core
//!   and a device. [`WgpuBackend`] implements it on wgpu; tests record calls
//!   instead.

mod app;
mod backend;
mod camera;
mod config;
mod crosshair;
mod error;
mod font;
mod game;
mod gpu;
mod grid;
mod input;
mod light;
pub mod mesh;
mod picking;
pub mod render;
mod stats;
mod target;
mod wall;

pub use app::{AppConfig, run};
pub use backend::WgpuBackend;
pub use camera::{Camera, Movement, PITCH_LIMIT};
pub use config::GameConfig;
pub use crosshair::Crosshair;
pub use error::{Error, Result};
pub use font::{FontAtlas, GlyphQuad, load_font_data};
pub use game::{FrameOutcome, Game};
pub use gpu::GpuContext;
pub use grid::{SLOT_COUNT, SlotGrid};
pub use input::{Input, KeyState, PointerTracker};
pub use light::DirectLight;
pub use mesh::Vertex;
pub use picking::{Ray, hit_test};
pub use render::{
    BufferHandle, Color, Material, Primitive, Program, RenderBackend, Renderable, SceneParams,
    TextRenderer, Uniform,
};
pub use stats::SessionStats;
pub use target::Target;
pub use wall::Wall;

// Re-export glam math types for convenience
pub use glam::{Mat4, Vec2, Vec3};

// Re-export commonly used winit types for convenience
pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;
