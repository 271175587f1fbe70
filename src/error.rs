//! Crate-wide error type.

use crate::render::Program;

/// Errors produced by the game core and its wgpu backend.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Every grid slot is already held by a target.
    #[error("grid slot pool exhausted: all {0} slots are occupied")]
    SlotPoolExhausted(usize),

    /// A specific slot was requested but is taken or does not exist.
    #[error("grid slot {0} is occupied or out of range")]
    SlotOccupied(usize),

    /// A vertex buffer with no vertices was about to be drawn.
    #[error("vertex buffer for {0} is empty")]
    EmptyGeometry(String),

    /// A vertex buffer whose float count is not a multiple of the vertex stride.
    #[error("vertex buffer of {len} floats is not a multiple of the {stride}-float stride")]
    MalformedVertexBuffer { len: usize, stride: usize },

    /// The backend cannot run a shader program the game needs.
    #[error("shader program {0:?} is not available")]
    ProgramUnavailable(Program),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("failed to acquire surface texture: {0}")]
    SurfaceTexture(#[from] wgpu::SurfaceError),

    #[error("font error: {0}")]
    Font(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
