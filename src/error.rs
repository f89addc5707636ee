//! Error types

use thiserror::Error;

/// Rejected configuration values.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("ring tessellation needs at least one segment per axis (got {u}x{v})")]
    ZeroSegments { u: u32, v: u32 },

    #[error("{what} must be non-zero (got {width}x{height})")]
    ZeroSize {
        what: &'static str,
        width: u32,
        height: u32,
    },

    #[error("ring tessellation {u}x{v} needs {bytes} bytes in one buffer, over the {limit} byte limit")]
    TooManySegments { u: u32, v: u32, bytes: u64, limit: u64 },

    #[error("{what} {width}x{height} exceeds the {max} pixel texture limit")]
    TooLarge {
        what: &'static str,
        width: u32,
        height: u32,
        max: u32,
    },

    #[error("camera world up must be a non-zero finite vector (got {0:?})")]
    WorldUp(glam::Vec3),

    #[error("ring {what} must be positive and finite (got {value})")]
    RingShape { what: &'static str, value: f32 },

    #[error("initial zoom {0} is outside [1, 120] degrees")]
    Zoom(f32),

    #[error("clip planes must satisfy 0 < near < far (got near={near}, far={far})")]
    ClipPlanes { near: f32, far: f32 },
}

/// GPU setup and per-frame failures.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no compatible GPU adapter found")]
    NoAdapter,

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("shader program '{label}' failed to build:\n{message}")]
    Shader { label: &'static str, message: String },

    #[error("failed to create {label}: {message}")]
    Resource { label: &'static str, message: String },

    #[error("offscreen target {width}x{height} is incomplete: {message}")]
    OffscreenIncomplete {
        width: u32,
        height: u32,
        message: String,
    },

    #[error("screen payload is {actual} bytes, expected {expected} ({width}x{height} RGBA8)")]
    PayloadSize {
        expected: usize,
        actual: usize,
        width: u32,
        height: u32,
    },

    #[error("surface ran out of memory")]
    OutOfMemory,
}

/// Top-level application error.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("renderer: {0}")]
    Render(#[from] RenderError),

    #[error("event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("window creation: {0}")]
    Window(#[from] winit::error::OsError),
}
