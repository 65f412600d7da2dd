//! Rendering Adapter: renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers read the scene context; they never mutate it.
//! - Per-frame animation happens in `render_tick`, before the renderer runs.
//!
//! The GPU backend lives in `ribbonscape-render-wgpu`. The debug text
//! renderer here exercises the same frame path without a device.

mod renderer;

pub use renderer::{DebugTextRenderer, Renderer, frame};

pub fn crate_info() -> &'static str {
    "ribbonscape-render v0.1.0"
}
