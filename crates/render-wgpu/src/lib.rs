//! wgpu render backend for the ribbon viewer.
//!
//! Draws the ribbon once per render group, each with its material slot's
//! texture and face culling, plus an optional debug curve overlay.
//!
//! # Invariants
//! - Renderer never mutates scene state.
//! - Geometry buffers are rebuilt only when the scene generation changes.

mod gpu;
mod shaders;

pub use gpu::RibbonRenderer;
