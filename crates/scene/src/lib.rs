//! Scene state for the ribbon viewer, held in one explicit context.
//!
//! # Invariants
//! - No module-level state: every operation takes the `SceneContext` it acts on.
//! - `render_tick` never rebuilds geometry; it only advances camera damping and
//!   texture scroll.
//! - Randomness is injected by the caller.

pub mod camera;
pub mod config;
pub mod context;
pub mod light;
pub mod material;
pub mod tick;

pub use camera::OrbitCamera;
pub use config::{CameraConfig, ConfigError, LightsConfig, SceneConfig, SurfaceConfig, TexturesConfig};
pub use context::{SceneContext, Viewport};
pub use light::{AmbientLight, DirectionalLight};
pub use material::{Material, Side, UvTransform};
pub use tick::{Clock, FrameTime, render_tick};

pub fn crate_info() -> &'static str {
    "ribbonscape-scene v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("scene"));
    }
}
