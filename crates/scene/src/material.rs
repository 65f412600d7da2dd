use glam::{Vec2, Vec4};
use ribbonscape_assets::{AssetId, TextureSettings};
use serde::{Deserialize, Serialize};

use crate::config::SurfaceConfig;

/// Which triangle faces a material is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Front,
    Back,
}

/// UV placement: `uv * repeat + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UvTransform {
    pub repeat: Vec2,
    pub offset: Vec2,
}

impl Default for UvTransform {
    fn default() -> Self {
        Self {
            repeat: Vec2::ONE,
            offset: Vec2::ZERO,
        }
    }
}

impl UvTransform {
    pub fn apply(&self, uv: Vec2) -> Vec2 {
        uv * self.repeat + self.offset
    }

    /// Packed as `(repeat.x, repeat.y, offset.x, offset.y)` for shader upload.
    pub fn to_vec4(&self) -> Vec4 {
        Vec4::new(self.repeat.x, self.repeat.y, self.offset.x, self.offset.y)
    }
}

impl From<&TextureSettings> for UvTransform {
    fn from(settings: &TextureSettings) -> Self {
        Self {
            repeat: settings.repeat,
            offset: settings.offset,
        }
    }
}

/// Textured, lit surface bound to one render-group slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub texture: AssetId,
    pub side: Side,
    pub uv: UvTransform,
    pub surface: SurfaceConfig,
}

impl Material {
    pub fn new(
        name: impl Into<String>,
        texture: AssetId,
        settings: &TextureSettings,
        side: Side,
        surface: SurfaceConfig,
    ) -> Self {
        Self {
            name: name.into(),
            texture,
            side,
            uv: UvTransform::from(settings),
            surface,
        }
    }
}
