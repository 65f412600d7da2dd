use glam::Vec3;
use ribbonscape_assets::TextureSettings;
use ribbonscape_common::Color;
use ribbonscape_geometry::{RibbonConfig, RibbonConfigError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::light::{AmbientLight, DirectionalLight};

/// Errors from loading or validating a scene configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid ribbon parameters: {0}")]
    Ribbon(#[from] RibbonConfigError),
    #[error("invalid camera parameters: {0}")]
    Camera(String),
}

/// Texture files and how each is placed on the ribbon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TexturesConfig {
    pub front: PathBuf,
    pub back: PathBuf,
    pub front_settings: TextureSettings,
    pub back_settings: TextureSettings,
}

impl Default for TexturesConfig {
    fn default() -> Self {
        Self {
            front: PathBuf::from("./front.png"),
            back: PathBuf::from("./back.png"),
            front_settings: TextureSettings::default(),
            back_settings: TextureSettings::default().mirrored(),
        }
    }
}

/// Shading parameters shared by both ribbon materials.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub roughness: f32,
    pub metalness: f32,
    /// Fragments with alpha below this are discarded.
    pub alpha_test: f32,
    pub flat_shading: bool,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            roughness: 0.65,
            metalness: 0.25,
            alpha_test: 1.0,
            flat_shading: true,
        }
    }
}

/// Perspective camera and orbit-control settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 100.0,
            position: Vec3::new(0.0, 0.0, 1.6),
            target: Vec3::ZERO,
            enable_damping: true,
            damping_factor: 0.05,
        }
    }
}

/// Scene lights.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LightsConfig {
    pub ambient: AmbientLight,
    pub directional: DirectionalLight,
}

/// Everything needed to build and animate the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub ribbon: RibbonConfig,
    /// Seed for control-point jitter. `None` draws a fresh shape each run.
    pub seed: Option<u64>,
    pub textures: TexturesConfig,
    pub surface: SurfaceConfig,
    pub camera: CameraConfig,
    pub lights: LightsConfig,
    pub background: Color,
    /// Euler XYZ rotation (radians) applied to the ribbon.
    pub mesh_rotation: Vec3,
    /// Texture scroll rate in UV units per second.
    pub scroll_speed: f32,
    pub show_curve: bool,
    /// Uniform-parameter divisions for the curve overlay line.
    pub curve_divisions: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            ribbon: RibbonConfig::default(),
            seed: None,
            textures: TexturesConfig::default(),
            surface: SurfaceConfig::default(),
            camera: CameraConfig::default(),
            lights: LightsConfig::default(),
            background: Color::WHITE,
            mesh_rotation: Vec3::new(0.0, std::f32::consts::PI, 0.0),
            scroll_speed: 0.1,
            show_curve: false,
            curve_divisions: 50,
        }
    }
}

impl SceneConfig {
    /// Read and validate a YAML config file. Missing keys take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&text)?;
        tracing::info!(path = %path.display(), "loaded scene config");
        Ok(config)
    }

    /// Parse and validate YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ribbon.validate()?;
        let cam = &self.camera;
        if !(cam.fov_degrees > 0.0 && cam.fov_degrees < 180.0) {
            return Err(ConfigError::Camera(format!(
                "fov_degrees must be in (0, 180), got {}",
                cam.fov_degrees
            )));
        }
        if !(cam.near > 0.0 && cam.far > cam.near) {
            return Err(ConfigError::Camera(format!(
                "need 0 < near < far, got near={} far={}",
                cam.near, cam.far
            )));
        }
        if !(cam.damping_factor > 0.0 && cam.damping_factor <= 1.0) {
            return Err(ConfigError::Camera(format!(
                "damping_factor must be in (0, 1], got {}",
                cam.damping_factor
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn defaults_reproduce_reference_scene() {
        let config = SceneConfig::default();
        assert_eq!(config.camera.fov_degrees, 75.0);
        assert_eq!(config.camera.position, Vec3::new(0.0, 0.0, 1.6));
        assert_eq!(config.textures.back_settings.repeat, Vec2::new(-1.0, 1.0));
        assert_eq!(config.textures.front_settings.repeat, Vec2::ONE);
        assert_eq!(config.textures.front_settings.offset, Vec2::new(0.5, 0.0));
        assert_eq!(config.textures.back_settings.offset, Vec2::new(0.5, 0.0));
        assert_eq!(config.scroll_speed, 0.1);
        assert!(!config.show_curve);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config = SceneConfig::from_yaml(
            "seed: 9\nribbon:\n  sample_count: 200\nscroll_speed: 0.25\n",
        )
        .unwrap();
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.ribbon.sample_count, 200);
        assert_eq!(config.ribbon.control_point_count, 7);
        assert_eq!(config.scroll_speed, 0.25);
        assert_eq!(config.camera.far, 100.0);
    }

    #[test]
    fn yaml_round_trips_defaults() {
        let yaml = SceneConfig::default().to_yaml().unwrap();
        let parsed = SceneConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, SceneConfig::default());
    }

    #[test]
    fn invalid_ribbon_is_rejected() {
        let err = SceneConfig::from_yaml("ribbon:\n  lateral_offsets: []\n").unwrap_err();
        assert!(matches!(err, ConfigError::Ribbon(RibbonConfigError::NoLateralOffsets)));
    }

    #[test]
    fn invalid_camera_is_rejected() {
        let err = SceneConfig::from_yaml("camera:\n  near: 5.0\n  far: 1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Camera(_)));
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        let err = SceneConfig::from_yaml("ribbon: [unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.yaml");
        std::fs::write(&path, "show_curve: true\n").unwrap();
        let config = SceneConfig::load(&path).unwrap();
        assert!(config.show_curve);

        let missing = SceneConfig::load(dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
