use glam::Vec3;
use ribbonscape_common::Color;
use serde::{Deserialize, Serialize};

/// Uniform light applied to every surface regardless of orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            intensity: 1.5,
        }
    }
}

impl AmbientLight {
    pub fn radiance(&self) -> [f32; 4] {
        self.color.scaled(self.intensity)
    }
}

/// Parallel light shining from `position` towards `target`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            intensity: 1.0,
            position: Vec3::new(-5.0, 5.0, 0.0),
            target: Vec3::ZERO,
        }
    }
}

impl DirectionalLight {
    /// Unit vector from the lit surface towards the light.
    pub fn direction_to_light(&self) -> Vec3 {
        (self.position - self.target).normalize_or(Vec3::Y)
    }

    pub fn radiance(&self) -> [f32; 4] {
        self.color.scaled(self.intensity)
    }
}
