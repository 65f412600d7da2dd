use glam::{Mat4, Vec3};
use std::f32::consts::{PI, TAU};

use crate::config::CameraConfig;

/// Keeps the polar angle off the poles, where the view basis degenerates.
const POLE_EPSILON: f32 = 1e-6;

/// Perspective camera orbiting a target point.
///
/// Input (`rotate`, `zoom`, `pan`) accumulates pending motion; `update`
/// applies it. With damping enabled each update applies a fraction of the
/// pending motion and decays the rest, so the view glides to a stop.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    pan_offset: Vec3,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default(), 16.0 / 9.0)
    }
}

impl OrbitCamera {
    pub fn from_config(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            position: config.position,
            target: config.target,
            fov: config.fov_degrees.to_radians(),
            aspect,
            near: config.near,
            far: config.far,
            enable_damping: config.enable_damping,
            damping_factor: config.damping_factor,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            pan_offset: Vec3::ZERO,
        }
    }

    /// Distance from the camera to the orbit target.
    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }

    /// Queue an orbit from a pointer drag of `(dx, dy)` pixels in a viewport
    /// `viewport_height` pixels tall. A full-height drag turns by one revolution.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let h = viewport_height.max(1.0);
        self.delta_theta -= TAU * dx / h * self.rotate_speed;
        self.delta_phi -= TAU * dy / h * self.rotate_speed;
    }

    /// Queue a dolly. Positive steps move towards the target.
    pub fn zoom(&mut self, steps: f32) {
        self.scale *= 0.95_f32.powf(steps * self.zoom_speed);
    }

    /// Queue a screen-space pan from a drag of `(dx, dy)` pixels.
    pub fn pan(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let h = viewport_height.max(1.0);
        // World units covered by the viewport height at the target distance.
        let span = 2.0 * self.distance() * (self.fov / 2.0).tan();
        let forward = (self.target - self.position).normalize_or(Vec3::NEG_Z);
        let right = forward.cross(Vec3::Y).normalize_or(Vec3::X);
        let up = right.cross(forward);
        self.pan_offset -= right * (dx * span / h * self.pan_speed);
        self.pan_offset += up * (dy * span / h * self.pan_speed);
    }

    /// Apply pending motion. Returns true if the camera moved.
    pub fn update(&mut self) -> bool {
        let before = self.position;
        let offset = self.position - self.target;
        let radius = offset.length();
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = if radius > 0.0 {
            (offset.y / radius).clamp(-1.0, 1.0).acos()
        } else {
            PI / 2.0
        };

        let k = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        theta += self.delta_theta * k;
        phi += self.delta_phi * k;
        phi = phi.clamp(POLE_EPSILON, PI - POLE_EPSILON);

        let radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);
        self.target += self.pan_offset * k;

        let ring = phi.sin() * radius;
        let offset = Vec3::new(ring * theta.sin(), phi.cos() * radius, ring * theta.cos());
        self.position = self.target + offset;

        if self.enable_damping {
            let decay = 1.0 - self.damping_factor;
            self.delta_theta *= decay;
            self.delta_phi *= decay;
            self.pan_offset *= decay;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        let moved = before.distance_squared(self.position) > 1e-12;
        if moved {
            tracing::trace!(position = ?self.position, "camera moved");
        }
        moved
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
