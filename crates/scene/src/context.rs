use glam::{DVec3, Vec3};
use rand::Rng;
use ribbonscape_assets::{AssetId, AssetLoadError, Texture, TextureStore};
use ribbonscape_common::{Color, Transform};
use ribbonscape_geometry::{Ribbon, RibbonMesh, build_from_points, control_points};

use crate::camera::OrbitCamera;
use crate::config::SceneConfig;
use crate::light::{AmbientLight, DirectionalLight};
use crate::material::{Material, Side};

/// Output surface size in logical pixels plus the display's pixel density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub device_pixel_ratio: f32,
}

impl Viewport {
    /// Render resolution never exceeds this many physical pixels per logical pixel.
    pub const MAX_PIXEL_RATIO: f32 = 2.0;

    pub fn new(width: f32, height: f32, device_pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height.max(1.0)
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.device_pixel_ratio.min(Self::MAX_PIXEL_RATIO)
    }

    /// Framebuffer size in physical pixels, at least 1x1.
    pub fn framebuffer_size(&self) -> (u32, u32) {
        let r = self.pixel_ratio();
        (
            ((self.width * r).round() as u32).max(1),
            ((self.height * r).round() as u32).max(1),
        )
    }

    /// Resolution to draw at for a surface of `physical` pixels: the surface
    /// size itself, unless the pixel ratio cap makes it smaller.
    pub fn render_size(&self, physical: (u32, u32)) -> (u32, u32) {
        if self.device_pixel_ratio > Self::MAX_PIXEL_RATIO {
            self.framebuffer_size()
        } else {
            (physical.0.max(1), physical.1.max(1))
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0, 1.0)
    }
}

/// All state the render tick and renderers need, passed explicitly.
///
/// Material slot 0 carries the front texture and is drawn on back faces;
/// slot 1 carries the back texture and is drawn on front faces. Both cover
/// the whole ribbon, so each side of the strip shows its own image.
#[derive(Debug)]
pub struct SceneContext {
    pub config: SceneConfig,
    pub ribbon: Ribbon,
    pub mesh_transform: Transform,
    pub materials: [Material; 2],
    pub textures: TextureStore,
    pub ambient: AmbientLight,
    pub directional: DirectionalLight,
    pub camera: OrbitCamera,
    pub viewport: Viewport,
    pub background: Color,
    pub scroll_speed: f32,
    pub show_curve: bool,
    curve_line: Vec<Vec3>,
    generation: u64,
    load_errors: Vec<AssetLoadError>,
}

impl SceneContext {
    /// Load textures from the configured paths (placeholders on failure),
    /// draw control points from `rng` and build the ribbon.
    pub fn new<R: Rng + ?Sized>(config: SceneConfig, rng: &mut R, viewport: Viewport) -> Self {
        let mut textures = TextureStore::new();
        let mut load_errors = Vec::new();

        let (front, err) = textures.load_or_fallback(
            &config.textures.front,
            config.textures.front_settings,
            || placeholder("front", [255, 255, 255, 255], [230, 120, 40, 255]),
        );
        load_errors.extend(err);
        let (back, err) = textures.load_or_fallback(
            &config.textures.back,
            config.textures.back_settings,
            || placeholder("back", [255, 255, 255, 255], [40, 120, 230, 255]),
        );
        load_errors.extend(err);

        let mut ctx = Self::with_textures(config, textures, [front, back], rng, viewport);
        ctx.load_errors = load_errors;
        ctx
    }

    /// Build a context from already-registered textures for slots 0 and 1.
    pub fn with_textures<R: Rng + ?Sized>(
        config: SceneConfig,
        textures: TextureStore,
        slots: [AssetId; 2],
        rng: &mut R,
        viewport: Viewport,
    ) -> Self {
        let points = control_points(&config.ribbon, rng);
        let ribbon = build_from_points(&config.ribbon, points);

        let materials = [
            Material::new(
                "front",
                slots[0],
                &config.textures.front_settings,
                Side::Back,
                config.surface,
            ),
            Material::new(
                "back",
                slots[1],
                &config.textures.back_settings,
                Side::Front,
                config.surface,
            ),
        ];
        let r = config.mesh_rotation;

        let mut ctx = Self {
            ribbon,
            mesh_transform: Transform::from_euler(r.x, r.y, r.z),
            materials,
            textures,
            ambient: config.lights.ambient,
            directional: config.lights.directional,
            camera: OrbitCamera::from_config(&config.camera, viewport.aspect()),
            viewport,
            background: config.background,
            scroll_speed: config.scroll_speed,
            show_curve: config.show_curve,
            curve_line: Vec::new(),
            generation: 0,
            load_errors: Vec::new(),
            config,
        };
        ctx.refresh_curve_line();

        tracing::info!(
            vertices = ctx.mesh().vertex_count(),
            indices = ctx.mesh().index_count(),
            "scene initialized"
        );
        ctx
    }

    pub fn mesh(&self) -> &RibbonMesh {
        &self.ribbon.mesh
    }

    /// Incremented whenever the ribbon geometry is replaced.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Texture failures encountered while building the context.
    pub fn load_errors(&self) -> &[AssetLoadError] {
        &self.load_errors
    }

    /// Curve overlay polyline, uniform in curve parameter.
    pub fn curve_line(&self) -> &[Vec3] {
        &self.curve_line
    }

    /// Draw new control points and rebuild the ribbon from `config.ribbon`.
    pub fn rebuild<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let points = control_points(&self.config.ribbon, rng);
        self.rebuild_from_points(points);
    }

    /// Rebuild the ribbon through fixed control points.
    pub fn rebuild_from_points(&mut self, points: Vec<DVec3>) {
        self.ribbon = build_from_points(&self.config.ribbon, points);
        self.generation += 1;
        self.refresh_curve_line();
        tracing::info!(
            generation = self.generation,
            vertices = self.mesh().vertex_count(),
            "ribbon rebuilt"
        );
    }

    /// Track a new output size. Returns the framebuffer size to render at.
    pub fn resize(&mut self, width: f32, height: f32, device_pixel_ratio: f32) -> (u32, u32) {
        self.viewport = Viewport::new(width, height, device_pixel_ratio);
        self.camera.aspect = self.viewport.aspect();
        let size = self.viewport.framebuffer_size();
        tracing::debug!(width, height, ?size, "viewport resized");
        size
    }

    fn refresh_curve_line(&mut self) {
        self.curve_line = self
            .ribbon
            .curve
            .points(self.config.curve_divisions)
            .into_iter()
            .map(|p| p.as_vec3())
            .collect();
    }
}

fn placeholder(name: &str, a: [u8; 4], b: [u8; 4]) -> Texture {
    Texture::checker(name, 256, 8, a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::path::PathBuf;

    fn small_config() -> SceneConfig {
        let mut config = SceneConfig::default();
        config.ribbon.sample_count = 100;
        config.textures.front = PathBuf::from("/nonexistent/front.png");
        config.textures.back = PathBuf::from("/nonexistent/back.png");
        config
    }

    #[test]
    fn viewport_caps_pixel_ratio() {
        let vp = Viewport::new(800.0, 600.0, 3.0);
        assert_eq!(vp.pixel_ratio(), 2.0);
        assert_eq!(vp.framebuffer_size(), (1600, 1200));
        assert!((vp.aspect() - 800.0 / 600.0).abs() < 1e-6);

        let vp = Viewport::new(800.0, 600.0, 1.5);
        assert_eq!(vp.framebuffer_size(), (1200, 900));
    }

    #[test]
    fn render_size_matches_surface_below_cap() {
        let vp = Viewport::new(800.0, 600.0, 1.5);
        assert_eq!(vp.render_size((1201, 900)), (1201, 900));
        assert_eq!(vp.render_size((0, 0)), (1, 1));

        let vp = Viewport::new(800.0, 600.0, 3.0);
        assert_eq!(vp.render_size((2400, 1800)), (1600, 1200));
    }

    #[test]
    fn viewport_never_zero_sized() {
        let vp = Viewport::new(0.0, 0.0, 1.0);
        assert_eq!(vp.framebuffer_size(), (1, 1));
        assert!(vp.aspect().is_finite());
    }

    #[test]
    fn missing_textures_fall_back_and_are_reported() {
        let mut rng = StdRng::seed_from_u64(1);
        let ctx = SceneContext::new(small_config(), &mut rng, Viewport::default());
        assert_eq!(ctx.load_errors().len(), 2);
        assert_eq!(ctx.textures.len(), 2);
        assert_ne!(ctx.materials[0].texture, ctx.materials[1].texture);
    }

    #[test]
    fn materials_are_assigned_to_opposite_sides() {
        let mut rng = StdRng::seed_from_u64(1);
        let ctx = SceneContext::new(small_config(), &mut rng, Viewport::default());
        assert_eq!(ctx.materials[0].side, Side::Back);
        assert_eq!(ctx.materials[1].side, Side::Front);
        assert_eq!(ctx.materials[1].uv.repeat.x, -1.0);
        assert_eq!(ctx.mesh().groups[0].material_index, 0);
        assert_eq!(ctx.mesh().groups[1].material_index, 1);
    }

    #[test]
    fn ribbon_is_rotated_half_turn() {
        let mut rng = StdRng::seed_from_u64(1);
        let ctx = SceneContext::new(small_config(), &mut rng, Viewport::default());
        let p = ctx.mesh_transform.matrix().transform_point3(Vec3::Z);
        assert!((p - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn same_seed_same_scene() {
        let a = SceneContext::new(small_config(), &mut StdRng::seed_from_u64(5), Viewport::default());
        let b = SceneContext::new(small_config(), &mut StdRng::seed_from_u64(5), Viewport::default());
        assert_eq!(a.mesh(), b.mesh());
    }

    #[test]
    fn rebuild_bumps_generation() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut ctx = SceneContext::new(small_config(), &mut rng, Viewport::default());
        let before = ctx.mesh().clone();
        ctx.config.ribbon.sample_count = 50;
        ctx.rebuild(&mut rng);
        assert_eq!(ctx.generation(), 1);
        assert_eq!(ctx.mesh().row_len, 51);
        assert_ne!(&before, ctx.mesh());
    }

    #[test]
    fn curve_line_follows_divisions() {
        let mut rng = StdRng::seed_from_u64(3);
        let ctx = SceneContext::new(small_config(), &mut rng, Viewport::default());
        assert_eq!(ctx.curve_line().len(), 51);
        assert_eq!(ctx.curve_line()[0], ctx.curve_line()[50]);
    }

    #[test]
    fn resize_updates_camera_aspect() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut ctx = SceneContext::new(small_config(), &mut rng, Viewport::default());
        let size = ctx.resize(1000.0, 500.0, 2.5);
        assert_eq!(size, (2000, 1000));
        assert!((ctx.camera.aspect - 2.0).abs() < 1e-6);
    }
}
