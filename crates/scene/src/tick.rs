use std::time::Instant;

use crate::context::SceneContext;

/// Wall-clock time since start, plus the gap since the previous reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    pub elapsed: f32,
    pub delta: f32,
}

/// Monotonic clock for driving the render tick.
#[derive(Debug)]
pub struct Clock {
    start: Instant,
    previous: f32,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            previous: 0.0,
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }

    /// Read the clock and advance the previous-frame marker.
    pub fn tick(&mut self) -> FrameTime {
        let elapsed = self.elapsed();
        let delta = elapsed - self.previous;
        self.previous = elapsed;
        FrameTime { elapsed, delta }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

/// Advance the scene to `elapsed` seconds: settle orbit damping and scroll
/// the two textures in opposite directions. Issuing the draw is left to the
/// caller's renderer.
pub fn render_tick(elapsed: f32, ctx: &mut SceneContext) {
    ctx.camera.update();

    let offset = elapsed * ctx.scroll_speed;
    for (slot, material) in ctx.materials.iter_mut().enumerate() {
        material.uv.offset.x = if slot > 0 { -offset } else { offset };
    }

    tracing::trace!(elapsed, offset, "render tick");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use crate::context::Viewport;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn scene() -> SceneContext {
        let mut config = SceneConfig::default();
        config.ribbon.sample_count = 32;
        config.textures.front = "/nonexistent/front.png".into();
        config.textures.back = "/nonexistent/back.png".into();
        SceneContext::new(config, &mut StdRng::seed_from_u64(0), Viewport::default())
    }

    #[test]
    fn textures_scroll_in_opposite_directions() {
        let mut ctx = scene();
        render_tick(2.0, &mut ctx);
        assert!((ctx.materials[0].uv.offset.x - 0.2).abs() < 1e-6);
        assert!((ctx.materials[1].uv.offset.x + 0.2).abs() < 1e-6);
        assert_eq!(ctx.materials[0].uv.offset.y, 0.0);
    }

    #[test]
    fn offset_depends_only_on_elapsed_time() {
        let mut ctx = scene();
        render_tick(5.0, &mut ctx);
        render_tick(1.0, &mut ctx);
        assert!((ctx.materials[0].uv.offset.x - 0.1).abs() < 1e-6);
    }

    #[test]
    fn tick_leaves_geometry_untouched() {
        let mut ctx = scene();
        let before = ctx.mesh().clone();
        render_tick(3.0, &mut ctx);
        assert_eq!(&before, ctx.mesh());
        assert_eq!(ctx.generation(), 0);
    }

    #[test]
    fn tick_settles_queued_camera_motion() {
        let mut ctx = scene();
        ctx.camera.rotate(100.0, 0.0, 720.0);
        let start = ctx.camera.position;
        render_tick(0.016, &mut ctx);
        assert_ne!(ctx.camera.position, start);
    }

    #[test]
    fn clock_is_monotonic() {
        let mut clock = Clock::new();
        let a = clock.tick();
        let b = clock.tick();
        assert!(b.elapsed >= a.elapsed);
        assert!(b.delta >= 0.0);
        assert!((b.elapsed - (a.elapsed + b.delta)).abs() < 1e-6);
    }
}
