use std::fmt::Write;

use ribbonscape_scene::{SceneContext, render_tick};

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads the scene context and produces output. It never
/// mutates the scene; animation state advances only through `render_tick`.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given scene.
    fn render(&self, scene: &SceneContext) -> Self::Output;
}

/// Advance the scene to `elapsed` seconds and render it.
pub fn frame<R: Renderer>(renderer: &R, elapsed: f32, scene: &mut SceneContext) -> R::Output {
    render_tick(elapsed, scene);
    renderer.render(scene)
}

/// Debug text renderer.
///
/// Produces a human-readable description of the scene. Useful for CLI
/// output, logging, and testing the render interface without a GPU.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &SceneContext) -> String {
        let mesh = scene.mesh();
        let cam = &scene.camera;
        let mut out = String::new();

        let _ = writeln!(
            out,
            "=== Ribbon Scene (generation={}) ===",
            scene.generation()
        );
        let _ = writeln!(
            out,
            "Mesh: vertices={} indices={} rows={}x{}",
            mesh.vertex_count(),
            mesh.index_count(),
            mesh.rows,
            mesh.row_len
        );
        let _ = writeln!(
            out,
            "Camera: eye=({:.2}, {:.2}, {:.2}) target=({:.2}, {:.2}, {:.2}) fov={:.0}",
            cam.position.x,
            cam.position.y,
            cam.position.z,
            cam.target.x,
            cam.target.y,
            cam.target.z,
            cam.fov.to_degrees()
        );
        let (w, h) = scene.viewport.framebuffer_size();
        let _ = writeln!(out, "Viewport: {w}x{h} aspect={:.3}", scene.viewport.aspect());

        for group in &mesh.groups {
            let Some(material) = scene.materials.get(group.material_index as usize) else {
                continue;
            };
            let _ = writeln!(
                out,
                "  [{}] {} side={:?} indices={}..{} uv_offset=({:.3}, {:.3}) repeat=({:.1}, {:.1})",
                group.material_index,
                material.name,
                material.side,
                group.start,
                group.start + group.count,
                material.uv.offset.x,
                material.uv.offset.y,
                material.uv.repeat.x,
                material.uv.repeat.y
            );
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use ribbonscape_scene::{SceneConfig, Viewport};

    fn scene() -> SceneContext {
        let mut config = SceneConfig::default();
        config.textures.front = "/nonexistent/front.png".into();
        config.textures.back = "/nonexistent/back.png".into();
        SceneContext::new(config, &mut StdRng::seed_from_u64(0), Viewport::default())
    }

    #[test]
    fn debug_renderer_reports_mesh() {
        let scene = scene();
        let output = DebugTextRenderer::new().render(&scene);

        assert!(output.contains("generation=0"));
        assert!(output.contains("vertices=3003"));
        assert!(output.contains("indices=6000"));
        assert!(output.contains("[0] front side=Back indices=0..6000"));
        assert!(output.contains("[1] back side=Front indices=0..6000"));
    }

    #[test]
    fn frame_advances_texture_scroll() {
        let mut scene = scene();
        let output = frame(&DebugTextRenderer::new(), 10.0, &mut scene);
        assert!(output.contains("uv_offset=(1.000, 0.000)"));
        assert!(output.contains("uv_offset=(-1.000, 0.000)"));
    }

    #[test]
    fn render_does_not_mutate_scene() {
        let scene = scene();
        let renderer = DebugTextRenderer::new();
        assert_eq!(renderer.render(&scene), renderer.render(&scene));
    }
}
