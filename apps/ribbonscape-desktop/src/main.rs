use anyhow::{Context as _, Result};
use clap::Parser;
use egui::Context as EguiContext;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use ribbonscape_geometry::{CurveType, RibbonConfig};
use ribbonscape_render_wgpu::RibbonRenderer;
use ribbonscape_scene::{Clock, SceneConfig, SceneContext, Viewport, render_tick};
use ribbonscape_tools::{FrameTimer, MeshInspector};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "ribbonscape-desktop", about = "Animated ribbon viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene config file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// RNG seed for the control-point jitter
    #[arg(short, long)]
    seed: Option<u64>,
}

/// Which pointer buttons are held and where the cursor was last seen.
#[derive(Default)]
struct PointerState {
    rotating: bool,
    panning: bool,
    last: Option<PhysicalPosition<f64>>,
}

impl PointerState {
    /// Presses over the UI panel are ignored; releases always count, so a
    /// drag that ends over the panel still lets go of the camera.
    fn set_button(&mut self, button: MouseButton, pressed: bool, over_ui: bool) {
        if pressed && over_ui {
            return;
        }
        match button {
            MouseButton::Left => self.rotating = pressed,
            MouseButton::Right => self.panning = pressed,
            _ => {}
        }
    }
}

/// Seed for the next ribbon: the pinned one, or a fresh draw from `seeds`.
fn next_seed<R: Rng + ?Sized>(seeds: &mut R, current: u64, fixed: bool) -> u64 {
    if fixed { current } else { seeds.random() }
}

/// Physical size of the window surface and the resolution the scene is drawn at.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TargetSizes {
    surface: (u32, u32),
    render: (u32, u32),
}

/// Application state.
struct AppState {
    scene: SceneContext,
    /// Source of fresh seeds; every ribbon is built from `seed` alone.
    seeds: StdRng,
    seed: u64,
    fixed_seed: bool,
    draft: RibbonConfig,
    draft_error: Option<String>,
    clock: Clock,
    timer: FrameTimer,
    pointer: PointerState,
    scale_factor: f64,
    show_panel: bool,
}

impl AppState {
    fn new(config: SceneConfig) -> Self {
        let fixed_seed = config.seed.is_some();
        let mut seeds = StdRng::from_os_rng();
        let seed = config.seed.unwrap_or_else(|| seeds.random());
        let draft = config.ribbon.clone();
        let scene = SceneContext::new(config, &mut StdRng::seed_from_u64(seed), Viewport::default());

        Self {
            scene,
            seeds,
            seed,
            fixed_seed,
            draft,
            draft_error: None,
            clock: Clock::new(),
            timer: FrameTimer::default(),
            pointer: PointerState::default(),
            scale_factor: 1.0,
            show_panel: true,
        }
    }

    /// Rebuild the ribbon from the draft parameters.
    fn regenerate(&mut self) {
        if let Err(e) = self.draft.validate() {
            self.draft_error = Some(e.to_string());
            return;
        }
        self.draft_error = None;
        self.seed = next_seed(&mut self.seeds, self.seed, self.fixed_seed);
        self.scene.config.ribbon = self.draft.clone();
        self.scene.rebuild(&mut StdRng::seed_from_u64(self.seed));
        tracing::info!(seed = self.seed, fixed = self.fixed_seed, "regenerated ribbon");
    }

    /// Track a new window size.
    fn resize(&mut self, size: PhysicalSize<u32>, scale_factor: f64) -> TargetSizes {
        self.scale_factor = scale_factor;
        let logical: LogicalSize<f32> = size.to_logical(scale_factor);
        self.scene
            .resize(logical.width, logical.height, scale_factor as f32);
        let surface = (size.width.max(1), size.height.max(1));
        TargetSizes {
            surface,
            render: self.scene.viewport.render_size(surface),
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::F1 => self.show_panel = !self.show_panel,
            KeyCode::KeyR => self.regenerate(),
            KeyCode::KeyC => self.scene.show_curve = !self.scene.show_curve,
            _ => {}
        }
    }

    fn handle_cursor(&mut self, position: PhysicalPosition<f64>) {
        if let Some(last) = self.pointer.last {
            // Orbit and pan speeds are defined in logical pixels.
            let dx = ((position.x - last.x) / self.scale_factor) as f32;
            let dy = ((position.y - last.y) / self.scale_factor) as f32;
            let height = self.scene.viewport.height;
            if self.pointer.rotating {
                self.scene.camera.rotate(dx, dy, height);
            } else if self.pointer.panning {
                self.scene.camera.pan(dx, dy, height);
            }
        }
        self.pointer.last = Some(position);
    }

    fn handle_wheel(&mut self, delta: MouseScrollDelta) {
        let steps = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(p) => (p.y / 50.0) as f32,
        };
        self.scene.camera.zoom(steps);
    }

    /// Advance the clock and animate the scene.
    fn update(&mut self) {
        let time = self.clock.tick();
        self.timer.record_secs(time.delta);
        render_tick(time.elapsed, &mut self.scene);
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        if !self.show_panel {
            return;
        }

        let summary = MeshInspector::summary(self.scene.mesh());

        egui::SidePanel::left("ribbon_panel")
            .default_width(280.0)
            .show(ctx, |ui| {
                ui.heading("Ribbon");
                ui.separator();

                let draft = &mut self.draft;
                ui.add(
                    egui::Slider::new(&mut draft.control_point_count, 1..=24)
                        .text("control points"),
                );
                ui.add(egui::Slider::new(&mut draft.curve_radius, 0.1..=2.0).text("radius"));
                ui.add(egui::Slider::new(&mut draft.angle_jitter, 0.0..=1.5).text("jitter"));
                egui::ComboBox::from_label("curve type")
                    .selected_text(format!("{:?}", draft.curve_type))
                    .show_ui(ui, |ui| {
                        for kind in [CurveType::Centripetal, CurveType::Chordal, CurveType::CatmullRom] {
                            ui.selectable_value(&mut draft.curve_type, kind, format!("{kind:?}"));
                        }
                    });
                ui.add_enabled(
                    draft.curve_type == CurveType::CatmullRom,
                    egui::Slider::new(&mut draft.curve_tension, 0.0..=1.0).text("tension"),
                );
                ui.add(egui::Slider::new(&mut draft.sample_count, 0..=4000).text("samples"));

                ui.label("Lateral offsets:");
                ui.horizontal_wrapped(|ui| {
                    for offset in draft.lateral_offsets.iter_mut() {
                        ui.add(egui::DragValue::new(offset).speed(0.01));
                    }
                    if ui.small_button("+").clicked() {
                        let next = draft.lateral_offsets.last().copied().unwrap_or(0.0) + 0.2;
                        draft.lateral_offsets.push(next);
                    }
                    if draft.lateral_offsets.len() > 1 && ui.small_button("-").clicked() {
                        draft.lateral_offsets.pop();
                    }
                });
                let max_rows = draft.lateral_offsets.len().saturating_sub(1);
                draft.height_segments = draft.height_segments.min(max_rows);
                ui.add(
                    egui::Slider::new(&mut draft.height_segments, 0..=max_rows)
                        .text("height segments"),
                );

                ui.horizontal(|ui| {
                    ui.checkbox(&mut self.fixed_seed, "fixed seed");
                    ui.add_enabled(self.fixed_seed, egui::DragValue::new(&mut self.seed));
                });
                if ui.button("Regenerate (R)").clicked() {
                    self.regenerate();
                }
                if let Some(err) = &self.draft_error {
                    ui.colored_label(egui::Color32::RED, err.as_str());
                }

                ui.separator();
                ui.heading("Animation");
                ui.add(
                    egui::Slider::new(&mut self.scene.scroll_speed, -1.0..=1.0)
                        .text("scroll speed"),
                );
                ui.checkbox(&mut self.scene.show_curve, "show curve (C)");

                ui.separator();
                ui.heading("Stats");
                ui.label(format!(
                    "Vertices: {}  Triangles: {}",
                    summary.vertex_count, summary.triangle_count
                ));
                ui.label(format!(
                    "Generation: {}  Seam closed: {}",
                    self.scene.generation(),
                    summary.seam_closed
                ));
                ui.label(format!("Max |v|-1: {:.2e}", summary.max_unit_error));
                ui.label(format!(
                    "Frame: {:.2} ms avg, {:.2} ms max ({:.0} fps)",
                    self.timer.average().as_secs_f64() * 1000.0,
                    self.timer.max().as_secs_f64() * 1000.0,
                    self.timer.fps()
                ));
                let cam = &self.scene.camera;
                ui.label(format!(
                    "Camera: ({:.2}, {:.2}, {:.2})",
                    cam.position.x, cam.position.y, cam.position.z
                ));

                if !self.scene.load_errors().is_empty() {
                    ui.separator();
                    ui.heading("Textures");
                    for err in self.scene.load_errors() {
                        ui.colored_label(egui::Color32::DARK_RED, err.to_string());
                    }
                }

                ui.separator();
                ui.small("F1: Toggle Panel | LMB: Orbit | RMB: Pan | Wheel: Zoom");
            });
    }
}

/// Everything that exists only once a window is up.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: RibbonRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(window: Arc<Window>, egui_ctx: &EguiContext, sizes: TargetSizes) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no suitable GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("ribbonscape_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: sizes.surface.0,
            height: sizes.surface.1,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = RibbonRenderer::new(&device, surface_format, sizes.surface, sizes.render);

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, sizes: TargetSizes) {
        self.config.width = sizes.surface.0;
        self.config.height = sizes.surface.1;
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, sizes.surface, sizes.render);
    }
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl GpuApp {
    fn new(config: SceneConfig) -> Self {
        Self {
            state: AppState::new(config),
            gpu: None,
            egui_ctx: EguiContext::default(),
        }
    }

    fn redraw(&mut self) {
        self.state.update();

        let Some(gpu) = &mut self.gpu else {
            return;
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        gpu.renderer
            .render(&gpu.device, &gpu.queue, &view, &self.state.scene);

        let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            self.state.draw_ui(ctx);
        });
        gpu.egui_winit
            .handle_platform_output(&gpu.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        // The panel is drawn straight onto the surface at full resolution.
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            gpu.egui_renderer
                .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        gpu.egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            gpu.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }

        output.present();
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("Ribbonscape")
            .with_inner_size(LogicalSize::new(1280.0, 720.0));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                tracing::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let sizes = self.state.resize(window.inner_size(), window.scale_factor());
        match Gpu::new(window, &self.egui_ctx, sizes) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                tracing::error!("failed to initialize GPU: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let over_ui = match &mut self.gpu {
            Some(gpu) => gpu.egui_winit.on_window_event(&gpu.window, &event).consumed,
            None => false,
        };
        if let WindowEvent::MouseInput { button, state, .. } = event {
            self.state
                .pointer
                .set_button(button, state == ElementState::Pressed, over_ui);
            return;
        }
        if over_ui {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    let sizes = self.state.resize(new_size, gpu.window.scale_factor());
                    gpu.resize(sizes);
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let Some(gpu) = &mut self.gpu {
                    let sizes = self.state.resize(gpu.window.inner_size(), scale_factor);
                    gpu.resize(sizes);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                self.state.handle_key(key);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.state.handle_cursor(position);
            }
            WindowEvent::CursorLeft { .. } => {
                self.state.pointer.last = None;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.state.handle_wheel(delta);
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("ribbonscape-desktop starting");

    let mut config = match &cli.config {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(config);
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SceneConfig {
        let mut config = SceneConfig::default();
        config.ribbon.sample_count = 64;
        config.textures.front = PathBuf::from("/nonexistent/front.png");
        config.textures.back = PathBuf::from("/nonexistent/back.png");
        config
    }

    #[test]
    fn pinned_seed_is_kept() {
        let mut seeds = StdRng::seed_from_u64(1);
        assert_eq!(next_seed(&mut seeds, 42, true), 42);
    }

    #[test]
    fn unpinned_seed_is_drawn_fresh() {
        let mut seeds = StdRng::seed_from_u64(1);
        let expected: u64 = StdRng::seed_from_u64(1).random();
        assert_eq!(next_seed(&mut seeds, 42, false), expected);
    }

    #[test]
    fn shown_seed_rebuilds_the_current_ribbon() {
        let mut state = AppState::new(small_config());
        state.regenerate();
        state.regenerate();

        let rebuilt = SceneContext::new(
            small_config(),
            &mut StdRng::seed_from_u64(state.seed),
            Viewport::default(),
        );
        assert_eq!(rebuilt.mesh(), state.scene.mesh());
    }

    #[test]
    fn pinning_keeps_the_ribbon_being_viewed() {
        let mut state = AppState::new(small_config());
        state.regenerate();
        let viewed = state.scene.mesh().clone();
        let seed = state.seed;

        state.fixed_seed = true;
        state.regenerate();
        assert_eq!(state.seed, seed);
        assert_eq!(state.scene.mesh(), &viewed);
    }

    #[test]
    fn release_over_ui_still_ends_the_drag() {
        let mut pointer = PointerState::default();
        pointer.set_button(MouseButton::Left, true, false);
        pointer.set_button(MouseButton::Right, true, false);
        assert!(pointer.rotating && pointer.panning);

        pointer.set_button(MouseButton::Left, false, true);
        pointer.set_button(MouseButton::Right, false, true);
        assert!(!pointer.rotating && !pointer.panning);
    }

    #[test]
    fn press_over_ui_does_not_start_a_drag() {
        let mut pointer = PointerState::default();
        pointer.set_button(MouseButton::Left, true, true);
        assert!(!pointer.rotating);
    }

    #[test]
    fn surface_keeps_window_size_when_render_is_capped() {
        let mut state = AppState::new(small_config());
        let sizes = state.resize(PhysicalSize::new(2400, 1800), 3.0);
        assert_eq!(sizes.surface, (2400, 1800));
        assert_eq!(sizes.render, (1600, 1200));

        let sizes = state.resize(PhysicalSize::new(1280, 720), 1.0);
        assert_eq!(sizes.surface, sizes.render);
    }
}
