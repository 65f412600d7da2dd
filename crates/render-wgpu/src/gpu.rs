use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::Vec4;
use ribbonscape_assets::{AssetId, Texture, WrapMode};
use ribbonscape_scene::{Material, SceneContext, Side};
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct FrameUniforms {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    camera_position: [f32; 4],
    ambient: [f32; 4],
    light_direction: [f32; 4],
    light_color: [f32; 4],
}

impl FrameUniforms {
    fn from_scene(scene: &SceneContext) -> Self {
        let camera = &scene.camera;
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            model: scene.mesh_transform.matrix().to_cols_array_2d(),
            camera_position: camera.position.extend(1.0).to_array(),
            ambient: scene.ambient.radiance(),
            light_direction: scene.directional.direction_to_light().extend(0.0).to_array(),
            light_color: scene.directional.radiance(),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct MaterialUniforms {
    uv_transform: [f32; 4],
    surface: [f32; 4],
}

impl MaterialUniforms {
    fn from_material(material: &Material) -> Self {
        let s = &material.surface;
        Self {
            uv_transform: material.uv.to_vec4().to_array(),
            surface: Vec4::new(
                s.roughness,
                s.metalness,
                s.alpha_test,
                if s.flat_shading { 1.0 } else { 0.0 },
            )
            .to_array(),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct RibbonVertex {
    position: [f32; 3],
    uv: [f32; 2],
}

/// GPU copy of the ribbon mesh and curve polyline for one geometry generation.
struct GpuGeometry {
    generation: u64,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    curve_buffer: wgpu::Buffer,
    curve_vertex_count: u32,
}

/// One material slot: its uniforms, texture and bind group.
struct GpuMaterial {
    texture_id: AssetId,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Reduced-resolution color target, scaled up to the surface by the blit pass.
struct OffscreenTarget {
    view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
}

/// wgpu-based ribbon renderer.
///
/// Draws each render group with its material slot's pipeline, chosen by the
/// material's `Side`, then the optional curve overlay. Geometry is uploaded
/// again only when the scene's generation counter changes.
///
/// When the render size is smaller than the surface, the scene is drawn into
/// an offscreen target and blitted to the surface.
pub struct RibbonRenderer {
    front_pipeline: wgpu::RenderPipeline,
    back_pipeline: wgpu::RenderPipeline,
    curve_pipeline: wgpu::RenderPipeline,
    blit_pipeline: wgpu::RenderPipeline,
    blit_layout: wgpu::BindGroupLayout,
    blit_sampler: wgpu::Sampler,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    material_layout: wgpu::BindGroupLayout,
    materials: Vec<Option<GpuMaterial>>,
    geometry: Option<GpuGeometry>,
    depth_texture: wgpu::TextureView,
    offscreen: Option<OffscreenTarget>,
    surface_format: wgpu::TextureFormat,
}

impl RibbonRenderer {
    /// `surface_size` is the presented size; `render_size` the resolution the
    /// scene is drawn at.
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        surface_size: (u32, u32),
        render_size: (u32, u32),
    ) -> Self {
        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame_uniforms"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let ribbon_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("ribbon_pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &material_layout],
            push_constant_ranges: &[],
        });

        let ribbon_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("ribbon_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::RIBBON_SHADER.into()),
        });

        let ribbon_pipeline = |label: &str, cull_mode: Option<wgpu::Face>| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&ribbon_layout),
                vertex: wgpu::VertexState {
                    module: &ribbon_shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<RibbonVertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x3,
                            1 => Float32x2,
                        ],
                    }],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &ribbon_shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode,
                    ..Default::default()
                },
                depth_stencil: Some(depth_state()),
                multisample: Default::default(),
                multiview: None,
                cache: None,
            })
        };

        // A material drawn on front faces culls back faces, and vice versa.
        let front_pipeline = ribbon_pipeline("ribbon_front_pipeline", Some(wgpu::Face::Back));
        let back_pipeline = ribbon_pipeline("ribbon_back_pipeline", Some(wgpu::Face::Front));

        let curve_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("curve_pipeline_layout"),
            bind_group_layouts: &[&frame_layout],
            push_constant_ranges: &[],
        });

        let curve_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("curve_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::CURVE_SHADER.into()),
        });

        let curve_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("curve_pipeline"),
            layout: Some(&curve_layout),
            vertex: wgpu::VertexState {
                module: &curve_shader,
                entry_point: Some("vs_curve"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 3]>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &curve_shader,
                entry_point: Some("fs_curve"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineStrip,
                ..Default::default()
            },
            depth_stencil: Some(depth_state()),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let blit_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("blit_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let blit_pipeline = Self::create_blit_pipeline(device, &blit_layout, surface_format);
        let blit_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("blit_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let mut renderer = Self {
            front_pipeline,
            back_pipeline,
            curve_pipeline,
            blit_pipeline,
            blit_layout,
            blit_sampler,
            frame_buffer,
            frame_bind_group,
            material_layout,
            materials: Vec::new(),
            geometry: None,
            depth_texture: Self::create_depth_texture(device, render_size),
            offscreen: None,
            surface_format,
        };
        renderer.resize(device, surface_size, render_size);
        renderer
    }

    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        surface_size: (u32, u32),
        render_size: (u32, u32),
    ) {
        let render_size = clamp_size(render_size);
        self.depth_texture = Self::create_depth_texture(device, render_size);
        self.offscreen = needs_offscreen(clamp_size(surface_size), render_size)
            .then(|| self.create_offscreen_target(device, render_size));
        tracing::debug!(
            ?surface_size,
            ?render_size,
            offscreen = self.offscreen.is_some(),
            "render targets resized"
        );
    }

    /// Upload whatever changed since the last frame: geometry when the
    /// generation moved, textures when a slot's asset changed, and all
    /// uniforms.
    pub fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, scene: &SceneContext) {
        if self
            .geometry
            .as_ref()
            .is_none_or(|g| g.generation != scene.generation())
        {
            self.geometry = Some(upload_geometry(device, scene));
            tracing::debug!(generation = scene.generation(), "uploaded ribbon geometry");
        }

        self.materials.resize_with(scene.materials.len(), || None);
        for (slot, material) in scene.materials.iter().enumerate() {
            let stale = self.materials[slot]
                .as_ref()
                .is_none_or(|m| m.texture_id != material.texture);
            if stale {
                let gpu = match scene.textures.get(material.texture) {
                    Some(texture) => Some(self.create_material(device, queue, material.texture, texture)),
                    None => {
                        tracing::warn!(slot, id = ?material.texture, "material texture missing");
                        None
                    }
                };
                self.materials[slot] = gpu;
            }
            if let Some(gpu) = &self.materials[slot] {
                queue.write_buffer(
                    &gpu.uniform_buffer,
                    0,
                    bytemuck::bytes_of(&MaterialUniforms::from_material(material)),
                );
            }
        }

        queue.write_buffer(
            &self.frame_buffer,
            0,
            bytemuck::bytes_of(&FrameUniforms::from_scene(scene)),
        );
    }

    /// Render one frame: ribbon groups, then the curve overlay if enabled,
    /// then the upscale to `view` when drawing offscreen.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        scene: &SceneContext,
    ) {
        self.prepare(device, queue, scene);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let bg = scene.background;
            let target = self.offscreen.as_ref().map_or(view, |o| &o.view);
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: bg.r as f64,
                            g: bg.g as f64,
                            b: bg.b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            if let Some(geometry) = &self.geometry {
                pass.set_bind_group(0, &self.frame_bind_group, &[]);

                if geometry.index_count > 0 {
                    pass.set_vertex_buffer(0, geometry.vertex_buffer.slice(..));
                    pass.set_index_buffer(geometry.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

                    for group in &scene.mesh().groups {
                        let slot = group.material_index as usize;
                        let (Some(material), Some(gpu)) =
                            (scene.materials.get(slot), self.materials.get(slot).and_then(Option::as_ref))
                        else {
                            continue;
                        };
                        let range = group.range();
                        let range = range.start.min(geometry.index_count)
                            ..range.end.min(geometry.index_count);
                        if range.is_empty() {
                            continue;
                        }
                        pass.set_pipeline(self.pipeline_for(material.side));
                        pass.set_bind_group(1, &gpu.bind_group, &[]);
                        pass.draw_indexed(range, 0, 0..1);
                    }
                }

                if scene.show_curve && geometry.curve_vertex_count > 1 {
                    pass.set_pipeline(&self.curve_pipeline);
                    pass.set_vertex_buffer(0, geometry.curve_buffer.slice(..));
                    pass.draw(0..geometry.curve_vertex_count, 0..1);
                }
            }
        }

        if let Some(offscreen) = &self.offscreen {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("blit_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });
            pass.set_pipeline(&self.blit_pipeline);
            pass.set_bind_group(0, &offscreen.bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn pipeline_for(&self, side: Side) -> &wgpu::RenderPipeline {
        match side {
            Side::Front => &self.front_pipeline,
            Side::Back => &self.back_pipeline,
        }
    }

    fn create_blit_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        color_format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("blit_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::BLIT_SHADER.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("blit_pipeline_layout"),
            bind_group_layouts: &[layout],
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("blit_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_blit"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_blit"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: Default::default(),
            multiview: None,
            cache: None,
        })
    }

    fn create_offscreen_target(&self, device: &wgpu::Device, size: (u32, u32)) -> OffscreenTarget {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen_color"),
            size: wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.surface_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&Default::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("blit_bind_group"),
            layout: &self.blit_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.blit_sampler),
                },
            ],
        });
        OffscreenTarget { view, bind_group }
    }

    fn create_material(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        id: AssetId,
        texture: &Texture,
    ) -> GpuMaterial {
        let size = wgpu::Extent3d {
            width: texture.width.max(1),
            height: texture.height.max(1),
            depth_or_array_layers: 1,
        };
        let gpu_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(texture.name.as_str()),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &gpu_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &texture.rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(texture.stride()),
                rows_per_image: Some(texture.height),
            },
            size,
        );
        let texture_view = gpu_texture.create_view(&Default::default());

        let settings = &texture.settings;
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("material_sampler"),
            address_mode_u: address_mode(settings.wrap_s),
            address_mode_v: address_mode(settings.wrap_t),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("material_uniforms"),
            contents: bytemuck::bytes_of(&MaterialUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("material_bind_group"),
            layout: &self.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&texture_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        tracing::debug!(name = %texture.name, width = texture.width, height = texture.height, "uploaded texture");

        GpuMaterial {
            texture_id: id,
            uniform_buffer,
            bind_group,
        }
    }

    fn create_depth_texture(device: &wgpu::Device, size: (u32, u32)) -> wgpu::TextureView {
        let (width, height) = clamp_size(size);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

fn upload_geometry(device: &wgpu::Device, scene: &SceneContext) -> GpuGeometry {
    let mesh = scene.mesh();
    let vertices: Vec<RibbonVertex> = mesh
        .positions
        .iter()
        .zip(&mesh.uvs)
        .map(|(p, uv)| RibbonVertex {
            position: p.to_array(),
            uv: uv.to_array(),
        })
        .collect();
    let curve: Vec<[f32; 3]> = scene.curve_line().iter().map(|p| p.to_array()).collect();

    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("ribbon_vertex_buffer"),
        contents: buffer_contents(&vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("ribbon_index_buffer"),
        contents: buffer_contents(&mesh.indices),
        usage: wgpu::BufferUsages::INDEX,
    });
    let curve_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("curve_vertex_buffer"),
        contents: buffer_contents(&curve),
        usage: wgpu::BufferUsages::VERTEX,
    });

    GpuGeometry {
        generation: scene.generation(),
        vertex_buffer,
        index_buffer,
        index_count: mesh.indices.len() as u32,
        curve_buffer,
        curve_vertex_count: curve.len() as u32,
    }
}

fn clamp_size(size: (u32, u32)) -> (u32, u32) {
    (size.0.max(1), size.1.max(1))
}

/// Whether the scene must be drawn offscreen and scaled to the surface.
fn needs_offscreen(surface_size: (u32, u32), render_size: (u32, u32)) -> bool {
    surface_size != render_size
}

/// Buffer bytes for `items`, or one zeroed element when empty.
fn buffer_contents<T: Pod>(items: &[T]) -> &[u8] {
    static PAD: [u8; 64] = [0; 64];
    if items.is_empty() {
        &PAD[..std::mem::size_of::<T>()]
    } else {
        bytemuck::cast_slice(items)
    }
}

fn depth_state() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: Default::default(),
        bias: Default::default(),
    }
}

fn address_mode(wrap: WrapMode) -> wgpu::AddressMode {
    match wrap {
        WrapMode::Repeat => wgpu::AddressMode::Repeat,
        WrapMode::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
        WrapMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ribbonscape_assets::TextureSettings;
    use ribbonscape_scene::SurfaceConfig;

    #[test]
    fn uniform_layouts_match_wgsl() {
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 192);
        assert_eq!(std::mem::size_of::<MaterialUniforms>(), 32);
        assert_eq!(std::mem::size_of::<RibbonVertex>(), 20);
    }

    #[test]
    fn material_uniforms_pack_uv_and_surface() {
        let material = Material::new(
            "back",
            AssetId(7),
            &TextureSettings::default().mirrored(),
            Side::Front,
            SurfaceConfig::default(),
        );
        let u = MaterialUniforms::from_material(&material);
        assert_eq!(u.uv_transform, [-1.0, 1.0, 0.5, 0.0]);
        assert_eq!(u.surface, [0.65, 0.25, 1.0, 1.0]);
    }

    #[test]
    fn wrap_modes_map_to_address_modes() {
        assert_eq!(address_mode(WrapMode::Repeat), wgpu::AddressMode::Repeat);
        assert_eq!(
            address_mode(WrapMode::MirroredRepeat),
            wgpu::AddressMode::MirrorRepeat
        );
        assert_eq!(
            address_mode(WrapMode::ClampToEdge),
            wgpu::AddressMode::ClampToEdge
        );
    }

    #[test]
    fn offscreen_only_when_render_size_differs() {
        assert!(!needs_offscreen((1600, 1200), (1600, 1200)));
        assert!(needs_offscreen((2400, 1800), (1600, 1200)));
        assert_eq!(clamp_size((0, 7)), (1, 7));
    }

    #[test]
    fn empty_buffers_get_one_zeroed_element() {
        let empty: [RibbonVertex; 0] = [];
        assert_eq!(buffer_contents(&empty), &[0u8; 20][..]);
        assert_eq!(buffer_contents(&[1u32, 2]).len(), 8);
    }
}
