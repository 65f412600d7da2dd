/// WGSL shader for the textured, lit ribbon surface.
///
/// Group 0 holds per-frame uniforms, group 1 one material slot.
pub const RIBBON_SHADER: &str = r#"
const PI: f32 = 3.14159265;

struct Frame {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    camera_position: vec4<f32>,
    ambient: vec4<f32>,
    light_direction: vec4<f32>,
    light_color: vec4<f32>,
};

struct MaterialParams {
    // repeat.xy, offset.xy
    uv_transform: vec4<f32>,
    // roughness, metalness, alpha cutoff, flat shading flag
    surface: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: Frame;

@group(1) @binding(0)
var<uniform> material: MaterialParams;
@group(1) @binding(1)
var albedo_texture: texture_2d<f32>;
@group(1) @binding(2)
var albedo_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) sphere_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    let world = frame.model * vec4<f32>(vertex.position, 1.0);

    var out: VertexOutput;
    out.clip_position = frame.view_proj * world;
    out.world_position = world.xyz;
    // Ribbon vertices lie on the unit sphere, so the radial direction is
    // the smooth surface normal.
    out.sphere_normal = (frame.model * vec4<f32>(vertex.position, 0.0)).xyz;
    out.uv = vertex.uv * material.uv_transform.xy + material.uv_transform.zw;
    return out;
}

fn distribution_ggx(n_dot_h: f32, roughness: f32) -> f32 {
    let a = roughness * roughness;
    let a2 = a * a;
    let d = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    return a2 / (PI * d * d);
}

fn fresnel_schlick(v_dot_h: f32, f0: vec3<f32>) -> vec3<f32> {
    return f0 + (vec3<f32>(1.0) - f0) * pow(1.0 - v_dot_h, 5.0);
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    // Derivatives and sampling stay in uniform control flow, before discard.
    let face_normal = normalize(cross(dpdx(in.world_position), dpdy(in.world_position)));
    let albedo = textureSample(albedo_texture, albedo_sampler, in.uv);

    let roughness = clamp(material.surface.x, 0.04, 1.0);
    let metalness = clamp(material.surface.y, 0.0, 1.0);
    let alpha_cutoff = material.surface.z;
    let flat_shading = material.surface.w > 0.5;

    var n = normalize(in.sphere_normal);
    if flat_shading {
        n = face_normal;
    }
    let v = normalize(frame.camera_position.xyz - in.world_position);
    // Light whichever side of the strip faces the viewer.
    if dot(n, v) < 0.0 {
        n = -n;
    }

    let l = normalize(frame.light_direction.xyz);
    let h = normalize(l + v);
    let n_dot_l = max(dot(n, l), 0.0);
    let n_dot_h = max(dot(n, h), 0.0);
    let v_dot_h = max(dot(v, h), 0.0);

    let diffuse_color = albedo.rgb * (1.0 - metalness);
    let f0 = mix(vec3<f32>(0.04), albedo.rgb, metalness);
    let fresnel = fresnel_schlick(v_dot_h, f0);
    // Kelemen visibility approximation.
    let visibility = 0.25 / max(v_dot_h * v_dot_h, 1e-4);
    let specular = fresnel * distribution_ggx(n_dot_h, roughness) * visibility;

    let direct = (diffuse_color / PI + specular) * frame.light_color.rgb * n_dot_l;
    let indirect = diffuse_color / PI * frame.ambient.rgb;
    let color = direct + indirect;

    if albedo.a < alpha_cutoff {
        discard;
    }
    return vec4<f32>(color, 1.0);
}
"#;

/// WGSL shader for the debug curve polyline.
pub const CURVE_SHADER: &str = r#"
struct Frame {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    camera_position: vec4<f32>,
    ambient: vec4<f32>,
    light_direction: vec4<f32>,
    light_color: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: Frame;

@vertex
fn vs_curve(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return frame.view_proj * frame.model * vec4<f32>(position, 1.0);
}

@fragment
fn fs_curve() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 0.0, 0.0, 1.0);
}
"#;

/// WGSL shader that stretches an offscreen color target over the surface
/// with one fullscreen triangle.
pub const BLIT_SHADER: &str = r#"
@group(0) @binding(0)
var source_texture: texture_2d<f32>;
@group(0) @binding(1)
var source_sampler: sampler;

struct BlitOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_blit(@builtin(vertex_index) index: u32) -> BlitOutput {
    let uv = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    var out: BlitOutput;
    out.clip_position = vec4<f32>(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0, 0.0, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs_blit(in: BlitOutput) -> @location(0) vec4<f32> {
    return textureSample(source_texture, source_sampler, in.uv);
}
"#;
