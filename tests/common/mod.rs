#![allow(dead_code)]

use std::{io::Cursor, path::PathBuf};

use flow_glb::{
    context::{LoadContext, LoadOptions},
    glb::write_glb,
    pipelines::layouts::view_bind_group_layout,
};
use serde_json::{Value, json};
use wgpu::util::DeviceExt;

/// Position-only shader. It declares every material binding the loader
/// provides but only samples the base colour.
pub const SHADER: &str = r#"
struct View {
    view_proj: mat4x4<f32>,
};
@group(0) @binding(0) var<uniform> view: View;

struct Node {
    model: mat4x4<f32>,
    normal: mat4x4<f32>,
};
@group(1) @binding(0) var<uniform> node: Node;

struct MaterialParams {
    base_color_factor: vec4<f32>,
    emissive_factor: vec3<f32>,
    metallic_factor: f32,
    roughness_factor: f32,
};
@group(2) @binding(0) var material_sampler: sampler;
@group(2) @binding(1) var base_color: texture_2d<f32>;
@group(2) @binding(2) var normal_map: texture_2d<f32>;
@group(2) @binding(3) var occlusion: texture_2d<f32>;
@group(2) @binding(4) var emissive: texture_2d<f32>;
@group(2) @binding(5) var metallic_roughness: texture_2d<f32>;
@group(2) @binding(6) var<uniform> material: MaterialParams;

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return view.view_proj * node.model * vec4<f32>(position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    let uv = vec2<f32>(0.5, 0.5);
    let color = textureSample(base_color, material_sampler, uv) * material.base_color_factor;
    return vec4<f32>(color.rgb + material.emissive_factor, color.a);
}
"#;

pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn asset_options() -> LoadOptions {
    LoadOptions::default().with_asset_root(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets"))
}

/// Headless device plus the renderer-side objects a load needs.
pub struct Gpu {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub shader: wgpu::ShaderModule,
    pub view_layout: wgpu::BindGroupLayout,
    pub view_bind_group: wgpu::BindGroup,
}

impl Gpu {
    /// `None` when the machine has no usable adapter; callers skip the test.
    pub async fn new() -> Option<Self> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok()?;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("test device"),
                required_limits: adapter.limits(),
                ..Default::default()
            })
            .await
            .ok()?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("test shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER.into()),
        });
        let view_layout = view_bind_group_layout(&device);
        let identity: [[f32; 4]; 4] = [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        let view_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("view buffer"),
            contents: bytemuck::cast_slice(&identity),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let view_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &view_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: view_buffer.as_entire_binding(),
            }],
            label: Some("view bind group"),
        });
        Some(Self {
            device,
            queue,
            shader,
            view_layout,
            view_bind_group,
        })
    }

    pub fn ctx(&self) -> LoadContext<'_> {
        LoadContext::new(
            &self.device,
            &self.queue,
            &self.shader,
            &self.view_layout,
            COLOR_FORMAT,
        )
    }
}

/// Assembles a GLB from a JSON description and binary views.
#[derive(Default)]
pub struct GlbBuilder {
    bin: Vec<u8>,
    views: Vec<Value>,
}

impl GlbBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a 4-byte aligned buffer view and returns its index.
    pub fn view(&mut self, bytes: &[u8], stride: Option<usize>) -> usize {
        self.bin.resize(self.bin.len().next_multiple_of(4), 0);
        let mut view = json!({
            "buffer": 0,
            "byteOffset": self.bin.len(),
            "byteLength": bytes.len(),
        });
        if let Some(stride) = stride {
            view["byteStride"] = json!(stride);
        }
        self.bin.extend_from_slice(bytes);
        self.views.push(view);
        self.views.len() - 1
    }

    pub fn finish(self, mut document: Value) -> Vec<u8> {
        document["asset"] = json!({"version": "2.0"});
        document["buffers"] = json!([{"byteLength": self.bin.len()}]);
        document["bufferViews"] = Value::Array(self.views);
        let json = serde_json::to_vec(&document).unwrap();
        write_glb(&json, &self.bin)
    }
}

pub fn f32_bytes(values: &[f32]) -> Vec<u8> {
    bytemuck::cast_slice(values).to_vec()
}

pub fn u16_bytes(values: &[u16]) -> Vec<u8> {
    bytemuck::cast_slice(values).to_vec()
}

pub fn png(rgba: [u8; 4]) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(2, 2, image::Rgba(rgba)))
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

/// One textured triangle under a translated parent node.
///
/// Views: 0 positions, 1 normals, 2 uvs, 3 indices, 4 embedded PNG,
/// 5 a view nothing references.
pub fn textured_triangle() -> GlbBuilder {
    let mut builder = GlbBuilder::new();
    builder.view(
        &f32_bytes(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]),
        None,
    );
    builder.view(&f32_bytes(&[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]), None);
    builder.view(&f32_bytes(&[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]), None);
    builder.view(&u16_bytes(&[0, 1, 2]), None);
    builder.view(&png([200, 10, 10, 255]), None);
    builder.view(&[0u8; 16], None);
    builder
}

pub fn textured_triangle_document(primitives: Value) -> Value {
    json!({
        "accessors": [
            {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3"},
            {"bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC3"},
            {"bufferView": 2, "componentType": 5126, "count": 3, "type": "VEC2"},
            {"bufferView": 3, "componentType": 5123, "count": 3, "type": "SCALAR"}
        ],
        "images": [{"name": "albedo", "bufferView": 4, "mimeType": "image/png"}],
        "textures": [{"source": 0}],
        "materials": [{
            "name": "painted",
            "pbrMetallicRoughness": {
                "baseColorTexture": {"index": 0},
                "baseColorFactor": [1.0, 0.5, 0.5, 1.0]
            }
        }],
        "meshes": [{"name": "triangle", "primitives": primitives}],
        "nodes": [
            {"name": "root", "translation": [1.0, 0.0, 0.0], "children": [1]},
            {"name": "leaf", "translation": [0.0, 2.0, 0.0], "mesh": 0}
        ],
        "scenes": [{"nodes": [0]}],
        "scene": 0
    })
}

pub fn textured_triangle_glb() -> Vec<u8> {
    textured_triangle().finish(textured_triangle_document(json!([{
        "attributes": {"POSITION": 0, "NORMAL": 1, "TEXCOORD_0": 2},
        "indices": 3,
        "material": 0
    }])))
}
