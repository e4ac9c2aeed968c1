//! Materials: five texture channels plus a small parameter block.
//!
//! Every channel resolves to an image in the scene pool. Omitted channels
//! use the placeholder for their kind, and a reference that cannot be
//! resolved degrades to the same placeholder with a resource warning.

use std::sync::OnceLock;

use wgpu::util::DeviceExt;

use crate::{
    data_structures::texture::{DefaultImages, Texture},
    error::Warning,
    glb::schema::{MaterialDescriptor, TextureInfo},
};

/// The uniform block bound next to a material's textures.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialParams {
    pub base_color_factor: [f32; 4],
    pub emissive_factor: [f32; 3],
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    _padding: [f32; 3],
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            base_color_factor: [1.0; 4],
            emissive_factor: [0.0; 3],
            metallic_factor: 1.0,
            roughness_factor: 1.0,
            _padding: [0.0; 3],
        }
    }
}

#[derive(Debug)]
pub struct Material {
    pub name: String,
    pub base_color: usize,
    pub normal: usize,
    pub occlusion: usize,
    pub emissive: usize,
    pub metallic_roughness: usize,
    pub params: MaterialParams,
    params_buffer: OnceLock<wgpu::Buffer>,
}

impl Material {
    /// Resolves `descriptor` against the texture pool.
    ///
    /// Never fails: anything unresolvable falls back to a placeholder and
    /// is reported through `warnings`.
    pub fn build(
        index: usize,
        descriptor: &MaterialDescriptor,
        textures: &[Texture],
        defaults: DefaultImages,
        warnings: &mut Vec<Warning>,
    ) -> Self {
        let name = descriptor
            .name
            .clone()
            .unwrap_or_else(|| format!("material {index}"));
        let mut channel = |info: Option<TextureInfo>, fallback: usize, kind: &str| {
            resolve_channel(&name, info, textures, fallback, kind, warnings)
        };

        let normal = channel(descriptor.normal_texture, defaults.normal, "normal");
        let occlusion = channel(descriptor.occlusion_texture, defaults.white, "occlusion");
        let emissive = channel(descriptor.emissive_texture, defaults.black, "emissive");

        let mut params = MaterialParams::default();
        if let Some(emissive_factor) = descriptor.emissive_factor {
            params.emissive_factor = emissive_factor;
        }

        let (base_color, metallic_roughness) = match &descriptor.pbr_metallic_roughness {
            Some(pbr) => {
                if let Some(factor) = pbr.base_color_factor {
                    params.base_color_factor = factor;
                }
                if let Some(metallic) = pbr.metallic_factor {
                    params.metallic_factor = metallic;
                }
                if let Some(roughness) = pbr.roughness_factor {
                    params.roughness_factor = roughness;
                }
                (
                    channel(pbr.base_color_texture, defaults.white, "base color"),
                    channel(
                        pbr.metallic_roughness_texture,
                        defaults.black,
                        "metallic-roughness",
                    ),
                )
            }
            None => {
                Warning::Resource(format!(
                    "{name} has no pbrMetallicRoughness block, using default base color and metallic-roughness"
                ))
                .raise(warnings);
                (defaults.white, defaults.black)
            }
        };

        Self {
            name,
            base_color,
            normal,
            occlusion,
            emissive,
            metallic_roughness,
            params,
            params_buffer: OnceLock::new(),
        }
    }

    /// The parameter uniform buffer, created on first use.
    pub fn params_buffer(&self, device: &wgpu::Device) -> &wgpu::Buffer {
        self.params_buffer.get_or_init(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} params", self.name)),
                contents: bytemuck::bytes_of(&self.params),
                usage: wgpu::BufferUsages::UNIFORM,
            })
        })
    }
}

fn resolve_channel(
    material: &str,
    info: Option<TextureInfo>,
    textures: &[Texture],
    fallback: usize,
    kind: &str,
    warnings: &mut Vec<Warning>,
) -> usize {
    let Some(TextureInfo { index }) = info else {
        return fallback;
    };
    match textures.get(index).and_then(|texture| texture.image) {
        Some(image) => image,
        None => {
            Warning::Resource(format!(
                "{material} references {kind} texture {index} which cannot be resolved"
            ))
            .raise(warnings);
            fallback
        }
    }
}
