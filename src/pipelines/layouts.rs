//! Bind-group layouts in fixed slot order.
//!
//! | slot | group | owner |
//! |------|-------|-------|
//! | 0 | view/projection uniform | the renderer |
//! | 1 | node transform uniform | one per flattened node |
//! | 2 | sampler, five textures, material parameters | one per primitive |

pub const VIEW_GROUP: u32 = 0;
pub const NODE_GROUP: u32 = 1;
pub const MATERIAL_GROUP: u32 = 2;

/// Material bindings: the sampler first, then one texture per channel,
/// then the parameter block.
pub const SAMPLER_BINDING: u32 = 0;
pub const BASE_COLOR_BINDING: u32 = 1;
pub const NORMAL_BINDING: u32 = 2;
pub const OCCLUSION_BINDING: u32 = 3;
pub const EMISSIVE_BINDING: u32 = 4;
pub const METALLIC_ROUGHNESS_BINDING: u32 = 5;
pub const PARAMS_BINDING: u32 = 6;

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    }
}

/// Slot 0 layout for renderers that do not bring their own.
///
/// A single uniform buffer visible to both stages, e.g. a view-projection
/// matrix.
pub fn view_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[uniform_entry(
            0,
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        )],
        label: Some("view_bind_group_layout"),
    })
}

pub fn node_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[uniform_entry(
            0,
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        )],
        label: Some("node_bind_group_layout"),
    })
}

pub fn material_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: SAMPLER_BINDING,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            texture_entry(BASE_COLOR_BINDING),
            texture_entry(NORMAL_BINDING),
            texture_entry(OCCLUSION_BINDING),
            texture_entry(EMISSIVE_BINDING),
            texture_entry(METALLIC_ROUGHNESS_BINDING),
            uniform_entry(PARAMS_BINDING, wgpu::ShaderStages::FRAGMENT),
        ],
        label: Some("material_bind_group_layout"),
    })
}

/// The node and material layouts of one scene plus the pipeline layout that
/// combines them with the renderer's view layout.
#[derive(Debug)]
pub struct SceneLayouts {
    pub node: wgpu::BindGroupLayout,
    pub material: wgpu::BindGroupLayout,
    pub pipeline: wgpu::PipelineLayout,
}

impl SceneLayouts {
    pub fn new(device: &wgpu::Device, view_layout: &wgpu::BindGroupLayout) -> Self {
        let node = node_bind_group_layout(device);
        let material = material_bind_group_layout(device);
        let pipeline = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[Some(view_layout), Some(&node), Some(&material)],
            immediate_size: 0,
        });
        Self {
            node,
            material,
            pipeline,
        }
    }
}
