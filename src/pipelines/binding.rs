//! Per-node and per-primitive GPU resources.
//!
//! Runs after every buffer view is resident. A primitive that cannot be
//! bound is dropped with a pipeline warning; nodes always bind.

use wgpu::util::DeviceExt;

use crate::{
    context::LoadContext,
    data_structures::{
        buffer_view::BufferView,
        material::Material,
        model::{IndexBinding, Mesh, Primitive, PrimitiveGpu},
        scene_graph::{Node, NodeGpu},
        texture::Image,
        transform::NodeUniform,
    },
    error::{LoadError, Result, Warning},
    pipelines::{
        basic::{PipelineCache, PipelineKey},
        layouts::{self, SceneLayouts},
    },
};

/// Pools a primitive's bindings are resolved against.
#[derive(Clone, Copy)]
pub struct BindingSources<'a> {
    pub materials: &'a [Material],
    pub images: &'a [Image],
    pub views: &'a [BufferView],
    pub sampler: &'a wgpu::Sampler,
}

pub fn build_node_gpu(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, node: &Node) -> NodeGpu {
    let label = node.name.as_deref().unwrap_or("node");
    let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{label} transform")),
        contents: bytemuck::cast_slice(&[NodeUniform::new(node.transform)]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform_buffer.as_entire_binding(),
        }],
        label: Some(&format!("{label} bind group")),
    });
    NodeGpu {
        uniform_buffer,
        bind_group,
    }
}

fn resident(views: &[BufferView], index: usize) -> Result<wgpu::Buffer> {
    views
        .get(index)
        .and_then(BufferView::gpu_buffer)
        .cloned()
        .ok_or_else(|| LoadError::Pipeline(format!("buffer view {index} is not resident")))
}

fn image<'a>(images: &'a [Image], index: usize) -> Result<&'a Image> {
    images
        .get(index)
        .ok_or_else(|| LoadError::Pipeline(format!("image {index} does not exist")))
}

fn material_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    material: &Material,
    sources: BindingSources<'_>,
) -> Result<wgpu::BindGroup> {
    let base_color = image(sources.images, material.base_color)?;
    let normal = image(sources.images, material.normal)?;
    let occlusion = image(sources.images, material.occlusion)?;
    let emissive = image(sources.images, material.emissive)?;
    let metallic_roughness = image(sources.images, material.metallic_roughness)?;

    Ok(device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: layouts::SAMPLER_BINDING,
                resource: wgpu::BindingResource::Sampler(sources.sampler),
            },
            wgpu::BindGroupEntry {
                binding: layouts::BASE_COLOR_BINDING,
                resource: wgpu::BindingResource::TextureView(&base_color.gpu.srgb_view),
            },
            wgpu::BindGroupEntry {
                binding: layouts::NORMAL_BINDING,
                resource: wgpu::BindingResource::TextureView(&normal.gpu.view),
            },
            wgpu::BindGroupEntry {
                binding: layouts::OCCLUSION_BINDING,
                resource: wgpu::BindingResource::TextureView(&occlusion.gpu.view),
            },
            wgpu::BindGroupEntry {
                binding: layouts::EMISSIVE_BINDING,
                resource: wgpu::BindingResource::TextureView(&emissive.gpu.srgb_view),
            },
            wgpu::BindGroupEntry {
                binding: layouts::METALLIC_ROUGHNESS_BINDING,
                resource: wgpu::BindingResource::TextureView(&metallic_roughness.gpu.view),
            },
            wgpu::BindGroupEntry {
                binding: layouts::PARAMS_BINDING,
                resource: material.params_buffer(device).as_entire_binding(),
            },
        ],
        label: Some(&format!("{} bind group", material.name)),
    }))
}

/// Builds the pipeline, material bind group and buffer bindings of one
/// primitive.
///
/// Fails when the primitive has no resolvable material or reads a buffer
/// view that was never uploaded.
pub fn build_primitive_gpu(
    ctx: &LoadContext<'_>,
    layouts: &SceneLayouts,
    cache: &mut PipelineCache,
    primitive: &Primitive,
    sources: BindingSources<'_>,
) -> Result<PrimitiveGpu> {
    let material = primitive
        .material
        .and_then(|index| sources.materials.get(index))
        .ok_or_else(|| LoadError::Pipeline("primitive has no material".to_string()))?;

    let vertex_buffers = primitive
        .vertex_attributes()
        .map(|(_, accessor)| {
            Ok((
                resident(sources.views, accessor.view)?,
                accessor.byte_offset as wgpu::BufferAddress,
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    let index_buffer = match &primitive.indices {
        Some(indices) => Some(IndexBinding {
            buffer: resident(sources.views, indices.view)?,
            offset: indices.byte_offset as wgpu::BufferAddress,
            size: (indices.count * indices.element_size()) as wgpu::BufferAddress,
            format: indices.index_format()?,
        }),
        None => None,
    };

    let key = PipelineKey::for_primitive(primitive)?;
    let material_bind_group = material_bind_group(ctx.device, &layouts.material, material, sources)?;
    let pipeline = cache.get_or_create(ctx, layouts, key);

    Ok(PrimitiveGpu {
        pipeline,
        material_bind_group,
        vertex_buffers,
        index_buffer,
    })
}

/// Binds every primitive and node of a scene.
///
/// Primitives that fail are removed from their mesh and reported through
/// `warnings`; the mesh keeps the rest.
pub fn bind_scene(
    ctx: &LoadContext<'_>,
    layouts: &SceneLayouts,
    cache: &mut PipelineCache,
    meshes: &mut [Mesh],
    nodes: &mut [Node],
    sources: BindingSources<'_>,
    warnings: &mut Vec<Warning>,
) {
    for mesh in meshes.iter_mut() {
        let name = &mesh.name;
        mesh.primitives = std::mem::take(&mut mesh.primitives)
            .into_iter()
            .enumerate()
            .filter_map(|(index, mut primitive)| {
                match build_primitive_gpu(ctx, layouts, cache, &primitive, sources) {
                    Ok(gpu) => {
                        primitive.gpu = Some(gpu);
                        Some(primitive)
                    }
                    Err(err) => {
                        Warning::Pipeline(format!("{name} primitive {index}: {err}")).raise(warnings);
                        None
                    }
                }
            })
            .collect();
    }

    for node in nodes.iter_mut() {
        node.gpu = Some(build_node_gpu(ctx.device, &layouts.node, node));
    }
}
