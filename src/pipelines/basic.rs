use std::collections::HashMap;

use crate::{
    context::LoadContext,
    data_structures::model::{Primitive, Topology},
    error::Result,
    pipelines::layouts::SceneLayouts,
};

/// One vertex buffer: a single attribute at offset zero.
///
/// Accessor offsets are applied when the buffer is bound, so primitives that
/// read interleaved and tightly packed data can share a layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VertexSlot {
    pub location: u32,
    pub format: wgpu::VertexFormat,
    pub stride: wgpu::BufferAddress,
}

/// Everything about a primitive that changes its render pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub slots: Vec<VertexSlot>,
    pub topology: Topology,
    pub strip_index_format: Option<wgpu::IndexFormat>,
}

impl PipelineKey {
    pub fn for_primitive(primitive: &Primitive) -> Result<Self> {
        let slots = primitive
            .vertex_attributes()
            .map(|(location, accessor)| {
                Ok(VertexSlot {
                    location,
                    format: accessor.wgpu_vertex_format()?,
                    stride: accessor.byte_stride() as wgpu::BufferAddress,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let strip_index_format = match (primitive.topology, &primitive.indices) {
            (Topology::TriangleStrip, Some(indices)) => Some(indices.index_format()?),
            _ => None,
        };
        Ok(Self {
            slots,
            topology: primitive.topology,
            strip_index_format,
        })
    }
}

/// Render pipelines shared by every primitive with the same [`PipelineKey`].
#[derive(Debug)]
pub struct PipelineCache {
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    cull_mode: Option<wgpu::Face>,
}

impl PipelineCache {
    pub fn new(cull_mode: Option<wgpu::Face>) -> Self {
        Self {
            pipelines: HashMap::new(),
            cull_mode,
        }
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    pub fn get_or_create(
        &mut self,
        ctx: &LoadContext<'_>,
        layouts: &SceneLayouts,
        key: PipelineKey,
    ) -> wgpu::RenderPipeline {
        if let Some(pipeline) = self.pipelines.get(&key) {
            log::debug!("reusing pipeline for {:?}", key);
            return pipeline.clone();
        }
        let attributes: Vec<[wgpu::VertexAttribute; 1]> = key
            .slots
            .iter()
            .map(|slot| {
                [wgpu::VertexAttribute {
                    format: slot.format,
                    offset: 0,
                    shader_location: slot.location,
                }]
            })
            .collect();
        let vertex_layouts: Vec<wgpu::VertexBufferLayout> = key
            .slots
            .iter()
            .zip(&attributes)
            .map(|(slot, attributes)| wgpu::VertexBufferLayout {
                array_stride: slot.stride,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes,
            })
            .collect();

        let pipeline = mk_render_pipeline(
            ctx.device,
            &layouts.pipeline,
            ctx.color_format,
            Some(wgpu::BlendState::REPLACE),
            ctx.depth_format,
            &vertex_layouts,
            ctx.shader,
            wgpu::PrimitiveState {
                topology: key.topology.to_wgpu(),
                strip_index_format: key.strip_index_format,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: self.cull_mode,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
        );
        self.pipelines.insert(key, pipeline.clone());
        pipeline
    }
}

#[allow(clippy::too_many_arguments)]
pub fn mk_render_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    depth_format: Option<wgpu::TextureFormat>,
    vertex_layouts: &[wgpu::VertexBufferLayout],
    shader: &wgpu::ShaderModule,
    primitive: wgpu::PrimitiveState,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some("Scene Render Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive,
        depth_stencil: depth_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: Some(true),
            depth_compare: Some(wgpu::CompareFunction::Less),
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview_mask: None,
    })
}
