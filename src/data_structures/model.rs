//! Meshes and primitives.
//!
//! Primitives are assembled from the scene description before anything
//! touches the GPU: every accessor they need is checked here, and only
//! primitives that pass claim usage on their buffer views. A primitive that
//! fails is dropped with a diagnostic while its mesh keeps the rest.

use crate::{
    data_structures::{accessor::Accessor, buffer_view::BufferView},
    error::{LoadError, Result, Warning},
    glb::schema::{Document, PrimitiveDescriptor},
    pipelines::layouts::MATERIAL_GROUP,
};

/// Shader attribute locations.
pub const POSITION_LOCATION: u32 = 0;
pub const NORMAL_LOCATION: u32 = 1;
pub const TEX_COORD_LOCATION: u32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topology {
    TriangleList,
    TriangleStrip,
}

impl Topology {
    /// Maps a glTF primitive mode. Only 4 (list) and 5 (strip) are drawable.
    pub fn from_mode(mode: u32) -> Result<Self> {
        match mode {
            4 => Ok(Self::TriangleList),
            5 => Ok(Self::TriangleStrip),
            other => {
                let name = match other {
                    0 => "points",
                    1 => "lines",
                    2 => "line loop",
                    3 => "line strip",
                    6 => "triangle fan",
                    _ => "unknown",
                };
                Err(LoadError::Pipeline(format!(
                    "primitive mode {other} ({name}) is not supported"
                )))
            }
        }
    }

    pub fn to_wgpu(self) -> wgpu::PrimitiveTopology {
        match self {
            Self::TriangleList => wgpu::PrimitiveTopology::TriangleList,
            Self::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        }
    }
}

/// GPU state of a primitive, filled in by the pipeline builder.
#[derive(Debug)]
pub struct PrimitiveGpu {
    pub pipeline: wgpu::RenderPipeline,
    pub material_bind_group: wgpu::BindGroup,
    /// One buffer per attribute slot, with the accessor's byte offset.
    pub vertex_buffers: Vec<(wgpu::Buffer, wgpu::BufferAddress)>,
    pub index_buffer: Option<IndexBinding>,
}

#[derive(Debug)]
pub struct IndexBinding {
    pub buffer: wgpu::Buffer,
    pub offset: wgpu::BufferAddress,
    pub size: wgpu::BufferAddress,
    pub format: wgpu::IndexFormat,
}

#[derive(Debug)]
pub struct Primitive {
    pub positions: Accessor,
    pub normals: Option<Accessor>,
    pub tex_coords: Option<Accessor>,
    pub indices: Option<Accessor>,
    pub topology: Topology,
    pub material: Option<usize>,
    pub gpu: Option<PrimitiveGpu>,
    draw_count: u32,
}

impl Primitive {
    /// Validates a primitive description against the resolved accessors.
    pub fn assemble(
        descriptor: &PrimitiveDescriptor,
        accessors: &[Option<Accessor>],
        material_count: usize,
    ) -> Result<Self> {
        let topology = Topology::from_mode(descriptor.mode())?;

        let lookup = |semantic: &str, index: usize| -> Result<Accessor> {
            accessors.get(index).cloned().flatten().ok_or_else(|| {
                LoadError::Pipeline(format!(
                    "{semantic} accessor {index} is missing or has no buffer view"
                ))
            })
        };
        let attribute = |semantic: &str| -> Result<Option<Accessor>> {
            let Some(index) = descriptor.attribute(semantic) else {
                return Ok(None);
            };
            let accessor = lookup(semantic, index)?;
            accessor.wgpu_vertex_format()?;
            Ok(Some(accessor))
        };

        let positions = attribute("POSITION")?.ok_or_else(|| {
            LoadError::Pipeline("primitive has no POSITION attribute".to_string())
        })?;
        let normals = attribute("NORMAL")?;
        let tex_coords = attribute("TEXCOORD_0")?;
        let indices = match descriptor.indices {
            Some(index) => {
                let accessor = lookup("index", index)?;
                accessor.index_format()?;
                Some(accessor)
            }
            None => None,
        };

        let draw_count = checked_draw_count(indices.as_ref().unwrap_or(&positions).count)?;

        match descriptor.material {
            Some(material) if material < material_count => {}
            Some(material) => {
                return Err(LoadError::Pipeline(format!(
                    "material {material} does not exist"
                )));
            }
            None => {
                return Err(LoadError::Pipeline(
                    "primitive has no material".to_string(),
                ));
            }
        }

        Ok(Self {
            positions,
            normals,
            tex_coords,
            indices,
            topology,
            material: descriptor.material,
            gpu: None,
            draw_count,
        })
    }

    /// Vertex attributes in slot order: position, then normal and UV if present.
    pub fn vertex_attributes(&self) -> impl Iterator<Item = (u32, &Accessor)> {
        [
            (POSITION_LOCATION, Some(&self.positions)),
            (NORMAL_LOCATION, self.normals.as_ref()),
            (TEX_COORD_LOCATION, self.tex_coords.as_ref()),
        ]
        .into_iter()
        .filter_map(|(location, accessor)| accessor.map(|a| (location, a)))
    }

    /// Claims the buffer views this primitive reads.
    fn claim_views(&self, views: &mut [BufferView]) {
        for (_, accessor) in self.vertex_attributes() {
            views[accessor.view].add_usage(wgpu::BufferUsages::VERTEX);
        }
        if let Some(indices) = &self.indices {
            views[indices.view].add_usage(wgpu::BufferUsages::INDEX);
        }
    }

    /// Number of vertices (or indices) one draw call covers.
    pub fn draw_count(&self) -> u32 {
        self.draw_count
    }

    /// Binds this primitive's pipeline and resources, then draws it.
    ///
    /// Slots 0 (view) and 1 (node) must already be bound.
    pub fn render(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        let Some(gpu) = &self.gpu else {
            return;
        };
        render_pass.set_pipeline(&gpu.pipeline);
        render_pass.set_bind_group(MATERIAL_GROUP, &gpu.material_bind_group, &[]);
        for (slot, (buffer, offset)) in gpu.vertex_buffers.iter().enumerate() {
            render_pass.set_vertex_buffer(slot as u32, buffer.slice(*offset..));
        }
        match &gpu.index_buffer {
            Some(index) => {
                render_pass.set_index_buffer(
                    index.buffer.slice(index.offset..index.offset + index.size),
                    index.format,
                );
                render_pass.draw_indexed(0..self.draw_count(), 0, 0..1);
            }
            None => render_pass.draw(0..self.draw_count(), 0..1),
        }
    }
}

/// Vertex or index count of one draw call, which the GPU takes as `u32`.
fn checked_draw_count(count: usize) -> Result<u32> {
    u32::try_from(count).map_err(|_| {
        LoadError::Pipeline(format!(
            "{count} elements exceed the {} a single draw call can cover",
            u32::MAX
        ))
    })
}

#[derive(Debug)]
pub struct Mesh {
    pub name: String,
    pub primitives: Vec<Primitive>,
}

/// Resolves every accessor that is backed by a buffer view.
///
/// Unknown shapes or component types are fatal. Accessors without a buffer
/// view stay `None`; primitives that reference them are dropped later.
pub fn resolve_accessors(document: &Document, views: &[BufferView]) -> Result<Vec<Option<Accessor>>> {
    document
        .accessors
        .iter()
        .enumerate()
        .map(|(index, descriptor)| {
            let Some(view_index) = descriptor.buffer_view else {
                return Ok(None);
            };
            let view = views.get(view_index).ok_or_else(|| {
                LoadError::Schema(format!(
                    "accessor {index} references missing buffer view {view_index}"
                ))
            })?;
            Accessor::resolve(view, descriptor)
                .map(Some)
                .map_err(|err| match err {
                    LoadError::Schema(msg) => LoadError::Schema(format!("accessor {index}: {msg}")),
                    other => other,
                })
        })
        .collect()
}

/// Assembles every mesh of the document, claiming buffer views as it goes.
///
/// The returned list is index-aligned with `document.meshes`; meshes whose
/// primitives were all dropped are kept empty.
pub fn assemble_meshes(
    document: &Document,
    accessors: &[Option<Accessor>],
    views: &mut [BufferView],
    material_count: usize,
    warnings: &mut Vec<Warning>,
) -> Vec<Mesh> {
    document
        .meshes
        .iter()
        .enumerate()
        .map(|(mesh_index, descriptor)| {
            let name = descriptor
                .name
                .clone()
                .unwrap_or_else(|| format!("mesh {mesh_index}"));
            let primitives = descriptor
                .primitives
                .iter()
                .enumerate()
                .filter_map(|(primitive_index, primitive)| {
                    match Primitive::assemble(primitive, accessors, material_count) {
                        Ok(primitive) => {
                            primitive.claim_views(views);
                            Some(primitive)
                        }
                        Err(err) => {
                            Warning::Pipeline(format!("{name} primitive {primitive_index}: {err}"))
                                .raise(warnings);
                            None
                        }
                    }
                })
                .collect();
            Mesh { name, primitives }
        })
        .collect()
}
