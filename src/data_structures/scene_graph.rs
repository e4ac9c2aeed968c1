//! Scene graph flattening and the loaded [`Scene`].
//!
//! The node hierarchy of a scene description only exists to compose
//! transforms. [`flatten`] walks it depth-first, bakes every parent
//! transform into its children and returns a flat list; after that the
//! renderer never sees a tree again.

use cgmath::SquareMatrix;

use crate::{
    data_structures::{
        buffer_view::BufferView,
        material::Material,
        model::Mesh,
        texture::{DefaultImages, Image, Texture},
        transform::local_matrix,
    },
    error::{LoadError, Result, Warning},
    glb::schema::{Document, NodeDescriptor},
    pipelines::layouts::{NODE_GROUP, VIEW_GROUP},
};

/// One visited node with its absolute transform.
#[derive(Clone, Debug, PartialEq)]
pub struct FlatNode {
    /// Index of the source node in the scene description.
    pub source: usize,
    pub name: Option<String>,
    pub transform: cgmath::Matrix4<f32>,
    pub mesh: Option<usize>,
}

/// Flattens the subtree under `root`, pre-order.
///
/// Every visited node is emitted, including grouping nodes without a mesh,
/// so children never inherit a mesh from their parent. A child index that
/// is out of range or reached twice is a schema error.
pub fn flatten(nodes: &[NodeDescriptor], root: usize) -> Result<Vec<FlatNode>> {
    let mut visited = vec![false; nodes.len()];
    let mut out = Vec::new();
    visit(nodes, root, cgmath::Matrix4::identity(), &mut visited, &mut out)?;
    Ok(out)
}

fn visit(
    nodes: &[NodeDescriptor],
    index: usize,
    parent: cgmath::Matrix4<f32>,
    visited: &mut [bool],
    out: &mut Vec<FlatNode>,
) -> Result<()> {
    let node = nodes
        .get(index)
        .ok_or_else(|| LoadError::Schema(format!("node {index} does not exist")))?;
    if std::mem::replace(&mut visited[index], true) {
        return Err(LoadError::Schema(format!(
            "node {index} is reachable more than once, the node graph is not a tree"
        )));
    }

    let transform = parent * local_matrix(node);
    out.push(FlatNode {
        source: index,
        name: node.name.clone(),
        transform,
        mesh: node.mesh,
    });
    for &child in &node.children {
        visit(nodes, child, transform, visited, out)?;
    }
    Ok(())
}

/// Root nodes of the default scene.
///
/// Uses `scene` when present, otherwise the first scene. A document without
/// any scene renders every node that is nobody's child.
pub fn scene_roots(document: &Document) -> Result<Vec<usize>> {
    if document.scenes.is_empty() {
        let mut is_child = vec![false; document.nodes.len()];
        for child in document.nodes.iter().flat_map(|node| &node.children) {
            if let Some(flag) = is_child.get_mut(*child) {
                *flag = true;
            }
        }
        return Ok((0..document.nodes.len()).filter(|i| !is_child[*i]).collect());
    }
    let index = document.scene.unwrap_or(0);
    document
        .scenes
        .get(index)
        .map(|scene| scene.nodes.clone())
        .ok_or_else(|| LoadError::Schema(format!("default scene {index} does not exist")))
}

/// Flattens every root of the default scene into one list.
///
/// Roots share one visited set, so a node listed under two roots is
/// rejected like any other shared node.
pub fn flatten_scene(document: &Document) -> Result<Vec<FlatNode>> {
    let mut visited = vec![false; document.nodes.len()];
    let mut out = Vec::new();
    for root in scene_roots(document)? {
        visit(
            &document.nodes,
            root,
            cgmath::Matrix4::identity(),
            &mut visited,
            &mut out,
        )?;
    }
    Ok(out)
}

/// GPU state of a node, filled in by the pipeline builder.
#[derive(Debug)]
pub struct NodeGpu {
    pub uniform_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

/// A flattened renderable entry: absolute transform plus one mesh.
#[derive(Debug)]
pub struct Node {
    pub name: Option<String>,
    pub transform: cgmath::Matrix4<f32>,
    pub mesh: usize,
    pub gpu: Option<NodeGpu>,
}

impl Node {
    /// Binds the node transform at slot 1 and draws every primitive of its mesh.
    pub fn render(&self, render_pass: &mut wgpu::RenderPass<'_>, meshes: &[Mesh]) {
        let (Some(gpu), Some(mesh)) = (&self.gpu, meshes.get(self.mesh)) else {
            return;
        };
        render_pass.set_bind_group(NODE_GROUP, &gpu.bind_group, &[]);
        for primitive in &mesh.primitives {
            primitive.render(render_pass);
        }
    }
}

/// Keeps the flattened entries that reference a mesh.
pub fn renderable_nodes(flat: Vec<FlatNode>, mesh_count: usize) -> Result<Vec<Node>> {
    flat.into_iter()
        .filter_map(|entry| entry.mesh.map(|mesh| (entry, mesh)))
        .map(|(entry, mesh)| {
            if mesh >= mesh_count {
                return Err(LoadError::Schema(format!(
                    "node {} references missing mesh {mesh}",
                    entry.source
                )));
            }
            Ok(Node {
                name: entry.name,
                transform: entry.transform,
                mesh,
                gpu: None,
            })
        })
        .collect()
}

/// A loaded scene, ready to be drawn.
///
/// Owns every pool that primitives and nodes refer to by index. Nothing in
/// it changes after loading; rendering only reads.
#[derive(Debug)]
pub struct Scene {
    pub images: Vec<Image>,
    pub textures: Vec<Texture>,
    pub materials: Vec<Material>,
    pub meshes: Vec<Mesh>,
    pub nodes: Vec<Node>,
    pub defaults: DefaultImages,
    pub buffer_views: Vec<BufferView>,
    pub sampler: wgpu::Sampler,
    /// Non-fatal diagnostics raised while loading.
    pub warnings: Vec<Warning>,
}

impl Scene {
    /// Binds the caller's view/projection group at slot 0 and draws every node.
    pub fn render(&self, render_pass: &mut wgpu::RenderPass<'_>, view_bind_group: &wgpu::BindGroup) {
        render_pass.set_bind_group(VIEW_GROUP, view_bind_group, &[]);
        for node in &self.nodes {
            node.render(render_pass, &self.meshes);
        }
    }

    pub fn primitive_count(&self) -> usize {
        self.meshes.iter().map(|mesh| mesh.primitives.len()).sum()
    }
}
