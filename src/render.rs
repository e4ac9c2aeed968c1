//! Drawing loaded scenes.
//!
//! [`DrawScene`] extends [`wgpu::RenderPass`] so a render loop can write
//! `render_pass.draw_scene(&scene, &view_bind_group)`. The renderer owns the
//! slot 0 bind group; everything else is bound from the scene.

use crate::data_structures::{
    model::{Mesh, Primitive},
    scene_graph::{Node, Scene},
};

pub trait DrawScene {
    /// Draws one primitive. Slots 0 and 1 must already be bound.
    fn draw_primitive(&mut self, primitive: &Primitive);

    /// Binds the node transform and draws its mesh. Slot 0 must already be bound.
    fn draw_node(&mut self, node: &Node, meshes: &[Mesh]);

    fn draw_scene(&mut self, scene: &Scene, view_bind_group: &wgpu::BindGroup);
}

impl DrawScene for wgpu::RenderPass<'_> {
    fn draw_primitive(&mut self, primitive: &Primitive) {
        primitive.render(self);
    }

    fn draw_node(&mut self, node: &Node, meshes: &[Mesh]) {
        node.render(self, meshes);
    }

    fn draw_scene(&mut self, scene: &Scene, view_bind_group: &wgpu::BindGroup) {
        scene.render(self, view_bind_group);
    }
}
