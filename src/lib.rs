//! flow-glb
//!
//! Loads binary glTF (GLB) scenes into GPU resources ready for drawing with
//! wgpu. A load decodes the container, resolves typed accessors over the
//! binary chunk, uploads only the buffer views primitives actually use,
//! decodes images concurrently, flattens the node hierarchy into absolute
//! transforms and builds one render pipeline and material bind group per
//! primitive.
//!
//! High-level modules
//! - `context`: GPU collaborators and options for a scene load
//! - `data_structures`: buffer views, accessors, materials, meshes and the scene graph
//! - `error`: fatal load errors and non-fatal warnings
//! - `glb`: the binary container and the typed scene description
//! - `pipelines`: bind-group layouts, render pipelines and bindings
//! - `resources`: scene and asset loading entry points
//! - `render`: drawing a loaded scene into a render pass
//!

pub mod context;
pub mod data_structures;
pub mod error;
pub mod glb;
pub mod pipelines;
pub mod render;
pub mod resources;

pub use context::{LoadContext, LoadOptions};
pub use data_structures::scene_graph::Scene;
pub use error::{LoadError, Result, Warning};
pub use render::DrawScene;
pub use resources::{load_scene, load_scene_from_bytes};

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use wgpu;
