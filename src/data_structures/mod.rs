//! Scene data structures: buffer views, accessors, textures, materials,
//! meshes and the flattened scene graph.
//!
//! - `buffer_view` tracks which byte ranges of the binary chunk become GPU buffers
//! - `accessor` interprets a buffer view as typed vertex or index elements
//! - `texture` holds decoded images, texture references and their GPU textures
//! - `material` resolves material descriptions against the texture pool
//! - `model` contains primitives and meshes assembled from accessors
//! - `transform` computes local node transforms and their uniform layout
//! - `scene_graph` flattens the node hierarchy and owns the loaded [`scene_graph::Scene`]

pub mod accessor;
pub mod buffer_view;
pub mod material;
pub mod model;
pub mod scene_graph;
pub mod texture;
pub mod transform;
