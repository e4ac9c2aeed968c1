//! Render pipelines and bind groups for loaded scenes.
//!
//! - `layouts` defines the three bind-group layouts (view, node, material)
//! - `basic` builds render pipelines and caches them by vertex layout and topology
//! - `binding` creates the per-node and per-primitive GPU resources

pub mod basic;
pub mod binding;
pub mod layouts;
