//! Load-time collaborators and configuration.
//!
//! [`LoadContext`] borrows the GPU objects a scene load needs from whoever
//! owns the window and render loop. [`LoadOptions`] controls where the
//! placeholder images come from and how pipelines are set up.

use std::{path::PathBuf, time::Duration};

#[derive(Debug, Clone, Copy)]
pub struct LoadContext<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    /// Compiled shader with `vs_main` and `fs_main` entry points.
    ///
    /// Attribute locations are 0 = position, 1 = normal, 2 = uv; bind group
    /// 0 is the view, 1 the node transform and 2 the material.
    pub shader: &'a wgpu::ShaderModule,
    /// Layout of the renderer-owned view/projection group at slot 0.
    pub view_layout: &'a wgpu::BindGroupLayout,
    pub color_format: wgpu::TextureFormat,
    pub depth_format: Option<wgpu::TextureFormat>,
}

impl<'a> LoadContext<'a> {
    pub fn new(
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        shader: &'a wgpu::ShaderModule,
        view_layout: &'a wgpu::BindGroupLayout,
        color_format: wgpu::TextureFormat,
    ) -> Self {
        Self {
            device,
            queue,
            shader,
            view_layout,
            color_format,
            depth_format: None,
        }
    }

    pub fn with_depth_format(mut self, depth_format: wgpu::TextureFormat) -> Self {
        self.depth_format = Some(depth_format);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    /// Directory the placeholder images (and scene files) are read from.
    /// On wasm this is a path relative to the page origin.
    pub asset_root: PathBuf,
    pub default_normal: String,
    pub default_white: String,
    pub default_black: String,
    /// Upper bound for every placeholder fetch.
    pub asset_timeout: Duration,
    pub cull_mode: Option<wgpu::Face>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("./assets"),
            default_normal: "default_normal.png".to_string(),
            default_white: "default_white.png".to_string(),
            default_black: "default_black.png".to_string(),
            asset_timeout: Duration::from_secs(5),
            cull_mode: Some(wgpu::Face::Back),
        }
    }
}

impl LoadOptions {
    pub fn with_asset_root(mut self, asset_root: impl Into<PathBuf>) -> Self {
        self.asset_root = asset_root.into();
        self
    }

    pub fn with_asset_timeout(mut self, asset_timeout: Duration) -> Self {
        self.asset_timeout = asset_timeout;
        self
    }

    pub fn with_cull_mode(mut self, cull_mode: Option<wgpu::Face>) -> Self {
        self.cull_mode = cull_mode;
        self
    }

    /// Overrides the file names of the normal, white and black placeholders.
    pub fn with_default_images(
        mut self,
        normal: impl Into<String>,
        white: impl Into<String>,
        black: impl Into<String>,
    ) -> Self {
        self.default_normal = normal.into();
        self.default_white = white.into();
        self.default_black = black.into();
        self
    }
}
