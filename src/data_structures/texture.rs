//! Images, textures and their GPU resources.
//!
//! This module provides [`GpuTexture`], a wrapper around a WGPU texture with
//! a linear and an sRGB view, plus the scene-level pool records:
//! an [`Image`] owns decoded pixels on the GPU and a [`Texture`] refers to
//! exactly one image by pool index (several textures may alias one image).

use image::{GenericImageView, ImageFormat};

use crate::error::{LoadError, Result};

/// A GPU texture with a linear view and an sRGB view over the same texels.
///
/// Colour channels (base colour, emissive) sample through `srgb_view`, data
/// channels (normal, occlusion, metallic-roughness) through `view`.
#[derive(Clone, Debug)]
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub srgb_view: wgpu::TextureView,
}

impl GpuTexture {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
    pub const SRGB_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    /// Sampling, copy-destination and render-target usage.
    pub const USAGE: wgpu::TextureUsages = wgpu::TextureUsages::TEXTURE_BINDING
        .union(wgpu::TextureUsages::COPY_DST)
        .union(wgpu::TextureUsages::RENDER_ATTACHMENT);

    /// Uploads a decoded bitmap as an RGBA8 texture of the same size.
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &image::DynamicImage,
        label: Option<&str>,
    ) -> Self {
        let dimensions = img.dimensions();
        let rgba = img.to_rgba8();

        let size = wgpu::Extent3d {
            width: dimensions.0,
            height: dimensions.1,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: Self::USAGE,
            view_formats: &[Self::SRGB_FORMAT],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            &rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * dimensions.0),
                rows_per_image: Some(dimensions.1),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let srgb_view = texture.create_view(&wgpu::TextureViewDescriptor {
            format: Some(Self::SRGB_FORMAT),
            ..Default::default()
        });
        Self {
            texture,
            view,
            srgb_view,
        }
    }
}

/// Decodes encoded image bytes, using the MIME type as a format hint.
///
/// Unknown or missing MIME types fall back to guessing from the bytes.
pub fn decode_image(name: &str, bytes: &[u8], mime_type: Option<&str>) -> Result<image::DynamicImage> {
    let decoded = match mime_type.and_then(ImageFormat::from_mime_type) {
        Some(format) => image::load_from_memory_with_format(bytes, format),
        None => image::load_from_memory(bytes),
    };
    decoded.map_err(|source| LoadError::Image {
        name: name.to_string(),
        source,
    })
}

/// A 1x1 bitmap of a single colour.
pub fn solid_pixel(rgba: [u8; 4]) -> image::DynamicImage {
    image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(1, 1, image::Rgba(rgba)))
}

/// Decoded pixel data living on the GPU.
#[derive(Debug)]
pub struct Image {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub gpu: GpuTexture,
}

impl Image {
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: String,
        img: &image::DynamicImage,
    ) -> Self {
        let (width, height) = img.dimensions();
        let gpu = GpuTexture::from_image(device, queue, img, Some(&name));
        Self {
            name,
            width,
            height,
            gpu,
        }
    }
}

/// A named reference to one image in the scene's pool.
///
/// `image` is `None` when the source image was not loaded (external URIs,
/// missing or invalid `source`); materials treat that like a missing texture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Texture {
    pub name: Option<String>,
    pub image: Option<usize>,
}

/// Pool indices of the placeholder images used for omitted material channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DefaultImages {
    pub normal: usize,
    pub white: usize,
    pub black: usize,
}

/// Sampler shared by every material of a scene.
pub fn create_default_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("scene sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Linear,
        ..Default::default()
    })
}
