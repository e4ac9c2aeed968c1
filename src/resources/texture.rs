use std::path::Path;

use anyhow::Context as _;

use crate::{
    context::{LoadContext, LoadOptions},
    data_structures::{
        buffer_view::BufferView,
        texture::{DefaultImages, Image, Texture, decode_image, solid_pixel},
    },
    error::{LoadError, Result, Warning},
    glb::schema::Document,
};

/// Flat tangent-space normal.
pub const DEFAULT_NORMAL_RGBA: [u8; 4] = [128, 128, 255, 255];
pub const DEFAULT_WHITE_RGBA: [u8; 4] = [255, 255, 255, 255];
pub const DEFAULT_BLACK_RGBA: [u8; 4] = [0, 0, 0, 255];

#[cfg(target_arch = "wasm32")]
fn format_url(root: &Path, file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().context("no window available")?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow::anyhow!("page origin is not available"))?;
    let root = root.to_string_lossy();
    let root = root.trim_start_matches("./").trim_matches('/');
    let base = reqwest::Url::parse(&format!("{origin}/{root}/"))?;
    Ok(base.join(file_name)?)
}

/// Reads an asset relative to `root`.
///
/// Native builds read from disk, wasm builds fetch relative to the page
/// origin.
pub async fn load_binary(root: &Path, file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(root, file_name)?;
        reqwest::get(url).await?.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = root.join(file_name);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?
    };

    Ok(data)
}

/// [`load_binary`] bounded by `options.asset_timeout`.
///
/// The bound only applies natively; the browser fetch carries its own
/// network timeouts.
pub async fn load_binary_bounded(options: &LoadOptions, file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        tokio::time::timeout(
            options.asset_timeout,
            load_binary(&options.asset_root, file_name),
        )
        .await
        .map_err(|_| {
            anyhow::anyhow!(
                "timed out after {:?} fetching {file_name}",
                options.asset_timeout
            )
        })?
    }
    #[cfg(target_arch = "wasm32")]
    {
        load_binary(&options.asset_root, file_name).await
    }
}

/// A decoded bitmap waiting for upload.
#[derive(Debug)]
pub struct DecodedImage {
    pub name: String,
    pub pixels: image::DynamicImage,
}

/// Decodes every image stored inside the container.
///
/// All decodes are joined together and the first failure fails the whole
/// batch. Images without a buffer view reference external files and are
/// skipped. Returns `(image index, bitmap)` pairs in document order.
pub async fn decode_embedded_images(
    document: &Document,
    views: &[BufferView],
) -> Result<Vec<(usize, DecodedImage)>> {
    let mut decodes = Vec::new();
    for (index, descriptor) in document.images.iter().enumerate() {
        let name = descriptor
            .name
            .clone()
            .unwrap_or_else(|| format!("image {index}"));
        let Some(view) = descriptor.buffer_view else {
            log::warn!("{name} is not stored in the container, skipping");
            continue;
        };
        let view = views.get(view).ok_or_else(|| {
            LoadError::Schema(format!("{name} references missing buffer view {view}"))
        })?;
        let mime_type = descriptor.mime_type.as_deref();
        decodes.push(async move {
            let pixels = decode_image(&name, view.bytes(), mime_type)?;
            Ok::<_, LoadError>((index, DecodedImage { name, pixels }))
        });
    }
    futures::future::try_join_all(decodes).await
}

/// Fetches and decodes one placeholder image.
///
/// A fetch that fails or times out is replaced by a 1x1 texel of
/// `fallback` and reported as a resource warning. Bytes that arrive but do
/// not decode are an error.
async fn fetch_placeholder(
    options: &LoadOptions,
    file_name: &str,
    fallback: [u8; 4],
) -> Result<(DecodedImage, Option<Warning>)> {
    match load_binary_bounded(options, file_name).await {
        Ok(bytes) => {
            let pixels = decode_image(file_name, &bytes, None)?;
            Ok((
                DecodedImage {
                    name: file_name.to_string(),
                    pixels,
                },
                None,
            ))
        }
        Err(err) => {
            let warning = Warning::Resource(format!(
                "placeholder {file_name} unavailable ({err:#}), using a generated texel"
            ));
            log::warn!("{warning}");
            Ok((
                DecodedImage {
                    name: file_name.to_string(),
                    pixels: solid_pixel(fallback),
                },
                Some(warning),
            ))
        }
    }
}

/// The normal, white and black placeholders, in that order.
pub struct Placeholders {
    pub images: [DecodedImage; 3],
    pub warnings: Vec<Warning>,
}

/// Fetches the three placeholders concurrently.
pub async fn fetch_placeholders(options: &LoadOptions) -> Result<Placeholders> {
    let (normal, white, black) = futures::try_join!(
        fetch_placeholder(options, &options.default_normal, DEFAULT_NORMAL_RGBA),
        fetch_placeholder(options, &options.default_white, DEFAULT_WHITE_RGBA),
        fetch_placeholder(options, &options.default_black, DEFAULT_BLACK_RGBA),
    )?;
    let warnings = [&normal.1, &white.1, &black.1]
        .into_iter()
        .flatten()
        .cloned()
        .collect();
    Ok(Placeholders {
        images: [normal.0, white.0, black.0],
        warnings,
    })
}

/// The uploaded image pool.
///
/// `slots[i]` is the pool index of document image `i`, or `None` when that
/// image was skipped. The placeholders sit at the end of the pool.
#[derive(Debug)]
pub struct ImagePool {
    pub images: Vec<Image>,
    pub slots: Vec<Option<usize>>,
    pub defaults: DefaultImages,
}

pub fn upload_image_pool(
    ctx: &LoadContext<'_>,
    image_count: usize,
    embedded: Vec<(usize, DecodedImage)>,
    placeholders: [DecodedImage; 3],
) -> ImagePool {
    let mut images = Vec::with_capacity(embedded.len() + placeholders.len());
    let mut slots = vec![None; image_count];
    for (index, decoded) in embedded {
        slots[index] = Some(images.len());
        images.push(Image::upload(ctx.device, ctx.queue, decoded.name, &decoded.pixels));
    }

    let first_default = images.len();
    for decoded in placeholders {
        images.push(Image::upload(ctx.device, ctx.queue, decoded.name, &decoded.pixels));
    }
    ImagePool {
        images,
        slots,
        defaults: DefaultImages {
            normal: first_default,
            white: first_default + 1,
            black: first_default + 2,
        },
    }
}

/// Resolves every texture to its image's pool index.
///
/// A texture whose source is missing, out of range or skipped keeps
/// `image: None`; materials fall back to a placeholder when they use it.
pub fn resolve_textures(document: &Document, slots: &[Option<usize>]) -> Vec<Texture> {
    document
        .textures
        .iter()
        .map(|descriptor| Texture {
            name: descriptor.name.clone(),
            image: descriptor
                .source
                .and_then(|source| slots.get(source).copied().flatten()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::glb::{RawBuffer, schema::Document};

    fn png(rgba: [u8; 4]) -> Vec<u8> {
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(2, 2, image::Rgba(rgba)))
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn document(json: &str) -> Document {
        Document::from_slice(json.as_bytes()).unwrap()
    }

    #[test]
    fn textures_alias_images_and_tolerate_bad_sources() {
        let document = document(
            r#"{"textures": [{"source": 1}, {"source": 1}, {"source": 0}, {"source": 9}, {}]}"#,
        );
        let slots = vec![None, Some(0)];
        let textures = resolve_textures(&document, &slots);
        let images: Vec<_> = textures.iter().map(|t| t.image).collect();
        assert_eq!(images, vec![Some(0), Some(0), None, None, None]);
    }

    #[tokio::test]
    async fn embedded_images_decode_in_document_order() {
        let red = png([255, 0, 0, 255]);
        let blue = png([0, 0, 255, 255]);
        let json = format!(
            r#"{{
                "bufferViews": [
                    {{"buffer": 0, "byteLength": {}}},
                    {{"buffer": 0, "byteOffset": {}, "byteLength": {}}}
                ],
                "images": [
                    {{"name": "red", "bufferView": 0, "mimeType": "image/png"}},
                    {{"name": "remote", "uri": "remote.png"}},
                    {{"bufferView": 1}}
                ]
            }}"#,
            red.len(),
            red.len(),
            blue.len()
        );
        let document = document(&json);
        let raw = RawBuffer::new([red, blue].concat());
        let views = BufferView::collect(&raw, &document.buffer_views).unwrap();

        let decoded = decode_embedded_images(&document, &views).await.unwrap();
        let indices: Vec<_> = decoded.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(decoded[0].1.name, "red");
        assert_eq!(decoded[1].1.name, "image 2");
    }

    #[tokio::test]
    async fn one_bad_image_fails_the_batch() {
        let good = png([255, 255, 255, 255]);
        let json = format!(
            r#"{{
                "bufferViews": [
                    {{"buffer": 0, "byteLength": {}}},
                    {{"buffer": 0, "byteOffset": {}, "byteLength": 4}}
                ],
                "images": [{{"bufferView": 0}}, {{"name": "broken", "bufferView": 1}}]
            }}"#,
            good.len(),
            good.len()
        );
        let document = document(&json);
        let raw = RawBuffer::new([good, vec![1, 2, 3, 4]].concat());
        let views = BufferView::collect(&raw, &document.buffer_views).unwrap();

        let err = decode_embedded_images(&document, &views).await.unwrap_err();
        assert!(matches!(err, LoadError::Image { ref name, .. } if name == "broken"));
    }

    #[tokio::test]
    async fn missing_placeholders_fall_back_to_generated_texels() {
        let options = LoadOptions::default().with_asset_root("./does-not-exist");
        let placeholders = fetch_placeholders(&options).await.unwrap();
        assert_eq!(placeholders.warnings.len(), 3);
        assert!(
            placeholders
                .warnings
                .iter()
                .all(|w| matches!(w, Warning::Resource(_)))
        );
        let [normal, white, black] = &placeholders.images;
        assert_eq!(normal.pixels.to_rgba8().get_pixel(0, 0).0, DEFAULT_NORMAL_RGBA);
        assert_eq!(white.pixels.to_rgba8().get_pixel(0, 0).0, DEFAULT_WHITE_RGBA);
        assert_eq!(black.pixels.to_rgba8().get_pixel(0, 0).0, DEFAULT_BLACK_RGBA);
    }

    #[tokio::test]
    async fn shipped_placeholders_load_without_warnings() {
        let options = LoadOptions::default()
            .with_asset_root(Path::new(env!("CARGO_MANIFEST_DIR")).join("assets"));
        let placeholders = fetch_placeholders(&options).await.unwrap();
        assert!(placeholders.warnings.is_empty());
        assert_eq!(
            placeholders.images[0].pixels.to_rgba8().get_pixel(0, 0).0,
            DEFAULT_NORMAL_RGBA
        );
    }
}
