use std::sync::Arc;

use crate::{
    context::{LoadContext, LoadOptions},
    data_structures::{
        buffer_view::{BufferView, upload_claimed},
        material::Material,
        model::{assemble_meshes, resolve_accessors},
        scene_graph::{Scene, flatten_scene, renderable_nodes},
        texture::create_default_sampler,
    },
    error::Result,
    glb::GlbContainer,
    pipelines::{
        basic::PipelineCache,
        binding::{BindingSources, bind_scene},
        layouts::SceneLayouts,
    },
    resources::texture::{
        Placeholders, decode_embedded_images, fetch_placeholders, load_binary, resolve_textures,
        upload_image_pool,
    },
};

/**
 * This module contains all logic for loading scenes, images and placeholder
 * assets from external files.
 */
pub mod texture;

/// Reads a GLB file from `options.asset_root` and loads it.
pub async fn load_scene(
    ctx: LoadContext<'_>,
    file_name: &str,
    options: &LoadOptions,
) -> Result<Scene> {
    let bytes = load_binary(&options.asset_root, file_name).await?;
    load_scene_from_bytes(ctx, bytes, options).await
}

/// Loads a scene from GLB bytes already in memory.
///
/// Fatal problems (a malformed container, an unknown accessor type, an
/// image that does not decode) fail the whole load. Primitives that cannot
/// be drawn and textures that cannot be resolved are dropped or replaced
/// and reported on [`Scene::warnings`].
pub async fn load_scene_from_bytes(
    ctx: LoadContext<'_>,
    bytes: impl Into<Arc<[u8]>>,
    options: &LoadOptions,
) -> Result<Scene> {
    let GlbContainer { document, bin, .. } = GlbContainer::decode(bytes)?;
    let mut warnings = Vec::new();

    let mut views = BufferView::collect(&bin, &document.buffer_views)?;
    let accessors = resolve_accessors(&document, &views)?;

    let (embedded, Placeholders { images, warnings: fetch_warnings }) = futures::try_join!(
        decode_embedded_images(&document, &views),
        fetch_placeholders(options),
    )?;
    warnings.extend(fetch_warnings);

    let pool = upload_image_pool(&ctx, document.images.len(), embedded, images);
    let textures = resolve_textures(&document, &pool.slots);
    let materials: Vec<Material> = document
        .materials
        .iter()
        .enumerate()
        .map(|(index, descriptor)| {
            Material::build(index, descriptor, &textures, pool.defaults, &mut warnings)
        })
        .collect();

    let mut meshes = assemble_meshes(
        &document,
        &accessors,
        &mut views,
        materials.len(),
        &mut warnings,
    );
    let uploaded = upload_claimed(&mut views, ctx.device);

    let mut nodes = renderable_nodes(flatten_scene(&document)?, meshes.len())?;

    let sampler = create_default_sampler(ctx.device);
    let layouts = SceneLayouts::new(ctx.device, ctx.view_layout);
    let mut cache = PipelineCache::new(options.cull_mode);
    bind_scene(
        &ctx,
        &layouts,
        &mut cache,
        &mut meshes,
        &mut nodes,
        BindingSources {
            materials: &materials,
            images: &pool.images,
            views: &views,
            sampler: &sampler,
        },
        &mut warnings,
    );

    let scene = Scene {
        images: pool.images,
        textures,
        materials,
        meshes,
        nodes,
        defaults: pool.defaults,
        buffer_views: views,
        sampler,
        warnings,
    };
    log::info!(
        "loaded scene: {} nodes, {} meshes, {} primitives, {} images, {} buffer views uploaded, {} pipelines, {} warnings",
        scene.nodes.len(),
        scene.meshes.len(),
        scene.primitive_count(),
        scene.images.len(),
        uploaded,
        cache.len(),
        scene.warnings.len()
    );
    Ok(scene)
}
