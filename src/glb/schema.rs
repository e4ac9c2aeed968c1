//! Typed records for the JSON scene description.
//!
//! The JSON chunk is parsed exactly once into these records. Everything
//! downstream works on them and never touches the untyped JSON again.
//! Fields the loader does not consume are ignored by serde.

use std::collections::HashMap;

use serde::Deserialize;

/// Primitive mode used when `mode` is absent (triangle list).
pub const DEFAULT_PRIMITIVE_MODE: u32 = 4;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub buffer_views: Vec<BufferViewDescriptor>,
    #[serde(default)]
    pub accessors: Vec<AccessorDescriptor>,
    #[serde(default)]
    pub images: Vec<ImageDescriptor>,
    #[serde(default)]
    pub textures: Vec<TextureDescriptor>,
    #[serde(default)]
    pub materials: Vec<MaterialDescriptor>,
    #[serde(default)]
    pub meshes: Vec<MeshDescriptor>,
    #[serde(default)]
    pub nodes: Vec<NodeDescriptor>,
    #[serde(default)]
    pub scenes: Vec<SceneDescriptor>,
    /// Index of the default scene.
    pub scene: Option<usize>,
}

impl Document {
    pub fn from_slice(json: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(json)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferViewDescriptor {
    #[serde(default)]
    pub buffer: usize,
    pub byte_length: usize,
    pub byte_offset: Option<usize>,
    pub byte_stride: Option<usize>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessorDescriptor {
    pub buffer_view: Option<usize>,
    pub byte_offset: Option<usize>,
    pub component_type: u32,
    #[serde(default)]
    pub normalized: bool,
    pub count: usize,
    #[serde(rename = "type")]
    pub shape: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDescriptor {
    pub name: Option<String>,
    pub buffer_view: Option<usize>,
    pub mime_type: Option<String>,
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextureDescriptor {
    pub source: Option<usize>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TextureInfo {
    pub index: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialDescriptor {
    pub name: Option<String>,
    pub pbr_metallic_roughness: Option<PbrMetallicRoughness>,
    pub normal_texture: Option<TextureInfo>,
    pub occlusion_texture: Option<TextureInfo>,
    pub emissive_texture: Option<TextureInfo>,
    pub emissive_factor: Option<[f32; 3]>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PbrMetallicRoughness {
    pub base_color_texture: Option<TextureInfo>,
    pub base_color_factor: Option<[f32; 4]>,
    pub metallic_roughness_texture: Option<TextureInfo>,
    pub metallic_factor: Option<f32>,
    pub roughness_factor: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeshDescriptor {
    pub name: Option<String>,
    #[serde(default)]
    pub primitives: Vec<PrimitiveDescriptor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrimitiveDescriptor {
    #[serde(default)]
    pub attributes: HashMap<String, usize>,
    pub indices: Option<usize>,
    pub material: Option<usize>,
    pub mode: Option<u32>,
}

impl PrimitiveDescriptor {
    pub fn mode(&self) -> u32 {
        self.mode.unwrap_or(DEFAULT_PRIMITIVE_MODE)
    }

    pub fn attribute(&self, semantic: &str) -> Option<usize> {
        self.attributes.get(semantic).copied()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeDescriptor {
    pub name: Option<String>,
    pub mesh: Option<usize>,
    #[serde(default)]
    pub children: Vec<usize>,
    /// Column-major 4x4 matrix. Takes precedence over TRS.
    pub matrix: Option<[f32; 16]>,
    pub translation: Option<[f32; 3]>,
    /// Quaternion as `[x, y, z, w]`.
    pub rotation: Option<[f32; 4]>,
    pub scale: Option<[f32; 3]>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SceneDescriptor {
    pub name: Option<String>,
    #[serde(default)]
    pub nodes: Vec<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_consumed_fields_and_ignores_the_rest() {
        let json = br#"{
            "asset": {"version": "2.0", "generator": "test"},
            "scene": 0,
            "scenes": [{"nodes": [0]}],
            "nodes": [{"mesh": 0, "translation": [1, 2, 3], "extras": {"a": 1}}],
            "meshes": [{"primitives": [{"attributes": {"POSITION": 0}}]}],
            "accessors": [{"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3"}],
            "bufferViews": [{"buffer": 0, "byteLength": 36}],
            "materials": [{"pbrMetallicRoughness": {"baseColorFactor": [1, 0, 0, 1]}}]
        }"#;
        let doc = Document::from_slice(json).unwrap();
        assert_eq!(doc.scene, Some(0));
        assert_eq!(doc.nodes[0].translation, Some([1.0, 2.0, 3.0]));
        assert_eq!(doc.meshes[0].primitives[0].attribute("POSITION"), Some(0));
        assert_eq!(doc.meshes[0].primitives[0].mode(), DEFAULT_PRIMITIVE_MODE);
        assert_eq!(doc.accessors[0].shape, "VEC3");
        assert!(!doc.accessors[0].normalized);
        assert_eq!(doc.buffer_views[0].byte_stride, None);
        let pbr = doc.materials[0].pbr_metallic_roughness.as_ref().unwrap();
        assert_eq!(pbr.base_color_factor, Some([1.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn empty_document_defaults_every_list() {
        let doc = Document::from_slice(b"{}").unwrap();
        assert!(doc.nodes.is_empty());
        assert!(doc.buffer_views.is_empty());
        assert_eq!(doc.scene, None);
    }
}
