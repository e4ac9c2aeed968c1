//! Node transforms and their GPU layout.
//!
//! Local transforms come either from an explicit column-major matrix or from
//! translation / rotation / scale. [`NodeUniform`] is what ends up in each
//! node's uniform buffer.

use cgmath::{Matrix, One, SquareMatrix};

use crate::glb::schema::NodeDescriptor;

/// Translation, rotation (quaternion) and non-uniform scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Transform {
    /// Identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            translation: cgmath::Vector3::new(0.0, 0.0, 0.0),
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Scale first, then rotate, then translate.
    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.translation)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&NodeDescriptor> for Transform {
    fn from(node: &NodeDescriptor) -> Self {
        let identity = Self::new();
        Self {
            translation: node
                .translation
                .map_or(identity.translation, cgmath::Vector3::from),
            // glTF stores quaternions as [x, y, z, w]
            rotation: node.rotation.map_or(identity.rotation, |[x, y, z, w]| {
                cgmath::Quaternion::new(w, x, y, z)
            }),
            scale: node.scale.map_or(identity.scale, cgmath::Vector3::from),
        }
    }
}

/// Local transform of a node: its matrix if given, TRS otherwise.
pub fn local_matrix(node: &NodeDescriptor) -> cgmath::Matrix4<f32> {
    match node.matrix {
        Some(m) => cgmath::Matrix4::new(
            m[0], m[1], m[2], m[3], m[4], m[5], m[6], m[7], m[8], m[9], m[10], m[11], m[12], m[13],
            m[14], m[15],
        ),
        None => Transform::from(node).to_matrix(),
    }
}

/**
 * The per-node uniform stored on the GPU: the absolute model matrix and the
 * matching normal matrix (inverse transpose), both as 4x4 for alignment.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct NodeUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
}

impl NodeUniform {
    pub fn new(model: cgmath::Matrix4<f32>) -> Self {
        let normal = model
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(cgmath::Matrix4::identity);
        Self {
            model: model.into(),
            normal: normal.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Deg, Rotation3, Vector4};

    use super::*;

    fn approx(a: cgmath::Matrix4<f32>, b: cgmath::Matrix4<f32>) -> bool {
        let a: [[f32; 4]; 4] = a.into();
        let b: [[f32; 4]; 4] = b.into();
        a.iter()
            .flatten()
            .zip(b.iter().flatten())
            .all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn missing_trs_is_identity() {
        let m = local_matrix(&NodeDescriptor::default());
        assert!(approx(m, cgmath::Matrix4::identity()));
    }

    #[test]
    fn explicit_matrix_is_column_major() {
        let node = NodeDescriptor {
            matrix: Some([
                1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 5.0, 6.0, 7.0, 1.0,
            ]),
            // ignored when a matrix is present
            translation: Some([100.0, 0.0, 0.0]),
            ..Default::default()
        };
        let p = local_matrix(&node) * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert_eq!(p, Vector4::new(5.0, 6.0, 7.0, 1.0));
    }

    #[test]
    fn trs_scales_then_rotates_then_translates() {
        let rotation = cgmath::Quaternion::from_angle_z(Deg(90.0));
        let node = NodeDescriptor {
            translation: Some([10.0, 0.0, 0.0]),
            rotation: Some([rotation.v.x, rotation.v.y, rotation.v.z, rotation.s]),
            scale: Some([2.0, 2.0, 2.0]),
            ..Default::default()
        };
        // (1,0,0) -> scale (2,0,0) -> rotate (0,2,0) -> translate (10,2,0)
        let p = local_matrix(&node) * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert!((p.x - 10.0).abs() < 1e-5);
        assert!((p.y - 2.0).abs() < 1e-5);
        assert!(p.z.abs() < 1e-5);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let m = cgmath::Matrix4::from_nonuniform_scale(2.0, 1.0, 1.0);
        let uniform = NodeUniform::new(m);
        assert_eq!(uniform.normal[0][0], 0.5);
        assert_eq!(uniform.model[0][0], 2.0);
    }

    #[test]
    fn singular_model_falls_back_to_identity_normal() {
        let uniform = NodeUniform::new(cgmath::Matrix4::from_scale(0.0));
        let identity: [[f32; 4]; 4] = cgmath::Matrix4::<f32>::identity().into();
        assert_eq!(uniform.normal, identity);
    }
}
