//! Mesh geometry: per-vertex streams, triangulation and skinning slots.

use std::collections::BTreeMap;

use gltf_json as json;
use json::validation::Checked::Valid;
use tracing::{debug, trace, warn};

use super::buffer::BufferBuilder;
use super::material::MaterialTable;
use super::skeleton::Skeleton;
use super::ExportOptions;
use crate::dme::{DagNode, DmeMesh, DmeModel, DmeVertexData, FACE_TERMINATOR};
use crate::util::{Error, Result, Vec2, Vec3};

/// Suffix trimmed from mesh node names.
pub const MESH_SUFFIX: &str = "_mesh";

/// Joint slots per vertex in `JOINTS_0` / `WEIGHTS_0`.
pub const JOINT_SLOTS: usize = 4;

type Attributes = BTreeMap<json::validation::Checked<json::mesh::Semantic>, json::Index<json::Accessor>>;

// ============================================================================
// Stream helpers
// ============================================================================

/// Expand indexed values: `out[i] = values[indices[i]]`.
pub fn reindex<T: Copy>(indices: &[i32], values: &[T]) -> Result<Vec<T>> {
    indices
        .iter()
        .map(|&i| {
            usize::try_from(i)
                .ok()
                .and_then(|i| values.get(i).copied())
                .ok_or_else(|| {
                    Error::InvalidStructure(format!("vertex index {} out of range ({} values)", i, values.len()))
                })
        })
        .collect()
}

/// Convert a DMX texture coordinate (origin bottom left) to glTF (top left).
#[inline]
pub fn flip_uv(uv: Vec2) -> Vec2 {
    Vec2::new(uv.x, 1.0 - uv.y)
}

/// Fan-triangulate a `-1` terminated polygon stream.
///
/// Each polygon `[a, b, c, d, ...]` yields `(a, b, c), (a, c, d), ...`;
/// polygons with fewer than three corners yield nothing. A trailing
/// polygon without terminator is still emitted.
pub fn triangulate(faces: &[i32]) -> Result<Vec<u32>> {
    let mut triangles = Vec::with_capacity(faces.len() * 3);
    let mut first: Option<u32> = None;
    let mut second: Option<u32> = None;

    for &index in faces {
        if index == FACE_TERMINATOR {
            first = None;
            second = None;
            continue;
        }
        let index = u32::try_from(index)
            .map_err(|_| Error::InvalidStructure(format!("negative face index {}", index)))?;

        match (first, second) {
            (None, _) => first = Some(index),
            (Some(_), None) => second = Some(index),
            (Some(a), Some(b)) => {
                triangles.extend_from_slice(&[a, b, index]);
                second = Some(index);
            }
        }
    }

    Ok(triangles)
}

// ============================================================================
// Skinning
// ============================================================================

/// Per position value joint slots, before re-expansion.
#[derive(Debug, Default, PartialEq)]
pub struct SkinSlots {
    pub joints: Vec<[u16; JOINT_SLOTS]>,
    pub weights: Vec<[f32; JOINT_SLOTS]>,
}

/// Fill four joint slots for each position value.
///
/// Slot `j < jointCount` reads influence `i * jointCount + j`, resolves the
/// joint list entry to its skeleton node and copies the weight. Remaining
/// slots stay zero. Joint list entries missing from the skeleton map to
/// node 0.
///
/// Slots hold skeleton node indices, which equal skin joint indices only
/// for a single-root skeleton whose nodes start at 0.
pub fn skin_slots(vd: &DmeVertexData, joint_names: &[String], skeleton: &Skeleton) -> Result<SkinSlots> {
    let jc = vd.joint_count;
    let used = jc.min(JOINT_SLOTS);
    let mut slots = SkinSlots {
        joints: Vec::with_capacity(vd.positions.len()),
        weights: Vec::with_capacity(vd.positions.len()),
    };
    let mut unresolved = 0usize;

    for i in 0..vd.positions.len() {
        let mut ji = [0u16; JOINT_SLOTS];
        let mut jw = [0f32; JOINT_SLOTS];

        for j in 0..used {
            let k = i * jc + j;
            let (Some(&list_index), Some(&weight)) = (vd.joint_indices.get(k), vd.joint_weights.get(k)) else {
                return Err(Error::InvalidStructure(format!(
                    "joint influence {} out of range ({} indices, {} weights)",
                    k,
                    vd.joint_indices.len(),
                    vd.joint_weights.len()
                )));
            };
            let name = usize::try_from(list_index)
                .ok()
                .and_then(|l| joint_names.get(l))
                .ok_or_else(|| {
                    Error::InvalidStructure(format!(
                        "joint index {} out of range ({} joints)",
                        list_index,
                        joint_names.len()
                    ))
                })?;

            ji[j] = match skeleton.node(name) {
                Some(node) => node as u16,
                None => {
                    unresolved += 1;
                    0
                }
            };
            jw[j] = weight;
        }

        slots.joints.push(ji);
        slots.weights.push(jw);
    }

    if unresolved > 0 {
        warn!("{} joint influences reference joints missing from the skeleton", unresolved);
    }
    Ok(slots)
}

// ============================================================================
// Mesh conversion
// ============================================================================

/// Shared state for converting the meshes of one model.
pub(crate) struct MeshContext<'a> {
    pub options: &'a ExportOptions,
    pub skeleton: &'a Skeleton,
    pub joint_names: &'a [String],
    pub buffer: &'a mut BufferBuilder,
    pub materials: &'a mut MaterialTable,
    pub meshes: Vec<json::Mesh>,
    pub nodes: &'a mut Vec<json::Node>,
    /// Scene root nodes created for meshes.
    pub mesh_nodes: Vec<u32>,
}

impl MeshContext<'_> {
    /// Convert every mesh below `model`, in DAG order.
    pub fn convert_model(&mut self, model: &DmeModel) -> Result<()> {
        self.walk(model.children())
    }

    fn walk(&mut self, children: &[DagNode]) -> Result<()> {
        for child in children {
            let dag = child.dag();
            let mesh = match child {
                DagNode::Mesh(mesh) => Some(mesh),
                _ => dag.mesh(),
            };
            if let Some(mesh) = mesh {
                let name = dag.name.strip_suffix(MESH_SUFFIX).unwrap_or(&dag.name);
                self.add_mesh(name, mesh)?;
            }
            self.walk(&dag.children)?;
        }
        Ok(())
    }

    fn add_mesh(&mut self, name: &str, mesh: &DmeMesh) -> Result<()> {
        let vd = &mesh.current_state;
        if vd.positions_indices.is_empty() {
            debug!("mesh {:?} has no vertices, skipped", name);
            return Ok(());
        }

        let (attributes, skinned) = self.write_attributes(name, vd)?;
        let vertex_count = vd.vertex_count();

        let mut primitives = Vec::with_capacity(mesh.face_sets.len());
        for face_set in &mesh.face_sets {
            let indices = triangulate(&face_set.faces)?;
            if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(Error::InvalidStructure(format!(
                    "face set {:?} references vertex {} of {}",
                    face_set.name, bad, vertex_count
                )));
            }
            if indices.is_empty() {
                trace!("face set {:?} has no triangles", face_set.name);
                continue;
            }

            primitives.push(json::mesh::Primitive {
                attributes: attributes.clone(),
                extensions: Default::default(),
                extras: Default::default(),
                indices: Some(self.buffer.pack_indices(&indices)),
                material: Some(self.materials.get_or_insert(&face_set.material)),
                mode: Valid(json::mesh::Mode::Triangles),
                targets: None,
            });
        }

        if primitives.is_empty() {
            debug!("mesh {:?} has no triangles, skipped", name);
            return Ok(());
        }

        let node = self.nodes.len() as u32;
        self.nodes.push(json::Node {
            camera: None,
            children: None,
            extensions: Default::default(),
            extras: Default::default(),
            matrix: None,
            mesh: Some(json::Index::new(self.meshes.len() as u32)),
            name: Some(name.to_string()),
            rotation: None,
            scale: None,
            translation: None,
            skin: if skinned { self.skeleton.mesh_skin() } else { None },
            weights: None,
        });
        self.mesh_nodes.push(node);

        debug!("mesh {:?}: {} vertices, {} primitives", name, vertex_count, primitives.len());
        self.meshes.push(json::Mesh {
            extensions: Default::default(),
            extras: Default::default(),
            name: Some(name.to_string()),
            primitives,
            weights: None,
        });
        Ok(())
    }

    /// Write vertex streams shared by all primitives of a mesh.
    ///
    /// The flag is set when `JOINTS_0` and `WEIGHTS_0` were written.
    fn write_attributes(&mut self, name: &str, vd: &DmeVertexData) -> Result<(Attributes, bool)> {
        use json::mesh::Semantic;

        let vertex_count = vd.vertex_count();
        let mut attributes = BTreeMap::new();

        let scale = self.options.scale;
        let positions: Vec<Vec3> = reindex(&vd.positions_indices, &vd.positions)?
            .into_iter()
            .map(|p| p * scale)
            .collect();
        attributes.insert(Valid(Semantic::Positions), self.buffer.pack_positions(&positions));

        if vd.has_normals() {
            if vd.normals_indices.len() == vertex_count {
                let normals = reindex(&vd.normals_indices, &vd.normals)?;
                attributes.insert(Valid(Semantic::Normals), self.buffer.pack_normals(&normals));
            } else {
                warn!("mesh {:?}: normal index count differs from vertex count, normals dropped", name);
            }
        }

        if vd.has_texture_coordinates() {
            if vd.texture_coordinates_indices.len() == vertex_count {
                let uvs: Vec<Vec2> = reindex(&vd.texture_coordinates_indices, &vd.texture_coordinates)?
                    .into_iter()
                    .map(flip_uv)
                    .collect();
                attributes.insert(Valid(Semantic::TexCoords(0)), self.buffer.pack_uvs(&uvs));
            } else {
                warn!("mesh {:?}: uv index count differs from vertex count, uvs dropped", name);
            }
        }

        if !self.joint_names.is_empty() && vd.has_skinning() {
            let slots = skin_slots(vd, self.joint_names, self.skeleton)?;
            let joints = reindex(&vd.positions_indices, &slots.joints)?;
            let weights = reindex(&vd.positions_indices, &slots.weights)?;

            let joints = if self.skeleton.needs_wide_joints() {
                self.buffer.pack_joints_u16(&joints)
            } else {
                let narrow: Vec<[u8; JOINT_SLOTS]> = joints.iter().map(|j| j.map(|i| i as u8)).collect();
                self.buffer.pack_joints_u8(&narrow)
            };
            attributes.insert(Valid(Semantic::Joints(0)), joints);
            attributes.insert(Valid(Semantic::Weights(0)), self.buffer.pack_weights(&weights));
            return Ok((attributes, true));
        }

        Ok((attributes, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangulate_quad() {
        assert_eq!(triangulate(&[0, 1, 2, 3, -1]).unwrap(), [0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_triangulate_degenerate() {
        assert!(triangulate(&[0, 1, -1]).unwrap().is_empty());
        assert!(triangulate(&[0, -1, 1, -1]).unwrap().is_empty());
        assert!(triangulate(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_triangulate_multiple_polygons() {
        let tris = triangulate(&[0, 1, 2, -1, 3, 4, 5, 6, 7, -1]).unwrap();
        assert_eq!(tris, [0, 1, 2, 3, 4, 5, 3, 5, 6, 3, 6, 7]);
    }

    #[test]
    fn test_triangulate_unterminated_and_negative() {
        assert_eq!(triangulate(&[4, 5, 6]).unwrap(), [4, 5, 6]);
        assert!(triangulate(&[0, 1, -2, -1]).is_err());
    }

    #[test]
    fn test_flip_uv() {
        let uv = flip_uv(Vec2::new(0.25, 0.3));
        assert_eq!(uv.x, 0.25);
        assert!((uv.y - 0.7).abs() < 1e-6);
        assert!((flip_uv(uv).y - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_reindex() {
        assert_eq!(reindex(&[2, 0, 0], &['a', 'b', 'c']).unwrap(), ['c', 'a', 'a']);
        assert!(reindex(&[3], &['a']).is_err());
        assert!(reindex(&[-1], &['a']).is_err());
    }

    fn skeleton_with(names: &[&str]) -> Skeleton {
        let mut skeleton = Skeleton::default();
        for (i, name) in names.iter().enumerate() {
            skeleton.joint_map.insert(name.to_string(), i as u32);
        }
        skeleton.joint_count = names.len();
        skeleton
    }

    #[test]
    fn test_skin_slots_two_influences() {
        let vd = DmeVertexData {
            joint_count: 2,
            positions: vec![Vec3::ZERO, Vec3::ONE],
            positions_indices: vec![0, 1],
            joint_indices: vec![0, 1, 1, 0],
            joint_weights: vec![0.75, 0.25, 1.0, 0.0],
            ..Default::default()
        };
        // Joint list order differs from skeleton order.
        let names = vec!["b".to_string(), "a".to_string()];
        let slots = skin_slots(&vd, &names, &skeleton_with(&["a", "b"])).unwrap();

        assert_eq!(slots.joints, [[1, 0, 0, 0], [0, 1, 0, 0]]);
        assert_eq!(slots.weights, [[0.75, 0.25, 0.0, 0.0], [1.0, 0.0, 0.0, 0.0]]);
    }

    #[test]
    fn test_skin_slots_out_of_range() {
        let vd = DmeVertexData {
            joint_count: 1,
            positions: vec![Vec3::ZERO],
            positions_indices: vec![0],
            joint_indices: vec![5],
            joint_weights: vec![1.0],
            ..Default::default()
        };
        let names = vec!["a".to_string()];
        assert!(skin_slots(&vd, &names, &skeleton_with(&["a"])).is_err());
    }
}
