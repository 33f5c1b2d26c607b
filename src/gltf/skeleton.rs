//! Joint hierarchy to glTF nodes and skins.

use std::collections::HashMap;

use gltf_json as json;
use tracing::{debug, trace};

use super::ExportOptions;
use crate::dme::{DagNode, DmeJoint, DmeModel};

/// Name of every emitted skin.
pub const SKIN_NAME: &str = "Armature";

/// Joint nodes emitted for one skeleton model.
#[derive(Debug, Default)]
pub struct Skeleton {
    /// Joint name to node index.
    pub joint_map: HashMap<String, u32>,
    /// Root joint node of each skin.
    pub roots: Vec<u32>,
    pub skins: Vec<json::Skin>,
    /// Total number of joint nodes.
    pub joint_count: usize,
}

impl Skeleton {
    /// Node index of a joint by name.
    #[inline]
    pub fn node(&self, name: &str) -> Option<u32> {
        self.joint_map.get(name).copied()
    }

    /// Skin attached to mesh nodes (the last one built).
    pub fn mesh_skin(&self) -> Option<json::Index<json::Skin>> {
        self.skins
            .len()
            .checked_sub(1)
            .map(|i| json::Index::new(i as u32))
    }

    /// Whether `JOINTS_0` needs 16-bit components.
    pub fn needs_wide_joints(&self) -> bool {
        self.joint_count > u8::MAX as usize + 1
    }
}

/// Build joint nodes depth first from the top-level joints of `model`.
///
/// Nodes are appended to `nodes`, so joint node indices start at its
/// current length.
pub fn build_skeleton(model: &DmeModel, options: &ExportOptions, nodes: &mut Vec<json::Node>) -> Skeleton {
    let mut skeleton = Skeleton::default();

    for child in model.children() {
        let DagNode::Joint(joint) = child else {
            continue;
        };

        let mut joints = Vec::new();
        let Some(root) = add_joint(joint, options, nodes, &mut skeleton.joint_map, &mut joints) else {
            trace!("skeleton root {:?} excluded", joint.name());
            continue;
        };

        skeleton.joint_count += joints.len();
        skeleton.roots.push(root);
        skeleton.skins.push(json::Skin {
            extensions: Default::default(),
            extras: Default::default(),
            inverse_bind_matrices: None,
            joints: joints.into_iter().map(json::Index::new).collect(),
            name: Some(SKIN_NAME.to_string()),
            skeleton: Some(json::Index::new(root)),
        });
    }

    debug!(
        "skeleton {:?}: {} joints in {} skins",
        model.name(),
        skeleton.joint_count,
        skeleton.skins.len()
    );
    skeleton
}

/// Emit `joint` and its joint descendants; `None` when the joint is excluded.
fn add_joint(
    joint: &DmeJoint,
    options: &ExportOptions,
    nodes: &mut Vec<json::Node>,
    joint_map: &mut HashMap<String, u32>,
    joints: &mut Vec<u32>,
) -> Option<u32> {
    if options.is_excluded(joint.name()) {
        return None;
    }

    let index = nodes.len() as u32;
    let rotation = joint.dag.rotation();
    nodes.push(json::Node {
        camera: None,
        children: None,
        extensions: Default::default(),
        extras: Default::default(),
        matrix: None,
        mesh: None,
        name: Some(joint.name().to_string()),
        rotation: Some(json::scene::UnitQuaternion(rotation.to_array())),
        scale: None,
        translation: Some((joint.dag.translation() * options.scale).to_array()),
        skin: None,
        weights: None,
    });
    joint_map.insert(joint.name().to_string(), index);
    joints.push(index);

    let children: Vec<json::Index<json::Node>> = joint
        .joints()
        .filter_map(|child| add_joint(child, options, nodes, joint_map, joints))
        .map(json::Index::new)
        .collect();
    if !children.is_empty() {
        nodes[index as usize].children = Some(children);
    }

    Some(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dme::{DmeDag, DmeTransform};
    use crate::util::{Quat, Vec3};

    fn joint(name: &str, position: Vec3, children: Vec<DmeJoint>) -> DmeJoint {
        DmeJoint {
            dag: DmeDag {
                name: name.to_string(),
                transform: Some(DmeTransform {
                    name: name.to_string(),
                    position,
                    orientation: Quat::IDENTITY,
                }),
                visible: true,
                children: children.into_iter().map(DagNode::Joint).collect(),
                shape: None,
            },
            lock_influence_weights: false,
        }
    }

    fn model(children: Vec<DagNode>) -> DmeModel {
        DmeModel {
            dag: DmeDag {
                name: "skeleton".into(),
                transform: None,
                visible: true,
                children,
                shape: None,
            },
            joint_names: Vec::new(),
            base_states: Vec::new(),
        }
    }

    #[test]
    fn test_depth_first_order_and_pruning() {
        let root = joint(
            "root",
            Vec3::new(0.0, 50.0, 0.0),
            vec![
                joint("spine", Vec3::ZERO, vec![joint("head", Vec3::ZERO, vec![])]),
                joint("hand_End", Vec3::ZERO, vec![joint("finger", Vec3::ZERO, vec![])]),
                joint("arm", Vec3::ZERO, vec![]),
            ],
        );
        let mut nodes = Vec::new();
        let skeleton = build_skeleton(&model(vec![DagNode::Joint(root)]), &ExportOptions::default(), &mut nodes);

        let names: Vec<_> = nodes.iter().filter_map(|n| n.name.clone()).collect();
        assert_eq!(names, ["root", "spine", "head", "arm"]);
        assert_eq!(skeleton.node("arm"), Some(3));
        assert_eq!(skeleton.node("hand_End"), None);
        assert_eq!(skeleton.node("finger"), None);
        assert_eq!(skeleton.roots, [0]);
        assert_eq!(skeleton.joint_count, 4);

        let root_children: Vec<u32> = nodes[0]
            .children
            .as_ref()
            .map(|c| c.iter().map(|i| i.value() as u32).collect())
            .unwrap_or_default();
        assert_eq!(root_children, [1, 3]);
        assert_eq!(nodes[0].translation, Some([0.0, 1.0, 0.0]));
    }

    #[test]
    fn test_one_skin_per_root() {
        let mut nodes = Vec::new();
        let skeleton = build_skeleton(
            &model(vec![
                DagNode::Joint(joint("a", Vec3::ZERO, vec![joint("b", Vec3::ZERO, vec![])])),
                DagNode::Joint(joint("parentConstraint_x", Vec3::ZERO, vec![])),
                DagNode::Joint(joint("c", Vec3::ZERO, vec![])),
            ]),
            &ExportOptions::default(),
            &mut nodes,
        );

        assert_eq!(skeleton.skins.len(), 2);
        assert_eq!(skeleton.roots, [0, 2]);
        assert_eq!(skeleton.skins[0].joints.len(), 2);
        assert_eq!(skeleton.skins[1].name.as_deref(), Some(SKIN_NAME));
        assert_eq!(skeleton.mesh_skin().map(|s| s.value()), Some(1));
        assert!(!skeleton.needs_wide_joints());
    }
}
