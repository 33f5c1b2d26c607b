//! Scene hierarchy: models, plain DAG nodes, joints and attachments.
//!
//! DAG children are a closed set of node kinds, dispatched once on the
//! child's type string. Any other type in a `children` list is fatal.

use tracing::trace;

use super::context::{ElementView, FromElement, Materializer};
use super::mesh::DmeMesh;
use super::transform::{DmeTransform, DmeTransformList};
use crate::util::{Quat, Result, Vec3};

// ============================================================================
// Shared DAG data
// ============================================================================

/// Data every DAG node carries.
#[derive(Clone, Debug, PartialEq)]
pub struct DmeDag {
    pub name: String,
    pub transform: Option<DmeTransform>,
    pub visible: bool,
    pub children: Vec<DagNode>,
    /// Geometry attached through the `shape` attribute.
    pub shape: Option<Shape>,
}

impl DmeDag {
    /// Read the common DAG attributes of `el`.
    pub(super) fn read(m: &mut Materializer<'_>, el: ElementView<'_>, transform_required: bool) -> Result<Self> {
        let transform = if transform_required {
            Some(m.require_child(el, "transform")?)
        } else {
            m.child(el, "transform")?
        };

        let children = el
            .element_array("children")?
            .unwrap_or_default()
            .into_iter()
            .map(|child| DagNode::parse(m, child))
            .collect::<Result<Vec<_>>>()?;

        let shape = match el.element("shape")? {
            Some(shape) => Shape::parse(m, shape)?,
            None => None,
        };

        Ok(Self {
            name: el.name().to_string(),
            transform,
            visible: el.get_or("visible", true)?,
            children,
            shape,
        })
    }

    /// Local translation, zero without a transform.
    pub fn translation(&self) -> Vec3 {
        self.transform.as_ref().map_or(Vec3::ZERO, |t| t.position)
    }

    /// Local rotation, identity without a transform.
    pub fn rotation(&self) -> Quat {
        self.transform.as_ref().map_or(Quat::IDENTITY, |t| t.orientation)
    }

    /// Joint-typed direct children.
    pub fn joints(&self) -> impl Iterator<Item = &DmeJoint> {
        self.children.iter().filter_map(DagNode::as_joint)
    }

    /// Mesh attached as shape, if any.
    pub fn mesh(&self) -> Option<&DmeMesh> {
        match &self.shape {
            Some(Shape::Mesh(mesh)) => Some(mesh),
            _ => None,
        }
    }
}

impl FromElement for DmeDag {
    const TYPE_NAME: &'static str = "DmeDag";

    fn from_element(m: &mut Materializer<'_>, el: ElementView<'_>) -> Result<Self> {
        Self::read(m, el, false)
    }
}

// ============================================================================
// Polymorphic children
// ============================================================================

/// A child in a DAG `children` list.
#[derive(Clone, Debug, PartialEq)]
pub enum DagNode {
    Dag(DmeDag),
    Joint(DmeJoint),
    Attachment(DmeAttachment),
    Mesh(DmeMesh),
}

impl DagNode {
    /// Dispatch on the element type.
    pub fn parse(m: &mut Materializer<'_>, el: ElementView<'_>) -> Result<Self> {
        match el.type_name() {
            t if t == DmeDag::TYPE_NAME => m.parse(el).map(Self::Dag),
            t if t == DmeJoint::TYPE_NAME => m.parse(el).map(Self::Joint),
            t if t == DmeAttachment::TYPE_NAME => m.parse(el).map(Self::Attachment),
            t if t == DmeMesh::TYPE_NAME => m.parse(el).map(Self::Mesh),
            _ => Err(el.wrong_type("DmeDag, DmeJoint, DmeAttachment or DmeMesh")),
        }
    }

    /// Common DAG data of any node kind.
    pub fn dag(&self) -> &DmeDag {
        match self {
            Self::Dag(dag) => dag,
            Self::Joint(joint) => &joint.dag,
            Self::Attachment(attachment) => &attachment.dag,
            Self::Mesh(mesh) => &mesh.dag,
        }
    }

    pub fn name(&self) -> &str {
        &self.dag().name
    }

    pub fn as_joint(&self) -> Option<&DmeJoint> {
        match self {
            Self::Joint(joint) => Some(joint),
            _ => None,
        }
    }
}

/// Geometry referenced by a DAG node's `shape` attribute.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Mesh(Box<DmeMesh>),
    Attachment(Box<DmeAttachment>),
}

impl Shape {
    /// Other shape kinds are not converted and read as `None`.
    fn parse(m: &mut Materializer<'_>, el: ElementView<'_>) -> Result<Option<Self>> {
        Ok(match el.type_name() {
            t if t == DmeMesh::TYPE_NAME => Some(Self::Mesh(Box::new(m.parse(el)?))),
            t if t == DmeAttachment::TYPE_NAME => Some(Self::Attachment(Box::new(m.parse(el)?))),
            other => {
                trace!("ignoring shape {:?} of type {}", el.name(), other);
                None
            }
        })
    }
}

// ============================================================================
// Model
// ============================================================================

/// Top level model or skeleton node.
#[derive(Clone, Debug, PartialEq)]
pub struct DmeModel {
    pub dag: DmeDag,
    /// Names of the skinning joints, in the order vertex joint indices use.
    pub joint_names: Vec<String>,
    pub base_states: Vec<DmeTransformList>,
}

impl DmeModel {
    pub fn name(&self) -> &str {
        &self.dag.name
    }

    pub fn children(&self) -> &[DagNode] {
        &self.dag.children
    }

    /// Whether vertex joint indices can be resolved.
    pub fn has_joints(&self) -> bool {
        !self.joint_names.is_empty()
    }
}

impl FromElement for DmeModel {
    const TYPE_NAME: &'static str = "DmeModel";

    fn from_element(m: &mut Materializer<'_>, el: ElementView<'_>) -> Result<Self> {
        let dag = DmeDag::read(m, el, true)?;

        // Newer files list the joints, older ones their transforms; names match either way.
        let joint_names = match el.element_array("jointList")? {
            Some(joints) => joints.iter().map(|j| j.name().to_string()).collect(),
            None => el
                .element_array("jointTransforms")?
                .unwrap_or_default()
                .iter()
                .map(|t| t.name().to_string())
                .collect(),
        };

        Ok(Self {
            dag,
            joint_names,
            base_states: m.children(el, "baseStates")?,
        })
    }
}

// ============================================================================
// Joint
// ============================================================================

/// Skeleton bone.
#[derive(Clone, Debug, PartialEq)]
pub struct DmeJoint {
    pub dag: DmeDag,
    pub lock_influence_weights: bool,
}

impl DmeJoint {
    pub fn name(&self) -> &str {
        &self.dag.name
    }

    /// Joint-typed children; other child kinds do not extend the skeleton.
    pub fn joints(&self) -> impl Iterator<Item = &DmeJoint> {
        self.dag.joints()
    }
}

impl FromElement for DmeJoint {
    const TYPE_NAME: &'static str = "DmeJoint";

    fn from_element(m: &mut Materializer<'_>, el: ElementView<'_>) -> Result<Self> {
        Ok(Self {
            dag: DmeDag::read(m, el, true)?,
            lock_influence_weights: el.get_or("lockInfluenceWeights", false)?,
        })
    }
}

// ============================================================================
// Attachment
// ============================================================================

/// Named attachment point.
#[derive(Clone, Debug, PartialEq)]
pub struct DmeAttachment {
    pub dag: DmeDag,
    pub is_rigid: bool,
    pub is_world_aligned: bool,
}

impl FromElement for DmeAttachment {
    const TYPE_NAME: &'static str = "DmeAttachment";

    fn from_element(m: &mut Materializer<'_>, el: ElementView<'_>) -> Result<Self> {
        Ok(Self {
            dag: DmeDag::read(m, el, false)?,
            is_rigid: el.get_or("isRigid", false)?,
            is_world_aligned: el.get_or("isWorldAligned", false)?,
        })
    }
}
