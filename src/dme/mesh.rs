//! Mesh geometry: vertex data, face sets and materials.

use super::context::{ElementView, FromElement, Materializer};
use super::dag::DmeDag;
use crate::util::{Result, Vec2, Vec3};

/// Polygon terminator inside a face set's `faces` stream.
pub const FACE_TERMINATOR: i32 = -1;

// ============================================================================
// Mesh
// ============================================================================

/// Polygon mesh with its current vertex state and face sets.
#[derive(Clone, Debug, PartialEq)]
pub struct DmeMesh {
    pub dag: DmeDag,
    pub current_state: DmeVertexData,
    pub base_states: Vec<DmeVertexData>,
    /// Morph deltas, carried but not converted.
    pub delta_states: Vec<DmeVertexDeltaData>,
    pub face_sets: Vec<DmeFaceSet>,
}

impl DmeMesh {
    pub fn name(&self) -> &str {
        &self.dag.name
    }
}

impl FromElement for DmeMesh {
    const TYPE_NAME: &'static str = "DmeMesh";

    fn from_element(m: &mut Materializer<'_>, el: ElementView<'_>) -> Result<Self> {
        Ok(Self {
            dag: DmeDag::read(m, el, false)?,
            current_state: m.require_child(el, "currentState")?,
            base_states: m.children(el, "baseStates")?,
            delta_states: m.children(el, "deltaStates")?,
            face_sets: m.require_children(el, "faceSets")?,
        })
    }
}

// ============================================================================
// Vertex data
// ============================================================================

/// Indexed per-vertex attribute streams.
///
/// Every attribute is a value array plus an index array; output vertex `i`
/// uses `values[indices[i]]`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DmeVertexData {
    pub name: String,
    pub vertex_format: Vec<String>,
    /// Joint influences stored per position value.
    pub joint_count: usize,
    pub positions: Vec<Vec3>,
    pub positions_indices: Vec<i32>,
    pub normals: Vec<Vec3>,
    pub normals_indices: Vec<i32>,
    pub texture_coordinates: Vec<Vec2>,
    pub texture_coordinates_indices: Vec<i32>,
    /// `joint_count` weights per position value.
    pub joint_weights: Vec<f32>,
    /// `joint_count` indices into the model joint list per position value.
    pub joint_indices: Vec<i32>,
}

impl DmeVertexData {
    /// Number of output vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions_indices.len()
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty() && !self.normals_indices.is_empty()
    }

    pub fn has_texture_coordinates(&self) -> bool {
        !self.texture_coordinates.is_empty() && !self.texture_coordinates_indices.is_empty()
    }

    /// Whether per-vertex joint indices and weights are present.
    pub fn has_skinning(&self) -> bool {
        self.joint_count > 0 && !self.joint_indices.is_empty() && !self.joint_weights.is_empty()
    }
}

impl FromElement for DmeVertexData {
    const TYPE_NAME: &'static str = "DmeVertexData";

    fn from_element(_m: &mut Materializer<'_>, el: ElementView<'_>) -> Result<Self> {
        let joint_count: i32 = el.get_or("jointCount", 0)?;
        Ok(Self {
            name: el.name().to_string(),
            vertex_format: el.get_or("vertexFormat", Vec::new())?,
            joint_count: joint_count.max(0) as usize,
            positions: el.get("positions")?,
            positions_indices: el.get("positionsIndices")?,
            normals: el.get_or("normals", Vec::new())?,
            normals_indices: el.get_or("normalsIndices", Vec::new())?,
            texture_coordinates: el.get_or("textureCoordinates", Vec::new())?,
            texture_coordinates_indices: el.get_or("textureCoordinatesIndices", Vec::new())?,
            joint_weights: el.get_or("jointWeights", Vec::new())?,
            joint_indices: el.get_or("jointIndices", Vec::new())?,
        })
    }
}

/// Morph target delta (not interpreted by the converter).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DmeVertexDeltaData {
    pub name: String,
    pub vertex_format: Vec<String>,
    pub flip_v_coordinates: bool,
    pub corrected: bool,
    pub positions: Vec<Vec3>,
    pub positions_indices: Vec<i32>,
    pub normals: Vec<Vec3>,
    pub normals_indices: Vec<i32>,
    pub wrinkle: Vec<f32>,
    pub wrinkle_indices: Vec<i32>,
}

impl FromElement for DmeVertexDeltaData {
    const TYPE_NAME: &'static str = "DmeVertexDeltaData";

    fn from_element(_m: &mut Materializer<'_>, el: ElementView<'_>) -> Result<Self> {
        Ok(Self {
            name: el.name().to_string(),
            vertex_format: el.get_or("vertexFormat", Vec::new())?,
            flip_v_coordinates: el.get_or("flipVCoordinates", false)?,
            corrected: el.get_or("corrected", false)?,
            positions: el.get_or("positions", Vec::new())?,
            positions_indices: el.get_or("positionsIndices", Vec::new())?,
            normals: el.get_or("normals", Vec::new())?,
            normals_indices: el.get_or("normalsIndices", Vec::new())?,
            wrinkle: el.get_or("wrinkle", Vec::new())?,
            wrinkle_indices: el.get_or("wrinkleIndices", Vec::new())?,
        })
    }
}

// ============================================================================
// Face sets and materials
// ============================================================================

/// Polygons sharing one material, as a `-1` terminated index stream.
#[derive(Clone, Debug, PartialEq)]
pub struct DmeFaceSet {
    pub name: String,
    pub material: DmeMaterial,
    pub faces: Vec<i32>,
}

impl DmeFaceSet {
    /// Number of polygons (terminated runs) in the stream.
    pub fn polygon_count(&self) -> usize {
        self.faces.iter().filter(|&&i| i == FACE_TERMINATOR).count()
    }
}

impl FromElement for DmeFaceSet {
    const TYPE_NAME: &'static str = "DmeFaceSet";

    fn from_element(m: &mut Materializer<'_>, el: ElementView<'_>) -> Result<Self> {
        Ok(Self {
            name: el.name().to_string(),
            material: m.require_child(el, "material")?,
            faces: el.get("faces")?,
        })
    }
}

/// Material reference by path.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DmeMaterial {
    pub name: String,
    /// Slash separated material path.
    pub mtl_name: String,
}

impl DmeMaterial {
    /// Last path segment of `mtl_name`.
    pub fn display_name(&self) -> &str {
        self.mtl_name.rsplit('/').next().unwrap_or(&self.mtl_name)
    }
}

impl FromElement for DmeMaterial {
    const TYPE_NAME: &'static str = "DmeMaterial";

    fn from_element(_m: &mut Materializer<'_>, el: ElementView<'_>) -> Result<Self> {
        Ok(Self {
            name: el.name().to_string(),
            mtl_name: el.get("mtlName")?,
        })
    }
}
