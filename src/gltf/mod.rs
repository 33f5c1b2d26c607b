//! glTF 2.0 scene assembly.
//!
//! [`convert`] projects a materialized [`DmElement`] into one glTF
//! document:
//!
//! 1. joint nodes and skins from the skeleton model
//! 2. one node and mesh per DMX mesh in the model, with one primitive per
//!    face set
//! 3. one animation per clip, targeting joint nodes by name
//!
//! All binary data goes into a single buffer.

mod animation;
mod buffer;
mod document;
mod material;
mod mesh;
mod skeleton;

pub use animation::{convert_clip, key_times};
pub use buffer::BufferBuilder;
pub use document::GltfDocument;
pub use material::MaterialTable;
pub use mesh::{flip_uv, reindex, skin_slots, triangulate, SkinSlots, JOINT_SLOTS, MESH_SUFFIX};
pub use skeleton::{build_skeleton, Skeleton, SKIN_NAME};

use gltf_json as json;
use tracing::info;

use crate::dme::DmElement;
use crate::util::Result;
use mesh::MeshContext;

/// Default uniform scale from DMX units.
pub const DEFAULT_SCALE: f32 = 0.02;

/// Joints whose name contains one of these are dropped with their subtree.
pub const DEFAULT_EXCLUDE_MARKERS: &[&str] = &["End", "parentConstraint"];

// ============================================================================
// Options
// ============================================================================

/// Conversion settings.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportOptions {
    /// Applied to positions and translations.
    pub scale: f32,
    /// Substrings excluding a joint by name.
    pub exclude_markers: Vec<String>,
    /// Document title, used for unnamed animations.
    pub title: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            exclude_markers: DEFAULT_EXCLUDE_MARKERS.iter().map(|m| m.to_string()).collect(),
            title: String::new(),
        }
    }
}

impl ExportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_exclude_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Whether a joint of this name is dropped.
    pub fn is_excluded(&self, joint_name: &str) -> bool {
        self.exclude_markers.iter().any(|m| joint_name.contains(m.as_str()))
    }
}

// ============================================================================
// Conversion
// ============================================================================

fn generator() -> String {
    format!(
        "{} {} ({})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        env!("DMX_GLTF_BUILD_DATE")
    )
}

/// Convert a materialized DMX tree into a glTF document.
///
/// The skeleton comes from `skeleton`, falling back to `model` when the
/// file has no separate skeleton.
pub fn convert(element: &DmElement, options: &ExportOptions) -> Result<GltfDocument> {
    let mut nodes = Vec::new();
    let mut buffer = BufferBuilder::new();
    let mut materials = MaterialTable::new();

    let skeleton = element
        .skeleton
        .as_ref()
        .or(element.model.as_ref())
        .map(|model| build_skeleton(model, options, &mut nodes))
        .unwrap_or_default();

    let mut scene_nodes: Vec<u32> = skeleton.roots.clone();
    let mut meshes = Vec::new();

    if let Some(model) = &element.model {
        let mut ctx = MeshContext {
            options,
            skeleton: &skeleton,
            joint_names: &model.joint_names,
            buffer: &mut buffer,
            materials: &mut materials,
            meshes: Vec::new(),
            nodes: &mut nodes,
            mesh_nodes: Vec::new(),
        };
        ctx.convert_model(model)?;
        scene_nodes.extend(ctx.mesh_nodes);
        meshes = ctx.meshes;
    }

    let fallback_name = if options.title.is_empty() { element.name.as_str() } else { options.title.as_str() };
    let animations: Vec<json::Animation> = element
        .animation_list
        .iter()
        .flat_map(|list| &list.animations)
        .filter_map(|clip| animation::convert_clip(clip, fallback_name, &skeleton, options.scale, &mut buffer))
        .collect();

    info!(
        "converted {:?}: {} nodes, {} meshes, {} skins, {} animations, {} materials",
        fallback_name,
        nodes.len(),
        meshes.len(),
        skeleton.skins.len(),
        animations.len(),
        materials.len()
    );

    let (data, buffer_views, accessors) = buffer.finish();
    let buffers = if data.is_empty() {
        Vec::new()
    } else {
        vec![json::Buffer {
            byte_length: data.len().into(),
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            uri: None,
        }]
    };

    let root = json::Root {
        accessors,
        animations,
        asset: json::Asset {
            copyright: None,
            extensions: Default::default(),
            extras: Default::default(),
            generator: Some(generator()),
            min_version: None,
            version: "2.0".to_string(),
        },
        buffers,
        buffer_views,
        materials: materials.into_materials(),
        meshes,
        nodes,
        scene: Some(json::Index::new(0)),
        scenes: vec![json::Scene {
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            nodes: scene_nodes.into_iter().map(json::Index::new).collect(),
        }],
        skins: skeleton.skins,
        ..Default::default()
    };

    Ok(GltfDocument { root, buffer: data })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_builder() {
        let opts = ExportOptions::new()
            .with_scale(1.0)
            .with_exclude_markers(["Helper"])
            .with_title("hero");
        assert_eq!(opts.scale, 1.0);
        assert_eq!(opts.title, "hero");
        assert!(opts.is_excluded("arm_Helper"));
        assert!(!opts.is_excluded("arm_End"));
    }

    #[test]
    fn test_default_markers() {
        let opts = ExportOptions::default();
        assert_eq!(opts.scale, DEFAULT_SCALE);
        assert!(opts.is_excluded("finger_End"));
        assert!(opts.is_excluded("parentConstraint_hand"));
        assert!(!opts.is_excluded("spine_2"));
    }

    #[test]
    fn test_empty_element() {
        let doc = convert(&DmElement::default(), &ExportOptions::default()).unwrap();
        assert!(doc.root.nodes.is_empty());
        assert!(doc.root.buffers.is_empty());
        assert_eq!(doc.root.scenes.len(), 1);
        assert!(doc.root.asset.generator.unwrap().starts_with("dmx-gltf"));
    }
}
