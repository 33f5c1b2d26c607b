//! Material deduplication by path.

use std::collections::HashMap;

use gltf_json as json;

use crate::dme::DmeMaterial;

/// Materials in first-seen order, keyed by full `mtlName` path.
#[derive(Debug, Default)]
pub struct MaterialTable {
    index: HashMap<String, u32>,
    materials: Vec<json::Material>,
}

impl MaterialTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `material`, adding it on first sight.
    pub fn get_or_insert(&mut self, material: &DmeMaterial) -> json::Index<json::Material> {
        if let Some(&i) = self.index.get(&material.mtl_name) {
            return json::Index::new(i);
        }
        let i = self.materials.len() as u32;
        self.materials.push(json::Material {
            name: Some(material.display_name().to_string()),
            ..Default::default()
        });
        self.index.insert(material.mtl_name.clone(), i);
        json::Index::new(i)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn into_materials(self) -> Vec<json::Material> {
        self.materials
    }
}
