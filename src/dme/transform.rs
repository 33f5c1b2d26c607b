//! DmeTransform and DmeTransformList.

use super::context::{ElementView, FromElement, Materializer};
use crate::util::{Quat, Result, Vec3};

/// Local translation and rotation of a DAG node.
#[derive(Clone, Debug, PartialEq)]
pub struct DmeTransform {
    pub name: String,
    pub position: Vec3,
    pub orientation: Quat,
}

impl Default for DmeTransform {
    fn default() -> Self {
        Self {
            name: String::new(),
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
        }
    }
}

impl FromElement for DmeTransform {
    const TYPE_NAME: &'static str = "DmeTransform";

    fn from_element(_m: &mut Materializer<'_>, el: ElementView<'_>) -> Result<Self> {
        Ok(Self {
            name: el.name().to_string(),
            position: el.get("position")?,
            orientation: el.get("orientation")?,
        })
    }
}

/// Named list of transforms (a model's base pose states).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DmeTransformList {
    pub name: String,
    pub transforms: Vec<DmeTransform>,
}

impl FromElement for DmeTransformList {
    const TYPE_NAME: &'static str = "DmeTransformList";

    fn from_element(m: &mut Materializer<'_>, el: ElementView<'_>) -> Result<Self> {
        Ok(Self {
            name: el.name().to_string(),
            transforms: m.require_children(el, "transforms")?,
        })
    }
}
