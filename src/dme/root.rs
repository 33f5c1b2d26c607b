//! Document root element.

use tracing::debug;

use super::animation::DmeAnimationList;
use super::context::{ElementView, FromElement, Materializer};
use super::dag::DmeModel;
use crate::codec::{DmxDocument, ElementId};
use crate::util::Result;

/// Root of a model/animation DMX file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DmElement {
    pub name: String,
    pub model: Option<DmeModel>,
    pub skeleton: Option<DmeModel>,
    pub animation_list: Option<DmeAnimationList>,
}

impl DmElement {
    /// Materialize the domain tree of a decoded document.
    pub fn from_document(doc: &DmxDocument) -> Result<Self> {
        let mut m = Materializer::new(&doc.elements);
        let root = m.view(ElementId::ROOT);
        let element: Self = m.parse(root)?;
        debug!(
            "materialized {:?}: model={}, skeleton={}, animations={}",
            element.name,
            element.model.is_some(),
            element.skeleton.is_some(),
            element.animation_list.as_ref().map_or(0, |a| a.animations.len())
        );
        Ok(element)
    }
}

impl FromElement for DmElement {
    const TYPE_NAME: &'static str = "DmElement";

    fn from_element(m: &mut Materializer<'_>, el: ElementView<'_>) -> Result<Self> {
        Ok(Self {
            name: el.name().to_string(),
            model: m.child(el, "model")?,
            skeleton: m.child(el, "skeleton")?,
            animation_list: m.child(el, "animationList")?,
        })
    }
}
