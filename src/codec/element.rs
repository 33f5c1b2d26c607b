//! Raw element graph storage.
//!
//! Elements live in a flat arena and refer to each other by index, which
//! keeps forward and cyclic references representable without shared
//! ownership.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use super::format::NULL_ELEMENT_INDEX;
use super::value::AttributeValue;
use crate::util::{Error, Result};

/// Index of an element inside an [`ElementArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u32);

impl ElementId {
    /// The document root is always the first element.
    pub const ROOT: Self = Self(0);

    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A named attribute of a raw element.
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub name: Arc<str>,
    pub value: AttributeValue,
}

/// An untyped element as decoded from the stream.
#[derive(Clone, Debug, PartialEq)]
pub struct RawElement {
    pub id: Uuid,
    pub type_name: Arc<str>,
    pub name: String,
    /// Attributes in stream order.
    pub attributes: Vec<Attribute>,
}

impl RawElement {
    /// Create an element with no attributes yet.
    pub fn new(id: Uuid, type_name: Arc<str>, name: impl Into<String>) -> Self {
        Self {
            id,
            type_name,
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    /// Look up an attribute. A key repeated in the stream resolves to its last value.
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .rev()
            .find(|a| &*a.name == name)
            .map(|a| &a.value)
    }

    /// Whether the element is of the given type.
    #[inline]
    pub fn is_type(&self, type_name: &str) -> bool {
        &*self.type_name == type_name
    }
}

/// Flat storage for every element of one decode session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ElementArena {
    elements: Vec<RawElement>,
}

impl ElementArena {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { elements: Vec::with_capacity(capacity) }
    }

    /// Append an element and return its id.
    pub fn push(&mut self, element: RawElement) -> ElementId {
        let id = ElementId::new(self.elements.len() as u32);
        self.elements.push(element);
        id
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Get an element. Ids handed out by this arena are always valid.
    #[inline]
    pub fn get(&self, id: ElementId) -> &RawElement {
        &self.elements[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: ElementId) -> &mut RawElement {
        &mut self.elements[id.index()]
    }

    /// Iterate over all elements with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &RawElement)> {
        self.elements
            .iter()
            .enumerate()
            .map(|(i, e)| (ElementId::new(i as u32), e))
    }
}

/// Turn a wire element index into an id, given the number of allocated elements.
///
/// `-1` is the null marker and resolves to `None`.
pub fn resolve_element_index(index: i32, count: usize) -> Result<Option<ElementId>> {
    if index == NULL_ELEMENT_INDEX {
        return Ok(None);
    }
    if index < 0 || index as usize >= count {
        return Err(Error::InvalidElementIndex { index, count });
    }
    Ok(Some(ElementId::new(index as u32)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_element_index() {
        assert_eq!(resolve_element_index(-1, 3).unwrap(), None);
        assert_eq!(resolve_element_index(2, 3).unwrap(), Some(ElementId::new(2)));
        assert!(matches!(
            resolve_element_index(3, 3),
            Err(Error::InvalidElementIndex { index: 3, count: 3 })
        ));
        assert!(resolve_element_index(-2, 3).is_err());
    }

    #[test]
    fn test_last_attribute_wins() {
        let mut e = RawElement::new(Uuid::nil(), Arc::from("DmElement"), "root");
        e.attributes.push(Attribute { name: Arc::from("a"), value: AttributeValue::Int(1) });
        e.attributes.push(Attribute { name: Arc::from("a"), value: AttributeValue::Int(2) });
        assert_eq!(e.attribute("a"), Some(&AttributeValue::Int(2)));
        assert_eq!(e.attribute("b"), None);
        assert!(e.is_type("DmElement"));
    }

    #[test]
    fn test_arena_ids() {
        let mut arena = ElementArena::default();
        let a = arena.push(RawElement::new(Uuid::nil(), Arc::from("A"), "a"));
        let uuid = Uuid::from_bytes([7; 16]);
        let b = arena.push(RawElement::new(uuid, Arc::from("B"), "b"));
        assert_eq!(a, ElementId::ROOT);
        assert_eq!(arena.get(b).name, "b");
        assert_eq!(arena.get(b).id, uuid);
        assert_eq!(arena.len(), 2);
    }
}
