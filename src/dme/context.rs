//! Typed access to raw elements.
//!
//! [`ElementView`] reads named attributes with shape-based downcasts,
//! [`Materializer`] turns element references into domain objects and
//! guards against reference cycles along the current path.

use crate::codec::{AttributeValue, Color, DmxTime, ElementArena, ElementId, RawElement};
use crate::util::{Error, Mat4, Quat, Result, Vec2, Vec3, Vec4};

// ============================================================================
// Attribute downcasts
// ============================================================================

/// Conversion from a generic attribute value into a concrete shape.
pub trait FromAttribute: Sized {
    /// Shape name used in mismatch errors.
    const EXPECTED: &'static str;

    /// `None` when the value has a different shape.
    fn from_attribute(value: &AttributeValue) -> Option<Self>;
}

macro_rules! from_attribute {
    ($ty:ty, $expected:literal, $($pat:pat => $out:expr),+ $(,)?) => {
        impl FromAttribute for $ty {
            const EXPECTED: &'static str = $expected;

            fn from_attribute(value: &AttributeValue) -> Option<Self> {
                match value {
                    $($pat => Some($out),)+
                    _ => None,
                }
            }
        }
    };
}

from_attribute!(bool, "bool", AttributeValue::Bool(v) => *v);
from_attribute!(i32, "int", AttributeValue::Int(v) => *v);
from_attribute!(f32, "float", AttributeValue::Float(v) => *v);
from_attribute!(String, "string", AttributeValue::String(v) => v.clone());
from_attribute!(Color, "color", AttributeValue::Color(v) => *v);
from_attribute!(Vec2, "vector2", AttributeValue::Vector2(v) => *v);
from_attribute!(Vec3, "vector3",
    AttributeValue::Vector3(v) => *v,
    AttributeValue::QAngle(v) => *v,
);
from_attribute!(Vec4, "vector4",
    AttributeValue::Vector4(v) => *v,
    AttributeValue::Quaternion(q) => Vec4::from(*q),
);
from_attribute!(Quat, "quaternion",
    AttributeValue::Quaternion(q) => *q,
    AttributeValue::Vector4(v) => Quat::from_vec4(*v),
);
from_attribute!(Mat4, "matrix", AttributeValue::Matrix(v) => *v);
from_attribute!(DmxTime, "time",
    AttributeValue::Time(v) => *v,
    AttributeValue::Int(v) => DmxTime(*v),
);

from_attribute!(Vec<bool>, "bool_array", AttributeValue::BoolArray(v) => v.clone());
from_attribute!(Vec<i32>, "int_array", AttributeValue::IntArray(v) => v.clone());
from_attribute!(Vec<f32>, "float_array", AttributeValue::FloatArray(v) => v.clone());
from_attribute!(Vec<String>, "string_array", AttributeValue::StringArray(v) => v.clone());
from_attribute!(Vec<Color>, "color_array", AttributeValue::ColorArray(v) => v.clone());
from_attribute!(Vec<Vec2>, "vector2_array", AttributeValue::Vector2Array(v) => v.clone());
from_attribute!(Vec<Vec3>, "vector3_array",
    AttributeValue::Vector3Array(v) => v.clone(),
    AttributeValue::QAngleArray(v) => v.clone(),
);
from_attribute!(Vec<Vec4>, "vector4_array",
    AttributeValue::Vector4Array(v) => v.clone(),
    AttributeValue::QuaternionArray(v) => v.iter().map(|q| Vec4::from(*q)).collect(),
);
from_attribute!(Vec<Quat>, "quaternion_array",
    AttributeValue::QuaternionArray(v) => v.clone(),
    AttributeValue::Vector4Array(v) => v.iter().map(|v| Quat::from_vec4(*v)).collect(),
);
from_attribute!(Vec<Mat4>, "matrix_array", AttributeValue::MatrixArray(v) => v.clone());
from_attribute!(Vec<DmxTime>, "time_array",
    AttributeValue::TimeArray(v) => v.clone(),
    AttributeValue::IntArray(v) => v.iter().map(|&t| DmxTime(t)).collect(),
);

// ============================================================================
// ElementView
// ============================================================================

/// Borrowed view of one raw element inside its arena.
#[derive(Clone, Copy)]
pub struct ElementView<'a> {
    arena: &'a ElementArena,
    id: ElementId,
}

impl<'a> ElementView<'a> {
    pub fn new(arena: &'a ElementArena, id: ElementId) -> Self {
        Self { arena, id }
    }

    #[inline]
    pub fn id(&self) -> ElementId {
        self.id
    }

    #[inline]
    pub fn raw(&self) -> &'a RawElement {
        self.arena.get(self.id)
    }

    #[inline]
    pub fn name(&self) -> &'a str {
        &self.raw().name
    }

    #[inline]
    pub fn type_name(&self) -> &'a str {
        &self.raw().type_name
    }

    /// Fail with [`Error::InvalidElementType`] unless the type matches.
    pub fn expect_type(&self, expected: &str) -> Result<()> {
        if self.raw().is_type(expected) {
            Ok(())
        } else {
            Err(self.wrong_type(expected))
        }
    }

    pub(crate) fn wrong_type(&self, expected: &str) -> Error {
        Error::InvalidElementType {
            expected: expected.to_string(),
            actual: self.type_name().to_string(),
            name: self.name().to_string(),
        }
    }

    fn missing(&self, key: &str) -> Error {
        Error::MissingAttribute {
            element: self.name().to_string(),
            element_type: self.type_name().to_string(),
            attribute: key.to_string(),
        }
    }

    /// Attribute value; a stored `none` counts as absent.
    pub fn value(&self, key: &str) -> Option<&'a AttributeValue> {
        self.raw()
            .attribute(key)
            .filter(|v| !matches!(v, AttributeValue::None))
    }

    /// Whether the attribute exists with a value.
    pub fn has(&self, key: &str) -> bool {
        self.value(key).is_some()
    }

    /// Optional attribute; wrong shape is still an error.
    pub fn get_opt<T: FromAttribute>(&self, key: &str) -> Result<Option<T>> {
        match self.value(key) {
            None => Ok(None),
            Some(v) => T::from_attribute(v).map(Some).ok_or_else(|| Error::AttributeTypeMismatch {
                attribute: key.to_string(),
                expected: T::EXPECTED,
                actual: v.type_name(),
            }),
        }
    }

    /// Required attribute.
    pub fn get<T: FromAttribute>(&self, key: &str) -> Result<T> {
        self.get_opt(key)?.ok_or_else(|| self.missing(key))
    }

    /// Optional attribute with a fallback.
    pub fn get_or<T: FromAttribute>(&self, key: &str, default: T) -> Result<T> {
        Ok(self.get_opt(key)?.unwrap_or(default))
    }

    /// Single element reference; absent or null gives `None`.
    pub fn element(&self, key: &str) -> Result<Option<ElementView<'a>>> {
        match self.value(key) {
            None => Ok(None),
            Some(AttributeValue::Element(id)) => Ok(id.map(|id| ElementView::new(self.arena, id))),
            Some(v) => Err(Error::AttributeTypeMismatch {
                attribute: key.to_string(),
                expected: "element",
                actual: v.type_name(),
            }),
        }
    }

    /// Required, non-null element reference.
    pub fn require_element(&self, key: &str) -> Result<ElementView<'a>> {
        self.element(key)?.ok_or_else(|| self.missing(key))
    }

    /// Element array with null entries skipped. `None` when absent.
    pub fn element_array(&self, key: &str) -> Result<Option<Vec<ElementView<'a>>>> {
        match self.value(key) {
            None => Ok(None),
            Some(AttributeValue::ElementArray(ids)) => Ok(Some(
                ids.iter()
                    .flatten()
                    .map(|&id| ElementView::new(self.arena, id))
                    .collect(),
            )),
            Some(v) => Err(Error::AttributeTypeMismatch {
                attribute: key.to_string(),
                expected: "element_array",
                actual: v.type_name(),
            }),
        }
    }

    /// Required element array.
    pub fn require_element_array(&self, key: &str) -> Result<Vec<ElementView<'a>>> {
        self.element_array(key)?.ok_or_else(|| self.missing(key))
    }
}

impl std::fmt::Debug for ElementView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {:?}", self.id, self.type_name(), self.name())
    }
}

// ============================================================================
// Materializer
// ============================================================================

/// A domain type built from a raw element of one fixed type.
pub trait FromElement: Sized {
    /// Required `type` string of the source element.
    const TYPE_NAME: &'static str;

    /// Build from an element whose type was already checked.
    fn from_element(m: &mut Materializer<'_>, el: ElementView<'_>) -> Result<Self>;
}

/// Builds domain objects from an element arena.
pub struct Materializer<'a> {
    arena: &'a ElementArena,
    active: Vec<ElementId>,
}

impl<'a> Materializer<'a> {
    pub fn new(arena: &'a ElementArena) -> Self {
        Self { arena, active: Vec::new() }
    }

    /// View of an element of this arena.
    pub fn view(&self, id: ElementId) -> ElementView<'a> {
        ElementView::new(self.arena, id)
    }

    /// Run `f` with `el` marked as being built; re-entering it is a cycle.
    pub fn guarded<T>(
        &mut self,
        el: ElementView<'_>,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        if self.active.contains(&el.id()) {
            return Err(Error::CyclicReference(el.name().to_string()));
        }
        self.active.push(el.id());
        let result = f(self);
        self.active.pop();
        result
    }

    /// Type-check and build one element.
    pub fn parse<T: FromElement>(&mut self, el: ElementView<'_>) -> Result<T> {
        el.expect_type(T::TYPE_NAME)?;
        self.guarded(el, |m| T::from_element(m, el))
    }

    /// Optional child element; absent or null gives `None`.
    pub fn child<T: FromElement>(&mut self, el: ElementView<'_>, key: &str) -> Result<Option<T>> {
        el.element(key)?.map(|child| self.parse(child)).transpose()
    }

    /// Required child element.
    pub fn require_child<T: FromElement>(&mut self, el: ElementView<'_>, key: &str) -> Result<T> {
        let child = el.require_element(key)?;
        self.parse(child)
    }

    /// Optional element list; absent gives an empty list.
    pub fn children<T: FromElement>(&mut self, el: ElementView<'_>, key: &str) -> Result<Vec<T>> {
        el.element_array(key)?
            .unwrap_or_default()
            .into_iter()
            .map(|child| self.parse(child))
            .collect()
    }

    /// Required element list.
    pub fn require_children<T: FromElement>(&mut self, el: ElementView<'_>, key: &str) -> Result<Vec<T>> {
        el.require_element_array(key)?
            .into_iter()
            .map(|child| self.parse(child))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Attribute;
    use std::sync::Arc;
    use uuid::Uuid;

    fn arena_with(attrs: Vec<(&str, AttributeValue)>) -> ElementArena {
        let mut arena = ElementArena::default();
        let mut e = RawElement::new(Uuid::nil(), Arc::from("DmeThing"), "thing");
        e.attributes = attrs
            .into_iter()
            .map(|(k, v)| Attribute { name: Arc::from(k), value: v })
            .collect();
        arena.push(e);
        arena
    }

    #[test]
    fn test_shape_downcasts() {
        let arena = arena_with(vec![
            ("angle", AttributeValue::QAngle(Vec3::new(1.0, 2.0, 3.0))),
            ("quat", AttributeValue::Vector4(Vec4::new(0.0, 0.0, 0.0, 1.0))),
            ("ticks", AttributeValue::IntArray(vec![1, 2])),
        ]);
        let el = ElementView::new(&arena, ElementId::ROOT);
        assert_eq!(el.get::<Vec3>("angle").unwrap(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(el.get::<Quat>("quat").unwrap(), Quat::IDENTITY);
        assert_eq!(el.get::<Vec<DmxTime>>("ticks").unwrap(), vec![DmxTime(1), DmxTime(2)]);
    }

    #[test]
    fn test_missing_and_mismatch() {
        let arena = arena_with(vec![
            ("flag", AttributeValue::Int(1)),
            ("nothing", AttributeValue::None),
        ]);
        let el = ElementView::new(&arena, ElementId::ROOT);
        assert!(matches!(el.get::<bool>("flag"), Err(Error::AttributeTypeMismatch { .. })));
        assert!(matches!(el.get::<bool>("absent"), Err(Error::MissingAttribute { .. })));
        assert!(matches!(el.get::<bool>("nothing"), Err(Error::MissingAttribute { .. })));
        assert!(el.get_or("absent", true).unwrap());
        assert!(!el.has("nothing"));
    }

    #[test]
    fn test_element_type_check() {
        let arena = arena_with(vec![]);
        let el = ElementView::new(&arena, ElementId::ROOT);
        assert!(el.expect_type("DmeThing").is_ok());
        assert!(matches!(el.expect_type("DmeModel"), Err(Error::InvalidElementType { .. })));
    }

    #[test]
    fn test_null_entries_skipped() {
        let arena = arena_with(vec![(
            "list",
            AttributeValue::ElementArray(vec![None, Some(ElementId::ROOT), None]),
        )]);
        let el = ElementView::new(&arena, ElementId::ROOT);
        assert_eq!(el.require_element_array("list").unwrap().len(), 1);
        assert!(el.element("list").is_err());
    }

    struct Looping;

    impl FromElement for Looping {
        const TYPE_NAME: &'static str = "DmeThing";

        fn from_element(m: &mut Materializer<'_>, el: ElementView<'_>) -> Result<Self> {
            m.require_child::<Looping>(el, "next")
        }
    }

    #[test]
    fn test_cycle_detected() {
        let arena = arena_with(vec![("next", AttributeValue::Element(Some(ElementId::ROOT)))]);
        let mut m = Materializer::new(&arena);
        let root = m.view(ElementId::ROOT);
        assert!(matches!(m.parse::<Looping>(root), Err(Error::CyclicReference(_))));
    }
}
