//! DMX binary format constants and attribute type tags.

/// Opening token of the preamble line.
pub const HEADER_OPEN: &str = "<!--";

/// Closing token of the preamble line.
pub const HEADER_CLOSE: &str = "-->";

/// Number of space separated tokens in the preamble line.
pub const HEADER_TOKENS: usize = 9;

/// Encoding name of the supported binary variant.
pub const ENCODING_BINARY: &str = "binary";

/// Encoding name of the text variant (recognized, rejected).
pub const ENCODING_TEXT: &str = "text";

/// Offset between a scalar type tag and the tag of its array form.
pub const ARRAY_TAG_OFFSET: u8 = 14;

/// Highest valid type tag (array of matrices).
pub const MAX_TYPE_TAG: u8 = AttributeType::Matrix as u8 + ARRAY_TAG_OFFSET;

/// Element reference value meaning "no element".
pub const NULL_ELEMENT_INDEX: i32 = -1;

/// Size of an element id on the wire.
pub const ELEMENT_ID_SIZE: usize = 16;

/// Scalar attribute kinds as they appear on the wire.
///
/// Tags `0..=14` are scalars, tags `15..=28` are arrays of the scalar with
/// tag `tag - 14`. There is no array of [`AttributeType::None`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum AttributeType {
    None = 0,
    Element = 1,
    Int = 2,
    Float = 3,
    Bool = 4,
    String = 5,
    Binary = 6,
    Time = 7,
    Color = 8,
    Vector2 = 9,
    Vector3 = 10,
    Vector4 = 11,
    QAngle = 12,
    Quaternion = 13,
    Matrix = 14,
}

impl AttributeType {
    /// Decode a scalar tag (`0..=14`).
    pub const fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            0 => Self::None,
            1 => Self::Element,
            2 => Self::Int,
            3 => Self::Float,
            4 => Self::Bool,
            5 => Self::String,
            6 => Self::Binary,
            7 => Self::Time,
            8 => Self::Color,
            9 => Self::Vector2,
            10 => Self::Vector3,
            11 => Self::Vector4,
            12 => Self::QAngle,
            13 => Self::Quaternion,
            14 => Self::Matrix,
            _ => return None,
        })
    }

    /// Name used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Element => "element",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Binary => "binary",
            Self::Time => "time",
            Self::Color => "color",
            Self::Vector2 => "vector2",
            Self::Vector3 => "vector3",
            Self::Vector4 => "vector4",
            Self::QAngle => "qangle",
            Self::Quaternion => "quaternion",
            Self::Matrix => "matrix",
        }
    }
}

/// A decoded wire type tag: scalar kind plus array flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeTag {
    pub kind: AttributeType,
    pub is_array: bool,
}

impl TypeTag {
    /// Split a raw tag byte. Returns `None` for tags above [`MAX_TYPE_TAG`].
    pub const fn parse(tag: u8) -> Option<Self> {
        if tag <= ARRAY_TAG_OFFSET {
            match AttributeType::from_u8(tag) {
                Some(kind) => Some(Self { kind, is_array: false }),
                None => None,
            }
        } else if tag <= MAX_TYPE_TAG {
            match AttributeType::from_u8(tag - ARRAY_TAG_OFFSET) {
                Some(kind) => Some(Self { kind, is_array: true }),
                None => None,
            }
        } else {
            None
        }
    }

    /// Raw tag byte.
    pub const fn to_u8(self) -> u8 {
        if self.is_array {
            self.kind as u8 + ARRAY_TAG_OFFSET
        } else {
            self.kind as u8
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_tags() {
        for tag in 0..=14u8 {
            let t = TypeTag::parse(tag).unwrap();
            assert!(!t.is_array);
            assert_eq!(t.to_u8(), tag);
        }
    }

    #[test]
    fn test_array_tags() {
        let t = TypeTag::parse(15).unwrap();
        assert_eq!(t.kind, AttributeType::Element);
        assert!(t.is_array);

        let t = TypeTag::parse(28).unwrap();
        assert_eq!(t.kind, AttributeType::Matrix);
        assert!(t.is_array);
        assert_eq!(MAX_TYPE_TAG, 28);
    }

    #[test]
    fn test_out_of_range_tags() {
        assert!(TypeTag::parse(29).is_none());
        assert!(TypeTag::parse(0xFF).is_none());
    }
}
