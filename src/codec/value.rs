//! Decoded attribute values.

use super::element::ElementId;
use super::format::AttributeType;
use crate::util::{ticks_to_seconds, Mat4, Quat, Vec2, Vec3, Vec4};

/// Time value stored as ticks of 1/10000 s.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DmxTime(pub i32);

impl DmxTime {
    /// Raw tick count.
    #[inline]
    pub const fn ticks(self) -> i32 {
        self.0
    }

    /// Time in seconds.
    #[inline]
    pub fn seconds(self) -> f32 {
        ticks_to_seconds(self.0)
    }
}

/// 8-bit RGBA color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// One decoded attribute value: a scalar or a homogeneous array.
///
/// Element references are arena indices; `None` inside an element reference
/// is the on-disk null marker.
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    None,
    Element(Option<ElementId>),
    Int(i32),
    Float(f32),
    Bool(bool),
    String(String),
    Binary(Vec<u8>),
    Time(DmxTime),
    Color(Color),
    Vector2(Vec2),
    Vector3(Vec3),
    Vector4(Vec4),
    QAngle(Vec3),
    Quaternion(Quat),
    /// Matrix with rows as stored in the file.
    Matrix(Mat4),

    ElementArray(Vec<Option<ElementId>>),
    IntArray(Vec<i32>),
    FloatArray(Vec<f32>),
    BoolArray(Vec<bool>),
    StringArray(Vec<String>),
    BinaryArray(Vec<Vec<u8>>),
    TimeArray(Vec<DmxTime>),
    ColorArray(Vec<Color>),
    Vector2Array(Vec<Vec2>),
    Vector3Array(Vec<Vec3>),
    Vector4Array(Vec<Vec4>),
    QAngleArray(Vec<Vec3>),
    QuaternionArray(Vec<Quat>),
    MatrixArray(Vec<Mat4>),
}

impl AttributeValue {
    /// Scalar kind of this value (element kind for arrays).
    pub fn kind(&self) -> AttributeType {
        use AttributeValue::*;
        match self {
            None => AttributeType::None,
            Element(_) | ElementArray(_) => AttributeType::Element,
            Int(_) | IntArray(_) => AttributeType::Int,
            Float(_) | FloatArray(_) => AttributeType::Float,
            Bool(_) | BoolArray(_) => AttributeType::Bool,
            String(_) | StringArray(_) => AttributeType::String,
            Binary(_) | BinaryArray(_) => AttributeType::Binary,
            Time(_) | TimeArray(_) => AttributeType::Time,
            Color(_) | ColorArray(_) => AttributeType::Color,
            Vector2(_) | Vector2Array(_) => AttributeType::Vector2,
            Vector3(_) | Vector3Array(_) => AttributeType::Vector3,
            Vector4(_) | Vector4Array(_) => AttributeType::Vector4,
            QAngle(_) | QAngleArray(_) => AttributeType::QAngle,
            Quaternion(_) | QuaternionArray(_) => AttributeType::Quaternion,
            Matrix(_) | MatrixArray(_) => AttributeType::Matrix,
        }
    }

    /// Whether this is one of the array variants.
    pub fn is_array(&self) -> bool {
        use AttributeValue::*;
        matches!(
            self,
            ElementArray(_)
                | IntArray(_)
                | FloatArray(_)
                | BoolArray(_)
                | StringArray(_)
                | BinaryArray(_)
                | TimeArray(_)
                | ColorArray(_)
                | Vector2Array(_)
                | Vector3Array(_)
                | Vector4Array(_)
                | QAngleArray(_)
                | QuaternionArray(_)
                | MatrixArray(_)
        )
    }

    /// Number of entries for arrays, `None` for scalars.
    pub fn array_len(&self) -> Option<usize> {
        use AttributeValue::*;
        Some(match self {
            ElementArray(v) => v.len(),
            IntArray(v) => v.len(),
            FloatArray(v) => v.len(),
            BoolArray(v) => v.len(),
            StringArray(v) => v.len(),
            BinaryArray(v) => v.len(),
            TimeArray(v) => v.len(),
            ColorArray(v) => v.len(),
            Vector2Array(v) => v.len(),
            Vector3Array(v) | QAngleArray(v) => v.len(),
            Vector4Array(v) => v.len(),
            QuaternionArray(v) => v.len(),
            MatrixArray(v) => v.len(),
            _ => return Option::None,
        })
    }

    /// Human readable type name, e.g. `vector3` or `vector3_array`.
    pub fn type_name(&self) -> &'static str {
        use AttributeValue::*;
        match self {
            None => "none",
            Element(_) => "element",
            Int(_) => "int",
            Float(_) => "float",
            Bool(_) => "bool",
            String(_) => "string",
            Binary(_) => "binary",
            Time(_) => "time",
            Color(_) => "color",
            Vector2(_) => "vector2",
            Vector3(_) => "vector3",
            Vector4(_) => "vector4",
            QAngle(_) => "qangle",
            Quaternion(_) => "quaternion",
            Matrix(_) => "matrix",
            ElementArray(_) => "element_array",
            IntArray(_) => "int_array",
            FloatArray(_) => "float_array",
            BoolArray(_) => "bool_array",
            StringArray(_) => "string_array",
            BinaryArray(_) => "binary_array",
            TimeArray(_) => "time_array",
            ColorArray(_) => "color_array",
            Vector2Array(_) => "vector2_array",
            Vector3Array(_) => "vector3_array",
            Vector4Array(_) => "vector4_array",
            QAngleArray(_) => "qangle_array",
            QuaternionArray(_) => "quaternion_array",
            MatrixArray(_) => "matrix_array",
        }
    }
}
