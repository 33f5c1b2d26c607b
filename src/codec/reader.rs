//! Little-endian cursor over a DMX byte stream.
//!
//! [`BinaryReader::read_value`] is the type-tag driven attribute decoder:
//! it consumes exactly the payload implied by the tag and nothing more.

use std::io::{self, BufRead, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use uuid::Uuid;

use super::element::{resolve_element_index, ElementId};
use super::format::*;
use super::value::{AttributeValue, Color, DmxTime};
use crate::util::{Error, Mat4, Quat, Result, Vec2, Vec3, Vec4};

/// Upper bound for up-front allocations driven by counts read from the stream.
const MAX_PREALLOC: usize = 1 << 16;

/// Map an I/O failure at `pos` into a decode error.
fn io_error(pos: u64, err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        Error::UnexpectedEof(pos)
    } else {
        Error::Io(err)
    }
}

/// Buffered reader that tracks its byte position.
pub struct BinaryReader<R> {
    inner: R,
    pos: u64,
}

impl<R: BufRead> BinaryReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, pos: 0 }
    }

    /// Current byte offset from the start of the stream.
    #[inline]
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Read one `\n` terminated line (terminator not included).
    pub fn read_line(&mut self) -> Result<String> {
        let pos = self.pos;
        let mut buf = Vec::new();
        let n = self.inner.read_until(b'\n', &mut buf).map_err(|e| io_error(pos, e))?;
        if n == 0 {
            return Err(Error::UnexpectedEof(self.pos));
        }
        self.pos += n as u64;
        if buf.last() == Some(&b'\n') {
            buf.pop();
        }
        Ok(String::from_utf8(buf)?)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let pos = self.pos;
        let v = self.inner.read_u8().map_err(|e| io_error(pos, e))?;
        self.pos += 1;
        Ok(v)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        let pos = self.pos;
        let v = self.inner.read_i16::<LittleEndian>().map_err(|e| io_error(pos, e))?;
        self.pos += 2;
        Ok(v)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let pos = self.pos;
        let v = self.inner.read_i32::<LittleEndian>().map_err(|e| io_error(pos, e))?;
        self.pos += 4;
        Ok(v)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        let pos = self.pos;
        let v = self.inner.read_f32::<LittleEndian>().map_err(|e| io_error(pos, e))?;
        self.pos += 4;
        Ok(v)
    }

    /// Read `N` consecutive floats.
    fn read_floats<const N: usize>(&mut self) -> Result<[f32; N]> {
        let pos = self.pos;
        let mut out = [0.0f32; N];
        self.inner
            .read_f32_into::<LittleEndian>(&mut out)
            .map_err(|e| io_error(pos, e))?;
        self.pos += (N * 4) as u64;
        Ok(out)
    }

    /// Read exactly `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let pos = self.pos;
        let mut buf = Vec::with_capacity(len.min(MAX_PREALLOC));
        let got = (&mut self.inner)
            .take(len as u64)
            .read_to_end(&mut buf)
            .map_err(|e| io_error(pos, e))?;
        self.pos += got as u64;
        if got != len {
            return Err(Error::UnexpectedEof(self.pos));
        }
        Ok(buf)
    }

    /// Read a NUL terminated UTF-8 string (terminator stripped).
    pub fn read_cstring(&mut self) -> Result<String> {
        let pos = self.pos;
        let mut buf = Vec::new();
        let n = self.inner.read_until(0, &mut buf).map_err(|e| io_error(pos, e))?;
        self.pos += n as u64;
        if buf.pop() != Some(0) {
            return Err(Error::UnexpectedEof(self.pos));
        }
        Ok(String::from_utf8(buf)?)
    }

    /// Read an `i32` length prefixed blob.
    pub fn read_blob(&mut self) -> Result<Vec<u8>> {
        let len = self.read_len()?;
        self.read_bytes(len)
    }

    /// Read a 16 byte element id.
    pub fn read_uuid(&mut self) -> Result<Uuid> {
        let bytes = self.read_bytes(ELEMENT_ID_SIZE)?;
        Uuid::from_slice(&bytes).map_err(|e| Error::invalid(format!("bad element id: {e}")))
    }

    /// Read an `i32` count, rejecting negative values.
    pub fn read_len(&mut self) -> Result<usize> {
        let pos = self.pos;
        let len = self.read_i32()?;
        usize::try_from(len)
            .map_err(|_| Error::invalid(format!("negative length {len} at position {pos}")))
    }

    fn read_element_ref(&mut self, element_count: usize) -> Result<Option<ElementId>> {
        let index = self.read_i32()?;
        resolve_element_index(index, element_count)
    }

    fn read_color(&mut self) -> Result<Color> {
        let pos = self.pos;
        let mut rgba = [0u8; 4];
        self.inner.read_exact(&mut rgba).map_err(|e| io_error(pos, e))?;
        self.pos += 4;
        Ok(bytemuck::cast(rgba))
    }

    fn read_matrix(&mut self) -> Result<Mat4> {
        // Stored row by row.
        Ok(Mat4::from_cols_array(&self.read_floats::<16>()?).transpose())
    }

    /// Read `count` items with `f`, without trusting `count` for allocation.
    fn read_array<T>(
        &mut self,
        mut f: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        let count = self.read_len()?;
        let mut out = Vec::with_capacity(count.min(MAX_PREALLOC));
        for _ in 0..count {
            out.push(f(self)?);
        }
        Ok(out)
    }

    /// Decode one attribute payload for the raw type tag `tag`.
    ///
    /// Element references are checked against `element_count`, the size of the
    /// already allocated element arena.
    pub fn read_value(&mut self, tag: u8, element_count: usize) -> Result<AttributeValue> {
        let position = self.pos;
        let tag = TypeTag::parse(tag).ok_or(Error::UnknownAttributeType { tag, position })?;

        if !tag.is_array {
            return Ok(match tag.kind {
                AttributeType::None => AttributeValue::None,
                AttributeType::Element => AttributeValue::Element(self.read_element_ref(element_count)?),
                AttributeType::Int => AttributeValue::Int(self.read_i32()?),
                AttributeType::Float => AttributeValue::Float(self.read_f32()?),
                AttributeType::Bool => AttributeValue::Bool(self.read_u8()? != 0),
                AttributeType::String => AttributeValue::String(self.read_cstring()?),
                AttributeType::Binary => AttributeValue::Binary(self.read_blob()?),
                AttributeType::Time => AttributeValue::Time(DmxTime(self.read_i32()?)),
                AttributeType::Color => AttributeValue::Color(self.read_color()?),
                AttributeType::Vector2 => AttributeValue::Vector2(Vec2::from_array(self.read_floats()?)),
                AttributeType::Vector3 => AttributeValue::Vector3(Vec3::from_array(self.read_floats()?)),
                AttributeType::Vector4 => AttributeValue::Vector4(Vec4::from_array(self.read_floats()?)),
                AttributeType::QAngle => AttributeValue::QAngle(Vec3::from_array(self.read_floats()?)),
                AttributeType::Quaternion => AttributeValue::Quaternion(Quat::from_array(self.read_floats()?)),
                AttributeType::Matrix => AttributeValue::Matrix(self.read_matrix()?),
            });
        }

        Ok(match tag.kind {
            AttributeType::Element => {
                AttributeValue::ElementArray(self.read_array(|r| r.read_element_ref(element_count))?)
            }
            AttributeType::Int => AttributeValue::IntArray(self.read_array(Self::read_i32)?),
            AttributeType::Float => AttributeValue::FloatArray(self.read_array(Self::read_f32)?),
            AttributeType::Bool => AttributeValue::BoolArray(self.read_array(|r| Ok(r.read_u8()? != 0))?),
            AttributeType::String => AttributeValue::StringArray(self.read_array(Self::read_cstring)?),
            AttributeType::Binary => AttributeValue::BinaryArray(self.read_array(Self::read_blob)?),
            AttributeType::Time => AttributeValue::TimeArray(self.read_array(|r| Ok(DmxTime(r.read_i32()?)))?),
            AttributeType::Color => AttributeValue::ColorArray(self.read_array(Self::read_color)?),
            AttributeType::Vector2 => {
                AttributeValue::Vector2Array(self.read_array(|r| Ok(Vec2::from_array(r.read_floats()?)))?)
            }
            AttributeType::Vector3 => {
                AttributeValue::Vector3Array(self.read_array(|r| Ok(Vec3::from_array(r.read_floats()?)))?)
            }
            AttributeType::Vector4 => {
                AttributeValue::Vector4Array(self.read_array(|r| Ok(Vec4::from_array(r.read_floats()?)))?)
            }
            AttributeType::QAngle => {
                AttributeValue::QAngleArray(self.read_array(|r| Ok(Vec3::from_array(r.read_floats()?)))?)
            }
            AttributeType::Quaternion => {
                AttributeValue::QuaternionArray(self.read_array(|r| Ok(Quat::from_array(r.read_floats()?)))?)
            }
            AttributeType::Matrix => AttributeValue::MatrixArray(self.read_array(Self::read_matrix)?),
            // TypeTag::parse never yields an array of None.
            AttributeType::None => return Err(Error::UnknownAttributeType { tag: tag.to_u8(), position }),
        })
    }
}
