//! Binary buffer packing with aligned views and typed accessors.

use bytemuck::Pod;
use gltf_json as json;
use json::accessor::{ComponentType, GenericComponentType, Type};
use json::buffer::Target;
use json::validation::Checked::Valid;

use crate::util::{bounds, min_max, Quat, Vec2, Vec3};

/// Pad `buffer` with zeros to a 4 byte boundary.
#[inline]
pub(crate) fn align_buffer(buffer: &mut Vec<u8>) {
    while buffer.len() % 4 != 0 {
        buffer.push(0);
    }
}

fn json_array(values: &[f32]) -> json::Value {
    json::Value::Array(values.iter().copied().map(json::Value::from).collect())
}

/// Accumulates the single binary buffer of a document.
#[derive(Default)]
pub struct BufferBuilder {
    data: Vec<u8>,
    views: Vec<json::buffer::View>,
    accessors: Vec<json::Accessor>,
}

impl BufferBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer, views and accessors, in that order.
    pub fn finish(self) -> (Vec<u8>, Vec<json::buffer::View>, Vec<json::Accessor>) {
        (self.data, self.views, self.accessors)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn accessors(&self) -> &[json::Accessor] {
        &self.accessors
    }

    /// Append `items` as a new view plus an accessor over it.
    fn push<T: Pod>(
        &mut self,
        items: &[T],
        component: ComponentType,
        type_: Type,
        target: Option<Target>,
        min_max: Option<(json::Value, json::Value)>,
    ) -> json::Index<json::Accessor> {
        let offset = self.data.len();
        self.data.extend_from_slice(bytemuck::cast_slice(items));
        let length = self.data.len() - offset;

        self.views.push(json::buffer::View {
            buffer: json::Index::new(0),
            byte_length: length.into(),
            byte_offset: Some(offset.into()),
            byte_stride: None,
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            target: target.map(Valid),
        });

        let (min, max) = match min_max {
            Some((min, max)) => (Some(min), Some(max)),
            None => (None, None),
        };
        let index = self.accessors.len() as u32;
        self.accessors.push(json::Accessor {
            buffer_view: Some(json::Index::new(self.views.len() as u32 - 1)),
            byte_offset: Some(0u64.into()),
            count: items.len().into(),
            component_type: Valid(GenericComponentType(component)),
            extensions: Default::default(),
            extras: Default::default(),
            type_: Valid(type_),
            min,
            max,
            name: None,
            normalized: false,
            sparse: None,
        });

        align_buffer(&mut self.data);
        json::Index::new(index)
    }

    /// Vertex positions with bounds.
    pub fn pack_positions(&mut self, positions: &[Vec3]) -> json::Index<json::Accessor> {
        let min_max = bounds(positions)
            .map(|(lo, hi)| (json_array(&lo.to_array()), json_array(&hi.to_array())));
        self.push(positions, ComponentType::F32, Type::Vec3, Some(Target::ArrayBuffer), min_max)
    }

    /// Vertex normals.
    pub fn pack_normals(&mut self, normals: &[Vec3]) -> json::Index<json::Accessor> {
        self.push(normals, ComponentType::F32, Type::Vec3, Some(Target::ArrayBuffer), None)
    }

    /// Vertex texture coordinates.
    pub fn pack_uvs(&mut self, uvs: &[Vec2]) -> json::Index<json::Accessor> {
        self.push(uvs, ComponentType::F32, Type::Vec2, Some(Target::ArrayBuffer), None)
    }

    /// JOINTS_0 with one byte per slot.
    pub fn pack_joints_u8(&mut self, joints: &[[u8; 4]]) -> json::Index<json::Accessor> {
        self.push(joints, ComponentType::U8, Type::Vec4, Some(Target::ArrayBuffer), None)
    }

    /// JOINTS_0 for skeletons beyond 256 joints.
    pub fn pack_joints_u16(&mut self, joints: &[[u16; 4]]) -> json::Index<json::Accessor> {
        self.push(joints, ComponentType::U16, Type::Vec4, Some(Target::ArrayBuffer), None)
    }

    /// WEIGHTS_0.
    pub fn pack_weights(&mut self, weights: &[[f32; 4]]) -> json::Index<json::Accessor> {
        self.push(weights, ComponentType::F32, Type::Vec4, Some(Target::ArrayBuffer), None)
    }

    /// Triangle indices, `u16` when every index fits.
    pub fn pack_indices(&mut self, indices: &[u32]) -> json::Index<json::Accessor> {
        let target = Some(Target::ElementArrayBuffer);
        if indices.iter().all(|&i| i <= u16::MAX as u32) {
            let narrow: Vec<u16> = indices.iter().map(|&i| i as u16).collect();
            self.push(&narrow, ComponentType::U16, Type::Scalar, target, None)
        } else {
            self.push(indices, ComponentType::U32, Type::Scalar, target, None)
        }
    }

    /// Animation input times with their actual bounds.
    pub fn pack_times(&mut self, times: &[f32]) -> json::Index<json::Accessor> {
        let min_max = min_max(times).map(|(lo, hi)| (json_array(&[lo]), json_array(&[hi])));
        self.push(times, ComponentType::F32, Type::Scalar, None, min_max)
    }

    /// Animation output translations.
    pub fn pack_translations(&mut self, values: &[Vec3]) -> json::Index<json::Accessor> {
        self.push(values, ComponentType::F32, Type::Vec3, None, None)
    }

    /// Animation output rotations as `[x, y, z, w]`.
    pub fn pack_rotations(&mut self, values: &[Quat]) -> json::Index<json::Accessor> {
        self.push(values, ComponentType::F32, Type::Vec4, None, None)
    }
}
