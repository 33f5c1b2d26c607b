//! Byte-level DMX writer for integration tests.

#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};

pub const BINARY_HEADER: &str = "<!-- dmx encoding binary 2 format model 18 -->";

/// Attribute payloads the builder can write.
#[derive(Clone, Debug)]
pub enum Val {
    Element(i32),
    Int(i32),
    Float(f32),
    Bool(bool),
    Str(String),
    Time(i32),
    Vec3([f32; 3]),
    Quat([f32; 4]),
    ElementArray(Vec<i32>),
    IntArray(Vec<i32>),
    FloatArray(Vec<f32>),
    StrArray(Vec<String>),
    TimeArray(Vec<i32>),
    Vec2Array(Vec<[f32; 2]>),
    Vec3Array(Vec<[f32; 3]>),
    QuatArray(Vec<[f32; 4]>),
    /// Arbitrary tag followed by raw bytes.
    Raw(u8, Vec<u8>),
}

impl Val {
    fn tag(&self) -> u8 {
        match self {
            Val::Element(_) => 1,
            Val::Int(_) => 2,
            Val::Float(_) => 3,
            Val::Bool(_) => 4,
            Val::Str(_) => 5,
            Val::Time(_) => 7,
            Val::Vec3(_) => 10,
            Val::Quat(_) => 13,
            Val::ElementArray(_) => 15,
            Val::IntArray(_) => 16,
            Val::FloatArray(_) => 17,
            Val::StrArray(_) => 19,
            Val::TimeArray(_) => 21,
            Val::Vec2Array(_) => 23,
            Val::Vec3Array(_) => 24,
            Val::QuatArray(_) => 27,
            Val::Raw(tag, _) => *tag,
        }
    }

    fn write(&self, out: &mut Vec<u8>) {
        fn floats(out: &mut Vec<u8>, v: &[f32]) {
            for f in v {
                out.write_f32::<LittleEndian>(*f).unwrap();
            }
        }
        fn cstr(out: &mut Vec<u8>, s: &str) {
            out.extend_from_slice(s.as_bytes());
            out.push(0);
        }
        fn len(out: &mut Vec<u8>, n: usize) {
            out.write_i32::<LittleEndian>(n as i32).unwrap();
        }

        match self {
            Val::Element(v) | Val::Int(v) | Val::Time(v) => out.write_i32::<LittleEndian>(*v).unwrap(),
            Val::Float(v) => out.write_f32::<LittleEndian>(*v).unwrap(),
            Val::Bool(v) => out.push(*v as u8),
            Val::Str(s) => cstr(out, s),
            Val::Vec3(v) => floats(out, v),
            Val::Quat(v) => floats(out, v),
            Val::ElementArray(v) | Val::IntArray(v) | Val::TimeArray(v) => {
                len(out, v.len());
                for i in v {
                    out.write_i32::<LittleEndian>(*i).unwrap();
                }
            }
            Val::FloatArray(v) => {
                len(out, v.len());
                floats(out, v);
            }
            Val::StrArray(v) => {
                len(out, v.len());
                for s in v {
                    cstr(out, s);
                }
            }
            Val::Vec2Array(v) => {
                len(out, v.len());
                v.iter().for_each(|x| floats(out, x));
            }
            Val::Vec3Array(v) => {
                len(out, v.len());
                v.iter().for_each(|x| floats(out, x));
            }
            Val::QuatArray(v) => {
                len(out, v.len());
                v.iter().for_each(|x| floats(out, x));
            }
            Val::Raw(_, bytes) => out.extend_from_slice(bytes),
        }
    }
}

struct Elem {
    type_name: String,
    name: String,
    attributes: Vec<(String, Val)>,
}

/// Builds a binary DMX file element by element.
#[derive(Default)]
pub struct DmxBuilder {
    elements: Vec<Elem>,
}

impl DmxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an element and return its index.
    pub fn element(&mut self, type_name: &str, name: &str) -> i32 {
        self.elements.push(Elem {
            type_name: type_name.to_string(),
            name: name.to_string(),
            attributes: Vec::new(),
        });
        self.elements.len() as i32 - 1
    }

    pub fn attr(&mut self, element: i32, name: &str, value: Val) -> &mut Self {
        self.elements[element as usize].attributes.push((name.to_string(), value));
        self
    }

    fn strings(&self) -> Vec<String> {
        let mut strings: Vec<String> = Vec::new();
        let mut add = |s: &str| {
            if !strings.iter().any(|x| x == s) {
                strings.push(s.to_string());
            }
        };
        for e in &self.elements {
            add(&e.type_name);
            for (name, _) in &e.attributes {
                add(name);
            }
        }
        strings
    }

    pub fn build(&self) -> Vec<u8> {
        self.build_with_header(BINARY_HEADER)
    }

    pub fn build_with_header(&self, header: &str) -> Vec<u8> {
        let strings = self.strings();
        let index = |s: &str| strings.iter().position(|x| x == s).unwrap() as i16;

        let mut out = Vec::new();
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(b"\n\0");

        out.write_i16::<LittleEndian>(strings.len() as i16).unwrap();
        for s in &strings {
            out.extend_from_slice(s.as_bytes());
            out.push(0);
        }

        out.write_i32::<LittleEndian>(self.elements.len() as i32).unwrap();
        for (i, e) in self.elements.iter().enumerate() {
            out.write_i16::<LittleEndian>(index(&e.type_name)).unwrap();
            out.extend_from_slice(e.name.as_bytes());
            out.push(0);
            let mut id = [0u8; 16];
            id[..4].copy_from_slice(&(i as u32 + 1).to_le_bytes());
            out.extend_from_slice(&id);
        }

        for e in &self.elements {
            out.write_i32::<LittleEndian>(e.attributes.len() as i32).unwrap();
            for (name, value) in &e.attributes {
                out.write_i16::<LittleEndian>(index(name)).unwrap();
                out.push(value.tag());
                value.write(&mut out);
            }
        }
        out
    }
}

// ============================================================================
// Canned scene
// ============================================================================

/// Element indices of [`skinned_scene`].
pub struct Scene {
    pub builder: DmxBuilder,
    pub root: i32,
    pub model: i32,
    pub clip: i32,
}

pub fn transform(b: &mut DmxBuilder, name: &str, position: [f32; 3]) -> i32 {
    let t = b.element("DmeTransform", name);
    b.attr(t, "position", Val::Vec3(position))
        .attr(t, "orientation", Val::Quat([0.0, 0.0, 0.0, 1.0]));
    t
}

pub fn joint(b: &mut DmxBuilder, name: &str, position: [f32; 3], children: Vec<i32>) -> i32 {
    let j = b.element("DmeJoint", name);
    let t = transform(b, name, position);
    b.attr(j, "transform", Val::Element(t)).attr(j, "children", Val::ElementArray(children));
    j
}

/// Vector3 channel with one layer.
pub fn translation_channel(b: &mut DmxBuilder, target: i32, times: Vec<i32>, values: Vec<[f32; 3]>) -> i32 {
    let channel = b.element("DmeChannel", "position channel");
    let log = b.element("DmeVector3Log", "position log");
    let layer = b.element("DmeVector3LogLayer", "layer");
    b.attr(channel, "fromAttribute", Val::Str("position".into()))
        .attr(channel, "toElement", Val::Element(target))
        .attr(channel, "toAttribute", Val::Str("position".into()))
        .attr(channel, "log", Val::Element(log));
    b.attr(log, "layers", Val::ElementArray(vec![layer]));
    b.attr(layer, "times", Val::TimeArray(times)).attr(layer, "values", Val::Vec3Array(values));
    channel
}

/// Quaternion channel with one layer.
pub fn rotation_channel(b: &mut DmxBuilder, target: i32, times: Vec<i32>, values: Vec<[f32; 4]>) -> i32 {
    let channel = b.element("DmeChannel", "orientation channel");
    let log = b.element("DmeQuaternionLog", "orientation log");
    let layer = b.element("DmeQuaternionLogLayer", "layer");
    b.attr(channel, "toElement", Val::Element(target))
        .attr(channel, "toAttribute", Val::Str("orientation".into()))
        .attr(channel, "log", Val::Element(log));
    b.attr(log, "layers", Val::ElementArray(vec![layer]));
    b.attr(layer, "times", Val::IntArray(times)).attr(layer, "values", Val::QuatArray(values));
    channel
}

/// Model with joints `root > spine > {spine_End > tip, arm}`, one quad mesh
/// skinned with two influences, and one clip.
pub fn skinned_scene() -> Scene {
    let mut b = DmxBuilder::new();
    let root = b.element("DmElement", "root");
    let model = b.element("DmeModel", "hero");
    let model_t = transform(&mut b, "hero", [0.0; 3]);

    let tip = joint(&mut b, "tip", [0.0, 0.0, 5.0], vec![]);
    let spine_end = joint(&mut b, "spine_End", [0.0, 0.0, 10.0], vec![tip]);
    let arm = joint(&mut b, "arm", [10.0, 0.0, 0.0], vec![]);
    let spine = joint(&mut b, "spine", [0.0, 0.0, 50.0], vec![spine_end, arm]);
    let pelvis = joint(&mut b, "pelvis", [0.0, 0.0, 100.0], vec![spine]);

    // Mesh
    let dag = b.element("DmeDag", "body_mesh");
    let dag_t = transform(&mut b, "body_mesh", [0.0; 3]);
    let mesh = b.element("DmeMesh", "body");
    let vd = b.element("DmeVertexData", "bind");
    let face_set = b.element("DmeFaceSet", "faces");
    let material = b.element("DmeMaterial", "skin");

    b.attr(dag, "transform", Val::Element(dag_t)).attr(dag, "shape", Val::Element(mesh));
    b.attr(mesh, "currentState", Val::Element(vd))
        .attr(mesh, "baseStates", Val::ElementArray(vec![vd]))
        .attr(mesh, "faceSets", Val::ElementArray(vec![face_set]));
    b.attr(vd, "vertexFormat", Val::StrArray(vec!["positions".into(), "normals".into()]))
        .attr(vd, "jointCount", Val::Int(2))
        .attr(vd, "positions", Val::Vec3Array(vec![[0.0; 3], [50.0, 0.0, 0.0], [50.0, 50.0, 0.0], [0.0, 50.0, 0.0]]))
        .attr(vd, "positionsIndices", Val::IntArray(vec![0, 1, 2, 3]))
        .attr(vd, "normals", Val::Vec3Array(vec![[0.0, 0.0, 1.0]]))
        .attr(vd, "normalsIndices", Val::IntArray(vec![0, 0, 0, 0]))
        .attr(vd, "textureCoordinates", Val::Vec2Array(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.3]]))
        .attr(vd, "textureCoordinatesIndices", Val::IntArray(vec![0, 1, 2, 3]))
        // jointList order: pelvis, spine, arm
        .attr(vd, "jointIndices", Val::IntArray(vec![0, 1, 1, 2, 2, 0, 0, 0]))
        .attr(vd, "jointWeights", Val::FloatArray(vec![0.5, 0.5, 0.25, 0.75, 1.0, 0.0, 1.0, 0.0]));
    b.attr(face_set, "material", Val::Element(material))
        .attr(face_set, "faces", Val::IntArray(vec![0, 1, 2, 3, -1]));
    b.attr(material, "mtlName", Val::Str("models/hero/hero_skin".into()));

    b.attr(model, "transform", Val::Element(model_t))
        .attr(model, "children", Val::ElementArray(vec![pelvis, dag]))
        .attr(model, "jointList", Val::ElementArray(vec![pelvis, spine, arm]));

    // Animation
    let list = b.element("DmeAnimationList", "animations");
    let clip = b.element("DmeChannelsClip", "walk");
    let frame = b.element("DmeTimeFrame", "timeFrame");
    let ghost = transform(&mut b, "ghost", [0.0; 3]);
    let pelvis_t = transform(&mut b, "pelvis", [0.0; 3]);
    let spine_t = transform(&mut b, "spine", [0.0; 3]);
    let pos = translation_channel(&mut b, pelvis_t, vec![12345, 0, 5000], vec![[0.0, 0.0, 100.0]; 3]);
    let rot = rotation_channel(&mut b, spine_t, vec![0, 10000], vec![[0.0, 0.0, 0.0, 1.0]; 2]);
    let lost = translation_channel(&mut b, ghost, vec![0], vec![[1.0; 3]]);

    b.attr(frame, "startTime", Val::Time(0))
        .attr(frame, "durationTime", Val::Time(12345))
        .attr(frame, "offsetTime", Val::Time(0))
        .attr(frame, "scale", Val::Float(1.0));
    b.attr(clip, "timeFrame", Val::Element(frame))
        .attr(clip, "text", Val::Str(String::new()))
        .attr(clip, "mute", Val::Bool(false))
        .attr(clip, "frameRate", Val::Int(30))
        .attr(clip, "channels", Val::ElementArray(vec![pos, lost, rot]));
    b.attr(list, "animations", Val::ElementArray(vec![clip]));

    b.attr(root, "model", Val::Element(model))
        .attr(root, "skeleton", Val::Element(model))
        .attr(root, "animationList", Val::Element(list));

    Scene { builder: b, root, model, clip }
}
