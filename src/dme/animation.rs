//! Animation clips, channels and typed keyframe logs.

use std::fmt::Debug;

use tracing::trace;

use super::context::{ElementView, FromAttribute, FromElement, Materializer};
use super::transform::DmeTransform;
use crate::codec::{Color, DmxTime};
use crate::util::{Error, Quat, Result, Vec3};

// ============================================================================
// Clips
// ============================================================================

/// List of animation clips.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DmeAnimationList {
    pub name: String,
    pub animations: Vec<DmeChannelsClip>,
}

impl FromElement for DmeAnimationList {
    const TYPE_NAME: &'static str = "DmeAnimationList";

    fn from_element(m: &mut Materializer<'_>, el: ElementView<'_>) -> Result<Self> {
        Ok(Self {
            name: el.name().to_string(),
            animations: m.require_children(el, "animations")?,
        })
    }
}

/// One clip: a set of channels driving transform properties.
#[derive(Clone, Debug, PartialEq)]
pub struct DmeChannelsClip {
    pub name: String,
    pub time_frame: Option<DmeTimeFrame>,
    pub color: Color,
    pub text: String,
    pub mute: bool,
    pub channels: Vec<DmeChannel>,
    pub frame_rate: i32,
}

impl FromElement for DmeChannelsClip {
    const TYPE_NAME: &'static str = "DmeChannelsClip";

    fn from_element(m: &mut Materializer<'_>, el: ElementView<'_>) -> Result<Self> {
        Ok(Self {
            name: el.name().to_string(),
            time_frame: m.child(el, "timeFrame")?,
            color: el.get_or("color", Color::default())?,
            text: el.get_or("text", String::new())?,
            mute: el.get_or("mute", false)?,
            channels: m.require_children(el, "channels")?,
            frame_rate: el.get_or("frameRate", 0)?,
        })
    }
}

/// Clip placement on the timeline, in ticks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DmeTimeFrame {
    pub start: DmxTime,
    pub duration: DmxTime,
    pub offset: DmxTime,
    pub scale: f32,
}

impl Default for DmeTimeFrame {
    fn default() -> Self {
        Self {
            start: DmxTime(0),
            duration: DmxTime(0),
            offset: DmxTime(0),
            scale: 1.0,
        }
    }
}

impl FromElement for DmeTimeFrame {
    const TYPE_NAME: &'static str = "DmeTimeFrame";

    fn from_element(_m: &mut Materializer<'_>, el: ElementView<'_>) -> Result<Self> {
        Ok(Self {
            start: el.get_or("startTime", DmxTime(0))?,
            duration: el.get_or("durationTime", DmxTime(0))?,
            offset: el.get_or("offsetTime", DmxTime(0))?,
            scale: el.get_or("scale", 1.0)?,
        })
    }
}

// ============================================================================
// Channels
// ============================================================================

/// Binds a keyframe log to one attribute of a target transform.
#[derive(Clone, Debug, PartialEq)]
pub struct DmeChannel {
    pub name: String,
    pub from_attribute: String,
    pub from_index: i32,
    /// Target transform; its name is the joint name.
    pub to_element: DmeTransform,
    pub to_attribute: String,
    pub to_index: i32,
    pub log: Option<ChannelLog>,
}

impl DmeChannel {
    /// Name of the driven joint.
    pub fn target_name(&self) -> &str {
        &self.to_element.name
    }
}

impl FromElement for DmeChannel {
    const TYPE_NAME: &'static str = "DmeChannel";

    fn from_element(m: &mut Materializer<'_>, el: ElementView<'_>) -> Result<Self> {
        let log = match el.element("log")? {
            Some(log) => ChannelLog::parse(m, log)?,
            None => None,
        };

        Ok(Self {
            name: el.name().to_string(),
            from_attribute: el.get_or("fromAttribute", String::new())?,
            from_index: el.get_or("fromIndex", 0)?,
            to_element: m.require_child(el, "toElement")?,
            to_attribute: el.get_or("toAttribute", String::new())?,
            to_index: el.get_or("toIndex", 0)?,
            log,
        })
    }
}

/// Typed log of a channel.
#[derive(Clone, Debug, PartialEq)]
pub enum ChannelLog {
    Vector3(DmeLog<Vec3>),
    Quaternion(DmeLog<Quat>),
}

impl ChannelLog {
    /// Other log types carry nothing convertible and read as `None`.
    fn parse(m: &mut Materializer<'_>, el: ElementView<'_>) -> Result<Option<Self>> {
        Ok(match el.type_name() {
            t if t == <Vec3 as LogValue>::LOG_TYPE => Some(Self::Vector3(m.parse(el)?)),
            t if t == <Quat as LogValue>::LOG_TYPE => Some(Self::Quaternion(m.parse(el)?)),
            other => {
                trace!("ignoring log {:?} of type {}", el.name(), other);
                None
            }
        })
    }
}

// ============================================================================
// Logs
// ============================================================================

/// Value type a log can carry.
pub trait LogValue: FromAttribute + Clone + Debug + PartialEq {
    const LOG_TYPE: &'static str;
    const LAYER_TYPE: &'static str;

    /// Read a value array attribute of this type.
    fn read_values(el: ElementView<'_>, key: &str) -> Result<Vec<Self>>;
}

impl LogValue for Vec3 {
    const LOG_TYPE: &'static str = "DmeVector3Log";
    const LAYER_TYPE: &'static str = "DmeVector3LogLayer";

    fn read_values(el: ElementView<'_>, key: &str) -> Result<Vec<Self>> {
        el.get(key)
    }
}

impl LogValue for Quat {
    const LOG_TYPE: &'static str = "DmeQuaternionLog";
    const LAYER_TYPE: &'static str = "DmeQuaternionLogLayer";

    fn read_values(el: ElementView<'_>, key: &str) -> Result<Vec<Self>> {
        el.get(key)
    }
}

/// Keyframe log made of layers.
#[derive(Clone, Debug, PartialEq)]
pub struct DmeLog<T: LogValue> {
    pub name: String,
    pub layers: Vec<DmeLogLayer<T>>,
    pub use_default_value: bool,
    pub default_value: Option<T>,
}

impl<T: LogValue> DmeLog<T> {
    /// Layer used for conversion.
    pub fn first_layer(&self) -> Option<&DmeLogLayer<T>> {
        self.layers.first()
    }
}

impl<T: LogValue> FromElement for DmeLog<T> {
    const TYPE_NAME: &'static str = T::LOG_TYPE;

    fn from_element(m: &mut Materializer<'_>, el: ElementView<'_>) -> Result<Self> {
        Ok(Self {
            name: el.name().to_string(),
            layers: m.require_children(el, "layers")?,
            use_default_value: el.get_or("usedefaultvalue", false)?,
            default_value: el.get_opt("defaultvalue")?,
        })
    }
}

/// Parallel arrays of key times and values.
#[derive(Clone, Debug, PartialEq)]
pub struct DmeLogLayer<T: LogValue> {
    pub name: String,
    pub times: Vec<DmxTime>,
    pub values: Vec<T>,
}

impl<T: LogValue> DmeLogLayer<T> {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

impl<T: LogValue> FromElement for DmeLogLayer<T> {
    const TYPE_NAME: &'static str = T::LAYER_TYPE;

    fn from_element(_m: &mut Materializer<'_>, el: ElementView<'_>) -> Result<Self> {
        let times: Vec<DmxTime> = el.get("times")?;
        let values = T::read_values(el, "values")?;
        if times.len() != values.len() {
            return Err(Error::InvalidStructure(format!(
                "log layer {:?}: {} times but {} values",
                el.name(),
                times.len(),
                values.len()
            )));
        }
        Ok(Self {
            name: el.name().to_string(),
            times,
            values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Attribute, AttributeValue, ElementArena, ElementId, RawElement};
    use std::sync::Arc;
    use uuid::Uuid;

    fn element(type_name: &str, name: &str, attrs: Vec<(&str, AttributeValue)>) -> RawElement {
        let mut e = RawElement::new(Uuid::nil(), Arc::from(type_name), name);
        e.attributes = attrs
            .into_iter()
            .map(|(k, v)| Attribute { name: Arc::from(k), value: v })
            .collect();
        e
    }

    #[test]
    fn test_layer_length_mismatch() {
        let mut arena = ElementArena::default();
        arena.push(element(
            "DmeVector3LogLayer",
            "layer",
            vec![
                ("times", AttributeValue::TimeArray(vec![DmxTime(0), DmxTime(1)])),
                ("values", AttributeValue::Vector3Array(vec![Vec3::ONE])),
            ],
        ));
        let mut m = Materializer::new(&arena);
        let el = m.view(ElementId::ROOT);
        let result: Result<DmeLogLayer<Vec3>> = m.parse(el);
        assert!(matches!(result, Err(Error::InvalidStructure(_))));
    }

    #[test]
    fn test_unknown_log_type_is_none() {
        let mut arena = ElementArena::default();
        arena.push(element(
            "DmeChannel",
            "chan",
            vec![
                ("toElement", AttributeValue::Element(Some(ElementId::new(1)))),
                ("log", AttributeValue::Element(Some(ElementId::new(2)))),
            ],
        ));
        arena.push(element(
            "DmeTransform",
            "bone",
            vec![
                ("position", AttributeValue::Vector3(Vec3::ZERO)),
                ("orientation", AttributeValue::Quaternion(Quat::IDENTITY)),
            ],
        ));
        arena.push(element("DmeFloatLog", "weights", vec![]));

        let mut m = Materializer::new(&arena);
        let el = m.view(ElementId::ROOT);
        let channel: DmeChannel = m.parse(el).unwrap();
        assert_eq!(channel.target_name(), "bone");
        assert!(channel.log.is_none());
    }

    #[test]
    fn test_quaternion_log_from_int_times() {
        let mut arena = ElementArena::default();
        arena.push(element(
            "DmeQuaternionLog",
            "rot",
            vec![("layers", AttributeValue::ElementArray(vec![Some(ElementId::new(1))]))],
        ));
        arena.push(element(
            "DmeQuaternionLogLayer",
            "layer",
            vec![
                ("times", AttributeValue::IntArray(vec![0, 12345])),
                ("values", AttributeValue::QuaternionArray(vec![Quat::IDENTITY; 2])),
            ],
        ));

        let mut m = Materializer::new(&arena);
        let el = m.view(ElementId::ROOT);
        let log: DmeLog<Quat> = m.parse(el).unwrap();
        assert_eq!(log.layers.len(), 1);
        assert_eq!(log.first_layer().unwrap().times[1], DmxTime(12345));
        assert!(!log.use_default_value);
        assert!(log.default_value.is_none());
    }
}
