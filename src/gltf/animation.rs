//! Animation clips to glTF animations.

use gltf_json as json;
use json::animation::{Interpolation, Property};
use json::validation::Checked::Valid;
use tracing::debug;

use super::buffer::BufferBuilder;
use super::skeleton::Skeleton;
use crate::codec::DmxTime;
use crate::dme::{ChannelLog, DmeChannel, DmeChannelsClip};
use crate::util::Vec3;

/// Key times in seconds.
pub fn key_times(times: &[DmxTime]) -> Vec<f32> {
    times.iter().map(|t| t.seconds()).collect()
}

/// Convert one clip; `None` when no channel survives.
///
/// Channels targeting an unknown joint, without a convertible log or with
/// an empty first layer are skipped.
pub fn convert_clip(
    clip: &DmeChannelsClip,
    fallback_name: &str,
    skeleton: &Skeleton,
    scale: f32,
    buffer: &mut BufferBuilder,
) -> Option<json::Animation> {
    let mut samplers = Vec::new();
    let mut channels = Vec::new();

    for channel in &clip.channels {
        let Some(node) = skeleton.node(channel.target_name()) else {
            debug!("channel {:?}: no joint {:?}, skipped", channel.name, channel.target_name());
            continue;
        };
        let Some((input, output, path)) = write_channel(channel, scale, buffer) else {
            debug!("channel {:?}: no keys, skipped", channel.name);
            continue;
        };

        let sampler = samplers.len() as u32;
        samplers.push(json::animation::Sampler {
            input,
            interpolation: Valid(Interpolation::Linear),
            output,
            extensions: Default::default(),
            extras: Default::default(),
        });
        channels.push(json::animation::Channel {
            sampler: json::Index::new(sampler),
            target: json::animation::Target {
                node: json::Index::new(node),
                path: Valid(path),
                extensions: Default::default(),
                extras: Default::default(),
            },
            extensions: Default::default(),
            extras: Default::default(),
        });
    }

    let name = if clip.name.is_empty() { fallback_name } else { clip.name.as_str() };
    if channels.is_empty() {
        debug!("animation {:?} has no channels, skipped", name);
        return None;
    }

    debug!("animation {:?}: {} channels", name, channels.len());
    Some(json::Animation {
        channels,
        extensions: Default::default(),
        extras: Default::default(),
        name: Some(name.to_string()),
        samplers,
    })
}

type Keys = (json::Index<json::Accessor>, json::Index<json::Accessor>, Property);

/// Write input and output accessors of the channel's first layer.
fn write_channel(channel: &DmeChannel, scale: f32, buffer: &mut BufferBuilder) -> Option<Keys> {
    match channel.log.as_ref()? {
        ChannelLog::Vector3(log) => {
            let layer = log.first_layer().filter(|l| !l.is_empty())?;
            let input = buffer.pack_times(&key_times(&layer.times));
            let values: Vec<Vec3> = layer.values.iter().map(|v| *v * scale).collect();
            Some((input, buffer.pack_translations(&values), Property::Translation))
        }
        ChannelLog::Quaternion(log) => {
            let layer = log.first_layer().filter(|l| !l.is_empty())?;
            let input = buffer.pack_times(&key_times(&layer.times));
            Some((input, buffer.pack_rotations(&layer.values), Property::Rotation))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_times() {
        let secs = key_times(&[DmxTime(0), DmxTime(12345), DmxTime(5000)]);
        assert_eq!(secs[0], 0.0);
        assert!((secs[1] - 1.2345).abs() < 1e-6);
        assert_eq!(secs[2], 0.5);
    }
}
