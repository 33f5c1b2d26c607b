//! Math type re-exports and DMX time helpers.

pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

/// Number of DMX time ticks in one second.
pub const TICKS_PER_SECOND: i32 = 10_000;

/// Convert a DMX tick count into seconds.
#[inline]
pub fn ticks_to_seconds(ticks: i32) -> f32 {
    ticks as f32 / TICKS_PER_SECOND as f32
}

/// Smallest and largest value of a slice, `None` when empty.
pub fn min_max(values: &[f32]) -> Option<(f32, f32)> {
    let (&first, rest) = values.split_first()?;
    Some(rest.iter().fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))))
}

/// Component-wise bounds of a set of points.
pub fn bounds(points: &[Vec3]) -> Option<(Vec3, Vec3)> {
    let (&first, rest) = points.split_first()?;
    Some(rest.iter().fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_to_seconds() {
        assert!((ticks_to_seconds(12345) - 1.2345).abs() < 1e-6);
        assert_eq!(ticks_to_seconds(0), 0.0);
        assert_eq!(ticks_to_seconds(-TICKS_PER_SECOND), -1.0);
    }

    #[test]
    fn test_min_max() {
        assert_eq!(min_max(&[]), None);
        assert_eq!(min_max(&[2.0, -1.0, 5.0]), Some((-1.0, 5.0)));
    }

    #[test]
    fn test_bounds() {
        let (lo, hi) = bounds(&[Vec3::new(1.0, -2.0, 0.0), Vec3::new(-1.0, 3.0, 0.5)]).unwrap();
        assert_eq!(lo, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(hi, Vec3::new(1.0, 3.0, 0.5));
    }
}
