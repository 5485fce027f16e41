//! Easing curves for accelerated actuators.
//!
//! An accelerated movement actuator goes from its initial speed to its goal
//! speed over an interpolation time; the [`Easing`] picks the shape of that
//! ramp.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Shape of a 0..1 ramp.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
    SineIn,
    SineOut,
    SineInOut,
}

impl Easing {
    /// Map a normalized time to eased progress. `t` is clamped to [0, 1].
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadIn => t * t,
            Easing::QuadOut => t * (2.0 - t),
            Easing::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Easing::CubicIn => t * t * t,
            Easing::CubicOut => {
                let p = t - 1.0;
                p * p * p + 1.0
            }
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let p = 2.0 * t - 2.0;
                    0.5 * p * p * p + 1.0
                }
            }
            Easing::SineIn => 1.0 - (t * PI / 2.0).cos(),
            Easing::SineOut => (t * PI / 2.0).sin(),
            Easing::SineInOut => -0.5 * ((PI * t).cos() - 1.0),
        }
    }

    /// Eased value between `from` and `to` at normalized time `t`.
    pub fn interpolate(self, from: f32, to: f32, t: f32) -> f32 {
        lerp(from, to, self.apply(t))
    }
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-6;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    const ALL: [Easing; 10] = [
        Easing::Linear,
        Easing::QuadIn,
        Easing::QuadOut,
        Easing::QuadInOut,
        Easing::CubicIn,
        Easing::CubicOut,
        Easing::CubicInOut,
        Easing::SineIn,
        Easing::SineOut,
        Easing::SineInOut,
    ];

    #[test]
    fn test_endpoints_and_clamping() {
        for easing in ALL {
            assert!(approx_eq(easing.apply(0.0), 0.0), "{:?} at 0", easing);
            assert!(approx_eq(easing.apply(1.0), 1.0), "{:?} at 1", easing);
            assert!(approx_eq(easing.apply(-3.0), 0.0), "{:?} below 0", easing);
            assert!(approx_eq(easing.apply(7.0), 1.0), "{:?} above 1", easing);
        }
    }

    #[test]
    fn test_curve_shapes() {
        assert!(approx_eq(Easing::QuadIn.apply(0.5), 0.25));
        assert!(approx_eq(Easing::QuadOut.apply(0.5), 0.75));
        assert!(approx_eq(Easing::CubicOut.apply(0.5), 0.875));
        assert!(approx_eq(Easing::SineInOut.apply(0.5), 0.5));
        assert!(Easing::SineIn.apply(0.25) < 0.25);
        assert!(Easing::SineOut.apply(0.25) > 0.25);
    }

    #[test]
    fn test_interpolate_speed_ramp() {
        assert!(approx_eq(Easing::Linear.interpolate(2.0, 6.0, 0.5), 4.0));
        assert!(approx_eq(Easing::QuadIn.interpolate(0.0, 8.0, 0.5), 2.0));
        assert!(approx_eq(Easing::Linear.interpolate(6.0, 2.0, 2.0), 2.0));
    }

    #[test]
    fn test_serde_names() {
        let e: Easing = serde_json::from_str("\"cubic_in_out\"").unwrap();
        assert_eq!(e, Easing::CubicInOut);
    }
}
