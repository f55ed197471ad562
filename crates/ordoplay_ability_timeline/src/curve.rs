// SPDX-License-Identifier: MIT OR Apache-2.0
//! Motion curves for movement clips.

use serde::{Deserialize, Serialize};

/// Shape of progress over a clip's window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MotionCurve {
    /// Everything applied on the first frame
    Constant,
    /// Even progress
    #[default]
    Linear,
    /// Slow start
    EaseIn,
    /// Slow finish
    EaseOut,
    /// Slow start and finish (cubic bezier)
    EaseInOut,
    /// Hermite smoothstep
    Smooth,
}

impl MotionCurve {
    /// Progress in `[0, 1]` at normalized time `t`
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Constant => 1.0,
            Self::Linear => t,
            Self::EaseIn => Interpolation::bezier(0.0, 0.0, 0.58, 1.0, t),
            Self::EaseOut => Interpolation::bezier(0.0, 0.42, 1.0, 1.0, t),
            Self::EaseInOut => Interpolation::bezier(0.0, 0.0, 1.0, 1.0, t),
            Self::Smooth => Interpolation::hermite(0.0, 0.0, 1.0, 0.0, t),
        }
    }
}

/// Interpolation utilities
pub struct Interpolation;

impl Interpolation {
    /// Cubic bezier interpolation
    pub fn bezier(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
        let t2 = t * t;
        let t3 = t2 * t;
        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let mt3 = mt2 * mt;

        p0 * mt3 + 3.0 * p1 * mt2 * t + 3.0 * p2 * mt * t2 + p3 * t3
    }

    /// Hermite spline interpolation
    pub fn hermite(p0: f32, m0: f32, p1: f32, m1: f32, t: f32) -> f32 {
        let t2 = t * t;
        let t3 = t2 * t;

        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;

        h00 * p0 + h10 * m0 + h01 * p1 + h11 * m1
    }

    /// Scale a Vec3
    pub fn scale_vec3(v: [f32; 3], s: f32) -> [f32; 3] {
        [v[0] * s, v[1] * s, v[2] * s]
    }
}
