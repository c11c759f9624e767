//! Deadzone and acceleration buckets for rate-controlled rotation

use serde::{Deserialize, Serialize};

use crate::math::fold_degrees;

/// Input tilts below `below` degrees rotate the object by `step` degrees per frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedBucket {
    pub below: f32,
    pub step: f32,
}

/// Ordered bucket table, ascending by `below`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedBuckets {
    pub buckets: Vec<SpeedBucket>,
}

impl Default for SpeedBuckets {
    fn default() -> Self {
        Self {
            buckets: vec![
                SpeedBucket { below: 3.0, step: 0.0 },
                SpeedBucket { below: 20.0, step: 0.5 },
                SpeedBucket { below: 80.0, step: 1.0 },
                SpeedBucket { below: 180.0, step: 3.0 },
            ],
        }
    }
}

impl SpeedBuckets {
    /// Applied rotation in degrees for a raw input angle.
    ///
    /// Angles past 180 degrees are folded first, so 357 degrees classifies
    /// like 3 degrees. A folded angle of exactly 180 lands in the last bucket.
    pub fn classify(&self, raw_degrees: f32) -> f32 {
        if !raw_degrees.is_finite() {
            return 0.0;
        }
        let angle = fold_degrees(raw_degrees);
        self.buckets
            .iter()
            .find(|b| angle < b.below)
            .or(self.buckets.last())
            .map_or(0.0, |b| b.step)
    }

    /// Thresholds must rise strictly and steps must never fall.
    pub fn is_monotonic(&self) -> bool {
        !self.buckets.is_empty()
            && self.buckets.iter().all(|b| b.step >= 0.0 && b.below > 0.0)
            && self
                .buckets
                .windows(2)
                .all(|w| w[0].below < w[1].below && w[0].step <= w[1].step)
    }
}
