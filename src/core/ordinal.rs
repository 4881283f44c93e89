use crate::core::Comparator;
use crate::models::OrdinalScale;

/// Distance-based comparator over an ordered categorical domain.
///
/// Time-of-day wraps around the cycle of slots; experience levels do not.
#[derive(Debug, Clone)]
pub struct OrdinalComparator {
    scale: OrdinalScale,
}

impl OrdinalComparator {
    pub fn new(scale: OrdinalScale) -> Self {
        Self { scale }
    }

    /// Minimum step count between two values, `None` if either is unknown
    pub fn distance(&self, a: &str, b: &str) -> Option<usize> {
        let i = self.scale.position(a)?;
        let j = self.scale.position(b)?;
        let linear = i.abs_diff(j);

        if self.scale.wraps {
            Some(linear.min(self.scale.values.len() - linear))
        } else {
            Some(linear)
        }
    }

    fn score_for_distance(&self, distance: usize) -> f64 {
        let table = &self.scale.distance_scores;
        match table.get(distance).or_else(|| table.last()) {
            Some(&score) => score,
            None if distance == 0 => 1.0,
            None => 0.0,
        }
    }
}

impl Comparator for OrdinalComparator {
    type Value = str;

    fn compare(&self, source: &str, target: &str) -> f64 {
        match self.distance(source, target) {
            Some(distance) => self.score_for_distance(distance),
            None => {
                tracing::trace!("Unknown ordinal value in ({}, {})", source, target);
                0.0
            }
        }
    }
}
