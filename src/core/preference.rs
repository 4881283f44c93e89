use crate::core::Comparator;
use crate::models::PreferenceTable;

/// Directional preference-table comparator (MBTI, zodiac).
///
/// `compare(source, target)` reads the source's row, so swapping the
/// arguments can give a different score. Missing rows and entries score 0.0.
#[derive(Debug, Clone)]
pub struct PreferenceComparator {
    table: PreferenceTable,
    scale: f64,
}

impl PreferenceComparator {
    pub fn new(table: PreferenceTable, scale: f64) -> Self {
        Self { table, scale }
    }
}

impl Comparator for PreferenceComparator {
    type Value = str;

    fn compare(&self, source: &str, target: &str) -> f64 {
        if self.scale <= 0.0 {
            return 0.0;
        }

        match self.table.raw(source, target) {
            Some(raw) if raw.is_finite() => (raw / self.scale).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }
}
