/// Running min/max of a set of heights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightRange {
    pub min: f32,
    pub max: f32,
}

impl HeightRange {
    pub const EMPTY: HeightRange = HeightRange {
        min: f32::MAX,
        max: f32::MIN,
    };

    pub fn include(&mut self, value: f32) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    pub fn span(&self) -> f32 {
        if self.is_empty() {
            0.0
        } else {
            self.max - self.min
        }
    }
}

impl Default for HeightRange {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl FromIterator<f32> for HeightRange {
    fn from_iter<I: IntoIterator<Item = f32>>(iter: I) -> Self {
        let mut range = Self::EMPTY;
        for value in iter {
            range.include(value);
        }
        range
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_tracks_extremes() {
        let range: HeightRange = [3.0, -1.5, 8.25, 0.0].into_iter().collect();
        assert_eq!(range.min, -1.5);
        assert_eq!(range.max, 8.25);
        assert_eq!(range.span(), 9.75);
    }

    #[test]
    fn test_empty_range() {
        let range = HeightRange::default();
        assert!(range.is_empty());
        assert_eq!(range.span(), 0.0);
    }
}
