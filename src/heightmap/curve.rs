use serde::{Deserialize, Serialize};

/// One keyframe of a response curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    pub time: f32,
    pub value: f32,
}

impl CurveKey {
    pub fn new(time: f32, value: f32) -> Self {
        Self { time, value }
    }
}

/// Piecewise-linear keyframe curve, clamped before the first and after the last key
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<CurveKey>", into = "Vec<CurveKey>")]
pub struct ResponseCurve {
    keys: Vec<CurveKey>,
}

impl ResponseCurve {
    pub fn new(keys: impl IntoIterator<Item = CurveKey>) -> Self {
        let mut keys: Vec<CurveKey> = keys
            .into_iter()
            .filter(|key| key.time.is_finite() && key.value.is_finite())
            .collect();
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    pub fn linear() -> Self {
        Self::new([CurveKey::new(0.0, 0.0), CurveKey::new(1.0, 1.0)])
    }

    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// An empty curve evaluates to 0 everywhere
    pub fn evaluate(&self, t: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 0.0;
        };
        if t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }

        // First key strictly after t; t is inside (first.time, last.time) so 1 <= upper < len
        let upper = self.keys.partition_point(|key| key.time <= t);
        let a = self.keys[upper - 1];
        let b = self.keys[upper];
        let span = b.time - a.time;
        if span <= f32::EPSILON {
            return b.value;
        }
        let blend = (t - a.time) / span;
        a.value + (b.value - a.value) * blend
    }
}

impl From<Vec<CurveKey>> for ResponseCurve {
    fn from(keys: Vec<CurveKey>) -> Self {
        Self::new(keys)
    }
}

impl From<ResponseCurve> for Vec<CurveKey> {
    fn from(curve: ResponseCurve) -> Self {
        curve.keys
    }
}
