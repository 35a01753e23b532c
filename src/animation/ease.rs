use std::f64::consts::PI;

/// Easing curves mapping normalized frame position `t` to a blend weight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    /// Constant-speed blend.
    Linear,
    /// `0.5 * (1 + sin(pi*t - pi/2))`: 0 at `t = 0`, 1 at `t = 1`, flat at both ends.
    #[default]
    HalfCosine,
    /// `0.5 * (1 + sin(2*pi*t - pi/2))`: rises to 1 at `t = 0.5` and returns to 0, for
    /// there-and-back loops.
    CosineLoop,
}

impl Ease {
    /// Apply this easing function to normalized progress `t` in `[0, 1]`.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        let w = match self {
            Self::Linear => t,
            Self::HalfCosine => 0.5 * (1.0 + (PI * t - PI / 2.0).sin()),
            Self::CosineLoop => 0.5 * (1.0 + (2.0 * PI * t - PI / 2.0).sin()),
        };
        w.clamp(0.0, 1.0)
    }
}

/// Normalized position of frame `index` in a sequence of `count` frames.
///
/// `count` must be at least 2; callers validate that before building a sequence.
pub fn frame_position(index: u32, count: u32) -> f64 {
    debug_assert!(count >= 2);
    f64::from(index) / f64::from(count - 1)
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
