//! Level-scaled numeric curves and the actor level.
//!
//! Every tunable number in a skill template or stat block is a linear
//! function of a level: `base + per_level * (level - 1)`. Level 1 yields the
//! base value. Level 0 (an unlearned skill) is treated like level 1 so the
//! curve never extrapolates backwards.

use serde::{Deserialize, Serialize};

/// Default cap for [`Level`].
pub const DEFAULT_MAX_LEVEL: u32 = 100;

/// Integer curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinearInt {
    /// Value at level 1.
    pub base: i32,
    /// Increase per level above 1.
    #[serde(default)]
    pub per_level: i32,
}

impl LinearInt {
    /// Creates a curve.
    #[must_use]
    pub const fn new(base: i32, per_level: i32) -> Self {
        Self { base, per_level }
    }

    /// Creates a curve that ignores the level.
    #[must_use]
    pub const fn constant(base: i32) -> Self {
        Self::new(base, 0)
    }

    /// Evaluates the curve.
    #[must_use]
    pub fn at(&self, level: u32) -> i32 {
        let steps = i32::try_from(level.saturating_sub(1)).unwrap_or(i32::MAX);
        self.base.saturating_add(self.per_level.saturating_mul(steps))
    }

    /// Evaluates the curve, clamping negatives to zero.
    #[must_use]
    pub fn at_unsigned(&self, level: u32) -> u32 {
        u32::try_from(self.at(level).max(0)).unwrap_or(0)
    }
}

/// Float curve.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LinearFloat {
    /// Value at level 1.
    pub base: f32,
    /// Increase per level above 1.
    #[serde(default)]
    pub per_level: f32,
}

impl LinearFloat {
    /// Creates a curve.
    #[must_use]
    pub const fn new(base: f32, per_level: f32) -> Self {
        Self { base, per_level }
    }

    /// Creates a curve that ignores the level.
    #[must_use]
    pub const fn constant(base: f32) -> Self {
        Self::new(base, 0.0)
    }

    /// Evaluates the curve.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn at(&self, level: u32) -> f32 {
        self.base + self.per_level * level.saturating_sub(1) as f32
    }
}

/// Actor level, always within `[1, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    current: u32,
    max: u32,
}

impl Level {
    /// Creates a level clamped into `[1, max]`.
    #[must_use]
    pub fn new(current: u32, max: u32) -> Self {
        let max = max.max(1);
        Self {
            current: current.clamp(1, max),
            max,
        }
    }

    /// Current level.
    #[must_use]
    pub const fn current(&self) -> u32 {
        self.current
    }

    /// Level cap.
    #[must_use]
    pub const fn max(&self) -> u32 {
        self.max
    }

    /// Sets the level, clamped. Returns true if it increased.
    pub fn set(&mut self, level: u32) -> bool {
        let before = self.current;
        self.current = level.clamp(1, self.max);
        self.current > before
    }

    /// Returns true if the cap is reached.
    #[must_use]
    pub const fn is_max(&self) -> bool {
        self.current >= self.max
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::new(1, DEFAULT_MAX_LEVEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_int_scales_from_level_one() {
        let curve = LinearInt::new(10, 3);
        assert_eq!(curve.at(1), 10);
        assert_eq!(curve.at(4), 19);
        assert_eq!(curve.at(0), 10);
    }

    #[test]
    fn linear_int_unsigned_floors_at_zero() {
        assert_eq!(LinearInt::new(-5, 1).at_unsigned(2), 0);
        assert_eq!(LinearInt::new(-5, 10).at_unsigned(2), 5);
    }

    #[test]
    fn linear_float_scales() {
        let curve = LinearFloat::new(1.5, 0.5);
        assert!((curve.at(3) - 2.5).abs() < f32::EPSILON);
    }

    #[test]
    fn level_is_clamped() {
        let mut level = Level::new(0, 10);
        assert_eq!(level.current(), 1);
        assert!(level.set(50));
        assert_eq!(level.current(), 10);
        assert!(level.is_max());
        assert!(!level.set(3));
    }
}
