//! Bounded resource pools (health and mana).
//!
//! A [`ResourcePool`] holds a non-negative integer amount in `[0, max]`. Every
//! mutation clamps into that range and reports a [`PoolChange`] that tells the
//! caller how much actually moved and whether this call emptied the pool.
//!
//! # Emptied edge
//!
//! `emptied` is edge-triggered: it is `true` only for the call that moved the
//! pool from a positive value to zero. Removing from an already empty pool
//! reports `emptied == false`, so death handling hooked on it runs once per
//! depletion.
//!
//! # Example
//!
//! ```
//! use skirmish_core::pool::ResourcePool;
//!
//! let mut health = ResourcePool::new(10);
//! let change = health.remove(15);
//! assert_eq!(health.current(), 0);
//! assert!(change.emptied);
//!
//! // Already empty: no second edge.
//! assert!(!health.remove(3).emptied);
//! ```

use serde::{Deserialize, Serialize};

/// Which pool a value refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Hit points; the actor is alive while this is above zero.
    Health,
    /// Casting resource.
    Mana,
}

/// Outcome of a single pool mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PoolChange {
    /// Signed amount that was actually applied after clamping.
    pub delta: i64,
    /// True only when this mutation took the pool from `> 0` to `0`.
    pub emptied: bool,
}

impl PoolChange {
    /// Amount gained, zero for losses.
    #[must_use]
    pub fn gained(self) -> u32 {
        u32::try_from(self.delta.max(0)).unwrap_or(u32::MAX)
    }

    /// Amount lost, zero for gains.
    #[must_use]
    pub fn lost(self) -> u32 {
        u32::try_from((-self.delta).max(0)).unwrap_or(u32::MAX)
    }
}

/// A clamped integer resource with passive recovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePool {
    current: u32,
    max: u32,
    /// Flat amount recovered per regeneration interval, may be negative.
    recovery_per_tick: i32,
    enabled: bool,
}

impl ResourcePool {
    /// Creates a full pool.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self {
            current: max,
            max,
            recovery_per_tick: 0,
            enabled: true,
        }
    }

    /// Creates a pool with the given current value, clamped to `max`.
    #[must_use]
    pub fn with_current(max: u32, current: u32) -> Self {
        Self {
            current: current.min(max),
            ..Self::new(max)
        }
    }

    /// Sets the flat per-interval recovery.
    #[must_use]
    pub const fn with_recovery(mut self, recovery_per_tick: i32) -> Self {
        self.recovery_per_tick = recovery_per_tick;
        self
    }

    /// Current amount.
    #[must_use]
    pub const fn current(&self) -> u32 {
        self.current
    }

    /// Upper bound.
    #[must_use]
    pub const fn max(&self) -> u32 {
        self.max
    }

    /// Flat per-interval recovery.
    #[must_use]
    pub const fn recovery_per_tick(&self) -> i32 {
        self.recovery_per_tick
    }

    /// Returns true if the pool is at zero.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.current == 0
    }

    /// Returns true if the pool is at its maximum.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.current == self.max
    }

    /// Whether passive recovery is active.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables passive recovery.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Fill ratio in `[0, 1]`, zero when either bound is zero.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self) -> f32 {
        if self.current == 0 || self.max == 0 {
            return 0.0;
        }
        self.current as f32 / self.max as f32
    }

    /// Sets the current value, clamped to `[0, max]`.
    pub fn set_current(&mut self, value: i64) -> PoolChange {
        let before = self.current;
        let clamped = value.clamp(0, i64::from(self.max));
        // clamp bounds guarantee the conversion
        self.current = u32::try_from(clamped).unwrap_or(self.max);
        self.change_from(before)
    }

    /// Adds `amount`, saturating at `max`.
    pub fn add(&mut self, amount: u32) -> PoolChange {
        self.set_current(i64::from(self.current) + i64::from(amount))
    }

    /// Removes `amount`, saturating at zero.
    pub fn remove(&mut self, amount: u32) -> PoolChange {
        self.set_current(i64::from(self.current) - i64::from(amount))
    }

    /// Drops the pool to zero.
    pub fn deplete(&mut self) -> PoolChange {
        self.set_current(0)
    }

    /// Refills the pool to its maximum.
    pub fn fill(&mut self) -> PoolChange {
        self.set_current(i64::from(self.max))
    }

    /// Changes the upper bound, clamping the current value into it.
    pub fn set_max(&mut self, max: u32) -> PoolChange {
        let before = self.current;
        self.max = max;
        self.current = self.current.min(max);
        self.change_from(before)
    }

    /// Amount recovered per interval for the given percentage bonus.
    ///
    /// `percent_per_second` is a fraction of `max` per second; the fractional
    /// part is rounded up so small bonuses remain visible.
    #[must_use]
    pub fn recovery_amount(&self, percent_per_second: f32, interval: f32) -> i64 {
        let percent = f64::from(self.max) * f64::from(percent_per_second) * f64::from(interval);
        #[allow(clippy::cast_possible_truncation)]
        let percent = percent.ceil() as i64;
        i64::from(self.recovery_per_tick) + percent
    }

    /// Applies one regeneration step.
    ///
    /// Skipped when the pool is disabled or the owning actor is dead.
    pub fn recover(&mut self, amount: i64, owner_alive: bool) -> PoolChange {
        if !self.enabled || !owner_alive || amount == 0 {
            return PoolChange::default();
        }
        self.set_current(i64::from(self.current) + amount)
    }

    fn change_from(&self, before: u32) -> PoolChange {
        debug_assert!(self.current <= self.max);
        PoolChange {
            delta: i64::from(self.current) - i64::from(before),
            emptied: before > 0 && self.current == 0,
        }
    }
}

impl Default for ResourcePool {
    fn default() -> Self {
        Self::new(100)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    mod clamp_tests {
        use super::*;

        #[test]
        fn add_saturates_at_max() {
            let mut pool = ResourcePool::with_current(10, 8);
            let change = pool.add(5);
            assert_eq!(pool.current(), 10);
            assert_eq!(change.delta, 2);
            assert!(!change.emptied);
        }

        #[test]
        fn set_current_clamps_negative() {
            let mut pool = ResourcePool::new(10);
            let change = pool.set_current(-4);
            assert_eq!(pool.current(), 0);
            assert!(change.emptied);
            assert_eq!(change.lost(), 10);
        }

        #[test]
        fn set_max_clamps_current() {
            let mut pool = ResourcePool::new(50);
            pool.set_max(20);
            assert_eq!(pool.current(), 20);
            assert_eq!(pool.max(), 20);
        }

        #[test]
        fn percent_handles_zero_max() {
            let pool = ResourcePool::new(0);
            assert!(pool.percent().abs() < f32::EPSILON);

            let half = ResourcePool::with_current(10, 5);
            assert!((half.percent() - 0.5).abs() < f32::EPSILON);
        }
    }

    mod emptied_tests {
        use super::*;

        #[test]
        fn emptied_fires_once_per_depletion() {
            let mut pool = ResourcePool::new(10);
            assert!(pool.remove(12).emptied);
            assert!(!pool.remove(1).emptied);
            assert!(!pool.deplete().emptied);

            pool.add(3);
            assert!(pool.remove(3).emptied);
        }

        #[test]
        fn shrinking_max_to_zero_empties() {
            let mut pool = ResourcePool::new(5);
            assert!(pool.set_max(0).emptied);
        }
    }

    mod recovery_tests {
        use super::*;

        #[test]
        fn recovery_skipped_when_dead_or_disabled() {
            let mut pool = ResourcePool::with_current(10, 5);
            assert_eq!(pool.recover(3, false).delta, 0);

            pool.set_enabled(false);
            assert_eq!(pool.recover(3, true).delta, 0);
            assert_eq!(pool.current(), 5);
        }

        #[test]
        fn recovery_amount_rounds_percentage_up() {
            let pool = ResourcePool::new(30).with_recovery(2);
            // 30 * 0.01 * 1.0 = 0.3 -> 1
            assert_eq!(pool.recovery_amount(0.01, 1.0), 3);
            assert_eq!(pool.recovery_amount(0.0, 1.0), 2);
        }

        #[test]
        fn negative_recovery_drains() {
            let mut pool = ResourcePool::with_current(10, 2);
            let change = pool.recover(-5, true);
            assert_eq!(pool.current(), 0);
            assert!(change.emptied);
        }
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(u32),
        Remove(u32),
        Set(i64),
        Recover(i64),
        SetMax(u32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u32..500).prop_map(Op::Add),
            (0u32..500).prop_map(Op::Remove),
            (-500i64..500).prop_map(Op::Set),
            (-50i64..50).prop_map(Op::Recover),
            (0u32..300).prop_map(Op::SetMax),
        ]
    }

    proptest! {
        #[test]
        fn current_stays_within_bounds(max in 0u32..300, ops in prop::collection::vec(op_strategy(), 0..64)) {
            let mut pool = ResourcePool::new(max);
            for op in ops {
                match op {
                    Op::Add(n) => { pool.add(n); }
                    Op::Remove(n) => { pool.remove(n); }
                    Op::Set(n) => { pool.set_current(n); }
                    Op::Recover(n) => { pool.recover(n, true); }
                    Op::SetMax(m) => { pool.set_max(m); }
                }
                prop_assert!(pool.current() <= pool.max());
            }
        }

        #[test]
        fn emptied_matches_positive_to_zero_edges(ops in prop::collection::vec(op_strategy(), 0..64)) {
            let mut pool = ResourcePool::new(100);
            for op in ops {
                let before = pool.current();
                let change = match op {
                    Op::Add(n) => pool.add(n),
                    Op::Remove(n) => pool.remove(n),
                    Op::Set(n) => pool.set_current(n),
                    Op::Recover(n) => pool.recover(n, true),
                    Op::SetMax(m) => pool.set_max(m),
                };
                prop_assert_eq!(change.emptied, before > 0 && pool.current() == 0);
            }
        }
    }
}
