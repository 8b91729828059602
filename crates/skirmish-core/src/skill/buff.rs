//! Timed stat modifiers applied by buff skills.

use serde::{Deserialize, Serialize};

use crate::bonus::StatBonuses;
use crate::skill::BuffEffect;

/// An active buff on an actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Buff {
    /// Name of the skill that applied it; re-applying refreshes this entry.
    pub source: String,
    /// Skill level at application.
    pub level: u32,
    /// Seconds left.
    pub remaining: f32,
    /// Stat deltas while active.
    pub bonuses: StatBonuses,
    /// Kept when the bearer dies.
    pub remain_after_death: bool,
}

impl Buff {
    /// Builds a buff from a skill's buff parameters at `level`.
    #[must_use]
    pub fn from_effect(source: &str, effect: &BuffEffect, level: u32) -> Self {
        Self {
            source: source.to_string(),
            level,
            remaining: effect.duration.at(level).max(0.0),
            bonuses: effect.bonuses.at(level),
            remain_after_death: effect.remain_after_death,
        }
    }

    /// Counts down. Returns true once expired.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.remaining = super::count_down(self.remaining, dt);
        self.is_expired()
    }

    /// Returns true if no time is left.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining <= 0.0
    }
}
