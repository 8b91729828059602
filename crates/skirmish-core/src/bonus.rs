//! Stat bonus aggregation.
//!
//! Buffs, learned passive skills and host-supplied providers (equipment,
//! auras, difficulty modifiers) all contribute a [`StatBonuses`] record. The
//! actor sums them whenever it needs an effective stat, so bonus providers stay
//! pluggable without the actor knowing their concrete type.

use std::fmt;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use crate::curve::{LinearFloat, LinearInt};

/// Flat and fractional stat deltas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatBonuses {
    /// Added to maximum health.
    pub health_max: i32,
    /// Added to maximum mana.
    pub mana_max: i32,
    /// Added to outgoing damage.
    pub damage: i32,
    /// Added to defense.
    pub defense: i32,
    /// Added to block chance.
    pub block_chance: f32,
    /// Added to critical chance.
    pub critical_chance: f32,
    /// Fraction of max health regenerated per second.
    pub health_percent_per_second: f32,
    /// Fraction of max mana regenerated per second.
    pub mana_percent_per_second: f32,
    /// Added to movement speed.
    pub speed: f32,
}

impl StatBonuses {
    /// No bonus.
    pub const NONE: Self = Self {
        health_max: 0,
        mana_max: 0,
        damage: 0,
        defense: 0,
        block_chance: 0.0,
        critical_chance: 0.0,
        health_percent_per_second: 0.0,
        mana_percent_per_second: 0.0,
        speed: 0.0,
    };
}

impl Add for StatBonuses {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl AddAssign for StatBonuses {
    fn add_assign(&mut self, rhs: Self) {
        self.health_max = self.health_max.saturating_add(rhs.health_max);
        self.mana_max = self.mana_max.saturating_add(rhs.mana_max);
        self.damage = self.damage.saturating_add(rhs.damage);
        self.defense = self.defense.saturating_add(rhs.defense);
        self.block_chance += rhs.block_chance;
        self.critical_chance += rhs.critical_chance;
        self.health_percent_per_second += rhs.health_percent_per_second;
        self.mana_percent_per_second += rhs.mana_percent_per_second;
        self.speed += rhs.speed;
    }
}

impl std::iter::Sum for StatBonuses {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::NONE, Add::add)
    }
}

/// Level-scaled bonus description carried by passive and buff skills.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BonusCurves {
    /// Maximum health bonus.
    pub health_max: LinearInt,
    /// Maximum mana bonus.
    pub mana_max: LinearInt,
    /// Damage bonus.
    pub damage: LinearInt,
    /// Defense bonus.
    pub defense: LinearInt,
    /// Block chance bonus.
    pub block_chance: LinearFloat,
    /// Critical chance bonus.
    pub critical_chance: LinearFloat,
    /// Health regeneration, fraction of max per second.
    pub health_percent_per_second: LinearFloat,
    /// Mana regeneration, fraction of max per second.
    pub mana_percent_per_second: LinearFloat,
    /// Movement speed bonus.
    pub speed: LinearFloat,
}

impl BonusCurves {
    /// Evaluates every curve at `level`.
    #[must_use]
    pub fn at(&self, level: u32) -> StatBonuses {
        StatBonuses {
            health_max: self.health_max.at(level),
            mana_max: self.mana_max.at(level),
            damage: self.damage.at(level),
            defense: self.defense.at(level),
            block_chance: self.block_chance.at(level),
            critical_chance: self.critical_chance.at(level),
            health_percent_per_second: self.health_percent_per_second.at(level),
            mana_percent_per_second: self.mana_percent_per_second.at(level),
            speed: self.speed.at(level),
        }
    }
}

/// A host-supplied source of stat bonuses.
///
/// Implementations must be cheap to query; they are summed every time an
/// effective stat is read.
pub trait StatBonus: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &str;

    /// Current contribution.
    fn bonuses(&self) -> StatBonuses;
}

impl fmt::Debug for dyn StatBonus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatBonus")
            .field("name", &self.name())
            .field("bonuses", &self.bonuses())
            .finish()
    }
}

/// A fixed bonus, handy for equipment-like providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatBonus {
    /// Label.
    pub name: String,
    /// Contribution.
    pub bonuses: StatBonuses,
}

impl StatBonus for FlatBonus {
    fn name(&self) -> &str {
        &self.name
    }

    fn bonuses(&self) -> StatBonuses {
        self.bonuses
    }
}
