//! Skill templates, per-actor skill state and the cast pipeline.
//!
//! A [`SkillTemplate`] is immutable game data: costs, timings and a
//! [`SkillKind`] that carries the effect parameters. Each actor owns a
//! [`SkillSet`] of [`SkillInstance`]s (level, cooldown, cast progress) plus the
//! buffs currently applied to it.
//!
//! # Casting
//!
//! Casting is split between three places:
//!
//! - [`cast`] validates an attempt (self, target, distance, field of view) and
//!   produces a [`cast::CastPlan`].
//! - [`SkillSet`] tracks the lifecycle: start, per-tick countdown, cancel.
//! - [`crate::resolver::apply`] performs the effect when a cast finishes.
//!
//! # Example
//!
//! ```
//! use skirmish_core::skill::{SkillTemplate, SkillKind, DamageEffect, DrainEffect};
//! use skirmish_core::curve::{LinearFloat, LinearInt};
//!
//! let slash = SkillTemplate::new(
//!     "slash",
//!     SkillKind::TargetDamage {
//!         damage: DamageEffect::flat(5),
//!         drain: DrainEffect::default(),
//!     },
//! )
//! .with_cast_time(LinearFloat::constant(0.5))
//! .with_cast_range(LinearFloat::constant(2.0))
//! .with_mana_cost(LinearInt::constant(3));
//!
//! assert_eq!(slash.mana_cost.at(1), 3);
//! assert!(slash.kind.is_castable());
//! ```

pub mod buff;
pub mod cast;
mod instance;

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::bonus::BonusCurves;
use crate::curve::{LinearFloat, LinearInt};

pub use buff::Buff;
pub(crate) use instance::count_down;
pub use instance::{CancelOutcome, SkillInstance, SkillSet, TIMER_EPSILON};

bitflags! {
    /// Behavior switches of a skill template.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct SkillFlags: u8 {
        /// Learned at level 1 when the actor spawns.
        const LEARN_DEFAULT              = 1 << 0;
        /// Abort the cast when the target dies or disappears.
        const CANCEL_CAST_IF_TARGET_DIED = 1 << 1;
        /// The caster may voluntarily cancel the cast.
        const CAN_CANCEL_CAST            = 1 << 2;
        /// The caster may keep moving while casting.
        const ALLOW_MOVEMENT             = 1 << 3;
    }
}

bitflags! {
    /// Which candidates a heal or buff may affect.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct TargetFilter: u8 {
        /// The caster itself.
        const SELF           = 1 << 0;
        /// Actors the caster may heal (faction allies).
        const ALLIES         = 1 << 1;
        /// Actors the caster may attack.
        const ENEMIES        = 1 << 2;
        /// Restrict allies to the caster's own actor kind.
        const ONLY_SAME_KIND = 1 << 3;
    }
}

// =============================================================================
// Effect parameters
// =============================================================================

/// Direct damage with an optional stun.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageEffect {
    /// Added to the caster's own damage.
    pub damage: LinearInt,
    /// Stun probability in `[0, 1]`.
    pub stun_chance: LinearFloat,
    /// Stun duration in seconds.
    pub stun_time: LinearFloat,
}

impl DamageEffect {
    /// Level-independent damage, no stun.
    #[must_use]
    pub const fn flat(damage: i32) -> Self {
        Self {
            damage: LinearInt::constant(damage),
            stun_chance: LinearFloat::constant(0.0),
            stun_time: LinearFloat::constant(0.0),
        }
    }

    /// Adds a stun.
    #[must_use]
    pub const fn with_stun(mut self, chance: f32, time: f32) -> Self {
        self.stun_chance = LinearFloat::constant(chance);
        self.stun_time = LinearFloat::constant(time);
        self
    }
}

/// Mana and health transfer from the victim.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DrainEffect {
    /// Mana moved per application.
    pub mana: LinearInt,
    /// Health moved per application.
    pub health: LinearInt,
    /// A minion caster feeds its owner instead of itself.
    pub to_owner: bool,
}

impl DrainEffect {
    /// Returns true if either channel is non-zero at `level`.
    #[must_use]
    pub fn is_active(&self, level: u32) -> bool {
        self.mana.at(level) > 0 || self.health.at(level) > 0
    }
}

/// Health and mana restoration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealEffect {
    /// Health restored.
    pub health: LinearInt,
    /// Mana restored.
    pub mana: LinearInt,
    /// Who may receive it.
    pub filter: TargetFilter,
}

impl Default for HealEffect {
    fn default() -> Self {
        Self {
            health: LinearInt::default(),
            mana: LinearInt::default(),
            filter: TargetFilter::SELF | TargetFilter::ALLIES,
        }
    }
}

/// Timed stat modifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuffEffect {
    /// Stat deltas while active.
    pub bonuses: BonusCurves,
    /// Duration in seconds.
    pub duration: LinearFloat,
    /// Survives the recipient's death.
    pub remain_after_death: bool,
    /// Who may receive it.
    pub filter: TargetFilter,
}

impl Default for BuffEffect {
    fn default() -> Self {
        Self {
            bonuses: BonusCurves::default(),
            duration: LinearFloat::constant(60.0),
            remain_after_death: false,
            filter: TargetFilter::SELF | TargetFilter::ALLIES,
        }
    }
}

/// Travelling damage carrier.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileEffect {
    /// Damage and stun delivered on hit.
    pub damage: DamageEffect,
    /// Drain delivered on hit.
    pub drain: DrainEffect,
    /// Units per second.
    pub speed: LinearFloat,
    /// Seconds before the projectile fizzles.
    pub lifetime: LinearFloat,
}

/// Raises allied corpses as minions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResurrectEffect {
    /// Lifetime of the raised minion in seconds.
    pub minion_lifetime: LinearFloat,
}

impl Default for ResurrectEffect {
    fn default() -> Self {
        Self {
            minion_lifetime: LinearFloat::constant(10.0),
        }
    }
}

// =============================================================================
// Skill kind
// =============================================================================

/// Broad targeting category of a skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Needs an attackable target.
    Targeted,
    /// Hits everything qualifying around the caster.
    Area,
    /// Aimed at a friendly target, falling back to the caster.
    SelfTargeted,
    /// Never cast; contributes bonuses while learned.
    Passive,
    /// Launches a projectile.
    Projectile,
    /// Steals resources from a nearby enemy.
    Drain,
    /// Raises corpses.
    Resurrect,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Targeted => write!(f, "targeted"),
            Self::Area => write!(f, "area"),
            Self::SelfTargeted => write!(f, "self"),
            Self::Passive => write!(f, "passive"),
            Self::Projectile => write!(f, "projectile"),
            Self::Drain => write!(f, "drain"),
            Self::Resurrect => write!(f, "resurrect"),
        }
    }
}

/// What a skill does when its cast finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SkillKind {
    /// Damage (and optional drain) on the current target.
    TargetDamage {
        /// Damage and stun.
        damage: DamageEffect,
        /// Drain applied after the hit.
        drain: DrainEffect,
    },
    /// Damage to every attackable actor within cast range.
    AreaDamage(DamageEffect),
    /// Heal the target, or the caster when the target cannot be healed.
    TargetHeal(HealEffect),
    /// Heal every qualifying actor within cast range.
    AreaHeal(HealEffect),
    /// Buff the target, or the caster when the target cannot be buffed.
    TargetBuff(BuffEffect),
    /// Buff every qualifying actor within cast range.
    AreaBuff(BuffEffect),
    /// Drain the closest attackable actor within cast range.
    Drain(DrainEffect),
    /// Raise allied corpses within cast range as minions.
    Resurrect(ResurrectEffect),
    /// Launch a projectile.
    Projectile(ProjectileEffect),
    /// Permanent bonus while learned.
    Passive(BonusCurves),
}

impl SkillKind {
    /// Targeting category.
    #[must_use]
    pub const fn capability(&self) -> Capability {
        match self {
            Self::TargetDamage { .. } => Capability::Targeted,
            Self::AreaDamage(_) | Self::AreaHeal(_) | Self::AreaBuff(_) => Capability::Area,
            Self::TargetHeal(_) | Self::TargetBuff(_) => Capability::SelfTargeted,
            Self::Drain(_) => Capability::Drain,
            Self::Resurrect(_) => Capability::Resurrect,
            Self::Projectile(_) => Capability::Projectile,
            Self::Passive(_) => Capability::Passive,
        }
    }

    /// Passive skills can never be cast.
    #[must_use]
    pub const fn is_castable(&self) -> bool {
        !matches!(self, Self::Passive(_))
    }
}

// =============================================================================
// Skill template
// =============================================================================

/// Immutable skill definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillTemplate {
    /// Unique name, also used to refresh buffs.
    pub name: String,
    /// Behavior switches.
    pub flags: SkillFlags,
    /// Actor level required to reach each skill level.
    pub required_level: LinearInt,
    /// Highest learnable level.
    pub max_level: u32,
    /// Mana deducted when the cast finishes.
    pub mana_cost: LinearInt,
    /// Seconds from start to finish; zero means instant.
    pub cast_time: LinearFloat,
    /// Seconds before the skill can be used again.
    pub cooldown: LinearFloat,
    /// Reach for targeted skills, radius for area skills.
    pub cast_range: LinearFloat,
    /// Effect.
    pub kind: SkillKind,
}

impl SkillTemplate {
    /// Creates a level-1, instant, free, cancellable template.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: SkillKind) -> Self {
        Self {
            name: name.into(),
            flags: SkillFlags::LEARN_DEFAULT
                | SkillFlags::CAN_CANCEL_CAST
                | SkillFlags::ALLOW_MOVEMENT,
            required_level: LinearInt::constant(1),
            max_level: 1,
            mana_cost: LinearInt::constant(0),
            cast_time: LinearFloat::constant(0.0),
            cooldown: LinearFloat::constant(0.0),
            cast_range: LinearFloat::constant(2.0),
            kind,
        }
    }

    /// Replaces the flags.
    #[must_use]
    pub fn with_flags(mut self, flags: SkillFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the cast time curve.
    #[must_use]
    pub fn with_cast_time(mut self, cast_time: LinearFloat) -> Self {
        self.cast_time = cast_time;
        self
    }

    /// Sets the cooldown curve.
    #[must_use]
    pub fn with_cooldown(mut self, cooldown: LinearFloat) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Sets the range curve.
    #[must_use]
    pub fn with_cast_range(mut self, cast_range: LinearFloat) -> Self {
        self.cast_range = cast_range;
        self
    }

    /// Sets the mana cost curve.
    #[must_use]
    pub fn with_mana_cost(mut self, mana_cost: LinearInt) -> Self {
        self.mana_cost = mana_cost;
        self
    }

    /// Sets the level cap and per-level requirement.
    #[must_use]
    pub fn with_levels(mut self, max_level: u32, required_level: LinearInt) -> Self {
        self.max_level = max_level.max(1);
        self.required_level = required_level;
        self
    }

    /// Returns true if `flag` is set.
    #[must_use]
    pub fn has(&self, flag: SkillFlags) -> bool {
        self.flags.contains(flag)
    }

    /// Mana cost at `level`, never negative.
    #[must_use]
    pub fn cost_at(&self, level: u32) -> u32 {
        self.mana_cost.at_unsigned(level)
    }

    /// Cast time at `level`, never negative.
    #[must_use]
    pub fn cast_time_at(&self, level: u32) -> f32 {
        self.cast_time.at(level).max(0.0)
    }

    /// Cooldown at `level`, never negative.
    #[must_use]
    pub fn cooldown_at(&self, level: u32) -> f32 {
        self.cooldown.at(level).max(0.0)
    }

    /// Range at `level`, never negative.
    #[must_use]
    pub fn range_at(&self, level: u32) -> f32 {
        self.cast_range.at(level).max(0.0)
    }
}
