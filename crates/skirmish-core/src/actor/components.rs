//! Component structs stored on actors.
//!
//! Shared components (transform, colliders, combat stats) live directly on
//! [`Actor`](super::Actor); kind-specific bookkeeping lives in the
//! [`ActorInner`](super::ActorInner) variants defined here.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::actor::ActorId;
use crate::curve::{LinearFloat, LinearInt};

/// Default field-of-view cone, in degrees.
pub const DEFAULT_FOV_DEGREES: f32 = 140.0;

/// Default chance per second that an idle mob plays an ambient sound.
pub const DEFAULT_AMBIENT_SOUND_PROBABILITY: f32 = 0.01;

// =============================================================================
// Transform & Colliders
// =============================================================================

/// Ground-plane pose.
///
/// `yaw` is in radians, counter-clockwise from +X.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    /// World position.
    pub position: Vec2,
    /// Facing angle in radians.
    pub yaw: f32,
}

impl Transform {
    /// Creates a transform.
    #[must_use]
    pub const fn new(position: Vec2, yaw: f32) -> Self {
        Self { position, yaw }
    }

    /// Unit vector the actor is facing.
    #[must_use]
    pub fn forward(&self) -> Vec2 {
        Vec2::from_angle(self.yaw)
    }

    /// Rotates to face `point`. No-op when `point` is the current position.
    pub fn look_at(&mut self, point: Vec2) {
        let direction = point - self.position;
        if direction.length_squared() > f32::EPSILON {
            self.yaw = direction.y.atan2(direction.x);
        }
    }

    /// Returns true if `point` lies inside the forward cone of `fov_degrees`.
    ///
    /// A point on top of the actor counts as visible.
    #[must_use]
    pub fn in_fov(&self, point: Vec2, fov_degrees: f32) -> bool {
        let direction = point - self.position;
        if direction.length_squared() <= f32::EPSILON {
            return true;
        }
        let forward = self.forward();
        let angle = forward.perp_dot(direction).atan2(forward.dot(direction)).abs().to_degrees();
        angle < fov_degrees * 0.5
    }
}

/// A circular contact shape, offset from the actor position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    /// Offset from the actor position.
    pub offset: Vec2,
    /// Radius.
    pub radius: f32,
}

impl Collider {
    /// A collider centered on the actor.
    #[must_use]
    pub const fn centered(radius: f32) -> Self {
        Self {
            offset: Vec2::ZERO,
            radius,
        }
    }

    /// A collider at an offset.
    #[must_use]
    pub const fn offset(offset: Vec2, radius: f32) -> Self {
        Self { offset, radius }
    }
}

impl Default for Collider {
    fn default() -> Self {
        Self::centered(0.5)
    }
}

// =============================================================================
// Faction
// =============================================================================

/// Faction identifier.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct FactionId(u32);

impl FactionId {
    /// Default faction of players.
    pub const PLAYERS: Self = Self(0);
    /// Default faction of enemies.
    pub const MONSTERS: Self = Self(1);

    /// Creates a faction id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for FactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FactionId({})", self.0)
    }
}

impl fmt::Display for FactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Combat stats
// =============================================================================

/// Level-scaled combat numbers before bonuses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatStats {
    /// Base outgoing damage.
    pub damage: LinearInt,
    /// Flat mitigation.
    pub defense: LinearInt,
    /// Chance to fully block a hit.
    pub block_chance: LinearFloat,
    /// Chance to crit with hits and heals.
    pub critical_chance: LinearFloat,
    /// Ignores all damage.
    pub invincible: bool,
    /// Whether stuns land.
    pub can_be_stunned: bool,
    /// Multiplies damage by `ceil(1 + pct * target max health)` when positive.
    pub bonus_damage_health_percent: f32,
}

impl Default for CombatStats {
    fn default() -> Self {
        Self {
            damage: LinearInt::constant(1),
            defense: LinearInt::constant(0),
            block_chance: LinearFloat::constant(0.0),
            critical_chance: LinearFloat::constant(0.0),
            invincible: false,
            can_be_stunned: true,
            bonus_damage_health_percent: 0.0,
        }
    }
}

// =============================================================================
// Kind-specific components
// =============================================================================

/// Player-only bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerComponents {
    /// Set by input; consumed by the brain.
    pub cancel_action_requested: bool,
    /// Target chosen while casting, applied once the cast ends.
    pub next_target: Option<ActorId>,
    /// Skill requested while casting, promoted once the cast finishes.
    pub pending_skill: Option<usize>,
    /// Turn toward the target while casting.
    pub combat_look_at: bool,
}

impl Default for PlayerComponents {
    fn default() -> Self {
        Self {
            cancel_action_requested: false,
            next_target: None,
            pending_skill: None,
            combat_look_at: true,
        }
    }
}

/// Monster bookkeeping shared by enemies and minions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MobComponents {
    /// Spawn point; wander and follow distances are measured from here.
    pub home: Vec2,
    /// Last skill finished, for round-robin selection.
    pub last_skill: Option<usize>,
    /// Chance per second to play an ambient sound while idle.
    pub ambient_sound_probability: f32,
    /// Radius within which attackable actors are noticed.
    pub aggro_radius: f32,
}

impl MobComponents {
    /// Mob anchored at `home`.
    #[must_use]
    pub fn at(home: Vec2) -> Self {
        Self {
            home,
            ..Self::default()
        }
    }
}

impl Default for MobComponents {
    fn default() -> Self {
        Self {
            home: Vec2::ZERO,
            last_skill: None,
            ambient_sound_probability: DEFAULT_AMBIENT_SOUND_PROBABILITY,
            aggro_radius: 10.0,
        }
    }
}

/// Summoned minion bookkeeping.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MinionComponents {
    /// Shared monster state.
    pub mob: MobComponents,
    /// Summoner.
    pub owner: Option<ActorId>,
    /// Seconds until the minion expires, if limited.
    pub lifetime_remaining: Option<f32>,
}
