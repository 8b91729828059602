//! Error types.
//!
//! Gameplay rejections are values, not failures: a [`CastRejection`] tells the
//! brain why a cast did not start and is only ever logged. [`SimError`] and
//! [`SkillRequestError`] report misuse of the host-facing API, and
//! [`ConfigError`] covers loading and validating configuration.

use glam::Vec2;
use thiserror::Error;

use crate::actor::{ActorId, ActorKind};
use crate::brain::State;

/// Why a cast attempt failed one of the pipeline checks.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CastRejection {
    /// The caster is dead.
    #[error("caster is dead")]
    CasterDead,

    /// The skill has level 0.
    #[error("skill is not learned")]
    NotLearned,

    /// Passive skills are never cast.
    #[error("skill is passive")]
    Passive,

    /// The caster cannot pay the mana cost.
    #[error("not enough mana: need {required}, have {available}")]
    NotEnoughMana {
        /// Cost at the skill's level.
        required: u32,
        /// Caster's current mana.
        available: u32,
    },

    /// No valid target for this skill.
    #[error("no valid target")]
    InvalidTarget,

    /// The target is beyond the skill's range.
    #[error("target out of range: {distance:.2} > {range:.2}")]
    OutOfRange {
        /// Surface-to-surface distance.
        distance: f32,
        /// Skill range.
        range: f32,
        /// Closest point on the target, where the caster would need to go.
        destination: Vec2,
    },

    /// The target is outside the caster's field of view.
    #[error("target outside field of view")]
    OutOfView,
}

/// Why a host skill request or upgrade was refused.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkillRequestError {
    /// Index past the end of the skill list.
    #[error("skill index {index} out of range (actor has {count} skills)")]
    InvalidIndex {
        /// Requested index.
        index: usize,
        /// Number of skills.
        count: usize,
    },

    /// The skill has level 0.
    #[error("skill '{name}' is not learned")]
    NotLearned {
        /// Skill name.
        name: String,
    },

    /// The skill is cooling down.
    #[error("skill '{name}' is on cooldown for {remaining:.2}s")]
    OnCooldown {
        /// Skill name.
        name: String,
        /// Seconds left.
        remaining: f32,
    },

    /// Passive skills cannot be requested.
    #[error("skill '{name}' is passive")]
    Passive {
        /// Skill name.
        name: String,
    },

    /// The actor's state does not accept skill commands.
    #[error("cannot use skills while {state}")]
    InvalidState {
        /// Current state.
        state: State,
    },

    /// Level cap reached or actor level too low.
    #[error("skill '{name}' cannot be upgraded")]
    UpgradeRefused {
        /// Skill name.
        name: String,
    },
}

/// Host-facing simulation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// No actor with this id.
    #[error("unknown actor {0}")]
    UnknownActor(ActorId),

    /// The command only applies to another kind of actor.
    #[error("actor {actor} is {found}, expected {expected}")]
    WrongKind {
        /// Actor addressed.
        actor: ActorId,
        /// Kind the command needs.
        expected: ActorKind,
        /// Kind the actor has.
        found: ActorKind,
    },

    /// Skill command refused.
    #[error(transparent)]
    Skill(#[from] SkillRequestError),
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of its allowed range.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        /// Dotted field path.
        field: &'static str,
        /// Human-readable reason.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_readable() {
        let err = CastRejection::NotEnoughMana {
            required: 10,
            available: 4,
        };
        assert_eq!(err.to_string(), "not enough mana: need 10, have 4");

        let err = SimError::from(SkillRequestError::InvalidIndex { index: 7, count: 2 });
        assert_eq!(err.to_string(), "skill index 7 out of range (actor has 2 skills)");
    }

    #[test]
    fn wrong_kind_names_both_kinds() {
        let err = SimError::WrongKind {
            actor: ActorId::new(3),
            expected: ActorKind::Player,
            found: ActorKind::Enemy,
        };
        assert_eq!(err.to_string(), "actor 3 is Enemy, expected Player");
    }
}
