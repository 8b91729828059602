//! Simulation configuration.
//!
//! All tunables have game defaults through `Default` and `#[serde(default)]`,
//! so a JSON file only needs the values it changes:
//!
//! ```
//! use skirmish_core::config::SimulationConfig;
//!
//! let config = SimulationConfig::from_json_str(r#"{ "seed": 7, "enemy": { "follow_distance": 25.0 } }"#).unwrap();
//! assert_eq!(config.seed, 7);
//! assert!((config.enemy.follow_distance - 25.0).abs() < f32::EPSILON);
//! assert!((config.enemy.move_distance - 10.0).abs() < f32::EPSILON);
//! ```

use serde::{Deserialize, Serialize};

use crate::actor::FactionId;
use crate::error::ConfigError;

/// Combat constants shared by all resolvers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatRules {
    /// Damage and heal multiplier on a critical, rounded up.
    pub crit_multiplier: f32,
    /// Minimum cooldown forced on a skill whose cast is hit by a stun.
    pub stun_cast_cooldown: f32,
    /// A mob switches targets only if the new one is closer than this
    /// fraction of the current target's distance.
    pub aggro_switch_ratio: f32,
    /// Radius in which an enemy's first aggro spreads to idle enemies.
    pub aggro_propagation_radius: f32,
    /// Seconds a corpse remains before it is marked decayed.
    pub corpse_decay_time: f32,
}

impl Default for CombatRules {
    fn default() -> Self {
        Self {
            crit_multiplier: 1.5,
            stun_cast_cooldown: 2.0,
            aggro_switch_ratio: 0.8,
            aggro_propagation_radius: 10.0,
            corpse_decay_time: 5.0,
        }
    }
}

/// Enemy behavior tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyBrainConfig {
    /// Chance per second to wander while idle.
    pub move_probability: f32,
    /// Maximum wander distance from home.
    pub move_distance: f32,
    /// Give up a target whose closest point is this far from home.
    pub follow_distance: f32,
    /// Chase until this fraction of the skill range.
    pub attack_to_move_range_ratio: f32,
    /// Seconds between ambient sounds at least.
    pub min_ambient_sound_delay: f32,
}

impl Default for EnemyBrainConfig {
    fn default() -> Self {
        Self {
            move_probability: 0.1,
            move_distance: 10.0,
            follow_distance: 40.0,
            attack_to_move_range_ratio: 0.8,
            min_ambient_sound_delay: 1.0,
        }
    }
}

/// Minion behavior tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinionBrainConfig {
    /// Chance per second to wander while idle.
    pub move_probability: f32,
    /// Maximum wander distance.
    pub wander_distance: f32,
    /// Walk back to the owner beyond this distance when idle.
    pub return_distance: f32,
    /// Give up a target this far from the owner.
    pub follow_distance: f32,
    /// Warp to the owner beyond this distance.
    pub teleport_distance: f32,
    /// Chase until this fraction of the skill range.
    pub attack_to_move_range_ratio: f32,
    /// Seconds between ambient sounds at least.
    pub min_ambient_sound_delay: f32,
}

impl Default for MinionBrainConfig {
    fn default() -> Self {
        Self {
            move_probability: 0.1,
            wander_distance: 10.0,
            return_distance: 25.0,
            follow_distance: 20.0,
            teleport_distance: 30.0,
            attack_to_move_range_ratio: 0.8,
            min_ambient_sound_delay: 1.0,
        }
    }
}

/// Player behavior tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerBrainConfig {
    /// Keep the cast timer running through a stun instead of cancelling.
    pub continue_cast_after_stunned: bool,
}

impl Default for PlayerBrainConfig {
    fn default() -> Self {
        Self {
            continue_cast_after_stunned: true,
        }
    }
}

/// Complete simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Master seed for all random rolls.
    pub seed: u64,
    /// Seconds per tick.
    pub tick_seconds: f32,
    /// Seconds between regeneration steps.
    pub regen_interval: f32,
    /// Faction pairs that start hostile, in addition to players vs monsters.
    pub hostile_factions: Vec<(u32, u32)>,
    /// Combat constants.
    pub combat: CombatRules,
    /// Enemy brain.
    pub enemy: EnemyBrainConfig,
    /// Minion brain.
    pub minion: MinionBrainConfig,
    /// Player brain.
    pub player: PlayerBrainConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            tick_seconds: 0.05,
            regen_interval: 1.0,
            hostile_factions: Vec::new(),
            combat: CombatRules::default(),
            enemy: EnemyBrainConfig::default(),
            minion: MinionBrainConfig::default(),
            player: PlayerBrainConfig::default(),
        }
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be positive, got {value}"),
        })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be zero or more, got {value}"),
        })
    }
}

fn fraction(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be within [0, 1], got {value}"),
        })
    }
}

impl SimulationConfig {
    /// Default configuration with a seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Hostile pairs as faction ids.
    pub fn hostile_pairs(&self) -> impl Iterator<Item = (FactionId, FactionId)> + '_ {
        self.hostile_factions
            .iter()
            .map(|(a, b)| (FactionId::new(*a), FactionId::new(*b)))
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("tick_seconds", self.tick_seconds)?;
        positive("regen_interval", self.regen_interval)?;

        let combat = &self.combat;
        if !(combat.crit_multiplier.is_finite() && combat.crit_multiplier >= 1.0) {
            return Err(ConfigError::Invalid {
                field: "combat.crit_multiplier",
                reason: format!("must be at least 1, got {}", combat.crit_multiplier),
            });
        }
        non_negative("combat.stun_cast_cooldown", combat.stun_cast_cooldown)?;
        fraction("combat.aggro_switch_ratio", combat.aggro_switch_ratio)?;
        non_negative("combat.aggro_propagation_radius", combat.aggro_propagation_radius)?;
        non_negative("combat.corpse_decay_time", combat.corpse_decay_time)?;

        let enemy = &self.enemy;
        non_negative("enemy.move_probability", enemy.move_probability)?;
        non_negative("enemy.move_distance", enemy.move_distance)?;
        positive("enemy.follow_distance", enemy.follow_distance)?;
        fraction("enemy.attack_to_move_range_ratio", enemy.attack_to_move_range_ratio)?;
        non_negative("enemy.min_ambient_sound_delay", enemy.min_ambient_sound_delay)?;

        let minion = &self.minion;
        non_negative("minion.move_probability", minion.move_probability)?;
        non_negative("minion.wander_distance", minion.wander_distance)?;
        positive("minion.return_distance", minion.return_distance)?;
        positive("minion.follow_distance", minion.follow_distance)?;
        fraction("minion.attack_to_move_range_ratio", minion.attack_to_move_range_ratio)?;
        non_negative("minion.min_ambient_sound_delay", minion.min_ambient_sound_delay)?;
        if minion.teleport_distance < minion.return_distance {
            return Err(ConfigError::Invalid {
                field: "minion.teleport_distance",
                reason: format!(
                    "must not be below return_distance ({} < {})",
                    minion.teleport_distance, minion.return_distance
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.combat.crit_multiplier - 1.5).abs() < f32::EPSILON);
        assert!((config.minion.teleport_distance - 30.0).abs() < f32::EPSILON);
        assert!(config.player.continue_cast_after_stunned);
    }

    #[test]
    fn json_round_trip() {
        let mut config = SimulationConfig::with_seed(99);
        config.hostile_factions.push((2, 3));
        config.player.continue_cast_after_stunned = false;

        let json = serde_json::to_string(&config).unwrap();
        let back = SimulationConfig::from_json_str(&json).unwrap();
        assert_eq!(back, config);
        assert_eq!(
            back.hostile_pairs().collect::<Vec<_>>(),
            vec![(FactionId::new(2), FactionId::new(3))]
        );
    }

    #[test]
    fn rejects_bad_values() {
        let err = SimulationConfig::from_json_str(r#"{ "tick_seconds": 0.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "tick_seconds", .. }));

        let err = SimulationConfig::from_json_str(r#"{ "combat": { "aggro_switch_ratio": 1.5 } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "combat.aggro_switch_ratio", .. }));

        let err = SimulationConfig::from_json_str(r#"{ "minion": { "teleport_distance": 5.0 } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "minion.teleport_distance", .. }));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = SimulationConfig::from_json_str("{ seed: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("failed to parse config"));
    }
}
