//! # Skirmish Core
//!
//! Deterministic decision and resolution core of an action-combat
//! simulation.
//!
//! Once per fixed tick, every live actor (player, enemy, summoned minion)
//! works out what it is doing, whether that should change, and, when a skill
//! is cast, whether the cast is legal and what it does.
//!
//! ## Architecture
//!
//! - **Actors**: players, enemies and minions with health and mana pools,
//!   skills, buffs and a [`brain::State`]
//! - **Brains**: per-kind state machines that observe a frozen
//!   [`world_view::WorldView`] and return a [`brain::Transition`]
//! - **Resolvers**: apply transitions, cast effects, damage and death to the
//!   [`arena::Arena`]
//! - **Collaborators**: [`movement::Movement`], [`terrain::Terrain`] and
//!   [`presentation::PresentationSink`] stand in for the host engine
//!
//! ## Usage
//!
//! ```
//! use skirmish_core::actor::ActorSpec;
//! use skirmish_core::config::SimulationConfig;
//! use skirmish_core::curve::LinearFloat;
//! use skirmish_core::simulation::Simulation;
//! use skirmish_core::skill::{DamageEffect, DrainEffect, SkillKind, SkillTemplate};
//! use glam::Vec2;
//!
//! let bite = SkillTemplate::new(
//!     "bite",
//!     SkillKind::TargetDamage { damage: DamageEffect::flat(4), drain: DrainEffect::default() },
//! )
//! .with_cooldown(LinearFloat::constant(1.0));
//!
//! let mut sim = Simulation::new(SimulationConfig::with_seed(1));
//! let hero = sim.spawn(ActorSpec::player("hero", Vec2::ZERO));
//! sim.spawn(ActorSpec::enemy("wolf", Vec2::new(3.0, 0.0)).with_skill(bite));
//!
//! for _ in 0..40 {
//!     sim.step();
//! }
//! assert!(sim.arena().get(hero).unwrap().health.current() < 100);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod actor;
pub mod aggro;
pub mod arena;
pub mod bonus;
pub mod brain;
pub mod config;
pub mod curve;
pub mod error;
pub mod movement;
pub mod pool;
pub mod presentation;
pub mod projectile;
pub mod resolver;
pub mod simulation;
pub mod skill;
pub mod terrain;
pub mod world_view;

pub use actor::{Actor, ActorId, ActorKind, ActorSpec};
pub use arena::Arena;
pub use brain::{Brain, BrainRegistry, State, Transition};
pub use config::SimulationConfig;
pub use error::{CastRejection, ConfigError, SimError, SkillRequestError};
pub use presentation::{CombatEvent, EventLog};
pub use simulation::Simulation;
pub use skill::{SkillKind, SkillTemplate};

#[cfg(test)]
mod tests;
