//! Test helper functions for setting up simulations and actors.
//!
//! Factory functions for skills and scenarios, plus small accessors that keep
//! the assertions in the other test files readable.

use glam::Vec2;

use crate::actor::{ActorId, ActorSpec, Collider, FactionId};
use crate::brain::State;
use crate::config::SimulationConfig;
use crate::curve::{LinearFloat, LinearInt};
use crate::presentation::CombatEvent;
use crate::simulation::Simulation;
use crate::skill::{DamageEffect, DrainEffect, SkillKind, SkillTemplate};

// =============================================================================
// Simulations
// =============================================================================

/// Config whose mobs never wander, so positions only change on purpose.
pub fn still_config(seed: u64) -> SimulationConfig {
    let mut config = SimulationConfig::with_seed(seed);
    config.enemy.move_probability = 0.0;
    config.minion.move_probability = 0.0;
    config
}

/// Simulation built from [`still_config`].
pub fn still_sim(seed: u64) -> Simulation {
    Simulation::new(still_config(seed))
}

/// Steps `ticks` times.
pub fn run(sim: &mut Simulation, ticks: usize) {
    for _ in 0..ticks {
        sim.step();
    }
}

/// Steps until `done` holds, at most `limit` times. Returns whether it did.
pub fn run_until(
    sim: &mut Simulation,
    limit: usize,
    mut done: impl FnMut(&Simulation) -> bool,
) -> bool {
    for _ in 0..limit {
        if done(sim) {
            return true;
        }
        sim.step();
    }
    done(sim)
}

// =============================================================================
// Skills
// =============================================================================

/// Targeted damage skill adding `damage` to the caster's own.
pub fn strike(name: &str, damage: i32, range: f32, cast_time: f32) -> SkillTemplate {
    SkillTemplate::new(
        name,
        SkillKind::TargetDamage {
            damage: DamageEffect::flat(damage),
            drain: DrainEffect::default(),
        },
    )
    .with_cast_range(LinearFloat::constant(range))
    .with_cast_time(LinearFloat::constant(cast_time))
}

/// Same as [`strike`] with a mana cost.
pub fn costly_strike(damage: i32, cost: i32, cast_time: f32) -> SkillTemplate {
    strike("heavy", damage, 2.0, cast_time).with_mana_cost(LinearInt::constant(cost))
}

// =============================================================================
// Actors
// =============================================================================

/// A player of the monster faction that never acts on its own.
pub fn dummy(position: Vec2) -> ActorSpec {
    ActorSpec::player("dummy", position).with_faction(FactionId::MONSTERS)
}

/// An ally with two overlapping colliders.
pub fn bulky_ally(name: &str, position: Vec2) -> ActorSpec {
    ActorSpec::player(name, position).with_colliders(vec![
        Collider::centered(0.5),
        Collider::offset(Vec2::new(0.3, 0.0), 0.5),
    ])
}

/// Spawns a melee crowd: two heroes, four armed wolves and a minion.
pub fn setup_melee(sim: &mut Simulation) -> Vec<ActorId> {
    let mut ids = Vec::new();
    let hero =
        sim.spawn(ActorSpec::player("hero", Vec2::ZERO).with_skill(strike("slash", 3, 2.0, 0.2)));
    ids.push(hero);
    ids.push(sim.spawn(ActorSpec::player("squire", Vec2::new(0.0, 3.0))));
    for i in 0..4u8 {
        let angle = f32::from(i) * std::f32::consts::FRAC_PI_2;
        let position = Vec2::new(angle.cos(), angle.sin()) * 8.0;
        ids.push(sim.spawn(
            ActorSpec::enemy(format!("wolf{i}"), position)
                .with_skill(strike("bite", 2, 2.0, 0.0).with_cooldown(LinearFloat::constant(0.5))),
        ));
    }
    ids.push(sim.spawn(
        ActorSpec::minion("imp", Vec2::new(-2.0, 0.0), hero)
            .with_skill(strike("claw", 1, 2.0, 0.0)),
    ));
    ids
}

// =============================================================================
// Accessors
// =============================================================================

/// Current health of an actor.
pub fn health(sim: &Simulation, id: ActorId) -> u32 {
    sim.arena().get(id).map_or(0, |a| a.health.current())
}

/// Current state of an actor.
pub fn state(sim: &Simulation, id: ActorId) -> State {
    sim.arena().get(id).map_or(State::Dead, |a| a.state)
}

/// Number of recorded events matching `predicate`.
pub fn count_events(sim: &Simulation, predicate: impl Fn(&CombatEvent) -> bool) -> usize {
    sim.events().iter().filter(|e| predicate(&e.event)).count()
}
