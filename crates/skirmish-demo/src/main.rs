//! Headless Skirmish host.
//!
//! Spawns a small scripted encounter (a hero party against a wolf pack led
//! by a shaman), drives the hero the way a player would, and logs every
//! combat event until one side is wiped out or the tick limit runs out.
//!
//! ```text
//! skirmish-demo [config.json] [ticks]
//! ```
//!
//! Set `RUST_LOG=debug` to see refused casts and brain decisions.

use std::env;
use std::fs;

use anyhow::{Context, Result};
use glam::Vec2;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use skirmish_core::actor::{ActorId, ActorSpec};
use skirmish_core::bonus::BonusCurves;
use skirmish_core::curve::{LinearFloat, LinearInt};
use skirmish_core::skill::{
    BuffEffect, DamageEffect, DrainEffect, HealEffect, ProjectileEffect, ResurrectEffect,
};
use skirmish_core::{Simulation, SimulationConfig, SkillKind, SkillTemplate, State};

const DEFAULT_TICKS: u64 = 1200;

/// Actor ids of the scripted encounter.
struct Encounter {
    hero: ActorId,
    party: Vec<ActorId>,
    pack: Vec<ActorId>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mut args = env::args().skip(1);
    let config = match args.next() {
        Some(path) => {
            let json = fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            SimulationConfig::from_json_str(&json).with_context(|| format!("parsing {path}"))?
        }
        None => SimulationConfig::with_seed(7),
    };
    config.validate().context("invalid simulation config")?;
    let ticks = match args.next() {
        Some(raw) => raw.parse().with_context(|| format!("tick count {raw:?}"))?,
        None => DEFAULT_TICKS,
    };
    info!(seed = config.seed, tick_seconds = config.tick_seconds, ticks, "starting skirmish");

    let mut sim = Simulation::new(config);
    let encounter = spawn_encounter(&mut sim);

    for _ in 0..ticks {
        drive_hero(&mut sim, &encounter)?;
        sim.step();
        for envelope in sim.take_events() {
            info!(tick = envelope.tick, event = ?envelope.event);
        }
        if wiped_out(&sim, &encounter.party) || wiped_out(&sim, &encounter.pack) {
            break;
        }
    }

    report(&sim, &encounter);
    Ok(())
}

fn spawn_encounter(sim: &mut Simulation) -> Encounter {
    let slash = SkillTemplate::new(
        "slash",
        SkillKind::TargetDamage {
            damage: DamageEffect::flat(6).with_stun(0.1, 1.0),
            drain: DrainEffect::default(),
        },
    )
    .with_cast_time(LinearFloat::constant(0.3))
    .with_cooldown(LinearFloat::constant(0.8));
    let firebolt = SkillTemplate::new(
        "firebolt",
        SkillKind::Projectile(ProjectileEffect {
            damage: DamageEffect::flat(9),
            speed: LinearFloat::constant(12.0),
            lifetime: LinearFloat::constant(2.0),
            ..ProjectileEffect::default()
        }),
    )
    .with_cast_range(LinearFloat::constant(15.0))
    .with_cooldown(LinearFloat::constant(3.0))
    .with_mana_cost(LinearInt::constant(10));
    let mend = SkillTemplate::new(
        "mend",
        SkillKind::AreaHeal(HealEffect {
            health: LinearInt::constant(15),
            ..HealEffect::default()
        }),
    )
    .with_cast_range(LinearFloat::constant(8.0))
    .with_cooldown(LinearFloat::constant(4.0));
    let frenzy = SkillTemplate::new(
        "frenzy",
        SkillKind::AreaBuff(BuffEffect {
            bonuses: BonusCurves {
                damage: LinearInt::constant(2),
                ..BonusCurves::default()
            },
            duration: LinearFloat::constant(8.0),
            ..BuffEffect::default()
        }),
    )
    .with_cast_range(LinearFloat::constant(10.0))
    .with_cooldown(LinearFloat::constant(12.0));
    let raise = SkillTemplate::new("raise dead", SkillKind::Resurrect(ResurrectEffect::default()))
        .with_cast_range(LinearFloat::constant(8.0))
        .with_cast_time(LinearFloat::constant(1.0))
        .with_cooldown(LinearFloat::constant(15.0));
    let bite = SkillTemplate::new(
        "bite",
        SkillKind::TargetDamage {
            damage: DamageEffect::flat(3),
            drain: DrainEffect::default(),
        },
    )
    .with_cooldown(LinearFloat::constant(1.2));

    let hero = sim.spawn(
        ActorSpec::player("hero", Vec2::ZERO)
            .with_health(140, 2)
            .with_mana(40, 3)
            .with_skill(slash)
            .with_skill(firebolt),
    );
    let cleric = sim.spawn(
        ActorSpec::player("cleric", Vec2::new(-2.0, 1.0))
            .with_mana(60, 4)
            .with_skill(mend),
    );
    let imp = sim.spawn(
        ActorSpec::minion("imp", Vec2::new(-1.0, -1.5), cleric).with_skill(bite.clone()),
    );

    let mut pack: Vec<ActorId> = (0..4u8)
        .map(|i| {
            let position = Vec2::new(9.0, f32::from(i) * 2.0 - 3.0);
            sim.spawn(ActorSpec::enemy(format!("wolf{i}"), position).with_skill(bite.clone()))
        })
        .collect();
    pack.push(sim.spawn(
        ActorSpec::enemy("shaman", Vec2::new(12.0, 0.0))
            .with_level(2)
            .with_skill(raise)
            .with_skill(frenzy),
    ));

    Encounter {
        hero,
        party: vec![hero, cleric, imp],
        pack,
    }
}

/// Host input for the hero: pick the closest living wolf, open with the
/// bolt, then keep slashing.
fn drive_hero(sim: &mut Simulation, encounter: &Encounter) -> Result<()> {
    let Some(hero) = sim.arena().get(encounter.hero) else {
        return Ok(());
    };
    if !hero.is_alive() || hero.state != State::Idle {
        return Ok(());
    }
    let position = hero.position();
    let current = hero.target.and_then(|t| sim.arena().get(t)).filter(|t| t.is_alive());
    let target = match current {
        Some(actor) => actor.id(),
        None => {
            let nearest = encounter
                .pack
                .iter()
                .filter_map(|id| sim.arena().get(*id))
                .filter(|a| a.is_alive())
                .min_by(|a, b| {
                    a.position()
                        .distance_squared(position)
                        .total_cmp(&b.position().distance_squared(position))
                });
            let Some(nearest) = nearest else {
                return Ok(());
            };
            let id = nearest.id();
            sim.select_target(encounter.hero, Some(id))?;
            id
        }
    };

    let distance = sim
        .arena()
        .get(target)
        .map_or(f32::INFINITY, |t| t.closest_point(position).distance(position));
    let skill = usize::from(distance > 2.0);
    if let Err(err) = sim.request_skill(encounter.hero, skill) {
        debug!(%err, skill, "hero request refused");
    }
    Ok(())
}

fn wiped_out(sim: &Simulation, side: &[ActorId]) -> bool {
    side.iter()
        .filter_map(|id| sim.arena().get(*id))
        .all(|a| !a.is_alive())
}

fn report(sim: &Simulation, encounter: &Encounter) {
    info!(tick = sim.tick(), time = sim.time(), "skirmish over");
    for id in encounter.party.iter().chain(&encounter.pack) {
        match sim.arena().get(*id) {
            Some(actor) => info!(
                actor = %actor.name,
                kind = %actor.kind(),
                health = actor.health.current(),
                mana = actor.mana.current(),
                state = ?actor.state,
                "final"
            ),
            None => warn!(actor = %id, "despawned"),
        }
    }
}
