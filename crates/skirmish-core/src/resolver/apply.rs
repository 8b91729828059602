//! Skill effects, applied when a cast finishes.
//!
//! Area effects collect their candidates into a `BTreeSet` first: an actor
//! with several colliders is hit once, and candidates are processed in id
//! order.

use std::collections::BTreeSet;

use glam::Vec2;
use rand::Rng;

use crate::actor::{ActorId, ActorInner, MinionComponents};
use crate::aggro;
use crate::brain::State;
use crate::presentation::CombatEvent;
use crate::projectile::{Payload, Projectile};
use crate::skill::{
    Buff, BuffEffect, DamageEffect, DrainEffect, HealEffect, SkillKind, TargetFilter,
};

use super::{combat, Resolution};

/// Applies skill `index` of `caster` against the corrected `target`.
///
/// Targeted kinds do nothing when the target died in the meantime.
pub fn apply_skill<R: Rng + ?Sized>(
    res: &mut Resolution<'_>,
    rng: &mut R,
    caster: ActorId,
    index: usize,
    target: Option<ActorId>,
) {
    let Some((template, level, origin, forward, base_damage)) = res.arena.get(caster).and_then(|a| {
        a.skills.get(index).map(|s| {
            (
                s.template.clone(),
                s.level(),
                a.position(),
                a.transform.forward(),
                a.damage(),
            )
        })
    }) else {
        return;
    };
    let range = template.range_at(level);
    let living_target = target.filter(|t| res.arena.get(*t).is_some_and(|a| a.is_alive()));

    match &template.kind {
        SkillKind::TargetDamage { damage, drain } => {
            if let Some(victim) = living_target {
                if hit(res, rng, caster, victim, base_damage, damage, level) > 0 {
                    drain_from(res, caster, victim, drain, level);
                }
            }
        }
        SkillKind::AreaDamage(damage) => {
            for victim in candidates(res, origin, range) {
                if attackable(res, caster, victim) {
                    hit(res, rng, caster, victim, base_damage, damage, level);
                }
            }
        }
        SkillKind::TargetHeal(heal) => {
            if let Some(recipient) = living_target {
                restore(res, rng, caster, recipient, heal, level);
            }
        }
        SkillKind::AreaHeal(heal) => {
            let mut pool = candidates(res, origin, range);
            pool.insert(caster);
            for recipient in pool {
                if qualifies(res, caster, recipient, heal.filter) {
                    restore(res, rng, caster, recipient, heal, level);
                }
            }
        }
        SkillKind::TargetBuff(buff) => {
            if let Some(recipient) = living_target {
                add_buff(res, recipient, &template.name, buff, level);
            }
        }
        SkillKind::AreaBuff(buff) => {
            let mut pool = candidates(res, origin, range);
            pool.insert(caster);
            for recipient in pool {
                if qualifies(res, caster, recipient, buff.filter) {
                    add_buff(res, recipient, &template.name, buff, level);
                }
            }
        }
        SkillKind::Drain(drain) => {
            if let Some(victim) = nearest_attackable(res, caster, origin, range) {
                drain_from(res, caster, victim, drain, level);
            }
        }
        SkillKind::Resurrect(effect) => {
            let lifetime = effect.minion_lifetime.at(level);
            for corpse in candidates(res, origin, range) {
                let raisable = match (res.arena.get(caster), res.arena.get(corpse)) {
                    (Some(a), Some(b)) => {
                        !b.is_player() && aggro::can_resurrect(res.arena, res.terrain, a, b)
                    }
                    _ => false,
                };
                if raisable {
                    raise(res, caster, corpse, lifetime);
                }
            }
        }
        SkillKind::Projectile(effect) => {
            let direction = living_target
                .and_then(|t| res.arena.get(t))
                .map(|t| (t.position() - origin).normalize_or_zero())
                .filter(|d| *d != Vec2::ZERO)
                .unwrap_or(forward);
            let projectile = Projectile {
                source: caster,
                skill: template.name.clone(),
                target: living_target,
                position: origin,
                direction,
                speed: effect.speed.at(level),
                remaining: effect.lifetime.at(level),
                payload: Payload {
                    damage: base_damage.saturating_add(effect.damage.damage.at(level)),
                    stun_chance: effect.damage.stun_chance.at(level),
                    stun_time: effect.damage.stun_time.at(level),
                    drain_mana: effect.drain.mana.at(level),
                    drain_health: effect.drain.health.at(level),
                    drain_to_owner: effect.drain.to_owner,
                },
            };
            let id = res.arena.spawn_projectile(projectile);
            tracing::debug!(projectile = %id, source = %caster, "projectile launched");
            res.notify(CombatEvent::ProjectileLaunched {
                projectile: id,
                source: caster,
                target: living_target,
            });
        }
        SkillKind::Passive(_) => {
            tracing::warn!(
                actor = %caster,
                skill = %template.name,
                "passive skill cannot be applied"
            );
        }
    }
}

// =============================================================================
// Candidate selection
// =============================================================================

fn candidates(res: &Resolution<'_>, center: Vec2, radius: f32) -> BTreeSet<ActorId> {
    res.arena.spatial().query_radius(center, radius).into_iter().collect()
}

fn attackable(res: &Resolution<'_>, a: ActorId, b: ActorId) -> bool {
    match (res.arena.get(a), res.arena.get(b)) {
        (Some(a), Some(b)) => aggro::can_attack(res.arena, res.terrain, a, b),
        _ => false,
    }
}

/// Whether `recipient` passes a heal or buff filter.
fn qualifies(
    res: &Resolution<'_>,
    caster: ActorId,
    recipient: ActorId,
    filter: TargetFilter,
) -> bool {
    let (Some(a), Some(b)) = (res.arena.get(caster), res.arena.get(recipient)) else {
        return false;
    };
    if caster == recipient {
        return filter.contains(TargetFilter::SELF) && a.is_alive();
    }
    let ally = filter.contains(TargetFilter::ALLIES)
        && aggro::can_heal(res.arena, res.terrain, a, b)
        && (!filter.contains(TargetFilter::ONLY_SAME_KIND) || a.kind() == b.kind());
    ally || (filter.contains(TargetFilter::ENEMIES)
        && aggro::can_attack(res.arena, res.terrain, a, b))
}

/// Closest attackable actor by surface distance; ids break ties.
fn nearest_attackable(
    res: &Resolution<'_>,
    caster: ActorId,
    center: Vec2,
    radius: f32,
) -> Option<ActorId> {
    let source = res.arena.get(caster)?;
    candidates(res, center, radius)
        .into_iter()
        .filter(|id| attackable(res, caster, *id))
        .filter_map(|id| res.arena.get(id).map(|t| (source.surface_distance(t), id)))
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, id)| id)
}

// =============================================================================
// Effect helpers
// =============================================================================

fn hit<R: Rng + ?Sized>(
    res: &mut Resolution<'_>,
    rng: &mut R,
    caster: ActorId,
    victim: ActorId,
    base_damage: i32,
    damage: &DamageEffect,
    level: u32,
) -> u32 {
    combat::resolve_damage(
        res,
        rng,
        caster,
        victim,
        base_damage.saturating_add(damage.damage.at(level)),
        damage.stun_chance.at(level),
        damage.stun_time.at(level),
    )
    .0
}

/// Drains `victim` into the caster, or into its owner for owner-feeding
/// minions.
///
/// Callers chaining a drain onto a hit only drain when the hit dealt damage.
pub(super) fn drain_into(
    res: &mut Resolution<'_>,
    source: ActorId,
    victim: ActorId,
    mana: i32,
    health: i32,
    to_owner: bool,
) {
    if mana < 1 && health < 1 {
        return;
    }
    let receiver = if to_owner {
        res.arena.get(source).and_then(|a| a.owner()).unwrap_or(source)
    } else {
        source
    };
    combat::resolve_drain(res, receiver, victim, mana, health);
}

fn drain_from(
    res: &mut Resolution<'_>,
    caster: ActorId,
    victim: ActorId,
    drain: &DrainEffect,
    level: u32,
) {
    if drain.is_active(level) {
        drain_into(
            res,
            caster,
            victim,
            drain.mana.at(level),
            drain.health.at(level),
            drain.to_owner,
        );
    }
}

fn restore<R: Rng + ?Sized>(
    res: &mut Resolution<'_>,
    rng: &mut R,
    caster: ActorId,
    recipient: ActorId,
    heal: &HealEffect,
    level: u32,
) {
    let health = heal.health.at(level);
    let mana = heal.mana.at(level);
    if health > 0 {
        combat::resolve_heal(res, rng, caster, recipient, health);
    }
    if mana > 0 {
        combat::resolve_mana_heal(res, rng, caster, recipient, mana);
    }
}

fn add_buff(
    res: &mut Resolution<'_>,
    recipient: ActorId,
    source: &str,
    effect: &BuffEffect,
    level: u32,
) {
    let Some(actor) = res.arena.get_mut(recipient).filter(|a| a.is_alive()) else {
        return;
    };
    let buff = Buff::from_effect(source, effect, level);
    let duration = buff.remaining;
    actor.skills.add_or_refresh_buff(buff);
    actor.refresh_maxima();

    tracing::debug!(actor = %recipient, %source, duration, "buff applied");
    res.notify(CombatEvent::BuffApplied {
        actor: recipient,
        source: source.to_owned(),
        duration,
    });
}

/// Turns a corpse into a fresh minion of `owner`, keeping its level.
fn raise(res: &mut Resolution<'_>, owner: ActorId, corpse: ActorId, lifetime: f32) {
    let Some(faction) = res.arena.get(owner).map(|o| o.faction) else {
        return;
    };
    let Some(actor) = res.arena.get_mut(corpse) else {
        return;
    };

    let mut mob = actor.as_mob().cloned().unwrap_or_default();
    mob.home = actor.position();
    mob.last_skill = None;
    *actor.inner_mut() = ActorInner::Minion(MinionComponents {
        mob,
        owner: Some(owner),
        lifetime_remaining: Some(lifetime),
    });
    actor.faction = faction;
    actor.decay_remaining = None;
    actor.decayed = false;
    actor.stun_end_time = None;
    actor.target = None;
    actor.skills.clear_request();
    actor.refresh_maxima();
    actor.health.fill();
    actor.mana.fill();
    actor.state = State::Idle;
    res.movement.reset(corpse);

    tracing::debug!(actor = %corpse, by = %owner, "resurrected");
    res.notify(CombatEvent::Resurrected {
        actor: corpse,
        by: owner,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ActorSpec;
    use crate::arena::Arena;
    use crate::bonus::BonusCurves;
    use crate::curve::{LinearFloat, LinearInt};
    use crate::resolver::test_support::Harness;
    use crate::skill::{ProjectileEffect, ResurrectEffect, SkillTemplate};
    use rand::rngs::mock::StepRng;

    fn never() -> StepRng {
        StepRng::new(u64::MAX, 0)
    }

    fn ranged(kind: SkillKind, range: f32) -> SkillTemplate {
        SkillTemplate::new("skill", kind).with_cast_range(LinearFloat::constant(range))
    }

    mod damage_tests {
        use super::*;

        #[test]
        fn area_damage_hits_each_enemy_once() {
            let mut arena = Arena::new();
            let hero = arena.spawn(
                ActorSpec::player("hero", Vec2::ZERO)
                    .with_skill(ranged(SkillKind::AreaDamage(DamageEffect::flat(4)), 5.0)),
            );
            let golem = arena.spawn(
                ActorSpec::enemy("golem", Vec2::new(2.0, 0.0)).with_colliders(vec![
                    crate::actor::Collider::centered(0.5),
                    crate::actor::Collider::offset(Vec2::Y, 0.5),
                ]),
            );
            let wolf = arena.spawn(ActorSpec::enemy("wolf", Vec2::new(-2.0, 0.0)));
            let ally = arena.spawn(ActorSpec::player("ally", Vec2::new(0.0, 2.0)));
            let far = arena.spawn(ActorSpec::enemy("far", Vec2::new(30.0, 0.0)));

            let mut h = Harness::new(arena);
            h.run(|res| apply_skill(res, &mut never(), hero, 0, None));

            for id in [golem, wolf] {
                assert_eq!(h.arena.get(id).unwrap().health.current(), 95);
            }
            assert_eq!(h.arena.get(ally).unwrap().health.current(), 100);
            assert_eq!(h.arena.get(far).unwrap().health.current(), 100);
            assert_eq!(
                h.log.filter(|e| matches!(e, CombatEvent::Damaged { .. })).count(),
                2
            );
        }

        #[test]
        fn targeted_damage_on_corpse_does_nothing() {
            let mut arena = Arena::new();
            let hero = arena.spawn(ActorSpec::player("hero", Vec2::ZERO).with_skill(ranged(
                SkillKind::TargetDamage {
                    damage: DamageEffect::flat(4),
                    drain: DrainEffect::default(),
                },
                2.0,
            )));
            let wolf = arena.spawn(ActorSpec::enemy("wolf", Vec2::X * 2.0));
            arena.get_mut(wolf).unwrap().health.deplete();

            let mut h = Harness::new(arena);
            h.run(|res| apply_skill(res, &mut never(), hero, 0, Some(wolf)));
            assert!(h.log.is_empty());
        }

        #[test]
        fn minion_drain_feeds_owner() {
            let mut arena = Arena::new();
            let necro = arena.spawn(ActorSpec::player("necro", Vec2::ZERO).with_initial_health(50));
            let imp = arena.spawn(ActorSpec::minion("imp", Vec2::X, necro).with_skill(ranged(
                SkillKind::TargetDamage {
                    damage: DamageEffect::flat(0),
                    drain: DrainEffect {
                        health: LinearInt::constant(6),
                        to_owner: true,
                        ..DrainEffect::default()
                    },
                },
                2.0,
            )));
            let wolf = arena.spawn(ActorSpec::enemy("wolf", Vec2::new(2.5, 0.0)));

            let mut h = Harness::new(arena);
            h.run(|res| apply_skill(res, &mut never(), imp, 0, Some(wolf)));

            // 1 from the hit, 6 drained
            assert_eq!(h.arena.get(wolf).unwrap().health.current(), 93);
            assert_eq!(h.arena.get(necro).unwrap().health.current(), 56);
            assert_eq!(h.arena.get(imp).unwrap().health.current(), 100);
        }

        fn leeching(damage: i32) -> SkillKind {
            SkillKind::TargetDamage {
                damage: DamageEffect::flat(damage),
                drain: DrainEffect {
                    health: LinearInt::constant(5),
                    ..DrainEffect::default()
                },
            }
        }

        #[test]
        fn blocked_hit_drains_nothing() {
            let mut arena = Arena::new();
            let hero = arena.spawn(
                ActorSpec::player("hero", Vec2::ZERO)
                    .with_initial_health(50)
                    .with_skill(ranged(leeching(4), 2.0)),
            );
            let wolf = arena.spawn(ActorSpec::enemy("wolf", Vec2::X * 2.0).with_stats(
                crate::actor::CombatStats {
                    block_chance: LinearFloat::constant(1.0),
                    ..crate::actor::CombatStats::default()
                },
            ));

            let mut h = Harness::new(arena);
            h.run(|res| apply_skill(res, &mut StepRng::new(0, 0), hero, 0, Some(wolf)));

            assert_eq!(h.arena.get(wolf).unwrap().health.current(), 100);
            assert_eq!(h.arena.get(hero).unwrap().health.current(), 50);
            assert_eq!(
                h.log.filter(|e| matches!(e, CombatEvent::Drained { .. })).count(),
                0
            );
        }

        #[test]
        fn killing_hit_drains_nothing() {
            let mut arena = Arena::new();
            let hero = arena.spawn(
                ActorSpec::player("hero", Vec2::ZERO)
                    .with_initial_health(50)
                    .with_skill(ranged(leeching(10), 2.0)),
            );
            let wolf = arena.spawn(ActorSpec::enemy("wolf", Vec2::X * 2.0).with_initial_health(3));

            let mut h = Harness::new(arena);
            h.run(|res| apply_skill(res, &mut never(), hero, 0, Some(wolf)));

            assert!(!h.arena.get(wolf).unwrap().is_alive());
            assert_eq!(h.arena.get(hero).unwrap().health.current(), 50);
        }

        #[test]
        fn drain_picks_nearest_enemy() {
            let mut arena = Arena::new();
            let hero = arena.spawn(
                ActorSpec::player("hero", Vec2::ZERO)
                    .with_mana(20, 0)
                    .with_skill(ranged(
                        SkillKind::Drain(DrainEffect {
                            mana: LinearInt::constant(5),
                            ..DrainEffect::default()
                        }),
                        6.0,
                    )),
            );
            let far = arena.spawn(ActorSpec::enemy("far", Vec2::new(5.0, 0.0)).with_mana(10, 0));
            let near = arena.spawn(ActorSpec::enemy("near", Vec2::new(0.0, 3.0)).with_mana(10, 0));
            arena.get_mut(hero).unwrap().mana.set_current(0);

            let mut h = Harness::new(arena);
            h.run(|res| apply_skill(res, &mut never(), hero, 0, None));
            assert_eq!(h.arena.get(near).unwrap().mana.current(), 5);
            assert_eq!(h.arena.get(far).unwrap().mana.current(), 10);
            assert_eq!(h.arena.get(hero).unwrap().mana.current(), 5);
        }
    }

    mod support_tests {
        use super::*;

        fn rally() -> SkillKind {
            SkillKind::AreaBuff(BuffEffect {
                bonuses: BonusCurves {
                    defense: LinearInt::constant(2),
                    ..BonusCurves::default()
                },
                duration: LinearFloat::constant(8.0),
                ..BuffEffect::default()
            })
        }

        #[test]
        fn area_buff_covers_caster_and_allies() {
            let mut arena = Arena::new();
            let hero =
                arena.spawn(ActorSpec::player("hero", Vec2::ZERO).with_skill(ranged(rally(), 6.0)));
            let allies: Vec<_> = (0..3)
                .map(|i| {
                    #[allow(clippy::cast_precision_loss)]
                    let x = 1.5 + i as f32;
                    arena.spawn(ActorSpec::player(format!("ally{i}"), Vec2::new(x, 0.0)))
                })
                .collect();
            let wolf = arena.spawn(ActorSpec::enemy("wolf", Vec2::new(0.0, 2.0)));

            let mut h = Harness::new(arena);
            h.run(|res| apply_skill(res, &mut never(), hero, 0, None));

            assert_eq!(
                h.log.filter(|e| matches!(e, CombatEvent::BuffApplied { .. })).count(),
                4
            );
            for id in allies.iter().copied().chain([hero]) {
                assert_eq!(h.arena.get(id).unwrap().defense(), 2);
            }
            assert_eq!(h.arena.get(wolf).unwrap().defense(), 0);

            // a second cast refreshes instead of stacking
            h.run(|res| apply_skill(res, &mut never(), hero, 0, None));
            assert_eq!(h.arena.get(hero).unwrap().skills.buffs().len(), 1);
            assert_eq!(h.arena.get(hero).unwrap().defense(), 2);
        }

        #[test]
        fn area_heal_skips_enemies() {
            let mut arena = Arena::new();
            let mend = SkillKind::AreaHeal(HealEffect {
                health: LinearInt::constant(10),
                ..HealEffect::default()
            });
            let hero = arena.spawn(
                ActorSpec::player("hero", Vec2::ZERO)
                    .with_initial_health(50)
                    .with_skill(ranged(mend, 5.0)),
            );
            let ally =
                arena.spawn(ActorSpec::player("ally", Vec2::X * 2.0).with_initial_health(50));
            let wolf = arena.spawn(ActorSpec::enemy("wolf", Vec2::Y * 2.0).with_initial_health(50));

            let mut h = Harness::new(arena);
            h.run(|res| apply_skill(res, &mut never(), hero, 0, None));
            assert_eq!(h.arena.get(hero).unwrap().health.current(), 60);
            assert_eq!(h.arena.get(ally).unwrap().health.current(), 60);
            assert_eq!(h.arena.get(wolf).unwrap().health.current(), 50);
        }

        #[test]
        fn resurrect_raises_allied_corpses() {
            let mut arena = Arena::new();
            let shaman = arena.spawn(ActorSpec::enemy("shaman", Vec2::ZERO).with_skill(ranged(
                SkillKind::Resurrect(ResurrectEffect::default()),
                5.0,
            )));
            let corpse = arena.spawn(ActorSpec::enemy("skeleton", Vec2::X * 2.0).with_level(3));
            let hero = arena.spawn(ActorSpec::player("hero", Vec2::Y * 2.0));
            arena.get_mut(corpse).unwrap().health.deplete();
            arena.get_mut(corpse).unwrap().state = State::Dead;
            arena.get_mut(corpse).unwrap().decay_remaining = Some(3.0);
            arena.get_mut(hero).unwrap().health.deplete();

            let mut h = Harness::new(arena);
            h.run(|res| apply_skill(res, &mut never(), shaman, 0, None));

            let raised = h.arena.get(corpse).unwrap();
            assert!(raised.is_minion());
            assert!(raised.is_alive());
            assert_eq!(raised.owner(), Some(shaman));
            assert_eq!(raised.level.current(), 3);
            assert_eq!(raised.state, State::Idle);
            assert!(raised.decay_remaining.is_none());
            assert!(!h.arena.get(hero).unwrap().is_alive());
            assert_eq!(
                h.log.filter(|e| matches!(e, CombatEvent::Resurrected { .. })).count(),
                1
            );
        }
    }

    #[test]
    fn projectile_homes_on_living_target() {
        let mut arena = Arena::new();
        let bolt = SkillKind::Projectile(ProjectileEffect {
            damage: DamageEffect::flat(3),
            speed: LinearFloat::constant(10.0),
            lifetime: LinearFloat::constant(2.0),
            ..ProjectileEffect::default()
        });
        let hero =
            arena.spawn(ActorSpec::player("hero", Vec2::ZERO).with_skill(ranged(bolt, 10.0)));
        let wolf = arena.spawn(ActorSpec::enemy("wolf", Vec2::new(0.0, 6.0)));

        let mut h = Harness::new(arena);
        h.run(|res| apply_skill(res, &mut never(), hero, 0, Some(wolf)));

        let (_, projectile) = h.arena.projectiles().next().unwrap();
        assert_eq!(projectile.target, Some(wolf));
        assert!((projectile.direction - Vec2::Y).length() < 1e-5);
        assert_eq!(projectile.payload.damage, 4);
        assert_eq!(
            h.log.filter(|e| matches!(e, CombatEvent::ProjectileLaunched { .. })).count(),
            1
        );
    }
}
