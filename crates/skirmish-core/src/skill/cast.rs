//! Cast validation.
//!
//! Every cast attempt runs four checks in a fixed order:
//!
//! 1. [`check_self`]: the caster is alive, knows the skill and can pay for it.
//! 2. [`check_target`]: the skill kind accepts the caster's target, possibly
//!    redirecting it (a heal on an enemy lands on the caster instead).
//! 3. [`check_distance`]: the corrected target is within range, measured
//!    between collider surfaces.
//! 4. [`check_fov`]: the corrected target is inside the caster's view cone.
//!
//! [`validate`] chains them and returns a [`CastPlan`]. Rejections are plain
//! values; callers log them and drop the skill selection.

use glam::Vec2;

use crate::actor::{Actor, ActorId};
use crate::error::CastRejection;
use crate::skill::{SkillInstance, SkillKind, TargetFilter};
use crate::world_view::WorldView;

/// Who is casting, which decides how strict the view cone check is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastMode {
    /// Input-driven caster; the target must be in view.
    Player,
    /// Monsters turn to face their target when the cast starts.
    Mob,
}

/// A cast that passed every check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CastPlan {
    /// Skill index.
    pub skill: usize,
    /// Corrected target; `None` for untargeted skills.
    pub target: Option<ActorId>,
    /// Closest point of the target, or the caster position.
    pub destination: Vec2,
    /// Zero cast time: starts and finishes in the same tick.
    pub instant: bool,
}

/// Alive, learned, castable and affordable.
///
/// Cooldown is not checked here: host requests are refused while cooling
/// down, and a cast interrupted by a stun may resume with its forced cooldown
/// still running.
///
/// # Errors
///
/// The first failing condition as a [`CastRejection`].
pub fn check_self(caster: &Actor, skill: &SkillInstance) -> Result<(), CastRejection> {
    if !caster.is_alive() {
        return Err(CastRejection::CasterDead);
    }
    if !skill.template.kind.is_castable() {
        return Err(CastRejection::Passive);
    }
    if !skill.is_learned() {
        return Err(CastRejection::NotLearned);
    }
    let required = skill.cost();
    let available = caster.mana.current();
    if available < required {
        return Err(CastRejection::NotEnoughMana {
            required,
            available,
        });
    }
    Ok(())
}

/// Resolves the effective target of a friendly skill.
///
/// The caster's own target is kept if the filter accepts it, otherwise the
/// cast falls back to the caster when `SELF` is allowed.
fn friendly_target(
    view: &WorldView<'_>,
    caster: &Actor,
    filter: TargetFilter,
) -> Result<Option<ActorId>, CastRejection> {
    let me = caster.id();
    if let Some(target) = caster.target.filter(|t| *t != me) {
        let same_kind = view
            .get(target)
            .is_some_and(|t| t.kind() == caster.kind());
        let kind_ok = !filter.contains(TargetFilter::ONLY_SAME_KIND) || same_kind;
        if filter.contains(TargetFilter::ALLIES) && kind_ok && view.can_heal(me, target) {
            return Ok(Some(target));
        }
        if filter.contains(TargetFilter::ENEMIES) && view.can_attack(me, target) {
            return Ok(Some(target));
        }
    }
    if filter.contains(TargetFilter::SELF) {
        Ok(Some(me))
    } else {
        Err(CastRejection::InvalidTarget)
    }
}

/// Kind-specific target check. Returns the corrected target.
///
/// # Errors
///
/// [`CastRejection::InvalidTarget`] when the skill needs a target it cannot
/// find, [`CastRejection::Passive`] for passive skills.
pub fn check_target(
    view: &WorldView<'_>,
    caster: &Actor,
    skill: &SkillInstance,
) -> Result<Option<ActorId>, CastRejection> {
    match &skill.template.kind {
        SkillKind::TargetDamage { .. } => caster
            .target
            .filter(|t| view.can_attack(caster.id(), *t))
            .map(Some)
            .ok_or(CastRejection::InvalidTarget),
        SkillKind::TargetHeal(heal) => friendly_target(view, caster, heal.filter),
        SkillKind::TargetBuff(buff) => friendly_target(view, caster, buff.filter),
        SkillKind::AreaDamage(_)
        | SkillKind::AreaHeal(_)
        | SkillKind::AreaBuff(_)
        | SkillKind::Drain(_)
        | SkillKind::Resurrect(_) => Ok(None),
        // fires without a target, homes in on an attackable one
        SkillKind::Projectile(_) => Ok(caster.target.filter(|t| view.can_attack(caster.id(), *t))),
        SkillKind::Passive(_) => Err(CastRejection::Passive),
    }
}

/// Range check against the corrected target.
///
/// Returns where the caster would stand to cast: the target's closest point,
/// or the caster's own position for self and untargeted casts.
///
/// # Errors
///
/// [`CastRejection::OutOfRange`] carrying the chase destination, or
/// [`CastRejection::InvalidTarget`] if the target vanished.
pub fn check_distance(
    view: &WorldView<'_>,
    caster: &Actor,
    skill: &SkillInstance,
    target: Option<ActorId>,
) -> Result<Vec2, CastRejection> {
    let Some(target_id) = target.filter(|t| *t != caster.id()) else {
        return Ok(caster.position());
    };
    if matches!(skill.template.kind, SkillKind::Projectile(_)) {
        return Ok(caster.position());
    }
    let target = view.get(target_id).ok_or(CastRejection::InvalidTarget)?;
    let destination = target.closest_point(caster.position());
    let distance = caster.surface_distance(target);
    let range = skill.range();
    if distance <= range {
        Ok(destination)
    } else {
        Err(CastRejection::OutOfRange {
            distance,
            range,
            destination,
        })
    }
}

/// View cone check against the corrected target.
///
/// # Errors
///
/// [`CastRejection::OutOfView`].
pub fn check_fov(
    view: &WorldView<'_>,
    caster: &Actor,
    target: Option<ActorId>,
    mode: CastMode,
) -> Result<(), CastRejection> {
    if mode == CastMode::Mob {
        return Ok(());
    }
    let Some(target) = target.filter(|t| *t != caster.id()).and_then(|t| view.get(t)) else {
        return Ok(());
    };
    if caster.transform.in_fov(target.position(), caster.fov_degrees) {
        Ok(())
    } else {
        Err(CastRejection::OutOfView)
    }
}

/// Runs all four checks for skill `index` of `caster`.
///
/// # Errors
///
/// The first failing check; a missing caster or index reports
/// [`CastRejection::CasterDead`] or [`CastRejection::NotLearned`].
pub fn validate(
    view: &WorldView<'_>,
    caster: ActorId,
    index: usize,
    mode: CastMode,
) -> Result<CastPlan, CastRejection> {
    let actor = view.get(caster).ok_or(CastRejection::CasterDead)?;
    let skill = actor.skills.get(index).ok_or(CastRejection::NotLearned)?;

    check_self(actor, skill)?;
    let target = check_target(view, actor, skill)?;
    let destination = check_distance(view, actor, skill, target)?;
    check_fov(view, actor, target, mode)?;

    Ok(CastPlan {
        skill: index,
        target,
        destination,
        instant: skill.cast_time() <= 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ActorSpec;
    use crate::arena::Arena;
    use crate::curve::{LinearFloat, LinearInt};
    use crate::movement::SteeringMovement;
    use crate::skill::{
        BuffEffect, DamageEffect, DrainEffect, HealEffect, ProjectileEffect, SkillFlags,
        SkillTemplate,
    };
    use crate::terrain::OpenTerrain;
    use std::f32::consts::PI;

    fn strike(range: f32) -> SkillTemplate {
        SkillTemplate::new(
            "strike",
            SkillKind::TargetDamage {
                damage: DamageEffect::flat(4),
                drain: DrainEffect::default(),
            },
        )
        .with_cast_range(LinearFloat::constant(range))
    }

    fn mend(filter: TargetFilter) -> SkillTemplate {
        SkillTemplate::new(
            "mend",
            SkillKind::TargetHeal(HealEffect {
                health: LinearInt::constant(5),
                filter,
                ..HealEffect::default()
            }),
        )
    }

    /// Hero at the origin facing +X, wolf `distance` away (center to center).
    fn duel(distance: f32, skill: SkillTemplate) -> (Arena, ActorId, ActorId) {
        let mut arena = Arena::new();
        let hero = arena.spawn(
            ActorSpec::player("hero", Vec2::ZERO)
                .with_mana(20, 0)
                .with_skill(skill),
        );
        let wolf = arena.spawn(ActorSpec::enemy("wolf", Vec2::new(distance, 0.0)));
        arena.get_mut(hero).unwrap().target = Some(wolf);
        (arena, hero, wolf)
    }

    fn check(arena: &Arena, caster: ActorId, mode: CastMode) -> Result<CastPlan, CastRejection> {
        let movement = SteeringMovement::new();
        let view = WorldView::new(arena, &OpenTerrain, &movement, 0.05);
        validate(&view, caster, 0, mode)
    }

    mod self_tests {
        use super::*;

        #[test]
        fn unlearned_skill_never_validates() {
            let skill = strike(5.0).with_flags(SkillFlags::CAN_CANCEL_CAST);
            let (arena, hero, _) = duel(2.0, skill);
            for _ in 0..3 {
                assert_eq!(check(&arena, hero, CastMode::Player), Err(CastRejection::NotLearned));
            }
        }

        #[test]
        fn mana_must_cover_cost() {
            let skill = strike(5.0).with_mana_cost(LinearInt::constant(25));
            let (arena, hero, _) = duel(2.0, skill);
            assert_eq!(
                check(&arena, hero, CastMode::Player),
                Err(CastRejection::NotEnoughMana {
                    required: 25,
                    available: 20
                })
            );
        }

        #[test]
        fn dead_caster_is_rejected() {
            let (mut arena, hero, _) = duel(2.0, strike(5.0));
            arena.get_mut(hero).unwrap().health.deplete();
            assert_eq!(check(&arena, hero, CastMode::Player), Err(CastRejection::CasterDead));
        }
    }

    mod target_tests {
        use super::*;

        #[test]
        fn damage_needs_an_attackable_target() {
            let (mut arena, hero, wolf) = duel(2.0, strike(5.0));
            arena.get_mut(wolf).unwrap().health.deplete();
            assert_eq!(check(&arena, hero, CastMode::Player), Err(CastRejection::InvalidTarget));

            arena.get_mut(hero).unwrap().target = None;
            assert_eq!(check(&arena, hero, CastMode::Player), Err(CastRejection::InvalidTarget));
        }

        #[test]
        fn heal_on_enemy_redirects_to_self() {
            let (arena, hero, _) = duel(2.0, mend(TargetFilter::SELF | TargetFilter::ALLIES));
            let plan = check(&arena, hero, CastMode::Player).unwrap();
            assert_eq!(plan.target, Some(hero));
            assert_eq!(plan.destination, Vec2::ZERO);
            assert!(plan.instant);
        }

        #[test]
        fn heal_without_self_needs_an_ally() {
            let (arena, hero, _) = duel(2.0, mend(TargetFilter::ALLIES));
            assert_eq!(check(&arena, hero, CastMode::Player), Err(CastRejection::InvalidTarget));
        }

        #[test]
        fn heal_keeps_an_allied_target() {
            let mut arena = Arena::new();
            let hero = arena.spawn(
                ActorSpec::player("hero", Vec2::ZERO)
                    .with_skill(mend(TargetFilter::SELF | TargetFilter::ALLIES)),
            );
            let friend = arena.spawn(ActorSpec::player("friend", Vec2::new(1.5, 0.0)));
            arena.get_mut(hero).unwrap().target = Some(friend);
            assert_eq!(check(&arena, hero, CastMode::Player).unwrap().target, Some(friend));
        }

        #[test]
        fn buff_may_target_enemies_when_allowed() {
            let curse = SkillTemplate::new(
                "curse",
                SkillKind::TargetBuff(BuffEffect {
                    filter: TargetFilter::ENEMIES,
                    ..BuffEffect::default()
                }),
            );
            let (arena, hero, wolf) = duel(2.0, curse);
            assert_eq!(check(&arena, hero, CastMode::Player).unwrap().target, Some(wolf));
        }

        #[test]
        fn area_skill_ignores_explicit_target() {
            let nova = SkillTemplate::new("nova", SkillKind::AreaDamage(DamageEffect::flat(3)))
                .with_cast_range(LinearFloat::constant(1.0));
            let (arena, hero, _) = duel(50.0, nova);
            let plan = check(&arena, hero, CastMode::Player).unwrap();
            assert_eq!(plan.target, None);
            assert_eq!(plan.destination, Vec2::ZERO);
        }

        #[test]
        fn projectile_fires_at_any_distance() {
            let bolt =
                SkillTemplate::new("bolt", SkillKind::Projectile(ProjectileEffect::default()))
                    .with_cast_range(LinearFloat::constant(1.0));
            let (arena, hero, wolf) = duel(50.0, bolt);
            assert_eq!(check(&arena, hero, CastMode::Player).unwrap().target, Some(wolf));
        }
    }

    mod distance_tests {
        use super::*;

        #[test]
        fn out_of_range_reports_chase_point() {
            // centers 8.5 apart, radii 0.5 each: surface distance 7.5 > 5
            let (arena, hero, _) = duel(8.5, strike(5.0));
            match check(&arena, hero, CastMode::Player) {
                Err(CastRejection::OutOfRange {
                    distance,
                    range,
                    destination,
                }) => {
                    assert!((distance - 7.5).abs() < 1e-5);
                    assert!((range - 5.0).abs() < f32::EPSILON);
                    assert!((destination - Vec2::new(8.0, 0.0)).length() < 1e-5);
                }
                other => panic!("expected OutOfRange, got {other:?}"),
            }
        }

        #[test]
        fn range_is_measured_between_surfaces() {
            // 6 apart at the centers, 5 at the surfaces
            let (arena, hero, wolf) = duel(6.0, strike(5.0));
            let plan = check(&arena, hero, CastMode::Player).unwrap();
            assert_eq!(plan.target, Some(wolf));
        }
    }

    mod fov_tests {
        use super::*;

        #[test]
        fn player_must_face_target() {
            let (mut arena, hero, _) = duel(2.0, strike(5.0));
            arena.get_mut(hero).unwrap().transform.yaw = PI;
            assert_eq!(check(&arena, hero, CastMode::Player), Err(CastRejection::OutOfView));
        }

        #[test]
        fn mobs_turn_to_face() {
            let mut arena = Arena::new();
            let hero = arena.spawn(ActorSpec::player("hero", Vec2::ZERO));
            let wolf = arena.spawn(
                ActorSpec::enemy("wolf", Vec2::new(2.0, 0.0))
                    .with_skill(strike(5.0))
                    .facing(0.0),
            );
            arena.get_mut(wolf).unwrap().target = Some(hero);
            assert!(check(&arena, wolf, CastMode::Player).is_err());
            assert!(check(&arena, wolf, CastMode::Mob).is_ok());
        }
    }
}
