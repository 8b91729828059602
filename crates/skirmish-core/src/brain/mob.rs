//! Observation and decision pieces shared by enemies and minions.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::{Rng, RngCore};

use crate::actor::Actor;
use crate::error::CastRejection;
use crate::skill::cast::{self, CastMode, CastPlan};
use crate::world_view::WorldView;

use super::{Chase, Effect, EventFacts, State, Transition};

/// Distances and odds a mob brain works with.
#[derive(Debug, Clone, Copy)]
pub(super) struct MobTuning {
    pub move_probability: f32,
    pub wander_distance: f32,
    pub follow_distance: f32,
    pub range_ratio: f32,
    pub min_ambient_sound_delay: f32,
}

/// Gathers mob facts around `anchor`.
///
/// Draws exactly four rolls in a fixed order whatever the outcome, so the
/// stream stays aligned between runs.
pub(super) fn observe(
    view: &WorldView<'_>,
    actor: &Actor,
    anchor: Vec2,
    tuning: MobTuning,
    rng: &mut dyn RngCore,
) -> EventFacts {
    let mut facts = EventFacts::common(view, actor);
    let mob = actor.as_mob();
    facts.anchor = anchor;
    facts.has_skills = !actor.skills.is_empty();
    facts.next_skill = actor
        .skills
        .next_mob_skill(mob.and_then(|m| m.last_skill), actor.mana.current());

    if let Some(target) = actor.target.and_then(|t| view.get(t)) {
        facts.too_far_to_follow =
            target.closest_point(anchor).distance(anchor) > tuning.follow_distance;
        facts.chase = chase(view, actor, tuning.range_ratio);
    }
    if let Some(index) = facts.skill {
        facts.cast_check = Some(cast::validate(view, actor.id(), index, CastMode::Mob));
    }

    let wander_roll: f32 = rng.gen();
    let angle: f32 = rng.gen_range(0.0..TAU);
    let radius: f32 = rng.gen::<f32>().sqrt();
    let sound_roll: f32 = rng.gen();

    let dt = view.dt();
    if wander_roll < tuning.move_probability * dt {
        facts.wander = Some(anchor + Vec2::from_angle(angle) * radius * tuning.wander_distance);
    }
    let sound_probability = mob.map_or(0.0, |m| m.ambient_sound_probability);
    facts.ambient_sound = actor.is_alive()
        && sound_roll < sound_probability * dt
        && view.time() >= actor.last_ambient_sound_time + f64::from(tuning.min_ambient_sound_delay);
    facts
}

/// Where to walk when the selected skill cannot reach the target.
fn chase(view: &WorldView<'_>, actor: &Actor, range_ratio: f32) -> Option<Chase> {
    let skill = actor.skills.current_skill()?;
    let target = cast::check_target(view, actor, skill).unwrap_or(actor.target);
    match cast::check_distance(view, actor, skill, target) {
        Err(CastRejection::OutOfRange {
            range, destination, ..
        }) => Some(Chase {
            destination,
            stopping_distance: range * range_ratio,
        }),
        _ => None,
    }
}

/// Starts a validated cast: stop, start, face the target. Zero cast times
/// finish right away.
pub(super) fn start_cast(plan: &CastPlan) -> Transition {
    let start = vec![
        Effect::ResetMovement,
        Effect::StartCast {
            target: plan.target,
        },
        Effect::LookAtTarget,
    ];
    if plan.instant {
        Transition::with(State::Idle, finish(plan.skill)).after(start)
    } else {
        Transition::with(State::Casting, start)
    }
}

fn finish(index: usize) -> Vec<Effect> {
    vec![
        Effect::FinishCast,
        Effect::ClearTargetIfDead,
        Effect::RememberLastSkill(index),
    ]
}

/// Picks the next skill once aggroed.
pub(super) fn select_skill(actor: &Actor, facts: &EventFacts) -> Vec<Effect> {
    match facts.next_skill {
        Some(index) => vec![Effect::SelectSkill(index)],
        None => {
            if !facts.has_skills {
                tracing::error!(
                    actor = %actor.id(),
                    name = %actor.name,
                    "mob has no skills to fight with"
                );
            }
            Vec::new()
        }
    }
}

/// `CASTING`: face the target, abort on stun or lost target, finish when the
/// timer ran out.
pub(super) fn casting(actor: &Actor, facts: &EventFacts) -> Transition {
    let Some(index) = facts.skill else {
        tracing::error!(actor = %actor.id(), "casting without a selected skill");
        return Transition::to(State::Idle);
    };
    let look = vec![Effect::LookAtTarget];

    if facts.died {
        return Transition::to(State::Dead);
    }
    if facts.stunned {
        return Transition::with(
            State::Stunned,
            vec![Effect::CancelCast { force: true }, Effect::ResetMovement],
        )
        .after(look);
    }
    if facts.target.is_lost() && facts.cancel_on_target_loss {
        return Transition::with(
            State::Idle,
            vec![Effect::CancelCast { force: true }, Effect::ClearTarget],
        )
        .after(look);
    }
    if facts.skill_finished {
        return Transition::with(State::Idle, finish(index)).after(look);
    }
    Transition::with(State::Casting, look)
}

/// `STUNNED` for mobs.
pub(super) fn stunned(facts: &EventFacts) -> Transition {
    if facts.died {
        Transition::to(State::Dead)
    } else if facts.stunned {
        Transition::to(State::Stunned)
    } else {
        Transition::to(State::Idle)
    }
}

/// The ambient sound side effect, attached to a transition that stays put.
pub(super) fn ambient(facts: &EventFacts, stay: State) -> Transition {
    if facts.ambient_sound {
        Transition::with(stay, vec![Effect::PlayAmbientSound])
    } else {
        Transition::to(stay)
    }
}
