//! Applies brain transitions.

use rand::Rng;

use crate::actor::ActorId;
use crate::aggro;
use crate::brain::{Effect, Transition};
use crate::presentation::CombatEvent;
use crate::skill::cast;
use crate::skill::CancelOutcome;

use super::{apply, death, Resolution};

/// Runs `transition`'s effects in order, then moves the actor to its next
/// state.
pub fn apply_transition<R: Rng + ?Sized>(
    res: &mut Resolution<'_>,
    rng: &mut R,
    id: ActorId,
    transition: &Transition,
) {
    for effect in &transition.effects {
        apply_effect(res, rng, id, effect);
    }
    if let Some(actor) = res.arena.get_mut(id) {
        if actor.state != transition.next {
            tracing::debug!(
                actor = %id,
                from = %actor.state,
                to = %transition.next,
                "state changed"
            );
            actor.state = transition.next;
        }
    }
}

/// Applies a single effect to actor `id`.
pub fn apply_effect<R: Rng + ?Sized>(
    res: &mut Resolution<'_>,
    rng: &mut R,
    id: ActorId,
    effect: &Effect,
) {
    match effect {
        Effect::ResetMovement => res.movement.reset(id),
        Effect::Navigate {
            destination,
            stopping_distance,
        } => res.movement.navigate_to(id, *destination, *stopping_distance),
        Effect::Warp { destination } => {
            if let Some(actor) = res.arena.get_mut(id) {
                res.movement.warp(id, &mut actor.transform, *destination);
                res.arena.update_spatial(id);
                res.notify(CombatEvent::Teleported { actor: id });
            }
        }
        Effect::LookAtTarget => look_at_target(res, id),
        Effect::ClearTarget => aggro::set_target(res, id, None),
        Effect::ClearTargetIfDead => {
            let lost = res
                .arena
                .get(id)
                .and_then(|a| a.target)
                .is_some_and(|t| !res.arena.get(t).is_some_and(|t| t.is_alive()));
            if lost {
                aggro::set_target(res, id, None);
            }
        }
        Effect::ClearSkillRequest => {
            if let Some(actor) = res.arena.get_mut(id) {
                actor.skills.clear_request();
            }
        }
        Effect::SelectSkill(index) => {
            if let Some(actor) = res.arena.get_mut(id) {
                actor.skills.select(Some(*index));
            }
        }
        Effect::StartCast { target } => start_cast(res, id, *target),
        Effect::CancelCast { force } => cancel_cast(res, id, *force),
        Effect::FinishCast => finish_cast(res, rng, id),
        Effect::RememberLastSkill(index) => {
            if let Some(mob) = res.arena.get_mut(id).and_then(|a| a.as_mob_mut()) {
                mob.last_skill = Some(*index);
            }
        }
        Effect::ApplyNextTarget => {
            let next = res
                .arena
                .get_mut(id)
                .and_then(|a| a.as_player_mut())
                .and_then(|p| p.next_target.take());
            if let Some(next) = next {
                aggro::set_target(res, id, Some(next));
            }
        }
        Effect::PromotePendingSkill => {
            let Some(actor) = res.arena.get_mut(id) else {
                return;
            };
            let pending = actor.as_player_mut().and_then(|p| p.pending_skill.take());
            if let Some(index) = pending {
                if let Err(err) = actor.skills.request(index) {
                    tracing::debug!(actor = %id, %err, "buffered skill dropped");
                }
            }
        }
        Effect::AcknowledgeCancel => {
            if let Some(player) = res.arena.get_mut(id).and_then(|a| a.as_player_mut()) {
                player.cancel_action_requested = false;
            }
        }
        Effect::DepleteHealth => {
            let emptied = res
                .arena
                .get_mut(id)
                .is_some_and(|a| a.health.deplete().emptied);
            if emptied {
                death::on_death(res, id);
            }
        }
        Effect::PlayAmbientSound => {
            let now = res.arena.time();
            if let Some(actor) = res.arena.get_mut(id) {
                actor.last_ambient_sound_time = now;
                res.notify(CombatEvent::AmbientSound { actor: id });
            }
        }
    }
}

fn look_at_target(res: &mut Resolution<'_>, id: ActorId) {
    let Some(actor) = res.arena.get(id) else {
        return;
    };
    let focus = actor
        .skills
        .cast_target()
        .filter(|t| *t != id)
        .or(actor.target)
        .and_then(|t| res.arena.get(t))
        .map(|t| t.position());
    if let (Some(point), Some(actor)) = (focus, res.arena.get_mut(id)) {
        res.movement.look_at_yaw(id, &mut actor.transform, point);
    }
}

fn start_cast(res: &mut Resolution<'_>, id: ActorId, target: Option<ActorId>) {
    let Some(actor) = res.arena.get_mut(id) else {
        return;
    };
    let Some((index, resumed)) = actor.skills.start_cast(target) else {
        tracing::warn!(actor = %id, "start cast without a selected skill");
        return;
    };
    let skill = actor
        .skills
        .get(index)
        .map(|s| s.name().to_owned())
        .unwrap_or_default();
    tracing::debug!(actor = %id, %skill, resumed, "cast started");
    res.notify(CombatEvent::CastStarted {
        actor: id,
        skill,
        target,
        resumed,
    });
}

fn cancel_cast(res: &mut Resolution<'_>, id: ActorId, force: bool) {
    let Some(actor) = res.arena.get_mut(id) else {
        return;
    };
    match actor.skills.cancel_cast(force) {
        CancelOutcome::Cancelled(index) => {
            let skill = actor
                .skills
                .get(index)
                .map(|s| s.name().to_owned())
                .unwrap_or_default();
            tracing::debug!(actor = %id, %skill, "cast cancelled");
            res.notify(CombatEvent::CastCancelled { actor: id, skill });
        }
        CancelOutcome::Refused => tracing::trace!(actor = %id, "cast cannot be cancelled"),
        CancelOutcome::Cleared(_) | CancelOutcome::Nothing => {}
    }
}

/// Completes the selected cast.
///
/// The caster is checked once more: mana may have been drained or the
/// caster killed since the cast started. On success the mana is paid, the
/// cooldown starts and the skill's effect is applied against the corrected
/// target stored at cast start.
fn finish_cast<R: Rng + ?Sized>(res: &mut Resolution<'_>, rng: &mut R, id: ActorId) {
    let Some(actor) = res.arena.get(id) else {
        return;
    };
    let Some((index, skill)) = actor
        .skills
        .current()
        .and_then(|i| actor.skills.get(i).map(|s| (i, s)))
    else {
        return;
    };
    let name = skill.name().to_owned();
    let target = actor.skills.cast_target();

    if let Err(reason) = cast::check_self(actor, skill) {
        tracing::debug!(actor = %id, skill = %name, %reason, "cast failed at finish");
        if let Some(actor) = res.arena.get_mut(id) {
            actor.skills.clear_request();
        }
        res.notify(CombatEvent::CastCancelled {
            actor: id,
            skill: name,
        });
        return;
    }

    let cost = skill.cost();
    if let Some(actor) = res.arena.get_mut(id) {
        actor.mana.remove(cost);
        actor.skills.finish_cast();
    }
    apply::apply_skill(res, rng, id, index, target);

    tracing::debug!(actor = %id, skill = %name, "cast finished");
    res.notify(CombatEvent::CastFinished {
        actor: id,
        skill: name,
    });
}
