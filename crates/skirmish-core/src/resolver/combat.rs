//! Combat arithmetic: damage, heals, drains and stuns.
//!
//! Every function takes the attacker/caster and the victim/recipient by id and
//! looks them up in the arena, so resolving an effect never holds two actor
//! borrows at once. Rolls are drawn from the RNG argument in a fixed order
//! (block, critical, stun) so the same stream always yields the same result.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::actor::{Actor, ActorId};
use crate::aggro;
use crate::pool::ResourceKind;
use crate::presentation::CombatEvent;

use super::{death, Resolution};

/// How a damage resolution played out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageOutcome {
    /// Regular hit.
    Normal,
    /// Critical hit.
    Crit,
    /// Fully blocked.
    Block,
    /// Defender dead or invincible; nothing happened.
    Invincible,
}

#[allow(clippy::cast_possible_truncation)]
fn ceil_to_i64(value: f64) -> i64 {
    value.ceil() as i64
}

fn to_amount(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

fn touch_combat_time(res: &mut Resolution<'_>, a: ActorId, b: ActorId) {
    let now = res.arena.time();
    for id in [a, b] {
        if let Some(actor) = res.arena.get_mut(id) {
            actor.last_combat_time = now;
        }
    }
}

// =============================================================================
// Damage
// =============================================================================

/// Resolves one hit of `base` damage from `attacker` on `defender`.
///
/// Returns the damage dealt (before clamping to the defender's remaining
/// health) and the outcome. Whatever the outcome, the defender aggroes the
/// attacker and both combat timers refresh, so ranged attackers always pull
/// aggro.
pub fn resolve_damage<R: Rng + ?Sized>(
    res: &mut Resolution<'_>,
    rng: &mut R,
    attacker: ActorId,
    defender: ActorId,
    base: i32,
    stun_chance: f32,
    stun_time: f32,
) -> (u32, DamageOutcome) {
    let (critical_chance, health_percent) = res.arena.get(attacker).map_or((0.0, 0.0), |a| {
        (a.critical_chance(), a.stats.bonus_damage_health_percent)
    });
    let Some(target) = res.arena.get(defender) else {
        return (0, DamageOutcome::Invincible);
    };

    let mut emptied = false;
    let (dealt, outcome) = if !target.is_alive() || target.stats.invincible {
        (0, DamageOutcome::Invincible)
    } else if rng.gen::<f32>() < target.block_chance() {
        (0, DamageOutcome::Block)
    } else {
        let mut dealt = (i64::from(base) - i64::from(target.defense())).max(1);
        if health_percent > 0.0 {
            let factor = 1.0 + f64::from(health_percent) * f64::from(target.health.max());
            dealt = dealt.saturating_mul(ceil_to_i64(factor));
        }

        let outcome = if rng.gen::<f32>() < critical_chance {
            #[allow(clippy::cast_precision_loss)]
            let boosted = dealt as f64 * f64::from(res.rules.crit_multiplier);
            dealt = ceil_to_i64(boosted);
            DamageOutcome::Crit
        } else {
            DamageOutcome::Normal
        };

        let stun =
            target.stats.can_be_stunned && stun_chance > 0.0 && rng.gen::<f32>() < stun_chance;
        if stun {
            apply_stun(res, defender, stun_time);
        }

        let dealt = to_amount(dealt);
        if let Some(target) = res.arena.get_mut(defender) {
            emptied = target.health.remove(dealt).emptied;
        }
        (dealt, outcome)
    };

    tracing::trace!(attacker = %attacker, defender = %defender, dealt, ?outcome, "damage resolved");
    res.notify(CombatEvent::Damaged {
        attacker,
        defender,
        amount: dealt,
        outcome,
    });
    if emptied {
        death::on_death(res, defender);
    }

    aggro::on_aggro_by(res, defender, attacker);
    touch_combat_time(res, attacker, defender);
    (dealt, outcome)
}

/// Stuns `actor` for `stun_time` seconds from now.
///
/// An existing longer stun is kept. A cast in flight gets its skill put on at
/// least `stun_cast_cooldown` of cooldown; the cast itself is left to the brain.
/// Returns false if the actor is missing or dead.
pub fn apply_stun(res: &mut Resolution<'_>, actor: ActorId, stun_time: f32) -> bool {
    let now = res.arena.time();
    let cooldown = res.rules.stun_cast_cooldown;
    let Some(victim) = res.arena.get_mut(actor).filter(|a| a.is_alive()) else {
        return false;
    };

    let until = (now + f64::from(stun_time.max(0.0))).max(victim.stun_end_time.unwrap_or(f64::MIN));
    victim.stun_end_time = Some(until);
    victim.skills.interrupt(cooldown);

    tracing::debug!(actor = %actor, until, "stunned");
    res.notify(CombatEvent::Stunned { actor, until });
    true
}

// =============================================================================
// Heals
// =============================================================================

/// Heals `target`'s health by `amount` (at least 1, crit on the caster's chance).
///
/// Returns the amount healed before clamping, or 0 if the target is dead.
pub fn resolve_heal<R: Rng + ?Sized>(
    res: &mut Resolution<'_>,
    rng: &mut R,
    caster: ActorId,
    target: ActorId,
    amount: i32,
) -> u32 {
    restore(res, rng, caster, target, amount, ResourceKind::Health)
}

/// Restores `target`'s mana; same rules as [`resolve_heal`].
pub fn resolve_mana_heal<R: Rng + ?Sized>(
    res: &mut Resolution<'_>,
    rng: &mut R,
    caster: ActorId,
    target: ActorId,
    amount: i32,
) -> u32 {
    restore(res, rng, caster, target, amount, ResourceKind::Mana)
}

fn restore<R: Rng + ?Sized>(
    res: &mut Resolution<'_>,
    rng: &mut R,
    caster: ActorId,
    target: ActorId,
    amount: i32,
    resource: ResourceKind,
) -> u32 {
    let critical_chance = res.arena.get(caster).map_or(0.0, Actor::critical_chance);
    if !res.arena.get(target).is_some_and(Actor::is_alive) {
        return 0;
    }

    let mut heal = i64::from(amount).max(1);
    let critical = rng.gen::<f32>() < critical_chance;
    if critical {
        #[allow(clippy::cast_precision_loss)]
        let boosted = heal as f64 * f64::from(res.rules.crit_multiplier);
        heal = ceil_to_i64(boosted);
    }
    let heal = to_amount(heal);

    if let Some(recipient) = res.arena.get_mut(target) {
        match resource {
            ResourceKind::Health => recipient.health.add(heal),
            ResourceKind::Mana => recipient.mana.add(heal),
        };
    }

    res.notify(CombatEvent::Healed {
        caster,
        target,
        resource,
        amount: heal,
        critical,
    });
    touch_combat_time(res, caster, target);
    heal
}

// =============================================================================
// Drain
// =============================================================================

/// Moves up to `mana` and `health` from `target` to `receiver`.
///
/// No rolls are made. The receiver gains what the target actually lost, capped
/// by its own headroom, so a drain never creates resources. Dead receivers
/// and dead targets leave both untouched. Returns the mana and health taken
/// from the target.
pub fn resolve_drain(
    res: &mut Resolution<'_>,
    receiver: ActorId,
    target: ActorId,
    mana: i32,
    health: i32,
) -> (u32, u32) {
    if mana < 1 && health < 1 {
        return (0, 0);
    }
    if !res.arena.get(receiver).is_some_and(Actor::is_alive)
        || !res.arena.get(target).is_some_and(Actor::is_alive)
    {
        return (0, 0);
    }

    let mut mana_taken = 0;
    let mut health_taken = 0;
    let mut emptied = false;
    if let Some(victim) = res.arena.get_mut(target) {
        if mana > 0 {
            mana_taken = victim.mana.remove(to_amount(i64::from(mana))).lost();
        }
        if health > 0 {
            let change = victim.health.remove(to_amount(i64::from(health)));
            health_taken = change.lost();
            emptied = change.emptied;
        }
    }
    if let Some(gainer) = res.arena.get_mut(receiver) {
        gainer.mana.add(mana_taken);
        gainer.health.add(health_taken);
    }

    res.notify(CombatEvent::Drained {
        receiver,
        target,
        mana: mana_taken,
        health: health_taken,
    });
    if emptied {
        death::on_death(res, target);
    }
    touch_combat_time(res, receiver, target);
    (mana_taken, health_taken)
}
