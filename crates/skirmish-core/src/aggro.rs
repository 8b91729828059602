//! Targeting policy.
//!
//! Relationship checks ([`can_attack`], [`can_heal`], [`can_resurrect`]) are
//! pure reads used by the cast pipeline, brains and skill effects.
//! [`on_aggro_by`] is the single place where a mob picks or switches its
//! target; it runs for every damage resolution and for the per-tick
//! proximity [`scan`].

use std::collections::{BTreeSet, VecDeque};

use crate::actor::{Actor, ActorId};
use crate::arena::Arena;
use crate::presentation::CombatEvent;
use crate::resolver::Resolution;
use crate::terrain::Terrain;

// =============================================================================
// Relationship checks
// =============================================================================

fn reachable(terrain: &dyn Terrain, a: &Actor, b: &Actor) -> bool {
    terrain.can_reach(a.position(), b.position())
}

/// Returns true if `a` may attack `b`.
///
/// Both must be alive, distinct, not faction allies and within reach.
/// Enemies only attack players and minions they do not own. Minions never
/// attack their owner and only attack what the owner could attack.
#[must_use]
pub fn can_attack(arena: &Arena, terrain: &dyn Terrain, a: &Actor, b: &Actor) -> bool {
    if !a.is_alive() || !b.is_alive() || a.id() == b.id() {
        return false;
    }
    if arena.are_allies(a, b) || !reachable(terrain, a, b) {
        return false;
    }
    if a.is_enemy() {
        return b.is_player() || (b.is_minion() && b.owner() != Some(a.id()));
    }
    if a.is_minion() {
        let Some(owner) = a.owner() else {
            return false;
        };
        if b.id() == owner {
            return false;
        }
        return arena
            .get(owner)
            .is_some_and(|o| can_attack(arena, terrain, o, b));
    }
    true
}

/// Returns true if `a` may heal or buff `b`.
#[must_use]
pub fn can_heal(arena: &Arena, terrain: &dyn Terrain, a: &Actor, b: &Actor) -> bool {
    a.is_alive() && b.is_alive() && arena.are_allies(a, b) && reachable(terrain, a, b)
}

/// Returns true if `a` may raise the corpse `b`. Minions never resurrect.
#[must_use]
pub fn can_resurrect(arena: &Arena, terrain: &dyn Terrain, a: &Actor, b: &Actor) -> bool {
    !a.is_minion()
        && a.is_alive()
        && !b.is_alive()
        && !b.decayed
        && a.id() != b.id()
        && arena.are_allies(a, b)
        && reachable(terrain, a, b)
}

// =============================================================================
// Aggro
// =============================================================================

/// Lets `defender` react to `attacker`.
///
/// Players choose targets through input and ignore this. A mob without a
/// (present) target takes the attacker; an enemy then spreads the aggro to
/// idle enemies around it. A mob with a target switches only when the
/// attacker is a different actor and clearly closer, measured center to
/// center against `aggro_switch_ratio` times the current distance.
pub fn on_aggro_by(res: &mut Resolution<'_>, defender: ActorId, attacker: ActorId) {
    let mut queue = VecDeque::from([defender]);
    let mut visited = BTreeSet::new();

    while let Some(id) = queue.pop_front() {
        if !visited.insert(id) {
            continue;
        }
        let Some(took_empty) = react(res, id, attacker) else {
            continue;
        };
        if !took_empty {
            continue;
        }

        // spread from enemies that just picked up their first target
        let Some(actor) = res.arena.get(id).filter(|a| a.is_enemy()) else {
            continue;
        };
        let center = actor.position();
        let neighbors: BTreeSet<ActorId> = res
            .arena
            .spatial()
            .query_radius(center, res.rules.aggro_propagation_radius)
            .into_iter()
            .collect();
        for neighbor in neighbors {
            let idle_enemy = res
                .arena
                .get(neighbor)
                .is_some_and(|n| n.is_enemy() && n.is_alive() && n.target.is_none());
            if idle_enemy {
                queue.push_back(neighbor);
            }
        }
    }
}

/// Applies the target rules for one mob. Returns `Some(true)` if the mob had
/// no target and took the attacker, `Some(false)` for a switch, `None` if
/// nothing changed.
fn react(res: &mut Resolution<'_>, id: ActorId, attacker: ActorId) -> Option<bool> {
    let mob = res.arena.get(id)?;
    let source = res.arena.get(attacker)?;
    if mob.is_player() || !can_attack(res.arena, res.terrain, mob, source) {
        return None;
    }

    let current = mob.target.and_then(|t| res.arena.get(t));
    let took_empty = match current {
        None => true,
        Some(current) if current.id() != attacker => {
            let old_distance = mob.position().distance(current.position());
            let new_distance = mob.position().distance(source.position());
            if new_distance >= old_distance * res.rules.aggro_switch_ratio {
                return None;
            }
            false
        }
        Some(_) => return None,
    };

    set_target(res, id, Some(attacker));
    Some(took_empty)
}

/// Changes an actor's target, announcing new non-empty targets.
pub fn set_target(res: &mut Resolution<'_>, id: ActorId, target: Option<ActorId>) {
    let Some(actor) = res.arena.get_mut(id) else {
        return;
    };
    if actor.target == target {
        return;
    }
    actor.target = target;
    if let Some(target) = target {
        tracing::debug!(actor = %id, target = %target, "target changed");
        res.notify(CombatEvent::Aggro { actor: id, target });
    }
}

/// Proximity pass: every living mob reacts to what it can attack inside its
/// aggro radius, in id order.
pub fn scan(res: &mut Resolution<'_>) {
    let mobs: Vec<(ActorId, glam::Vec2, f32)> = res
        .arena
        .actors_sorted()
        .filter(|a| a.is_alive())
        .filter_map(|a| a.as_mob().map(|m| (a.id(), a.position(), m.aggro_radius)))
        .collect();

    for (id, center, radius) in mobs {
        let candidates: BTreeSet<ActorId> = res
            .arena
            .spatial()
            .query_radius(center, radius)
            .into_iter()
            .collect();
        for candidate in candidates {
            let attackable = match (res.arena.get(id), res.arena.get(candidate)) {
                (Some(mob), Some(other)) => can_attack(res.arena, res.terrain, mob, other),
                _ => false,
            };
            if attackable {
                on_aggro_by(res, id, candidate);
            }
        }
    }
}
