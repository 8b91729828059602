//! Health-emptied handling.

use crate::actor::ActorId;
use crate::presentation::CombatEvent;

use super::Resolution;

/// Runs once on the edge where an actor's health reached zero.
///
/// Starts the corpse decay countdown, strips buffs that do not survive
/// death, drops the skill selection and any route. Players and minions lose
/// their mana; a player's living minions die with it.
pub fn on_death(res: &mut Resolution<'_>, id: ActorId) {
    let decay = res.rules.corpse_decay_time;
    let Some(actor) = res.arena.get_mut(id) else {
        return;
    };

    actor.decay_remaining = Some(decay);
    let stripped = actor.skills.clear_buffs_on_death();
    actor.refresh_maxima();
    actor.skills.clear_request();
    if !actor.is_enemy() {
        actor.mana.deplete();
    }
    let is_player = actor.is_player();
    res.movement.reset(id);

    tracing::debug!(actor = %id, "died");
    for source in stripped {
        res.notify(CombatEvent::BuffExpired { actor: id, source });
    }
    res.notify(CombatEvent::Died { actor: id });

    if is_player {
        let minions: Vec<ActorId> = res
            .arena
            .actors_sorted()
            .filter(|a| a.owner() == Some(id) && a.is_alive())
            .map(|a| a.id())
            .collect();
        for minion in minions {
            let emptied = res
                .arena
                .get_mut(minion)
                .is_some_and(|m| m.health.deplete().emptied);
            if emptied {
                on_death(res, minion);
            }
        }
    }
}
