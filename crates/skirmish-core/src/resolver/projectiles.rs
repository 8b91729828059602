//! Projectile flight and impact.

use rand::Rng;

use crate::presentation::CombatEvent;
use crate::projectile::Flight;

use super::{apply, combat, Resolution};

/// Advances every projectile by `dt`, in ascending id order.
///
/// A hit delivers the payload captured at launch, so a projectile whose
/// source died in the meantime still lands.
pub fn resolve_projectiles<R: Rng + ?Sized>(res: &mut Resolution<'_>, rng: &mut R, dt: f32) {
    for id in res.arena.projectile_ids() {
        let Some(mut projectile) = res.arena.remove_projectile(id) else {
            continue;
        };
        match projectile.fly(res.arena, res.terrain, dt) {
            Flight::Flying => res.arena.store_projectile(id, projectile),
            Flight::Hit(target) => {
                res.notify(CombatEvent::ProjectileHit {
                    projectile: id,
                    target,
                });
                let payload = projectile.payload;
                let (dealt, _) = combat::resolve_damage(
                    res,
                    rng,
                    projectile.source,
                    target,
                    payload.damage,
                    payload.stun_chance,
                    payload.stun_time,
                );
                if dealt > 0 {
                    apply::drain_into(
                        res,
                        projectile.source,
                        target,
                        payload.drain_mana,
                        payload.drain_health,
                        payload.drain_to_owner,
                    );
                }
            }
            Flight::Expired => {
                tracing::trace!(projectile = %id, "projectile expired");
                res.notify(CombatEvent::ProjectileExpired { projectile: id });
            }
        }
    }
}
