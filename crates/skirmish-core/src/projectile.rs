//! In-flight projectiles.
//!
//! Projectile skills do not hit on cast finish. They launch a [`Projectile`]
//! that lives in the arena and flies each tick, either homing on the cast
//! target or straight along the caster's facing. [`Projectile::fly`] only
//! moves and detects contact; hits are resolved by
//! [`crate::resolver::resolve_projectiles`].

use std::collections::BTreeSet;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::actor::ActorId;
use crate::aggro;
use crate::arena::Arena;
use crate::terrain::Terrain;

/// Unique identifier for a projectile.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProjectileId(u64);

impl ProjectileId {
    /// Creates an id from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ProjectileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProjectileId({})", self.0)
    }
}

impl fmt::Display for ProjectileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a projectile delivers on hit, fixed at launch.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Payload {
    /// Base damage before defense.
    pub damage: i32,
    /// Stun probability.
    pub stun_chance: f32,
    /// Stun duration in seconds.
    pub stun_time: f32,
    /// Mana drained on hit.
    pub drain_mana: i32,
    /// Health drained on hit.
    pub drain_health: i32,
    /// Drained resources go to the source's owner.
    pub drain_to_owner: bool,
}

/// A projectile in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    /// Source actor.
    pub source: ActorId,
    /// Skill that launched it.
    pub skill: String,
    /// Homing target, if any.
    pub target: Option<ActorId>,
    /// Current position.
    pub position: Vec2,
    /// Unit travel direction.
    pub direction: Vec2,
    /// Units per second.
    pub speed: f32,
    /// Seconds left before it fizzles.
    pub remaining: f32,
    /// Hit payload.
    pub payload: Payload,
}

/// Result of one flight step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flight {
    /// Still travelling.
    Flying,
    /// Reached an actor.
    Hit(ActorId),
    /// Ran out of time or lost its target.
    Expired,
}

impl Projectile {
    /// Moves the projectile by one tick and reports contact.
    pub fn fly(&mut self, arena: &Arena, terrain: &dyn Terrain, dt: f32) -> Flight {
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            return Flight::Expired;
        }
        let step = (self.speed * dt).max(0.0);

        match self.target {
            Some(target_id) => {
                let Some(target) = arena.get(target_id).filter(|t| t.is_alive()) else {
                    return Flight::Expired;
                };
                let aim = target.closest_point(self.position);
                let offset = aim - self.position;
                let distance = offset.length();
                if distance <= step {
                    self.position = aim;
                    return Flight::Hit(target_id);
                }
                self.direction = offset / distance;
                self.position += self.direction * step;
                Flight::Flying
            }
            None => {
                let Some(source) = arena.get(self.source) else {
                    return Flight::Expired;
                };
                let start = self.position;
                let end = start + self.direction * step;
                let candidates: BTreeSet<ActorId> = arena
                    .spatial()
                    .query_radius((start + end) * 0.5, step * 0.5)
                    .into_iter()
                    .collect();

                let mut best: Option<(f32, ActorId)> = None;
                for id in candidates {
                    let Some(candidate) = arena.get(id) else {
                        continue;
                    };
                    if !aggro::can_attack(arena, terrain, source, candidate) {
                        continue;
                    }
                    for (center, radius) in candidate.world_colliders() {
                        if let Some(along) = segment_contact(start, end, center, radius) {
                            if best.map_or(true, |(d, _)| along < d) {
                                best = Some((along, id));
                            }
                        }
                    }
                }

                self.position = end;
                match best {
                    Some((_, id)) => Flight::Hit(id),
                    None => Flight::Flying,
                }
            }
        }
    }
}

/// Distance along `start -> end` at which the segment first comes within
/// `radius` of `center`, if it does.
fn segment_contact(start: Vec2, end: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    let segment = end - start;
    let length_sq = segment.length_squared();
    let t = if length_sq <= f32::EPSILON {
        0.0
    } else {
        ((center - start).dot(segment) / length_sq).clamp(0.0, 1.0)
    };
    let closest = start + segment * t;
    (closest.distance(center) <= radius).then(|| t * length_sq.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{ActorSpec, Collider};
    use crate::terrain::OpenTerrain;

    fn arena_with_target(at: Vec2) -> (Arena, ActorId, ActorId) {
        let mut arena = Arena::new();
        let shooter = arena.spawn(ActorSpec::player("archer", Vec2::ZERO));
        let wolf = arena.spawn(
            ActorSpec::enemy("wolf", at).with_colliders(vec![Collider::centered(0.5)]),
        );
        (arena, shooter, wolf)
    }

    fn projectile(source: ActorId, target: Option<ActorId>) -> Projectile {
        Projectile {
            source,
            skill: "arrow".to_string(),
            target,
            position: Vec2::ZERO,
            direction: Vec2::X,
            speed: 10.0,
            remaining: 2.0,
            payload: Payload::default(),
        }
    }

    #[test]
    fn homing_projectile_hits_collider_surface() {
        let (arena, shooter, wolf) = arena_with_target(Vec2::new(5.5, 0.0));
        let mut arrow = projectile(shooter, Some(wolf));
        assert_eq!(arrow.fly(&arena, &OpenTerrain, 0.25), Flight::Flying);
        assert_eq!(arrow.fly(&arena, &OpenTerrain, 0.25), Flight::Hit(wolf));
        assert!((arrow.position.x - 5.0).abs() < 1e-4);
    }

    #[test]
    fn homing_projectile_expires_when_target_dies() {
        let (mut arena, shooter, wolf) = arena_with_target(Vec2::new(50.0, 0.0));
        arena.get_mut(wolf).unwrap().health.deplete();
        let mut arrow = projectile(shooter, Some(wolf));
        assert_eq!(arrow.fly(&arena, &OpenTerrain, 0.1), Flight::Expired);
    }

    #[test]
    fn straight_projectile_hits_first_attackable_in_path() {
        let (arena, shooter, wolf) = arena_with_target(Vec2::new(3.0, 0.2));
        let mut arrow = projectile(shooter, None);
        assert_eq!(arrow.fly(&arena, &OpenTerrain, 0.5), Flight::Hit(wolf));
    }

    #[test]
    fn straight_projectile_misses_off_axis() {
        let (arena, shooter, _) = arena_with_target(Vec2::new(3.0, 4.0));
        let mut arrow = projectile(shooter, None);
        assert_eq!(arrow.fly(&arena, &OpenTerrain, 0.5), Flight::Flying);
        assert_eq!(arrow.position, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn lifetime_runs_out() {
        let (arena, shooter, _) = arena_with_target(Vec2::new(100.0, 100.0));
        let mut arrow = projectile(shooter, None);
        arrow.remaining = 0.1;
        assert_eq!(arrow.fly(&arena, &OpenTerrain, 0.2), Flight::Expired);
    }
}
