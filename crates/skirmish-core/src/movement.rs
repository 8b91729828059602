//! Movement provider.
//!
//! Brains request movement through the [`Movement`] trait and read back only
//! whether an actor is still moving. The tick loop calls [`Movement::advance`]
//! once per actor after all decisions were applied.
//!
//! [`SteeringMovement`] is the built-in provider: straight-line steering toward
//! a destination with a stopping distance, no pathfinding.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::actor::{ActorId, Transform};

/// Movement collaborator.
///
/// Implementations keep per-actor navigation state. They must be
/// deterministic: the same calls in the same order produce the same poses.
pub trait Movement: Send + Sync {
    /// Returns true while the actor has an active route.
    fn is_moving(&self, actor: ActorId) -> bool;

    /// Returns true if the actor may be given routes.
    fn can_navigate(&self, actor: ActorId) -> bool;

    /// Starts a route toward `destination`, ending `stopping_distance` short.
    fn navigate_to(&mut self, actor: ActorId, destination: Vec2, stopping_distance: f32);

    /// Relocates instantly, dropping any route.
    fn warp(&mut self, actor: ActorId, transform: &mut Transform, destination: Vec2);

    /// Drops any route.
    fn reset(&mut self, actor: ActorId);

    /// Turns the actor toward `point` around the vertical axis.
    fn look_at_yaw(&mut self, actor: ActorId, transform: &mut Transform, point: Vec2);

    /// Advances the actor along its route by `speed * dt`.
    fn advance(&mut self, actor: ActorId, transform: &mut Transform, speed: f32, dt: f32);

    /// Forgets the actor entirely.
    fn remove(&mut self, actor: ActorId) {
        self.reset(actor);
    }
}

/// An active route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Where the actor is heading.
    pub destination: Vec2,
    /// Arrival threshold.
    pub stopping_distance: f32,
}

/// Straight-line steering.
///
/// # Example
///
/// ```
/// use skirmish_core::actor::{ActorId, Transform};
/// use skirmish_core::movement::{Movement, SteeringMovement};
/// use glam::Vec2;
///
/// let mut movement = SteeringMovement::new();
/// let id = ActorId::new(1);
/// let mut transform = Transform::new(Vec2::ZERO, 0.0);
///
/// movement.navigate_to(id, Vec2::new(3.0, 0.0), 0.0);
/// assert!(movement.is_moving(id));
///
/// movement.advance(id, &mut transform, 2.0, 1.0);
/// movement.advance(id, &mut transform, 2.0, 1.0);
/// assert_eq!(transform.position, Vec2::new(3.0, 0.0));
/// assert!(!movement.is_moving(id));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SteeringMovement {
    routes: BTreeMap<ActorId, Route>,
    frozen: Vec<ActorId>,
}

impl SteeringMovement {
    /// Creates a provider with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Active route of an actor.
    #[must_use]
    pub fn route(&self, actor: ActorId) -> Option<&Route> {
        self.routes.get(&actor)
    }

    /// Prevents or allows navigation for an actor.
    pub fn set_frozen(&mut self, actor: ActorId, frozen: bool) {
        self.frozen.retain(|id| *id != actor);
        if frozen {
            self.frozen.push(actor);
            self.routes.remove(&actor);
        }
    }
}

impl Movement for SteeringMovement {
    fn is_moving(&self, actor: ActorId) -> bool {
        self.routes.contains_key(&actor)
    }

    fn can_navigate(&self, actor: ActorId) -> bool {
        !self.frozen.contains(&actor)
    }

    fn navigate_to(&mut self, actor: ActorId, destination: Vec2, stopping_distance: f32) {
        if !self.can_navigate(actor) {
            return;
        }
        self.routes.insert(
            actor,
            Route {
                destination,
                stopping_distance: stopping_distance.max(0.0),
            },
        );
    }

    fn warp(&mut self, actor: ActorId, transform: &mut Transform, destination: Vec2) {
        self.routes.remove(&actor);
        transform.position = destination;
    }

    fn reset(&mut self, actor: ActorId) {
        self.routes.remove(&actor);
    }

    fn look_at_yaw(&mut self, _actor: ActorId, transform: &mut Transform, point: Vec2) {
        transform.look_at(point);
    }

    fn advance(&mut self, actor: ActorId, transform: &mut Transform, speed: f32, dt: f32) {
        let Some(route) = self.routes.get(&actor).copied() else {
            return;
        };
        let offset = route.destination - transform.position;
        let remaining = offset.length() - route.stopping_distance;
        if remaining <= 0.0 {
            self.routes.remove(&actor);
            return;
        }

        let step = (speed * dt).max(0.0);
        transform.look_at(route.destination);
        if step >= remaining {
            transform.position += offset.normalize_or_zero() * remaining;
            self.routes.remove(&actor);
        } else {
            transform.position += offset.normalize_or_zero() * step;
        }
    }

    fn remove(&mut self, actor: ActorId) {
        self.routes.remove(&actor);
        self.frozen.retain(|id| *id != actor);
    }
}
