//! `WorldView` provides read-only access to arena state for brains and the
//! cast pipeline.
//!
//! Brains observe the world through a [`WorldView`] during the planning
//! phase, which runs in parallel. The view bundles the arena with the host's
//! terrain and movement collaborators, so every query a brain may need
//! (relationships, distances, candidates, "is it still walking") goes through
//! one immutable handle.
//!
//! # Immutability
//!
//! `WorldView` only hands out shared references. This ensures that:
//! - Brains cannot mutate state (they return transitions instead)
//! - Every actor plans against the same frozen snapshot
//! - Planning can run on any number of threads
//!
//! # Example
//!
//! ```
//! use skirmish_core::arena::Arena;
//! use skirmish_core::actor::ActorSpec;
//! use skirmish_core::movement::SteeringMovement;
//! use skirmish_core::terrain::OpenTerrain;
//! use skirmish_core::world_view::WorldView;
//! use glam::Vec2;
//!
//! let mut arena = Arena::new();
//! let hero = arena.spawn(ActorSpec::player("hero", Vec2::ZERO));
//! let wolf = arena.spawn(ActorSpec::enemy("wolf", Vec2::new(4.0, 0.0)));
//! let movement = SteeringMovement::new();
//!
//! let view = WorldView::new(&arena, &OpenTerrain, &movement, 0.05);
//! assert!(view.can_attack(wolf, hero));
//! assert!((view.surface_distance(hero, wolf).unwrap() - 3.0).abs() < 1e-5);
//! assert_eq!(view.candidates(Vec2::ZERO, 1.0).len(), 1);
//! ```

use std::collections::BTreeSet;
use std::fmt;

use glam::Vec2;

use crate::actor::{Actor, ActorId};
use crate::aggro;
use crate::arena::Arena;
use crate::movement::Movement;
use crate::terrain::Terrain;

// =============================================================================
// WorldView
// =============================================================================

/// Frozen, read-only view of the world for one planning phase.
///
/// # Lifetime
///
/// The view borrows the arena and the collaborators for the duration of the
/// phase; the `'a` lifetime ties returned actor references to the arena.
#[derive(Clone, Copy)]
pub struct WorldView<'a> {
    arena: &'a Arena,
    terrain: &'a dyn Terrain,
    movement: &'a dyn Movement,
    dt: f32,
}

impl fmt::Debug for WorldView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorldView")
            .field("tick", &self.arena.current_tick())
            .field("actors", &self.arena.actor_count())
            .field("dt", &self.dt)
            .finish_non_exhaustive()
    }
}

impl<'a> WorldView<'a> {
    /// Creates a view over `arena` for a tick of `dt` seconds.
    #[must_use]
    pub fn new(
        arena: &'a Arena,
        terrain: &'a dyn Terrain,
        movement: &'a dyn Movement,
        dt: f32,
    ) -> Self {
        Self {
            arena,
            terrain,
            movement,
            dt,
        }
    }

    /// Underlying arena.
    #[must_use]
    pub const fn arena(&self) -> &'a Arena {
        self.arena
    }

    /// Terrain collaborator.
    #[must_use]
    pub fn terrain(&self) -> &'a dyn Terrain {
        self.terrain
    }

    /// Current tick.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.arena.current_tick()
    }

    /// Simulation time in seconds.
    #[must_use]
    pub const fn time(&self) -> f64 {
        self.arena.time()
    }

    /// Tick length in seconds.
    #[must_use]
    pub const fn dt(&self) -> f32 {
        self.dt
    }

    /// Actor by id.
    #[must_use]
    pub fn get(&self, id: ActorId) -> Option<&'a Actor> {
        self.arena.get(id)
    }

    /// Actors in ascending id order.
    pub fn actors_sorted(&self) -> impl Iterator<Item = &'a Actor> + 'a {
        self.arena.actors_sorted()
    }

    // -------------------------------------------------------------------------
    // Movement
    // -------------------------------------------------------------------------

    /// Whether the movement provider reports an active route.
    #[must_use]
    pub fn is_moving(&self, id: ActorId) -> bool {
        self.movement.is_moving(id)
    }

    /// Whether the actor may be given routes.
    #[must_use]
    pub fn can_navigate(&self, id: ActorId) -> bool {
        self.movement.can_navigate(id)
    }

    // -------------------------------------------------------------------------
    // Spatial queries
    // -------------------------------------------------------------------------

    /// Colliders touching the circle, one entry per collider.
    ///
    /// An actor with several colliders may appear several times; see
    /// [`WorldView::candidates`] for the deduplicated form.
    #[must_use]
    pub fn query_colliders(&self, center: Vec2, radius: f32) -> Vec<ActorId> {
        self.arena.spatial().query_radius(center, radius)
    }

    /// Distinct actors with at least one collider touching the circle.
    #[must_use]
    pub fn candidates(&self, center: Vec2, radius: f32) -> BTreeSet<ActorId> {
        self.query_colliders(center, radius).into_iter().collect()
    }

    /// Surface-to-surface distance between two actors.
    #[must_use]
    pub fn surface_distance(&self, a: ActorId, b: ActorId) -> Option<f32> {
        Some(self.get(a)?.surface_distance(self.get(b)?))
    }

    /// Point on `id`'s colliders closest to `point`.
    #[must_use]
    pub fn closest_point(&self, id: ActorId, point: Vec2) -> Option<Vec2> {
        self.get(id).map(|a| a.closest_point(point))
    }

    /// Whether a straight line from `from` to `to` is unobstructed.
    #[must_use]
    pub fn can_reach(&self, from: Vec2, to: Vec2) -> bool {
        self.terrain.can_reach(from, to)
    }

    // -------------------------------------------------------------------------
    // Relationships
    // -------------------------------------------------------------------------

    /// Faction allies.
    #[must_use]
    pub fn are_allies(&self, a: ActorId, b: ActorId) -> bool {
        match (self.get(a), self.get(b)) {
            (Some(a), Some(b)) => self.arena.are_allies(a, b),
            _ => false,
        }
    }

    /// See [`aggro::can_attack`].
    #[must_use]
    pub fn can_attack(&self, a: ActorId, b: ActorId) -> bool {
        match (self.get(a), self.get(b)) {
            (Some(a), Some(b)) => aggro::can_attack(self.arena, self.terrain, a, b),
            _ => false,
        }
    }

    /// See [`aggro::can_heal`].
    #[must_use]
    pub fn can_heal(&self, a: ActorId, b: ActorId) -> bool {
        match (self.get(a), self.get(b)) {
            (Some(a), Some(b)) => aggro::can_heal(self.arena, self.terrain, a, b),
            _ => false,
        }
    }

    /// See [`aggro::can_resurrect`].
    #[must_use]
    pub fn can_resurrect(&self, a: ActorId, b: ActorId) -> bool {
        match (self.get(a), self.get(b)) {
            (Some(a), Some(b)) => aggro::can_resurrect(self.arena, self.terrain, a, b),
            _ => false,
        }
    }
}
