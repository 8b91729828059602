//! Arena module for the skirmish simulation.
//!
//! The Arena is the container for everything a skirmish simulates:
//! - Actor storage with deterministic iteration order (`BTreeMap`)
//! - A collider index for proximity and candidate queries
//! - Faction relations
//! - Projectiles in flight
//! - Tick counter and simulation clock
//!
//! # Spatial Index Synchronization
//!
//! The collider index is NOT updated when an actor's transform changes. After
//! moving an actor through `get_mut()`, call `update_spatial(id)` (or
//! `sync_spatial()` for everyone) before querying. Spawn and despawn keep the
//! index in sync on their own.
//!
//! ```
//! # use skirmish_core::arena::Arena;
//! # use skirmish_core::actor::ActorSpec;
//! # use glam::Vec2;
//! # let mut arena = Arena::new();
//! # let id = arena.spawn(ActorSpec::enemy("wolf", Vec2::ZERO));
//! if let Some(actor) = arena.get_mut(id) {
//!     actor.transform.position = Vec2::new(50.0, 0.0);
//! }
//! // REQUIRED: sync the index after a position change
//! arena.update_spatial(id);
//! assert_eq!(arena.spatial().query_radius(Vec2::new(50.0, 0.0), 1.0), vec![id]);
//! ```

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::actor::{Actor, ActorId, ActorInner, ActorSpec, FactionId};
use crate::projectile::{Projectile, ProjectileId};

// =============================================================================
// Spatial Index
// =============================================================================

/// Collider index for proximity queries.
///
/// Stores the world-space collider circles of every actor. Queries scan all
/// entries; `BTreeMap` storage keeps results in id order without sorting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpatialIndex {
    colliders: BTreeMap<ActorId, Vec<(Vec2, f32)>>,
}

impl SpatialIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an actor's collider circles.
    pub fn insert(&mut self, id: ActorId, colliders: Vec<(Vec2, f32)>) {
        self.colliders.insert(id, colliders);
    }

    /// Removes an actor from the index.
    pub fn remove(&mut self, id: ActorId) {
        self.colliders.remove(&id);
    }

    /// Collider circles of an actor, if indexed.
    #[must_use]
    pub fn get(&self, id: ActorId) -> Option<&[(Vec2, f32)]> {
        self.colliders.get(&id).map(Vec::as_slice)
    }

    /// Actors whose colliders intersect the circle `(center, radius)`.
    ///
    /// One entry is returned per intersecting collider, so an actor with
    /// several colliders may appear more than once. Results are sorted by id.
    #[must_use]
    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<ActorId> {
        let mut results = Vec::new();
        for (id, circles) in &self.colliders {
            for (position, collider_radius) in circles {
                if center.distance(*position) <= radius + collider_radius {
                    results.push(*id);
                }
            }
        }
        results
    }

    /// Replaces the colliders of an already indexed actor.
    ///
    /// Returns true if the actor was found.
    pub fn update(&mut self, id: ActorId, colliders: Vec<(Vec2, f32)>) -> bool {
        match self.colliders.get_mut(&id) {
            Some(entry) => {
                *entry = colliders;
                true
            }
            None => false,
        }
    }

    /// Number of indexed actors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    /// Returns true if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }
}

// =============================================================================
// Factions
// =============================================================================

/// Hostility between factions.
///
/// Factions are allied unless a pair was marked hostile. A faction is always
/// allied with itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FactionRelations {
    hostile: BTreeSet<(FactionId, FactionId)>,
}

impl FactionRelations {
    /// All factions allied.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn key(a: FactionId, b: FactionId) -> (FactionId, FactionId) {
        (a.min(b), a.max(b))
    }

    /// Marks a pair hostile or allied. Setting a faction hostile to itself is ignored.
    pub fn set_hostile(&mut self, a: FactionId, b: FactionId, hostile: bool) {
        if a == b {
            return;
        }
        if hostile {
            self.hostile.insert(Self::key(a, b));
        } else {
            self.hostile.remove(&Self::key(a, b));
        }
    }

    /// Returns true if the pair is hostile.
    #[must_use]
    pub fn are_hostile(&self, a: FactionId, b: FactionId) -> bool {
        a != b && self.hostile.contains(&Self::key(a, b))
    }

    /// Returns true if the pair is allied.
    #[must_use]
    pub fn are_allies(&self, a: FactionId, b: FactionId) -> bool {
        !self.are_hostile(a, b)
    }
}

// =============================================================================
// Arena
// =============================================================================

/// Skirmish arena containing all actors and projectiles.
///
/// # Determinism
///
/// Actors and projectiles live in `BTreeMap`s keyed by monotonically
/// assigned ids, so every iteration visits them in the same order on every
/// platform.
///
/// # Example
///
/// ```
/// use skirmish_core::arena::Arena;
/// use skirmish_core::actor::ActorSpec;
/// use glam::Vec2;
///
/// let mut arena = Arena::new();
/// let hero = arena.spawn(ActorSpec::player("hero", Vec2::ZERO));
/// let wolf = arena.spawn(ActorSpec::enemy("wolf", Vec2::new(5.0, 0.0)));
///
/// let ids: Vec<_> = arena.actor_ids_sorted().collect();
/// assert_eq!(ids, vec![hero, wolf]);
/// assert!(arena.get(hero).unwrap().is_player());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arena {
    next_id: u64,
    actors: BTreeMap<ActorId, Actor>,
    spatial: SpatialIndex,
    factions: FactionRelations,
    next_projectile_id: u64,
    projectiles: BTreeMap<ProjectileId, Projectile>,
    tick: u64,
    time: f64,
}

impl Arena {
    /// Creates an empty arena at tick 0, time 0.
    ///
    /// [`FactionId::PLAYERS`] and [`FactionId::MONSTERS`] start hostile.
    #[must_use]
    pub fn new() -> Self {
        let mut factions = FactionRelations::new();
        factions.set_hostile(FactionId::PLAYERS, FactionId::MONSTERS, true);
        Self {
            next_id: 0,
            actors: BTreeMap::new(),
            spatial: SpatialIndex::new(),
            factions,
            next_projectile_id: 0,
            projectiles: BTreeMap::new(),
            tick: 0,
            time: 0.0,
        }
    }

    /// Spawns an actor and indexes its colliders.
    ///
    /// A minion whose owner exists joins the owner's faction.
    pub fn spawn(&mut self, mut spec: ActorSpec) -> ActorId {
        let id = ActorId::new(self.next_id);
        self.next_id += 1;

        if let ActorInner::Minion(minion) = &spec.inner {
            if let Some(owner) = minion.owner.and_then(|o| self.actors.get(&o)) {
                spec.faction = owner.faction;
            }
        }

        let actor = Actor::from_spec(id, spec);
        self.spatial.insert(id, actor.world_colliders().collect());
        self.actors.insert(id, actor);
        id
    }

    /// Removes an actor. Projectiles aimed at it expire on their next flight step.
    pub fn despawn(&mut self, id: ActorId) -> Option<Actor> {
        self.spatial.remove(id);
        self.actors.remove(&id)
    }

    /// Actor by id.
    #[must_use]
    pub fn get(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// Mutable actor by id.
    #[must_use]
    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(&id)
    }

    /// Actor ids in ascending order.
    pub fn actor_ids_sorted(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.actors.keys().copied()
    }

    /// Actors in ascending id order.
    pub fn actors_sorted(&self) -> impl Iterator<Item = &Actor> + '_ {
        self.actors.values()
    }

    /// Mutable actors in ascending id order.
    pub fn actors_sorted_mut(&mut self) -> impl Iterator<Item = &mut Actor> + '_ {
        self.actors.values_mut()
    }

    /// Number of actors.
    #[must_use]
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Returns true if there are no actors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Corpses that finished decaying, ready for despawn.
    #[must_use]
    pub fn decayed_ids(&self) -> Vec<ActorId> {
        self.actors
            .values()
            .filter(|a| a.decayed)
            .map(Actor::id)
            .collect()
    }

    /// Collider index.
    #[must_use]
    pub fn spatial(&self) -> &SpatialIndex {
        &self.spatial
    }

    /// Faction relations.
    #[must_use]
    pub fn factions(&self) -> &FactionRelations {
        &self.factions
    }

    /// Mutable faction relations.
    pub fn factions_mut(&mut self) -> &mut FactionRelations {
        &mut self.factions
    }

    /// Returns true if two actors' factions are allied.
    #[must_use]
    pub fn are_allies(&self, a: &Actor, b: &Actor) -> bool {
        self.factions.are_allies(a.faction, b.faction)
    }

    /// Current tick.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Simulation time in seconds.
    #[must_use]
    pub const fn time(&self) -> f64 {
        self.time
    }

    /// Advances the tick counter and the clock by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        self.tick += 1;
        self.time += f64::from(dt);
    }

    /// Re-indexes one actor after its transform changed.
    pub fn update_spatial(&mut self, id: ActorId) {
        if let Some(actor) = self.actors.get(&id) {
            self.spatial.insert(id, actor.world_colliders().collect());
        }
    }

    /// Re-indexes every actor.
    pub fn sync_spatial(&mut self) {
        for (id, actor) in &self.actors {
            self.spatial.insert(*id, actor.world_colliders().collect());
        }
    }

    // -------------------------------------------------------------------------
    // Projectiles
    // -------------------------------------------------------------------------

    /// Adds a projectile and returns its id.
    pub fn spawn_projectile(&mut self, projectile: Projectile) -> ProjectileId {
        let id = ProjectileId::new(self.next_projectile_id);
        self.next_projectile_id += 1;
        self.projectiles.insert(id, projectile);
        id
    }

    /// Projectiles in ascending id order.
    pub fn projectiles(&self) -> impl Iterator<Item = (ProjectileId, &Projectile)> + '_ {
        self.projectiles.iter().map(|(id, p)| (*id, p))
    }

    /// Projectile ids in ascending order.
    #[must_use]
    pub fn projectile_ids(&self) -> Vec<ProjectileId> {
        self.projectiles.keys().copied().collect()
    }

    /// Projectile by id.
    #[must_use]
    pub fn projectile(&self, id: ProjectileId) -> Option<&Projectile> {
        self.projectiles.get(&id)
    }

    /// Replaces a projectile's state.
    pub fn store_projectile(&mut self, id: ProjectileId, projectile: Projectile) {
        self.projectiles.insert(id, projectile);
    }

    /// Removes a projectile.
    pub fn remove_projectile(&mut self, id: ProjectileId) -> Option<Projectile> {
        self.projectiles.remove(&id)
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
