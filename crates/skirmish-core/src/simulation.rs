//! Simulation module with the 5-phase tick loop.
//!
//! The `Simulation` struct owns the arena, the brains and the collaborators
//! and advances them one fixed tick at a time:
//!
//! 1. **AGGRO**: mobs notice attackable actors inside their aggro radius
//! 2. **PLAN**: every brain observes and decides in parallel against a frozen
//!    [`WorldView`], producing one [`Transition`] per actor
//! 3. **APPLY**: transitions are applied sequentially in actor id order
//! 4. **TIMERS**: skills, buffs, regeneration, lifetimes, corpses,
//!    projectiles and movement advance by one tick
//! 5. **ADVANCE**: tick counter and clock move forward
//!
//! # Determinism
//!
//! - Brains plan in parallel, but their transitions are sorted by actor id
//!   before anything is applied
//! - Actors are iterated in id order (via `BTreeMap`)
//! - Each actor draws from its own RNG seeded from (seed, tick, actor), so
//!   results never depend on thread scheduling
//!
//! # Example
//!
//! ```
//! use skirmish_core::actor::ActorSpec;
//! use skirmish_core::config::SimulationConfig;
//! use skirmish_core::simulation::Simulation;
//! use glam::Vec2;
//!
//! let mut sim = Simulation::new(SimulationConfig::with_seed(42));
//! let hero = sim.spawn(ActorSpec::player("hero", Vec2::ZERO));
//! sim.spawn(ActorSpec::enemy("wolf", Vec2::new(30.0, 0.0)));
//!
//! for _ in 0..10 {
//!     sim.step();
//! }
//!
//! assert_eq!(sim.tick(), 10);
//! assert!(sim.arena().get(hero).unwrap().is_alive());
//! ```

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::actor::{Actor, ActorId, ActorKind, ActorSpec};
use crate::aggro;
use crate::arena::Arena;
use crate::brain::{BrainRegistry, State, Transition};
use crate::config::SimulationConfig;
use crate::error::{SimError, SkillRequestError};
use crate::movement::{Movement, SteeringMovement};
use crate::presentation::{CombatEvent, EventEnvelope, EventLog, PresentationSink};
use crate::resolver::{self, Resolution};
use crate::skill::count_down;
use crate::terrain::{OpenTerrain, Terrain};
use crate::world_view::WorldView;

/// RNG stream used by brains while planning.
const PLAN_STREAM: u64 = 0;
/// RNG stream used for combat rolls while applying.
const APPLY_STREAM: u64 = 1;
/// RNG stream for world-level rolls (projectile hits).
const WORLD_STREAM: u64 = 2;

// =============================================================================
// Simulation
// =============================================================================

/// The main simulation orchestrator.
///
/// `Simulation` manages:
/// - The arena (actors, projectiles, factions, clock)
/// - The brain registry mapping actor kinds to state machines
/// - The movement and terrain collaborators
/// - The event log that receives every presentation event
///
/// # Determinism
///
/// Given the same config (seed included), spawns and host commands, the
/// simulation produces identical arenas and event logs across runs.
pub struct Simulation {
    config: SimulationConfig,
    arena: Arena,
    brains: BrainRegistry,
    terrain: Box<dyn Terrain>,
    movement: Box<dyn Movement>,
    log: EventLog,
    /// Seconds accumulated toward the next regeneration step.
    regen_elapsed: f32,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("arena", &self.arena)
            .field("brains", &self.brains)
            .field("events", &self.log.len())
            .field("seed", &self.config.seed)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Creates a simulation with open terrain and straight-line steering.
    ///
    /// The stock brains are configured from `config`, and its extra hostile
    /// faction pairs are applied on top of players versus monsters.
    ///
    /// # Example
    ///
    /// ```
    /// use skirmish_core::config::SimulationConfig;
    /// use skirmish_core::simulation::Simulation;
    ///
    /// let sim = Simulation::new(SimulationConfig::with_seed(12345));
    /// assert_eq!(sim.tick(), 0);
    /// assert_eq!(sim.seed(), 12345);
    /// ```
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        let mut arena = Arena::new();
        for (a, b) in config.hostile_pairs() {
            arena.factions_mut().set_hostile(a, b, true);
        }
        Self {
            brains: BrainRegistry::from_config(&config),
            arena,
            terrain: Box::new(OpenTerrain),
            movement: Box::new(SteeringMovement::new()),
            log: EventLog::new(),
            regen_elapsed: 0.0,
            config,
        }
    }

    /// Replaces the terrain collaborator.
    #[must_use]
    pub fn with_terrain(mut self, terrain: Box<dyn Terrain>) -> Self {
        self.terrain = terrain;
        self
    }

    /// Replaces the movement collaborator.
    #[must_use]
    pub fn with_movement(mut self, movement: Box<dyn Movement>) -> Self {
        self.movement = movement;
        self
    }

    /// Executes one simulation tick.
    ///
    /// # Execution Phases
    ///
    /// 1. **AGGRO**: a sequential proximity scan lets living mobs pick up or
    ///    switch targets.
    ///
    /// 2. **PLAN**: every actor with a registered brain observes and decides
    ///    in parallel. Brains only read, through a [`WorldView`].
    ///
    /// 3. **APPLY**: transitions run in ascending actor id order. When an
    ///    actor's life flipped earlier in this pass (killed, or raised from
    ///    its corpse), its stale plan is dropped unless it leads to `Dead`;
    ///    the actor plans again next tick.
    ///
    /// 4. **TIMERS**: skill and buff timers, regeneration, minion lifetime,
    ///    corpse decay, projectiles, then movement and the collider index.
    ///
    /// 5. **ADVANCE**: tick and time move forward by `tick_seconds`.
    pub fn step(&mut self) {
        let tick = self.arena.current_tick();
        let dt = self.config.tick_seconds;
        let seed = self.config.seed;

        // PHASE 1: AGGRO
        aggro::scan(&mut self.resolution());

        // PHASE 2: PLAN
        let plans = self.plan_parallel(tick, dt);

        // PHASE 3: APPLY
        let regen_interval = self.regen_due(dt);
        let mut res = self.resolution();
        for (id, was_alive, transition) in &plans {
            let now_alive = res.arena.get(*id).is_some_and(Actor::is_alive);
            if *was_alive != now_alive && !(!now_alive && transition.next == State::Dead) {
                tracing::trace!(tick, actor = %id, next = %transition.next, "stale plan dropped");
                continue;
            }
            let mut rng = derive_rng(seed, tick, id.as_u64(), APPLY_STREAM);
            resolver::apply_transition(&mut res, &mut rng, *id, transition);
        }

        // PHASE 4: TIMERS
        let mut rng = derive_rng(seed, tick, u64::MAX, WORLD_STREAM);
        advance_timers(&mut res, &mut rng, dt, regen_interval);

        // PHASE 5: ADVANCE
        res.arena.advance(dt);
    }

    /// Plans every actor in parallel and returns the transitions sorted by
    /// actor id, each with the actor's aliveness at planning time.
    fn plan_parallel(&self, tick: u64, dt: f32) -> Vec<(ActorId, bool, Transition)> {
        let view = WorldView::new(&self.arena, self.terrain.as_ref(), self.movement.as_ref(), dt);
        let brains = &self.brains;
        let seed = self.config.seed;
        let ids: Vec<ActorId> = self.arena.actor_ids_sorted().collect();

        let mut plans: Vec<(ActorId, bool, Transition)> = ids
            .par_iter()
            .filter_map(|id| {
                let actor = view.get(*id)?;
                let brain = brains.brain_for(actor.kind())?;
                let mut rng = derive_rng(seed, tick, id.as_u64(), PLAN_STREAM);
                let transition = brain.plan(&view, actor, &mut rng);
                Some((*id, actor.is_alive(), transition))
            })
            .collect();

        // CRITICAL: Sort for determinism
        plans.sort_by_key(|(id, _, _)| *id);
        plans
    }

    /// Accumulates `dt` and returns the interval when regeneration is due.
    fn regen_due(&mut self, dt: f32) -> Option<f32> {
        let interval = self.config.regen_interval;
        self.regen_elapsed += dt;
        // half a tick of slack absorbs float drift in the accumulator
        if self.regen_elapsed + dt * 0.5 >= interval {
            self.regen_elapsed = (self.regen_elapsed - interval).max(0.0);
            Some(interval)
        } else {
            None
        }
    }

    /// Borrows the simulation's parts as a resolver context.
    fn resolution(&mut self) -> Resolution<'_> {
        Resolution {
            arena: &mut self.arena,
            terrain: self.terrain.as_ref(),
            movement: self.movement.as_mut(),
            sink: &mut self.log,
            rules: &self.config.combat,
        }
    }

    // -------------------------------------------------------------------------
    // Host commands
    // -------------------------------------------------------------------------

    /// Spawns an actor. A minion joins its owner's faction.
    pub fn spawn(&mut self, spec: ActorSpec) -> ActorId {
        let id = self.arena.spawn(spec);
        tracing::debug!(actor = %id, "spawned");
        id
    }

    /// Removes an actor and its movement state, typically after
    /// [`CombatEvent::DecayElapsed`].
    pub fn despawn(&mut self, id: ActorId) -> Option<Actor> {
        self.movement.remove(id);
        self.arena.despawn(id)
    }

    fn player_mut(&mut self, id: ActorId) -> Result<&mut Actor, SimError> {
        let actor = self.arena.get_mut(id).ok_or(SimError::UnknownActor(id))?;
        if actor.is_player() {
            Ok(actor)
        } else {
            Err(SimError::WrongKind {
                actor: id,
                expected: ActorKind::Player,
                found: actor.kind(),
            })
        }
    }

    /// Points a player at `target`, or clears its target.
    ///
    /// While the player is casting the choice is buffered and applied once
    /// the cast concludes.
    ///
    /// # Errors
    ///
    /// [`SimError::UnknownActor`] if either actor is missing,
    /// [`SimError::WrongKind`] if `id` is not a player.
    pub fn select_target(&mut self, id: ActorId, target: Option<ActorId>) -> Result<(), SimError> {
        if let Some(target) = target {
            if self.arena.get(target).is_none() {
                return Err(SimError::UnknownActor(target));
            }
        }
        let actor = self.player_mut(id)?;
        let casting = actor.state == State::Casting;
        if let Some(player) = actor.as_player_mut() {
            if casting {
                player.next_target = target;
                tracing::debug!(actor = %id, ?target, "target buffered");
                return Ok(());
            }
            player.next_target = None;
        }
        actor.target = target;
        Ok(())
    }

    /// Asks a player to use skill `index`.
    ///
    /// While a cast is in flight the request is buffered and promoted when
    /// the cast concludes.
    ///
    /// # Errors
    ///
    /// [`SkillRequestError::InvalidState`] while stunned or dead, any other
    /// [`SkillRequestError`] from validation, or a lookup error.
    pub fn request_skill(&mut self, id: ActorId, index: usize) -> Result<(), SimError> {
        let actor = self.player_mut(id)?;
        match actor.state {
            State::Dead | State::Stunned => {
                return Err(SkillRequestError::InvalidState { state: actor.state }.into());
            }
            State::Casting => {
                actor.skills.validate_request(index)?;
                if let Some(player) = actor.as_player_mut() {
                    player.pending_skill = Some(index);
                }
                tracing::debug!(actor = %id, index, "skill request buffered");
            }
            State::Idle | State::Moving => {
                actor.skills.request(index)?;
                tracing::debug!(actor = %id, index, "skill requested");
            }
        }
        Ok(())
    }

    /// Asks a player to cancel its current action. Consumed by the brain.
    ///
    /// # Errors
    ///
    /// A lookup error if `id` is missing or not a player.
    pub fn request_cancel(&mut self, id: ActorId) -> Result<(), SimError> {
        if let Some(player) = self.player_mut(id)?.as_player_mut() {
            player.cancel_action_requested = true;
        }
        Ok(())
    }

    /// Raises skill `index` of any actor by one level. Returns the new level.
    ///
    /// # Errors
    ///
    /// [`SimError::UnknownActor`], or [`SkillRequestError::InvalidIndex`] /
    /// [`SkillRequestError::UpgradeRefused`] from the skill set.
    pub fn upgrade_skill(&mut self, id: ActorId, index: usize) -> Result<u32, SimError> {
        let actor = self.arena.get_mut(id).ok_or(SimError::UnknownActor(id))?;
        let level = actor.skills.upgrade(index, actor.level.current())?;
        if actor.refresh_maxima() {
            resolver::on_death(&mut self.resolution(), id);
        }
        tracing::debug!(actor = %id, index, level, "skill upgraded");
        Ok(level)
    }

    /// Sets an actor's level, auto-upgrading skills that qualify.
    ///
    /// Returns the clamped level.
    ///
    /// # Errors
    ///
    /// [`SimError::UnknownActor`] if `id` is missing.
    pub fn set_level(&mut self, id: ActorId, level: u32) -> Result<u32, SimError> {
        let actor = self.arena.get_mut(id).ok_or(SimError::UnknownActor(id))?;
        actor.level.set(level);
        let level = actor.level.current();
        let upgraded = actor.skills.auto_upgrade(level);
        let emptied = actor.refresh_maxima();
        tracing::debug!(actor = %id, level, ?upgraded, "level changed");

        let (tick, time) = (self.arena.current_tick(), self.arena.time());
        self.log.notify(tick, time, CombatEvent::LevelChanged { actor: id, level });
        if emptied {
            resolver::on_death(&mut self.resolution(), id);
        }
        Ok(level)
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Returns a read-only reference to the arena.
    #[must_use]
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Returns a mutable reference to the arena.
    ///
    /// Use this for setup between steps. Prefer the host commands above for
    /// anything a brain reacts to.
    #[must_use]
    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    /// Current tick; starts at 0 and increments after each `step()`.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.arena.current_tick()
    }

    /// Simulation time in seconds.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.arena.time()
    }

    /// Master seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.config.seed
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Registered brains.
    #[must_use]
    pub fn brains(&self) -> &BrainRegistry {
        &self.brains
    }

    /// Mutable brain registry, for replacing a stock brain.
    #[must_use]
    pub fn brains_mut(&mut self) -> &mut BrainRegistry {
        &mut self.brains
    }

    /// Movement collaborator.
    #[must_use]
    pub fn movement(&self) -> &dyn Movement {
        self.movement.as_ref()
    }

    /// Mutable movement collaborator, for host-driven navigation.
    #[must_use]
    pub fn movement_mut(&mut self) -> &mut dyn Movement {
        self.movement.as_mut()
    }

    /// Terrain collaborator.
    #[must_use]
    pub fn terrain(&self) -> &dyn Terrain {
        self.terrain.as_ref()
    }

    /// Events recorded since the last [`Simulation::take_events`].
    #[must_use]
    pub fn events(&self) -> &[EventEnvelope] {
        self.log.events()
    }

    /// Drains the recorded events.
    pub fn take_events(&mut self) -> Vec<EventEnvelope> {
        self.log.take_events()
    }
}

/// Derives a per-actor RNG from (seed, tick, actor, stream).
fn derive_rng(seed: u64, tick: u64, actor: u64, stream: u64) -> ChaCha8Rng {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    tick.hash(&mut hasher);
    actor.hash(&mut hasher);
    stream.hash(&mut hasher);
    ChaCha8Rng::seed_from_u64(hasher.finish())
}

// =============================================================================
// Timers
// =============================================================================

fn advance_timers(
    res: &mut Resolution<'_>,
    rng: &mut ChaCha8Rng,
    dt: f32,
    regen_interval: Option<f32>,
) {
    let ids: Vec<ActorId> = res.arena.actor_ids_sorted().collect();
    for id in &ids {
        tick_actor(res, *id, dt, regen_interval);
    }

    resolver::resolve_projectiles(res, rng, dt);

    for id in &ids {
        let Some(actor) = res.arena.get_mut(*id) else {
            continue;
        };
        if actor.is_alive() && actor.is_movement_allowed() {
            let speed = actor.effective_speed();
            res.movement.advance(*id, &mut actor.transform, speed, dt);
        } else if !actor.is_alive() || matches!(actor.state, State::Stunned | State::Dead) {
            // routes handed over while incapacitated are dropped, casters keep theirs
            res.movement.reset(*id);
        }
    }
    res.arena.sync_spatial();
}

/// One actor's countdowns: skills and buffs, regeneration, minion lifetime
/// and corpse decay.
fn tick_actor(res: &mut Resolution<'_>, id: ActorId, dt: f32, regen_interval: Option<f32>) {
    let Some(actor) = res.arena.get_mut(id) else {
        return;
    };
    let mut emptied = false;

    let expired = actor.skills.tick(dt);
    if !expired.is_empty() {
        emptied |= actor.refresh_maxima();
    }

    let alive = actor.is_alive();
    if let Some(interval) = regen_interval {
        let bonuses = actor.bonuses();
        let amount = actor.health.recovery_amount(bonuses.health_percent_per_second, interval);
        emptied |= actor.health.recover(amount, alive).emptied;
        let amount = actor.mana.recovery_amount(bonuses.mana_percent_per_second, interval);
        actor.mana.recover(amount, alive);
    }

    if alive {
        let lifetime_over = actor
            .as_minion_mut()
            .and_then(|m| m.lifetime_remaining.as_mut())
            .is_some_and(|left| {
                *left = count_down(*left, dt);
                *left <= 0.0
            });
        if lifetime_over {
            tracing::debug!(actor = %id, "minion lifetime elapsed");
            emptied |= actor.health.deplete().emptied;
        }
    }

    let mut decayed = false;
    if !alive && !actor.decayed {
        if let Some(left) = actor.decay_remaining.as_mut() {
            *left = count_down(*left, dt);
            if *left <= 0.0 {
                actor.decay_remaining = None;
                actor.decayed = true;
                decayed = true;
            }
        }
    }

    for source in expired {
        res.notify(CombatEvent::BuffExpired { actor: id, source });
    }
    if emptied {
        resolver::on_death(res, id);
    }
    if decayed {
        tracing::debug!(actor = %id, "corpse decayed");
        res.notify(CombatEvent::DecayElapsed { actor: id });
    }
}

// =============================================================================
// Tests
// =============================================================================
