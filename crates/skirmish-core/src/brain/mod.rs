//! Brain module: per-kind state machines that drive actors.
//!
//! A brain runs in two read-only steps each tick:
//!
//! 1. [`Brain::observe`] gathers [`EventFacts`] about its actor from a
//!    [`WorldView`]. This is the only step allowed to draw random numbers.
//! 2. [`Brain::decide`] evaluates the current state's events in a fixed
//!    priority order and returns a [`Transition`]: the next [`State`] plus
//!    the [`Effect`]s to apply, in order.
//!
//! Neither step mutates anything, so all actors plan in parallel against the
//! same snapshot. The resolvers apply the transitions afterwards, one actor at
//! a time in id order.
//!
//! # Brains
//!
//! - [`EnemyBrain`]: wanders around home, chases and casts at its target
//! - [`MinionBrain`]: an enemy that stays close to its owner
//! - [`PlayerBrain`]: follows host commands (skill requests, cancels)
//!
//! # Example
//!
//! ```
//! use skirmish_core::actor::ActorKind;
//! use skirmish_core::brain::{BrainRegistry, State};
//! use skirmish_core::config::SimulationConfig;
//!
//! let registry = BrainRegistry::from_config(&SimulationConfig::default());
//! assert_eq!(registry.len(), 3);
//! assert_eq!(registry.brain_for(ActorKind::Minion).unwrap().kind(), ActorKind::Minion);
//! assert_eq!(State::default(), State::Idle);
//! ```

mod enemy;
mod minion;
mod mob;
mod player;

pub use enemy::EnemyBrain;
pub use minion::MinionBrain;
pub use player::PlayerBrain;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use glam::Vec2;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::actor::{Actor, ActorId, ActorKind};
use crate::config::SimulationConfig;
use crate::error::CastRejection;
use crate::skill::cast::CastPlan;
use crate::skill::SkillFlags;
use crate::world_view::WorldView;

// =============================================================================
// State
// =============================================================================

/// Brain state of an actor.
#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum State {
    /// Waiting for something to do.
    #[default]
    Idle,
    /// Following a route.
    Moving,
    /// A cast is in flight.
    Casting,
    /// Stunned; ignores everything but death.
    Stunned,
    /// Health is empty.
    Dead,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "IDLE"),
            Self::Moving => write!(f, "MOVING"),
            Self::Casting => write!(f, "CASTING"),
            Self::Stunned => write!(f, "STUNNED"),
            Self::Dead => write!(f, "DEAD"),
        }
    }
}

// =============================================================================
// Facts
// =============================================================================

/// What an actor's target looks like this tick.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum TargetStatus {
    /// No target.
    #[default]
    None,
    /// Target present and alive.
    Alive,
    /// Target present but dead.
    Dead,
    /// Target id no longer in the arena.
    Missing,
}

impl TargetStatus {
    /// True when there is nothing left to fight: no target, a missing one or
    /// a dead one.
    #[must_use]
    pub const fn is_lost(self) -> bool {
        !matches!(self, Self::Alive)
    }
}

/// Where to walk to get in range of the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chase {
    /// Target's closest point.
    pub destination: Vec2,
    /// Stop this far short of the destination.
    pub stopping_distance: f32,
}

/// Everything a brain observed about its actor in one tick.
///
/// Kind-specific fields keep their defaults for brains that do not use them.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EventFacts {
    /// State the facts were gathered in.
    pub state: State,
    /// Health is empty.
    pub died: bool,
    /// Stun still running.
    pub stunned: bool,
    /// Target status.
    pub target: TargetStatus,
    /// A route started while not in `Moving`.
    pub move_start: bool,
    /// In `Moving` but the route is gone.
    pub move_end: bool,
    /// Selected skill, if any.
    pub skill: Option<usize>,
    /// The selected skill has a cast in flight.
    pub casting: bool,
    /// The cast in flight has run its full time.
    pub skill_finished: bool,
    /// The selected skill aborts when its target is lost.
    pub cancel_on_target_loss: bool,
    /// The selection may be cancelled without force.
    pub can_cancel: bool,
    /// Cast pipeline result for the selected skill.
    pub cast_check: Option<Result<CastPlan, CastRejection>>,

    /// The target is out of range of the selected skill.
    pub chase: Option<Chase>,
    /// The target wandered too far from the anchor.
    pub too_far_to_follow: bool,
    /// Home for enemies, the spot behind the owner for minions.
    pub anchor: Vec2,
    /// Skill to select when aggroed.
    pub next_skill: Option<usize>,
    /// The actor has any skill at all.
    pub has_skills: bool,
    /// Rolled wander destination.
    pub wander: Option<Vec2>,
    /// Rolled ambient sound.
    pub ambient_sound: bool,

    /// Owner dead or gone.
    pub owner_disappeared: bool,
    /// Too far from the owner to walk.
    pub need_teleport: bool,
    /// Idle and too far from the owner.
    pub need_return: bool,

    /// The host asked to cancel the current action.
    pub cancel_requested: bool,
}

impl EventFacts {
    /// Facts every brain shares: life, stun, target, movement edges and the
    /// selected skill's cast status.
    #[must_use]
    pub fn common(view: &WorldView<'_>, actor: &Actor) -> Self {
        let id = actor.id();
        let moving = view.is_moving(id);
        let target = match actor.target {
            None => TargetStatus::None,
            Some(t) => match view.get(t) {
                None => TargetStatus::Missing,
                Some(t) if t.is_alive() => TargetStatus::Alive,
                Some(_) => TargetStatus::Dead,
            },
        };
        let selected = actor.skills.current_skill();

        Self {
            state: actor.state,
            died: !actor.is_alive(),
            stunned: actor.is_stunned(view.time()),
            target,
            move_start: actor.state != State::Moving && moving,
            move_end: actor.state == State::Moving && !moving,
            skill: actor.skills.current(),
            casting: actor.skills.is_casting(),
            skill_finished: actor.skills.is_cast_finished(),
            cancel_on_target_loss: selected
                .is_some_and(|s| s.template.has(SkillFlags::CANCEL_CAST_IF_TARGET_DIED)),
            can_cancel: actor.skills.can_cancel_current(),
            ..Self::default()
        }
    }
}

// =============================================================================
// Transition
// =============================================================================

/// One state change request, applied in order by the resolvers.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Drop any route.
    ResetMovement,
    /// Start a route.
    Navigate {
        /// Where to go.
        destination: Vec2,
        /// Stop this far short.
        stopping_distance: f32,
    },
    /// Relocate instantly.
    Warp {
        /// Where to appear.
        destination: Vec2,
    },
    /// Turn toward the cast target, or the target.
    LookAtTarget,
    /// Forget the target.
    ClearTarget,
    /// Forget the target if it died.
    ClearTargetIfDead,
    /// Drop the skill selection.
    ClearSkillRequest,
    /// Select a skill.
    SelectSkill(usize),
    /// Start or resume the selected cast.
    StartCast {
        /// Corrected target.
        target: Option<ActorId>,
    },
    /// Cancel the selection; `force` overrides the skill's cancel flag.
    CancelCast {
        /// Ignore `CAN_CANCEL_CAST`.
        force: bool,
    },
    /// Complete the cast and apply its effect.
    FinishCast,
    /// Record the finished skill for round-robin selection.
    RememberLastSkill(usize),
    /// Switch to the target buffered while casting.
    ApplyNextTarget,
    /// Select the skill buffered while casting.
    PromotePendingSkill,
    /// Clear the cancel request.
    AcknowledgeCancel,
    /// Empty health.
    DepleteHealth,
    /// Play an ambient sound.
    PlayAmbientSound,
}

/// Next state plus the effects that lead there.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// State after the effects ran.
    pub next: State,
    /// Effects in application order.
    pub effects: Vec<Effect>,
}

impl Transition {
    /// Transition without effects.
    #[must_use]
    pub const fn to(next: State) -> Self {
        Self {
            next,
            effects: Vec::new(),
        }
    }

    /// Transition with effects.
    #[must_use]
    pub fn with(next: State, effects: Vec<Effect>) -> Self {
        Self { next, effects }
    }

    /// Prepends effects, keeping their order.
    #[must_use]
    pub fn after(mut self, mut first: Vec<Effect>) -> Self {
        first.append(&mut self.effects);
        self.effects = first;
        self
    }
}

// =============================================================================
// Brain
// =============================================================================

/// A per-kind state machine.
///
/// # Thread Safety
///
/// Brains are shared across planning threads and must be `Send + Sync`.
/// All randomness comes through the `rng` argument of [`Brain::observe`],
/// which the simulation seeds per actor and tick.
pub trait Brain: Send + Sync {
    /// Kind this brain drives.
    fn kind(&self) -> ActorKind;

    /// Gathers the facts `decide` needs.
    fn observe(&self, view: &WorldView<'_>, actor: &Actor, rng: &mut dyn RngCore) -> EventFacts;

    /// Picks the transition for the observed facts.
    fn decide(&self, view: &WorldView<'_>, actor: &Actor, facts: &EventFacts) -> Transition;

    /// Observe then decide.
    fn plan(&self, view: &WorldView<'_>, actor: &Actor, rng: &mut dyn RngCore) -> Transition {
        let facts = self.observe(view, actor, rng);
        self.decide(view, actor, &facts)
    }
}

/// Brains by actor kind.
#[derive(Default, Clone)]
pub struct BrainRegistry {
    brains: BTreeMap<ActorKind, Arc<dyn Brain>>,
}

impl fmt::Debug for BrainRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrainRegistry")
            .field("kinds", &self.brains.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl BrainRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The three stock brains configured from `config`.
    #[must_use]
    pub fn from_config(config: &SimulationConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(EnemyBrain::new(config.enemy)));
        registry.register(Arc::new(MinionBrain::new(config.minion)));
        registry.register(Arc::new(PlayerBrain::new(config.player)));
        registry
    }

    /// Registers `brain` for its kind, replacing any previous one.
    pub fn register(&mut self, brain: Arc<dyn Brain>) {
        self.brains.insert(brain.kind(), brain);
    }

    /// Brain for `kind`.
    #[must_use]
    pub fn brain_for(&self, kind: ActorKind) -> Option<&Arc<dyn Brain>> {
        self.brains.get(&kind)
    }

    /// Number of registered kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.brains.len()
    }

    /// Returns true if no brain is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.brains.is_empty()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::actor::ActorSpec;
    use crate::arena::Arena;
    use crate::movement::Movement;

    #[test]
    fn common_facts_track_target_and_movement() {
        let mut arena = Arena::new();
        let hero = arena.spawn(ActorSpec::player("hero", Vec2::ZERO));
        let wolf = arena.spawn(ActorSpec::enemy("wolf", Vec2::X * 3.0));
        arena.get_mut(hero).unwrap().target = Some(wolf);
        let mut bench = Bench::new(arena);
        bench.movement.navigate_to(hero, Vec2::Y * 5.0, 0.0);

        let view =
            WorldView::new(&bench.arena, &crate::terrain::OpenTerrain, &bench.movement, 0.05);
        let facts = EventFacts::common(&view, bench.arena.get(hero).unwrap());
        assert_eq!(facts.target, TargetStatus::Alive);
        assert!(facts.move_start);
        assert!(!facts.move_end);

        bench.arena.get_mut(wolf).unwrap().health.deplete();
        bench.arena.get_mut(hero).unwrap().state = State::Moving;
        bench.movement.reset(hero);
        let view =
            WorldView::new(&bench.arena, &crate::terrain::OpenTerrain, &bench.movement, 0.05);
        let facts = EventFacts::common(&view, bench.arena.get(hero).unwrap());
        assert_eq!(facts.target, TargetStatus::Dead);
        assert!(facts.target.is_lost());
        assert!(facts.move_end);
    }

    #[test]
    fn missing_target_is_distinguished() {
        let mut arena = Arena::new();
        let hero = arena.spawn(ActorSpec::player("hero", Vec2::ZERO));
        arena.get_mut(hero).unwrap().target = Some(ActorId::new(77));
        let bench = Bench::new(arena);
        let facts = bench.observe(&PlayerBrain::default(), hero, &mut always());
        assert_eq!(facts.target, TargetStatus::Missing);
    }

    #[test]
    fn transition_after_prepends() {
        let t = Transition::with(State::Idle, vec![Effect::FinishCast])
            .after(vec![Effect::LookAtTarget]);
        assert_eq!(t.effects, vec![Effect::LookAtTarget, Effect::FinishCast]);
    }

    #[test]
    fn state_display_is_upper_case() {
        assert_eq!(State::Casting.to_string(), "CASTING");
    }
}
