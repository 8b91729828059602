//! Presentation events.
//!
//! The core reports what happened (casts, hits, heals, deaths) as
//! fire-and-forget [`CombatEvent`]s. Animation, audio and UI layers subscribe
//! through a [`PresentationSink`]; the core never waits on them.
//!
//! [`EventLog`] is the built-in sink. It records tick-stamped envelopes that
//! the host drains with [`EventLog::take_events`].

use serde::{Deserialize, Serialize};

use crate::actor::ActorId;
use crate::pool::ResourceKind;
use crate::projectile::ProjectileId;
use crate::resolver::DamageOutcome;

/// Something the presentation layer may want to render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// A cast began, or resumed after a stun.
    CastStarted {
        /// Caster.
        actor: ActorId,
        /// Skill name.
        skill: String,
        /// Corrected cast target.
        target: Option<ActorId>,
        /// An interrupted cast was picked up again.
        resumed: bool,
    },
    /// A cast completed and its effect was applied.
    CastFinished {
        /// Caster.
        actor: ActorId,
        /// Skill name.
        skill: String,
    },
    /// A cast in flight was aborted.
    CastCancelled {
        /// Caster.
        actor: ActorId,
        /// Skill name.
        skill: String,
    },
    /// A damage resolution, including blocked and ignored hits.
    Damaged {
        /// Source.
        attacker: ActorId,
        /// Victim.
        defender: ActorId,
        /// Health removed.
        amount: u32,
        /// Roll result.
        outcome: DamageOutcome,
    },
    /// Health or mana restored by a skill.
    Healed {
        /// Source.
        caster: ActorId,
        /// Recipient.
        target: ActorId,
        /// Which pool.
        resource: ResourceKind,
        /// Amount added.
        amount: u32,
        /// The heal was a critical.
        critical: bool,
    },
    /// Resources moved from one actor to another.
    Drained {
        /// Who received the resources.
        receiver: ActorId,
        /// Who lost them.
        target: ActorId,
        /// Mana moved.
        mana: u32,
        /// Health moved.
        health: u32,
    },
    /// A stun landed or was extended.
    Stunned {
        /// Victim.
        actor: ActorId,
        /// Simulation time the stun ends.
        until: f64,
    },
    /// An actor picked a new target.
    Aggro {
        /// Actor that changed target.
        actor: ActorId,
        /// New target.
        target: ActorId,
    },
    /// A buff was added or refreshed.
    BuffApplied {
        /// Recipient.
        actor: ActorId,
        /// Source skill name.
        source: String,
        /// Duration in seconds.
        duration: f32,
    },
    /// A buff ran out.
    BuffExpired {
        /// Holder.
        actor: ActorId,
        /// Source skill name.
        source: String,
    },
    /// Health reached zero.
    Died {
        /// Victim.
        actor: ActorId,
    },
    /// A corpse finished decaying; the host may despawn it.
    DecayElapsed {
        /// Corpse.
        actor: ActorId,
    },
    /// A corpse was raised as a minion.
    Resurrected {
        /// Raised actor.
        actor: ActorId,
        /// Resurrector and new owner.
        by: ActorId,
    },
    /// A minion was moved next to its owner instantly.
    Teleported {
        /// Minion.
        actor: ActorId,
    },
    /// An idle mob made a noise.
    AmbientSound {
        /// Mob.
        actor: ActorId,
    },
    /// A projectile left its caster.
    ProjectileLaunched {
        /// Projectile.
        projectile: ProjectileId,
        /// Caster.
        source: ActorId,
        /// Homing target.
        target: Option<ActorId>,
    },
    /// A projectile struck an actor.
    ProjectileHit {
        /// Projectile.
        projectile: ProjectileId,
        /// Actor hit.
        target: ActorId,
    },
    /// A projectile ran out of time or lost its target.
    ProjectileExpired {
        /// Projectile.
        projectile: ProjectileId,
    },
    /// An actor's level changed.
    LevelChanged {
        /// Actor.
        actor: ActorId,
        /// New level.
        level: u32,
    },
}

/// A recorded event with its time of occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Tick during which the event happened.
    pub tick: u64,
    /// Simulation time in seconds.
    pub time: f64,
    /// The event.
    pub event: CombatEvent,
}

/// Receiver of presentation events.
pub trait PresentationSink {
    /// Called once per event, in the order events happen.
    fn notify(&mut self, tick: u64, time: f64, event: CombatEvent);
}

/// In-memory event recorder.
///
/// # Example
///
/// ```
/// use skirmish_core::actor::ActorId;
/// use skirmish_core::presentation::{CombatEvent, EventLog, PresentationSink};
///
/// let mut log = EventLog::new();
/// log.notify(3, 0.15, CombatEvent::Died { actor: ActorId::new(1) });
///
/// let events = log.take_events();
/// assert_eq!(events.len(), 1);
/// assert_eq!(events[0].tick, 3);
/// assert!(log.is_empty());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<EventEnvelope>,
}

impl EventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded events, oldest first.
    #[must_use]
    pub fn events(&self) -> &[EventEnvelope] {
        &self.events
    }

    /// Drains and returns all recorded events.
    pub fn take_events(&mut self) -> Vec<EventEnvelope> {
        std::mem::take(&mut self.events)
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterates events matching a predicate.
    pub fn filter<'a, F>(&'a self, mut predicate: F) -> impl Iterator<Item = &'a CombatEvent> + 'a
    where
        F: FnMut(&CombatEvent) -> bool + 'a,
    {
        self.events
            .iter()
            .map(|e| &e.event)
            .filter(move |e| predicate(*e))
    }
}

impl PresentationSink for EventLog {
    fn notify(&mut self, tick: u64, time: f64, event: CombatEvent) {
        tracing::trace!(tick, ?event, "combat event");
        self.events.push(EventEnvelope { tick, time, event });
    }
}
