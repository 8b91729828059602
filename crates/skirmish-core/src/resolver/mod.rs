//! Resolver module: every mutation of combat state goes through here.
//!
//! Brains and the cast pipeline only read. Once a brain has chosen a
//! [`Transition`](crate::brain::Transition), the resolvers turn it into arena
//! changes and presentation events:
//!
//! - [`effects`]: applies transition effects in order (movement, cast
//!   lifecycle, target bookkeeping)
//! - [`apply`]: performs a finished skill's effect
//! - [`combat`]: damage, heal, drain and stun arithmetic
//! - [`death`]: the health-emptied edge
//! - [`projectiles`]: flight and hits of projectiles
//!
//! # Invariants
//!
//! - Resolvers run sequentially in ascending actor id order.
//! - All randomness comes from the RNG handed in by the caller, so a given
//!   seed always reproduces the same rolls.
//! - Actors are addressed by id and looked up on use; an actor that vanished
//!   turns the operation into a no-op.

pub mod apply;
pub mod combat;
pub mod death;
pub mod effects;
pub mod projectiles;

pub use apply::apply_skill;
pub use combat::{
    apply_stun, resolve_damage, resolve_drain, resolve_heal, resolve_mana_heal, DamageOutcome,
};
pub use death::on_death;
pub use effects::apply_transition;
pub use projectiles::resolve_projectiles;

use crate::arena::Arena;
use crate::config::CombatRules;
use crate::movement::Movement;
use crate::presentation::{CombatEvent, PresentationSink};
use crate::terrain::Terrain;

/// Mutable context shared by all resolvers.
///
/// Built by the simulation from its own disjoint fields for the duration of
/// one phase.
pub struct Resolution<'a> {
    /// Arena being mutated.
    pub arena: &'a mut Arena,
    /// Reachability queries.
    pub terrain: &'a dyn Terrain,
    /// Movement provider.
    pub movement: &'a mut dyn Movement,
    /// Event receiver.
    pub sink: &'a mut dyn PresentationSink,
    /// Tunable combat constants.
    pub rules: &'a CombatRules,
}

impl Resolution<'_> {
    /// Sends an event stamped with the arena's current tick and time.
    pub fn notify(&mut self, event: CombatEvent) {
        let tick = self.arena.current_tick();
        let time = self.arena.time();
        self.sink.notify(tick, time, event);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::movement::SteeringMovement;
    use crate::presentation::EventLog;
    use crate::terrain::OpenTerrain;

    /// Owned pieces of a [`Resolution`] for resolver tests.
    pub struct Harness {
        pub arena: Arena,
        pub movement: SteeringMovement,
        pub log: EventLog,
        pub rules: CombatRules,
    }

    impl Harness {
        pub fn new(arena: Arena) -> Self {
            Self {
                arena,
                movement: SteeringMovement::new(),
                log: EventLog::new(),
                rules: CombatRules::default(),
            }
        }

        pub fn run<R>(&mut self, f: impl FnOnce(&mut Resolution<'_>) -> R) -> R {
            let mut res = Resolution {
                arena: &mut self.arena,
                terrain: &OpenTerrain,
                movement: &mut self.movement,
                sink: &mut self.log,
                rules: &self.rules,
            };
            f(&mut res)
        }
    }
}
