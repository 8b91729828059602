//! Enemy brain: guards its home, chases and fights what it aggroed.

use rand::RngCore;

use crate::actor::{Actor, ActorKind};
use crate::config::EnemyBrainConfig;
use crate::world_view::WorldView;

use super::mob::{self, MobTuning};
use super::{Brain, Effect, EventFacts, State, TargetStatus, Transition};

/// State machine for [`ActorKind::Enemy`].
#[derive(Debug, Clone, Default)]
pub struct EnemyBrain {
    config: EnemyBrainConfig,
}

impl EnemyBrain {
    /// Brain with the given tunables.
    #[must_use]
    pub const fn new(config: EnemyBrainConfig) -> Self {
        Self { config }
    }

    fn tuning(&self) -> MobTuning {
        MobTuning {
            move_probability: self.config.move_probability,
            wander_distance: self.config.move_distance,
            follow_distance: self.config.follow_distance,
            range_ratio: self.config.attack_to_move_range_ratio,
            min_ambient_sound_delay: self.config.min_ambient_sound_delay,
        }
    }

    fn give_up(facts: &EventFacts) -> Transition {
        Transition::with(
            State::Moving,
            vec![
                Effect::ClearTarget,
                Effect::CancelCast { force: false },
                Effect::Navigate {
                    destination: facts.anchor,
                    stopping_distance: 0.0,
                },
            ],
        )
    }

    fn idle(actor: &Actor, facts: &EventFacts) -> Transition {
        if facts.died {
            return Transition::to(State::Dead);
        }
        if facts.stunned {
            return Transition::with(State::Stunned, vec![Effect::ResetMovement]);
        }
        if facts.target == TargetStatus::Dead {
            return Transition::with(
                State::Idle,
                vec![Effect::ClearTarget, Effect::CancelCast { force: false }],
            );
        }
        if facts.too_far_to_follow {
            return Self::give_up(facts);
        }
        if let Some(chase) = facts.chase {
            return Transition::with(
                State::Moving,
                vec![Effect::Navigate {
                    destination: chase.destination,
                    stopping_distance: chase.stopping_distance,
                }],
            );
        }
        if let Some(check) = &facts.cast_check {
            return match check {
                Ok(plan) => mob::start_cast(plan),
                Err(reason) => {
                    tracing::debug!(actor = %actor.id(), %reason, "cast refused");
                    Transition::with(State::Idle, vec![Effect::ClearSkillRequest])
                }
            };
        }
        if facts.target == TargetStatus::Alive {
            return Transition::with(State::Idle, mob::select_skill(actor, facts));
        }
        if let Some(destination) = facts.wander {
            return Transition::with(
                State::Moving,
                vec![Effect::Navigate {
                    destination,
                    stopping_distance: 0.0,
                }],
            );
        }
        mob::ambient(facts, State::Idle)
    }

    fn moving(actor: &Actor, facts: &EventFacts) -> Transition {
        if facts.died {
            return Transition::with(State::Dead, vec![Effect::ResetMovement]);
        }
        if facts.stunned {
            return Transition::with(State::Stunned, vec![Effect::ResetMovement]);
        }
        if facts.move_end {
            return Transition::to(State::Idle);
        }
        if facts.target == TargetStatus::Dead {
            return Transition::with(
                State::Idle,
                vec![
                    Effect::ClearTarget,
                    Effect::CancelCast { force: false },
                    Effect::ResetMovement,
                ],
            );
        }
        if facts.too_far_to_follow {
            return Self::give_up(facts);
        }
        if let Some(chase) = facts.chase {
            return Transition::with(
                State::Moving,
                vec![Effect::Navigate {
                    destination: chase.destination,
                    stopping_distance: chase.stopping_distance,
                }],
            );
        }
        if facts.target == TargetStatus::Alive {
            let mut effects = mob::select_skill(actor, facts);
            effects.push(Effect::ResetMovement);
            return Transition::with(State::Idle, effects);
        }
        mob::ambient(facts, State::Moving)
    }
}

impl Brain for EnemyBrain {
    fn kind(&self) -> ActorKind {
        ActorKind::Enemy
    }

    fn observe(&self, view: &WorldView<'_>, actor: &Actor, rng: &mut dyn RngCore) -> EventFacts {
        let home = actor.as_mob().map_or(actor.position(), |m| m.home);
        mob::observe(view, actor, home, self.tuning(), rng)
    }

    fn decide(&self, _view: &WorldView<'_>, actor: &Actor, facts: &EventFacts) -> Transition {
        match facts.state {
            State::Idle => Self::idle(actor, facts),
            State::Moving => Self::moving(actor, facts),
            State::Casting => mob::casting(actor, facts),
            State::Stunned => mob::stunned(facts),
            State::Dead => Transition::to(State::Dead),
        }
    }
}
