//! Minion brain: an enemy brain on a leash around its owner.
//!
//! Distances are measured from an anchor point a little behind the owner.
//! Minions too far to walk back warp there, and a minion whose owner is gone
//! dies on the spot. A rolled ambient sound plays first in every state and
//! never pre-empts the rest of the table.

use glam::Vec2;
use rand::RngCore;

use crate::actor::{Actor, ActorKind};
use crate::config::MinionBrainConfig;
use crate::world_view::WorldView;

use super::mob::{self, MobTuning};
use super::{Brain, Effect, EventFacts, State, TargetStatus, Transition};

/// How far behind its owner a minion keeps station.
pub const ANCHOR_BEHIND_OWNER: f32 = 2.0;

/// State machine for [`ActorKind::Minion`].
#[derive(Debug, Clone, Default)]
pub struct MinionBrain {
    config: MinionBrainConfig,
}

impl MinionBrain {
    /// Brain with the given tunables.
    #[must_use]
    pub const fn new(config: MinionBrainConfig) -> Self {
        Self { config }
    }

    fn tuning(&self) -> MobTuning {
        MobTuning {
            move_probability: self.config.move_probability,
            wander_distance: self.config.wander_distance,
            follow_distance: self.config.follow_distance,
            range_ratio: self.config.attack_to_move_range_ratio,
            min_ambient_sound_delay: self.config.min_ambient_sound_delay,
        }
    }

    fn back_to_anchor(facts: &EventFacts) -> Transition {
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
        if facts.need_teleport {
            return Transition::with(
                State::Idle,
                vec![Effect::Warp {
                    destination: facts.anchor,
                }],
            );
        }
        if facts.need_return || facts.too_far_to_follow {
            return Self::back_to_anchor(facts);
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
                    Transition::with(
                        State::Idle,
                        vec![Effect::ClearTarget, Effect::ClearSkillRequest],
                    )
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
        Transition::to(State::Idle)
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
        if facts.need_teleport {
            return Transition::with(
                State::Idle,
                vec![Effect::Warp {
                    destination: facts.anchor,
                }],
            );
        }
        if facts.too_far_to_follow {
            return Self::back_to_anchor(facts);
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
        if facts.need_return {
            // keep walking back, but re-aim at the owner who may have moved
            return Transition::with(
                State::Moving,
                vec![
                    Effect::CancelCast { force: false },
                    Effect::Navigate {
                        destination: facts.anchor,
                        stopping_distance: 0.0,
                    },
                ],
            );
        }
        Transition::to(State::Moving)
    }

    fn stunned(facts: &EventFacts) -> Transition {
        if facts.died {
            Transition::with(State::Dead, vec![Effect::CancelCast { force: true }])
        } else {
            mob::stunned(facts)
        }
    }
}

/// Point behind `owner` the minion gravitates to.
#[must_use]
pub fn anchor_behind(owner: &Actor) -> Vec2 {
    owner.position() - owner.transform.forward() * ANCHOR_BEHIND_OWNER
}

impl Brain for MinionBrain {
    fn kind(&self) -> ActorKind {
        ActorKind::Minion
    }

    fn observe(&self, view: &WorldView<'_>, actor: &Actor, rng: &mut dyn RngCore) -> EventFacts {
        let owner = actor.owner().and_then(|o| view.get(o)).filter(|o| o.is_alive());
        let anchor = owner.map_or_else(
            || actor.as_mob().map_or(actor.position(), |m| m.home),
            anchor_behind,
        );

        let mut facts = mob::observe(view, actor, anchor, self.tuning(), rng);
        facts.owner_disappeared = owner.is_none();
        let distance = actor.position().distance(anchor);
        facts.need_teleport = owner.is_some() && distance > self.config.teleport_distance;
        facts.need_return =
            owner.is_some() && actor.target.is_none() && distance > self.config.return_distance;
        facts
    }

    fn decide(&self, _view: &WorldView<'_>, actor: &Actor, facts: &EventFacts) -> Transition {
        let transition = if facts.owner_disappeared {
            if facts.state == State::Dead {
                Transition::to(State::Dead)
            } else {
                Transition::with(State::Dead, vec![Effect::DepleteHealth])
            }
        } else {
            match facts.state {
                State::Idle => Self::idle(actor, facts),
                State::Moving => Self::moving(actor, facts),
                State::Casting => mob::casting(actor, facts),
                State::Stunned => Self::stunned(facts),
                State::Dead => Transition::to(State::Dead),
            }
        };
        if facts.ambient_sound {
            transition.after(vec![Effect::PlayAmbientSound])
        } else {
            transition
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{ActorId, ActorSpec};
    use crate::arena::Arena;
    use crate::brain::test_support::{always, never, Bench};
    use crate::config::MinionBrainConfig;
    use crate::skill::{DamageEffect, DrainEffect, SkillKind, SkillTemplate};

    fn claw() -> SkillTemplate {
        SkillTemplate::new(
            "claw",
            SkillKind::TargetDamage {
                damage: DamageEffect::flat(2),
                drain: DrainEffect::default(),
            },
        )
    }

    /// Necromancer at the origin facing +X with an imp at `imp_at`.
    fn pack(imp_at: Vec2) -> (Bench, ActorId, ActorId) {
        let mut arena = Arena::new();
        let necro = arena.spawn(ActorSpec::player("necro", Vec2::ZERO));
        let imp = arena.spawn(ActorSpec::minion("imp", imp_at, necro).with_skill(claw()));
        (Bench::new(arena), necro, imp)
    }

    fn brain() -> MinionBrain {
        MinionBrain::new(MinionBrainConfig {
            move_probability: 0.0,
            ..MinionBrainConfig::default()
        })
    }

    #[test]
    fn anchor_sits_behind_owner() {
        let (bench, necro, _) = pack(Vec2::ZERO);
        let anchor = anchor_behind(bench.arena.get(necro).unwrap());
        assert!((anchor - Vec2::new(-2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn lost_owner_kills_in_any_state() {
        let (mut bench, necro, imp) = pack(Vec2::new(-2.0, 0.0));
        bench.arena.despawn(necro);
        for state in [State::Idle, State::Moving, State::Casting, State::Stunned] {
            bench.arena.get_mut(imp).unwrap().state = state;
            let t = bench.plan(&brain(), imp, &mut never());
            assert_eq!(t, Transition::with(State::Dead, vec![Effect::DepleteHealth]));
        }
        bench.arena.get_mut(imp).unwrap().state = State::Dead;
        assert_eq!(bench.plan(&brain(), imp, &mut never()), Transition::to(State::Dead));
    }

    #[test]
    fn far_minion_warps_to_anchor() {
        let (bench, _, imp) = pack(Vec2::new(40.0, 0.0));
        let t = bench.plan(&brain(), imp, &mut never());
        assert_eq!(
            t,
            Transition::with(
                State::Idle,
                vec![Effect::Warp {
                    destination: Vec2::new(-2.0, 0.0)
                }]
            )
        );
    }

    #[test]
    fn ambient_sound_plays_before_the_table() {
        let (mut bench, _, imp) = pack(Vec2::new(40.0, 0.0));
        let t = bench.plan(&brain(), imp, &mut always());
        assert_eq!(
            t,
            Transition::with(
                State::Idle,
                vec![
                    Effect::PlayAmbientSound,
                    Effect::Warp {
                        destination: Vec2::new(-2.0, 0.0)
                    }
                ]
            )
        );

        bench.arena.get_mut(imp).unwrap().state = State::Moving;
        let t = bench.plan(&brain(), imp, &mut always());
        assert_eq!(t, Transition::with(State::Idle, vec![Effect::PlayAmbientSound]));
    }

    #[test]
    fn idle_minion_walks_back() {
        let (bench, _, imp) = pack(Vec2::new(-30.0, 0.0));
        let t = bench.plan(&brain(), imp, &mut never());
        assert_eq!(t.next, State::Moving);
        assert_eq!(
            t.effects.last(),
            Some(&Effect::Navigate {
                destination: Vec2::new(-2.0, 0.0),
                stopping_distance: 0.0
            })
        );
    }

    #[test]
    fn refused_cast_drops_target_too() {
        let (mut bench, _, imp) = pack(Vec2::new(-2.0, 0.0));
        let wolf = bench.arena.spawn(ActorSpec::enemy("wolf", Vec2::new(-3.5, 0.0)));
        {
            let imp = bench.arena.get_mut(imp).unwrap();
            imp.target = Some(wolf);
            imp.skills.request(0).unwrap();
            imp.skills.get_mut(0).unwrap().template.mana_cost =
                crate::curve::LinearInt::constant(50);
        }
        let t = bench.plan(&brain(), imp, &mut never());
        assert_eq!(
            t,
            Transition::with(
                State::Idle,
                vec![Effect::ClearTarget, Effect::ClearSkillRequest]
            )
        );
    }

    #[test]
    fn moving_minion_without_target_reaims() {
        let (mut bench, _, imp) = pack(Vec2::new(-29.0, 0.0));
        bench.arena.get_mut(imp).unwrap().state = State::Moving;
        crate::movement::Movement::navigate_to(
            &mut bench.movement,
            imp,
            Vec2::new(-10.0, 0.0),
            0.0,
        );
        let t = bench.plan(&brain(), imp, &mut never());
        assert_eq!(t.next, State::Moving);
        assert_eq!(t.effects[0], Effect::CancelCast { force: false });
    }

    #[test]
    fn stunned_death_cancels_cast() {
        let (mut bench, _, imp) = pack(Vec2::new(-2.0, 0.0));
        let imp_actor = bench.arena.get_mut(imp).unwrap();
        imp_actor.state = State::Stunned;
        imp_actor.health.deplete();
        let t = bench.plan(&brain(), imp, &mut never());
        assert_eq!(t, Transition::with(State::Dead, vec![Effect::CancelCast { force: true }]));
    }
}
