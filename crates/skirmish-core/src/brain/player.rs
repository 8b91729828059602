//! Player brain: turns host commands into casts.
//!
//! Players never pick targets or skills on their own. The host sets the
//! target, requests skills and cancels; this brain validates requests with
//! the strict view cone check and walks the cast lifecycle.

use rand::RngCore;

use crate::actor::{Actor, ActorKind};
use crate::config::PlayerBrainConfig;
use crate::skill::cast::{self, CastMode, CastPlan};
use crate::world_view::WorldView;

use super::{Brain, Effect, EventFacts, State, Transition};

/// State machine for [`ActorKind::Player`].
#[derive(Debug, Clone, Default)]
pub struct PlayerBrain {
    config: PlayerBrainConfig,
}

fn finish() -> Vec<Effect> {
    vec![
        Effect::FinishCast,
        Effect::ApplyNextTarget,
        Effect::PromotePendingSkill,
    ]
}

fn start(plan: &CastPlan, mut effects: Vec<Effect>, casting_next: State) -> Transition {
    effects.push(Effect::StartCast {
        target: plan.target,
    });
    if plan.instant {
        effects.extend(finish());
        Transition::with(casting_next, effects)
    } else {
        Transition::with(State::Casting, effects)
    }
}

impl PlayerBrain {
    /// Brain with the given tunables.
    #[must_use]
    pub const fn new(config: PlayerBrainConfig) -> Self {
        Self { config }
    }

    fn idle(actor: &Actor, facts: &EventFacts) -> Transition {
        if facts.died {
            return Transition::to(State::Dead);
        }
        if facts.stunned {
            return Transition::with(State::Stunned, vec![Effect::ResetMovement]);
        }
        if facts.cancel_requested {
            return Transition::with(
                State::Idle,
                vec![Effect::AcknowledgeCancel, Effect::ClearTarget],
            );
        }
        if facts.move_start {
            return Transition::with(State::Moving, vec![Effect::CancelCast { force: false }]);
        }
        match &facts.cast_check {
            Some(Ok(plan)) => start(plan, vec![Effect::ResetMovement], State::Idle),
            Some(Err(reason)) => {
                tracing::debug!(actor = %actor.id(), %reason, "skill request refused");
                Transition::with(State::Idle, vec![Effect::ClearSkillRequest])
            }
            None => Transition::to(State::Idle),
        }
    }

    fn moving(actor: &Actor, facts: &EventFacts) -> Transition {
        if facts.died {
            return Transition::to(State::Dead);
        }
        if facts.stunned {
            return Transition::with(State::Stunned, vec![Effect::ResetMovement]);
        }
        if facts.move_end {
            return Transition::to(State::Idle);
        }

        let mut acknowledged = Vec::new();
        if facts.cancel_requested {
            acknowledged.push(Effect::AcknowledgeCancel);
            if facts.skill.is_some() {
                if facts.can_cancel {
                    acknowledged.push(Effect::CancelCast { force: false });
                    return Transition::with(State::Idle, acknowledged);
                }
                return Transition::with(State::Casting, acknowledged);
            }
            if actor.target.is_some() {
                acknowledged.push(Effect::ClearTarget);
                return Transition::with(State::Idle, acknowledged);
            }
        }

        match &facts.cast_check {
            // keeps walking; the request stays selected for the next tick
            Some(Err(reason)) => {
                tracing::trace!(actor = %actor.id(), %reason, "skill request waiting");
                Transition::with(State::Moving, acknowledged)
            }
            Some(Ok(plan)) => start(plan, acknowledged, State::Moving),
            None => Transition::with(State::Moving, acknowledged),
        }
    }

    fn casting(&self, actor: &Actor, facts: &EventFacts) -> Transition {
        let look = if actor.as_player().is_some_and(|p| p.combat_look_at) && actor.target.is_some()
        {
            vec![Effect::LookAtTarget]
        } else {
            Vec::new()
        };

        if facts.died {
            return Transition::with(State::Dead, vec![Effect::ApplyNextTarget]);
        }
        if facts.stunned {
            let mut effects = Vec::new();
            if !self.config.continue_cast_after_stunned {
                effects.push(Effect::CancelCast { force: true });
            }
            effects.push(Effect::ResetMovement);
            return Transition::with(State::Stunned, effects).after(look);
        }

        let mut effects = look;
        if facts.cancel_requested {
            effects.push(Effect::AcknowledgeCancel);
            if facts.can_cancel {
                effects.extend([Effect::CancelCast { force: false }, Effect::ApplyNextTarget]);
                return Transition::with(State::Idle, effects);
            }
        }
        if facts.target.is_lost() && facts.cancel_on_target_loss {
            effects.extend([Effect::CancelCast { force: true }, Effect::ApplyNextTarget]);
            return Transition::with(State::Idle, effects);
        }
        if facts.skill.is_none() {
            tracing::error!(actor = %actor.id(), "casting without a selected skill");
            effects.push(Effect::ApplyNextTarget);
            return Transition::with(State::Idle, effects);
        }
        if facts.skill_finished {
            effects.extend(finish());
            return Transition::with(State::Idle, effects);
        }
        Transition::with(State::Casting, effects)
    }

    fn stunned(facts: &EventFacts) -> Transition {
        if facts.died {
            Transition::to(State::Dead)
        } else if facts.cancel_requested {
            Transition::with(
                State::Stunned,
                vec![Effect::AcknowledgeCancel, Effect::ClearTarget],
            )
        } else if facts.stunned {
            Transition::to(State::Stunned)
        } else {
            Transition::to(State::Idle)
        }
    }
}

impl Brain for PlayerBrain {
    fn kind(&self) -> ActorKind {
        ActorKind::Player
    }

    fn observe(&self, view: &WorldView<'_>, actor: &Actor, _rng: &mut dyn RngCore) -> EventFacts {
        let mut facts = EventFacts::common(view, actor);
        facts.cancel_requested = actor.as_player().is_some_and(|p| p.cancel_action_requested);
        if matches!(actor.state, State::Idle | State::Moving) {
            facts.cast_check = facts
                .skill
                .map(|index| cast::validate(view, actor.id(), index, CastMode::Player));
        }
        facts
    }

    fn decide(&self, _view: &WorldView<'_>, actor: &Actor, facts: &EventFacts) -> Transition {
        match facts.state {
            State::Idle => Self::idle(actor, facts),
            State::Moving => Self::moving(actor, facts),
            State::Casting => self.casting(actor, facts),
            State::Stunned => Self::stunned(facts),
            State::Dead => Transition::to(State::Dead),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{ActorId, ActorSpec};
    use crate::arena::Arena;
    use crate::brain::test_support::{never, Bench};
    use crate::curve::LinearFloat;
    use crate::movement::Movement;
    use crate::skill::{DamageEffect, DrainEffect, SkillFlags, SkillKind, SkillTemplate};
    use glam::Vec2;

    fn slash(cast_time: f32, flags: SkillFlags) -> SkillTemplate {
        SkillTemplate::new(
            "slash",
            SkillKind::TargetDamage {
                damage: DamageEffect::flat(5),
                drain: DrainEffect::default(),
            },
        )
        .with_cast_time(LinearFloat::constant(cast_time))
        .with_flags(flags)
    }

    /// Hero at the origin facing +X, wolf 2 units ahead and targeted.
    fn duel(skill: SkillTemplate) -> (Bench, ActorId, ActorId) {
        let mut arena = Arena::new();
        let hero = arena.spawn(ActorSpec::player("hero", Vec2::ZERO).with_skill(skill));
        let wolf = arena.spawn(ActorSpec::enemy("wolf", Vec2::new(2.0, 0.0)));
        arena.get_mut(hero).unwrap().target = Some(wolf);
        (Bench::new(arena), hero, wolf)
    }

    fn cancellable() -> SkillFlags {
        SkillFlags::LEARN_DEFAULT | SkillFlags::CAN_CANCEL_CAST
    }

    fn request_cancel(bench: &mut Bench, hero: ActorId) {
        bench
            .arena
            .get_mut(hero)
            .unwrap()
            .as_player_mut()
            .unwrap()
            .cancel_action_requested = true;
    }

    mod idle_tests {
        use super::*;

        #[test]
        fn valid_request_starts_cast() {
            let (mut bench, hero, wolf) = duel(slash(1.0, cancellable()));
            bench.arena.get_mut(hero).unwrap().skills.request(0).unwrap();
            let t = bench.plan(&PlayerBrain::default(), hero, &mut never());
            assert_eq!(
                t,
                Transition::with(
                    State::Casting,
                    vec![Effect::ResetMovement, Effect::StartCast { target: Some(wolf) }]
                )
            );
        }

        #[test]
        fn instant_skill_finishes_same_tick() {
            let (mut bench, hero, wolf) = duel(slash(0.0, cancellable()));
            bench.arena.get_mut(hero).unwrap().skills.request(0).unwrap();
            let t = bench.plan(&PlayerBrain::default(), hero, &mut never());
            assert_eq!(t.next, State::Idle);
            assert_eq!(
                t.effects,
                vec![
                    Effect::ResetMovement,
                    Effect::StartCast { target: Some(wolf) },
                    Effect::FinishCast,
                    Effect::ApplyNextTarget,
                    Effect::PromotePendingSkill,
                ]
            );
        }

        #[test]
        fn target_behind_is_refused() {
            let (mut bench, hero, _) = duel(slash(1.0, cancellable()));
            {
                let hero = bench.arena.get_mut(hero).unwrap();
                hero.transform.yaw = std::f32::consts::PI;
                hero.skills.request(0).unwrap();
            }
            let t = bench.plan(&PlayerBrain::default(), hero, &mut never());
            assert_eq!(t, Transition::with(State::Idle, vec![Effect::ClearSkillRequest]));
        }

        #[test]
        fn cancel_clears_target() {
            let (mut bench, hero, _) = duel(slash(1.0, cancellable()));
            request_cancel(&mut bench, hero);
            let t = bench.plan(&PlayerBrain::default(), hero, &mut never());
            assert_eq!(
                t,
                Transition::with(
                    State::Idle,
                    vec![Effect::AcknowledgeCancel, Effect::ClearTarget]
                )
            );
        }

        #[test]
        fn route_start_switches_to_moving() {
            let (mut bench, hero, _) = duel(slash(1.0, cancellable()));
            bench.movement.navigate_to(hero, Vec2::new(0.0, 9.0), 0.0);
            let t = bench.plan(&PlayerBrain::default(), hero, &mut never());
            assert_eq!(
                t,
                Transition::with(State::Moving, vec![Effect::CancelCast { force: false }])
            );
        }
    }

    mod moving_tests {
        use super::*;

        fn walking(skill: SkillTemplate) -> (Bench, ActorId, ActorId) {
            let (mut bench, hero, wolf) = duel(skill);
            bench.arena.get_mut(hero).unwrap().state = State::Moving;
            bench.movement.navigate_to(hero, Vec2::new(0.0, 9.0), 0.0);
            (bench, hero, wolf)
        }

        #[test]
        fn cast_starts_without_stopping() {
            let (mut bench, hero, wolf) = walking(slash(1.0, cancellable()));
            bench.arena.get_mut(hero).unwrap().skills.request(0).unwrap();
            let t = bench.plan(&PlayerBrain::default(), hero, &mut never());
            assert_eq!(
                t,
                Transition::with(State::Casting, vec![Effect::StartCast { target: Some(wolf) }])
            );
        }

        #[test]
        fn cancel_with_uncancellable_selection_stays_casting() {
            let (mut bench, hero, wolf) = walking(slash(1.0, SkillFlags::LEARN_DEFAULT));
            {
                let hero = bench.arena.get_mut(hero).unwrap();
                hero.skills.request(0).unwrap();
                hero.skills.start_cast(Some(wolf));
            }
            request_cancel(&mut bench, hero);
            let t = bench.plan(&PlayerBrain::default(), hero, &mut never());
            assert_eq!(
                t,
                Transition::with(State::Casting, vec![Effect::AcknowledgeCancel])
            );
        }

        #[test]
        fn cancel_without_selection_clears_target() {
            let (mut bench, hero, _) = walking(slash(1.0, cancellable()));
            request_cancel(&mut bench, hero);
            let t = bench.plan(&PlayerBrain::default(), hero, &mut never());
            assert_eq!(
                t,
                Transition::with(
                    State::Idle,
                    vec![Effect::AcknowledgeCancel, Effect::ClearTarget]
                )
            );
        }

        #[test]
        fn refused_request_is_kept_while_walking() {
            let (mut bench, hero, _) = walking(slash(1.0, cancellable()));
            {
                let hero = bench.arena.get_mut(hero).unwrap();
                hero.transform.yaw = std::f32::consts::PI;
                hero.skills.request(0).unwrap();
            }
            let t = bench.plan(&PlayerBrain::default(), hero, &mut never());
            assert_eq!(t, Transition::to(State::Moving));
        }
    }

    mod casting_tests {
        use super::*;

        fn mid_cast(
            config: PlayerBrainConfig,
            flags: SkillFlags,
        ) -> (Bench, ActorId, ActorId, PlayerBrain) {
            let (mut bench, hero, wolf) = duel(slash(1.0, flags));
            {
                let hero = bench.arena.get_mut(hero).unwrap();
                hero.skills.request(0).unwrap();
                hero.skills.start_cast(Some(wolf));
                hero.state = State::Casting;
            }
            (bench, hero, wolf, PlayerBrain::new(config))
        }

        #[test]
        fn stun_keeps_cast_when_configured() {
            let (mut bench, hero, _, brain) = mid_cast(PlayerBrainConfig::default(), cancellable());
            bench.arena.get_mut(hero).unwrap().stun_end_time = Some(1.0);
            let t = bench.plan(&brain, hero, &mut never());
            assert_eq!(
                t,
                Transition::with(State::Stunned, vec![Effect::LookAtTarget, Effect::ResetMovement])
            );

            let (mut bench, hero, _, brain) = mid_cast(
                PlayerBrainConfig {
                    continue_cast_after_stunned: false,
                },
                cancellable(),
            );
            bench.arena.get_mut(hero).unwrap().stun_end_time = Some(1.0);
            let t = bench.plan(&brain, hero, &mut never());
            assert!(t.effects.contains(&Effect::CancelCast { force: true }));
        }

        #[test]
        fn finish_promotes_buffered_commands() {
            let (mut bench, hero, _, brain) = mid_cast(PlayerBrainConfig::default(), cancellable());
            bench.arena.get_mut(hero).unwrap().skills.get_mut(0).unwrap().tick(1.0);
            let t = bench.plan(&brain, hero, &mut never());
            assert_eq!(
                t,
                Transition::with(
                    State::Idle,
                    vec![
                        Effect::LookAtTarget,
                        Effect::FinishCast,
                        Effect::ApplyNextTarget,
                        Effect::PromotePendingSkill,
                    ]
                )
            );
        }

        #[test]
        fn cancel_respects_flag() {
            let (mut bench, hero, _, brain) = mid_cast(PlayerBrainConfig::default(), cancellable());
            request_cancel(&mut bench, hero);
            let t = bench.plan(&brain, hero, &mut never());
            assert_eq!(t.next, State::Idle);
            assert!(t.effects.contains(&Effect::CancelCast { force: false }));

            let (mut bench, hero, _, brain) =
                mid_cast(PlayerBrainConfig::default(), SkillFlags::LEARN_DEFAULT);
            request_cancel(&mut bench, hero);
            let t = bench.plan(&brain, hero, &mut never());
            assert_eq!(
                t,
                Transition::with(
                    State::Casting,
                    vec![Effect::LookAtTarget, Effect::AcknowledgeCancel]
                )
            );
        }

        #[test]
        fn death_hands_over_next_target() {
            let (mut bench, hero, _, brain) = mid_cast(PlayerBrainConfig::default(), cancellable());
            bench.arena.get_mut(hero).unwrap().health.deplete();
            let t = bench.plan(&brain, hero, &mut never());
            assert_eq!(t, Transition::with(State::Dead, vec![Effect::ApplyNextTarget]));
        }
    }

    #[test]
    fn cancel_while_stunned_clears_target() {
        let (mut bench, hero, _) = duel(slash(1.0, cancellable()));
        bench.arena.get_mut(hero).unwrap().state = State::Stunned;
        bench.arena.get_mut(hero).unwrap().stun_end_time = Some(2.0);
        request_cancel(&mut bench, hero);
        let t = bench.plan(&PlayerBrain::default(), hero, &mut never());
        assert_eq!(
            t,
            Transition::with(
                State::Stunned,
                vec![Effect::AcknowledgeCancel, Effect::ClearTarget]
            )
        );
    }
}
