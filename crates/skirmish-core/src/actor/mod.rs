//! Actor module: the combatants of a skirmish.
//!
//! This module provides the core actor types:
//! - [`ActorId`]: Unique identifier for actors
//! - [`ActorKind`]: Classification used to select a brain
//! - [`ActorInner`]: Type-safe storage for kind-specific components
//! - [`Actor`]: The complete actor
//! - [`ActorSpec`]: Spawn description handed to the arena
//!
//! # Architecture
//!
//! Every actor carries the same shared components (pools, skills, transform,
//! colliders, combat stats). `ActorKind` picks the brain that drives it and
//! `ActorInner` holds the bookkeeping only that brain needs.
//!
//! # Example
//!
//! ```
//! use skirmish_core::actor::{Actor, ActorId, ActorKind, ActorSpec};
//! use glam::Vec2;
//!
//! let spec = ActorSpec::enemy("wolf", Vec2::new(3.0, 4.0)).with_health(20, 0);
//! let wolf = Actor::from_spec(ActorId::new(7), spec);
//!
//! assert_eq!(wolf.id().as_u64(), 7);
//! assert_eq!(wolf.kind(), ActorKind::Enemy);
//! assert_eq!(wolf.health.current(), 20);
//! ```

pub mod components;

use std::fmt;
use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::bonus::{StatBonus, StatBonuses};
use crate::brain::State;
use crate::curve::{Level, LinearInt, DEFAULT_MAX_LEVEL};
use crate::pool::ResourcePool;
use crate::skill::{SkillFlags, SkillSet, SkillTemplate};

pub use components::{
    Collider, CombatStats, FactionId, MinionComponents, MobComponents, PlayerComponents,
    Transform, DEFAULT_FOV_DEGREES,
};

/// Unique identifier for an actor.
///
/// Actor IDs are assigned monotonically by the arena and order iteration, so
/// processing actors by ID is deterministic.
///
/// # Example
///
/// ```
/// use skirmish_core::actor::ActorId;
///
/// let a = ActorId::new(1);
/// let b = ActorId::new(2);
/// assert!(a < b);
/// assert_eq!(b.as_u64(), 2);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(u64);

impl ActorId {
    /// Creates an `ActorId` from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorId({})", self.0)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ActorId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<ActorId> for u64 {
    fn from(id: ActorId) -> Self {
        id.0
    }
}

/// Actor classification for brain selection.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActorKind {
    /// Input-driven character.
    Player,
    /// Hostile monster with a home position.
    Enemy,
    /// Summoned monster that serves an owner.
    Minion,
}

impl fmt::Display for ActorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "Player"),
            Self::Enemy => write!(f, "Enemy"),
            Self::Minion => write!(f, "Minion"),
        }
    }
}

/// Kind-specific component storage.
///
/// The variant always matches the actor's [`ActorKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActorInner {
    /// Player bookkeeping.
    Player(PlayerComponents),
    /// Enemy bookkeeping.
    Enemy(MobComponents),
    /// Minion bookkeeping.
    Minion(MinionComponents),
}

impl ActorInner {
    /// Kind matching this variant.
    #[must_use]
    pub const fn kind(&self) -> ActorKind {
        match self {
            Self::Player(_) => ActorKind::Player,
            Self::Enemy(_) => ActorKind::Enemy,
            Self::Minion(_) => ActorKind::Minion,
        }
    }
}

// =============================================================================
// Actor Spec
// =============================================================================

/// Everything needed to spawn an actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorSpec {
    /// Display name.
    pub name: String,
    /// Kind-specific components.
    pub inner: ActorInner,
    /// Faction; minions adopt their owner's, enemies default to
    /// [`FactionId::MONSTERS`].
    pub faction: FactionId,
    /// Starting level.
    pub level: u32,
    /// Spawn position.
    pub position: Vec2,
    /// Spawn facing.
    pub yaw: f32,
    /// Contact shapes.
    pub colliders: Vec<Collider>,
    /// Max health by level.
    pub health_max: LinearInt,
    /// Max mana by level.
    pub mana_max: LinearInt,
    /// Flat health regeneration per interval.
    pub health_recovery: i32,
    /// Flat mana regeneration per interval.
    pub mana_recovery: i32,
    /// Starting health instead of full.
    pub initial_health: Option<u32>,
    /// Combat numbers.
    pub stats: CombatStats,
    /// Skill templates in slot order.
    pub skills: Vec<SkillTemplate>,
    /// Movement speed in units per second.
    pub speed: f32,
    /// Field-of-view cone in degrees.
    pub fov_degrees: f32,
}

impl ActorSpec {
    fn with_inner(name: impl Into<String>, inner: ActorInner, position: Vec2) -> Self {
        Self {
            name: name.into(),
            inner,
            faction: FactionId::default(),
            level: 1,
            position,
            yaw: 0.0,
            colliders: vec![Collider::default()],
            health_max: LinearInt::constant(100),
            mana_max: LinearInt::constant(0),
            health_recovery: 0,
            mana_recovery: 0,
            initial_health: None,
            stats: CombatStats::default(),
            skills: Vec::new(),
            speed: 4.0,
            fov_degrees: DEFAULT_FOV_DEGREES,
        }
    }

    /// A player at `position`.
    #[must_use]
    pub fn player(name: impl Into<String>, position: Vec2) -> Self {
        Self::with_inner(name, ActorInner::Player(PlayerComponents::default()), position)
    }

    /// An enemy whose home is `position`.
    #[must_use]
    pub fn enemy(name: impl Into<String>, position: Vec2) -> Self {
        Self::with_inner(name, ActorInner::Enemy(MobComponents::at(position)), position)
            .with_faction(FactionId::MONSTERS)
    }

    /// A minion serving `owner`, with the default 10 second lifetime.
    #[must_use]
    pub fn minion(name: impl Into<String>, position: Vec2, owner: ActorId) -> Self {
        let inner = ActorInner::Minion(MinionComponents {
            mob: MobComponents::at(position),
            owner: Some(owner),
            lifetime_remaining: Some(10.0),
        });
        Self::with_inner(name, inner, position)
    }

    /// Sets the faction.
    #[must_use]
    pub fn with_faction(mut self, faction: FactionId) -> Self {
        self.faction = faction;
        self
    }

    /// Sets the level.
    #[must_use]
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    /// Constant max health and flat regeneration.
    #[must_use]
    pub fn with_health(mut self, max: i32, recovery: i32) -> Self {
        self.health_max = LinearInt::constant(max);
        self.health_recovery = recovery;
        self
    }

    /// Constant max mana and flat regeneration.
    #[must_use]
    pub fn with_mana(mut self, max: i32, recovery: i32) -> Self {
        self.mana_max = LinearInt::constant(max);
        self.mana_recovery = recovery;
        self
    }

    /// Starts with `health` instead of full.
    #[must_use]
    pub fn with_initial_health(mut self, health: u32) -> Self {
        self.initial_health = Some(health);
        self
    }

    /// Replaces combat stats.
    #[must_use]
    pub fn with_stats(mut self, stats: CombatStats) -> Self {
        self.stats = stats;
        self
    }

    /// Appends a skill.
    #[must_use]
    pub fn with_skill(mut self, skill: SkillTemplate) -> Self {
        self.skills.push(skill);
        self
    }

    /// Replaces the colliders.
    #[must_use]
    pub fn with_colliders(mut self, colliders: Vec<Collider>) -> Self {
        self.colliders = colliders;
        self
    }

    /// Sets the facing.
    #[must_use]
    pub fn facing(mut self, yaw: f32) -> Self {
        self.yaw = yaw;
        self
    }

    /// Sets movement speed.
    #[must_use]
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Sets the minion lifetime; ignored for other kinds.
    #[must_use]
    pub fn with_lifetime(mut self, lifetime: Option<f32>) -> Self {
        if let ActorInner::Minion(minion) = &mut self.inner {
            minion.lifetime_remaining = lifetime;
        }
        self
    }
}

// =============================================================================
// Actor
// =============================================================================

/// A simulated combatant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    id: ActorId,
    inner: ActorInner,
    /// Display name.
    pub name: String,
    /// Faction.
    pub faction: FactionId,
    /// Level.
    pub level: Level,
    /// Pose.
    pub transform: Transform,
    /// Contact shapes relative to the transform.
    pub colliders: Vec<Collider>,
    /// Health pool.
    pub health: ResourcePool,
    /// Mana pool.
    pub mana: ResourcePool,
    /// Max health by level, before bonuses.
    pub health_curve: LinearInt,
    /// Max mana by level, before bonuses.
    pub mana_curve: LinearInt,
    /// Combat numbers before bonuses.
    pub stats: CombatStats,
    /// Skills, selection and buffs.
    pub skills: SkillSet,
    /// Current target, looked up by id.
    pub target: Option<ActorId>,
    /// Brain state.
    pub state: State,
    /// Stunned while `now <= stun_end_time`.
    pub stun_end_time: Option<f64>,
    /// Time of the last damage, heal or drain involving this actor.
    pub last_combat_time: f64,
    /// Time of the last ambient sound.
    pub last_ambient_sound_time: f64,
    /// Base movement speed.
    pub speed: f32,
    /// Field of view in degrees.
    pub fov_degrees: f32,
    /// Seconds until the corpse decays, while dead.
    pub decay_remaining: Option<f32>,
    /// The corpse has decayed and awaits despawn.
    pub decayed: bool,
    #[serde(skip)]
    bonus_providers: Vec<Arc<dyn StatBonus>>,
}

impl Actor {
    /// Builds an actor from a spawn description.
    ///
    /// Pools start full (or at `initial_health`); an actor spawned with zero
    /// health starts `Dead`.
    #[must_use]
    pub fn from_spec(id: ActorId, spec: ActorSpec) -> Self {
        let level = Level::new(spec.level, DEFAULT_MAX_LEVEL);
        let skills = SkillSet::new(spec.skills);
        let mut actor = Self {
            id,
            inner: spec.inner,
            name: spec.name,
            faction: spec.faction,
            level,
            transform: Transform::new(spec.position, spec.yaw),
            colliders: spec.colliders,
            health: ResourcePool::new(0).with_recovery(spec.health_recovery),
            mana: ResourcePool::new(0).with_recovery(spec.mana_recovery),
            health_curve: spec.health_max,
            mana_curve: spec.mana_max,
            stats: spec.stats,
            skills,
            target: None,
            state: State::Idle,
            stun_end_time: None,
            last_combat_time: f64::MIN,
            last_ambient_sound_time: f64::MIN,
            speed: spec.speed,
            fov_degrees: spec.fov_degrees,
            decay_remaining: None,
            decayed: false,
            bonus_providers: Vec::new(),
        };
        actor.refresh_maxima();
        actor.health.fill();
        actor.mana.fill();
        if let Some(initial) = spec.initial_health {
            actor.health.set_current(i64::from(initial));
        }
        if actor.health.is_empty() {
            actor.state = State::Dead;
        }
        actor
    }

    /// Unique id.
    #[must_use]
    pub const fn id(&self) -> ActorId {
        self.id
    }

    /// Kind, derived from the component variant.
    #[must_use]
    pub const fn kind(&self) -> ActorKind {
        self.inner.kind()
    }

    /// Kind-specific components.
    #[must_use]
    pub const fn inner(&self) -> &ActorInner {
        &self.inner
    }

    /// Mutable kind-specific components.
    pub fn inner_mut(&mut self) -> &mut ActorInner {
        &mut self.inner
    }

    /// Returns true for players.
    #[must_use]
    pub const fn is_player(&self) -> bool {
        matches!(self.inner, ActorInner::Player(_))
    }

    /// Returns true for enemies.
    #[must_use]
    pub const fn is_enemy(&self) -> bool {
        matches!(self.inner, ActorInner::Enemy(_))
    }

    /// Returns true for minions.
    #[must_use]
    pub const fn is_minion(&self) -> bool {
        matches!(self.inner, ActorInner::Minion(_))
    }

    /// Player components, if this is a player.
    #[must_use]
    pub const fn as_player(&self) -> Option<&PlayerComponents> {
        match &self.inner {
            ActorInner::Player(p) => Some(p),
            _ => None,
        }
    }

    /// Mutable player components.
    pub fn as_player_mut(&mut self) -> Option<&mut PlayerComponents> {
        match &mut self.inner {
            ActorInner::Player(p) => Some(p),
            _ => None,
        }
    }

    /// Mob components of an enemy or minion.
    #[must_use]
    pub const fn as_mob(&self) -> Option<&MobComponents> {
        match &self.inner {
            ActorInner::Enemy(m) => Some(m),
            ActorInner::Minion(m) => Some(&m.mob),
            ActorInner::Player(_) => None,
        }
    }

    /// Mutable mob components.
    pub fn as_mob_mut(&mut self) -> Option<&mut MobComponents> {
        match &mut self.inner {
            ActorInner::Enemy(m) => Some(m),
            ActorInner::Minion(m) => Some(&mut m.mob),
            ActorInner::Player(_) => None,
        }
    }

    /// Minion components, if this is a minion.
    #[must_use]
    pub const fn as_minion(&self) -> Option<&MinionComponents> {
        match &self.inner {
            ActorInner::Minion(m) => Some(m),
            _ => None,
        }
    }

    /// Mutable minion components.
    pub fn as_minion_mut(&mut self) -> Option<&mut MinionComponents> {
        match &mut self.inner {
            ActorInner::Minion(m) => Some(m),
            _ => None,
        }
    }

    /// Owner of a minion.
    #[must_use]
    pub fn owner(&self) -> Option<ActorId> {
        self.as_minion().and_then(|m| m.owner)
    }

    /// Health above zero.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        !self.health.is_empty()
    }

    /// Stunned at time `now`.
    #[must_use]
    pub fn is_stunned(&self, now: f64) -> bool {
        self.stun_end_time.is_some_and(|end| now <= end)
    }

    /// Whether the movement collaborator may carry this actor along its route.
    ///
    /// Idle and moving actors walk; casters only while the selected skill has
    /// [`SkillFlags::ALLOW_MOVEMENT`]. Stunned and dead actors stay put.
    #[must_use]
    pub fn is_movement_allowed(&self) -> bool {
        match self.state {
            State::Idle | State::Moving => true,
            State::Casting => self
                .skills
                .current_skill()
                .is_some_and(|s| s.template.has(SkillFlags::ALLOW_MOVEMENT)),
            State::Stunned | State::Dead => false,
        }
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.transform.position
    }

    /// World-space collider circles as `(center, radius)`.
    pub fn world_colliders(&self) -> impl Iterator<Item = (Vec2, f32)> + '_ {
        self.colliders
            .iter()
            .map(move |c| (self.transform.position + c.offset, c.radius))
    }

    /// Point on this actor's colliders closest to `point`.
    ///
    /// Points inside a collider are returned unchanged. Actors without
    /// colliders report their position.
    #[must_use]
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        self.world_colliders()
            .map(|(center, radius)| {
                let offset = point - center;
                let distance = offset.length();
                if distance <= radius {
                    point
                } else {
                    center + offset / distance * radius
                }
            })
            .min_by(|a, b| a.distance_squared(point).total_cmp(&b.distance_squared(point)))
            .unwrap_or(self.transform.position)
    }

    /// Surface-to-surface distance to `other`, zero when touching.
    #[must_use]
    pub fn surface_distance(&self, other: &Actor) -> f32 {
        let mut best = f32::INFINITY;
        for (a, ra) in self.world_colliders() {
            for (b, rb) in other.world_colliders() {
                best = best.min((a.distance(b) - ra - rb).max(0.0));
            }
        }
        if best.is_finite() {
            best
        } else {
            self.position().distance(other.position())
        }
    }

    // -------------------------------------------------------------------------
    // Bonuses and derived stats
    // -------------------------------------------------------------------------

    /// Registers a host bonus provider and refreshes pool maxima.
    pub fn add_bonus_provider(&mut self, provider: Arc<dyn StatBonus>) {
        self.bonus_providers.push(provider);
        self.refresh_maxima();
    }

    /// Removes bonus providers by name. Returns how many were removed.
    pub fn remove_bonus_provider(&mut self, name: &str) -> usize {
        let before = self.bonus_providers.len();
        self.bonus_providers.retain(|p| p.name() != name);
        self.refresh_maxima();
        before - self.bonus_providers.len()
    }

    /// Sum of passive, buff and provider bonuses.
    #[must_use]
    pub fn bonuses(&self) -> StatBonuses {
        let providers: StatBonuses = self.bonus_providers.iter().map(|p| p.bonuses()).sum();
        self.skills.bonuses() + providers
    }

    /// Recomputes pool maxima from level and bonuses, clamping current values.
    ///
    /// Returns true if health was emptied by the change.
    pub fn refresh_maxima(&mut self) -> bool {
        let bonuses = self.bonuses();
        let level = self.level.current();
        let health_max = self.health_curve.at(level).saturating_add(bonuses.health_max);
        let mana_max = self.mana_curve.at(level).saturating_add(bonuses.mana_max);
        self.mana.set_max(u32::try_from(mana_max.max(0)).unwrap_or(0));
        self.health
            .set_max(u32::try_from(health_max.max(0)).unwrap_or(0))
            .emptied
    }

    /// Effective damage.
    #[must_use]
    pub fn damage(&self) -> i32 {
        self.stats
            .damage
            .at(self.level.current())
            .saturating_add(self.bonuses().damage)
    }

    /// Effective defense.
    #[must_use]
    pub fn defense(&self) -> i32 {
        self.stats
            .defense
            .at(self.level.current())
            .saturating_add(self.bonuses().defense)
    }

    /// Effective block chance.
    #[must_use]
    pub fn block_chance(&self) -> f32 {
        self.stats.block_chance.at(self.level.current()) + self.bonuses().block_chance
    }

    /// Effective critical chance.
    #[must_use]
    pub fn critical_chance(&self) -> f32 {
        self.stats.critical_chance.at(self.level.current()) + self.bonuses().critical_chance
    }

    /// Effective movement speed.
    #[must_use]
    pub fn effective_speed(&self) -> f32 {
        (self.speed + self.bonuses().speed).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonus::{BonusCurves, FlatBonus};
    use crate::curve::LinearFloat;
    use crate::skill::SkillKind;

    mod spawn_tests {
        use super::*;

        #[test]
        fn spawns_full_and_idle() {
            let actor = Actor::from_spec(
                ActorId::new(1),
                ActorSpec::player("hero", Vec2::ZERO).with_health(40, 1).with_mana(25, 2),
            );
            assert_eq!(actor.health.current(), 40);
            assert_eq!(actor.mana.current(), 25);
            assert_eq!(actor.state, State::Idle);
            assert!(actor.is_player());
        }

        #[test]
        fn zero_health_spawns_dead() {
            let actor = Actor::from_spec(
                ActorId::new(1),
                ActorSpec::enemy("husk", Vec2::ZERO).with_initial_health(0),
            );
            assert_eq!(actor.state, State::Dead);
            assert!(!actor.is_alive());
        }

        #[test]
        fn minion_records_owner() {
            let actor = Actor::from_spec(
                ActorId::new(2),
                ActorSpec::minion("imp", Vec2::ZERO, ActorId::new(1)),
            );
            assert_eq!(actor.owner(), Some(ActorId::new(1)));
            assert_eq!(actor.as_minion().and_then(|m| m.lifetime_remaining), Some(10.0));
        }

        #[test]
        fn level_scales_max_health() {
            let mut spec = ActorSpec::enemy("ogre", Vec2::ZERO).with_level(3);
            spec.health_max = LinearInt::new(50, 10);
            let actor = Actor::from_spec(ActorId::new(1), spec);
            assert_eq!(actor.health.max(), 70);
        }
    }

    mod bonus_tests {
        use super::*;

        #[test]
        fn passive_skill_raises_max_health() {
            let passive = SkillTemplate::new(
                "vigor",
                SkillKind::Passive(BonusCurves {
                    health_max: LinearInt::constant(15),
                    ..BonusCurves::default()
                }),
            );
            let actor = Actor::from_spec(
                ActorId::new(1),
                ActorSpec::player("hero", Vec2::ZERO).with_health(100, 0).with_skill(passive),
            );
            assert_eq!(actor.health.max(), 115);
            assert_eq!(actor.health.current(), 115);
        }

        #[test]
        fn providers_add_to_combat_stats() {
            let mut actor = Actor::from_spec(
                ActorId::new(1),
                ActorSpec::player("hero", Vec2::ZERO).with_stats(CombatStats {
                    damage: LinearInt::constant(5),
                    critical_chance: LinearFloat::constant(0.1),
                    ..CombatStats::default()
                }),
            );
            actor.add_bonus_provider(Arc::new(FlatBonus {
                name: "sword".to_string(),
                bonuses: StatBonuses {
                    damage: 3,
                    critical_chance: 0.05,
                    ..StatBonuses::NONE
                },
            }));
            assert_eq!(actor.damage(), 8);
            assert!((actor.critical_chance() - 0.15).abs() < 1e-6);

            assert_eq!(actor.remove_bonus_provider("sword"), 1);
            assert_eq!(actor.damage(), 5);
        }
    }

    mod movement_tests {
        use super::*;
        use crate::skill::{DamageEffect, DrainEffect};

        fn caster(flags: SkillFlags) -> Actor {
            let bolt = SkillTemplate::new(
                "bolt",
                SkillKind::TargetDamage {
                    damage: DamageEffect::flat(1),
                    drain: DrainEffect::default(),
                },
            )
            .with_flags(flags);
            let mut actor = Actor::from_spec(
                ActorId::new(1),
                ActorSpec::player("mage", Vec2::ZERO).with_skill(bolt),
            );
            actor.skills.request(0).unwrap();
            actor.state = State::Casting;
            actor
        }

        #[test]
        fn idle_and_moving_may_move() {
            let mut actor =
                Actor::from_spec(ActorId::new(1), ActorSpec::enemy("wolf", Vec2::ZERO));
            assert!(actor.is_movement_allowed());
            actor.state = State::Moving;
            assert!(actor.is_movement_allowed());
        }

        #[test]
        fn stunned_and_dead_hold_still() {
            let mut actor =
                Actor::from_spec(ActorId::new(1), ActorSpec::enemy("wolf", Vec2::ZERO));
            actor.state = State::Stunned;
            assert!(!actor.is_movement_allowed());
            actor.state = State::Dead;
            assert!(!actor.is_movement_allowed());
        }

        #[test]
        fn casting_follows_the_skill_flag() {
            assert!(
                caster(SkillFlags::LEARN_DEFAULT | SkillFlags::ALLOW_MOVEMENT).is_movement_allowed()
            );
            assert!(!caster(SkillFlags::LEARN_DEFAULT).is_movement_allowed());
        }
    }

    mod geometry_tests {
        use super::*;

        fn at(x: f32, radius: f32) -> Actor {
            Actor::from_spec(
                ActorId::new(1),
                ActorSpec::enemy("blob", Vec2::new(x, 0.0))
                    .with_colliders(vec![Collider::centered(radius)]),
            )
        }

        #[test]
        fn surface_distance_subtracts_radii() {
            let a = at(0.0, 1.0);
            let b = at(10.0, 2.0);
            assert!((a.surface_distance(&b) - 7.0).abs() < 1e-5);
        }

        #[test]
        fn overlapping_actors_are_zero_apart() {
            let a = at(0.0, 1.0);
            let b = at(1.5, 1.0);
            assert!(a.surface_distance(&b).abs() < f32::EPSILON);
        }

        #[test]
        fn closest_point_lies_on_nearest_collider() {
            let mut actor = at(0.0, 1.0);
            actor.colliders.push(Collider::offset(Vec2::new(4.0, 0.0), 1.0));
            let p = actor.closest_point(Vec2::new(10.0, 0.0));
            assert!((p - Vec2::new(5.0, 0.0)).length() < 1e-5);

            let inside = Vec2::new(0.2, 0.0);
            assert_eq!(actor.closest_point(inside), inside);
        }
    }
}
