//! Per-actor skill state.

use serde::{Deserialize, Serialize};

use crate::actor::ActorId;
use crate::bonus::StatBonuses;
use crate::error::SkillRequestError;
use crate::skill::{Buff, SkillFlags, SkillKind, SkillTemplate};

/// Remaining time at or below this counts as elapsed, so whole-tick durations
/// end on the tick they predict despite `f32` residue.
pub const TIMER_EPSILON: f32 = 1e-4;

/// Counts `remaining` down by `dt`, snapping to zero once it is within
/// [`TIMER_EPSILON`].
pub(crate) fn count_down(remaining: f32, dt: f32) -> f32 {
    let left = remaining - dt;
    if left <= TIMER_EPSILON {
        0.0
    } else {
        left
    }
}

// =============================================================================
// Skill Instance
// =============================================================================

/// One skill as owned by an actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillInstance {
    /// Definition.
    pub template: SkillTemplate,
    level: u32,
    cast_time_remaining: f32,
    cooldown_remaining: f32,
    /// A cast has started and neither finished nor been cancelled.
    casting: bool,
}

impl SkillInstance {
    /// Wraps a template, learning it at level 1 if it is a default skill.
    #[must_use]
    pub fn new(template: SkillTemplate) -> Self {
        let level = u32::from(template.has(SkillFlags::LEARN_DEFAULT));
        Self {
            template,
            level,
            cast_time_remaining: 0.0,
            cooldown_remaining: 0.0,
            casting: false,
        }
    }

    /// Template name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.template.name
    }

    /// Current level; 0 means unlearned.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Sets the level, clamped to the template's cap.
    pub fn set_level(&mut self, level: u32) {
        self.level = level.min(self.template.max_level);
    }

    /// Returns true if level > 0.
    #[must_use]
    pub const fn is_learned(&self) -> bool {
        self.level > 0
    }

    /// Learned and off cooldown.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.is_learned() && self.cooldown_remaining <= 0.0
    }

    /// Seconds until the cast completes.
    #[must_use]
    pub const fn cast_time_remaining(&self) -> f32 {
        self.cast_time_remaining
    }

    /// Seconds until the skill can be used again.
    #[must_use]
    pub const fn cooldown_remaining(&self) -> f32 {
        self.cooldown_remaining
    }

    /// Returns true while a cast is in flight.
    #[must_use]
    pub const fn is_casting(&self) -> bool {
        self.casting
    }

    /// Mana cost at the current level.
    #[must_use]
    pub fn cost(&self) -> u32 {
        self.template.cost_at(self.level)
    }

    /// Range at the current level.
    #[must_use]
    pub fn range(&self) -> f32 {
        self.template.range_at(self.level)
    }

    /// Cast time at the current level.
    #[must_use]
    pub fn cast_time(&self) -> f32 {
        self.template.cast_time_at(self.level)
    }

    /// Starts the cast timer. A cast still in flight keeps its remaining time.
    ///
    /// Returns true if an interrupted cast was resumed.
    pub fn start_cast(&mut self) -> bool {
        if self.casting {
            return true;
        }
        self.casting = true;
        self.cast_time_remaining = self.cast_time();
        false
    }

    /// Ends the cast and starts the cooldown.
    pub fn finish_cast(&mut self) {
        self.casting = false;
        self.cast_time_remaining = 0.0;
        self.cooldown_remaining = self.template.cooldown_at(self.level);
    }

    /// Ends the cast without cooldown.
    pub fn cancel_cast(&mut self) {
        self.casting = false;
        self.cast_time_remaining = 0.0;
    }

    /// Raises the cooldown to at least `seconds`.
    pub fn force_cooldown(&mut self, seconds: f32) {
        self.cooldown_remaining = self.cooldown_remaining.max(seconds);
    }

    /// Counts both timers down toward zero.
    pub fn tick(&mut self, dt: f32) {
        if self.casting {
            self.cast_time_remaining = count_down(self.cast_time_remaining, dt);
        }
        self.cooldown_remaining = count_down(self.cooldown_remaining, dt);
    }
}

// =============================================================================
// Skill Set
// =============================================================================

/// Result of a cancel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// No skill was selected.
    Nothing,
    /// A cast is in flight and may not be cancelled.
    Refused,
    /// A selected skill that had not started was dropped.
    Cleared(usize),
    /// An in-flight cast was aborted.
    Cancelled(usize),
}

/// All skills of an actor plus the buffs applied to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillSet {
    skills: Vec<SkillInstance>,
    current: Option<usize>,
    /// Target fixed when the current cast started.
    cast_target: Option<ActorId>,
    buffs: Vec<Buff>,
}

impl SkillSet {
    /// Builds the set, learning default skills.
    #[must_use]
    pub fn new(templates: impl IntoIterator<Item = SkillTemplate>) -> Self {
        Self {
            skills: templates.into_iter().map(SkillInstance::new).collect(),
            ..Self::default()
        }
    }

    /// Number of skills.
    #[must_use]
    pub fn len(&self) -> usize {
        self.skills.len()
    }

    /// Returns true if there are no skills.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Skill at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&SkillInstance> {
        self.skills.get(index)
    }

    /// Mutable skill at `index`.
    #[must_use]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut SkillInstance> {
        self.skills.get_mut(index)
    }

    /// Iterates skills in index order.
    pub fn iter(&self) -> impl Iterator<Item = &SkillInstance> + '_ {
        self.skills.iter()
    }

    /// Index of the selected skill.
    #[must_use]
    pub const fn current(&self) -> Option<usize> {
        self.current
    }

    /// The selected skill.
    #[must_use]
    pub fn current_skill(&self) -> Option<&SkillInstance> {
        self.current.and_then(|i| self.skills.get(i))
    }

    /// Target captured at cast start.
    #[must_use]
    pub const fn cast_target(&self) -> Option<ActorId> {
        self.cast_target
    }

    /// Returns true if the selected skill has a cast in flight.
    #[must_use]
    pub fn is_casting(&self) -> bool {
        self.current_skill().is_some_and(SkillInstance::is_casting)
    }

    /// Returns true if the in-flight cast has run its full time.
    #[must_use]
    pub fn is_cast_finished(&self) -> bool {
        self.current_skill()
            .is_some_and(|s| s.is_casting() && s.cast_time_remaining() <= 0.0)
    }

    /// Checks that `index` can be requested right now.
    ///
    /// # Errors
    ///
    /// Returns a [`SkillRequestError`] for a bad index, a passive or unlearned
    /// skill, or one that is cooling down.
    pub fn validate_request(&self, index: usize) -> Result<(), SkillRequestError> {
        let skill = self.skills.get(index).ok_or(SkillRequestError::InvalidIndex {
            index,
            count: self.skills.len(),
        })?;
        if !skill.template.kind.is_castable() {
            return Err(SkillRequestError::Passive {
                name: skill.name().to_string(),
            });
        }
        if !skill.is_learned() {
            return Err(SkillRequestError::NotLearned {
                name: skill.name().to_string(),
            });
        }
        if !skill.is_ready() {
            return Err(SkillRequestError::OnCooldown {
                name: skill.name().to_string(),
                remaining: skill.cooldown_remaining(),
            });
        }
        Ok(())
    }

    /// Selects `index` after validating it.
    ///
    /// # Errors
    ///
    /// See [`SkillSet::validate_request`].
    pub fn request(&mut self, index: usize) -> Result<(), SkillRequestError> {
        self.validate_request(index)?;
        self.select(Some(index));
        Ok(())
    }

    /// Selects a skill without checks. Out-of-range indices clear the selection.
    ///
    /// Switching away from a skill abandons its cast, so an interrupted cast
    /// only resumes while it stays selected.
    pub fn select(&mut self, index: Option<usize>) {
        let index = index.filter(|i| *i < self.skills.len());
        if index == self.current {
            return;
        }
        if let Some(previous) = self.current.and_then(|i| self.skills.get_mut(i)) {
            previous.cancel_cast();
        }
        self.current = index;
        self.cast_target = None;
    }

    /// Drops the selection, silently abandoning a cast in flight.
    pub fn clear_request(&mut self) {
        if let Some(skill) = self.current.and_then(|i| self.skills.get_mut(i)) {
            skill.cancel_cast();
        }
        self.current = None;
        self.cast_target = None;
    }

    /// Starts (or resumes) the selected skill's cast against `target`.
    ///
    /// Returns the skill index and whether an interrupted cast was resumed.
    pub fn start_cast(&mut self, target: Option<ActorId>) -> Option<(usize, bool)> {
        let index = self.current?;
        let skill = self.skills.get_mut(index)?;
        let resumed = skill.start_cast();
        self.cast_target = target;
        Some((index, resumed))
    }

    /// Whether the selection could be cancelled without force.
    #[must_use]
    pub fn can_cancel_current(&self) -> bool {
        match self.current_skill() {
            Some(skill) if skill.is_casting() => skill.template.has(SkillFlags::CAN_CANCEL_CAST),
            Some(_) => true,
            None => false,
        }
    }

    /// Cancels the selection.
    ///
    /// Casts in flight need the `CAN_CANCEL_CAST` flag unless `force` is set.
    pub fn cancel_cast(&mut self, force: bool) -> CancelOutcome {
        let Some(index) = self.current else {
            return CancelOutcome::Nothing;
        };
        let Some(skill) = self.skills.get_mut(index) else {
            self.current = None;
            return CancelOutcome::Nothing;
        };
        if !skill.is_casting() {
            self.current = None;
            self.cast_target = None;
            return CancelOutcome::Cleared(index);
        }
        if !force && !skill.template.has(SkillFlags::CAN_CANCEL_CAST) {
            return CancelOutcome::Refused;
        }
        skill.cancel_cast();
        self.current = None;
        self.cast_target = None;
        CancelOutcome::Cancelled(index)
    }

    /// Completes the selected cast: starts its cooldown and clears the
    /// selection. Returns the index that finished.
    pub fn finish_cast(&mut self) -> Option<usize> {
        let index = self.current.take()?;
        if let Some(skill) = self.skills.get_mut(index) {
            skill.finish_cast();
        }
        self.cast_target = None;
        Some(index)
    }

    /// Puts the in-flight cast, if any, on at least `seconds` of cooldown.
    ///
    /// Returns true if a cast was in flight.
    pub fn interrupt(&mut self, seconds: f32) -> bool {
        match self.current.and_then(|i| self.skills.get_mut(i)) {
            Some(skill) if skill.is_casting() && skill.cast_time_remaining() > 0.0 => {
                skill.force_cooldown(seconds);
                true
            }
            _ => false,
        }
    }

    /// Picks the next skill for a mob, cycling after `last`.
    ///
    /// Candidates must be castable, learned, ready and affordable.
    #[must_use]
    pub fn next_mob_skill(&self, last: Option<usize>, mana: u32) -> Option<usize> {
        let count = self.skills.len();
        if count == 0 {
            return None;
        }
        let start = last.map_or(0, |l| (l + 1) % count);
        (0..count).map(|offset| (start + offset) % count).find(|&i| {
            let skill = &self.skills[i];
            skill.template.kind.is_castable() && skill.is_ready() && skill.cost() <= mana
        })
    }

    /// Returns true if the skill has room to grow and `actor_level` meets the
    /// requirement of its next level.
    #[must_use]
    pub fn can_upgrade(&self, index: usize, actor_level: u32) -> bool {
        self.skills.get(index).is_some_and(|skill| {
            let next = skill.level() + 1;
            skill.level() < skill.template.max_level
                && i64::from(actor_level) >= i64::from(skill.template.required_level.at(next))
        })
    }

    /// Raises a skill by one level.
    ///
    /// # Errors
    ///
    /// Returns [`SkillRequestError::InvalidIndex`] or
    /// [`SkillRequestError::UpgradeRefused`].
    pub fn upgrade(&mut self, index: usize, actor_level: u32) -> Result<u32, SkillRequestError> {
        let count = self.skills.len();
        if index >= count {
            return Err(SkillRequestError::InvalidIndex { index, count });
        }
        if !self.can_upgrade(index, actor_level) {
            return Err(SkillRequestError::UpgradeRefused {
                name: self.skills[index].name().to_string(),
            });
        }
        let skill = &mut self.skills[index];
        skill.set_level(skill.level() + 1);
        Ok(skill.level())
    }

    /// Upgrades every skill that qualifies at `actor_level`, repeatedly.
    ///
    /// Returns the indices that changed.
    pub fn auto_upgrade(&mut self, actor_level: u32) -> Vec<usize> {
        let mut changed = Vec::new();
        for index in 0..self.skills.len() {
            while self.can_upgrade(index, actor_level) {
                if self.upgrade(index, actor_level).is_err() {
                    break;
                }
                if changed.last() != Some(&index) {
                    changed.push(index);
                }
            }
        }
        changed
    }

    // -------------------------------------------------------------------------
    // Buffs
    // -------------------------------------------------------------------------

    /// Active buffs.
    #[must_use]
    pub fn buffs(&self) -> &[Buff] {
        &self.buffs
    }

    /// Adds a buff, replacing one from the same source skill.
    pub fn add_or_refresh_buff(&mut self, buff: Buff) {
        if let Some(existing) = self.buffs.iter_mut().find(|b| b.source == buff.source) {
            *existing = buff;
        } else {
            self.buffs.push(buff);
        }
    }

    /// Drops buffs that do not survive death. Returns their sources.
    pub fn clear_buffs_on_death(&mut self) -> Vec<String> {
        let mut removed = Vec::new();
        self.buffs.retain(|b| {
            if b.remain_after_death {
                true
            } else {
                removed.push(b.source.clone());
                false
            }
        });
        removed
    }

    /// Advances cast, cooldown and buff timers. Returns expired buff sources.
    pub fn tick(&mut self, dt: f32) -> Vec<String> {
        for skill in &mut self.skills {
            skill.tick(dt);
        }
        let mut expired = Vec::new();
        self.buffs.retain_mut(|b| {
            if b.tick(dt) {
                expired.push(b.source.clone());
                false
            } else {
                true
            }
        });
        expired
    }

    /// Sum of buff and learned passive bonuses.
    #[must_use]
    pub fn bonuses(&self) -> StatBonuses {
        let passive: StatBonuses = self
            .skills
            .iter()
            .filter(|s| s.is_learned())
            .filter_map(|s| match &s.template.kind {
                SkillKind::Passive(curves) => Some(curves.at(s.level())),
                _ => None,
            })
            .sum();
        let buffs: StatBonuses = self.buffs.iter().map(|b| b.bonuses).sum();
        passive + buffs
    }
}
