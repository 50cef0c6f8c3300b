//! Recursion heads: per-activation left-recursion bookkeeping.
//!
//! Based on "Packrat Parsers Can Support Left Recursion" (Warth, Douglass,
//! Millstein). A head lives in a call stack slot and walks through three
//! states while its rule is evaluated at one position:
//!
//! - `NoRecursion`: no cycle through this activation has been seen.
//! - `SeedParse`: a cycle came back to this activation; the body is being
//!   evaluated with the self-reference failing, to find the seed.
//! - `GrowLR`: the body is re-evaluated with the self-reference returning the
//!   current best match, trying to extend it.

use super::cache::{CacheEntry, MemoCache};
use super::outcome::Outcome;
use crate::grammar::RuleId;
use smallvec::SmallVec;

/// Index of a head in the call stack pool. Stable for the head's active
/// lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeadId(usize);

impl HeadId {
    #[must_use]
    pub const fn new(slot: usize) -> Self {
        Self(slot)
    }

    #[must_use]
    pub const fn slot(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadState {
    #[default]
    NoRecursion,
    SeedParse,
    GrowLR,
}

/// What the growth loop does with a body evaluation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthStep {
    /// No cycle touched the activation: the attempt is final.
    Accept,
    /// The attempt matched further than the cached best: store it and
    /// evaluate the body again.
    Grow,
    /// No progress: the cached best is final.
    Finish,
    /// The seed itself failed: the rule fails at this position.
    Fail,
}

impl GrowthStep {
    /// Decide the next step from the head state, the attempt's end (if it
    /// matched) and the end of the cached best match (if any).
    ///
    /// Progress is a strictly larger end. An equal-length match never
    /// replaces the accepted one, which keeps earlier alternatives winning.
    #[must_use]
    pub fn classify(state: HeadState, attempt_end: Option<usize>, best_end: Option<usize>) -> Self {
        match (state, attempt_end) {
            (HeadState::NoRecursion, _) => Self::Accept,
            (_, Some(end)) if best_end.is_none_or(|best| end > best) => Self::Grow,
            (_, Some(_)) | (HeadState::GrowLR, None) => Self::Finish,
            (HeadState::SeedParse, None) => Self::Fail,
        }
    }
}

/// Bookkeeping for one live rule activation.
///
/// Heads are pooled by the call stack and reset by field reassignment when a
/// slot is reused.
#[derive(Debug)]
pub struct RecursionHead<V> {
    rule: RuleId,
    state: HeadState,
    /// Rules entangled in a cycle through this head, excluding its own rule.
    involved: SmallVec<[RuleId; 4]>,
    /// Heads whose involved sets absorb this head's.
    parents: SmallVec<[HeadId; 2]>,
    /// Cache entries of involved rules moved aside during growth.
    saved: SmallVec<[(RuleId, Outcome<V>); 4]>,
}

impl<V> RecursionHead<V> {
    pub(crate) fn new(rule: RuleId) -> Self {
        Self {
            rule,
            state: HeadState::NoRecursion,
            involved: SmallVec::new(),
            parents: SmallVec::new(),
            saved: SmallVec::new(),
        }
    }

    pub(crate) fn reset(&mut self, rule: RuleId) {
        self.rule = rule;
        self.state = HeadState::NoRecursion;
        self.involved.clear();
        self.parents.clear();
        self.saved.clear();
    }

    #[must_use]
    pub const fn rule(&self) -> RuleId {
        self.rule
    }

    #[must_use]
    pub const fn state(&self) -> HeadState {
        self.state
    }

    /// Returns `true` while seeding or growing.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.state, HeadState::SeedParse | HeadState::GrowLR)
    }

    #[must_use]
    pub fn involved(&self) -> &[RuleId] {
        &self.involved
    }

    #[must_use]
    pub fn parents(&self) -> &[HeadId] {
        &self.parents
    }

    pub(crate) const fn set_state(&mut self, state: HeadState) {
        self.state = state;
    }

    pub(crate) fn involve(&mut self, rule: RuleId) {
        if rule != self.rule && !self.involved.contains(&rule) {
            self.involved.push(rule);
        }
    }

    pub(crate) fn add_parent(&mut self, parent: HeadId) {
        if !self.parents.contains(&parent) {
            self.parents.push(parent);
        }
    }

    pub(crate) fn take_parents(&mut self) -> SmallVec<[HeadId; 2]> {
        std::mem::take(&mut self.parents)
    }

    /// Move the cached results of involved rules at `position` aside so the
    /// next growth iteration re-evaluates them against the new seed.
    ///
    /// Rules with nothing cached keep their previously saved result. In-progress
    /// markers are left alone.
    pub(crate) fn uncache_involved(&mut self, cache: &mut MemoCache<V>, position: usize) {
        for &rule in &self.involved {
            if cache.outcome(rule, position).is_none() {
                continue;
            }
            if let Some(CacheEntry::Outcome(outcome)) = cache.delete(rule, position) {
                match self.saved.iter_mut().find(|(saved, _)| *saved == rule) {
                    Some((_, slot)) => *slot = outcome,
                    None => self.saved.push((rule, outcome)),
                }
            }
        }
    }

    /// Put the saved results of involved rules back at `position`, then clear
    /// the saved entries and the involved set.
    ///
    /// An involved rule with no saved result is left absent rather than
    /// keeping whatever the last, non-progressing iteration cached for it.
    pub(crate) fn restore_involved(&mut self, cache: &mut MemoCache<V>, position: usize) {
        for &rule in &self.involved {
            if cache.get(rule, position).is_some_and(CacheEntry::is_in_progress) {
                continue;
            }
            let saved = self
                .saved
                .iter()
                .position(|(saved, _)| *saved == rule)
                .map(|index| self.saved.swap_remove(index).1);
            match saved {
                Some(outcome) => cache.put(rule, position, CacheEntry::Outcome(outcome)),
                None => {
                    cache.delete(rule, position);
                }
            }
        }
        self.saved.clear();
        self.involved.clear();
    }
}
