use super::head::{HeadId, HeadState, RecursionHead};
use crate::error::InvariantViolation;
use crate::grammar::RuleId;
use smallvec::SmallVec;

/// Stack of live rule activations.
///
/// Slots are pooled: popping only lowers `depth`, and a later push resets the
/// slot's fields in place. Slots below `depth` are live; their index is the
/// activation's [`HeadId`].
#[derive(Debug)]
pub struct CallStack<V> {
    slots: Vec<RecursionHead<V>>,
    depth: usize,
}

impl<V> CallStack<V> {
    /// Create a stack with `capacity` preallocated slots.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let placeholder = RuleId::new(0);
        Self {
            slots: (0..capacity).map(|_| RecursionHead::new(placeholder)).collect(),
            depth: 0,
        }
    }

    /// Activate the next slot for `rule`.
    pub fn push(&mut self, rule: RuleId) -> HeadId {
        let id = HeadId::new(self.depth);
        match self.slots.get_mut(self.depth) {
            Some(slot) => slot.reset(rule),
            None => self.slots.push(RecursionHead::new(rule)),
        }
        self.depth += 1;
        id
    }

    /// Deactivate the top slot and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantViolation::StackUnderflow`] when nothing is live.
    pub fn pop(&mut self) -> Result<HeadId, InvariantViolation> {
        if self.depth == 0 {
            return Err(InvariantViolation::StackUnderflow);
        }
        self.depth -= 1;
        Ok(HeadId::new(self.depth))
    }

    /// Number of live activations.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Number of pooled slots, live or not.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub const fn is_live(&self, id: HeadId) -> bool {
        id.slot() < self.depth
    }

    /// The live head in slot `id`.
    #[must_use]
    pub fn head(&self, id: HeadId) -> Option<&RecursionHead<V>> {
        self.live().get(id.slot())
    }

    pub fn head_mut(&mut self, id: HeadId) -> Option<&mut RecursionHead<V>> {
        let depth = self.depth;
        self.slots.get_mut(..depth)?.get_mut(id.slot())
    }

    /// All live heads, bottom first.
    #[must_use]
    pub fn live(&self) -> &[RecursionHead<V>] {
        self.slots.get(..self.depth).unwrap_or_default()
    }

    /// The live heads pushed strictly after `id`, bottom first.
    #[must_use]
    pub fn frames_above(&self, id: HeadId) -> &[RecursionHead<V>] {
        self.live().get(id.slot() + 1..).unwrap_or_default()
    }

    /// Drop every live activation, keeping the pooled slots.
    pub fn reset(&mut self) {
        self.depth = 0;
    }

    /// A cycle re-entered the activation in slot `id`.
    ///
    /// Every rule pushed above it joins its involved set, and it becomes a
    /// parent of every head above it so their own discoveries flow back down.
    pub fn found(&mut self, id: HeadId) {
        let depth = self.depth;
        let Some(live) = self.slots.get_mut(..depth) else {
            return;
        };
        if id.slot() >= live.len() {
            return;
        }
        let (below, above) = live.split_at_mut(id.slot() + 1);
        let Some(head) = below.last_mut() else {
            return;
        };
        for frame in above.iter_mut() {
            head.involve(frame.rule());
            frame.add_parent(id);
        }
        head.set_state(HeadState::SeedParse);
    }

    /// Merge the involved set of slot `id` into each of its parents, then
    /// forget the parents. A parent never absorbs its own rule.
    pub fn report_to_parents(&mut self, id: HeadId) {
        let Some(head) = self.head_mut(id) else {
            return;
        };
        let parents = head.take_parents();
        if parents.is_empty() {
            return;
        }
        let involved: SmallVec<[RuleId; 4]> = head.involved().iter().copied().collect();
        for parent in parents {
            if let Some(parent) = self.head_mut(parent) {
                for &rule in &involved {
                    parent.involve(rule);
                }
            }
        }
    }
}

impl<V> Default for CallStack<V> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}
