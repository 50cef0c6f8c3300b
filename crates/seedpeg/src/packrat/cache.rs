use super::head::HeadId;
use super::outcome::Outcome;
use crate::grammar::RuleId;
use hashbrown::HashMap;

/// What the memo cache holds for one (rule, position) key.
///
/// An absent key means "never evaluated".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEntry<V> {
    Outcome(Outcome<V>),
    /// The rule is being evaluated at this position by the head in the given
    /// stack slot. Re-entering the key is a recursion cycle.
    InProgress(HeadId),
}

impl<V> CacheEntry<V> {
    #[must_use]
    pub const fn is_in_progress(&self) -> bool {
        matches!(self, Self::InProgress(_))
    }
}

type PositionTable<V> = HashMap<usize, CacheEntry<V>, ahash::RandomState>;

fn new_table<V>() -> PositionTable<V> {
    HashMap::with_hasher(ahash::RandomState::new())
}

/// Memoization cache: one position table per rule, alive for one parse.
///
/// There is no eviction. Without left recursion every rule body runs at most
/// once per position.
#[derive(Debug)]
pub struct MemoCache<V> {
    tables: Vec<PositionTable<V>>,
}

impl<V> MemoCache<V> {
    #[must_use]
    pub fn new(rule_count: usize) -> Self {
        Self {
            tables: (0..rule_count).map(|_| new_table()).collect(),
        }
    }

    /// Empty every table, keeping their allocations, and size the cache for
    /// `rule_count` rules.
    pub fn reset(&mut self, rule_count: usize) {
        self.tables.truncate(rule_count);
        for table in &mut self.tables {
            table.clear();
        }
        self.tables.resize_with(rule_count, new_table);
    }

    #[must_use]
    pub fn get(&self, rule: RuleId, position: usize) -> Option<&CacheEntry<V>> {
        self.tables.get(rule.index())?.get(&position)
    }

    /// The cached outcome, ignoring in-progress markers.
    #[must_use]
    pub fn outcome(&self, rule: RuleId, position: usize) -> Option<&Outcome<V>> {
        match self.get(rule, position)? {
            CacheEntry::Outcome(outcome) => Some(outcome),
            CacheEntry::InProgress(_) => None,
        }
    }

    pub fn put(&mut self, rule: RuleId, position: usize, entry: CacheEntry<V>) {
        let index = rule.index();
        if index >= self.tables.len() {
            self.tables.resize_with(index + 1, new_table);
        }
        if let Some(table) = self.tables.get_mut(index) {
            table.insert(position, entry);
        }
    }

    /// Remove and return the entry at the key.
    pub fn delete(&mut self, rule: RuleId, position: usize) -> Option<CacheEntry<V>> {
        self.tables.get_mut(rule.index())?.remove(&position)
    }

    /// Total number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.iter().map(HashMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.iter().all(HashMap::is_empty)
    }
}

impl<V> Default for MemoCache<V> {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packrat::ParseResult;

    fn success(start: usize, end: usize) -> CacheEntry<()> {
        CacheEntry::Outcome(Outcome::Success(ParseResult::new(start, end, ())))
    }

    #[test]
    fn test_put_get_delete() {
        let mut cache = MemoCache::new(2);
        let rule = RuleId::new(1);

        assert!(cache.get(rule, 0).is_none());
        cache.put(rule, 0, success(0, 3));
        assert_eq!(cache.get(rule, 0), Some(&success(0, 3)));
        assert!(cache.get(RuleId::new(0), 0).is_none());
        assert!(cache.get(rule, 1).is_none());

        assert_eq!(cache.delete(rule, 0), Some(success(0, 3)));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_failure_is_distinct_from_absent() {
        let mut cache: MemoCache<()> = MemoCache::new(1);
        let rule = RuleId::new(0);
        cache.put(rule, 4, CacheEntry::Outcome(Outcome::Failure));
        assert_eq!(cache.outcome(rule, 4), Some(&Outcome::Failure));
        assert_eq!(cache.outcome(rule, 5), None);
    }

    #[test]
    fn test_outcome_skips_in_progress() {
        let mut cache: MemoCache<()> = MemoCache::new(1);
        let rule = RuleId::new(0);
        cache.put(rule, 0, CacheEntry::InProgress(HeadId::new(0)));
        assert!(cache.get(rule, 0).is_some_and(CacheEntry::is_in_progress));
        assert_eq!(cache.outcome(rule, 0), None);
    }

    #[test]
    fn test_put_grows_for_unknown_rule() {
        let mut cache = MemoCache::new(0);
        cache.put(RuleId::new(3), 2, success(2, 2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_reset_clears_and_resizes() {
        let mut cache = MemoCache::new(1);
        cache.put(RuleId::new(0), 0, success(0, 1));
        cache.reset(3);
        assert!(cache.is_empty());
        cache.put(RuleId::new(2), 0, success(0, 1));
        assert_eq!(cache.len(), 1);
    }
}
