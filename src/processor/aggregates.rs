//! Full-dataset aggregates built during the first pass
//!
//! Both structures grow with the number of distinct keys in the whole
//! dataset, not with chunk size; they are the real memory ceiling of a run.

use crate::models::Record;
use std::collections::{HashMap, HashSet};

/// Occurrence count per composite duplicate key
#[derive(Debug, Default)]
pub struct DuplicateKeyCounter {
    width: usize,
    counts: HashMap<Vec<String>, usize>,
}

impl DuplicateKeyCounter {
    /// Counter keyed on the first `width` fields of each record
    pub fn new(width: usize) -> Self {
        Self {
            width,
            counts: HashMap::new(),
        }
    }

    pub fn observe(&mut self, record: &Record) {
        let key = record.key_prefix(self.width);
        match self.counts.get_mut(key) {
            Some(count) => *count += 1,
            None => {
                self.counts.insert(key.to_vec(), 1);
            }
        }
    }

    /// Times the record's key was observed
    pub fn count(&self, record: &Record) -> usize {
        self.counts
            .get(record.key_prefix(self.width))
            .copied()
            .unwrap_or(0)
    }

    pub fn is_duplicate(&self, record: &Record) -> bool {
        self.count(record) > 1
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of keys seen more than once
    pub fn duplicate_key_count(&self) -> usize {
        self.counts.values().filter(|&&count| count > 1).count()
    }
}

/// Distinct employers per (beneficiary, insurer) pair
#[derive(Debug, Default)]
pub struct AffiliationMap {
    employers: HashMap<String, HashMap<String, HashSet<String>>>,
    pairs: usize,
}

impl AffiliationMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, beneficiary: &str, insurer: &str, employer: &str) {
        let insurers = self.employers.entry(beneficiary.to_string()).or_default();
        if !insurers.contains_key(insurer) {
            self.pairs += 1;
            insurers.insert(insurer.to_string(), HashSet::new());
        }
        if let Some(employers) = insurers.get_mut(insurer) {
            if !employers.contains(employer) {
                employers.insert(employer.to_string());
            }
        }
    }

    /// Number of distinct (beneficiary, insurer) pairs
    pub fn len(&self) -> usize {
        self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs == 0
    }

    /// Keep only the pairs with more than one distinct employer
    pub fn into_multi_affiliation(self) -> MultiAffiliationSet {
        let mut keys: HashMap<String, HashSet<String>> = HashMap::new();
        let mut pairs = 0;

        for (beneficiary, insurers) in self.employers {
            let flagged: HashSet<String> = insurers
                .into_iter()
                .filter(|(_, employers)| employers.len() > 1)
                .map(|(insurer, _)| insurer)
                .collect();
            if !flagged.is_empty() {
                pairs += flagged.len();
                keys.insert(beneficiary, flagged);
            }
        }

        MultiAffiliationSet { keys, pairs }
    }
}

/// (beneficiary, insurer) pairs associated with several employers
#[derive(Debug, Default)]
pub struct MultiAffiliationSet {
    keys: HashMap<String, HashSet<String>>,
    pairs: usize,
}

impl MultiAffiliationSet {
    pub fn contains(&self, beneficiary: &str, insurer: &str) -> bool {
        self.keys
            .get(beneficiary)
            .is_some_and(|insurers| insurers.contains(insurer))
    }

    pub fn len(&self) -> usize {
        self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[&str]) -> Record {
        Record::new(fields.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_counter_uses_only_key_prefix() {
        let mut counter = DuplicateKeyCounter::new(2);
        counter.observe(&record(&["a", "b", "x"]));
        counter.observe(&record(&["a", "b", "y"]));
        counter.observe(&record(&["a", "c", "x"]));

        assert_eq!(counter.count(&record(&["a", "b", "z"])), 2);
        assert!(counter.is_duplicate(&record(&["a", "b", "x"])));
        assert!(!counter.is_duplicate(&record(&["a", "c", "x"])));
        assert_eq!(counter.count(&record(&["q", "q", "q"])), 0);
        assert_eq!(counter.len(), 2);
        assert_eq!(counter.duplicate_key_count(), 1);
    }

    #[test]
    fn test_occurrence_counts_are_unbounded_by_u32() {
        let mut counter = DuplicateKeyCounter::new(1);
        let key = record(&["a"]);
        counter.observe(&key);
        if let Some(count) = counter.counts.get_mut(key.key_prefix(1)) {
            *count = u32::MAX as usize;
        }
        counter.observe(&key);

        assert_eq!(counter.count(&key), u32::MAX as usize + 1);
        assert!(counter.is_duplicate(&key));
    }

    #[test]
    fn test_leading_zeros_make_distinct_keys() {
        let mut counter = DuplicateKeyCounter::new(1);
        counter.observe(&record(&["05"]));
        counter.observe(&record(&["5"]));
        assert_eq!(counter.len(), 2);
        assert!(!counter.is_duplicate(&record(&["5"])));
    }

    #[test]
    fn test_affiliation_counts_distinct_employers() {
        let mut map = AffiliationMap::new();
        map.observe("123", "500807", "30-1");
        map.observe("123", "500807", "30-1");
        map.observe("123", "500807", "30-2");
        map.observe("123", "0125", "30-1");
        map.observe("456", "0125", "30-9");

        assert_eq!(map.len(), 3);

        // Repeating an employer does not make a pair multi-affiliated
        let multi = map.into_multi_affiliation();
        assert!(multi.contains("123", "500807"));
        assert!(!multi.contains("123", "0125"));
        assert!(!multi.contains("999", "0125"));
    }

    #[test]
    fn test_multi_affiliation_keeps_pairs_with_several_employers() {
        let mut map = AffiliationMap::new();
        map.observe("123", "500807", "30-1");
        map.observe("123", "500807", "30-2");
        map.observe("123", "0125", "30-1");
        map.observe("456", "0125", "30-9");

        let multi = map.into_multi_affiliation();
        assert!(multi.contains("123", "500807"));
        assert!(!multi.contains("123", "0125"));
        assert!(!multi.contains("456", "0125"));
        assert_eq!(multi.len(), 1);
    }
}
