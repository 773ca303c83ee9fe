//! Grouping structures over raw enrollment records.
//!
//! Two counts live here and answer different questions:
//!   - slots:      distinct (teacher, month) pairs, duplicates collapsed
//!   - per period: every record in the month, duplicates included
//!
//! Records with no teacher id group under "", records with no month
//! under 0. Nothing is dropped.

use crate::{
    model::EnrollmentRecord,
    types::{EntityId, Period},
};
use std::collections::BTreeMap;

/// Structural composite key: (teacher id, month).
pub type SlotKey = (EntityId, Period);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrollmentIndex {
    by_slot:   BTreeMap<SlotKey, u64>,
    by_period: BTreeMap<Period, u64>,
}

impl EnrollmentIndex {
    pub fn build(records: &[EnrollmentRecord]) -> Self {
        let mut index = Self::default();
        for record in records {
            let period = record.period_key();
            *index
                .by_slot
                .entry((record.entity_key().to_string(), period))
                .or_insert(0) += 1;
            *index.by_period.entry(period).or_insert(0) += 1;
        }
        index
    }

    /// (teacher, month) -> record count, ordered by teacher then month.
    pub fn group_by_entity_and_period(&self) -> &BTreeMap<SlotKey, u64> {
        &self.by_slot
    }

    /// Distinct (teacher, month) pairs.
    pub fn distinct_pairs(&self) -> impl Iterator<Item = &SlotKey> + '_ {
        self.by_slot.keys()
    }

    pub fn distinct_pair_count(&self) -> usize {
        self.by_slot.len()
    }

    /// month -> total records across all teachers.
    pub fn count_by_period(&self) -> &BTreeMap<Period, u64> {
        &self.by_period
    }

    /// Months with any activity, ascending.
    pub fn periods(&self) -> impl Iterator<Item = Period> + '_ {
        self.by_period.keys().copied()
    }

    pub fn distinct_period_count(&self) -> usize {
        self.by_period.len()
    }

    pub fn count_for(&self, entity_id: &str, period: Period) -> u64 {
        self.by_slot
            .get(&(entity_id.to_string(), period))
            .copied()
            .unwrap_or(0)
    }

    /// (month, count) for one teacher, ascending by month.
    pub fn periods_for_entity(&self, entity_id: &str) -> Vec<(Period, u64)> {
        self.by_slot
            .range((entity_id.to_string(), Period::MIN)..=(entity_id.to_string(), Period::MAX))
            .map(|((_, period), count)| (*period, *count))
            .collect()
    }
}
