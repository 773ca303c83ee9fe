//! Aggregation engine: revenue and headcount over one load.
//!
//! Pure: no I/O, no hidden state. Same inputs, same report.
//!
//! RULES:
//!   - Revenue of a (teacher, month) slot = record count × resolved price.
//!   - revenue_by_entity is parallel to the input teacher list, in
//!     input order, zero-filled.
//!   - Records whose teacher id matches no teacher (or is blank) still
//!     count toward headcount but earn no revenue. They are reported in
//!     `unmatched_records`.
//!   - When two teachers share an id, the first one owns the revenue.
//!   - total == Σ revenue_by_period == Σ revenue_by_entity.

use crate::{
    enrollment_index::EnrollmentIndex,
    model::{EnrollmentRecord, Teacher},
    pricing::PriceResolver,
    types::{Period, Price},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RevenueReport {
    pub revenue_by_period:     BTreeMap<Period, f64>,
    pub revenue_by_entity:     Vec<f64>,
    pub count_by_period:       BTreeMap<Period, u64>,
    pub total_revenue:         f64,
    pub distinct_period_count: usize,
    /// Distinct (teacher, month) pairs: the "months" tile.
    pub distinct_slot_count:   usize,
    pub unit_prices:           Vec<Price>,
    pub unmatched_records:     u64,
}

impl RevenueReport {
    /// Periods in ascending order.
    pub fn periods(&self) -> Vec<Period> {
        self.count_by_period.keys().copied().collect()
    }

    pub fn revenue_for_period(&self, period: Period) -> f64 {
        self.revenue_by_period.get(&period).copied().unwrap_or(0.0)
    }
}

pub fn aggregate(
    entities: &[Teacher],
    enrollments: &[EnrollmentRecord],
    resolver: &PriceResolver<'_>,
) -> RevenueReport {
    let index = EnrollmentIndex::build(enrollments);
    aggregate_index(entities, &index, resolver)
}

pub fn aggregate_index(
    entities: &[Teacher],
    index: &EnrollmentIndex,
    resolver: &PriceResolver<'_>,
) -> RevenueReport {
    let unit_prices: Vec<Price> = entities
        .iter()
        .map(|t| resolver.resolve_teacher(t).price)
        .collect();

    let mut position: HashMap<&str, usize> = HashMap::with_capacity(entities.len());
    for (i, teacher) in entities.iter().enumerate() {
        if teacher.id.is_empty() {
            continue;
        }
        position.entry(teacher.id.as_str()).or_insert(i);
    }

    let mut revenue_by_period: BTreeMap<Period, f64> =
        index.periods().map(|p| (p, 0.0)).collect();
    let mut revenue_by_entity = vec![0.0; entities.len()];
    let mut total_revenue = 0.0;
    let mut unmatched_records = 0;

    for ((entity_id, period), count) in index.group_by_entity_and_period() {
        let Some(&i) = position.get(entity_id.as_str()) else {
            unmatched_records += count;
            continue;
        };
        let revenue = *count as f64 * unit_prices[i];
        *revenue_by_period.entry(*period).or_insert(0.0) += revenue;
        revenue_by_entity[i] += revenue;
        total_revenue += revenue;
    }

    if unmatched_records > 0 {
        log::warn!("aggregation: {unmatched_records} record(s) reference no known teacher");
    }

    RevenueReport {
        revenue_by_period,
        revenue_by_entity,
        count_by_period: index.count_by_period().clone(),
        total_revenue,
        distinct_period_count: index.distinct_period_count(),
        distinct_slot_count: index.distinct_pair_count(),
        unit_prices,
        unmatched_records,
    }
}
