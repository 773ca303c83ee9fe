//! Per-page report views built from already-fetched rows.
//!
//! Like the aggregation engine these are pure; fetching lives in
//! loader.rs.

use crate::{
    aggregation::RevenueReport,
    config::ReportConfig,
    enrollment_index::EnrollmentIndex,
    model::{EnrollmentRecord, Grade, Student, Teacher},
    pricing::{PriceResolver, PriceSource},
    types::{EntityId, Period, Price},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Dashboard ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DashboardSummary {
    pub student_count:      i64,
    pub teacher_count:      usize,
    /// Distinct (teacher, month) pairs.
    pub slot_count:         usize,
    pub report:             RevenueReport,
    /// Chart labels, parallel to `report.revenue_by_entity`.
    pub teacher_names:      Vec<String>,
    /// Months for the headcount chart, ascending. Month 0 is left out.
    pub month_series:       Vec<Period>,
    pub students_per_month: Vec<u64>,
    pub teachers:           Vec<Teacher>,
    pub enrollments:        Vec<EnrollmentRecord>,
    /// First fetch failure, if any. The rest of the summary is still filled.
    pub error:              Option<String>,
}

impl DashboardSummary {
    pub fn build(
        student_count: i64,
        teachers: Vec<Teacher>,
        enrollments: Vec<EnrollmentRecord>,
        resolver: &PriceResolver<'_>,
        error: Option<String>,
    ) -> Self {
        let index = EnrollmentIndex::build(&enrollments);
        let report = crate::aggregation::aggregate_index(&teachers, &index, resolver);

        let month_series: Vec<Period> = index.periods().filter(|p| *p != 0).collect();
        let students_per_month = month_series
            .iter()
            .map(|p| index.count_by_period().get(p).copied().unwrap_or(0))
            .collect();

        Self {
            student_count,
            teacher_count: teachers.len(),
            slot_count: index.distinct_pair_count(),
            teacher_names: teachers.iter().map(Teacher::display_name).collect(),
            report,
            month_series,
            students_per_month,
            teachers,
            enrollments,
            error,
        }
    }
}

// ── Teacher months ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeacherMonth {
    pub period:        Period,
    pub teacher_name:  Option<String>,
    pub student_count: u64,
    pub revenue:       f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeacherMonths {
    pub teacher_id:   EntityId,
    pub display_name: String,
    pub unit_price:   Price,
    pub price_source: PriceSource,
    pub months:       Vec<TeacherMonth>,
}

impl TeacherMonths {
    pub fn total_revenue(&self) -> f64 {
        self.months.iter().map(|m| m.revenue).sum()
    }
}

/// Months one teacher has students in, ascending. `records` may hold
/// other teachers' rows; they are ignored.
pub fn teacher_months(
    teacher_id: &str,
    teacher: Option<&Teacher>,
    records: &[EnrollmentRecord],
    resolver: &PriceResolver<'_>,
) -> TeacherMonths {
    let index = EnrollmentIndex::build(records);
    let resolved = resolver.resolve_with_source(
        Some(teacher_id),
        teacher.and_then(|t| t.price_per_student),
    );

    let months = index
        .periods_for_entity(teacher_id)
        .into_iter()
        .map(|(period, student_count)| TeacherMonth {
            period,
            // Name as written on the month's first record.
            teacher_name: records
                .iter()
                .find(|r| r.entity_key() == teacher_id && r.period_key() == period)
                .and_then(|r| r.entity_name.clone()),
            student_count,
            revenue: student_count as f64 * resolved.price,
        })
        .collect();

    TeacherMonths {
        teacher_id:   teacher_id.to_string(),
        display_name: teacher_display_name(teacher_id, teacher),
        unit_price:   resolved.price,
        price_source: resolved.source,
        months,
    }
}

// ── Month detail ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthDetail {
    pub teacher_id:    EntityId,
    pub period:        Period,
    pub display_name:  String,
    pub unit_price:    Price,
    pub records:       Vec<EnrollmentRecord>,
    pub student_count: u64,
    /// student_count × unit_price
    pub total:         f64,
}

pub fn month_detail(
    teacher_id: &str,
    period: Period,
    teacher: Option<&Teacher>,
    records: &[EnrollmentRecord],
    resolver: &PriceResolver<'_>,
) -> MonthDetail {
    let records: Vec<EnrollmentRecord> = records
        .iter()
        .filter(|r| r.entity_key() == teacher_id && r.period_key() == period)
        .cloned()
        .collect();
    let unit_price = resolver.resolve(Some(teacher_id), teacher.and_then(|t| t.price_per_student));
    let student_count = EnrollmentIndex::build(&records).count_for(teacher_id, period);

    MonthDetail {
        teacher_id: teacher_id.to_string(),
        period,
        display_name: teacher_display_name(teacher_id, teacher),
        unit_price,
        total: student_count as f64 * unit_price,
        student_count,
        records,
    }
}

// ── Student subscriptions ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subscription {
    pub teacher_id:   EntityId,
    pub teacher_name: Option<String>,
    pub period:       Period,
    pub period_label: String,
    pub grade:        Option<Grade>,
    pub created_at:   Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentSubscriptions {
    pub student_id:    String,
    pub display_name:  String,
    pub subscriptions: Vec<Subscription>,
}

/// A student's subscriptions ordered by month; ties keep input order.
pub fn student_subscriptions(
    student_id: &str,
    student: Option<&Student>,
    records: &[EnrollmentRecord],
    config: &ReportConfig,
) -> StudentSubscriptions {
    let mut subscriptions: Vec<Subscription> = records
        .iter()
        .filter(|r| r.student_id.as_deref() == Some(student_id))
        .map(|r| Subscription {
            teacher_id:   r.entity_key().to_string(),
            teacher_name: r.entity_name.clone(),
            period:       r.period_key(),
            period_label: config.period_label(r.period_key()),
            grade:        r.grade.clone(),
            created_at:   r.created_at,
        })
        .collect();
    subscriptions.sort_by_key(|s| s.period);

    let display_name = match student.and_then(|s| s.name.as_deref()) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("Student {student_id}"),
    };

    StudentSubscriptions {
        student_id: student_id.to_string(),
        display_name,
        subscriptions,
    }
}

// ── Teacher price table ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeacherPrice {
    pub teacher: Teacher,
    pub price:   Price,
    pub source:  PriceSource,
}

pub fn teacher_prices(teachers: &[Teacher], resolver: &PriceResolver<'_>) -> Vec<TeacherPrice> {
    teachers
        .iter()
        .map(|t| {
            let resolved = resolver.resolve_teacher(t);
            TeacherPrice {
                teacher: t.clone(),
                price:   resolved.price,
                source:  resolved.source,
            }
        })
        .collect()
}

fn teacher_display_name(teacher_id: &str, teacher: Option<&Teacher>) -> String {
    match teacher.and_then(|t| t.name.as_deref()) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("Teacher {teacher_id}"),
    }
}
