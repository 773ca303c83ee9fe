//! Row types read from the two sources.
//!
//! Teachers and monthly enrollment records live in the teachers
//! source; students live in the students source. Both are read-only
//! snapshots once loaded.

use crate::types::{is_valid_price, EntityId, Period, Price};
use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefer the external `user_id` over the row id. Blank user ids
/// count as absent.
pub fn derive_entity_id(user_id: Option<&str>, row_id: i64) -> EntityId {
    match user_id {
        Some(u) if !u.is_empty() => u.to_string(),
        _ => row_id.to_string(),
    }
}

// ── Teacher ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Teacher {
    pub id:                EntityId,
    pub row_id:            i64,
    pub user_id:           Option<String>,
    pub name:              Option<String>,
    pub email:             Option<String>,
    pub school:            Option<String>,
    pub subject:           Option<String>,
    pub price_per_student: Option<Price>,
    pub created_at:        Option<DateTime<Utc>>,
}

impl Teacher {
    /// Minimal teacher with only an id, name and price. Used when
    /// rows come from somewhere other than the store.
    pub fn new(id: &str, name: Option<&str>, price_per_student: Option<Price>) -> Self {
        Self {
            id:                id.to_string(),
            row_id:            0,
            user_id:           Some(id.to_string()),
            name:              name.map(str::to_string),
            email:             None,
            school:            None,
            subject:           None,
            price_per_student,
            created_at:        None,
        }
    }

    /// The row's own price, only if it is usable.
    pub fn authoritative_price(&self) -> Option<Price> {
        self.price_per_student.filter(|p| is_valid_price(*p))
    }

    pub fn display_name(&self) -> String {
        match &self.name {
            Some(n) if !n.is_empty() => n.clone(),
            _ => "—".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewTeacher {
    pub user_id:           Option<String>,
    pub name:              Option<String>,
    pub email:             Option<String>,
    pub school:            Option<String>,
    pub subject:           Option<String>,
    pub price_per_student: Option<Price>,
    pub created_at:        Option<DateTime<Utc>>,
}

// ── Grade ──────────────────────────────────────────────────────────

/// Grades arrive either as numbers or as free text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Grade {
    Number(f64),
    Text(String),
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grade::Number(n) if n.fract() == 0.0 => write!(f, "{}", *n as i64),
            Grade::Number(n) => write!(f, "{n}"),
            Grade::Text(s) => f.write_str(s),
        }
    }
}

impl FromSql for Grade {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Integer(i) => Ok(Grade::Number(i as f64)),
            ValueRef::Real(r) => Ok(Grade::Number(r)),
            ValueRef::Text(t) => Ok(Grade::Text(String::from_utf8_lossy(t).into_owned())),
            ValueRef::Null | ValueRef::Blob(_) => Err(FromSqlError::InvalidType),
        }
    }
}

impl ToSql for Grade {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Grade::Number(n) => n.to_sql(),
            Grade::Text(s) => s.to_sql(),
        }
    }
}

// ── Enrollment ─────────────────────────────────────────────────────

/// One student enrolled with one teacher for one month.
///
/// Raw source rows may lack a teacher id or a month. The record keeps
/// them as `None`; grouping maps them to `""` and `0`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrollmentRecord {
    pub entity_id:   Option<EntityId>,
    pub entity_name: Option<String>,
    pub student_id:  Option<String>,
    pub period:      Option<Period>,
    pub created_at:  Option<DateTime<Utc>>,
    pub grade:       Option<Grade>,
}

impl EnrollmentRecord {
    pub fn new(entity_id: &str, period: Period) -> Self {
        Self {
            entity_id:   Some(entity_id.to_string()),
            entity_name: None,
            student_id:  None,
            period:      Some(period),
            created_at:  None,
            grade:       None,
        }
    }

    pub fn with_student(mut self, student_id: &str) -> Self {
        self.student_id = Some(student_id.to_string());
        self
    }

    /// Grouping key for the teacher. Missing ids group under "".
    pub fn entity_key(&self) -> &str {
        self.entity_id.as_deref().unwrap_or("")
    }

    /// Grouping key for the month. Missing months group under 0.
    pub fn period_key(&self) -> Period {
        self.period.unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewEnrollment {
    pub teacher_id:   Option<String>,
    pub teacher_name: Option<String>,
    pub student_id:   Option<String>,
    pub month_number: Option<i64>,
    pub grade:        Option<Grade>,
    pub created_at:   Option<DateTime<Utc>>,
}

// ── Student ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Student {
    pub row_id:        i64,
    pub student_id:    Option<String>,
    pub user_id:       Option<String>,
    pub name:          Option<String>,
    pub number:        Option<String>,
    pub parent_name:   Option<String>,
    pub parent_number: Option<String>,
    pub email:         Option<String>,
    pub school:        Option<String>,
    pub created_at:    Option<DateTime<Utc>>,
    pub updated_at:    Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct NewStudent {
    pub student_id:    Option<String>,
    pub user_id:       Option<String>,
    pub name:          Option<String>,
    pub number:        Option<String>,
    pub parent_name:   Option<String>,
    pub parent_number: Option<String>,
    pub email:         Option<String>,
    pub school:        Option<String>,
    pub created_at:    Option<DateTime<Utc>>,
}

/// Parse an RFC 3339 timestamp column. Malformed text reads as absent.
pub(crate) fn parse_timestamp(raw: Option<String>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Months arrive as SQL integers; negatives are treated as missing.
pub(crate) fn to_period(raw: Option<i64>) -> Option<Period> {
    raw.and_then(|m| Period::try_from(m).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_id_preferred_over_row_id() {
        assert_eq!(derive_entity_id(Some("u-7"), 3), "u-7");
        assert_eq!(derive_entity_id(Some(""), 3), "3");
        assert_eq!(derive_entity_id(None, 42), "42");
    }

    #[test]
    fn negative_and_missing_prices_are_not_authoritative() {
        assert_eq!(Teacher::new("a", None, Some(-1.0)).authoritative_price(), None);
        assert_eq!(Teacher::new("a", None, Some(f64::NAN)).authoritative_price(), None);
        assert_eq!(Teacher::new("a", None, None).authoritative_price(), None);
        assert_eq!(Teacher::new("a", None, Some(0.0)).authoritative_price(), Some(0.0));
    }

    #[test]
    fn grade_display_drops_integer_fraction() {
        assert_eq!(Grade::Number(9.0).to_string(), "9");
        assert_eq!(Grade::Number(8.5).to_string(), "8.5");
        assert_eq!(Grade::Text("A+".into()).to_string(), "A+");
    }

    #[test]
    fn malformed_rows_map_to_grouping_defaults() {
        let record = EnrollmentRecord {
            entity_id:   None,
            entity_name: None,
            student_id:  None,
            period:      to_period(Some(-3)),
            created_at:  parse_timestamp(Some("not a date".into())),
            grade:       None,
        };
        assert_eq!(record.entity_key(), "");
        assert_eq!(record.period_key(), 0);
        assert!(record.created_at.is_none());
    }
}
