//! SQLite persistence layer.
//!
//! RULE: Only store/ talks to the database.
//! Everything else calls store methods, never SQL directly.
//!
//! One `SourceStore` is one source. The teachers source holds teachers
//! and monthly enrollment records; the students source holds students;
//! the local store holds the override slot. Nothing is shared between
//! them and nothing spans two of them in a transaction.

use crate::{error::ReportResult, model::parse_timestamp};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{types::ValueRef, Connection};

mod enrollment;
mod local_slot;
mod students;
mod teachers;

pub struct SourceStore {
    conn: Connection,
}

impl SourceStore {
    pub fn open(path: &str) -> ReportResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> ReportResult<Self> {
        let conn = Connection::open(":memory:")?;
        Ok(Self { conn })
    }

    /// Schema for the teachers source.
    pub fn migrate_teachers(&self) -> ReportResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_teachers.sql"))?;
        Ok(())
    }

    /// Schema for the students source.
    pub fn migrate_students(&self) -> ReportResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/002_students.sql"))?;
        Ok(())
    }

    /// Schema for the device-local slot store.
    pub fn migrate_local(&self) -> ReportResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/003_local_slot.sql"))?;
        Ok(())
    }
}

fn format_timestamp(ts: Option<DateTime<Utc>>) -> Option<String> {
    ts.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
}

// Column readers for source rows. A value of the wrong storage class
// reads as absent so one malformed row cannot fail a whole query.

fn read_timestamp(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    Ok(parse_timestamp(read_text(row, idx)?))
}

fn read_text(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Text(t) => Some(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(r) => Some(r.to_string()),
        ValueRef::Null | ValueRef::Blob(_) => None,
    })
}

fn read_int(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Option<i64>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Integer(i) => Some(i),
        ValueRef::Real(r) if r.is_finite() && r.fract() == 0.0 => Some(r as i64),
        _ => None,
    })
}

fn read_real(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Option<f64>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Integer(i) => Some(i as f64),
        ValueRef::Real(r) => Some(r),
        _ => None,
    })
}
