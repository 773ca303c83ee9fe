//! Store methods for the teachers table (entity/pricing source).

use super::{format_timestamp, read_real, read_text, read_timestamp, SourceStore};
use crate::{
    error::{ReportError, ReportResult},
    model::{derive_entity_id, NewTeacher, Teacher},
    types::{is_valid_price, Price},
};
use rusqlite::{params, OptionalExtension};

const TEACHER_COLUMNS: &str =
    "id, user_id, name, email, school, subject, price_per_student, created_at";

fn teacher_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Teacher> {
    let row_id: i64 = row.get(0)?;
    let user_id = read_text(row, 1)?;
    Ok(Teacher {
        id: derive_entity_id(user_id.as_deref(), row_id),
        row_id,
        user_id,
        name:              read_text(row, 2)?,
        email:             read_text(row, 3)?,
        school:            read_text(row, 4)?,
        subject:           read_text(row, 5)?,
        price_per_student: read_real(row, 6)?,
        created_at:        read_timestamp(row, 7)?,
    })
}

impl SourceStore {
    // ── Teachers ──────────────────────────────────────────────────

    pub fn insert_teacher(&self, t: &NewTeacher) -> ReportResult<i64> {
        self.conn.execute(
            "INSERT INTO teachers (user_id, name, email, school, subject, price_per_student, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                t.user_id,
                t.name,
                t.email,
                t.school,
                t.subject,
                t.price_per_student,
                format_timestamp(t.created_at),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All teachers, newest first. Rows without a timestamp sort last,
    /// ties keep insertion order.
    pub fn teachers(&self) -> ReportResult<Vec<Teacher>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TEACHER_COLUMNS} FROM teachers
             ORDER BY created_at IS NULL, created_at DESC, id ASC"
        ))?;
        let rows = stmt.query_map([], teacher_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Look a teacher up by `user_id` first, then by row `id`.
    pub fn teacher_by_key(&self, key: &str) -> ReportResult<Option<Teacher>> {
        let by_user_id = self
            .conn
            .query_row(
                &format!("SELECT {TEACHER_COLUMNS} FROM teachers WHERE user_id = ?1 LIMIT 1"),
                params![key],
                teacher_from_row,
            )
            .optional()?;
        if by_user_id.is_some() {
            return Ok(by_user_id);
        }

        let Ok(row_id) = key.parse::<i64>() else {
            return Ok(None);
        };
        let by_id = self
            .conn
            .query_row(
                &format!("SELECT {TEACHER_COLUMNS} FROM teachers WHERE id = ?1"),
                params![row_id],
                teacher_from_row,
            )
            .optional()?;
        Ok(by_id)
    }

    /// Set the stored price for the teacher whose `user_id` or `id`
    /// matches `key`. Returns the number of rows touched.
    pub fn update_teacher_price(&self, key: &str, value: Price) -> ReportResult<usize> {
        if !is_valid_price(value) {
            return Err(ReportError::InvalidPrice { value });
        }
        let touched = self.conn.execute(
            "UPDATE teachers SET price_per_student = ?1
             WHERE user_id = ?2 OR CAST(id AS TEXT) = ?2",
            params![value, key],
        )?;
        Ok(touched)
    }
}
