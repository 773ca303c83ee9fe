//! Store methods for the students source.

use super::{format_timestamp, read_text, read_timestamp, SourceStore};
use crate::{
    error::ReportResult,
    model::{NewStudent, Student},
};
use rusqlite::{params, OptionalExtension};

const STUDENT_COLUMNS: &str = "id, student_id, user_id, name, number, parent_name, \
     parent_number, email, school, created_at, updated_at";

fn student_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        row_id:        row.get(0)?,
        student_id:    read_text(row, 1)?,
        user_id:       read_text(row, 2)?,
        name:          read_text(row, 3)?,
        number:        read_text(row, 4)?,
        parent_name:   read_text(row, 5)?,
        parent_number: read_text(row, 6)?,
        email:         read_text(row, 7)?,
        school:        read_text(row, 8)?,
        created_at:    read_timestamp(row, 9)?,
        updated_at:    read_timestamp(row, 10)?,
    })
}

impl SourceStore {
    // ── Students ──────────────────────────────────────────────────

    pub fn insert_student(&self, s: &NewStudent) -> ReportResult<i64> {
        let created_at = format_timestamp(s.created_at);
        self.conn.execute(
            "INSERT INTO students (
                student_id, user_id, name, number, parent_name, parent_number,
                email, school, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                s.student_id,
                s.user_id,
                s.name,
                s.number,
                s.parent_name,
                s.parent_number,
                s.email,
                s.school,
                created_at,
                created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All students, newest first.
    pub fn students(&self) -> ReportResult<Vec<Student>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students
             ORDER BY created_at IS NULL, created_at DESC, id ASC"
        ))?;
        let rows = stmt.query_map([], student_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn student_by_id(&self, student_id: &str) -> ReportResult<Option<Student>> {
        let student = self
            .conn
            .query_row(
                &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE student_id = ?1 LIMIT 1"),
                params![student_id],
                student_from_row,
            )
            .optional()?;
        Ok(student)
    }

    pub fn student_count(&self) -> ReportResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM students",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
