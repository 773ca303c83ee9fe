//! Store methods for monthly enrollment records (enrollment source).

use super::{format_timestamp, read_int, read_text, read_timestamp, SourceStore};
use crate::{
    error::ReportResult,
    model::{to_period, EnrollmentRecord, Grade, NewEnrollment},
    types::Period,
};
use rusqlite::{params, types::FromSql};

const RECORD_COLUMNS: &str =
    "teacher_id, teacher_name, student_id, month_number, grade, created_at";

fn record_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EnrollmentRecord> {
    Ok(EnrollmentRecord {
        entity_id:   read_text(row, 0)?,
        entity_name: read_text(row, 1)?,
        student_id:  read_text(row, 2)?,
        period:      to_period(read_int(row, 3)?),
        grade:       Grade::column_result(row.get_ref(4)?).ok(),
        created_at:  read_timestamp(row, 5)?,
    })
}

impl SourceStore {
    // ── Enrollment ────────────────────────────────────────────────

    pub fn insert_enrollment(&self, e: &NewEnrollment) -> ReportResult<i64> {
        self.conn.execute(
            "INSERT INTO teacher_month_students
                 (teacher_id, teacher_name, student_id, month_number, grade, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                e.teacher_id,
                e.teacher_name,
                e.student_id,
                e.month_number,
                e.grade,
                format_timestamp(e.created_at),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Every enrollment record, in insertion order.
    pub fn enrollments(&self) -> ReportResult<Vec<EnrollmentRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM teacher_month_students ORDER BY id ASC"
        ))?;
        let rows = stmt.query_map([], record_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn enrollments_for_teacher(&self, teacher_id: &str) -> ReportResult<Vec<EnrollmentRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM teacher_month_students
             WHERE teacher_id = ?1 ORDER BY id ASC"
        ))?;
        let rows = stmt.query_map(params![teacher_id], record_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// One teacher's records for one month, newest first. Month 0 also
    /// matches records stored without a usable month.
    pub fn enrollments_for_teacher_month(
        &self,
        teacher_id: &str,
        period: Period,
    ) -> ReportResult<Vec<EnrollmentRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM teacher_month_students
             WHERE teacher_id = ?1
             ORDER BY created_at IS NULL, created_at DESC, id ASC"
        ))?;
        let rows = stmt.query_map(params![teacher_id], record_from_row)?;
        let records = rows
            .filter(|r| r.as_ref().map_or(true, |r| r.period_key() == period))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// A student's subscriptions, ascending by month.
    pub fn enrollments_for_student(&self, student_id: &str) -> ReportResult<Vec<EnrollmentRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM teacher_month_students
             WHERE student_id = ?1 ORDER BY month_number ASC, id ASC"
        ))?;
        let rows = stmt.query_map(params![student_id], record_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
