//! Fetch orchestration for the reporting views.
//!
//! The dashboard load is forgiving: each source query runs on its own,
//! a failed query contributes an empty collection, and the first
//! failure is carried as a single message next to the numbers.
//! The detail views surface fetch errors to the caller instead.

use crate::{
    config::ReportConfig,
    error::ReportResult,
    model::Teacher,
    overrides::OverrideStore,
    pricing::{commit_price_edit, PriceResolver},
    report::{
        month_detail, student_subscriptions, teacher_months, teacher_prices, DashboardSummary,
        MonthDetail, StudentSubscriptions, TeacherMonths, TeacherPrice,
    },
    store::SourceStore,
    types::{Period, Price},
};

pub struct ReportLoader<'a> {
    teachers_source: &'a SourceStore,
    students_source: &'a SourceStore,
    overrides:       &'a OverrideStore,
    config:          &'a ReportConfig,
}

impl<'a> ReportLoader<'a> {
    pub fn new(
        teachers_source: &'a SourceStore,
        students_source: &'a SourceStore,
        overrides: &'a OverrideStore,
        config: &'a ReportConfig,
    ) -> Self {
        Self { teachers_source, students_source, overrides, config }
    }

    fn resolver(&self) -> PriceResolver<'a> {
        PriceResolver::new(self.overrides, self.config.default_price)
    }

    /// Home page numbers. Never fails; see `DashboardSummary::error`.
    pub fn load_dashboard(&self) -> DashboardSummary {
        let mut error: Option<String> = None;

        let student_count = or_empty(self.students_source.student_count(), "students", &mut error);
        let teachers = or_empty(self.teachers_source.teachers(), "teachers", &mut error);
        let enrollments = or_empty(self.teachers_source.enrollments(), "enrollments", &mut error);

        let summary = DashboardSummary::build(
            student_count,
            teachers,
            enrollments,
            &self.resolver(),
            error,
        );

        log::info!(
            "loader: dashboard {} students, {} teachers, {} slots, total revenue {:.2}",
            summary.student_count,
            summary.teacher_count,
            summary.slot_count,
            summary.report.total_revenue
        );
        summary
    }

    pub fn load_teacher_prices(&self) -> ReportResult<Vec<TeacherPrice>> {
        let teachers = self.teachers_source.teachers()?;
        Ok(teacher_prices(&teachers, &self.resolver()))
    }

    /// Months for the teacher matching `teacher_key` (user id or row id).
    pub fn load_teacher_months(&self, teacher_key: &str) -> ReportResult<TeacherMonths> {
        let teacher = self.teachers_source.teacher_by_key(teacher_key)?;
        let teacher_id = canonical_id(teacher_key, teacher.as_ref());
        let records = self.teachers_source.enrollments_for_teacher(teacher_id)?;
        Ok(teacher_months(teacher_id, teacher.as_ref(), &records, &self.resolver()))
    }

    pub fn load_month_detail(&self, teacher_key: &str, period: Period) -> ReportResult<MonthDetail> {
        let teacher = self.teachers_source.teacher_by_key(teacher_key)?;
        let teacher_id = canonical_id(teacher_key, teacher.as_ref());
        let records = self
            .teachers_source
            .enrollments_for_teacher_month(teacher_id, period)?;
        Ok(month_detail(teacher_id, period, teacher.as_ref(), &records, &self.resolver()))
    }

    pub fn load_student(&self, student_id: &str) -> ReportResult<StudentSubscriptions> {
        let student = self.students_source.student_by_id(student_id)?;
        let records = self.teachers_source.enrollments_for_student(student_id)?;
        Ok(student_subscriptions(student_id, student.as_ref(), &records, self.config))
    }

    /// Commit a price edit for the teacher matching `teacher_key`.
    /// Returns false when the value was rejected.
    pub fn set_price(&self, teacher_key: &str, value: Price) -> ReportResult<bool> {
        let teacher = self
            .teachers_source
            .teacher_by_key(teacher_key)?
            .unwrap_or_else(|| Teacher::new(teacher_key, None, None));
        commit_price_edit(self.teachers_source, self.overrides, &teacher, value)
    }
}

/// Records and overrides are keyed by the teacher's id, whichever key
/// found the row. Unknown keys are used as given.
fn canonical_id<'k>(teacher_key: &'k str, teacher: Option<&'k Teacher>) -> &'k str {
    teacher.map_or(teacher_key, |t| t.id.as_str())
}

fn or_empty<T: Default>(
    result: ReportResult<T>,
    what: &str,
    error: &mut Option<String>,
) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            log::warn!("loader: failed to fetch {what}: {e}");
            error.get_or_insert_with(|| e.to_string());
            T::default()
        }
    }
}
