//! Source store tests: teachers, enrollment records, students.

use chrono::{TimeZone, Utc};
use stemify_core::{
    aggregation::aggregate,
    error::ReportError,
    model::{Grade, NewEnrollment, NewStudent, NewTeacher},
    overrides::OverrideStore,
    pricing::PriceResolver,
    store::SourceStore,
    types::DEFAULT_PRICE,
};

fn teachers_source() -> SourceStore {
    let store = SourceStore::in_memory().expect("in-memory store");
    store.migrate_teachers().expect("migration");
    store
}

/// Teachers source in a temp file, plus a raw connection for rows the
/// typed insert helpers cannot produce.
fn teachers_source_on_disk(name: &str) -> (SourceStore, rusqlite::Connection, String) {
    let path = std::env::temp_dir()
        .join(format!("stemify-{name}-{}.db", std::process::id()))
        .to_string_lossy()
        .into_owned();
    let _ = std::fs::remove_file(&path);
    let store = SourceStore::open(&path).unwrap();
    store.migrate_teachers().unwrap();
    let raw = rusqlite::Connection::open(&path).unwrap();
    (store, raw, path)
}

fn enroll(store: &SourceStore, teacher: &str, student: &str, month: Option<i64>) {
    store
        .insert_enrollment(&NewEnrollment {
            teacher_id: Some(teacher.into()),
            teacher_name: Some(format!("Name of {teacher}")),
            student_id: Some(student.into()),
            month_number: month,
            ..Default::default()
        })
        .unwrap();
}

#[test]
fn teacher_id_prefers_user_id_over_row_id() {
    let store = teachers_source();
    let with_user = store
        .insert_teacher(&NewTeacher { user_id: Some("ext-1".into()), ..Default::default() })
        .unwrap();
    let without_user = store.insert_teacher(&NewTeacher::default()).unwrap();

    let teachers = store.teachers().unwrap();
    let a = teachers.iter().find(|t| t.row_id == with_user).unwrap();
    let b = teachers.iter().find(|t| t.row_id == without_user).unwrap();

    assert_eq!(a.id, "ext-1");
    assert_eq!(b.id, without_user.to_string());
}

#[test]
fn teachers_listed_newest_first() {
    let store = teachers_source();
    for (user, day) in [("old", 1), ("new", 20), ("mid", 10)] {
        store
            .insert_teacher(&NewTeacher {
                user_id: Some(user.into()),
                created_at: Some(Utc.with_ymd_and_hms(2025, 3, day, 9, 0, 0).unwrap()),
                ..Default::default()
            })
            .unwrap();
    }
    store
        .insert_teacher(&NewTeacher { user_id: Some("undated".into()), ..Default::default() })
        .unwrap();

    let ids: Vec<String> = store.teachers().unwrap().into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec!["new", "mid", "old", "undated"]);
}

#[test]
fn teacher_lookup_by_user_id_then_row_id() {
    let store = teachers_source();
    let row_id = store
        .insert_teacher(&NewTeacher { name: Some("No External".into()), ..Default::default() })
        .unwrap();
    store
        .insert_teacher(&NewTeacher {
            user_id: Some("u-9".into()),
            name: Some("External".into()),
            ..Default::default()
        })
        .unwrap();

    let by_user = store.teacher_by_key("u-9").unwrap().unwrap();
    assert_eq!(by_user.name.as_deref(), Some("External"));

    let by_row = store.teacher_by_key(&row_id.to_string()).unwrap().unwrap();
    assert_eq!(by_row.name.as_deref(), Some("No External"));

    assert!(store.teacher_by_key("nope").unwrap().is_none());
}

#[test]
fn price_update_matches_user_id_or_row_id() {
    let store = teachers_source();
    let row_id = store.insert_teacher(&NewTeacher::default()).unwrap();
    store
        .insert_teacher(&NewTeacher { user_id: Some("u-1".into()), ..Default::default() })
        .unwrap();

    assert_eq!(store.update_teacher_price("u-1", 14.0).unwrap(), 1);
    assert_eq!(store.update_teacher_price(&row_id.to_string(), 16.0).unwrap(), 1);
    assert_eq!(store.update_teacher_price("missing", 16.0).unwrap(), 0);

    assert_eq!(store.teacher_by_key("u-1").unwrap().unwrap().price_per_student, Some(14.0));
    assert_eq!(
        store.teacher_by_key(&row_id.to_string()).unwrap().unwrap().price_per_student,
        Some(16.0)
    );
}

#[test]
fn negative_price_update_rejected() {
    let store = teachers_source();
    store
        .insert_teacher(&NewTeacher {
            user_id: Some("u-1".into()),
            price_per_student: Some(8.0),
            ..Default::default()
        })
        .unwrap();

    let result = store.update_teacher_price("u-1", -1.0);

    assert!(matches!(result, Err(ReportError::InvalidPrice { .. })));
    assert_eq!(store.teacher_by_key("u-1").unwrap().unwrap().price_per_student, Some(8.0));
}

#[test]
fn enrollment_filters() {
    let store = teachers_source();
    enroll(&store, "a", "s1", Some(2));
    enroll(&store, "a", "s2", Some(2));
    enroll(&store, "a", "s1", Some(1));
    enroll(&store, "b", "s1", Some(3));
    enroll(&store, "a", "s3", None);

    assert_eq!(store.enrollments().unwrap().len(), 5);
    assert_eq!(store.enrollments_for_teacher("a").unwrap().len(), 4);
    assert_eq!(store.enrollments_for_teacher_month("a", 2).unwrap().len(), 2);
    assert_eq!(
        store.enrollments_for_teacher_month("a", 0).unwrap().len(),
        1,
        "month 0 matches records without a month"
    );

    let months: Vec<u32> = store
        .enrollments_for_student("s1")
        .unwrap()
        .iter()
        .map(|r| r.period_key())
        .collect();
    assert_eq!(months, vec![1, 2, 3]);
}

#[test]
fn grades_read_back_as_number_or_text() {
    let store = teachers_source();
    store
        .insert_enrollment(&NewEnrollment {
            teacher_id: Some("a".into()),
            month_number: Some(1),
            grade: Some(Grade::Number(9.0)),
            ..Default::default()
        })
        .unwrap();
    store
        .insert_enrollment(&NewEnrollment {
            teacher_id: Some("a".into()),
            month_number: Some(1),
            grade: Some(Grade::Text("B+".into())),
            ..Default::default()
        })
        .unwrap();
    store
        .insert_enrollment(&NewEnrollment { teacher_id: Some("a".into()), ..Default::default() })
        .unwrap();

    let grades: Vec<Option<Grade>> =
        store.enrollments().unwrap().into_iter().map(|r| r.grade).collect();
    assert_eq!(
        grades,
        vec![Some(Grade::Number(9.0)), Some(Grade::Text("B+".into())), None]
    );
}

#[test]
fn negative_month_reads_as_missing() {
    let store = teachers_source();
    enroll(&store, "a", "s1", Some(-4));

    let records = store.enrollments().unwrap();
    assert_eq!(records[0].period, None);
    assert_eq!(records[0].period_key(), 0);
}

#[test]
fn created_at_round_trips() {
    let store = teachers_source();
    let ts = Utc.with_ymd_and_hms(2025, 1, 15, 12, 30, 0).unwrap();
    store
        .insert_enrollment(&NewEnrollment {
            teacher_id: Some("a".into()),
            month_number: Some(1),
            created_at: Some(ts),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(store.enrollments().unwrap()[0].created_at, Some(ts));
}

#[test]
fn students_source_basics() {
    let store = SourceStore::in_memory().unwrap();
    store.migrate_students().unwrap();

    store
        .insert_student(&NewStudent {
            student_id: Some("s1".into()),
            name: Some("Grace".into()),
            created_at: Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()),
            ..Default::default()
        })
        .unwrap();
    store
        .insert_student(&NewStudent {
            student_id: Some("s2".into()),
            name: Some("Alan".into()),
            created_at: Some(Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap()),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(store.student_count().unwrap(), 2);
    let names: Vec<Option<String>> = store.students().unwrap().into_iter().map(|s| s.name).collect();
    assert_eq!(names, vec![Some("Alan".into()), Some("Grace".into())]);
    assert_eq!(
        store.student_by_id("s1").unwrap().unwrap().name.as_deref(),
        Some("Grace")
    );
    assert!(store.student_by_id("s9").unwrap().is_none());
}

#[test]
fn malformed_enrollment_row_does_not_hide_the_others() {
    let (store, raw, path) = teachers_source_on_disk("bad-month");
    enroll(&store, "a", "s1", Some(1));
    enroll(&store, "a", "s2", Some(1));
    enroll(&store, "b", "s1", Some(2));
    raw.execute(
        "INSERT INTO teacher_month_students (teacher_id, student_id, month_number, grade)
         VALUES ('a', 's3', 'March', X'00FF')",
        [],
    )
    .unwrap();

    let records = store.enrollments().unwrap();
    assert_eq!(records.len(), 4, "the bad row is kept, not the whole query lost");
    assert_eq!(records[3].student_id.as_deref(), Some("s3"));
    assert_eq!(records[3].period, None);
    assert_eq!(records[3].period_key(), 0);
    assert_eq!(records[3].grade, None);
    assert_eq!(store.enrollments_for_teacher_month("a", 0).unwrap().len(), 1);
    assert_eq!(store.enrollments_for_teacher("a").unwrap().len(), 3);

    drop(store);
    drop(raw);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn malformed_price_falls_through_to_default() {
    let (store, raw, path) = teachers_source_on_disk("bad-price");
    store
        .insert_teacher(&NewTeacher {
            user_id: Some("a".into()),
            price_per_student: Some(10.0),
            ..Default::default()
        })
        .unwrap();
    raw.execute(
        "INSERT INTO teachers (user_id, name, price_per_student) VALUES ('b', 'Bea', 'n/a')",
        [],
    )
    .unwrap();
    enroll(&store, "a", "s1", Some(1));
    enroll(&store, "b", "s2", Some(1));

    let teachers = store.teachers().unwrap();
    assert_eq!(teachers.len(), 2);
    let b = teachers.iter().find(|t| t.id == "b").unwrap();
    assert_eq!(b.name.as_deref(), Some("Bea"));
    assert_eq!(b.price_per_student, None);

    let overrides = OverrideStore::in_memory();
    let resolver = PriceResolver::new(&overrides, DEFAULT_PRICE);
    let report = aggregate(&teachers, &store.enrollments().unwrap(), &resolver);
    assert_eq!(report.total_revenue, 10.0 + DEFAULT_PRICE);

    drop(store);
    drop(raw);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn month_records_newest_first() {
    let store = teachers_source();
    for (student, day) in [("s1", Some(3)), ("s2", None), ("s3", Some(9)), ("s4", Some(5))] {
        store
            .insert_enrollment(&NewEnrollment {
                teacher_id: Some("a".into()),
                student_id: Some(student.into()),
                month_number: Some(1),
                created_at: day.map(|d| Utc.with_ymd_and_hms(2025, 1, d, 8, 0, 0).unwrap()),
                ..Default::default()
            })
            .unwrap();
    }
    enroll(&store, "a", "s9", Some(2));

    let students: Vec<String> = store
        .enrollments_for_teacher_month("a", 1)
        .unwrap()
        .into_iter()
        .filter_map(|r| r.student_id)
        .collect();
    assert_eq!(students, vec!["s3", "s4", "s1", "s2"]);
}
