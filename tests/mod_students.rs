use chrono::NaiveDate;
use students_marks::Database;
use students_marks::config::AppConfig;
use students_marks::errors::StudentsError;
use students_marks::students::{Mark, Student, StudentsService, StudentsServiceImpl};

fn service() -> StudentsServiceImpl {
    Database::in_memory().students_service(&AppConfig::default()).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn ids(students: &[Student]) -> Vec<i64> {
    students.iter().map(|s| s.id).collect()
}

#[test]
fn add_student_then_marks() {
    let svc = service();
    let added = svc.add_student(&Student::new(8, "058-1234567")).unwrap();
    assert_eq!(added, Student::new(8, "058-1234567"));
    assert!(svc.get_marks(8).unwrap().is_empty());

    let mark = Mark::new("Math", 70, date(2024, 1, 15));
    assert_eq!(svc.add_mark(8, &mark).unwrap(), mark);
    assert_eq!(svc.get_marks(8).unwrap(), vec![mark]);
    assert_eq!(svc.get_student(8).unwrap(), Student::new(8, "058-1234567"));
}

#[test]
fn duplicate_student_is_rejected() {
    let svc = service();
    svc.add_student(&Student::new(1, "050-1")).unwrap();
    let err = svc.add_student(&Student::new(1, "050-2")).unwrap_err();
    assert!(err.is_already_exists());
    assert_eq!(svc.get_student(1).unwrap().phone, "050-1");
}

#[test]
fn unknown_id_is_not_found_everywhere() {
    let svc = service();
    let mark = Mark::new("Math", 90, date(2024, 1, 1));
    assert!(svc.add_mark(42, &mark).unwrap_err().is_not_found());
    assert!(svc.update_phone_number(42, "050").unwrap_err().is_not_found());
    assert!(svc.remove_student(42).unwrap_err().is_not_found());
    assert!(svc.get_student(42).unwrap_err().is_not_found());
    assert!(svc.get_marks(42).unwrap_err().is_not_found());
    assert!(svc.get_student_marks_subject(42, "Math").unwrap_err().is_not_found());
    assert!(svc.get_student_marks_at_dates(42, date(2024, 1, 1), date(2024, 2, 1)).unwrap_err().is_not_found());
}

#[test]
fn marks_keep_append_order() {
    let svc = service();
    svc.add_student(&Student::new(3, "052")).unwrap();
    let marks = vec![
        Mark::new("Physics", 60, date(2024, 3, 1)),
        Mark::new("Math", 95, date(2024, 1, 1)),
        Mark::new("Physics", 60, date(2024, 3, 1)),
    ];
    for m in &marks {
        svc.add_mark(3, m).unwrap();
    }
    assert_eq!(svc.get_marks(3).unwrap(), marks);
}

#[test]
fn phone_update_leaves_marks_alone() {
    let svc = service();
    svc.add_student(&Student::new(5, "050-5")).unwrap();
    let mark = Mark::new("History", 77, date(2023, 11, 2));
    svc.add_mark(5, &mark).unwrap();

    let updated = svc.update_phone_number(5, "054-9").unwrap();
    assert_eq!(updated, Student::new(5, "054-9"));
    assert_eq!(svc.get_marks(5).unwrap(), vec![mark]);
    assert_eq!(svc.get_student_by_phone_number("054-9").unwrap(), Some(Student::new(5, "054-9")));
    assert_eq!(svc.get_student_by_phone_number("050-5").unwrap(), None);
}

#[test]
fn remove_returns_last_state() {
    let svc = service();
    svc.add_student(&Student::new(9, "059")).unwrap();
    svc.add_mark(9, &Mark::new("Art", 88, date(2024, 5, 5))).unwrap();

    let removed = svc.remove_student(9).unwrap();
    assert_eq!(removed.id, 9);
    assert_eq!(removed.phone, "059");
    assert_eq!(removed.marks, vec![Mark::new("Art", 88, date(2024, 5, 5))]);
    assert!(svc.get_student(9).unwrap_err().is_not_found());
    assert!(svc.remove_student(9).unwrap_err().is_not_found());
}

#[test]
fn phone_prefix_needs_extra_characters() {
    let svc = service();
    svc.add_student(&Student::new(1, "050-111")).unwrap();
    svc.add_student(&Student::new(2, "050")).unwrap();
    svc.add_student(&Student::new(3, "052-333")).unwrap();
    svc.add_student(&Student::new(4, "050-444")).unwrap();

    assert_eq!(ids(&svc.get_students_by_phone_prefix("050").unwrap()), vec![1, 4]);
    assert!(svc.get_students_by_phone_prefix("053").unwrap().is_empty());
}

#[test]
fn phone_prefix_is_literal() {
    let svc = service();
    svc.add_student(&Student::new(1, "+972-50")).unwrap();
    svc.add_student(&Student::new(2, "9972-50")).unwrap();
    assert_eq!(ids(&svc.get_students_by_phone_prefix("+9").unwrap()), vec![1]);
    assert_eq!(ids(&svc.get_students_by_phone_prefix(".").unwrap()), Vec::<i64>::new());
}

fn seeded() -> StudentsServiceImpl {
    let svc = service();
    for (id, phone) in [(1, "050-1"), (2, "050-2"), (3, "050-3"), (4, "050-4")] {
        svc.add_student(&Student::new(id, phone)).unwrap();
    }
    svc.add_mark(1, &Mark::new("Math", 90, date(2024, 1, 15))).unwrap();
    svc.add_mark(1, &Mark::new("Physics", 85, date(2024, 2, 1))).unwrap();
    svc.add_mark(2, &Mark::new("Math", 70, date(2024, 1, 31))).unwrap();
    svc.add_mark(2, &Mark::new("Math", 95, date(2024, 3, 1))).unwrap();
    svc.add_mark(2, &Mark::new("History", 60, date(2024, 1, 1))).unwrap();
    svc.add_mark(3, &Mark::new("Physics", 55, date(2023, 12, 31))).unwrap();
    // student 4 has no marks
    svc
}

#[test]
fn students_with_mark_on_date() {
    let svc = seeded();
    assert_eq!(ids(&svc.get_students_marks_date(date(2024, 1, 15)).unwrap()), vec![1]);
    assert!(svc.get_students_marks_date(date(2024, 1, 16)).unwrap().is_empty());
}

#[test]
fn students_with_mark_in_month() {
    let svc = seeded();
    assert_eq!(ids(&svc.get_students_marks_month_year(1, 2024).unwrap()), vec![1, 2]);
    assert_eq!(ids(&svc.get_students_marks_month_year(12, 2023).unwrap()), vec![3]);
    assert!(svc.get_students_marks_month_year(6, 2024).unwrap().is_empty());
    assert!(matches!(svc.get_students_marks_month_year(13, 2024), Err(StudentsError::InvalidArgument(_))));
}

#[test]
fn good_subject_mark_is_strict() {
    let svc = seeded();
    assert_eq!(ids(&svc.get_students_good_subject_mark("Math", 80).unwrap()), vec![1, 2]);
    assert_eq!(ids(&svc.get_students_good_subject_mark("Math", 90).unwrap()), vec![2]);
    assert!(svc.get_students_good_subject_mark("Math", 95).unwrap().is_empty());
    assert!(svc.get_students_good_subject_mark("Art", 0).unwrap().is_empty());
}

#[test]
fn all_good_marks_needs_every_mark_above() {
    let svc = seeded();
    assert_eq!(ids(&svc.get_students_all_good_marks(80).unwrap()), vec![1]);
    assert_eq!(ids(&svc.get_students_all_good_marks(50).unwrap()), vec![1, 2, 3]);
    // a student without marks never qualifies
    assert!(!ids(&svc.get_students_all_good_marks(0).unwrap()).contains(&4));
}

#[test]
fn all_good_marks_in_subject() {
    let svc = seeded();
    assert_eq!(ids(&svc.get_students_all_good_marks_subject("Math", 80).unwrap()), vec![1]);
    assert_eq!(ids(&svc.get_students_all_good_marks_subject("Math", 65).unwrap()), vec![1, 2]);
    assert_eq!(ids(&svc.get_students_all_good_marks_subject("Physics", 50).unwrap()), vec![1, 3]);
}

#[test]
fn few_marks_counts_empty_lists() {
    let svc = seeded();
    assert_eq!(ids(&svc.get_students_few_marks(2).unwrap()), vec![3, 4]);
    assert_eq!(ids(&svc.get_students_few_marks(1).unwrap()), vec![4]);
    assert!(svc.get_students_few_marks(0).unwrap().is_empty());
}

#[test]
fn marks_amount_between_is_inclusive() {
    let svc = seeded();
    assert_eq!(ids(&svc.get_students_marks_amount_between(1, 2).unwrap()), vec![1, 3]);
    assert_eq!(ids(&svc.get_students_marks_amount_between(0, 0).unwrap()), vec![4]);
    assert_eq!(ids(&svc.get_students_marks_amount_between(3, 10).unwrap()), vec![2]);
    assert!(svc.get_students_marks_amount_between(3, 1).unwrap().is_empty());
}

#[test]
fn marks_of_one_student_by_subject_and_dates() {
    let svc = seeded();
    assert_eq!(
        svc.get_student_marks_subject(2, "Math").unwrap(),
        vec![Mark::new("Math", 70, date(2024, 1, 31)), Mark::new("Math", 95, date(2024, 3, 1))]
    );
    assert!(svc.get_student_marks_subject(4, "Math").unwrap().is_empty());

    assert_eq!(
        svc.get_student_marks_at_dates(2, date(2024, 1, 1), date(2024, 1, 31)).unwrap(),
        vec![Mark::new("Math", 70, date(2024, 1, 31)), Mark::new("History", 60, date(2024, 1, 1))]
    );
    assert!(svc.get_student_marks_at_dates(2, date(2025, 1, 1), date(2025, 12, 31)).unwrap().is_empty());
}

#[test]
fn missing_marks_field_counts_as_no_marks() {
    use bson::doc;
    use students_marks::document::Document;
    use students_marks::types::DocumentId;

    let db = Database::in_memory();
    let svc = db.students_service(&AppConfig::default()).unwrap();
    svc.add_student(&Student::new(1, "050-1")).unwrap();
    svc.add_mark(1, &Mark::new("Math", 90, date(2024, 1, 15))).unwrap();
    let col = db.collection("students").unwrap();
    col.insert_document(Document::new(DocumentId(7), doc! { "phone": "057" })).unwrap();
    col.insert_document(Document::new(DocumentId(8), doc! { "phone": "058", "marks": bson::Bson::Null })).unwrap();

    assert!(svc.get_marks(7).unwrap().is_empty());
    assert!(svc.get_students_few_marks(0).unwrap().is_empty());
    assert_eq!(ids(&svc.get_students_few_marks(1).unwrap()), vec![7, 8]);
    assert_eq!(ids(&svc.get_students_marks_amount_between(0, 0).unwrap()), vec![7, 8]);
    assert_eq!(ids(&svc.get_students_marks_amount_between(0, 1).unwrap()), vec![1, 7, 8]);
    assert_eq!(ids(&svc.get_students_marks_amount_between(1, 1).unwrap()), vec![1]);
}

#[test]
fn concurrent_appends_keep_every_mark() {
    let svc = std::sync::Arc::new(service());
    svc.add_student(&Student::new(1, "050")).unwrap();
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let svc = std::sync::Arc::clone(&svc);
            std::thread::spawn(move || {
                for i in 0..50 {
                    svc.add_mark(1, &Mark::new(format!("s{t}"), i, date(2024, 1, 1))).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    let marks = svc.get_marks(1).unwrap();
    assert_eq!(marks.len(), 400);
    for t in 0..8 {
        let scores: Vec<i32> = marks.iter().filter(|m| m.subject == format!("s{t}")).map(|m| m.score).collect();
        assert_eq!(scores, (0..50).collect::<Vec<_>>());
    }
}
