use chrono::NaiveDate;
use students_marks::Database;
use students_marks::config::AppConfig;
use students_marks::engine::Engine;
use students_marks::students::{Mark, Student, StudentsService};
use tempfile::tempdir;

fn mark(score: i32) -> Mark {
    Mark::new("Math", score, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
}

#[test]
fn reopen_replays_every_mutation() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("students.wal");
    let cfg = AppConfig::default();
    {
        let db = Database::open(&path).unwrap();
        let svc = db.students_service(&cfg).unwrap();
        svc.add_student(&Student::new(8, "058-1234567")).unwrap();
        svc.add_student(&Student::new(9, "059")).unwrap();
        svc.add_mark(8, &mark(70)).unwrap();
        svc.add_mark(8, &mark(90)).unwrap();
        svc.update_phone_number(8, "058-7654321").unwrap();
        svc.remove_student(9).unwrap();
    }
    let db = Database::open(&path).unwrap();
    let svc = db.students_service(&cfg).unwrap();
    assert_eq!(svc.get_student(8).unwrap(), Student::new(8, "058-7654321"));
    assert_eq!(svc.get_marks(8).unwrap(), vec![mark(70), mark(90)]);
    assert!(svc.get_student(9).unwrap_err().is_not_found());
    // the removed id is free again
    svc.add_student(&Student::new(9, "059-new")).unwrap();
}

#[test]
fn checkpoint_compacts_without_losing_data() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("students.wal");
    let cfg = AppConfig::default();
    {
        let db = Database::open(&path).unwrap();
        let svc = db.students_service(&cfg).unwrap();
        svc.add_student(&Student::new(1, "050")).unwrap();
        for score in 0..20 {
            svc.add_mark(1, &mark(score)).unwrap();
        }
        let before = std::fs::metadata(&path).unwrap().len();
        db.checkpoint().unwrap();
        let after = std::fs::metadata(&path).unwrap().len();
        assert!(after < before);
        svc.add_mark(1, &mark(100)).unwrap();
    }
    let db = Database::open(&path).unwrap();
    let marks = db.students_service(&cfg).unwrap().get_marks(1).unwrap();
    assert_eq!(marks.len(), 21);
    assert_eq!(marks.last(), Some(&mark(100)));
}

#[test]
fn dropped_collection_stays_dropped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("engine.wal");
    {
        let engine = Engine::new(&path).unwrap();
        engine.create_collection("students").unwrap();
        engine.create_collection("archive").unwrap();
        assert!(engine.delete_collection("archive").unwrap());
        assert!(!engine.delete_collection("archive").unwrap());
    }
    let engine = Engine::new(&path).unwrap();
    assert_eq!(engine.list_collection_names(), vec!["students".to_string()]);
}

#[test]
fn torn_tail_is_ignored_on_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("students.wal");
    let cfg = AppConfig::default();
    {
        let db = Database::open(&path).unwrap();
        db.students_service(&cfg).unwrap().add_student(&Student::new(1, "050")).unwrap();
    }
    // a crash mid-append leaves a partial length header behind
    let mut bytes = std::fs::read(&path).unwrap();
    bytes.extend_from_slice(&[0x10, 0x00]);
    std::fs::write(&path, bytes).unwrap();

    let db = Database::open(&path).unwrap();
    assert_eq!(db.students_service(&cfg).unwrap().get_student(1).unwrap(), Student::new(1, "050"));
}

#[test]
fn from_config_without_path_is_in_memory() {
    let db = Database::from_config(&AppConfig::default()).unwrap();
    let svc = db.students_service(&AppConfig::default()).unwrap();
    svc.add_student(&Student::new(1, "050")).unwrap();
    assert_eq!(db.engine().list_collection_names(), vec!["students".to_string()]);
}
