// Installs the process-wide logger, so this binary holds a single test.
use students_marks::logger::{AUDIT_TARGET, configure_from_env};

#[test]
fn env_logging_splits_audit_records() {
    let dir = tempfile::tempdir().unwrap();
    let logs = dir.path().join("logs");
    // SAFETY: no other thread of this test binary reads the environment.
    unsafe {
        std::env::set_var("STUDENTS_MARKS_LOG_DIR", &logs);
        std::env::set_var("STUDENTS_MARKS_LOG_LEVEL", "debug");
        std::env::set_var("STUDENTS_MARKS_LOG_RETENTION", "2");
    }
    configure_from_env().unwrap();

    log::info!(target: AUDIT_TARGET, "op=insert collection=students id=1");
    log::debug!("app line");
    log::logger().flush();

    let audit = std::fs::read_to_string(logs.join("audit.log")).unwrap();
    let app = std::fs::read_to_string(logs.join("app.log")).unwrap();
    assert!(audit.contains("op=insert collection=students id=1"));
    assert!(!app.contains("op=insert"));
    assert!(app.contains("app line"));
}
