//! Command-line binding: maps a `Command` onto the students service and prints JSON.
mod command;

pub use command::Command;

use crate::Database;
use crate::config::AppConfig;
use crate::students::{Mark, Student, StudentsService};
use serde::Serialize;
use std::io::Write;

fn emit<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<(), Box<dyn std::error::Error>> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Executes `cmd` against the students collection named in `config`, writing one JSON
/// document to `out`.
///
/// # Errors
/// Returns the service error (e.g. unknown or duplicate id) or an output error.
pub fn run<W: Write>(
    db: &Database,
    config: &AppConfig,
    cmd: Command,
    out: &mut W,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = db.students_service(config)?;
    log::debug!("running {cmd:?}");
    match cmd {
        Command::AddStudent { id, phone } => emit(out, &service.add_student(&Student::new(id, phone))?),
        Command::AddMark { id, subject, score, date } => {
            emit(out, &service.add_mark(id, &Mark::new(subject, score, date))?)
        }
        Command::UpdatePhone { id, phone } => emit(out, &service.update_phone_number(id, &phone)?),
        Command::Remove { id } => emit(out, &service.remove_student(id)?),
        Command::Get { id } => emit(out, &service.get_student(id)?),
        Command::Marks { id } => emit(out, &service.get_marks(id)?),
        Command::ByPhone { phone } => emit(out, &service.get_student_by_phone_number(&phone)?),
        Command::ByPhonePrefix { prefix } => emit(out, &service.get_students_by_phone_prefix(&prefix)?),
        Command::MarksOnDate { date } => emit(out, &service.get_students_marks_date(date)?),
        Command::MarksInMonth { month, year } => emit(out, &service.get_students_marks_month_year(month, year)?),
        Command::GoodSubjectMark { subject, threshold } => {
            emit(out, &service.get_students_good_subject_mark(&subject, threshold)?)
        }
        Command::AllGoodMarks { threshold } => emit(out, &service.get_students_all_good_marks(threshold)?),
        Command::AllGoodMarksSubject { subject, threshold } => {
            emit(out, &service.get_students_all_good_marks_subject(&subject, threshold)?)
        }
        Command::FewMarks { n_marks } => emit(out, &service.get_students_few_marks(n_marks)?),
        Command::MarksAmountBetween { min, max } => emit(out, &service.get_students_marks_amount_between(min, max)?),
        Command::MarksSubject { id, subject } => emit(out, &service.get_student_marks_subject(id, &subject)?),
        Command::MarksAtDates { id, from, to } => emit(out, &service.get_student_marks_at_dates(id, from, to)?),
        Command::AvgScoreGreater { threshold } => emit(out, &service.get_students_avg_score_greater(threshold)?),
        Command::Best { n } => emit(out, &service.get_best_students(n)?),
        Command::Worst { n } => emit(out, &service.get_worst_students(n)?),
        Command::Checkpoint => {
            db.checkpoint()?;
            emit(out, &serde_json::json!({ "checkpoint": "ok" }))
        }
    }
}
