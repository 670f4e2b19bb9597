use crate::errors::{DbError, StudentsError};
use chrono::{Datelike, NaiveDate};

use super::aggregations::StudentAggregations;
use super::model::{IdPhone, Mark, Student, StudentAvgScore, StudentDoc};
use super::repo::StudentRepo;

pub type Result<T> = std::result::Result<T, StudentsError>;

/// Student and marks operations. Every id-targeted call fails with `NotFound` for an
/// unknown id; `add_student` fails with `AlreadyExists` for a taken one.
pub trait StudentsService {
    fn add_student(&self, student: &Student) -> Result<Student>;
    fn add_mark(&self, id: i64, mark: &Mark) -> Result<Mark>;
    fn update_phone_number(&self, id: i64, phone: &str) -> Result<Student>;
    /// Removes the student and returns its full state as it was just before removal.
    fn remove_student(&self, id: i64) -> Result<StudentDoc>;
    fn get_student(&self, id: i64) -> Result<Student>;
    fn get_marks(&self, id: i64) -> Result<Vec<Mark>>;
    fn get_student_by_phone_number(&self, phone: &str) -> Result<Option<Student>>;
    fn get_students_by_phone_prefix(&self, prefix: &str) -> Result<Vec<Student>>;
    fn get_students_marks_date(&self, date: NaiveDate) -> Result<Vec<Student>>;
    fn get_students_marks_month_year(&self, month: u32, year: i32) -> Result<Vec<Student>>;
    fn get_students_good_subject_mark(&self, subject: &str, threshold: i32) -> Result<Vec<Student>>;
    fn get_students_all_good_marks(&self, threshold: i32) -> Result<Vec<Student>>;
    fn get_students_all_good_marks_subject(&self, subject: &str, threshold: i32) -> Result<Vec<Student>>;
    fn get_students_few_marks(&self, n_marks: usize) -> Result<Vec<Student>>;
    fn get_students_marks_amount_between(&self, min: usize, max: usize) -> Result<Vec<Student>>;
    fn get_student_marks_subject(&self, id: i64, subject: &str) -> Result<Vec<Mark>>;
    fn get_student_marks_at_dates(&self, id: i64, from: NaiveDate, to: NaiveDate) -> Result<Vec<Mark>>;
    fn get_students_avg_score_greater(&self, threshold: i32) -> Result<Vec<StudentAvgScore>>;
    fn get_best_students(&self, n: usize) -> Result<Vec<i64>>;
    fn get_worst_students(&self, n: usize) -> Result<Vec<i64>>;
}

pub struct StudentsServiceImpl {
    repo: StudentRepo,
    aggregations: StudentAggregations,
}

impl StudentsServiceImpl {
    #[must_use]
    pub const fn new(repo: StudentRepo, aggregations: StudentAggregations) -> Self {
        Self { repo, aggregations }
    }

    fn not_found(id: i64) -> StudentsError {
        log::error!("student with id {id} not found");
        StudentsError::NotFound(id)
    }

    fn ensure_exists(&self, id: i64) -> Result<()> {
        if self.repo.exists_by_id(id) { Ok(()) } else { Err(Self::not_found(id)) }
    }
}

fn to_students(id_phones: Vec<IdPhone>) -> Vec<Student> {
    id_phones.into_iter().map(Student::from).collect()
}

fn month_bounds(month: u32, year: i32) -> Result<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| StudentsError::InvalidArgument(format!("no such month {month} of year {year}")))?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let last = next_first
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| StudentsError::InvalidArgument(format!("year {year} out of range")))?;
    debug_assert_eq!(last.month(), month);
    Ok((first, last))
}

impl StudentsService for StudentsServiceImpl {
    fn add_student(&self, student: &Student) -> Result<Student> {
        match self.repo.insert(&StudentDoc::new(student)) {
            Ok(()) => {
                log::debug!("student {student} has been saved");
                Ok(student.clone())
            }
            Err(DbError::DuplicateKey(_)) => {
                log::error!("student with id {} already exists", student.id);
                Err(StudentsError::AlreadyExists(student.id))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn add_mark(&self, id: i64, mark: &Mark) -> Result<Mark> {
        let marks = self.repo.push_mark(id, mark)?.ok_or_else(|| Self::not_found(id))?;
        log::debug!("student {id} now has {} marks, last {mark}", marks.len());
        Ok(mark.clone())
    }

    fn update_phone_number(&self, id: i64, phone: &str) -> Result<Student> {
        let saved = self.repo.set_phone(id, phone)?.ok_or_else(|| Self::not_found(id))?;
        let res = saved.build();
        log::debug!("student {res} has been saved");
        Ok(res)
    }

    fn remove_student(&self, id: i64) -> Result<StudentDoc> {
        let removed = self.repo.delete_by_id(id)?.ok_or_else(|| Self::not_found(id))?;
        log::debug!("student {removed} has been removed");
        Ok(removed)
    }

    fn get_student(&self, id: i64) -> Result<Student> {
        let student: Student = self.repo.find_student_no_marks(id)?.ok_or_else(|| Self::not_found(id))?.into();
        log::debug!("found student {student}");
        Ok(student)
    }

    fn get_marks(&self, id: i64) -> Result<Vec<Mark>> {
        let marks = self.repo.find_student_only_marks(id)?.ok_or_else(|| Self::not_found(id))?;
        log::debug!("student {id} has {} marks", marks.len());
        Ok(marks)
    }

    fn get_student_by_phone_number(&self, phone: &str) -> Result<Option<Student>> {
        let res = self.repo.find_by_phone(phone)?.map(Student::from);
        log::debug!("student with phone {phone}: {res:?}");
        Ok(res)
    }

    fn get_students_by_phone_prefix(&self, prefix: &str) -> Result<Vec<Student>> {
        let res = to_students(self.repo.find_by_phone_regex_prefix(prefix)?);
        log::debug!("students with phone prefix {prefix}: {res:?}");
        Ok(res)
    }

    fn get_students_marks_date(&self, date: NaiveDate) -> Result<Vec<Student>> {
        let res = to_students(self.repo.find_by_marks_date(date)?);
        log::debug!("students having a mark on {date}: {res:?}");
        Ok(res)
    }

    fn get_students_marks_month_year(&self, month: u32, year: i32) -> Result<Vec<Student>> {
        let (first, last) = month_bounds(month, year)?;
        let res = to_students(self.repo.find_by_marks_date_between(first, last)?);
        log::debug!("students having marks in month {month} of {year}: {res:?}");
        Ok(res)
    }

    fn get_students_good_subject_mark(&self, subject: &str, threshold: i32) -> Result<Vec<Student>> {
        let res = to_students(self.repo.find_by_marks_subject_and_score_greater(subject, threshold)?);
        log::debug!("students having a {subject} mark above {threshold}: {res:?}");
        Ok(res)
    }

    fn get_students_all_good_marks(&self, threshold: i32) -> Result<Vec<Student>> {
        let res = to_students(self.repo.find_all_good_marks(threshold)?);
        log::debug!("students having all marks above {threshold}: {res:?}");
        Ok(res)
    }

    fn get_students_all_good_marks_subject(&self, subject: &str, threshold: i32) -> Result<Vec<Student>> {
        let res = to_students(self.repo.find_all_good_marks_subject(subject, threshold)?);
        log::debug!("students having all {subject} marks above {threshold}: {res:?}");
        Ok(res)
    }

    fn get_students_few_marks(&self, n_marks: usize) -> Result<Vec<Student>> {
        let res = to_students(self.repo.find_few_marks(n_marks)?);
        log::debug!("students having fewer than {n_marks} marks: {res:?}");
        Ok(res)
    }

    fn get_students_marks_amount_between(&self, min: usize, max: usize) -> Result<Vec<Student>> {
        let res = to_students(self.repo.find_marks_amount_between(min, max)?);
        log::debug!("students having between {min} and {max} marks: {res:?}");
        Ok(res)
    }

    fn get_student_marks_subject(&self, id: i64, subject: &str) -> Result<Vec<Mark>> {
        self.ensure_exists(id)?;
        let res = self.aggregations.student_marks_subject(id, subject)?;
        log::debug!("{subject} marks of student {id}: {res:?}");
        Ok(res)
    }

    fn get_student_marks_at_dates(&self, id: i64, from: NaiveDate, to: NaiveDate) -> Result<Vec<Mark>> {
        self.ensure_exists(id)?;
        let res = self.aggregations.student_marks_at_dates(id, from, to)?;
        log::debug!("marks of student {id} from {from} to {to}: {res:?}");
        Ok(res)
    }

    fn get_students_avg_score_greater(&self, threshold: i32) -> Result<Vec<StudentAvgScore>> {
        let res = self.aggregations.avg_score_greater(threshold)?;
        log::debug!("students with average score above {threshold}: {res:?}");
        Ok(res)
    }

    fn get_best_students(&self, n: usize) -> Result<Vec<i64>> {
        let res = self.aggregations.best_students(n)?;
        log::debug!(
            "best {n} students by marks above {}: {res:?}",
            self.aggregations.best_score_cutoff()
        );
        Ok(res)
    }

    fn get_worst_students(&self, n: usize) -> Result<Vec<i64>> {
        let res = self.aggregations.worst_students(n)?;
        log::debug!("worst {n} students: {res:?}");
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_bounds_cover_whole_month() {
        let (first, last) = month_bounds(2, 2024).unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        let (_, dec_last) = month_bounds(12, 2023).unwrap();
        assert_eq!(dec_last, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }

    #[test]
    fn month_bounds_reject_bad_month() {
        assert!(matches!(month_bounds(13, 2024), Err(StudentsError::InvalidArgument(_))));
        assert!(matches!(month_bounds(0, 2024), Err(StudentsError::InvalidArgument(_))));
    }
}
