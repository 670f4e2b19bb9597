//! Fixed aggregation pipelines over the students collection. Every ranking breaks ties by
//! ascending student id.
use crate::aggregate::{Accumulator, Pipeline, aggregate};
use crate::collection::Collection;
use crate::document::ID_FIELD;
use crate::errors::DbError;
use crate::query::{Filter, SortSpec};
use bson::{Bson, Document as BsonDocument};
use chrono::NaiveDate;
use std::sync::Arc;

use super::model::{
    DATE, MARKS, MARKS_DATE, MARKS_SCORE, MARKS_SUBJECT, Mark, SCORE, SUBJECT, StudentAvgScore, date_to_bson,
};

const AVG_SCORE: &str = "avgScore";
const GOOD_MARKS: &str = "goodMarks";
const TOTAL_SCORE: &str = "totalScore";

/// Score a mark must exceed to count toward "best students".
pub const DEFAULT_BEST_SCORE_CUTOFF: i32 = 80;

pub struct StudentAggregations {
    collection: Arc<Collection>,
    best_score_cutoff: i32,
}

impl StudentAggregations {
    #[must_use]
    pub const fn new(collection: Arc<Collection>) -> Self {
        Self { collection, best_score_cutoff: DEFAULT_BEST_SCORE_CUTOFF }
    }

    #[must_use]
    pub fn with_best_score_cutoff(mut self, cutoff: i32) -> Self {
        self.best_score_cutoff = cutoff;
        self
    }

    #[must_use]
    pub const fn best_score_cutoff(&self) -> i32 {
        self.best_score_cutoff
    }

    /// Students whose mean score is strictly above `threshold`, highest first. The reported
    /// average is truncated toward zero.
    ///
    /// # Errors
    /// Returns `DbError::InvalidDocument` if a result row is malformed.
    pub fn avg_score_greater(&self, threshold: i32) -> Result<Vec<StudentAvgScore>, DbError> {
        let pipeline = Pipeline::new()
            .unwind(MARKS)
            .group(ID_FIELD, [(AVG_SCORE, Accumulator::Avg(MARKS_SCORE.into()))])
            .matching(Filter::gt(AVG_SCORE, threshold))
            .sort(vec![SortSpec::desc(AVG_SCORE), SortSpec::asc(ID_FIELD)]);
        aggregate(&self.collection, &pipeline)?
            .iter()
            .map(|d| {
                let avg = d.get_f64(AVG_SCORE).map_err(|e| DbError::InvalidDocument(e.to_string()))?;
                #[allow(clippy::cast_possible_truncation)]
                let avg_score = avg.trunc() as i32;
                Ok(StudentAvgScore { student_id: group_id(d)?, avg_score })
            })
            .collect()
    }

    /// Ids of the `n` students with the most marks above the configured cutoff. Students
    /// without such marks are never included.
    ///
    /// # Errors
    /// Returns `DbError::InvalidDocument` if a result row is malformed.
    pub fn best_students(&self, n: usize) -> Result<Vec<i64>, DbError> {
        let pipeline = Pipeline::new()
            .unwind(MARKS)
            .matching(Filter::gt(MARKS_SCORE, self.best_score_cutoff))
            .group(ID_FIELD, [(GOOD_MARKS, Accumulator::Count)])
            .sort(vec![SortSpec::desc(GOOD_MARKS), SortSpec::asc(ID_FIELD)])
            .limit(n)
            .project([(ID_FIELD, ID_FIELD)]);
        aggregate(&self.collection, &pipeline)?.iter().map(group_id).collect()
    }

    /// Ids of the `n` students with the lowest total score; a student with no marks totals 0.
    ///
    /// # Errors
    /// Returns `DbError::InvalidDocument` if a result row is malformed.
    pub fn worst_students(&self, n: usize) -> Result<Vec<i64>, DbError> {
        let pipeline = Pipeline::new()
            .unwind_preserving(MARKS)
            .group(ID_FIELD, [(TOTAL_SCORE, Accumulator::Sum(MARKS_SCORE.into()))])
            .sort(vec![SortSpec::asc(TOTAL_SCORE), SortSpec::asc(ID_FIELD)])
            .limit(n)
            .project([(ID_FIELD, ID_FIELD)]);
        aggregate(&self.collection, &pipeline)?.iter().map(group_id).collect()
    }

    /// Marks of one student in `subject`, in insertion order.
    ///
    /// # Errors
    /// Returns `DbError::InvalidDocument` if a stored mark is malformed.
    pub fn student_marks_subject(&self, id: i64, subject: &str) -> Result<Vec<Mark>, DbError> {
        self.student_marks_matching(id, Filter::eq(MARKS_SUBJECT, subject))
    }

    /// Marks of one student dated within the closed range `[from, to]`, in insertion order.
    ///
    /// # Errors
    /// Returns `DbError::InvalidDocument` if a stored mark is malformed.
    pub fn student_marks_at_dates(&self, id: i64, from: NaiveDate, to: NaiveDate) -> Result<Vec<Mark>, DbError> {
        self.student_marks_matching(
            id,
            Filter::And(vec![Filter::gte(MARKS_DATE, date_to_bson(from)), Filter::lte(MARKS_DATE, date_to_bson(to))]),
        )
    }

    fn student_marks_matching(&self, id: i64, mark_filter: Filter) -> Result<Vec<Mark>, DbError> {
        let pipeline = Pipeline::new()
            .matching(Filter::eq(ID_FIELD, id))
            .unwind(MARKS)
            .matching(mark_filter)
            .project([(SUBJECT, MARKS_SUBJECT), (SCORE, MARKS_SCORE), (DATE, MARKS_DATE)]);
        let rows = aggregate(&self.collection, &pipeline)?;
        log::debug!("received {} mark rows for student {id}", rows.len());
        rows.iter().map(Mark::from_bson).collect()
    }
}

fn group_id(d: &BsonDocument) -> Result<i64, DbError> {
    match d.get(ID_FIELD) {
        Some(Bson::Int64(v)) => Ok(*v),
        Some(Bson::Int32(v)) => Ok(i64::from(*v)),
        other => Err(DbError::InvalidDocument(format!("group key is not an id: {other:?}"))),
    }
}
