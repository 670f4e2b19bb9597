//! Named queries against the students collection. Every finder projects to `{_id, phone}`
//! and returns rows in ascending id order.
use crate::collection::Collection;
use crate::document::{Document, ID_FIELD};
use crate::errors::DbError;
use crate::query::{CmpOp, Filter, FindOptions, find_docs, find_one};
use crate::types::DocumentId;
use bson::Bson;
use chrono::NaiveDate;
use std::sync::Arc;

use super::model::{
    DATE, IdPhone, MARKS, Mark, PHONE, SCORE, SUBJECT, StudentDoc, date_to_bson, marks_from_bson,
};

pub struct StudentRepo {
    collection: Arc<Collection>,
}

impl StudentRepo {
    #[must_use]
    pub const fn new(collection: Arc<Collection>) -> Self {
        Self { collection }
    }

    #[must_use]
    pub fn exists_by_id(&self, id: i64) -> bool {
        self.collection.contains(&DocumentId(id))
    }

    /// # Errors
    /// Returns `DbError::DuplicateKey` when the id is taken, or a storage error.
    pub fn insert(&self, student: &StudentDoc) -> Result<(), DbError> {
        self.collection.insert_document(Document::new(DocumentId(student.id), student.to_bson()))?;
        Ok(())
    }

    /// Reads `{_id, phone}` only.
    ///
    /// # Errors
    /// Returns `DbError::InvalidDocument` if the stored body is malformed.
    pub fn find_student_no_marks(&self, id: i64) -> Result<Option<IdPhone>, DbError> {
        let fields = IdPhone::FIELDS.map(String::from);
        find_one(&self.collection, &Filter::eq(ID_FIELD, id), Some(fields.as_slice()))
            .map(|d| IdPhone::from_bson(d.body()))
            .transpose()
    }

    /// Reads `marks` only.
    ///
    /// # Errors
    /// Returns `DbError::InvalidDocument` if the stored marks are malformed.
    pub fn find_student_only_marks(&self, id: i64) -> Result<Option<Vec<Mark>>, DbError> {
        find_one(&self.collection, &Filter::eq(ID_FIELD, id), Some([MARKS.to_string()].as_slice()))
            .map(|d| marks_from_bson(d.body()))
            .transpose()
    }

    /// Appends `mark` in one atomic read-modify-write. Returns the full marks list after the
    /// append, or `None` when the student does not exist.
    ///
    /// # Errors
    /// Returns a storage error or `DbError::InvalidDocument` if the stored marks are malformed.
    pub fn push_mark(&self, id: i64, mark: &Mark) -> Result<Option<Vec<Mark>>, DbError> {
        let updated = self.collection.modify_document(&DocumentId(id), |body| {
            let mut marks = marks_from_bson(body)?;
            marks.push(mark.clone());
            body.insert(MARKS, marks.iter().map(|m| Bson::Document(m.to_bson())).collect::<Vec<_>>());
            Ok(())
        })?;
        updated.map(|d| marks_from_bson(d.body())).transpose()
    }

    /// Sets the phone in one atomic read-modify-write; marks are untouched.
    ///
    /// # Errors
    /// Returns a storage error or `DbError::InvalidDocument` if the stored body is malformed.
    pub fn set_phone(&self, id: i64, phone: &str) -> Result<Option<StudentDoc>, DbError> {
        let updated = self.collection.modify_document(&DocumentId(id), |body| {
            body.insert(PHONE, phone);
            Ok(())
        })?;
        updated.map(|d| StudentDoc::from_bson(d.body())).transpose()
    }

    /// Deletes and returns the last stored state.
    ///
    /// # Errors
    /// Returns a storage error or `DbError::InvalidDocument` if the stored body is malformed.
    pub fn delete_by_id(&self, id: i64) -> Result<Option<StudentDoc>, DbError> {
        self.collection.delete_document(&DocumentId(id))?.map(|d| StudentDoc::from_bson(d.body())).transpose()
    }

    fn find_id_phones(&self, filter: &Filter) -> Result<Vec<IdPhone>, DbError> {
        let opts = FindOptions::project(IdPhone::FIELDS);
        find_docs(&self.collection, filter, &opts).map(|d| IdPhone::from_bson(d.body())).collect()
    }

    /// # Errors
    /// Returns `DbError::InvalidDocument` if a stored body is malformed.
    pub fn find_by_phone(&self, phone: &str) -> Result<Option<IdPhone>, DbError> {
        Ok(self.find_id_phones(&Filter::eq(PHONE, phone))?.into_iter().next())
    }

    /// Phones that start with `prefix` and have at least one more character.
    ///
    /// # Errors
    /// Returns `DbError::QueryError` if the pattern cannot be built.
    pub fn find_by_phone_regex_prefix(&self, prefix: &str) -> Result<Vec<IdPhone>, DbError> {
        let pattern = format!("^{}.+", regex::escape(prefix));
        self.find_id_phones(&Filter::regex(PHONE, &pattern)?)
    }

    /// # Errors
    /// Returns `DbError::InvalidDocument` if a stored body is malformed.
    pub fn find_by_marks_date(&self, date: NaiveDate) -> Result<Vec<IdPhone>, DbError> {
        self.find_id_phones(&Filter::elem_match(MARKS, Filter::eq(DATE, date_to_bson(date))))
    }

    /// Closed range `[from, to]`.
    ///
    /// # Errors
    /// Returns `DbError::InvalidDocument` if a stored body is malformed.
    pub fn find_by_marks_date_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<IdPhone>, DbError> {
        let in_range = Filter::And(vec![Filter::gte(DATE, date_to_bson(from)), Filter::lte(DATE, date_to_bson(to))]);
        self.find_id_phones(&Filter::elem_match(MARKS, in_range))
    }

    /// # Errors
    /// Returns `DbError::InvalidDocument` if a stored body is malformed.
    pub fn find_by_marks_subject_and_score_greater(
        &self,
        subject: &str,
        threshold: i32,
    ) -> Result<Vec<IdPhone>, DbError> {
        let good = Filter::And(vec![Filter::eq(SUBJECT, subject), Filter::gt(SCORE, threshold)]);
        self.find_id_phones(&Filter::elem_match(MARKS, good))
    }

    /// Students with at least one mark, all of them above `threshold`.
    ///
    /// # Errors
    /// Returns `DbError::InvalidDocument` if a stored body is malformed.
    pub fn find_all_good_marks(&self, threshold: i32) -> Result<Vec<IdPhone>, DbError> {
        self.find_id_phones(&Filter::all_match(MARKS, Filter::gt(SCORE, threshold)))
    }

    /// Students with at least one mark in `subject`, all such marks above `threshold`.
    ///
    /// # Errors
    /// Returns `DbError::InvalidDocument` if a stored body is malformed.
    pub fn find_all_good_marks_subject(&self, subject: &str, threshold: i32) -> Result<Vec<IdPhone>, DbError> {
        let filter = Filter::And(vec![
            Filter::elem_match(MARKS, Filter::eq(SUBJECT, subject)),
            Filter::Not(Box::new(Filter::elem_match(
                MARKS,
                Filter::And(vec![Filter::eq(SUBJECT, subject), Filter::lte(SCORE, threshold)]),
            ))),
        ]);
        self.find_id_phones(&filter)
    }

    /// Students with fewer than `n_marks` marks, including those with none.
    ///
    /// # Errors
    /// Returns `DbError::InvalidDocument` if a stored body is malformed.
    pub fn find_few_marks(&self, n_marks: usize) -> Result<Vec<IdPhone>, DbError> {
        self.find_id_phones(&mark_count(CmpOp::Lt, n_marks))
    }

    /// Closed range `[min, max]` on the number of marks.
    ///
    /// # Errors
    /// Returns `DbError::InvalidDocument` if a stored body is malformed.
    pub fn find_marks_amount_between(&self, min: usize, max: usize) -> Result<Vec<IdPhone>, DbError> {
        self.find_id_phones(&Filter::And(vec![mark_count(CmpOp::Gte, min), mark_count(CmpOp::Lte, max)]))
    }
}

/// Compares the number of marks with `n`. A missing or null `marks` counts as zero marks, the
/// same way `marks_from_bson` reads it.
fn mark_count(op: CmpOp, n: usize) -> Filter {
    let size = Filter::size(MARKS, op, n);
    let zero_matches = match op {
        CmpOp::Eq => n == 0,
        CmpOp::Gt => false,
        CmpOp::Gte => n == 0,
        CmpOp::Lt => n > 0,
        CmpOp::Lte => true,
    };
    if zero_matches {
        Filter::Or(vec![
            size,
            Filter::Exists { path: MARKS.into(), exists: false },
            Filter::eq(MARKS, Bson::Null),
        ])
    } else {
        size
    }
}
