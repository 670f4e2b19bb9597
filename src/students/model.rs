use crate::document::ID_FIELD;
use crate::errors::DbError;
use bson::{Bson, Document as BsonDocument, doc};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const PHONE: &str = "phone";
pub const MARKS: &str = "marks";
pub const SUBJECT: &str = "subject";
pub const SCORE: &str = "score";
pub const DATE: &str = "date";

/// Dotted paths into an unwound mark row.
pub const MARKS_SUBJECT: &str = "marks.subject";
pub const MARKS_SCORE: &str = "marks.score";
pub const MARKS_DATE: &str = "marks.date";

/// External record shape of a student, without marks.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Student {
    pub id: i64,
    pub phone: String,
}

impl Student {
    pub fn new(id: i64, phone: impl Into<String>) -> Self {
        Self { id, phone: phone.into() }
    }
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Student[id={}, phone={}]", self.id, self.phone)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mark {
    pub subject: String,
    pub score: i32,
    pub date: NaiveDate,
}

impl Mark {
    pub fn new(subject: impl Into<String>, score: i32, date: NaiveDate) -> Self {
        Self { subject: subject.into(), score, date }
    }

    #[must_use]
    pub fn to_bson(&self) -> BsonDocument {
        doc! { SUBJECT: self.subject.as_str(), SCORE: self.score, DATE: date_to_bson(self.date) }
    }

    /// # Errors
    /// Returns `DbError::InvalidDocument` when a field is missing or mistyped.
    pub fn from_bson(d: &BsonDocument) -> Result<Self, DbError> {
        let subject = d.get_str(SUBJECT).map_err(|e| invalid("mark.subject", &e))?.to_string();
        let score = match d.get(SCORE) {
            Some(Bson::Int32(v)) => *v,
            Some(Bson::Int64(v)) => i32::try_from(*v).map_err(|e| invalid("mark.score", &e))?,
            _ => return Err(DbError::InvalidDocument("mark.score missing or not an integer".into())),
        };
        let date = d
            .get(DATE)
            .and_then(bson_to_date)
            .ok_or_else(|| DbError::InvalidDocument("mark.date missing or not a date".into()))?;
        Ok(Self { subject, score, date })
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mark[{}, {}, {}]", self.subject, self.score, self.date)
    }
}

/// The `{id, phone}` projection returned by lookups.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IdPhone {
    pub id: i64,
    pub phone: String,
}

impl IdPhone {
    pub(crate) const FIELDS: [&'static str; 2] = [ID_FIELD, PHONE];

    /// # Errors
    /// Returns `DbError::InvalidDocument` when `_id` or `phone` is absent.
    pub fn from_bson(d: &BsonDocument) -> Result<Self, DbError> {
        let id = d.get_i64(ID_FIELD).map_err(|e| invalid("_id", &e))?;
        let phone = d.get_str(PHONE).map_err(|e| invalid(PHONE, &e))?.to_string();
        Ok(Self { id, phone })
    }
}

impl From<IdPhone> for Student {
    fn from(ip: IdPhone) -> Self {
        Self { id: ip.id, phone: ip.phone }
    }
}

/// Persisted shape of one student:
/// `{ _id: Int64, phone: String, marks: [ { subject, score, date } ] }`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StudentDoc {
    pub id: i64,
    pub phone: String,
    pub marks: Vec<Mark>,
}

impl StudentDoc {
    #[must_use]
    pub fn new(student: &Student) -> Self {
        Self { id: student.id, phone: student.phone.clone(), marks: Vec::new() }
    }

    #[must_use]
    pub fn build(&self) -> Student {
        Student { id: self.id, phone: self.phone.clone() }
    }

    #[must_use]
    pub fn to_bson(&self) -> BsonDocument {
        let marks: Vec<Bson> = self.marks.iter().map(|m| Bson::Document(m.to_bson())).collect();
        doc! { ID_FIELD: self.id, PHONE: self.phone.as_str(), MARKS: marks }
    }

    /// # Errors
    /// Returns `DbError::InvalidDocument` when the body does not have the persisted shape.
    pub fn from_bson(d: &BsonDocument) -> Result<Self, DbError> {
        let IdPhone { id, phone } = IdPhone::from_bson(d)?;
        Ok(Self { id, phone, marks: marks_from_bson(d)? })
    }
}

impl fmt::Display for StudentDoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StudentDoc[id={}, phone={}, marks={}]", self.id, self.phone, self.marks.len())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudentAvgScore {
    pub student_id: i64,
    pub avg_score: i32,
}

/// Decodes the `marks` array; a missing array reads as no marks.
///
/// # Errors
/// Returns `DbError::InvalidDocument` when `marks` or one of its elements is malformed.
pub fn marks_from_bson(d: &BsonDocument) -> Result<Vec<Mark>, DbError> {
    match d.get(MARKS) {
        None | Some(Bson::Null) => Ok(Vec::new()),
        Some(Bson::Array(items)) => items
            .iter()
            .map(|item| match item {
                Bson::Document(m) => Mark::from_bson(m),
                other => Err(DbError::InvalidDocument(format!("mark must be a document, got {other}"))),
            })
            .collect(),
        Some(other) => Err(DbError::InvalidDocument(format!("marks must be an array, got {other}"))),
    }
}

/// Calendar dates are stored as a BSON datetime at midnight UTC.
#[must_use]
pub fn date_to_bson(date: NaiveDate) -> Bson {
    let millis = date.and_hms_opt(0, 0, 0).map_or(0, |dt| dt.and_utc().timestamp_millis());
    Bson::DateTime(bson::DateTime::from_millis(millis))
}

#[must_use]
pub fn bson_to_date(b: &Bson) -> Option<NaiveDate> {
    match b {
        Bson::DateTime(dt) => DateTime::from_timestamp_millis(dt.timestamp_millis()).map(|d| d.date_naive()),
        Bson::String(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").ok(),
        _ => None,
    }
}

fn invalid(field: &str, e: &dyn fmt::Display) -> DbError {
    DbError::InvalidDocument(format!("{field}: {e}"))
}
