use crate::errors::DbError;
use bson::Bson;
use serde::{Deserialize, Serialize};

// Safety limits to prevent resource abuse
pub(crate) const MAX_PATH_DEPTH: usize = 32;
pub(crate) const MAX_IN_SET: usize = 1000;
pub(crate) const MAX_SORT_FIELDS: usize = 8;
pub(crate) const MAX_PROJECTION_FIELDS: usize = 64;
pub(crate) const MAX_REGEX_LEN: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub order: Order,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), order: Order::Asc }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), order: Order::Desc }
    }
}

/// Options for `find_docs`.
///
/// Sorting happens before `skip`/`limit`, projection last. Without a sort the
/// result follows ascending `_id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FindOptions {
    pub projection: Option<Vec<String>>,
    pub sort: Option<Vec<SortSpec>>,
    pub limit: Option<usize>,
    pub skip: Option<usize>,
}

impl FindOptions {
    pub fn project<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { projection: Some(fields.into_iter().map(Into::into).collect()), ..Self::default() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

#[derive(Debug, Clone)]
pub enum Filter {
    True,
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Exists { path: String, exists: bool },
    In { path: String, values: Vec<Bson> },
    Cmp { path: String, op: CmpOp, value: Bson },
    Regex { path: String, regex: regex::Regex },
    /// Some element of the array at `path` is a document matching `filter`.
    ElemMatch { path: String, filter: Box<Filter> },
    /// The array at `path` is non-empty and every element is a document matching `filter`.
    AllMatch { path: String, filter: Box<Filter> },
    /// Compares the length of the array at `path`.
    Size { path: String, op: CmpOp, len: usize },
}

impl Filter {
    fn cmp(path: impl Into<String>, op: CmpOp, value: impl Into<Bson>) -> Self {
        Self::Cmp { path: path.into(), op, value: value.into() }
    }

    pub fn eq(path: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::cmp(path, CmpOp::Eq, value)
    }

    pub fn gt(path: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::cmp(path, CmpOp::Gt, value)
    }

    pub fn gte(path: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::cmp(path, CmpOp::Gte, value)
    }

    pub fn lt(path: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::cmp(path, CmpOp::Lt, value)
    }

    pub fn lte(path: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::cmp(path, CmpOp::Lte, value)
    }

    pub fn elem_match(path: impl Into<String>, filter: Self) -> Self {
        Self::ElemMatch { path: path.into(), filter: Box::new(filter) }
    }

    pub fn all_match(path: impl Into<String>, filter: Self) -> Self {
        Self::AllMatch { path: path.into(), filter: Box::new(filter) }
    }

    pub fn size(path: impl Into<String>, op: CmpOp, len: usize) -> Self {
        Self::Size { path: path.into(), op, len }
    }

    /// # Errors
    /// Returns `DbError::QueryError` for an over-long or invalid pattern.
    pub fn regex(path: impl Into<String>, pattern: &str) -> Result<Self, DbError> {
        if pattern.len() > MAX_REGEX_LEN {
            return Err(DbError::QueryError(format!("regex longer than {MAX_REGEX_LEN} bytes")));
        }
        let regex = regex::Regex::new(pattern).map_err(|e| DbError::QueryError(e.to_string()))?;
        Ok(Self::Regex { path: path.into(), regex })
    }

    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::True => "true",
            Self::And(_) => "$and",
            Self::Or(_) => "$or",
            Self::Not(_) => "$not",
            Self::Exists { .. } => "$exists",
            Self::In { .. } => "$in",
            Self::Cmp { op, .. } => match op {
                CmpOp::Eq => "$eq",
                CmpOp::Gt => "$gt",
                CmpOp::Gte => "$gte",
                CmpOp::Lt => "$lt",
                CmpOp::Lte => "$lte",
            },
            Self::Regex { .. } => "$regex",
            Self::ElemMatch { .. } => "$elemMatch",
            Self::AllMatch { .. } => "$all",
            Self::Size { .. } => "$size",
        }
    }
}
