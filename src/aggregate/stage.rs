use crate::query::{Filter, SortSpec};

/// Per-group reducers. Field paths are resolved against the unwound row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accumulator {
    /// Sum of numeric values; rows without a number contribute 0.
    Sum(String),
    /// Mean of numeric values; `null` when the group has none.
    Avg(String),
    /// Number of rows in the group.
    Count,
}

#[derive(Debug, Clone)]
pub enum Stage {
    Match(Filter),
    /// One row per element of the array at `path`. With `preserve_null_and_empty`, rows whose
    /// array is missing, null or empty are kept with the field removed.
    Unwind { path: String, preserve_null_and_empty: bool },
    /// Groups rows by the value at `key` (missing groups under `null`) and emits
    /// `{ _id: key, <name>: <accumulated> }` in first-seen order.
    Group { key: String, accumulators: Vec<(String, Accumulator)> },
    Sort(Vec<SortSpec>),
    Limit(usize),
    /// Emits `{ <out>: value at <path> }` for each pair; absent paths are skipped.
    Project(Vec<(String, String)>),
}

/// An ordered list of stages.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    #[must_use]
    pub fn matching(mut self, filter: Filter) -> Self {
        self.stages.push(Stage::Match(filter));
        self
    }

    #[must_use]
    pub fn unwind(mut self, path: impl Into<String>) -> Self {
        self.stages.push(Stage::Unwind { path: path.into(), preserve_null_and_empty: false });
        self
    }

    #[must_use]
    pub fn unwind_preserving(mut self, path: impl Into<String>) -> Self {
        self.stages.push(Stage::Unwind { path: path.into(), preserve_null_and_empty: true });
        self
    }

    #[must_use]
    pub fn group<I, S>(mut self, key: impl Into<String>, accumulators: I) -> Self
    where
        I: IntoIterator<Item = (S, Accumulator)>,
        S: Into<String>,
    {
        let accumulators = accumulators.into_iter().map(|(n, a)| (n.into(), a)).collect();
        self.stages.push(Stage::Group { key: key.into(), accumulators });
        self
    }

    #[must_use]
    pub fn sort(mut self, specs: Vec<SortSpec>) -> Self {
        self.stages.push(Stage::Sort(specs));
        self
    }

    #[must_use]
    pub fn limit(mut self, n: usize) -> Self {
        self.stages.push(Stage::Limit(n));
        self
    }

    #[must_use]
    pub fn project<I, A, B>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        self.stages.push(Stage::Project(fields.into_iter().map(|(a, b)| (a.into(), b.into())).collect()));
        self
    }
}
