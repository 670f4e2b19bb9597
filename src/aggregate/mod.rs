//! Aggregation pipelines over a collection: match, unwind, group, sort, limit, project.
mod exec;
mod stage;

pub use exec::{aggregate, run_pipeline};
pub use stage::{Accumulator, Pipeline, Stage};
