//! Student records and their marks, stored one document per student.
pub mod aggregations;
pub mod model;
pub mod repo;
pub mod service;

pub use aggregations::{DEFAULT_BEST_SCORE_CUTOFF, StudentAggregations};
pub use model::{IdPhone, Mark, Student, StudentAvgScore, StudentDoc};
pub use repo::StudentRepo;
pub use service::{StudentsService, StudentsServiceImpl};

/// Collection the students live in unless configured otherwise.
pub const DEFAULT_COLLECTION: &str = "students";
