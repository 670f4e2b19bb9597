mod core;
pub mod types;

pub use self::core::{Document, ID_FIELD};
pub use types::Metadata;
