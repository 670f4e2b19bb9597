use crate::types::SerializableDateTime;
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Metadata {
    pub created_at: SerializableDateTime,
    pub updated_at: SerializableDateTime,
    /// Bumped on every successful update of the document body.
    pub revision: u64,
}

impl Metadata {
    #[must_use]
    pub fn new() -> Self {
        let now = SerializableDateTime(Utc::now());
        Self { created_at: now.clone(), updated_at: now, revision: 0 }
    }

    pub fn touch(&mut self) {
        self.updated_at = SerializableDateTime(Utc::now());
        self.revision += 1;
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self::new()
    }
}
