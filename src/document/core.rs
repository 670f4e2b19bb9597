use crate::document::types::Metadata;
use crate::types::{DocumentId, SerializableBsonDocument};
use bson::{Bson, Document as BsonDocument};
use serde::{Deserialize, Serialize};

/// Name of the key field every stored document carries.
pub const ID_FIELD: &str = "_id";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub data: SerializableBsonDocument,
    pub metadata: Metadata,
}

impl Document {
    /// Wraps `data` under `id`, overwriting any `_id` already present in the body.
    #[must_use]
    pub fn new(id: DocumentId, mut data: BsonDocument) -> Self {
        data.insert(ID_FIELD, Bson::Int64(id.0));
        Self { id, data: SerializableBsonDocument(data), metadata: Metadata::new() }
    }

    #[must_use]
    pub const fn body(&self) -> &BsonDocument {
        &self.data.0
    }

    #[must_use]
    pub fn into_body(self) -> BsonDocument {
        self.data.0
    }

    /// Replaces the body, keeping the key stable.
    pub fn update(&mut self, mut new_data: BsonDocument) {
        new_data.insert(ID_FIELD, Bson::Int64(self.id.0));
        self.data = SerializableBsonDocument(new_data);
        self.metadata.touch();
    }
}
