use crate::document::Document;
use bson::Document as BsonDocument;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub type CollectionName = String;

/// Externally assigned document key, stored as `_id` inside the document body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub i64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for DocumentId {
    fn from(v: i64) -> Self {
        Self(v)
    }
}

/// A wrapper for `bson::Document` that round-trips through bincode as raw BSON bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct SerializableBsonDocument(pub BsonDocument);

impl Serialize for SerializableBsonDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut bytes = Vec::new();
        self.0.to_writer(&mut bytes).map_err(serde::ser::Error::custom)?;
        serializer.serialize_bytes(&bytes)
    }
}

impl<'de> Deserialize<'de> for SerializableBsonDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = serde_bytes::ByteBuf::deserialize(deserializer)?;
        let doc = BsonDocument::from_reader(bytes.as_slice()).map_err(serde::de::Error::custom)?;
        Ok(Self(doc))
    }
}

/// A wrapper for `chrono::DateTime<Utc>` encoded as RFC 3339 text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializableDateTime(pub DateTime<Utc>);

impl Serialize for SerializableDateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for SerializableDateTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let dt = DateTime::parse_from_rfc3339(&s).map_err(serde::de::Error::custom)?.with_timezone(&Utc);
        Ok(Self(dt))
    }
}

/// Represents operations that can be logged by a storage engine.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum Operation {
    CreateCollection { collection: CollectionName },
    DropCollection { collection: CollectionName },
    Insert { collection: CollectionName, document: Document },
    Update { collection: CollectionName, document: Document },
    Delete { collection: CollectionName, document_id: DocumentId },
}

impl Operation {
    #[must_use]
    pub fn collection(&self) -> &str {
        match self {
            Self::CreateCollection { collection }
            | Self::DropCollection { collection }
            | Self::Insert { collection, .. }
            | Self::Update { collection, .. }
            | Self::Delete { collection, .. } => collection,
        }
    }
}
