use crate::document::Document;
use crate::storage::StorageEngine;
use crate::types::DocumentId;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A named set of documents keyed by `_id`. Iteration order is ascending `_id`.
pub struct Collection {
    pub(crate) name: String,
    pub(crate) docs: RwLock<BTreeMap<DocumentId, Document>>,
    pub(crate) storage: Arc<RwLock<Box<dyn StorageEngine>>>,
}

impl Collection {
    pub fn new(name: String, storage: Arc<RwLock<Box<dyn StorageEngine>>>) -> Self {
        Self { name, docs: RwLock::new(BTreeMap::new()), storage }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection").field("name", &self.name).field("len", &self.len()).finish()
    }
}
