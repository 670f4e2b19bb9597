use super::core::Collection;
use crate::document::Document;
use crate::errors::DbError;
use crate::types::{DocumentId, Operation};
use crate::logger::AUDIT_TARGET;
use bson::Document as BsonDocument;

impl Collection {
    fn persist(&self, operation: &Operation) -> Result<(), DbError> {
        let res = self.storage.write().append(operation);
        if let Err(e) = &res {
            log::error!("storage append failed for collection {}: {e}", self.name);
        }
        res
    }

    /// Inserts `document`, failing with `DbError::DuplicateKey` when its id is taken.
    ///
    /// # Errors
    /// Returns `DuplicateKey` or a storage error; the collection is unchanged on error.
    pub fn insert_document(&self, document: Document) -> Result<DocumentId, DbError> {
        let mut docs = self.docs.write();
        let doc_id = document.id;
        if docs.contains_key(&doc_id) {
            return Err(DbError::DuplicateKey(doc_id));
        }
        self.persist(&Operation::Insert { collection: self.name.clone(), document: document.clone() })?;
        docs.insert(doc_id, document);
        log::info!(target: AUDIT_TARGET, "op=insert collection={} id={doc_id}", self.name);
        Ok(doc_id)
    }

    #[must_use]
    pub fn contains(&self, id: &DocumentId) -> bool {
        self.docs.read().contains_key(id)
    }

    /// Atomic read-modify-write of one document body. The write lock is held across the
    /// closure and the log append, so concurrent modifications of the same id serialize.
    ///
    /// # Errors
    /// Propagates the closure's error or a storage error; the collection is unchanged on error.
    pub fn modify_document<F>(&self, id: &DocumentId, f: F) -> Result<Option<Document>, DbError>
    where
        F: FnOnce(&mut BsonDocument) -> Result<(), DbError>,
    {
        let mut docs = self.docs.write();
        let Some(current) = docs.get(id) else { return Ok(None) };
        let mut updated = current.clone();
        let mut body = updated.data.0.clone();
        f(&mut body)?;
        updated.update(body);
        self.persist(&Operation::Update { collection: self.name.clone(), document: updated.clone() })?;
        docs.insert(*id, updated.clone());
        log::info!(target: AUDIT_TARGET, "op=update collection={} id={id}", self.name);
        Ok(Some(updated))
    }

    /// Removes a document and returns its last state.
    ///
    /// # Errors
    /// Returns a storage error; the collection is unchanged on error.
    pub fn delete_document(&self, id: &DocumentId) -> Result<Option<Document>, DbError> {
        let mut docs = self.docs.write();
        if !docs.contains_key(id) {
            return Ok(None);
        }
        self.persist(&Operation::Delete { collection: self.name.clone(), document_id: *id })?;
        let removed = docs.remove(id);
        log::info!(target: AUDIT_TARGET, "op=delete collection={} id={id}", self.name);
        Ok(removed)
    }

    /// Clones every document in ascending id order.
    #[must_use]
    pub fn get_all_documents(&self) -> Vec<Document> {
        self.docs.read().values().cloned().collect()
    }

    /// Applies a logged operation without re-logging it.
    pub(crate) fn apply_replayed(&self, operation: Operation) {
        let mut docs = self.docs.write();
        match operation {
            Operation::Insert { document, .. } | Operation::Update { document, .. } => {
                docs.insert(document.id, document);
            }
            Operation::Delete { document_id, .. } => {
                docs.remove(&document_id);
            }
            Operation::CreateCollection { .. } | Operation::DropCollection { .. } => {}
        }
    }
}
