use crate::collection::Collection;
use crate::errors::DbError;
use crate::storage::{MemoryStorage, StorageEngine, Wal};
use crate::types::{CollectionName, Operation};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// The embedded engine: named collections over one shared operation log.
pub struct Engine {
    collections: RwLock<HashMap<CollectionName, Arc<Collection>>>,
    storage: Arc<RwLock<Box<dyn StorageEngine>>>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").field("collections", &self.list_collection_names()).finish()
    }
}

impl Engine {
    /// Opens (or creates) the log at `wal_path` and replays it into memory.
    ///
    /// # Errors
    /// Returns an error if the log cannot be opened or replayed.
    pub fn new<P: AsRef<Path>>(wal_path: P) -> Result<Self, DbError> {
        let wal = Wal::open(wal_path.as_ref())?;
        log::info!("opening engine at {}", wal_path.as_ref().display());
        Self::with_storage(Box::new(wal))
    }

    /// An engine whose log lives only in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            storage: Arc::new(RwLock::new(Box::new(MemoryStorage::new()))),
        }
    }

    /// Builds an engine over any storage backend, replaying what it already holds.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be read.
    pub fn with_storage(storage: Box<dyn StorageEngine>) -> Result<Self, DbError> {
        let ops = storage.read_all()?;
        let engine = Self { collections: RwLock::new(HashMap::new()), storage: Arc::new(RwLock::new(storage)) };
        let replayed = ops.len();
        engine.replay(ops);
        log::debug!("replayed {replayed} operations");
        Ok(engine)
    }

    fn replay(&self, ops: Vec<Operation>) {
        let mut cols = self.collections.write();
        for op in ops {
            match op {
                Operation::CreateCollection { collection } => {
                    cols.entry(collection.clone())
                        .or_insert_with(|| Arc::new(Collection::new(collection, self.storage.clone())));
                }
                Operation::DropCollection { collection } => {
                    cols.remove(&collection);
                }
                other => {
                    let name = other.collection().to_string();
                    let col = cols
                        .entry(name.clone())
                        .or_insert_with(|| Arc::new(Collection::new(name, self.storage.clone())));
                    col.apply_replayed(other);
                }
            }
        }
    }

    /// Returns the named collection, creating it on first use.
    ///
    /// # Errors
    /// Returns a storage error if the creation cannot be logged.
    pub fn create_collection(&self, name: &str) -> Result<Arc<Collection>, DbError> {
        if let Some(col) = self.get_collection(name) {
            return Ok(col);
        }
        let mut cols = self.collections.write();
        if let Some(col) = cols.get(name) {
            return Ok(col.clone());
        }
        self.storage.write().append(&Operation::CreateCollection { collection: name.to_string() })?;
        let col = Arc::new(Collection::new(name.to_string(), self.storage.clone()));
        cols.insert(name.to_string(), col.clone());
        log::debug!("created collection {name}");
        Ok(col)
    }

    #[must_use]
    pub fn get_collection(&self, name: &str) -> Option<Arc<Collection>> {
        self.collections.read().get(name).cloned()
    }

    /// Drops a collection. Returns `false` when it did not exist.
    ///
    /// # Errors
    /// Returns a storage error if the drop cannot be logged.
    pub fn delete_collection(&self, name: &str) -> Result<bool, DbError> {
        let mut cols = self.collections.write();
        if !cols.contains_key(name) {
            return Ok(false);
        }
        self.storage.write().append(&Operation::DropCollection { collection: name.to_string() })?;
        cols.remove(name);
        Ok(true)
    }

    #[must_use]
    pub fn list_collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Compacts the log down to one create per collection and one insert per live document.
    ///
    /// # Errors
    /// Returns a storage error if the compacted log cannot be written.
    pub fn checkpoint(&self) -> Result<(), DbError> {
        let cols = self.collections.read();
        let mut ordered: Vec<&Arc<Collection>> = cols.values().collect();
        ordered.sort_by(|a, b| a.name().cmp(b.name()));
        // block writers for the duration so no mutation slips between snapshot and rewrite
        let guards: Vec<_> = ordered.iter().map(|c| (c.name().to_string(), c.docs.write())).collect();
        let mut ops = Vec::new();
        for (name, docs) in &guards {
            ops.push(Operation::CreateCollection { collection: name.clone() });
            ops.extend(docs.values().map(|d| Operation::Insert { collection: name.clone(), document: d.clone() }));
        }
        self.storage.write().rewrite(&ops)?;
        Ok(())
    }
}
