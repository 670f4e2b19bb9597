pub mod aggregate;
pub mod cli;
pub mod collection;
pub mod config;
pub mod document;
pub mod engine;
pub mod errors;
pub mod logger;
pub mod query;
pub mod storage;
pub mod students;
pub mod types;

use crate::aggregate::Pipeline;
use crate::collection::Collection;
use crate::config::AppConfig;
use crate::engine::Engine;
use crate::errors::DbError;
use crate::query::{Cursor, Filter, FindOptions};
use crate::students::{StudentAggregations, StudentRepo, StudentsServiceImpl};
use bson::Document as BsonDocument;
use std::path::Path;
use std::sync::Arc;

/// The main database handle.
#[derive(Debug, Clone)]
pub struct Database {
    engine: Arc<Engine>,
}

impl Database {
    /// Opens or creates a database whose operation log lives at `filepath`.
    ///
    /// # Errors
    /// Returns an error if the log cannot be opened or replayed.
    pub fn open<P: AsRef<Path>>(filepath: P) -> Result<Self, DbError> {
        Ok(Self { engine: Arc::new(Engine::new(filepath)?) })
    }

    /// A database that keeps nothing on disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self { engine: Arc::new(Engine::in_memory()) }
    }

    /// Opens `config.db_path`, or an in-memory database when it is unset.
    ///
    /// # Errors
    /// Returns an error if the log cannot be opened or replayed.
    pub fn from_config(config: &AppConfig) -> Result<Self, DbError> {
        config.db_path.as_ref().map_or_else(|| Ok(Self::in_memory()), Self::open)
    }

    #[must_use]
    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Returns the named collection, creating it on first use.
    ///
    /// # Errors
    /// Returns a storage error if the creation cannot be logged.
    pub fn collection(&self, name: &str) -> Result<Arc<Collection>, DbError> {
        self.engine.create_collection(name)
    }

    fn existing(&self, name: &str) -> Result<Arc<Collection>, DbError> {
        self.engine.get_collection(name).ok_or_else(|| DbError::NoSuchCollection(name.to_string()))
    }

    /// # Errors
    /// Returns `DbError::NoSuchCollection` for an unknown collection.
    pub fn find(&self, collection_name: &str, filter: &Filter, opts: &FindOptions) -> Result<Cursor, DbError> {
        Ok(query::find_docs(&*self.existing(collection_name)?, filter, opts))
    }

    /// # Errors
    /// Returns `DbError::NoSuchCollection` for an unknown collection.
    pub fn count(&self, collection_name: &str, filter: &Filter) -> Result<usize, DbError> {
        Ok(query::count_docs(&*self.existing(collection_name)?, filter))
    }

    /// # Errors
    /// Returns `DbError::NoSuchCollection` for an unknown collection, or a pipeline error.
    pub fn aggregate(&self, collection_name: &str, pipeline: &Pipeline) -> Result<Vec<BsonDocument>, DbError> {
        aggregate::aggregate(&*self.existing(collection_name)?, pipeline)
    }

    /// Compacts the operation log.
    ///
    /// # Errors
    /// Returns a storage error if the compacted log cannot be written.
    pub fn checkpoint(&self) -> Result<(), DbError> {
        self.engine.checkpoint()
    }

    /// Wires a students service over `config.collection`.
    ///
    /// # Errors
    /// Returns a storage error if the collection cannot be created.
    pub fn students_service(&self, config: &AppConfig) -> Result<StudentsServiceImpl, DbError> {
        let col = self.collection(&config.collection)?;
        let repo = StudentRepo::new(col.clone());
        let aggregations = StudentAggregations::new(col).with_best_score_cutoff(config.best_score_cutoff);
        Ok(StudentsServiceImpl::new(repo, aggregations))
    }
}
