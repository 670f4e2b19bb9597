use super::StorageEngine;
use crate::errors::DbError;
use crate::types::Operation;

/// Keeps the log in memory only; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    ops: Vec<Operation>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageEngine for MemoryStorage {
    fn append(&mut self, operation: &Operation) -> Result<(), DbError> {
        self.ops.push(operation.clone());
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<Operation>, DbError> {
        Ok(self.ops.clone())
    }

    fn rewrite(&mut self, operations: &[Operation]) -> Result<(), DbError> {
        self.ops = operations.to_vec();
        Ok(())
    }
}
