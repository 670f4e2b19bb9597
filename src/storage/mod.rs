//! Operation log backends. A storage engine only appends and replays; the in-memory
//! collections own the live state.
mod memory;
mod wal;

pub use memory::MemoryStorage;
pub use wal::Wal;

use crate::errors::DbError;
use crate::types::Operation;

pub trait StorageEngine: Send + Sync {
    /// Durably appends one operation.
    ///
    /// # Errors
    /// Returns an error if the operation cannot be encoded or written.
    fn append(&mut self, operation: &Operation) -> Result<(), DbError>;

    /// Reads every operation in append order.
    ///
    /// # Errors
    /// Returns an error on I/O failure or when a complete frame fails its checksum.
    fn read_all(&self) -> Result<Vec<Operation>, DbError>;

    /// Replaces the log with `operations`, used by checkpointing.
    ///
    /// # Errors
    /// Returns an error if the compacted log cannot be written.
    fn rewrite(&mut self, operations: &[Operation]) -> Result<(), DbError>;
}
