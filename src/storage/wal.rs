use super::StorageEngine;
use crate::errors::DbError;
use crate::types::Operation;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use crc32fast::Hasher as Crc32Hasher;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

// Frame layout: [len: u32 LE][crc32: u32 LE][bincode payload]
const HEADER_LEN: usize = 8;

/// Append-only operation log backed by a single file.
pub struct Wal {
    path: PathBuf,
    file: File,
}

impl Wal {
    /// Opens the log at `path`, creating it and its parent directory if needed.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).read(true).open(&path)?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        let (_, valid_len) = Self::scan_frames(&buf)?;
        if valid_len < buf.len() {
            log::warn!("truncating {} torn bytes from {}", buf.len() - valid_len, path.display());
            file.set_len(valid_len as u64)?;
        }
        Ok(Self { path, file })
    }

    fn encode_frame(operation: &Operation) -> Result<Vec<u8>, DbError> {
        let payload = encode_to_vec(operation, standard())?;
        let len = u32::try_from(payload.len())
            .map_err(|_| DbError::InvalidDocument("operation exceeds 4 GiB".into()))?;
        let mut hasher = Crc32Hasher::new();
        hasher.update(&payload);
        let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
        frame.extend_from_slice(&len.to_le_bytes());
        frame.extend_from_slice(&hasher.finalize().to_le_bytes());
        frame.extend_from_slice(&payload);
        Ok(frame)
    }

    /// Splits `buf` into checked payloads. Also returns the length of the intact prefix, which
    /// is shorter than `buf` when the last append was interrupted.
    fn scan_frames(buf: &[u8]) -> Result<(Vec<&[u8]>, usize), DbError> {
        let mut payloads = Vec::new();
        let mut offset = 0usize;
        while offset < buf.len() {
            if offset + HEADER_LEN > buf.len() {
                log::warn!("ignoring truncated log header at offset {offset}");
                break;
            }
            let len = u32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
                as usize;
            let crc = u32::from_le_bytes([buf[offset + 4], buf[offset + 5], buf[offset + 6], buf[offset + 7]]);
            let start = offset + HEADER_LEN;
            if start + len > buf.len() {
                log::warn!("ignoring truncated log frame at offset {offset}");
                break;
            }
            let payload = &buf[start..start + len];
            let mut hasher = Crc32Hasher::new();
            hasher.update(payload);
            if hasher.finalize() != crc {
                return Err(DbError::Corrupt { offset: offset as u64, reason: "checksum mismatch".into() });
            }
            payloads.push(payload);
            offset = start + len;
        }
        Ok((payloads, offset))
    }

    fn decode_frames(buf: &[u8]) -> Result<Vec<Operation>, DbError> {
        let (payloads, _) = Self::scan_frames(buf)?;
        payloads
            .into_iter()
            .map(|payload| {
                let (op, _): (Operation, _) = decode_from_slice(payload, standard())?;
                Ok(op)
            })
            .collect()
    }
}

impl StorageEngine for Wal {
    fn append(&mut self, operation: &Operation) -> Result<(), DbError> {
        let frame = Self::encode_frame(operation)?;
        self.file.write_all(&frame)?;
        self.file.sync_data()?;
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<Operation>, DbError> {
        let mut file = self.file.try_clone()?;
        file.seek(SeekFrom::Start(0))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        Self::decode_frames(&buf)
    }

    fn rewrite(&mut self, operations: &[Operation]) -> Result<(), DbError> {
        let tmp_path = self.path.with_extension("tmp");
        {
            let mut tmp = OpenOptions::new().create(true).write(true).truncate(true).open(&tmp_path)?;
            for op in operations {
                tmp.write_all(&Self::encode_frame(op)?)?;
            }
            tmp.sync_data()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        sync_parent_dir(&self.path)?;
        self.file = OpenOptions::new().append(true).read(true).open(&self.path)?;
        log::info!("checkpoint rewrote {} with {} operations", self.path.display(), operations.len());
        Ok(())
    }
}

/// Makes a rename inside the log's directory durable.
#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> Result<(), DbError> {
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(p) => p,
        None => Path::new("."),
    };
    File::open(dir)?.sync_all()?;
    Ok(())
}

// Directory handles cannot be synced on this platform; the rename is already atomic.
#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> Result<(), DbError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::types::DocumentId;
    use bson::doc;

    fn insert(id: i64) -> Operation {
        Operation::Insert {
            collection: "students".into(),
            document: Document::new(DocumentId(id), doc! { "phone": "050" }),
        }
    }

    #[test]
    fn append_then_read_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut wal = Wal::open(dir.path().join("db.wal")).unwrap();
        wal.append(&insert(1)).unwrap();
        wal.append(&Operation::Delete { collection: "students".into(), document_id: DocumentId(1) }).unwrap();
        let ops = wal.read_all().unwrap();
        assert_eq!(ops.len(), 2);
        assert!(matches!(ops[0], Operation::Insert { .. }));
        assert!(matches!(ops[1], Operation::Delete { document_id: DocumentId(1), .. }));
    }

    #[test]
    fn truncated_tail_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.wal");
        {
            let mut wal = Wal::open(&path).unwrap();
            wal.append(&insert(1)).unwrap();
        }
        let mut f = OpenOptions::new().append(true).open(&path).unwrap();
        f.write_all(&[200, 0, 0, 0, 1, 2]).unwrap();
        drop(f);
        let mut wal = Wal::open(&path).unwrap();
        assert_eq!(wal.read_all().unwrap().len(), 1);
        wal.append(&insert(2)).unwrap();
        drop(wal);
        assert_eq!(Wal::open(&path).unwrap().read_all().unwrap().len(), 2);
    }

    #[test]
    fn flipped_payload_byte_is_reported_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.wal");
        {
            let mut wal = Wal::open(&path).unwrap();
            wal.append(&insert(1)).unwrap();
        }
        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        fs::write(&path, bytes).unwrap();
        assert!(matches!(Wal::open(&path), Err(DbError::Corrupt { offset: 0, .. })));
    }

    #[test]
    fn rewrite_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let mut wal = Wal::open(dir.path().join("db.wal")).unwrap();
        for id in 0..5 {
            wal.append(&insert(id)).unwrap();
        }
        wal.rewrite(&[insert(42)]).unwrap();
        wal.append(&insert(43)).unwrap();
        let ops = wal.read_all().unwrap();
        assert_eq!(ops.len(), 2);
    }

    #[test]
    fn rewrite_is_durable_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.wal");
        let mut wal = Wal::open(&path).unwrap();
        for id in 0..3 {
            wal.append(&insert(id)).unwrap();
        }
        wal.rewrite(&[insert(7)]).unwrap();
        drop(wal);

        assert!(!dir.path().join("db.tmp").exists());
        let ops = Wal::open(&path).unwrap().read_all().unwrap();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], Operation::Insert { document, .. } if document.id == DocumentId(7)));
    }

    #[test]
    fn parent_sync_handles_bare_file_name() {
        assert!(sync_parent_dir(Path::new("db.wal")).is_ok());
    }
}
