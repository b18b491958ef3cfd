//! Visual FoxPro `.fpt` memo store: configurable block size, 8-byte
//! per-allocation header (type tag + length), no terminator -- payload
//! bytes returned verbatim on read (spec 4.3; SPEC_FULL.md 9 open question
//! (a) keeps this distinct from the dBase III store's whitespace-stripping
//! read).

use super::{MemoStore, SUPERBLOCK_LEN};
use crate::error::{Result, XbaseError};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const ALLOCATION_HEADER_LEN: usize = 8;
const MEMO_TYPE_TAG: u32 = 1;

pub struct VfpMemoStore {
    file: File,
    path: PathBuf,
    next_free_block: u32,
    block_size: u32,
}

impl VfpMemoStore {
    /// `block_size_units`: 0 means byte-addressed (block size 1); 1..32
    /// means `units * 512` bytes per block, per spec 4.3 creation rules.
    pub fn create(path: impl AsRef<Path>, block_size_units: u16) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let block_size: u32 = if block_size_units == 0 {
            1
        } else {
            block_size_units as u32 * 512
        };
        let mut file = OpenOptions::new().read(true).write(true).create(true).truncate(true).open(&path)?;
        let mut superblock = [0u8; SUPERBLOCK_LEN];
        superblock[0..4].copy_from_slice(&1u32.to_be_bytes());
        superblock[6..8].copy_from_slice(&(block_size as u16).to_be_bytes());
        file.write_all(&superblock)?;
        file.flush()?;
        Ok(VfpMemoStore { file, path, next_free_block: 1, block_size })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new().read(true).write(true).open(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                XbaseError::MemoFileMissing { path: path.clone() }
            } else {
                XbaseError::Io(e)
            }
        })?;
        let mut superblock = [0u8; SUPERBLOCK_LEN];
        file.read_exact(&mut superblock).map_err(|_| XbaseError::MemoCorrupt {
            path: path.clone(),
            detail: "superblock is shorter than 512 bytes".to_string(),
        })?;
        let next_free_block = u32::from_be_bytes(superblock[0..4].try_into().unwrap());
        let block_size = u16::from_be_bytes(superblock[6..8].try_into().unwrap()) as u32;
        let block_size = if block_size == 0 { 1 } else { block_size };
        Ok(VfpMemoStore { file, path, next_free_block, block_size })
    }

    fn write_next_free_block(&mut self) -> Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&self.next_free_block.to_be_bytes())?;
        self.file.flush()?;
        Ok(())
    }

    fn block_offset(&self, block_id: u32) -> u64 {
        block_id as u64 * self.block_size as u64
    }
}

impl MemoStore for VfpMemoStore {
    fn read(&mut self, block_id: u32) -> Result<Vec<u8>> {
        if block_id == 0 {
            return Ok(Vec::new());
        }
        self.file.seek(SeekFrom::Start(self.block_offset(block_id)))?;
        let mut header = [0u8; ALLOCATION_HEADER_LEN];
        self.file.read_exact(&mut header).map_err(|_| XbaseError::MemoCorrupt {
            path: self.path.clone(),
            detail: format!("block {} has no allocation header", block_id),
        })?;
        let len = u32::from_be_bytes(header[4..8].try_into().unwrap()) as usize;
        let mut payload = vec![0u8; len];
        self.file.read_exact(&mut payload).map_err(|_| XbaseError::MemoCorrupt {
            path: self.path.clone(),
            detail: format!("block {} payload is truncated", block_id),
        })?;
        Ok(payload)
    }

    fn write(&mut self, payload: &[u8]) -> Result<u32> {
        let block_id = self.next_free_block;
        let total_len = ALLOCATION_HEADER_LEN + payload.len();
        let blocks_needed = ((total_len as u64 + self.block_size as u64 - 1) / self.block_size as u64) as u32;

        self.file.seek(SeekFrom::Start(self.block_offset(block_id)))?;
        self.file.write_all(&MEMO_TYPE_TAG.to_be_bytes())?;
        self.file.write_all(&(payload.len() as u32).to_be_bytes())?;
        self.file.write_all(payload)?;
        self.file.flush()?;

        self.next_free_block += blocks_needed;
        self.write_next_free_block()?;
        Ok(block_id)
    }

    fn next_free_block(&self) -> u32 {
        self.next_free_block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_then_read_returns_exact_payload_no_trim() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.fpt");
        let mut store = VfpMemoStore::create(&path, 1).unwrap();
        let block = store.write(b"check twice   ").unwrap();
        assert_eq!(store.read(block).unwrap(), b"check twice   ");
    }

    #[test]
    fn block_zero_reads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.fpt");
        let mut store = VfpMemoStore::create(&path, 1).unwrap();
        assert_eq!(store.read(0).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn default_block_size_unit_is_byte_addressed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.fpt");
        let store = VfpMemoStore::create(&path, 0).unwrap();
        assert_eq!(store.block_size, 1);
    }

    #[test]
    fn block_size_units_multiply_by_512() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.fpt");
        let store = VfpMemoStore::create(&path, 4).unwrap();
        assert_eq!(store.block_size, 2048);
    }

    #[test]
    fn next_free_block_is_monotonic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.fpt");
        let mut store = VfpMemoStore::create(&path, 1).unwrap();
        let mut last = store.next_free_block();
        for i in 0..5 {
            store.write(format!("payload {}", i).as_bytes()).unwrap();
            assert!(store.next_free_block() > last);
            last = store.next_free_block();
        }
    }

    #[test]
    fn reopen_persists_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.fpt");
        let block;
        {
            let mut store = VfpMemoStore::create(&path, 1).unwrap();
            block = store.write(b"hello").unwrap();
        }
        let mut store = VfpMemoStore::open(&path).unwrap();
        assert_eq!(store.read(block).unwrap(), b"hello");
    }
}
