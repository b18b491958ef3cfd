//! dBase III `.dbt` memo store: 512-byte blocks, `0x1A 0x1A`-terminated
//! payloads (spec 4.3). No teacher equivalent; grounded on spec prose in
//! the idiom of the teacher's `File` + `Read`/`Seek` usage.

use super::{MemoStore, DBASE3_BLOCK_LEN, DBASE3_TERMINATOR, SUPERBLOCK_LEN};
use crate::error::{Result, XbaseError};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

pub struct DBaseIIIMemoStore {
    file: File,
    path: PathBuf,
    next_free_block: u32,
}

impl DBaseIIIMemoStore {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new().read(true).write(true).create(true).truncate(true).open(&path)?;
        let mut superblock = [0u8; SUPERBLOCK_LEN];
        superblock[0..4].copy_from_slice(&1u32.to_le_bytes());
        file.write_all(&superblock)?;
        file.flush()?;
        Ok(DBaseIIIMemoStore { file, path, next_free_block: 1 })
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
        let mut superblock = [0u8; 4];
        file.read_exact(&mut superblock).map_err(|_| XbaseError::MemoCorrupt {
            path: path.clone(),
            detail: "superblock is shorter than 4 bytes".to_string(),
        })?;
        let next_free_block = u32::from_le_bytes(superblock);
        Ok(DBaseIIIMemoStore { file, path, next_free_block })
    }

    fn write_next_free_block(&mut self) -> Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&self.next_free_block.to_le_bytes())?;
        self.file.flush()?;
        Ok(())
    }
}

impl MemoStore for DBaseIIIMemoStore {
    fn read(&mut self, block_id: u32) -> Result<Vec<u8>> {
        if block_id == 0 {
            return Ok(Vec::new());
        }
        self.file.seek(SeekFrom::Start(block_id as u64 * DBASE3_BLOCK_LEN as u64))?;
        let mut payload = Vec::new();
        let mut block = [0u8; DBASE3_BLOCK_LEN];
        loop {
            let read = self.file.read(&mut block)?;
            if read == 0 {
                return Err(XbaseError::MemoCorrupt {
                    path: self.path.clone(),
                    detail: format!("block {} has no terminator before EOF", block_id),
                });
            }
            payload.extend_from_slice(&block[..read]);
            if let Some(pos) = find_terminator(&payload) {
                payload.truncate(pos);
                break;
            }
        }
        let text = String::from_utf8_lossy(&payload);
        Ok(text.trim_end().as_bytes().to_vec())
    }

    fn write(&mut self, payload: &[u8]) -> Result<u32> {
        let block_id = self.next_free_block;
        let total_len = payload.len() + DBASE3_TERMINATOR.len();
        let blocks_needed = (total_len + DBASE3_BLOCK_LEN - 1) / DBASE3_BLOCK_LEN;
        let padded_len = blocks_needed * DBASE3_BLOCK_LEN;

        let mut buf = vec![0u8; padded_len];
        buf[..payload.len()].copy_from_slice(payload);
        buf[payload.len()..payload.len() + 2].copy_from_slice(&DBASE3_TERMINATOR);

        self.file.seek(SeekFrom::Start(block_id as u64 * DBASE3_BLOCK_LEN as u64))?;
        self.file.write_all(&buf)?;
        self.file.flush()?;

        self.next_free_block += blocks_needed as u32;
        self.write_next_free_block()?;
        Ok(block_id)
    }

    fn next_free_block(&self) -> u32 {
        self.next_free_block
    }
}

fn find_terminator(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == DBASE3_TERMINATOR)
}
