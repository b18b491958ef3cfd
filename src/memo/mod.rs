//! Memo store: block-addressed variable-length blob file (spec 4.3).
//! Two dialects with genuinely different on-disk formats and even
//! different read semantics (dBase III strips trailing whitespace, VFP
//! does not) -- see SPEC_FULL.md 9 open question (a): these are kept as
//! two non-unifying implementations rather than forced into one shape.

mod dbase3;
mod vfp;

pub use dbase3::DBaseIIIMemoStore;
pub use vfp::VfpMemoStore;

use crate::error::Result;
use std::path::Path;

pub const SUPERBLOCK_LEN: usize = 512;
pub const DBASE3_BLOCK_LEN: usize = 512;
pub const DBASE3_TERMINATOR: [u8; 2] = [0x1A, 0x1A];

/// Common contract for both memo dialects (spec 4.3 invariants: block 0
/// reserved, next-free-block monotonic, append-only growth).
pub trait MemoStore {
    /// Read the payload referenced by `block_id`. Block 0 means "no memo"
    /// and returns an empty payload without touching the file.
    fn read(&mut self, block_id: u32) -> Result<Vec<u8>>;

    /// Append `payload` as a new allocation and return its block id.
    fn write(&mut self, payload: &[u8]) -> Result<u32>;

    /// The next-free-block counter, for invariant checks and tests.
    fn next_free_block(&self) -> u32;
}

/// A store that never touches disk: every read returns an empty payload,
/// writes are rejected. Used when a table is opened with memos ignored
/// (spec 4.6 `open`, "ignore memos") -- the memo file may even be missing
/// or corrupt, so the table must not depend on it being readable.
pub struct NullMemoStore;

impl MemoStore for NullMemoStore {
    fn read(&mut self, _block_id: u32) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }

    fn write(&mut self, _payload: &[u8]) -> Result<u32> {
        Err(crate::error::XbaseError::TableError { detail: "memos are ignored on this table".to_string() })
    }

    fn next_free_block(&self) -> u32 {
        0
    }
}

/// Create a fresh, empty memo file at `path` for the given dialect and
/// return an opened store over it.
pub fn create_dbase3(path: impl AsRef<Path>) -> Result<DBaseIIIMemoStore> {
    DBaseIIIMemoStore::create(path)
}

pub fn open_dbase3(path: impl AsRef<Path>) -> Result<DBaseIIIMemoStore> {
    DBaseIIIMemoStore::open(path)
}

pub fn create_vfp(path: impl AsRef<Path>, block_size_units: u16) -> Result<VfpMemoStore> {
    VfpMemoStore::create(path, block_size_units)
}

pub fn open_vfp(path: impl AsRef<Path>) -> Result<VfpMemoStore> {
    VfpMemoStore::open(path)
}
