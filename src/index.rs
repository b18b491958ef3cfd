//! In-memory sorted index over one table, with partial (prefix) search and
//! incremental re-key on record change (spec 4.9). No direct teacher
//! equivalent; grounded on spec prose, reusing `list.rs`'s `Key`/`KeyElement`
//! tuple-key convention so list and index agree on what a "key" is.

use crate::cursor::{Cursor, RecordCursor};
use crate::error::{Flow, Result, XbaseError};
use crate::list::{is_prefix, Key, TableHandle};
use crate::table::RecordView;
use std::collections::HashMap;

/// A key function may decline to index a record by returning
/// `Err(Flow::SkipIndex)` (spec 4.9 "a key of the sentinel skip-index value
/// removes the entry entirely"); any other `Err` is treated the same way.
pub type KeyFn = Box<dyn Fn(&RecordView) -> std::result::Result<Key, Flow>>;

/// Two parallel sorted sequences -- `values[i]` the key, `record_ids[i]` the
/// record it came from -- plus a `record_id -> key` map for incremental
/// re-indexing (spec 4.9).
pub struct Index {
    table: TableHandle,
    key_fn: KeyFn,
    values: Vec<Key>,
    record_ids: Vec<i64>,
    by_record: HashMap<i64, Key>,
    current: i64,
}

impl Index {
    /// Build an index over every record of `table` at construction time.
    pub fn build(table: TableHandle, key_fn: KeyFn) -> Result<Index> {
        let mut index = Index {
            table,
            key_fn,
            values: Vec::new(),
            record_ids: Vec::new(),
            by_record: HashMap::new(),
            current: -1,
        };
        index.reindex()?;
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Full rebuild: re-applies the key function to every record in the
    /// table, in record-number order.
    pub fn reindex(&mut self) -> Result<()> {
        self.values.clear();
        self.record_ids.clear();
        self.by_record.clear();
        let count = self.table.borrow().record_count();
        for i in 0..count {
            let record = self.table.borrow_mut().read(i as i64)?;
            if let Ok(key) = (self.key_fn)(&record) {
                self.insert_sorted(i as i64, key);
            }
        }
        Ok(())
    }

    fn lower_bound(&self, probe: &Key) -> usize {
        self.values.partition_point(|k| k < probe)
    }

    fn insert_sorted(&mut self, record_id: i64, key: Key) {
        let at = self.lower_bound(&key);
        self.values.insert(at, key.clone());
        self.record_ids.insert(at, record_id);
        self.by_record.insert(record_id, key);
    }

    /// Locate the exact `(record_id, key)` slot so it can be removed; scans
    /// the contiguous equal-key run starting at the key's lower bound.
    fn position_of(&self, record_id: i64, key: &Key) -> Option<usize> {
        let mut i = self.lower_bound(key);
        while i < self.values.len() && &self.values[i] == key {
            if self.record_ids[i] == record_id {
                return Some(i);
            }
            i += 1;
        }
        None
    }

    fn remove_at(&mut self, at: usize) {
        self.values.remove(at);
        self.record_ids.remove(at);
    }

    /// Incremental update for one record (spec 4.9 `__call__`): no-op if the
    /// freshly computed key matches what's stored; otherwise remove the old
    /// entry and insert the new one (or just remove, on skip-index).
    pub fn notify_changed(&mut self, record_id: i64, record: &RecordView) {
        let new_key = (self.key_fn)(record);
        let old_key = self.by_record.get(&record_id).cloned();

        match (&old_key, &new_key) {
            (Some(old), Ok(new)) if old == new => return,
            _ => {}
        }
        if let Some(old) = old_key {
            if let Some(at) = self.position_of(record_id, &old) {
                self.remove_at(at);
            }
            self.by_record.remove(&record_id);
        }
        if let Ok(new) = new_key {
            self.insert_sorted(record_id, new);
        }
    }

    /// Every record whose key equals `probe` (`partial = false`) or whose
    /// key has `probe` as a prefix (`partial = true`), per element length on
    /// string entries.
    pub fn search(&self, probe: &Key, partial: bool) -> Result<Vec<RecordView>> {
        let mut out = Vec::new();
        let mut i = self.lower_bound(probe);
        while i < self.values.len() {
            let matches = if partial { is_prefix(probe, &self.values[i]) } else { &self.values[i] == probe };
            if !matches {
                break;
            }
            out.push(self.table.borrow_mut().read(self.record_ids[i])?);
            i += 1;
        }
        Ok(out)
    }

    /// The numeric position of the first record matching `probe` --
    /// exactly, or (when `partial`) with `probe` as a key prefix -- or
    /// `NotFound`.
    pub fn index_search(&self, probe: &Key, partial: bool) -> Result<usize> {
        let at = self.lower_bound(probe);
        let matches = at < self.values.len()
            && if partial { is_prefix(probe, &self.values[at]) } else { &self.values[at] == probe };
        if matches {
            Ok(at)
        } else {
            Err(XbaseError::NotFound)
        }
    }
}

impl Cursor for Index {
    fn len(&self) -> usize {
        self.values.len()
    }

    fn current(&self) -> i64 {
        self.current
    }

    fn set_current(&mut self, value: i64) {
        self.current = value;
    }
}

impl RecordCursor for Index {
    fn read_record(&mut self, index: i64) -> Result<RecordView> {
        let record_id = self.record_ids[index as usize];
        self.table.borrow_mut().read(record_id)
    }
}
