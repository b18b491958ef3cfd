//! Record list: an ordered, set-like selection of records from one or more
//! tables, keyed by a caller-supplied key function (spec 4.8). Grounded on
//! the teacher's `InMemoryTable`/`TableOps::select`/`join` machinery,
//! repurposed from a whole-table container into a lightweight index of
//! `(table, record_id, key)` triples over tables the caller already owns.

use crate::cursor::{Cursor, RecordCursor};
use crate::error::Result;
use crate::table::{RecordView, Table};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Shared handle to a table a list or index can point into. Single-threaded
/// shared mutability, not `Send`/`Sync` -- matches the blocking, one-writer
/// model of section 5.
pub type TableHandle = Rc<RefCell<Table>>;

/// One element of a key tuple (spec 4.9: "keys are tuples"). `Real` uses
/// `f64::total_cmp` so keys remain totally ordered even across `NaN`.
#[derive(Debug, Clone)]
pub enum KeyElement {
    Text(String),
    Integer(i64),
    Real(f64),
    Boolean(bool),
}

impl KeyElement {
    fn rank(&self) -> u8 {
        match self {
            KeyElement::Text(_) => 0,
            KeyElement::Integer(_) => 1,
            KeyElement::Real(_) => 2,
            KeyElement::Boolean(_) => 3,
        }
    }
}

impl PartialEq for KeyElement {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KeyElement {}

impl PartialOrd for KeyElement {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KeyElement {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyElement::Text(a), KeyElement::Text(b)) => a.cmp(b),
            (KeyElement::Integer(a), KeyElement::Integer(b)) => a.cmp(b),
            (KeyElement::Real(a), KeyElement::Real(b)) => a.total_cmp(b),
            (KeyElement::Boolean(a), KeyElement::Boolean(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for KeyElement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            KeyElement::Text(s) => s.hash(state),
            KeyElement::Integer(i) => i.hash(state),
            KeyElement::Real(r) => r.to_bits().hash(state),
            KeyElement::Boolean(b) => b.hash(state),
        }
    }
}

/// A non-tuple key is a length-1 tuple (spec 4.9).
pub type Key = Vec<KeyElement>;

pub fn text_key(s: impl Into<String>) -> Key {
    vec![KeyElement::Text(s.into())]
}

pub fn integer_key(i: i64) -> Key {
    vec![KeyElement::Integer(i)]
}

/// Whether `probe` is a prefix of `candidate`: per-element length on string
/// entries (spec 4.9), exact equality on every other element kind.
pub fn is_prefix(probe: &Key, candidate: &Key) -> bool {
    if probe.len() > candidate.len() {
        return false;
    }
    probe.iter().zip(candidate.iter()).all(|(p, c)| match (p, c) {
        (KeyElement::Text(ps), KeyElement::Text(cs)) => cs.starts_with(ps.as_str()),
        _ => p == c,
    })
}

#[derive(Clone)]
pub struct ListEntry {
    pub table: TableHandle,
    pub record_id: i64,
    pub key: Key,
}

/// A selection of records, set-like by key value (spec 4.8).
pub struct List {
    entries: Vec<ListEntry>,
    seen: HashSet<Key>,
    current: i64,
}

impl List {
    pub fn new() -> List {
        List { entries: Vec::new(), seen: HashSet::new(), current: -1 }
    }

    /// Build a list over every record of `table` (deleted records included,
    /// per 4.7's note that delete-skipping is a layer the caller builds).
    pub fn from_table(table: TableHandle, key_fn: impl Fn(&RecordView) -> Key) -> Result<List> {
        let mut list = List::new();
        let count = table.borrow().record_count();
        for i in 0..count {
            let record = table.borrow_mut().read(i as i64)?;
            let key = key_fn(&record);
            list.push(table.clone(), i as i64, key);
        }
        Ok(list)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ListEntry> {
        self.entries.get(index)
    }

    pub fn contains_key(&self, key: &Key) -> bool {
        self.seen.contains(key)
    }

    pub fn position(&self, key: &Key) -> Option<usize> {
        self.entries.iter().position(|e| &e.key == key)
    }

    /// Append one triple. No-op (returns `false`) if the key is already
    /// present, per the set-like semantics of 4.8.
    pub fn push(&mut self, table: TableHandle, record_id: i64, key: Key) -> bool {
        if self.seen.contains(&key) {
            return false;
        }
        self.seen.insert(key.clone());
        self.entries.push(ListEntry { table, record_id, key });
        true
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = (TableHandle, i64, Key)>) {
        for (table, record_id, key) in entries {
            self.push(table, record_id, key);
        }
    }

    pub fn pop(&mut self) -> Option<ListEntry> {
        let entry = self.entries.pop()?;
        self.seen.remove(&entry.key);
        Some(entry)
    }

    pub fn remove(&mut self, index: usize) -> Option<ListEntry> {
        if index >= self.entries.len() {
            return None;
        }
        let entry = self.entries.remove(index);
        self.seen.remove(&entry.key);
        Some(entry)
    }

    pub fn sort(&mut self) {
        self.entries.sort_by(|a, b| a.key.cmp(&b.key));
    }

    /// A new list over `self.entries[range]`, sharing table handles.
    pub fn slice(&self, range: std::ops::Range<usize>) -> List {
        let mut out = List::new();
        for entry in &self.entries[range] {
            out.push(entry.table.clone(), entry.record_id, entry.key.clone());
        }
        out
    }

    /// Union in place: entries from `other` are appended, keyed by whatever
    /// key each already carries -- "when keys differ, the left list's key is
    /// used" (4.8) only matters when re-deriving a key, which this list
    /// never does, so it reduces to ordinary set union over existing keys.
    pub fn union_with(&mut self, other: &List) {
        for entry in &other.entries {
            self.push(entry.table.clone(), entry.record_id, entry.key.clone());
        }
    }

    /// Difference in place: drop every entry whose key also appears in
    /// `other`.
    pub fn difference_with(&mut self, other: &List) {
        let drop: HashSet<&Key> = other.entries.iter().map(|e| &e.key).collect();
        let mut i = 0;
        while i < self.entries.len() {
            if drop.contains(&self.entries[i].key) {
                self.remove(i);
            } else {
                i += 1;
            }
        }
    }

    /// Decode the record an entry points at.
    pub fn read(&self, index: usize) -> Result<RecordView> {
        let entry = &self.entries[index];
        entry.table.borrow_mut().read(entry.record_id)
    }

    /// Apply a pack renumbering (spec 4.8 "List notification on pack"):
    /// entries for `table` are renumbered via `id_map`; entries mapped to
    /// `-1` are dropped and their key released.
    pub fn notify_pack(&mut self, table: &TableHandle, id_map: &[i64]) {
        let mut i = 0;
        while i < self.entries.len() {
            if Rc::ptr_eq(&self.entries[i].table, table) {
                let old_id = self.entries[i].record_id as usize;
                let new_id = id_map.get(old_id).copied().unwrap_or(-1);
                if new_id < 0 {
                    self.remove(i);
                    continue;
                }
                self.entries[i].record_id = new_id;
            }
            i += 1;
        }
    }
}

impl Default for List {
    fn default() -> Self {
        List::new()
    }
}

impl Cursor for List {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn current(&self) -> i64 {
        self.current
    }

    fn set_current(&mut self, value: i64) {
        self.current = value;
    }
}

impl RecordCursor for List {
    fn read_record(&mut self, index: i64) -> Result<RecordView> {
        self.read(index as usize)
    }
}

#[cfg(test)]
mod tests;
