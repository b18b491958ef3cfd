//! Table engine: owns the file handle, header, schema, and memo store, and
//! implements every mutating/reading operation on a table (spec 4.6).
//! Grounded on the teacher's `InMemoryTable`/`TableOps` plus `read_header`,
//! generalized from an in-memory-only container to one that owns real
//! files and rewrites them on schema mutation.

use crate::codec::Value;
use crate::codepage;
use crate::config::Config;
use crate::cursor::{Cursor, RecordCursor};
use crate::dialect::Dialect;
use crate::error::{Flow, Result, XbaseError};
use crate::fieldname::FieldNameList;
use crate::header::{self, FieldDescriptor, Header};
use crate::memo::{create_dbase3, create_vfp, open_dbase3, open_vfp, MemoStore, NullMemoStore};
use crate::record::{self, Flux};
use chrono::NaiveDate;
use encoding_rs::Encoding;
use std::collections::{HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    ReadOnly,
    ReadWrite,
}

/// One decoded record (spec 4.6/6 "Record"): field values in schema order,
/// the delete flag, and the record's stable number -- or [`RecordView::Vapor`],
/// the sentinel returned for a cursor position with no record behind it
/// (spec 4.7, 9 "a variant of the record type, not a global"). `Vapor`
/// compares unequal to every other `RecordView`, including another `Vapor`.
#[derive(Debug, Clone)]
pub enum RecordView {
    Record { deleted: bool, record_number: i64, values: Vec<(String, Value)> },
    Vapor,
}

impl RecordView {
    pub fn vapor() -> RecordView {
        RecordView::Vapor
    }

    pub fn is_vapor(&self) -> bool {
        matches!(self, RecordView::Vapor)
    }

    /// Vapor is falsy; a real record is truthy (spec 4.7).
    pub fn is_truthy(&self) -> bool {
        !self.is_vapor()
    }

    pub fn record_number(&self) -> Option<i64> {
        match self {
            RecordView::Record { record_number, .. } => Some(*record_number),
            RecordView::Vapor => None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        match self {
            RecordView::Record { deleted, .. } => *deleted,
            RecordView::Vapor => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            RecordView::Record { values, .. } => values.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)).map(|(_, v)| v),
            RecordView::Vapor => None,
        }
    }

    /// Read by ordinal position in schema order (spec 6 "Record").
    pub fn get_at(&self, ordinal: usize) -> Option<&Value> {
        match self {
            RecordView::Record { values, .. } => values.get(ordinal).map(|(_, v)| v),
            RecordView::Vapor => None,
        }
    }

    /// Every field name/value pair as a mapping (spec 6 `scatter()`).
    pub fn scatter(&self) -> std::collections::HashMap<String, Value> {
        match self {
            RecordView::Record { values, .. } => values.iter().cloned().collect(),
            RecordView::Vapor => std::collections::HashMap::new(),
        }
    }
}

impl PartialEq for RecordView {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RecordView::Vapor, _) | (_, RecordView::Vapor) => false,
            (
                RecordView::Record { deleted: d1, record_number: n1, values: v1 },
                RecordView::Record { deleted: d2, record_number: n2, values: v2 },
            ) => d1 == d2 && n1 == n2 && v1 == v2,
        }
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn memo_path_for(path: &Path, dialect: Dialect) -> PathBuf {
    path.with_extension(dialect.memo_extension())
}

fn create_memo_store(path: &Path, dialect: Dialect) -> Result<Box<dyn MemoStore>> {
    if dialect.uses_vfp_memo() {
        Ok(Box::new(create_vfp(path, 1)?))
    } else {
        Ok(Box::new(create_dbase3(path)?))
    }
}

fn open_memo_store(path: &Path, dialect: Dialect) -> Result<Box<dyn MemoStore>> {
    if dialect.uses_vfp_memo() {
        Ok(Box::new(open_vfp(path)?))
    } else {
        Ok(Box::new(open_dbase3(path)?))
    }
}

/// The table engine (spec 3 "Table", 4.6). Owns a single main file and its
/// optional memo sidecar; there is no resident record cache, so every read
/// re-decodes straight off disk -- simple over the weak-ref cache the spec
/// allows, and correct for the single-writer model of section 5.
pub struct Table {
    path: PathBuf,
    file: Option<File>,
    header: Header,
    fields: Vec<FieldDescriptor>,
    memo: Option<Box<dyn MemoStore>>,
    memo_path: Option<PathBuf>,
    codepage: &'static Encoding,
    codepage_name: String,
    config: Config,
    current: i64,
    read_only: bool,
    blank_template: Vec<u8>,
    backed_up: bool,
    flux_in_progress: HashSet<usize>,
}

impl Table {
    /// Create a brand-new table file (plus memo sidecar if the schema needs
    /// one) and open it read-write. `dialect`/`codepage_name` fall back to
    /// `config.default_dialect`/`config.default_codepage` when the caller
    /// passes `None` (spec 4.13: these are "overridable per table at
    /// open/create time", not forced defaults).
    pub fn create<'a>(
        path: impl AsRef<Path>,
        dialect: impl Into<Option<Dialect>>,
        mut fields: Vec<FieldDescriptor>,
        codepage_name: impl Into<Option<&'a str>>,
        config: Config,
    ) -> Result<Table> {
        let dialect = dialect.into().unwrap_or(config.default_dialect);
        let codepage_name = codepage_name.into().unwrap_or(config.default_codepage);
        let path = path.as_ref().to_path_buf();
        for field in &fields {
            if !dialect.allowed_field_types().contains(&field.field_type.tag()) {
                return Err(XbaseError::UnknownFieldType {
                    flag: field.field_type.tag() as char,
                    dialect: format!("{:?}", dialect),
                });
            }
        }
        header::reassign_offsets(&mut fields);
        let has_memo = fields.iter().any(|f| f.field_type.is_memo_like());
        let record_length = header::record_length_for(&fields);
        let header_length = header::header_length_for(&fields, dialect);
        let codepage_id = codepage::id_for_name(codepage_name)?;
        let encoding = codepage::encoding_for_name(codepage_name)?;

        let mut file = OpenOptions::new().read(true).write(true).create(true).truncate(true).open(&path)?;
        let hdr = Header {
            dialect,
            has_memo,
            last_update: today(),
            record_count: 0,
            header_length: header_length as u16,
            record_length: record_length as u16,
            table_flags: 0,
            codepage_id,
        };
        hdr.write(&mut file)?;
        header::write_fields(&mut file, &fields, dialect)?;
        file.write_all(&[header::EOF_MARKER])?;
        file.flush()?;

        let memo_path = if has_memo { Some(memo_path_for(&path, dialect)) } else { None };
        let memo = match &memo_path {
            Some(p) => Some(create_memo_store(p, dialect)?),
            None => None,
        };

        let blank_template = record::blank_record(&fields, record_length);
        log::info!("created table '{}' ({:?}, {} fields)", path.display(), dialect, fields.len());

        Ok(Table {
            path,
            file: Some(file),
            header: hdr,
            fields,
            memo,
            memo_path,
            codepage: encoding,
            codepage_name: codepage_name.to_string(),
            config,
            current: -1,
            read_only: false,
            blank_template,
            backed_up: false,
            flux_in_progress: HashSet::new(),
        })
    }

    /// Open an existing table file (spec 4.6 `open`).
    pub fn open(path: impl AsRef<Path>, mode: OpenMode, config: Config) -> Result<Table> {
        Table::open_impl(path, mode, config, false)
    }

    /// Open an existing table file without reading its memo sidecar (spec
    /// 4.6 `open`, "ignore memos"): every memo/general/picture field reads
    /// back empty, and a missing or corrupt memo file does not stop the
    /// table from opening.
    pub fn open_ignoring_memos(path: impl AsRef<Path>, mode: OpenMode, config: Config) -> Result<Table> {
        Table::open_impl(path, mode, config, true)
    }

    fn open_impl(path: impl AsRef<Path>, mode: OpenMode, config: Config, ignore_memos: bool) -> Result<Table> {
        let path = path.as_ref().to_path_buf();
        let read_only = mode == OpenMode::ReadOnly;
        let mut file = OpenOptions::new().read(true).write(!read_only).open(&path)?;
        let header = Header::read(&mut file)?;
        let fields = header::read_fields(&mut file, header.dialect)?;

        let has_memo_fields = fields.iter().any(|f| f.field_type.is_memo_like());
        if header.has_memo && !has_memo_fields {
            log::debug!("table '{}' declares memos present but schema has no memo-typed fields", path.display());
        }
        if has_memo_fields && !header.has_memo && !ignore_memos {
            return Err(XbaseError::MemoFlagMissing);
        }
        let memo_path = if header.has_memo { Some(memo_path_for(&path, header.dialect)) } else { None };
        let memo: Option<Box<dyn MemoStore>> = if ignore_memos {
            if memo_path.is_some() {
                log::info!("table '{}' opened with memos ignored", path.display());
            }
            Some(Box::new(NullMemoStore))
        } else {
            match &memo_path {
                Some(p) => Some(open_memo_store(p, header.dialect)?),
                None => None,
            }
        };

        let codepage_name = codepage::name_for_id(header.codepage_id)?;
        let encoding = codepage::encoding_for_name(codepage_name)?;
        let record_length = header.record_length as usize;
        let blank_template = record::blank_record(&fields, record_length);

        let current = if header.record_count > 0 { 0 } else { -1 };
        log::info!("opened table '{}' ({} records)", path.display(), header.record_count);

        Ok(Table {
            path,
            file: Some(file),
            header,
            fields,
            memo,
            memo_path,
            codepage: encoding,
            codepage_name: codepage_name.to_string(),
            config,
            current,
            read_only,
            blank_template,
            backed_up: false,
            flux_in_progress: HashSet::new(),
        })
    }

    /// Flush and release the file handle(s) (spec 4.6 `close`).
    pub fn close(&mut self) -> Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }
        self.file = None;
        self.memo = None;
        log::info!("closed table '{}'", self.path.display());
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    pub fn record_count(&self) -> usize {
        self.header.record_count as usize
    }

    pub fn record_length(&self) -> usize {
        self.header.record_length as usize
    }

    pub fn dialect(&self) -> Dialect {
        self.header.dialect
    }

    pub fn codepage_name(&self) -> &str {
        &self.codepage_name
    }

    /// Decode raw bytes destined for a character-like field using
    /// `config.default_input_decoding` (spec 4.13), for callers that hold
    /// bytes rather than an already-decoded string. Grounded on the
    /// original `ensure_unicode` helper, which raises rather than silently
    /// lossy-decoding on a bad byte sequence.
    pub fn decode_input_bytes(&self, bytes: &[u8]) -> Result<String> {
        let encoding = codepage::encoding_for_name(self.config.default_input_decoding)?;
        let (text, _, had_errors) = encoding.decode(bytes);
        if had_errors {
            return Err(XbaseError::BadInputDecoding { codepage: self.config.default_input_decoding.to_string() });
        }
        Ok(text.into_owned())
    }

    pub fn field_names(&self) -> FieldNameList {
        FieldNameList::from_fields(&self.fields)
    }

    pub fn structure(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field_info(&self, name: &str) -> Result<&FieldDescriptor> {
        self.field(name)
    }

    pub fn memo_path(&self) -> Option<&Path> {
        self.memo_path.as_deref()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> Config {
        self.config.clone()
    }

    fn field(&self, name: &str) -> Result<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| XbaseError::FieldMissing { name: name.to_string() })
    }

    fn memo_ref_is_vfp(&self) -> bool {
        self.header.dialect.uses_vfp_memo()
    }

    fn normalize_index(&self, index: i64) -> Result<usize> {
        let len = self.header.record_count as i64;
        let normalized = if index < 0 { len + index } else { index };
        if normalized < 0 || normalized >= len {
            return Err(XbaseError::RecordIndexOutOfRange { index, len: self.header.record_count as usize });
        }
        Ok(normalized as usize)
    }

    fn record_offset(&self, index: usize) -> u64 {
        self.header.header_length as u64 + index as u64 * self.header.record_length as u64
    }

    fn file_mut(&mut self) -> Result<&mut File> {
        self.file.as_mut().ok_or(XbaseError::TableClosed)
    }

    fn read_record_bytes(&mut self, index: usize) -> Result<Vec<u8>> {
        let offset = self.record_offset(index);
        let record_length = self.header.record_length as usize;
        let file = self.file_mut()?;
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; record_length];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn write_record_bytes(&mut self, index: usize, buf: &[u8]) -> Result<()> {
        if self.read_only {
            return Err(XbaseError::ReadOnly);
        }
        let offset = self.record_offset(index);
        let file = self.file_mut()?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(buf)?;
        file.flush()?;
        Ok(())
    }

    /// Write the `0x1A` end-of-file marker just past the last record and
    /// truncate the file there, per spec invariant 2.
    fn write_eof_marker(&mut self) -> Result<()> {
        let offset = self.header.header_length as u64 + self.header.record_count as u64 * self.header.record_length as u64;
        let file = self.file_mut()?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(&[header::EOF_MARKER])?;
        file.set_len(offset + 1)?;
        file.flush()?;
        Ok(())
    }

    fn flush_header(&mut self) -> Result<()> {
        self.header.last_update = today();
        let file = self.file_mut()?;
        file.seek(SeekFrom::Start(0))?;
        self.header.write(file)?;
        file.flush()?;
        Ok(())
    }

    fn decode_record(&mut self, record_number: i64, buf: &[u8]) -> Result<RecordView> {
        let deleted = record::is_deleted(buf);
        let memo_ref_is_vfp = self.memo_ref_is_vfp();
        let codepage = self.codepage;
        let mut values = Vec::with_capacity(self.fields.len());
        for i in 0..self.fields.len() {
            let field = &self.fields[i];
            let value = record::read_field(
                buf,
                field,
                codepage,
                self.memo.as_deref_mut(),
                memo_ref_is_vfp,
                self.config.logical_bad_data_policy,
            )?;
            values.push((self.fields[i].name.clone(), value));
        }
        Ok(RecordView::Record { deleted, record_number, values })
    }

    fn encode_into(&mut self, buf: &mut [u8], name: &str, value: &Value) -> Result<()> {
        let field = self.field(name)?.clone();
        let memo_ref_is_vfp = self.memo_ref_is_vfp();
        record::write_field(buf, &field, value, self.codepage, self.memo.as_deref_mut(), memo_ref_is_vfp)
    }

    /// Read and decode record `index` (spec 4.6 `table[i]`); negative
    /// indices count from the end.
    pub fn read(&mut self, index: i64) -> Result<RecordView> {
        let i = self.normalize_index(index)?;
        let buf = self.read_record_bytes(i)?;
        self.decode_record(i as i64, &buf)
    }

    /// Borrow a record-level handle for `index` (spec 6 "Record"):
    /// `scatter`/`gather`/`reset` and flux, reachable without threading the
    /// index back through every call the way the raw `Table` methods do.
    pub fn record(&mut self, index: i64) -> Result<RecordHandle<'_>> {
        let i = self.normalize_index(index)?;
        Ok(RecordHandle { table: self, index: i as i64 })
    }

    /// Overwrite every given field of record `index` (spec 4.6 `write`).
    pub fn write(&mut self, index: i64, values: &[(&str, Value)]) -> Result<()> {
        let i = self.normalize_index(index)?;
        if self.flux_in_progress.contains(&i) {
            return Err(XbaseError::FluxInProgress { index: i });
        }
        let mut buf = self.read_record_bytes(i)?;
        for (name, value) in values {
            self.encode_into(&mut buf, name, value)?;
        }
        self.write_record_bytes(i, &buf)
    }

    /// Append one record, written `multiple` times (spec 4.6 `append`).
    /// `values` is a name/value mapping; unknown names raise `FieldMissing`
    /// unless `drop_unknown`. The record is encoded once -- so any memo
    /// payload it references is written once, to a single block -- and the
    /// resulting buffer is then replicated `multiple` times; `record_count`
    /// advances by `multiple` and the returned index is the first copy's.
    pub fn append(&mut self, values: &[(&str, Value)], multiple: usize, drop_unknown: bool) -> Result<usize> {
        if self.read_only {
            return Err(XbaseError::ReadOnly);
        }
        let multiple = multiple.max(1);
        let mut buf = self.blank_template.clone();
        for (name, value) in values {
            let known = self.field(name).is_ok();
            if known {
                self.encode_into(&mut buf, name, value)?;
            } else if !drop_unknown {
                return Err(XbaseError::FieldMissing { name: name.to_string() });
            }
        }
        let index = self.header.record_count as usize;
        for copy in 0..multiple {
            self.write_record_bytes(index + copy, &buf)?;
        }
        self.header.record_count += multiple as u32;
        self.flush_header()?;
        self.write_eof_marker()?;
        if self.current < 0 {
            self.current = index as i64;
        }
        Ok(index)
    }

    /// Append `count` blank records, sharing one blank buffer.
    pub fn append_blank(&mut self, count: usize) -> Result<usize> {
        if self.read_only {
            return Err(XbaseError::ReadOnly);
        }
        let mut last = self.header.record_count as usize;
        for _ in 0..count.max(1) {
            let index = self.header.record_count as usize;
            self.write_record_bytes(index, &self.blank_template.clone())?;
            self.header.record_count += 1;
            last = index;
        }
        self.flush_header()?;
        self.write_eof_marker()?;
        Ok(last)
    }

    pub fn delete(&mut self, index: i64) -> Result<()> {
        let i = self.normalize_index(index)?;
        let mut buf = self.read_record_bytes(i)?;
        record::set_deleted(&mut buf, true);
        self.write_record_bytes(i, &buf)
    }

    pub fn undelete(&mut self, index: i64) -> Result<()> {
        let i = self.normalize_index(index)?;
        let mut buf = self.read_record_bytes(i)?;
        record::set_deleted(&mut buf, false);
        self.write_record_bytes(i, &buf)
    }

    pub fn is_deleted(&mut self, index: i64) -> Result<bool> {
        let i = self.normalize_index(index)?;
        Ok(record::is_deleted(&self.read_record_bytes(i)?))
    }

    /// Begin a flux scope on `index`: subsequent `write`s on this record are
    /// rejected until `commit_flux`/`rollback_flux` ends it (spec 4.5/4.6).
    pub fn start_flux(&mut self, index: i64) -> Result<Flux> {
        let i = self.normalize_index(index)?;
        if self.flux_in_progress.contains(&i) {
            return Err(XbaseError::FluxInProgress { index: i });
        }
        self.flux_in_progress.insert(i);
        Ok(Flux::begin(&self.read_record_bytes(i)?))
    }

    pub fn commit_flux(&mut self, index: i64, flux: Flux) -> Result<()> {
        let i = self.normalize_index(index)?;
        if !self.flux_in_progress.remove(&i) {
            return Err(XbaseError::NotInFlux { index: i });
        }
        self.write_record_bytes(i, &flux.commit())
    }

    pub fn rollback_flux(&mut self, index: i64, flux: Flux) -> Result<()> {
        let i = self.normalize_index(index)?;
        if !self.flux_in_progress.remove(&i) {
            return Err(XbaseError::NotInFlux { index: i });
        }
        flux.rollback();
        Ok(())
    }

    /// Rewrite the file with all deleted records removed (spec 4.6 `pack`).
    /// Returns the old-to-new record-id map; dropped ids map to `-1`.
    pub fn pack(&mut self) -> Result<Vec<i64>> {
        if self.read_only {
            return Err(XbaseError::ReadOnly);
        }
        let total = self.header.record_count as usize;
        let mut kept = Vec::with_capacity(total);
        let mut map = vec![-1i64; total];
        for i in 0..total {
            let buf = self.read_record_bytes(i)?;
            if !record::is_deleted(&buf) {
                map[i] = kept.len() as i64;
                kept.push(buf);
            }
        }

        let file = self.file.take().ok_or(XbaseError::TableClosed)?;
        drop(file);
        let mut file = OpenOptions::new().read(true).write(true).truncate(true).open(&self.path)?;
        self.header.record_count = kept.len() as u32;
        self.header.write(&mut file)?;
        header::write_fields(&mut file, &self.fields, self.header.dialect)?;
        for buf in &kept {
            file.write_all(buf)?;
        }
        file.write_all(&[header::EOF_MARKER])?;
        file.flush()?;
        self.file = Some(file);

        log::info!("packed table '{}': {} -> {} records", self.path.display(), total, self.header.record_count);
        if self.current >= self.header.record_count as i64 {
            self.current = self.header.record_count as i64 - 1;
        }
        Ok(map)
    }

    fn rewrite_all_records(&mut self, old_fields: &[FieldDescriptor], new_fields: &[FieldDescriptor]) -> Result<()> {
        let total = self.header.record_count as usize;
        let old_record_length = old_fields.iter().map(|f| f.length).sum::<usize>() + 1;
        let mut rebuilt = Vec::with_capacity(total);

        for i in 0..total {
            let offset = i as u64 * old_record_length as u64 + self.header.header_length as u64;
            let file = self.file_mut()?;
            file.seek(SeekFrom::Start(offset))?;
            let mut old_buf = vec![0u8; old_record_length];
            file.read_exact(&mut old_buf)?;

            let new_record_length = 1 + new_fields.iter().map(|f| f.length).sum::<usize>();
            let mut new_buf = record::blank_record(new_fields, new_record_length);
            new_buf[0] = old_buf[0];
            for old_field in old_fields {
                if let Some(new_field) = new_fields.iter().find(|f| f.name.eq_ignore_ascii_case(&old_field.name)) {
                    let value = record::read_field(
                        &old_buf,
                        old_field,
                        self.codepage,
                        self.memo.as_deref_mut(),
                        self.memo_ref_is_vfp(),
                        self.config.logical_bad_data_policy,
                    )?;
                    record::write_field(
                        &mut new_buf,
                        new_field,
                        &value,
                        self.codepage,
                        self.memo.as_deref_mut(),
                        self.memo_ref_is_vfp(),
                    )?;
                }
            }
            rebuilt.push(new_buf);
        }

        let new_record_length = 1 + new_fields.iter().map(|f| f.length).sum::<usize>();
        let new_header_length = header::header_length_for(new_fields, self.header.dialect);
        self.header.record_length = new_record_length as u16;
        self.header.header_length = new_header_length as u16;

        let file = self.file.take().ok_or(XbaseError::TableClosed)?;
        drop(file);
        let mut file = OpenOptions::new().read(true).write(true).truncate(true).open(&self.path)?;
        self.header.write(&mut file)?;
        header::write_fields(&mut file, new_fields, self.header.dialect)?;
        for buf in &rebuilt {
            file.write_all(buf)?;
        }
        file.write_all(&[header::EOF_MARKER])?;
        file.flush()?;
        self.file = Some(file);
        self.fields = new_fields.to_vec();
        self.blank_template = record::blank_record(&self.fields, new_record_length);
        Ok(())
    }

    /// Append new field descriptors to the schema and extend every record
    /// (spec 4.6 `add_fields`).
    pub fn add_fields(&mut self, specs: Vec<FieldDescriptor>) -> Result<()> {
        if self.read_only {
            return Err(XbaseError::ReadOnly);
        }
        for spec in &specs {
            if !self.header.dialect.allowed_field_types().contains(&spec.field_type.tag()) {
                return Err(XbaseError::UnknownFieldType {
                    flag: spec.field_type.tag() as char,
                    dialect: format!("{:?}", self.header.dialect),
                });
            }
            if self.field(&spec.name).is_ok() {
                return Err(XbaseError::FieldSpec { detail: format!("field '{}' already exists", spec.name) });
            }
        }
        let old_fields = self.fields.clone();
        let mut new_fields = old_fields.clone();
        new_fields.extend(specs);
        header::reassign_offsets(&mut new_fields);

        let needs_memo = new_fields.iter().any(|f| f.field_type.is_memo_like());
        if needs_memo && self.memo.is_none() {
            let memo_path = memo_path_for(&self.path, self.header.dialect);
            self.memo = Some(create_memo_store(&memo_path, self.header.dialect)?);
            self.memo_path = Some(memo_path);
            self.header.has_memo = true;
        }

        self.rewrite_all_records(&old_fields, &new_fields)?;
        log::debug!("added {} field(s) to table '{}'", new_fields.len() - old_fields.len(), self.path.display());
        Ok(())
    }

    /// Remove fields from the schema and collapse every record (spec 4.6
    /// `delete_fields`). Takes a backup the first time it's called on this
    /// table, unless one was already taken.
    pub fn delete_fields(&mut self, names: &[&str]) -> Result<()> {
        if self.read_only {
            return Err(XbaseError::ReadOnly);
        }
        if !self.backed_up {
            self.create_backup(true)?;
        }
        let old_fields = self.fields.clone();
        let mut new_fields: Vec<FieldDescriptor> =
            old_fields.iter().filter(|f| !names.iter().any(|n| f.name.eq_ignore_ascii_case(n))).cloned().collect();
        header::reassign_offsets(&mut new_fields);
        self.rewrite_all_records(&old_fields, &new_fields)?;
        log::debug!("deleted {} field(s) from table '{}'", old_fields.len() - new_fields.len(), self.path.display());
        Ok(())
    }

    /// Rename a field in place; the buffer layout is unchanged (spec 4.6
    /// `rename_field`).
    pub fn rename_field(&mut self, old: &str, new: &str) -> Result<Option<Flow>> {
        let idx = self
            .fields
            .iter()
            .position(|f| f.name.eq_ignore_ascii_case(old))
            .ok_or_else(|| XbaseError::FieldMissing { name: old.to_string() })?;
        let warning = FieldDescriptor::validate_name(new).err();
        if let Some(w) = &warning {
            log::warn!("{}", w);
        }
        self.fields[idx].name = new.to_ascii_uppercase();
        self.rewrite_field_descriptors()?;
        Ok(warning)
    }

    fn rewrite_field_descriptors(&mut self) -> Result<()> {
        let fields = self.fields.clone();
        let dialect = self.header.dialect;
        let file = self.file_mut()?;
        file.seek(SeekFrom::Start(crate::header::PRIMARY_HEADER_LEN as u64))?;
        header::write_fields(file, &fields, dialect)?;
        file.flush()?;
        Ok(())
    }

    /// Change a field's byte length, re-encoding every record (spec 4.6
    /// `resize_field`).
    pub fn resize_field(&mut self, name: &str, length: usize) -> Result<()> {
        if self.read_only {
            return Err(XbaseError::ReadOnly);
        }
        let old_fields = self.fields.clone();
        let mut new_fields = old_fields.clone();
        let idx = new_fields
            .iter()
            .position(|f| f.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| XbaseError::FieldMissing { name: name.to_string() })?;
        new_fields[idx].length = length;
        header::reassign_offsets(&mut new_fields);
        self.rewrite_all_records(&old_fields, &new_fields)
    }

    /// Byte-for-byte copy of the main file to `<name>_backup<ext>` (spec 4.6
    /// `create_backup`).
    pub fn create_backup(&mut self, overwrite: bool) -> Result<PathBuf> {
        let backup_path = backup_path_for(&self.path, self.config.backup_dir.as_deref());
        if backup_path.exists() && !overwrite {
            return Err(XbaseError::TableError {
                detail: format!("backup file '{}' already exists", backup_path.display()),
            });
        }
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }
        fs::copy(&self.path, &backup_path)?;
        self.backed_up = true;
        log::info!("backed up '{}' to '{}'", self.path.display(), backup_path.display());
        Ok(backup_path)
    }
}

/// A record-level handle borrowing its owning table (spec 6 "Record"):
/// `scatter`/`gather`/`reset`, ordinal and named field access, and flux,
/// all addressed by the record number this handle was opened on.
pub struct RecordHandle<'a> {
    table: &'a mut Table,
    index: i64,
}

impl<'a> RecordHandle<'a> {
    pub fn record_number(&self) -> i64 {
        self.index
    }

    pub fn is_deleted(&mut self) -> Result<bool> {
        self.table.is_deleted(self.index)
    }

    pub fn view(&mut self) -> Result<RecordView> {
        self.table.read(self.index)
    }

    pub fn get(&mut self, name: &str) -> Result<Option<Value>> {
        Ok(self.view()?.get(name).cloned())
    }

    pub fn get_at(&mut self, ordinal: usize) -> Result<Option<Value>> {
        Ok(self.view()?.get_at(ordinal).cloned())
    }

    /// Every field name/value pair as a mapping (spec 6 `scatter()`).
    pub fn scatter(&mut self) -> Result<HashMap<String, Value>> {
        Ok(self.view()?.scatter())
    }

    /// Apply a name/value mapping back onto the record (spec 6 `gather()`);
    /// unknown names raise `FieldMissing` unless `drop_unknown`.
    pub fn gather(&mut self, mapping: &HashMap<String, Value>, drop_unknown: bool) -> Result<()> {
        let mut pairs: Vec<(&str, Value)> = Vec::with_capacity(mapping.len());
        for (name, value) in mapping {
            if drop_unknown && self.table.field(name).is_err() {
                continue;
            }
            pairs.push((name.as_str(), value.clone()));
        }
        self.table.write(self.index, &pairs)
    }

    /// Blank every field except those named in `keep_fields` (spec 6
    /// `reset(keep_fields=[])`); the delete flag is untouched.
    pub fn reset(&mut self, keep_fields: &[&str]) -> Result<()> {
        let old = self.table.read_record_bytes(self.index as usize)?;
        let mut buf = self.table.blank_template.clone();
        buf[0] = old[0];
        for field in self.table.fields.clone() {
            if keep_fields.iter().any(|k| k.eq_ignore_ascii_case(&field.name)) {
                let end = field.offset + field.length;
                buf[field.offset..end].copy_from_slice(&old[field.offset..end]);
            }
        }
        self.table.write_record_bytes(self.index as usize, &buf)
    }

    pub fn start_flux(&mut self) -> Result<Flux> {
        self.table.start_flux(self.index)
    }

    pub fn commit_flux(&mut self, flux: Flux) -> Result<()> {
        self.table.commit_flux(self.index, flux)
    }

    pub fn rollback_flux(&mut self, flux: Flux) -> Result<()> {
        self.table.rollback_flux(self.index, flux)
    }
}

fn backup_path_for(path: &Path, backup_dir: Option<&Path>) -> PathBuf {
    let stem = path.file_stem().unwrap_or_else(|| std::ffi::OsStr::new("table")).to_string_lossy();
    let ext = path.extension().map(|e| e.to_string_lossy().to_string()).unwrap_or_default();
    let file_name = if ext.is_empty() { format!("{}_backup", stem) } else { format!("{}_backup.{}", stem, ext) };
    match backup_dir {
        Some(dir) => dir.join(file_name),
        None => path.with_file_name(file_name),
    }
}

impl Cursor for Table {
    fn len(&self) -> usize {
        self.header.record_count as usize
    }

    fn current(&self) -> i64 {
        self.current
    }

    fn set_current(&mut self, value: i64) {
        self.current = value;
    }
}

impl RecordCursor for Table {
    fn read_record(&mut self, index: i64) -> Result<RecordView> {
        self.read(index)
    }
}
