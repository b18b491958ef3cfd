//! Error taxonomy (spec section 4.12 / section 7).
//!
//! Fatal conditions live in [`XbaseError`] and are returned from `Result`.
//! Flow-control / warning conditions live in [`Flow`] -- they are not
//! really errors, they are how cursors signal "stop" and how an index
//! signals "don't index this one".

use std::fmt;
use std::path::PathBuf;

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, XbaseError>;

/// Fatal errors. Every variant carries the diagnostic data named in the
/// field/table it came from rather than a single opaque string.
#[derive(thiserror::Error, Debug)]
pub enum XbaseError {
    #[error("value does not fit in field '{field}' ({len} bytes): {detail}")]
    Overflow { field: String, len: usize, detail: String },

    #[error("bad data in field '{field}': {detail}")]
    BadData { field: String, detail: String },

    #[error("no such field '{name}'")]
    FieldMissing { name: String },

    #[error("invalid field specification: {detail}")]
    FieldSpec { detail: String },

    #[error("value not found")]
    NotFound,

    #[error("input bytes for field '{field}' are not valid in codepage '{codepage}'")]
    NonUnicodeInput { field: String, codepage: String },

    #[error("input bytes are not valid in decoding '{codepage}'")]
    BadInputDecoding { codepage: String },

    #[error("record {index} is out of range (0..{len})")]
    RecordIndexOutOfRange { index: i64, len: usize },

    #[error("table is closed")]
    TableClosed,

    #[error("table is read-only")]
    ReadOnly,

    #[error("record {index} is already in flux")]
    FluxInProgress { index: usize },

    #[error("record {index} is not in flux")]
    NotInFlux { index: usize },

    #[error("unsupported dialect byte 0x{byte:02x}")]
    UnsupportedDialect { byte: u8 },

    #[error("unknown field type '{flag}' for dialect {dialect}")]
    UnknownFieldType { flag: char, dialect: String },

    #[error("malformed header: {detail}")]
    MalformedHeader { detail: String },

    #[error("memo file missing for '{path}' but table header declares memos present")]
    MemoFileMissing { path: PathBuf },

    #[error("memo-typed fields present but table header does not declare memos")]
    MemoFlagMissing,

    #[error("memo file '{path}' is corrupt: {detail}")]
    MemoCorrupt { path: PathBuf, detail: String },

    #[error("table error: {detail}")]
    TableError { detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl XbaseError {
    /// A single `caused_by` accessor (spec section 9, open question (c)), in lieu
    /// of the several exception-context fields the original carried.
    pub fn caused_by(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self)
    }
}

/// Warning / flow-control values. These terminate a cursor walk, tell an
/// index to skip a record, or accompany an otherwise-successful operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    /// Attempted to move before the first record.
    BeginOfFile,
    /// Attempted to move past the last record.
    EndOfFile,
    /// The index key function asked to omit this record.
    SkipIndex,
    /// A field name (or new name) contained non-standard characters but was
    /// accepted anyway.
    FieldNameWarning { name: String },
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flow::BeginOfFile => write!(f, "before start of file"),
            Flow::EndOfFile => write!(f, "past end of file"),
            Flow::SkipIndex => write!(f, "record skipped by index key function"),
            Flow::FieldNameWarning { name } => {
                write!(f, "field name '{}' uses non-standard characters", name)
            }
        }
    }
}

impl std::error::Error for Flow {}
