//! Read, write, and modify xBase family tables: dBase III, dBase IV,
//! Clipper, FoxPro 2, and Visual FoxPro 6.
//!
//! The entry point is [`table::Table`]: open an existing `.dbf` (plus its
//! `.dbt`/`.fpt` memo sidecar, if any) or create a new one, then read,
//! write, append, delete, pack, and reshape its schema. [`list::List`] and
//! [`index::Index`] build lightweight, keyed views over one or more open
//! tables without copying record data; [`process::for_each_in_flux`] wraps
//! an iteration of record indices with automatic per-record commit or
//! rollback.
//!
//! ```no_run
//! use xbase::codec::Value;
//! use xbase::config::Config;
//! use xbase::dialect::Dialect;
//! use xbase::header::{FieldDescriptor, FieldType};
//! use xbase::table::Table;
//!
//! # fn main() -> xbase::error::Result<()> {
//! let fields = vec![FieldDescriptor::new("NAME", FieldType::Character, 30, 0)];
//! let mut table = Table::create("people.dbf", Dialect::DBaseIII, fields, "ascii", Config::default())?;
//! table.append(&[("NAME", Value::Character("ada".to_string()))], 1, false)?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod codepage;
pub mod config;
pub mod cursor;
pub mod dialect;
pub mod error;
pub mod fieldname;
pub mod header;
pub mod index;
pub mod list;
pub mod memo;
pub mod process;
pub mod record;
pub mod table;
#[cfg(test)]
mod test_support;

pub use config::Config;
pub use cursor::{Cursor, RecordCursor};
pub use error::{Flow, Result, XbaseError};
pub use table::Table;
