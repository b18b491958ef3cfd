//! Primary header, field-descriptor block, and dialect trailer (spec 4.4 / 6).
//! Grounded on the teacher's `read_header` / `foxpro::read_fields` /
//! `foxpro::read_field_meta`, generalized across all five dialects and made
//! to also emit (not just parse) these structures.

use crate::dialect::Dialect;
use crate::error::{Flow, Result, XbaseError};
use chrono::{Datelike, NaiveDate};
use std::io::{Read, Write};

pub const PRIMARY_HEADER_LEN: usize = 32;
pub const FIELD_DESCRIPTOR_LEN: usize = 32;
pub const TERMINATOR: u8 = 0x0D;
pub const EOF_MARKER: u8 = 0x1A;
pub const VFP_TRAILER_LEN: usize = 263;

/// One-letter field type tag (spec 4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Character,
    Numeric,
    Float,
    Integer,
    Currency,
    Double,
    Date,
    DateTime,
    Logical,
    Memo,
    General,
    Picture,
}

impl FieldType {
    pub fn from_tag(tag: u8, dialect: Dialect) -> Result<FieldType> {
        let ft = match tag {
            b'C' => FieldType::Character,
            b'N' => FieldType::Numeric,
            b'F' => FieldType::Float,
            b'I' => FieldType::Integer,
            b'Y' => FieldType::Currency,
            b'B' => FieldType::Double,
            b'D' => FieldType::Date,
            b'T' => FieldType::DateTime,
            b'L' => FieldType::Logical,
            b'M' => FieldType::Memo,
            b'G' => FieldType::General,
            b'P' => FieldType::Picture,
            other => {
                return Err(XbaseError::UnknownFieldType {
                    flag: other as char,
                    dialect: format!("{:?}", dialect),
                })
            }
        };
        if !dialect.allowed_field_types().contains(&tag) {
            return Err(XbaseError::UnknownFieldType {
                flag: tag as char,
                dialect: format!("{:?}", dialect),
            });
        }
        Ok(ft)
    }

    pub fn tag(&self) -> u8 {
        match self {
            FieldType::Character => b'C',
            FieldType::Numeric => b'N',
            FieldType::Float => b'F',
            FieldType::Integer => b'I',
            FieldType::Currency => b'Y',
            FieldType::Double => b'B',
            FieldType::Date => b'D',
            FieldType::DateTime => b'T',
            FieldType::Logical => b'L',
            FieldType::Memo => b'M',
            FieldType::General => b'G',
            FieldType::Picture => b'P',
        }
    }

    /// The fixed on-disk length for types whose length isn't caller-chosen.
    pub fn fixed_length(&self) -> Option<usize> {
        match self {
            FieldType::Integer => Some(4),
            FieldType::Currency => Some(8),
            FieldType::Double => Some(8),
            FieldType::Date => Some(8),
            FieldType::DateTime => Some(8),
            FieldType::Logical => Some(1),
            FieldType::Memo | FieldType::General | FieldType::Picture => None,
            FieldType::Character | FieldType::Numeric | FieldType::Float => None,
        }
    }

    pub fn is_memo_like(&self) -> bool {
        matches!(self, FieldType::Memo | FieldType::General | FieldType::Picture)
    }
}

/// A single field descriptor. Name is stored already uppercased; offset is
/// the byte offset in the record (1-based, byte 0 is the delete flag).
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub field_type: FieldType,
    pub offset: usize,
    pub length: usize,
    pub decimals: u8,
    pub system: bool,
    pub nullable: bool,
    pub binary: bool,
}

impl FieldDescriptor {
    pub fn new(name: &str, field_type: FieldType, length: usize, decimals: u8) -> Self {
        FieldDescriptor {
            name: name.to_ascii_uppercase(),
            field_type,
            offset: 0,
            length: field_type.fixed_length().unwrap_or(length),
            decimals,
            system: false,
            nullable: false,
            binary: false,
        }
    }

    fn flags_byte(&self) -> u8 {
        let mut flag = 0u8;
        if self.system {
            flag |= 0x01;
        }
        if self.nullable {
            flag |= 0x02;
        }
        if self.binary {
            flag |= 0x04;
        }
        flag
    }

    fn from_flags(flag: u8) -> (bool, bool, bool) {
        (flag & 0x01 != 0, flag & 0x02 != 0, flag & 0x04 != 0)
    }

    /// Parse one 32-byte field descriptor record. Returns `Ok(None)` if
    /// `bytes[0] == 0x0D` (the terminator was hit instead of a descriptor).
    pub fn from_bytes(bytes: &[u8; FIELD_DESCRIPTOR_LEN], dialect: Dialect) -> Result<Option<FieldDescriptor>> {
        if bytes[0] == TERMINATOR {
            return Ok(None);
        }
        let name_bytes = &bytes[0..11];
        let name_len = name_bytes.iter().position(|&b| b == 0).unwrap_or(11);
        let name = String::from_utf8_lossy(&name_bytes[..name_len]).to_string();

        let field_type = FieldType::from_tag(bytes[11], dialect)?;
        let disk_offset = u32::from_le_bytes(bytes[12..16].try_into().unwrap()) as usize;
        let length = bytes[16] as usize;
        let decimals = bytes[17];
        let (system, nullable, binary) = FieldDescriptor::from_flags(bytes[18]);

        let _ = disk_offset; // dBase III recomputes by summing lengths; VFP's value is trusted by the caller that assigns offsets afterward.
        Ok(Some(FieldDescriptor {
            name,
            field_type,
            offset: 0,
            length,
            decimals,
            system,
            nullable,
            binary,
        }))
    }

    pub fn to_bytes(&self) -> [u8; FIELD_DESCRIPTOR_LEN] {
        let mut buf = [0u8; FIELD_DESCRIPTOR_LEN];
        let name_bytes = self.name.as_bytes();
        let n = name_bytes.len().min(11);
        buf[..n].copy_from_slice(&name_bytes[..n]);
        buf[11] = self.field_type.tag();
        buf[12..16].copy_from_slice(&(self.offset as u32).to_le_bytes());
        buf[16] = self.length as u8;
        buf[17] = self.decimals;
        buf[18] = self.flags_byte();
        buf
    }

    /// Validate the name per spec 4.11: ASCII identifier, no leading digit
    /// or underscore, length <= 10. Returns a warning (not an error) when
    /// the name is accepted but non-standard.
    pub fn validate_name(name: &str) -> std::result::Result<(), Flow> {
        let ok = !name.is_empty()
            && name.len() <= 10
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !name.chars().next().map(|c| c.is_ascii_digit() || c == '_').unwrap_or(true);
        if ok {
            Ok(())
        } else {
            Err(Flow::FieldNameWarning { name: name.to_string() })
        }
    }
}

/// The parsed primary 32-byte header.
#[derive(Debug, Clone)]
pub struct Header {
    pub dialect: Dialect,
    pub has_memo: bool,
    pub last_update: NaiveDate,
    pub record_count: u32,
    pub header_length: u16,
    pub record_length: u16,
    pub table_flags: u8,
    pub codepage_id: u8,
}

impl Header {
    pub fn read<R: Read>(r: &mut R) -> Result<Header> {
        let mut buf = [0u8; PRIMARY_HEADER_LEN];
        r.read_exact(&mut buf)?;
        let (dialect, has_memo) = Dialect::from_version_byte(buf[0])?;
        let year = 1900 + buf[1] as i32;
        let last_update = NaiveDate::from_ymd_opt(year, buf[2].max(1) as u32, buf[3].max(1) as u32)
            .ok_or_else(|| XbaseError::MalformedHeader {
                detail: format!("invalid last-update date {:04}-{:02}-{:02}", year, buf[2], buf[3]),
            })?;
        let record_count = u32::from_le_bytes(buf[4..8].try_into().unwrap());
        let header_length = u16::from_le_bytes(buf[8..10].try_into().unwrap());
        let record_length = u16::from_le_bytes(buf[10..12].try_into().unwrap());
        let table_flags = buf[28];
        let codepage_id = buf[29];

        Ok(Header {
            dialect,
            has_memo,
            last_update,
            record_count,
            header_length,
            record_length,
            table_flags,
            codepage_id,
        })
    }

    pub fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        let mut buf = [0u8; PRIMARY_HEADER_LEN];
        buf[0] = self.dialect.version_byte(self.has_memo);
        buf[1] = (self.last_update.year() - 1900).max(0) as u8;
        buf[2] = self.last_update.month() as u8;
        buf[3] = self.last_update.day() as u8;
        buf[4..8].copy_from_slice(&self.record_count.to_le_bytes());
        buf[8..10].copy_from_slice(&self.header_length.to_le_bytes());
        buf[10..12].copy_from_slice(&self.record_length.to_le_bytes());
        buf[28] = self.table_flags;
        buf[29] = self.codepage_id;
        w.write_all(&buf)?;
        Ok(())
    }
}

/// Read the contiguous field-descriptor block up to and including the
/// `0x0D` terminator, then the dialect trailer if required. Offsets are
/// (re)assigned by summing lengths, per spec 4.4 ("dBase III ... recomputes
/// by summing lengths; used by Visual FoxPro" -- we recompute uniformly so
/// `record_length` and per-field offsets are always self-consistent).
pub fn read_fields<R: Read>(r: &mut R, dialect: Dialect) -> Result<Vec<FieldDescriptor>> {
    let mut fields = Vec::new();
    let mut offset = 1usize;
    loop {
        let mut buf = [0u8; FIELD_DESCRIPTOR_LEN];
        r.read_exact(&mut buf)?;
        match FieldDescriptor::from_bytes(&buf, dialect)? {
            None => break,
            Some(mut field) => {
                field.offset = offset;
                offset += field.length;
                fields.push(field);
            }
        }
    }
    if dialect.requires_trailer() {
        let mut trailer = [0u8; VFP_TRAILER_LEN];
        r.read_exact(&mut trailer)?;
    }
    Ok(fields)
}

pub fn write_fields<W: Write>(w: &mut W, fields: &[FieldDescriptor], dialect: Dialect) -> Result<()> {
    for field in fields {
        w.write_all(&field.to_bytes())?;
    }
    w.write_all(&[TERMINATOR])?;
    if dialect.requires_trailer() {
        w.write_all(&[0u8; VFP_TRAILER_LEN])?;
    }
    Ok(())
}

/// Sum of field lengths + 1 (the delete-flag byte), per spec invariant 2.
pub fn record_length_for(fields: &[FieldDescriptor]) -> usize {
    1 + fields.iter().map(|f| f.length).sum::<usize>()
}

/// Recompute each field's `offset` so they partition `[1, record_length)`.
pub fn reassign_offsets(fields: &mut [FieldDescriptor]) {
    let mut offset = 1usize;
    for field in fields.iter_mut() {
        field.offset = offset;
        offset += field.length;
    }
}

/// Total on-disk header length: primary header + one descriptor per field +
/// terminator byte + trailer (if the dialect requires one).
pub fn header_length_for(fields: &[FieldDescriptor], dialect: Dialect) -> usize {
    let mut len = PRIMARY_HEADER_LEN + fields.len() * FIELD_DESCRIPTOR_LEN + 1;
    if dialect.requires_trailer() {
        len += VFP_TRAILER_LEN;
    }
    len
}

#[cfg(test)]
mod tests;
