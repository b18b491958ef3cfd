//! Pure encode/decode functions between typed values and byte spans, for
//! every field type (spec 4.1). Grounded on the teacher's per-type field
//! structs in `foxpro::mod.rs` (`CharField`, `CurrencyField`, `DateField`,
//! `DateTimeField`, `RawFloatField`), reworked as ordinary synchronous
//! functions over one `Value` enum instead of an `async` trait object per
//! field (see DESIGN.md and SPEC_FULL.md 9, open question (d)).

use crate::error::{Result, XbaseError};
use crate::header::FieldType;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use encoding_rs::Encoding;

/// Three-state numeric/float decode result (spec 4.1: "all spaces" vs.
/// "all `*`" vs. an actual value).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Value(f64),
    Empty,
    Overflowed,
}

impl Numeric {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Numeric::Value(v) => Some(*v),
            Numeric::Empty => Some(0.0),
            Numeric::Overflowed => None,
        }
    }
}

/// Three-valued logical (spec 4.1 / 9: a discriminated union rather than a
/// comparison-heavy sentinel singleton).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Logical {
    True,
    False,
    Unknown,
}

impl Logical {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Logical::True => Some(true),
            Logical::False => Some(false),
            Logical::Unknown => None,
        }
    }

    pub fn from_bool(b: bool) -> Logical {
        if b { Logical::True } else { Logical::False }
    }
}

/// One decoded field value, tagged by field type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Character(String),
    Numeric(Numeric),
    Float(Numeric),
    Integer(i32),
    /// Fixed-point, value = raw / 10_000.
    Currency(i64),
    Double(f64),
    Date(Option<NaiveDate>),
    DateTime(Option<NaiveDateTime>),
    Logical(Logical),
    Memo(Option<String>),
    General(Option<Vec<u8>>),
    Picture(Option<Vec<u8>>),
}

impl Value {
    pub fn field_type(&self) -> FieldType {
        match self {
            Value::Character(_) => FieldType::Character,
            Value::Numeric(_) => FieldType::Numeric,
            Value::Float(_) => FieldType::Float,
            Value::Integer(_) => FieldType::Integer,
            Value::Currency(_) => FieldType::Currency,
            Value::Double(_) => FieldType::Double,
            Value::Date(_) => FieldType::Date,
            Value::DateTime(_) => FieldType::DateTime,
            Value::Logical(_) => FieldType::Logical,
            Value::Memo(_) => FieldType::Memo,
            Value::General(_) => FieldType::General,
            Value::Picture(_) => FieldType::Picture,
        }
    }
}

/// The type's documented empty value (spec 4.1, "Empty pattern" column).
pub fn empty_value(field_type: FieldType) -> Value {
    match field_type {
        FieldType::Character => Value::Character(String::new()),
        FieldType::Numeric => Value::Numeric(Numeric::Empty),
        FieldType::Float => Value::Float(Numeric::Empty),
        FieldType::Integer => Value::Integer(0),
        FieldType::Currency => Value::Currency(0),
        FieldType::Double => Value::Double(0.0),
        FieldType::Date => Value::Date(None),
        FieldType::DateTime => Value::DateTime(None),
        FieldType::Logical => Value::Logical(Logical::Unknown),
        FieldType::Memo => Value::Memo(None),
        FieldType::General => Value::General(None),
        FieldType::Picture => Value::Picture(None),
    }
}

/// The empty on-disk byte pattern for a field of the given type/length.
pub fn empty_bytes(field_type: FieldType, length: usize) -> Vec<u8> {
    match field_type {
        FieldType::Character => vec![b' '; length],
        FieldType::Numeric | FieldType::Float => vec![b' '; length],
        FieldType::Integer => vec![0u8; 4],
        FieldType::Currency | FieldType::Double | FieldType::DateTime => vec![0u8; 8],
        FieldType::Date => b"00000000".to_vec(),
        FieldType::Logical => vec![b'?'],
        FieldType::Memo if length == 10 => vec![b' '; 10],
        FieldType::Memo | FieldType::General | FieldType::Picture => vec![0u8; length.max(4)],
    }
}

// ---- Character -------------------------------------------------------

pub fn decode_character(bytes: &[u8], codepage: &'static Encoding, binary: bool) -> Result<String> {
    if binary {
        return Ok(bytes.iter().map(|&b| b as char).collect());
    }
    let (text, _, had_errors) = codepage.decode(bytes);
    if had_errors {
        return Err(XbaseError::NonUnicodeInput {
            field: String::new(),
            codepage: codepage.name().to_string(),
        });
    }
    Ok(text.trim_end_matches(' ').to_string())
}

pub fn encode_character(value: &str, length: usize, codepage: &'static Encoding, binary: bool) -> Result<Vec<u8>> {
    let mut bytes = if binary {
        let mut out = Vec::with_capacity(value.chars().count());
        for c in value.chars() {
            let code = c as u32;
            if code > 0xFF {
                return Err(XbaseError::Overflow {
                    field: String::new(),
                    len: length,
                    detail: format!("character {:?} is not a single byte", c),
                });
            }
            out.push(code as u8);
        }
        out
    } else {
        let (encoded, _, had_errors) = codepage.encode(value);
        if had_errors {
            return Err(XbaseError::NonUnicodeInput {
                field: String::new(),
                codepage: codepage.name().to_string(),
            });
        }
        encoded.into_owned()
    };
    if bytes.len() > length {
        return Err(XbaseError::Overflow {
            field: String::new(),
            len: length,
            detail: format!("{} bytes do not fit in {} byte field", bytes.len(), length),
        });
    }
    bytes.resize(length, b' ');
    Ok(bytes)
}

// ---- Numeric / Float (same ASCII convention) --------------------------

pub fn decode_numeric(bytes: &[u8]) -> Result<Numeric> {
    if bytes.iter().all(|&b| b == b' ') {
        return Ok(Numeric::Empty);
    }
    if bytes.iter().all(|&b| b == b'*') {
        return Ok(Numeric::Overflowed);
    }
    let text = std::str::from_utf8(bytes)
        .map_err(|_| XbaseError::BadData {
            field: String::new(),
            detail: "numeric field is not ASCII".to_string(),
        })?
        .trim();
    let value: f64 = text.parse().map_err(|_| XbaseError::BadData {
        field: String::new(),
        detail: format!("'{}' is not a valid number", text),
    })?;
    Ok(Numeric::Value(value))
}

pub fn encode_numeric(value: Numeric, length: usize, decimals: u8) -> Result<Vec<u8>> {
    let formatted = match value {
        Numeric::Empty => return Ok(vec![b' '; length]),
        Numeric::Overflowed => return Ok(vec![b'*'; length]),
        Numeric::Value(v) => {
            if decimals > 0 {
                format!("{:.*}", decimals as usize, v)
            } else {
                format!("{}", v.round() as i64)
            }
        }
    };
    if formatted.len() > length {
        return Err(XbaseError::Overflow {
            field: String::new(),
            len: length,
            detail: format!("'{}' does not fit in {} bytes", formatted, length),
        });
    }
    Ok(format!("{:>width$}", formatted, width = length).into_bytes())
}

// ---- Integer -----------------------------------------------------------

pub fn decode_integer(bytes: &[u8]) -> Result<i32> {
    let arr: [u8; 4] = bytes.try_into().map_err(|_| XbaseError::BadData {
        field: String::new(),
        detail: "integer field is not 4 bytes".to_string(),
    })?;
    Ok(i32::from_le_bytes(arr))
}

pub fn encode_integer(value: i32) -> [u8; 4] {
    value.to_le_bytes()
}

// ---- Currency ------------------------------------------------------------

pub fn decode_currency(bytes: &[u8]) -> Result<i64> {
    let arr: [u8; 8] = bytes.try_into().map_err(|_| XbaseError::BadData {
        field: String::new(),
        detail: "currency field is not 8 bytes".to_string(),
    })?;
    Ok(i64::from_le_bytes(arr))
}

pub fn encode_currency(raw: i64) -> [u8; 8] {
    raw.to_le_bytes()
}

pub fn currency_to_f64(raw: i64) -> f64 {
    raw as f64 / 10_000.0
}

pub fn currency_from_f64(value: f64) -> i64 {
    (value * 10_000.0).round() as i64
}

// ---- Double --------------------------------------------------------------

pub fn decode_double(bytes: &[u8]) -> Result<f64> {
    let arr: [u8; 8] = bytes.try_into().map_err(|_| XbaseError::BadData {
        field: String::new(),
        detail: "double field is not 8 bytes".to_string(),
    })?;
    Ok(f64::from_le_bytes(arr))
}

pub fn encode_double(value: f64) -> [u8; 8] {
    value.to_le_bytes()
}

// ---- Date (8 ASCII digits YYYYMMDD) ---------------------------------------

pub fn decode_date(bytes: &[u8]) -> Result<Option<NaiveDate>> {
    if bytes.iter().all(|&b| b == b' ') || bytes == b"00000000" {
        return Ok(None);
    }
    let text = std::str::from_utf8(bytes).map_err(|_| XbaseError::BadData {
        field: String::new(),
        detail: "date field is not ASCII".to_string(),
    })?;
    let year: i32 = text[0..4].parse().map_err(|_| bad_date(text))?;
    let month: u32 = text[4..6].parse().map_err(|_| bad_date(text))?;
    let day: u32 = text[6..8].parse().map_err(|_| bad_date(text))?;
    NaiveDate::from_ymd_opt(year, month, day).map(Some).ok_or_else(|| bad_date(text))
}

fn bad_date(text: &str) -> XbaseError {
    XbaseError::BadData {
        field: String::new(),
        detail: format!("'{}' is not a valid YYYYMMDD date", text),
    }
}

pub fn encode_date(value: Option<NaiveDate>) -> [u8; 8] {
    match value {
        None => *b"00000000",
        Some(date) => {
            let text = format!("{:04}{:02}{:02}", date.year(), date.month(), date.day());
            let mut out = [0u8; 8];
            out.copy_from_slice(text.as_bytes());
            out
        }
    }
}

// ---- DateTime (date as julian-ish day count + millis since midnight) -----

const DATETIME_EPOCH_OFFSET: i64 = 1_721_425;

pub fn decode_datetime(bytes: &[u8]) -> Result<Option<NaiveDateTime>> {
    let date_part: [u8; 4] = bytes[0..4].try_into().unwrap();
    let time_part: [u8; 4] = bytes[4..8].try_into().unwrap();
    let julian = i32::from_le_bytes(date_part);
    let millis = u32::from_le_bytes(time_part);
    if julian == 0 && millis == 0 {
        return Ok(None);
    }
    let days_from_ce = julian as i64 - DATETIME_EPOCH_OFFSET;
    let date = NaiveDate::from_num_days_from_ce_opt(days_from_ce as i32).ok_or_else(|| XbaseError::BadData {
        field: String::new(),
        detail: format!("julian day {} is out of range", julian),
    })?;
    let secs = (millis / 1000) % 60;
    let mins = (millis / 60_000) % 60;
    let hours = (millis / 3_600_000) % 24;
    let nanos = (millis % 1000) * 1_000_000;
    let time = NaiveTime::from_hms_nano_opt(hours, mins, secs, nanos).ok_or_else(|| XbaseError::BadData {
        field: String::new(),
        detail: format!("millis-since-midnight {} is out of range", millis),
    })?;
    Ok(Some(NaiveDateTime::new(date, time)))
}

pub fn encode_datetime(value: Option<NaiveDateTime>) -> [u8; 8] {
    match value {
        None => [0u8; 8],
        Some(dt) => {
            let days_from_ce = dt.date().num_days_from_ce() as i64;
            let julian = (days_from_ce + DATETIME_EPOCH_OFFSET) as i32;
            let time = dt.time();
            let millis = time.hour() * 3_600_000
                + time.minute() * 60_000
                + time.second() * 1000
                + time.nanosecond() / 1_000_000;
            let mut out = [0u8; 8];
            out[0..4].copy_from_slice(&julian.to_le_bytes());
            out[4..8].copy_from_slice(&millis.to_le_bytes());
            out
        }
    }
}

// ---- Logical ---------------------------------------------------------

pub fn decode_logical(byte: u8, treat_bad_as_unknown: bool) -> Result<Logical> {
    match byte {
        b'T' | b't' | b'Y' | b'y' => Ok(Logical::True),
        b'F' | b'f' | b'N' | b'n' => Ok(Logical::False),
        b'?' | b' ' => Ok(Logical::Unknown),
        other => {
            if treat_bad_as_unknown {
                Ok(Logical::Unknown)
            } else {
                Err(XbaseError::BadData {
                    field: String::new(),
                    detail: format!("'{}' is not a valid logical value", other as char),
                })
            }
        }
    }
}

pub fn encode_logical(value: Logical) -> u8 {
    match value {
        Logical::True => b'T',
        Logical::False => b'F',
        Logical::Unknown => b'?',
    }
}

// ---- Memo / General / Picture block references ------------------------

/// dBase III memo reference: 10 ASCII digits, space-padded if empty.
pub fn decode_memo_ref_dbase3(bytes: &[u8]) -> Result<u32> {
    if bytes.iter().all(|&b| b == b' ') {
        return Ok(0);
    }
    let text = std::str::from_utf8(bytes)
        .map_err(|_| XbaseError::BadData {
            field: String::new(),
            detail: "memo reference is not ASCII".to_string(),
        })?
        .trim();
    if text.is_empty() {
        return Ok(0);
    }
    text.parse().map_err(|_| XbaseError::BadData {
        field: String::new(),
        detail: format!("'{}' is not a valid memo block number", text),
    })
}

pub fn encode_memo_ref_dbase3(block: u32) -> Vec<u8> {
    if block == 0 {
        return vec![b' '; 10];
    }
    format!("{:>10}", block).into_bytes()
}

/// Visual FoxPro memo reference: 4-byte little-endian block number.
pub fn decode_memo_ref_vfp(bytes: &[u8]) -> Result<u32> {
    let arr: [u8; 4] = bytes.try_into().map_err(|_| XbaseError::BadData {
        field: String::new(),
        detail: "memo reference is not 4 bytes".to_string(),
    })?;
    Ok(u32::from_le_bytes(arr))
}

pub fn encode_memo_ref_vfp(block: u32) -> [u8; 4] {
    block.to_le_bytes()
}

#[cfg(test)]
mod tests;
