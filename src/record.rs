//! Record buffer: a mutable fixed-length byte array with a delete flag at
//! offset 0, plus typed field accessors built on `codec.rs` (spec 4.5).
//! Grounded on the teacher's per-field `from_record_bytes`/`to_bytes` shape
//! (`foxpro::CharField`, `CurrencyField`, ...), generalized into one
//! buffer type driven by a field-descriptor table instead of one struct per
//! field.

use crate::codec::{self, Value};
use crate::config::LogicalPolicy;
use crate::error::{Result, XbaseError};
use crate::header::{FieldDescriptor, FieldType};
use crate::memo::MemoStore;
use encoding_rs::Encoding;

pub const DELETED_FLAG: u8 = b'*';
pub const ACTIVE_FLAG: u8 = b' ';

/// Compute the blank-record template: for each field, its empty byte
/// pattern, concatenated behind the active-record delete flag.
pub fn blank_record(fields: &[FieldDescriptor], record_length: usize) -> Vec<u8> {
    let mut buf = vec![ACTIVE_FLAG; record_length];
    for field in fields {
        let empty = codec::empty_bytes(field.field_type, field.length);
        let end = field.offset + field.length;
        buf[field.offset..end].copy_from_slice(&empty[..field.length.min(empty.len())]);
    }
    buf
}

pub fn is_deleted(buf: &[u8]) -> bool {
    buf.first() == Some(&DELETED_FLAG)
}

pub fn set_deleted(buf: &mut [u8], deleted: bool) {
    buf[0] = if deleted { DELETED_FLAG } else { ACTIVE_FLAG };
}

fn field_slice<'a>(buf: &'a [u8], field: &FieldDescriptor) -> &'a [u8] {
    &buf[field.offset..field.offset + field.length]
}

/// Decode one field out of a record buffer (spec 4.1 / 4.5). `memo_ref_is_vfp`
/// selects the 4-byte-LE vs. 10-ASCII-digit block reference encoding.
pub fn read_field(
    buf: &[u8],
    field: &FieldDescriptor,
    codepage: &'static Encoding,
    memo: Option<&mut dyn MemoStore>,
    memo_ref_is_vfp: bool,
    logical_policy: LogicalPolicy,
) -> Result<Value> {
    let bytes = field_slice(buf, field);
    Ok(match field.field_type {
        FieldType::Character => Value::Character(codec::decode_character(bytes, codepage, field.binary)?),
        FieldType::Numeric => Value::Numeric(codec::decode_numeric(bytes)?),
        FieldType::Float => Value::Float(codec::decode_numeric(bytes)?),
        FieldType::Integer => Value::Integer(codec::decode_integer(bytes)?),
        FieldType::Currency => Value::Currency(codec::decode_currency(bytes)?),
        FieldType::Double => Value::Double(codec::decode_double(bytes)?),
        FieldType::Date => Value::Date(codec::decode_date(bytes)?),
        FieldType::DateTime => Value::DateTime(codec::decode_datetime(bytes)?),
        FieldType::Logical => {
            let treat_bad_as_unknown = matches!(logical_policy, LogicalPolicy::Unknown);
            Value::Logical(codec::decode_logical(bytes[0], treat_bad_as_unknown)?)
        }
        FieldType::Memo => {
            let block = if memo_ref_is_vfp {
                codec::decode_memo_ref_vfp(bytes)?
            } else {
                codec::decode_memo_ref_dbase3(bytes)?
            };
            if block == 0 {
                Value::Memo(None)
            } else {
                let store = memo.ok_or(XbaseError::MemoFlagMissing)?;
                let payload = store.read(block)?;
                Value::Memo(Some(codec::decode_character(&payload, codepage, field.binary)?))
            }
        }
        FieldType::General | FieldType::Picture => {
            let block = if memo_ref_is_vfp {
                codec::decode_memo_ref_vfp(bytes)?
            } else {
                codec::decode_memo_ref_dbase3(bytes)?
            };
            if block == 0 {
                if field.field_type == FieldType::General {
                    Value::General(None)
                } else {
                    Value::Picture(None)
                }
            } else {
                let store = memo.ok_or(XbaseError::MemoFlagMissing)?;
                let payload = store.read(block)?;
                if field.field_type == FieldType::General {
                    Value::General(Some(payload))
                } else {
                    Value::Picture(Some(payload))
                }
            }
        }
    })
}

/// Encode `value` into the field's slice of `buf`, growing the memo file if
/// needed. On success the buffer is updated in place; on failure (e.g.
/// overflow) `buf` is left untouched -- callers write into a scratch copy
/// and swap it in, never the live buffer, to preserve that guarantee.
pub fn write_field(
    buf: &mut [u8],
    field: &FieldDescriptor,
    value: &Value,
    codepage: &'static Encoding,
    memo: Option<&mut dyn MemoStore>,
    memo_ref_is_vfp: bool,
) -> Result<()> {
    let encoded: Vec<u8> = match (field.field_type, value) {
        (FieldType::Character, Value::Character(s)) => {
            codec::encode_character(s, field.length, codepage, field.binary)?
        }
        (FieldType::Numeric, Value::Numeric(n)) => codec::encode_numeric(*n, field.length, field.decimals)?,
        (FieldType::Float, Value::Float(n)) => codec::encode_numeric(*n, field.length, field.decimals)?,
        (FieldType::Integer, Value::Integer(i)) => codec::encode_integer(*i).to_vec(),
        (FieldType::Currency, Value::Currency(c)) => codec::encode_currency(*c).to_vec(),
        (FieldType::Double, Value::Double(d)) => codec::encode_double(*d).to_vec(),
        (FieldType::Date, Value::Date(d)) => codec::encode_date(*d).to_vec(),
        (FieldType::DateTime, Value::DateTime(dt)) => codec::encode_datetime(*dt).to_vec(),
        (FieldType::Logical, Value::Logical(l)) => vec![codec::encode_logical(*l)],
        (FieldType::Memo, Value::Memo(text)) => {
            let payload = match text {
                None => None,
                Some(s) => {
                    let (encoded, _, had_errors) = codepage.encode(s);
                    if had_errors {
                        return Err(XbaseError::NonUnicodeInput {
                            field: field.name.clone(),
                            codepage: codepage.name().to_string(),
                        });
                    }
                    Some(encoded.into_owned())
                }
            };
            encode_memo_like(payload, field, codepage, memo, memo_ref_is_vfp)?
        }
        (FieldType::General, Value::General(payload)) => {
            encode_memo_like(payload.clone(), field, codepage, memo, memo_ref_is_vfp)?
        }
        (FieldType::Picture, Value::Picture(payload)) => {
            encode_memo_like(payload.clone(), field, codepage, memo, memo_ref_is_vfp)?
        }
        _ => {
            return Err(XbaseError::FieldSpec {
                detail: format!("value type does not match field '{}' ({:?})", field.name, field.field_type),
            })
        }
    };
    if encoded.len() != field.length {
        return Err(XbaseError::Overflow {
            field: field.name.clone(),
            len: field.length,
            detail: format!("encoded value is {} bytes, field is {} bytes", encoded.len(), field.length),
        });
    }
    let end = field.offset + field.length;
    buf[field.offset..end].copy_from_slice(&encoded);
    Ok(())
}

fn encode_memo_like(
    payload: Option<Vec<u8>>,
    field: &FieldDescriptor,
    codepage: &'static Encoding,
    memo: Option<&mut dyn MemoStore>,
    memo_ref_is_vfp: bool,
) -> Result<Vec<u8>> {
    let block = match payload {
        None => 0,
        Some(bytes) => {
            let store = memo.ok_or(XbaseError::MemoFlagMissing)?;
            store.write(&bytes)?
        }
    };
    let _ = codepage; // memo text is encoded to bytes by the caller before reaching here
    Ok(if memo_ref_is_vfp {
        codec::encode_memo_ref_vfp(block).to_vec()
    } else {
        codec::encode_memo_ref_dbase3(block)
    })
}

/// A scoped edit session over a shadow copy of a record's bytes (spec 4.5,
/// "flux"). Edits go to the shadow; `commit` returns it for the caller to
/// install, `rollback` discards it.
pub struct Flux {
    shadow: Vec<u8>,
}

impl Flux {
    pub fn begin(current: &[u8]) -> Flux {
        Flux { shadow: current.to_vec() }
    }

    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.shadow
    }

    pub fn buffer(&self) -> &[u8] {
        &self.shadow
    }

    pub fn commit(self) -> Vec<u8> {
        self.shadow
    }

    pub fn rollback(self) {
        drop(self)
    }
}
