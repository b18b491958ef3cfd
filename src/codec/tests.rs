use super::*;
use encoding_rs::WINDOWS_1252;

#[test]
fn character_roundtrip_strips_trailing_spaces() {
    let bytes = encode_character("ethan", 25, WINDOWS_1252, false).unwrap();
    assert_eq!(bytes.len(), 25);
    let decoded = decode_character(&bytes, WINDOWS_1252, false).unwrap();
    assert_eq!(decoded, "ethan");
}

#[test]
fn character_overflow_is_rejected() {
    let err = encode_character("this is way too long", 4, WINDOWS_1252, false);
    assert!(err.is_err());
}

#[test]
fn character_binary_bypasses_codepage() {
    let raw: Vec<u8> = (0u8..=255).collect();
    let encoded = encode_character(&raw.iter().map(|&b| b as char).collect::<String>(), 256, WINDOWS_1252, true).unwrap();
    assert_eq!(encoded, raw);
}

#[test]
fn numeric_empty_and_overflow_sentinels() {
    assert_eq!(decode_numeric(b"       ").unwrap(), Numeric::Empty);
    assert_eq!(decode_numeric(b"*******").unwrap(), Numeric::Overflowed);
    assert_eq!(decode_numeric(b"   1.50").unwrap(), Numeric::Value(1.5));
}

#[test]
fn numeric_roundtrip_with_decimals() {
    let bytes = encode_numeric(Numeric::Value(1.5), 11, 5).unwrap();
    assert_eq!(bytes.len(), 11);
    assert_eq!(decode_numeric(&bytes).unwrap(), Numeric::Value(1.5));
}

#[test]
fn numeric_overflow_on_encode() {
    assert!(encode_numeric(Numeric::Value(123456.0), 3, 0).is_err());
}

#[test]
fn integer_roundtrip() {
    let bytes = encode_integer(-42);
    assert_eq!(decode_integer(&bytes).unwrap(), -42);
}

#[test]
fn currency_roundtrip() {
    let raw = currency_from_f64(12.3456);
    let bytes = encode_currency(raw);
    let decoded = decode_currency(&bytes).unwrap();
    assert_eq!(currency_to_f64(decoded), 12.3456);
}

#[test]
fn double_roundtrip() {
    let bytes = encode_double(3.14159);
    assert_eq!(decode_double(&bytes).unwrap(), 3.14159);
}

#[test]
fn date_roundtrip() {
    let date = NaiveDate::from_ymd_opt(2018, 5, 20).unwrap();
    let bytes = encode_date(Some(date));
    assert_eq!(&bytes, b"20180520");
    assert_eq!(decode_date(&bytes).unwrap(), Some(date));
}

#[test]
fn date_empty_is_none() {
    assert_eq!(decode_date(b"        ").unwrap(), None);
    assert_eq!(decode_date(b"00000000").unwrap(), None);
    assert_eq!(encode_date(None), *b"00000000");
}

#[test]
fn datetime_roundtrip_drops_sub_millisecond() {
    let dt = NaiveDate::from_ymd_opt(2020, 2, 29)
        .unwrap()
        .and_hms_milli_opt(13, 45, 30, 250)
        .unwrap();
    let bytes = encode_datetime(Some(dt));
    let decoded = decode_datetime(&bytes).unwrap().unwrap();
    assert_eq!(decoded, dt);
}

#[test]
fn datetime_empty_is_none() {
    assert_eq!(decode_datetime(&[0u8; 8]).unwrap(), None);
}

#[test]
fn logical_three_states() {
    assert_eq!(decode_logical(b'T', false).unwrap(), Logical::True);
    assert_eq!(decode_logical(b'y', false).unwrap(), Logical::True);
    assert_eq!(decode_logical(b'N', false).unwrap(), Logical::False);
    assert_eq!(decode_logical(b'?', false).unwrap(), Logical::Unknown);
    assert_eq!(decode_logical(b' ', false).unwrap(), Logical::Unknown);
}

#[test]
fn logical_bad_data_policy() {
    assert!(decode_logical(b'X', false).is_err());
    assert_eq!(decode_logical(b'X', true).unwrap(), Logical::Unknown);
}

#[test]
fn logical_roundtrip() {
    for v in [Logical::True, Logical::False, Logical::Unknown] {
        assert_eq!(decode_logical(encode_logical(v), false).unwrap(), v);
    }
}

#[test]
fn memo_ref_dbase3_roundtrip() {
    let bytes = encode_memo_ref_dbase3(42);
    assert_eq!(bytes.len(), 10);
    assert_eq!(decode_memo_ref_dbase3(&bytes).unwrap(), 42);
}

#[test]
fn memo_ref_dbase3_empty_is_zero() {
    assert_eq!(decode_memo_ref_dbase3(b"          ").unwrap(), 0);
    assert_eq!(encode_memo_ref_dbase3(0), vec![b' '; 10]);
}

#[test]
fn memo_ref_vfp_roundtrip() {
    let bytes = encode_memo_ref_vfp(7);
    assert_eq!(decode_memo_ref_vfp(&bytes).unwrap(), 7);
}

#[test]
fn empty_value_matches_field_type() {
    assert_eq!(empty_value(FieldType::Logical), Value::Logical(Logical::Unknown));
    assert_eq!(empty_value(FieldType::Integer), Value::Integer(0));
    assert_eq!(empty_value(FieldType::Date), Value::Date(None));
}
