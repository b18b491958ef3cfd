use super::*;
use crate::dialect::Dialect;
use std::io::Cursor;

#[test]
fn field_descriptor_roundtrip() {
    let field = FieldDescriptor {
        name: "NAME".to_string(),
        field_type: FieldType::Character,
        offset: 1,
        length: 25,
        decimals: 0,
        system: false,
        nullable: true,
        binary: false,
    };
    let bytes = field.to_bytes();
    let parsed = FieldDescriptor::from_bytes(&bytes, Dialect::DBaseIII).unwrap().unwrap();
    assert_eq!(parsed.name, "NAME");
    assert_eq!(parsed.field_type, FieldType::Character);
    assert_eq!(parsed.length, 25);
    assert!(parsed.nullable);
    assert!(!parsed.binary);
}

#[test]
fn terminator_byte_ends_field_block() {
    let terminator = [TERMINATOR; FIELD_DESCRIPTOR_LEN];
    assert!(FieldDescriptor::from_bytes(&terminator, Dialect::DBaseIII).unwrap().is_none());
}

#[test]
fn header_roundtrip_dbase3() {
    let header = Header {
        dialect: Dialect::DBaseIII,
        has_memo: false,
        last_update: NaiveDate::from_ymd_opt(2018, 5, 20).unwrap(),
        record_count: 3,
        header_length: 97,
        record_length: 42,
        table_flags: 0,
        codepage_id: 0x01,
    };
    let mut buf = Vec::new();
    header.write(&mut buf).unwrap();
    assert_eq!(buf.len(), PRIMARY_HEADER_LEN);
    assert_eq!(buf[0], 0x03);

    let mut cursor = Cursor::new(buf);
    let parsed = Header::read(&mut cursor).unwrap();
    assert_eq!(parsed.dialect, Dialect::DBaseIII);
    assert!(!parsed.has_memo);
    assert_eq!(parsed.record_count, 3);
    assert_eq!(parsed.last_update, NaiveDate::from_ymd_opt(2018, 5, 20).unwrap());
}

#[test]
fn header_roundtrip_with_memo() {
    let header = Header {
        dialect: Dialect::DBaseIII,
        has_memo: true,
        last_update: NaiveDate::from_ymd_opt(2020, 2, 29).unwrap(),
        record_count: 1,
        header_length: 65,
        record_length: 10,
        table_flags: 0,
        codepage_id: 0,
    };
    let mut buf = Vec::new();
    header.write(&mut buf).unwrap();
    assert_eq!(buf[0], 0x83);
    let parsed = Header::read(&mut Cursor::new(buf)).unwrap();
    assert!(parsed.has_memo);
}

#[test]
fn fields_partition_record_length() {
    let mut fields = vec![
        FieldDescriptor::new("NAME", FieldType::Character, 25, 0),
        FieldDescriptor::new("PAID", FieldType::Logical, 0, 0),
        FieldDescriptor::new("QTY", FieldType::Numeric, 11, 5),
    ];
    reassign_offsets(&mut fields);
    assert_eq!(fields[0].offset, 1);
    assert_eq!(fields[1].offset, 26);
    assert_eq!(fields[2].offset, 27);
    assert_eq!(record_length_for(&fields), 1 + 25 + 1 + 11);
}

#[test]
fn unknown_field_type_is_rejected() {
    let mut bytes = [0u8; FIELD_DESCRIPTOR_LEN];
    bytes[0] = b'X';
    bytes[11] = b'Q'; // not in the allowed set for dBase III
    assert!(FieldDescriptor::from_bytes(&bytes, Dialect::DBaseIII).is_err());
}

#[test]
fn field_name_validation() {
    assert!(FieldDescriptor::validate_name("NAME").is_ok());
    assert!(FieldDescriptor::validate_name("_BAD").is_err());
    assert!(FieldDescriptor::validate_name("1BAD").is_err());
    assert!(FieldDescriptor::validate_name("TOOLONGFIELDNAME").is_err());
    assert!(FieldDescriptor::validate_name("BAD NAME").is_err());
}

#[test]
fn vfp_requires_trailer_bytes() {
    let fields = vec![FieldDescriptor::new("NAME", FieldType::Character, 10, 0)];
    let mut buf = Vec::new();
    write_fields(&mut buf, &fields, Dialect::VisualFoxPro).unwrap();
    // 1 field descriptor + terminator + 263-byte trailer
    assert_eq!(buf.len(), FIELD_DESCRIPTOR_LEN + 1 + VFP_TRAILER_LEN);

    let parsed = read_fields(&mut Cursor::new(buf), Dialect::VisualFoxPro).unwrap();
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].name, "NAME");
}
