//! End-to-end scenarios exercising the table engine, schema mutation, memo
//! handling, and indexing together, the way a caller would actually drive
//! the crate rather than one module in isolation.

use chrono::NaiveDate;
use std::cell::RefCell;
use std::rc::Rc;
use tempfile::tempdir;
use xbase::codec::{Logical, Numeric, Value};
use xbase::config::Config;
use xbase::dialect::Dialect;
use xbase::error::{Flow, XbaseError};
use xbase::header::{FieldDescriptor, FieldType};
use xbase::index::Index;
use xbase::list::{text_key, Key, TableHandle};
use xbase::table::{OpenMode, RecordView, Table};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn s1_create_append_read_dbase3_roundtrip() {
    init_logging();
    let dir = tempdir().unwrap();
    let path = dir.path().join("people.dbf");
    let fields = vec![
        FieldDescriptor::new("NAME", FieldType::Character, 25, 0),
        FieldDescriptor::new("PAID", FieldType::Logical, 1, 0),
        FieldDescriptor::new("QTY", FieldType::Numeric, 11, 5),
        FieldDescriptor::new("ORDERDATE", FieldType::Date, 8, 0),
        FieldDescriptor::new("DESC", FieldType::Memo, 10, 0),
    ];
    let mut table = Table::create(&path, Dialect::DBaseIII, fields, "ascii", Config::default()).unwrap();
    let order_date = NaiveDate::from_ymd_opt(2018, 5, 20).unwrap();
    table
        .append(
            &[
                ("NAME", Value::Character("ethan".to_string())),
                ("PAID", Value::Logical(Logical::True)),
                ("QTY", Value::Numeric(Numeric::Value(1.5))),
                ("ORDERDATE", Value::Date(Some(order_date))),
                ("DESC", Value::Memo(Some("hello".to_string()))),
            ],
            1, false,
        )
        .unwrap();
    table.close().unwrap();

    let mut table = Table::open(&path, OpenMode::ReadOnly, Config::default()).unwrap();
    assert_eq!(table.record_count(), 1);
    let record = table.read(0).unwrap();
    assert_eq!(record.get("NAME"), Some(&Value::Character("ethan".to_string())));
    assert_eq!(record.get("PAID"), Some(&Value::Logical(Logical::True)));
    assert_eq!(record.get("QTY"), Some(&Value::Numeric(Numeric::Value(1.5))));
    assert_eq!(record.get("ORDERDATE"), Some(&Value::Date(Some(order_date))));
    assert_eq!(record.get("DESC"), Some(&Value::Memo(Some("hello".to_string()))));
    drop(table);

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(*bytes.last().unwrap(), 0x1A);
}

#[test]
fn s2_overflow_on_append_leaves_record_count_unchanged() {
    init_logging();
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.dbf");
    let fields = vec![
        FieldDescriptor::new("MINE", FieldType::Character, 2, 0),
        FieldDescriptor::new("YOURS", FieldType::Character, 15, 0),
    ];
    let mut table = Table::create(&path, Dialect::DBaseIII, fields, "ascii", Config::default()).unwrap();
    table.append(&[("MINE", Value::Character("me".to_string()))], 1, false).unwrap();
    assert_eq!(table.record_count(), 1);

    let err = table.append(
        &[
            ("YOURS", Value::Character("yours".to_string())),
            ("MINE", Value::Character("toolong".to_string())),
        ],
        1, false,
    );
    assert!(matches!(err, Err(XbaseError::Overflow { .. })));
    assert_eq!(table.record_count(), 1);
}

#[test]
fn s3_pack_drops_deleted_rows_and_renumbers_survivors() {
    init_logging();
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.dbf");
    let fields = vec![
        FieldDescriptor::new("NAME", FieldType::Character, 3, 0),
        FieldDescriptor::new("AGE", FieldType::Numeric, 3, 0),
    ];
    let mut table = Table::create(&path, Dialect::DBaseIII, fields, "ascii", Config::default()).unwrap();
    for (name, age) in [("me", 25.0), ("you", 35.0), ("her", 29.0)] {
        table
            .append(
                &[("NAME", Value::Character(name.to_string())), ("AGE", Value::Numeric(Numeric::Value(age)))],
                1, false,
            )
            .unwrap();
    }

    table.delete(1).unwrap();
    let map = table.pack().unwrap();
    assert_eq!(map, vec![0, -1, 1]);
    assert_eq!(table.record_count(), 2);
    assert_eq!(table.read(0).unwrap().get("NAME"), Some(&Value::Character("me".to_string())));
    assert_eq!(table.read(1).unwrap().get("NAME"), Some(&Value::Character("her".to_string())));
}

#[test]
fn s4_vfp_memo_reopen_with_and_without_memos() {
    init_logging();
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.dbf");
    let fields = vec![
        FieldDescriptor::new("NAME", FieldType::Character, 25, 0),
        FieldDescriptor::new("WISDOM", FieldType::Memo, 10, 0),
    ];
    let mut table = Table::create(&path, Dialect::VisualFoxPro, fields, "ascii", Config::default()).unwrap();
    table
        .append(
            &[
                ("NAME", Value::Character("QC Tester".to_string())),
                ("WISDOM", Value::Memo(Some("check twice".to_string()))),
            ],
            1, false,
        )
        .unwrap();
    table.close().unwrap();

    let mut ignoring = Table::open_ignoring_memos(&path, OpenMode::ReadOnly, Config::default()).unwrap();
    assert_eq!(ignoring.read(0).unwrap().get("WISDOM"), Some(&Value::Memo(Some(String::new()))));
    drop(ignoring);

    let mut normal = Table::open(&path, OpenMode::ReadOnly, Config::default()).unwrap();
    assert_eq!(normal.read(0).unwrap().get("WISDOM"), Some(&Value::Memo(Some("check twice".to_string()))));
}

#[test]
fn s5_add_field_then_fill_survives_reopen() {
    init_logging();
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.dbf");
    let fields = vec![
        FieldDescriptor::new("NAME", FieldType::Character, 50, 0),
        FieldDescriptor::new("AGE", FieldType::Numeric, 3, 0),
    ];
    let mut table = Table::create(&path, Dialect::DBaseIII, fields, "ascii", Config::default()).unwrap();
    table
        .append(&[("NAME", Value::Character("user".to_string())), ("AGE", Value::Numeric(Numeric::Value(0.0)))], 1, false)
        .unwrap();

    table.add_fields(vec![FieldDescriptor::new("MOTTO", FieldType::Memo, 10, 0)]).unwrap();
    table.write(0, &[("MOTTO", Value::Memo(Some("Are we there yet??".to_string())))]).unwrap();
    table.close().unwrap();

    let mut reopened = Table::open(&path, OpenMode::ReadOnly, Config::default()).unwrap();
    let record = reopened.read(0).unwrap();
    assert_eq!(record.get("MOTTO"), Some(&Value::Memo(Some("Are we there yet??".to_string()))));
    assert_eq!(record.get("NAME"), Some(&Value::Character("user".to_string())));
    assert_eq!(record.get("AGE"), Some(&Value::Numeric(Numeric::Value(0.0))));
}

#[test]
fn s6_index_search_with_prefix_over_nato_alphabet() {
    init_logging();
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.dbf");
    let names = [
        "alpha", "bravo", "charlie", "delta", "echo", "foxtrot", "golf", "hotel", "india", "juliet", "kilo", "lima",
        "mike", "november", "oscar", "papa", "quebec", "romeo", "sierra", "tango", "uniform", "victor", "whiskey",
        "xray", "yankee", "zulu",
    ];
    let fields = vec![FieldDescriptor::new("NAME", FieldType::Character, 10, 0)];
    let mut table = Table::create(&path, Dialect::DBaseIII, fields, "ascii", Config::default()).unwrap();
    for name in &names {
        table.append(&[("NAME", Value::Character(name.to_string()))], 1, false).unwrap();
    }

    let handle: TableHandle = Rc::new(RefCell::new(table));
    let key_fn: Box<dyn Fn(&RecordView) -> Result<Key, Flow>> = Box::new(|record| match record.get("NAME") {
        Some(Value::Character(s)) => Ok(text_key(s.clone())),
        _ => Err(Flow::SkipIndex),
    });
    let index = Index::build(handle, key_fn).unwrap();
    assert_eq!(index.len(), names.len());

    let found = index.search(&text_key("alpha"), false).unwrap();
    assert_eq!(found.len(), 1);

    let found = index.search(&text_key("a"), true).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].get("NAME"), Some(&Value::Character("alpha".to_string())));

    assert!(matches!(index.index_search(&text_key("john"), false), Err(XbaseError::NotFound)));
    assert!(matches!(index.index_search(&text_key("john"), true), Err(XbaseError::NotFound)));

    let exact_pos = index.index_search(&text_key("juliet"), false).unwrap();
    let prefix_pos = index.index_search(&text_key("jul"), true).unwrap();
    assert_eq!(prefix_pos, exact_pos);
}
