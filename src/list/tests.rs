use super::*;
use crate::codec::Value;
use crate::config::Config;
use crate::dialect::Dialect;
use crate::header::{FieldDescriptor, FieldType};
use tempfile::tempdir;

fn name_of(record: &RecordView) -> Key {
    match record.get("NAME") {
        Some(Value::Character(s)) => text_key(s.clone()),
        _ => text_key(""),
    }
}

fn make_table(dir: &std::path::Path, file: &str, names: &[&str]) -> TableHandle {
    let fields = vec![FieldDescriptor::new("NAME", FieldType::Character, 20, 0)];
    let mut table = Table::create(dir.join(file), Dialect::DBaseIII, fields, "ascii", Config::default()).unwrap();
    for name in names {
        table.append(&[("NAME", Value::Character(name.to_string()))], 1, false).unwrap();
    }
    Rc::new(RefCell::new(table))
}

#[test]
fn from_table_collects_one_entry_per_record() {
    crate::test_support::init();
    let dir = tempdir().unwrap();
    let table = make_table(dir.path(), "a.dbf", &["ada", "ethan", "grace"]);
    let list = List::from_table(table, name_of).unwrap();
    assert_eq!(list.len(), 3);
    assert_eq!(list.get(1).unwrap().record_id, 1);
}

#[test]
fn push_is_a_no_op_for_a_duplicate_key() {
    let dir = tempdir().unwrap();
    let table = make_table(dir.path(), "a.dbf", &["ada"]);
    let mut list = List::new();
    assert!(list.push(table.clone(), 0, text_key("ada")));
    assert!(!list.push(table, 0, text_key("ada")));
    assert_eq!(list.len(), 1);
}

#[test]
fn sort_orders_entries_by_key() {
    let dir = tempdir().unwrap();
    let table = make_table(dir.path(), "a.dbf", &["grace", "ada", "ethan"]);
    let mut list = List::from_table(table, name_of).unwrap();
    list.sort();
    let names: Vec<_> = (0..list.len())
        .map(|i| match &list.get(i).unwrap().key[0] {
            KeyElement::Text(s) => s.clone(),
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(names, vec!["ada".to_string(), "ethan".to_string(), "grace".to_string()]);
}

#[test]
fn pop_and_remove_release_the_key() {
    let dir = tempdir().unwrap();
    let table = make_table(dir.path(), "a.dbf", &["ada", "ethan"]);
    let mut list = List::from_table(table.clone(), name_of).unwrap();
    let popped = list.pop().unwrap();
    assert!(!list.contains_key(&popped.key));
    assert_eq!(list.len(), 1);

    let mut list2 = List::from_table(table, name_of).unwrap();
    let removed = list2.remove(0).unwrap();
    assert!(!list2.contains_key(&removed.key));
}

#[test]
fn union_with_merges_distinct_keys_only() {
    let dir = tempdir().unwrap();
    let table = make_table(dir.path(), "a.dbf", &["ada", "ethan", "grace"]);
    let mut left = List::new();
    left.push(table.clone(), 0, text_key("ada"));
    let mut right = List::new();
    right.push(table.clone(), 0, text_key("ada"));
    right.push(table, 1, text_key("ethan"));

    left.union_with(&right);
    assert_eq!(left.len(), 2);
}

#[test]
fn difference_with_drops_shared_keys() {
    let dir = tempdir().unwrap();
    let table = make_table(dir.path(), "a.dbf", &["ada", "ethan"]);
    let mut left = List::new();
    left.push(table.clone(), 0, text_key("ada"));
    left.push(table.clone(), 1, text_key("ethan"));
    let mut right = List::new();
    right.push(table, 0, text_key("ada"));

    left.difference_with(&right);
    assert_eq!(left.len(), 1);
    assert!(!left.contains_key(&text_key("ada")));
}

#[test]
fn slice_returns_a_new_list_sharing_table_handles() {
    let dir = tempdir().unwrap();
    let table = make_table(dir.path(), "a.dbf", &["ada", "ethan", "grace"]);
    let list = List::from_table(table, name_of).unwrap();
    let middle = list.slice(1..2);
    assert_eq!(middle.len(), 1);
    assert_eq!(middle.get(0).unwrap().record_id, 1);
}

#[test]
fn notify_pack_renumbers_and_drops_removed_entries() {
    let dir = tempdir().unwrap();
    let table = make_table(dir.path(), "a.dbf", &["ada", "ethan", "grace"]);
    let mut list = List::from_table(table.clone(), name_of).unwrap();

    // simulate a pack that dropped record 1 ("ethan")
    let id_map = vec![0i64, -1, 1];
    list.notify_pack(&table, &id_map);

    assert_eq!(list.len(), 2);
    assert!(!list.contains_key(&text_key("ethan")));
    let grace = list.entries.iter().find(|e| e.key == text_key("grace")).unwrap();
    assert_eq!(grace.record_id, 1);
}

#[test]
fn read_decodes_through_the_table_handle() {
    let dir = tempdir().unwrap();
    let table = make_table(dir.path(), "a.dbf", &["ada"]);
    let list = List::from_table(table, name_of).unwrap();
    let record = list.read(0).unwrap();
    assert_eq!(record.get("NAME"), Some(&Value::Character("ada".to_string())));
}

#[test]
fn is_prefix_matches_on_string_element_length() {
    assert!(is_prefix(&text_key("ad"), &text_key("ada")));
    assert!(!is_prefix(&text_key("ethan"), &text_key("ada")));
    assert!(is_prefix(&integer_key(5), &integer_key(5)));
    assert!(!is_prefix(&integer_key(5), &integer_key(6)));
}

#[test]
fn cursor_navigation_over_list() {
    let dir = tempdir().unwrap();
    let table = make_table(dir.path(), "a.dbf", &["ada", "ethan"]);
    let mut list = List::from_table(table, name_of).unwrap();
    list.top();
    assert!(list.is_before_first());
    list.skip(1).unwrap();
    assert_eq!(list.current(), 0);
    list.bottom();
    assert!(list.is_after_last());
}

#[test]
fn current_record_reads_through_the_list_at_the_cursor() {
    let dir = tempdir().unwrap();
    let table = make_table(dir.path(), "a.dbf", &["ada", "ethan"]);
    let mut list = List::from_table(table, name_of).unwrap();
    list.top();
    assert!(list.current_record().is_vapor());
    list.skip(1).unwrap();
    assert_eq!(list.current_record().get("NAME"), Some(&Value::Character("ada".to_string())));
    assert_eq!(list.next_record().get("NAME"), Some(&Value::Character("ethan".to_string())));
}
