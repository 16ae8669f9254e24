//! Property-based tests for archive index invariants
//!
//! Random operation sequences must leave the entry list sorted, unique and in
//! sync with `has_entry`, and every stored map must read back unchanged.

use proptest::prelude::*;
use std::collections::BTreeMap;
use xref_archive::index::{compare_ignore_case, fold_case};
use xref_archive::{ArchiveMode, XRefArchive, XRefError, XRefMap, XRefSpec};

#[derive(Debug, Clone)]
enum Op {
    Create(String),
    Update(String),
    Delete(String),
    Get(String),
}

fn name_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "a", "A", "b", "B.yml", "c.yaml", "C.YAML", "x_y", "Zz", "straße", "STRASSE",
    ])
        .prop_map(str::to_string)
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        name_strategy().prop_map(Op::Create),
        name_strategy().prop_map(Op::Update),
        name_strategy().prop_map(Op::Delete),
        name_strategy().prop_map(Op::Get),
    ]
}

fn map(tag: usize) -> XRefMap {
    XRefMap::from_references(vec![XRefSpec::new(format!("uid{}", tag), "x.html")])
}

fn key(name: &str) -> String {
    fold_case(name)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_index_stays_sorted_and_in_sync(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let temp = tempfile::TempDir::new().unwrap();
        let archive = XRefArchive::open(temp.path().join("prop.zip"), ArchiveMode::Create).unwrap();

        // model: case-folded name -> content tag
        let mut model: BTreeMap<String, usize> = BTreeMap::new();

        for (step, op) in ops.into_iter().enumerate() {
            match op {
                Op::Create(hint) => {
                    let name = archive.create_minor(&map(step), [hint.as_str()]).unwrap();
                    prop_assert!(model.insert(key(&name), step).is_none());
                }
                Op::Update(hint) => {
                    let name = xref_archive::validation::normalize_minor_name(&hint).unwrap();
                    match archive.update(&name, &map(step)) {
                        Ok(()) => { model.insert(key(&name), step); }
                        Err(XRefError::NotFound(_)) => prop_assert!(!model.contains_key(&key(&name))),
                        Err(other) => prop_assert!(false, "unexpected error {}", other),
                    }
                }
                Op::Delete(hint) => {
                    let name = xref_archive::validation::normalize_minor_name(&hint).unwrap();
                    match archive.delete(&name) {
                        Ok(()) => prop_assert!(model.remove(&key(&name)).is_some()),
                        Err(XRefError::NotFound(_)) => prop_assert!(!model.contains_key(&key(&name))),
                        Err(other) => prop_assert!(false, "unexpected error {}", other),
                    }
                }
                Op::Get(hint) => {
                    let name = xref_archive::validation::normalize_minor_name(&hint).unwrap();
                    match archive.get(&name) {
                        Ok(found) => {
                            let expected = model.get(&key(&name)).map(|tag| map(*tag));
                            prop_assert_eq!(Some(found), expected);
                        }
                        Err(XRefError::NotFound(_)) => prop_assert!(!model.contains_key(&key(&name))),
                        Err(other) => prop_assert!(false, "unexpected error {}", other),
                    }
                }
            }

            let entries = archive.entries();
            for pair in entries.windows(2) {
                prop_assert_eq!(compare_ignore_case(&pair[0], &pair[1]), std::cmp::Ordering::Less);
            }
            prop_assert_eq!(entries.len(), model.len());
            for entry in &entries {
                prop_assert!(archive.has_entry(entry));
                prop_assert!(archive.has_entry(&entry.to_lowercase()));
                prop_assert!(model.contains_key(&key(entry)));
            }
        }
    }
}
