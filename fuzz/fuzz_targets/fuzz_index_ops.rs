#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use std::cmp::Ordering;
use xref_archive::index::{compare_ignore_case, ContainerIndex};
use xref_archive::validation::normalize_minor_name;

#[derive(Arbitrary, Debug)]
enum Op {
    Insert(String),
    Remove(String),
    Normalize(String),
}

fuzz_target!(|ops: Vec<Op>| {
    let mut index = ContainerIndex::new();

    for op in ops {
        match op {
            Op::Insert(name) => {
                let existed = index.contains(&name);
                assert_eq!(index.insert(&name), !existed);
                assert!(index.contains(&name));
            }
            Op::Remove(name) => {
                let existed = index.contains(&name);
                assert_eq!(index.remove(&name).is_some(), existed);
                assert!(!index.contains(&name));
            }
            Op::Normalize(hint) => {
                if let Some(name) = normalize_minor_name(&hint) {
                    assert!(name.starts_with(hint.as_str()));
                    // normalizing twice is stable
                    assert_eq!(normalize_minor_name(&name).as_deref(), Some(name.as_str()));
                }
            }
        }

        let names: Vec<&str> = index.iter().collect();
        for pair in names.windows(2) {
            assert_eq!(compare_ignore_case(pair[0], pair[1]), Ordering::Less);
        }
    }
});
