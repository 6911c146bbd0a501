use cmptree_core::{
    CompareConfig, CompareError, DiffState, DirEntry, EntryOrder, FileTime, MergeOptions, MoveKey,
    NameOrder, compare_attributes, ignore_attributes, merge_sorted,
};
use std::cmp::Ordering;

fn listing(names: &[&str]) -> Vec<DirEntry> {
    let mut entries: Vec<DirEntry> = names
        .iter()
        .enumerate()
        .map(|(i, name)| DirEntry::file(*name, i as u64 * 10, FileTime::from_ticks(1_000 + i as u64)))
        .collect();
    EntryOrder::default().sort(&mut entries);
    entries
}

fn diff_entries(
    target: Vec<DirEntry>,
    source: Vec<DirEntry>,
    order: EntryOrder,
    report_same: bool,
) -> Result<(u64, Vec<(DiffState, String)>), CompareError> {
    let mut events = Vec::new();
    let count = merge_sorted(
        target,
        source,
        |a, b| order.compare(a, b),
        compare_attributes,
        MergeOptions::default().report_same(report_same),
        |state, a, b| {
            let entry = b.or(a).expect("event carries an entry");
            events.push((state, entry.name.to_string()));
        },
    )?;
    Ok((count, events))
}

#[test]
fn test_listing_against_itself() {
    let entries = listing(&["a", "b", "c", "d"]);
    let (count, events) = diff_entries(entries.clone(), entries, EntryOrder::default(), false).unwrap();

    assert_eq!(count, 0);
    assert!(events.is_empty());
}

#[test]
fn test_listing_against_empty_is_all_deletes() {
    let entries = listing(&["a", "b", "c"]);
    let (count, events) = diff_entries(entries, Vec::new(), EntryOrder::default(), false).unwrap();

    assert_eq!(count, 3);
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|(state, _)| *state == DiffState::Delete));
}

#[test]
fn test_attribute_equality_decides_same_or_modify() {
    let t = FileTime::from_ticks(42);
    let pairs = [
        (DirEntry::file("f", 1, t), DirEntry::file("f", 1, t)),
        (DirEntry::file("f", 1, t), DirEntry::file("f", 2, t)),
        (DirEntry::file("f", 1, t), DirEntry::file("f", 1, FileTime::from_ticks(43))),
        (DirEntry::directory("d", t), DirEntry::directory("d", FileTime::from_ticks(99))),
    ];

    for (a, b) in pairs {
        let same = compare_attributes(&a, &b) == Ordering::Equal;
        let (_, events) = diff_entries(vec![a], vec![b], EntryOrder::default(), true).unwrap();
        assert_eq!(events.len(), 1);
        let expected = if same { DiffState::SameSame } else { DiffState::Modify };
        assert_eq!(events[0].0, expected);
    }
}

#[test]
fn test_one_new_one_delete() {
    let (count, events) =
        diff_entries(listing(&["b.txt"]), listing(&["a.txt"]), EntryOrder::default(), false).unwrap();

    assert_eq!(count, 2);
    assert!(events.contains(&(DiffState::New, "a.txt".to_string())));
    assert!(events.contains(&(DiffState::Delete, "b.txt".to_string())));
}

#[test]
fn test_ignore_case_matches_names() {
    let t = FileTime::from_ticks(1);
    let target = vec![DirEntry::file("README", 5, t)];
    let source = vec![DirEntry::file("readme", 5, t)];

    let (count, _) = diff_entries(
        target.clone(),
        source.clone(),
        EntryOrder::new(NameOrder::OrdinalIgnoreCase),
        false,
    )
    .unwrap();
    assert_eq!(count, 0);

    let (count, _) = diff_entries(target, source, EntryOrder::default(), false).unwrap();
    assert_eq!(count, 2);
}

#[test]
fn test_unsorted_listing_is_rejected() {
    let t = FileTime::from_ticks(1);
    let source = vec![DirEntry::file("b", 1, t), DirEntry::file("a", 1, t)];
    let result = diff_entries(Vec::new(), source, EntryOrder::default(), false);

    assert!(matches!(result, Err(CompareError::SortOrder { .. })));
}

#[test]
fn test_move_key_order() {
    let t1 = FileTime::from_ticks(1);
    let t2 = FileTime::from_ticks(2);
    let a = DirEntry::file("a", 10, t2).move_key();
    let b = DirEntry::file("a", 11, t1).move_key();
    let c = DirEntry::file("b", 0, t1).move_key();

    assert!(a < b);
    assert!(b < c);
    assert_eq!(a, MoveKey { name: "a".into(), size: 10, modified: t2 });
}

#[test]
fn test_merge_keys_only() {
    let mut moved = Vec::new();
    let count = merge_sorted(
        vec![1u32, 2, 4],
        vec![2u32, 3, 4],
        |a, b| a.cmp(b),
        ignore_attributes,
        MergeOptions::default().report_same(true),
        |state, a, _| {
            if state == DiffState::SameSame {
                moved.push(*a.unwrap());
            }
        },
    )
    .unwrap();

    assert_eq!(count, 2);
    assert_eq!(moved, vec![2, 4]);
}

#[test]
fn test_config_defaults() {
    let config = CompareConfig::new("/src", "/trg");
    assert_eq!(config.max_depth, None);
    assert!(!config.follow_junctions);
    assert!(!config.report_same);
    assert_eq!(config.name_order, NameOrder::Ordinal);
}
