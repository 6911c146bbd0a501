//! Merge-style diff of two sorted sequences.
//!
//! Both inputs are walked in lock-step. The `a` input is the reference
//! (target) side and `b` the candidate (source) side:
//!
//! - key only in `a` → [`DiffState::Delete`]
//! - key only in `b` → [`DiffState::New`]
//! - key in both → [`DiffState::SameSame`] or [`DiffState::Modify`],
//!   decided by the attribute comparator
//!
//! The differ holds no state besides its cursors, so independent calls can
//! run concurrently.

use std::cmp::Ordering;
use std::fmt::Debug;

use crate::error::{CompareError, MergeSide};
use crate::state::DiffState;

/// Options of a single merge run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    /// Invoke the callback for [`DiffState::SameSame`] pairs too.
    pub report_same: bool,
    /// Fail when an input turns out not to be sorted by the key comparator.
    pub check_order: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            report_same: false,
            check_order: true,
        }
    }
}

impl MergeOptions {
    pub fn report_same(mut self, report_same: bool) -> Self {
        self.report_same = report_same;
        self
    }

    pub fn check_order(mut self, check_order: bool) -> Self {
        self.check_order = check_order;
        self
    }
}

/// Diff two sorted sequences and return the number of differences.
///
/// `on_compared` receives the state plus the `a` and `b` items involved:
/// `(Some, None)` for DELETE, `(None, Some)` for NEW and `(Some, Some)`
/// otherwise.
///
/// With `check_order` set, each item is compared against its predecessor on
/// the same side and an out-of-order item ends the run with
/// [`CompareError::SortOrder`]. Callbacks already made stay made.
pub fn merge_sorted<T, A, B, K, C, F>(
    a: A,
    b: B,
    key_cmp: K,
    attr_cmp: C,
    options: MergeOptions,
    mut on_compared: F,
) -> Result<u64, CompareError>
where
    T: Debug,
    A: IntoIterator<Item = T>,
    B: IntoIterator<Item = T>,
    K: Fn(&T, &T) -> Ordering,
    C: Fn(&T, &T) -> Ordering,
    F: FnMut(DiffState, Option<&T>, Option<&T>),
{
    let mut iter_a = a.into_iter();
    let mut iter_b = b.into_iter();
    let mut cur_a = iter_a.next();
    let mut cur_b = iter_b.next();
    let mut differences = 0u64;

    loop {
        let state = match (&cur_a, &cur_b) {
            (Some(item_a), Some(item_b)) => classify(key_cmp(item_a, item_b), || {
                attr_cmp(item_a, item_b)
            }),
            (Some(_), None) => DiffState::Delete,
            (None, Some(_)) => DiffState::New,
            (None, None) => break,
        };

        if state.is_difference() {
            differences += 1;
        }

        match state {
            DiffState::Delete => on_compared(state, cur_a.as_ref(), None),
            DiffState::New => on_compared(state, None, cur_b.as_ref()),
            DiffState::Modify => on_compared(state, cur_a.as_ref(), cur_b.as_ref()),
            DiffState::SameSame if options.report_same => {
                on_compared(state, cur_a.as_ref(), cur_b.as_ref())
            }
            DiffState::SameSame => {}
        }

        if state.consumes_target() {
            cur_a = advance(&mut iter_a, cur_a.take(), &key_cmp, options.check_order, MergeSide::A)?;
        }
        if state.consumes_source() {
            cur_b = advance(&mut iter_b, cur_b.take(), &key_cmp, options.check_order, MergeSide::B)?;
        }
    }

    Ok(differences)
}

fn classify(key_order: Ordering, attr_order: impl FnOnce() -> Ordering) -> DiffState {
    match key_order {
        Ordering::Less => DiffState::Delete,
        Ordering::Greater => DiffState::New,
        Ordering::Equal => match attr_order() {
            Ordering::Equal => DiffState::SameSame,
            _ => DiffState::Modify,
        },
    }
}

fn advance<T, I, K>(
    iter: &mut I,
    previous: Option<T>,
    key_cmp: &K,
    check_order: bool,
    side: MergeSide,
) -> Result<Option<T>, CompareError>
where
    T: Debug,
    I: Iterator<Item = T>,
    K: Fn(&T, &T) -> Ordering,
{
    let next = iter.next();
    if check_order {
        if let (Some(prev), Some(curr)) = (&previous, &next) {
            if key_cmp(prev, curr) == Ordering::Greater {
                return Err(CompareError::SortOrder {
                    side,
                    previous: format!("{prev:?}"),
                    current: format!("{curr:?}"),
                });
            }
        }
    }
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{DirEntry, FileTime};
    use crate::order::{EntryOrder, compare_attributes, ignore_attributes};

    fn run(a: &[i32], b: &[i32], report_same: bool) -> (u64, Vec<(DiffState, Option<i32>, Option<i32>)>) {
        let mut events = Vec::new();
        let count = merge_sorted(
            a.iter().copied(),
            b.iter().copied(),
            |x, y| x.cmp(y),
            ignore_attributes,
            MergeOptions::default().report_same(report_same),
            |state, x, y| events.push((state, x.copied(), y.copied())),
        )
        .unwrap();
        (count, events)
    }

    #[test]
    fn test_self_diff_has_no_differences() {
        let (count, events) = run(&[1, 2, 3], &[1, 2, 3], false);
        assert_eq!(count, 0);
        assert!(events.is_empty());
    }

    #[test]
    fn test_report_same() {
        let (count, events) = run(&[1, 2], &[1, 2], true);
        assert_eq!(count, 0);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|(s, _, _)| *s == DiffState::SameSame));
    }

    #[test]
    fn test_against_empty() {
        let (count, events) = run(&[1, 2, 3], &[], false);
        assert_eq!(count, 3);
        assert!(events.iter().all(|(s, a, b)| *s == DiffState::Delete && a.is_some() && b.is_none()));

        let (count, events) = run(&[], &[4, 5], false);
        assert_eq!(count, 2);
        assert!(events.iter().all(|(s, a, b)| *s == DiffState::New && a.is_none() && b.is_some()));
    }

    #[test]
    fn test_interleaved() {
        let (count, events) = run(&[1, 3, 5], &[2, 3, 6], false);
        assert_eq!(count, 4);
        assert_eq!(
            events,
            vec![
                (DiffState::Delete, Some(1), None),
                (DiffState::New, None, Some(2)),
                (DiffState::Delete, Some(5), None),
                (DiffState::New, None, Some(6)),
            ]
        );
    }

    #[test]
    fn test_unsorted_input_fails() {
        let result = merge_sorted(
            vec![1, 3, 2],
            vec![1, 2, 3],
            |x: &i32, y: &i32| x.cmp(y),
            ignore_attributes,
            MergeOptions::default(),
            |_, _, _| {},
        );
        match result {
            Err(CompareError::SortOrder { side, previous, current }) => {
                assert_eq!(side, MergeSide::A);
                assert_eq!(previous, "3");
                assert_eq!(current, "2");
            }
            other => panic!("expected sort order error, got {other:?}"),
        }
    }

    #[test]
    fn test_unsorted_input_without_check() {
        let result = merge_sorted(
            vec![3, 1],
            vec![],
            |x: &i32, y: &i32| x.cmp(y),
            ignore_attributes,
            MergeOptions::default().check_order(false),
            |_, _, _| {},
        );
        assert_eq!(result.unwrap(), 2);
    }

    #[test]
    fn test_modify_vs_same() {
        let t = FileTime::from_ticks(100);
        let a = vec![DirEntry::file("a", 1, t), DirEntry::file("b", 2, t)];
        let b = vec![DirEntry::file("a", 1, t), DirEntry::file("b", 3, t)];
        let order = EntryOrder::default();
        let mut states = Vec::new();
        let count = merge_sorted(
            a,
            b,
            |x, y| order.compare(x, y),
            compare_attributes,
            MergeOptions::default().report_same(true),
            |state, x, _| states.push((state, x.map(|e| e.name.to_string()))),
        )
        .unwrap();
        assert_eq!(count, 1);
        assert_eq!(
            states,
            vec![
                (DiffState::SameSame, Some("a".to_string())),
                (DiffState::Modify, Some("b".to_string())),
            ]
        );
    }

    #[test]
    fn test_directory_and_file_with_same_name() {
        let t = FileTime::from_ticks(100);
        let target = vec![DirEntry::directory("x", t)];
        let source = vec![DirEntry::file("x", 7, t)];
        let order = EntryOrder::default();
        let mut events = Vec::new();
        let count = merge_sorted(
            target,
            source,
            |x, y| order.compare(x, y),
            compare_attributes,
            MergeOptions::default().report_same(true),
            |state, a, b| events.push((state, a.map(DirEntry::is_dir), b.map(DirEntry::is_dir))),
        )
        .unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            events,
            vec![
                (DiffState::New, None, Some(false)),
                (DiffState::Delete, Some(true), None),
            ]
        );
    }
}
