//! Ordering rules used to merge directory listings.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::entry::DirEntry;

/// How entry names are compared and sorted.
///
/// The merge only works when listings are sorted with the same rule the
/// differ compares with, so this is a single setting for both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
pub enum NameOrder {
    /// Code point order, case-sensitive.
    #[default]
    Ordinal,
    /// Code point order after upper-casing both names.
    OrdinalIgnoreCase,
}

impl NameOrder {
    /// Compare two names.
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match self {
            NameOrder::Ordinal => a.cmp(b),
            NameOrder::OrdinalIgnoreCase => a
                .chars()
                .flat_map(char::to_uppercase)
                .cmp(b.chars().flat_map(char::to_uppercase)),
        }
    }
}

/// Key order of directory entries: by name, and for equal names a file
/// sorts before a directory.
///
/// A file and a directory with the same name are therefore never equal, so
/// the differ reports one DELETE and one NEW instead of merging them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryOrder {
    names: NameOrder,
}

impl EntryOrder {
    pub fn new(names: NameOrder) -> Self {
        Self { names }
    }

    pub fn name_order(&self) -> NameOrder {
        self.names
    }

    pub fn compare(&self, a: &DirEntry, b: &DirEntry) -> Ordering {
        self.names
            .compare(&a.name, &b.name)
            .then_with(|| a.kind().cmp(&b.kind()))
    }

    /// Sort a listing in place.
    pub fn sort(&self, entries: &mut [DirEntry]) {
        entries.sort_by(|a, b| self.compare(a, b));
    }
}

/// Attribute comparison for entries with equal keys.
///
/// Two directories are always equal. Files compare by size, then by last
/// write time.
pub fn compare_attributes(a: &DirEntry, b: &DirEntry) -> Ordering {
    if a.is_dir() && b.is_dir() {
        return Ordering::Equal;
    }
    a.size
        .cmp(&b.size)
        .then_with(|| a.modified.cmp(&b.modified))
}

/// Attribute comparison that treats every key match as unchanged.
pub fn ignore_attributes<T>(_: &T, _: &T) -> Ordering {
    Ordering::Equal
}
