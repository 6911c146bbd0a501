//! Directory listing.

use std::fs;
use std::io;
use std::path::Path;

use cmptree_core::{DirEntry, ErrorHandler, FileAttributes, FileTime, NameOrder, WalkWarning, is_dot_or_dotdot};

/// Lazy sequence of directory entries.
pub type Entries<'a> = Box<dyn Iterator<Item = DirEntry> + 'a>;

/// Produces the entries of one directory.
///
/// Implementations report failures through `errors` and yield what they
/// could read; a missing directory is an empty listing and not an error.
/// A listing is always read to its end, cancellation is handled between
/// directories by the walker.
pub trait DirEnumerator: Send + Sync {
    fn enumerate<'a>(&'a self, dir: &'a Path, errors: &'a dyn ErrorHandler) -> Entries<'a>;

    /// Whether listings already come back sorted by `order` (files before
    /// directories on equal names). Unsorted listings are sorted by the walker.
    fn is_sorted(&self, _order: NameOrder) -> bool {
        false
    }
}

/// Enumerator over the local filesystem using [`std::fs::read_dir`].
///
/// `read_dir` makes no ordering promise, so listings are reported unsorted.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsEnumerator;

impl FsEnumerator {
    pub fn new() -> Self {
        Self
    }
}

impl DirEnumerator for FsEnumerator {
    fn enumerate<'a>(&'a self, dir: &'a Path, errors: &'a dyn ErrorHandler) -> Entries<'a> {
        let read_dir = match fs::read_dir(dir) {
            Ok(read_dir) => read_dir,
            Err(err) if is_missing(&err) => return Box::new(std::iter::empty()),
            Err(err) => {
                errors.on_error(&WalkWarning::read_error(dir, &err));
                return Box::new(std::iter::empty());
            }
        };

        let entries = read_dir.filter_map(move |item| {
            let item = match item {
                Ok(item) => item,
                Err(err) => {
                    errors.on_error(&WalkWarning::read_error(dir, &err));
                    return None;
                }
            };
            let name = item.file_name().to_string_lossy().into_owned();
            if is_dot_or_dotdot(&name) {
                return None;
            }
            match item.metadata() {
                Ok(metadata) => Some(to_entry(name, &item.path(), &metadata)),
                Err(err) if is_missing(&err) => None,
                Err(err) => {
                    errors.on_error(&WalkWarning::metadata_error(item.path(), &err));
                    None
                }
            }
        });

        Box::new(entries)
    }
}

/// Errors that mean "nothing to list here".
///
/// A directory that vanished mid-walk, or a path that is a file on this
/// side while it is a directory on the other.
fn is_missing(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory)
}

/// Build an entry from `symlink_metadata`-style metadata.
fn to_entry(name: String, path: &Path, metadata: &fs::Metadata) -> DirEntry {
    let mut attributes = native_attributes(&name, metadata);

    if metadata.file_type().is_symlink() {
        attributes = attributes.with(FileAttributes::REPARSE_POINT);
        if fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false) {
            attributes = attributes.with(FileAttributes::DIRECTORY);
        }
    } else if metadata.is_dir() {
        attributes = attributes.with(FileAttributes::DIRECTORY);
    }

    let modified = metadata
        .modified()
        .map(FileTime::from_system_time)
        .unwrap_or_default();

    DirEntry {
        name: name.into(),
        size: if attributes.is_directory() { 0 } else { metadata.len() },
        created: metadata.created().map(FileTime::from_system_time).unwrap_or(modified),
        accessed: metadata.accessed().map(FileTime::from_system_time).unwrap_or(modified),
        modified,
        attributes,
    }
}

#[cfg(windows)]
fn native_attributes(_name: &str, metadata: &fs::Metadata) -> FileAttributes {
    use std::os::windows::fs::MetadataExt;
    FileAttributes::new(metadata.file_attributes())
}

#[cfg(not(windows))]
fn native_attributes(name: &str, metadata: &fs::Metadata) -> FileAttributes {
    let mut attributes = FileAttributes::default();
    if name.starts_with('.') {
        attributes = attributes.with(FileAttributes::HIDDEN);
    }
    if metadata.permissions().readonly() {
        attributes = attributes.with(FileAttributes::READONLY);
    }
    if metadata.is_file() {
        attributes = attributes.with(FileAttributes::ARCHIVE);
    }
    attributes
}
