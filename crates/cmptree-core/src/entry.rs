//! Directory entry records.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Number of 100ns ticks between 1601-01-01 and 1970-01-01.
const UNIX_EPOCH_TICKS: u64 = 116_444_736_000_000_000;

/// Ticks per second (one tick is 100 nanoseconds).
const TICKS_PER_SECOND: u64 = 10_000_000;

/// File attribute bits, using the values of the native Windows flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileAttributes(pub u32);

impl FileAttributes {
    pub const READONLY: u32 = 0x0001;
    pub const HIDDEN: u32 = 0x0002;
    pub const SYSTEM: u32 = 0x0004;
    pub const DIRECTORY: u32 = 0x0010;
    pub const ARCHIVE: u32 = 0x0020;
    pub const NORMAL: u32 = 0x0080;
    pub const REPARSE_POINT: u32 = 0x0400;

    /// Create attributes from raw bits.
    pub fn new(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw attribute bits.
    pub fn bits(&self) -> u32 {
        self.0
    }

    /// Check whether all bits of `flag` are set.
    pub fn contains(&self, flag: u32) -> bool {
        self.0 & flag == flag
    }

    /// Return a copy with `flag` set.
    pub fn with(self, flag: u32) -> Self {
        Self(self.0 | flag)
    }

    pub fn is_directory(&self) -> bool {
        self.contains(Self::DIRECTORY)
    }

    /// Symlinks, junctions and other filesystem redirections.
    pub fn is_reparse_point(&self) -> bool {
        self.contains(Self::REPARSE_POINT)
    }

    pub fn is_hidden(&self) -> bool {
        self.contains(Self::HIDDEN)
    }
}

/// A timestamp in 100ns ticks since 1601-01-01 UTC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileTime(pub u64);

impl FileTime {
    /// Create a file time from raw ticks.
    pub fn from_ticks(ticks: u64) -> Self {
        Self(ticks)
    }

    /// Assemble a file time from the high and low halves the native API hands out.
    pub fn from_parts(high: u32, low: u32) -> Self {
        Self(join_halves(high, low))
    }

    /// Convert a [`SystemTime`], saturating at the representable range.
    pub fn from_system_time(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(after) => Self(UNIX_EPOCH_TICKS.saturating_add(duration_to_ticks(after))),
            Err(err) => Self(UNIX_EPOCH_TICKS.saturating_sub(duration_to_ticks(err.duration()))),
        }
    }

    /// Raw ticks.
    pub fn ticks(&self) -> u64 {
        self.0
    }

    pub fn to_system_time(&self) -> SystemTime {
        if self.0 >= UNIX_EPOCH_TICKS {
            UNIX_EPOCH + ticks_to_duration(self.0 - UNIX_EPOCH_TICKS)
        } else {
            UNIX_EPOCH - ticks_to_duration(UNIX_EPOCH_TICKS - self.0)
        }
    }

    /// Convert to a UTC date, `None` when out of chrono's range.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let relative = self.0 as i128 - UNIX_EPOCH_TICKS as i128;
        let secs = relative.div_euclid(TICKS_PER_SECOND as i128);
        let nanos = relative.rem_euclid(TICKS_PER_SECOND as i128) * 100;
        DateTime::from_timestamp(i64::try_from(secs).ok()?, nanos as u32)
    }
}

fn duration_to_ticks(d: Duration) -> u64 {
    let ticks = d.as_nanos() / 100;
    u64::try_from(ticks).unwrap_or(u64::MAX)
}

fn ticks_to_duration(ticks: u64) -> Duration {
    Duration::new(
        ticks / TICKS_PER_SECOND,
        ((ticks % TICKS_PER_SECOND) * 100) as u32,
    )
}

/// Join two 32-bit halves into a 64-bit value.
pub fn join_halves(high: u32, low: u32) -> u64 {
    (u64::from(high) << 32) | u64::from(low)
}

/// Coarse kind of an entry. Files order before directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    File,
    Directory,
}

/// One record of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Entry name (not a path).
    pub name: CompactString,
    /// Attribute flags.
    pub attributes: FileAttributes,
    /// Creation time.
    pub created: FileTime,
    /// Last access time.
    pub accessed: FileTime,
    /// Last write time.
    pub modified: FileTime,
    /// Size in bytes, 0 for directories.
    pub size: u64,
}

impl DirEntry {
    /// Create a file entry with the given size and last write time.
    pub fn file(name: impl Into<CompactString>, size: u64, modified: FileTime) -> Self {
        Self {
            name: name.into(),
            attributes: FileAttributes::new(FileAttributes::ARCHIVE),
            created: modified,
            accessed: modified,
            modified,
            size,
        }
    }

    /// Create a directory entry.
    pub fn directory(name: impl Into<CompactString>, modified: FileTime) -> Self {
        Self {
            name: name.into(),
            attributes: FileAttributes::new(FileAttributes::DIRECTORY),
            created: modified,
            accessed: modified,
            modified,
            size: 0,
        }
    }

    /// Set the attribute flags.
    pub fn with_attributes(mut self, attributes: FileAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Set the size from its high and low halves.
    pub fn with_size_parts(mut self, high: u32, low: u32) -> Self {
        self.size = join_halves(high, low);
        self
    }

    pub fn is_dir(&self) -> bool {
        self.attributes.is_directory()
    }

    pub fn is_reparse_point(&self) -> bool {
        self.attributes.is_reparse_point()
    }

    pub fn kind(&self) -> EntryKind {
        if self.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        }
    }

    /// Identity used for move detection.
    pub fn move_key(&self) -> MoveKey {
        MoveKey {
            name: self.name.clone(),
            size: self.size,
            modified: self.modified,
        }
    }
}

impl fmt::Display for DirEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Move-detection identity of a file: name, size and last write time.
///
/// Ordered by name (ordinal), then size, then last write time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MoveKey {
    pub name: CompactString,
    pub size: u64,
    pub modified: FileTime,
}

impl fmt::Display for MoveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} bytes, {})", self.name, self.size, self.modified.ticks())
    }
}

/// `.` and `..` are never reported.
pub fn is_dot_or_dotdot(name: &str) -> bool {
    name == "." || name == ".."
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_from_halves() {
        let entry = DirEntry::file("big.bin", 0, FileTime::default()).with_size_parts(1, 5);
        assert_eq!(entry.size, (1u64 << 32) + 5);
    }

    #[test]
    fn test_filetime_unix_epoch() {
        let ft = FileTime::from_system_time(UNIX_EPOCH);
        assert_eq!(ft.ticks(), UNIX_EPOCH_TICKS);
        assert_eq!(ft.to_system_time(), UNIX_EPOCH);
        assert_eq!(ft.to_datetime().map(|d| d.timestamp()), Some(0));
    }

    #[test]
    fn test_filetime_roundtrip_precision() {
        let time = UNIX_EPOCH + Duration::new(1_600_000_000, 123_456_700);
        assert_eq!(FileTime::from_system_time(time).to_system_time(), time);
    }

    #[test]
    fn test_filetime_before_unix_epoch() {
        let time = UNIX_EPOCH - Duration::from_secs(86_400);
        let ft = FileTime::from_system_time(time);
        assert!(ft.ticks() < UNIX_EPOCH_TICKS);
        assert_eq!(ft.to_datetime().map(|d| d.timestamp()), Some(-86_400));
    }

    #[test]
    fn test_attributes() {
        let attrs = FileAttributes::new(FileAttributes::DIRECTORY).with(FileAttributes::REPARSE_POINT);
        assert!(attrs.is_directory());
        assert!(attrs.is_reparse_point());
        assert!(!attrs.is_hidden());
    }

    #[test]
    fn test_kind_order() {
        assert!(EntryKind::File < EntryKind::Directory);
    }

    #[test]
    fn test_dot_entries() {
        assert!(is_dot_or_dotdot("."));
        assert!(is_dot_or_dotdot(".."));
        assert!(!is_dot_or_dotdot(".git"));
    }
}
