//! Categorized output files.
//!
//! One tab-separated text file per [`Category`] in an output directory.
//! File lines are `size\tcreated\tmodified\taccessed\tpath`, directory lines
//! carry only the path. Paths are relative to the compared roots.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::Local;
use itertools::Itertools;
use strum::IntoEnumIterator;
use tracing::debug;

use cmptree_core::{CompareError, DirEntry, FileTime};

use crate::moves::MoveReport;
use crate::sink::{Category, DiffSink};

/// Timestamp format of the output files.
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const MOVED_FILE: &str = "moved.txt";
pub const MOVED_ERROR_FILE: &str = "movedError.txt";

type Output = Mutex<BufWriter<File>>;

/// Writes categorized entries to text files.
#[derive(Debug)]
pub struct DiffWriter {
    dir: PathBuf,
    outputs: HashMap<Category, Output>,
}

impl DiffWriter {
    /// Create the output directory and truncate one file per category.
    /// `same.txt` is only created when `report_same` is set.
    pub fn create(dir: impl Into<PathBuf>, report_same: bool) -> Result<Self, CompareError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| CompareError::io(&dir, e))?;

        let mut outputs = HashMap::new();
        for category in Category::iter().filter(|c| report_same || *c != Category::Same) {
            let path = dir.join(category.file_name());
            let file = File::create(&path).map_err(|e| CompareError::io(&path, e))?;
            outputs.insert(category, Mutex::new(BufWriter::new(file)));
        }

        debug!(dir = %dir.display(), files = outputs.len(), "Created output files");
        Ok(Self { dir, outputs })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file for `category`.
    pub fn path(&self, category: Category) -> PathBuf {
        self.dir.join(category.file_name())
    }

    /// Flush every category file.
    pub fn flush(&self) -> Result<(), CompareError> {
        for (category, output) in &self.outputs {
            output
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .flush()
                .map_err(|e| CompareError::io(self.path(*category), e))?;
        }
        Ok(())
    }

    /// Write `moved.txt` and `movedError.txt`.
    pub fn write_moves(&self, report: &MoveReport) -> Result<(), CompareError> {
        let path = self.dir.join(MOVED_FILE);
        write_lines(
            &path,
            report
                .moves
                .iter()
                .map(|m| format!("{}\t{}\t{}", m.name, m.from.display(), m.to.display())),
        )?;

        let path = self.dir.join(MOVED_ERROR_FILE);
        write_lines(
            &path,
            report.ambiguous.iter().flat_map(|a| {
                [("new", &a.new_dirs), ("deleted", &a.deleted_dirs)]
                    .into_iter()
                    .filter(|(_, dirs)| dirs.len() > 1)
                    .map(|(side, dirs)| {
                        format!(
                            "{side}\t{}\t{}\t{}",
                            a.name,
                            a.size,
                            dirs.iter().map(|d| d.display()).join(", ")
                        )
                    })
                    .collect::<Vec<_>>()
            }),
        )
    }
}

impl DiffSink for DiffWriter {
    fn record(&self, category: Category, base_dir: &Path, entry: &DirEntry) -> io::Result<()> {
        let Some(output) = self.outputs.get(&category) else {
            return Ok(());
        };
        let line = format_line(category, base_dir, entry);
        let mut output = output.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(output, "{line}")
    }
}

/// Render one output line.
pub fn format_line(category: Category, base_dir: &Path, entry: &DirEntry) -> String {
    let path = base_dir.join(entry.name.as_str());
    if category.is_dirs() {
        return path.display().to_string();
    }
    format!(
        "{}\t{}\t{}\t{}\t{}",
        entry.size,
        format_time(entry.created),
        format_time(entry.modified),
        format_time(entry.accessed),
        path.display()
    )
}

/// Local time, or `error` for timestamps chrono cannot represent.
pub fn format_time(time: FileTime) -> String {
    time.to_datetime()
        .map(|dt| dt.with_timezone(&Local).format(TIME_FORMAT).to_string())
        .unwrap_or_else(|| "error".to_string())
}

fn write_lines(path: &Path, lines: impl Iterator<Item = String>) -> Result<(), CompareError> {
    let file = File::create(path).map_err(|e| CompareError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    for line in lines {
        writeln!(writer, "{line}").map_err(|e| CompareError::io(path, e))?;
    }
    writer.flush().map_err(|e| CompareError::io(path, e))
}
