//! Comparison configuration types.

use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::order::NameOrder;

/// Configuration of a tree comparison.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct CompareConfig {
    /// Source root; entries only here are NEW.
    pub source: PathBuf,

    /// Target root; entries only here are DELETE.
    pub target: PathBuf,

    /// Maximum depth to descend (None = unlimited, 0 = roots only).
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Descend into reparse points (symlinks, junctions).
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_junctions: bool,

    /// Number of worker threads (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Sort source listings before merging.
    #[builder(default = "false")]
    #[serde(default)]
    pub force_sort_source: bool,

    /// Sort target listings before merging.
    #[builder(default = "false")]
    #[serde(default)]
    pub force_sort_target: bool,

    /// Forward unchanged (SAMESAME) pairs to the diff handler.
    #[builder(default = "false")]
    #[serde(default)]
    pub report_same: bool,

    /// Forward pairs that caused a descent into a sub-directory.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub report_recursed: bool,

    /// Name comparison and sort rule.
    #[builder(default)]
    #[serde(default)]
    pub name_order: NameOrder,
}

fn default_true() -> bool {
    true
}

impl CompareConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        for (label, root) in [("Source", &self.source), ("Target", &self.target)] {
            match root {
                Some(path) if path.as_os_str().is_empty() => {
                    return Err(format!("{label} path cannot be empty"));
                }
                Some(_) => {}
                None => return Err(format!("{label} path is required")),
            }
        }
        Ok(())
    }
}

impl CompareConfig {
    /// Create a new config builder.
    pub fn builder() -> CompareConfigBuilder {
        CompareConfigBuilder::default()
    }

    /// Create a simple config comparing `source` against `target`.
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            max_depth: None,
            follow_junctions: false,
            threads: 0,
            force_sort_source: false,
            force_sort_target: false,
            report_same: false,
            report_recursed: true,
            name_order: NameOrder::Ordinal,
        }
    }

    /// Translate the command line convention (-1 = unlimited) into a depth limit.
    pub fn depth_limit(depth: i32) -> Option<u32> {
        u32::try_from(depth).ok()
    }

    /// Whether a directory found at `depth` may be entered.
    pub fn may_descend(&self, depth: u32) -> bool {
        self.max_depth.is_none_or(|max| depth < max)
    }

    /// Join a path relative to the roots onto `root`.
    pub fn resolve(root: &Path, relative: &Path) -> PathBuf {
        if relative.as_os_str().is_empty() {
            root.to_path_buf()
        } else {
            root.join(relative)
        }
    }
}
