//! Read-only view of the source repository being built
//!
//! Detectors only ever see a repository through [`SourceRepo`]. Paths are given
//! as relative segments and always use `/` separators in results, so detection
//! behaves the same on a real checkout ([`LocalSourceRepo`]) and in memory
//! ([`MemorySourceRepo`]).

mod local;
mod memory;

pub use local::LocalSourceRepo;
pub use memory::MemorySourceRepo;

use ignore::overrides::{Override, OverrideBuilder};
use std::io;
use std::path::Path;
use tracing::warn;

pub trait SourceRepo: Send + Sync {
    /// Root directory of the repository
    fn root_path(&self) -> &Path;

    /// True when the file at the joined relative segments exists
    fn file_exists(&self, segments: &[&str]) -> bool;

    /// Reads the file at the joined relative segments
    fn read_file(&self, segments: &[&str]) -> io::Result<String>;

    /// Lists files whose name matches a glob `pattern`, relative to the root, sorted
    ///
    /// With `recursive` false only the direct children of `subdir` (or the root)
    /// are considered.
    fn enumerate_files(&self, pattern: &str, recursive: bool, subdir: Option<&str>) -> Vec<String>;
}

/// Joins relative segments into one `/` separated relative path
pub fn join_segments(segments: &[&str]) -> String {
    segments
        .iter()
        .flat_map(|s| s.split(&['/', '\\'][..]))
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Parent directory of a relative path, or "" for top-level files
pub fn parent_dir(relative: &str) -> &str {
    relative.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Glob matcher with gitignore semantics, shared by both repository views
pub(crate) struct FilePattern {
    matcher: Override,
}

impl FilePattern {
    pub(crate) fn new(pattern: &str) -> Option<Self> {
        let mut builder = OverrideBuilder::new("/");
        let built = builder.add(pattern).and_then(|b| b.build());
        match built {
            Ok(matcher) => Some(Self { matcher }),
            Err(e) => {
                warn!(pattern, error = %e, "Ignoring invalid file pattern");
                None
            }
        }
    }

    pub(crate) fn matches(&self, relative: &str) -> bool {
        self.matcher.matched(relative, false).is_whitelist()
    }
}
