use super::{join_segments, FilePattern, SourceRepo};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// In-memory repository used by tests and dry runs
pub struct MemorySourceRepo {
    files: RwLock<BTreeMap<String, String>>,
    root: PathBuf,
}

impl MemorySourceRepo {
    pub fn new() -> Self {
        Self::with_root(PathBuf::from("/mock"))
    }

    pub fn with_root(root: PathBuf) -> Self {
        Self {
            files: RwLock::new(BTreeMap::new()),
            root,
        }
    }

    pub fn add_file(&self, path: &str, content: &str) {
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        files.insert(join_segments(&[path]), content.to_string());
    }

    /// Builder-style variant of [`add_file`](Self::add_file)
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.add_file(path, content);
        self
    }
}

impl Default for MemorySourceRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceRepo for MemorySourceRepo {
    fn root_path(&self) -> &Path {
        &self.root
    }

    fn file_exists(&self, segments: &[&str]) -> bool {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files.contains_key(&join_segments(segments))
    }

    fn read_file(&self, segments: &[&str]) -> io::Result<String> {
        let path = join_segments(segments);
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files.get(&path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("File not found: {}", path))
        })
    }

    fn enumerate_files(&self, pattern: &str, recursive: bool, subdir: Option<&str>) -> Vec<String> {
        let Some(pattern) = FilePattern::new(pattern) else {
            return Vec::new();
        };
        let prefix = subdir
            .map(|dir| join_segments(&[dir]))
            .filter(|dir| !dir.is_empty())
            .map(|dir| format!("{}/", dir))
            .unwrap_or_default();

        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files
            .keys()
            .filter(|path| {
                path.strip_prefix(prefix.as_str())
                    .is_some_and(|rest| recursive || !rest.contains('/'))
            })
            .filter(|path| pattern.matches(path))
            .cloned()
            .collect()
    }
}
