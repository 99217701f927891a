use super::{join_segments, FilePattern, SourceRepo};
use ignore::WalkBuilder;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Repository view over a directory on disk
#[derive(Debug, Clone)]
pub struct LocalSourceRepo {
    root: PathBuf,
}

impl LocalSourceRepo {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, segments: &[&str]) -> PathBuf {
        let relative = join_segments(segments);
        if relative.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative)
        }
    }
}

impl SourceRepo for LocalSourceRepo {
    fn root_path(&self) -> &Path {
        &self.root
    }

    fn file_exists(&self, segments: &[&str]) -> bool {
        self.resolve(segments).is_file()
    }

    fn read_file(&self, segments: &[&str]) -> io::Result<String> {
        fs::read_to_string(self.resolve(segments))
    }

    fn enumerate_files(&self, pattern: &str, recursive: bool, subdir: Option<&str>) -> Vec<String> {
        let Some(pattern) = FilePattern::new(pattern) else {
            return Vec::new();
        };

        let start = match subdir {
            Some(dir) => self.resolve(&[dir]),
            None => self.root.clone(),
        };
        if !start.is_dir() {
            return Vec::new();
        }

        let mut walker = WalkBuilder::new(&start);
        walker
            .standard_filters(false)
            .max_depth(if recursive { None } else { Some(1) })
            .filter_entry(|entry| entry.file_name() != ".git");

        let mut files: Vec<String> = walker
            .build()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!(error = %e, "Skipping unreadable entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
            .filter_map(|entry| {
                let relative = entry.path().strip_prefix(&self.root).ok()?;
                let relative = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                pattern.matches(&relative).then_some(relative)
            })
            .collect();

        files.sort();
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("app.py"), "print('hi')").unwrap();
        fs::create_dir_all(dir.path().join("pkg/inner")).unwrap();
        fs::write(dir.path().join("pkg/util.py"), "").unwrap();
        fs::write(dir.path().join("pkg/inner/deep.py"), "").unwrap();
        fs::write(dir.path().join("pkg/readme.md"), "").unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/hook.py"), "").unwrap();
        dir
    }

    #[test]
    fn test_file_exists_and_read() {
        let dir = fixture();
        let repo = LocalSourceRepo::new(dir.path());
        assert!(repo.file_exists(&["app.py"]));
        assert!(repo.file_exists(&["pkg", "util.py"]));
        assert!(!repo.file_exists(&["pkg"]));
        assert!(!repo.file_exists(&["missing.txt"]));
        assert_eq!(repo.read_file(&["app.py"]).unwrap(), "print('hi')");
        assert!(repo.read_file(&["missing.txt"]).is_err());
    }

    #[test]
    fn test_enumerate_recursive_skips_git() {
        let dir = fixture();
        let repo = LocalSourceRepo::new(dir.path());
        assert_eq!(
            repo.enumerate_files("*.py", true, None),
            vec!["app.py", "pkg/inner/deep.py", "pkg/util.py"]
        );
    }

    #[test]
    fn test_enumerate_top_level_only() {
        let dir = fixture();
        let repo = LocalSourceRepo::new(dir.path());
        assert_eq!(repo.enumerate_files("*.py", false, None), vec!["app.py"]);
        assert_eq!(
            repo.enumerate_files("*.py", false, Some("pkg")),
            vec!["pkg/util.py"]
        );
    }

    #[test]
    fn test_enumerate_missing_subdir() {
        let dir = fixture();
        let repo = LocalSourceRepo::new(dir.path());
        assert!(repo.enumerate_files("*", true, Some("nope")).is_empty());
    }
}
