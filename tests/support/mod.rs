//! Shared fixtures for integration tests
//!
//! A [`Workspace`] is a temporary directory holding a source tree, a
//! pre-installed platforms root and a dynamic install root. [`FakeStorage`]
//! serves SDK storage listings from memory and counts requests.

#![allow(dead_code)]

use buildsmith::provider::{
    DirectoryExternalSource, ListingTransport, SdkStorageVersionProvider, TransportError,
};
use buildsmith::{BuildOptions, BuildOrchestrator, PlatformRegistry};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

pub const STORAGE_URL: &str = "https://sdks.test";

#[derive(Default)]
pub struct FakeStorage {
    responses: HashMap<String, String>,
    calls: AtomicUsize,
}

impl FakeStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves a JSON listing for `platform`
    pub fn with_listing(mut self, platform: &str, versions: &[&str], default: &str) -> Self {
        let body = serde_json::json!({
            "versions": versions,
            "defaultVersion": default,
        });
        self.responses.insert(
            SdkStorageVersionProvider::listing_url(STORAGE_URL, platform),
            body.to_string(),
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ListingTransport for FakeStorage {
    fn get_text(&self, url: &str) -> Result<String, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| TransportError::Request {
                url: url.to_string(),
                details: "connection refused".to_string(),
            })
    }
}

pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir_all(dir.path().join("src")).expect("Failed to create source dir");
        Self { dir }
    }

    pub fn source(&self) -> PathBuf {
        self.dir.path().join("src")
    }

    pub fn platforms_root(&self) -> PathBuf {
        self.dir.path().join("platforms")
    }

    pub fn dynamic_root(&self) -> PathBuf {
        self.dir.path().join("dynamic")
    }

    /// Writes a file into the source tree, creating parent directories
    pub fn write(&self, relative: &str, content: &str) -> &Self {
        let path = self.source().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, content).expect("Failed to write source file");
        self
    }

    /// Marks a platform version as pre-installed
    pub fn install(&self, install_dir: &str, version: &str) -> &Self {
        fs::create_dir_all(self.platforms_root().join(install_dir).join(version))
            .expect("Failed to create install dir");
        self
    }

    /// Options rooted in this workspace, with the given settings on top
    pub fn options(&self, settings: &[(&str, &str)]) -> BuildOptions {
        let mut pairs: Vec<(String, String)> = vec![
            ("PLATFORMS_ROOT".into(), path_string(&self.platforms_root())),
            ("DYNAMIC_INSTALL_ROOT".into(), path_string(&self.dynamic_root())),
            ("EXTERNAL_SDK_DIR".into(), path_string(&self.dir.path().join("external"))),
            ("SDK_STORAGE_BASE_URL".into(), STORAGE_URL.into()),
        ];
        pairs.extend(settings.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        BuildOptions::from_pairs(pairs).expect("Invalid test options")
    }

    pub fn orchestrator(&self, options: BuildOptions, storage: Arc<FakeStorage>) -> BuildOrchestrator {
        let registry = registry(&options, storage, &self.dir.path().join("external"));
        BuildOrchestrator::new(registry, options)
    }
}

pub fn registry(options: &BuildOptions, storage: Arc<FakeStorage>, external_dir: &Path) -> PlatformRegistry {
    PlatformRegistry::with_sources(
        options,
        storage,
        Arc::new(DirectoryExternalSource::new(external_dir)),
    )
}

fn path_string(path: &Path) -> String {
    path.display().to_string()
}
