//! End-to-end planning tests against real directories
//!
//! Every test builds a temporary source tree and platforms root, then runs the
//! orchestrator with an in-memory SDK storage.

mod support;

use buildsmith::manifest::{OPERATION_ID_KEY, PLATFORM_NAME_KEY, PLATFORM_VERSION_KEY, SOURCE_REVISION_KEY};
use buildsmith::{
    BuildContext, BuildError, BuildPhase, ErrorKind, LocalSourceRepo, VersionSource,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use support::{FakeStorage, Workspace};

fn context(ws: &Workspace) -> BuildContext {
    let mut context = BuildContext::new(ws.source());
    context.operation_id = "op-1".to_string();
    context.revision = "abc123".to_string();
    context
}

fn python_workspace() -> Workspace {
    let ws = Workspace::new();
    ws.write("requirements.txt", "flask==2.3.2\n")
        .write("app.py", "print('hello')\n")
        .install("python", "3.10.12")
        .install("python", "3.11.4");
    ws
}

#[test]
fn test_single_platform_plan() {
    let ws = python_workspace();
    let orchestrator = ws.orchestrator(ws.options(&[]), Arc::new(FakeStorage::new()));

    let plan = orchestrator
        .plan(&LocalSourceRepo::new(ws.source()), &context(&ws))
        .unwrap();

    assert_eq!(orchestrator.phase(), BuildPhase::Done);
    assert_eq!(plan.platforms.len(), 1);
    assert_eq!(plan.platforms[0].name, "python");
    assert_eq!(plan.platforms[0].version, "3.11.4");
    assert_eq!(plan.platforms[0].source, VersionSource::ProviderDefault);
    assert!(!plan.platforms[0].installs_sdk);

    assert!(plan.script.starts_with("#!/usr/bin/env bash\nset -euo pipefail\n"));
    assert!(plan.script.contains("python3.11 -m venv --copies pythonenv3.11"));
    assert!(plan.script.contains("-r requirements.txt"));
    assert!(!plan.script.contains("--platform-version"));

    assert_eq!(plan.manifest.get(PLATFORM_NAME_KEY), Some("python"));
    assert_eq!(plan.manifest.get(PLATFORM_VERSION_KEY), Some("3.11.4"));
    assert_eq!(plan.manifest.get("PythonVersion"), Some("3.11.4"));
    assert_eq!(plan.manifest.get("VirtualEnvName"), Some("pythonenv3.11"));
    assert_eq!(plan.manifest.get("Frameworks"), Some("flask"));
    assert_eq!(plan.manifest.get(OPERATION_ID_KEY), Some("op-1"));
    assert_eq!(plan.manifest.get(SOURCE_REVISION_KEY), Some("abc123"));
}

#[test]
fn test_script_is_byte_identical_across_runs() {
    let ws = python_workspace();
    let repo = LocalSourceRepo::new(ws.source());

    let first = ws
        .orchestrator(ws.options(&[]), Arc::new(FakeStorage::new()))
        .plan(&repo, &BuildContext::new(ws.source()))
        .unwrap();
    let second = ws
        .orchestrator(ws.options(&[]), Arc::new(FakeStorage::new()))
        .plan(&repo, &BuildContext::new(ws.source()))
        .unwrap();

    assert_eq!(first.script, second.script);
    // each run gets its own operation id, which only lands in the manifest
    assert_ne!(
        first.manifest.get(OPERATION_ID_KEY),
        second.manifest.get(OPERATION_ID_KEY)
    );
    assert!(!first
        .script
        .contains(first.manifest.get(OPERATION_ID_KEY).unwrap()));
    // not a git checkout
    assert_eq!(first.manifest.get(SOURCE_REVISION_KEY), Some("unknown"));
}

#[test]
fn test_pinned_version_wins_over_default() {
    let ws = python_workspace();
    ws.write("runtime.txt", "python-3.10.12\n");
    let plan = ws
        .orchestrator(ws.options(&[]), Arc::new(FakeStorage::new()))
        .plan(&LocalSourceRepo::new(ws.source()), &context(&ws))
        .unwrap();

    assert_eq!(plan.platforms[0].version, "3.10.12");
    assert_eq!(plan.platforms[0].source, VersionSource::RepoDetected);
}

#[test]
fn test_ambiguous_platforms_fail_without_multi_platform() {
    let ws = python_workspace();
    ws.write("package.json", r#"{"name": "web", "dependencies": {"react": "18.2.0"}}"#)
        .install("nodejs", "18.17.1");
    let orchestrator = ws.orchestrator(ws.options(&[]), Arc::new(FakeStorage::new()));

    let err = orchestrator
        .plan(&LocalSourceRepo::new(ws.source()), &context(&ws))
        .unwrap_err();

    match &err {
        BuildError::AmbiguousPlatform { platforms } => {
            assert_eq!(platforms, &vec!["nodejs".to_string(), "python".to_string()]);
        }
        other => panic!("expected ambiguity, got {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::Usage);
    assert_eq!(orchestrator.phase(), BuildPhase::Failed);
}

#[test]
fn test_multi_platform_manifest_follows_registration_order() {
    let ws = python_workspace();
    ws.write("package.json", r#"{"name": "web", "dependencies": {"react": "18.2.0"}}"#)
        .write("yarn.lock", "")
        .install("nodejs", "18.17.1");
    let options = ws.options(&[("ENABLE_MULTIPLATFORM_BUILD", "true")]);

    let plan = ws
        .orchestrator(options, Arc::new(FakeStorage::new()))
        .plan(&LocalSourceRepo::new(ws.source()), &context(&ws))
        .unwrap();

    assert_eq!(plan.manifest.get(PLATFORM_NAME_KEY), Some("nodejs,python"));
    assert_eq!(plan.manifest.get(PLATFORM_VERSION_KEY), Some("18.17.1,3.11.4"));
    assert_eq!(plan.manifest.get("NodeVersion"), Some("18.17.1"));
    assert_eq!(plan.manifest.get("PythonVersion"), Some("3.11.4"));

    let node_at = plan.script.find("# Build Node.js").unwrap();
    let python_at = plan.script.find("# Build Python").unwrap();
    assert!(node_at < python_at);
    assert!(plan.script.contains("yarn install --frozen-lockfile"));
    assert!(!plan.script.contains("npm install"));
}

#[test]
fn test_disabled_platform_is_skipped() {
    let ws = python_workspace();
    ws.write("package.json", "{}");
    let options = ws.options(&[("DISABLE_NODE_BUILD", "true")]);

    let plan = ws
        .orchestrator(options, Arc::new(FakeStorage::new()))
        .plan(&LocalSourceRepo::new(ws.source()), &context(&ws))
        .unwrap();
    assert_eq!(plan.manifest.get(PLATFORM_NAME_KEY), Some("python"));
}

#[test]
fn test_no_platform_detected() {
    let ws = Workspace::new();
    ws.write("README.md", "# nothing to build\n");
    let err = ws
        .orchestrator(ws.options(&[]), Arc::new(FakeStorage::new()))
        .plan(&LocalSourceRepo::new(ws.source()), &context(&ws))
        .unwrap_err();
    assert!(matches!(err, BuildError::NoApplicablePlatform));
}

#[test]
fn test_unknown_platform_lists_enabled_platforms() {
    let ws = python_workspace();
    let options = ws.options(&[("PLATFORM_NAME", "haskell"), ("DISABLE_PHP_BUILD", "true")]);
    let err = ws
        .orchestrator(options, Arc::new(FakeStorage::new()))
        .plan(&LocalSourceRepo::new(ws.source()), &context(&ws))
        .unwrap_err();

    match err {
        BuildError::UnsupportedPlatform { name, supported } => {
            assert_eq!(name, "haskell");
            assert_eq!(
                supported,
                vec!["dotnet", "nodejs", "python", "ruby", "java", "golang"]
            );
        }
        other => panic!("expected unsupported platform, got {other:?}"),
    }
}

#[test]
fn test_named_platform_not_detected() {
    let ws = python_workspace();
    let options = ws.options(&[("PLATFORM_NAME", "ruby")]);
    let err = ws
        .orchestrator(options, Arc::new(FakeStorage::new()))
        .plan(&LocalSourceRepo::new(ws.source()), &context(&ws))
        .unwrap_err();
    assert!(matches!(err, BuildError::PlatformNotDetected { ref platform } if platform == "ruby"));
}

#[test]
fn test_named_platform_with_explicit_version_skips_detection() {
    let ws = python_workspace();
    ws.install("ruby", "3.2.2");
    let options = ws.options(&[("PLATFORM_NAME", "ruby"), ("PLATFORM_VERSION", "3.2")]);

    let plan = ws
        .orchestrator(options, Arc::new(FakeStorage::new()))
        .plan(&LocalSourceRepo::new(ws.source()), &context(&ws))
        .unwrap();
    assert_eq!(plan.platforms.len(), 1);
    assert_eq!(plan.platforms[0].name, "ruby");
    assert_eq!(plan.platforms[0].version, "3.2.2");
    assert_eq!(plan.platforms[0].source, VersionSource::ExplicitOverride);
}

#[test]
fn test_named_platform_by_alias() {
    let ws = python_workspace();
    let options = ws.options(&[("PLATFORM_NAME", "py"), ("PLATFORM_VERSION", "3.10")]);
    let plan = ws
        .orchestrator(options, Arc::new(FakeStorage::new()))
        .plan(&LocalSourceRepo::new(ws.source()), &context(&ws))
        .unwrap();
    assert_eq!(plan.platforms[0].name, "python");
    assert_eq!(plan.platforms[0].version, "3.10.12");
}

#[test]
fn test_unsupported_pinned_version() {
    let ws = python_workspace();
    ws.write(".python-version", "2.7\n");
    let err = ws
        .orchestrator(ws.options(&[]), Arc::new(FakeStorage::new()))
        .plan(&LocalSourceRepo::new(ws.source()), &context(&ws))
        .unwrap_err();

    match err {
        BuildError::UnsupportedVersion {
            platform,
            attempted,
            supported,
        } => {
            assert_eq!(platform, "python");
            assert_eq!(attempted, "2.7");
            assert_eq!(supported, vec!["3.10.12", "3.11.4"]);
        }
        other => panic!("expected unsupported version, got {other:?}"),
    }
}

#[test]
fn test_virtualenv_name_in_python_version_is_ignored() {
    let ws = python_workspace();
    ws.write(".python-version", "myproject-venv\n");

    let plan = ws
        .orchestrator(ws.options(&[]), Arc::new(FakeStorage::new()))
        .plan(&LocalSourceRepo::new(ws.source()), &context(&ws))
        .unwrap();
    assert_eq!(plan.platforms[0].version, "3.11.4");
    assert_eq!(plan.platforms[0].source, VersionSource::ProviderDefault);
}

#[test]
fn test_composer_alternatives_pick_newest_match() {
    let ws = Workspace::new();
    ws.write("composer.json", r#"{"require": {"php": "^7.3|^8.0"}}"#)
        .write("index.php", "<?php echo 'hi';\n")
        .install("php", "7.4.33")
        .install("php", "8.1.2");

    let plan = ws
        .orchestrator(ws.options(&[]), Arc::new(FakeStorage::new()))
        .plan(&LocalSourceRepo::new(ws.source()), &context(&ws))
        .unwrap();
    assert_eq!(plan.platforms[0].name, "php");
    assert_eq!(plan.platforms[0].version, "8.1.2");
    assert_eq!(plan.platforms[0].source, VersionSource::RepoDetected);
}

#[test]
fn test_global_json_selects_installed_sdk() {
    let ws = Workspace::new();
    ws.write(
        "Api/Api.csproj",
        "<Project Sdk=\"Microsoft.NET.Sdk\"><PropertyGroup><TargetFramework>net6.0</TargetFramework></PropertyGroup></Project>",
    )
    .install("dotnet", "6.0.100")
    .install("dotnet", "6.0.203")
    .install("dotnet", "6.0.413")
    .install("dotnet", "8.0.100");

    let plan = ws
        .orchestrator(ws.options(&[]), Arc::new(FakeStorage::new()))
        .plan(&LocalSourceRepo::new(ws.source()), &context(&ws))
        .unwrap();
    assert_eq!(plan.platforms[0].name, "dotnet");
    assert_eq!(plan.platforms[0].version, "6.0.413");

    ws.write("global.json", r#"{"sdk": {"version": "6.0.200"}}"#);
    let plan = ws
        .orchestrator(ws.options(&[]), Arc::new(FakeStorage::new()))
        .plan(&LocalSourceRepo::new(ws.source()), &context(&ws))
        .unwrap();
    assert_eq!(plan.platforms[0].version, "6.0.203");
    assert_eq!(plan.manifest.get("DotNetVersion"), Some("6.0.203"));

    ws.write(
        "global.json",
        r#"{"sdk": {"version": "7.0.100", "rollForward": "disable"}}"#,
    );
    let err = ws
        .orchestrator(ws.options(&[]), Arc::new(FakeStorage::new()))
        .plan(&LocalSourceRepo::new(ws.source()), &context(&ws))
        .unwrap_err();
    match err {
        BuildError::UnsupportedVersion { platform, attempted, .. } => {
            assert_eq!(platform, "dotnet");
            assert_eq!(attempted, "7.0.100");
        }
        other => panic!("expected unsupported version, got {other:?}"),
    }
}

#[test]
fn test_missing_preinstalled_version() {
    let ws = python_workspace();
    ws.write(".python-version", "3.12.1\n");
    let options = ws.options(&[("PYTHON_SUPPORTED_VERSIONS", "3.10.12,3.11.4,3.12.1")]);

    let err = ws
        .orchestrator(options, Arc::new(FakeStorage::new()))
        .plan(&LocalSourceRepo::new(ws.source()), &context(&ws))
        .unwrap_err();
    assert!(matches!(
        err,
        BuildError::MissingPreinstalledVersion { ref platform, ref version }
            if platform == "python" && version == "3.12.1"
    ));
    assert_eq!(err.kind(), ErrorKind::Usage);
}

#[test]
fn test_dynamic_install_emits_installer_and_caches_listing() {
    let ws = Workspace::new();
    ws.write("go.mod", "module example.com/app\n\ngo 1.21\n");
    let storage = Arc::new(FakeStorage::new().with_listing("golang", &["1.20", "1.21"], "1.21"));
    let options = ws.options(&[("ENABLE_DYNAMIC_INSTALL", "true")]);
    let orchestrator = ws.orchestrator(options, storage.clone());
    let repo = LocalSourceRepo::new(ws.source());

    let plan = orchestrator.plan(&repo, &context(&ws)).unwrap();
    assert!(plan.platforms[0].installs_sdk);
    assert!(plan
        .script
        .contains("--platform golang --platform-version 1.21 --base-target-dir"));
    assert!(plan.script.contains("--base-download-url https://sdks.test"));
    assert!(plan.script.contains("export PATH="));
    let install_at = plan.script.find("# Install Go").unwrap();
    let build_at = plan.script.find("# Build Go").unwrap();
    assert!(install_at < build_at);

    let sdk_dir = ws.dynamic_root().join("golang").join("1.21");
    assert_eq!(
        plan.manifest.get("GoSdkDir"),
        Some(sdk_dir.display().to_string().as_str())
    );
    assert_eq!(storage.calls(), 1);

    orchestrator.plan(&repo, &context(&ws)).unwrap();
    assert_eq!(storage.calls(), 1);
}

#[test]
fn test_downloaded_sdk_is_not_reinstalled() {
    let ws = Workspace::new();
    ws.write("go.mod", "module example.com/app\n\ngo 1.21\n");
    let sentinel_dir = ws.dynamic_root().join("golang").join("1.21");
    std::fs::create_dir_all(&sentinel_dir).unwrap();
    std::fs::write(sentinel_dir.join(buildsmith::platform::SDK_DOWNLOAD_SENTINEL), "").unwrap();

    let storage = Arc::new(FakeStorage::new().with_listing("golang", &["1.21"], "1.21"));
    let plan = ws
        .orchestrator(ws.options(&[("ENABLE_DYNAMIC_INSTALL", "true")]), storage)
        .plan(&LocalSourceRepo::new(ws.source()), &context(&ws))
        .unwrap();
    assert!(!plan.platforms[0].installs_sdk);
    assert!(!plan.script.contains("--platform-version"));
}

#[test]
fn test_unreachable_listing_is_transient() {
    let ws = Workspace::new();
    ws.write("go.mod", "module example.com/app\n\ngo 1.21\n");
    let err = ws
        .orchestrator(
            ws.options(&[("ENABLE_DYNAMIC_INSTALL", "true")]),
            Arc::new(FakeStorage::new()),
        )
        .plan(&LocalSourceRepo::new(ws.source()), &context(&ws))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransientProvider);
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn test_malformed_project_file() {
    let ws = Workspace::new();
    ws.write("Api/Api.csproj", "<Project Sdk=\"Microsoft.NET.Sdk\"><PropertyGroup>");
    let err = ws
        .orchestrator(ws.options(&[]), Arc::new(FakeStorage::new()))
        .plan(&LocalSourceRepo::new(ws.source()), &context(&ws))
        .unwrap_err();
    assert!(matches!(err, BuildError::MalformedProject { ref platform, .. } if platform == "dotnet"));
}

#[test]
fn test_build_properties_reach_the_script() {
    let ws = python_workspace();
    let build = context(&ws).with_properties(BTreeMap::from([(
        "virtualenv_name".to_string(),
        "venv".to_string(),
    )]));

    let plan = ws
        .orchestrator(ws.options(&[]), Arc::new(FakeStorage::new()))
        .plan(&LocalSourceRepo::new(ws.source()), &build)
        .unwrap();
    assert!(plan.script.contains("-m venv --copies venv"));
    assert_eq!(plan.manifest.get("VirtualEnvName"), Some("venv"));
}

#[test]
fn test_detect_platforms_reports_flags() {
    let ws = python_workspace();
    ws.write("package.json", r#"{"engines": {"node": ">=18"}}"#)
        .write("package-lock.json", "{}")
        .write(
            "Api/Api.csproj",
            "<Project Sdk=\"Microsoft.NET.Sdk\"><PropertyGroup><TargetFramework>net8.0</TargetFramework></PropertyGroup></Project>",
        );
    let orchestrator = ws.orchestrator(ws.options(&[]), Arc::new(FakeStorage::new()));

    let results = orchestrator
        .detect_platforms(&LocalSourceRepo::new(ws.source()))
        .unwrap();
    let names: Vec<&str> = results.iter().map(|r| r.platform.as_str()).collect();
    assert_eq!(names, vec!["dotnet", "nodejs", "python"]);

    let dotnet = &results[0];
    assert_eq!(dotnet.app_directory, "Api");
    assert_eq!(dotnet.detected_version.as_deref(), Some("8.0"));

    let node = &results[1];
    assert_eq!(node.app_directory, "");
    assert_eq!(node.detected_version.as_deref(), Some(">=18"));
    assert!(node.flag_is_set("hasPackageLock"));
    assert!(!node.flag_is_set("hasYarnLock"));
}
