//! Version precedence across every combination of available sources

use buildsmith::provider::{PlatformVersionInfo, ProviderError, VersionOrigin, VersionProvider};
use buildsmith::version::match_supported;
use buildsmith::{max_satisfying, BuildError, DetectionResult, VersionResolver, VersionSource};
use yare::parameterized;

struct FixedProvider {
    default: Option<&'static str>,
}

const SUPPORTED: [&str; 4] = ["1.0.0", "2.0.0", "3.0.0", "4.0.0"];

impl VersionProvider for FixedProvider {
    fn platform(&self) -> &str {
        "nodejs"
    }

    fn version_info(&self) -> Result<PlatformVersionInfo, ProviderError> {
        PlatformVersionInfo::new(
            "nodejs",
            SUPPORTED.iter().map(|v| v.to_string()).collect(),
            self.default.map(str::to_string),
            VersionOrigin::OnDisk,
        )
    }
}

#[parameterized(
    none = { false, false, false, false, None },
    provider_only = { false, false, false, true, Some(("4.0.0", VersionSource::ProviderDefault)) },
    configured_only = { false, false, true, false, Some(("3.0.0", VersionSource::ConfiguredDefault)) },
    configured_provider = { false, false, true, true, Some(("3.0.0", VersionSource::ConfiguredDefault)) },
    detected_only = { false, true, false, false, Some(("2.0.0", VersionSource::RepoDetected)) },
    detected_provider = { false, true, false, true, Some(("2.0.0", VersionSource::RepoDetected)) },
    detected_configured = { false, true, true, false, Some(("2.0.0", VersionSource::RepoDetected)) },
    detected_configured_provider = { false, true, true, true, Some(("2.0.0", VersionSource::RepoDetected)) },
    explicit_only = { true, false, false, false, Some(("1.0.0", VersionSource::ExplicitOverride)) },
    explicit_provider = { true, false, false, true, Some(("1.0.0", VersionSource::ExplicitOverride)) },
    explicit_configured = { true, false, true, false, Some(("1.0.0", VersionSource::ExplicitOverride)) },
    explicit_configured_provider = { true, false, true, true, Some(("1.0.0", VersionSource::ExplicitOverride)) },
    explicit_detected = { true, true, false, false, Some(("1.0.0", VersionSource::ExplicitOverride)) },
    explicit_detected_provider = { true, true, false, true, Some(("1.0.0", VersionSource::ExplicitOverride)) },
    explicit_detected_configured = { true, true, true, false, Some(("1.0.0", VersionSource::ExplicitOverride)) },
    all = { true, true, true, true, Some(("1.0.0", VersionSource::ExplicitOverride)) },
)]
fn test_precedence(
    explicit: bool,
    detected: bool,
    configured: bool,
    provider_default: bool,
    expected: Option<(&str, VersionSource)>,
) {
    let mut detection = DetectionResult::new("nodejs", "");
    if detected {
        detection = detection.with_version("2.0.0");
    }
    let provider = FixedProvider {
        default: provider_default.then_some("4.0.0"),
    };

    let result = VersionResolver::resolve(
        explicit.then_some("1.0.0"),
        &detection,
        configured.then_some("3.0.0"),
        &provider,
    );

    match expected {
        Some((version, source)) => {
            let resolved = result.unwrap();
            assert_eq!(resolved.platform, "nodejs");
            assert_eq!(resolved.version, version);
            assert_eq!(resolved.source, source);
        }
        None => assert!(matches!(result, Err(BuildError::NoVersionAvailable { .. }))),
    }
}

#[test]
fn test_blank_values_fall_through() {
    let detection = DetectionResult::new("nodejs", "").with_version("  ");
    let provider = FixedProvider {
        default: Some("4.0.0"),
    };
    let resolved = VersionResolver::resolve(Some(""), &detection, Some(" "), &provider).unwrap();
    assert_eq!(resolved.source, VersionSource::ProviderDefault);
    assert_eq!(resolved.version, "4.0.0");
}

#[test]
fn test_exact_supported_value_always_resolves_to_itself() {
    let provider = FixedProvider { default: None };
    for version in SUPPORTED {
        let detection = DetectionResult::new("nodejs", "").with_version(version);
        let resolved = VersionResolver::resolve(None, &detection, None, &provider).unwrap();
        assert_eq!(resolved.version, version);
    }
}

#[parameterized(
    caret = { "^18.0.0", Some("18.17.1") },
    tilde = { "~16.20", Some("16.20.2") },
    major_only = { "20", Some("20.5.0") },
    compound = { ">=16 <20", Some("18.17.1") },
    or_ranges = { "^14 || ^16", Some("16.20.2") },
    wildcard = { "18.x", Some("18.17.1") },
    unsatisfied = { "^22", None },
)]
fn test_max_satisfying(range: &str, expected: Option<&str>) {
    let versions: Vec<String> = ["16.20.1", "16.20.2", "18.17.1", "20.5.0"]
        .iter()
        .map(|v| v.to_string())
        .collect();
    assert_eq!(max_satisfying(range, &versions).as_deref(), expected);
}

#[test]
fn test_match_supported_prefers_exact() {
    let supported = vec!["3.11".to_string(), "3.11.4".to_string()];
    assert_eq!(match_supported("3.11", &supported).as_deref(), Some("3.11"));
    assert_eq!(match_supported("3.11.4", &supported).as_deref(), Some("3.11.4"));
}
