use super::range::match_supported;
use crate::detector::DetectionResult;
use crate::error::BuildError;
use crate::provider::VersionProvider;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Which precedence level produced a resolved version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VersionSource {
    ExplicitOverride,
    RepoDetected,
    ConfiguredDefault,
    ProviderDefault,
}

impl fmt::Display for VersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            VersionSource::ExplicitOverride => "explicit override",
            VersionSource::RepoDetected => "repository",
            VersionSource::ConfiguredDefault => "configured default",
            VersionSource::ProviderDefault => "provider default",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedVersion {
    pub platform: String,
    pub version: String,
    pub source: VersionSource,
}

/// Picks the version to build with and validates it against a provider
///
/// Precedence is strict: explicit override, then the version detected in the
/// repository, then the configured default, then the provider's default.
pub struct VersionResolver;

impl VersionResolver {
    pub fn resolve(
        explicit: Option<&str>,
        detected: &DetectionResult,
        configured_default: Option<&str>,
        provider: &dyn VersionProvider,
    ) -> Result<ResolvedVersion, BuildError> {
        let platform = detected.platform.as_str();
        let info = provider.version_info()?;

        let candidate = [
            (explicit, VersionSource::ExplicitOverride),
            (detected.detected_version.as_deref(), VersionSource::RepoDetected),
            (configured_default, VersionSource::ConfiguredDefault),
            (info.default_version.as_deref(), VersionSource::ProviderDefault),
        ]
        .into_iter()
        .find_map(|(value, source)| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (v, source))
        });

        let Some((candidate, source)) = candidate else {
            return Err(BuildError::NoVersionAvailable {
                platform: platform.to_string(),
            });
        };

        let version = match_supported(candidate, &info.supported_versions).ok_or_else(|| {
            BuildError::UnsupportedVersion {
                platform: platform.to_string(),
                attempted: candidate.to_string(),
                supported: info.supported_versions.clone(),
            }
        })?;

        debug!(platform, candidate, version = %version, %source, "Resolved platform version");

        Ok(ResolvedVersion {
            platform: platform.to_string(),
            version,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{PlatformVersionInfo, ProviderError, VersionOrigin};

    struct FixedProvider(PlatformVersionInfo);

    impl VersionProvider for FixedProvider {
        fn platform(&self) -> &str {
            "golang"
        }

        fn version_info(&self) -> Result<PlatformVersionInfo, ProviderError> {
            Ok(self.0.clone())
        }
    }

    fn provider(supported: &[&str], default: Option<&str>) -> FixedProvider {
        FixedProvider(
            PlatformVersionInfo::new(
                "golang",
                supported.iter().map(|s| s.to_string()).collect(),
                default.map(str::to_string),
                VersionOrigin::OnDisk,
            )
            .unwrap(),
        )
    }

    fn detection(version: Option<&str>) -> DetectionResult {
        let mut result = DetectionResult::new("golang", "");
        result.detected_version = version.map(str::to_string);
        result
    }

    #[test]
    fn test_unsupported_explicit_version() {
        let err = VersionResolver::resolve(
            Some("0"),
            &detection(None),
            None,
            &provider(&["1.17", "1.18"], Some("1.18")),
        )
        .unwrap_err();

        match &err {
            BuildError::UnsupportedVersion { attempted, supported, .. } => {
                assert_eq!(attempted, "0");
                assert_eq!(supported, &["1.17", "1.18"]);
            }
            other => panic!("Expected UnsupportedVersion, got {:?}", other),
        }
        assert!(err.to_string().ends_with("Supported versions: 1.17, 1.18"));
    }

    #[test]
    fn test_no_version_available() {
        let err = VersionResolver::resolve(None, &detection(None), None, &provider(&["1.17"], None))
            .unwrap_err();
        assert!(matches!(err, BuildError::NoVersionAvailable { platform } if platform == "golang"));
    }

    #[test]
    fn test_blank_values_are_skipped() {
        let resolved = VersionResolver::resolve(
            Some("  "),
            &detection(Some("")),
            Some("1.17"),
            &provider(&["1.17", "1.18"], Some("1.18")),
        )
        .unwrap();
        assert_eq!(resolved.version, "1.17");
        assert_eq!(resolved.source, VersionSource::ConfiguredDefault);
    }

    #[test]
    fn test_detected_range_resolves_to_highest_match() {
        let resolved = VersionResolver::resolve(
            None,
            &detection(Some(">=1.17")),
            None,
            &provider(&["1.16", "1.17", "1.18"], Some("1.16")),
        )
        .unwrap();
        assert_eq!(resolved.version, "1.18");
        assert_eq!(resolved.source, VersionSource::RepoDetected);
    }

    #[test]
    fn test_provider_error_propagates() {
        struct Down;
        impl VersionProvider for Down {
            fn platform(&self) -> &str {
                "golang"
            }
            fn version_info(&self) -> Result<PlatformVersionInfo, ProviderError> {
                Err(ProviderError::Unavailable {
                    platform: "golang".to_string(),
                    reason: "no versions installed".to_string(),
                })
            }
        }

        let err = VersionResolver::resolve(Some("1.17"), &detection(None), None, &Down).unwrap_err();
        assert!(matches!(err, BuildError::Provider(ProviderError::Unavailable { .. })));
    }
}
