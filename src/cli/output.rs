//! Output formatting for multiple formats
//!
//! Detection reports, platform listings and build plans can be rendered as
//! JSON, YAML or human-readable text. The build script itself is always plain
//! bash and never goes through this module.
//!
//! # Example
//!
//! ```
//! use buildsmith::cli::output::{OutputFormat, OutputFormatter};
//! use buildsmith::DetectionResult;
//!
//! let results = vec![DetectionResult::new("python", "").with_version("3.11")];
//! let formatter = OutputFormatter::new(OutputFormat::Json);
//! let output = formatter.format_detections(&results).unwrap();
//! assert!(output.contains("\"platform\": \"python\""));
//! ```

use anyhow::{Context, Result};
use serde::Serialize;

use crate::detector::DetectionResult;
use crate::orchestrator::BuildPlan;
use crate::provider::PlatformVersionInfo;

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}";

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format (human-friendly, version-control friendly)
    Yaml,
    /// Human-readable formatted text
    Human,
}

/// Supported versions of one platform, or why they could not be listed
#[derive(Debug, Clone, Serialize)]
pub struct PlatformListing {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub versions: Option<PlatformVersionInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the platforms found by detection
    pub fn format_detections(&self, results: &[DetectionResult]) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.format_json(&results),
            OutputFormat::Yaml => self.format_yaml(&results),
            OutputFormat::Human => Ok(self.format_detections_human(results)),
        }
    }

    pub fn format_platforms(&self, listings: &[PlatformListing]) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.format_json(&listings),
            OutputFormat::Yaml => self.format_yaml(&listings),
            OutputFormat::Human => Ok(self.format_platforms_human(listings)),
        }
    }

    /// Formats a build plan's platforms and manifest (not the script)
    pub fn format_plan(&self, plan: &BuildPlan) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.format_json(plan),
            OutputFormat::Yaml => self.format_yaml(plan),
            OutputFormat::Human => Ok(self.format_plan_human(plan)),
        }
    }

    fn format_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        serde_json::to_string_pretty(value).context("Failed to serialize to JSON")
    }

    fn format_yaml<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        serde_yaml::to_string(value).context("Failed to serialize to YAML")
    }

    fn format_detections_human(&self, results: &[DetectionResult]) -> String {
        if results.is_empty() {
            return "\u{26A0} No platform detected\n".to_string();
        }

        let mut output = String::new();
        output.push_str(&format!("\u{2713} Detected {} platform(s)\n", results.len()));
        output.push_str(RULE);
        output.push_str("\n\n");

        for result in results {
            output.push_str(&format!("Platform:       {}\n", result.platform));
            output.push_str(&format!(
                "Version:        {}\n",
                result.detected_version.as_deref().unwrap_or("(not pinned)")
            ));
            let app_dir = if result.app_directory.is_empty() {
                "."
            } else {
                result.app_directory.as_str()
            };
            output.push_str(&format!("App Directory:  {}\n", app_dir));

            if !result.flags.is_empty() {
                output.push_str("Flags:\n");
                let last = result.flags.len() - 1;
                for (i, (name, value)) in result.flags.iter().enumerate() {
                    let connector = if i == last { "\u{2514}" } else { "\u{251C}" };
                    output.push_str(&format!("{}\u{2500} {}: {}\n", connector, name, value));
                }
            }
            output.push('\n');
        }

        output
    }

    fn format_platforms_human(&self, listings: &[PlatformListing]) -> String {
        let mut output = String::new();
        output.push_str("Supported Platforms\n");
        output.push_str(RULE);
        output.push_str("\n\n");

        for listing in listings {
            match (&listing.versions, &listing.error) {
                (Some(info), _) => {
                    output.push_str(&format!("\u{2713} {}\n", listing.name));
                    output.push_str(&format!(
                        "  \u{251C}\u{2500} Default:  {}\n",
                        info.default_version.as_deref().unwrap_or("(none)")
                    ));
                    let versions = if info.supported_versions.is_empty() {
                        "(none)".to_string()
                    } else {
                        info.supported_versions.join(", ")
                    };
                    output.push_str(&format!("  \u{2514}\u{2500} Versions: {}\n", versions));
                }
                (None, error) => {
                    output.push_str(&format!("\u{2717} {}\n", listing.name));
                    output.push_str(&format!(
                        "  \u{2514}\u{2500} {}\n",
                        error.as_deref().unwrap_or("unavailable")
                    ));
                }
            }
        }

        output
    }

    fn format_plan_human(&self, plan: &BuildPlan) -> String {
        let mut output = String::new();
        output.push_str("\u{2713} Build Plan\n");
        output.push_str(RULE);
        output.push_str("\n\n");

        for platform in &plan.platforms {
            output.push_str(&format!(
                "{} {} ({}){}\n",
                platform.name,
                platform.version,
                platform.source,
                if platform.installs_sdk { ", installed at build time" } else { "" }
            ));
        }

        output.push_str("\nManifest:\n");
        for (key, value) in plan.manifest.properties() {
            output.push_str(&format!("  {} = {}\n", key, value));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::FlagValue;
    use crate::provider::VersionOrigin;

    fn create_test_results() -> Vec<DetectionResult> {
        vec![DetectionResult::new("nodejs", "web")
            .with_version("18.17.1")
            .with_flag("hasYarnLock", FlagValue::Bool(true))
            .with_flag("frameworks", FlagValue::Text("react".to_string()))]
    }

    #[test]
    fn test_json_format() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let output = formatter.format_detections(&create_test_results()).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed[0]["platform"], "nodejs");
        assert_eq!(parsed[0]["detected_version"], "18.17.1");
        assert_eq!(parsed[0]["flags"]["hasYarnLock"], true);
        assert_eq!(parsed[0]["flags"]["frameworks"], "react");
    }

    #[test]
    fn test_yaml_format() {
        let formatter = OutputFormatter::new(OutputFormat::Yaml);
        let output = formatter.format_detections(&create_test_results()).unwrap();

        assert!(output.contains("platform: nodejs"));
        assert!(output.contains("app_directory: web"));
    }

    #[test]
    fn test_human_format() {
        let formatter = OutputFormatter::new(OutputFormat::Human);
        let output = formatter.format_detections(&create_test_results()).unwrap();

        assert!(output.contains("Detected 1 platform(s)"));
        assert!(output.contains("Platform:       nodejs"));
        assert!(output.contains("App Directory:  web"));
        assert!(output.contains("hasYarnLock: true"));

        let empty = formatter.format_detections(&[]).unwrap();
        assert!(empty.contains("No platform detected"));
    }

    #[test]
    fn test_platforms_human_shows_errors() {
        let listings = vec![
            PlatformListing {
                name: "python".to_string(),
                versions: Some(
                    PlatformVersionInfo::new(
                        "python",
                        vec!["3.10.12".to_string(), "3.11.4".to_string()],
                        Some("3.11".to_string()),
                        VersionOrigin::OnDisk,
                    )
                    .unwrap(),
                ),
                error: None,
            },
            PlatformListing {
                name: "golang".to_string(),
                versions: None,
                error: Some("listing unreachable".to_string()),
            },
        ];

        let output = OutputFormatter::new(OutputFormat::Human)
            .format_platforms(&listings)
            .unwrap();
        assert!(output.contains("Versions: 3.10.12, 3.11.4"));
        assert!(output.contains("listing unreachable"));

        let json = OutputFormatter::new(OutputFormat::Json)
            .format_platforms(&listings)
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["versions"]["origin"], "OnDisk");
        assert!(parsed[1].get("versions").is_none());
    }
}
