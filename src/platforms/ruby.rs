use crate::detector::{DetectorSpec, FlagRule, FrameworkHint, VersionRule};
use crate::platform::{BuildRecipe, InstallSpec, PlatformSpec, SdkSelection};
use crate::provider::VersionLayout;
use crate::script::{Condition, RecipeStep};

pub static RUBY: PlatformSpec = PlatformSpec {
    name: "ruby",
    display_name: "Ruby",
    option_key: "RUBY",
    aliases: &[],
    manifest_prefix: "Ruby",
    detector: DetectorSpec {
        signal_files: &["Gemfile", "Gemfile.lock", "config.ru"],
        version_rules: &[
            VersionRule::Pattern {
                file: "Gemfile",
                pattern: r#"^\s*ruby\s+['"][~>=\s]*(\d[^'"]*)['"]"#,
            },
            VersionRule::Pattern {
                file: "Gemfile.lock",
                pattern: r"^RUBY VERSION\s*\n\s*ruby\s+(\d+\.\d+\.\d+)",
            },
        ],
        flags: &[
            FlagRule::FileExists {
                flag: "hasGemfile",
                file: "Gemfile",
            },
            FlagRule::Capture {
                flag: "bundlerVersion",
                file: "Gemfile.lock",
                pattern: r"^BUNDLED WITH\s*\n\s*(\S+)",
            },
        ],
        frameworks: &[
            FrameworkHint::FileLine {
                name: "rails",
                file: "Gemfile",
                needle: "gem 'rails'",
            },
            FrameworkHint::FileLine {
                name: "rails",
                file: "Gemfile",
                needle: "gem \"rails\"",
            },
        ],
        ..DetectorSpec::EMPTY
    },
    install: InstallSpec {
        install_dir: "ruby",
        layout: VersionLayout::SemVer,
        bin_subdir: "bin",
        default_version: Some("3.2"),
    },
    sdk_selection: SdkSelection::Direct,
    build: BuildRecipe {
        steps: &[
            RecipeStep::always("cd \"$SOURCE_DIR\"/{app_dir}"),
            RecipeStep::when(
                Condition::Flag("bundlerVersion"),
                "gem install bundler -v {bundlerVersion} --no-document",
            ),
            RecipeStep::when(
                Condition::Flag("hasGemfile"),
                "bundle install --jobs {bundle_jobs}",
            ),
        ],
        defaults: &[("bundle_jobs", "4")],
        manifest: &[("BundlerVersion", "{bundlerVersion}")],
    },
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::{DetectorSettings, PlatformDetector, SpecDetector};
    use crate::repo::MemorySourceRepo;

    const LOCKFILE: &str = "GEM\n  specs:\n    rails (7.0.4)\n\nRUBY VERSION\n   ruby 3.1.2p20\n\nBUNDLED WITH\n   2.4.10\n";

    fn detect(repo: &MemorySourceRepo) -> crate::detector::DetectionResult {
        SpecDetector::new(RUBY.name, &RUBY.detector, DetectorSettings::default())
            .detect(repo)
            .unwrap()
            .into_result()
            .unwrap()
    }

    #[test]
    fn test_gemfile_ruby_directive() {
        let repo = MemorySourceRepo::new()
            .with_file("Gemfile", "source 'https://rubygems.org'\nruby '~> 3.2.2'\ngem 'rails', '~> 7.0'\n")
            .with_file("Gemfile.lock", LOCKFILE);
        let result = detect(&repo);
        assert_eq!(result.detected_version.as_deref(), Some("3.2.2"));
        assert_eq!(result.flag_text("bundlerVersion"), Some("2.4.10"));
        assert_eq!(result.flag_text("frameworks"), Some("rails"));
    }

    #[test]
    fn test_lockfile_ruby_version() {
        let repo = MemorySourceRepo::new().with_file("Gemfile.lock", LOCKFILE);
        let result = detect(&repo);
        assert_eq!(result.detected_version.as_deref(), Some("3.1.2"));
        assert!(!result.flag_is_set("hasGemfile"));
    }
}
