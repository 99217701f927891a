use crate::detector::{DetectorSpec, FlagRule, FrameworkHint, VersionRule};
use crate::platform::{BuildRecipe, InstallSpec, PlatformSpec, SdkSelection};
use crate::provider::VersionLayout;
use crate::script::{Condition, RecipeStep};

const fn dependency(name: &'static str, package: &'static str) -> FrameworkHint {
    FrameworkHint::PackageDependency { name, package }
}

pub static NODEJS: PlatformSpec = PlatformSpec {
    name: "nodejs",
    display_name: "Node.js",
    option_key: "NODE",
    aliases: &["node"],
    manifest_prefix: "Node",
    detector: DetectorSpec {
        signal_files: &["package.json", "package-lock.json", "yarn.lock"],
        signal_patterns: &[],
        // Plain server.js/app.js apps, unless they are IIS-hosted
        weak_signal_files: &["server.js", "app.js"],
        conflicting_files: &["web.config", "iisnode.yml"],
        project_files: None,
        version_rules: &[
            VersionRule::PackageJsonEngine { engine: "node" },
            VersionRule::Pattern {
                file: ".nvmrc",
                pattern: r"^\s*v?(\d\S*)",
            },
        ],
        flags: &[
            FlagRule::FileExists {
                flag: "hasYarnLock",
                file: "yarn.lock",
            },
            FlagRule::FileExists {
                flag: "hasPackageLock",
                file: "package-lock.json",
            },
            FlagRule::FileExists {
                flag: "hasPnpmLock",
                file: "pnpm-lock.yaml",
            },
        ],
        frameworks: &[
            dependency("react", "react"),
            dependency("next", "next"),
            dependency("vue", "vue"),
            dependency("angular", "@angular/core"),
            dependency("express", "express"),
            dependency("gatsby", "gatsby"),
        ],
    },
    install: InstallSpec {
        install_dir: "nodejs",
        layout: VersionLayout::SemVer,
        bin_subdir: "bin",
        default_version: Some("18"),
    },
    sdk_selection: SdkSelection::Direct,
    build: BuildRecipe {
        steps: &[
            RecipeStep::always("cd \"$SOURCE_DIR\"/{app_dir}"),
            RecipeStep::when(
                Condition::Flag("hasYarnLock"),
                "yarn install --frozen-lockfile",
            ),
            RecipeStep::when(
                Condition::Flag("hasPnpmLock"),
                "pnpm install --frozen-lockfile",
            ),
            RecipeStep::when(
                Condition::NoneOf(&["hasYarnLock", "hasPnpmLock"]),
                "{npm_install_command}",
            ),
            RecipeStep::always("npm run {build_script} --if-present"),
        ],
        defaults: &[("npm_install_command", "npm install"), ("build_script", "build")],
        manifest: &[],
    },
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::{Detection, DetectorSettings, PlatformDetector, SpecDetector};
    use crate::repo::MemorySourceRepo;

    fn detect(repo: &MemorySourceRepo) -> Detection {
        SpecDetector::new(NODEJS.name, &NODEJS.detector, DetectorSettings::default())
            .detect(repo)
            .unwrap()
    }

    #[test]
    fn test_engines_and_frameworks() {
        let repo = MemorySourceRepo::new()
            .with_file(
                "package.json",
                r#"{"engines": {"node": "^18.0.0"}, "dependencies": {"express": "4", "react": "18"}}"#,
            )
            .with_file("yarn.lock", "");
        let result = detect(&repo).into_result().unwrap();
        assert_eq!(result.detected_version.as_deref(), Some("^18.0.0"));
        assert!(result.flag_is_set("hasYarnLock"));
        assert!(!result.flag_is_set("hasPackageLock"));
        assert_eq!(result.flag_text("frameworks"), Some("react,express"));
    }

    #[test]
    fn test_nvmrc_fallback() {
        let repo = MemorySourceRepo::new()
            .with_file("package.json", r#"{"name": "web"}"#)
            .with_file(".nvmrc", "v20.5.0\n");
        let result = detect(&repo).into_result().unwrap();
        assert_eq!(result.detected_version.as_deref(), Some("20.5.0"));
    }

    #[test]
    fn test_malformed_package_json_is_not_fatal() {
        let repo = MemorySourceRepo::new().with_file("package.json", "{ not json");
        let result = detect(&repo).into_result().unwrap();
        assert!(result.detected_version.is_none());
    }

    #[test]
    fn test_iis_hosted_server_js_is_not_node() {
        let repo = MemorySourceRepo::new().with_file("server.js", "");
        assert!(detect(&repo).into_result().is_some());

        let repo = repo.with_file("iisnode.yml", "");
        assert_eq!(detect(&repo), Detection::NotApplicable);
    }
}
