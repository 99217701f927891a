use crate::detector::{DetectorSpec, FlagRule, VersionRule};
use crate::platform::{BuildRecipe, InstallSpec, PlatformSpec, SdkSelection};
use crate::provider::VersionLayout;
use crate::script::{Condition, RecipeStep};

pub static JAVA: PlatformSpec = PlatformSpec {
    name: "java",
    display_name: "Java",
    option_key: "JAVA",
    aliases: &[],
    manifest_prefix: "Java",
    detector: DetectorSpec {
        signal_files: &["pom.xml", "build.gradle", "build.gradle.kts"],
        version_rules: &[
            VersionRule::LinePrefix {
                file: "system.properties",
                prefix: "java.runtime.version=",
            },
            VersionRule::Pattern {
                file: "pom.xml",
                pattern: r"<java\.version>\s*([^<\s]+)\s*</java\.version>",
            },
            VersionRule::Pattern {
                file: "pom.xml",
                pattern: r"<maven\.compiler\.release>\s*([^<\s]+)\s*</maven\.compiler\.release>",
            },
        ],
        flags: &[FlagRule::FileExists {
            flag: "hasPomXml",
            file: "pom.xml",
        }],
        ..DetectorSpec::EMPTY
    },
    install: InstallSpec {
        install_dir: "java",
        layout: VersionLayout::SemVer,
        bin_subdir: "bin",
        default_version: Some("17"),
    },
    sdk_selection: SdkSelection::Direct,
    build: BuildRecipe {
        steps: &[
            RecipeStep::always("cd \"$SOURCE_DIR\"/{app_dir}"),
            RecipeStep::when(Condition::Flag("hasPomXml"), "mvn -B {maven_goals}"),
            RecipeStep::when(Condition::NotFlag("hasPomXml"), "gradle {gradle_tasks}"),
        ],
        defaults: &[
            ("maven_goals", "-DskipTests package"),
            ("gradle_tasks", "build -x test"),
        ],
        manifest: &[],
    },
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::{DetectorSettings, PlatformDetector, SpecDetector};
    use crate::repo::MemorySourceRepo;

    fn detected_version(repo: &MemorySourceRepo) -> Option<String> {
        SpecDetector::new(JAVA.name, &JAVA.detector, DetectorSettings::default())
            .detect(repo)
            .unwrap()
            .into_result()
            .and_then(|r| r.detected_version)
    }

    #[test]
    fn test_system_properties_before_pom() {
        let pom = "<project><properties><java.version>11</java.version></properties></project>";
        let repo = MemorySourceRepo::new().with_file("pom.xml", pom);
        assert_eq!(detected_version(&repo).as_deref(), Some("11"));

        let repo = repo.with_file("system.properties", "java.runtime.version=17.0.8\n");
        assert_eq!(detected_version(&repo).as_deref(), Some("17.0.8"));
    }

    #[test]
    fn test_gradle_project_without_version() {
        let repo = MemorySourceRepo::new().with_file("build.gradle.kts", "plugins { java }");
        assert_eq!(detected_version(&repo), None);
    }
}
