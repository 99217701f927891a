use crate::detector::{DetectorSpec, FlagRule, VersionRule};
use crate::platform::{BuildRecipe, InstallSpec, PlatformSpec, SdkSelection};
use crate::provider::VersionLayout;
use crate::script::{Condition, RecipeStep};

pub static GOLANG: PlatformSpec = PlatformSpec {
    name: "golang",
    display_name: "Go",
    option_key: "GO",
    aliases: &["go"],
    manifest_prefix: "Go",
    detector: DetectorSpec {
        signal_files: &["go.mod"],
        version_rules: &[VersionRule::Pattern {
            file: "go.mod",
            pattern: r"^\s*go\s+(\d+\.\d+)",
        }],
        flags: &[FlagRule::FileExists {
            flag: "hasGoSum",
            file: "go.sum",
        }],
        ..DetectorSpec::EMPTY
    },
    install: InstallSpec {
        install_dir: "go",
        layout: VersionLayout::MajorMinor,
        bin_subdir: "bin",
        default_version: Some("1.21"),
    },
    sdk_selection: SdkSelection::Direct,
    build: BuildRecipe {
        steps: &[
            RecipeStep::always("cd \"$SOURCE_DIR\"/{app_dir}"),
            RecipeStep::when(Condition::Flag("hasGoSum"), "go mod download"),
            RecipeStep::always("go build -o {output_dir}/ ./..."),
        ],
        defaults: &[("output_dir", "bin")],
        manifest: &[],
    },
};
