use crate::detector::{DetectorSpec, FlagRule, ProjectFileRule, VersionRule};
use crate::platform::{BuildRecipe, InstallSpec, PlatformSpec, SdkSelection};
use crate::provider::VersionLayout;
use crate::script::RecipeStep;

const SDK_VERSION_FLAG: &str = "sdkVersion";
const SDK_ROLL_FORWARD_FLAG: &str = "sdkRollForward";
const SDK_ALLOW_PRERELEASE_FLAG: &str = "sdkAllowPrerelease";

/// Installed versions are SDKs (`8.0.100`); the project's runtime (`net8.0`)
/// or a global.json pin selects one of them.
pub static DOTNET: PlatformSpec = PlatformSpec {
    name: "dotnet",
    display_name: ".NET",
    option_key: "DOTNET",
    aliases: &["dotnetcore"],
    manifest_prefix: "DotNet",
    detector: DetectorSpec {
        project_files: Some(ProjectFileRule {
            patterns: &["*.csproj", "*.fsproj"],
            require_xml: true,
        }),
        version_rules: &[VersionRule::TargetFramework],
        flags: &[
            FlagRule::ProjectFile { flag: "projectFile" },
            FlagRule::ProjectElement {
                flag: "targetFramework",
                element: "TargetFramework",
            },
            FlagRule::Version {
                flag: SDK_VERSION_FLAG,
                rule: VersionRule::GlobalJsonSdk,
            },
            FlagRule::GlobalJsonRollForward {
                flag: SDK_ROLL_FORWARD_FLAG,
            },
            FlagRule::GlobalJsonAllowPrerelease {
                flag: SDK_ALLOW_PRERELEASE_FLAG,
            },
        ],
        ..DetectorSpec::EMPTY
    },
    install: InstallSpec {
        install_dir: "dotnet",
        layout: VersionLayout::SemVer,
        bin_subdir: "",
        default_version: Some("8.0"),
    },
    sdk_selection: SdkSelection::GlobalJson {
        version_flag: SDK_VERSION_FLAG,
        roll_forward_flag: SDK_ROLL_FORWARD_FLAG,
        allow_prerelease_flag: SDK_ALLOW_PRERELEASE_FLAG,
    },
    build: BuildRecipe {
        steps: &[
            RecipeStep::always("cd \"$SOURCE_DIR\""),
            RecipeStep::always("dotnet restore {projectFile}"),
            RecipeStep::always(
                "dotnet publish {projectFile} -c {configuration} -o {publish_dir}",
            ),
        ],
        defaults: &[
            ("configuration", "Release"),
            ("publish_dir", "{app_dir}/bin/publish"),
        ],
        manifest: &[
            ("ProjectFile", "{projectFile}"),
            ("TargetFramework", "{targetFramework}"),
        ],
    },
};
