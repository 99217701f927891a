use crate::detector::{DetectorSpec, FlagRule, FrameworkHint, VersionRule};
use crate::platform::{BuildRecipe, InstallSpec, PlatformSpec, SdkSelection};
use crate::provider::VersionLayout;
use crate::script::{Condition, RecipeStep};

pub static PHP: PlatformSpec = PlatformSpec {
    name: "php",
    display_name: "PHP",
    option_key: "PHP",
    aliases: &[],
    manifest_prefix: "Php",
    detector: DetectorSpec {
        signal_files: &["composer.json"],
        signal_patterns: &["*.php"],
        version_rules: &[VersionRule::ComposerRequire { package: "php" }],
        flags: &[FlagRule::FileExists {
            flag: "hasComposerJson",
            file: "composer.json",
        }],
        frameworks: &[FrameworkHint::ComposerDependency {
            name: "laravel",
            package: "laravel/framework",
        }],
        ..DetectorSpec::EMPTY
    },
    install: InstallSpec {
        install_dir: "php",
        layout: VersionLayout::SemVer,
        bin_subdir: "bin",
        default_version: Some("8.2"),
    },
    sdk_selection: SdkSelection::Direct,
    build: BuildRecipe {
        steps: &[
            RecipeStep::always("cd \"$SOURCE_DIR\"/{app_dir}"),
            RecipeStep::when(
                Condition::Flag("hasComposerJson"),
                "composer install {composer_args}",
            ),
        ],
        defaults: &[(
            "composer_args",
            "--no-dev --prefer-dist --no-interaction --optimize-autoloader",
        )],
        manifest: &[],
    },
};
