use crate::detector::{DetectorSpec, FlagRule, FrameworkHint, VersionRule};
use crate::platform::{BuildRecipe, InstallSpec, PlatformSpec, SdkSelection};
use crate::provider::VersionLayout;
use crate::script::{Condition, RecipeStep};

pub static PYTHON: PlatformSpec = PlatformSpec {
    name: "python",
    display_name: "Python",
    option_key: "PYTHON",
    aliases: &["py"],
    manifest_prefix: "Python",
    detector: DetectorSpec {
        signal_files: &[
            "requirements.txt",
            "pyproject.toml",
            "runtime.txt",
            "setup.py",
            "environment.yml",
            "environment.yaml",
        ],
        signal_patterns: &["*.py", "*.ipynb"],
        weak_signal_files: &[],
        conflicting_files: &[],
        project_files: None,
        version_rules: &[
            VersionRule::LinePrefix {
                file: "runtime.txt",
                prefix: "python-",
            },
            VersionRule::Pattern {
                file: ".python-version",
                pattern: r"^\s*(\S+)",
            },
            VersionRule::PyprojectRequiresPython,
        ],
        flags: &[
            FlagRule::FileExists {
                flag: "hasRequirementsTxt",
                file: "requirements.txt",
            },
            FlagRule::FileExists {
                flag: "hasPyprojectToml",
                file: "pyproject.toml",
            },
            FlagRule::CondaEnvironment {
                flag: "hasCondaEnvironment",
                files: &["environment.yml", "environment.yaml"],
            },
            FlagRule::PatternExists {
                flag: "hasJupyterNotebook",
                pattern: "*.ipynb",
            },
        ],
        frameworks: &[
            FrameworkHint::FileLine {
                name: "django",
                file: "requirements.txt",
                needle: "django",
            },
            FrameworkHint::FileLine {
                name: "flask",
                file: "requirements.txt",
                needle: "flask",
            },
            FrameworkHint::FileLine {
                name: "fastapi",
                file: "requirements.txt",
                needle: "fastapi",
            },
        ],
    },
    install: InstallSpec {
        install_dir: "python",
        layout: VersionLayout::SemVer,
        bin_subdir: "bin",
        default_version: Some("3.11"),
    },
    sdk_selection: SdkSelection::Direct,
    build: BuildRecipe {
        steps: &[
            RecipeStep::always("cd \"$SOURCE_DIR\"/{app_dir}"),
            RecipeStep::when(
                Condition::Flag("hasCondaEnvironment"),
                "conda env create --file environment.yml --prefix \"./{virtualenv_name}\"",
            ),
            RecipeStep::when(
                Condition::NotFlag("hasCondaEnvironment"),
                "python{major_minor} -m venv --copies {virtualenv_name}",
            ),
            RecipeStep::when(
                Condition::NotFlag("hasCondaEnvironment"),
                "source {virtualenv_name}/bin/activate",
            ),
            RecipeStep::when(
                Condition::Flag("hasRequirementsTxt"),
                "python -m pip install --cache-dir {pip_cache_dir} --prefer-binary -r requirements.txt",
            ),
            RecipeStep::when(
                Condition::Flag("hasPyprojectToml"),
                "python -m pip install --cache-dir {pip_cache_dir} .",
            ),
        ],
        defaults: &[
            ("virtualenv_name", "pythonenv{major_minor}"),
            ("pip_cache_dir", "/usr/local/share/pip-cache"),
        ],
        manifest: &[("VirtualEnvName", "{virtualenv_name}")],
    },
};
