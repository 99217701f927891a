use crate::detector::DetectorSpec;
use crate::provider::VersionLayout;
use crate::script::RecipeStep;

/// Static description of one platform
///
/// Everything platform-specific lives here. [`super::GenericPlatform`] turns
/// a spec into a working plugin.
#[derive(Debug)]
pub struct PlatformSpec {
    /// Canonical lowercase name (`python`, `nodejs`)
    pub name: &'static str,
    pub display_name: &'static str,
    /// Upper-case key of the per-platform settings (`PYTHON`, `NODE`)
    pub option_key: &'static str,
    /// Other names accepted by `--platform`
    pub aliases: &'static [&'static str],
    /// Prefix of the manifest keys this platform writes (`Python` -> `PythonVersion`)
    pub manifest_prefix: &'static str,
    pub detector: DetectorSpec,
    pub install: InstallSpec,
    pub sdk_selection: SdkSelection,
    pub build: BuildRecipe,
}

impl PlatformSpec {
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|alias| alias.eq_ignore_ascii_case(name))
    }

    pub fn version_key(&self) -> String {
        format!("{}Version", self.manifest_prefix)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InstallSpec {
    /// Directory under the platforms root holding pre-installed versions
    pub install_dir: &'static str,
    pub layout: VersionLayout,
    /// Directory of executables inside an installed version, "" for its root
    pub bin_subdir: &'static str,
    /// Default used when pre-installed versions are the source
    pub default_version: Option<&'static str>,
}

/// How a requested version is turned into an installed version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdkSelection {
    /// Supported versions are matched against the request directly
    Direct,
    /// Supported versions are .NET SDKs, picked by global.json roll-forward.
    /// The fields name the detection flags holding the global.json values.
    GlobalJson {
        version_flag: &'static str,
        roll_forward_flag: &'static str,
        allow_prerelease_flag: &'static str,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct BuildRecipe {
    pub steps: &'static [RecipeStep],
    /// Template values a `-p` property of the same name overrides
    pub defaults: &'static [(&'static str, &'static str)],
    /// Extra manifest entries; values are templates, empty results are skipped
    pub manifest: &'static [(&'static str, &'static str)],
}
