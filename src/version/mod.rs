//! Version values, range matching and precedence-based resolution

pub mod info;
pub mod range;
pub mod resolver;
pub mod sdk;

pub use info::{VersionInfo, VersionParseError};
pub use range::{is_version_hint, match_supported, max_satisfying};
pub use resolver::{ResolvedVersion, VersionResolver, VersionSource};
pub use sdk::{RollForward, SdkPin, SdkVersion};
