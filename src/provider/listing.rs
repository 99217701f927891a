//! Parsing of SDK storage listings and default-version files
//!
//! The storage listing is an XML container listing:
//!
//! ```xml
//! <EnumerationResults>
//!   <Blobs>
//!     <Blob>
//!       <Name>python-bullseye-3.11.4.tar.gz</Name>
//!       <Metadata>
//!         <Sdk_version>3.11.4</Sdk_version>
//!         <Os_type>bullseye</Os_type>
//!         <Checksum>ab12...</Checksum>
//!       </Metadata>
//!     </Blob>
//!   </Blobs>
//! </EnumerationResults>
//! ```
//!
//! A JSON document `{"versions": [...], "defaultVersion": "..."}` is accepted too.

use serde::Deserialize;
use std::collections::BTreeMap;

pub const LEGACY_FLAVOR: &str = "stretch";
pub const DEFAULT_VERSION_FILE: &str = "defaultVersion.txt";

const SDK_VERSION_KEY: &str = "sdk_version";
const LEGACY_VERSION_KEY: &str = "version";
const OS_TYPE_KEY: &str = "os_type";
const CHECKSUM_KEY: &str = "checksum";

/// One blob of a storage listing; metadata keys are lowercased
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkBlob {
    pub name: String,
    pub metadata: BTreeMap<String, String>,
}

impl SdkBlob {
    pub fn checksum(&self) -> Option<&str> {
        self.metadata.get(CHECKSUM_KEY).map(String::as_str)
    }

    /// SDK version carried by this blob if it is built for `flavor`
    pub fn version_for(&self, flavor: &str) -> Option<&str> {
        if flavor.eq_ignore_ascii_case(LEGACY_FLAVOR) {
            return self.metadata.get(LEGACY_VERSION_KEY).map(String::as_str);
        }
        let os_type = self.metadata.get(OS_TYPE_KEY)?;
        if !os_type.eq_ignore_ascii_case(flavor) {
            return None;
        }
        self.metadata.get(SDK_VERSION_KEY).map(String::as_str)
    }
}

/// Parsed listing: blobs from XML, or versions and default from JSON
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub blobs: Vec<SdkBlob>,
    pub versions: Vec<String>,
    pub default_version: Option<String>,
}

impl Listing {
    /// Supported versions for the OS flavor, in listing order
    pub fn supported_versions(&self, flavor: &str) -> Vec<String> {
        if !self.versions.is_empty() {
            return self.versions.clone();
        }
        self.blobs
            .iter()
            .filter_map(|blob| blob.version_for(flavor))
            .map(str::to_string)
            .collect()
    }

    pub fn blob_for_version(&self, flavor: &str, version: &str) -> Option<&SdkBlob> {
        self.blobs
            .iter()
            .find(|blob| blob.version_for(flavor) == Some(version))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonListing {
    #[serde(default)]
    versions: Vec<String>,
    #[serde(default)]
    default_version: Option<String>,
}

pub fn parse_listing(body: &str) -> Result<Listing, String> {
    let trimmed = body.trim_start_matches('\u{feff}').trim();
    if trimmed.starts_with('{') {
        let json: JsonListing =
            serde_json::from_str(trimmed).map_err(|e| format!("invalid JSON listing: {}", e))?;
        return Ok(Listing {
            blobs: Vec::new(),
            versions: json.versions,
            default_version: json.default_version,
        });
    }

    let doc =
        roxmltree::Document::parse(trimmed).map_err(|e| format!("invalid XML listing: {}", e))?;

    let blobs = doc
        .descendants()
        .filter(|node| {
            node.has_tag_name("Blob")
                && node
                    .parent_element()
                    .is_some_and(|parent| parent.has_tag_name("Blobs"))
        })
        .map(|blob| {
            let name = blob
                .children()
                .find(|n| n.has_tag_name("Name"))
                .and_then(|n| n.text())
                .unwrap_or_default()
                .trim()
                .to_string();
            let metadata = blob
                .children()
                .find(|n| n.has_tag_name("Metadata"))
                .map(|meta| {
                    meta.children()
                        .filter(|n| n.is_element())
                        .map(|n| {
                            (
                                n.tag_name().name().to_lowercase(),
                                n.text().unwrap_or_default().trim().to_string(),
                            )
                        })
                        .collect()
                })
                .unwrap_or_default();
            SdkBlob { name, metadata }
        })
        .collect();

    Ok(Listing {
        blobs,
        versions: Vec::new(),
        default_version: None,
    })
}

/// Name of the default-version file for an OS flavor
pub fn default_version_file(flavor: &str) -> String {
    if flavor.is_empty() || flavor.eq_ignore_ascii_case(LEGACY_FLAVOR) {
        DEFAULT_VERSION_FILE.to_string()
    } else {
        format!("defaultVersion.{}.txt", flavor)
    }
}

/// First line that is neither blank nor a `#` or `//` comment
pub fn parse_default_version(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with("//"))
        .map(str::to_string)
}

/// Archive name of an SDK build for a flavor
pub fn blob_name(platform: &str, flavor: &str, version: &str) -> String {
    if flavor.is_empty() || flavor.eq_ignore_ascii_case(LEGACY_FLAVOR) {
        format!("{}-{}.tar.gz", platform, version)
    } else {
        format!("{}-{}-{}.tar.gz", platform, flavor, version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<EnumerationResults ContainerName="python">
  <Blobs>
    <Blob>
      <Name>defaultVersion.txt</Name>
      <Metadata />
    </Blob>
    <Blob>
      <Name>python-3.8.12.tar.gz</Name>
      <Metadata><Version>3.8.12</Version></Metadata>
    </Blob>
    <Blob>
      <Name>python-bullseye-3.11.4.tar.gz</Name>
      <Metadata>
        <Sdk_version>3.11.4</Sdk_version>
        <Os_type>bullseye</Os_type>
        <Checksum>abc123</Checksum>
      </Metadata>
    </Blob>
    <Blob>
      <Name>python-buster-3.10.2.tar.gz</Name>
      <Metadata><Sdk_version>3.10.2</Sdk_version><Os_type>buster</Os_type></Metadata>
    </Blob>
  </Blobs>
</EnumerationResults>"#;

    #[test]
    fn test_xml_listing_by_flavor() {
        let listing = parse_listing(XML).unwrap();
        assert_eq!(listing.blobs.len(), 4);
        assert_eq!(listing.supported_versions("bullseye"), vec!["3.11.4"]);
        assert_eq!(listing.supported_versions("BUSTER"), vec!["3.10.2"]);
        assert_eq!(listing.supported_versions("stretch"), vec!["3.8.12"]);

        let blob = listing.blob_for_version("bullseye", "3.11.4").unwrap();
        assert_eq!(blob.name, "python-bullseye-3.11.4.tar.gz");
        assert_eq!(blob.checksum(), Some("abc123"));
    }

    #[test]
    fn test_json_listing() {
        let listing =
            parse_listing(r#"{"versions": ["18.17.1", "20.5.0"], "defaultVersion": "18", "extra": 1}"#)
                .unwrap();
        assert_eq!(listing.supported_versions("bullseye"), vec!["18.17.1", "20.5.0"]);
        assert_eq!(listing.default_version.as_deref(), Some("18"));
    }

    #[test]
    fn test_malformed_listing() {
        assert!(parse_listing("<Blobs><Blob></Blobs>").is_err());
        assert!(parse_listing("{\"versions\": 3}").is_err());
    }

    #[test]
    fn test_default_version_file() {
        assert_eq!(default_version_file("stretch"), "defaultVersion.txt");
        assert_eq!(default_version_file("bullseye"), "defaultVersion.bullseye.txt");
        assert_eq!(
            parse_default_version("# pinned by release\n// another comment\n\n 3.11 \n3.10\n"),
            Some("3.11".to_string())
        );
        assert_eq!(parse_default_version("# nothing\n"), None);
    }

    #[test]
    fn test_blob_name() {
        assert_eq!(blob_name("nodejs", "bullseye", "18.17.1"), "nodejs-bullseye-18.17.1.tar.gz");
        assert_eq!(blob_name("nodejs", "stretch", "18.17.1"), "nodejs-18.17.1.tar.gz");
    }
}
