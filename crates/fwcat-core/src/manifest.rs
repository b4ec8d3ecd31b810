//! Manifest parsing for firmware packages.
//!
//! Every package carries a reserved `manifest.toml` member listing the
//! firmware images bundled alongside it as an `[[firmware]]` array of
//! tables. Parsing is deliberately permissive: unknown keys are ignored
//! for forward compatibility, and entries with missing identity fields
//! still deserialize (to empty strings) so that one bad entry never
//! hides its siblings. Field validation belongs to the loader.

use serde::Deserialize;
use thiserror::Error;

/// Reserved name of the metadata member inside every package.
pub const MANIFEST_NAME: &str = "manifest.toml";

/// Errors that can occur when decoding a package manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// The manifest text is not a well-formed TOML document.
    #[error("malformed manifest: {0}")]
    Malformed(#[from] toml::de::Error),
}

/// One `[[firmware]]` table from a package manifest.
///
/// Absent optional fields are normalized to the empty string, never
/// `None` - downstream code only ever deals with plain strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ManifestEntry {
    /// Identifier of the device type this image applies to.
    pub device_type: String,
    /// Firmware version string.
    pub version: String,
    /// Minimum version that must already be installed (advisory only).
    pub prerequisite_version: String,
    /// Hardware vendor name.
    pub vendor: String,
    /// Hardware model name.
    pub model: String,
    /// Free-text description of the image.
    pub description: String,
    /// Content checksum as published by the packager (carried, not verified).
    pub hash: String,
    /// Name of the payload member inside the package.
    pub file: String,
}

/// A decoded package manifest.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Manifest {
    /// Entries in the order they appear in the manifest text.
    ///
    /// Order matters: when two entries declare the same identity, the
    /// later one wins at catalog insertion.
    #[serde(rename = "firmware")]
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Decode a manifest from its TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Malformed`] if the text is not valid TOML.
    /// Incomplete entries are not an error here; they pass through for the
    /// loader to reject individually.
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_entries_in_textual_order() {
        let manifest = Manifest::parse(
            r#"
            [[firmware]]
            deviceType = "zigbee:lamp"
            version = "1.0.0"
            file = "lamp-1.bin"

            [[firmware]]
            deviceType = "zigbee:lamp"
            version = "2.0.0"
            vendor = "Acme"
            file = "lamp-2.bin"
            "#,
        )
        .unwrap();

        assert_eq!(manifest.entries.len(), 2);
        assert_eq!(manifest.entries[0].version, "1.0.0");
        assert_eq!(manifest.entries[1].version, "2.0.0");
        assert_eq!(manifest.entries[1].vendor, "Acme");
    }

    #[test]
    fn absent_optional_fields_become_empty_strings() {
        let manifest = Manifest::parse(
            r#"
            [[firmware]]
            deviceType = "zigbee:plug"
            version = "0.3"
            file = "plug.bin"
            "#,
        )
        .unwrap();

        let entry = &manifest.entries[0];
        assert_eq!(entry.prerequisite_version, "");
        assert_eq!(entry.vendor, "");
        assert_eq!(entry.model, "");
        assert_eq!(entry.description, "");
        assert_eq!(entry.hash, "");
    }

    #[test]
    fn incomplete_entries_pass_through() {
        // Validation is the loader's job - a missing version must not fail
        // the whole document.
        let manifest = Manifest::parse(
            r#"
            [[firmware]]
            deviceType = "zigbee:lock"
            file = "lock.bin"
            "#,
        )
        .unwrap();

        assert_eq!(manifest.entries.len(), 1);
        assert_eq!(manifest.entries[0].version, "");
    }

    #[test]
    fn unknown_keys_are_tolerated() {
        let manifest = Manifest::parse(
            r#"
            schemaVersion = 3

            [[firmware]]
            deviceType = "zigbee:sensor"
            version = "1.1"
            file = "sensor.bin"
            releaseChannel = "beta"
            "#,
        )
        .unwrap();

        assert_eq!(manifest.entries.len(), 1);
    }

    #[test]
    fn rejects_non_toml_text() {
        assert!(matches!(
            Manifest::parse("<Directory><DirectoryEntry/></Directory>"),
            Err(ManifestError::Malformed(_))
        ));
    }

    #[test]
    fn empty_document_has_no_entries() {
        let manifest = Manifest::parse("").unwrap();
        assert!(manifest.entries.is_empty());
    }
}
