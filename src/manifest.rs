//! Module manifest documents.
//!
//! A module directory may contain a `manifest.yaml` declaring its name,
//! dependencies, version patches and bootstrap settings. A `.channels` table
//! at the top level is resolved on parse, like any other manifest object.
//! Entries stay as raw YAML here; their own channel resolution and variant
//! dispatch happen when the loader turns them into typed values.

use camino::Utf8Path;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::channel::{ChannelId, resolve_object};
use crate::error::{PackError, Result};

/// File name of the manifest within a module directory.
pub const MANIFEST_FILE_NAME: &str = "manifest.yaml";

/// Raw contents of a manifest.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManifestDocument {
    /// Module name; optional for modules loaded as named dependencies.
    pub name: Option<String>,
    /// Dependency entries keyed by name, in declaration order.
    pub dependencies: Mapping,
    /// Patch entries in declaration order.
    pub patches: Vec<Value>,
    /// Bootstrap settings, possibly with channel overrides.
    pub autoexec: Option<Value>,
    /// Accepted for compatibility with existing manifests; unused.
    pub code_mask: Option<Value>,
}

impl ManifestDocument {
    /// Parse manifest text for `channel`. An empty document is an empty
    /// manifest.
    ///
    /// When the document's top-level `.channels` table has an entry for
    /// `channel`, that entry replaces the document.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::Configuration`] when the text is not YAML, is not
    /// a mapping, or has unknown top-level keys.
    ///
    /// # Example
    ///
    /// ```
    /// use tappack::channel::ChannelId;
    /// use tappack::manifest::ManifestDocument;
    ///
    /// let text = "name: blinds\n.channels:\n  dev: {name: blinds-dev}\n";
    /// let doc = ManifestDocument::parse(text, None, "manifest.yaml").expect("valid");
    /// assert_eq!(doc.name.as_deref(), Some("blinds"));
    ///
    /// let dev = ChannelId::from("dev");
    /// let doc = ManifestDocument::parse(text, Some(&dev), "manifest.yaml").expect("valid");
    /// assert_eq!(doc.name.as_deref(), Some("blinds-dev"));
    /// ```
    pub fn parse(text: &str, channel: Option<&ChannelId>, origin: &str) -> Result<Self> {
        let value: Value =
            serde_yaml::from_str(text).map_err(|e| PackError::configuration(origin, e))?;
        if value.is_null() {
            return Ok(Self::default());
        }
        resolve_object(&value, channel, origin)?.into_config(origin, std::iter::empty())
    }

    /// Read and parse the manifest at `path` for `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::Io`] when the file cannot be read, or any error
    /// from [`ManifestDocument::parse`].
    pub fn read(path: &Utf8Path, channel: Option<&ChannelId>) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| PackError::io(path, e))?;
        Self::parse(&text, channel, path.as_str())
    }

    /// Resolve the `autoexec` block for `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::Configuration`] when the block is not a mapping
    /// or has unknown fields.
    pub fn autoexec_config(
        &self,
        channel: Option<&ChannelId>,
        origin: &str,
    ) -> Result<AutoexecConfig> {
        let Some(value) = &self.autoexec else {
            return Ok(AutoexecConfig::default());
        };
        if value.is_null() {
            return Ok(AutoexecConfig::default());
        }
        let origin = format!("{origin} autoexec");
        resolve_object(value, channel, &origin)?.into_config(&origin, std::iter::empty())
    }
}

/// Settings for the generated bootstrap file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AutoexecConfig {
    /// Whether the bootstrap imports the root module after extending the
    /// search path.
    pub import: bool,
}
