//! Typed dependency specifications parsed from a manifest.
//!
//! A `dependencies` entry is either a bare URL string or a mapping with a
//! `.type` discriminator. The discriminator is checked when the manifest is
//! loaded; the remaining fields, plus the dependency name and active
//! channel injected by the loader, are deserialised into one configuration
//! struct per variant.

use camino::Utf8PathBuf;
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

use crate::channel::{ChannelId, TYPE_KEY, resolve_object};
use crate::error::{PackError, Result};

/// Discriminator of local directory dependencies.
pub const LOCAL_PATH_TYPE: &str = "LocalPath";
/// Discriminator of direct-URL archive dependencies.
pub const URL_TYPE: &str = "URL";
/// Discriminator of hosted release asset dependencies.
pub const RELEASE_ASSET_TYPE: &str = "GitHubReleaseAsset";

const EXPECTED_TYPES: &str = "LocalPath, URL, GitHubReleaseAsset";

/// Configuration of a local directory dependency.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocalPathConfig {
    /// Module directory, relative to the declaring module.
    pub path: Utf8PathBuf,
    /// Dependency name, injected by the loader.
    pub name: String,
    /// Active channel, injected by the loader.
    #[serde(default)]
    pub channel_id: Option<String>,
}

/// Configuration of a direct-URL ZIP dependency.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UrlConfig {
    /// Archive URL.
    pub url: String,
    /// Dependency name, injected by the loader.
    pub name: String,
    /// Active channel, injected by the loader.
    #[serde(default)]
    pub channel_id: Option<String>,
}

/// Configuration of a hosted release asset dependency.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseAssetConfig {
    /// Repository owner.
    pub org: String,
    /// Repository name.
    pub repo: String,
    /// Asset file name within the release.
    pub filename: String,
    /// Release version; the latest release is used when absent.
    #[serde(default, deserialize_with = "scalar_string")]
    pub version: Option<String>,
    /// Prefix joined to `version` to form the tag. `null` means no prefix.
    #[serde(default = "default_tag_prefix")]
    pub prefix: Option<String>,
    /// Dependency name, injected by the loader.
    pub name: String,
    /// Active channel, injected by the loader.
    #[serde(default)]
    pub channel_id: Option<String>,
}

impl ReleaseAssetConfig {
    /// The release tag implied by an explicit version, if one is set.
    ///
    /// # Example
    ///
    /// ```
    /// use tappack::dependency::ReleaseAssetConfig;
    ///
    /// let config = ReleaseAssetConfig {
    ///     org: "frontmatter".to_owned(),
    ///     repo: "berry-lib".to_owned(),
    ///     filename: "berry-lib.zip".to_owned(),
    ///     version: Some("1.4.0".to_owned()),
    ///     prefix: Some("v".to_owned()),
    ///     name: "berry_lib".to_owned(),
    ///     channel_id: None,
    /// };
    /// assert_eq!(config.explicit_tag().as_deref(), Some("v1.4.0"));
    /// ```
    #[must_use]
    pub fn explicit_tag(&self) -> Option<String> {
        let version = self.version.as_deref()?;
        Some(format!("{}{version}", self.prefix.as_deref().unwrap_or_default()))
    }
}

fn default_tag_prefix() -> Option<String> {
    Some("v".to_owned())
}

/// Accept versions written as YAML strings only.
///
/// Unquoted numbers are rejected: YAML reads `1.10` as the float `1.1`, so
/// the tag would silently differ from what the manifest shows.
fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(Value::Number(number)) => Err(serde::de::Error::custom(format!(
            "version {number} is a YAML number; quote it, e.g. version: \"{number}\""
        ))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a version string, found {other:?}"
        ))),
    }
}

/// A dependency after channel resolution and variant dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencySpec {
    /// A local module directory.
    LocalPath(LocalPathConfig),
    /// A ZIP archive at a direct URL.
    Url(UrlConfig),
    /// A ZIP asset attached to a hosted release.
    ReleaseAsset(ReleaseAssetConfig),
}

impl DependencySpec {
    /// Resolve the manifest entry `value` declared under `name`.
    ///
    /// Returns `Ok(None)` when the entry only carries channel overrides and
    /// none matches `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::UnknownType`] for a missing or unrecognised
    /// `.type`, and [`PackError::Configuration`] when the fields do not fit
    /// the selected variant.
    ///
    /// # Example
    ///
    /// ```
    /// use tappack::dependency::DependencySpec;
    ///
    /// let value = serde_yaml::Value::String("https://example.test/lib.zip".to_owned());
    /// let spec = DependencySpec::from_manifest("lib", &value, None)
    ///     .expect("valid")
    ///     .expect("present");
    /// assert!(matches!(spec, DependencySpec::Url(ref url) if url.name == "lib"));
    /// ```
    pub fn from_manifest(
        name: &str,
        value: &Value,
        channel: Option<&ChannelId>,
    ) -> Result<Option<Self>> {
        let origin = format!("dependency {name:?}");
        let expanded;
        let entry = if let Value::String(url) = value {
            expanded = url_shorthand(url);
            &expanded
        } else {
            value
        };

        let object = resolve_object(entry, channel, &origin)?;
        if object.is_channel_only() {
            return Ok(None);
        }

        let channel_value = channel.map_or(Value::Null, |id| Value::String(id.to_string()));
        let extra = [
            ("name", Value::String(name.to_owned())),
            ("channel_id", channel_value),
        ];
        let type_name = object.type_name.clone();
        let spec = match type_name.as_deref() {
            Some(LOCAL_PATH_TYPE) => Self::LocalPath(object.into_config(&origin, extra)?),
            Some(URL_TYPE) => Self::Url(object.into_config(&origin, extra)?),
            Some(RELEASE_ASSET_TYPE) => Self::ReleaseAsset(object.into_config(&origin, extra)?),
            other => {
                return Err(PackError::UnknownType {
                    origin,
                    value: other.map(str::to_owned),
                    expected: EXPECTED_TYPES,
                });
            }
        };
        Ok(Some(spec))
    }

    /// The dependency name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::LocalPath(config) => &config.name,
            Self::Url(config) => &config.name,
            Self::ReleaseAsset(config) => &config.name,
        }
    }
}

fn url_shorthand(url: &str) -> Value {
    let mut mapping = serde_yaml::Mapping::new();
    mapping.insert(
        Value::String(TYPE_KEY.to_owned()),
        Value::String(URL_TYPE.to_owned()),
    );
    mapping.insert(Value::String("url".to_owned()), Value::String(url.to_owned()));
    Value::Mapping(mapping)
}
