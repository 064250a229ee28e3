//! Release-channel override resolution for manifest objects.
//!
//! Any manifest object (the manifest root, the `autoexec` block, a
//! dependency, a patch) may carry a `.channels` table mapping channel ids to
//! replacement objects.
//! When the active channel has an entry, that entry replaces the object's
//! own fields wholesale; otherwise the object's own fields apply. Keys
//! starting with `.` are structural and never reach the typed
//! configuration structs.

use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use std::fmt;

use crate::error::{PackError, Result};

/// Key holding the per-channel override table.
pub const CHANNELS_KEY: &str = ".channels";

/// Key holding an object's type discriminator.
pub const TYPE_KEY: &str = ".type";

/// Identifier of a release channel such as `development` or `qa`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelId(String);

impl ChannelId {
    /// Create a channel id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A manifest object after channel resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedObject {
    /// The `.type` discriminator of the effective object, if any.
    pub type_name: Option<String>,
    /// The effective object's non-structural fields.
    pub fields: Mapping,
    /// Whether the original object declared a `.channels` table.
    pub has_channels: bool,
}

impl ResolvedObject {
    /// Whether the object only exists for channels other than the active
    /// one.
    ///
    /// Such objects resolve to "no object" and are skipped by callers.
    #[must_use]
    pub const fn is_channel_only(&self) -> bool {
        self.has_channels && self.type_name.is_none()
    }

    /// Deserialise the fields into a typed configuration struct.
    ///
    /// `extra` entries are injected before deserialisation and take
    /// precedence over same-named fields.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::Configuration`] when a field is missing, has the
    /// wrong shape, or is not recognised by `T`.
    pub fn into_config<T: DeserializeOwned>(
        self,
        origin: &str,
        extra: impl IntoIterator<Item = (&'static str, Value)>,
    ) -> Result<T> {
        let mut fields = self.fields;
        for (key, value) in extra {
            fields.insert(Value::String(key.to_owned()), value);
        }
        serde_yaml::from_value(Value::Mapping(fields))
            .map_err(|e| PackError::configuration(origin, e))
    }
}

/// Resolve the effective form of `value` for `channel`.
///
/// # Errors
///
/// Returns [`PackError::Configuration`] when `value`, its `.channels` table,
/// or the selected channel entry is not a mapping, or when `.type` is not a
/// string.
///
/// # Example
///
/// ```
/// use tappack::channel::{ChannelId, resolve_object};
///
/// let value: serde_yaml::Value = serde_yaml::from_str(
///     "{.channels: {dev: {.type: URL, url: 'https://example.test/dev.zip'}}}",
/// )
/// .expect("yaml");
/// let dev = resolve_object(&value, Some(&ChannelId::from("dev")), "dep").expect("dev");
/// assert_eq!(dev.type_name.as_deref(), Some("URL"));
///
/// let prod = resolve_object(&value, Some(&ChannelId::from("prod")), "dep").expect("prod");
/// assert!(prod.is_channel_only());
/// ```
pub fn resolve_object(
    value: &Value,
    channel: Option<&ChannelId>,
    origin: &str,
) -> Result<ResolvedObject> {
    let object = as_mapping(value, origin)?;
    let channels = match object.get(CHANNELS_KEY) {
        None | Some(Value::Null) => None,
        Some(table) => Some(as_mapping(table, &format!("{origin} {CHANNELS_KEY}"))?),
    };

    let selected = channel.and_then(|id| {
        channels.and_then(|table| table.get(Value::String(id.as_str().to_owned())))
    });
    let effective = match selected {
        Some(entry) => as_mapping(entry, &format!("{origin} channel override"))?,
        None => object,
    };

    let type_name = match effective.get(TYPE_KEY) {
        None | Some(Value::Null) => None,
        Some(Value::String(name)) => Some(name.clone()),
        Some(other) => {
            return Err(PackError::configuration(
                origin,
                format!("{TYPE_KEY} must be a string, found {other:?}"),
            ));
        }
    };

    let fields = effective
        .iter()
        .filter(|(key, _)| !is_structural(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Ok(ResolvedObject {
        type_name,
        fields,
        has_channels: channels.is_some_and(|table| !table.is_empty()),
    })
}

fn as_mapping<'a>(value: &'a Value, origin: &str) -> Result<&'a Mapping> {
    match value {
        Value::Mapping(mapping) => Ok(mapping),
        other => Err(PackError::configuration(
            origin,
            format!("expected a mapping, found {other:?}"),
        )),
    }
}

fn is_structural(key: &Value) -> bool {
    key.as_str().is_some_and(|k| k.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde::Deserialize;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).expect("valid yaml")
    }

    fn field<'a>(object: &'a ResolvedObject, key: &str) -> Option<&'a str> {
        object.fields.get(key).and_then(Value::as_str)
    }

    const CHANNEL_ONLY: &str = r"
.channels:
  dev: {.type: URL, url: dev-url}
  prod: {.type: URL, url: prod-url}
";

    #[rstest]
    #[case::dev("dev", "dev-url")]
    #[case::prod("prod", "prod-url")]
    fn selects_matching_channel(#[case] channel: &str, #[case] expected: &str) {
        let object = resolve_object(&yaml(CHANNEL_ONLY), Some(&ChannelId::from(channel)), "dep")
            .expect("resolves");
        assert_eq!(object.type_name.as_deref(), Some("URL"));
        assert_eq!(field(&object, "url"), Some(expected));
        assert_eq!(object.fields.len(), 1);
    }

    #[rstest]
    #[case::unlisted(Some("qa"))]
    #[case::no_channel(None)]
    fn unlisted_channel_yields_no_object(#[case] channel: Option<&str>) {
        let id = channel.map(ChannelId::from);
        let object = resolve_object(&yaml(CHANNEL_ONLY), id.as_ref(), "dep").expect("resolves");
        assert!(object.is_channel_only());
    }

    #[test]
    fn unmatched_channel_falls_back_to_own_fields() {
        let value = yaml(
            r"
.type: URL
url: default-url
.channels:
  dev: {.type: URL, url: dev-url}
",
        );
        let object =
            resolve_object(&value, Some(&ChannelId::from("prod")), "dep").expect("resolves");
        assert!(!object.is_channel_only());
        assert_eq!(field(&object, "url"), Some("default-url"));
        assert!(!object.fields.contains_key(CHANNELS_KEY));
    }

    #[test]
    fn matched_channel_replaces_fields_wholesale() {
        let value = yaml(
            r"
.type: GitHubReleaseAsset
org: frontmatter
repo: berry
filename: berry.zip
.channels:
  dev: {.type: URL, url: dev-url}
",
        );
        let object =
            resolve_object(&value, Some(&ChannelId::from("dev")), "dep").expect("resolves");
        assert_eq!(object.type_name.as_deref(), Some("URL"));
        assert!(object.fields.get("org").is_none());
    }

    #[rstest]
    #[case::scalar("just-a-string")]
    #[case::list("[1, 2]")]
    #[case::bad_channels("{.channels: [dev]}")]
    #[case::bad_type("{.type: [URL]}")]
    fn rejects_malformed_objects(#[case] text: &str) {
        let result = resolve_object(&yaml(text), Some(&ChannelId::from("dev")), "dep");
        assert!(matches!(result, Err(PackError::Configuration { .. })));
    }

    #[derive(Debug, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct NamedUrl {
        url: String,
        name: String,
    }

    #[test]
    fn into_config_injects_extra_fields() {
        let object = resolve_object(&yaml("{.type: URL, url: u}"), None, "dep").expect("resolves");
        let named: NamedUrl = object
            .into_config("dep", [("name", Value::String("lib".to_owned()))])
            .expect("deserialises");
        assert_eq!(named.url, "u");
        assert_eq!(named.name, "lib");
    }

    #[test]
    fn into_config_rejects_unknown_fields() {
        let object = resolve_object(&yaml("{.type: URL, url: u, colour: red}"), None, "dep")
            .expect("resolves");
        let result: Result<NamedUrl> =
            object.into_config("dep", [("name", Value::String("lib".to_owned()))]);
        let err = result.expect_err("unknown field");
        assert!(err.to_string().contains("colour"), "{err}");
    }
}
