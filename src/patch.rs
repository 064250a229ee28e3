//! Version-string injection into collected text files.
//!
//! A manifest `patches` entry of type `Version` names a file and a regex
//! template containing a `{version}` placeholder. At build time every match
//! in that file has its semantic version rewritten: the patch number is
//! incremented, the active channel becomes the pre-release label, and the
//! build timestamp becomes the build metadata. Characters matched outside
//! the version group are preserved.
//!
//! Patching is a plain string rewrite. Running the same patch over text it
//! already rewrote increments the version again.

use regex::{Captures, Regex};
use serde::Deserialize;
use serde_yaml::Value;

use crate::archive_path::ArchivePath;
use crate::channel::{ChannelId, resolve_object};
use crate::error::{PackError, Result};
use crate::events::{BuildEvent, BuildObserver};
use crate::file_map::FileMap;

/// Discriminator of version patches in the manifest.
pub const VERSION_PATCH_TYPE: &str = "Version";

/// Placeholder replaced by [`VERSION_PATTERN`] in patch templates.
const VERSION_PLACEHOLDER: &str = "{version}";

/// Semantic version grammar with named capture groups.
pub const VERSION_PATTERN: &str = concat!(
    r"(?P<version>(?P<major>0|[1-9][0-9]*)\.",
    r"(?P<minor>0|[1-9][0-9]*)\.",
    r"(?P<patch>0|[1-9][0-9]*)",
    r"(?:-(?P<pre>[0-9a-zA-Z-]+(?:\.[0-9a-zA-Z-]+)*))?",
    r"(?:\+(?P<build>[0-9a-zA-Z-]+(?:\.[0-9a-zA-Z-]+)*))?)"
);

/// `chrono` format of the build-metadata label.
pub const BUILD_LABEL_FORMAT: &str = "%Y.%m.%d-%H.%M.%S";

/// Manifest configuration of a `Version` patch.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VersionPatchConfig {
    /// Target file, relative to the declaring module.
    pub path: String,
    /// Regex template containing `{version}`.
    pub pattern: String,
    /// Channel injected by the loader.
    #[serde(default)]
    pub channel_id: Option<String>,
    /// Text encoding of the target file.
    #[serde(default = "default_encoding")]
    pub encoding: String,
    /// Amount added to the patch number.
    #[serde(default = "default_inc_patch")]
    pub inc_patch: u64,
}

fn default_encoding() -> String {
    "utf-8".to_owned()
}

const fn default_inc_patch() -> u64 {
    1
}

/// A compiled version patch.
#[derive(Debug, Clone)]
pub struct VersionPatch {
    path: ArchivePath,
    regex: Regex,
    channel_id: Option<ChannelId>,
    inc_patch: u64,
}

impl VersionPatch {
    /// Compile a patch from its configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::Configuration`] when the template lacks
    /// `{version}`, has an unescaped brace or does not compile, when the
    /// encoding is not UTF-8, or when the path leaves the module.
    ///
    /// # Example
    ///
    /// ```
    /// use tappack::patch::{VersionPatch, VersionPatchConfig};
    ///
    /// let patch = VersionPatch::new(VersionPatchConfig {
    ///     path: "version.be".to_owned(),
    ///     pattern: "VERSION = '{version}'".to_owned(),
    ///     channel_id: Some("qa".to_owned()),
    ///     encoding: "utf-8".to_owned(),
    ///     inc_patch: 1,
    /// })
    /// .expect("valid patch");
    /// let (text, count) = patch.apply_text_at("VERSION = '1.2.3'", "2026.10.17-09.30.00");
    /// assert_eq!(text, "VERSION = '1.2.4-qa+2026.10.17-09.30.00'");
    /// assert_eq!(count, 1);
    /// ```
    pub fn new(config: VersionPatchConfig) -> Result<Self> {
        let origin = format!("patch for {}", config.path);
        if !is_utf8_label(&config.encoding) {
            return Err(PackError::configuration(
                origin,
                format!("unsupported encoding {:?}; only UTF-8 is supported", config.encoding),
            ));
        }
        let path = ArchivePath::new(&config.path);
        if path.is_root() || path.climbs_out() {
            return Err(PackError::configuration(
                origin,
                "patch path must name a file inside the module",
            ));
        }
        let source = expand_template(&config.pattern)
            .map_err(|reason| PackError::configuration(&origin, reason))?;
        let regex = Regex::new(&source).map_err(|e| PackError::configuration(&origin, e))?;
        Ok(Self {
            path,
            regex,
            channel_id: config.channel_id.map(ChannelId::new),
            inc_patch: config.inc_patch,
        })
    }

    /// Resolve a manifest `patches` entry for `channel`.
    ///
    /// Returns `Ok(None)` when the entry only carries channel overrides and
    /// none matches.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::UnknownType`] for a missing or unrecognised
    /// `.type`, or any error from [`VersionPatch::new`].
    pub fn from_manifest(
        value: &Value,
        channel: Option<&ChannelId>,
        origin: &str,
    ) -> Result<Option<Self>> {
        let object = resolve_object(value, channel, origin)?;
        if object.is_channel_only() {
            return Ok(None);
        }
        let type_name = object.type_name.clone();
        match type_name.as_deref() {
            Some(VERSION_PATCH_TYPE) => {
                let channel_value = channel.map_or(Value::Null, |id| Value::String(id.to_string()));
                let config = object.into_config(origin, [("channel_id", channel_value)])?;
                Self::new(config).map(Some)
            }
            other => Err(PackError::UnknownType {
                origin: origin.to_owned(),
                value: other.map(str::to_owned),
                expected: VERSION_PATCH_TYPE,
            }),
        }
    }

    /// Target file, relative to the declaring module.
    #[must_use]
    pub const fn path(&self) -> &ArchivePath {
        &self.path
    }

    /// Rewrite every version match in `data`, stamping the current local
    /// time as build metadata.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::Encoding`] when `data` is not valid UTF-8.
    pub fn apply(&self, target: &ArchivePath, data: &[u8]) -> Result<(Vec<u8>, usize)> {
        let build = chrono::Local::now().format(BUILD_LABEL_FORMAT).to_string();
        let text = std::str::from_utf8(data).map_err(|_| PackError::Encoding {
            path: target.to_string(),
            encoding: "utf-8".to_owned(),
        })?;
        let (patched, count) = self.apply_text_at(text, &build);
        Ok((patched.into_bytes(), count))
    }

    /// Rewrite every version match in `text` using `build` as build
    /// metadata. Returns the new text and the number of matches.
    #[must_use]
    pub fn apply_text_at(&self, text: &str, build: &str) -> (String, usize) {
        let mut count = 0;
        let patched = self.regex.replace_all(text, |caps: &Captures<'_>| {
            count += 1;
            self.rewrite_match(caps, build)
        });
        (patched.into_owned(), count)
    }

    fn rewrite_match(&self, caps: &Captures<'_>, build: &str) -> String {
        let Some(whole) = caps.get(0) else {
            return String::new();
        };
        let (Some(version), Some(next)) = (caps.name("version"), self.next_version(caps, build))
        else {
            return whole.as_str().to_owned();
        };
        let start = version.start() - whole.start();
        let end = version.end() - whole.start();
        let head = whole.as_str().get(..start).unwrap_or_default();
        let tail = whole.as_str().get(end..).unwrap_or_default();
        format!("{head}{next}{tail}")
    }

    fn next_version(&self, caps: &Captures<'_>, build: &str) -> Option<String> {
        let number = |name: &str| caps.name(name)?.as_str().parse::<u64>().ok();
        let major = number("major")?;
        let minor = number("minor")?;
        let patch = number("patch")?.checked_add(self.inc_patch)?;
        let pre = self
            .channel_id
            .as_ref()
            .map(|id| format!("-{id}"))
            .unwrap_or_default();
        Some(format!("{major}.{minor}.{patch}{pre}+{build}"))
    }
}

/// The patches declared by one module, grouped by target path.
#[derive(Debug, Clone, Default)]
pub struct PatchSet {
    module: String,
    groups: Vec<(ArchivePath, Vec<VersionPatch>)>,
}

impl PatchSet {
    /// Group `patches` declared by `module` by target path, keeping
    /// first-declaration order.
    #[must_use]
    pub fn new(module: impl Into<String>, patches: Vec<VersionPatch>) -> Self {
        let mut groups: Vec<(ArchivePath, Vec<VersionPatch>)> = Vec::new();
        for patch in patches {
            match groups.iter_mut().find(|(path, _)| *path == patch.path) {
                Some((_, group)) => group.push(patch),
                None => groups.push((patch.path.clone(), vec![patch])),
            }
        }
        Self {
            module: module.into(),
            groups,
        }
    }

    #[cfg(test)]
    pub(crate) fn target_paths(&self) -> Vec<&str> {
        self.groups.iter().map(|(path, _)| path.as_str()).collect()
    }

    /// Apply every patch whose target exists below `prefix` in `files`.
    ///
    /// Missing targets are reported as [`BuildEvent::PatchTargetMissing`]
    /// and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::Encoding`] when a target is not valid UTF-8.
    pub fn apply(
        &self,
        files: &mut FileMap,
        prefix: &ArchivePath,
        observer: &mut dyn BuildObserver,
    ) -> Result<()> {
        for (path, group) in &self.groups {
            let target = prefix.join(path.as_str());
            let Some(contents) = files.get_mut(&target) else {
                observer.on_event(BuildEvent::PatchTargetMissing {
                    module: self.module.clone(),
                    path: target,
                });
                continue;
            };
            for patch in group {
                let (patched, replacements) = patch.apply(&target, contents)?;
                *contents = patched;
                observer.on_event(BuildEvent::Patched {
                    path: target.clone(),
                    replacements,
                });
            }
        }
        Ok(())
    }
}

/// Substitute `{version}` and unescape doubled braces.
fn expand_template(template: &str) -> std::result::Result<String, String> {
    let mut expanded = String::with_capacity(template.len() + VERSION_PATTERN.len());
    let mut found = false;
    let mut rest = template;
    while let Some(position) = rest.find(['{', '}']) {
        let (head, tail) = rest.split_at(position);
        expanded.push_str(head);
        if let Some(after) = tail.strip_prefix(VERSION_PLACEHOLDER) {
            expanded.push_str(VERSION_PATTERN);
            found = true;
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{{") {
            expanded.push('{');
            rest = after;
        } else if let Some(after) = tail.strip_prefix("}}") {
            expanded.push('}');
            rest = after;
        } else {
            let offset = template.len() - tail.len();
            return Err(format!(
                "unescaped brace at offset {offset} in pattern {template:?}; write {{{{ or }}}} for a literal brace"
            ));
        }
    }
    expanded.push_str(rest);
    if found {
        Ok(expanded)
    } else {
        Err(format!("pattern {template:?} does not contain {VERSION_PLACEHOLDER}"))
    }
}

fn is_utf8_label(encoding: &str) -> bool {
    let label: String = encoding
        .chars()
        .filter(|c| !matches!(c, '-' | '_'))
        .collect::<String>()
        .to_ascii_lowercase();
    label == "utf8"
}

#[cfg(test)]
#[path = "patch_tests.rs"]
mod tests;
