//! Loading module directories and their dependency graphs.
//!
//! The loader reads a module's manifest, resolves channel overrides, turns
//! dependency entries into [`Source`]s and compiles version patches. Local
//! dependencies are loaded eagerly, so every configuration error in the
//! graph surfaces before any file is collected or downloaded.
//!
//! The canonical directory of every module on the current loading path is
//! kept on a stack. Reaching a directory already on the stack is a cycle and
//! fails the load; reaching the same directory through independent branches
//! loads it once per branch.

use camino::{Utf8Path, Utf8PathBuf};

use crate::channel::ChannelId;
use crate::dependency::DependencySpec;
use crate::error::{PackError, Result};
use crate::events::{BuildEvent, BuildObserver};
use crate::manifest::{AutoexecConfig, MANIFEST_FILE_NAME, ManifestDocument};
use crate::patch::{PatchSet, VersionPatch};
use crate::source::hosted::{HostedReleaseAssetSource, HostedService};
use crate::source::local::LocalModule;
use crate::source::remote::RemoteArchiveSource;
use crate::source::Source;

/// Loads module trees for one channel.
pub struct Loader<'a> {
    channel: Option<ChannelId>,
    service: HostedService,
    observer: &'a mut dyn BuildObserver,
    stack: Vec<Utf8PathBuf>,
}

impl<'a> Loader<'a> {
    /// Create a loader resolving overrides for `channel`.
    pub fn new(
        channel: Option<ChannelId>,
        service: HostedService,
        observer: &'a mut dyn BuildObserver,
    ) -> Self {
        Self {
            channel,
            service,
            observer,
            stack: Vec::new(),
        }
    }

    /// Load the root module at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::MissingModuleName`] when the root manifest has
    /// no `name`, [`PackError::CyclicDependency`] when local dependencies
    /// loop, and any filesystem or configuration error found in the graph.
    pub fn load_root(&mut self, path: &Utf8Path) -> Result<LocalModule> {
        self.load_module(path, None)
    }

    fn load_module(&mut self, path: &Utf8Path, name: Option<String>) -> Result<LocalModule> {
        let root = canonical_dir(path)?;
        if let Some(position) = self.stack.iter().position(|dir| *dir == root) {
            let mut chain: Vec<Utf8PathBuf> = self.stack.iter().skip(position).cloned().collect();
            chain.push(root);
            return Err(PackError::CyclicDependency { chain });
        }
        self.stack.push(root.clone());
        let loaded = self.load_directory(root, name);
        self.stack.pop();
        loaded
    }

    fn load_directory(
        &mut self,
        root: Utf8PathBuf,
        declared_name: Option<String>,
    ) -> Result<LocalModule> {
        let manifest_path = root.join(MANIFEST_FILE_NAME);
        if !manifest_path.is_file() {
            let name = declared_name
                .or_else(|| root.file_name().map(str::to_owned))
                .ok_or_else(|| PackError::MissingModuleName {
                    path: manifest_path.clone(),
                })?;
            self.observer.on_event(BuildEvent::MissingManifest {
                path: root.clone(),
                name: name.clone(),
            });
            return Ok(LocalModule {
                patches: PatchSet::new(name.as_str(), Vec::new()),
                name,
                root,
                channel_id: self.channel.clone(),
                dependencies: Vec::new(),
                autoexec: AutoexecConfig::default(),
            });
        }

        let document = ManifestDocument::read(&manifest_path, self.channel.as_ref())?;
        let name = declared_name
            .or_else(|| document.name.clone())
            .ok_or_else(|| PackError::MissingModuleName {
                path: manifest_path.clone(),
            })?;
        let dependencies = self.load_dependencies(&root, &name, &document)?;
        let patches = self.load_patches(&name, &document)?;
        let autoexec = document.autoexec_config(self.channel.as_ref(), manifest_path.as_str())?;

        Ok(LocalModule {
            name,
            root,
            channel_id: self.channel.clone(),
            dependencies,
            patches,
            autoexec,
        })
    }

    fn load_dependencies(
        &mut self,
        root: &Utf8Path,
        module: &str,
        document: &ManifestDocument,
    ) -> Result<Vec<Source>> {
        let mut dependencies = Vec::with_capacity(document.dependencies.len());
        for (key, value) in &document.dependencies {
            let dependency = key.as_str().ok_or_else(|| {
                PackError::configuration(
                    format!("dependencies of {module}"),
                    format!("dependency names must be strings, found {key:?}"),
                )
            })?;
            check_dependency_name(dependency, module)?;
            let Some(spec) = DependencySpec::from_manifest(dependency, value, self.channel.as_ref())?
            else {
                self.unmatched(format!("dependency {dependency:?} of {module}"));
                continue;
            };
            dependencies.push(self.resolve(root, spec)?);
        }
        Ok(dependencies)
    }

    fn load_patches(&mut self, module: &str, document: &ManifestDocument) -> Result<PatchSet> {
        let mut patches = Vec::with_capacity(document.patches.len());
        for (index, value) in document.patches.iter().enumerate() {
            let origin = format!("patch #{index} of {module}");
            match VersionPatch::from_manifest(value, self.channel.as_ref(), &origin)? {
                Some(patch) => patches.push(patch),
                None => self.unmatched(origin),
            }
        }
        Ok(PatchSet::new(module, patches))
    }

    fn resolve(&mut self, root: &Utf8Path, spec: DependencySpec) -> Result<Source> {
        let source = match spec {
            DependencySpec::LocalPath(config) => {
                let module = self.load_module(&root.join(&config.path), Some(config.name))?;
                Source::Local(Box::new(module))
            }
            DependencySpec::Url(config) => {
                Source::Remote(RemoteArchiveSource::new(config.name, config.url))
            }
            DependencySpec::ReleaseAsset(config) => Source::Hosted(HostedReleaseAssetSource::new(
                config,
                self.service.clone(),
            )),
        };
        Ok(source)
    }

    fn unmatched(&mut self, origin: String) {
        self.observer.on_event(BuildEvent::ChannelOverrideUnmatched {
            origin,
            channel_id: self.channel.as_ref().map(ToString::to_string),
        });
    }
}

/// A dependency name becomes one archive directory, so it must be a single
/// plain path segment.
fn check_dependency_name(name: &str, module: &str) -> Result<()> {
    let plain = !matches!(name.trim(), "" | "." | "..") && !name.contains(['/', '\\']);
    if plain {
        return Ok(());
    }
    Err(PackError::configuration(
        format!("dependencies of {module}"),
        format!("dependency name {name:?} must be a single directory name"),
    ))
}

/// Check that `path` is an existing directory and canonicalise it.
fn canonical_dir(path: &Utf8Path) -> Result<Utf8PathBuf> {
    if !path.exists() {
        return Err(PackError::Filesystem {
            path: path.to_path_buf(),
            reason: "does not exist",
        });
    }
    if !path.is_dir() {
        return Err(PackError::Filesystem {
            path: path.to_path_buf(),
            reason: "is not a directory",
        });
    }
    path.canonicalize_utf8().map_err(|e| PackError::io(path, e))
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
