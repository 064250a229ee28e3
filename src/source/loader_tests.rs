//! Unit tests for module loading.

use super::*;
use crate::events::RecordingObserver;
use rstest::{fixture, rstest};
use std::fs;
use tempfile::TempDir;

struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    fn module(&self, relative: &str, manifest: Option<&str>) -> Utf8PathBuf {
        let path = self.root.join(relative);
        fs::create_dir_all(&path).expect("module dir");
        if let Some(text) = manifest {
            fs::write(path.join(MANIFEST_FILE_NAME), text).expect("manifest");
        }
        path
    }
}

#[fixture]
fn workspace() -> Workspace {
    let dir = tempfile::tempdir().expect("temp dir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
        .expect("utf-8 temp dir")
        .canonicalize_utf8()
        .expect("canonical temp dir");
    Workspace { _dir: dir, root }
}

fn load(path: &Utf8Path, channel: Option<&str>) -> (Result<LocalModule>, RecordingObserver) {
    let mut observer = RecordingObserver::default();
    let result = Loader::new(
        channel.map(ChannelId::from),
        HostedService::default(),
        &mut observer,
    )
    .load_root(path);
    (result, observer)
}

fn dependency_names(module: &LocalModule) -> Vec<&str> {
    module.dependencies().iter().map(Source::name).collect()
}

#[rstest]
fn manifest_free_root_is_named_after_its_directory(workspace: Workspace) {
    let path = workspace.module("blinds", None);

    let (result, observer) = load(&path, None);

    let module = result.expect("loads");
    assert_eq!(module.name(), "blinds");
    assert!(module.dependencies().is_empty());
    assert!(module.patches().target_paths().is_empty());
    assert_eq!(
        observer.events,
        [BuildEvent::MissingManifest {
            path,
            name: "blinds".to_owned()
        }]
    );
}

#[rstest]
fn root_manifest_must_name_the_module(workspace: Workspace) {
    let path = workspace.module("app", Some("dependencies: {}\n"));

    let (result, _) = load(&path, None);

    assert!(matches!(result, Err(PackError::MissingModuleName { .. })));
}

#[rstest]
#[case::missing("nowhere", "does not exist")]
#[case::file("plain.txt", "is not a directory")]
fn rejects_unusable_module_paths(
    workspace: Workspace,
    #[case] relative: &str,
    #[case] expected: &str,
) {
    fs::write(workspace.root.join("plain.txt"), "x").expect("file");

    let (result, _) = load(&workspace.root.join(relative), None);

    assert!(matches!(
        result,
        Err(PackError::Filesystem { reason, .. }) if reason == expected
    ));
}

#[rstest]
fn local_paths_resolve_against_the_declaring_module(workspace: Workspace) {
    workspace.module("shared/lib", Some("name: ignored\n"));
    let app = workspace.module(
        "apps/app",
        Some("name: app\ndependencies:\n  helpers: {.type: LocalPath, path: ../../shared/lib}\n"),
    );

    let (result, _) = load(&app, None);

    let module = result.expect("loads");
    assert_eq!(dependency_names(&module), ["helpers"]);
    let Some(Source::Local(helpers)) = module.dependencies().first() else {
        panic!("expected a local dependency");
    };
    assert_eq!(helpers.root(), workspace.root.join("shared/lib").as_path());
}

#[rstest]
fn channel_only_dependencies_are_dropped_with_a_warning(workspace: Workspace) {
    let app = workspace.module(
        "app",
        Some(concat!(
            "name: app\n",
            "dependencies:\n",
            "  lib:\n",
            "    .channels:\n",
            "      dev: {.type: URL, url: 'https://example.test/dev.zip'}\n",
            "      prod: {.type: URL, url: 'https://example.test/prod.zip'}\n",
        )),
    );

    let (dev_result, _) = load(&app, Some("dev"));
    let dev = dev_result.expect("dev loads");
    let Some(Source::Remote(remote)) = dev.dependencies().first() else {
        panic!("expected a remote dependency");
    };
    assert_eq!(remote.url(), "https://example.test/dev.zip");

    let (qa, observer) = load(&app, Some("qa"));
    assert!(qa.expect("qa loads").dependencies().is_empty());
    assert!(observer.events.iter().any(|e| matches!(
        e,
        BuildEvent::ChannelOverrideUnmatched { channel_id: Some(id), .. } if id == "qa"
    )));
}

#[rstest]
fn direct_self_reference_is_a_cycle(workspace: Workspace) {
    let app = workspace.module(
        "app",
        Some("name: app\ndependencies:\n  me: {.type: LocalPath, path: .}\n"),
    );

    let (result, _) = load(&app, None);

    let Err(PackError::CyclicDependency { chain }) = result else {
        panic!("expected a cycle");
    };
    assert_eq!(chain, [app.clone(), app]);
}

#[rstest]
fn transitive_cycles_name_the_chain(workspace: Workspace) {
    let a = workspace.module(
        "a",
        Some("name: a\ndependencies:\n  b: {.type: LocalPath, path: ../b}\n"),
    );
    let b = workspace.module(
        "b",
        Some("name: b\ndependencies:\n  a: {.type: LocalPath, path: ../a}\n"),
    );

    let (result, _) = load(&a, None);

    let err = result.expect_err("cycle");
    assert!(err.to_string().starts_with("cyclic dependency: "), "{err}");
    let PackError::CyclicDependency { chain } = err else {
        panic!("expected a cycle");
    };
    assert_eq!(chain, [a.clone(), b, a]);
}

#[rstest]
fn shared_dependencies_are_loaded_per_branch(workspace: Workspace) {
    workspace.module("d", None);
    workspace.module(
        "b",
        Some("name: b\ndependencies:\n  d: {.type: LocalPath, path: ../d}\n"),
    );
    workspace.module(
        "c",
        Some("name: c\ndependencies:\n  d: {.type: LocalPath, path: ../d}\n"),
    );
    let a = workspace.module(
        "a",
        Some(concat!(
            "name: a\n",
            "dependencies:\n",
            "  b: {.type: LocalPath, path: ../b}\n",
            "  c: {.type: LocalPath, path: ../c}\n",
        )),
    );

    let (result, _) = load(&a, None);

    let module = result.expect("diamonds are not cycles");
    assert_eq!(dependency_names(&module), ["b", "c"]);
}

#[rstest]
#[case::parent("'..'")]
#[case::current("'.'")]
#[case::nested("'lib/../..'")]
#[case::empty("''")]
#[case::backslash("'a\\b'")]
fn dependency_names_must_be_single_segments(workspace: Workspace, #[case] key: &str) {
    workspace.module("lib", None);
    let app = workspace.module(
        "app",
        Some(&format!(
            "name: app\ndependencies:\n  {key}: {{.type: LocalPath, path: ../lib}}\n"
        )),
    );

    let (result, _) = load(&app, None);

    let Err(PackError::Configuration { reason, .. }) = result else {
        panic!("expected a configuration error for {key}");
    };
    assert!(reason.contains("single directory name"), "{reason}");
}

#[rstest]
fn top_level_channel_override_selects_module_fields(workspace: Workspace) {
    workspace.module("tools", None);
    let app = workspace.module(
        "app",
        Some(concat!(
            "name: app\n",
            ".channels:\n",
            "  dev:\n",
            "    name: app-dev\n",
            "    dependencies: {tools: {.type: LocalPath, path: ../tools}}\n",
        )),
    );

    let (dev_result, _) = load(&app, Some("dev"));
    let dev = dev_result.expect("dev loads");
    assert_eq!(dev.name(), "app-dev");
    assert_eq!(dependency_names(&dev), ["tools"]);

    let (prod_result, _) = load(&app, Some("prod"));
    let prod = prod_result.expect("prod loads");
    assert_eq!(prod.name(), "app");
    assert!(prod.dependencies().is_empty());
}

#[rstest]
fn unknown_dependency_types_fail_the_load(workspace: Workspace) {
    let app = workspace.module(
        "app",
        Some("name: app\ndependencies:\n  lib: {.type: Git, url: x}\n"),
    );

    let (result, _) = load(&app, None);

    assert!(matches!(
        result,
        Err(PackError::UnknownType { value: Some(ref v), .. }) if v == "Git"
    ));
}

#[rstest]
fn patches_and_autoexec_follow_the_channel(workspace: Workspace) {
    let app = workspace.module(
        "app",
        Some(concat!(
            "name: app\n",
            "autoexec: {import: false, .channels: {prod: {import: true}}}\n",
            "patches:\n",
            "  - {.type: Version, path: version.be, pattern: \"'{version}'\"}\n",
            "  - .channels: {prod: {.type: Version, path: prod.be, pattern: '{version}'}}\n",
        )),
    );

    let (prod_result, _) = load(&app, Some("prod"));
    let prod = prod_result.expect("prod loads");
    assert!(prod.autoexec().import);
    assert_eq!(prod.patches().target_paths(), ["version.be", "prod.be"]);

    let (dev_result, observer) = load(&app, Some("dev"));
    let dev = dev_result.expect("dev loads");
    assert!(!dev.autoexec().import);
    assert_eq!(dev.patches().target_paths(), ["version.be"]);
    assert_eq!(observer.warnings().len(), 1);
}
