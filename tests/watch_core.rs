// tests/watch_core.rs
mod common;
use crate::common::fake_backend::{BackendCall, RecordingBackend};
use crate::common::init_tracing;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chainwatch::engine::{TriggerReason, WatchCore};
use chainwatch::fs::mock::{MockFileSystem, mtime};
use chainwatch::watch::{FsEvent, FsEventKind, IgnoreSet};

const ROOT: &str = "/project";

fn project() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file("/project/src/main.rs", "fn main() {}", mtime(10));
    fs.add_file("/project/src/util/mod.rs", "", mtime(10));
    fs.add_file("/project/target/debug/app", "bin", mtime(10));
    fs.add_file("/project/README.md", "# hi", mtime(10));
    fs
}

fn core_with(fs: &MockFileSystem, ignore: &[&str]) -> (WatchCore, RecordingBackend) {
    let backend = RecordingBackend::new();
    let entries: Vec<String> = ignore.iter().map(|s| s.to_string()).collect();
    let ignore = IgnoreSet::new(ROOT, &entries).expect("valid ignore set");
    let core = WatchCore::new(
        ROOT,
        Arc::new(fs.clone()),
        Box::new(backend.clone()),
        ignore,
    );
    (core, backend)
}

fn ev(kind: FsEventKind, path: &str) -> FsEvent {
    FsEvent::new(kind, path)
}

fn p(path: &str) -> PathBuf {
    PathBuf::from(path)
}

#[test]
fn initial_walk_watches_every_directory_except_ignored_ones() {
    init_tracing();
    let fs = project();
    let (mut core, backend) = core_with(&fs, &["target"]);

    assert_eq!(core.initial_walk(), TriggerReason::Initial);

    assert_eq!(
        backend.watched(),
        vec![p("/project"), p("/project/src"), p("/project/src/util")]
    );
    assert!(!backend.is_watched("/project/target/debug"), "ignored dirs are not descended into");
    assert!(core.is_watching(Path::new("/project/src")));
}

#[test]
fn initial_walk_always_triggers_even_for_an_empty_tree() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_dir(ROOT);
    let (mut core, backend) = core_with(&fs, &[]);

    assert_eq!(core.initial_walk(), TriggerReason::Initial);
    assert_eq!(backend.watched(), vec![p("/project")]);
}

#[test]
fn write_triggers_once_per_modification_time() {
    init_tracing();
    let fs = project();
    let (mut core, _backend) = core_with(&fs, &[]);
    core.initial_walk();

    let write = ev(FsEventKind::Write, "/project/src/main.rs");

    assert_eq!(
        core.handle_event(&write),
        Some(TriggerReason::Changed(p("/project/src/main.rs")))
    );
    // Same mtime: the filesystem reported one change twice.
    assert_eq!(core.handle_event(&write), None);
    assert_eq!(core.handle_event(&write), None);

    fs.touch("/project/src/main.rs", mtime(11));
    assert!(core.handle_event(&write).is_some());
    assert_eq!(core.index().modified(Path::new("/project/src/main.rs")), Some(mtime(11)));
}

#[test]
fn rename_is_change_worthy_and_other_events_are_not() {
    init_tracing();
    let fs = project();
    let (mut core, _backend) = core_with(&fs, &[]);
    core.initial_walk();

    assert_eq!(core.handle_event(&ev(FsEventKind::Other, "/project/README.md")), None);
    assert!(core.handle_event(&ev(FsEventKind::Rename, "/project/README.md")).is_some());
}

#[test]
fn ignored_paths_never_trigger() {
    init_tracing();
    let fs = project();
    fs.add_file("/project/build.log", "", mtime(1));
    let (mut core, _backend) = core_with(&fs, &["build.log", "target"]);
    core.initial_walk();

    assert_eq!(core.handle_event(&ev(FsEventKind::Write, "/project/build.log")), None);
    assert_eq!(core.handle_event(&ev(FsEventKind::Remove, "/project/target")), None);
    assert_eq!(core.handle_event(&ev(FsEventKind::Create, "/project/target")), None);
    assert_eq!(core.maybe_queue(Path::new("/project/build.log")), None);
}

#[test]
fn removing_a_file_triggers_exactly_one_rebuild_and_forgets_it() {
    init_tracing();
    let fs = project();
    let (mut core, _backend) = core_with(&fs, &[]);
    core.initial_walk();

    core.handle_event(&ev(FsEventKind::Write, "/project/README.md"));
    assert!(core.index().modified(Path::new("/project/README.md")).is_some());

    fs.remove("/project/README.md");
    assert_eq!(
        core.handle_event(&ev(FsEventKind::Remove, "/project/README.md")),
        Some(TriggerReason::Removed(p("/project/README.md")))
    );
    assert_eq!(core.index().modified(Path::new("/project/README.md")), None);

    // Same file reappears with the old mtime: unknown again, so it counts.
    fs.add_file("/project/README.md", "# hi", mtime(10));
    assert!(core.handle_event(&ev(FsEventKind::Create, "/project/README.md")).is_some());
}

#[test]
fn removing_a_directory_unsubscribes_it_and_its_children() {
    init_tracing();
    let fs = project();
    let (mut core, backend) = core_with(&fs, &[]);
    core.initial_walk();

    fs.remove("/project/src");
    let reason = core.handle_event(&ev(FsEventKind::Remove, "/project/src"));

    assert_eq!(reason, Some(TriggerReason::Removed(p("/project/src"))));
    assert!(!core.is_watching(Path::new("/project/src")));
    assert!(!core.is_watching(Path::new("/project/src/util")));
    let history = backend.history();
    assert!(history.contains(&BackendCall::Unwatch(p("/project/src"))));
    assert!(history.contains(&BackendCall::Unwatch(p("/project/src/util"))));
}

#[test]
fn created_directory_is_watched_and_triggers_only_if_it_has_files() {
    init_tracing();
    let fs = project();
    let (mut core, backend) = core_with(&fs, &[]);
    core.initial_walk();

    fs.add_dir("/project/empty/nested");
    assert_eq!(core.handle_event(&ev(FsEventKind::Create, "/project/empty")), None);
    assert!(backend.is_watched("/project/empty"));
    assert!(backend.is_watched("/project/empty/nested"));

    fs.add_file("/project/lib/a.rs", "", mtime(20));
    assert!(core.handle_event(&ev(FsEventKind::Create, "/project/lib")).is_some());
    assert!(backend.is_watched("/project/lib"));
}

#[test]
fn creating_an_already_watched_directory_is_a_noop() {
    init_tracing();
    let fs = project();
    let (mut core, backend) = core_with(&fs, &[]);
    core.initial_walk();
    let before = backend.history().len();

    assert_eq!(core.handle_event(&ev(FsEventKind::Create, "/project/src")), None);
    assert!(!core.discover(Path::new("/project/src")));
    assert_eq!(backend.history().len(), before);
}

#[test]
fn unstatable_path_counts_as_deleted() {
    init_tracing();
    let fs = project();
    let (mut core, _backend) = core_with(&fs, &[]);
    core.initial_walk();

    assert_eq!(
        core.handle_event(&ev(FsEventKind::Write, "/project/ghost.rs")),
        Some(TriggerReason::Removed(p("/project/ghost.rs")))
    );
}

#[test]
fn subtree_that_cannot_be_watched_is_skipped() {
    init_tracing();
    let fs = project();
    let (mut core, backend) = core_with(&fs, &[]);
    backend.fail_on("/project/src");

    core.initial_walk();

    assert!(backend.is_watched("/project"));
    assert!(backend.is_watched("/project/target/debug"));
    assert!(!backend.is_watched("/project/src/util"));
}

#[test]
fn content_hashing_skips_touch_without_edit() {
    init_tracing();
    let fs = project();
    let (core, _backend) = core_with(&fs, &[]);
    let mut core = core.with_content_hashing(true);
    core.initial_walk();

    let write = ev(FsEventKind::Write, "/project/src/main.rs");
    assert!(core.handle_event(&write).is_some());

    fs.touch("/project/src/main.rs", mtime(11));
    assert_eq!(core.handle_event(&write), None, "same bytes, new mtime");
    assert_eq!(core.index().modified(Path::new("/project/src/main.rs")), Some(mtime(11)));

    fs.add_file("/project/src/main.rs", "fn main() { run() }", mtime(12));
    assert!(core.handle_event(&write).is_some());
}
