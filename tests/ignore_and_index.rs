// tests/ignore_and_index.rs

use std::path::Path;

use proptest::prelude::*;

use chainwatch::fs::mock::{MockFileSystem, mtime};
use chainwatch::watch::{IgnoreSet, ModificationIndex, compute_file_hash};

fn ignore(entries: &[&str]) -> IgnoreSet {
    let entries: Vec<String> = entries.iter().map(|s| s.to_string()).collect();
    IgnoreSet::new("/project", &entries).expect("valid ignore patterns")
}

#[test]
fn exact_relative_path_is_ignored() {
    let set = ignore(&["src/generated"]);

    assert!(set.is_ignored(Path::new("/project/src/generated")));
    assert!(!set.is_ignored(Path::new("/project/src/generated.rs")));
    assert!(!set.is_ignored(Path::new("/project/other/src/generated")));
}

#[test]
fn bare_name_matches_at_any_depth() {
    let set = ignore(&["target", ".git/"]);

    assert!(set.is_ignored(Path::new("/project/target")));
    assert!(set.is_ignored(Path::new("/project/crates/foo/target")));
    assert!(set.is_ignored(Path::new("/project/.git")));
    assert!(!set.is_ignored(Path::new("/project/targets")));
}

#[test]
fn globs_do_not_cross_directories() {
    let set = ignore(&["docs/*.md"]);

    assert!(set.is_ignored(Path::new("/project/docs/readme.md")));
    assert!(!set.is_ignored(Path::new("/project/docs/api/readme.md")));
}

#[test]
fn root_and_outside_paths_are_never_ignored() {
    let set = ignore(&["*"]);

    assert!(!set.is_ignored(Path::new("/project")));
    assert!(!set.is_ignored(Path::new("/elsewhere/file")));
    assert!(set.is_ignored(Path::new("/project/anything")));
}

#[test]
fn invalid_pattern_is_an_error() {
    let entries = vec!["src/[".to_string()];
    assert!(IgnoreSet::new("/project", &entries).is_err());
}

#[test]
fn index_tracks_and_forgets_modification_times() {
    let mut index = ModificationIndex::new();
    let file = Path::new("/project/src/lib.rs");

    assert!(!index.is_current(file, mtime(1)));
    assert!(index.record(file, mtime(1), None));
    assert!(index.is_current(file, mtime(1)));
    assert!(!index.is_current(file, mtime(2)));

    index.record(Path::new("/project/src/a/b.rs"), mtime(1), None);
    assert_eq!(index.forget(Path::new("/project/src")), 2);
    assert!(index.is_empty());
}

#[test]
fn index_reports_unchanged_content_when_hashes_match() {
    let mut index = ModificationIndex::new();
    let file = Path::new("/project/main.rs");

    assert!(index.record(file, mtime(1), Some("aaa".into())));
    assert!(!index.record(file, mtime(2), Some("aaa".into())));
    assert!(index.record(file, mtime(3), Some("bbb".into())));
    assert_eq!(index.modified(file), Some(mtime(3)));
}

#[test]
fn file_hash_depends_only_on_content() {
    let fs = MockFileSystem::new();
    fs.add_file("/p/a.txt", "same", mtime(1));
    fs.add_file("/p/b.txt", "same", mtime(9));
    fs.add_file("/p/c.txt", "different", mtime(1));

    let a = compute_file_hash(&fs, Path::new("/p/a.txt")).unwrap();
    let b = compute_file_hash(&fs, Path::new("/p/b.txt")).unwrap();
    let c = compute_file_hash(&fs, Path::new("/p/c.txt")).unwrap();

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert!(compute_file_hash(&fs, Path::new("/p/missing")).is_err());
}

proptest! {
    #[test]
    fn bare_name_matches_only_that_name(
        name in "[a-z]{1,8}",
        parts in proptest::collection::vec("[0-9]{1,4}", 1..4),
    ) {
        let set = ignore(&[name.as_str()]);
        let rel = parts.join("/");

        prop_assert!(!set.is_ignored_rel(&rel));
        let nested = format!("{rel}/{name}");
        let abs = format!("/project/{name}");
        prop_assert!(set.is_ignored_rel(&nested));
        prop_assert!(set.is_ignored(Path::new(&abs)));
    }

    #[test]
    fn index_accepts_a_change_only_when_mtime_moves(
        times in proptest::collection::vec(0u64..5, 1..30),
    ) {
        let mut index = ModificationIndex::new();
        let file = Path::new("/project/f");
        let mut last: Option<u64> = None;

        for t in times {
            let expect_change = last != Some(t);
            let accepted = !index.is_current(file, mtime(t));
            prop_assert_eq!(accepted, expect_change);
            if accepted {
                index.record(file, mtime(t), None);
                last = Some(t);
            }
        }
    }
}
