// tests/event_mapping.rs

use notify::event::{
    AccessKind, CreateKind, DataChange, EventKind, MetadataKind, ModifyKind, RemoveKind,
    RenameMode,
};
use notify::Event;

use chainwatch::logging::parse_level_str;
use chainwatch::watch::event::from_notify;
use chainwatch::watch::{FsEvent, FsEventKind};

fn event(kind: EventKind, paths: &[&str]) -> Event {
    paths
        .iter()
        .fold(Event::new(kind), |ev, p| ev.add_path((*p).into()))
}

fn kinds(kind: EventKind) -> Vec<FsEventKind> {
    from_notify(event(kind, &["/r/a"]))
        .into_iter()
        .map(|e| e.kind)
        .collect()
}

#[test]
fn basic_kinds_map_directly() {
    assert_eq!(kinds(EventKind::Create(CreateKind::File)), vec![FsEventKind::Create]);
    assert_eq!(kinds(EventKind::Remove(RemoveKind::Folder)), vec![FsEventKind::Remove]);
    assert_eq!(
        kinds(EventKind::Modify(ModifyKind::Data(DataChange::Content))),
        vec![FsEventKind::Write]
    );
    assert_eq!(kinds(EventKind::Any), vec![FsEventKind::Write]);
}

#[test]
fn metadata_and_access_are_not_writes() {
    assert_eq!(
        kinds(EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions))),
        vec![FsEventKind::Other]
    );
    assert_eq!(kinds(EventKind::Access(AccessKind::Read)), vec![FsEventKind::Other]);
}

#[test]
fn renames_with_direction_become_remove_and_create() {
    assert_eq!(
        from_notify(event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/r/old", "/r/new"],
        )),
        vec![
            FsEvent::new(FsEventKind::Remove, "/r/old"),
            FsEvent::new(FsEventKind::Create, "/r/new"),
        ]
    );
    assert_eq!(
        kinds(EventKind::Modify(ModifyKind::Name(RenameMode::From))),
        vec![FsEventKind::Remove]
    );
    assert_eq!(
        kinds(EventKind::Modify(ModifyKind::Name(RenameMode::To))),
        vec![FsEventKind::Create]
    );
    assert_eq!(
        kinds(EventKind::Modify(ModifyKind::Name(RenameMode::Any))),
        vec![FsEventKind::Rename]
    );
}

#[test]
fn one_event_per_path() {
    let evs = from_notify(event(
        EventKind::Create(CreateKind::Any),
        &["/r/a", "/r/b", "/r/c"],
    ));
    assert_eq!(evs.len(), 3);
    assert!(evs.iter().all(|e| e.kind == FsEventKind::Create));
}

#[test]
fn log_levels_parse_case_insensitively() {
    assert_eq!(parse_level_str(" Debug "), Some(tracing::Level::DEBUG));
    assert_eq!(parse_level_str("warning"), Some(tracing::Level::WARN));
    assert_eq!(parse_level_str("loud"), None);
}
