mod common;

use camino::Utf8PathBuf;
use common::{make_mod, reopen, setup_library};
use mod_vault_lib::core::library::Library;
use mod_vault_lib::core::reconciler;
use mod_vault_lib::models::error::SError;
use mod_vault_lib::models::manifest::Manifest;
use mod_vault_lib::models::mod_dto::{GroupEntry, ManifestItem, ModEntry};
use mod_vault_lib::utils::console::Console;
use std::collections::HashSet;
use std::fs;

fn quiet() -> Console {
    Console::scripted(Vec::<String>::new())
}

#[test]
fn test_open_requires_existing_root() {
    let tmp = tempfile::tempdir().unwrap();
    let missing = Utf8PathBuf::from_path_buf(tmp.path().join("nowhere")).unwrap();

    match Library::open(&missing) {
        Err(SError::FileOrDirectoryNotFound(_)) => {}
        other => panic!("expected a missing root error, got {:?}", other.map(|l| l.root)),
    }
}

#[test]
fn test_open_seeds_stores_and_files() {
    let (_tmp, lib) = setup_library();

    for dir in lib.paths.directories() {
        assert!(dir.is_dir(), "{} was not created", dir);
    }
    assert_eq!(fs::read_to_string(&lib.paths.manifest).unwrap(), "[]");
    assert_eq!(fs::read_to_string(&lib.paths.allow_list).unwrap(), "[]");
    assert!(lib.manifest.is_empty());
}

#[test]
fn test_rebuild_registers_saved_folder_disabled() {
    let (_tmp, mut lib) = setup_library();
    make_mod(&lib.paths.saved.join("Foo"));

    let report = reconciler::rebuild(&mut lib, false, &mut quiet()).unwrap();

    assert_eq!(report.added, vec!["Foo".to_string()]);
    assert_eq!(lib.manifest.len(), 1);
    let foo = lib.manifest.find_mod("Foo").unwrap();
    assert_eq!(foo.paths, vec![lib.paths.saved.join("Foo")]);
    assert!(!foo.enabled);

    // And it is on disk
    assert_eq!(reopen(&lib).manifest, lib.manifest);
}

#[test]
fn test_rebuild_is_idempotent() {
    let (_tmp, mut lib) = setup_library();
    make_mod(&lib.paths.saved.join("Foo"));
    make_mod(&lib.paths.saved.join("Pack/Body"));
    make_mod(&lib.paths.saved.join("Pack/Hair"));
    make_mod(&lib.paths.saved.join("Nested/Deep"));
    // Only in the active store
    make_mod(&lib.paths.active.join("Bar/Bar"));

    reconciler::rebuild(&mut lib, false, &mut quiet()).unwrap();
    let first = fs::read_to_string(&lib.paths.manifest).unwrap();

    let report = reconciler::rebuild(&mut lib, false, &mut quiet()).unwrap();
    let second = fs::read_to_string(&lib.paths.manifest).unwrap();

    assert_eq!(first, second);
    assert!(report.added.is_empty());
    assert!(report.copied_in.is_empty());
    assert!(report.repaired.is_empty());
}

#[test]
fn test_active_only_mod_is_copied_in_and_enabled() {
    let (_tmp, mut lib) = setup_library();
    make_mod(&lib.paths.active.join("Bar/Bar"));

    let report = reconciler::rebuild(&mut lib, false, &mut quiet()).unwrap();

    let saved_bar = lib.paths.saved.join("Bar");
    assert_eq!(report.copied_in, vec![saved_bar.clone()]);
    assert!(saved_bar.join("mod.ini").is_file());

    let bar = lib.manifest.find_mod("Bar").unwrap();
    assert!(bar.enabled);
    assert_eq!(bar.paths, vec![saved_bar]);
}

#[test]
fn test_multi_folder_becomes_one_multi_path_entry() {
    let (_tmp, mut lib) = setup_library();
    make_mod(&lib.paths.saved.join("Pack/Body"));
    make_mod(&lib.paths.saved.join("Pack/Hair"));
    make_mod(&lib.paths.active.join("Pack/Body"));
    make_mod(&lib.paths.active.join("Pack/Hair"));

    reconciler::rebuild(&mut lib, false, &mut quiet()).unwrap();

    assert_eq!(lib.manifest.len(), 1);
    let pack = lib.manifest.find_mod("Pack").unwrap();
    assert!(pack.is_multi_path());
    assert!(pack.enabled);
    assert_eq!(
        pack.paths,
        vec![lib.paths.saved.join("Pack/Body"), lib.paths.saved.join("Pack/Hair")]
    );
}

#[test]
fn test_no_folder_is_claimed_twice() {
    let (_tmp, mut lib) = setup_library();
    let body = lib.paths.saved.join("Pack/Body");
    make_mod(&body);
    make_mod(&lib.paths.saved.join("Pack/Hair"));
    make_mod(&lib.paths.saved.join("Solo"));

    // A stale single-path entry pointing into the multi-path folder
    lib.manifest.push(ManifestItem::Mod(ModEntry::new("Body", vec![body.clone()], 0)));
    lib.persist().unwrap();

    let report = reconciler::rebuild(&mut lib, false, &mut quiet()).unwrap();

    assert!(report.pruned.contains(&"Body".to_string()));
    let mut seen = HashSet::new();
    for entry in lib.manifest.mods() {
        for path in &entry.paths {
            assert!(seen.insert(path.clone()), "{} claimed twice", path);
        }
    }
    assert_eq!(lib.manifest.owner_of(&body).unwrap().name, "Pack");
}

#[test]
fn test_enabled_follows_the_active_store() {
    let (_tmp, mut lib) = setup_library();
    make_mod(&lib.paths.saved.join("A"));
    make_mod(&lib.paths.saved.join("B"));
    reconciler::rebuild(&mut lib, false, &mut quiet()).unwrap();

    // Manifest says A is on, disk says B is on
    lib.manifest.find_mod_mut("A").unwrap().enabled = true;
    lib.persist().unwrap();
    make_mod(&lib.paths.active.join("B/B"));

    reconciler::rebuild(&mut lib, false, &mut quiet()).unwrap();

    for entry in lib.manifest.mods() {
        assert_eq!(entry.enabled, lib.paths.active_slot(&entry.name).is_dir(), "{}", entry.name);
    }
    assert!(!lib.manifest.find_mod("A").unwrap().enabled);
    assert!(lib.manifest.find_mod("B").unwrap().enabled);
}

#[test]
fn test_nested_payload_is_moved_under_saved() {
    let (_tmp, mut lib) = setup_library();
    make_mod(&lib.paths.saved.join("Wrapper/Neat"));
    make_mod(&lib.paths.active.join("Neat/Neat"));

    let report = reconciler::rebuild(&mut lib, false, &mut quiet()).unwrap();

    assert_eq!(report.repaired, vec!["Neat".to_string()]);
    let neat = lib.manifest.find_mod("Neat").unwrap();
    assert_eq!(neat.paths, vec![lib.paths.saved.join("Neat")]);
    assert!(neat.enabled);
    assert!(lib.paths.saved.join("Neat/mod.ini").is_file());
    assert!(!lib.paths.saved.join("Wrapper").exists());
    // Re-materialized from the new location
    assert!(lib.paths.active.join("Neat/Neat/mod.ini").is_file());
}

#[test]
fn test_active_slot_named_after_a_wrapper_is_adopted() {
    let (_tmp, mut lib) = setup_library();
    make_mod(&lib.paths.saved.join("Foo/inner"));
    make_mod(&lib.paths.active.join("Foo/inner"));

    let report = reconciler::rebuild(&mut lib, false, &mut quiet()).unwrap();
    let first = fs::read_to_string(&lib.paths.manifest).unwrap();

    assert_eq!(report.adopted, vec!["inner".to_string()]);
    assert_eq!(lib.manifest.len(), 1);
    let inner = lib.manifest.find_mod("inner").unwrap();
    assert_eq!(inner.paths, vec![lib.paths.saved.join("inner")]);
    assert!(inner.enabled);
    assert!(!lib.paths.active_slot("Foo").exists());
    assert!(lib.paths.active.join("inner/inner/mod.ini").is_file());

    reconciler::rebuild(&mut lib, false, &mut quiet()).unwrap();
    let second = fs::read_to_string(&lib.paths.manifest).unwrap();
    assert_eq!(first, second);

    // No entry records a folder inside another entry's folder
    let mods: Vec<&ModEntry> = lib.manifest.mods().collect();
    for a in &mods {
        for b in mods.iter().filter(|b| b.name != a.name) {
            for p in &a.paths {
                assert!(b.paths.iter().all(|q| !q.starts_with(p) && !p.starts_with(q)), "{} overlaps {}", p, b.name);
            }
        }
    }
}

#[test]
fn test_folder_overlapping_another_entry_is_not_claimed() {
    let (_tmp, mut lib) = setup_library();
    make_mod(&lib.paths.saved.join("Outer"));
    make_mod(&lib.paths.saved.join("Outer/inner"));
    lib.manifest.push(ManifestItem::Mod(ModEntry::new(
        "inner",
        vec![lib.paths.saved.join("Outer/inner")],
        0,
    )));

    let report = reconciler::rebuild(&mut lib, false, &mut quiet()).unwrap();

    assert!(report.conflicts.contains(&lib.paths.saved.join("Outer")));
    assert!(lib.manifest.find_mod("Outer").is_none());
    // The nested entry moves out; the wrapper holds a mod of its own and stays
    assert_eq!(lib.manifest.find_mod("inner").unwrap().paths, vec![lib.paths.saved.join("inner")]);
    assert!(lib.paths.saved.join("Outer/mod.ini").is_file());
}

#[test]
fn test_vanished_folders_are_pruned() {
    let (_tmp, mut lib) = setup_library();
    make_mod(&lib.paths.saved.join("Gone"));
    make_mod(&lib.paths.saved.join("Kept"));
    reconciler::rebuild(&mut lib, false, &mut quiet()).unwrap();

    fs::remove_dir_all(lib.paths.saved.join("Gone")).unwrap();
    let report = reconciler::rebuild(&mut lib, false, &mut quiet()).unwrap();

    assert_eq!(report.pruned, vec!["Gone".to_string()]);
    assert!(lib.manifest.find_mod("Gone").is_none());
    assert!(lib.manifest.find_mod("Kept").is_some());
}

#[test]
fn test_invalid_children_are_reported_and_optionally_deleted() {
    let (_tmp, mut lib) = setup_library();
    let stray = lib.paths.saved.join("notes.txt");
    let junk = lib.paths.saved.join("Screens");
    fs::write(&stray, "hi").unwrap();
    fs::create_dir_all(&junk).unwrap();
    fs::write(junk.join("a.png"), "").unwrap();

    let report = reconciler::rebuild(&mut lib, false, &mut quiet()).unwrap();
    assert_eq!(report.invalid.len(), 2);
    assert!(report.deleted.is_empty());
    assert!(stray.exists() && junk.exists());

    let report = reconciler::rebuild(&mut lib, true, &mut quiet()).unwrap();
    assert_eq!(report.deleted.len(), 2);
    assert!(!stray.exists() && !junk.exists());
    assert!(lib.manifest.is_empty());
}

#[test]
fn test_corrupt_manifest_resets_and_rebuild_recovers() {
    let (_tmp, lib) = setup_library();
    make_mod(&lib.paths.saved.join("Foo"));
    fs::write(&lib.paths.manifest, "{ this is not json").unwrap();

    let mut lib = reopen(&lib);
    assert!(lib.manifest.is_empty());

    reconciler::rebuild(&mut lib, false, &mut quiet()).unwrap();
    assert!(lib.manifest.find_mod("Foo").is_some());
    let on_disk: Manifest = serde_json::from_str(&fs::read_to_string(&lib.paths.manifest).unwrap()).unwrap();
    assert_eq!(on_disk, lib.manifest);
}

#[test]
fn test_legacy_entries_load_with_absolute_paths() {
    let (_tmp, lib) = setup_library();
    fs::write(
        &lib.paths.manifest,
        r#"[{"name": "Foo", "enabled": false, "path": ["Foo"], "date": 3, "gb_id": 12345}]"#,
    )
    .unwrap();

    let lib = reopen(&lib);
    let foo = lib.manifest.find_mod("Foo").unwrap();
    assert_eq!(foo.paths, vec![lib.paths.saved.join("Foo")]);
    assert_eq!(foo.external_id.as_deref(), Some("12345"));
    assert!(lib.is_dirty());
}

#[test]
fn test_save_then_load_round_trips() {
    let (_tmp, mut lib) = setup_library();
    let mut linked = ModEntry::new("Linked", vec![lib.paths.saved.join("Linked")], 1_700_000_000);
    linked.external_id = Some("98765".into());
    let member = ModEntry::new(
        "Member",
        vec![lib.paths.saved.join("Multi/A"), lib.paths.saved.join("Multi/B")],
        7,
    );

    lib.manifest.push(ManifestItem::Mod(linked));
    lib.manifest.push(ManifestItem::Group(GroupEntry {
        name: "set".into(),
        enabled: false,
        members: vec![member],
    }));
    lib.persist().unwrap();

    let loaded = reopen(&lib);
    assert_eq!(loaded.manifest, lib.manifest);

    let raw = fs::read_to_string(&lib.paths.manifest).unwrap();
    assert!(raw.contains(r#""type": "group""#));
    assert!(raw.contains(r#""gb_id": "98765""#));
}
