mod common;

use common::{make_mod, setup_library};
use mod_vault_lib::core::library::Library;
use mod_vault_lib::core::{deployment, mod_manager, reconciler};
use mod_vault_lib::models::selection::Selection;
use mod_vault_lib::utils::console::Console;
use std::fs;
use tempfile::TempDir;

/// Library with disabled mods A, B and C in the inactive store.
fn three_mods() -> (TempDir, Library) {
    let (tmp, mut lib) = setup_library();
    for name in ["A", "B", "C"] {
        make_mod(&lib.paths.saved.join(name));
    }
    reconciler::rebuild(&mut lib, false, &mut Console::scripted(Vec::<String>::new())).unwrap();
    (tmp, lib)
}

#[test]
fn test_toggle_all_enables_and_copies_everything() {
    let (_tmp, mut lib) = three_mods();
    let mut console = Console::scripted(Vec::<String>::new());

    let report = deployment::toggle(&mut lib, &Selection::All, &mut console).unwrap();

    assert_eq!(report.enabled, vec!["A", "B", "C"]);
    for name in ["A", "B", "C"] {
        assert!(lib.manifest.find_mod(name).unwrap().enabled);
        assert!(lib.paths.active.join(name).join(name).join("mod.ini").is_file());
    }

    // Persisted
    let reloaded = Library::open(&lib.root).unwrap();
    assert!(reloaded.manifest.mods().all(|m| m.enabled));
}

#[test]
fn test_toggle_twice_restores_the_disabled_state() {
    let (_tmp, mut lib) = three_mods();
    let mut console = Console::scripted(Vec::<String>::new());

    deployment::toggle(&mut lib, &Selection::Indices(vec![2]), &mut console).unwrap();
    assert!(lib.paths.active_slot("B").is_dir());

    let report = deployment::toggle(&mut lib, &Selection::Indices(vec![2]), &mut console).unwrap();
    assert_eq!(report.disabled, vec!["B"]);
    assert!(!lib.paths.active_slot("B").exists());
    assert!(lib.manifest.mods().all(|m| !m.enabled));
}

#[test]
fn test_out_of_range_indices_are_reported_not_fatal() {
    let (_tmp, mut lib) = three_mods();
    let mut console = Console::scripted(Vec::<String>::new());

    let report = deployment::toggle(&mut lib, &Selection::Indices(vec![9, 1]), &mut console).unwrap();

    assert_eq!(report.enabled, vec!["A"]);
    assert!(console.transcript().iter().any(|l| l.contains("9 is out of range")));
}

#[test]
fn test_set_enabled_leaves_entries_already_there() {
    let (_tmp, mut lib) = three_mods();
    let mut console = Console::scripted(Vec::<String>::new());
    deployment::toggle(&mut lib, &Selection::Indices(vec![1]), &mut console).unwrap();

    let report = deployment::set_enabled(&mut lib, &Selection::All, true, &mut console).unwrap();
    assert_eq!(report.enabled, vec!["B", "C"]);

    let report = deployment::set_enabled(&mut lib, &Selection::Indices(vec![3]), true, &mut console).unwrap();
    assert!(report.enabled.is_empty());
    assert!(lib.manifest.mods().all(|m| m.enabled));
}

#[test]
fn test_missing_source_is_reported_and_isolated() {
    let (_tmp, mut lib) = three_mods();
    fs::remove_dir_all(lib.paths.saved.join("B")).unwrap();
    let mut console = Console::scripted(Vec::<String>::new());

    let report = deployment::toggle(&mut lib, &Selection::All, &mut console).unwrap();

    assert!(lib.manifest.find_mod("A").unwrap().enabled);
    assert!(!lib.manifest.find_mod("B").unwrap().enabled);
    assert!(lib.manifest.find_mod("C").unwrap().enabled);
    assert!(!lib.paths.active_slot("B").exists());
    assert_eq!(report.failed, vec!["B"]);
    assert!(console.transcript().iter().any(|l| l.contains("missing")));
}

#[test]
fn test_group_activation_and_deactivation() {
    let (_tmp, mut lib) = three_mods();
    let mut console = Console::scripted(Vec::<String>::new());

    // A is already on before it joins the group
    deployment::toggle(&mut lib, &Selection::Indices(vec![1]), &mut console).unwrap();
    let group = mod_manager::create_group(&mut lib, &["A".to_string(), "B".to_string()], Some("Duo")).unwrap();
    assert_eq!(group, "duo");

    // Manifest is now [C, duo]
    let group_idx = lib.manifest.position("duo").unwrap() + 1;
    deployment::toggle(&mut lib, &Selection::Indices(vec![group_idx]), &mut console).unwrap();

    assert!(lib.manifest.items()[group_idx - 1].enabled());
    for name in ["A", "B"] {
        assert!(lib.manifest.find_mod(name).unwrap().enabled);
        assert!(lib.paths.active.join(name).join(name).is_dir());
    }

    deployment::toggle(&mut lib, &Selection::Indices(vec![group_idx]), &mut console).unwrap();

    assert!(!lib.manifest.items()[group_idx - 1].enabled());
    for name in ["A", "B"] {
        assert!(!lib.manifest.find_mod(name).unwrap().enabled);
        assert!(!lib.paths.active_slot(name).exists());
    }
}

#[test]
fn test_group_state_survives_a_rebuild() {
    let (_tmp, mut lib) = three_mods();
    let mut console = Console::scripted(Vec::<String>::new());
    mod_manager::create_group(&mut lib, &["A".to_string(), "B".to_string()], None).unwrap();

    let group_idx = lib.manifest.position("A-B").unwrap() + 1;
    deployment::toggle(&mut lib, &Selection::Indices(vec![group_idx]), &mut console).unwrap();
    let before = lib.manifest.clone();

    reconciler::rebuild(&mut lib, false, &mut console).unwrap();

    assert_eq!(lib.manifest, before);
    assert!(lib.manifest.items()[group_idx - 1].is_group());
}

#[test]
fn test_set_enabled_judges_groups_by_their_members() {
    let (_tmp, mut lib) = three_mods();
    let mut console = Console::scripted(Vec::<String>::new());
    deployment::toggle(&mut lib, &Selection::Indices(vec![1]), &mut console).unwrap();
    mod_manager::create_group(&mut lib, &["A".to_string(), "B".to_string()], Some("g")).unwrap();

    // The group flag is off while A is still active
    let report = deployment::set_enabled(&mut lib, &Selection::All, false, &mut console).unwrap();
    assert_eq!(report.disabled, vec!["g"]);
    assert!(!lib.paths.active_slot("A").exists());
    assert!(lib.manifest.mods().all(|m| !m.enabled));

    // Half-enabled groups are completed
    deployment::toggle(&mut lib, &Selection::Indices(vec![2]), &mut console).unwrap();
    deployment::deactivate_mod(&lib.paths.clone(), lib.manifest.find_mod_mut("B").unwrap()).unwrap();
    let report = deployment::set_enabled(&mut lib, &Selection::All, true, &mut console).unwrap();
    assert_eq!(report.enabled, vec!["C", "g"]);
    assert!(lib.paths.active.join("B").join("B").is_dir());
}
