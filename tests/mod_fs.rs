mod common;

use camino::Utf8PathBuf;
use common::make_mod;
use mod_vault_lib::core::mod_fs::ModFS;
use mod_vault_lib::models::classification::FolderValidation;
use mod_vault_lib::models::manifest::AllowList;
use mod_vault_lib::utils::console::Console;
use std::fs;
use tempfile::tempdir;

fn temp_root() -> (tempfile::TempDir, Utf8PathBuf) {
    let temp = tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    (temp, root)
}

#[test]
fn test_marker_in_root_is_single() {
    let (_temp, root) = temp_root();
    let candidate = root.join("Jinhsi");
    make_mod(&candidate);

    let found = ModFS::classify(&candidate, &AllowList::default());
    assert_eq!(found.status, FolderValidation::Single);
    assert_eq!(found.name, "Jinhsi");
    assert_eq!(found.units, vec![candidate]);
}

#[test]
fn test_single_child_wrappers_are_descended_at_any_depth() {
    let (_temp, root) = temp_root();

    for depth in 0..5 {
        let candidate = root.join(format!("archive{}", depth));
        let mut payload = candidate.clone();
        for level in 0..depth {
            payload = payload.join(format!("wrap{}", level));
        }
        make_mod(&payload);

        let found = ModFS::classify(&candidate, &AllowList::default());
        assert_eq!(found.status, FolderValidation::Single, "depth {}", depth);
        assert_eq!(found.units, vec![payload.clone()]);
        assert_eq!(found.name, payload.file_name().unwrap());
    }
}

#[test]
fn test_two_marked_subfolders_are_multi() {
    let (_temp, root) = temp_root();
    let candidate = root.join("Pack");
    make_mod(&candidate.join("Body"));
    make_mod(&candidate.join("Hair"));
    // Unrelated content does not change the verdict
    fs::create_dir_all(candidate.join("Previews")).unwrap();
    fs::write(candidate.join("readme.txt"), "hi").unwrap();

    let found = ModFS::classify(&candidate, &AllowList::default());
    assert_eq!(found.status, FolderValidation::Multi);
    assert_eq!(found.name, "Pack");
    assert_eq!(found.units, vec![candidate.join("Body"), candidate.join("Hair")]);
}

#[test]
fn test_one_marked_subfolder_among_many_is_single() {
    let (_temp, root) = temp_root();
    let candidate = root.join("Pack");
    make_mod(&candidate.join("Body"));
    fs::create_dir_all(candidate.join("Previews")).unwrap();

    let found = ModFS::classify(&candidate, &AllowList::default());
    assert_eq!(found.status, FolderValidation::Single);
    assert_eq!(found.units, vec![candidate.join("Body")]);
}

#[test]
fn test_no_ini_anywhere_is_not_a_mod() {
    let (_temp, root) = temp_root();
    let candidate = root.join("Screenshots");
    fs::create_dir_all(candidate.join("a/b")).unwrap();
    fs::create_dir_all(candidate.join("c")).unwrap();
    fs::write(candidate.join("a/b/shot.png"), "").unwrap();

    let found = ModFS::classify(&candidate, &AllowList::default());
    assert_eq!(found.status, FolderValidation::NotAMod);
    assert!(found.units.is_empty());
}

#[test]
fn test_missing_folder_or_file_is_not_a_mod() {
    let (_temp, root) = temp_root();
    let file = root.join("notes.txt");
    fs::write(&file, "").unwrap();

    assert!(!ModFS::classify(&root.join("nope"), &AllowList::default()).is_mod());
    assert!(!ModFS::classify(&file, &AllowList::default()).is_mod());
}

#[test]
fn test_marker_name_is_case_insensitive() {
    let (_temp, root) = temp_root();
    let candidate = root.join("Upper");
    fs::create_dir_all(&candidate).unwrap();
    fs::write(candidate.join("MOD.INI"), "").unwrap();

    assert_eq!(
        ModFS::classify(&candidate, &AllowList::default()).status,
        FolderValidation::Single
    );
}

#[test]
fn test_allow_listed_folder_accepts_any_ini() {
    let (_temp, root) = temp_root();
    let candidate = root.join("Custom");
    fs::create_dir_all(&candidate).unwrap();
    fs::write(candidate.join("merged.ini"), "").unwrap();

    assert!(!ModFS::classify(&candidate, &AllowList::default()).is_mod());

    let mut allow = AllowList::default();
    allow.insert("Custom");
    assert_eq!(ModFS::classify(&candidate, &allow).status, FolderValidation::Single);
}

#[test]
fn test_interactive_allow_listing_persists_the_answer() {
    let (_temp, root) = temp_root();
    let candidate = root.join("Custom");
    fs::create_dir_all(&candidate).unwrap();
    fs::write(candidate.join("merged.ini"), "").unwrap();

    let mut allow = AllowList::default();
    let mut console = Console::scripted(["y"]);
    let found = ModFS::classify_interactive(&candidate, &mut allow, &mut console).unwrap();

    assert_eq!(found.status, FolderValidation::Single);
    assert!(allow.contains("Custom"));

    // Second pass needs no answer at all
    let mut silent = Console::scripted(Vec::<String>::new());
    let again = ModFS::classify_interactive(&candidate, &mut allow, &mut silent).unwrap();
    assert_eq!(again, found);
}

#[test]
fn test_declined_or_unanswered_prompt_stays_not_a_mod() {
    let (_temp, root) = temp_root();
    let candidate = root.join("Custom");
    fs::create_dir_all(candidate.join("x")).unwrap();
    fs::create_dir_all(candidate.join("y")).unwrap();
    fs::write(candidate.join("x/a.ini"), "").unwrap();
    fs::write(candidate.join("y/b.ini"), "").unwrap();

    let mut allow = AllowList::default();
    let mut console = Console::scripted(["n"]);
    let found = ModFS::classify_interactive(&candidate, &mut allow, &mut console).unwrap();

    // "n" answers the first folder, closed input silences the second
    assert!(!found.is_mod());
    assert!(allow.is_empty());
}

#[test]
fn test_discover_skips_folders_below_an_accepted_one() {
    let (_temp, root) = temp_root();
    let candidate = root.join("Outer");
    make_mod(&candidate);
    fs::create_dir_all(candidate.join("variants")).unwrap();
    fs::write(candidate.join("variants/extra.ini"), "").unwrap();

    let mut allow = AllowList::default();
    let mut console = Console::scripted(Vec::<String>::new());
    let found = ModFS::discover_markers(&candidate, &mut allow, &mut console).unwrap();

    assert_eq!(found, vec![candidate]);
    assert!(console.transcript().is_empty());
}

#[test]
fn test_collapse_stops_at_marker_or_branch() {
    let (_temp, root) = temp_root();
    let staging = root.join("bar");
    make_mod(&staging.join("bar/payload/sub"));

    let collapsed = ModFS::collapse_wrappers(&staging, &AllowList::default()).unwrap();
    assert_eq!(collapsed, staging.join("bar/payload/sub"));

    let branching = root.join("two");
    make_mod(&branching.join("only/a"));
    make_mod(&branching.join("only/b"));
    let collapsed = ModFS::collapse_wrappers(&branching, &AllowList::default()).unwrap();
    assert_eq!(collapsed, branching.join("only"));
}
