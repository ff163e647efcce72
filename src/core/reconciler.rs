use crate::core::deployment;
use crate::core::library::Library;
use crate::core::mod_fs::ModFS;
use crate::models::error::SError;
use crate::models::mod_dto::{ManifestItem, ModEntry};
use crate::models::paths::StoreRules;
use crate::utils::console::Console;
use crate::utils::file::FileUtils;
use crate::utils::time::modified_unix;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Everything a reconciliation noticed or changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Entries created for folders found on disk.
    pub added: Vec<String>,
    /// Store children that are not mods (stray files included).
    pub invalid: Vec<Utf8PathBuf>,
    /// Invalid children removed from disk.
    pub deleted: Vec<Utf8PathBuf>,
    /// Folders skipped because a multi-path entry already claims them.
    pub conflicts: Vec<Utf8PathBuf>,
    /// Active-store units copied back into the inactive store.
    pub copied_in: Vec<Utf8PathBuf>,
    /// Entries dropped because their folders are gone or covered by a multi-path entry.
    pub pruned: Vec<String>,
    /// Entries moved back directly under the inactive store.
    pub repaired: Vec<String>,
    /// Active slots renamed after the entry that owns their payload.
    pub adopted: Vec<String>,
}

impl ReconcileReport {
    pub fn merge(&mut self, other: ReconcileReport) {
        self.added.extend(other.added);
        self.invalid.extend(other.invalid);
        self.deleted.extend(other.deleted);
        self.conflicts.extend(other.conflicts);
        self.copied_in.extend(other.copied_in);
        self.pruned.extend(other.pruned);
        self.repaired.extend(other.repaired);
        self.adopted.extend(other.adopted);
    }
}

/// Rebuilds the manifest from disk: the inactive store first, then the active
/// store, then the correction passes. The result is persisted.
#[instrument(skip(library, console))]
pub fn rebuild(library: &mut Library, delete_invalid: bool, console: &mut Console) -> Result<ReconcileReport, SError> {
    let saved = library.paths.saved.clone();
    let active = library.paths.active.clone();

    let mut report = reconcile(library, &saved, false, delete_invalid, console)?;
    report.merge(reconcile(library, &active, true, delete_invalid, console)?);

    prune_missing_paths(library, console, &mut report);
    drop_shadowed_entries(library, console, &mut report);
    recompute_enabled(library);
    repair_stray_entries(library, console, &mut report)?;

    info!(
        "Rebuild done: {} added, {} invalid, {} conflicts, {} repaired",
        report.added.len(),
        report.invalid.len(),
        report.conflicts.len(),
        report.repaired.len()
    );
    library.mark_dirty();
    library.persist()?;
    Ok(report)
}

/// Merges the mods found among the immediate children of `store_root` into the manifest.
///
/// Units found in the active store are recorded against their inactive-store
/// counterpart, which is copied in when missing, and mark their entry enabled.
pub fn reconcile(
    library: &mut Library,
    store_root: &Utf8Path,
    is_active_store: bool,
    delete_invalid: bool,
    console: &mut Console,
) -> Result<ReconcileReport, SError> {
    let mut report = ReconcileReport::default();
    let rules = library.paths.clone();

    for child in FileUtils::children(store_root)? {
        // Scratch folders of an interrupted install or repair
        if child.file_name().is_some_and(|n| n.starts_with('.')) {
            continue;
        }

        if !child.is_dir() {
            if rules.is_bookkeeping_file(&child) {
                continue;
            }
            debug!("stray file {}", child);
            report.invalid.push(child.clone());
            if delete_invalid {
                std::fs::remove_file(&child)?;
                report.deleted.push(child);
            }
            continue;
        }

        let found = ModFS::classify_interactive(&child, &mut library.allow_list, console)?;
        if !found.is_mod() {
            warn!("{} is not a mod", child);
            console.say(format!("\t[ ! ] {} is not a mod.", child));
            report.invalid.push(child.clone());
            if delete_invalid {
                std::fs::remove_dir_all(&child)?;
                console.say(format!("\t[ - ] Deleted {}", child));
                report.deleted.push(child);
            }
            continue;
        }

        let multi = found.units.len() > 1;
        if !is_active_store {
            for unit in found.units {
                claim(library, &found.name, unit, false, multi, console, &mut report);
            }
            continue;
        }

        // Mods/<entry name>/<payload folder>: the slot name is the entry name
        let mut name = child.file_name().unwrap_or_default().to_owned();
        let mut units = found.units;
        if let Some(owner) = adoptable_owner(library, &name, &units) {
            let slot = rules.active_slot(&owner);
            if slot.exists() {
                warn!("{} duplicates the active copy of '{}'", child, owner);
                console.say(format!("\t[ ! ] {} duplicates the active copy of '{}', skipping.", child, owner));
                report.conflicts.push(child);
                continue;
            }
            info!("Renaming active slot {} to {}", child, slot);
            FileUtils::move_dir(&child, &slot)?;
            units = units
                .iter()
                .map(|u| match u.strip_prefix(&child) {
                    Ok(rel) => slot.join(rel),
                    Err(_) => u.clone(),
                })
                .collect();
            report.adopted.push(owner.clone());
            name = owner;
        }

        for unit in units {
            let target = counterpart(library, &name, &unit, !multi);
            if nests_with_other(library, &name, &target, console, &mut report) {
                continue;
            }
            if !target.exists() {
                info!("Copying {} into the inactive store as {}", unit, target);
                FileUtils::copy_recursive(&unit, &target)?;
                report.copied_in.push(target.clone());
            }
            claim(library, &name, target, true, multi, console, &mut report);
        }
    }

    Ok(report)
}

/// Inactive-store location backing an active-store unit of entry `name`.
fn counterpart(library: &Library, name: &str, unit: &Utf8Path, single: bool) -> Utf8PathBuf {
    let folder = unit.file_name().unwrap_or(name);
    let known = library
        .manifest
        .find_mod(name)
        .and_then(|m| m.paths.iter().find(|p| p.file_name() == Some(folder)));

    match known {
        Some(path) => path.clone(),
        None if single => library.paths.saved.join(name),
        None => library.paths.saved.join(name).join(folder),
    }
}

/// Single-path entry whose folder is the lone unit nested in
/// `SavedMods/<slot>`, for an active slot named after no entry.
fn adoptable_owner(library: &Library, slot: &str, units: &[Utf8PathBuf]) -> Option<String> {
    if units.len() != 1 || library.manifest.find_mod(slot).is_some() {
        return None;
    }
    let folder = units[0].file_name()?;
    let wrapper = library.paths.saved.join(slot);

    library
        .manifest
        .mods()
        .find(|m| {
            m.paths.len() == 1
                && m.paths[0] != wrapper
                && m.paths[0].starts_with(&wrapper)
                && m.paths[0].file_name() == Some(folder)
        })
        .map(|m| m.name.clone())
}

/// Reports `path` as a conflict when it contains, or sits inside, a folder
/// recorded by an entry other than `name`.
fn nests_with_other(
    library: &Library,
    name: &str,
    path: &Utf8Path,
    console: &mut Console,
    report: &mut ReconcileReport,
) -> bool {
    let Some(other) = library.manifest.mods().find(|m| {
        m.name != name
            && m.paths
                .iter()
                .any(|p| p != path && (p.starts_with(path) || path.starts_with(p)))
    }) else {
        return false;
    };

    warn!("{} overlaps a folder of '{}'", path, other.name);
    console.say(format!("\t[ ! ] {} overlaps a folder of '{}', skipping.", path, other.name));
    report.conflicts.push(path.to_owned());
    true
}

/// Records `path` as a unit of `name`.
///
/// A path owned by a multi-path entry of another name is skipped and reported.
/// A path owned by a single-path entry stays with it (a renamed mod keeps its
/// name), unless `path` is one of several units found together: the multi-path
/// mod then takes it over and the emptied entry is pruned later. A path
/// overlapping another entry's folder is skipped and reported.
fn claim(
    library: &mut Library,
    name: &str,
    path: Utf8PathBuf,
    from_active: bool,
    multi: bool,
    console: &mut Console,
    report: &mut ReconcileReport,
) {
    let manifest = &mut library.manifest;

    if let Some(owner) = manifest.mods_mut().find(|m| m.owns(&path)) {
        if owner.name != name && owner.is_multi_path() {
            warn!("{} already belongs to multi-path mod '{}'", path, owner.name);
            console.say(format!(
                "\t[ ! ] {} already belongs to multi-path mod '{}', skipping.",
                path, owner.name
            ));
            report.conflicts.push(path);
            return;
        }
        if owner.name == name || !multi {
            owner.enabled |= from_active;
            return;
        }
        info!("'{}' takes {} over from '{}'", name, path, owner.name);
        owner.paths.retain(|p| *p != path);
    }

    if nests_with_other(library, name, &path, console, report) {
        return;
    }
    let manifest = &mut library.manifest;

    if let Some(entry) = manifest.find_mod_mut(name) {
        if entry.add_path(path) {
            debug!("'{}' is now multi-path", entry.name);
        }
        entry.enabled |= from_active;
        return;
    }

    let name = manifest.unique_name(name);
    let mut entry = ModEntry::new(name.clone(), vec![path.clone()], modified_unix(&path));
    entry.enabled = from_active;
    manifest.push(ManifestItem::Mod(entry));

    console.say(format!("\t[ + ] Found {}", name));
    report.added.push(name);
}

/// Drops recorded folders that no longer exist, then entries and groups left empty.
fn prune_missing_paths(library: &mut Library, console: &mut Console, report: &mut ReconcileReport) {
    for entry in library.manifest.mods_mut() {
        entry.paths.retain(|p| p.is_dir());
    }

    for name in library.manifest.remove_mods_where(|m| m.paths.is_empty()) {
        console.say(format!("\t[ - ] '{}' has no folders left, removing it.", name));
        report.pruned.push(name);
    }

    library.manifest.items_mut().retain(|item| match item {
        ManifestItem::Group(g) if g.members.is_empty() => {
            report.pruned.push(g.name.clone());
            false
        }
        _ => true,
    });
}

/// Removes single-path entries whose folder a multi-path entry also records.
fn drop_shadowed_entries(library: &mut Library, console: &mut Console, report: &mut ReconcileReport) {
    let multi: HashSet<Utf8PathBuf> = library
        .manifest
        .mods()
        .filter(|m| m.is_multi_path())
        .flat_map(|m| m.paths.iter().cloned())
        .collect();

    let dropped = library
        .manifest
        .remove_mods_where(|m| !m.is_multi_path() && m.paths.iter().any(|p| multi.contains(p)));
    for name in dropped {
        console.say(format!("\t[ - ] '{}' is covered by a multi-path mod, removing it.", name));
        report.pruned.push(name);
    }
}

/// A mod is enabled iff `Mods/<name>` exists; a group iff all its members are.
fn recompute_enabled(library: &mut Library) {
    let rules = &library.paths;
    for item in library.manifest.items_mut() {
        for entry in item.mods_mut() {
            entry.enabled = rules.active_slot(&entry.name).is_dir();
        }
        if let ManifestItem::Group(g) = item {
            g.enabled = !g.members.is_empty() && g.members.iter().all(|m| m.enabled);
        }
    }
}

/// Moves single-path entries living anywhere other than directly under the
/// inactive store to `SavedMods/<name>`, re-materializing enabled ones.
fn repair_stray_entries(
    library: &mut Library,
    console: &mut Console,
    report: &mut ReconcileReport,
) -> Result<(), SError> {
    let rules = library.paths.clone();
    let strays: Vec<(String, Utf8PathBuf)> = library
        .manifest
        .mods()
        .filter(|m| m.paths.len() == 1)
        .filter(|m| m.paths[0].is_dir() && m.paths[0].parent() != Some(rules.saved.as_path()))
        .map(|m| (m.name.clone(), m.paths[0].clone()))
        .collect();

    for (name, current) in strays {
        let dest = rules.saved.join(&name);
        let taken = library
            .manifest
            .mods()
            .any(|m| m.name != name && m.paths.iter().any(|p| p.starts_with(&dest)));
        if taken {
            console.say(format!("\t[ ! ] Cannot move '{}' to {}: folder in use.", name, dest));
            report.conflicts.push(dest);
            continue;
        }

        let stale = stale_wrapper(&rules, &current).filter(|top| {
            !library
                .manifest
                .mods()
                .any(|m| m.name != name && m.paths.iter().any(|p| p.starts_with(top)))
                // A wrapper that is a mod of its own stays
                && !ModFS::has_marker(top, &library.allow_list).unwrap_or(true)
        });

        relocate(&current, &dest, stale.as_deref(), &rules)?;
        info!("Repaired '{}': {} -> {}", name, current, dest);
        console.say(format!("\t[ * ] Moved '{}' to {}", name, dest));

        if let Some(entry) = library.manifest.find_mod_mut(&name) {
            entry.paths = vec![dest];
            if entry.enabled {
                deployment::deactivate_mod(&rules, entry)?;
                deployment::activate_mod(&rules, entry, console)?;
            }
        }
        report.repaired.push(name);
    }

    Ok(())
}

/// Top-level inactive-store folder holding `path`, if `path` is nested inside one.
fn stale_wrapper(rules: &StoreRules, path: &Utf8Path) -> Option<Utf8PathBuf> {
    let rel = path.strip_prefix(&rules.saved).ok()?;
    let top = rel.components().next()?;
    Some(rules.saved.join(top))
}

/// Copies `current` to `dest`, removing `stale` (and a previous `dest`) on the way.
fn relocate(
    current: &Utf8Path,
    dest: &Utf8Path,
    stale: Option<&Utf8Path>,
    rules: &StoreRules,
) -> Result<(), SError> {
    // `dest` may contain `current`, so the copy goes through a parking folder
    let parked = rules.saved.join(format!(".repair-{}", Uuid::new_v4()));
    FileUtils::copy_recursive(current, &parked)?;

    if let Some(stale) = stale {
        FileUtils::remove_dir_if_exists(stale)?;
    }
    FileUtils::remove_dir_if_exists(dest)?;
    FileUtils::move_dir(&parked, dest)?;
    Ok(())
}
