use crate::core::deployment;
use crate::core::library::Library;
use crate::core::quarantine;
use crate::models::error::SError;
use crate::models::manifest::Manifest;
use crate::models::mod_dto::{GroupEntry, ManifestItem, ModEntry};
use crate::models::selection::Selection;
use crate::utils::console::Console;
use crate::utils::file::FileUtils;
use camino::Utf8PathBuf;
use std::collections::BTreeSet;
use tracing::{info, instrument, warn};

/// Result of merging an installed payload into the manifest, with the entry name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Added(String),
    Updated(String),
    Unchanged(String),
}

impl UpsertOutcome {
    pub fn name(&self) -> &str {
        match self {
            UpsertOutcome::Added(n) | UpsertOutcome::Updated(n) | UpsertOutcome::Unchanged(n) => n,
        }
    }
}

/// Merges `units` under `name`.
///
/// An entry already recording one of the units wins over a name match, so a
/// renamed mod keeps its name when reinstalled. A matching entry gets its
/// paths replaced when they differ; otherwise a disabled entry is appended.
pub fn upsert(manifest: &mut Manifest, name: &str, units: Vec<Utf8PathBuf>, date: i64) -> UpsertOutcome {
    let target = manifest
        .mods()
        .position(|m| units.iter().any(|u| m.owns(u)))
        .or_else(|| manifest.mods().position(|m| m.name == name));

    if let Some(entry) = target.and_then(|pos| manifest.mods_mut().nth(pos)) {
        if entry.paths == units {
            return UpsertOutcome::Unchanged(entry.name.clone());
        }
        entry.paths = units;
        return UpsertOutcome::Updated(entry.name.clone());
    }

    let name = manifest.unique_name(name);
    manifest.push(ManifestItem::Mod(ModEntry::new(name.clone(), units, date)));
    UpsertOutcome::Added(name)
}

fn validate_name(manifest: &Manifest, current: Option<&str>, name: &str) -> Result<(), SError> {
    if name.is_empty() {
        return Err(SError::EmptyName);
    }
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(SError::InvalidName(name.to_owned()));
    }
    if current == Some(name) {
        return Err(SError::UnchangedName);
    }
    if manifest.contains_name(name) {
        return Err(SError::NameCollision(name.to_owned()));
    }
    Ok(())
}

/// Name given to a group created without one.
pub fn auto_group_name(members: &[String]) -> String {
    members
        .iter()
        .map(String::as_str)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>()
        .join("-")
}

/// Wraps the named top-level mods into a new disabled group appended to the manifest.
///
/// Given names are lowercased; without one the sorted member names joined by
/// `-` are used, with a `-N` suffix when taken. Mods already inside a group
/// cannot be picked.
#[instrument(skip(library))]
pub fn create_group(library: &mut Library, members: &[String], name: Option<&str>) -> Result<String, SError> {
    if members.is_empty() {
        return Err(SError::EmptySelection);
    }

    for member in members {
        match library.manifest.position(member).map(|p| &library.manifest.items()[p]) {
            Some(ManifestItem::Mod(_)) => {}
            _ => return Err(SError::EntryNotFound(member.clone())),
        }
    }

    let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(given) => given.to_lowercase(),
        // A lone member's name is taken by the member itself
        None => library.manifest.unique_name(&auto_group_name(members)),
    };
    validate_name(&library.manifest, None, &name)?;

    let mut picked = Vec::with_capacity(members.len());
    for member in members {
        let Some(pos) = library.manifest.position(member) else {
            continue;
        };
        if let ManifestItem::Mod(m) = library.manifest.items_mut().remove(pos) {
            picked.push(m);
        }
    }

    info!("Grouping {} mods as '{}'", picked.len(), name);
    library.manifest.push(ManifestItem::Group(GroupEntry {
        name: name.clone(),
        enabled: false,
        members: picked,
    }));
    library.mark_dirty();
    library.persist()?;
    Ok(name)
}

/// Renames the entry at 0-based `position`. An enabled mod's active-store
/// folder is renamed along with it.
#[instrument(skip(library))]
pub fn rename_entry(library: &mut Library, position: usize, new_name: &str) -> Result<(), SError> {
    let new_name = new_name.trim();
    let current = library
        .manifest
        .items()
        .get(position)
        .map(|i| i.name().to_owned())
        .ok_or(SError::IndexOutOfRange(position + 1))?;
    validate_name(&library.manifest, Some(&current), new_name)?;

    let old_slot = library.paths.active_slot(&current);
    let item = &mut library.manifest.items_mut()[position];
    if matches!(item, ManifestItem::Mod(_)) && old_slot.exists() {
        FileUtils::move_dir(&old_slot, &library.paths.active_slot(new_name))?;
    }
    item.set_name(new_name.to_owned());

    info!("Renamed '{}' to '{}'", current, new_name);
    library.mark_dirty();
    library.persist()
}

/// Sets or clears the catalog id of the mod called `name`.
pub fn link_external_id(library: &mut Library, name: &str, id: Option<String>) -> Result<(), SError> {
    let entry = library
        .manifest
        .find_mod_mut(name)
        .ok_or_else(|| SError::EntryNotFound(name.to_owned()))?;
    entry.external_id = id.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty());

    library.mark_dirty();
    library.persist()
}

/// Removes the selected entries, moving their inactive-store folders into the
/// quarantine. Returns the names of the removed entries.
#[instrument(skip(library, console))]
pub fn delete_entries(
    library: &mut Library,
    selection: &Selection,
    console: &mut Console,
) -> Result<Vec<String>, SError> {
    let (mut positions, rejected) = selection.resolve(library.manifest.len());
    for idx in rejected {
        console.say(format!("\t[ ! ] {} is out of range and will be ignored.", idx));
    }

    // Highest position first so earlier positions stay valid
    positions.sort_unstable_by(|a, b| b.cmp(a));
    let mut removed: Vec<ManifestItem> = positions
        .into_iter()
        .map(|pos| library.manifest.items_mut().remove(pos))
        .collect();
    removed.reverse();

    let rules = library.paths.clone();
    let mut folders: BTreeSet<Utf8PathBuf> = BTreeSet::new();
    for item in removed.iter_mut() {
        for entry in item.mods_mut() {
            deployment::deactivate_mod(&rules, entry)?;
            for path in &entry.paths {
                let resolved = rules.resolve(path);
                match resolved.strip_prefix(&rules.saved).ok().and_then(|rel| rel.components().next()) {
                    Some(top) => {
                        folders.insert(rules.saved.join(top));
                    }
                    None => {
                        warn!("{} is outside the inactive store, leaving it in place", resolved);
                        console.say(format!("\t[ ! ] {} is outside SavedMods, left in place.", resolved));
                    }
                }
            }
        }
    }

    for folder in folders {
        let shared = library
            .manifest
            .mods()
            .any(|m| m.paths.iter().any(|p| rules.resolve(p).starts_with(&folder)));
        if shared {
            console.say(format!("\t[ ! ] {} is still used by another entry, keeping it.", folder));
            continue;
        }
        if folder.exists() {
            let dest = quarantine::quarantine(&rules, &folder)?;
            info!("Quarantined {} as {}", folder, dest);
        }
    }

    let names: Vec<String> = removed.iter().map(|i| i.name().to_owned()).collect();
    for name in &names {
        console.say(format!("\t[ - ] Deleted '{}'", name));
    }

    library.mark_dirty();
    library.persist()?;
    Ok(names)
}
