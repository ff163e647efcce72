use crate::core::library::Library;
use crate::models::error::SError;
use crate::models::mod_dto::{ManifestItem, ModEntry};
use crate::models::paths::StoreRules;
use crate::models::selection::Selection;
use crate::utils::console::Console;
use crate::utils::file::FileUtils;
use tracing::{debug, error, info, instrument, warn};

/// What a batch of activation changes did, by entry name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ActivationReport {
    pub enabled: Vec<String>,
    pub disabled: Vec<String>,
    pub failed: Vec<String>,
}

/// Copies every payload folder of `entry` into `Mods/<name>/<folder>`.
///
/// Missing source folders are reported and skipped. The entry ends up enabled
/// when at least one folder made it into the active store.
pub fn activate_mod(rules: &StoreRules, entry: &mut ModEntry, console: &mut Console) -> Result<(), SError> {
    let slot = rules.active_slot(&entry.name);
    let mut copied = 0;

    for path in &entry.paths {
        let src = rules.resolve(path);
        let Some(folder) = src.file_name().filter(|_| src.is_dir()) else {
            warn!("Source folder for '{}' is missing: {}", entry.name, src);
            console.say(format!("\t[ ! ] Source folder for '{}' is missing: {}", entry.name, src));
            continue;
        };

        debug!("copying {} -> {}", src, slot.join(folder));
        FileUtils::copy_recursive(&src, &slot.join(folder))?;
        copied += 1;
    }

    entry.enabled = copied > 0;
    Ok(())
}

/// Removes the active-store copy of `entry`.
pub fn deactivate_mod(rules: &StoreRules, entry: &mut ModEntry) -> Result<(), SError> {
    let slot = rules.active_slot(&entry.name);

    for path in &entry.paths {
        if let Some(folder) = path.file_name() {
            FileUtils::remove_dir_if_exists(&slot.join(folder))?;
        }
    }
    FileUtils::remove_dir_if_exists(&slot)?;

    entry.enabled = false;
    Ok(())
}

/// Activates a mod, or every disabled member of a group.
pub fn activate(rules: &StoreRules, item: &mut ManifestItem, console: &mut Console) -> Result<(), SError> {
    match item {
        ManifestItem::Mod(m) => activate_mod(rules, m, console),
        ManifestItem::Group(g) => {
            for member in g.members.iter_mut().filter(|m| !m.enabled) {
                activate_mod(rules, member, console)?;
            }
            g.enabled = true;
            Ok(())
        }
    }
}

/// Deactivates a mod, or every member of a group. Members end up disabled too.
pub fn deactivate(rules: &StoreRules, item: &mut ManifestItem) -> Result<(), SError> {
    match item {
        ManifestItem::Mod(m) => deactivate_mod(rules, m),
        ManifestItem::Group(g) => {
            for member in g.members.iter_mut() {
                deactivate_mod(rules, member)?;
            }
            g.enabled = false;
            Ok(())
        }
    }
}

/// Flips the state of each selected entry. Indices are 1-based positions in
/// the manifest as it is when the call starts.
#[instrument(skip(library, console))]
pub fn toggle(library: &mut Library, selection: &Selection, console: &mut Console) -> Result<ActivationReport, SError> {
    apply(library, selection, None, console)
}

/// Drives each selected entry to `enabled`, leaving entries already there untouched.
#[instrument(skip(library, console))]
pub fn set_enabled(
    library: &mut Library,
    selection: &Selection,
    enabled: bool,
    console: &mut Console,
) -> Result<ActivationReport, SError> {
    apply(library, selection, Some(enabled), console)
}

/// Whether `item` already is in the `enabled` state, judged by its members
/// for a group.
fn settled(item: &ManifestItem, enabled: bool) -> bool {
    match item {
        ManifestItem::Mod(m) => m.enabled == enabled,
        ManifestItem::Group(g) if enabled => g.enabled && g.members.iter().all(|m| m.enabled),
        ManifestItem::Group(g) => !g.enabled && g.members.iter().all(|m| !m.enabled),
    }
}

fn apply(
    library: &mut Library,
    selection: &Selection,
    target: Option<bool>,
    console: &mut Console,
) -> Result<ActivationReport, SError> {
    let (positions, rejected) = selection.resolve(library.manifest.len());
    for idx in rejected {
        console.say(format!("\t[ ! ] {} is out of range and will be ignored.", idx));
    }

    let mut report = ActivationReport::default();
    let rules = library.paths.clone();

    for pos in positions {
        let item = &mut library.manifest.items_mut()[pos];
        let enable = target.unwrap_or(!item.enabled());
        if target.is_some() && settled(item, enable) {
            continue;
        }

        let name = item.name().to_owned();
        let result = if enable {
            activate(&rules, item, console)
        } else {
            deactivate(&rules, item)
        };

        match result {
            Ok(()) if item.enabled() != enable => {
                console.say(format!("\t[ ! ] '{}' could not be enabled.", name));
                report.failed.push(name);
            }
            Ok(()) if enable => {
                console.say(format!("\t[ + ] Enabled '{}'", name));
                report.enabled.push(name);
            }
            Ok(()) => {
                console.say(format!("\t[ - ] Disabled '{}'", name));
                report.disabled.push(name);
            }
            Err(e) => {
                error!("Could not change '{}': {}", name, e);
                console.say(format!("\t[ ! ] Could not change '{}': {}", name, e));
                report.failed.push(name);
            }
        }
    }

    info!(
        "{} enabled, {} disabled, {} failed",
        report.enabled.len(),
        report.disabled.len(),
        report.failed.len()
    );
    library.mark_dirty();
    library.persist()?;
    Ok(report)
}
