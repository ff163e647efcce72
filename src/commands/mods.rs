use crate::commands::{choice_to_selection, HandlerEnv};
use crate::core::deployment;
use crate::core::library::Library;
use crate::core::mod_manager;
use crate::core::mod_stager::{InstallOutcome, ModStager};
use crate::models::error::SError;
use crate::models::manifest::Manifest;
use crate::models::mod_dto::ManifestItem;
use crate::utils::console::{Console, MenuChoice};
use camino::Utf8PathBuf;
use tracing::debug;

const EMPTY_HINT: &str = "No mods installed. If there are mods in the SavedMods folder, run 'Rebuild' to add them.";

fn entry_names(manifest: &Manifest) -> Vec<String> {
    manifest.items().iter().map(|i| i.name().to_owned()).collect()
}

/// Installs archives picked from the downloads folder, newest first.
pub fn install(library: &mut Library, console: &mut Console, env: &HandlerEnv) -> Result<(), SError> {
    let zips = ModStager::find_archives(&env.downloads)?;
    if zips.is_empty() {
        console.say(format!("No .zip files in {}.", env.downloads));
        return Ok(());
    }

    let names: Vec<&str> = zips.iter().map(|z| z.file_name().unwrap_or(z.as_str())).collect();
    let choice = console.select(
        "[ 0 ] Any valid mod",
        "Indexes to install (space-separated): ",
        &names,
        true,
    )?;

    let picked: Vec<Utf8PathBuf> = match choice {
        MenuChoice::Zero => zips.clone(),
        MenuChoice::Picks(picks) => picks.into_iter().filter_map(|i| zips.get(i - 1).cloned()).collect(),
    };
    debug!("installing {:?}", picked);

    let results = ModStager::install_batch(library, &picked, console)?;
    let installed = results
        .iter()
        .filter(|(_, r)| matches!(r, Ok(InstallOutcome::Installed(_))))
        .count();
    console.say(format!("[ / ] {} of {} archives installed.", installed, results.len()));
    Ok(())
}

pub fn delete(library: &mut Library, console: &mut Console, _env: &HandlerEnv) -> Result<(), SError> {
    if library.manifest.is_empty() {
        console.say("Nothing to delete.");
        return Ok(());
    }

    let names = entry_names(&library.manifest);
    let choice = console.select("[ 0 ] All", "Indexes to delete (space-separated): ", &names, true)?;
    let selection = choice_to_selection(choice);

    if !console.confirm("Move the selected mods to DeletedMods?", false)? {
        console.say("Nothing deleted.");
        return Ok(());
    }

    let removed = mod_manager::delete_entries(library, &selection, console)?;
    console.say(format!("[ - ] {} entries deleted.", removed.len()));
    Ok(())
}

pub fn toggle(library: &mut Library, console: &mut Console, _env: &HandlerEnv) -> Result<(), SError> {
    if library.manifest.is_empty() {
        console.say("No mods to toggle.");
        return Ok(());
    }

    let names = entry_names(&library.manifest);
    let choice = console.select("[ 0 ] All", "Indexes to toggle (space-separated): ", &names, true)?;
    deployment::toggle(library, &choice_to_selection(choice), console)?;
    Ok(())
}

pub fn list(library: &mut Library, console: &mut Console, _env: &HandlerEnv) -> Result<(), SError> {
    for line in render_table(&library.manifest) {
        console.say(line);
    }
    Ok(())
}

/// Lays out the manifest as an index / name / status table.
pub fn render_table(manifest: &Manifest) -> Vec<String> {
    if manifest.is_empty() {
        return vec![EMPTY_HINT.to_owned()];
    }

    let idx_w = 4;
    let name_w = manifest
        .items()
        .iter()
        .map(|i| i.name().chars().count())
        .max()
        .unwrap_or(0)
        .max(12);
    let status_w = "Enabled".len() + 2;
    let total_w = idx_w + name_w + status_w + 10;

    let mut lines = Vec::with_capacity(manifest.len() + 4);
    lines.push(format!("{:=^total_w$}", " Installed mods "));
    lines.push(format!("{:^idx_w$} | {:^name_w$} | {:^status_w$}", "Idx", "Mod Name", "Status"));
    lines.push("-".repeat(total_w));

    for (idx, item) in manifest.items().iter().enumerate() {
        let status = if item.enabled() { "Enabled" } else { "Disabled" };
        let name = match item {
            ManifestItem::Group(g) => format!("{} ({})", g.name, g.members.len()),
            ManifestItem::Mod(m) => m.name.clone(),
        };
        lines.push(format!("{:^idx_w$} | {:^name_w$} | {:^status_w$}", idx + 1, name, status));
    }

    lines.push("=".repeat(total_w));
    lines
}

/// Wraps several top-level mods into a group.
pub fn group(library: &mut Library, console: &mut Console, _env: &HandlerEnv) -> Result<(), SError> {
    console.say(format!("{:=^40}", "- Create a group -"));
    console.say("This will create a group of mods, allowing you to toggle them all at once.");

    let candidates: Vec<String> = library
        .manifest
        .items()
        .iter()
        .filter(|i| !i.is_group())
        .map(|i| i.name().to_owned())
        .collect();
    if candidates.is_empty() {
        console.say("No mods installed.");
        return Ok(());
    }

    let picks = match console.select(
        "[ 0 ] Cancel",
        "Indexes of mods to group (space-separated): ",
        &candidates,
        true,
    )? {
        MenuChoice::Zero => return Ok(()),
        MenuChoice::Picks(picks) => picks,
    };
    let members: Vec<String> = picks.iter().filter_map(|i| candidates.get(i - 1).cloned()).collect();

    console.say(format!("{:^20}", "- Selected -"));
    for (idx, name) in members.iter().enumerate() {
        console.say(format!("[ {} ] {}", idx + 1, name));
    }

    loop {
        let given = console.ask_line("Enter a name for the group (leave empty to auto-generate): ")?;
        let name = (!given.is_empty()).then_some(given.as_str());
        match mod_manager::create_group(library, &members, name) {
            Ok(name) => {
                console.say(format!("\t[ + ] Created group '{}' with {} mods.", name, members.len()));
                return Ok(());
            }
            Err(SError::NameCollision(name)) => console.say(format!("'{}' already exists.", name)),
            Err(SError::InvalidName(name)) => console.say(format!("'{}' is not a valid name.", name)),
            Err(e) => return Err(e),
        }
    }
}

pub fn rename(library: &mut Library, console: &mut Console, _env: &HandlerEnv) -> Result<(), SError> {
    if library.manifest.is_empty() {
        console.say(EMPTY_HINT);
        return Ok(());
    }

    let names = entry_names(&library.manifest);
    let position = match console.select("[ 0 ] Cancel", "Entry to rename: ", &names, false)? {
        MenuChoice::Zero => return Ok(()),
        MenuChoice::Picks(picks) => match picks.first() {
            Some(p) => p - 1,
            None => return Ok(()),
        },
    };

    let current = names[position].clone();
    loop {
        let new_name = console.ask_line(&format!("New name for '{}' (empty to cancel): ", current))?;
        if new_name.is_empty() {
            return Ok(());
        }

        match mod_manager::rename_entry(library, position, &new_name) {
            Ok(()) => {
                console.say(format!("Renamed '{}' to '{}'", current, new_name));
                return Ok(());
            }
            Err(SError::UnchangedName) => console.say("That is the current name, pick another one."),
            Err(SError::NameCollision(_)) => console.say("A mod with this name already exists."),
            Err(SError::InvalidName(_)) => console.say("Names cannot contain path separators."),
            Err(e) => return Err(e),
        }
    }
}

/// Attaches a catalog id to a mod, group members included.
pub fn link(library: &mut Library, console: &mut Console, _env: &HandlerEnv) -> Result<(), SError> {
    let names: Vec<String> = library.manifest.mods().map(|m| m.name.clone()).collect();
    if names.is_empty() {
        console.say(EMPTY_HINT);
        return Ok(());
    }

    let name = match console.select("[ 0 ] Cancel", "Mod to link: ", &names, false)? {
        MenuChoice::Zero => return Ok(()),
        MenuChoice::Picks(picks) => match picks.first().and_then(|p| names.get(p - 1)) {
            Some(name) => name.clone(),
            None => return Ok(()),
        },
    };

    let id = console.ask_line("Catalog id (empty to clear): ")?;
    let id = (!id.is_empty()).then_some(id);
    let cleared = id.is_none();
    mod_manager::link_external_id(library, &name, id)?;

    if cleared {
        console.say(format!("\t[ - ] Cleared the catalog id of '{}'", name));
    } else {
        console.say(format!("\t[ + ] Linked '{}'", name));
    }
    Ok(())
}
