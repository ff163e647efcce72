use crate::commands::HandlerEnv;
use crate::core::library::Library;
use crate::core::quarantine::{self, QuarantinedFolder};
use crate::core::reconciler::{self, ReconcileReport};
use crate::models::error::SError;
use crate::utils::console::{Console, MenuChoice};
use tracing::info;

/// Re-derives the manifest from the stores on disk.
pub fn rebuild(library: &mut Library, console: &mut Console, _env: &HandlerEnv) -> Result<(), SError> {
    console.say(format!("{:=^40}", "- Rebuild modlist -"));
    console.say("This will make sure all valid mods in SavedMods or Mods are registered in modlist.json.");

    let delete_invalid = console.confirm("Delete folders that are not mods?", false)?;
    let report = reconciler::rebuild(library, delete_invalid, console)?;
    summarize(&report, console);
    Ok(())
}

pub fn summarize(report: &ReconcileReport, console: &mut Console) {
    console.say(format!(
        "[ + ] Rebuild done: {} added, {} invalid ({} deleted), {} conflicts, {} pruned, {} repaired, {} adopted.",
        report.added.len(),
        report.invalid.len(),
        report.deleted.len(),
        report.conflicts.len(),
        report.pruned.len(),
        report.repaired.len(),
        report.adopted.len()
    ));
}

/// Brings a quarantined folder back into SavedMods.
pub fn restore(library: &mut Library, console: &mut Console, _env: &HandlerEnv) -> Result<(), SError> {
    let folders = quarantine::list(&library.paths)?;
    if folders.is_empty() {
        console.say("DeletedMods is empty.");
        return Ok(());
    }

    let labels: Vec<String> = folders.iter().map(QuarantinedFolder::label).collect();
    let pick = match console.select("[ 0 ] Cancel", "Folder to restore: ", &labels, false)? {
        MenuChoice::Zero => return Ok(()),
        MenuChoice::Picks(picks) => match picks.first().and_then(|p| folders.get(p - 1)) {
            Some(folder) => folder.name.clone(),
            None => return Ok(()),
        },
    };

    match quarantine::restore(library, &pick, console)? {
        Some(outcome) => info!("Restored {} as {:?}", pick, outcome),
        None => info!("{} stayed in quarantine", pick),
    }
    Ok(())
}
