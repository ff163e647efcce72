use crate::core::library::Library;
use crate::core::mod_fs::ModFS;
use crate::core::mod_manager::{self, UpsertOutcome};
use crate::models::error::SError;
use crate::models::paths::StoreRules;
use crate::utils::console::Console;
use crate::utils::file::FileUtils;
use crate::utils::time::{get_unix_timestamp, modified_unix};
use camino::{Utf8Path, Utf8PathBuf};
use tracing::info;

/// A folder sitting in `DeletedMods`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuarantinedFolder {
    pub name: String,
    pub path: Utf8PathBuf,
    pub deleted_at: i64,
}

impl QuarantinedFolder {
    /// `name (deleted <timestamp>)`, for listings.
    pub fn label(&self) -> String {
        format!("{} (deleted {})", self.name, self.deleted_at)
    }
}

/// Moves `folder` into the quarantine and returns where it landed.
/// A name already taken there gets a `-<unix timestamp>` suffix.
pub fn quarantine(rules: &StoreRules, folder: &Utf8Path) -> Result<Utf8PathBuf, SError> {
    let name = folder
        .file_name()
        .ok_or_else(|| SError::InvalidName(folder.to_string()))?;

    let mut dest = rules.deleted.join(name);
    if dest.exists() {
        let stamp = get_unix_timestamp();
        dest = rules.deleted.join(format!("{}-{}", name, stamp));
        let mut n = 2;
        while dest.exists() {
            dest = rules.deleted.join(format!("{}-{}-{}", name, stamp, n));
            n += 1;
        }
    }

    FileUtils::move_dir(folder, &dest)?;
    Ok(dest)
}

/// Lists quarantined folders sorted by name.
pub fn list(rules: &StoreRules) -> Result<Vec<QuarantinedFolder>, SError> {
    if !rules.deleted.exists() {
        return Ok(Vec::new());
    }

    Ok(FileUtils::subdirectories(&rules.deleted)?
        .into_iter()
        .filter_map(|path| {
            Some(QuarantinedFolder {
                name: path.file_name()?.to_owned(),
                deleted_at: modified_unix(&path),
                path,
            })
        })
        .collect())
}

/// Moves a quarantined folder back into the inactive store and records it.
///
/// Returns `None` when the folder turns out not to be a mod; it is then put
/// back into the quarantine untouched.
pub fn restore(
    library: &mut Library,
    folder_name: &str,
    console: &mut Console,
) -> Result<Option<UpsertOutcome>, SError> {
    let src = library.paths.deleted.join(folder_name);
    if !src.is_dir() {
        return Err(SError::FileOrDirectoryNotFound(src.to_string()));
    }

    let dest = library.paths.saved.join(folder_name);
    if dest.exists() {
        return Err(SError::NameCollision(folder_name.to_owned()));
    }
    FileUtils::move_dir(&src, &dest)?;

    let found = ModFS::classify_interactive(&dest, &mut library.allow_list, console)?;
    if !found.is_mod() {
        console.say(format!("\t[ ! ] '{}' isn't a mod, leaving it in DeletedMods.", folder_name));
        FileUtils::move_dir(&dest, &src)?;
        return Ok(None);
    }

    let outcome = mod_manager::upsert(&mut library.manifest, &found.name, found.units, modified_unix(&dest));
    info!("Restored '{}' as '{}'", folder_name, outcome.name());
    console.say(format!("\t[ + ] Restored '{}'", outcome.name()));

    library.mark_dirty();
    library.persist()?;
    Ok(Some(outcome))
}
