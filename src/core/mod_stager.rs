use crate::core::decompression::Decompression;
use crate::core::deployment;
use crate::core::library::Library;
use crate::core::mod_fs::ModFS;
use crate::core::mod_manager::{self, UpsertOutcome};
use crate::models::error::SError;
use crate::models::paths::StoreRules;
use crate::utils::console::Console;
use crate::utils::file::FileUtils;
use crate::utils::time::{get_unix_timestamp, modified_unix};
use camino::{Utf8Path, Utf8PathBuf};
use std::cmp::Reverse;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

pub struct ModStager;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed(UpsertOutcome),
    /// The archive held no mod; everything extracted was removed.
    Discarded,
}

impl ModStager {
    /// `*.zip` files directly inside `dir`, newest first.
    pub fn find_archives(dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, SError> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut zips: Vec<Utf8PathBuf> = FileUtils::children(dir)?
            .into_iter()
            .filter(|p| p.is_file() && p.extension().is_some_and(|e| e.eq_ignore_ascii_case("zip")))
            .collect();
        zips.sort_by_key(|p| Reverse(modified_unix(p)));
        Ok(zips)
    }

    /// Installs one archive into the inactive store and records it in the manifest.
    ///
    /// 1. Extract into `SavedMods/<archive stem>`, replacing an earlier extraction.
    /// 2. Follow single-child wrappers down to the payload root.
    /// 3. Move that root directly under `SavedMods` and drop the wrappers.
    /// 4. Classify it; a non-mod is deleted.
    /// 5. Upsert the result.
    ///
    /// The caller persists the library.
    #[instrument(skip(library, console))]
    pub fn install(
        library: &mut Library,
        archive: &Utf8Path,
        console: &mut Console,
    ) -> Result<InstallOutcome, SError> {
        let rules = library.paths.clone();
        let stem = archive
            .file_stem()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SError::InvalidName(archive.to_string()))?;
        let staging = rules.saved.join(stem);

        console.say(format!("\t[ / ] Checking {}", archive.file_name().unwrap_or(stem)));

        // 1. Extract
        FileUtils::remove_dir_if_exists(&staging)?;
        if let Err(e) = Decompression::extract(archive, &staging) {
            let _ = FileUtils::remove_dir_if_exists(&staging);
            return Err(e);
        }

        // 2-3. Collapse and promote
        let root = ModFS::collapse_wrappers(&staging, &library.allow_list)?;
        let promoted = Self::promote(&rules, &root, &staging)?;
        debug!("payload root {} promoted to {}", root, promoted);

        // 4. Classify
        let allowed = library.allow_list.len();
        let found = ModFS::classify_interactive(&promoted, &mut library.allow_list, console)?;
        if library.allow_list.len() != allowed {
            library.mark_dirty();
        }
        if !found.is_mod() {
            console.say(format!("\t[ ! ] {} isn't a mod, discarding.", archive));
            FileUtils::remove_dir_if_exists(&promoted)?;
            return Ok(InstallOutcome::Discarded);
        }

        // 5. Upsert
        let outcome = mod_manager::upsert(&mut library.manifest, &found.name, found.units, get_unix_timestamp());
        match &outcome {
            UpsertOutcome::Added(name) => console.say(format!("\t[ + ] Added {}", name)),
            UpsertOutcome::Updated(name) => console.say(format!("\t[ + ] Updating {}", name)),
            UpsertOutcome::Unchanged(name) => console.say(format!("\t[ = ] {} already present.", name)),
        }

        // An enabled mod gets its active copy refreshed from the new payload
        if let Some(entry) = library.manifest.find_mod_mut(outcome.name()) {
            if entry.enabled {
                deployment::deactivate_mod(&rules, entry)?;
                deployment::activate_mod(&rules, entry, console)?;
            }
        }

        library.mark_dirty();
        Ok(InstallOutcome::Installed(outcome))
    }

    /// Installs several archives; each failure is reported and skipped.
    /// The manifest is saved once at the end, if anything changed.
    pub fn install_batch(
        library: &mut Library,
        archives: &[Utf8PathBuf],
        console: &mut Console,
    ) -> Result<Vec<(Utf8PathBuf, Result<InstallOutcome, SError>)>, SError> {
        let results: Vec<_> = archives
            .iter()
            .map(|archive| {
                let result = Self::install(library, archive, console);
                if let Err(e) = &result {
                    error!("Failed to install {}: {}", archive, e);
                    console.say(format!("\t[ FATAL ] Failed to install {}: {}", archive, e));
                }
                (archive.clone(), result)
            })
            .collect();

        let installed = results.iter().filter(|(_, r)| r.is_ok()).count();
        info!("{} of {} archives processed", installed, archives.len());

        if library.is_dirty() {
            library.persist()?;
        }
        Ok(results)
    }

    /// Moves `root` to `SavedMods/<root name>`, removing the wrapper chain
    /// rooted at `staging`. An existing folder at the destination is replaced.
    fn promote(rules: &StoreRules, root: &Utf8Path, staging: &Utf8Path) -> Result<Utf8PathBuf, SError> {
        if root.parent() == Some(rules.saved.as_path()) {
            return Ok(root.to_owned());
        }

        let name = root
            .file_name()
            .ok_or_else(|| SError::InvalidName(root.to_string()))?
            .to_owned();

        // Park the payload outside the wrapper first, since the destination
        // may be the wrapper itself.
        let parked = rules.saved.join(format!(".promote-{}", Uuid::new_v4()));
        FileUtils::move_dir(root, &parked)?;
        FileUtils::remove_dir_if_exists(staging)?;

        let dest = rules.saved.join(&name);
        FileUtils::remove_dir_if_exists(&dest)?;
        FileUtils::move_dir(&parked, &dest)?;
        Ok(dest)
    }
}
