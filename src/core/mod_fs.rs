use crate::models::classification::Classification;
use crate::models::error::SError;
use crate::models::manifest::AllowList;
use crate::utils::console::Console;
use crate::utils::file::FileUtils;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// File whose presence makes a folder a mod payload.
pub const CANONICAL_MARKER: &str = "mod.ini";
/// Extension of the non-canonical markers offered for allow-listing.
pub const MARKER_EXTENSION: &str = "ini";

/// How deep the marker walk looks below a candidate root.
const MAX_MARKER_DEPTH: usize = 8;
/// Upper bound on single-child wrapper descent.
const MAX_WRAPPER_DEPTH: usize = 64;

pub struct ModFS;

impl ModFS {
    /// A folder is marker-bearing when it directly holds `mod.ini`, or when its
    /// name is allow-listed and it directly holds any `.ini` file.
    pub fn has_marker(dir: &Utf8Path, allow: &AllowList) -> Result<bool, SError> {
        let files = FileUtils::children(dir)?;
        let canonical = files
            .iter()
            .any(|p| p.is_file() && p.file_name().is_some_and(|n| n.eq_ignore_ascii_case(CANONICAL_MARKER)));
        if canonical {
            return Ok(true);
        }

        match dir.file_name() {
            Some(name) if allow.contains(name) => FileUtils::has_file_with_extension(dir, MARKER_EXTENSION),
            _ => Ok(false),
        }
    }

    /// Decides whether `root` holds zero, one or several mods.
    ///
    /// Single-child wrapper folders are descended through. A folder whose
    /// subfolders carry markers becomes MULTI when more than one qualifies.
    /// Unreadable or missing folders classify as NOT_A_MOD.
    pub fn classify(root: &Utf8Path, allow: &AllowList) -> Classification {
        if !root.is_dir() {
            return Classification::not_a_mod();
        }

        match Self::try_classify(root, allow) {
            Ok(c) => c,
            Err(e) => {
                warn!("Could not classify {}: {}", root, e);
                Classification::not_a_mod()
            }
        }
    }

    fn try_classify(root: &Utf8Path, allow: &AllowList) -> Result<Classification, SError> {
        let mut current = root.to_owned();

        for _ in 0..MAX_WRAPPER_DEPTH {
            // 1. Marker right here
            if Self::has_marker(&current, allow)? {
                return Ok(Classification::single(current));
            }

            // 2. Wrapper folder: follow the only child
            let mut subdirs = FileUtils::subdirectories(&current)?;
            if subdirs.len() == 1 {
                current = subdirs.remove(0);
                continue;
            }

            // 3. Several children: keep those that carry a marker themselves
            let mut units = Vec::new();
            for sub in subdirs {
                if Self::has_marker(&sub, allow)? {
                    units.push(sub);
                }
            }

            return Ok(match units.len() {
                0 => Classification::not_a_mod(),
                1 => Classification::single(units.remove(0)),
                _ => {
                    let name = current.file_name().unwrap_or_default().to_owned();
                    Classification::multi(name, units)
                }
            });
        }

        debug!("wrapper chain under {} is too deep", root);
        Ok(Classification::not_a_mod())
    }

    /// Follows single-child wrapper folders down to the first folder that
    /// either carries a marker or branches.
    pub fn collapse_wrappers(root: &Utf8Path, allow: &AllowList) -> Result<Utf8PathBuf, SError> {
        let mut current = root.to_owned();
        for _ in 0..MAX_WRAPPER_DEPTH {
            if Self::has_marker(&current, allow)? {
                break;
            }
            let mut subdirs = FileUtils::subdirectories(&current)?;
            if subdirs.len() != 1 {
                break;
            }
            current = subdirs.remove(0);
        }
        Ok(current)
    }

    /// Walks every `.ini` file below `root` and returns the folders accepted as mods.
    ///
    /// Folders holding `mod.ini` or an allow-listed name are accepted silently.
    /// For any other folder the user is asked once; a yes adds the folder name
    /// to `allow`. Folders below an accepted folder are skipped. Closed input
    /// counts as a no for every remaining folder.
    pub fn discover_markers(
        root: &Utf8Path,
        allow: &mut AllowList,
        console: &mut Console,
    ) -> Result<Vec<Utf8PathBuf>, SError> {
        let mut accepted: Vec<Utf8PathBuf> = Vec::new();
        let mut declined: BTreeSet<Utf8PathBuf> = BTreeSet::new();
        let mut interactive = true;

        let walker = WalkDir::new(root)
            .max_depth(MAX_MARKER_DEPTH)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let file = Utf8PathBuf::try_from(entry.into_path())?;
            if !file.extension().is_some_and(|e| e.eq_ignore_ascii_case(MARKER_EXTENSION)) {
                continue;
            }

            let Some(folder) = file.parent().map(Utf8Path::to_path_buf) else {
                continue;
            };
            if accepted.iter().any(|a| folder.starts_with(a)) || declined.contains(&folder) {
                continue;
            }

            let folder_name = folder.file_name().unwrap_or_default().to_owned();
            let file_name = file.file_name().unwrap_or_default();
            if file_name.eq_ignore_ascii_case(CANONICAL_MARKER) || allow.contains(&folder_name) {
                accepted.push(folder);
                continue;
            }

            if !interactive {
                continue;
            }
            let question = format!(
                "'{}' has no {} but contains '{}'. Treat '{}' as a mod?",
                folder, CANONICAL_MARKER, file_name, folder_name
            );
            let allowed = match console.confirm(&question, false) {
                Ok(answer) => answer,
                // Nobody to ask: keep the walk going without prompting
                Err(SError::InputClosed) => {
                    interactive = false;
                    false
                }
                Err(e) => return Err(e),
            };
            if allowed {
                info!("Allow-listing folder name '{}'", folder_name);
                allow.insert(folder_name);
                accepted.push(folder);
            } else {
                declined.insert(folder);
            }
        }

        Ok(accepted)
    }

    /// Classifies `root`, falling back to the allow-list walk when nothing
    /// qualifies. Newly allowed folder names trigger a second classification.
    pub fn classify_interactive(
        root: &Utf8Path,
        allow: &mut AllowList,
        console: &mut Console,
    ) -> Result<Classification, SError> {
        let first = Self::classify(root, allow);
        if first.is_mod() || !root.is_dir() {
            return Ok(first);
        }

        let before = allow.len();
        Self::discover_markers(root, allow, console)?;
        if allow.len() == before {
            return Ok(first);
        }

        Ok(Self::classify(root, allow))
    }
}
