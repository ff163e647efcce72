use crate::models::error::SError;
use crate::models::manifest::{AllowList, Manifest};
use crate::models::paths::StoreRules;
use crate::utils::json::Json;
use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info, instrument, warn};

/// The WWMI folder: stores on disk plus the manifest and allow list in memory.
pub struct Library {
    pub root: Utf8PathBuf,
    pub paths: StoreRules,
    pub manifest: Manifest,
    pub allow_list: AllowList,
    pub(crate) is_dirty: bool,
}

impl Library {
    /// Opens the library rooted at `root`, creating any missing store folders
    /// and bookkeeping files. A missing root is an error.
    #[instrument]
    pub fn open(root: &Utf8Path) -> Result<Self, SError> {
        if !root.is_dir() {
            return Err(SError::FileOrDirectoryNotFound(root.to_string()));
        }

        let root = Utf8PathBuf::try_from(dunce::canonicalize(root)?)?;
        let paths = StoreRules::new(&root);
        Self::ensure_directories(&paths)?;

        let manifest = Self::load_manifest(&paths.manifest);
        let allow_list = Self::load_allow_list(&paths.allow_list);
        info!("Opened library at {} ({} entries)", root, manifest.len());

        let mut library = Self {
            root,
            paths,
            manifest,
            allow_list,
            is_dirty: false,
        };
        if library.absolutize_paths() {
            library.mark_dirty();
        }
        Ok(library)
    }

    /// Rewrites relative mod paths as absolute paths under the inactive store.
    fn absolutize_paths(&mut self) -> bool {
        let mut changed = false;
        for entry in self.manifest.mods_mut() {
            for path in entry.paths.iter_mut().filter(|p| p.is_relative()) {
                *path = self.paths.resolve(path);
                changed = true;
            }
        }
        changed
    }

    pub fn ensure_directories(paths: &StoreRules) -> Result<(), SError> {
        for dir in paths.directories() {
            std::fs::create_dir_all(dir)?;
        }

        for file in [&paths.manifest, &paths.allow_list] {
            if !file.exists() {
                debug!("Seeding {}", file);
                std::fs::write(file, "[]")?;
            }
        }
        Ok(())
    }

    /// Reads the manifest. An unreadable or corrupt file yields an empty
    /// manifest, which the next save overwrites.
    pub fn load_manifest(path: &Utf8Path) -> Manifest {
        match Json::read::<Manifest>(path) {
            Ok(manifest) => manifest,
            Err(SError::FileOrDirectoryNotFound(_)) => Manifest::default(),
            Err(e) => {
                warn!("Corrupted manifest at {}, resetting: {}", path, e);
                Manifest::default()
            }
        }
    }

    pub fn load_allow_list(path: &Utf8Path) -> AllowList {
        match Json::read::<AllowList>(path) {
            Ok(list) => list,
            Err(SError::FileOrDirectoryNotFound(_)) => AllowList::default(),
            Err(e) => {
                warn!("Corrupted allow list at {}, resetting: {}", path, e);
                AllowList::default()
            }
        }
    }

    /// Marks the library as dirty (modified).
    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    /// Overwrites the manifest and allow list on disk.
    pub fn persist(&mut self) -> Result<(), SError> {
        Json::write(&self.paths.manifest, &self.manifest)?;
        Json::write(&self.paths.allow_list, &self.allow_list)?;
        self.is_dirty = false;
        Ok(())
    }
}
