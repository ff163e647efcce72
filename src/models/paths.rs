use camino::{Utf8Path, Utf8PathBuf};

macro_rules! define_paths {
    ($name:ident { $($field:ident : $default:expr),* $(,)? }) => {
        #[derive(Clone, Debug, PartialEq, Eq)]
        pub struct $name {
            $(pub $field: Utf8PathBuf,)*
        }

        impl $name {
            pub fn to_absolute(mut self, base: &Utf8Path) -> Self {
                $(self.$field = base.join(self.$field);)*
                self
            }

            pub fn new(base: &Utf8Path) -> Self {
                Self::default().to_absolute(base)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $($field: $default.into(),)*
                }
            }
        }
    };
}

// Layout of a WWMI folder as the mod loader expects it.
define_paths!(StoreRules {
    saved: "SavedMods",
    active: "Mods",
    deleted: "DeletedMods",
    resources: "ModResources",
    manifest: "modlist.json",
    allow_list: "allowed_mods.json",
});

impl StoreRules {
    /// Store directories created during setup.
    pub fn directories(&self) -> [&Utf8PathBuf; 4] {
        [&self.saved, &self.active, &self.deleted, &self.resources]
    }

    /// Resolves a recorded mod path; relative paths are taken from the inactive store.
    pub fn resolve(&self, path: &Utf8Path) -> Utf8PathBuf {
        if path.is_absolute() {
            path.to_owned()
        } else {
            self.saved.join(path)
        }
    }

    /// Folder under the active store that holds the copy of entry `name`.
    pub fn active_slot(&self, name: &str) -> Utf8PathBuf {
        self.active.join(name)
    }

    /// True for files that legitimately live next to the mod folders.
    pub fn is_bookkeeping_file(&self, path: &Utf8Path) -> bool {
        path.file_name()
            .is_some_and(|n| Some(n) == self.manifest.file_name() || Some(n) == self.allow_list.file_name())
    }
}
