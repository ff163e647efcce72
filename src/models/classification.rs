use camino::Utf8PathBuf;

/// Verdict of the folder classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderValidation {
    NotAMod,
    Single,
    Multi,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub status: FolderValidation,
    pub name: String,
    /// Folders treated as atomic mod payloads.
    pub units: Vec<Utf8PathBuf>,
}

impl Classification {
    pub fn not_a_mod() -> Self {
        Self {
            status: FolderValidation::NotAMod,
            name: String::new(),
            units: Vec::new(),
        }
    }

    pub fn single(unit: Utf8PathBuf) -> Self {
        Self {
            status: FolderValidation::Single,
            name: unit.file_name().unwrap_or_default().to_owned(),
            units: vec![unit],
        }
    }

    pub fn multi(name: impl Into<String>, units: Vec<Utf8PathBuf>) -> Self {
        Self {
            status: FolderValidation::Multi,
            name: name.into(),
            units,
        }
    }

    pub fn is_mod(&self) -> bool {
        self.status != FolderValidation::NotAMod
    }
}
