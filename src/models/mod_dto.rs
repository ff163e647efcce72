use camino::{Utf8Path, Utf8PathBuf};
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// A single installable unit backed by one or more payload folders.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ModEntry {
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(rename = "path", default)]
    pub paths: Vec<Utf8PathBuf>,
    #[serde(rename = "date", default)]
    pub last_modified: i64,
    #[serde(rename = "gb_id", default, deserialize_with = "lenient_id")]
    pub external_id: Option<String>,
}

impl ModEntry {
    pub fn new(name: impl Into<String>, paths: Vec<Utf8PathBuf>, last_modified: i64) -> Self {
        Self {
            name: name.into(),
            enabled: false,
            paths,
            last_modified,
            external_id: None,
        }
    }

    pub fn is_multi_path(&self) -> bool {
        self.paths.len() > 1
    }

    pub fn owns(&self, path: &Utf8Path) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    /// Appends `path` unless it is already recorded. Returns whether it was added.
    pub fn add_path(&mut self, path: Utf8PathBuf) -> bool {
        if self.owns(&path) {
            return false;
        }
        self.paths.push(path);
        true
    }
}

/// A named set of mods toggled as one unit.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct GroupEntry {
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, serialize_with = "tagged_members")]
    pub members: Vec<ModEntry>,
}

/// One element of the manifest array, discriminated by its `type` field.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ManifestItem {
    Mod(ModEntry),
    Group(GroupEntry),
}

impl ManifestItem {
    pub fn name(&self) -> &str {
        match self {
            ManifestItem::Mod(m) => &m.name,
            ManifestItem::Group(g) => &g.name,
        }
    }

    pub fn set_name(&mut self, name: String) {
        match self {
            ManifestItem::Mod(m) => m.name = name,
            ManifestItem::Group(g) => g.name = name,
        }
    }

    pub fn enabled(&self) -> bool {
        match self {
            ManifestItem::Mod(m) => m.enabled,
            ManifestItem::Group(g) => g.enabled,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, ManifestItem::Group(_))
    }

    /// Every mod carried by this item: itself, or the members of a group.
    pub fn mods(&self) -> &[ModEntry] {
        match self {
            ManifestItem::Mod(m) => std::slice::from_ref(m),
            ManifestItem::Group(g) => &g.members,
        }
    }

    pub fn mods_mut(&mut self) -> &mut [ModEntry] {
        match self {
            ManifestItem::Mod(m) => std::slice::from_mut(m),
            ManifestItem::Group(g) => &mut g.members,
        }
    }
}

// Entries written before groups existed carry no `type`; they are mods.
impl<'de> Deserialize<'de> for ManifestItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let kind = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("mod")
            .to_owned();

        match kind.as_str() {
            "mod" => ModEntry::deserialize(value)
                .map(ManifestItem::Mod)
                .map_err(de::Error::custom),
            "group" => GroupEntry::deserialize(value)
                .map(ManifestItem::Group)
                .map_err(de::Error::custom),
            other => Err(de::Error::unknown_variant(other, &["mod", "group"])),
        }
    }
}

fn tagged_members<S: Serializer>(members: &[ModEntry], serializer: S) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    #[serde(tag = "type", rename_all = "lowercase")]
    enum Member<'a> {
        Mod(&'a ModEntry),
    }

    serializer.collect_seq(members.iter().map(Member::Mod))
}

// Catalog ids were once written as numbers.
fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    }))
}
