use crate::models::mod_dto::{ManifestItem, ModEntry};
use camino::Utf8Path;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

/// Ordered list of mods and groups, persisted as one JSON array.
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Manifest {
    items: Vec<ManifestItem>,
}

impl Manifest {
    pub fn new(items: Vec<ManifestItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[ManifestItem] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut Vec<ManifestItem> {
        &mut self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, item: ManifestItem) {
        self.items.push(item);
    }

    /// Top-level position of the entry called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.items.iter().position(|i| i.name() == name)
    }

    /// Whether `name` is taken by any entry, group or group member.
    pub fn contains_name(&self, name: &str) -> bool {
        self.items
            .iter()
            .any(|i| i.name() == name || i.mods().iter().any(|m| m.name == name))
    }

    /// `base` if it is free, otherwise the first free `base-N` with N >= 2.
    pub fn unique_name(&self, base: &str) -> String {
        if !self.contains_name(base) {
            return base.to_owned();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}-{}", base, n);
            if !self.contains_name(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Every mod, top-level ones and group members alike.
    pub fn mods(&self) -> impl Iterator<Item = &ModEntry> {
        self.items.iter().flat_map(|i| i.mods().iter())
    }

    pub fn mods_mut(&mut self) -> impl Iterator<Item = &mut ModEntry> {
        self.items.iter_mut().flat_map(|i| i.mods_mut().iter_mut())
    }

    pub fn find_mod(&self, name: &str) -> Option<&ModEntry> {
        self.mods().find(|m| m.name == name)
    }

    pub fn find_mod_mut(&mut self, name: &str) -> Option<&mut ModEntry> {
        self.mods_mut().find(|m| m.name == name)
    }

    /// The mod that already records `path`, if any.
    pub fn owner_of(&self, path: &Utf8Path) -> Option<&ModEntry> {
        self.mods().find(|m| m.owns(path))
    }

    /// Drops mods matching `drop` from the top level and from groups, returning their names.
    pub fn remove_mods_where<F>(&mut self, mut drop: F) -> Vec<String>
    where
        F: FnMut(&ModEntry) -> bool,
    {
        let mut removed = Vec::new();
        self.items.retain_mut(|item| match item {
            ManifestItem::Mod(m) => {
                if drop(m) {
                    removed.push(m.name.clone());
                    return false;
                }
                true
            }
            ManifestItem::Group(g) => {
                g.members.retain(|m| {
                    if drop(m) {
                        removed.push(m.name.clone());
                        return false;
                    }
                    true
                });
                true
            }
        });
        removed
    }
}

// Malformed elements are dropped one by one instead of failing the whole list.
impl<'de> Deserialize<'de> for Manifest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
        let items = raw
            .into_iter()
            .filter_map(|value| match ManifestItem::deserialize(value) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!("Skipping malformed manifest entry: {}", e);
                    None
                }
            })
            .collect();
        Ok(Self { items })
    }
}

/// Folder basenames the user approved as mod roots despite lacking `mod.ini`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct AllowList(BTreeSet<String>);

impl AllowList {
    pub fn contains(&self, folder_name: &str) -> bool {
        self.0.contains(folder_name)
    }

    pub fn insert(&mut self, folder_name: impl Into<String>) -> bool {
        self.0.insert(folder_name.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
