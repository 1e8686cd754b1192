use crate::domain::ports::Storage;
use crate::utils::error::Result;
use std::collections::BTreeMap;

/// Flat `todoist_id -> notion_page_id` lookup persisted as one JSON document
/// per kind. It is only a cache: callers still verify that the page exists.
#[derive(Debug)]
pub struct IdMappingStore<S: Storage> {
    storage: S,
    kind: String,
    entries: BTreeMap<String, String>,
    dirty: bool,
}

impl<S: Storage> IdMappingStore<S> {
    pub async fn load(storage: S, kind: &str) -> Result<Self> {
        let path = Self::path_for(kind);
        let entries = match storage.read_file(&path).await? {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => BTreeMap::new(),
        };
        tracing::debug!("Loaded {} {} mappings from {}", entries.len(), kind, path);

        Ok(Self {
            storage,
            kind: kind.to_string(),
            entries,
            dirty: false,
        })
    }

    fn path_for(kind: &str) -> String {
        format!("mappings/{}.json", kind)
    }

    pub fn get(&self, todoist_id: &str) -> Option<&str> {
        self.entries.get(todoist_id).map(String::as_str)
    }

    pub fn insert(&mut self, todoist_id: &str, page_id: &str) {
        if self.get(todoist_id) != Some(page_id) {
            self.entries
                .insert(todoist_id.to_string(), page_id.to_string());
            self.dirty = true;
        }
    }

    pub fn remove(&mut self, todoist_id: &str) -> Option<String> {
        let removed = self.entries.remove(todoist_id);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the mapping back if anything changed.
    pub async fn save(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let data = serde_json::to_vec_pretty(&self.entries)?;
        self.storage
            .write_file(&Self::path_for(&self.kind), &data)
            .await?;
        self.dirty = false;
        tracing::debug!("Saved {} {} mappings", self.entries.len(), self.kind);
        Ok(())
    }
}
