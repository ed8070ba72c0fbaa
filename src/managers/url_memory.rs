//! Per-URL memory of user settings.
//!
//! Entries are keyed by a normalized URL (authority + path) and persisted as
//! an ordered list of `[url, settings]` pairs under the `urlMemory` key.

use std::collections::BTreeMap;

use url::Url;

use crate::database::storage::{Storage, URL_MEMORY_KEY};
use crate::types::errors::StorageError;
use crate::types::memory::UserSettings;

/// Trait defining URL memory operations.
pub trait UrlMemoryTrait {
    fn load(&mut self) -> Result<usize, StorageError>;
    fn persist(&self) -> Result<(), StorageError>;
    fn recall(&self, normalized_url: &str) -> Option<&UserSettings>;
    fn store(&mut self, normalized_url: String, settings: UserSettings);
    fn forget(&mut self, normalized_url: &str) -> bool;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool;
}

/// URL memory backed by the key/value store.
pub struct UrlMemory {
    storage: Storage,
    entries: BTreeMap<String, UserSettings>,
}

impl UrlMemory {
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            entries: BTreeMap::new(),
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &UserSettings)> {
        self.entries.iter()
    }
}

impl UrlMemoryTrait for UrlMemory {
    /// Replaces the in-memory map with the persisted list. Returns the entry count.
    fn load(&mut self) -> Result<usize, StorageError> {
        let pairs: Vec<(String, UserSettings)> =
            self.storage.get_json(URL_MEMORY_KEY)?.unwrap_or_default();
        self.entries = pairs.into_iter().collect();
        Ok(self.entries.len())
    }

    fn persist(&self) -> Result<(), StorageError> {
        let pairs: Vec<(&String, &UserSettings)> = self.entries.iter().collect();
        self.storage.set_json(URL_MEMORY_KEY, &pairs)
    }

    fn recall(&self, normalized_url: &str) -> Option<&UserSettings> {
        self.entries.get(normalized_url)
    }

    fn store(&mut self, normalized_url: String, settings: UserSettings) {
        self.entries.insert(normalized_url, settings);
    }

    fn forget(&mut self, normalized_url: &str) -> bool {
        self.entries.remove(normalized_url).is_some()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reduces a URL to its authority and path, dropping scheme, query and fragment.
///
/// `https://user@example.com:8080/a/b?q=1#top` becomes `user@example.com:8080/a/b`.
/// Returns `None` when the text is not a URL.
pub fn normalize_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;

    let mut authority = String::new();
    if !url.username().is_empty() {
        authority.push_str(url.username());
        if let Some(password) = url.password() {
            authority.push(':');
            authority.push_str(password);
        }
        authority.push('@');
    }
    if let Some(host) = url.host_str() {
        authority.push_str(host);
    }
    if let Some(port) = url.port() {
        authority.push(':');
        authority.push_str(&port.to_string());
    }

    Some(format!("{}{}", authority, url.path()))
}
