//! Names already present in destination directories.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::api::PanApi;
use crate::error::Result;

/// Child names of destination directories, listed once per directory.
///
/// The snapshot is taken on the first query and never refreshed, so items
/// transferred later in the same run are not seen.
#[derive(Debug, Default)]
pub struct DirCache {
    names: HashMap<String, HashSet<String>>,
}

impl DirCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `dir` holds an entry called `name`.
    ///
    /// `dir` must exist; creating it is up to the caller.
    pub async fn contains<A: PanApi>(&mut self, api: &A, dir: &str, name: &str) -> Result<bool> {
        if let Some(names) = self.names.get(dir) {
            return Ok(names.contains(name));
        }

        let names: HashSet<String> = api
            .list(dir)
            .await?
            .iter()
            .map(|file| file.name().to_string())
            .collect();
        debug!(dir, entries = names.len(), "listed destination directory");

        let found = names.contains(name);
        self.names.insert(dir.to_string(), names);
        Ok(found)
    }

    /// Number of directories listed so far.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
