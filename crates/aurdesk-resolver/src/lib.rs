use std::collections::HashMap;
use std::sync::Mutex;

use aurdesk_core::{bare_dependency_name, PackageRecord};
use aurdesk_registry::{AurClient, RegistryError};
use aurdesk_store::LocalStore;

/// Process-lifetime memoization of "is this bare dependency name
/// satisfiable from the store". Entries are written once and never
/// invalidated; the owning session discards the whole cache with itself.
#[derive(Debug, Default)]
pub struct DepCache {
    resolvable: Mutex<HashMap<String, bool>>,
}

impl DepCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<bool> {
        self.entries().get(name).copied()
    }

    pub(crate) fn record(&self, name: &str, resolvable: bool) {
        self.entries()
            .entry(name.to_string())
            .or_insert(resolvable);
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, bool>> {
        self.resolvable
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Best-effort check whether `package` declares any dependency the store
/// cannot satisfy. Fetches the package's registry record and stops at the
/// first unresolved dependency; transitive dependencies, version
/// constraints and cycles are out of its job description.
pub fn has_unresolved(
    package: &str,
    client: &AurClient,
    store: &LocalStore,
    cache: &DepCache,
) -> Result<bool, RegistryError> {
    let records = client.info(&[package])?;
    let Some(record) = records.iter().find(|record| record.is_valid()) else {
        return Ok(false);
    };

    match first_unresolved(record, store, cache) {
        Some(dependency) => {
            tracing::debug!(package, dependency, "dependency is not satisfiable");
            Ok(true)
        }
        None => Ok(false),
    }
}

pub(crate) fn first_unresolved<'a>(
    record: &'a PackageRecord,
    store: &LocalStore,
    cache: &DepCache,
) -> Option<&'a str> {
    for dependency in record.depends.iter().chain(record.make_depends.iter()) {
        let bare = bare_dependency_name(dependency);
        let resolvable = match cache.lookup(bare) {
            Some(cached) => cached,
            None => {
                let found = store.find(bare).is_some();
                cache.record(bare, found);
                found
            }
        };
        if !resolvable {
            return Some(dependency.as_str());
        }
    }
    None
}

#[cfg(test)]
mod tests;
