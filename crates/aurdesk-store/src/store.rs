use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use aurdesk_core::bare_dependency_name;

use crate::desc::{parse_desc, LocalPackage};
use crate::StoreError;

/// Whether a package can be fetched prebuilt from a synced mirror
/// database, or exists only locally and must come from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locality {
    Native,
    Foreign,
}

/// Read handle over the on-disk package database. The enumeration is taken
/// once at `open`; after any mutating transaction the handle is stale and
/// the owner must open a fresh one before querying again.
#[derive(Debug)]
pub struct LocalStore {
    root: PathBuf,
    db_path: PathBuf,
    installed: BTreeMap<String, LocalPackage>,
    sync: Vec<SyncRepo>,
}

#[derive(Debug)]
struct SyncRepo {
    name: String,
    packages: BTreeMap<String, LocalPackage>,
}

impl LocalStore {
    pub fn open(
        root: impl Into<PathBuf>,
        db_path: impl Into<PathBuf>,
    ) -> Result<Self, StoreError> {
        let root = root.into();
        let db_path = db_path.into();

        if !root.is_dir() {
            return Err(StoreError::InitFailure {
                reason: format!("root path does not exist: {}", root.display()),
            });
        }
        if !db_path.is_dir() {
            return Err(StoreError::InitFailure {
                reason: format!("database path does not exist: {}", db_path.display()),
            });
        }

        let installed = read_database_dir(&db_path.join("local"))?;

        let mut sync = Vec::new();
        let sync_root = db_path.join("sync");
        if sync_root.is_dir() {
            for entry in fs::read_dir(&sync_root).map_err(|err| StoreError::Io {
                path: sync_root.clone(),
                source: err,
            })? {
                let entry = entry.map_err(|err| StoreError::Io {
                    path: sync_root.clone(),
                    source: err,
                })?;
                if !entry.path().is_dir() {
                    continue;
                }
                let repo_name = entry.file_name().to_string_lossy().to_string();
                let packages = read_database_dir(&entry.path())?;
                sync.push(SyncRepo {
                    name: repo_name,
                    packages,
                });
            }
            sync.sort_by(|a, b| a.name.cmp(&b.name));
        }

        tracing::debug!(
            installed = installed.len(),
            sync_repos = sync.len(),
            "opened package store at {}",
            db_path.display()
        );

        Ok(Self {
            root,
            db_path,
            installed,
            sync,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Looks a name up across the local database first, then the sync
    /// databases (by name, then by provides).
    pub fn find(&self, name: &str) -> Option<&LocalPackage> {
        if let Some(package) = self.installed.get(name) {
            return Some(package);
        }

        for repo in &self.sync {
            if let Some(package) = repo.packages.get(name) {
                return Some(package);
            }
        }
        for repo in &self.sync {
            if let Some(package) = repo
                .packages
                .values()
                .find(|candidate| provides_name(candidate, name))
            {
                return Some(package);
            }
        }
        None
    }

    pub fn find_installed(&self, name: &str) -> Option<&LocalPackage> {
        self.installed.get(name)
    }

    pub fn list_installed(&self) -> impl Iterator<Item = &LocalPackage> {
        self.installed.values()
    }

    /// Native when any synced mirror can satisfy the name; everything else
    /// is registry-sourced and therefore foreign.
    pub fn classify_locality(&self, name: &str) -> Locality {
        let native = self.sync.iter().any(|repo| {
            repo.packages.contains_key(name)
                || repo
                    .packages
                    .values()
                    .any(|candidate| provides_name(candidate, name))
        });
        if native {
            Locality::Native
        } else {
            Locality::Foreign
        }
    }

    pub(crate) fn local_entry_dir(&self, package: &LocalPackage) -> PathBuf {
        self.db_path
            .join("local")
            .join(format!("{}-{}", package.name, package.version))
    }
}

fn provides_name(package: &LocalPackage, name: &str) -> bool {
    package
        .provides
        .iter()
        .any(|provided| bare_dependency_name(provided) == name)
}

fn read_database_dir(dir: &Path) -> Result<BTreeMap<String, LocalPackage>, StoreError> {
    let mut packages = BTreeMap::new();
    if !dir.is_dir() {
        return Ok(packages);
    }

    for entry in fs::read_dir(dir).map_err(|err| StoreError::Io {
        path: dir.to_path_buf(),
        source: err,
    })? {
        let entry = entry.map_err(|err| StoreError::Io {
            path: dir.to_path_buf(),
            source: err,
        })?;
        if !entry.path().is_dir() {
            continue;
        }

        let desc_path = entry.path().join("desc");
        let raw = fs::read_to_string(&desc_path).map_err(|err| StoreError::Io {
            path: desc_path.clone(),
            source: err,
        })?;
        let package = parse_desc(&raw).map_err(|reason| StoreError::MalformedEntry {
            path: desc_path,
            reason,
        })?;
        packages.insert(package.name.clone(), package);
    }

    Ok(packages)
}
