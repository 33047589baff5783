use std::fs;
use std::io;
use std::path::PathBuf;

use aurdesk_core::bare_dependency_name;

use crate::desc::LocalPackage;
use crate::error::{RemovalBreakage, StoreError};
use crate::LocalStore;

pub const DB_LOCK_FILE: &str = "db.lck";

#[derive(Debug)]
struct DbLock {
    path: PathBuf,
    released: bool,
}

impl DbLock {
    fn acquire(store: &LocalStore) -> Result<Self, StoreError> {
        let path = store.db_path().join(DB_LOCK_FILE);
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(_) => Ok(Self {
                path,
                released: false,
            }),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                Err(StoreError::DatabaseLocked { path })
            }
            Err(err) => Err(StoreError::Io { path, source: err }),
        }
    }

    fn release(mut self) -> Result<(), StoreError> {
        self.released = true;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StoreError::Io {
                path: self.path.clone(),
                source: err,
            }),
        }
    }
}

impl Drop for DbLock {
    fn drop(&mut self) {
        if !self.released {
            let _ = fs::remove_file(&self.path);
        }
    }
}

/// One removal transaction over the local database.
///
/// Lifecycle: `begin` (takes the database lock) → `add_target` per name →
/// `prepare` (reverse-dependency check) → `commit` or `release`. The lock
/// never survives the transaction: commit and release delete it, and
/// dropping an unfinished transaction deletes it best-effort.
#[derive(Debug)]
pub struct RemoveTransaction<'a> {
    store: &'a LocalStore,
    lock: DbLock,
    targets: Vec<LocalPackage>,
}

impl<'a> RemoveTransaction<'a> {
    pub fn begin(store: &'a LocalStore) -> Result<Self, StoreError> {
        let lock = DbLock::acquire(store)?;
        Ok(Self {
            store,
            lock,
            targets: Vec::new(),
        })
    }

    /// Resolves `name` against the local database. An unknown name fails
    /// the whole transaction before anything is committed.
    pub fn add_target(&mut self, name: &str) -> Result<(), StoreError> {
        let Some(package) = self.store.find_installed(name) else {
            return Err(StoreError::TargetNotFound {
                name: name.to_string(),
            });
        };
        if !self.targets.iter().any(|queued| queued.name == package.name) {
            self.targets.push(package.clone());
        }
        Ok(())
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.targets.iter().map(|package| package.name.as_str())
    }

    /// Reverse-dependency check: every remaining installed package must
    /// still have each of its dependencies satisfied by name or provides
    /// once the targets are gone.
    pub fn prepare(&self) -> Result<(), StoreError> {
        let mut breakages = Vec::new();

        let remaining: Vec<&LocalPackage> = self
            .store
            .list_installed()
            .filter(|package| !self.is_target(&package.name))
            .collect();

        for package in &remaining {
            for dependency in &package.depends {
                let bare = bare_dependency_name(dependency);
                let Some(target) = self.target_satisfying(bare) else {
                    continue;
                };
                let still_satisfied = remaining
                    .iter()
                    .any(|candidate| satisfies(candidate, bare));
                if !still_satisfied {
                    breakages.push(RemovalBreakage {
                        dependency: dependency.clone(),
                        required_by: package.name.clone(),
                        target: target.name.clone(),
                    });
                }
            }
        }

        if breakages.is_empty() {
            Ok(())
        } else {
            Err(StoreError::WouldBreakDependents { breakages })
        }
    }

    /// Deletes each target's database entry, then releases the lock. The
    /// per-entry deletes are only as atomic as the filesystem makes them.
    pub fn commit(self) -> Result<(), StoreError> {
        for target in &self.targets {
            let dir = self.store.local_entry_dir(target);
            fs::remove_dir_all(&dir).map_err(|err| StoreError::Io {
                path: dir.clone(),
                source: err,
            })?;
            tracing::info!(package = %target.name, version = %target.version, "removed database entry");
        }
        self.lock.release()
    }

    /// Abandons the transaction without committing anything.
    pub fn release(self) -> Result<(), StoreError> {
        self.lock.release()
    }

    fn is_target(&self, name: &str) -> bool {
        self.targets.iter().any(|target| target.name == name)
    }

    fn target_satisfying(&self, bare: &str) -> Option<&LocalPackage> {
        self.targets.iter().find(|target| satisfies(target, bare))
    }
}

fn satisfies(package: &LocalPackage, bare: &str) -> bool {
    package.name == bare
        || package
            .provides
            .iter()
            .any(|provided| bare_dependency_name(provided) == bare)
}
