use std::io;
use std::process::{Command, ExitStatus};

use aurdesk_core::{ActionLedger, ActionType, OperationKind, Settings};
use aurdesk_registry::{AurClient, RegistryError, SearchBy};
use aurdesk_resolver::{has_unresolved, DepCache};
use aurdesk_store::{LocalStore, StoreError};
use thiserror::Error;

use crate::handoff::{execute_handoff_with_runner, HandoffError};
use crate::search::{SearchRunner, SearchTicket};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// One subsystem instance: the exclusive store handle, the action ledger,
/// the dependency cache and the registry client, owned together so none of
/// them leaks into global state. The presentation layer drives it through
/// `toggle`, `dispatch_search` and `execute`.
#[derive(Debug)]
pub struct Session {
    settings: Settings,
    store: LocalStore,
    ledger: ActionLedger,
    dep_cache: DepCache,
    search: SearchRunner,
}

impl Session {
    /// Fails with the store's `InitFailure` when the database cannot be
    /// opened; there is no degraded mode to fall back to.
    pub fn new(settings: Settings) -> Result<Self, SessionError> {
        let store = LocalStore::open(&settings.root, &settings.db_path)?;
        let client = AurClient::new(&settings.aur_url)?;
        Ok(Self {
            settings,
            store,
            ledger: ActionLedger::new(),
            dep_cache: DepCache::new(),
            search: SearchRunner::new(client),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn ledger(&self) -> &ActionLedger {
        &self.ledger
    }

    pub fn toggle(&mut self, action: ActionType, name: &str) -> bool {
        let staged = self.ledger.toggle(action, name);
        tracing::debug!(
            action = action.as_str(),
            package = name,
            staged,
            "toggled ledger entry"
        );
        staged
    }

    pub fn queued(&self, action: ActionType) -> &[String] {
        self.ledger.queued(action)
    }

    /// Starts a registry search on the worker thread; `None` when one is
    /// already in flight.
    pub fn dispatch_search(&self, query: impl Into<String>, by: SearchBy) -> Option<SearchTicket> {
        self.search.dispatch(query, by)
    }

    pub fn search_running(&self) -> bool {
        self.search.is_running()
    }

    /// Advisory dependency check for one registry package; memoized across
    /// the session's lifetime.
    pub fn has_unresolved_deps(&self, package: &str) -> Result<bool, RegistryError> {
        has_unresolved(package, self.search.client(), &self.store, &self.dep_cache)
    }

    /// Runs the privileged handoff for `kind`. Blocking; callers needing a
    /// responsive surface run this on a worker and marshal the result back.
    pub fn execute(&mut self, kind: OperationKind) -> Result<(), HandoffError> {
        self.execute_with_runner(kind, |command: &mut Command| command.status())
    }

    /// Same flow with the escalation subprocess behind an injectable
    /// runner. The store handle is reinitialized no matter how the helper
    /// exited; a reinitialization failure outranks the helper's status
    /// because the session is unusable without a store.
    pub fn execute_with_runner<R>(&mut self, kind: OperationKind, run: R) -> Result<(), HandoffError>
    where
        R: FnMut(&mut Command) -> io::Result<ExitStatus>,
    {
        let outcome = execute_handoff_with_runner(&mut self.ledger, kind, &self.settings, run);

        match LocalStore::open(&self.settings.root, &self.settings.db_path) {
            Ok(store) => {
                self.store = store;
                outcome
            }
            Err(err) => Err(HandoffError::Store(err)),
        }
    }
}
