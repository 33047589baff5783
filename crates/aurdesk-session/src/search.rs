use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use aurdesk_core::PackageRecord;
use aurdesk_registry::{AurClient, RegistryError, SearchBy};

type SearchOutcome = Result<Vec<PackageRecord>, RegistryError>;

/// Runs registry searches on a worker thread, one at a time. Dispatching
/// while a search is outstanding is ignored, not queued; completion comes
/// back over the ticket's single-shot channel instead of any shared state.
#[derive(Debug)]
pub struct SearchRunner {
    client: AurClient,
    running: Arc<AtomicBool>,
}

/// Receiving end of one dispatched search.
#[derive(Debug)]
pub struct SearchTicket {
    receiver: Receiver<SearchOutcome>,
}

impl SearchRunner {
    pub fn new(client: AurClient) -> Self {
        Self {
            client,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub(crate) fn client(&self) -> &AurClient {
        &self.client
    }

    /// Starts a search unless one is already in flight; returns `None`
    /// when the dispatch was ignored.
    pub fn dispatch(&self, query: impl Into<String>, by: SearchBy) -> Option<SearchTicket> {
        let client = self.client.clone();
        let query = query.into();
        self.dispatch_task(move || client.search(&query, by))
    }

    pub(crate) fn dispatch_task<F>(&self, task: F) -> Option<SearchTicket>
    where
        F: FnOnce() -> SearchOutcome + Send + 'static,
    {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("ignoring search dispatch while one is in flight");
            return None;
        }

        let (sender, receiver) = mpsc::channel();
        let running = Arc::clone(&self.running);
        thread::spawn(move || {
            let outcome = task();
            let _ = sender.send(outcome);
            running.store(false, Ordering::Release);
        });

        Some(SearchTicket { receiver })
    }
}

impl SearchTicket {
    /// Blocks until the worker delivers its result.
    pub fn wait(self) -> SearchOutcome {
        match self.receiver.recv() {
            Ok(outcome) => outcome,
            Err(_) => Err(RegistryError::Network(
                "search worker exited without a result".to_string(),
            )),
        }
    }

    /// Non-blocking poll; `None` while the search is still running.
    pub fn try_result(&self) -> Option<SearchOutcome> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(RegistryError::Network(
                "search worker exited without a result".to_string(),
            ))),
        }
    }
}
