// src/app/session.rs
use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::catalog::{Catalog, CatalogView};
use super::data::FieldMap;
use super::fetcher::{dispatch, FetchJob, MetadataFetcher, Waker};
use super::lifecycle::{LifecycleCoordinator, Shell};
use super::types::{FetchId, FetchMsg, FetchOutcome, RecordHandle, Unavailable};

/// One delivered fetch result, after it has been applied (or not).
#[derive(Clone, Debug, PartialEq)]
pub struct FetchReport {
    pub handle: RecordHandle,
    pub outcome: FetchOutcome,
    pub applied: bool,
}

/// Everything the primary loop drives: the catalog, background metadata
/// lookups, and the shutdown bookkeeping. Fetch results only reach the
/// catalog through `poll_fetches` / `wait_for_fetches` on the owning thread.
pub struct LibrarySession<V: CatalogView> {
    catalog: Catalog<V>,
    fetcher: Option<Arc<MetadataFetcher>>,
    lifecycle: LifecycleCoordinator,
    fetch_tx: Sender<FetchMsg>,
    fetch_rx: Receiver<FetchMsg>,
    // fetches whose `Done` has not arrived yet
    pending: HashMap<FetchId, RecordHandle>,
    waker: Option<Waker>,
}

impl<V: CatalogView> LibrarySession<V> {
    pub fn new(catalog: Catalog<V>, fetcher: Option<Arc<MetadataFetcher>>) -> Self {
        let (fetch_tx, fetch_rx) = mpsc::channel();
        Self {
            catalog,
            fetcher,
            lifecycle: LifecycleCoordinator::new(),
            fetch_tx,
            fetch_rx,
            pending: HashMap::new(),
            waker: None,
        }
    }

    pub fn catalog(&self) -> &Catalog<V> {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut Catalog<V> {
        &mut self.catalog
    }

    pub fn lifecycle(&self) -> &LifecycleCoordinator {
        &self.lifecycle
    }

    pub fn set_waker(&mut self, waker: Waker) {
        self.waker = Some(waker);
    }

    /// Add a record and start its metadata lookup in the background.
    pub fn add(&mut self, data: &FieldMap) -> RecordHandle {
        let handle = self.catalog.add(data);
        let Some(fetcher) = &self.fetcher else {
            return handle;
        };
        let title = self
            .catalog
            .by_handle(handle)
            .map(|r| r.title.clone())
            .unwrap_or_default();

        let id = self.lifecycle.next_id();
        self.lifecycle.register(id);
        self.pending.insert(id, handle);
        dispatch(
            Arc::clone(fetcher),
            FetchJob { id, handle, title },
            self.fetch_tx.clone(),
            self.waker.clone(),
        );
        handle
    }

    /// Delete several rows at once. Indices are de-duplicated and removed
    /// highest first so earlier deletions do not shift later ones.
    pub fn delete_rows(&mut self, indices: &[usize]) -> usize {
        let mut sorted = indices.to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        sorted.dedup();
        let mut removed = 0;
        for index in sorted {
            if self.catalog.delete(index) {
                removed += 1;
            }
        }
        removed
    }

    /// Drain queued fetch messages without blocking.
    pub fn poll_fetches(&mut self, shell: &mut impl Shell) -> Vec<FetchReport> {
        let mut reports = Vec::new();
        loop {
            match self.fetch_rx.try_recv() {
                Ok(msg) => reports.extend(self.handle_msg(msg, shell)),
                Err(mpsc::TryRecvError::Empty) => break,
                // we hold a sender, so this cannot happen
                Err(mpsc::TryRecvError::Disconnected) => break,
            }
        }
        reports
    }

    /// Block until no fetch is in flight or `timeout` elapses.
    pub fn wait_for_fetches(&mut self, shell: &mut impl Shell, timeout: Duration) -> Vec<FetchReport> {
        let deadline = Instant::now() + timeout;
        let mut reports = Vec::new();
        while !self.lifecycle.is_idle() {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                warn!("{} fetches still in flight after {timeout:?}", self.lifecycle.in_flight());
                break;
            }
            match self.fetch_rx.recv_timeout(left) {
                Ok(msg) => reports.extend(self.handle_msg(msg, shell)),
                Err(_) => break,
            }
        }
        reports
    }

    /// A top-level window went away; quit if nothing else holds us open.
    pub fn window_closed(&mut self, shell: &mut impl Shell) -> bool {
        self.lifecycle.evaluate_shutdown(shell)
    }

    fn handle_msg(&mut self, msg: FetchMsg, shell: &mut impl Shell) -> Option<FetchReport> {
        match msg {
            FetchMsg::Done {
                id,
                handle,
                outcome,
            } => {
                self.pending.remove(&id);
                let applied = match outcome.patch() {
                    Some(patch) => self.catalog.apply_metadata_patch(handle, patch),
                    None => false,
                };
                debug!("fetch {id:?} delivered (applied: {applied})");
                Some(FetchReport {
                    handle,
                    outcome,
                    applied,
                })
            }
            FetchMsg::Finished { id } => {
                let lost = self.pending.remove(&id).map(|handle| {
                    warn!("fetch {id:?} ended without a result");
                    FetchReport {
                        handle,
                        outcome: FetchOutcome::Unavailable(Unavailable::WorkerLost),
                        applied: false,
                    }
                });
                self.lifecycle.complete(id, shell);
                lost
            }
        }
    }
}
