use std::collections::HashSet;

use tracing::{debug, info};

use super::types::FetchId;

/// What the coordinator needs from the windowing layer.
pub trait Shell {
    fn any_window_visible(&self) -> bool;
    fn quit(&mut self);
}

/// Holds the process open while fetches are in flight, and lets it exit
/// once every window is gone and nothing is outstanding.
#[derive(Debug, Default)]
pub struct LifecycleCoordinator {
    in_flight: HashSet<FetchId>,
    next_id: u64,
    quit_issued: bool,
}

impl LifecycleCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> FetchId {
        self.next_id += 1;
        FetchId(self.next_id)
    }

    pub fn register(&mut self, id: FetchId) {
        self.in_flight.insert(id);
        debug!("fetch {id:?} registered ({} in flight)", self.in_flight.len());
    }

    /// Forget a finished fetch and re-check whether we may exit.
    pub fn complete(&mut self, id: FetchId, shell: &mut impl Shell) -> bool {
        if self.in_flight.remove(&id) {
            debug!("fetch {id:?} finished ({} in flight)", self.in_flight.len());
        }
        self.evaluate_shutdown(shell)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }

    pub fn quit_issued(&self) -> bool {
        self.quit_issued
    }

    /// Quit iff no window is visible and no fetch is in flight. Call after
    /// every window close and every fetch completion. Returns true when quit
    /// has been issued (now or earlier).
    pub fn evaluate_shutdown(&mut self, shell: &mut impl Shell) -> bool {
        if self.quit_issued {
            return true;
        }
        if shell.any_window_visible() || !self.in_flight.is_empty() {
            return false;
        }
        info!("All windows closed and no fetches in flight; quitting.");
        self.quit_issued = true;
        shell.quit();
        true
    }
}
