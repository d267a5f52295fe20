//! Load lifecycle of one home screen row.
//!
//! A [`CategoryRow`] owns at most one live fetch. Mounting (or switching to a
//! different descriptor) puts it in `Loading` and spawns exactly one fetch;
//! the fetch result is applied only if the row has not moved on or been torn
//! down in the meantime. The check and the write happen under the watch
//! channel's lock, and teardown flips the liveness flag under the same lock,
//! so a result is either applied before teardown or never.

use crate::catalog::{CategoryDescriptor, CategoryFetcher, ListItem};
use crate::util::{catch_task_panic, Liveness};
use std::sync::Arc;
use tokio::sync::watch;

/// Load state of a row. `Success` with an empty list is a valid outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowState {
    Loading,
    Success(Vec<ListItem>),
    Failure(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowPhase {
    Loading,
    Success,
    Failure,
}

impl RowState {
    pub fn phase(&self) -> RowPhase {
        match self {
            RowState::Loading => RowPhase::Loading,
            RowState::Success(_) => RowPhase::Success,
            RowState::Failure(_) => RowPhase::Failure,
        }
    }

    /// Items to render. Empty while loading and after a failure.
    pub fn items(&self) -> &[ListItem] {
        match self {
            RowState::Success(items) => items,
            _ => &[],
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            RowState::Failure(message) => Some(message),
            _ => None,
        }
    }
}

pub struct CategoryRow {
    descriptor: CategoryDescriptor,
    fetcher: CategoryFetcher,
    state: Arc<watch::Sender<RowState>>,
    /// Used by the UI to notice state changes between frames.
    observer: watch::Receiver<RowState>,
    liveness: Liveness,
    generation: u64,
}

impl CategoryRow {
    /// Mounts a row and starts its first fetch.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(fetcher: CategoryFetcher, descriptor: CategoryDescriptor) -> Self {
        let (state, observer) = watch::channel(RowState::Loading);
        let mut row = Self {
            descriptor,
            fetcher,
            state: Arc::new(state),
            observer,
            liveness: Liveness::new(),
            generation: 0,
        };
        row.start_cycle();
        row
    }

    pub fn descriptor(&self) -> &CategoryDescriptor {
        &self.descriptor
    }

    pub fn label(&self) -> &str {
        &self.descriptor.label
    }

    /// Current state. Hold the guard only briefly: the fetch task blocks on
    /// it when publishing a result.
    pub fn state(&self) -> watch::Ref<'_, RowState> {
        self.state.borrow()
    }

    /// A receiver that sees every state change of this row.
    pub fn subscribe(&self) -> watch::Receiver<RowState> {
        self.state.subscribe()
    }

    /// Number of fetch cycles started so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns true once per state change since the last call.
    pub fn take_changed(&mut self) -> bool {
        match self.observer.has_changed() {
            Ok(true) => {
                self.observer.borrow_and_update();
                true
            }
            _ => false,
        }
    }

    /// Rebinds the row to a new descriptor.
    ///
    /// An equal descriptor is a no-op. A different one cancels the in-flight
    /// fetch's right to publish, resets to `Loading` and starts exactly one
    /// new fetch. Returns whether a new cycle started.
    pub fn set_descriptor(&mut self, descriptor: CategoryDescriptor) -> bool {
        if descriptor == self.descriptor {
            return false;
        }
        tracing::debug!(
            from = %self.descriptor.label,
            to = %descriptor.label,
            "Row descriptor changed, superseding in-flight fetch"
        );
        self.cancel_in_flight();
        self.descriptor = descriptor;
        self.liveness = Liveness::new();
        self.start_cycle();
        true
    }

    /// Unmounts the row. Any fetch still in flight completes but its result
    /// is dropped.
    pub fn teardown(self) {}

    fn cancel_in_flight(&self) {
        self.state.send_if_modified(|_| {
            self.liveness.cancel();
            false
        });
    }

    fn start_cycle(&mut self) {
        self.generation += 1;
        self.state.send_replace(RowState::Loading);

        let generation = self.generation;
        let liveness = self.liveness.clone();
        let state = Arc::clone(&self.state);
        let fetcher = self.fetcher.clone();
        let descriptor = self.descriptor.clone();

        tracing::debug!(row = %descriptor.label, generation, "Starting row fetch");

        tokio::spawn(async move {
            let next = match catch_task_panic(fetcher.fetch(&descriptor)).await {
                Ok(Ok(items)) => RowState::Success(items),
                Ok(Err(e)) => {
                    tracing::warn!(row = %descriptor.label, error = %e, "Row fetch failed");
                    RowState::Failure(e.to_string())
                }
                Err(panic_msg) => {
                    tracing::error!(row = %descriptor.label, error = %panic_msg, "Row fetch panicked");
                    RowState::Failure(format!("Internal error: {}", panic_msg))
                }
            };

            let applied = state.send_if_modified(|current| {
                if !liveness.is_live() {
                    return false;
                }
                *current = next;
                true
            });

            if applied {
                tracing::debug!(row = %descriptor.label, generation, "Row state updated");
            } else {
                tracing::debug!(
                    row = %descriptor.label,
                    generation,
                    "Discarding fetch result for superseded or unmounted row"
                );
            }
        });
    }
}

impl Drop for CategoryRow {
    fn drop(&mut self) {
        self.cancel_in_flight();
    }
}

impl std::fmt::Debug for CategoryRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CategoryRow")
            .field("descriptor", &self.descriptor)
            .field("state", &*self.state.borrow())
            .field("generation", &self.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> ListItem {
        ListItem {
            id: id.into(),
            title: format!("Movie {}", id),
            image_path: None,
        }
    }

    #[test]
    fn test_phase_and_accessors() {
        assert_eq!(RowState::Loading.phase(), RowPhase::Loading);
        assert!(RowState::Loading.items().is_empty());
        assert!(RowState::Loading.error_message().is_none());

        let ok = RowState::Success(vec![item("1"), item("2")]);
        assert_eq!(ok.phase(), RowPhase::Success);
        assert_eq!(ok.items().len(), 2);

        let failed = RowState::Failure("Request failed: refused".into());
        assert_eq!(failed.phase(), RowPhase::Failure);
        assert!(failed.items().is_empty());
        assert_eq!(failed.error_message(), Some("Request failed: refused"));
    }

    #[test]
    fn test_empty_success_is_not_failure() {
        let empty = RowState::Success(Vec::new());
        assert_eq!(empty.phase(), RowPhase::Success);
        assert!(empty.error_message().is_none());
    }
}
