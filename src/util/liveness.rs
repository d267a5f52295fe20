use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag shared between a view and its background tasks.
///
/// The owner keeps one clone and hands another to the task. Once the owner
/// calls [`Liveness::cancel`], the task must not touch the owner's state any
/// more. Cancellation does not stop the task itself: an in-flight request
/// still completes, its result is just dropped.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_live(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Marks the owner as gone. Idempotent.
    pub fn cancel(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_live() {
        assert!(Liveness::new().is_live());
    }

    #[test]
    fn test_cancel_visible_through_clone() {
        let owner = Liveness::new();
        let task = owner.clone();
        owner.cancel();
        assert!(!task.is_live());
        owner.cancel();
        assert!(!owner.is_live());
    }
}
