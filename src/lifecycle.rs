//! Store lifecycle: Uninitialized → Loading → Ready.
//! Ready is terminal; persistence is only permitted once Ready.

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StorePhase {
    Uninitialized,
    Loading,
    Ready,
}

impl std::fmt::Display for StorePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorePhase::Uninitialized => write!(f, "Uninitialized"),
            StorePhase::Loading => write!(f, "Loading"),
            StorePhase::Ready => write!(f, "Ready"),
        }
    }
}

impl StorePhase {
    /// Returns whether transitioning from `self` to `next` is valid.
    pub fn can_transition_to(self, next: StorePhase) -> bool {
        matches!(
            (self, next),
            (StorePhase::Uninitialized, StorePhase::Loading) | (StorePhase::Loading, StorePhase::Ready)
        )
    }
}

/// Thread-safe phase holder with a watch channel for subscribers.
pub struct Lifecycle {
    phase: RwLock<StorePhase>,
    phase_tx: watch::Sender<StorePhase>,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (phase_tx, _) = watch::channel(StorePhase::Uninitialized);
        Self {
            phase: RwLock::new(StorePhase::Uninitialized),
            phase_tx,
        }
    }

    pub fn current(&self) -> StorePhase {
        *self.phase.read()
    }

    pub fn is_ready(&self) -> bool {
        self.current() == StorePhase::Ready
    }

    /// Attempt a phase transition. Returns Ok(new_phase) or Err with reason.
    pub fn transition(&self, next: StorePhase) -> Result<StorePhase, String> {
        let mut phase = self.phase.write();
        let current = *phase;
        if !current.can_transition_to(next) {
            let msg = format!("invalid transition: {} -> {}", current, next);
            warn!("{}", msg);
            return Err(msg);
        }
        *phase = next;
        self.phase_tx.send_replace(next);
        info!(from = %current, to = %next, "store_phase_transition");
        Ok(next)
    }

    pub fn subscribe(&self) -> watch::Receiver<StorePhase> {
        self.phase_tx.subscribe()
    }

    /// Resolve once the phase reaches Ready.
    pub async fn wait_ready(&self) {
        let mut rx = self.subscribe();
        // Sender lives as long as self, so this only errors if self is gone.
        let _ = rx.wait_for(|p| *p == StorePhase::Ready).await;
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_forward_transitions_are_valid() {
        let lifecycle = Lifecycle::new();
        assert!(lifecycle.transition(StorePhase::Ready).is_err());
        assert_eq!(lifecycle.transition(StorePhase::Loading), Ok(StorePhase::Loading));
        assert!(lifecycle.transition(StorePhase::Loading).is_err());
        assert_eq!(lifecycle.transition(StorePhase::Ready), Ok(StorePhase::Ready));
        assert!(lifecycle.transition(StorePhase::Uninitialized).is_err());
        assert!(lifecycle.is_ready());
    }

    #[tokio::test]
    async fn wait_ready_resolves_after_transition() {
        let lifecycle = std::sync::Arc::new(Lifecycle::new());
        let waiter = {
            let lifecycle = std::sync::Arc::clone(&lifecycle);
            tokio::spawn(async move { lifecycle.wait_ready().await })
        };
        lifecycle.transition(StorePhase::Loading).unwrap();
        lifecycle.transition(StorePhase::Ready).unwrap();
        waiter.await.unwrap();
    }
}
