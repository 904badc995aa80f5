//! Component lifecycle state machine.

use std::fmt;

use tokio::sync::watch;
use tracing::debug;

use crate::errors::IngestError;

/// Where a component is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Constructed, not started.
    Idle,
    /// Doing its normal work.
    Running,
    /// No longer accepting new work, finishing what it holds.
    Draining,
    /// Finished. Terminal.
    Stopped,
}

impl LifecycleState {
    /// Whether `self -> next` is an allowed transition.
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Idle, Running) | (Idle, Stopped) | (Running, Draining) | (Running, Stopped) | (Draining, Stopped)
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Observable state of one component.
#[derive(Debug)]
pub struct Lifecycle {
    component: &'static str,
    state: watch::Sender<LifecycleState>,
}

impl Lifecycle {
    /// Create a lifecycle in the `Idle` state.
    pub fn new(component: &'static str) -> Self {
        let (state, _) = watch::channel(LifecycleState::Idle);
        Self { component, state }
    }

    /// Current state.
    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Watch state changes, e.g. to wait for the component to stop.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    pub fn start(&self) -> Result<(), IngestError> {
        self.transition(LifecycleState::Running)
    }

    pub fn begin_drain(&self) -> Result<(), IngestError> {
        self.transition(LifecycleState::Draining)
    }

    pub fn stop(&self) -> Result<(), IngestError> {
        self.transition(LifecycleState::Stopped)
    }

    fn transition(&self, next: LifecycleState) -> Result<(), IngestError> {
        let mut result = Ok(());
        self.state.send_if_modified(|current| {
            if current.can_transition_to(next) {
                debug!(component = self.component, from = %current, to = %next, "Lifecycle transition");
                *current = next;
                true
            } else {
                result = Err(IngestError::InvalidTransition {
                    component: self.component,
                    from: *current,
                    to: next,
                });
                false
            }
        });
        result
    }
}
