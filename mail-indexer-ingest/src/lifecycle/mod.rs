//! Lifecycle coordination shared by the ingest components.
//!
//! Each long-running component owns a [`Lifecycle`] and moves it through
//! `Idle -> Running -> (Draining ->) Stopped`. Shutdown is requested through a
//! [`ShutdownTrigger`] whose [`ShutdownSignal`]s the components poll or await.

mod shutdown;
mod state;

pub use shutdown::{shutdown_channel, ShutdownSignal, ShutdownTrigger};
pub use state::{Lifecycle, LifecycleState};
