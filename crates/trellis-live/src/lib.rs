//! Trellis Live Library
//!
//! Keeps derived views of the notebook graph in step with a changing board.
//! A [`GraphObserver`] re-derives the graph on a polling cadence while anyone
//! is subscribed; the views in [`views`] mount onto it.

use std::sync::{Mutex, MutexGuard, PoisonError};

use env_logger::Env;
use log::SetLoggerError;
use trellis_core::config::LoggingConfig;

pub mod observer;
pub mod views;

pub use observer::{GraphObserver, Subscription};
pub use views::{BacklinkPanel, GraphView, OverlayView};

/// Install `env_logger`, using `config.level` when `RUST_LOG` is unset.
pub fn init_logging(config: &LoggingConfig) -> Result<(), SetLoggerError> {
    env_logger::Builder::from_env(Env::default().default_filter_or(config.level.as_str()))
        .try_init()
}

// State behind these mutexes is replaced wholesale, never left half-written.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
