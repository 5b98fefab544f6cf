//! docket-core library.
//!
//! Work item model, the three-column board store, and the controller that
//! applies drag gestures optimistically and reconciles them with the
//! tracker backend.

pub mod api;
pub mod board;
pub mod config;
pub mod error;
pub mod model;
pub mod sync;

/// # Conventions
///
/// - **Errors**: one `thiserror` enum per concern, each exposing `code()`
///   for a stable [`error::ErrorCode`].
/// - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).
pub fn init() {
    tracing::debug!("docket-core initialized");
}
