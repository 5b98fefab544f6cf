//! Synchronization between the local board and the tracker backend.

pub mod controller;
pub mod transport;

pub use controller::{
    FailurePolicy, GestureOutcome, GesturePhase, InFlightPolicy, PendingMutation, SyncController,
    SyncError, SyncPolicy,
};
pub use transport::{
    ItemQuery, ItemSource, StaticToken, StatusTransport, StatusUpdate, TokenSource, TransportError,
};
