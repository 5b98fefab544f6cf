//! Optimistic board synchronization.
//!
//! A gesture moves through these phases:
//!
//! ```text
//! Idle ──release──▶ Applying ──▶ Persisting ──2xx──▶ Settled (refresh requested)
//!   ▲                                  │
//!   └── no destination / same slot     └──error──▶ Failed (logged; policy decides revert)
//! ```
//!
//! [`SyncController::begin`] covers Idle → Applying and returns a
//! [`PendingMutation`]; the local board already shows the move when it
//! returns. [`SyncController::dispatch`] (or [`PendingMutation::complete`]
//! for callers that run the request themselves) covers Persisting → Settled
//! or Failed. [`SyncController::handle_drop`] runs both halves back to back.
//!
//! Everything runs on one thread. The board sits behind `Rc<RefCell<_>>`
//! and a pending mutation only holds a weak handle to it, so a response that
//! completes after the board is gone is dropped on the floor.

use serde::Deserialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, error, info, warn};

use super::transport::{StatusTransport, StatusUpdate, TokenSource, TransportError};
use crate::board::{BoardError, BoardPartition, DragGesture, GestureError, Slot, partition};
use crate::error::ErrorCode;
use crate::model::WorkItem;

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// What to do with the optimistic move when the remote write fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Leave the board as the user left it and wait for the next refresh.
    #[default]
    KeepOptimistic,
    /// Restore the last known-good board.
    Revert,
}

/// Whether a second gesture may start on an item whose first has not settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InFlightPolicy {
    /// Every gesture issues its own request.
    #[default]
    Concurrent,
    /// Refuse the gesture before touching the board.
    RejectWhileInFlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct SyncPolicy {
    pub on_failure: FailurePolicy,
    pub in_flight: InFlightPolicy,
}

// ---------------------------------------------------------------------------
// Errors and outcomes
// ---------------------------------------------------------------------------

/// Precondition failures. None of these touch the board.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error("not authenticated: no bearer token available")]
    NotAuthenticated,

    #[error(transparent)]
    Gesture(#[from] GestureError),

    #[error(transparent)]
    Board(#[from] BoardError),

    #[error("item {item_id} already has an update in flight")]
    InFlight { item_id: String },
}

impl SyncError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotAuthenticated => ErrorCode::NotAuthenticated,
            Self::Gesture(err) => err.code(),
            Self::Board(err) => err.code(),
            Self::InFlight { .. } => ErrorCode::ItemInFlight,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    Applying,
    Persisting,
    Settled,
    Failed,
}

impl fmt::Display for GesturePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Applying => "applying",
            Self::Persisting => "persisting",
            Self::Settled => "settled",
            Self::Failed => "failed",
        })
    }
}

/// How a gesture ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureOutcome {
    /// The release was a no-op; nothing changed and nothing was sent.
    Idle,
    /// The backend accepted the update and a refresh was requested.
    Settled { update: StatusUpdate },
    /// The backend write failed. `reverted` is true if the board was
    /// restored to its last known-good state.
    Failed {
        update: StatusUpdate,
        error: TransportError,
        reverted: bool,
    },
    /// The response arrived after the board was dropped and was ignored.
    Detached { update: StatusUpdate },
}

impl GestureOutcome {
    /// Final phase reached. A detached gesture never left `Persisting` as
    /// far as any board is concerned.
    #[must_use]
    pub const fn phase(&self) -> GesturePhase {
        match self {
            Self::Idle => GesturePhase::Idle,
            Self::Settled { .. } => GesturePhase::Settled,
            Self::Failed { .. } => GesturePhase::Failed,
            Self::Detached { .. } => GesturePhase::Persisting,
        }
    }
}

// ---------------------------------------------------------------------------
// Shared board state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct BoardState {
    board: BoardPartition,
    /// Last loaded snapshot plus every move the backend has since accepted.
    known_good: BoardPartition,
    /// Bumped on every snapshot load.
    generation: u64,
    /// Unsettled mutation count per item id.
    in_flight: HashMap<String, usize>,
}

impl BoardState {
    /// Record an accepted move in `known_good`. The destination index is
    /// clamped, since `known_good` lacks any moves still unconfirmed.
    fn confirm(&mut self, item_id: &str, destination: Slot) {
        let Some(from) = self.known_good.find(item_id) else {
            return;
        };
        let len = self.known_good.column(destination.status).len();
        let max = if from.status == destination.status {
            len - 1
        } else {
            len
        };
        let to = Slot::new(destination.status, destination.index.min(max));
        if let Err(err) = self.known_good.apply_move(from, to) {
            debug!(item_id, error = %err, "could not record confirmed move");
        }
    }

    fn settle_one(&mut self, item_id: &str) {
        if let Some(count) = self.in_flight.get_mut(item_id) {
            *count -= 1;
            if *count == 0 {
                self.in_flight.remove(item_id);
            }
        }
    }
}

struct Shared {
    state: RefCell<BoardState>,
    policy: SyncPolicy,
    on_refresh: RefCell<Option<Rc<dyn Fn()>>>,
}

impl Shared {
    fn request_refresh(&self) {
        let callback = self.on_refresh.borrow().clone();
        if let Some(callback) = callback {
            callback();
        }
    }
}

// ---------------------------------------------------------------------------
// Pending mutation
// ---------------------------------------------------------------------------

/// A move that has been applied locally and still needs to be persisted.
pub struct PendingMutation {
    update: StatusUpdate,
    destination: Slot,
    token: String,
    generation: u64,
    shared: Weak<Shared>,
}

impl fmt::Debug for PendingMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingMutation")
            .field("update", &self.update)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl PendingMutation {
    /// The request this mutation will send. The status is captured when the
    /// gesture is applied, not when the request goes out.
    #[must_use]
    pub const fn update(&self) -> &StatusUpdate {
        &self.update
    }

    /// Bearer token captured when the gesture began.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Reconcile the board with the result of the remote write.
    pub fn complete(self, result: Result<(), TransportError>) -> GestureOutcome {
        let Some(shared) = self.shared.upgrade() else {
            debug!(
                item_id = %self.update.item_id,
                "board dropped before response arrived; ignoring"
            );
            return GestureOutcome::Detached {
                update: self.update,
            };
        };

        match result {
            Ok(()) => {
                {
                    let mut state = shared.state.borrow_mut();
                    state.settle_one(&self.update.item_id);
                    if state.generation == self.generation {
                        state.confirm(&self.update.item_id, self.destination);
                    }
                }
                info!(
                    item_id = %self.update.item_id,
                    status = %self.update.status,
                    phase = %GesturePhase::Settled,
                    "status change persisted"
                );
                shared.request_refresh();
                GestureOutcome::Settled {
                    update: self.update,
                }
            }
            Err(err) => {
                let mut state = shared.state.borrow_mut();
                state.settle_one(&self.update.item_id);
                let reverted = shared.policy.on_failure == FailurePolicy::Revert
                    && state.generation == self.generation;
                if reverted {
                    state.board = state.known_good.clone();
                }
                error!(
                    item_id = %self.update.item_id,
                    status = %self.update.status,
                    phase = %GesturePhase::Failed,
                    code = %err.code(),
                    reverted,
                    error = %err,
                    "failed to persist status change"
                );
                GestureOutcome::Failed {
                    update: self.update,
                    error: err,
                    reverted,
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Drives drag gestures against one board.
pub struct SyncController<T, A> {
    shared: Rc<Shared>,
    transport: T,
    tokens: A,
}

impl<T, A> SyncController<T, A>
where
    T: StatusTransport,
    A: TokenSource,
{
    #[must_use]
    pub fn new(transport: T, tokens: A, policy: SyncPolicy) -> Self {
        Self {
            shared: Rc::new(Shared {
                state: RefCell::new(BoardState::default()),
                policy,
                on_refresh: RefCell::new(None),
            }),
            transport,
            tokens,
        }
    }

    #[must_use]
    pub fn policy(&self) -> SyncPolicy {
        self.shared.policy
    }

    /// Register the callback invoked after each successful persist. The
    /// owner is expected to re-fetch and call [`SyncController::load`].
    pub fn on_refresh(&self, callback: impl Fn() + 'static) {
        *self.shared.on_refresh.borrow_mut() = Some(Rc::new(callback));
    }

    /// Replace the board wholesale with a fresh snapshot.
    ///
    /// Requests already in flight keep running, but a failure among them no
    /// longer reverts anything: the snapshot is newer than what they would
    /// restore.
    pub fn load<I>(&self, items: I)
    where
        I: IntoIterator<Item = WorkItem>,
    {
        let mut state = self.shared.state.borrow_mut();
        state.board = partition(items);
        state.known_good = state.board.clone();
        state.generation += 1;
        debug!(
            items = state.board.len(),
            generation = state.generation,
            "loaded board snapshot"
        );
    }

    /// Snapshot of the current (possibly optimistic) board.
    #[must_use]
    pub fn board(&self) -> BoardPartition {
        self.shared.state.borrow().board.clone()
    }

    /// Borrow the board without cloning it.
    #[must_use]
    pub fn with_board<R>(&self, f: impl FnOnce(&BoardPartition) -> R) -> R {
        f(&self.shared.state.borrow().board)
    }

    /// Whether `item_id` has an unsettled mutation.
    #[must_use]
    pub fn is_in_flight(&self, item_id: &str) -> bool {
        self.shared.state.borrow().in_flight.contains_key(item_id)
    }

    /// Apply a gesture locally and return the mutation to persist, or `None`
    /// if the release was a no-op.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError`] if there is no token, the gesture does not
    /// match the board, or the item is in flight under
    /// [`InFlightPolicy::RejectWhileInFlight`]. The board is unchanged.
    pub fn begin(&self, gesture: &DragGesture) -> Result<Option<PendingMutation>, SyncError> {
        let Some((from, to)) = gesture.target() else {
            debug!(item_id = %gesture.item_id, phase = %GesturePhase::Idle, "no-op release");
            return Ok(None);
        };

        let Some(token) = self.tokens.token() else {
            warn!(item_id = %gesture.item_id, "rejecting gesture: not authenticated");
            return Err(SyncError::NotAuthenticated);
        };

        let mut state = self.shared.state.borrow_mut();
        gesture.validate(&state.board)?;

        if self.shared.policy.in_flight == InFlightPolicy::RejectWhileInFlight
            && state.in_flight.contains_key(&gesture.item_id)
        {
            warn!(item_id = %gesture.item_id, "rejecting gesture: update in flight");
            return Err(SyncError::InFlight {
                item_id: gesture.item_id.clone(),
            });
        }

        let moved = state.board.apply_move(from, to)?;
        *state.in_flight.entry(moved.id.clone()).or_default() += 1;
        debug!(
            item_id = %moved.id,
            %from,
            %to,
            phase = %GesturePhase::Applying,
            "applied optimistic move"
        );

        Ok(Some(PendingMutation {
            update: StatusUpdate {
                item_id: moved.id,
                status: moved.status,
            },
            destination: to,
            token,
            generation: state.generation,
            shared: Rc::downgrade(&self.shared),
        }))
    }

    /// Send a pending mutation and reconcile the board with the result.
    pub fn dispatch(&self, pending: PendingMutation) -> GestureOutcome {
        debug!(
            item_id = %pending.update.item_id,
            status = %pending.update.status,
            phase = %GesturePhase::Persisting,
            "persisting status change"
        );
        let result = self.transport.update_status(&pending.token, &pending.update);
        pending.complete(result)
    }

    /// Run a whole gesture: apply locally, persist, reconcile.
    ///
    /// # Errors
    ///
    /// Same as [`SyncController::begin`]. Remote failures are reported in
    /// the returned [`GestureOutcome`], not as errors.
    pub fn handle_drop(&self, gesture: &DragGesture) -> Result<GestureOutcome, SyncError> {
        match self.begin(gesture)? {
            Some(pending) => Ok(self.dispatch(pending)),
            None => Ok(GestureOutcome::Idle),
        }
    }
}
