//! Board State Store: work items partitioned into the three status columns.
//!
//! The partition is a derived cache. It is rebuilt from scratch whenever a
//! fresh snapshot of items arrives and is never merged field-by-field with
//! one. Inside the partition, an item's `status` always equals the column
//! it occupies; [`BoardPartition::apply_move`] rewrites `status` as it moves
//! the item.
//!
//! All operations here are pure data transforms. Network I/O and
//! reconciliation live in [`crate::sync`].

pub mod gesture;

use serde::Serialize;
use std::fmt;

use crate::error::ErrorCode;
use crate::model::{Status, WorkItem};

pub use gesture::{DragGesture, GestureError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from board mutations. A failed mutation leaves the board unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("index {index} out of range for column '{status}' (len {len})")]
    OutOfRange {
        status: Status,
        index: usize,
        len: usize,
    },
}

impl BoardError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::OutOfRange { .. } => ErrorCode::IndexOutOfRange,
        }
    }
}

// ---------------------------------------------------------------------------
// Slot
// ---------------------------------------------------------------------------

/// A position on the board: a column and an index within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Slot {
    pub status: Status,
    pub index: usize,
}

impl Slot {
    #[must_use]
    pub const fn new(status: Status, index: usize) -> Self {
        Self { status, index }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.status, self.index)
    }
}

// ---------------------------------------------------------------------------
// Partition
// ---------------------------------------------------------------------------

/// Ordered columns keyed by status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BoardPartition {
    open: Vec<WorkItem>,
    #[serde(rename = "in-progress")]
    in_progress: Vec<WorkItem>,
    closed: Vec<WorkItem>,
}

/// Group `items` into the three fixed columns, keeping input order within
/// each column.
#[must_use]
pub fn partition<I>(items: I) -> BoardPartition
where
    I: IntoIterator<Item = WorkItem>,
{
    let mut board = BoardPartition::default();
    for item in items {
        board.column_mut(item.status).push(item);
    }
    board
}

/// Pure move: returns the moved board and the moved item, leaving `board`
/// untouched.
///
/// # Errors
///
/// Returns [`BoardError::OutOfRange`] if either slot is invalid.
pub fn move_item(
    board: &BoardPartition,
    from: Slot,
    to: Slot,
) -> Result<(BoardPartition, WorkItem), BoardError> {
    let mut next = board.clone();
    let moved = next.apply_move(from, to)?;
    Ok((next, moved))
}

impl BoardPartition {
    /// Items in one column, top to bottom.
    #[must_use]
    pub fn column(&self, status: Status) -> &[WorkItem] {
        match status {
            Status::Open => &self.open,
            Status::InProgress => &self.in_progress,
            Status::Closed => &self.closed,
        }
    }

    fn column_mut(&mut self, status: Status) -> &mut Vec<WorkItem> {
        match status {
            Status::Open => &mut self.open,
            Status::InProgress => &mut self.in_progress,
            Status::Closed => &mut self.closed,
        }
    }

    /// Total item count across all columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.open.len() + self.in_progress.len() + self.closed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Items in column order (open, in-progress, closed). This is the flat
    /// list view: a read-only projection of the board.
    pub fn iter(&self) -> impl Iterator<Item = &WorkItem> {
        Status::ALL.into_iter().flat_map(|s| self.column(s).iter())
    }

    /// Owned copy of [`BoardPartition::iter`].
    #[must_use]
    pub fn flatten(&self) -> Vec<WorkItem> {
        self.iter().cloned().collect()
    }

    /// Locate an item by id.
    #[must_use]
    pub fn find(&self, item_id: &str) -> Option<Slot> {
        Status::ALL.into_iter().find_map(|status| {
            self.column(status)
                .iter()
                .position(|item| item.id == item_id)
                .map(|index| Slot::new(status, index))
        })
    }

    /// Item at a slot, if the slot is in range.
    #[must_use]
    pub fn get(&self, slot: Slot) -> Option<&WorkItem> {
        self.column(slot.status).get(slot.index)
    }

    /// Discard the current contents and rebuild from a fresh snapshot.
    pub fn replace<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = WorkItem>,
    {
        *self = partition(items);
    }

    /// Move the item at `from` to `to` in place, returning a copy of the
    /// moved item with its new status.
    ///
    /// Both slots are validated before anything is touched:
    /// - `from.index` must address an existing item;
    /// - across columns, `to.index` may be at most the destination length
    ///   (append);
    /// - within a column, `to.index` must address an existing position.
    ///
    /// Moving an item onto its own slot is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::OutOfRange`] if either slot is invalid.
    pub fn apply_move(&mut self, from: Slot, to: Slot) -> Result<WorkItem, BoardError> {
        let source_len = self.column(from.status).len();
        if from.index >= source_len {
            return Err(BoardError::OutOfRange {
                status: from.status,
                index: from.index,
                len: source_len,
            });
        }

        let dest_len = self.column(to.status).len();
        let dest_max = if from.status == to.status {
            dest_len - 1
        } else {
            dest_len
        };
        if to.index > dest_max {
            return Err(BoardError::OutOfRange {
                status: to.status,
                index: to.index,
                len: dest_len,
            });
        }

        if from == to {
            return Ok(self.column(from.status)[from.index].clone());
        }

        let mut item = self.column_mut(from.status).remove(from.index);
        item.status = to.status;
        let moved = item.clone();
        self.column_mut(to.status).insert(to.index, item);
        Ok(moved)
    }
}
