//! Typed drag-and-drop gesture payloads.
//!
//! Drag libraries report a release as loosely-typed column ids and indices.
//! [`DragGesture::from_drop`] parses those into statuses, and
//! [`DragGesture::validate`] checks the gesture against the current board
//! before anything is mutated.

use serde::Serialize;

use super::{BoardError, BoardPartition, Slot};
use crate::error::ErrorCode;
use crate::model::{ParseEnumError, Status};

/// Errors from parsing or validating a gesture.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GestureError {
    #[error("unknown column id: {0}")]
    UnknownColumn(#[from] ParseEnumError),

    #[error(transparent)]
    Board(#[from] BoardError),

    /// The item under the source slot is not the one the gesture names.
    #[error("gesture names item {expected} but {slot} holds {found}")]
    ItemMismatch {
        expected: String,
        found: String,
        slot: Slot,
    },
}

impl GestureError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownColumn(_) => ErrorCode::InvalidEnumValue,
            Self::Board(err) => err.code(),
            Self::ItemMismatch { .. } => ErrorCode::GestureMismatch,
        }
    }
}

/// One drag-and-drop release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DragGesture {
    pub item_id: String,
    pub source: Slot,
    /// `None` when the item was dropped outside any column.
    pub destination: Option<Slot>,
}

impl DragGesture {
    #[must_use]
    pub fn new(item_id: impl Into<String>, source: Slot, destination: Option<Slot>) -> Self {
        Self {
            item_id: item_id.into(),
            source,
            destination,
        }
    }

    /// Build a gesture from raw drop-callback fields.
    ///
    /// # Errors
    ///
    /// Returns [`GestureError::UnknownColumn`] if a column id is not a status.
    pub fn from_drop(
        item_id: &str,
        source_column: &str,
        source_index: usize,
        destination: Option<(&str, usize)>,
    ) -> Result<Self, GestureError> {
        let source = Slot::new(source_column.parse()?, source_index);
        let destination = match destination {
            Some((column, index)) => Some(Slot::new(column.parse::<Status>()?, index)),
            None => None,
        };
        Ok(Self::new(item_id, source, destination))
    }

    /// The source/destination pair, or `None` if the release is a no-op
    /// (dropped outside a column, or dropped back onto its own slot).
    #[must_use]
    pub fn target(&self) -> Option<(Slot, Slot)> {
        self.destination
            .filter(|dest| *dest != self.source)
            .map(|dest| (self.source, dest))
    }

    /// Check the gesture against `board`: the source slot must exist and
    /// hold the named item.
    ///
    /// # Errors
    ///
    /// Returns [`GestureError::Board`] for an out-of-range source slot, or
    /// [`GestureError::ItemMismatch`] if a different item sits there.
    pub fn validate(&self, board: &BoardPartition) -> Result<(), GestureError> {
        let Some(item) = board.get(self.source) else {
            return Err(BoardError::OutOfRange {
                status: self.source.status,
                index: self.source.index,
                len: board.column(self.source.status).len(),
            }
            .into());
        };
        if item.id != self.item_id {
            return Err(GestureError::ItemMismatch {
                expected: self.item_id.clone(),
                found: item.id.clone(),
                slot: self.source,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::partition;
    use crate::model::WorkItem;

    fn board() -> BoardPartition {
        partition(vec![
            WorkItem::new("t1", "one"),
            WorkItem::new("t2", "two"),
        ])
    }

    #[test]
    fn from_drop_parses_column_ids() {
        let gesture = DragGesture::from_drop("t1", "open", 0, Some(("in-progress", 0))).unwrap();
        assert_eq!(gesture.source, Slot::new(Status::Open, 0));
        assert_eq!(gesture.destination, Some(Slot::new(Status::InProgress, 0)));
    }

    #[test]
    fn from_drop_rejects_unknown_column() {
        let err = DragGesture::from_drop("t1", "backlog", 0, None).unwrap_err();
        assert!(matches!(err, GestureError::UnknownColumn(_)));
        assert_eq!(err.code(), ErrorCode::InvalidEnumValue);
    }

    #[test]
    fn missing_or_identical_destination_has_no_target() {
        let dropped_outside = DragGesture::new("t1", Slot::new(Status::Open, 0), None);
        assert!(dropped_outside.target().is_none());

        let same = DragGesture::new(
            "t1",
            Slot::new(Status::Open, 0),
            Some(Slot::new(Status::Open, 0)),
        );
        assert!(same.target().is_none());

        let real = DragGesture::new(
            "t1",
            Slot::new(Status::Open, 0),
            Some(Slot::new(Status::Closed, 0)),
        );
        assert!(real.target().is_some());
    }

    #[test]
    fn validate_accepts_matching_item() {
        let gesture = DragGesture::new("t2", Slot::new(Status::Open, 1), None);
        assert!(gesture.validate(&board()).is_ok());
    }

    #[test]
    fn validate_rejects_wrong_item() {
        let gesture = DragGesture::new("t2", Slot::new(Status::Open, 0), None);
        let err = gesture.validate(&board()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::GestureMismatch);
        assert!(err.to_string().contains("open[0] holds t1"));
    }

    #[test]
    fn validate_rejects_missing_slot() {
        let gesture = DragGesture::new("t1", Slot::new(Status::Closed, 0), None);
        let err = gesture.validate(&board()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::IndexOutOfRange);
    }
}
