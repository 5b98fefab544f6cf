//! End-to-end gesture scenarios against an in-memory backend.

use docket_core::board::{DragGesture, Slot, partition};
use docket_core::model::{Status, WorkItem};
use docket_core::sync::{
    FailurePolicy, GestureOutcome, GesturePhase, StaticToken, StatusTransport, StatusUpdate,
    SyncController, SyncPolicy, TransportError,
};
use std::cell::{Cell, RefCell};
use std::io;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Backend double that records every request it receives. Clones share
/// the same log.
#[derive(Clone, Default)]
struct RecordingBackend {
    fail: Rc<Cell<bool>>,
    requests: Rc<RefCell<Vec<StatusUpdate>>>,
}

impl StatusTransport for RecordingBackend {
    fn update_status(&self, token: &str, update: &StatusUpdate) -> Result<(), TransportError> {
        assert_eq!(token, "token-1");
        self.requests.borrow_mut().push(update.clone());
        if self.fail.get() {
            return Err(TransportError::Network {
                url: format!("http://backend.test/api/tickets/{}", update.item_id),
                reason: "connection reset".into(),
            });
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

fn t(id: &str) -> WorkItem {
    WorkItem::new(id, format!("ticket {id}"))
}

fn ids(items: &[WorkItem]) -> Vec<&str> {
    items.iter().map(|i| i.id.as_str()).collect()
}

fn controller(
    backend: &RecordingBackend,
    policy: SyncPolicy,
) -> SyncController<RecordingBackend, StaticToken> {
    let ctl = SyncController::new(backend.clone(), StaticToken::new("token-1"), policy);
    ctl.load(vec![t("T1"), t("T2")]);
    ctl
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn move_between_columns_persists_and_refreshes() {
    let backend = RecordingBackend::default();
    let ctl = controller(&backend, SyncPolicy::default());

    let gesture = DragGesture::from_drop("T1", "open", 0, Some(("in-progress", 0))).unwrap();
    let outcome = ctl.handle_drop(&gesture).unwrap();
    assert_eq!(outcome.phase(), GesturePhase::Settled);

    let board = ctl.board();
    assert_eq!(ids(board.column(Status::Open)), ["T2"]);
    assert_eq!(ids(board.column(Status::InProgress)), ["T1"]);
    assert!(board.column(Status::Closed).is_empty());
    assert_eq!(board.column(Status::InProgress)[0].status, Status::InProgress);

    assert_eq!(
        *backend.requests.borrow(),
        vec![StatusUpdate {
            item_id: "T1".into(),
            status: Status::InProgress,
        }]
    );
}

#[test]
fn failed_persist_keeps_optimistic_state_and_logs() {
    let backend = RecordingBackend::default();
    backend.fail.set(true);
    let ctl = controller(&backend, SyncPolicy::default());
    let refreshed = Rc::new(Cell::new(false));
    let flag = Rc::clone(&refreshed);
    ctl.on_refresh(move || flag.set(true));

    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let gesture = DragGesture::from_drop("T1", "open", 0, Some(("in-progress", 0))).unwrap();
    let outcome = tracing::subscriber::with_default(subscriber, || ctl.handle_drop(&gesture))
        .unwrap();

    match outcome {
        GestureOutcome::Failed {
            update, reverted, ..
        } => {
            assert_eq!(update.status, Status::InProgress);
            assert!(!reverted);
        }
        other => panic!("expected failure, got {other:?}"),
    }

    let board = ctl.board();
    assert_eq!(ids(board.column(Status::Open)), ["T2"]);
    assert_eq!(ids(board.column(Status::InProgress)), ["T1"]);
    assert!(!refreshed.get());

    let logged = logs.contents();
    assert!(logged.contains("ERROR"), "missing error log: {logged}");
    assert!(logged.contains("failed to persist status change"));
    assert!(logged.contains("T1"));
}

#[test]
fn reorder_within_column() {
    let backend = RecordingBackend::default();
    let ctl = controller(&backend, SyncPolicy::default());

    let gesture = DragGesture::from_drop("T2", "open", 1, Some(("open", 0))).unwrap();
    let outcome = ctl.handle_drop(&gesture).unwrap();
    assert_eq!(outcome.phase(), GesturePhase::Settled);

    let board = ctl.board();
    assert_eq!(ids(board.column(Status::Open)), ["T2", "T1"]);
    assert!(board.column(Status::InProgress).is_empty());
    assert!(board.column(Status::Closed).is_empty());

    assert_eq!(
        *backend.requests.borrow(),
        vec![StatusUpdate {
            item_id: "T2".into(),
            status: Status::Open,
        }]
    );
}

#[test]
fn rapid_moves_are_not_coalesced() {
    let backend = RecordingBackend::default();
    let ctl = controller(&backend, SyncPolicy::default());

    let first = DragGesture::from_drop("T1", "open", 0, Some(("in-progress", 0))).unwrap();
    let pending_first = ctl.begin(&first).unwrap().unwrap();

    let second = DragGesture::from_drop("T1", "in-progress", 0, Some(("closed", 0))).unwrap();
    let pending_second = ctl.begin(&second).unwrap().unwrap();

    assert_eq!(pending_first.update().status, Status::InProgress);
    assert_eq!(pending_second.update().status, Status::Closed);
    assert!(ctl.is_in_flight("T1"));

    ctl.dispatch(pending_first);
    assert!(ctl.is_in_flight("T1"));
    ctl.dispatch(pending_second);
    assert!(!ctl.is_in_flight("T1"));

    let statuses: Vec<Status> = backend.requests.borrow().iter().map(|u| u.status).collect();
    assert_eq!(statuses, [Status::InProgress, Status::Closed]);
    assert_eq!(ids(ctl.board().column(Status::Closed)), ["T1"]);
}

#[test]
fn responses_may_resolve_out_of_order() {
    let backend = RecordingBackend::default();
    let ctl = controller(&backend, SyncPolicy::default());

    let a = ctl
        .begin(&DragGesture::from_drop("T1", "open", 0, Some(("closed", 0))).unwrap())
        .unwrap()
        .unwrap();
    let b = ctl
        .begin(&DragGesture::from_drop("T2", "open", 0, Some(("in-progress", 0))).unwrap())
        .unwrap()
        .unwrap();

    assert!(matches!(b.complete(Ok(())), GestureOutcome::Settled { .. }));
    assert!(matches!(a.complete(Ok(())), GestureOutcome::Settled { .. }));
    assert!(!ctl.is_in_flight("T1"));
    assert!(!ctl.is_in_flight("T2"));
    // Completed outside `dispatch`, so the backend saw nothing.
    assert!(backend.requests.borrow().is_empty());
}

#[test]
fn revert_policy_rolls_back_to_last_snapshot() {
    let backend = RecordingBackend::default();
    let ctl = controller(
        &backend,
        SyncPolicy {
            on_failure: FailurePolicy::Revert,
            ..SyncPolicy::default()
        },
    );

    ctl.handle_drop(&DragGesture::from_drop("T1", "open", 0, Some(("closed", 0))).unwrap())
        .unwrap();
    let confirmed = ctl.board();

    backend.fail.set(true);
    let outcome = ctl
        .handle_drop(&DragGesture::from_drop("T2", "open", 0, Some(("closed", 1))).unwrap())
        .unwrap();
    assert!(matches!(outcome, GestureOutcome::Failed { reverted: true, .. }));
    assert_eq!(ctl.board(), confirmed);
}

#[test]
fn revert_of_one_gesture_keeps_a_concurrent_accepted_move() {
    let backend = RecordingBackend::default();
    let ctl = controller(
        &backend,
        SyncPolicy {
            on_failure: FailurePolicy::Revert,
            ..SyncPolicy::default()
        },
    );

    let a = ctl
        .begin(&DragGesture::from_drop("T1", "open", 0, Some(("closed", 0))).unwrap())
        .unwrap()
        .unwrap();
    let b = ctl
        .begin(&DragGesture::from_drop("T2", "open", 0, Some(("in-progress", 0))).unwrap())
        .unwrap()
        .unwrap();

    assert_eq!(ctl.dispatch(a).phase(), GesturePhase::Settled);
    backend.fail.set(true);
    let outcome = ctl.dispatch(b);
    assert!(matches!(outcome, GestureOutcome::Failed { reverted: true, .. }));

    let board = ctl.board();
    assert_eq!(ids(board.column(Status::Closed)), vec!["T1"]);
    assert_eq!(board.column(Status::Closed)[0].status, Status::Closed);
    assert_eq!(ids(board.column(Status::Open)), vec!["T2"]);
    assert!(board.column(Status::InProgress).is_empty());
    assert_eq!(backend.requests.borrow().len(), 2);
}

#[test]
fn refresh_replaces_board_wholesale() {
    let backend = RecordingBackend::default();
    let ctl = Rc::new(controller(&backend, SyncPolicy::default()));
    let authoritative = vec![
        t("T2"),
        t("T1").with_status(Status::Closed),
        t("T3").with_status(Status::InProgress),
    ];
    let snapshot = authoritative.clone();
    let weak = Rc::downgrade(&ctl);
    ctl.on_refresh(move || {
        if let Some(ctl) = weak.upgrade() {
            ctl.load(snapshot.clone());
        }
    });

    ctl.handle_drop(&DragGesture::from_drop("T1", "open", 0, Some(("in-progress", 0))).unwrap())
        .unwrap();
    assert_eq!(ctl.board(), partition(authoritative));
}
