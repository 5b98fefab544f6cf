#![no_main]

use docket_core::board::{Slot, partition};
use docket_core::model::{Status, WorkItem};
use libfuzzer_sys::fuzz_target;

// Decode a ticket list, partition it, and apply one move chosen by the
// first two bytes. Nothing may panic and the item count must hold.
fuzz_target!(|data: &[u8]| {
    let (head, body) = data.split_at(data.len().min(2));
    let Ok(items) = serde_json::from_slice::<Vec<WorkItem>>(body) else {
        return;
    };
    let total = items.len();
    let mut board = partition(items);
    assert_eq!(board.len(), total);

    let pick = |byte: Option<&u8>| {
        let b = usize::from(byte.copied().unwrap_or(0));
        (Status::ALL[b % 3], b / 3)
    };
    let (from_status, from_index) = pick(head.first());
    let (to_status, to_index) = pick(head.get(1));
    let before = board.clone();
    match board.apply_move(Slot::new(from_status, from_index), Slot::new(to_status, to_index)) {
        Ok(moved) => {
            assert_eq!(moved.status, to_status);
            assert_eq!(board.len(), total);
        }
        Err(_) => assert_eq!(board, before),
    }
});
