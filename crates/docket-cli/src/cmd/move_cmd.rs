//! `dk move` — drag a card to another column (or position) and persist it.
//!
//! Runs the same gesture path the board UI does: apply locally, send the
//! status update, and re-fetch the board if the backend accepts it.

use super::{Session, fail};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};
use clap::Args;
use docket_core::board::{BoardPartition, DragGesture, Slot};
use docket_core::error::ErrorCode;
use docket_core::model::Status;
use docket_core::sync::{GestureOutcome, ItemQuery, ItemSource, SyncController};
use serde::Serialize;
use std::cell::Cell;
use std::io::{self, Write};
use std::rc::Rc;
use tracing::warn;

#[derive(Args, Debug)]
pub struct MoveArgs {
    /// Item id to move.
    pub id: String,

    /// Project the item belongs to.
    #[arg(long, short = 'p')]
    pub project: String,

    /// Destination column.
    #[arg(long)]
    pub to: Status,

    /// Position in the destination column. Defaults to the bottom.
    #[arg(long)]
    pub index: Option<usize>,
}

#[derive(Debug, Serialize)]
struct MoveReport {
    ok: bool,
    item_id: String,
    from: Slot,
    to: Slot,
    phase: String,
    refreshed: bool,
    board: BoardPartition,
}

/// Bottom of `to`. Within the source column the last valid slot is one
/// less, since the item itself is already counted.
fn default_index(board: &BoardPartition, source: Slot, to: Status) -> usize {
    let len = board.column(to).len();
    if to == source.status {
        len.saturating_sub(1)
    } else {
        len
    }
}

pub fn run_move(args: &MoveArgs, session: &Session) -> anyhow::Result<()> {
    let output = session.output;
    let token = session.require_token()?;
    let query = ItemQuery::for_project(&args.project);
    let items = session.fetch(&token, &query)?;

    let controller = SyncController::new(
        &session.api,
        session.config.token_source(),
        session.config.board,
    );
    controller.load(items);

    let refresh_requested = Rc::new(Cell::new(false));
    let flag = Rc::clone(&refresh_requested);
    controller.on_refresh(move || flag.set(true));

    let Some(source) = controller.with_board(|board| board.find(&args.id)) else {
        return Err(fail(
            output,
            ErrorCode::ItemNotFound,
            format!("item {} not found in project {}", args.id, args.project),
        ));
    };
    let index = match args.index {
        Some(index) => index,
        None => controller.with_board(|board| default_index(board, source, args.to)),
    };
    let destination = Slot::new(args.to, index);
    let gesture = DragGesture::new(args.id.as_str(), source, Some(destination));

    let outcome = controller
        .handle_drop(&gesture)
        .map_err(|err| fail(output, err.code(), err.to_string()))?;
    if let GestureOutcome::Failed { error, .. } = &outcome {
        return Err(session.transport_failure(error));
    }

    let mut refreshed = false;
    if refresh_requested.get() {
        match session.api.fetch_items(&token, &query) {
            Ok(items) => {
                controller.load(items);
                refreshed = true;
            }
            Err(err) => warn!(error = %err, "refresh after move failed; showing local board"),
        }
    }

    let report = MoveReport {
        ok: true,
        item_id: args.id.clone(),
        from: source,
        to: destination,
        phase: outcome.phase().to_string(),
        refreshed,
        board: controller.board(),
    };
    render_report(output, &report)
}

fn render_report(mode: OutputMode, report: &MoveReport) -> anyhow::Result<()> {
    render_mode(mode, report, write_report_text, write_report_pretty)
}

fn write_report_text(report: &MoveReport, w: &mut dyn Write) -> io::Result<()> {
    writeln!(
        w,
        "{}\t{}\t{}\t{}",
        report.item_id, report.from, report.to, report.phase
    )
}

fn write_report_pretty(report: &MoveReport, w: &mut dyn Write) -> io::Result<()> {
    if report.phase == "idle" {
        writeln!(w, "{} is already at {}; nothing to do", report.item_id, report.from)?;
        return Ok(());
    }
    pretty_section(w, &format!("Moved {}", report.item_id))?;
    pretty_kv(w, "From", format!("{} #{}", report.from.status.heading(), report.from.index))?;
    pretty_kv(w, "To", format!("{} #{}", report.to.status.heading(), report.to.index))?;
    pretty_kv(w, "Refreshed", if report.refreshed { "yes" } else { "no" })
}
