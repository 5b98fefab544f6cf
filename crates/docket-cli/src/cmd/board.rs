//! `dk board` — show a project as three status columns.

use super::{FilterArgs, Session, write_card};
use crate::output::{OutputMode, pretty_section, render_mode};
use clap::Args;
use docket_core::board::{BoardPartition, partition};
use docket_core::model::Status;
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct BoardArgs {
    #[command(flatten)]
    pub filters: FilterArgs,
}

pub fn run_board(args: &BoardArgs, session: &Session) -> anyhow::Result<()> {
    let token = session.require_token()?;
    let items = session.fetch(&token, &args.filters.query(None))?;
    render_board(session.output, &partition(items))
}

pub fn render_board(mode: OutputMode, board: &BoardPartition) -> anyhow::Result<()> {
    render_mode(mode, board, write_board_text, write_board_pretty)
}

/// One row per card: `status  index  id  priority  assignee  title`.
fn write_board_text(board: &BoardPartition, w: &mut dyn Write) -> io::Result<()> {
    if board.is_empty() {
        return Ok(());
    }
    writeln!(w, "status\tindex\tid\tpriority\tassignee\ttitle")?;
    for status in Status::ALL {
        for (index, item) in board.column(status).iter().enumerate() {
            writeln!(
                w,
                "{status}\t{index}\t{}\t{}\t{}\t{}",
                item.id,
                item.priority,
                item.assignee_name(),
                item.title
            )?;
        }
    }
    Ok(())
}

fn write_board_pretty(board: &BoardPartition, w: &mut dyn Write) -> io::Result<()> {
    for status in Status::ALL {
        let column = board.column(status);
        pretty_section(w, &format!("{} ({})", status.heading(), column.len()))?;
        if column.is_empty() {
            writeln!(w, "  (empty)")?;
        }
        for item in column {
            write_card(w, item)?;
        }
        writeln!(w)?;
    }
    Ok(())
}
