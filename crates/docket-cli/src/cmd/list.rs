//! `dk list` — the flat list view over the same board.

use super::{FilterArgs, Session};
use crate::output::render_list;
use clap::Args;
use docket_core::board::partition;
use docket_core::model::Status;

#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    /// Only items with this status.
    #[arg(long)]
    pub status: Option<Status>,
}

/// Items are listed in board order: open, then in progress, then closed.
pub fn run_list(args: &ListArgs, session: &Session) -> anyhow::Result<()> {
    let token = session.require_token()?;
    let items = session.fetch(&token, &args.filters.query(args.status))?;
    let board = partition(items);
    render_list(&board.flatten(), session.output)?;
    Ok(())
}
