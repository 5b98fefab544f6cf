//! `dk update` — edit an existing ticket.

use super::{Session, fail};
use crate::output::render_item;
use clap::Args;
use docket_core::api::TicketDraft;
use docket_core::error::ErrorCode;
use docket_core::model::{Priority, Status};
use docket_core::sync::ItemQuery;

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Ticket id.
    pub id: String,

    #[arg(long, short = 'p')]
    pub project: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub priority: Option<Priority>,

    #[arg(long)]
    pub status: Option<Status>,

    /// Assignee user id. Pass an empty string to unassign.
    #[arg(long)]
    pub assignee: Option<String>,
}

impl UpdateArgs {
    fn apply(&self, draft: &mut TicketDraft) {
        if let Some(title) = &self.title {
            draft.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            draft.description.clone_from(description);
        }
        if let Some(priority) = self.priority {
            draft.priority = priority;
        }
        if let Some(status) = self.status {
            draft.status = status;
        }
        if let Some(assignee) = &self.assignee {
            draft.assignee = Some(assignee.trim().to_string()).filter(|id| !id.is_empty());
        }
    }
}

/// The edit form sends every field, so start from the current ticket.
pub fn run_update(args: &UpdateArgs, session: &Session) -> anyhow::Result<()> {
    let token = session.require_token()?;
    let items = session.fetch(&token, &ItemQuery::for_project(&args.project))?;
    let Some(current) = items.iter().find(|item| item.id == args.id) else {
        return Err(fail(
            session.output,
            ErrorCode::ItemNotFound,
            format!("item {} not found in project {}", args.id, args.project),
        ));
    };

    let mut draft = TicketDraft::from_item(current, args.project.as_str());
    args.apply(&mut draft);

    let updated = session
        .api
        .update_ticket(&token, &args.id, &draft)
        .map_err(|err| session.transport_failure(&err))?;
    tracing::info!(item_id = %updated.id, "ticket updated");
    render_item(&updated, session.output)?;
    Ok(())
}
