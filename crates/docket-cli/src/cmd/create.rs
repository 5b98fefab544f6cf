//! `dk create` — add a ticket to a project.

use super::Session;
use crate::output::{CliError, render_error, render_item};
use clap::Args;
use docket_core::api::TicketDraft;
use docket_core::model::{Priority, Status};

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Project to add the ticket to.
    #[arg(long, short = 'p')]
    pub project: String,

    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub priority: Option<Priority>,

    /// Starting column. Defaults to open.
    #[arg(long)]
    pub status: Option<Status>,

    /// Assignee user id.
    #[arg(long)]
    pub assignee: Option<String>,
}

impl CreateArgs {
    fn draft(&self) -> TicketDraft {
        let mut draft = TicketDraft::new(self.project.as_str(), self.title.trim());
        if let Some(description) = &self.description {
            draft.description.clone_from(description);
        }
        if let Some(priority) = self.priority {
            draft.priority = priority;
        }
        if let Some(status) = self.status {
            draft.status = status;
        }
        draft.assignee = self.assignee.clone().filter(|id| !id.trim().is_empty());
        draft
    }
}

pub fn run_create(args: &CreateArgs, session: &Session) -> anyhow::Result<()> {
    let draft = args.draft();
    if draft.title.is_empty() {
        render_error(session.output, &CliError::new("title must not be empty"))?;
        anyhow::bail!("title must not be empty");
    }

    let token = session.require_token()?;
    let created = session
        .api
        .create_ticket(&token, &draft)
        .map_err(|err| session.transport_failure(&err))?;
    tracing::info!(item_id = %created.id, "ticket created");
    render_item(&created, session.output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> CreateArgs {
        CreateArgs {
            project: "p1".into(),
            title: "  Fix login ".into(),
            description: None,
            priority: None,
            status: None,
            assignee: Some(" ".into()),
        }
    }

    #[test]
    fn draft_defaults_to_open_medium() {
        let draft = args().draft();
        assert_eq!(draft.title, "Fix login");
        assert_eq!(draft.status, Status::Open);
        assert_eq!(draft.priority, Priority::Medium);
        assert_eq!(draft.assignee, None);
    }

    #[test]
    fn draft_applies_overrides() {
        let draft = CreateArgs {
            priority: Some(Priority::High),
            status: Some(Status::InProgress),
            assignee: Some("u1".into()),
            ..args()
        }
        .draft();
        assert_eq!(draft.priority, Priority::High);
        assert_eq!(draft.status, Status::InProgress);
        assert_eq!(draft.assignee.as_deref(), Some("u1"));
    }
}
