//! Command handlers and the plumbing they share.

pub mod board;
pub mod completions;
pub mod create;
pub mod list;
pub mod move_cmd;
pub mod update;

use crate::output::{CliError, OutputMode, Renderable, render_error};
use clap::Args;
use docket_core::api::HttpApi;
use docket_core::config::{Config, load_config};
use docket_core::error::ErrorCode;
use docket_core::model::{Priority, Status, WorkItem};
use docket_core::sync::{ItemQuery, ItemSource, TokenSource, TransportError};
use std::io::{self, Write};
use std::path::Path;
use tracing::debug;

/// Loaded config plus a client built from it.
pub struct Session {
    pub config: Config,
    pub api: HttpApi,
    pub output: OutputMode,
}

impl Session {
    /// Load config (explicit path, default path, then env) and build the client.
    pub fn open(config_path: Option<&Path>, output: OutputMode) -> anyhow::Result<Self> {
        let config = match load_config(config_path) {
            Ok(config) => config,
            Err(err) => return Err(fail(output, err.code(), err.to_string())),
        };
        debug!(base_url = %config.api.base_url, "loaded config");
        let api = HttpApi::from_config(&config.api);
        Ok(Self {
            config,
            api,
            output,
        })
    }

    /// The bearer token, or a rendered `NotAuthenticated` error.
    pub fn require_token(&self) -> anyhow::Result<String> {
        self.config.token_source().token().ok_or_else(|| {
            fail(
                self.output,
                ErrorCode::NotAuthenticated,
                "no bearer token configured",
            )
        })
    }

    /// Fetch a project's items, rendering any transport failure.
    pub fn fetch(&self, token: &str, query: &ItemQuery) -> anyhow::Result<Vec<WorkItem>> {
        self.api
            .fetch_items(token, query)
            .map_err(|err| self.transport_failure(&err))
    }

    pub fn transport_failure(&self, err: &TransportError) -> anyhow::Error {
        fail(self.output, err.code(), err.to_string())
    }
}

/// Render `message` with `code` to stderr and return it as an error.
pub fn fail(output: OutputMode, code: ErrorCode, message: impl Into<String>) -> anyhow::Error {
    let message = message.into();
    if let Err(err) = render_error(output, &CliError::from_code(code, message.clone())) {
        return err;
    }
    anyhow::anyhow!("{code}: {message}")
}

/// Filters shared by `dk board` and `dk list`.
#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Project id.
    #[arg(long, short = 'p')]
    pub project: String,

    /// Only items with this priority.
    #[arg(long)]
    pub priority: Option<Priority>,

    /// Only items assigned to this user id.
    #[arg(long)]
    pub assignee: Option<String>,

    /// Free-text search over title and description.
    #[arg(long)]
    pub search: Option<String>,
}

impl FilterArgs {
    pub fn query(&self, status: Option<Status>) -> ItemQuery {
        ItemQuery {
            project_id: self.project.clone(),
            status,
            priority: self.priority,
            assignee: self.assignee.clone(),
            search: self.search.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Ticket rendering
// ---------------------------------------------------------------------------

impl Renderable for WorkItem {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        crate::output::pretty_section(w, &format!("{}  {}", self.id, self.title))?;
        crate::output::pretty_kv(w, "Status", self.status.heading())?;
        crate::output::pretty_kv(w, "Priority", self.priority.as_str())?;
        crate::output::pretty_kv(w, "Assignee", self.assignee_name())?;
        crate::output::pretty_kv(w, "Created", self.created_at.format("%Y-%m-%d").to_string())?;
        if !self.description.is_empty() {
            writeln!(w)?;
            writeln!(w, "{}", self.description)?;
        }
        writeln!(w)
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer(&mut *w, self).map_err(io::Error::other)?;
        writeln!(w)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}",
            self.id,
            self.status,
            self.priority,
            self.assignee_name(),
            self.title
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["id", "status", "priority", "assignee", "title"]
    }
}

/// One line per item inside a board column.
pub fn write_card(w: &mut dyn Write, item: &WorkItem) -> io::Result<()> {
    writeln!(
        w,
        "  {:<10} {:<7} {:<14} {}",
        item.id,
        item.priority.as_str(),
        item.assignee_name(),
        item.title
    )
}
