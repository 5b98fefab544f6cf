//! HTTP client for the tracker backend.
//!
//! Implements [`ItemSource`] and [`StatusTransport`] over JSON-over-HTTP
//! with bearer-token auth, plus the ticket create/update calls used by the
//! ticket form. Timeouts, if any, are the agent's; the sync engine adds
//! none of its own.

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use std::time::Duration;
use tracing::debug;

use crate::config::ApiConfig;
use crate::model::{Priority, Status, WorkItem};
use crate::sync::transport::{ItemQuery, ItemSource, StatusTransport, StatusUpdate, TransportError};

/// Body for creating or editing a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketDraft {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: Status,
    /// Always sent; `None` goes out as `""`, which clears the assignee.
    #[serde(serialize_with = "serialize_assignee")]
    pub assignee: Option<String>,
    pub project_id: String,
}

impl TicketDraft {
    /// A new open, medium-priority ticket.
    #[must_use]
    pub fn new(project_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            priority: Priority::default(),
            status: Status::default(),
            assignee: None,
            project_id: project_id.into(),
        }
    }

    /// Start an edit from an existing ticket.
    #[must_use]
    pub fn from_item(item: &WorkItem, project_id: impl Into<String>) -> Self {
        Self {
            title: item.title.clone(),
            description: item.description.clone(),
            priority: item.priority,
            status: item.status,
            assignee: item
                .assignee
                .as_ref()
                .map(|p| p.id.clone())
                .filter(|id| !id.is_empty()),
            project_id: project_id.into(),
        }
    }
}

#[allow(clippy::ref_option)]
fn serialize_assignee<S: Serializer>(
    assignee: &Option<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(assignee.as_deref().unwrap_or_default())
}

#[derive(Serialize)]
struct StatusBody {
    status: Status,
}

/// Blocking JSON client for the `/api/tickets` endpoints.
#[derive(Clone)]
pub struct HttpApi {
    agent: ureq::Agent,
    base_url: String,
}

impl std::fmt::Debug for HttpApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpApi")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpApi {
    #[must_use]
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            agent: builder.build(),
            base_url,
        }
    }

    #[must_use]
    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(
            config.base_url.clone(),
            config.timeout_secs.map(Duration::from_secs),
        )
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{path}", self.base_url)
    }

    /// Ticket ids are opaque, so they are encoded as a single path segment.
    fn ticket_url(&self, ticket_id: &str) -> String {
        self.url(&format!("tickets/{}", urlencoding::encode(ticket_id)))
    }

    fn request(&self, method: &str, url: &str, token: &str) -> ureq::Request {
        debug!(method, url, "api request");
        self.agent
            .request(method, url)
            .set("Accept", "application/json")
            .set("User-Agent", "docket")
            .set("Authorization", &format!("Bearer {token}"))
    }

    /// `GET /api/tickets` with the query's filters.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] on network failure, non-2xx status, or
    /// an undecodable body.
    pub fn list_tickets(
        &self,
        token: &str,
        query: &ItemQuery,
    ) -> Result<Vec<WorkItem>, TransportError> {
        let url = self.url("tickets");
        let mut request = self.request("GET", &url, token);
        for (key, value) in query.pairs() {
            request = request.query(key, &value);
        }
        let response = request.call().map_err(|err| map_error(&url, err))?;
        decode(&url, response)
    }

    /// `PUT /api/tickets/{id}` with `{"status": ...}`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] on network failure or non-2xx status.
    pub fn put_status(&self, token: &str, update: &StatusUpdate) -> Result<(), TransportError> {
        let url = self.ticket_url(&update.item_id);
        self.request("PUT", &url, token)
            .send_json(StatusBody {
                status: update.status,
            })
            .map_err(|err| map_error(&url, err))?;
        Ok(())
    }

    /// `POST /api/tickets`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] on network failure, non-2xx status, or
    /// an undecodable body.
    pub fn create_ticket(
        &self,
        token: &str,
        draft: &TicketDraft,
    ) -> Result<WorkItem, TransportError> {
        let url = self.url("tickets");
        let response = self
            .request("POST", &url, token)
            .send_json(draft)
            .map_err(|err| map_error(&url, err))?;
        decode(&url, response)
    }

    /// `PUT /api/tickets/{id}` with the full draft.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] on network failure, non-2xx status, or
    /// an undecodable body.
    pub fn update_ticket(
        &self,
        token: &str,
        ticket_id: &str,
        draft: &TicketDraft,
    ) -> Result<WorkItem, TransportError> {
        let url = self.ticket_url(ticket_id);
        let response = self
            .request("PUT", &url, token)
            .send_json(draft)
            .map_err(|err| map_error(&url, err))?;
        decode(&url, response)
    }
}

impl ItemSource for HttpApi {
    fn fetch_items(&self, token: &str, query: &ItemQuery) -> Result<Vec<WorkItem>, TransportError> {
        self.list_tickets(token, query)
    }
}

impl StatusTransport for HttpApi {
    fn update_status(&self, token: &str, update: &StatusUpdate) -> Result<(), TransportError> {
        self.put_status(token, update)
    }
}

fn decode<T: DeserializeOwned>(url: &str, response: ureq::Response) -> Result<T, TransportError> {
    response
        .into_json::<T>()
        .map_err(|err| TransportError::Decode {
            url: url.to_string(),
            reason: err.to_string(),
        })
}

fn map_error(url: &str, err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Status(status, response) => TransportError::Status {
            status,
            url: url.to_string(),
            body: response.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(transport) => TransportError::Network {
            url: url.to_string(),
            reason: transport.to_string(),
        },
    }
}
