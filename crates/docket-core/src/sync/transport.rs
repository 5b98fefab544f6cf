//! Collaborators consumed by the sync controller.
//!
//! The controller never performs I/O itself. It talks to the backend
//! through [`StatusTransport`], reads items through [`ItemSource`], and
//! asks a [`TokenSource`] for the bearer token at the point of use. The
//! HTTP implementations live in [`crate::api`]; tests substitute in-memory
//! ones.

use serde::Serialize;

use crate::error::ErrorCode;
use crate::model::{Priority, Status, WorkItem};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Transient remote failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The backend answered with a non-2xx status.
    #[error("backend returned HTTP {status} for {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    /// The request never produced a response.
    #[error("request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    /// The response body was not what we expected.
    #[error("failed to decode response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

impl TransportError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Status { .. } => ErrorCode::RemoteRejected,
            Self::Network { .. } => ErrorCode::NetworkFailure,
            Self::Decode { .. } => ErrorCode::DecodeFailed,
        }
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Body of one remote status mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusUpdate {
    pub item_id: String,
    pub status: Status,
}

/// Filters for fetching a project's items. Unset filters are omitted from
/// the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemQuery {
    pub project_id: String,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub assignee: Option<String>,
    pub search: Option<String>,
}

impl ItemQuery {
    #[must_use]
    pub fn for_project(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            ..Self::default()
        }
    }

    /// Query-string pairs in wire order, skipping unset or blank filters.
    #[must_use]
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("projectId", self.project_id.clone())];
        if let Some(status) = self.status {
            pairs.push(("status", status.to_string()));
        }
        if let Some(priority) = self.priority {
            pairs.push(("priority", priority.to_string()));
        }
        let text_filters = [("assignee", &self.assignee), ("search", &self.search)];
        for (key, value) in text_filters {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                pairs.push((key, value.to_string()));
            }
        }
        pairs
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// The remote mutation endpoint.
pub trait StatusTransport {
    /// Persist `update`. Any 2xx is success; the body is ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] on network failure or non-2xx status.
    fn update_status(&self, token: &str, update: &StatusUpdate) -> Result<(), TransportError>;
}

impl<T: StatusTransport + ?Sized> StatusTransport for &T {
    fn update_status(&self, token: &str, update: &StatusUpdate) -> Result<(), TransportError> {
        (**self).update_status(token, update)
    }
}

/// Supplies the item snapshot for a project.
pub trait ItemSource {
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the snapshot cannot be fetched.
    fn fetch_items(&self, token: &str, query: &ItemQuery) -> Result<Vec<WorkItem>, TransportError>;
}

impl<T: ItemSource + ?Sized> ItemSource for &T {
    fn fetch_items(&self, token: &str, query: &ItemQuery) -> Result<Vec<WorkItem>, TransportError> {
        (**self).fetch_items(token, query)
    }
}

/// Read-only access to the current bearer token. `None` means the caller
/// is not authenticated.
pub trait TokenSource {
    fn token(&self) -> Option<String>;
}

impl<F> TokenSource for F
where
    F: Fn() -> Option<String>,
{
    fn token(&self) -> Option<String> {
        self()
    }
}

/// A token fixed at construction time.
#[derive(Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    #[must_use]
    pub const fn none() -> Self {
        Self(None)
    }
}

impl From<Option<String>> for StaticToken {
    fn from(token: Option<String>) -> Self {
        Self(token.filter(|t| !t.is_empty()))
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shown = if self.0.is_some() { "<redacted>" } else { "<none>" };
        f.debug_tuple("StaticToken").field(&shown).finish()
    }
}

impl TokenSource for StaticToken {
    fn token(&self) -> Option<String> {
        self.0.clone()
    }
}
