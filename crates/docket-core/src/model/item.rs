use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};

/// Label shown for a work item with no assignee.
pub const UNASSIGNED: &str = "Unassigned";

/// The three board columns, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    #[serde(rename = "open")]
    Open,
    #[serde(rename = "in-progress", alias = "in progress")]
    InProgress,
    #[serde(rename = "closed")]
    Closed,
}

impl Status {
    /// Every status, in column order.
    pub const ALL: [Self; 3] = [Self::Open, Self::InProgress, Self::Closed];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in-progress",
            Self::Closed => "closed",
        }
    }

    /// Column heading used by board renderers.
    #[must_use]
    pub const fn heading(self) -> &'static str {
        match self {
            Self::Open => "To Do",
            Self::InProgress => "In Progress",
            Self::Closed => "Done",
        }
    }

    /// Position of this status in [`Status::ALL`].
    #[must_use]
    pub const fn ordinal(self) -> usize {
        match self {
            Self::Open => 0,
            Self::InProgress => 1,
            Self::Closed => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Read-only projection of a team member.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Person {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// A ticket as served by the tracker backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: Status,
    #[serde(
        default,
        deserialize_with = "deserialize_assignee",
        skip_serializing_if = "Option::is_none"
    )]
    pub assignee: Option<Person>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl WorkItem {
    /// Build an open, medium-priority, unassigned item created now.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            priority: Priority::default(),
            status: Status::default(),
            assignee: None,
            created_at: Utc::now(),
            project_id: None,
            updated_at: None,
        }
    }

    #[must_use]
    pub const fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn with_assignee(mut self, assignee: Person) -> Self {
        self.assignee = Some(assignee);
        self
    }

    /// Assignee display name, falling back to [`UNASSIGNED`].
    #[must_use]
    pub fn assignee_name(&self) -> &str {
        self.assignee
            .as_ref()
            .map(|p| p.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(UNASSIGNED)
    }
}

/// The backend sends `assignee` populated, as a bare id, or as `null`.
#[derive(Deserialize)]
#[serde(untagged)]
enum AssigneeRepr {
    Populated(Person),
    Id(String),
}

fn deserialize_assignee<'de, D>(deserializer: D) -> Result<Option<Person>, D::Error>
where
    D: Deserializer<'de>,
{
    let repr = Option::<AssigneeRepr>::deserialize(deserializer)?;
    Ok(match repr {
        Some(AssigneeRepr::Populated(person)) => Some(person),
        Some(AssigneeRepr::Id(id)) if !id.is_empty() => Some(Person {
            id,
            ..Person::default()
        }),
        Some(AssigneeRepr::Id(_)) | None => None,
    })
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase()
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "open" | "todo" => Ok(Self::Open),
            "in-progress" | "in progress" | "in_progress" => Ok(Self::InProgress),
            "closed" | "done" => Ok(Self::Closed),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParseEnumError {
                expected: "priority",
                got: s.to_string(),
            }),
        }
    }
}
