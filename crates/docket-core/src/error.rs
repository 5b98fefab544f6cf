use std::fmt;

/// Machine-readable error codes shared by the library and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotAuthenticated,
    ConfigParseError,
    IndexOutOfRange,
    GestureMismatch,
    ItemInFlight,
    ItemNotFound,
    InvalidEnumValue,
    RemoteRejected,
    NetworkFailure,
    DecodeFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotAuthenticated => "E1001",
            Self::ConfigParseError => "E1002",
            Self::IndexOutOfRange => "E2001",
            Self::GestureMismatch => "E2002",
            Self::ItemInFlight => "E2003",
            Self::ItemNotFound => "E2004",
            Self::InvalidEnumValue => "E2005",
            Self::RemoteRejected => "E4001",
            Self::NetworkFailure => "E4002",
            Self::DecodeFailed => "E4003",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotAuthenticated => "Not authenticated",
            Self::ConfigParseError => "Config file parse error",
            Self::IndexOutOfRange => "Column index out of range",
            Self::GestureMismatch => "Dragged item does not match the board",
            Self::ItemInFlight => "Item has an unsettled update",
            Self::ItemNotFound => "Item not found",
            Self::InvalidEnumValue => "Invalid status/priority value",
            Self::RemoteRejected => "Backend rejected the request",
            Self::NetworkFailure => "Backend unreachable",
            Self::DecodeFailed => "Backend response could not be decoded",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotAuthenticated => {
                Some("Set DOCKET_TOKEN or add `token` under [auth] in the config file.")
            }
            Self::ConfigParseError => Some("Fix syntax in the docket config.toml and retry."),
            Self::IndexOutOfRange | Self::GestureMismatch => {
                Some("Refresh the board; it may be out of date.")
            }
            Self::ItemInFlight => Some("Wait for the previous move to settle and retry."),
            Self::ItemNotFound => None,
            Self::InvalidEnumValue => Some(
                "Use open|in-progress|closed for status and low|medium|high for priority.",
            ),
            Self::RemoteRejected => Some("Check permissions on the project and the ticket id."),
            Self::NetworkFailure => Some("Check the api base_url and network connectivity."),
            Self::DecodeFailed => Some("Check that base_url points at a docket-compatible API."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
