//! Fetch failure taxonomy
//!
//! Every failure of the messages request is a [`FetchError`]. A subset of HTTP
//! failures mean the project can no longer use embedded messaging at all; those
//! are recognised by [`FetchError::classify`].

/// Server `msg` for a rejected API key
pub const INVALID_API_KEY_MESSAGE: &str = "Invalid API key";

/// Server `msg` for a project whose embedded messaging subscription lapsed
pub const SUBSCRIPTION_INACTIVE_MESSAGE: &str = "Subscription inactive";

/// Error returned by a [`crate::api::MessageFetcher`]
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Non-success HTTP status, with the `msg` field of the body when present
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Http { status: u16, message: Option<String> },

    /// Connection, TLS or I/O failure before a status was received
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body did not match the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// What a failed fetch means for the SDK
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InvalidApiKey,
    SubscriptionInactive,
    /// Anything else; retried implicitly by the next sync
    Other,
}

impl FailureKind {
    /// Whether listeners must be told embedded messaging is disabled
    pub fn disables_messaging(self) -> bool {
        matches!(self, Self::InvalidApiKey | Self::SubscriptionInactive)
    }
}

impl FetchError {
    /// Server-provided message, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Http { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Classify by comparing the server message case-insensitively
    ///
    /// Matching on message text is kept for compatibility with the existing
    /// server responses, which carry no dedicated error code for these cases.
    pub fn classify(&self) -> FailureKind {
        match self.server_message() {
            Some(msg) if msg.eq_ignore_ascii_case(INVALID_API_KEY_MESSAGE) => {
                FailureKind::InvalidApiKey
            }
            Some(msg) if msg.eq_ignore_ascii_case(SUBSCRIPTION_INACTIVE_MESSAGE) => {
                FailureKind::SubscriptionInactive
            }
            _ => FailureKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(message: Option<&str>) -> FetchError {
        FetchError::Http {
            status: 401,
            message: message.map(String::from),
        }
    }

    #[test]
    fn test_classify_invalid_api_key_any_case() {
        assert_eq!(http(Some("Invalid API Key")).classify(), FailureKind::InvalidApiKey);
        assert_eq!(http(Some("INVALID API KEY")).classify(), FailureKind::InvalidApiKey);
        assert_eq!(http(Some("invalid api key")).classify(), FailureKind::InvalidApiKey);
    }

    #[test]
    fn test_classify_subscription_inactive() {
        let kind = http(Some("subscription INACTIVE")).classify();
        assert_eq!(kind, FailureKind::SubscriptionInactive);
        assert!(kind.disables_messaging());
    }

    #[test]
    fn test_classify_other() {
        assert_eq!(http(Some("Rate limited")).classify(), FailureKind::Other);
        assert_eq!(http(None).classify(), FailureKind::Other);
        assert_eq!(
            FetchError::Transport("connection refused".into()).classify(),
            FailureKind::Other
        );
        assert!(!FailureKind::Other.disables_messaging());
    }

    #[test]
    fn test_partial_match_is_not_enough() {
        assert_eq!(
            http(Some("Invalid API key for project 12")).classify(),
            FailureKind::Other
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(http(Some("Invalid API key")).to_string(), "HTTP 401: Invalid API key");
        assert_eq!(http(None).to_string(), "HTTP 401: no message");
    }
}
