//! Caller identity used to scope fetch and telemetry requests

use serde::{Deserialize, Serialize};

/// Who the SDK is syncing for
///
/// Exactly one form is sent on the wire: `userId` or `email`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Identity {
    UserId(String),
    Email(String),
}

impl Identity {
    /// Pick the variant for a raw "user id or email" string by email syntax
    pub fn classify(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if is_email(&raw) {
            Self::Email(raw)
        } else {
            Self::UserId(raw)
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::UserId(s) | Self::Email(s) => s,
        }
    }

    /// Query/body field name for this identity form
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::UserId(_) => "userId",
            Self::Email(_) => "email",
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.field_name(), self.as_str())
    }
}

/// Loose email syntax check: `local@domain.tld`, no whitespace, single `@`
pub fn is_email(s: &str) -> bool {
    let s = s.trim();
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_email() {
        let id = Identity::classify("jane@example.com");
        assert_eq!(id, Identity::Email("jane@example.com".to_string()));
        assert_eq!(id.field_name(), "email");
    }

    #[test]
    fn test_classify_user_id() {
        let id = Identity::classify("user-42");
        assert_eq!(id, Identity::UserId("user-42".to_string()));
        assert_eq!(id.field_name(), "userId");
    }

    #[test]
    fn test_is_email_rejects_malformed() {
        assert!(!is_email("no-at-sign"));
        assert!(!is_email("@example.com"));
        assert!(!is_email("a@b"));
        assert!(!is_email("a@@b.com"));
        assert!(!is_email("a b@example.com"));
        assert!(!is_email("a@.com"));
        assert!(is_email("first.last+tag@sub.example.io"));
    }
}
