use std::fmt;

use chrono::{DateTime, Utc};

use super::Coverage;

/// Session credentials returned by a successful `/auth` exchange.
///
/// The value is immutable: a new login produces a new `Credentials`.
/// Never serialized or written to disk.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
    token: String,
    coverage: Coverage,
    operator_id: Option<String>,
    authenticated_at: DateTime<Utc>,
}

impl Credentials {
    pub fn new(
        api_key: impl Into<String>,
        token: impl Into<String>,
        coverage: Coverage,
        operator_id: Option<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            token: token.into(),
            coverage,
            operator_id,
            authenticated_at: Utc::now(),
        }
    }

    /// Both the API key and the token are present. Requests are only
    /// dispatched when this holds.
    pub fn is_complete(&self) -> bool {
        !self.api_key.is_empty() && !self.token.is_empty()
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn coverage(&self) -> Coverage {
        self.coverage
    }

    pub fn operator_id(&self) -> Option<&str> {
        self.operator_id.as_deref()
    }

    pub fn authenticated_at(&self) -> DateTime<Utc> {
        self.authenticated_at
    }

    /// Minutes since login (for display)
    pub fn minutes_since_login(&self) -> i64 {
        (Utc::now() - self.authenticated_at).num_minutes().max(0)
    }
}

// Keys never go to logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("token", &"<redacted>")
            .field("coverage", &self.coverage)
            .field("operator_id", &self.operator_id)
            .field("authenticated_at", &self.authenticated_at)
            .finish()
    }
}
