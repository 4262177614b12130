use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier wrapper for registered accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub Uuid);

impl AccountId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Field-level rejection raised before any state is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

/// Normalized e-mail address. Construction trims, lowercases, and requires a
/// non-empty local and domain part around a single `@`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let normalized = raw.trim().to_ascii_lowercase();
        let mut parts = normalized.splitn(2, '@');
        let local = parts.next().unwrap_or_default();
        match parts.next() {
            Some(domain) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
                Ok(Self(normalized))
            }
            _ => Err(ValidationError {
                field: "email",
                reason: "expected a name@domain address".to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Capability flag distinguishing travellers from listing owners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    Guest,
    Host,
}

impl AccountRole {
    pub const fn can_host(self) -> bool {
        matches!(self, AccountRole::Host)
    }

    pub const fn label(self) -> &'static str {
        match self {
            AccountRole::Guest => "guest",
            AccountRole::Host => "host",
        }
    }
}

/// Single-use token at rest. The value is compared verbatim; expiry is
/// checked server-side at redemption time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl StoredToken {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Registration input accepted at the API edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRegistration {
    pub email: String,
    pub password: String,
    pub role: AccountRole,
}

/// Stored account record, including credential and lockout state.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    pub email: EmailAddress,
    pub password_hash: String,
    pub role: AccountRole,
    pub email_verified: bool,
    pub verification_token: Option<StoredToken>,
    pub reset_token: Option<StoredToken>,
    pub failed_attempts: u32,
    pub lock_until: Option<DateTime<Utc>>,
    pub last_password_change: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(
        email: EmailAddress,
        password_hash: String,
        role: AccountRole,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AccountId::generate(),
            email,
            password_hash,
            role,
            email_verified: false,
            verification_token: None,
            reset_token: None,
            failed_attempts: 0,
            lock_until: None,
            last_password_change: None,
            created_at,
        }
    }

    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.lock_until.map(|until| until > now).unwrap_or(false)
    }

    pub fn lock_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.lock_until
            .filter(|until| *until > now)
            .map(|until| until - now)
    }

    pub fn view(&self) -> AccountView {
        AccountView {
            id: self.id,
            email: self.email.to_string(),
            role: self.role.label(),
            email_verified: self.email_verified,
            created_at: self.created_at,
        }
    }
}

/// Sanitized representation exposed over HTTP. Never carries the password
/// hash or any live token.
#[derive(Debug, Clone, Serialize)]
pub struct AccountView {
    pub id: AccountId,
    pub email: String,
    pub role: &'static str,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}
