use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Account, AccountId, EmailAddress};

/// Storage abstraction so session and token services can be exercised in
/// isolation.
///
/// The two `redeem_*` operations are conditional updates: lookup, expiry
/// check, and mutation happen against one snapshot of the store, so two
/// concurrent redemptions of the same value cannot both succeed.
pub trait AccountRepository: Send + Sync {
    /// Insert a new account. Email uniqueness is enforced here;
    /// collisions surface as [`AccountRepositoryError::DuplicateIdentity`].
    fn insert(&self, account: Account) -> Result<Account, AccountRepositoryError>;

    fn update(&self, account: Account) -> Result<(), AccountRepositoryError>;

    fn find_by_email(&self, email: &EmailAddress)
        -> Result<Option<Account>, AccountRepositoryError>;

    fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AccountRepositoryError>;

    /// Flip `email_verified` for the account holding `token` and clear the
    /// token. Unknown values are `TokenInvalid`, stale ones `TokenExpired`;
    /// neither mutates the record.
    fn redeem_verification_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Account, AccountRepositoryError>;

    /// Swap the password hash for the account holding `token`, clearing the
    /// token, the failure counter, and any active lock, and stamping
    /// `last_password_change`.
    fn redeem_reset_token(
        &self,
        token: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Account, AccountRepositoryError>;
}

/// Error enumeration for credential-store failures.
#[derive(Debug, thiserror::Error)]
pub enum AccountRepositoryError {
    #[error("an account with this email already exists")]
    DuplicateIdentity,
    #[error("account not found")]
    NotFound,
    #[error("token is not recognized")]
    TokenInvalid,
    #[error("token has expired")]
    TokenExpired,
    #[error("account store unavailable: {0}")]
    Unavailable(String),
}

/// Trait describing outbound mail delivery (SMTP or provider adapters).
/// Delivery failure never fails the flow that issued the token; callers log
/// and continue.
pub trait Mailer: Send + Sync {
    fn deliver(&self, message: MailMessage) -> Result<(), MailError>;
}

/// Simple mail payload so routes/tests can assert delivery boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mail dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail transport unavailable: {0}")]
    Transport(String),
}
