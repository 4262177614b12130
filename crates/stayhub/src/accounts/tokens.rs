use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;
use serde::Serialize;

use super::domain::{
    Account, EmailAddress, NewRegistration, StoredToken, ValidationError,
};
use super::password::{hash_password, validate_complexity, ComplexityViolation, PasswordError};
use super::repository::{AccountRepository, AccountRepositoryError, MailMessage, Mailer};

pub const TOKEN_LENGTH: usize = 48;

/// TTLs for the two single-use token kinds.
#[derive(Debug, Clone, Copy)]
pub struct TokenPolicy {
    pub verification_ttl: Duration,
    pub reset_ttl: Duration,
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            verification_ttl: Duration::hours(24),
            reset_ttl: Duration::hours(1),
        }
    }
}

/// Acknowledgement returned whether or not the address is known, so the
/// endpoint cannot be used to probe for registered emails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestAck {
    pub message: &'static str,
}

impl RequestAck {
    pub(crate) fn queued() -> Self {
        Self {
            message: "if the address is registered, instructions are on their way",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenFlowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    WeakPassword(#[from] ComplexityViolation),
    #[error("an account with this email already exists")]
    DuplicateIdentity,
    #[error("token is not recognized")]
    TokenInvalid,
    #[error("token has expired")]
    TokenExpired,
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Repository(AccountRepositoryError),
}

impl From<AccountRepositoryError> for TokenFlowError {
    fn from(value: AccountRepositoryError) -> Self {
        match value {
            AccountRepositoryError::DuplicateIdentity => Self::DuplicateIdentity,
            AccountRepositoryError::TokenInvalid => Self::TokenInvalid,
            AccountRepositoryError::TokenExpired => Self::TokenExpired,
            other => Self::Repository(other),
        }
    }
}

/// Registration, email verification, and password reset, all built on
/// single-use tokens redeemed conditionally at the store.
pub struct TokenLifecycle<R, M> {
    repository: Arc<R>,
    mailer: Arc<M>,
    policy: TokenPolicy,
}

fn issue_token() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

fn verification_mail(account: &Account, token: &str) -> MailMessage {
    MailMessage {
        to: account.email.to_string(),
        subject: "Verify your stayhub email".to_string(),
        body: format!("Confirm this address with the token: {token}"),
    }
}

fn reset_mail(account: &Account, token: &str) -> MailMessage {
    MailMessage {
        to: account.email.to_string(),
        subject: "Reset your stayhub password".to_string(),
        body: format!("Choose a new password with the token: {token}"),
    }
}

impl<R, M> TokenLifecycle<R, M>
where
    R: AccountRepository + 'static,
    M: Mailer + 'static,
{
    pub fn new(repository: Arc<R>, mailer: Arc<M>, policy: TokenPolicy) -> Self {
        Self {
            repository,
            mailer,
            policy,
        }
    }

    /// Create an unverified account and send its verification token.
    /// Mail delivery failure is logged and does not undo the registration.
    pub fn register(
        &self,
        registration: NewRegistration,
        now: DateTime<Utc>,
    ) -> Result<Account, TokenFlowError> {
        let email = EmailAddress::parse(&registration.email)?;
        validate_complexity(&registration.password)?;
        let password_hash = hash_password(&registration.password)?;

        let mut account = Account::new(email, password_hash, registration.role, now);
        let token = issue_token();
        account.verification_token = Some(StoredToken {
            value: token.clone(),
            expires_at: now + self.policy.verification_ttl,
        });

        let stored = self.repository.insert(account)?;
        tracing::info!(account_id = %stored.id, role = stored.role.label(), "account registered");
        self.send_or_log(verification_mail(&stored, &token));
        Ok(stored)
    }

    /// Re-issue a verification token. The answer is the same generic ack
    /// whether the address is unknown, already verified, or freshly served.
    pub fn request_verification(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<RequestAck, TokenFlowError> {
        let Ok(email) = EmailAddress::parse(email) else {
            return Ok(RequestAck::queued());
        };

        if let Some(mut account) = self.repository.find_by_email(&email)? {
            if !account.email_verified {
                let token = issue_token();
                account.verification_token = Some(StoredToken {
                    value: token.clone(),
                    expires_at: now + self.policy.verification_ttl,
                });
                self.repository.update(account.clone())?;
                self.send_or_log(verification_mail(&account, &token));
            }
        }

        Ok(RequestAck::queued())
    }

    /// Redeem a verification token. The verified flag flips exactly once; a
    /// second redemption of the same value is `TokenInvalid`.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Account, TokenFlowError> {
        let account = self.repository.redeem_verification_token(token, now)?;
        tracing::info!(account_id = %account.id, "email verified");
        Ok(account)
    }

    /// Issue a reset token for existing accounts; generic ack regardless.
    pub fn request_password_reset(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<RequestAck, TokenFlowError> {
        let Ok(email) = EmailAddress::parse(email) else {
            return Ok(RequestAck::queued());
        };

        if let Some(mut account) = self.repository.find_by_email(&email)? {
            let token = issue_token();
            account.reset_token = Some(StoredToken {
                value: token.clone(),
                expires_at: now + self.policy.reset_ttl,
            });
            self.repository.update(account.clone())?;
            self.send_or_log(reset_mail(&account, &token));
        }

        Ok(RequestAck::queued())
    }

    /// Complexity is checked before anything is touched; the conditional
    /// redemption then swaps the hash and clears any lockout state, since a
    /// redeemed reset token is trusted proof of identity.
    pub fn reset_password(
        &self,
        token: &str,
        new_password: &str,
        now: DateTime<Utc>,
    ) -> Result<Account, TokenFlowError> {
        validate_complexity(new_password)?;
        let password_hash = hash_password(new_password)?;
        let account = self
            .repository
            .redeem_reset_token(token, &password_hash, now)?;
        tracing::info!(account_id = %account.id, "password reset completed");
        Ok(account)
    }

    fn send_or_log(&self, message: MailMessage) {
        if let Err(err) = self.mailer.deliver(message) {
            tracing::warn!(error = %err, "mail delivery failed, token remains redeemable");
        }
    }
}
