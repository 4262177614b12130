use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::bearer::{BearerError, BearerSigner};
use super::domain::{Account, AccountView, EmailAddress};
use super::password::verify_password;
use super::repository::{AccountRepository, AccountRepositoryError};

/// Failure-count threshold and soft-ban window applied to bad logins.
#[derive(Debug, Clone, Copy)]
pub struct LockoutPolicy {
    pub max_failures: u32,
    pub lock_duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_failures: 5,
            lock_duration: Duration::minutes(15),
        }
    }
}

/// Signed bearer token plus the sanitized account snapshot it was issued for.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub account: AccountView,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("account temporarily locked, retry in {retry_after_seconds}s")]
    AccountLocked { retry_after_seconds: i64 },
    #[error(transparent)]
    Repository(#[from] AccountRepositoryError),
    #[error(transparent)]
    Bearer(#[from] BearerError),
}

/// Issues sessions against the credential store, enforcing the lockout
/// policy on the way in.
pub struct SessionIssuer<R> {
    repository: Arc<R>,
    signer: Arc<BearerSigner>,
    policy: LockoutPolicy,
}

impl<R> SessionIssuer<R>
where
    R: AccountRepository + 'static,
{
    pub fn new(repository: Arc<R>, signer: Arc<BearerSigner>, policy: LockoutPolicy) -> Self {
        Self {
            repository,
            signer,
            policy,
        }
    }

    /// Unknown addresses, unverified accounts, and wrong passwords all
    /// collapse into the same `InvalidCredentials` answer.
    pub fn authenticate(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedSession, AuthError> {
        let email = match EmailAddress::parse(email) {
            Ok(email) => email,
            Err(_) => return Err(AuthError::InvalidCredentials),
        };

        let Some(mut account) = self.repository.find_by_email(&email)? else {
            return Err(AuthError::InvalidCredentials);
        };

        if let Some(remaining) = account.lock_remaining(now) {
            return Err(AuthError::AccountLocked {
                retry_after_seconds: remaining.num_seconds().max(1),
            });
        }

        if !account.email_verified || !verify_password(password, &account.password_hash) {
            self.record_failure(&mut account, now)?;
            return Err(AuthError::InvalidCredentials);
        }

        account.failed_attempts = 0;
        account.lock_until = None;
        self.repository.update(account.clone())?;

        let signed = self.signer.issue(&account, now)?;
        Ok(IssuedSession {
            token: signed.token,
            expires_at: signed.expires_at,
            account: account.view(),
        })
    }

    fn record_failure(&self, account: &mut Account, now: DateTime<Utc>) -> Result<(), AuthError> {
        account.failed_attempts += 1;
        if account.failed_attempts >= self.policy.max_failures {
            // The lock window replaces the counter; failures after it
            // elapses start a fresh count.
            account.failed_attempts = 0;
            account.lock_until = Some(now + self.policy.lock_duration);
            tracing::warn!(account_id = %account.id, "login failure threshold reached, locking account");
        }
        self.repository.update(account.clone())?;
        Ok(())
    }
}
