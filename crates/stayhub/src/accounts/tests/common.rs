use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::accounts::bearer::BearerSigner;
use crate::accounts::domain::{Account, AccountId, AccountRole, EmailAddress, NewRegistration};
use crate::accounts::repository::{
    AccountRepository, AccountRepositoryError, MailError, MailMessage, Mailer,
};
use crate::accounts::router::{account_router, AccountRoutes};
use crate::accounts::session::{LockoutPolicy, SessionIssuer};
use crate::accounts::tokens::{TokenLifecycle, TokenPolicy};

pub(super) const TEST_SECRET: &str = "stayhub-test-secret";
pub(super) const STRONG_PASSWORD: &str = "Tr4veler!now";
pub(super) const OTHER_PASSWORD: &str = "N3w!passw0rd";

pub(super) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
        .single()
        .expect("valid instant")
}

pub(super) fn signer() -> Arc<BearerSigner> {
    Arc::new(BearerSigner::new(TEST_SECRET, Duration::days(7)))
}

pub(super) fn registration(email: &str) -> NewRegistration {
    NewRegistration {
        email: email.to_string(),
        password: STRONG_PASSWORD.to_string(),
        role: AccountRole::Guest,
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryAccounts {
    records: Arc<Mutex<HashMap<AccountId, Account>>>,
}

impl MemoryAccounts {
    pub(super) fn stored(&self, id: AccountId) -> Option<Account> {
        self.records
            .lock()
            .expect("account mutex poisoned")
            .get(&id)
            .cloned()
    }

    pub(super) fn verification_token_of(&self, id: AccountId) -> Option<String> {
        self.stored(id)
            .and_then(|account| account.verification_token.map(|token| token.value))
    }

    pub(super) fn reset_token_of(&self, id: AccountId) -> Option<String> {
        self.stored(id)
            .and_then(|account| account.reset_token.map(|token| token.value))
    }
}

impl AccountRepository for MemoryAccounts {
    fn insert(&self, account: Account) -> Result<Account, AccountRepositoryError> {
        let mut guard = self.records.lock().expect("account mutex poisoned");
        if guard.values().any(|existing| existing.email == account.email) {
            return Err(AccountRepositoryError::DuplicateIdentity);
        }
        guard.insert(account.id, account.clone());
        Ok(account)
    }

    fn update(&self, account: Account) -> Result<(), AccountRepositoryError> {
        let mut guard = self.records.lock().expect("account mutex poisoned");
        if !guard.contains_key(&account.id) {
            return Err(AccountRepositoryError::NotFound);
        }
        guard.insert(account.id, account);
        Ok(())
    }

    fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Account>, AccountRepositoryError> {
        let guard = self.records.lock().expect("account mutex poisoned");
        Ok(guard.values().find(|account| &account.email == email).cloned())
    }

    fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AccountRepositoryError> {
        let guard = self.records.lock().expect("account mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn redeem_verification_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Account, AccountRepositoryError> {
        let mut guard = self.records.lock().expect("account mutex poisoned");
        let account = guard
            .values_mut()
            .find(|account| {
                account
                    .verification_token
                    .as_ref()
                    .map(|stored| stored.value == token)
                    .unwrap_or(false)
            })
            .ok_or(AccountRepositoryError::TokenInvalid)?;

        let live = account
            .verification_token
            .as_ref()
            .map(|stored| stored.is_live(now))
            .unwrap_or(false);
        if !live {
            return Err(AccountRepositoryError::TokenExpired);
        }

        account.email_verified = true;
        account.verification_token = None;
        Ok(account.clone())
    }

    fn redeem_reset_token(
        &self,
        token: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Account, AccountRepositoryError> {
        let mut guard = self.records.lock().expect("account mutex poisoned");
        let account = guard
            .values_mut()
            .find(|account| {
                account
                    .reset_token
                    .as_ref()
                    .map(|stored| stored.value == token)
                    .unwrap_or(false)
            })
            .ok_or(AccountRepositoryError::TokenInvalid)?;

        let live = account
            .reset_token
            .as_ref()
            .map(|stored| stored.is_live(now))
            .unwrap_or(false);
        if !live {
            return Err(AccountRepositoryError::TokenExpired);
        }

        account.password_hash = new_password_hash.to_string();
        account.reset_token = None;
        account.failed_attempts = 0;
        account.lock_until = None;
        account.last_password_change = Some(now);
        Ok(account.clone())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryMailer {
    deliveries: Arc<Mutex<Vec<MailMessage>>>,
}

impl MemoryMailer {
    pub(super) fn deliveries(&self) -> Vec<MailMessage> {
        self.deliveries.lock().expect("mail mutex poisoned").clone()
    }
}

impl Mailer for MemoryMailer {
    fn deliver(&self, message: MailMessage) -> Result<(), MailError> {
        self.deliveries
            .lock()
            .expect("mail mutex poisoned")
            .push(message);
        Ok(())
    }
}

pub(super) struct FailingMailer;

impl Mailer for FailingMailer {
    fn deliver(&self, _message: MailMessage) -> Result<(), MailError> {
        Err(MailError::Transport("smtp offline".to_string()))
    }
}

pub(super) fn lifecycle(
    repository: Arc<MemoryAccounts>,
    mailer: Arc<MemoryMailer>,
) -> TokenLifecycle<MemoryAccounts, MemoryMailer> {
    TokenLifecycle::new(repository, mailer, TokenPolicy::default())
}

pub(super) fn issuer(repository: Arc<MemoryAccounts>) -> SessionIssuer<MemoryAccounts> {
    SessionIssuer::new(repository, signer(), LockoutPolicy::default())
}

pub(super) fn register_verified(
    lifecycle: &TokenLifecycle<MemoryAccounts, MemoryMailer>,
    repository: &MemoryAccounts,
    email: &str,
    now: DateTime<Utc>,
) -> Account {
    let account = lifecycle
        .register(registration(email), now)
        .expect("registration succeeds");
    let token = repository
        .verification_token_of(account.id)
        .expect("verification token stored");
    lifecycle.verify(&token, now).expect("verification succeeds")
}

pub(super) fn build_gateway() -> (
    Arc<AccountRoutes<MemoryAccounts, MemoryMailer>>,
    Arc<MemoryAccounts>,
    Arc<MemoryMailer>,
) {
    let repository = Arc::new(MemoryAccounts::default());
    let mailer = Arc::new(MemoryMailer::default());
    let state = Arc::new(AccountRoutes {
        sessions: issuer(repository.clone()),
        tokens: lifecycle(repository.clone(), mailer.clone()),
    });
    (state, repository, mailer)
}

pub(super) fn gateway_router(state: Arc<AccountRoutes<MemoryAccounts, MemoryMailer>>) -> axum::Router {
    account_router(state)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
