use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use stayhub::accounts::{
    Account, AccountId, AccountRepository, AccountRepositoryError, EmailAddress, MailError,
    MailMessage, Mailer,
};
use stayhub::bookings::{
    BookingRepositoryError, ListingDirectory, ListingDirectoryError, ListingId, Reservation,
    ReservationId, ReservationRepository,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryAccountRepository {
    records: Arc<Mutex<HashMap<AccountId, Account>>>,
}

impl AccountRepository for InMemoryAccountRepository {
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
        Ok(guard
            .values()
            .find(|account| &account.email == email)
            .cloned())
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
pub(crate) struct InMemoryReservationRepository {
    records: Arc<Mutex<HashMap<ReservationId, Reservation>>>,
}

impl ReservationRepository for InMemoryReservationRepository {
    // Overlap check and insert happen under one lock.
    fn insert_if_vacant(
        &self,
        reservation: Reservation,
    ) -> Result<Reservation, BookingRepositoryError> {
        let mut guard = self.records.lock().expect("reservation mutex poisoned");
        let collides = guard.values().any(|existing| {
            existing.listing_id == reservation.listing_id
                && existing.holds_calendar()
                && existing.stay.overlaps(&reservation.stay)
        });
        if collides {
            return Err(BookingRepositoryError::Conflict);
        }
        guard.insert(reservation.id, reservation.clone());
        Ok(reservation)
    }

    fn fetch(&self, id: ReservationId) -> Result<Option<Reservation>, BookingRepositoryError> {
        let guard = self.records.lock().expect("reservation mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn update(&self, reservation: Reservation) -> Result<(), BookingRepositoryError> {
        let mut guard = self.records.lock().expect("reservation mutex poisoned");
        if !guard.contains_key(&reservation.id) {
            return Err(BookingRepositoryError::NotFound);
        }
        guard.insert(reservation.id, reservation);
        Ok(())
    }

    fn list_for_listing(
        &self,
        listing_id: &ListingId,
    ) -> Result<Vec<Reservation>, BookingRepositoryError> {
        let guard = self.records.lock().expect("reservation mutex poisoned");
        Ok(guard
            .values()
            .filter(|reservation| &reservation.listing_id == listing_id)
            .cloned()
            .collect())
    }

    fn list_for_guest(
        &self,
        guest: AccountId,
    ) -> Result<Vec<Reservation>, BookingRepositoryError> {
        let guard = self.records.lock().expect("reservation mutex poisoned");
        Ok(guard
            .values()
            .filter(|reservation| reservation.guest == guest)
            .cloned()
            .collect())
    }
}

/// Seedable listing catalog standing in for the marketplace inventory
/// service.
#[derive(Default, Clone)]
pub(crate) struct InMemoryListingDirectory {
    owners: Arc<Mutex<HashMap<ListingId, AccountId>>>,
}

impl InMemoryListingDirectory {
    pub(crate) fn seed(&self, listing_id: &str, owner: AccountId) {
        self.owners
            .lock()
            .expect("listing mutex poisoned")
            .insert(ListingId(listing_id.to_string()), owner);
    }
}

impl ListingDirectory for InMemoryListingDirectory {
    fn owner_of(
        &self,
        listing_id: &ListingId,
    ) -> Result<Option<AccountId>, ListingDirectoryError> {
        let guard = self.owners.lock().expect("listing mutex poisoned");
        Ok(guard.get(listing_id).copied())
    }
}

/// Mailer that logs deliveries instead of sending them. The failure switch
/// exercises the delivery-failure path in demos.
#[derive(Default, Clone)]
pub(crate) struct TracingMailer {
    pub(crate) fail_deliveries: bool,
}

impl Mailer for TracingMailer {
    fn deliver(&self, message: MailMessage) -> Result<(), MailError> {
        if self.fail_deliveries {
            return Err(MailError::Transport("delivery disabled".to_string()));
        }
        tracing::info!(to = %message.to, subject = %message.subject, "mail queued");
        tracing::debug!(body = %message.body, "mail body");
        Ok(())
    }
}
