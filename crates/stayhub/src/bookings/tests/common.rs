use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::accounts::bearer::Caller;
use crate::accounts::domain::{AccountId, AccountRole};
use crate::bookings::domain::{ListingId, Reservation, ReservationId, StayInterval};
use crate::bookings::refund::RefundPolicy;
use crate::bookings::repository::{
    BookingRepositoryError, ListingDirectory, ListingDirectoryError, ReservationRepository,
};
use crate::bookings::service::{BookingService, NewReservation};

pub(super) const LISTING: &str = "seaside-loft";
pub(super) const OTHER_LISTING: &str = "garden-cabin";

pub(super) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
        .single()
        .expect("valid instant")
}

pub(super) fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn stay(check_in: NaiveDate, check_out: NaiveDate) -> StayInterval {
    StayInterval::new(check_in, check_out).expect("valid interval")
}

pub(super) fn caller(account_id: AccountId, role: AccountRole) -> Caller {
    Caller {
        account_id,
        email: format!("{account_id}@example.com"),
        role,
    }
}

pub(super) fn guest_caller() -> Caller {
    caller(AccountId::generate(), AccountRole::Guest)
}

pub(super) fn host_caller() -> Caller {
    caller(AccountId::generate(), AccountRole::Host)
}

pub(super) fn reservation_request(
    listing_id: &str,
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> NewReservation {
    NewReservation {
        listing_id: listing_id.to_string(),
        check_in,
        check_out,
        total_amount: 1000,
        deposit_amount: 200,
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryReservations {
    records: Arc<Mutex<HashMap<ReservationId, Reservation>>>,
}

impl MemoryReservations {
    pub(super) fn stored(&self, id: ReservationId) -> Option<Reservation> {
        self.records
            .lock()
            .expect("reservation mutex poisoned")
            .get(&id)
            .cloned()
    }
}

impl ReservationRepository for MemoryReservations {
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

#[derive(Default, Clone)]
pub(super) struct StaticListings {
    owners: Arc<Mutex<HashMap<ListingId, AccountId>>>,
}

impl StaticListings {
    pub(super) fn with_owner(self, listing_id: &str, owner: AccountId) -> Self {
        self.owners
            .lock()
            .expect("listing mutex poisoned")
            .insert(ListingId(listing_id.to_string()), owner);
        self
    }
}

impl ListingDirectory for StaticListings {
    fn owner_of(
        &self,
        listing_id: &ListingId,
    ) -> Result<Option<AccountId>, ListingDirectoryError> {
        let guard = self.owners.lock().expect("listing mutex poisoned");
        Ok(guard.get(listing_id).copied())
    }
}

pub(super) struct Fixture {
    pub(super) service: BookingService<MemoryReservations, StaticListings>,
    pub(super) repository: Arc<MemoryReservations>,
    pub(super) guest: Caller,
    pub(super) host: Caller,
}

/// One listing owned by `host`, an empty ledger, and the default refund table.
pub(super) fn fixture() -> Fixture {
    let guest = guest_caller();
    let host = host_caller();
    let repository = Arc::new(MemoryReservations::default());
    let listings = Arc::new(
        StaticListings::default().with_owner(LISTING, host.account_id),
    );
    let service = BookingService::new(repository.clone(), listings, RefundPolicy::default());
    Fixture {
        service,
        repository,
        guest,
        host,
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
