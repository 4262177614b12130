use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::accounts::bearer::Caller;
use crate::accounts::domain::AccountId;

use super::checkout::{appraise, CheckoutAssessment, CheckoutValidationError};
use super::domain::{
    CancellationActor, CancellationRecord, ListingId, Reservation, ReservationId,
    ReservationStatus, StayInterval, ValidationError,
};
use super::refund::RefundPolicy;
use super::repository::{
    BookingRepositoryError, ListingDirectory, ListingDirectoryError, ReservationRepository,
};

/// Reservation request accepted at the API edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReservation {
    pub listing_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub total_amount: u32,
    pub deposit_amount: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("the requested dates are no longer available")]
    BookingConflict,
    #[error("not allowed to act on this reservation")]
    Forbidden,
    #[error("reservation not found")]
    NotFound,
    #[error("listing not found")]
    UnknownListing,
    #[error("reservation state does not allow this action")]
    InvalidTransition,
    #[error("the stay has not ended yet")]
    StayNotEnded,
    #[error(transparent)]
    Checkout(#[from] CheckoutValidationError),
    #[error(transparent)]
    Repository(BookingRepositoryError),
    #[error(transparent)]
    Directory(#[from] ListingDirectoryError),
}

impl From<BookingRepositoryError> for BookingError {
    fn from(value: BookingRepositoryError) -> Self {
        match value {
            BookingRepositoryError::Conflict => Self::BookingConflict,
            BookingRepositoryError::NotFound => Self::NotFound,
            other => Self::Repository(other),
        }
    }
}

/// Booking lifecycle service over the ledger and the listing catalog.
///
/// Every mutating operation resolves the reservation and checks the caller
/// against the guest or the listing owner before acting; unauthorized access
/// to an existing reservation answers `Forbidden`, never `NotFound`.
pub struct BookingService<R, L> {
    repository: Arc<R>,
    listings: Arc<L>,
    refunds: RefundPolicy,
}

impl<R, L> BookingService<R, L>
where
    R: ReservationRepository + 'static,
    L: ListingDirectory + 'static,
{
    pub fn new(repository: Arc<R>, listings: Arc<L>, refunds: RefundPolicy) -> Self {
        Self {
            repository,
            listings,
            refunds,
        }
    }

    /// Request a stay. The caller becomes the requesting guest; booking
    /// one's own listing is rejected. Overlapping dates surface as
    /// `BookingConflict` out of the ledger's conditional insert.
    pub fn request(
        &self,
        caller: &Caller,
        request: NewReservation,
        now: DateTime<Utc>,
    ) -> Result<Reservation, BookingError> {
        let listing_id = ListingId(request.listing_id.trim().to_string());
        if listing_id.0.is_empty() {
            return Err(ValidationError {
                field: "listing_id",
                reason: "must not be empty".to_string(),
            }
            .into());
        }
        let stay = StayInterval::new(request.check_in, request.check_out)?;

        let owner = self.owner_of(&listing_id)?;
        if owner == caller.account_id {
            return Err(BookingError::Forbidden);
        }

        let reservation = Reservation::new(
            listing_id,
            caller.account_id,
            stay,
            request.total_amount,
            request.deposit_amount,
            now,
        );
        let stored = self.repository.insert_if_vacant(reservation)?;
        tracing::info!(
            reservation_id = %stored.id,
            listing_id = %stored.listing_id,
            "reservation requested"
        );
        Ok(stored)
    }

    /// Owner accepts a pending request. Stays whose checkout date has
    /// already passed can no longer be confirmed.
    pub fn confirm(
        &self,
        caller: &Caller,
        id: ReservationId,
        now: DateTime<Utc>,
    ) -> Result<Reservation, BookingError> {
        let mut reservation = self.fetch_existing(id)?;
        let owner = self.owner_of(&reservation.listing_id)?;
        if caller.account_id != owner {
            return Err(BookingError::Forbidden);
        }
        if reservation.status != ReservationStatus::Pending {
            return Err(BookingError::InvalidTransition);
        }
        if now.date_naive() >= reservation.stay.check_out() {
            return Err(BookingError::InvalidTransition);
        }

        reservation.status = ReservationStatus::Confirmed;
        self.repository.update(reservation.clone())?;
        tracing::info!(reservation_id = %reservation.id, "reservation confirmed");
        Ok(reservation)
    }

    /// Cancel a reservation that has not started. The guest cancels their
    /// own request, the owner declines one against their listing; both run
    /// the refund table at `now` and land in the terminal `Cancelled` state.
    pub fn cancel(
        &self,
        caller: &Caller,
        id: ReservationId,
        now: DateTime<Utc>,
    ) -> Result<Reservation, BookingError> {
        let mut reservation = self.fetch_existing(id)?;
        let owner = self.owner_of(&reservation.listing_id)?;

        let actor = if caller.account_id == reservation.guest {
            CancellationActor::Guest
        } else if caller.account_id == owner {
            CancellationActor::Host
        } else {
            return Err(BookingError::Forbidden);
        };

        let today = now.date_naive();
        match reservation.effective_status(today) {
            ReservationStatus::Pending | ReservationStatus::Confirmed => {}
            _ => return Err(BookingError::InvalidTransition),
        }

        let assessment = self.refunds.assess(
            reservation.stay.check_in(),
            reservation.total_amount,
            reservation.deposit_amount,
            now,
        );
        reservation.cancellation = Some(CancellationRecord {
            cancelled_by: actor,
            refund_amount: assessment.refund_amount,
            policy_tier: assessment.tier,
            cancelled_at: now,
        });
        reservation.status = ReservationStatus::Cancelled;
        self.repository.update(reservation.clone())?;
        tracing::info!(
            reservation_id = %reservation.id,
            cancelled_by = actor.label(),
            refund_amount = assessment.refund_amount,
            tier = assessment.tier,
            "reservation cancelled"
        );
        Ok(reservation)
    }

    /// Owner closes out a finished stay: validates the condition report,
    /// attaches the immutable record, settles the deposit disposition, and
    /// moves the reservation to `Completed`. One-time; a second attempt
    /// fails on the status guard.
    pub fn confirm_checkout(
        &self,
        caller: &Caller,
        id: ReservationId,
        assessment: CheckoutAssessment,
        now: DateTime<Utc>,
    ) -> Result<Reservation, BookingError> {
        let mut reservation = self.fetch_existing(id)?;
        let owner = self.owner_of(&reservation.listing_id)?;
        if caller.account_id != owner {
            return Err(BookingError::Forbidden);
        }
        if reservation.status != ReservationStatus::Confirmed {
            return Err(BookingError::InvalidTransition);
        }
        if now.date_naive() < reservation.stay.check_out() {
            return Err(BookingError::StayNotEnded);
        }

        let appraised = appraise(assessment, now)?;
        reservation.deposit_refunded = appraised.deposit_refundable;
        reservation.checkout = Some(appraised.record);
        reservation.status = ReservationStatus::Completed;
        self.repository.update(reservation.clone())?;
        tracing::info!(
            reservation_id = %reservation.id,
            deposit_refunded = reservation.deposit_refunded,
            "checkout confirmed"
        );
        Ok(reservation)
    }

    /// Fetch one reservation, visible to its guest and the listing owner.
    pub fn get(&self, caller: &Caller, id: ReservationId) -> Result<Reservation, BookingError> {
        let reservation = self.fetch_existing(id)?;
        let owner = self.owner_of(&reservation.listing_id)?;
        if caller.account_id != reservation.guest && caller.account_id != owner {
            return Err(BookingError::Forbidden);
        }
        Ok(reservation)
    }

    /// All reservations the caller requested as a guest.
    pub fn list_mine(&self, caller: &Caller) -> Result<Vec<Reservation>, BookingError> {
        let mut reservations = self.repository.list_for_guest(caller.account_id)?;
        reservations.sort_by_key(|reservation| reservation.created_at);
        Ok(reservations)
    }

    /// Ledger for one listing, owner-only.
    pub fn list_for_listing(
        &self,
        caller: &Caller,
        listing_id: &ListingId,
    ) -> Result<Vec<Reservation>, BookingError> {
        let owner = self.owner_of(listing_id)?;
        if caller.account_id != owner {
            return Err(BookingError::Forbidden);
        }
        let mut reservations = self.repository.list_for_listing(listing_id)?;
        reservations.sort_by_key(|reservation| reservation.stay.check_in());
        Ok(reservations)
    }

    fn fetch_existing(&self, id: ReservationId) -> Result<Reservation, BookingError> {
        self.repository
            .fetch(id)?
            .ok_or(BookingError::NotFound)
    }

    fn owner_of(&self, listing_id: &ListingId) -> Result<AccountId, BookingError> {
        self.listings
            .owner_of(listing_id)?
            .ok_or(BookingError::UnknownListing)
    }
}
