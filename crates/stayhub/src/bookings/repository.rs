use crate::accounts::domain::AccountId;

use super::domain::{ListingId, Reservation, ReservationId};

/// Ledger storage abstraction.
///
/// `insert_if_vacant` is the load-bearing operation: the overlap check
/// against calendar-holding reservations for the same listing and the insert
/// must happen against one snapshot of the store (single lock, transaction,
/// or exclusion constraint). An application-level check followed by a plain
/// insert does not satisfy this contract.
pub trait ReservationRepository: Send + Sync {
    fn insert_if_vacant(
        &self,
        reservation: Reservation,
    ) -> Result<Reservation, BookingRepositoryError>;

    fn fetch(&self, id: ReservationId) -> Result<Option<Reservation>, BookingRepositoryError>;

    fn update(&self, reservation: Reservation) -> Result<(), BookingRepositoryError>;

    fn list_for_listing(
        &self,
        listing_id: &ListingId,
    ) -> Result<Vec<Reservation>, BookingRepositoryError>;

    fn list_for_guest(&self, guest: AccountId)
        -> Result<Vec<Reservation>, BookingRepositoryError>;
}

/// Error enumeration for ledger failures.
#[derive(Debug, thiserror::Error)]
pub enum BookingRepositoryError {
    #[error("the requested dates are no longer available")]
    Conflict,
    #[error("reservation not found")]
    NotFound,
    #[error("reservation store unavailable: {0}")]
    Unavailable(String),
}

/// Listing ownership lives in an external catalog; the booking core only
/// needs to resolve a listing to its owner.
pub trait ListingDirectory: Send + Sync {
    fn owner_of(&self, listing_id: &ListingId)
        -> Result<Option<AccountId>, ListingDirectoryError>;
}

/// Listing catalog lookup error.
#[derive(Debug, thiserror::Error)]
pub enum ListingDirectoryError {
    #[error("listing directory unavailable: {0}")]
    Unavailable(String),
}
