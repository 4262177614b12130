//! Booking lifecycle: the reservation ledger with overlap rejection, the
//! cancellation refund table, and the host-side checkout assessment.

pub mod checkout;
pub mod domain;
pub mod refund;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use checkout::{appraise, AppraisedCheckout, CheckoutAssessment, CheckoutValidationError};
pub use domain::{
    CancellationActor, CancellationRecord, CheckoutRecord, ConditionRating, ListingId,
    Reservation, ReservationId, ReservationStatus, ReservationView, StayInterval, ValidationError,
};
pub use refund::{RefundAssessment, RefundPolicy, RefundTier};
pub use repository::{
    BookingRepositoryError, ListingDirectory, ListingDirectoryError, ReservationRepository,
};
pub use router::{booking_router, BookingRoutes};
pub use service::{BookingError, BookingService, NewReservation};
