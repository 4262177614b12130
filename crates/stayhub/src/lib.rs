//! Booking lifecycle and account-security core for the stayhub rental
//! marketplace.
//!
//! The crate is split into two domains: `accounts` (credential store,
//! session issuance with lockout, single-use verification and reset tokens)
//! and `bookings` (the reservation state machine, cancellation refunds, and
//! checkout assessment). Persistence and outbound mail sit behind traits so
//! services can be exercised against in-memory doubles.

pub mod accounts;
pub mod bookings;
pub mod config;
pub mod error;
pub mod telemetry;
