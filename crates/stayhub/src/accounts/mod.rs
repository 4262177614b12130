//! Account security: credential store, session issuance with lockout, and
//! the single-use token lifecycle for email verification and password reset.

pub mod bearer;
pub mod domain;
pub mod password;
pub mod repository;
pub mod router;
pub mod session;
pub mod tokens;

#[cfg(test)]
mod tests;

pub use bearer::{BearerClaims, BearerError, BearerSigner, Caller, SignedBearer};
pub use domain::{
    Account, AccountId, AccountRole, AccountView, EmailAddress, NewRegistration, StoredToken,
    ValidationError,
};
pub use password::{
    hash_password, validate_complexity, verify_password, ComplexityViolation, PasswordError,
};
pub use repository::{
    AccountRepository, AccountRepositoryError, MailError, MailMessage, Mailer,
};
pub use router::{account_router, AccountRoutes};
pub use session::{AuthError, IssuedSession, LockoutPolicy, SessionIssuer};
pub use tokens::{RequestAck, TokenFlowError, TokenLifecycle, TokenPolicy};
