use super::common::*;
use std::sync::Arc;

use chrono::Duration;

use crate::accounts::password::{verify_password, ComplexityViolation};
use crate::accounts::tokens::{TokenFlowError, TokenLifecycle, TokenPolicy, TOKEN_LENGTH};

#[test]
fn register_hashes_the_password_and_mails_the_token() {
    let repository = Arc::new(MemoryAccounts::default());
    let mailer = Arc::new(MemoryMailer::default());
    let lifecycle = lifecycle(repository.clone(), mailer.clone());
    let now = fixed_now();

    let account = lifecycle
        .register(registration("guest@example.com"), now)
        .expect("registration succeeds");

    assert_ne!(account.password_hash, STRONG_PASSWORD);
    assert!(verify_password(STRONG_PASSWORD, &account.password_hash));
    assert!(!account.email_verified);

    let token = repository
        .verification_token_of(account.id)
        .expect("verification token stored");
    assert_eq!(token.chars().count(), TOKEN_LENGTH);

    let deliveries = mailer.deliveries();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].to, "guest@example.com");
    assert!(deliveries[0].body.contains(&token));
}

#[test]
fn duplicate_email_is_rejected() {
    let repository = Arc::new(MemoryAccounts::default());
    let mailer = Arc::new(MemoryMailer::default());
    let lifecycle = lifecycle(repository, mailer);
    let now = fixed_now();

    lifecycle
        .register(registration("guest@example.com"), now)
        .expect("first registration succeeds");
    assert!(matches!(
        lifecycle.register(registration("Guest@Example.com"), now),
        Err(TokenFlowError::DuplicateIdentity)
    ));
}

#[test]
fn weak_passwords_name_the_missing_class() {
    let repository = Arc::new(MemoryAccounts::default());
    let mailer = Arc::new(MemoryMailer::default());
    let lifecycle = lifecycle(repository, mailer);
    let now = fixed_now();

    let cases = [
        ("Ab1!", ComplexityViolation::TooShort { minimum: 8 }),
        ("lowercase1!", ComplexityViolation::MissingUppercase),
        ("UPPERCASE1!", ComplexityViolation::MissingLowercase),
        ("NoDigits!!", ComplexityViolation::MissingDigit),
        ("NoSymbol11", ComplexityViolation::MissingSymbol),
    ];

    for (password, expected) in cases {
        let mut registration = registration("guest@example.com");
        registration.password = password.to_string();
        match lifecycle.register(registration, now) {
            Err(TokenFlowError::WeakPassword(violation)) => assert_eq!(violation, expected),
            other => panic!("expected weak-password rejection, got {other:?}"),
        }
    }
}

#[test]
fn verification_is_single_use() {
    let repository = Arc::new(MemoryAccounts::default());
    let mailer = Arc::new(MemoryMailer::default());
    let lifecycle = lifecycle(repository.clone(), mailer);
    let now = fixed_now();

    let account = lifecycle
        .register(registration("guest@example.com"), now)
        .expect("registration succeeds");
    let token = repository
        .verification_token_of(account.id)
        .expect("verification token stored");

    let verified = lifecycle.verify(&token, now).expect("first redemption");
    assert!(verified.email_verified);
    assert!(repository.verification_token_of(account.id).is_none());

    assert!(matches!(
        lifecycle.verify(&token, now),
        Err(TokenFlowError::TokenInvalid)
    ));
}

#[test]
fn expired_verification_token_leaves_the_account_untouched() {
    let repository = Arc::new(MemoryAccounts::default());
    let mailer = Arc::new(MemoryMailer::default());
    let lifecycle = lifecycle(repository.clone(), mailer);
    let now = fixed_now();

    let account = lifecycle
        .register(registration("guest@example.com"), now)
        .expect("registration succeeds");
    let token = repository
        .verification_token_of(account.id)
        .expect("verification token stored");

    let later = now + Duration::hours(25);
    assert!(matches!(
        lifecycle.verify(&token, later),
        Err(TokenFlowError::TokenExpired)
    ));

    let stored = repository.stored(account.id).expect("account stored");
    assert!(!stored.email_verified);
    assert!(stored.verification_token.is_some());
}

#[test]
fn reissue_replaces_the_previous_verification_token() {
    let repository = Arc::new(MemoryAccounts::default());
    let mailer = Arc::new(MemoryMailer::default());
    let lifecycle = lifecycle(repository.clone(), mailer);
    let now = fixed_now();

    let account = lifecycle
        .register(registration("guest@example.com"), now)
        .expect("registration succeeds");
    let first = repository
        .verification_token_of(account.id)
        .expect("verification token stored");

    lifecycle
        .request_verification("guest@example.com", now)
        .expect("reissue acknowledged");
    let second = repository
        .verification_token_of(account.id)
        .expect("replacement token stored");
    assert_ne!(first, second);

    assert!(matches!(
        lifecycle.verify(&first, now),
        Err(TokenFlowError::TokenInvalid)
    ));
    assert!(lifecycle.verify(&second, now).is_ok());
}

#[test]
fn verification_requests_always_acknowledge() {
    let repository = Arc::new(MemoryAccounts::default());
    let mailer = Arc::new(MemoryMailer::default());
    let lifecycle = lifecycle(repository.clone(), mailer.clone());
    let now = fixed_now();

    let ack = lifecycle
        .request_verification("nobody@example.com", now)
        .expect("ack for unknown address");
    let malformed = lifecycle
        .request_verification("not-an-address", now)
        .expect("ack for malformed address");
    assert_eq!(ack, malformed);
    assert!(mailer.deliveries().is_empty());

    register_verified(&lifecycle, &repository, "guest@example.com", now);
    let before = mailer.deliveries().len();
    lifecycle
        .request_verification("guest@example.com", now)
        .expect("ack for verified address");
    assert_eq!(mailer.deliveries().len(), before);
}

#[test]
fn reset_flow_swaps_the_password_and_clears_lockout() {
    let repository = Arc::new(MemoryAccounts::default());
    let mailer = Arc::new(MemoryMailer::default());
    let lifecycle = lifecycle(repository.clone(), mailer);
    let issuer = issuer(repository.clone());
    let now = fixed_now();

    let account = register_verified(&lifecycle, &repository, "guest@example.com", now);

    for _ in 0..5 {
        let _ = issuer.authenticate("guest@example.com", "Wr0ng!pass", now);
    }

    lifecycle
        .request_password_reset("guest@example.com", now)
        .expect("reset request acknowledged");
    let token = repository
        .reset_token_of(account.id)
        .expect("reset token stored");

    let updated = lifecycle
        .reset_password(&token, OTHER_PASSWORD, now)
        .expect("reset succeeds");
    assert_eq!(updated.failed_attempts, 0);
    assert!(updated.lock_until.is_none());
    assert_eq!(updated.last_password_change, Some(now));

    assert!(issuer
        .authenticate("guest@example.com", OTHER_PASSWORD, now)
        .is_ok());
    assert!(matches!(
        issuer.authenticate("guest@example.com", STRONG_PASSWORD, now),
        Err(crate::accounts::session::AuthError::InvalidCredentials)
    ));
}

#[test]
fn reset_token_is_single_use_and_expires() {
    let repository = Arc::new(MemoryAccounts::default());
    let mailer = Arc::new(MemoryMailer::default());
    let lifecycle = lifecycle(repository.clone(), mailer);
    let now = fixed_now();

    let account = register_verified(&lifecycle, &repository, "guest@example.com", now);
    lifecycle
        .request_password_reset("guest@example.com", now)
        .expect("reset request acknowledged");
    let token = repository
        .reset_token_of(account.id)
        .expect("reset token stored");

    assert!(matches!(
        lifecycle.reset_password(&token, OTHER_PASSWORD, now + Duration::hours(2)),
        Err(TokenFlowError::TokenExpired)
    ));

    lifecycle
        .reset_password(&token, OTHER_PASSWORD, now + Duration::minutes(30))
        .expect("live token redeems");
    assert!(matches!(
        lifecycle.reset_password(&token, OTHER_PASSWORD, now + Duration::minutes(30)),
        Err(TokenFlowError::TokenInvalid)
    ));
}

#[test]
fn weak_replacement_password_leaves_the_token_live() {
    let repository = Arc::new(MemoryAccounts::default());
    let mailer = Arc::new(MemoryMailer::default());
    let lifecycle = lifecycle(repository.clone(), mailer);
    let now = fixed_now();

    let account = register_verified(&lifecycle, &repository, "guest@example.com", now);
    lifecycle
        .request_password_reset("guest@example.com", now)
        .expect("reset request acknowledged");
    let token = repository
        .reset_token_of(account.id)
        .expect("reset token stored");

    assert!(matches!(
        lifecycle.reset_password(&token, "weak", now),
        Err(TokenFlowError::WeakPassword(_))
    ));
    assert!(repository.reset_token_of(account.id).is_some());
}

#[test]
fn mail_failure_does_not_undo_registration() {
    let repository = Arc::new(MemoryAccounts::default());
    let lifecycle = TokenLifecycle::new(
        repository.clone(),
        Arc::new(FailingMailer),
        TokenPolicy::default(),
    );
    let now = fixed_now();

    let account = lifecycle
        .register(registration("guest@example.com"), now)
        .expect("registration survives mail failure");
    assert!(repository.verification_token_of(account.id).is_some());
}
