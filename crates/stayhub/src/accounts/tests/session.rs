use super::common::*;
use std::sync::Arc;

use chrono::Duration;

use crate::accounts::session::AuthError;

#[test]
fn verified_account_receives_a_session() {
    let repository = Arc::new(MemoryAccounts::default());
    let mailer = Arc::new(MemoryMailer::default());
    let lifecycle = lifecycle(repository.clone(), mailer);
    let issuer = issuer(repository.clone());
    let now = fixed_now();

    let account = register_verified(&lifecycle, &repository, "guest@example.com", now);

    let session = issuer
        .authenticate("guest@example.com", STRONG_PASSWORD, now)
        .expect("login succeeds");
    assert!(!session.token.is_empty());
    assert_eq!(session.expires_at, now + Duration::days(7));
    assert_eq!(session.account.id, account.id);
    assert_eq!(session.account.email, "guest@example.com");
}

#[test]
fn unknown_address_and_malformed_address_are_generic() {
    let repository = Arc::new(MemoryAccounts::default());
    let issuer = issuer(repository);
    let now = fixed_now();

    assert!(matches!(
        issuer.authenticate("nobody@example.com", STRONG_PASSWORD, now),
        Err(AuthError::InvalidCredentials)
    ));
    assert!(matches!(
        issuer.authenticate("not-an-address", STRONG_PASSWORD, now),
        Err(AuthError::InvalidCredentials)
    ));
}

#[test]
fn unverified_account_is_rejected_generically_and_counted() {
    let repository = Arc::new(MemoryAccounts::default());
    let mailer = Arc::new(MemoryMailer::default());
    let lifecycle = lifecycle(repository.clone(), mailer);
    let issuer = issuer(repository.clone());
    let now = fixed_now();

    let account = lifecycle
        .register(registration("guest@example.com"), now)
        .expect("registration succeeds");

    assert!(matches!(
        issuer.authenticate("guest@example.com", STRONG_PASSWORD, now),
        Err(AuthError::InvalidCredentials)
    ));
    let stored = repository.stored(account.id).expect("account stored");
    assert_eq!(stored.failed_attempts, 1);
}

#[test]
fn five_failures_lock_and_the_right_password_stays_out() {
    let repository = Arc::new(MemoryAccounts::default());
    let mailer = Arc::new(MemoryMailer::default());
    let lifecycle = lifecycle(repository.clone(), mailer);
    let issuer = issuer(repository.clone());
    let now = fixed_now();

    let account = register_verified(&lifecycle, &repository, "guest@example.com", now);

    for _ in 0..5 {
        assert!(matches!(
            issuer.authenticate("guest@example.com", "Wr0ng!pass", now),
            Err(AuthError::InvalidCredentials)
        ));
    }

    let stored = repository.stored(account.id).expect("account stored");
    assert_eq!(stored.lock_until, Some(now + Duration::minutes(15)));

    match issuer.authenticate("guest@example.com", STRONG_PASSWORD, now) {
        Err(AuthError::AccountLocked {
            retry_after_seconds,
        }) => {
            assert!(retry_after_seconds > 0);
            assert!(retry_after_seconds <= 15 * 60);
        }
        other => panic!("expected lockout, got {other:?}"),
    }
}

#[test]
fn lock_expires_and_success_clears_the_state() {
    let repository = Arc::new(MemoryAccounts::default());
    let mailer = Arc::new(MemoryMailer::default());
    let lifecycle = lifecycle(repository.clone(), mailer);
    let issuer = issuer(repository.clone());
    let now = fixed_now();

    let account = register_verified(&lifecycle, &repository, "guest@example.com", now);
    for _ in 0..5 {
        let _ = issuer.authenticate("guest@example.com", "Wr0ng!pass", now);
    }

    let after_window = now + Duration::minutes(16);
    let session = issuer
        .authenticate("guest@example.com", STRONG_PASSWORD, after_window)
        .expect("login succeeds after the window");
    assert_eq!(session.account.id, account.id);

    let stored = repository.stored(account.id).expect("account stored");
    assert_eq!(stored.failed_attempts, 0);
    assert!(stored.lock_until.is_none());
}

#[test]
fn success_resets_a_partial_failure_streak() {
    let repository = Arc::new(MemoryAccounts::default());
    let mailer = Arc::new(MemoryMailer::default());
    let lifecycle = lifecycle(repository.clone(), mailer);
    let issuer = issuer(repository.clone());
    let now = fixed_now();

    let account = register_verified(&lifecycle, &repository, "guest@example.com", now);
    for _ in 0..3 {
        let _ = issuer.authenticate("guest@example.com", "Wr0ng!pass", now);
    }

    issuer
        .authenticate("guest@example.com", STRONG_PASSWORD, now)
        .expect("login succeeds");

    let stored = repository.stored(account.id).expect("account stored");
    assert_eq!(stored.failed_attempts, 0);
}
