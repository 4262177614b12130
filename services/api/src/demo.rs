use crate::infra::{
    InMemoryAccountRepository, InMemoryListingDirectory, InMemoryReservationRepository,
    TracingMailer,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::Args;
use std::sync::Arc;
use stayhub::accounts::{
    Account, AccountRole, BearerSigner, Caller, LockoutPolicy, NewRegistration, SessionIssuer,
    TokenLifecycle, TokenPolicy,
};
use stayhub::bookings::{
    BookingService, CheckoutAssessment, ConditionRating, NewReservation, RefundPolicy,
    ReservationId,
};
use stayhub::error::AppError;

const DEMO_LISTING: &str = "harbor-view-apartment";
const HOST_EMAIL: &str = "host@stayhub.demo";
const GUEST_EMAIL: &str = "guest@stayhub.demo";
const HOST_PASSWORD: &str = "Harbor!view2026";
const GUEST_PASSWORD: &str = "Travel!often2026";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Check-in date for the demo stay (YYYY-MM-DD). Defaults to 20 days out.
    #[arg(long)]
    pub(crate) check_in: Option<NaiveDate>,
    /// Simulate mail delivery failures during registration.
    #[arg(long)]
    pub(crate) mail_offline: bool,
}

struct DemoStack {
    accounts: Arc<InMemoryAccountRepository>,
    sessions: SessionIssuer<InMemoryAccountRepository>,
    tokens: TokenLifecycle<InMemoryAccountRepository, TracingMailer>,
    signer: Arc<BearerSigner>,
    listings: Arc<InMemoryListingDirectory>,
    bookings: BookingService<InMemoryReservationRepository, InMemoryListingDirectory>,
}

fn build_stack(mail_offline: bool) -> DemoStack {
    let accounts = Arc::new(InMemoryAccountRepository::default());
    let mailer = Arc::new(TracingMailer {
        fail_deliveries: mail_offline,
    });
    let signer = Arc::new(BearerSigner::new("stayhub-demo-secret", Duration::days(7)));
    let listings = Arc::new(InMemoryListingDirectory::default());
    let reservations = Arc::new(InMemoryReservationRepository::default());

    DemoStack {
        accounts: accounts.clone(),
        sessions: SessionIssuer::new(accounts.clone(), signer.clone(), LockoutPolicy::default()),
        tokens: TokenLifecycle::new(accounts, mailer, TokenPolicy::default()),
        signer,
        listings: listings.clone(),
        bookings: BookingService::new(reservations, listings, RefundPolicy::default()),
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let now = Utc::now();
    let check_in = args
        .check_in
        .unwrap_or_else(|| now.date_naive() + Duration::days(20));
    let check_out = check_in + Duration::days(4);

    println!("stayhub booking lifecycle demo");
    let stack = build_stack(args.mail_offline);

    println!("\nAccount onboarding");
    let Some(host) = onboard(&stack, HOST_EMAIL, HOST_PASSWORD, AccountRole::Host, now) else {
        return Ok(());
    };
    let Some(_guest) = onboard(&stack, GUEST_EMAIL, GUEST_PASSWORD, AccountRole::Guest, now)
    else {
        return Ok(());
    };

    stack.listings.seed(DEMO_LISTING, host.id);
    println!("- Listing '{DEMO_LISTING}' registered to {HOST_EMAIL}");

    let Some(guest_caller) = sign_in(&stack, GUEST_EMAIL, GUEST_PASSWORD, now) else {
        return Ok(());
    };
    let Some(host_caller) = sign_in(&stack, HOST_EMAIL, HOST_PASSWORD, now) else {
        return Ok(());
    };

    println!("\nBooking lifecycle ({check_in} -> {check_out})");
    let reservation = match stack.bookings.request(
        &guest_caller,
        NewReservation {
            listing_id: DEMO_LISTING.to_string(),
            check_in,
            check_out,
            total_amount: 1000,
            deposit_amount: 200,
        },
        now,
    ) {
        Ok(reservation) => reservation,
        Err(err) => {
            println!("  Booking request rejected: {err}");
            return Ok(());
        }
    };
    println!(
        "- Requested reservation {} ({} nights, total 1000, deposit 200)",
        reservation.id,
        reservation.stay.nights()
    );

    let rival = NewReservation {
        listing_id: DEMO_LISTING.to_string(),
        check_in: check_in + Duration::days(1),
        check_out: check_out + Duration::days(1),
        total_amount: 900,
        deposit_amount: 150,
    };
    match stack.bookings.request(&guest_caller, rival, now) {
        Ok(_) => println!("- Unexpected: overlapping request was accepted"),
        Err(err) => println!("- Overlapping request refused: {err}"),
    }

    if let Err(err) = stack.bookings.confirm(&host_caller, reservation.id, now) {
        println!("  Confirmation failed: {err}");
        return Ok(());
    }
    println!("- Host confirmed the stay");

    checkout_walkthrough(&stack, &host_caller, reservation.id, check_out);
    cancellation_walkthrough(&stack, &guest_caller, check_out, now);

    Ok(())
}

fn onboard(
    stack: &DemoStack,
    email: &str,
    password: &str,
    role: AccountRole,
    now: DateTime<Utc>,
) -> Option<Account> {
    let registered = match stack.tokens.register(
        NewRegistration {
            email: email.to_string(),
            password: password.to_string(),
            role,
        },
        now,
    ) {
        Ok(account) => account,
        Err(err) => {
            println!("  Registration for {email} failed: {err}");
            return None;
        }
    };

    let Some(token) = registered
        .verification_token
        .as_ref()
        .map(|stored| stored.value.clone())
    else {
        println!("  No verification token stored for {email}");
        return None;
    };

    match stack.tokens.verify(&token, now) {
        Ok(account) => {
            println!("- {} registered and verified ({})", email, role.label());
            Some(account)
        }
        Err(err) => {
            println!("  Verification for {email} failed: {err}");
            None
        }
    }
}

fn sign_in(
    stack: &DemoStack,
    email: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Option<Caller> {
    let session = match stack.sessions.authenticate(email, password, now) {
        Ok(session) => session,
        Err(err) => {
            println!("  Login for {email} failed: {err}");
            return None;
        }
    };
    println!(
        "- {} signed in, session valid until {}",
        email,
        session.expires_at.format("%Y-%m-%d %H:%M UTC")
    );

    match stack.signer.verify(&session.token, now) {
        Ok(caller) => Some(caller),
        Err(err) => {
            println!("  Bearer verification for {email} failed: {err}");
            None
        }
    }
}

fn checkout_walkthrough(
    stack: &DemoStack,
    host_caller: &Caller,
    reservation_id: ReservationId,
    check_out: NaiveDate,
) {
    println!("\nCheckout, one day after the stay ends");
    let after_stay = (check_out + Duration::days(1))
        .and_hms_opt(10, 0, 0)
        .map(|naive| naive.and_utc());
    let Some(after_stay) = after_stay else {
        println!("  Could not build the post-stay instant");
        return;
    };

    let report = CheckoutAssessment {
        condition: ConditionRating::Good,
        damages_reported: false,
        damage_description: None,
        notes: Some("keys returned to the lockbox".to_string()),
    };
    match stack
        .bookings
        .confirm_checkout(host_caller, reservation_id, report, after_stay)
    {
        Ok(reservation) => println!(
            "- Stay completed, deposit refunded: {}",
            reservation.deposit_refunded
        ),
        Err(err) => println!("  Checkout failed: {err}"),
    }
}

fn cancellation_walkthrough(
    stack: &DemoStack,
    guest_caller: &Caller,
    previous_check_out: NaiveDate,
    now: DateTime<Utc>,
) {
    println!("\nCancellation with refund");
    let check_in = previous_check_out + Duration::days(40);
    let reservation = match stack.bookings.request(
        guest_caller,
        NewReservation {
            listing_id: DEMO_LISTING.to_string(),
            check_in,
            check_out: check_in + Duration::days(3),
            total_amount: 750,
            deposit_amount: 150,
        },
        now,
    ) {
        Ok(reservation) => reservation,
        Err(err) => {
            println!("  Second booking request rejected: {err}");
            return;
        }
    };
    println!("- Requested a later stay starting {check_in}");

    match stack.bookings.cancel(guest_caller, reservation.id, now) {
        Ok(cancelled) => match cancelled.cancellation {
            Some(record) => println!(
                "- Cancelled by {}: tier {}, refund {}",
                record.cancelled_by.label(),
                record.policy_tier,
                record.refund_amount
            ),
            None => println!("- Cancelled, but no refund record attached"),
        },
        Err(err) => println!("  Cancellation failed: {err}"),
    }
}
