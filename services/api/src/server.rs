use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryAccountRepository, InMemoryListingDirectory, InMemoryReservationRepository,
    TracingMailer,
};
use crate::routes::with_domain_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use stayhub::accounts::{
    AccountRoutes, BearerSigner, LockoutPolicy, SessionIssuer, TokenLifecycle, TokenPolicy,
};
use stayhub::bookings::{BookingRoutes, BookingService, RefundPolicy};
use stayhub::config::AppConfig;
use stayhub::error::AppError;
use stayhub::telemetry;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let signer = Arc::new(BearerSigner::new(
        &config.auth.bearer_secret,
        config.auth.session_ttl(),
    ));

    let accounts = Arc::new(InMemoryAccountRepository::default());
    let mailer = Arc::new(TracingMailer::default());
    let account_routes = Arc::new(AccountRoutes {
        sessions: SessionIssuer::new(
            accounts.clone(),
            signer.clone(),
            LockoutPolicy {
                max_failures: config.auth.lockout_max_failures,
                lock_duration: config.auth.lockout_duration(),
            },
        ),
        tokens: TokenLifecycle::new(
            accounts,
            mailer,
            TokenPolicy {
                verification_ttl: config.auth.verification_ttl(),
                reset_ttl: config.auth.reset_ttl(),
            },
        ),
    });

    let reservations = Arc::new(InMemoryReservationRepository::default());
    let listings = Arc::new(InMemoryListingDirectory::default());
    let booking_routes = Arc::new(BookingRoutes {
        service: BookingService::new(reservations, listings, RefundPolicy::default()),
        verifier: signer,
    });

    let app = with_domain_routes(account_routes, booking_routes)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "stayhub api ready");

    axum::serve(listener, app).await?;
    Ok(())
}
