use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use ticketgate_access::{Authenticator, SsoExchanger};
use ticketgate_server::{
    app,
    auth::{AppState, CasClient, PgUserStore},
    config::ServerConfig,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!(cas_url = %config.cas.validation_url(), "Loaded configuration");

    // Create database connection pool
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("failed to run migrations");

    let store = Arc::new(PgUserStore::new(db_pool));
    let transport = Arc::new(CasClient::new(&config.cas).expect("failed to create CAS client"));
    let codec = config
        .session
        .token_codec()
        .expect("invalid session configuration");

    let authenticator = Authenticator::new(codec, store.clone());
    let exchanger = SsoExchanger::new(
        transport,
        store,
        config.cas.password_suffix().to_string(),
    );
    let app_state = Arc::new(AppState::new(
        authenticator,
        exchanger,
        config.site_addr,
        config.session.secure_cookies,
    ));

    let app = app::router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.listen_addr);

    axum::serve(listener, app.into_make_service())
        .await
        .expect("server error");
}
