#[tokio::main]
async fn main() {
    use axum::{
        Router,
        routing::{get, post},
    };
    use marquee_server::{
        auth::{self, AppState, RestIdentityVerifier, RouteRules},
        config::ServerConfig,
    };
    use marquee_session_access::{SessionCodec, SessionKeyring};
    use std::sync::Arc;
    use tower_http::trace::TraceLayer;
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment; a missing session secret fails
    // here, before the server accepts any traffic.
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    let keyring = SessionKeyring::from_secret(&config.session.secret)
        .expect("invalid session secret");
    let codec = SessionCodec::new(Arc::new(keyring));

    let verifier = RestIdentityVerifier::new(config.provider.clone())
        .expect("failed to create identity provider client");

    let app_state = Arc::new(AppState::new(
        codec,
        Arc::new(verifier),
        config.session.clone(),
        RouteRules::default(),
    ));

    let app = Router::new()
        // Session routes
        .route("/api/login", post(auth::login))
        .route("/api/logout", get(auth::logout))
        .route("/api/me", get(auth::me))
        // Classify every request before it reaches a handler
        .layer(axum::middleware::from_fn_with_state(
            app_state.clone(),
            auth::route_guard,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.listen_addr);

    axum::serve(listener, app.into_make_service())
        .await
        .expect("server error");
}
