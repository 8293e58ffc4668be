use std::sync::Arc;

use axum::{Json, Router, routing::get};
use axum_extra::extract::cookie::Key;
use bouncer_access::AuthRoute;
use bouncer_server::{
    auth::{self, Bouncer, BouncerEmail, BouncerUser, HerokuOAuthClient, SignedCookieStore},
    config::ServerConfig,
    error::ServerError,
};
use serde_json::Value;
use tower_http::trace::TraceLayer;
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

    if let Err(report) = run().await {
        tracing::error!(error = %report, "Server failed");
        std::process::exit(1);
    }
}

async fn run() -> bouncer_core::Result<(), ServerError> {
    let config = ServerConfig::from_env().map_err(config_error)?;
    let gate_config = config.bouncer_config().map_err(config_error)?;
    tracing::info!(app_url = %gate_config.app_url(), "Loaded configuration");

    let key = Key::try_from(config.session.secret.as_bytes()).map_err(|e| ServerError::Config {
        details: format!("SESSION__SECRET must be at least 64 bytes: {e}"),
    })?;
    let store = SignedCookieStore::new(key)
        .with_cookie_name(&config.session.cookie_name)
        .with_secure_cookies(config.session.secure_cookies)
        .with_max_age(gate_config.session_validity());

    let provider = HerokuOAuthClient::new(&config, gate_config.route_url(AuthRoute::Callback))
        .map_err(config_error)?;

    let bouncer = Arc::new(Bouncer::new(
        gate_config,
        Arc::new(store),
        Arc::new(provider),
    ));

    let app = auth::protect(downstream(), bouncer).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| ServerError::Bind {
            addr: config.listen_addr.clone(),
            details: e.to_string(),
        })?;

    tracing::info!("listening on http://{}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Serve {
            details: e.to_string(),
        })?;

    Ok(())
}

fn config_error(e: impl std::fmt::Display) -> ServerError {
    ServerError::Config {
        details: e.to_string(),
    }
}

/// The application served behind the gate.
fn downstream() -> Router {
    Router::new()
        .route("/", get(index))
        .route("/hi", get(hi))
}

async fn index(user: Option<BouncerUser>) -> Json<Value> {
    Json(user.map_or(Value::Null, |user| Value::Object(user.attributes())))
}

async fn hi(email: Option<BouncerEmail>) -> String {
    match email {
        Some(BouncerEmail(email)) => format!("Hi, {email}"),
        None => "Hi".to_string(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
