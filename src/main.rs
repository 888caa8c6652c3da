use axum::{Router, extract::FromRef};
use reqwest::Client;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    auth::jwt::JwtSecret,
    config::Settings,
    handlers::{matches, players, tournaments},
    notifier::Notifier,
};

mod auth;
mod config;
mod engine;
mod errors;
mod handlers;
mod models;
mod notifier;
mod payloads;
mod repositories;
mod responses;
mod services;

#[derive(Clone)]
struct AppState {
    pool: SqlitePool,
    notifier: Notifier,
    jwt_secret: JwtSecret,
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(input: &AppState) -> Self {
        input.pool.clone()
    }
}

impl FromRef<AppState> for Notifier {
    fn from_ref(input: &AppState) -> Self {
        input.notifier.clone()
    }
}

impl FromRef<AppState> for JwtSecret {
    fn from_ref(input: &AppState) -> Self {
        input.jwt_secret.clone()
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "tt_tournaments=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    let pool = SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(&settings.database_url)
        .await
        .unwrap();
    sqlx::migrate!().run(&pool).await.unwrap();
    let client = Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap();
    let notifier = Notifier::new(client, settings.notify_webhook_url.clone());
    if notifier.is_enabled() {
        tracing::info!("webhook notifications enabled");
    }
    let state = AppState {
        pool,
        notifier,
        jwt_secret: JwtSecret::new(&settings.jwt_secret),
    };
    let listener = TcpListener::bind(settings.bind_addr).await.unwrap();
    tracing::info!("listening on {}", settings.bind_addr);
    let app = Router::new()
        .nest("/players", players::routes(state.clone()))
        .nest("/tournaments", tournaments::routes(state.clone()))
        .nest("/matches", matches::routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive());
    axum::serve(listener, app).await.unwrap();
}
