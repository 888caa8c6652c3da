use axum::{
    Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
};
use sqlx::SqlitePool;

use crate::{
    AppState,
    auth::extractor::Organizer,
    notifier::Notifier,
    payloads::NewPlayer,
    responses::{AppResponse, Json, SuccessResponse},
    services::player_service,
};

async fn create_player(
    State(pool): State<SqlitePool>,
    Organizer(_): Organizer,
    Json(payload): Json<NewPlayer>,
) -> impl IntoResponse {
    match player_service::create_player(&pool, payload).await {
        Ok(id) => AppResponse::Success {
            payload: SuccessResponse::PlayerCreated { id },
        }
        .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn list_players(State(pool): State<SqlitePool>) -> impl IntoResponse {
    match player_service::list_players(&pool).await {
        Ok(players) => AppResponse::Success {
            payload: SuccessResponse::PlayerList { players },
        }
        .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn get_player(Path(id): Path<u32>, State(pool): State<SqlitePool>) -> impl IntoResponse {
    match player_service::get_player(&pool, id).await {
        Ok(player) => AppResponse::Success {
            payload: SuccessResponse::PlayerData { player },
        }
        .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn recalculate_stats(
    State(pool): State<SqlitePool>,
    State(notifier): State<Notifier>,
    Organizer(claims): Organizer,
) -> impl IntoResponse {
    tracing::info!("stats recalculation requested by user {}", claims.sub);
    match player_service::recalculate_all(&pool, &notifier).await {
        Ok(players) => AppResponse::Success {
            payload: SuccessResponse::StatsRecalculated { players },
        }
        .into_response(),
        Err(e) => e.into_response(),
    }
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_players))
        .route("/", post(create_player))
        .route("/recalculate", post(recalculate_stats))
        .route("/{id}", get(get_player))
        .with_state(state)
}
