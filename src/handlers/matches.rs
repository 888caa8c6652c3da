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
    payloads::MatchResult,
    responses::{AppResponse, Json, SuccessResponse},
    services::match_service,
};

async fn get_match(Path(id): Path<u32>, State(pool): State<SqlitePool>) -> impl IntoResponse {
    match match_service::get_match(&pool, id).await {
        Ok(data) => AppResponse::Success {
            payload: SuccessResponse::MatchData { data },
        }
        .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn start_match(
    State(pool): State<SqlitePool>,
    Path(id): Path<u32>,
    Organizer(_): Organizer,
) -> impl IntoResponse {
    match match_service::start_match(&pool, id).await {
        Ok(data) => AppResponse::Success {
            payload: SuccessResponse::MatchData { data },
        }
        .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn cancel_match(
    State(pool): State<SqlitePool>,
    State(notifier): State<Notifier>,
    Path(id): Path<u32>,
    Organizer(_): Organizer,
) -> impl IntoResponse {
    match match_service::cancel_match(&pool, &notifier, id).await {
        Ok(data) => AppResponse::Success {
            payload: SuccessResponse::MatchData { data },
        }
        .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn record_result(
    State(pool): State<SqlitePool>,
    State(notifier): State<Notifier>,
    Path(id): Path<u32>,
    Organizer(_): Organizer,
    Json(payload): Json<MatchResult>,
) -> impl IntoResponse {
    match match_service::record_result(&pool, &notifier, id, payload).await {
        Ok(recorded) => Into::<AppResponse>::into(recorded).into_response(),
        Err(e) => e.into_response(),
    }
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/{id}", get(get_match))
        .route("/{id}/start", post(start_match))
        .route("/{id}/cancel", post(cancel_match))
        .route("/{id}/result", post(record_result))
        .with_state(state)
}
