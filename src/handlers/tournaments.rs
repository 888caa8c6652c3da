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
    payloads::{CloseRegistration, NewRegistration, NewTournament, PaymentConfirmation},
    responses::{AppResponse, Json, SuccessResponse},
    services::tournament_service,
};

async fn create_tournament(
    State(pool): State<SqlitePool>,
    Organizer(claims): Organizer,
    Json(payload): Json<NewTournament>,
) -> impl IntoResponse {
    match tournament_service::create_tournament(&pool, &claims, payload).await {
        Ok((id, schedule)) => AppResponse::Success {
            payload: SuccessResponse::TournamentCreated {
                id,
                matches: schedule.matches,
                byes: schedule.byes,
            },
        }
        .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn list_tournaments(State(pool): State<SqlitePool>) -> impl IntoResponse {
    match tournament_service::list_tournaments(&pool).await {
        Ok(tournaments) => AppResponse::Success {
            payload: SuccessResponse::TournamentList { tournaments },
        }
        .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn get_tournament(Path(id): Path<u32>, State(pool): State<SqlitePool>) -> impl IntoResponse {
    match tournament_service::read_tournament(&pool, id).await {
        Ok(details) => Into::<AppResponse>::into(details).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn register_player(
    State(pool): State<SqlitePool>,
    Path(id): Path<u32>,
    Organizer(_): Organizer,
    Json(payload): Json<NewRegistration>,
) -> impl IntoResponse {
    match tournament_service::register_player(&pool, id, payload.player_id).await {
        Ok(id) => AppResponse::Success {
            payload: SuccessResponse::PlayerRegistered { id },
        }
        .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn confirm_payment(
    State(pool): State<SqlitePool>,
    Path(id): Path<u32>,
    Organizer(_): Organizer,
    Json(payload): Json<PaymentConfirmation>,
) -> impl IntoResponse {
    match tournament_service::confirm_payment(&pool, id, payload.player_id).await {
        Ok(()) => AppResponse::Success {
            payload: SuccessResponse::PaymentConfirmed {
                tournament_id: id,
                player_id: payload.player_id,
            },
        }
        .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn close_registration(
    State(pool): State<SqlitePool>,
    Path(id): Path<u32>,
    Organizer(_): Organizer,
    Json(payload): Json<CloseRegistration>,
) -> impl IntoResponse {
    match tournament_service::close_registration(&pool, id, payload).await {
        Ok(schedule) => Into::<AppResponse>::into(schedule).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn get_standings(Path(id): Path<u32>, State(pool): State<SqlitePool>) -> impl IntoResponse {
    match tournament_service::standings(&pool, id).await {
        Ok(view) => AppResponse::Success {
            payload: SuccessResponse::Standings { view },
        }
        .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn advance_to_knockout(
    State(pool): State<SqlitePool>,
    State(notifier): State<Notifier>,
    Path(id): Path<u32>,
    Organizer(_): Organizer,
) -> impl IntoResponse {
    match tournament_service::advance_to_knockout(&pool, &notifier, id).await {
        Ok(created) => Into::<AppResponse>::into(created).into_response(),
        Err(e) => e.into_response(),
    }
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_tournaments))
        .route("/", post(create_tournament))
        .route("/{id}", get(get_tournament))
        .route("/{id}/register", post(register_player))
        .route("/{id}/payment", post(confirm_payment))
        .route("/{id}/close", post(close_registration))
        .route("/{id}/standings", get(get_standings))
        .route("/{id}/advance", post(advance_to_knockout))
        .with_state(state)
}
