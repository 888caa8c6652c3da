use axum::{
    Json as AxumJson,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    engine::{
        rating::RatingUpdate,
        schedule::{MatchSpec, Schedule},
    },
    errors::AppError,
    models::{
        player::Player,
        tournament::{Match, Tournament},
    },
    services::{
        match_service::RecordedResult,
        tournament_service::{KnockoutCreated, StandingsView, TournamentDetails},
    },
};

#[derive(Debug, Serialize)]
#[serde(tag = "status")]
#[serde(rename_all = "camelCase")]
pub enum AppResponse {
    Error { error: ErrorResponse },
    Success { payload: SuccessResponse },
}

pub struct Json<T>(pub T);

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    AxumJson<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match AxumJson::<T>::from_request(req, state).await {
            Ok(json) => Ok(Json(json.0)),
            Err(rej) => match rej {
                JsonRejection::JsonDataError(_) => Err(AppError::JsonDataError),
                JsonRejection::JsonSyntaxError(e) => Err(AppError::JsonSyntaxError(e.to_string())),
                JsonRejection::MissingJsonContentType(_) => Err(AppError::MissingContentType),
                _ => Err(AppError::JsonUnknownError),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing)]
    pub status_code: StatusCode,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[serde(rename_all_fields = "camelCase")]
#[serde(tag = "type")]
pub enum SuccessResponse {
    PlayerCreated {
        id: i64,
    },
    PlayerList {
        players: Vec<Player>,
    },
    PlayerData {
        player: Player,
    },
    StatsRecalculated {
        players: Vec<Player>,
    },
    TournamentCreated {
        id: i64,
        matches: Vec<MatchSpec>,
        byes: Vec<u32>,
    },
    TournamentList {
        tournaments: Vec<Tournament>,
    },
    TournamentData {
        #[serde(flatten)]
        details: TournamentDetails,
    },
    PlayerRegistered {
        id: i64,
    },
    PaymentConfirmed {
        tournament_id: u32,
        player_id: u32,
    },
    MatchesGenerated {
        matches: Vec<MatchSpec>,
        byes: Vec<u32>,
    },
    Standings {
        #[serde(flatten)]
        view: StandingsView,
    },
    KnockoutCreated {
        players: Vec<u32>,
        bonuses: Vec<u32>,
        matches: Vec<MatchSpec>,
    },
    MatchData {
        #[serde(rename = "match")]
        data: Match,
    },
    ResultRecorded {
        #[serde(rename = "match")]
        data: Match,
        rating: Option<RatingUpdate>,
        filled: Vec<u32>,
        tournament_completed: bool,
    },
}

impl From<SuccessResponse> for AppResponse {
    fn from(value: SuccessResponse) -> Self {
        Self::Success { payload: value }
    }
}

impl From<Schedule> for AppResponse {
    fn from(value: Schedule) -> Self {
        SuccessResponse::MatchesGenerated {
            matches: value.matches,
            byes: value.byes,
        }
        .into()
    }
}

impl From<TournamentDetails> for AppResponse {
    fn from(value: TournamentDetails) -> Self {
        SuccessResponse::TournamentData { details: value }.into()
    }
}

impl From<KnockoutCreated> for AppResponse {
    fn from(value: KnockoutCreated) -> Self {
        SuccessResponse::KnockoutCreated {
            players: value.players,
            bonuses: value.bonuses,
            matches: value.schedule.matches,
        }
        .into()
    }
}

impl From<RecordedResult> for AppResponse {
    fn from(value: RecordedResult) -> Self {
        SuccessResponse::ResultRecorded {
            data: value.recorded,
            rating: value.rating,
            filled: value.filled,
            tournament_completed: value.tournament_completed,
        }
        .into()
    }
}

impl IntoResponse for AppResponse {
    fn into_response(self) -> axum::response::Response {
        match self {
            AppResponse::Error { error: e } => (e.status_code, AxumJson(e)).into_response(),
            AppResponse::Success { payload: _ } => (StatusCode::OK, AxumJson(self)).into_response(),
        }
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidAuthHeader => StatusCode::UNAUTHORIZED,
            AppError::TokenInvalid => StatusCode::UNAUTHORIZED,
            AppError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AppError::JsonUnknownError => StatusCode::BAD_REQUEST,
            AppError::MissingContentType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::JsonSyntaxError(_) => StatusCode::BAD_REQUEST,
            AppError::JsonDataError => StatusCode::BAD_REQUEST,
            AppError::EmptyPlayerName => StatusCode::BAD_REQUEST,
            AppError::EmptyTournamentName => StatusCode::BAD_REQUEST,
            AppError::InvalidFormat(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidNumberOfRounds(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidGroupCount(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidAdvanceCount(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidGroupAssignment(_) => StatusCode::BAD_REQUEST,
            AppError::NotEnoughAdvancingPlayers(_) => StatusCode::BAD_REQUEST,
            AppError::GroupStageNotComplete => StatusCode::CONFLICT,
            AppError::KnockoutAlreadyCreated => StatusCode::CONFLICT,
            AppError::FormatMismatch(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidMatchStatus(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidStatusTransition { from: _, to: _ } => StatusCode::CONFLICT,
            AppError::MatchNotReady(_) => StatusCode::CONFLICT,
            AppError::InvalidScore(_) => StatusCode::BAD_REQUEST,
            AppError::MatchNotFound(_) => StatusCode::NOT_FOUND,
            AppError::PlayerNotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateRegistration(_) => StatusCode::CONFLICT,
            AppError::RegistrationNotFound(_) => StatusCode::NOT_FOUND,
            AppError::RegistrationClosed => StatusCode::CONFLICT,
            AppError::TournamentNotFound => StatusCode::NOT_FOUND,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        if let AppError::Database(e) = &self {
            tracing::error!("database error: {:?}", e);
        }
        AppResponse::Error {
            error: ErrorResponse {
                code: self.code(),
                message: format!("{}", self),
                status_code: self.status_code(),
            },
        }
        .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        let response: AppResponse = SuccessResponse::PaymentConfirmed {
            tournament_id: 2,
            player_id: 5,
        }
        .into();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["payload"]["type"], "paymentConfirmed");
        assert_eq!(json["payload"]["playerId"], 5);
    }

    #[test]
    fn test_error_envelope() {
        let err = AppError::MatchNotReady(4);
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        let response = AppResponse::Error {
            error: ErrorResponse {
                code: err.code(),
                message: err.to_string(),
                status_code: err.status_code(),
            },
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"]["code"], "MatchNotReady");
        assert!(json["error"].get("statusCode").is_none());
    }

    #[test]
    fn test_database_errors_are_internal() {
        let err = AppError::from(sqlx::Error::PoolTimedOut);
        assert_eq!(err.code(), "DatabaseError");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_schedule_response_keeps_placeholders() {
        let schedule = crate::engine::bracket::Bracket::seeded(&[1, 2, 3]).schedule();
        let json = serde_json::to_value(AppResponse::from(schedule)).unwrap();
        let matches = json["payload"]["matches"].as_array().unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[1]["player1"]["kind"], "tbd");
        assert_eq!(matches[1]["player2"]["playerId"], 2);
    }
}
