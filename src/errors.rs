use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("The authenticaton header is missing or invalid")]
    InvalidAuthHeader,
    #[error("The provided jwt is invalid or has expired, please reauthenticate")]
    TokenInvalid,
    #[error("Insufficient permissions to perform this action")]
    InsufficientPermissions,
    #[error("Unknown JSON Error")]
    JsonUnknownError,
    #[error("Missing JSON content-type header")]
    MissingContentType,
    #[error("JSON Syntax error: {0}")]
    JsonSyntaxError(String),
    #[error("Invalid JSON data")]
    JsonDataError,
    #[error("Player name cannot be empty")]
    EmptyPlayerName,
    #[error("Tournament name cannot be empty")]
    EmptyTournamentName,
    #[error("Tournament format `{0}` is not valid, possible values are: knockout, league and groups_knockout")]
    InvalidFormat(String),
    #[error("Cannot create a league with `{0}` rounds, must be between 1 and 10")]
    InvalidNumberOfRounds(u32),
    #[error("Invalid group count `{0}`, at least one group is required")]
    InvalidGroupCount(u32),
    #[error("Invalid advance count `{0}`, at least one player per group must advance")]
    InvalidAdvanceCount(u32),
    #[error("Player `{0}` has no valid group assignment")]
    InvalidGroupAssignment(u32),
    #[error("Only {0} player(s) advanced from the group stage, at least 2 are required")]
    NotEnoughAdvancingPlayers(usize),
    #[error("Cannot advance to knockout while group matches are still open")]
    GroupStageNotComplete,
    #[error("The knockout bracket for this tournament has already been created")]
    KnockoutAlreadyCreated,
    #[error("Action is not available for `{0}` tournaments")]
    FormatMismatch(String),
    #[error("Invalid match status: `{0}`, possible values are: scheduled, in_progress, completed, pending and cancelled")]
    InvalidMatchStatus(String),
    #[error("Cannot move a match from `{from}` to `{to}`")]
    InvalidStatusTransition { from: String, to: String },
    #[error("Match `{0}` is still waiting for its players")]
    MatchNotReady(u32),
    #[error("Invalid score: {0}")]
    InvalidScore(String),
    #[error("Match with id `{0}` does not exist")]
    MatchNotFound(u32),
    #[error("Player with id `{0}` does not exist")]
    PlayerNotFound(u32),
    #[error("Player `{0}` is already registered for this tournament")]
    DuplicateRegistration(u32),
    #[error("Player `{0}` is not registered for this tournament")]
    RegistrationNotFound(u32),
    #[error("Registration for this tournament is closed")]
    RegistrationClosed,
    #[error("No tournament found with the provided id")]
    TournamentNotFound,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl AppError {
    pub fn code(&self) -> String {
        match self {
            AppError::InvalidAuthHeader => String::from("InvalidAuthHeader"),
            AppError::TokenInvalid => String::from("TokenInvalid"),
            AppError::InsufficientPermissions => String::from("InsufficientPermissions"),
            AppError::JsonUnknownError => String::from("JsonUnknownError"),
            AppError::MissingContentType => String::from("MissingContentType"),
            AppError::JsonSyntaxError(_) => String::from("JsonSyntaxError"),
            AppError::JsonDataError => String::from("JsonDataError"),
            AppError::EmptyPlayerName => String::from("EmptyPlayerName"),
            AppError::EmptyTournamentName => String::from("EmptyTournamentName"),
            AppError::InvalidFormat(_) => String::from("InvalidFormat"),
            AppError::InvalidNumberOfRounds(_) => String::from("InvalidNumberOfRounds"),
            AppError::InvalidGroupCount(_) => String::from("InvalidGroupCount"),
            AppError::InvalidAdvanceCount(_) => String::from("InvalidAdvanceCount"),
            AppError::InvalidGroupAssignment(_) => String::from("InvalidGroupAssignment"),
            AppError::NotEnoughAdvancingPlayers(_) => String::from("NotEnoughAdvancingPlayers"),
            AppError::GroupStageNotComplete => String::from("GroupStageNotComplete"),
            AppError::KnockoutAlreadyCreated => String::from("KnockoutAlreadyCreated"),
            AppError::FormatMismatch(_) => String::from("FormatMismatch"),
            AppError::InvalidMatchStatus(_) => String::from("InvalidMatchStatus"),
            AppError::InvalidStatusTransition { from: _, to: _ } => {
                String::from("InvalidStatusTransition")
            }
            AppError::MatchNotReady(_) => String::from("MatchNotReady"),
            AppError::InvalidScore(_) => String::from("InvalidScore"),
            AppError::MatchNotFound(_) => String::from("MatchNotFound"),
            AppError::PlayerNotFound(_) => String::from("PlayerNotFound"),
            AppError::DuplicateRegistration(_) => String::from("DuplicateRegistration"),
            AppError::RegistrationNotFound(_) => String::from("RegistrationNotFound"),
            AppError::RegistrationClosed => String::from("RegistrationClosed"),
            AppError::TournamentNotFound => String::from("TournamentNotFound"),
            AppError::Database(_) => String::from("DatabaseError"),
        }
    }
}
