use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};

use crate::errors::AppError;

use super::jwt::{Claims, JwtSecret, validate_token};

#[derive(Clone)]
pub struct CurrentUser(pub Claims);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    JwtSecret: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::InvalidAuthHeader)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::InvalidAuthHeader)?;

        let secret = JwtSecret::from_ref(state);
        let claims = validate_token(token, &secret).map_err(|_| AppError::TokenInvalid)?;

        Ok(CurrentUser(claims))
    }
}

/// A caller allowed to run tournaments.
#[derive(Clone)]
pub struct Organizer(pub Claims);

impl<S> FromRequestParts<S> for Organizer
where
    S: Send + Sync,
    JwtSecret: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(claims) = CurrentUser::from_request_parts(parts, state).await?;
        if !claims.can_organize() {
            return Err(AppError::InsufficientPermissions);
        }
        Ok(Organizer(claims))
    }
}
