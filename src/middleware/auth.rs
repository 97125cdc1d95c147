use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use crate::{
    AppState,
    error::AppError,
    utils::{Caller, verify_token},
};

/// Verifies the bearer token and attaches the [`Caller`] to the request.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(auth) = req.headers().typed_get::<Authorization<Bearer>>() else {
        return Err(AppError::Unauthorized);
    };

    let claims = verify_token(auth.token(), &state.config).map_err(|e| {
        tracing::debug!("Rejected token: {}", e);
        AppError::Unauthorized
    })?;

    req.extensions_mut().insert(Caller::from(claims));
    Ok(next.run(req).await)
}
