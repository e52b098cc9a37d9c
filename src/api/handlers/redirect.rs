//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    response::Redirect,
};

use crate::domain::entities::ShortCode;
use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its target URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Request Flow
///
/// 1. Validate the short code form
/// 2. Resolve through L1, L2 and (under the stampede guard) the store
/// 3. Return 307 Temporary Redirect
///
/// # Errors
///
/// - 400 Bad Request if the code is malformed
/// - 404 Not Found if the short code doesn't exist
/// - 503 Service Unavailable with `Retry-After` if the lock wait timed out or
///   the store failed
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Redirect, AppError> {
    let code = ShortCode::parse(code)?;

    let record = state.resolver.resolve(&code).await.into_result(&code)?;

    Ok(Redirect::temporary(&record.target_url))
}
