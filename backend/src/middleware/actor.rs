//! Acting-user middleware
//!
//! Authentication happens upstream. The gateway forwards the authenticated
//! user's id in the `X-Actor-Id` header and this middleware turns it into an
//! explicit [`Actor`] that handlers pass into every core call.

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::error::{ErrorDetail, ErrorResponse};

pub const ACTOR_HEADER: &str = "x-actor-id";

/// The user on whose behalf the request runs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Actor(pub Uuid);

/// Reject requests without a valid actor id, otherwise attach it as an extension
pub async fn actor_middleware(mut request: Request, next: Next) -> Response {
    let header = request
        .headers()
        .get(ACTOR_HEADER)
        .and_then(|h| h.to_str().ok());

    let actor = match header.map(|value| Uuid::parse_str(value.trim())) {
        Some(Ok(id)) => Actor(id),
        Some(Err(_)) => return unauthorized_response("X-Actor-Id is not a valid UUID"),
        None => return unauthorized_response("Missing X-Actor-Id header"),
    };

    request.extensions_mut().insert(actor);
    next.run(request).await
}

fn unauthorized_response(message: &str) -> Response {
    let error = ErrorResponse {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            field: Some(ACTOR_HEADER.to_string()),
        },
    };

    (StatusCode::UNAUTHORIZED, Json(error)).into_response()
}
