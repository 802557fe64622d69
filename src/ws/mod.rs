mod session;

use axum::{
    Router, debug_handler,
    extract::{Query, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(upgrade))
}

#[derive(Deserialize)]
struct ConnectQuery {
    user_id: Option<String>,
}

/// The handshake must carry a non-empty identity; anonymous connections are
/// turned away before the upgrade.
#[debug_handler(state = crate::AppState)]
async fn upgrade(
    State(state): State<AppState>,
    Query(ConnectQuery { user_id }): Query<ConnectQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(user_id) = user_id.filter(|id| !id.is_empty()) else {
        tracing::debug!("handshake without identity refused");
        return StatusCode::UNAUTHORIZED.into_response();
    };
    let Ok(user_id) = Uuid::parse_str(&user_id) else {
        tracing::debug!(%user_id, "handshake with malformed identity refused");
        return StatusCode::UNAUTHORIZED.into_response();
    };

    ws.on_upgrade(move |socket| session::run(socket, state, user_id))
}
