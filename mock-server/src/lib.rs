//! In-memory stand-in for the video REST API.
//!
//! Serves the `/v1` resources `video-core` talks to, with Basic auth, form
//! bodies, filtered list queries and `302` media redirects. Compositions
//! render instantly, so they are `completed` as soon as they exist. Creating
//! a room connects one participant, plus an audio and a video recording when
//! the room records on connect. Ending a room (`POST /v1/Rooms/{sid}` with
//! `Status=completed`) fires every enabled composition hook.

mod handlers;
pub mod model;

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};

pub use model::{Composition, CompositionHook, Participant, Recording, Room, ACCOUNT_SID};

/// API key the mock accepts.
pub const API_KEY_SID: &str = "SK_test";
pub const API_KEY_SECRET: &str = "secret";

/// Origin used in resource links when the real address is not known.
pub const DEFAULT_PUBLIC_URL: &str = "http://localhost:3000";

pub type Db = Arc<RwLock<model::Store>>;

#[derive(Clone)]
pub struct AppState {
    db: Db,
    public_url: Arc<str>,
    authorization: Arc<str>,
}

impl AppState {
    fn new(public_url: &str) -> Self {
        let token = STANDARD.encode(format!("{API_KEY_SID}:{API_KEY_SECRET}"));
        Self {
            db: Db::default(),
            public_url: public_url.trim_end_matches('/').into(),
            authorization: format!("Basic {token}").into(),
        }
    }

    /// Absolute URL of `path` on this server.
    fn link(&self, path: &str) -> String {
        format!("{}{path}", self.public_url)
    }
}

/// Router with links rendered against `DEFAULT_PUBLIC_URL`.
pub fn app() -> Router {
    router(AppState::new(DEFAULT_PUBLIC_URL))
}

pub fn app_at(public_url: &str) -> Router {
    router(AppState::new(public_url))
}

fn router(state: AppState) -> Router {
    use handlers::*;

    Router::new()
        .route("/v1/Compositions", get(list_compositions).post(create_composition))
        .route("/v1/Compositions/{sid}", get(get_composition).delete(delete_composition))
        .route("/v1/Compositions/{sid}/Media", get(composition_media))
        .route("/v1/CompositionHooks", get(list_hooks).post(create_hook))
        .route("/v1/CompositionHooks/{sid}", get(get_hook).post(update_hook).delete(delete_hook))
        .route("/v1/Rooms", get(list_rooms).post(create_room))
        .route("/v1/Rooms/{sid}", get(get_room).post(end_room))
        .route("/v1/Rooms/{sid}/Participants", get(list_participants))
        .route("/v1/Recordings", get(list_recordings))
        .route("/v1/Recordings/{sid}", get(get_recording))
        .route("/v1/Recordings/{sid}/Media", get(recording_media))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
}

/// Serve on `listener`, rendering links against its local address.
pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    let public_url = format!("http://{}", listener.local_addr()?);
    axum::serve(listener, app_at(&public_url)).await
}

async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if presented != Some(&*state.authorization) {
        tracing::warn!(path = %request.uri().path(), "rejected credentials");
        return Failure::new(StatusCode::UNAUTHORIZED, 20003, "Authenticate").into_response();
    }
    next.run(request).await
}

/// Error document in the service's shape.
#[derive(Debug)]
pub struct Failure {
    status: StatusCode,
    code: u32,
    message: String,
}

impl Failure {
    fn new(status: StatusCode, code: u32, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    fn bad_request(code: u32, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    fn not_found(path: &str) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            20404,
            format!("The requested resource {path} was not found"),
        )
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let body = json!({
            "code": self.code,
            "message": self.message,
            "more_info": format!("https://www.twilio.com/docs/errors/{}", self.code),
            "status": self.status.as_u16(),
        });
        (self.status, Json(body)).into_response()
    }
}
