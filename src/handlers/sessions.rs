use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    codec,
    errors::{AppError, Result},
    models::{
        clamp_message, GenerateRequest, LocalVideoRequest, RemoteVideoRequest, ShareLink,
        UpdateWishRequest, VideoReference,
    },
    sessions::{session_not_found, SessionSnapshot, WishSession},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session))
        .route(
            "/:id",
            get(get_session).patch(update_session).delete(delete_session),
        )
        .route("/:id/video", put(set_remote_video).delete(remove_video))
        .route("/:id/video/local", post(set_local_video))
        .route("/:id/generate", post(generate_message))
        .route(
            "/:id/confetti",
            post(activate_confetti).delete(deactivate_confetti),
        )
        .route("/:id/share", get(share_session))
        .route("/:id/reset", post(reset_session))
}

/// Run an edit against a session and hand back the resulting snapshot.
fn edit(state: &AppState, id: &Uuid, f: impl FnOnce(&mut WishSession)) -> Result<Json<SessionSnapshot>> {
    state
        .sessions
        .with_session(id, |session| {
            f(session);
            session.snapshot()
        })
        .map(Json)
        .ok_or_else(|| session_not_found(id))
}

/// POST /api/sessions?to=..&msg=..&video=.. - open a session from the page's query string
pub async fn create_session(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> (StatusCode, Json<SessionSnapshot>) {
    let wish = codec::decode_from_query(query.as_deref().unwrap_or(""));
    let snapshot = state.sessions.create(wish);
    info!("💌 Session {} opened", snapshot.id);
    (StatusCode::CREATED, Json(snapshot))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>> {
    state
        .sessions
        .snapshot(&id)
        .map(Json)
        .ok_or_else(|| session_not_found(&id))
}

/// PATCH /api/sessions/:id - edit recipient and/or message
pub async fn update_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateWishRequest>,
) -> Result<Json<SessionSnapshot>> {
    edit(&state, &id, |session| {
        if let Some(recipient) = payload.recipient {
            session.wish.recipient = recipient;
        }
        if let Some(message) = payload.message {
            session.wish.message = clamp_message(&message);
        }
    })
}

/// DELETE /api/sessions/:id - tear the session down, cancelling its timers
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    if state.sessions.remove(&id) {
        info!("Session {} closed", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(session_not_found(&id))
    }
}

/// PUT /api/sessions/:id/video - use a pasted video URL
pub async fn set_remote_video(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RemoteVideoRequest>,
) -> Result<Json<SessionSnapshot>> {
    payload.validate()?;
    let video = VideoReference::from_source(&payload.url).ok_or_else(|| {
        AppError::BadRequest("Only http(s) video URLs can be used".to_string())
    })?;

    edit(&state, &id, |session| session.wish.video = Some(video))
}

/// POST /api/sessions/:id/video/local - register a picked or dropped file
pub async fn set_local_video(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LocalVideoRequest>,
) -> Result<Json<SessionSnapshot>> {
    payload.validate()?;
    if !payload.content_type.starts_with("video/") {
        return Err(AppError::BadRequest(format!(
            "Unsupported content type: {}",
            payload.content_type
        )));
    }

    let video = VideoReference::local(payload.file_name);
    edit(&state, &id, |session| session.wish.video = Some(video))
}

pub async fn remove_video(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>> {
    edit(&state, &id, |session| session.wish.video = None)
}

/// POST /api/sessions/:id/generate - AI message in the requested tone
///
/// Only one generation per session runs at a time; a second request while
/// one is in flight gets `409`. On completion the message is replaced and
/// the confetti goes off.
pub async fn generate_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<GenerateRequest>,
) -> Result<Json<SessionSnapshot>> {
    let ticket = state.sessions.begin_generation(&id)?;

    if state.limiter.check().is_err() {
        warn!("Generation rate limit reached, rejecting request for session {}", id);
        return Err(AppError::TooManyRequests(
            "Too many messages requested, try again in a moment".to_string(),
        ));
    }

    info!("✨ Generating {} message for session {}", payload.tone, id);
    let message = state.generator.generate(&ticket.recipient, payload.tone).await;

    ticket
        .finish(message)
        .map(Json)
        .ok_or_else(|| session_not_found(&id))
}

pub async fn activate_confetti(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>> {
    edit(&state, &id, |session| session.confetti.activate())
}

pub async fn deactivate_confetti(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>> {
    edit(&state, &id, |session| session.confetti.deactivate())
}

/// GET /api/sessions/:id/share - link and share-sheet payload for the current wish
pub async fn share_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ShareLink>> {
    let wish = state
        .sessions
        .with_session(&id, |session| session.wish.clone())
        .ok_or_else(|| session_not_found(&id))?;

    Ok(Json(ShareLink::build(
        &state.config.public_origin,
        &state.config.share_path,
        &wish,
    )))
}

/// POST /api/sessions/:id/reset - "Start over"
pub async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>> {
    edit(&state, &id, |session| session.wish.reset())
}
