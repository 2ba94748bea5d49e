use axum::{
    extract::{RawQuery, State},
    response::Json,
    routing::{get, post},
    Router,
};
use validator::Validate;

use crate::{
    codec,
    errors::{AppError, Result},
    models::{MessageTone, ShareLink, VideoReference, WishLinkRequest, WishState},
    AppState,
};

/// Stateless codec endpoints for clients that keep the wish themselves.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(decode_wish))
        .route("/link", post(encode_link))
        .route("/tones", get(list_tones))
}

/// GET /api/wish?to=..&msg=..&video=.. - decode a page query into a wish
pub async fn decode_wish(RawQuery(query): RawQuery) -> Json<WishState> {
    Json(codec::decode_from_query(query.as_deref().unwrap_or("")))
}

/// POST /api/wish/link - build the share link for a wish sent in the body
pub async fn encode_link(
    State(state): State<AppState>,
    Json(mut payload): Json<WishLinkRequest>,
) -> Result<Json<ShareLink>> {
    // an empty video means no video, same as in a page query
    payload.video = payload.video.filter(|video| !video.trim().is_empty());
    payload.validate()?;

    let mut wish = WishState::new(payload.recipient, payload.message);
    if let Some(source) = payload.video.as_deref() {
        let video = VideoReference::from_source(source).ok_or_else(|| {
            AppError::BadRequest("Only http(s) video URLs can be shared".to_string())
        })?;
        wish = wish.with_video(video);
    }

    Ok(Json(ShareLink::build(
        &state.config.public_origin,
        &state.config.share_path,
        &wish,
    )))
}

/// GET /api/wish/tones - the moods the AI assistant can write in
pub async fn list_tones() -> Json<[MessageTone; 4]> {
    Json(MessageTone::ALL)
}
