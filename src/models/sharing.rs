use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::codec;

use super::wish::WishState;

/// What a native share sheet receives. Clients without one copy `url` instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub url: String,
}

impl SharePayload {
    pub fn for_wish(wish: &WishState, url: String) -> Self {
        Self {
            title: share_title(&wish.recipient),
            text: wish.message.clone(),
            url,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ShareLink {
    pub query: String,
    pub url: String,
    pub share: SharePayload,
}

impl ShareLink {
    pub fn build(origin: &str, path: &str, wish: &WishState) -> Self {
        let url = codec::build_share_url(origin, path, wish);
        Self {
            query: codec::encode_to_query(wish),
            share: SharePayload::for_wish(wish, url.clone()),
            url,
        }
    }
}

/// Stateless link request: a full wish in the body, no session needed.
#[derive(Debug, Deserialize, Validate)]
pub struct WishLinkRequest {
    pub recipient: String,
    pub message: String,
    #[validate(url)]
    pub video: Option<String>,
}

pub fn share_title(recipient: &str) -> String {
    format!("A Valentine Wish for {}", recipient)
}
