//! Shareable-link codec: wish state to and from a URL query string.
//!
//! The wire format is three optional parameters, `to`, `msg` and `video`.
//! Decoding never fails; anything missing or empty falls back to the
//! load-time defaults, each field on its own.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::HashMap;

use crate::models::{VideoReference, WishState, DEFAULT_MESSAGE, DEFAULT_RECIPIENT};

pub const PARAM_RECIPIENT: &str = "to";
pub const PARAM_MESSAGE: &str = "msg";
pub const PARAM_VIDEO: &str = "video";

/// Characters left alone by `encodeURIComponent`; everything else is escaped.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Build the initial wish state from a page query string.
pub fn decode_from_query(query: &str) -> WishState {
    let query = query.strip_prefix('?').unwrap_or(query);

    let mut params: HashMap<String, String> = HashMap::new();
    for (k, v) in url::form_urlencoded::parse(query.as_bytes()) {
        // first occurrence wins, like URLSearchParams.get
        params.entry(k.into_owned()).or_insert_with(|| v.into_owned());
    }

    let non_empty = |key: &str| -> Option<String> {
        params.get(key).filter(|v| !v.is_empty()).cloned()
    };

    WishState {
        recipient: non_empty(PARAM_RECIPIENT).unwrap_or_else(|| DEFAULT_RECIPIENT.to_string()),
        message: non_empty(PARAM_MESSAGE).unwrap_or_else(|| DEFAULT_MESSAGE.to_string()),
        video: non_empty(PARAM_VIDEO).map(|url| VideoReference::Remote { url }),
    }
}

/// Serialize a snapshot of the wish. Output order is `to`, `msg`, then `video`
/// when the video is remote. Local handles are dropped on purpose.
pub fn encode_to_query(state: &WishState) -> String {
    let mut query = format!(
        "{}={}&{}={}",
        PARAM_RECIPIENT,
        encode_component(&state.recipient),
        PARAM_MESSAGE,
        encode_component(&state.message),
    );

    if let Some(url) = state.shareable_video() {
        query.push('&');
        query.push_str(PARAM_VIDEO);
        query.push('=');
        query.push_str(&encode_component(url));
    }

    query
}

pub fn build_share_url(origin: &str, path: &str, state: &WishState) -> String {
    format!("{}{}?{}", origin, path, encode_to_query(state))
}

fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}
