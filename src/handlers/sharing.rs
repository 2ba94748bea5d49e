use axum::{
    extract::{RawQuery, State},
    http::{HeaderMap, HeaderValue},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};

use crate::{
    codec,
    models::{share_title, ShareLink, WishState},
    AppState,
};

/// The page a shared link opens, mounted at the configured share path.
pub fn router(share_path: &str) -> Router<AppState> {
    Router::new().route(share_path, get(wish_page))
}

pub async fn wish_page(State(state): State<AppState>, RawQuery(query): RawQuery) -> Response {
    let wish = codec::decode_from_query(query.as_deref().unwrap_or(""));
    let link = ShareLink::build(&state.config.public_origin, &state.config.share_path, &wish);

    let html = generate_wish_html(&wish, &link.url);

    // Set proper headers for HTML response
    let mut headers = HeaderMap::new();
    headers.insert("content-type", HeaderValue::from_static("text/html; charset=utf-8"));
    (headers, Html(html)).into_response()
}

fn generate_wish_html(wish: &WishState, canonical_url: &str) -> String {
    let title = escape_html(&share_title(&wish.recipient));
    let recipient = escape_html(wish.recipient_or_default());
    let message = escape_html(&wish.message);
    let url = escape_html(canonical_url);

    let video = match wish.shareable_video() {
        Some(src) => format!(
            "<video class=\"backdrop\" src=\"{}\" autoplay loop muted playsinline></video>",
            escape_html(src)
        ),
        None => String::new(),
    };

    format!("<!DOCTYPE html>
<html lang=\"en\">
<head>
    <meta charset=\"UTF-8\">
    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">
    <title>{title}</title>

    <!-- Link preview tags -->
    <meta property=\"og:type\" content=\"website\">
    <meta property=\"og:title\" content=\"{title}\">
    <meta property=\"og:description\" content=\"{message}\">
    <meta property=\"og:url\" content=\"{url}\">
    <meta property=\"og:site_name\" content=\"Valentine Wish Maker\">
    <meta name=\"theme-color\" content=\"#ec4899\">

    <!-- Twitter Card -->
    <meta name=\"twitter:card\" content=\"summary\">
    <meta name=\"twitter:title\" content=\"{title}\">
    <meta name=\"twitter:description\" content=\"{message}\">

    <style>
        body {{
            margin: 0;
            min-height: 100vh;
            display: flex;
            align-items: center;
            justify-content: center;
            background-color: #070b14;
            color: #fff;
            font-family: Georgia, serif;
            overflow: hidden;
        }}
        .backdrop {{
            position: fixed;
            inset: 0;
            width: 100%;
            height: 100%;
            object-fit: cover;
            opacity: 0.6;
        }}
        .wish-card {{
            position: relative;
            max-width: 32rem;
            padding: 2rem;
            border-radius: 1rem;
            background: rgba(0, 0, 0, 0.35);
            border: 1px solid rgba(255, 255, 255, 0.1);
            text-align: center;
        }}
        .recipient {{
            font-size: 2.5rem;
            color: #f472b6;
            margin-bottom: 1rem;
        }}
        .message {{
            font-size: 1.25rem;
            font-style: italic;
            line-height: 1.6;
        }}
    </style>
</head>
<body>
    {video}
    <div class=\"wish-card\">
        <h1 class=\"recipient\">For {recipient}</h1>
        <p class=\"message\">&quot;{message}&quot;</p>
    </div>
</body>
</html>")
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
