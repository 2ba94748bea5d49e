use serde::Deserialize;
use validator::Validate;

use super::wish::MessageTone;

/// Field edits from the form. Absent fields are left as they are.
#[derive(Debug, Deserialize)]
pub struct UpdateWishRequest {
    pub recipient: Option<String>,
    pub message: Option<String>,
}

/// "Paste URL": a video already hosted elsewhere.
#[derive(Debug, Deserialize, Validate)]
pub struct RemoteVideoRequest {
    #[validate(url)]
    pub url: String,
}

/// A file picked or dropped in the browser. Only its description reaches the
/// server; the bytes stay on the client.
#[derive(Debug, Deserialize, Validate)]
pub struct LocalVideoRequest {
    #[validate(length(min = 1, max = 255))]
    pub file_name: String,
    pub content_type: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub tone: MessageTone,
}
