use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const DEFAULT_RECIPIENT: &str = "My Love";
pub const DEFAULT_MESSAGE: &str = "Happy Valentine's Day! You make my world infinitely brighter. 💖";

/// Message put back by "Start over"; shorter than the load-time default.
pub const RESET_MESSAGE: &str = "Happy Valentine's Day! 💘";

/// Editing cap for the message field. The codec itself never truncates.
pub const MAX_MESSAGE_CHARS: usize = 150;

/// The shareable unit: who the wish is for, what it says, and what plays behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishState {
    pub recipient: String,
    pub message: String,
    pub video: Option<VideoReference>,
}

impl Default for WishState {
    fn default() -> Self {
        Self {
            recipient: DEFAULT_RECIPIENT.to_string(),
            message: DEFAULT_MESSAGE.to_string(),
            video: None,
        }
    }
}

impl WishState {
    pub fn new(recipient: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            message: message.into(),
            video: None,
        }
    }

    pub fn with_video(mut self, video: VideoReference) -> Self {
        self.video = Some(video);
        self
    }

    /// "Start over": the load defaults for the recipient, the short reset message, no video.
    pub fn reset(&mut self) {
        self.recipient = DEFAULT_RECIPIENT.to_string();
        self.message = RESET_MESSAGE.to_string();
        self.video = None;
    }

    /// Remote video URL, if the current video can go into a link.
    pub fn shareable_video(&self) -> Option<&str> {
        match &self.video {
            Some(VideoReference::Remote { url }) => Some(url.as_str()),
            _ => None,
        }
    }

    /// Name used when the recipient field has been blanked out.
    pub fn recipient_or_default(&self) -> &str {
        if self.recipient.is_empty() {
            DEFAULT_RECIPIENT
        } else {
            &self.recipient
        }
    }
}

/// Where the background video comes from.
///
/// `Local` handles point at a file the user picked or dropped in their own
/// browser. They only make sense for the session that created them and are
/// never written into a link. `Remote` URLs are hosted elsewhere and travel
/// with the link untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VideoReference {
    Local { handle: Uuid, file_name: String },
    Remote { url: String },
}

impl VideoReference {
    /// Classify a pasted source. Only absolute http(s) URLs are accepted;
    /// the string is kept exactly as given.
    pub fn from_source(source: &str) -> Option<Self> {
        let trimmed = source.trim();
        let parsed = url::Url::parse(trimmed).ok()?;
        match parsed.scheme() {
            "http" | "https" if parsed.has_host() => Some(VideoReference::Remote {
                url: trimmed.to_string(),
            }),
            _ => None,
        }
    }

    /// Mint a handle for a file selected or dropped on the client.
    pub fn local(file_name: impl Into<String>) -> Self {
        VideoReference::Local {
            handle: Uuid::new_v4(),
            file_name: file_name.into(),
        }
    }

    #[cfg(test)]
    pub fn is_remote(&self) -> bool {
        matches!(self, VideoReference::Remote { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageTone {
    Romantic,
    Funny,
    Poetic,
    Casual,
}

impl MessageTone {
    pub const ALL: [MessageTone; 4] = [
        MessageTone::Romantic,
        MessageTone::Funny,
        MessageTone::Poetic,
        MessageTone::Casual,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageTone::Romantic => "Romantic",
            MessageTone::Funny => "Funny",
            MessageTone::Poetic => "Poetic",
            MessageTone::Casual => "Casual",
        }
    }
}

impl fmt::Display for MessageTone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clamp an edited message the way the message box does: first 150 characters.
pub fn clamp_message(message: &str) -> String {
    message.chars().take(MAX_MESSAGE_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_uses_load_defaults() {
        let state = WishState::default();
        assert_eq!(state.recipient, "My Love");
        assert_eq!(state.message, DEFAULT_MESSAGE);
        assert!(state.video.is_none());
    }

    #[test]
    fn reset_uses_short_message_and_drops_video() {
        let mut state = WishState::new("Sam", "Be mine?")
            .with_video(VideoReference::local("clip.mp4"));
        state.reset();
        assert_eq!(state.recipient, DEFAULT_RECIPIENT);
        assert_eq!(state.message, RESET_MESSAGE);
        assert!(state.video.is_none());
    }

    #[test]
    fn only_http_urls_become_remote_references() {
        let remote = VideoReference::from_source("  https://x.test/v.mp4 ").unwrap();
        assert_eq!(
            remote,
            VideoReference::Remote {
                url: "https://x.test/v.mp4".to_string()
            }
        );
        assert!(VideoReference::from_source("http://cdn.example/a.webm").is_some());
        assert!(VideoReference::from_source("blob:https://app.test/1234").is_none());
        assert!(VideoReference::from_source("ftp://x.test/v.mp4").is_none());
        assert!(VideoReference::from_source("not a url").is_none());
    }

    #[test]
    fn local_references_are_not_shareable() {
        let state = WishState::new("Sam", "hi").with_video(VideoReference::local("clip.mp4"));
        assert_eq!(state.shareable_video(), None);
        assert!(!state.video.as_ref().unwrap().is_remote());
    }

    #[test]
    fn clamp_counts_characters_not_bytes() {
        let hearts = "💖".repeat(200);
        let clamped = clamp_message(&hearts);
        assert_eq!(clamped.chars().count(), MAX_MESSAGE_CHARS);
        assert_eq!(clamp_message("short"), "short");
    }

    #[test]
    fn blank_recipient_falls_back_for_generation() {
        assert_eq!(WishState::new("", "x").recipient_or_default(), "My Love");
        assert_eq!(WishState::new("Sam", "x").recipient_or_default(), "Sam");
    }

    #[test]
    fn tone_serializes_as_display_name() {
        assert_eq!(serde_json::to_string(&MessageTone::Poetic).unwrap(), "\"Poetic\"");
        let tone: MessageTone = serde_json::from_str("\"Casual\"").unwrap();
        assert_eq!(tone, MessageTone::Casual);
        assert_eq!(MessageTone::ALL.len(), 4);
    }
}
