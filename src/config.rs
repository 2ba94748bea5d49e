use std::{path::PathBuf, str::FromStr, time::Duration};
use tracing::warn;

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";

/// Everything read from the environment at startup.
#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Scheme and host that share links point at, without a trailing slash.
    pub public_origin: String,
    /// Page path that share links open, e.g. `/`.
    pub share_path: String,
    pub gemini: GeminiSettings,
    pub generations_per_minute: u32,
    pub session_ttl: Duration,
    pub max_sessions: usize,
    pub static_dir: Option<PathBuf>,
    pub debug_mode: bool,
    pub allowed_origins: Vec<String>,
}

#[derive(Clone)]
pub struct GeminiSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let string = |key: &str, default: &str| -> String {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let port = parse_or(&lookup, "PORT", 3001u16);
        let public_origin = string("PUBLIC_ORIGIN", &format!("http://localhost:{}", port))
            .trim_end_matches('/')
            .to_string();

        let mut share_path = string("SHARE_PATH", "/");
        if !share_path.starts_with('/') {
            share_path.insert(0, '/');
        }

        let api_key = lookup("GEMINI_API_KEY")
            .or_else(|| lookup("API_KEY"))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let allowed_origins = lookup("ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec![public_origin.clone()]);

        Config {
            host: string("HOST", "127.0.0.1"),
            port,
            share_path,
            gemini: GeminiSettings {
                api_key,
                model: string("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
                base_url: string("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
                timeout: Duration::from_secs(parse_or(&lookup, "GENERATION_TIMEOUT_SECS", 15)),
            },
            generations_per_minute: parse_or(&lookup, "GENERATIONS_PER_MINUTE", 30u32).max(1),
            session_ttl: Duration::from_secs(parse_or(&lookup, "SESSION_TTL_SECS", 3600)),
            max_sessions: parse_or(&lookup, "MAX_SESSIONS", 1000usize).max(1),
            static_dir: lookup("STATIC_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            debug_mode: lookup("DEBUG_MODE").unwrap_or_default() == "true",
            allowed_origins,
            public_origin,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("⚠️ Invalid {}={:?}, using default {}", key, raw, default);
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let cfg = config(&[]);
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 3001);
        assert_eq!(cfg.public_origin, "http://localhost:3001");
        assert_eq!(cfg.share_path, "/");
        assert!(cfg.gemini.api_key.is_none());
        assert_eq!(cfg.gemini.model, "gemini-3-flash-preview");
        assert_eq!(cfg.gemini.timeout, Duration::from_secs(15));
        assert_eq!(cfg.generations_per_minute, 30);
        assert_eq!(cfg.session_ttl, Duration::from_secs(3600));
        assert_eq!(cfg.max_sessions, 1000);
        assert!(cfg.static_dir.is_none());
        assert!(!cfg.debug_mode);
        assert_eq!(cfg.allowed_origins, vec!["http://localhost:3001".to_string()]);
    }

    #[test]
    fn reads_overrides() {
        let cfg = config(&[
            ("PORT", "8080"),
            ("PUBLIC_ORIGIN", "https://wish.example/"),
            ("SHARE_PATH", "wish"),
            ("API_KEY", "abc"),
            ("ALLOWED_ORIGINS", "https://a.test, https://b.test,"),
            ("DEBUG_MODE", "true"),
            ("STATIC_DIR", "dist"),
        ]);
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.public_origin, "https://wish.example");
        assert_eq!(cfg.share_path, "/wish");
        assert_eq!(cfg.gemini.api_key.as_deref(), Some("abc"));
        assert_eq!(cfg.allowed_origins, vec!["https://a.test", "https://b.test"]);
        assert!(cfg.debug_mode);
        assert_eq!(cfg.static_dir, Some(PathBuf::from("dist")));
    }

    #[test]
    fn gemini_key_takes_precedence() {
        let cfg = config(&[("API_KEY", "old"), ("GEMINI_API_KEY", "new")]);
        assert_eq!(cfg.gemini.api_key.as_deref(), Some("new"));
    }

    #[test]
    fn invalid_numbers_fall_back() {
        let cfg = config(&[("PORT", "not-a-port"), ("GENERATIONS_PER_MINUTE", "0")]);
        assert_eq!(cfg.port, 3001);
        assert_eq!(cfg.generations_per_minute, 1);
    }
}
