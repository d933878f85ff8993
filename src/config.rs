use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to parse {name} as boolean: {value}")]
    ParseBool { name: String, value: String },
}

/// Application configuration loaded from environment variables.
///
/// Built once at startup and passed by reference into the archiver and the
/// metadata clients; nothing re-reads the environment per call.
#[derive(Debug, Clone)]
pub struct Config {
    // Object storage (Backblaze B2)
    pub b2_key_id: String,
    pub b2_app_key: String,
    pub b2_bucket_id: String,
    pub b2_bucket_name: String,
    pub b2_api_url: String,

    // Content fetching
    pub work_dir: PathBuf,
    pub http_timeout: Duration,
    pub page_load_timeout: Duration,
    pub chrome_path: Option<String>,

    // Video extraction
    pub yt_dlp_path: String,
    pub yt_dlp_auto_install: bool,
    pub video_timeout: Duration,

    // Metadata providers (optional; lookups fail if their key is missing)
    pub github_token: Option<String>,
    pub tmdb_key: Option<String>,
    pub youtube_key: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Object storage
            b2_key_id: required_env("B2_APP_KEY_ID")?,
            b2_app_key: required_env("B2_APP_KEY")?,
            b2_bucket_id: required_env("B2_BUCKET_ID")?,
            b2_bucket_name: required_env("B2_BUCKET_NAME")?,
            b2_api_url: env_or_default("B2_API_URL", "https://api.backblazeb2.com"),

            // Content fetching
            work_dir: PathBuf::from(env_or_default("WORK_DIR", "./data/tmp")),
            http_timeout: Duration::from_secs(parse_env_u64("HTTP_TIMEOUT_SECS", 30)?),
            page_load_timeout: Duration::from_secs(parse_env_u64("PAGE_LOAD_TIMEOUT_SECS", 30)?),
            chrome_path: optional_env("CHROME_PATH"),

            // Video extraction
            yt_dlp_path: env_or_default("YT_DLP_PATH", "yt-dlp"),
            yt_dlp_auto_install: parse_env_bool("YT_DLP_AUTO_INSTALL", true)?,
            video_timeout: Duration::from_secs(parse_env_u64("VIDEO_TIMEOUT_SECS", 600)?),

            // Metadata providers
            github_token: optional_env("GITHUB_TOKEN"),
            tmdb_key: optional_env("TMDB_KEY"),
            youtube_key: optional_env("YOUTUBE_KEY"),
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("B2_APP_KEY_ID", &self.b2_key_id),
            ("B2_APP_KEY", &self.b2_app_key),
            ("B2_BUCKET_ID", &self.b2_bucket_id),
            ("B2_BUCKET_NAME", &self.b2_bucket_name),
        ] {
            if value.is_empty() {
                return Err(ConfigError::InvalidValue {
                    name: name.to_string(),
                    message: "cannot be empty".to_string(),
                });
            }
        }
        if self.http_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "HTTP_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.video_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "VIDEO_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Configuration with fake credentials for tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            b2_key_id: "test-key-id".to_string(),
            b2_app_key: "test-app-key".to_string(),
            b2_bucket_id: "test-bucket-id".to_string(),
            b2_bucket_name: "test-bucket".to_string(),
            b2_api_url: "https://api.backblazeb2.invalid".to_string(),
            work_dir: std::env::temp_dir().join("bookmark-archiver-tests"),
            http_timeout: Duration::from_secs(5),
            page_load_timeout: Duration::from_secs(5),
            chrome_path: None,
            yt_dlp_path: "yt-dlp".to_string(),
            yt_dlp_auto_install: false,
            video_timeout: Duration::from_secs(30),
            github_token: Some("test-github-token".to_string()),
            tmdb_key: Some("test-tmdb-key".to_string()),
            youtube_key: Some("test-youtube-key".to_string()),
        }
    }
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::ParseBool {
                name: name.to_string(),
                value: val,
            }),
        },
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_empty_credentials() {
        let mut config = Config::for_testing();
        config.b2_app_key = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_testing_config() {
        assert!(Config::for_testing().validate().is_ok());
    }

    #[test]
    fn test_parse_bool_defaults() {
        assert!(parse_env_bool("NONEXISTENT_VAR", true).unwrap());
        assert!(!parse_env_bool("NONEXISTENT_VAR", false).unwrap());
    }
}
