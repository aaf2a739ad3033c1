use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    // Discord
    pub discord_token: String,
    pub command_prefix: String,

    // Cola
    pub queue_preview_len: usize,
    pub max_playlist_size: usize,

    // Resolver
    pub ytdlp_path: String,

    // Liveness
    pub liveness_enabled: bool,
    pub liveness_addr: SocketAddr,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_lookup(|key| std::env::var(key).ok())?;

        // Validate configuration before returning
        config.validate()?;

        Ok(config)
    }

    /// Builds a configuration from an arbitrary variable source.
    ///
    /// Missing optional variables fall back to [`Config::default`]; blank
    /// values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            discord_token: get("DISCORD_TOKEN").context("DISCORD_TOKEN no está definido")?,
            command_prefix: get("COMMAND_PREFIX").unwrap_or(defaults.command_prefix),

            queue_preview_len: match get("QUEUE_PREVIEW_LEN") {
                Some(val) => val.trim().parse().context("QUEUE_PREVIEW_LEN inválido")?,
                None => defaults.queue_preview_len,
            },
            max_playlist_size: match get("MAX_PLAYLIST_SIZE") {
                Some(val) => val.trim().parse().context("MAX_PLAYLIST_SIZE inválido")?,
                None => defaults.max_playlist_size,
            },

            ytdlp_path: get("YTDLP_PATH").unwrap_or(defaults.ytdlp_path),

            liveness_enabled: match get("LIVENESS_ENABLED") {
                Some(val) => val.trim().parse().context("LIVENESS_ENABLED inválido")?,
                None => defaults.liveness_enabled,
            },
            liveness_addr: match get("LIVENESS_ADDR") {
                Some(val) => val.trim().parse().context("LIVENESS_ADDR inválido")?,
                None => defaults.liveness_addr,
            },
        })
    }

    /// Validates configuration values for correctness.
    ///
    /// # Validation Rules
    ///
    /// - Token and command prefix must not be empty
    /// - Preview length and playlist cap must be greater than 0
    pub fn validate(&self) -> Result<()> {
        if self.discord_token.trim().is_empty() {
            anyhow::bail!("Discord token must not be empty");
        }

        if self.command_prefix.trim().is_empty() || self.command_prefix.contains(char::is_whitespace) {
            anyhow::bail!("Command prefix must be a non-empty word, got: {:?}", self.command_prefix);
        }

        if self.queue_preview_len == 0 {
            anyhow::bail!("Queue preview length must be greater than 0");
        }

        if self.max_playlist_size == 0 {
            anyhow::bail!("Max playlist size must be greater than 0");
        }

        Ok(())
    }

    /// Returns a summary of the current configuration for logging.
    ///
    /// Excludes the token.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Commands: prefix '{}'\n  \
            Queue: {} shown, {} max playlist entries\n  \
            Resolver: {}\n  \
            Liveness: {} ({})",
            self.command_prefix,
            self.queue_preview_len,
            self.max_playlist_size,
            self.ytdlp_path,
            if self.liveness_enabled { "on" } else { "off" },
            self.liveness_addr,
        )
    }
}

/// Default configuration values.
///
/// Used as fallbacks when environment variables are not provided.
impl Default for Config {
    fn default() -> Self {
        Self {
            // Discord (no defaults - must be provided)
            discord_token: String::new(),
            command_prefix: "#".to_string(),

            queue_preview_len: 10,
            max_playlist_size: 100,

            ytdlp_path: "yt-dlp".to_string(),

            liveness_enabled: true,
            liveness_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_apply() {
        let config = Config::from_lookup(lookup(&[("DISCORD_TOKEN", "abc")])).unwrap();
        assert_eq!(config.command_prefix, "#");
        assert_eq!(config.queue_preview_len, 10);
        assert_eq!(config.max_playlist_size, 100);
        assert_eq!(config.liveness_addr.port(), 8080);
        assert!(config.liveness_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides_and_blank_values() {
        let config = Config::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "abc"),
            ("COMMAND_PREFIX", "!"),
            ("QUEUE_PREVIEW_LEN", " 5 "),
            ("LIVENESS_ENABLED", "false"),
            ("LIVENESS_ADDR", "127.0.0.1:9000"),
            ("YTDLP_PATH", ""),
        ]))
        .unwrap();

        assert_eq!(config.command_prefix, "!");
        assert_eq!(config.queue_preview_len, 5);
        assert!(!config.liveness_enabled);
        assert_eq!(config.liveness_addr.port(), 9000);
        assert_eq!(config.ytdlp_path, "yt-dlp");
    }

    #[test]
    fn test_missing_token_fails() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
    }

    #[test]
    fn test_invalid_number_fails() {
        let result = Config::from_lookup(lookup(&[("DISCORD_TOKEN", "abc"), ("MAX_PLAYLIST_SIZE", "many")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_zero_preview() {
        let config = Config {
            discord_token: "abc".into(),
            queue_preview_len: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_summary_hides_token() {
        let config = Config {
            discord_token: "super-secret".into(),
            ..Config::default()
        };
        assert!(!config.summary().contains("super-secret"));
    }
}
