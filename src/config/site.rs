//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Environment variable that overrides `access_token`
pub const ACCESS_TOKEN_ENV: &str = "PRISMIC_ACCESS_TOKEN";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub timezone: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub public_dir: String,

    // Content API
    pub api_endpoint: String,
    pub access_token: Option<String>,
    pub document_type: String,
    pub request_timeout_secs: u64,

    // Pagination
    pub page_size: usize,
    pub paths_page_size: usize,
    pub max_index_pages: usize,

    // Rendering
    pub words_per_minute: usize,
    pub trust_embed_html: bool,

    // Server
    pub fallback_ttl_secs: u64,
    pub max_fallback_entries: usize,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            description: String::new(),
            timezone: "UTC".to_string(),

            url: "http://localhost:4000".to_string(),
            root: "/".to_string(),

            public_dir: "public".to_string(),

            api_endpoint: "https://example.cdn.prismic.io/api/v2".to_string(),
            access_token: None,
            document_type: "post".to_string(),
            request_timeout_secs: 30,

            page_size: 1,
            paths_page_size: 100,
            max_index_pages: 1000,

            words_per_minute: 200,
            trust_embed_html: true,

            fallback_ttl_secs: 60,
            max_fallback_entries: 1024,
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read {:?}", path.as_ref()))?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            if !token.trim().is_empty() {
                tracing::debug!("Using access token from {}", ACCESS_TOKEN_ENV);
                self.access_token = Some(token);
            }
        }
    }

    /// Timezone used when formatting publication dates
    pub fn tz(&self) -> chrono_tz::Tz {
        match self.timezone.parse::<chrono_tz::Tz>() {
            Ok(tz) => tz,
            Err(_) => {
                tracing::warn!("Unknown timezone {:?}, falling back to UTC", self.timezone);
                chrono_tz::UTC
            }
        }
    }

    /// How long the server remembers a post it could not render
    pub fn fallback_ttl(&self) -> Duration {
        Duration::from_secs(self.fallback_ttl_secs)
    }

    /// HTTP request timeout for the content API
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.document_type, "post");
        assert_eq!(config.page_size, 1);
        assert_eq!(config.words_per_minute, 200);
        assert_eq!(config.tz(), chrono_tz::UTC);
        assert_eq!(config.fallback_ttl(), Duration::from_secs(60));
        assert_eq!(config.max_fallback_entries, 1024);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: My Blog
api_endpoint: https://my-blog.cdn.prismic.io/api/v2
page_size: 5
timezone: America/Sao_Paulo
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.api_endpoint, "https://my-blog.cdn.prismic.io/api/v2");
        assert_eq!(config.page_size, 5);
        assert_eq!(config.tz(), chrono_tz::America::Sao_Paulo);
        // Unset fields keep their defaults
        assert_eq!(config.words_per_minute, 200);
    }

    #[test]
    fn test_unknown_timezone_falls_back() {
        let config = SiteConfig {
            timezone: "Mars/Olympus".to_string(),
            ..SiteConfig::default()
        };
        assert_eq!(config.tz(), chrono_tz::UTC);
    }
}
