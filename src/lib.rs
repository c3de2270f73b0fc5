//! headless-blog: a blog generator backed by a headless CMS
//!
//! Posts are queried from a Prismic-style content API and rendered with
//! embedded Tera templates, either into a static `public/` directory or
//! served by a small axum server that renders unknown posts on demand.

pub mod client;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::Path;

/// Configuration file name in the site directory
pub const CONFIG_FILE: &str = "_config.yml";

/// The main blog application
#[derive(Debug, Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: std::path::PathBuf,
    /// Public (output) directory
    pub public_dir: std::path::PathBuf,
}

impl Blog {
    /// Create a new Blog instance from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join(CONFIG_FILE);

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            tracing::warn!("No {} in {:?}, using defaults", CONFIG_FILE, base_dir);
            config::SiteConfig::default()
        };
        config.apply_env();

        Ok(Self::with_config(base_dir, config))
    }

    /// Create a Blog with an explicit configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let public_dir = base_dir.join(&config.public_dir);
        Self {
            config,
            base_dir,
            public_dir,
        }
    }

    /// Content API client for this site
    pub fn client(&self) -> Result<client::PrismicClient> {
        Ok(client::PrismicClient::new(&self.config)?)
    }

    /// Generate the static site
    pub async fn generate(&self) -> Result<()> {
        commands::generate::run(self).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
