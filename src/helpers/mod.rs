//! Helper functions shared by the generator, templates and server

mod date;
mod html;
mod url;

pub use date::*;
pub use html::*;
pub use url::*;

use chrono::{DateTime, Utc};

use crate::config::SiteConfig;

/// Collection of config-bound helpers
#[derive(Clone)]
pub struct Helpers {
    config: SiteConfig,
    tz: chrono_tz::Tz,
}

impl Helpers {
    /// Create a new helpers instance
    pub fn new(config: SiteConfig) -> Self {
        let tz = config.tz();
        Self { config, tz }
    }

    /// Get url_for helper
    pub fn url_for(&self, path: &str) -> String {
        url_for(&self.config, path)
    }

    /// Link target of a post detail page
    pub fn post_url(&self, uid: &str) -> String {
        url_for(&self.config, &post_path(uid))
    }

    /// Format a publication date in the site timezone
    pub fn date(&self, date: &DateTime<Utc>) -> String {
        format_publication_date(date, &self.tz)
    }

    /// Reading time in minutes for the given word count
    pub fn reading_time(&self, words: usize) -> usize {
        reading_time(words, self.config.words_per_minute)
    }
}
