//! Initialize a new blog site

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::CONFIG_FILE;

const DEFAULT_CONFIG: &str = r#"# Blog Configuration

# Site
title: spacetraveling
description: ''
timezone: UTC

# URL
url: http://localhost:4000
root: /

# Directory
public_dir: public

# Content API
## The access token can also be set with PRISMIC_ACCESS_TOKEN
api_endpoint: https://your-repository.cdn.prismic.io/api/v2
access_token:
document_type: post
request_timeout_secs: 30

# Pagination
page_size: 1
paths_page_size: 100
max_index_pages: 1000

# Rendering
words_per_minute: 200
trust_embed_html: true

# Server
## Seconds before a post that could not be rendered is fetched again
fallback_ttl_secs: 60
max_fallback_entries: 1024
"#;

/// Initialize a new site in the given directory
///
/// An existing configuration file is left untouched.
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir)?;

    let config_path = target_dir.join(CONFIG_FILE);
    if config_path.exists() {
        tracing::warn!("{:?} already exists, skipping", config_path);
        return Ok(());
    }
    fs::write(&config_path, DEFAULT_CONFIG)?;

    Ok(())
}
