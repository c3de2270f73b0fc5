//! Clean the public directory

use anyhow::Result;
use std::fs;

use crate::Blog;

/// Remove everything generated into the public directory
pub fn run(blog: &Blog) -> Result<()> {
    if blog.public_dir.exists() {
        fs::remove_dir_all(&blog.public_dir)?;
        tracing::info!("Deleted: {:?}", blog.public_dir);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;

    #[test]
    fn test_clean_removes_public_dir() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Blog::with_config(dir.path(), SiteConfig::default());
        fs::create_dir_all(blog.public_dir.join("post/a")).unwrap();
        fs::write(blog.public_dir.join("post/a/index.html"), "x").unwrap();

        run(&blog).unwrap();
        assert!(!blog.public_dir.exists());
        // Cleaning twice is fine
        run(&blog).unwrap();
    }
}
