//! URL helper functions

use crate::config::SiteConfig;

/// Generate a URL with the root path
///
/// # Examples
/// ```ignore
/// url_for(&config, "/post/hello") // -> "/blog/post/hello"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    let root = config.root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// Route of a post detail page, relative to the root
pub fn post_path(uid: &str) -> String {
    format!("post/{}/", uid)
}

/// Route of a numbered index page, relative to the root
///
/// Page 1 is the site root.
pub fn index_page_path(page: usize) -> String {
    if page <= 1 {
        String::new()
    } else {
        format!("page/{}/", page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for() {
        let mut config = SiteConfig::default();
        assert_eq!(url_for(&config, "/post/hello/"), "/post/hello/");
        assert_eq!(url_for(&config, ""), "/");

        config.root = "/blog/".to_string();
        assert_eq!(url_for(&config, "post/hello/"), "/blog/post/hello/");
        assert_eq!(url_for(&config, "/"), "/blog/");
    }

    #[test]
    fn test_index_page_path() {
        assert_eq!(index_page_path(1), "");
        assert_eq!(index_page_path(2), "page/2/");
        assert_eq!(post_path("como-utilizar-hooks"), "post/como-utilizar-hooks/");
    }
}
