//! Content client - queries the headless CMS
//!
//! `ContentSource` is the seam between page generation and the remote API.
//! The functions in this module implement the page-level call contract on
//! top of any source and return validated view models.

mod prismic;
mod query;

pub use prismic::PrismicClient;
pub use query::{Predicate, Query};

use indexmap::IndexSet;
use std::collections::HashSet;
use std::future::Future;

use crate::config::SiteConfig;
use crate::content::{ApiDocument, PostDetail, PostPagination, SearchResponse};
use crate::error::ContentError;

/// A remote content repository
pub trait ContentSource: Send + Sync {
    /// Run a search and return its first page
    fn query(
        &self,
        query: &Query,
    ) -> impl Future<Output = Result<SearchResponse, ContentError>> + Send;

    /// Fetch the page an opaque `next_page` cursor points at
    fn fetch_page(
        &self,
        cursor: &str,
    ) -> impl Future<Output = Result<SearchResponse, ContentError>> + Send;

    /// Look up a single document by its uid
    fn get_by_uid(
        &self,
        document_type: &str,
        uid: &str,
    ) -> impl Future<Output = Result<ApiDocument, ContentError>> + Send;
}

/// Query backing the post list
pub fn post_list_query(config: &SiteConfig) -> Query {
    let doc_type = &config.document_type;
    Query::new(Predicate::at("document.type", doc_type))
        .fetch(["title", "subtitle", "author"].map(|f| format!("{}.{}", doc_type, f)))
        .page_size(config.page_size)
}

/// First page of the post list
pub async fn list_posts<S: ContentSource>(
    source: &S,
    config: &SiteConfig,
) -> Result<PostPagination, ContentError> {
    let response = source.query(&post_list_query(config)).await?;
    Ok(PostPagination::from_response(&response))
}

/// Page of the post list behind `cursor`
pub async fn next_posts<S: ContentSource>(
    source: &S,
    cursor: &str,
) -> Result<PostPagination, ContentError> {
    let response = source.fetch_page(cursor).await?;
    Ok(PostPagination::from_response(&response))
}

/// A single post, validated
pub async fn post_by_uid<S: ContentSource>(
    source: &S,
    config: &SiteConfig,
    uid: &str,
) -> Result<PostDetail, ContentError> {
    let document = source.get_by_uid(&config.document_type, uid).await?;
    PostDetail::try_from(&document)
}

/// Every known post uid, once each, in API order
pub async fn static_paths<S: ContentSource>(
    source: &S,
    config: &SiteConfig,
) -> Result<Vec<String>, ContentError> {
    let query = Query::new(Predicate::at("document.type", &config.document_type))
        .fetch([format!("{}.title", config.document_type)])
        .page_size(config.paths_page_size);

    let mut uids = IndexSet::new();
    let mut seen_cursors = HashSet::new();
    let mut response = source.query(&query).await?;

    loop {
        for post in PostPagination::from_response(&response).results {
            uids.insert(post.uid);
        }

        let Some(cursor) = crate::content::normalize_cursor(response.next_page.as_deref()) else {
            break;
        };
        if !seen_cursors.insert(cursor.clone()) {
            tracing::warn!("Cursor {} repeated while enumerating paths", cursor);
            break;
        }
        response = source.fetch_page(&cursor).await?;
    }

    tracing::debug!("Enumerated {} post paths", uids.len());
    Ok(uids.into_iter().collect())
}

#[cfg(test)]
pub(crate) mod memory {
    //! In-memory content source for tests

    use super::*;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves pre-built pages; cursor `page-N` addresses page N (1-based)
    pub struct MemorySource {
        pub pages: Vec<Vec<Value>>,
        pub documents: Vec<Value>,
        pub requests: AtomicUsize,
    }

    impl MemorySource {
        pub fn new(pages: Vec<Vec<Value>>) -> Self {
            let documents = pages.iter().flatten().cloned().collect();
            Self {
                pages,
                documents,
                requests: AtomicUsize::new(0),
            }
        }

        fn page(&self, index: usize) -> Result<SearchResponse, ContentError> {
            let results = self
                .pages
                .get(index)
                .cloned()
                .ok_or_else(|| ContentError::InvalidCursor(format!("page-{}", index + 1)))?;
            let next_page = if index + 1 < self.pages.len() {
                Value::String(format!("page-{}", index + 2))
            } else {
                Value::Null
            };
            Ok(serde_json::from_value(json!({
                "page": index + 1,
                "total_pages": self.pages.len(),
                "next_page": next_page,
                "results": results,
            }))?)
        }
    }

    impl ContentSource for MemorySource {
        async fn query(&self, _query: &Query) -> Result<SearchResponse, ContentError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            if self.pages.is_empty() {
                return Ok(SearchResponse::default());
            }
            self.page(0)
        }

        async fn fetch_page(&self, cursor: &str) -> Result<SearchResponse, ContentError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            let index = cursor
                .strip_prefix("page-")
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|n| *n >= 1)
                .ok_or_else(|| ContentError::InvalidCursor(cursor.to_string()))?;
            self.page(index - 1)
        }

        async fn get_by_uid(
            &self,
            _document_type: &str,
            uid: &str,
        ) -> Result<ApiDocument, ContentError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            let doc = self
                .documents
                .iter()
                .find(|d| d["uid"] == uid)
                .ok_or_else(|| ContentError::NotFound {
                    uid: uid.to_string(),
                })?;
            Ok(serde_json::from_value(doc.clone())?)
        }
    }

    /// A post document with one paragraph of `words` words
    pub fn post_doc(uid: &str, date: &str, words: usize) -> Value {
        let text = vec!["palavra"; words].join(" ");
        json!({
            "id": format!("id-{}", uid),
            "uid": uid,
            "type": "post",
            "first_publication_date": date,
            "data": {
                "title": format!("Post {}", uid),
                "subtitle": format!("Subtitle {}", uid),
                "author": "Joseph Oliveira",
                "banner": { "url": format!("https://images.prismic.io/{}.png", uid) },
                "content": [{
                    "heading": format!("Heading {}", uid),
                    "body": [{ "type": "paragraph", "text": text, "spans": [] }]
                }]
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::memory::{post_doc, MemorySource};
    use super::*;

    #[test]
    fn test_post_list_query() {
        let query = post_list_query(&SiteConfig::default());
        assert_eq!(query.q(), r#"[[at(document.type, "post")]]"#);
        assert_eq!(query.fetch_param().as_deref(), Some("post.title,post.subtitle,post.author"));
        assert_eq!(query.page_size_param(), 1);
    }

    #[tokio::test]
    async fn test_list_and_next_posts() {
        let source = MemorySource::new(vec![
            vec![post_doc("b", "2021-03-20T00:00:00Z", 1)],
            vec![post_doc("a", "2021-03-15T00:00:00Z", 1)],
        ]);
        let config = SiteConfig::default();

        let first = list_posts(&source, &config).await.unwrap();
        assert_eq!(first.results[0].uid, "b");
        assert_eq!(first.next_page.as_deref(), Some("page-2"));

        let second = next_posts(&source, "page-2").await.unwrap();
        assert_eq!(second.results.len(), 1);
        assert_eq!(second.results[0].uid, "a");
        assert!(!second.has_next());
    }

    #[tokio::test]
    async fn test_static_paths_are_distinct() {
        let source = MemorySource::new(vec![
            vec![post_doc("b", "2021-03-20T00:00:00Z", 1), post_doc("a", "2021-03-15T00:00:00Z", 1)],
            vec![post_doc("a", "2021-03-15T00:00:00Z", 1), post_doc("c", "2021-03-10T00:00:00Z", 1)],
        ]);

        let paths = static_paths(&source, &SiteConfig::default()).await.unwrap();
        assert_eq!(paths, vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn test_post_by_uid() {
        let source = MemorySource::new(vec![vec![post_doc("hello", "2021-03-15T00:00:00Z", 3)]]);
        let config = SiteConfig::default();

        let post = post_by_uid(&source, &config, "hello").await.unwrap();
        assert_eq!(post.data.title, "Post hello");

        let missing = post_by_uid(&source, &config, "nope").await.unwrap_err();
        assert!(missing.is_not_found());
    }
}
