//! Generator module - renders the post list and post pages to HTML

use anyhow::{Context as _, Result};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tera::Context;

use crate::client::{self, ContentSource};
use crate::content::{total_words, ListView, Post, PostDetail, RichTextRenderer};
use crate::helpers::{index_page_path, post_path, Helpers};
use crate::templates::{
    PaginationData, PostPageData, PostSummaryData, SiteData, TemplateRenderer,
};
use crate::Blog;

/// Seconds between reloads of the loading placeholder
const LOADING_REFRESH_SECS: u64 = 1;

/// Summary of a generation run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateReport {
    pub index_pages: usize,
    pub post_pages: Vec<String>,
}

/// Static site generator over a content source
pub struct Generator<S> {
    blog: Blog,
    source: Arc<S>,
    renderer: TemplateRenderer,
    richtext: RichTextRenderer,
    helpers: Helpers,
    load_more_endpoint: Option<String>,
}

impl<S: ContentSource> Generator<S> {
    /// Create a new generator
    pub fn new(blog: &Blog, source: Arc<S>) -> Result<Self> {
        Ok(Self {
            blog: blog.clone(),
            source,
            renderer: TemplateRenderer::new()?,
            richtext: RichTextRenderer::new(&blog.config),
            helpers: Helpers::new(blog.config.clone()),
            load_more_endpoint: None,
        })
    }

    /// Let index pages load further pages from `endpoint` in place
    pub fn with_load_more(mut self, endpoint: &str) -> Self {
        self.load_more_endpoint = Some(self.helpers.url_for(endpoint));
        self
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Generate the entire site
    pub async fn generate(&self) -> Result<GenerateReport> {
        tokio::fs::create_dir_all(&self.blog.public_dir).await?;

        let index_pages = self.generate_index_pages().await?;
        let post_pages = self.generate_post_pages().await?;

        let not_found = self.render_not_found()?;
        tokio::fs::write(self.blog.public_dir.join("404.html"), not_found).await?;

        Ok(GenerateReport {
            index_pages,
            post_pages,
        })
    }

    /// Generate the post list, one page per cursor
    ///
    /// Each page shows only its own results; the "load more" control links
    /// to the next page.
    pub async fn generate_index_pages(&self) -> Result<usize> {
        let config = &self.blog.config;
        let first = client::list_posts(self.source.as_ref(), config)
            .await
            .context("Failed to query the post list")?;

        let mut view = ListView::from_pagination(first);
        let mut seen = HashSet::new();
        let mut page_num = 1;

        loop {
            let next_cursor = view.next_page().map(str::to_string);
            let follow = match &next_cursor {
                Some(cursor) if page_num >= config.max_index_pages => {
                    tracing::warn!("Stopping at {} index pages, {} not followed", page_num, cursor);
                    None
                }
                Some(cursor) if !seen.insert(cursor.clone()) => {
                    tracing::warn!("Cursor {} repeated, stopping pagination", cursor);
                    None
                }
                other => other.clone(),
            };

            let html = self.render_index(view.posts(), page_num, follow.as_deref())?;
            let path = self.write_page(&index_page_path(page_num), &html).await?;
            tracing::debug!("Generated: {:?}", path);

            let Some(cursor) = follow else {
                break;
            };
            let next = client::next_posts(self.source.as_ref(), &cursor)
                .await
                .with_context(|| format!("Failed to load page {}", page_num + 1))?;
            view.apply_page(next);
            page_num += 1;
        }

        tracing::info!("Generated {} index pages", page_num);
        Ok(page_num)
    }

    /// Generate a page for every known post
    pub async fn generate_post_pages(&self) -> Result<Vec<String>> {
        let uids = client::static_paths(self.source.as_ref(), &self.blog.config)
            .await
            .context("Failed to enumerate post paths")?;

        for uid in &uids {
            self.generate_post(uid)
                .await
                .with_context(|| format!("Failed to generate post {}", uid))?;
        }

        tracing::info!("Generated {} post pages", uids.len());
        Ok(uids)
    }

    /// Fetch, render and write a single post
    pub async fn generate_post(&self, uid: &str) -> Result<PathBuf> {
        let post = client::post_by_uid(self.source.as_ref(), &self.blog.config, uid).await?;
        let html = self.render_post(&post)?;
        let path = self.write_page(&post_path(&post.uid), &html).await?;
        tracing::debug!("Generated post: {:?}", path);
        Ok(path)
    }

    /// Render one page of the post list
    ///
    /// `next_cursor` is the cursor of the following page, if it should be
    /// offered.
    pub fn render_index(
        &self,
        posts: &[Post],
        page_num: usize,
        next_cursor: Option<&str>,
    ) -> Result<String> {
        let pagination = PaginationData {
            current: page_num,
            has_next: next_cursor.is_some(),
            next_link: self.helpers.url_for(&index_page_path(page_num + 1)),
            next_cursor: next_cursor
                .map(crate::helpers::html_escape)
                .unwrap_or_default(),
            endpoint: self.load_more_endpoint.clone(),
        };

        let mut context = self.create_base_context();
        context.insert("posts", &self.summaries(posts));
        context.insert("pagination", &pagination);
        self.renderer.render("index.html", &context)
    }

    /// Render only the list items, for in-place replacement
    pub fn render_post_list(&self, posts: &[Post]) -> Result<String> {
        let mut context = self.create_base_context();
        context.insert("posts", &self.summaries(posts));
        self.renderer.render("partials/post_list.html", &context)
    }

    /// Render a post detail page
    pub fn render_post(&self, post: &PostDetail) -> Result<String> {
        let sections = post.render_content(&self.richtext);
        let reading_time = self.helpers.reading_time(total_words(&sections));

        let mut context = self.create_base_context();
        context.insert(
            "post",
            &PostPageData::new(post, &sections, reading_time, &self.helpers),
        );
        self.renderer.render("post.html", &context)
    }

    /// Placeholder shown while a post is generated on demand
    pub fn render_loading(&self) -> Result<String> {
        let mut context = self.create_base_context();
        context.insert("refresh_secs", &LOADING_REFRESH_SECS);
        self.renderer.render("loading.html", &context)
    }

    pub fn render_not_found(&self) -> Result<String> {
        self.renderer.render("404.html", &self.create_base_context())
    }

    fn summaries(&self, posts: &[Post]) -> Vec<PostSummaryData> {
        posts
            .iter()
            .map(|p| PostSummaryData::new(p, &self.helpers))
            .collect()
    }

    /// Create a base context with common variables
    fn create_base_context(&self) -> Context {
        let config = &self.blog.config;
        let mut context = Context::new();
        context.insert(
            "site",
            &SiteData {
                title: crate::helpers::html_escape(&config.title),
                description: crate::helpers::html_escape(&config.description),
                home: self.helpers.url_for(""),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        );
        context
    }

    /// Write `html` as `index.html` under the route `route`
    ///
    /// The file is renamed into place so a concurrent reader never sees a
    /// partial page.
    async fn write_page(&self, route: &str, html: &str) -> Result<PathBuf> {
        let dir = self.blog.public_dir.join(route.trim_start_matches('/'));
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create dir {:?}", dir))?;

        let output_path = dir.join("index.html");
        let tmp_path = dir.join("index.html.tmp");
        tokio::fs::write(&tmp_path, html)
            .await
            .with_context(|| format!("Failed to write {:?}", tmp_path))?;
        tokio::fs::rename(&tmp_path, &output_path).await?;
        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::memory::{post_doc, MemorySource};
    use crate::config::SiteConfig;
    use crate::content::ApiDocument;

    fn blog(dir: &std::path::Path) -> Blog {
        Blog::with_config(dir, SiteConfig::default())
    }

    fn summary(doc: serde_json::Value) -> Post {
        let doc: ApiDocument = serde_json::from_value(doc).unwrap();
        Post::try_from(&doc).unwrap()
    }

    fn detail(doc: serde_json::Value) -> PostDetail {
        let doc: ApiDocument = serde_json::from_value(doc).unwrap();
        PostDetail::try_from(&doc).unwrap()
    }

    fn source() -> Arc<MemorySource> {
        Arc::new(MemorySource::new(vec![
            vec![post_doc("segundo-post", "2021-03-20T00:00:00Z", 201)],
            vec![post_doc("primeiro-post", "2021-03-15T00:00:00Z", 199)],
        ]))
    }

    #[tokio::test]
    async fn test_generate_site() {
        let dir = tempfile::tempdir().unwrap();
        let blog = blog(dir.path());
        let generator = Generator::new(&blog, source()).unwrap();

        let report = generator.generate().await.unwrap();
        assert_eq!(report.index_pages, 2);
        assert_eq!(report.post_pages, vec!["segundo-post", "primeiro-post"]);

        let index = std::fs::read_to_string(blog.public_dir.join("index.html")).unwrap();
        assert!(index.contains(r#"<a href="/post/segundo-post/" class="title">Post segundo-post</a>"#));
        assert!(index.contains("20 mar 2021"));
        assert!(index.contains("Joseph Oliveira"));
        assert!(!index.contains("primeiro-post"));
        assert!(index.contains(r#"href="/page/2/""#));
        assert!(index.contains("Carregar mais posts"));
        // Static output has no dynamic endpoint
        assert!(!index.contains("data-endpoint"));

        let page2 = std::fs::read_to_string(blog.public_dir.join("page/2/index.html")).unwrap();
        assert!(page2.contains("Post primeiro-post"));
        assert!(!page2.contains("Post segundo-post"));
        assert!(!page2.contains("Carregar mais posts"));

        let post = std::fs::read_to_string(blog.public_dir.join("post/primeiro-post/index.html"))
            .unwrap();
        assert!(post.contains(r#"<img src="https://images.prismic.io/primeiro-post.png" alt="Post primeiro-post" class="banner">"#));
        assert!(post.contains("<h2>Heading primeiro-post</h2>"));
        assert!(post.contains("15 mar 2021"));

        assert!(blog.public_dir.join("404.html").exists());
        assert!(!blog.public_dir.join("post/primeiro-post/index.html.tmp").exists());
    }

    #[test]
    fn test_reading_time_counts_rendered_html() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Generator::new(&blog(dir.path()), source()).unwrap();

        // 199 words inside <p>...</p> stay 199 tokens
        let short = detail(post_doc("a", "2021-03-15T00:00:00Z", 199));
        assert!(generator.render_post(&short).unwrap().contains("<p>1 min</p>"));

        let long = detail(post_doc("b", "2021-03-15T00:00:00Z", 201));
        assert!(generator.render_post(&long).unwrap().contains("<p>2 min</p>"));
    }

    #[test]
    fn test_render_index_escapes_and_hides_control() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Generator::new(&blog(dir.path()), source()).unwrap();

        let mut post = summary(post_doc("x", "2021-03-15T00:00:00Z", 1));
        post.data.title = "<script>alert(1)</script>".to_string();

        let html = generator.render_index(&[post], 1, None).unwrap();
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<script>alert"));
        assert!(!html.contains("Carregar mais posts"));
    }

    #[test]
    fn test_load_more_endpoint_and_null_date() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Generator::new(&blog(dir.path()), source())
            .unwrap()
            .with_load_more("/api/posts");

        let mut doc = post_doc("x", "2021-03-15T00:00:00Z", 1);
        doc["first_publication_date"] = serde_json::Value::Null;
        let post = summary(doc);

        let html = generator
            .render_index(&[post], 1, Some("https://blog.cdn.prismic.io/api/v2/documents/search?page=2&pageSize=1"))
            .unwrap();
        assert!(html.contains(r#"data-endpoint="/api/posts""#));
        assert!(html.contains("page=2&amp;pageSize=1"));
        assert!(!html.contains("<time"));
    }

    #[test]
    fn test_loading_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Generator::new(&blog(dir.path()), source()).unwrap();
        let html = generator.render_loading().unwrap();
        assert!(html.contains("Carregando..."));
        assert!(html.contains(r#"http-equiv="refresh""#));
    }
}
