//! Built-in blog templates using the Tera template engine
//!
//! Templates are embedded in the binary. Autoescaping is disabled: every
//! value placed in a context is escaped when the view data is built, and
//! rendered rich text is already HTML.

use anyhow::Result;
use serde::Serialize;
use tera::{Context, Tera};

use crate::content::{Post, PostDetail, RenderedSection};
use crate::helpers::{date_xml, html_escape, Helpers};

/// Template renderer with the embedded theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("theme/layout.html")),
            ("index.html", include_str!("theme/index.html")),
            ("post.html", include_str!("theme/post.html")),
            ("loading.html", include_str!("theme/loading.html")),
            ("404.html", include_str!("theme/404.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("theme/partials/header.html"),
            ),
            (
                "partials/post_info.html",
                include_str!("theme/partials/post_info.html"),
            ),
            (
                "partials/post_list.html",
                include_str!("theme/partials/post_list.html"),
            ),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub home: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostSummaryData {
    pub uid: String,
    pub path: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: Option<String>,
    pub date_iso: Option<String>,
}

impl PostSummaryData {
    pub fn new(post: &Post, helpers: &Helpers) -> Self {
        Self {
            uid: post.uid.clone(),
            path: html_escape(&helpers.post_url(&post.uid)),
            title: html_escape(&post.data.title),
            subtitle: html_escape(&post.data.subtitle),
            author: html_escape(&post.data.author),
            date: post.first_publication_date.map(|d| helpers.date(&d)),
            date_iso: post.first_publication_date.map(|d| date_xml(&d)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginationData {
    pub current: usize,
    pub has_next: bool,
    pub next_link: String,
    pub next_cursor: String,
    /// Load-more endpoint, only when served dynamically
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostPageData {
    pub uid: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner_url: Option<String>,
    pub date: Option<String>,
    pub date_iso: Option<String>,
    pub reading_time: usize,
    pub sections: Vec<SectionData>,
}

impl PostPageData {
    pub fn new(
        post: &PostDetail,
        sections: &[RenderedSection],
        reading_time: usize,
        helpers: &Helpers,
    ) -> Self {
        Self {
            uid: post.uid.clone(),
            title: html_escape(&post.data.title),
            subtitle: html_escape(&post.data.subtitle),
            author: html_escape(&post.data.author),
            banner_url: post.data.banner.url.as_deref().map(html_escape),
            date: post.first_publication_date.map(|d| helpers.date(&d)),
            date_iso: post.first_publication_date.map(|d| date_xml(&d)),
            reading_time,
            sections: sections
                .iter()
                .map(|s| SectionData {
                    heading: html_escape(&s.heading),
                    body: s.body.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionData {
    pub heading: String,
    /// Rendered rich text, inserted verbatim
    pub body: String,
}
