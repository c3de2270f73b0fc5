//! Post view models
//!
//! Built from raw API documents through validating conversions, so every
//! `Post` that reaches a template has a path-safe uid and a parsed date.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::richtext::{RichTextBlock, RichTextRenderer};
use super::schema::{ApiDocument, SearchResponse};
use crate::error::ContentError;
use crate::helpers::{count_words, parse_timestamp};

lazy_static! {
    static ref UID_RE: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").unwrap();
}

/// Whether `uid` can be used as a URL path segment
pub fn is_valid_uid(uid: &str) -> bool {
    UID_RE.is_match(uid)
}

/// Fields shown in the post list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostData {
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// A post summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub uid: String,
    pub first_publication_date: Option<DateTime<Utc>>,
    pub data: PostData,
}

/// A post with banner and body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    pub uid: String,
    pub first_publication_date: Option<DateTime<Utc>>,
    pub data: PostDetailData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetailData {
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner: Banner,
    pub content: Vec<ContentSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    pub url: Option<String>,
}

/// A heading followed by a rich text body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSection {
    pub heading: String,
    pub body: Vec<RichTextBlock>,
}

/// A content section with its body rendered to HTML
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedSection {
    pub heading: String,
    pub body: String,
}

/// One page of post summaries and the cursor to the next one
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostPagination {
    pub next_page: Option<String>,
    pub results: Vec<Post>,
}

impl TryFrom<&ApiDocument> for Post {
    type Error = ContentError;

    fn try_from(doc: &ApiDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            uid: document_uid(doc)?,
            first_publication_date: publication_date(doc)?,
            data: PostData {
                title: doc.required_str("title")?,
                subtitle: doc.optional_str("subtitle")?,
                author: doc.optional_str("author")?,
            },
        })
    }
}

impl TryFrom<&ApiDocument> for PostDetail {
    type Error = ContentError;

    fn try_from(doc: &ApiDocument) -> Result<Self, Self::Error> {
        let banner = match doc.data.get("banner") {
            Some(Value::Object(image)) => Banner {
                url: image
                    .get("url")
                    .and_then(Value::as_str)
                    .filter(|url| !url.is_empty())
                    .map(str::to_string),
            },
            Some(Value::Null) | None => Banner::default(),
            Some(_) => return Err(doc.invalid("field `banner` should be an image")),
        };

        let content = match doc.data.get("content") {
            Some(Value::Array(sections)) => sections
                .iter()
                .enumerate()
                .map(|(i, section)| content_section(doc, i, section))
                .collect::<Result<Vec<_>, _>>()?,
            Some(Value::Null) | None => Vec::new(),
            Some(_) => return Err(doc.invalid("field `content` should be a group")),
        };

        Ok(Self {
            uid: document_uid(doc)?,
            first_publication_date: publication_date(doc)?,
            data: PostDetailData {
                title: doc.required_str("title")?,
                subtitle: doc.optional_str("subtitle")?,
                author: doc.optional_str("author")?,
                banner,
                content,
            },
        })
    }
}

impl PostDetail {
    /// Render every section body with `renderer`
    pub fn render_content(&self, renderer: &RichTextRenderer) -> Vec<RenderedSection> {
        self.data
            .content
            .iter()
            .map(|section| RenderedSection {
                heading: section.heading.clone(),
                body: renderer.render(&section.body),
            })
            .collect()
    }
}

/// Word count used for the reading time estimate
pub fn total_words(sections: &[RenderedSection]) -> usize {
    sections.iter().map(|s| count_words(&s.body)).sum()
}

impl PostPagination {
    /// Shape one API page, dropping documents that fail validation
    pub fn from_response(response: &SearchResponse) -> Self {
        let results = response
            .results
            .iter()
            .filter_map(|doc| match Post::try_from(doc) {
                Ok(post) => Some(post),
                Err(e) => {
                    tracing::warn!("Skipping document {:?}: {}", doc.id, e);
                    None
                }
            })
            .collect();

        Self {
            next_page: normalize_cursor(response.next_page.as_deref()),
            results,
        }
    }

    /// Whether another page can be requested
    pub fn has_next(&self) -> bool {
        self.next_page.is_some()
    }
}

/// Map every "no more pages" representation to `None`
///
/// Cursors end up in pages and JSON sent to readers, so an `access_token`
/// echoed by the API is removed. The client adds it back when fetching.
pub fn normalize_cursor(cursor: Option<&str>) -> Option<String> {
    cursor
        .map(str::trim)
        .filter(|c| !c.is_empty() && *c != "null" && *c != "undefined")
        .map(strip_access_token)
}

fn strip_access_token(cursor: &str) -> String {
    let Ok(mut url) = Url::parse(cursor) else {
        return cursor.to_string();
    };
    if !url.query_pairs().any(|(key, _)| key == "access_token") {
        return cursor.to_string();
    }

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "access_token")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(&kept);
    }
    url.to_string()
}

/// State of the post list as the reader sees it
///
/// Loading another page replaces the visible posts; it does not append.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListView {
    posts: Vec<Post>,
    next_page: Option<String>,
}

impl ListView {
    pub fn from_pagination(pagination: PostPagination) -> Self {
        Self {
            posts: pagination.results,
            next_page: pagination.next_page,
        }
    }

    /// Show `pagination` in place of the current page
    pub fn apply_page(&mut self, pagination: PostPagination) {
        self.posts = pagination.results;
        self.next_page = pagination.next_page;
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn next_page(&self) -> Option<&str> {
        self.next_page.as_deref()
    }

    /// Whether the "load more" control should be shown
    pub fn has_next(&self) -> bool {
        self.next_page.is_some()
    }
}

fn document_uid(doc: &ApiDocument) -> Result<String, ContentError> {
    match doc.uid.as_deref() {
        Some(uid) if is_valid_uid(uid) => Ok(uid.to_string()),
        Some(_) => Err(doc.invalid("uid is not a valid path segment")),
        None => Err(doc.invalid("missing uid")),
    }
}

fn publication_date(doc: &ApiDocument) -> Result<Option<DateTime<Utc>>, ContentError> {
    match doc.first_publication_date.as_deref() {
        None => Ok(None),
        Some(raw) => parse_timestamp(raw)
            .map(Some)
            .ok_or_else(|| doc.invalid(format!("unparseable first_publication_date {:?}", raw))),
    }
}

fn content_section(
    doc: &ApiDocument,
    index: usize,
    section: &Value,
) -> Result<ContentSection, ContentError> {
    let heading = match section.get("heading") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(_) => {
            return Err(doc.invalid(format!("content[{}].heading should be a string", index)))
        }
    };

    let body = match section.get("body") {
        Some(Value::Null) | None => Vec::new(),
        Some(body) => serde_json::from_value::<Vec<RichTextBlock>>(body.clone())
            .map_err(|e| doc.invalid(format!("content[{}].body: {}", index, e)))?,
    };

    Ok(ContentSection { heading, body })
}
