//! Content module - post models, API payloads and rich text rendering

mod post;
pub mod richtext;
pub mod schema;

pub use post::{
    is_valid_uid, normalize_cursor, total_words, Banner, ContentSection, ListView, Post, PostData,
    PostDetail, PostDetailData, PostPagination, RenderedSection,
};
pub use richtext::{RichTextBlock, RichTextRenderer};
pub use schema::{ApiDocument, SearchResponse};
