//! List site content

use anyhow::Result;

use crate::client::{self, ContentSource};
use crate::helpers::{index_page_path, post_path, Helpers};
use crate::Blog;

/// List site content by type
pub async fn run(blog: &Blog, content_type: &str) -> Result<()> {
    let source = blog.client()?;
    for line in lines(blog, &source, content_type).await? {
        println!("{}", line);
    }
    Ok(())
}

/// Output lines for `content_type`
pub async fn lines<S: ContentSource>(
    blog: &Blog,
    source: &S,
    content_type: &str,
) -> Result<Vec<String>> {
    let helpers = Helpers::new(blog.config.clone());
    let mut lines = Vec::new();

    match content_type {
        "post" | "posts" => {
            let mut page = client::list_posts(source, &blog.config).await?;
            let mut posts = Vec::new();
            let mut pages = 1;
            loop {
                posts.append(&mut page.results);
                match page.next_page.take() {
                    Some(cursor) if pages < blog.config.max_index_pages => {
                        page = client::next_posts(source, &cursor).await?;
                        pages += 1;
                    }
                    _ => break,
                }
            }

            lines.push(format!("Posts ({}):", posts.len()));
            for post in posts {
                let date = post
                    .first_publication_date
                    .map(|d| helpers.date(&d))
                    .unwrap_or_else(|| "-".to_string());
                lines.push(format!("  {} - {} [{}]", date, post.data.title, post.uid));
            }
        }
        "route" | "routes" => {
            let uids = client::static_paths(source, &blog.config).await?;
            lines.push(format!("Routes ({}):", uids.len() + 1));
            lines.push(format!("  {}", helpers.url_for(&index_page_path(1))));
            for uid in uids {
                lines.push(format!("  {}", helpers.url_for(&post_path(&uid))));
            }
        }
        _ => {
            anyhow::bail!("Unknown type: {}. Available: post, route", content_type);
        }
    }

    Ok(lines)
}
