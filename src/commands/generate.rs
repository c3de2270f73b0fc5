//! Generate static files

use anyhow::Result;
use std::sync::Arc;

use crate::generator::{GenerateReport, Generator};
use crate::Blog;

/// Generate the static site from the content API
pub async fn run(blog: &Blog) -> Result<()> {
    let start = std::time::Instant::now();

    let source = Arc::new(blog.client()?);
    let generator = Generator::new(blog, source)?;
    let report = generator.generate().await?;

    log_report(&report);
    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(())
}

fn log_report(report: &GenerateReport) {
    tracing::info!(
        "Wrote {} index pages and {} posts",
        report.index_pages,
        report.post_pages.len()
    );
    for uid in &report.post_pages {
        tracing::debug!("Post: {}", uid);
    }
}
