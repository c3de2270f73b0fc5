//! HTML helper functions

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Count whitespace-separated tokens in a rendered HTML string
///
/// Tags are not stripped, so markup inflates the count. Reading time has
/// always been computed over the rendered HTML and readers are used to it.
pub fn count_words(html: &str) -> usize {
    html.split_whitespace().count()
}

/// Minutes needed to read `words` at `words_per_minute`, rounded up
pub fn reading_time(words: usize, words_per_minute: usize) -> usize {
    words.div_ceil(words_per_minute.max(1))
}
