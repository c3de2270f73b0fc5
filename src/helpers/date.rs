//! Date helper functions

use chrono::{DateTime, FixedOffset, Locale, TimeZone, Utc};

/// Publication date pattern, `d MMM yyyy` in the fixed pt-BR locale
const PUBLICATION_DATE_FORMAT: &str = "%-d %b %Y";

/// Parse a timestamp as emitted by the content API
///
/// Accepts RFC 3339 (`2021-03-15T00:00:00Z`) as well as the compact offset
/// form the API uses for document metadata (`2021-03-15T19:25:28+0000`).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::<FixedOffset>::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z"))
        .or_else(|_| DateTime::<FixedOffset>::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

/// Format a publication date like `15 mar 2021`
pub fn format_publication_date<Tz: TimeZone>(date: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.with_timezone(tz)
        .format_localized(PUBLICATION_DATE_FORMAT, Locale::pt_BR)
        .to_string()
}

/// Format a date in ISO 8601 / XML format
pub fn date_xml(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string()
}
