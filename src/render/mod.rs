//! Presentation adapters over a [`crate::Report`].
//!
//! Each renderer consumes the same report independently:
//! - [`table`]: box-drawn terminal tables for the batch monitor
//! - [`map`]: Leaflet map markers and the standalone map document
//! - [`page`]: the dashboard's auto-refreshing HTML page

pub mod map;
pub mod page;
pub mod table;

pub use map::{MapMarker, MapView};
pub use page::DashboardPage;
pub use table::{advisory_table, status_table, TextTable};

// ---

/// Escape text for use inside HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    // ---
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("plain"), "plain");
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }
}
