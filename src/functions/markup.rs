//! XML / tag escaping for values spliced into HTML templates.

/// Escape the five XML-reserved characters. `&` goes first so the entities
/// produced for the others are not escaped twice.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Inverse of [`escape_xml`]. `&amp;` goes last.
pub fn unescape_xml(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Escape only tag delimiters.
pub fn escape_tags(s: &str) -> String {
    s.replace('<', "&lt;").replace('>', "&gt;")
}
