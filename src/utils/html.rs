use ammonia;

/// Clean HTML content using the ammonia library.
///
/// Whitelist-based sanitization: safe tags (like <b>, <p>) survive, dangerous
/// tags (<script>, <iframe>) and attributes (onclick) are stripped. Prompt
/// descriptions and bodies pass through here before they are stored, as a
/// fail-safe against stored XSS in any client rendering them as HTML.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
