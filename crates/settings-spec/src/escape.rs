//! Output escaping for the markup the renderers produce.

use std::sync::LazyLock;

use regex::Regex;

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^&(?:[A-Za-z][A-Za-z0-9]*|#[0-9]+|#[xX][0-9A-Fa-f]+);").expect("static pattern")
});

static URL_DISALLOWED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^A-Za-z0-9\-~+_.?#=!&;,/:%@$|*'()\[\]\x{80}-\x{10FFFF}]").expect("static pattern")
});

const ALLOWED_SCHEMES: &[&str] = &[
    "http", "https", "ftp", "ftps", "mailto", "news", "irc", "gopher", "nntp", "feed", "telnet",
    "mms", "rtsp", "sms", "svn", "tel", "fax", "xmpp", "webcal", "urn",
];

/// Escape text placed between tags.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        push_escaped(&mut out, ch);
    }
    out
}

/// Escape a value placed inside a double-quoted attribute. Character entities
/// already present in the input are kept rather than encoded twice.
pub fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(ch) = rest.chars().next() {
        if ch == '&'
            && let Some(entity) = ENTITY.find(rest)
        {
            out.push_str(entity.as_str());
            rest = &rest[entity.end()..];
            continue;
        }
        push_escaped(&mut out, ch);
        rest = &rest[ch.len_utf8()..];
    }
    out
}

/// Clean a URL for use in a redirect or `href`. Characters outside the URL
/// alphabet are dropped, spaces become `%20`, and URLs with a scheme outside
/// the allow-list collapse to an empty string.
pub fn escape_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let spaced = trimmed.replace(' ', "%20");
    let cleaned = URL_DISALLOWED.replace_all(&spaced, "").into_owned();

    if let Some(scheme) = scheme_of(&cleaned)
        && !ALLOWED_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str())
    {
        return String::new();
    }
    cleaned
}

/// Undo backslash escaping applied by the storage layer.
pub fn strip_slashes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('\0'),
            Some(next) => out.push(next),
            None => {}
        }
    }
    out
}

fn push_escaped(out: &mut String, ch: char) {
    match ch {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#039;"),
        other => out.push(other),
    }
}

/// Scheme prefix of an absolute URL; relative references have none.
fn scheme_of(url: &str) -> Option<&str> {
    let colon = url.find(':')?;
    let candidate = &url[..colon];
    if candidate.contains(['/', '?', '#']) {
        return None;
    }
    Some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_escapes_markup_characters() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#039;Jerry&#039;&lt;/b&gt;"
        );
    }

    #[test]
    fn attr_keeps_existing_entities() {
        assert_eq!(escape_attr("Fish &amp; Chips"), "Fish &amp; Chips");
        assert_eq!(escape_attr("Fish & Chips"), "Fish &amp; Chips");
        assert_eq!(escape_attr("&#8217;quoted\""), "&#8217;quoted&quot;");
        assert_eq!(escape_attr("&bogus"), "&amp;bogus");
    }

    #[test]
    fn url_rejects_script_schemes() {
        assert_eq!(escape_url("javascript:alert(1)"), "");
        assert_eq!(escape_url(" https://example.com/a b "), "https://example.com/a%20b");
        assert_eq!(escape_url("/wp-admin/options.php?page=x"), "/wp-admin/options.php?page=x");
        assert_eq!(escape_url("/a<script>"), "/ascript");
    }

    #[test]
    fn strip_slashes_unescapes_quotes() {
        assert_eq!(strip_slashes(r#"It\'s \"fine\""#), r#"It's "fine""#);
        assert_eq!(strip_slashes(r"back\\slash"), r"back\slash");
        assert_eq!(strip_slashes(r"trailing\"), "trailing");
    }
}
