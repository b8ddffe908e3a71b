use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::{Map, Value};

use crate::record::scalar_text;

/// Turns submitted data into storable data.
pub type Sanitizer = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

static SCRIPT_OR_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script[^>]*?>.*?</script>|<style[^>]*?>.*?</style>").expect("static pattern")
});
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("static pattern"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\r\n\t ]+").expect("static pattern"));
static OCTET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%[a-fA-F0-9]{2}").expect("static pattern"));

pub fn default_sanitizer() -> Sanitizer {
    Arc::new(sanitize_value)
}

/// Reduce a submitted string to single-line plain text.
///
/// Stray `<` characters that never open a tag are kept as `&lt;`; script and
/// style blocks are dropped with their contents; every other tag is removed;
/// runs of whitespace collapse to one space; percent-encoded octets are
/// removed; the result is trimmed.
pub fn sanitize_text(input: &str) -> String {
    let mut text = input.to_string();

    if text.contains('<') {
        text = escape_lone_less_than(&text);
        text = SCRIPT_OR_STYLE.replace_all(&text, "").into_owned();
        text = TAG.replace_all(&text, "").into_owned();
    }

    text = WHITESPACE.replace_all(&text, " ").into_owned();

    let mut found_octets = false;
    while OCTET.is_match(&text) {
        text = OCTET.replace_all(&text, "").into_owned();
        found_octets = true;
    }
    if found_octets {
        text = WHITESPACE.replace_all(&text, " ").into_owned();
    }

    text.trim().to_string()
}

/// Sanitize a submitted value element-wise, preserving its shape. Scalars
/// other than strings are coerced to sanitized text; `null` becomes `""`.
pub fn sanitize_value(value: &Value) -> Value {
    match value {
        Value::String(text) => Value::String(sanitize_text(text)),
        Value::Array(items) => Value::Array(items.iter().map(sanitize_value).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), sanitize_value(item)))
                .collect::<Map<_, _>>(),
        ),
        other => Value::String(sanitize_text(&scalar_text(other))),
    }
}

/// `<` followed by text with no closing `>` before the next `<` (or the end)
/// cannot start a tag and is encoded instead of stripped.
fn escape_lone_less_than(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let next_open = tail.find('<').unwrap_or(tail.len());
        if tail[..next_open].contains('>') {
            out.push('<');
        } else {
            out.push_str("&lt;");
        }
        rest = tail;
    }
    out.push_str(rest);
    out
}
