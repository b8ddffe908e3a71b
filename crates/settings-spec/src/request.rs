use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::form_urlencoded;

/// The parts of the incoming request the page reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Current page URL, compared verbatim against tab URLs.
    pub url: String,
    #[serde(default)]
    pub posted: Map<String, Value>,
    #[serde(default)]
    pub query: BTreeMap<String, String>,
}

impl RequestContext {
    /// A GET request; query parameters are read from the URL.
    pub fn get(url: impl Into<String>) -> Self {
        let url = url.into();
        let query = parse_query(&url);
        Self {
            url,
            posted: Map::new(),
            query,
        }
    }

    /// A POST request with already-decoded fields.
    pub fn post(url: impl Into<String>, posted: Map<String, Value>) -> Self {
        Self {
            posted,
            ..Self::get(url)
        }
    }

    /// A POST request carrying an `application/x-www-form-urlencoded` body.
    /// Bracketed names nest: `opt[key]` becomes `{"opt": {"key": ..}}` and
    /// `opt[list][]` appends to an array.
    pub fn from_form_body(url: impl Into<String>, body: &str) -> Self {
        let mut posted = Map::new();
        for (name, value) in form_urlencoded::parse(body.as_bytes()) {
            let segments = split_field_name(&name);
            insert_segments(&mut posted, &segments, value.into_owned());
        }
        Self::post(url, posted)
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn posted_field(&self, name: &str) -> Option<&Value> {
        self.posted.get(name)
    }

    /// Name of the submit control that marks a save for `option_name`.
    pub fn submit_marker(option_name: &str) -> String {
        format!("save_{option_name}")
    }

    /// Whether this request submits the form of `option_name`.
    pub fn has_submission(&self, option_name: &str) -> bool {
        match self.posted.get(&Self::submit_marker(option_name)) {
            None | Some(Value::Null) => false,
            Some(Value::String(text)) => !text.is_empty() && text != "0",
            Some(Value::Bool(flag)) => *flag,
            Some(_) => true,
        }
    }

    /// Submitted fields for `option_name`. A missing or non-object payload is
    /// coerced to an empty object so the form stays usable.
    pub fn submitted_data(&self, option_name: &str) -> Value {
        match self.posted.get(option_name) {
            Some(Value::Object(map)) => Value::Object(map.clone()),
            _ => Value::Object(Map::new()),
        }
    }

    /// The current URL with `key=value` added, replacing an existing `key`.
    /// Other query pairs are copied through exactly as they appear.
    pub fn with_query_arg(&self, key: &str, value: &str) -> String {
        let (without_fragment, fragment) = match self.url.split_once('#') {
            Some((head, fragment)) => (head, Some(fragment)),
            None => (self.url.as_str(), None),
        };
        let (base, query) = without_fragment
            .split_once('?')
            .unwrap_or((without_fragment, ""));

        let mut pairs = Vec::new();
        let mut replaced = false;
        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let name = pair.split_once('=').map_or(pair, |(name, _)| name);
            if name != key {
                pairs.push(pair.to_string());
            } else if !replaced {
                pairs.push(format!("{key}={value}"));
                replaced = true;
            }
        }
        if !replaced {
            pairs.push(format!("{key}={value}"));
        }

        let mut location = format!("{base}?{}", pairs.join("&"));
        if let Some(fragment) = fragment {
            location.push('#');
            location.push_str(fragment);
        }
        location
    }
}

fn parse_query(url: &str) -> BTreeMap<String, String> {
    let without_fragment = url.split('#').next().unwrap_or_default();
    let Some((_, query)) = without_fragment.split_once('?') else {
        return BTreeMap::new();
    };
    form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

/// `opt[a][b][]` -> `["opt", "a", "b", ""]`. Names that do not start with a
/// plain segment are taken literally.
fn split_field_name(name: &str) -> Vec<String> {
    let Some(open) = name.find('[').filter(|open| *open > 0) else {
        return vec![name.to_string()];
    };
    let mut segments = vec![name[..open].to_string()];
    let mut rest = &name[open..];
    while let Some(inner) = rest.strip_prefix('[') {
        let Some(close) = inner.find(']') else {
            break;
        };
        segments.push(inner[..close].to_string());
        rest = &inner[close + 1..];
    }
    segments
}

fn insert_segments(target: &mut Map<String, Value>, segments: &[String], value: String) {
    let Some((head, tail)) = segments.split_first() else {
        return;
    };
    if tail.is_empty() {
        target.insert(head.clone(), Value::String(value));
        return;
    }
    let slot = target
        .entry(head.clone())
        .or_insert_with(|| empty_container(&tail[0]));
    insert_into(slot, tail, value);
}

fn insert_into(slot: &mut Value, segments: &[String], value: String) {
    let Some((head, tail)) = segments.split_first() else {
        return;
    };

    if head.is_empty() {
        if !slot.is_array() {
            *slot = Value::Array(Vec::new());
        }
        if let Value::Array(items) = slot {
            match tail.first() {
                None => items.push(Value::String(value)),
                Some(next) => {
                    let mut child = empty_container(next);
                    insert_into(&mut child, tail, value);
                    items.push(child);
                }
            }
        }
        return;
    }

    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(map) = slot {
        insert_segments(map, segments, value);
    }
}

fn empty_container(next_segment: &str) -> Value {
    if next_segment.is_empty() {
        Value::Array(Vec::new())
    } else {
        Value::Object(Map::new())
    }
}
