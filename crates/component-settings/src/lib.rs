use serde::Deserialize;
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::debug;

use settings_spec::{
    ConfigError, MemoryStore, PageConfig, PageError, PageResponse, RenderContext, RequestContext,
    SettingsPage, StoredRecord, check_config as check_page_config, record_schema,
    render_content as render_page_content,
};

const DEFAULT_CONFIG: &str = include_str!("default_config.json");

#[derive(Debug, Error)]
enum ComponentError {
    #[error("failed to parse request: {0}")]
    RequestParse(#[source] serde_json::Error),
    #[error("failed to parse stored record: {0}")]
    RecordParse(#[source] serde_json::Error),
    #[error("json encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Page(#[from] PageError),
}

/// Request shape accepted by [`build_page`]. A raw `body` takes precedence
/// over pre-decoded `posted` fields.
#[derive(Debug, Deserialize, Default)]
struct RequestInput {
    #[serde(default)]
    url: String,
    #[serde(default)]
    posted: Map<String, Value>,
    #[serde(default)]
    body: Option<String>,
}

impl RequestInput {
    fn into_context(self) -> RequestContext {
        match self.body {
            Some(body) => RequestContext::from_form_body(self.url, &body),
            None if self.posted.is_empty() => RequestContext::get(self.url),
            None => RequestContext::post(self.url, self.posted),
        }
    }
}

fn load_config(config_json: &str) -> Result<PageConfig, ComponentError> {
    let config_json = if config_json.trim().is_empty() {
        DEFAULT_CONFIG
    } else {
        config_json
    };
    Ok(PageConfig::from_json(config_json)?)
}

/// An empty string means nothing is stored yet; anything else must be JSON.
fn parse_record(record_json: &str) -> Result<StoredRecord, ComponentError> {
    if record_json.trim().is_empty() {
        return Ok(StoredRecord::new());
    }
    serde_json::from_str(record_json)
        .map(StoredRecord::coerce)
        .map_err(ComponentError::RecordParse)
}

fn parse_request(request_json: &str) -> Result<RequestContext, ComponentError> {
    if request_json.trim().is_empty() {
        return Ok(RequestInput::default().into_context());
    }
    let input: RequestInput =
        serde_json::from_str(request_json).map_err(ComponentError::RequestParse)?;
    Ok(input.into_context())
}

fn respond(result: Result<Value, ComponentError>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|error| {
            json!({"error": format!("json encode: {}", error)}).to_string()
        }),
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn respond_string(result: Result<String, ComponentError>) -> String {
    match result {
        Ok(value) => value,
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

/// Normalized page configuration, with defaults filled in.
pub fn describe(config_json: &str) -> String {
    respond(load_config(config_json).and_then(|config| {
        serde_json::to_value(config).map_err(ComponentError::JsonEncode)
    }))
}

/// Structural problems in the configuration. The configuration is `valid`
/// when no issue has `error` severity; warnings still render.
pub fn check_config(config_json: &str) -> String {
    respond(load_config(config_json).map(|config| {
        let issues = check_page_config(&config);
        let valid = !issues.iter().any(ConfigError::is_fatal);
        let issues = issues
            .iter()
            .map(|issue| {
                json!({
                    "code": issue.code(),
                    "severity": if issue.is_fatal() { "error" } else { "warning" },
                    "message": issue.to_string(),
                })
            })
            .collect::<Vec<_>>();
        json!({
            "valid": valid,
            "issues": issues,
        })
    }))
}

pub fn get_record_schema(config_json: &str) -> String {
    respond(load_config(config_json).map(|config| record_schema(&config)))
}

/// Form body markup for the configured sections, pre-filled from the record.
pub fn render_content(config_json: &str, record_json: &str) -> String {
    respond_string(load_config(config_json).and_then(|config| {
        let record = parse_record(record_json)?;
        let ctx = RenderContext::new(&config.option_name, &config.page_header);
        Ok(render_page_content(&ctx, &config.sections, &record))
    }))
}

/// Run one request through the page and report what the host should do.
///
/// The response carries `status` (`redirect` or `render`), the `location` or
/// `html`, and the `record` as stored after the request.
pub fn build_page(config_json: &str, request_json: &str, record_json: &str) -> String {
    respond(load_config(config_json).and_then(|config| {
        let request = parse_request(request_json)?;
        let record = parse_record(record_json)?;
        let option_name = config.option_name.clone();
        let store = if record.is_empty() {
            MemoryStore::new()
        } else {
            MemoryStore::with_record(option_name.clone(), record.clone())
        };

        let mut page = SettingsPage::from_config(store, config);
        let response = page.build_page(&request)?;
        let store = page.into_store();
        let stored = store
            .record(&option_name)
            .cloned()
            .unwrap_or(record)
            .into_value();
        debug!(
            option = option_name.as_str(),
            writes = store.write_count(),
            "component page built"
        );

        Ok(match response {
            PageResponse::Redirect { location } => json!({
                "status": "redirect",
                "location": location,
                "record": stored,
            }),
            PageResponse::Html(html) => json!({
                "status": "render",
                "html": html,
                "record": stored,
            }),
        })
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_returns_default_config() {
        let payload = describe("");
        let config: Value = serde_json::from_str(&payload).expect("valid json");
        assert_eq!(config["option_name"], "acme_settings");
        assert_eq!(config["success_message"], "Settings saved.");
    }

    #[test]
    fn describe_reports_unknown_field_type() {
        let config = json!({
            "option_name": "acme",
            "sections": [ { "fields": [ { "type": "color", "key": "tint", "label": "Tint" } ] } ]
        });
        let payload = describe(&config.to_string());
        let parsed: Value = serde_json::from_str(&payload).expect("json");
        let error = parsed["error"].as_str().expect("error");
        assert!(error.contains("tint"));
        assert!(error.contains("color"));
    }

    #[test]
    fn check_config_flags_duplicates() {
        let config = json!({
            "option_name": "acme",
            "sections": [
                { "fields": [ { "type": "text", "key": "a", "label": "A" } ] },
                { "fields": [ { "type": "number", "key": "a", "label": "A again" } ] }
            ]
        });
        let parsed: Value =
            serde_json::from_str(&check_config(&config.to_string())).expect("json");
        assert_eq!(parsed["valid"], false);
        assert_eq!(parsed["issues"][0]["code"], "duplicate_key");
    }

    #[test]
    fn record_schema_lists_fields() {
        let parsed: Value = serde_json::from_str(&get_record_schema("")).expect("json");
        let props = parsed["properties"].as_object().expect("properties");
        assert!(props.contains_key("site_name"));
        assert_eq!(parsed["properties"]["enable_cache"]["const"], "true");
    }

    #[test]
    fn render_content_prefills_record() {
        let html = render_content("", r#"{"site_name":"Acme"}"#);
        assert!(html.contains("value=\"Acme\""));
        assert!(html.contains("name=\"save_acme_settings\""));
    }

    #[test]
    fn build_page_renders_on_get() {
        let request = json!({ "url": "/wp-admin/admin.php?page=acme" });
        let payload = build_page("", &request.to_string(), r#"{"theme":"dark"}"#);
        let parsed: Value = serde_json::from_str(&payload).expect("json");
        assert_eq!(parsed["status"], "render");
        let html = parsed["html"].as_str().expect("html");
        assert!(html.contains("<option value=\"dark\" selected=\"selected\">Dark</option>"));
        assert!(html.contains("class=\"nav-tab nav-tab-active\">General</a>"));
        assert_eq!(parsed["record"]["theme"], "dark");
    }

    #[test]
    fn build_page_commits_form_body() {
        let request = json!({
            "url": "/wp-admin/admin.php?page=acme",
            "body": "acme_settings%5Bsite_name%5D=Acme&save_acme_settings=Save+Changes"
        });
        let payload = build_page("", &request.to_string(), r#"{"enable_cache":"true"}"#);
        let parsed: Value = serde_json::from_str(&payload).expect("json");
        assert_eq!(parsed["status"], "redirect");
        assert_eq!(
            parsed["location"],
            "/wp-admin/admin.php?page=acme&settings-updated=true"
        );
        assert_eq!(parsed["record"], json!({ "site_name": "Acme" }));
    }

    #[test]
    fn check_config_treats_empty_select_as_warning() {
        let config = json!({
            "option_name": "acme",
            "sections": [ { "fields": [ { "type": "select", "key": "mode", "label": "Mode" } ] } ]
        });
        let parsed: Value =
            serde_json::from_str(&check_config(&config.to_string())).expect("json");
        assert_eq!(parsed["valid"], true);
        assert_eq!(parsed["issues"][0]["code"], "empty_options");
        assert_eq!(parsed["issues"][0]["severity"], "warning");
    }

    #[test]
    fn malformed_record_is_reported() {
        let request = json!({ "url": "/wp-admin/admin.php?page=acme" });
        let parsed: Value =
            serde_json::from_str(&build_page("", &request.to_string(), "{\"theme\":")).expect("json");
        assert!(
            parsed["error"]
                .as_str()
                .expect("error")
                .starts_with("failed to parse stored record")
        );

        let rendered = render_content("", "not json");
        assert!(rendered.contains("failed to parse stored record"));
    }

    #[test]
    fn empty_record_means_nothing_stored() {
        let request = json!({ "url": "/wp-admin/admin.php?page=acme" });
        let parsed: Value =
            serde_json::from_str(&build_page("", &request.to_string(), "")).expect("json");
        assert_eq!(parsed["status"], "render");
        assert_eq!(parsed["record"], json!({}));
    }

    #[test]
    fn build_page_reports_bad_request_json() {
        let payload = build_page("", "{not json", "{}");
        let parsed: Value = serde_json::from_str(&payload).expect("json");
        assert!(
            parsed["error"]
                .as_str()
                .expect("error")
                .starts_with("failed to parse request")
        );
    }
}
