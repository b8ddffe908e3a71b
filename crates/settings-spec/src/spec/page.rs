use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::check::ConfigError;
use crate::spec::field::{FieldKind, FieldSpec};
use crate::spec::section::SectionSpec;

/// A navigation tab shown above the form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TabSpec {
    pub url: String,
    pub label: String,
}

impl TabSpec {
    pub fn new(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
        }
    }
}

/// A sidebar panel. `content` is trusted markup and is emitted as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SidebarPanel {
    #[serde(alias = "section_title")]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl SidebarPanel {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Complete declarative description of one settings page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PageConfig {
    /// Name of the single option record the page persists to.
    #[serde(default)]
    pub option_name: String,
    #[serde(default)]
    pub page_header: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tabs: Vec<TabSpec>,
    #[serde(default, alias = "main_content")]
    pub sections: Vec<SectionSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sidebar: Vec<SidebarPanel>,
    /// Notice shown after a successful save.
    #[serde(default = "default_success_message")]
    pub success_message: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            option_name: String::new(),
            page_header: String::new(),
            tabs: Vec::new(),
            sections: Vec::new(),
            sidebar: Vec::new(),
            success_message: default_success_message(),
        }
    }
}

impl PageConfig {
    pub fn new(option_name: impl Into<String>, page_header: impl Into<String>) -> Self {
        Self {
            option_name: option_name.into(),
            page_header: page_header.into(),
            ..Self::default()
        }
    }

    /// Parse a JSON page configuration, naming the offending field when a
    /// field `type` is not one of the supported kinds.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(text).map_err(ConfigError::Parse)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        ensure_known_field_types(&value)?;
        serde_json::from_value(value).map_err(ConfigError::Parse)
    }

    /// Every field across all sections, in configured order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.sections.iter().flat_map(|section| section.fields.iter())
    }

    pub fn find_field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields().find(|field| field.key() == key)
    }

    /// First issue that prevents the page from being built; warnings such as
    /// a select without options are ignored.
    pub fn ensure_valid(&self) -> Result<(), ConfigError> {
        match crate::check::check_config(self)
            .into_iter()
            .find(ConfigError::is_fatal)
        {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

fn default_success_message() -> String {
    "Settings saved.".into()
}

fn ensure_known_field_types(value: &Value) -> Result<(), ConfigError> {
    let sections = value
        .get("sections")
        .or_else(|| value.get("main_content"))
        .and_then(Value::as_array);
    let Some(sections) = sections else {
        return Ok(());
    };

    let fields = sections
        .iter()
        .filter_map(|section| section.get("fields").and_then(Value::as_array))
        .flatten();
    for field in fields {
        if let Some(kind) = field.get("type").and_then(Value::as_str)
            && FieldKind::parse(kind).is_none()
        {
            let key = field
                .get("key")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return Err(ConfigError::UnknownFieldType {
                key,
                kind: kind.to_string(),
            });
        }
    }
    Ok(())
}
