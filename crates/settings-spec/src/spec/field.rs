use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Attributes every field kind carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldCommon {
    /// Storage sub-field of the option record; unique across the page.
    pub key: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: String,
}

impl FieldCommon {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Single-line inputs: text, number and hidden fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InputField {
    #[serde(flatten)]
    pub common: FieldCommon,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TextareaField {
    #[serde(flatten)]
    pub common: FieldCommon,
    #[serde(default = "default_rows")]
    pub rows: u32,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "column",
        alias = "cols"
    )]
    pub columns: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SelectField {
    #[serde(flatten)]
    pub common: FieldCommon,
    /// Option value to label, rendered in insertion order.
    #[serde(default)]
    pub options: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CheckboxField {
    #[serde(flatten)]
    pub common: FieldCommon,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkbox_label: Option<String>,
    /// Value submitted when checked.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "value",
        alias = "on_value"
    )]
    pub on_value: Option<String>,
}

impl CheckboxField {
    pub const DEFAULT_LABEL: &'static str = "Activate";
    pub const DEFAULT_ON_VALUE: &'static str = "true";

    pub fn checkbox_label(&self) -> &str {
        non_empty(self.checkbox_label.as_deref()).unwrap_or(Self::DEFAULT_LABEL)
    }

    pub fn on_value(&self) -> &str {
        non_empty(self.on_value.as_deref()).unwrap_or(Self::DEFAULT_ON_VALUE)
    }
}

/// One field of the settings form, discriminated by its `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldSpec {
    Text(InputField),
    Number(InputField),
    Textarea(TextareaField),
    Select(SelectField),
    Checkbox(CheckboxField),
    Hidden(InputField),
}

/// Field kinds without their payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Text,
    Number,
    Textarea,
    Select,
    Checkbox,
    Hidden,
}

impl FieldKind {
    pub const ALL: [FieldKind; 6] = [
        FieldKind::Text,
        FieldKind::Number,
        FieldKind::Textarea,
        FieldKind::Select,
        FieldKind::Checkbox,
        FieldKind::Hidden,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Textarea => "textarea",
            FieldKind::Select => "select",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Hidden => "hidden",
        }
    }

    pub fn parse(label: &str) -> Option<FieldKind> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == label)
    }
}

impl FieldSpec {
    pub fn text(common: FieldCommon) -> Self {
        FieldSpec::Text(InputField { common })
    }

    pub fn number(common: FieldCommon) -> Self {
        FieldSpec::Number(InputField { common })
    }

    pub fn hidden(common: FieldCommon) -> Self {
        FieldSpec::Hidden(InputField { common })
    }

    pub fn textarea(common: FieldCommon) -> Self {
        FieldSpec::Textarea(TextareaField {
            common,
            rows: default_rows(),
            columns: None,
        })
    }

    pub fn select<K, L>(common: FieldCommon, options: impl IntoIterator<Item = (K, L)>) -> Self
    where
        K: Into<String>,
        L: Into<String>,
    {
        FieldSpec::Select(SelectField {
            common,
            options: options
                .into_iter()
                .map(|(value, label)| (value.into(), label.into()))
                .collect(),
        })
    }

    pub fn checkbox(common: FieldCommon) -> Self {
        FieldSpec::Checkbox(CheckboxField {
            common,
            checkbox_label: None,
            on_value: None,
        })
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldSpec::Text(_) => FieldKind::Text,
            FieldSpec::Number(_) => FieldKind::Number,
            FieldSpec::Textarea(_) => FieldKind::Textarea,
            FieldSpec::Select(_) => FieldKind::Select,
            FieldSpec::Checkbox(_) => FieldKind::Checkbox,
            FieldSpec::Hidden(_) => FieldKind::Hidden,
        }
    }

    pub fn common(&self) -> &FieldCommon {
        match self {
            FieldSpec::Text(field) | FieldSpec::Number(field) | FieldSpec::Hidden(field) => {
                &field.common
            }
            FieldSpec::Textarea(field) => &field.common,
            FieldSpec::Select(field) => &field.common,
            FieldSpec::Checkbox(field) => &field.common,
        }
    }

    pub fn key(&self) -> &str {
        &self.common().key
    }

    pub fn label(&self) -> &str {
        &self.common().label
    }

    pub fn description(&self) -> &str {
        &self.common().description
    }
}

fn default_rows() -> u32 {
    5
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn textarea_defaults_to_five_rows() {
        let field: FieldSpec = serde_json::from_value(json!({
            "type": "textarea",
            "key": "bio",
            "label": "Bio"
        }))
        .expect("deserialize");
        match field {
            FieldSpec::Textarea(textarea) => {
                assert_eq!(textarea.rows, 5);
                assert_eq!(textarea.columns, None);
                assert_eq!(textarea.common.description, "");
            }
            other => panic!("unexpected field {other:?}"),
        }
    }

    #[test]
    fn textarea_accepts_legacy_column_key() {
        let field: FieldSpec = serde_json::from_value(json!({
            "type": "textarea",
            "key": "bio",
            "label": "Bio",
            "column": 40
        }))
        .expect("deserialize");
        let FieldSpec::Textarea(textarea) = field else {
            panic!("expected textarea");
        };
        assert_eq!(textarea.columns, Some(40));
    }

    #[test]
    fn select_options_keep_insertion_order() {
        let field: FieldSpec = serde_json::from_value(json!({
            "type": "select",
            "key": "color",
            "label": "Color",
            "options": { "zeta": "Zeta", "alpha": "Alpha", "mid": "Mid" }
        }))
        .expect("deserialize");
        let FieldSpec::Select(select) = field else {
            panic!("expected select");
        };
        let keys: Vec<_> = select.options.keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn checkbox_defaults_apply_when_blank() {
        let field: FieldSpec = serde_json::from_value(json!({
            "type": "checkbox",
            "key": "enable_cache",
            "label": "Cache",
            "checkbox_label": "",
            "value": ""
        }))
        .expect("deserialize");
        let FieldSpec::Checkbox(checkbox) = field else {
            panic!("expected checkbox");
        };
        assert_eq!(checkbox.checkbox_label(), "Activate");
        assert_eq!(checkbox.on_value(), "true");
    }

    #[test]
    fn unknown_type_is_rejected() {
        let result: Result<FieldSpec, _> = serde_json::from_value(json!({
            "type": "radio",
            "key": "choice",
            "label": "Choice"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn kind_labels_round_trip() {
        for kind in FieldKind::ALL {
            assert_eq!(FieldKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(FieldKind::parse("radio"), None);
    }
}
