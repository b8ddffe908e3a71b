use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::field::FieldSpec;

/// A titled or untitled group of fields rendered inside one panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SectionSpec {
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "section_title")]
    pub title: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl SectionSpec {
    pub fn new(title: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            title: Some(title.into()),
            fields,
        }
    }

    pub fn untitled(fields: Vec<FieldSpec>) -> Self {
        Self {
            title: None,
            fields,
        }
    }

    /// Title to show in the panel header, if any. Only an empty title counts
    /// as absent; whitespace is kept.
    pub fn header_title(&self) -> Option<&str> {
        self.title.as_deref().filter(|title| !title.is_empty())
    }
}
