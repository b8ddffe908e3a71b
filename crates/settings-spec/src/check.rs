use std::collections::BTreeSet;

use thiserror::Error;

use crate::spec::{field::FieldSpec, page::PageConfig};

/// Configuration mistakes that make a page unrenderable.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse page configuration: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("field '{key}' uses unknown type '{kind}'")]
    UnknownFieldType { key: String, kind: String },
    #[error("option name must not be empty")]
    MissingOptionName,
    #[error("field #{index} of section #{section} has an empty key")]
    EmptyKey { section: usize, index: usize },
    #[error("field key '{0}' is declared more than once")]
    DuplicateKey(String),
    #[error("select field '{0}' has no options")]
    EmptyOptions(String),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Parse(_) => "parse",
            ConfigError::UnknownFieldType { .. } => "unknown_field_type",
            ConfigError::MissingOptionName => "missing_option_name",
            ConfigError::EmptyKey { .. } => "empty_key",
            ConfigError::DuplicateKey(_) => "duplicate_key",
            ConfigError::EmptyOptions(_) => "empty_options",
        }
    }

    /// Whether the page cannot be built with this issue present. A select
    /// without options still renders, as an empty list.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ConfigError::EmptyOptions(_))
    }
}

/// Report every structural problem in the configuration, in configured order.
///
/// Field keys double as sub-fields of one flat record, so a key may appear only
/// once across all sections.
pub fn check_config(config: &PageConfig) -> Vec<ConfigError> {
    let mut issues = Vec::new();

    if config.option_name.trim().is_empty() {
        issues.push(ConfigError::MissingOptionName);
    }

    let mut seen = BTreeSet::new();
    let mut reported = BTreeSet::new();
    for (section_index, section) in config.sections.iter().enumerate() {
        for (field_index, field) in section.fields.iter().enumerate() {
            let key = field.key();
            if key.trim().is_empty() {
                issues.push(ConfigError::EmptyKey {
                    section: section_index,
                    index: field_index,
                });
                continue;
            }
            if !seen.insert(key) && reported.insert(key) {
                issues.push(ConfigError::DuplicateKey(key.to_string()));
            }
            if let FieldSpec::Select(select) = field
                && select.options.is_empty()
            {
                issues.push(ConfigError::EmptyOptions(key.to_string()));
            }
        }
    }

    issues
}
