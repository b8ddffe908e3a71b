use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::notice::Notice;
use crate::sanitize::{Sanitizer, default_sanitizer};

/// Inspects the raw submission and appends any problems it finds.
pub type Validator = Arc<dyn Fn(&Value, &mut Vec<Notice>) + Send + Sync>;
/// Receives the default sanitizer and returns the one to use.
pub type SanitizerOverride = Arc<dyn Fn(Sanitizer) -> Sanitizer + Send + Sync>;
/// Final transformation of sanitized data before it is stored.
pub type PostSanitizeFilter = Arc<dyn Fn(Value) -> Value + Send + Sync>;
/// Extra attributes for the `<form>` tag, given the option name.
pub type FormTagHook = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Optional strategies injected into the page. Unset hooks are no-ops.
#[derive(Clone, Default)]
pub struct Hooks {
    validator: Option<Validator>,
    sanitizer_override: Option<SanitizerOverride>,
    post_sanitize: Option<PostSanitizeFilter>,
    form_tag: Option<FormTagHook>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Value, &mut Vec<Notice>) + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn with_sanitizer_override<F>(mut self, sanitizer_override: F) -> Self
    where
        F: Fn(Sanitizer) -> Sanitizer + Send + Sync + 'static,
    {
        self.sanitizer_override = Some(Arc::new(sanitizer_override));
        self
    }

    pub fn with_post_sanitize<F>(mut self, filter: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.post_sanitize = Some(Arc::new(filter));
        self
    }

    pub fn with_form_tag<F>(mut self, form_tag: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.form_tag = Some(Arc::new(form_tag));
        self
    }

    pub fn validate(&self, submitted: &Value) -> Vec<Notice> {
        let mut reported = Vec::new();
        if let Some(validator) = &self.validator {
            validator(submitted, &mut reported);
        }
        reported
    }

    pub fn sanitizer(&self) -> Sanitizer {
        let default = default_sanitizer();
        match &self.sanitizer_override {
            Some(sanitizer_override) => sanitizer_override(default),
            None => default,
        }
    }

    pub fn post_sanitize(&self, sanitized: Value) -> Value {
        match &self.post_sanitize {
            Some(filter) => filter(sanitized),
            None => sanitized,
        }
    }

    /// Attribute text for the form tag, with a leading space when non-empty.
    pub fn form_tag_attributes(&self, option_name: &str) -> String {
        let extra = self
            .form_tag
            .as_ref()
            .map(|form_tag| form_tag(option_name))
            .unwrap_or_default();
        let extra = extra.trim();
        if extra.is_empty() {
            String::new()
        } else {
            format!(" {extra}")
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("validator", &self.validator.is_some())
            .field("sanitizer_override", &self.sanitizer_override.is_some())
            .field("post_sanitize", &self.post_sanitize.is_some())
            .field("form_tag", &self.form_tag.is_some())
            .finish()
    }
}
