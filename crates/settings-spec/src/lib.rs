#![allow(missing_docs)]

pub mod check;
pub mod escape;
pub mod hooks;
pub mod notice;
pub mod page;
pub mod pipeline;
pub mod record;
pub mod record_schema;
pub mod render;
pub mod request;
pub mod sanitize;
pub mod spec;
pub mod store;

pub use check::{ConfigError, check_config};
pub use hooks::{FormTagHook, Hooks, PostSanitizeFilter, SanitizerOverride, Validator};
pub use notice::{Notice, NoticeQueue, Severity, ValidationError};
pub use page::{PageError, PageResponse, SettingsPage};
pub use pipeline::{NOTICE_CHANNEL, PersistOutcome, announce_success, persist};
pub use record::StoredRecord;
pub use record_schema::generate as record_schema;
pub use render::{RenderContext, render_content, render_field, render_section};
pub use request::RequestContext;
pub use sanitize::{Sanitizer, default_sanitizer, sanitize_text, sanitize_value};
pub use spec::{
    CheckboxField, FieldCommon, FieldKind, FieldSpec, InputField, PageConfig, SectionSpec,
    SelectField, SidebarPanel, TabSpec, TextareaField,
};
pub use store::{JsonFileStore, MemoryStore, OptionStore, StoreError};
