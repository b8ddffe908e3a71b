pub mod field;
pub mod page;
pub mod section;

pub use field::{
    CheckboxField, FieldCommon, FieldKind, FieldSpec, InputField, SelectField, TextareaField,
};
pub use page::{PageConfig, SidebarPanel, TabSpec};
pub use section::SectionSpec;
