use serde_json::{Map, Value, json};

use crate::spec::{field::FieldSpec, page::PageConfig};

/// JSON Schema describing the option record a page stores.
///
/// Every value is stored as sanitized text. Checkboxes accept only their
/// on-value and may be absent; selects accept their option keys.
pub fn generate(config: &PageConfig) -> Value {
    let mut properties = Map::new();
    for field in config.fields() {
        properties.insert(field.key().to_string(), field_schema(field));
    }

    let title = if config.page_header.is_empty() {
        &config.option_name
    } else {
        &config.page_header
    };

    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": title,
        "type": "object",
        "properties": properties,
        "additionalProperties": true,
    })
}

fn field_schema(field: &FieldSpec) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("string".into()));
    if !field.label().is_empty() {
        schema.insert("title".into(), Value::String(field.label().to_string()));
    }
    if !field.description().is_empty() {
        schema.insert(
            "description".into(),
            Value::String(field.description().to_string()),
        );
    }

    match field {
        FieldSpec::Select(select) if !select.options.is_empty() => {
            schema.insert(
                "enum".into(),
                Value::Array(
                    select
                        .options
                        .keys()
                        .map(|value| Value::String(value.clone()))
                        .collect(),
                ),
            );
        }
        FieldSpec::Checkbox(checkbox) => {
            schema.insert("const".into(), Value::String(checkbox.on_value().into()));
        }
        FieldSpec::Number(_) => {
            schema.insert(
                "pattern".into(),
                Value::String(r"^(-?[0-9]+(\.[0-9]+)?)?$".into()),
            );
        }
        _ => {}
    }

    Value::Object(schema)
}
