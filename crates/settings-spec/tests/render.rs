use serde_json::json;

use settings_spec::{
    FieldCommon, FieldSpec, PageConfig, RenderContext, SectionSpec, StoredRecord, render_content,
    render_section,
};

fn fixture(name: &str) -> &'static str {
    match name {
        "general_page" => include_str!("../tests/fixtures/general_page.json"),
        _ => panic!("unknown fixture {}", name),
    }
}

fn general_page() -> PageConfig {
    PageConfig::from_json(fixture("general_page")).expect("deserialize")
}

#[test]
fn content_has_one_header_per_titled_section_and_one_row_per_field() {
    let config = general_page();
    let ctx = RenderContext::new(&config.option_name, &config.page_header);
    let html = render_content(&ctx, &config.sections, &StoredRecord::new());

    let titled = config
        .sections
        .iter()
        .filter(|section| section.header_title().is_some())
        .count();
    let fields = config.fields().count();

    assert_eq!(html.matches("<div class=\"postbox\">").count(), titled);
    assert_eq!(html.matches("<tr>").count(), fields);
    assert_eq!(
        html.matches("name=\"save_acme_settings\"").count(),
        config.sections.len()
    );
}

#[test]
fn fields_render_in_configured_order() {
    let config = general_page();
    let ctx = RenderContext::new(&config.option_name, &config.page_header);
    let html = render_content(&ctx, &config.sections, &StoredRecord::new());

    let positions: Vec<usize> = config
        .fields()
        .map(|field| {
            html.find(&format!("name=\"acme_settings[{}]\"", field.key()))
                .expect("field rendered")
        })
        .collect();
    let mut sorted = positions.clone();
    sorted.sort_unstable();
    assert_eq!(positions, sorted);
}

#[test]
fn select_default_law() {
    let config = general_page();
    let ctx = RenderContext::new(&config.option_name, &config.page_header);

    let empty = render_content(&ctx, &config.sections, &StoredRecord::new());
    assert!(!empty.contains("selected=\"selected\""));

    let record = StoredRecord::coerce(json!({ "theme": "dark" }));
    let html = render_content(&ctx, &config.sections, &record);
    assert_eq!(html.matches("selected=\"selected\"").count(), 1);
    assert!(html.contains("<option value=\"dark\" selected=\"selected\">Dark</option>"));
}

#[test]
fn stored_values_prefill_controls() {
    let config = general_page();
    let ctx = RenderContext::new(&config.option_name, &config.page_header);
    let record = StoredRecord::coerce(json!({
        "site_name": "Acme",
        "enable_cache": "true",
        "footer_note": "Line one",
        "per_page": "20",
        "schema_version": "2"
    }));
    let html = render_content(&ctx, &config.sections, &record);

    assert!(html.contains("name=\"acme_settings[site_name]\" class=\"regular-text\" value=\"Acme\""));
    assert!(html.contains("value=\"true\" checked=\"checked\""));
    assert!(html.contains("rows=\"3\" cols=\"\""));
    assert!(html.contains(">Line one</textarea>"));
    assert!(html.contains("type=\"number\" id=\"per_page\""));
    assert!(html.contains("type=\"hidden\" id=\"schema_version\" name=\"acme_settings[schema_version]\" class=\"regular-text\" value=\"2\""));
}

#[test]
fn repeated_keys_render_without_failing() {
    let section = SectionSpec::new(
        "Dupes",
        vec![
            FieldSpec::text(FieldCommon::new("name", "First")),
            FieldSpec::text(FieldCommon::new("name", "Second")),
        ],
    );
    let ctx = RenderContext::new("acme", "Acme");
    let record = StoredRecord::coerce(json!({ "name": "shared" }));
    let html = render_section(&ctx, &section, &record);
    assert_eq!(html.matches("value=\"shared\"").count(), 2);
}
