use tracing::trace;

use crate::{
    escape::{escape_attr, escape_html, strip_slashes},
    record::StoredRecord,
    request::RequestContext,
    spec::{
        field::{CheckboxField, FieldSpec, SelectField, TextareaField},
        section::SectionSpec,
    },
};

/// Page-level values the renderers need besides the field itself.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub option_name: &'a str,
    pub page_header: &'a str,
}

impl<'a> RenderContext<'a> {
    pub fn new(option_name: &'a str, page_header: &'a str) -> Self {
        Self {
            option_name,
            page_header,
        }
    }

    /// Submitted name of a field: `option_name[key]`.
    fn field_name(&self, key: &str) -> String {
        format!("{}[{}]", escape_attr(self.option_name), escape_attr(key))
    }
}

/// Render one field as a table row pre-filled from the stored record.
pub fn render_field(ctx: &RenderContext<'_>, field: &FieldSpec, record: &StoredRecord) -> String {
    let key = escape_attr(field.key());
    let name = ctx.field_name(field.key());
    let current = record.display_value(field.key());

    let control = match field {
        FieldSpec::Text(_) => input_control("text", &key, &name, current.as_deref()),
        FieldSpec::Number(_) => input_control("number", &key, &name, current.as_deref()),
        FieldSpec::Hidden(_) => input_control("hidden", &key, &name, current.as_deref()),
        FieldSpec::Textarea(textarea) => {
            textarea_control(textarea, &key, &name, current.as_deref())
        }
        FieldSpec::Select(select) => select_control(select, &key, &name, current.as_deref()),
        FieldSpec::Checkbox(checkbox) => {
            checkbox_control(checkbox, &key, &name, current.as_deref())
        }
    };

    format!(
        concat!(
            "<tr>\n",
            "    <th scope=\"row\"><label for=\"{key}\">{label}</label></th>\n",
            "    <td>\n",
            "        {control}\n",
            "        <p class=\"description\">{description}</p>\n",
            "    </td>\n",
            "</tr>\n",
        ),
        key = key,
        label = escape_attr(field.label()),
        control = control,
        description = escape_html(field.description()),
    )
}

/// Render a section: optional collapsible header, one row per field, and a
/// footer carrying the submit control for this option.
///
/// Repeated keys are rendered as configured; nothing is deduplicated.
pub fn render_section(
    ctx: &RenderContext<'_>,
    section: &SectionSpec,
    record: &StoredRecord,
) -> String {
    let title = section.header_title();
    let mut html = String::new();

    if let Some(title) = title {
        html.push_str(&section_header(ctx, title));
    }
    html.push_str("<table class=\"form-table\">\n");
    for field in &section.fields {
        html.push_str(&render_field(ctx, field, record));
    }
    html.push_str(&section_footer(ctx, title.is_some()));
    html
}

/// Render every section in configured order. No sections, no markup.
pub fn render_content(
    ctx: &RenderContext<'_>,
    sections: &[SectionSpec],
    record: &StoredRecord,
) -> String {
    trace!(
        option = ctx.option_name,
        sections = sections.len(),
        "rendering settings content"
    );
    sections
        .iter()
        .map(|section| render_section(ctx, section, record))
        .collect()
}

/// Collapsible panel chrome shared by titled sections and sidebar panels.
pub(crate) fn panel_open(toggle_label: &str, title: &str) -> String {
    format!(
        concat!(
            "<div class=\"postbox\">\n",
            "<button type=\"button\" class=\"handlediv button-link\" aria-expanded=\"true\">\n",
            "    <span class=\"screen-reader-text\">Toggle panel: {toggle}</span>",
            "<span class=\"toggle-indicator\" aria-hidden=\"true\"></span>\n",
            "</button>\n",
            "<h3 class=\"hndle\"><span>{title}</span></h3>\n",
            "<div class=\"inside\">\n",
        ),
        toggle = escape_html(toggle_label),
        title = escape_attr(title),
    )
}

pub(crate) const PANEL_CLOSE: &str = "</div>\n</div>\n";

fn section_header(ctx: &RenderContext<'_>, title: &str) -> String {
    panel_open(ctx.page_header, title)
}

fn section_footer(ctx: &RenderContext<'_>, close_panel: bool) -> String {
    let mut html = format!(
        concat!(
            "</table>\n",
            "<p><input class=\"button-primary\" type=\"submit\" name=\"{marker}\" ",
            "value=\"Save Changes\"></p>\n",
        ),
        marker = escape_attr(&RequestContext::submit_marker(ctx.option_name)),
    );
    if close_panel {
        html.push_str(PANEL_CLOSE);
    }
    html
}

fn input_control(kind: &str, key: &str, name: &str, current: Option<&str>) -> String {
    format!(
        "<input type=\"{kind}\" id=\"{key}\" name=\"{name}\" class=\"regular-text\" value=\"{value}\"/>",
        value = escape_attr(current.unwrap_or_default()),
    )
}

fn textarea_control(
    textarea: &TextareaField,
    key: &str,
    name: &str,
    current: Option<&str>,
) -> String {
    let columns = textarea
        .columns
        .map(|columns| columns.to_string())
        .unwrap_or_default();
    let text = current.map(strip_slashes).unwrap_or_default();
    format!(
        "<textarea rows=\"{rows}\" cols=\"{columns}\" name=\"{name}\" id=\"{key}\">{text}</textarea>",
        rows = textarea.rows,
        text = escape_html(&text),
    )
}

/// Only a stored value marks an option selected; with nothing stored the
/// browser's own default (the first option) applies.
fn select_control(select: &SelectField, key: &str, name: &str, current: Option<&str>) -> String {
    let mut html = format!("<select id=\"{key}\" name=\"{name}\">\n");
    for (value, label) in &select.options {
        let selected = if current == Some(value.as_str()) {
            " selected=\"selected\""
        } else {
            ""
        };
        html.push_str(&format!(
            "            <option value=\"{value}\"{selected}>{label}</option>\n",
            value = escape_attr(value),
            label = escape_html(label),
        ));
    }
    html.push_str("        </select>");
    html
}

/// Checked only when the stored value equals the on-value; an absent key
/// (the browser omits unchecked boxes) renders unchecked.
fn checkbox_control(
    checkbox: &CheckboxField,
    key: &str,
    name: &str,
    current: Option<&str>,
) -> String {
    let on_value = checkbox.on_value();
    let checked = if current == Some(on_value) {
        " checked=\"checked\""
    } else {
        ""
    };
    format!(
        concat!(
            "<strong><label for=\"{key}\">{checkbox_label}</label></strong>\n",
            "        <input type=\"checkbox\" id=\"{key}\" name=\"{name}\" value=\"{value}\"{checked} />",
        ),
        key = key,
        checkbox_label = escape_attr(checkbox.checkbox_label()),
        name = name,
        value = escape_attr(on_value),
        checked = checked,
    )
}
