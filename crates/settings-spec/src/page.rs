use handlebars::{Handlebars, RenderError, TemplateError};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::{
    check::ConfigError,
    escape::{escape_attr, escape_html, escape_url},
    hooks::Hooks,
    notice::{Notice, NoticeQueue},
    pipeline::{NOTICE_CHANNEL, PersistOutcome, announce_success, persist},
    render::{PANEL_CLOSE, RenderContext, panel_open, render_content},
    request::RequestContext,
    spec::{
        page::{PageConfig, SidebarPanel, TabSpec},
        section::SectionSpec,
    },
    store::{OptionStore, StoreError},
};

const LAYOUT_TEMPLATE: &str = "settings_page";

const LAYOUT: &str = r#"<div class="wrap">
    <div id="icon-options-general" class="icon32"></div>
    <h2>{{page_header}}</h2>
{{{notices}}}{{{tabs}}}
    <div id="poststuff" class="settings-page-view">
        <div id="post-body" class="metabox-holder columns-2">
            <div id="post-body-content">
                <div class="meta-box-sortables ui-sortable">
                    <form method="post"{{{form_attributes}}}>
{{{content}}}                    </form>
                </div>
            </div>
            <div id="postbox-container-1" class="postbox-container">
                <div class="meta-box-sortables" style="text-align: center; margin: auto">
{{{sidebar}}}                </div>
            </div>
        </div>
    </div>
</div>
{{{script}}}
"#;

/// Collapses and expands panels when their toggle button is clicked.
const TOGGLE_SCRIPT: &str = r#"<script type="text/javascript">
    document.querySelectorAll('.settings-page-view .handlediv').forEach(function (button) {
        button.addEventListener('click', function () {
            var panel = button.parentElement;
            panel.classList.toggle('closed');
            button.setAttribute('aria-expanded', panel.classList.contains('closed') ? 'false' : 'true');
        });
    });
</script>"#;

#[derive(Debug, Error)]
pub enum PageError {
    #[error("invalid page configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("option storage failed: {0}")]
    Store(#[from] StoreError),
    #[error("layout template is invalid: {0}")]
    Template(#[from] TemplateError),
    #[error("layout rendering failed: {0}")]
    Render(#[from] RenderError),
}

/// What the host should send back for this request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageResponse {
    /// A save succeeded; nothing else may be rendered for this request.
    Redirect { location: String },
    Html(String),
}

impl PageResponse {
    pub fn html(&self) -> Option<&str> {
        match self {
            PageResponse::Html(html) => Some(html),
            PageResponse::Redirect { .. } => None,
        }
    }

    pub fn location(&self) -> Option<&str> {
        match self {
            PageResponse::Redirect { location } => Some(location),
            PageResponse::Html(_) => None,
        }
    }
}

/// A settings page bound to one option record in `S`.
///
/// Rejected submissions re-render from the stored record, so the user's
/// edits are not shown again; [`PersistOutcome::Rejected`] still carries them
/// for hosts driving [`persist`] themselves.
#[derive(Debug)]
pub struct SettingsPage<S> {
    store: S,
    config: PageConfig,
    hooks: Hooks,
    notices: NoticeQueue,
}

impl<S: OptionStore> SettingsPage<S> {
    pub fn new(store: S) -> Self {
        Self::from_config(store, PageConfig::default())
    }

    pub fn with_content(
        store: S,
        main_content: Vec<SectionSpec>,
        option_name: impl Into<String>,
        page_header: impl Into<String>,
    ) -> Self {
        let mut config = PageConfig::new(option_name, page_header);
        config.sections = main_content;
        Self::from_config(store, config)
    }

    pub fn from_config(store: S, config: PageConfig) -> Self {
        Self {
            store,
            config,
            hooks: Hooks::default(),
            notices: NoticeQueue::default(),
        }
    }

    pub fn option_name(&mut self, option_name: impl Into<String>) -> &mut Self {
        self.config.option_name = option_name.into();
        self
    }

    pub fn tabs(&mut self, tabs: Vec<TabSpec>) -> &mut Self {
        self.config.tabs = tabs;
        self
    }

    pub fn main_content(&mut self, sections: Vec<SectionSpec>) -> &mut Self {
        self.config.sections = sections;
        self
    }

    pub fn sidebar(&mut self, panels: Vec<SidebarPanel>) -> &mut Self {
        self.config.sidebar = panels;
        self
    }

    pub fn page_header(&mut self, page_header: impl Into<String>) -> &mut Self {
        self.config.page_header = page_header.into();
        self
    }

    pub fn hooks(&mut self, hooks: Hooks) -> &mut Self {
        self.hooks = hooks;
        self
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Queue for notices the host wants shown on the next render.
    pub fn notices_mut(&mut self) -> &mut NoticeQueue {
        &mut self.notices
    }

    /// Handle one request: persist a submission if present, then render.
    ///
    /// A successful save returns [`PageResponse::Redirect`] and renders
    /// nothing. The stored record is read once, after persistence has run.
    pub fn build_page(&mut self, request: &RequestContext) -> Result<PageResponse, PageError> {
        self.config.ensure_valid()?;
        let option_name = self.config.option_name.as_str();

        let outcome = persist(
            option_name,
            request,
            &mut self.store,
            &self.hooks,
            &mut self.notices,
        )?;
        if let PersistOutcome::Committed { location, .. } = outcome {
            return Ok(PageResponse::Redirect { location });
        }

        announce_success(request, &mut self.notices, &self.config.success_message);

        let record = self.store.read(option_name)?.unwrap_or_default();
        let ctx = RenderContext::new(option_name, &self.config.page_header);
        let notices = self.notices.drain(NOTICE_CHANNEL);
        debug!(
            option = option_name,
            stored_fields = record.len(),
            notices = notices.len(),
            "rendering settings page"
        );

        let data = json!({
            "page_header": self.config.page_header,
            "notices": render_notices(&notices),
            "tabs": render_tabs(&self.config.tabs, &request.url),
            "form_attributes": self.hooks.form_tag_attributes(option_name),
            "content": render_content(&ctx, &self.config.sections, &record),
            "sidebar": render_sidebar(&self.config.sidebar),
            "script": TOGGLE_SCRIPT,
        });

        let mut registry = Handlebars::new();
        registry.register_template_string(LAYOUT_TEMPLATE, LAYOUT)?;
        let html = registry.render(LAYOUT_TEMPLATE, &data)?;
        Ok(PageResponse::Html(html))
    }
}

/// Tab strip; a tab is active when its URL equals the request URL exactly.
pub fn render_tabs(tabs: &[TabSpec], current_url: &str) -> String {
    let mut html = String::from("    <h2 class=\"nav-tab-wrapper\">");
    for tab in tabs {
        let active = if tab.url == current_url {
            " nav-tab-active"
        } else {
            ""
        };
        html.push_str(&format!(
            "<a href=\"{href}\" class=\"nav-tab{active}\">{label}</a>",
            href = escape_attr(&escape_url(&tab.url)),
            label = escape_attr(&tab.label),
        ));
    }
    html.push_str("</h2>\n");
    html
}

pub fn render_notices(notices: &[Notice]) -> String {
    notices
        .iter()
        .map(|notice| {
            format!(
                concat!(
                    "    <div id=\"setting-error-{code}\" class=\"{severity} settings-error notice is-dismissible\">",
                    "<p><strong>{message}</strong></p></div>\n",
                ),
                code = escape_attr(&notice.code),
                severity = notice.severity.as_str(),
                message = escape_html(&notice.message),
            )
        })
        .collect()
}

pub fn render_sidebar(panels: &[SidebarPanel]) -> String {
    panels
        .iter()
        .map(|panel| {
            format!(
                "{open}{content}\n{close}",
                open = panel_open(&panel.title, &panel.title),
                content = panel.content,
                close = PANEL_CLOSE,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_one_tab_is_active() {
        let tabs = vec![TabSpec::new("/a", "A"), TabSpec::new("/b", "B")];
        let html = render_tabs(&tabs, "/a");
        assert_eq!(html.matches("nav-tab-active").count(), 1);
        assert!(html.contains("<a href=\"/a\" class=\"nav-tab nav-tab-active\">A</a>"));
        assert!(html.contains("<a href=\"/b\" class=\"nav-tab\">B</a>"));
    }

    #[test]
    fn tab_comparison_is_exact() {
        let tabs = vec![TabSpec::new("/a", "A")];
        assert!(!render_tabs(&tabs, "/a/").contains("nav-tab-active"));
        assert!(!render_tabs(&tabs, "/a?x=1").contains("nav-tab-active"));
    }

    #[test]
    fn notices_carry_severity_class() {
        let html = render_notices(&[
            Notice::error("bad", "Bad <value>"),
            Notice::updated("settings_updated", "Settings saved."),
        ]);
        assert!(html.contains("id=\"setting-error-bad\" class=\"error settings-error"));
        assert!(html.contains("Bad &lt;value&gt;"));
        assert!(html.contains("class=\"updated settings-error"));
    }

    #[test]
    fn sidebar_content_is_emitted_verbatim() {
        let html = render_sidebar(&[SidebarPanel::new("Docs", "<a href=\"/docs\">Read</a>")]);
        assert!(html.contains("<span>Docs</span>"));
        assert!(html.contains("<a href=\"/docs\">Read</a>"));
        assert!(html.ends_with(PANEL_CLOSE));
    }
}
