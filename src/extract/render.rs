use std::path::{Path, PathBuf};

use tera::{Context, Tera};

use crate::config::FieldDefaults;

use super::cards::{Card, Stat};

/// Name the external template is registered under (the `.html` suffix turns on autoescaping).
const TEMPLATE_NAME: &str = "template.html";
const CHART_TEMPLATE_NAME: &str = "chart.html";
const CHART_TEMPLATE: &str = include_str!("../../templates/chart.html");

/// Number of fixed `STATn_*` placeholders.
const STAT_SLOTS: usize = 3;

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("template error in '{name}': {message}")]
    Template { name: String, message: String },

    #[error("failed to read template {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl RenderError {
    /// Flatten a tera error and its causes into one message.
    fn template(name: &str, err: tera::Error) -> Self {
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::Template {
            name: name.to_string(),
            message,
        }
    }
}

/// The page renderer, wrapping Tera with a single page template.
pub struct Renderer {
    tera: Tera,
    name: &'static str,
}

impl Renderer {
    /// Load an external template file.
    pub fn from_template_file(path: &Path) -> Result<Self, RenderError> {
        let source = std::fs::read_to_string(path).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_source(TEMPLATE_NAME, &source)
    }

    /// The built-in self-contained chart page.
    pub fn chart_page() -> Result<Self, RenderError> {
        Self::from_source(CHART_TEMPLATE_NAME, CHART_TEMPLATE)
    }

    fn from_source(name: &'static str, source: &str) -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_template(name, source)
            .map_err(|e| RenderError::template(name, e))?;
        Ok(Self { tera, name })
    }

    /// Render one card's page.
    ///
    /// Referencing a variable that is not in the context is an error.
    pub fn render_page(&self, page: &PageContext) -> Result<String, RenderError> {
        self.tera
            .render(self.name, &page.to_context())
            .map_err(|e| RenderError::template(self.name, e))
    }
}

/// Everything a page template can reference for one card.
#[derive(Debug)]
pub struct PageContext<'a> {
    pub card: &'a Card,
    /// 1-based position of the card in the source page
    pub index: usize,
    /// Fills the fixed stat slots a card has no stat for
    pub defaults: &'a FieldDefaults,
    /// Chart data literal (chart pages only), inserted unescaped
    pub chart: Option<ChartInfo<'a>>,
}

#[derive(Debug)]
pub struct ChartInfo<'a> {
    pub data: &'a str,
    pub script_url: &'a str,
}

impl PageContext<'_> {
    fn to_context(&self) -> Context {
        let card = self.card;
        let mut ctx = Context::new();

        ctx.insert("card", card);
        ctx.insert("stats", &card.stats);
        ctx.insert("INDEX", &self.index);
        ctx.insert("TICKER", &card.ticker);
        ctx.insert("SLUG", &card.slug);
        ctx.insert("STRATEGY", &card.label);
        ctx.insert("COMPANY_NAME", &card.title);
        ctx.insert("PRICE", &card.price);
        ctx.insert("PRICE_RAW", &card.price_text);
        ctx.insert("CHANGE", &card.change_text);
        ctx.insert("DESCRIPTION", &card.description);
        ctx.insert("LINK_URL", &card.link_url);
        ctx.insert("LINK_TEXT", &card.link_text);

        for n in 1..=STAT_SLOTS {
            let (label, value) = match card.stats.get(n - 1) {
                Some(Stat { label, value }) => (label.clone(), value.clone()),
                None => (
                    self.defaults.stat_label_for(n),
                    self.defaults.stat_value.clone(),
                ),
            };
            ctx.insert(format!("STAT{n}_LABEL"), &label);
            ctx.insert(format!("STAT{n}_VALUE"), &value);
        }

        if let Some(chart) = &self.chart {
            ctx.insert("chart", chart.data);
            ctx.insert("chart_id", &chart_dom_id(&card.slug));
            ctx.insert("chart_script_url", chart.script_url);
        }

        ctx
    }
}

/// The canvas id a chart page draws into. Correlation searches for the same id.
pub fn chart_dom_id(slug: &str) -> String {
    format!("chart-{slug}")
}
