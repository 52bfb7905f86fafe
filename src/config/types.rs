//! Configuration type definitions.
//!
//! This module contains all the data structures used in signal-pages configuration files.
//! These types are pure data - no I/O or complex logic.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// =============================================================================
// Top-level config
// =============================================================================

/// Configuration for one extraction run.
///
/// Every field has a default, so an empty (or absent) config file is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalsConfig {
    /// The HTML page containing the signal cards
    #[serde(default = "default_input")]
    pub input: PathBuf,
    /// Where rendered pages are written (defaults per variant)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    /// Which rendering pipeline to run
    #[serde(default)]
    pub variant: Variant,
    /// External template used by the `template` variant
    #[serde(default = "default_template")]
    pub template: PathBuf,
    /// Record a failing card and continue with the rest instead of aborting
    #[serde(default)]
    pub keep_going: bool,
    /// Write a `signals.json` manifest of the extracted records
    #[serde(default)]
    pub manifest: bool,
    #[serde(default)]
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub defaults: FieldDefaults,
    #[serde(default)]
    pub chart: ChartConfig,
    /// Directory the config was loaded from; anchors the default output directory
    #[serde(skip)]
    pub base_path: PathBuf,
}

fn default_input() -> PathBuf {
    PathBuf::from("v13.html")
}

fn default_template() -> PathBuf {
    PathBuf::from("template.html")
}

impl Default for SignalsConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            output: None,
            variant: Variant::default(),
            template: default_template(),
            keep_going: false,
            manifest: false,
            selectors: SelectorConfig::default(),
            defaults: FieldDefaults::default(),
            chart: ChartConfig::default(),
            base_path: PathBuf::new(),
        }
    }
}

impl SignalsConfig {
    /// The output directory, falling back to the variant's conventional name.
    pub fn output_dir(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.base_path.join(self.variant.default_output()))
    }

    /// Resolve relative paths against a base path (the config file's directory).
    pub fn resolve_paths(&mut self, base_path: &std::path::Path) {
        let resolve = |path: &PathBuf| {
            if path.is_relative() {
                base_path.join(path)
            } else {
                path.clone()
            }
        };
        self.input = resolve(&self.input);
        self.template = resolve(&self.template);
        self.output = self.output.as_ref().map(resolve);
        self.base_path = base_path.to_path_buf();
    }
}

// =============================================================================
// Variant
// =============================================================================

/// The two rendering pipelines. They share extraction and differ in output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Fill an external template file; no chart
    Template,
    /// Built-in self-contained page with a line chart
    #[default]
    Chart,
}

impl Variant {
    pub fn default_output(&self) -> &'static str {
        match self {
            Variant::Template => "signals_output",
            Variant::Chart => "signals_with_charts",
        }
    }
}

// =============================================================================
// Selectors
// =============================================================================

/// CSS selectors locating cards and their fields.
///
/// Field selectors are matched only inside a card. The link selector is
/// matched only inside the description block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub card: String,
    pub ticker: String,
    pub label: String,
    pub title: String,
    pub price: String,
    pub change: String,
    pub stat: String,
    pub stat_label: String,
    pub stat_value: String,
    pub description: String,
    pub link: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            card: "div.signal-card".to_string(),
            ticker: "span.ticker".to_string(),
            label: "span.strategy-badge".to_string(),
            title: "div.company-name".to_string(),
            price: "span.price".to_string(),
            change: "span.change".to_string(),
            stat: "div.stat".to_string(),
            stat_label: "div.stat-label".to_string(),
            stat_value: "div.stat-value".to_string(),
            description: "div.strategy-desc".to_string(),
            link: "a".to_string(),
        }
    }
}

// =============================================================================
// Field defaults
// =============================================================================

/// Per-field fallback strings used when a card lacks an element or its text is blank.
///
/// `stat_label` may contain `{n}`, replaced by the stat's 1-based position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDefaults {
    pub ticker: String,
    pub label: String,
    pub title: String,
    pub price: String,
    pub change: String,
    pub description: String,
    pub link_text: String,
    pub link_url: String,
    pub stat_label: String,
    pub stat_value: String,
}

impl Default for FieldDefaults {
    fn default() -> Self {
        Self {
            ticker: "Signal".to_string(),
            label: "Strategy".to_string(),
            title: "Company".to_string(),
            price: "Price".to_string(),
            change: "Change".to_string(),
            description: "No Description".to_string(),
            link_text: "More Info".to_string(),
            link_url: "#".to_string(),
            stat_label: "Stat{n}".to_string(),
            stat_value: "-".to_string(),
        }
    }
}

impl FieldDefaults {
    /// Every (field name, default) pair, in declaration order.
    #[cfg(test)]
    pub fn entries(&self) -> [(&'static str, &str); 10] {
        [
            ("ticker", self.ticker.as_str()),
            ("label", self.label.as_str()),
            ("title", self.title.as_str()),
            ("price", self.price.as_str()),
            ("change", self.change.as_str()),
            ("description", self.description.as_str()),
            ("link_text", self.link_text.as_str()),
            ("link_url", self.link_url.as_str()),
            ("stat_label", self.stat_label.as_str()),
            ("stat_value", self.stat_value.as_str()),
        ]
    }

    /// Default label for the stat at 1-based position `n`.
    pub fn stat_label_for(&self, n: usize) -> String {
        self.stat_label.replace("{n}", &n.to_string())
    }
}

// =============================================================================
// Chart configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// How chart data is matched to cards
    pub strategy: CorrelationStrategy,
    /// Chart.js script included by rendered chart pages
    pub script_url: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            strategy: CorrelationStrategy::default(),
            script_url: "https://cdn.jsdelivr.net/npm/chart.js".to_string(),
        }
    }
}

/// Chart correlation strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationStrategy {
    /// Tokenize chart calls and capture `data` by balanced-brace scanning
    #[default]
    Scan,
    /// Lower-cased regex search ending at the next `options:` key
    Pattern,
}
