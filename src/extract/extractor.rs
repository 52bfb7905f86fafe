use std::path::PathBuf;

use crate::config::{SignalsConfig, Variant};

use super::cards::{SelectorError, Selectors, locate_cards};
use super::chart::ScriptBuffer;
use super::document::{LoadError, SourceDocument, load_document};
use super::paths::MANIFEST_FILE;
use super::pipeline::{Pipeline, PipelineContext, PipelineError, ProcessingCard};
use super::render::{RenderError, Renderer};

/// Report line for a page without any signal cards.
pub const NO_SIGNALS: &str = "No signals found!";

#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    #[error("{0}")]
    Selector(#[from] SelectorError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// What happened to one card.
#[derive(Debug)]
pub struct CardOutcome {
    /// 1-based position in the source page
    pub index: usize,
    /// The card's ticker, if its fields were extracted
    pub ticker: Option<String>,
    /// Written page path, or the error that stopped the card
    pub result: Result<PathBuf, String>,
}

pub struct ExtractResult {
    pub output_dir: PathBuf,
    pub cards_found: usize,
    pub outcomes: Vec<CardOutcome>,
    pub manifest: Option<PathBuf>,
}

impl ExtractResult {
    /// Number of pages written.
    pub fn written(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Outcomes of cards that failed.
    pub fn failures(&self) -> impl Iterator<Item = &CardOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    /// The closing report line of a run.
    pub fn summary(&self) -> String {
        if self.cards_found == 0 {
            return NO_SIGNALS.to_string();
        }

        let display_output = self
            .output_dir
            .canonicalize()
            .unwrap_or_else(|_| self.output_dir.clone());
        format!(
            "Wrote {} of {} page(s) to {}",
            self.written(),
            self.cards_found,
            display_output.display()
        )
    }
}

pub struct Extractor {
    config: SignalsConfig,
}

impl Extractor {
    pub fn new(config: SignalsConfig) -> Self {
        Self { config }
    }

    pub fn run(&self) -> Result<ExtractResult, ExtractError> {
        // Run:
        // 1. Compile selectors
        // 2. Load and parse the source page
        // 3. Locate cards (stop here if there are none)
        // 4. Load renderer (template) and script text
        // 5. Create output directory
        // 6. Run every card through the pipeline

        // Step 1: Invalid selectors fail before any I/O
        let selectors = Selectors::compile(&self.config.selectors)?;

        // Step 2: Load the source page
        let text = load_document(&self.config.input)?;
        let doc = SourceDocument::parse(&text);

        // Step 3: Locate cards
        let elements = locate_cards(&doc, &selectors);
        let output_dir = self.config.output_dir();
        if elements.is_empty() {
            let result = ExtractResult {
                output_dir,
                cards_found: 0,
                outcomes: Vec::new(),
                manifest: None,
            };
            println!("{}", result.summary());
            return Ok(result);
        }
        println!(
            "Found {} signal card(s) in {}",
            elements.len(),
            self.config.input.display()
        );

        // Step 4: Load renderer and, for charts, the page's script text
        let (renderer, scripts) = match self.config.variant {
            Variant::Template => (Renderer::from_template_file(&self.config.template)?, None),
            Variant::Chart => (Renderer::chart_page()?, Some(ScriptBuffer::from_document(&doc))),
        };

        // Step 5: Create output directory
        std::fs::create_dir_all(&output_dir).map_err(|source| ExtractError::OutputDir {
            path: output_dir.clone(),
            source,
        })?;

        // Step 6: Process cards
        let ctx = PipelineContext {
            output_dir: &output_dir,
            selectors: &selectors,
            defaults: &self.config.defaults,
            scripts: scripts.as_ref(),
            chart: &self.config.chart,
            renderer: &renderer,
            keep_going: self.config.keep_going,
        };
        let mut cards: Vec<ProcessingCard> = elements
            .into_iter()
            .enumerate()
            .map(|(i, element)| ProcessingCard::new(i + 1, element))
            .collect();

        Pipeline::for_config(&self.config).run(&mut cards, &ctx)?;

        let outcomes: Vec<CardOutcome> = cards.into_iter().map(outcome).collect();
        let result = ExtractResult {
            cards_found: outcomes.len(),
            manifest: self
                .config
                .manifest
                .then(|| output_dir.join(MANIFEST_FILE)),
            output_dir,
            outcomes,
        };
        println!("{}", result.summary());

        Ok(result)
    }
}

fn outcome(card: ProcessingCard<'_>) -> CardOutcome {
    let ticker = card.card.as_ref().map(|c| c.ticker.clone());
    let result = match (card.failure, card.output_path) {
        (Some(failure), _) => Err(format!("{} stage: {}", failure.stage, failure.error)),
        (None, Some(path)) => Ok(path),
        (None, None) => Err("card was not written".to_string()),
    };

    CardOutcome {
        index: card.index,
        ticker,
        result,
    }
}
