//! Card state for pipeline processing.

use std::path::PathBuf;

use scraper::ElementRef;

use crate::extract::cards::Card;

use super::PipelineError;

/// A card being processed through the pipeline.
///
/// State fills in as stages run:
///
/// 1. Initially: only the source `element` and `index` are known
/// 2. After fields: `card` = extracted fields
/// 3. After correlate: `chart` = chart data literal (chart variant only)
/// 4. After render: `output_html` = final page HTML
/// 5. After write: `output_path` = where the page was written
///
/// A failing stage records `failure` and later stages skip the card.
#[derive(Debug)]
pub struct ProcessingCard<'a> {
    /// 1-based position in the source page
    pub index: usize,

    /// The card's subtree in the source document
    pub element: ElementRef<'a>,

    pub card: Option<Card>,

    pub chart: Option<String>,

    pub output_html: Option<String>,

    pub output_path: Option<PathBuf>,

    pub failure: Option<CardFailure>,
}

/// The stage a card failed in, and why.
#[derive(Debug)]
pub struct CardFailure {
    pub stage: &'static str,
    pub error: PipelineError,
}

impl<'a> ProcessingCard<'a> {
    pub fn new(index: usize, element: ElementRef<'a>) -> Self {
        Self {
            index,
            element,
            card: None,
            chart: None,
            output_html: None,
            output_path: None,
            failure: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Short name for messages: `#<index> (<ticker>)` once fields are known.
    pub fn describe(&self) -> String {
        match &self.card {
            Some(card) => format!("#{} ({})", self.index, card.ticker),
            None => format!("#{}", self.index),
        }
    }

    /// The extracted fields, or a stage error if the fields stage has not run.
    pub fn fields(&self, stage: &str) -> Result<&Card, PipelineError> {
        self.card.as_ref().ok_or_else(|| {
            PipelineError::stage(
                stage,
                format!("card {} has no fields (was fields stage run?)", self.index),
            )
        })
    }
}
