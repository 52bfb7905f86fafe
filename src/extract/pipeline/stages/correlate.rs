//! Chart correlation stage.

use crate::extract::chart::EMPTY_CHART;
use crate::extract::pipeline::{PipelineContext, PipelineError, ProcessingCard, Stage};

/// Stage that finds the chart data literal for the card's slug.
///
/// A card with no matching chart gets an empty data object, so the page
/// still renders (with a blank chart).
pub struct CorrelateStage;

impl Stage for CorrelateStage {
    fn name(&self) -> &'static str {
        "correlate"
    }

    fn process(
        &self,
        card: &mut ProcessingCard<'_>,
        ctx: &PipelineContext,
    ) -> Result<(), PipelineError> {
        let slug = &card.fields(self.name())?.slug;

        let chart = match ctx.scripts {
            Some(scripts) if !scripts.is_empty() => scripts.correlate(slug, ctx.chart.strategy),
            _ => EMPTY_CHART.to_string(),
        };

        card.chart = Some(chart);
        Ok(())
    }
}
