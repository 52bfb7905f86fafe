//! Field extraction stage.

use crate::extract::cards::extract_card;
use crate::extract::pipeline::{PipelineContext, PipelineError, ProcessingCard, Stage};

/// Stage that extracts the card's fields from its subtree.
///
/// Never fails: missing fields take their configured defaults.
/// After this stage, `card.card` is populated.
pub struct FieldsStage;

impl Stage for FieldsStage {
    fn name(&self) -> &'static str {
        "fields"
    }

    fn process(
        &self,
        card: &mut ProcessingCard<'_>,
        ctx: &PipelineContext,
    ) -> Result<(), PipelineError> {
        card.card = Some(extract_card(card.element, ctx.selectors, ctx.defaults));
        Ok(())
    }
}
