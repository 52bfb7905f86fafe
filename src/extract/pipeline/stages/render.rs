//! Page template rendering stage.

use crate::extract::pipeline::{PipelineContext, PipelineError, ProcessingCard, Stage};
use crate::extract::render::{ChartInfo, PageContext};

/// Stage that fills the page template with the card's fields.
///
/// Chart data is passed to the template only when the correlate stage ran.
/// After this stage, `card.output_html` contains the complete page.
pub struct RenderStage;

impl Stage for RenderStage {
    fn name(&self) -> &'static str {
        "render"
    }

    fn process(
        &self,
        card: &mut ProcessingCard<'_>,
        ctx: &PipelineContext,
    ) -> Result<(), PipelineError> {
        let fields = card.fields(self.name())?;

        let page = PageContext {
            card: fields,
            index: card.index,
            defaults: ctx.defaults,
            chart: card.chart.as_deref().map(|data| ChartInfo {
                data,
                script_url: &ctx.chart.script_url,
            }),
        };
        let html = ctx.renderer.render_page(&page)?;

        card.output_html = Some(html);
        Ok(())
    }
}
