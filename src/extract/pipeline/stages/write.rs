//! File writing stage.

use crate::extract::paths::output_path;
use crate::extract::pipeline::{PipelineContext, PipelineError, ProcessingCard, Stage};

/// Stage that writes rendered pages to the output directory.
///
/// The output directory must already exist.
pub struct WriteStage;

impl Stage for WriteStage {
    fn name(&self) -> &'static str {
        "write"
    }

    fn process(
        &self,
        card: &mut ProcessingCard<'_>,
        ctx: &PipelineContext,
    ) -> Result<(), PipelineError> {
        // Get the final HTML output
        let html = card.output_html.as_ref().ok_or_else(|| {
            PipelineError::stage(
                "write",
                format!(
                    "card {} has no output HTML (was render stage run?)",
                    card.describe()
                ),
            )
        })?;

        let path = output_path(ctx.output_dir, &card.fields(self.name())?.slug, card.index);
        std::fs::write(&path, html).map_err(|e| {
            PipelineError::stage("write", format!("failed to write {}: {}", path.display(), e))
        })?;

        println!("Generated: {}", path.display());
        tracing::info!(card = %card.describe(), path = %path.display(), "page written");

        card.output_path = Some(path);
        Ok(())
    }
}
