//! Card processing pipeline.
//!
//! Each card runs through a series of stages:
//! 1. Fields (extract card fields from its subtree)
//! 2. Correlate (find the card's chart data; chart variant only)
//! 3. Render (fill the page template)
//! 4. Write (output to disk)
//!
//! Cards run one at a time, in document order. The first stage failure
//! aborts the run. When the context asks to keep going, the failing card is
//! recorded as failed and skipped by later stages while the remaining cards
//! still run.
//! Finalize stages run once after all cards are processed.

mod card;
mod context;
mod error;
mod stages;

pub use card::{CardFailure, ProcessingCard};
pub use context::PipelineContext;
pub use error::PipelineError;

use crate::config::{SignalsConfig, Variant};
use stages::{CorrelateStage, FieldsStage, ManifestStage, RenderStage, WriteStage};

/// A stage in the card processing pipeline.
pub trait Stage: Send + Sync {
    /// Unique name for this stage.
    fn name(&self) -> &'static str;

    /// Process one card through this stage.
    ///
    /// The card is passed by mutable reference so stages can fill in its
    /// state for the next stage.
    fn process(
        &self,
        card: &mut ProcessingCard<'_>,
        ctx: &PipelineContext,
    ) -> Result<(), PipelineError>;
}

/// A stage that runs once after all cards are processed.
pub trait FinalizeStage: Send + Sync {
    /// Unique name for this stage.
    fn name(&self) -> &'static str;

    /// Run finalization after all cards are processed and written.
    fn finalize(
        &self,
        cards: &[ProcessingCard<'_>],
        ctx: &PipelineContext,
    ) -> Result<(), PipelineError>;
}

/// The card processing pipeline.
pub struct Pipeline {
    /// Per-card stages
    stages: Vec<Box<dyn Stage>>,
    /// Run-wide stages (run once after all cards)
    finalize_stages: Vec<Box<dyn FinalizeStage>>,
}

impl Pipeline {
    /// Create an empty pipeline with no stages.
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            finalize_stages: Vec::new(),
        }
    }

    /// Create the pipeline for a configuration.
    ///
    /// Stages: fields → correlate (chart variant) → render → write,
    /// then manifest when enabled.
    pub fn for_config(config: &SignalsConfig) -> Self {
        let mut pipeline = Self::new();
        pipeline.add_stage(FieldsStage);
        if config.variant == Variant::Chart {
            pipeline.add_stage(CorrelateStage);
        }
        pipeline.add_stage(RenderStage);
        pipeline.add_stage(WriteStage);
        if config.manifest {
            pipeline.add_finalize_stage(ManifestStage);
        }
        pipeline
    }

    /// Add a stage to the end of the pipeline.
    pub fn add_stage<S: Stage + 'static>(&mut self, stage: S) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Add a finalize stage (runs after all cards are processed).
    pub fn add_finalize_stage<S: FinalizeStage + 'static>(&mut self, stage: S) -> &mut Self {
        self.finalize_stages.push(Box::new(stage));
        self
    }

    /// Run the pipeline on a set of cards.
    ///
    /// Card failures are returned as errors unless the context keeps going;
    /// finalize failures always are.
    pub fn run(
        &self,
        cards: &mut [ProcessingCard<'_>],
        ctx: &PipelineContext,
    ) -> Result<(), PipelineError> {
        tracing::debug!(stages = ?self.stage_names(), cards = cards.len(), "running pipeline");

        for card in cards.iter_mut() {
            for stage in &self.stages {
                if let Err(error) = stage.process(card, ctx) {
                    if !ctx.keep_going {
                        tracing::error!(card = %card.describe(), stage = stage.name(), %error, "aborting run");
                        return Err(error);
                    }
                    tracing::warn!(card = %card.describe(), stage = stage.name(), %error, "card failed");
                    card.failure = Some(CardFailure {
                        stage: stage.name(),
                        error,
                    });
                    break;
                }
            }
        }

        for stage in &self.finalize_stages {
            stage.finalize(cards, ctx).inspect_err(|error| {
                tracing::error!(stage = stage.name(), %error, "finalize stage failed");
            })?;
        }

        Ok(())
    }

    /// Get the names of all stages in order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names_per_variant() {
        let chart = SignalsConfig::default();
        assert_eq!(
            Pipeline::for_config(&chart).stage_names(),
            ["fields", "correlate", "render", "write"]
        );

        let template = SignalsConfig {
            variant: Variant::Template,
            ..SignalsConfig::default()
        };
        assert_eq!(
            Pipeline::for_config(&template).stage_names(),
            ["fields", "render", "write"]
        );
    }

    #[test]
    fn test_manifest_is_finalize_stage() {
        let config = SignalsConfig {
            manifest: true,
            ..SignalsConfig::default()
        };
        let pipeline = Pipeline::for_config(&config);
        assert_eq!(pipeline.finalize_stages.len(), 1);
        assert_eq!(pipeline.finalize_stages[0].name(), "manifest");
    }
}
