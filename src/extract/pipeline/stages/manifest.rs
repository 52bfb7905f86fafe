//! Manifest writing stage.

use serde::Serialize;

use crate::extract::cards::Card;
use crate::extract::paths::{MANIFEST_FILE, output_file_name};
use crate::extract::pipeline::{FinalizeStage, PipelineContext, PipelineError, ProcessingCard};

/// One manifest entry: the card's fields plus where its page went.
#[derive(Debug, Serialize)]
pub struct ManifestRecord<'a> {
    pub index: usize,
    pub file: String,
    #[serde(flatten)]
    pub card: &'a Card,
}

/// Finalize stage that writes `signals.json`, the extracted records of
/// every card whose page was written.
pub struct ManifestStage;

impl FinalizeStage for ManifestStage {
    fn name(&self) -> &'static str {
        "manifest"
    }

    fn finalize(
        &self,
        cards: &[ProcessingCard<'_>],
        ctx: &PipelineContext,
    ) -> Result<(), PipelineError> {
        let records: Vec<ManifestRecord> = cards
            .iter()
            .filter(|card| !card.is_failed() && card.output_path.is_some())
            .filter_map(|card| {
                let fields = card.card.as_ref()?;
                Some(ManifestRecord {
                    index: card.index,
                    file: output_file_name(&fields.slug, card.index),
                    card: fields,
                })
            })
            .collect();

        let path = ctx.output_dir.join(MANIFEST_FILE);
        std::fs::write(&path, serde_json::to_string_pretty(&records)?)?;
        println!("Wrote manifest with {} record(s) to {}", records.len(), path.display());

        Ok(())
    }
}
