mod cards;
mod chart;
mod document;
mod extractor;
mod paths;
pub mod pipeline;
mod render;

pub use extractor::{CardOutcome, ExtractResult, Extractor};
