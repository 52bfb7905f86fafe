//! Default pipeline stages.
//!
//! The standard card processing pipeline consists of:
//!
//! 1. **FieldsStage** - Extract fields from the card's subtree
//! 2. **CorrelateStage** - Find the card's chart data (chart variant)
//! 3. **RenderStage** - Fill the page template
//! 4. **WriteStage** - Write the page to the output directory
//!
//! **ManifestStage** runs once afterwards when a manifest is requested.

mod correlate;
mod fields;
mod manifest;
mod render;
mod write;

pub use correlate::CorrelateStage;
pub use fields::FieldsStage;
pub use manifest::ManifestStage;
pub use render::RenderStage;
pub use write::WriteStage;
