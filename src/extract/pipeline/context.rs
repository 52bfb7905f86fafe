//! Pipeline context for sharing state across stages.

use std::path::Path;

use crate::config::{ChartConfig, FieldDefaults};
use crate::extract::cards::Selectors;
use crate::extract::chart::ScriptBuffer;
use crate::extract::render::Renderer;

/// Shared context for pipeline stages.
///
/// Contains all resources and configuration needed by stages during processing.
pub struct PipelineContext<'a> {
    // === Output configuration ===
    /// Directory where pages are written (already created)
    pub output_dir: &'a Path,

    // === Extraction ===
    /// Compiled card and field selectors
    pub selectors: &'a Selectors,

    /// Fallback strings for missing fields
    pub defaults: &'a FieldDefaults,

    // === Charts ===
    /// Inline script text of the source page (chart variant only)
    pub scripts: Option<&'a ScriptBuffer>,

    pub chart: &'a ChartConfig,

    // === Services ===
    /// Page template renderer
    pub renderer: &'a Renderer,

    // === Mode flags ===
    /// Record card failures and continue instead of aborting on the first
    pub keep_going: bool,
}
