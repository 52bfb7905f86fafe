//! Output path utilities.

use std::path::{Path, PathBuf};

/// Extension of rendered pages.
pub const PAGE_EXTENSION: &str = "html";

/// File name of the JSON manifest.
pub const MANIFEST_FILE: &str = "signals.json";

/// File name for a card's page: `<slug>_<index>.html`.
///
/// # Examples
/// ```ignore
/// output_file_name("aapl", 1) => "aapl_1.html"
/// output_file_name("brkb", 12) => "brkb_12.html"
/// ```
pub fn output_file_name(slug: &str, index: usize) -> String {
    format!("{slug}_{index}.{PAGE_EXTENSION}")
}

/// Full output path for a card's page inside `output_dir`.
pub fn output_path(output_dir: &Path, slug: &str, index: usize) -> PathBuf {
    output_dir.join(output_file_name(slug, index))
}
