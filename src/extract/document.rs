use std::path::{Path, PathBuf};

use scraper::{Html, Selector};

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path} is not valid UTF-8: {source}")]
    Decode {
        path: PathBuf,
        source: std::string::FromUtf8Error,
    },
}

/// Read a whole file into memory as UTF-8 text.
pub fn load_document(path: &Path) -> Result<String, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    String::from_utf8(bytes).map_err(|source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// The parsed source page.
///
/// Cards are borrowed subtrees of `html`, so the document must outlive
/// the pipeline run.
pub struct SourceDocument {
    pub html: Html,
}

impl SourceDocument {
    pub fn parse(text: &str) -> Self {
        Self {
            html: Html::parse_document(text),
        }
    }

    /// Text of every inline script, in document order, joined by newlines.
    pub fn inline_scripts(&self) -> String {
        let Ok(selector) = Selector::parse("script:not([src])") else {
            return String::new();
        };

        self.html
            .select(&selector)
            .map(|script| script.text().collect::<String>())
            .filter(|text| !text.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
