//! Shared utility functions.

/// Slug used when a ticker has no alphanumeric characters at all.
pub const FALLBACK_SLUG: &str = "signal";

/// Convert a ticker to its slug.
///
/// Lower-cases and drops every non-alphanumeric character.
/// "BRK.B" -> "brkb"
/// " AAPL " -> "aapl"
pub fn slugify(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("AAPL"), "aapl");
        assert_eq!(slugify("BRK.B"), "brkb");
        assert_eq!(slugify("  spy  "), "spy");
        assert_eq!(slugify("BTC-USD"), "btcusd");
        assert_eq!(slugify("..."), "");
    }

    #[test]
    fn test_slugify_idempotent() {
        for ticker in ["BRK.B", "Ünï-Cøde", "a b\tc", "X_Y"] {
            let once = slugify(ticker);
            assert_eq!(slugify(&once), once);
        }
    }

    #[test]
    fn test_slugify_strips_underscore() {
        assert_eq!(slugify("X_Y"), "xy");
    }
}
