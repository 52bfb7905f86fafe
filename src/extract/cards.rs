//! Card location and field extraction.
//!
//! A card is one repeated fragment of the source page. Every field lookup
//! is scoped to the card's own subtree, and every field falls back to its
//! entry in [`FieldDefaults`] when the element is missing or blank.

use scraper::{ElementRef, Selector};
use serde::Serialize;

use crate::config::{FieldDefaults, SelectorConfig};
use crate::util::{FALLBACK_SLUG, slugify};

use super::document::SourceDocument;

#[derive(thiserror::Error, Debug)]
#[error("invalid {field} selector '{selector}': {message}")]
pub struct SelectorError {
    pub field: &'static str,
    pub selector: String,
    pub message: String,
}

/// One label/value pair from a card's stat row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stat {
    pub label: String,
    pub value: String,
}

/// The structured fields of one signal card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub ticker: String,
    /// Lower-cased alphanumeric form of the ticker
    pub slug: String,
    /// Strategy badge
    pub label: String,
    /// Company name
    pub title: String,
    /// Trimmed price text as it appears in the page
    pub price_text: String,
    /// Leading token of `price_text` (e.g. "$182.50" from "$182.50 USD")
    pub price: String,
    pub change_text: String,
    pub stats: Vec<Stat>,
    pub description: String,
    pub link_text: String,
    pub link_url: String,
}

/// Compiled selectors for cards and their fields.
#[derive(Debug)]
pub struct Selectors {
    card: Selector,
    ticker: Selector,
    label: Selector,
    title: Selector,
    price: Selector,
    change: Selector,
    stat: Selector,
    stat_label: Selector,
    stat_value: Selector,
    description: Selector,
    link: Selector,
}

fn compile(field: &'static str, selector: &str) -> Result<Selector, SelectorError> {
    Selector::parse(selector).map_err(|e| SelectorError {
        field,
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

impl Selectors {
    pub fn compile(config: &SelectorConfig) -> Result<Self, SelectorError> {
        Ok(Self {
            card: compile("card", &config.card)?,
            ticker: compile("ticker", &config.ticker)?,
            label: compile("label", &config.label)?,
            title: compile("title", &config.title)?,
            price: compile("price", &config.price)?,
            change: compile("change", &config.change)?,
            stat: compile("stat", &config.stat)?,
            stat_label: compile("stat_label", &config.stat_label)?,
            stat_value: compile("stat_value", &config.stat_value)?,
            description: compile("description", &config.description)?,
            link: compile("link", &config.link)?,
        })
    }
}

/// Find every card in the document, in document order.
pub fn locate_cards<'a>(doc: &'a SourceDocument, selectors: &Selectors) -> Vec<ElementRef<'a>> {
    doc.html.select(&selectors.card).collect()
}

/// Trimmed text of the first element under `scope` matching `selector`,
/// or `None` when there is no match or the text is blank.
fn find_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    let element = scope.select(selector).next()?;
    non_blank(element.text().collect::<String>().trim())
}

fn non_blank(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn or_default(value: Option<String>, field: &str, default: &str) -> String {
    value.unwrap_or_else(|| {
        tracing::debug!(field, default, "field missing, using default");
        default.to_string()
    })
}

/// Derive the slug for a ticker, falling back when it has no alphanumerics.
pub fn card_slug(ticker: &str, defaults: &FieldDefaults) -> String {
    let slug = slugify(ticker);
    if !slug.is_empty() {
        return slug;
    }
    let slug = slugify(&defaults.ticker);
    if !slug.is_empty() {
        return slug;
    }
    FALLBACK_SLUG.to_string()
}

/// Extract every field of one card.
pub fn extract_card(card: ElementRef<'_>, selectors: &Selectors, defaults: &FieldDefaults) -> Card {
    let ticker = or_default(find_text(card, &selectors.ticker), "ticker", &defaults.ticker);
    let slug = card_slug(&ticker, defaults);

    let price_text = or_default(find_text(card, &selectors.price), "price", &defaults.price);
    let price = price_text
        .split_whitespace()
        .next()
        .unwrap_or(defaults.price.as_str())
        .to_string();

    let stats = card
        .select(&selectors.stat)
        .enumerate()
        .map(|(i, stat)| Stat {
            label: find_text(stat, &selectors.stat_label)
                .unwrap_or_else(|| defaults.stat_label_for(i + 1)),
            value: find_text(stat, &selectors.stat_value)
                .unwrap_or_else(|| defaults.stat_value.clone()),
        })
        .collect();

    // The link lives inside the description block; each falls back on its own.
    let description_block = card.select(&selectors.description).next();
    let description = description_block
        .and_then(|block| non_blank(block.text().collect::<String>().trim()));
    let link = description_block.and_then(|block| block.select(&selectors.link).next());
    let link_text = link.and_then(|a| {
        let text = a.text().collect::<String>();
        non_blank(text.trim_matches(|c: char| c.is_whitespace() || c == '→'))
    });
    let link_url = link
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| non_blank(href.trim()));

    Card {
        label: or_default(find_text(card, &selectors.label), "label", &defaults.label),
        title: or_default(find_text(card, &selectors.title), "title", &defaults.title),
        change_text: or_default(find_text(card, &selectors.change), "change", &defaults.change),
        description: or_default(description, "description", &defaults.description),
        link_text: or_default(link_text, "link_text", &defaults.link_text),
        link_url: or_default(link_url, "link_url", &defaults.link_url),
        ticker,
        slug,
        price_text,
        price,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_CARD: &str = r#"
        <div class="signal-card featured">
          <div class="header">
            <span class="ticker"> AAPL </span>
            <span class="strategy-badge">Momentum</span>
          </div>
          <div class="company-name">Apple Inc.</div>
          <span class="price">$182.50 USD</span>
          <span class="change">+2.1%</span>
          <div class="stats">
            <div class="stat"><div class="stat-label">RSI</div><div class="stat-value">62</div></div>
            <div class="stat"><div class="stat-label">Volume</div><div class="stat-value">1.2M</div></div>
            <div class="stat"><div class="stat-label">Target</div><div class="stat-value">$195</div></div>
            <div class="stat"><div class="stat-label">Stop</div><div class="stat-value">$175</div></div>
          </div>
          <div class="strategy-desc">
            Breakout above resistance.
            <a href="https://example.com/aapl">Read more →</a>
          </div>
        </div>"#;

    fn extract_all(html: &str) -> Vec<Card> {
        let doc = SourceDocument::parse(html);
        let selectors = Selectors::compile(&SelectorConfig::default()).unwrap();
        let defaults = FieldDefaults::default();
        locate_cards(&doc, &selectors)
            .into_iter()
            .map(|card| extract_card(card, &selectors, &defaults))
            .collect()
    }

    #[test]
    fn test_extract_full_card() {
        let cards = extract_all(&format!("<html><body>{FULL_CARD}</body></html>"));
        assert_eq!(cards.len(), 1);

        let card = &cards[0];
        assert_eq!(card.ticker, "AAPL");
        assert_eq!(card.slug, "aapl");
        assert_eq!(card.label, "Momentum");
        assert_eq!(card.title, "Apple Inc.");
        assert_eq!(card.price_text, "$182.50 USD");
        assert_eq!(card.price, "$182.50");
        assert_eq!(card.change_text, "+2.1%");
        assert_eq!(card.link_text, "Read more");
        assert_eq!(card.link_url, "https://example.com/aapl");
        assert!(card.description.starts_with("Breakout above resistance."));
    }

    #[test]
    fn test_stats_beyond_three_are_kept() {
        let cards = extract_all(FULL_CARD);
        let labels: Vec<_> = cards[0].stats.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["RSI", "Volume", "Target", "Stop"]);
        assert_eq!(cards[0].stats[3].value, "$175");
    }

    #[test]
    fn test_locate_cards_document_order() {
        let cards = extract_all(
            r#"<div class="signal-card"><span class="ticker">MSFT</span></div>
               <section><div class="signal-card"><span class="ticker">NVDA</span></div></section>
               <div class="not-a-card"><span class="ticker">XXX</span></div>
               <span class="signal-card"><span class="ticker">SPAN</span></span>
               <div class="signal-card"><span class="ticker">TSLA</span></div>"#,
        );
        let tickers: Vec<_> = cards.iter().map(|c| c.ticker.as_str()).collect();
        assert_eq!(tickers, ["MSFT", "NVDA", "TSLA"]);
    }

    #[test]
    fn test_locate_cards_none() {
        assert!(extract_all("<html><body><p>nothing here</p></body></html>").is_empty());
    }

    #[test]
    fn test_empty_card_uses_every_default() {
        let cards = extract_all(r#"<div class="signal-card"></div>"#);
        let card = &cards[0];
        let defaults = FieldDefaults::default();

        assert_eq!(card.ticker, defaults.ticker);
        assert_eq!(card.slug, "signal");
        assert_eq!(card.label, defaults.label);
        assert_eq!(card.title, "Company");
        assert_eq!(card.price, "Price");
        assert_eq!(card.price_text, "Price");
        assert_eq!(card.change_text, defaults.change);
        assert_eq!(card.description, "No Description");
        assert_eq!(card.link_text, "More Info");
        assert_eq!(card.link_url, "#");
        assert!(card.stats.is_empty());
    }

    #[test]
    fn test_default_table_is_complete() {
        let defaults = FieldDefaults::default();
        let entries = defaults.entries();
        let names: Vec<_> = entries.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            [
                "ticker",
                "label",
                "title",
                "price",
                "change",
                "description",
                "link_text",
                "link_url",
                "stat_label",
                "stat_value",
            ]
        );
        assert!(entries.iter().all(|(_, value)| !value.is_empty()));
    }

    #[test]
    fn test_blank_fields_use_defaults() {
        let cards = extract_all(
            r#"<div class="signal-card">
                 <span class="ticker">   </span>
                 <div class="company-name"></div>
               </div>"#,
        );
        assert_eq!(cards[0].ticker, "Signal");
        assert_eq!(cards[0].title, "Company");
    }

    #[test]
    fn test_stat_defaults() {
        let cards = extract_all(
            r#"<div class="signal-card">
                 <div class="stat"><div class="stat-value">10</div></div>
                 <div class="stat"><div class="stat-label">Beta</div></div>
               </div>"#,
        );
        assert_eq!(
            cards[0].stats,
            vec![
                Stat { label: "Stat1".to_string(), value: "10".to_string() },
                Stat { label: "Beta".to_string(), value: "-".to_string() },
            ]
        );
    }

    #[test]
    fn test_description_without_link() {
        let cards = extract_all(
            r#"<div class="signal-card"><div class="strategy-desc">Mean reversion</div></div>"#,
        );
        assert_eq!(cards[0].description, "Mean reversion");
        assert_eq!(cards[0].link_text, "More Info");
        assert_eq!(cards[0].link_url, "#");
    }

    #[test]
    fn test_link_outside_description_is_ignored() {
        let cards = extract_all(
            r#"<div class="signal-card"><a href="/elsewhere">Elsewhere</a></div>"#,
        );
        assert_eq!(cards[0].link_url, "#");
        assert_eq!(cards[0].link_text, "More Info");
    }

    #[test]
    fn test_anchor_without_href() {
        let cards = extract_all(
            r#"<div class="signal-card"><div class="strategy-desc">x <a>Details</a></div></div>"#,
        );
        assert_eq!(cards[0].link_text, "Details");
        assert_eq!(cards[0].link_url, "#");
    }

    #[test]
    fn test_fields_scoped_to_card() {
        let cards = extract_all(
            r#"<div class="company-name">Outside Co</div>
               <div class="signal-card"><span class="ticker">IBM</span></div>"#,
        );
        assert_eq!(cards[0].title, "Company");
    }

    #[test]
    fn test_card_slug_fallbacks() {
        let defaults = FieldDefaults::default();
        assert_eq!(card_slug("BRK.B", &defaults), "brkb");
        assert_eq!(card_slug("---", &defaults), "signal");

        let custom = FieldDefaults {
            ticker: "?".to_string(),
            ..FieldDefaults::default()
        };
        assert_eq!(card_slug("---", &custom), FALLBACK_SLUG);
    }

    #[test]
    fn test_invalid_selector() {
        let config = SelectorConfig {
            ticker: "span..ticker".to_string(),
            ..SelectorConfig::default()
        };
        let err = Selectors::compile(&config).unwrap_err();
        assert_eq!(err.field, "ticker");
    }

    #[test]
    fn test_custom_defaults() {
        let doc = SourceDocument::parse(r#"<div class="signal-card"></div>"#);
        let selectors = Selectors::compile(&SelectorConfig::default()).unwrap();
        let defaults = FieldDefaults {
            title: "Unknown Co".to_string(),
            ..FieldDefaults::default()
        };
        let card = extract_card(locate_cards(&doc, &selectors)[0], &selectors, &defaults);
        assert_eq!(card.title, "Unknown Co");
    }
}
