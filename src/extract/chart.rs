//! Chart correlation.
//!
//! Finds the `data` literal of the `new Chart(...)` call whose target
//! canvas is `chart-<slug>`, searching the concatenated inline script text
//! of the source page.
//!
//! The default [`CorrelationStrategy::Scan`] runs a small lexer over the
//! script so brackets inside strings and comments are ignored, delimits each
//! call by balanced-paren scanning, and captures the `data` value by
//! balanced-brace scanning. [`CorrelationStrategy::Pattern`] is the plain
//! textual search that stops at the next `options:` key.

use std::ops::Range;

use regex::Regex;

use crate::config::CorrelationStrategy;

use super::document::SourceDocument;

/// Chart literal used when no chart call matches a card.
pub const EMPTY_CHART: &str = "{}";

/// How many identifier hops to follow when resolving a chart target.
const MAX_BINDING_HOPS: usize = 3;

/// The inline script text of a page, pre-lexed for correlation.
pub struct ScriptBuffer {
    text: String,
    /// ASCII-lowercased copy; byte offsets match `text`
    lower: String,
    /// `code[i]` is false when byte `i` belongs to a string literal or comment
    code: Vec<bool>,
    /// Every chart call in buffer order, resolved once
    charts: Vec<ResolvedChart>,
}

/// One `new Chart(target, config)` call.
#[derive(Debug, Clone)]
struct ChartCall {
    /// Offset of the `new` keyword
    start: usize,
    target: Range<usize>,
    config: Option<Range<usize>>,
}

/// A chart call with its target bindings and `data` literal located.
#[derive(Debug, Clone)]
struct ResolvedChart {
    /// The target argument, then each binding it names, nearest first
    targets: Vec<Range<usize>>,
    data: Option<Range<usize>>,
}

impl ScriptBuffer {
    pub fn new(text: String) -> Self {
        let lower = text.to_ascii_lowercase();
        let code = classify(text.as_bytes());
        let mut buffer = Self {
            text,
            lower,
            code,
            charts: Vec::new(),
        };
        let charts: Vec<ResolvedChart> = buffer
            .chart_calls()
            .into_iter()
            .map(|call| buffer.resolve(call))
            .collect();
        buffer.charts = charts;
        buffer
    }

    pub fn from_document(doc: &SourceDocument) -> Self {
        Self::new(doc.inline_scripts())
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// The chart data literal for `slug`, or [`EMPTY_CHART`] when nothing matches.
    pub fn correlate(&self, slug: &str, strategy: CorrelationStrategy) -> String {
        let found = match strategy {
            CorrelationStrategy::Scan => self.scan(slug),
            CorrelationStrategy::Pattern => self.pattern(slug),
        };

        found.unwrap_or_else(|| {
            tracing::debug!(slug, ?strategy, "no chart data found");
            EMPTY_CHART.to_string()
        })
    }

    // =========================================================================
    // Scan strategy
    // =========================================================================

    fn scan(&self, slug: &str) -> Option<String> {
        let needle = format!("chart-{}", slug.to_lowercase());

        self.charts
            .iter()
            .filter(|chart| {
                chart
                    .targets
                    .iter()
                    .any(|target| contains_token(&self.lower[target.clone()], &needle))
            })
            .find_map(|chart| Some(self.text[chart.data.clone()?].to_string()))
    }

    fn resolve(&self, call: ChartCall) -> ResolvedChart {
        ResolvedChart {
            targets: self.target_bindings(call.target, call.start),
            data: call
                .config
                .and_then(|config| self.data_value(config, call.start)),
        }
    }

    /// Every `new Chart(` call in buffer order.
    fn chart_calls(&self) -> Vec<ChartCall> {
        let bytes = self.lower.as_bytes();
        let mut calls = Vec::new();
        let mut from = 0;

        while let Some(offset) = self.lower[from..].find("new") {
            let start = from + offset;
            from = start + 3;

            if !self.code[start] || (start > 0 && is_ident_byte(bytes[start - 1])) {
                continue;
            }
            let mut i = start + 3;
            let ws = self.skip_ws(i);
            if ws == i {
                continue;
            }
            i = ws;
            if !self.lower[i..].starts_with("chart") {
                continue;
            }
            i = self.skip_ws(i + 5);
            if bytes.get(i) != Some(&b'(') || !self.code[i] {
                continue;
            }
            let Some(close) = self.matching(i) else {
                continue;
            };

            let mut args = self.split_args(i + 1..close).into_iter();
            if let Some(target) = args.next() {
                calls.push(ChartCall {
                    start,
                    target,
                    config: args.next(),
                });
            }
            from = close + 1;
        }

        calls
    }

    /// The target expression followed by the expressions of the bindings it
    /// names, at most [`MAX_BINDING_HOPS`] deep.
    fn target_bindings(&self, target: Range<usize>, call_start: usize) -> Vec<Range<usize>> {
        let mut chain = vec![target];
        let mut before = call_start;

        while chain.len() <= MAX_BINDING_HOPS {
            let Some(last) = chain.last() else {
                break;
            };
            let Some(ident) = leading_ident(&self.text[last.clone()]) else {
                break;
            };
            if matches!(ident, "document" | "window" | "this") {
                break;
            }
            let Some(expr) = self.binding_before(ident, before) else {
                break;
            };
            before = expr.start;
            chain.push(expr);
        }

        chain
    }

    /// The value range of the top-level `data` key of the object literal in `config`.
    fn data_value(&self, config: Range<usize>, call_start: usize) -> Option<Range<usize>> {
        let bytes = self.text.as_bytes();
        if bytes.get(config.start) != Some(&b'{') {
            return None;
        }
        let end = self.matching(config.start)?;

        let mut depth = 0usize;
        let mut expect_key = true;
        let mut i = config.start + 1;
        while i < end {
            let b = bytes[i];
            if b.is_ascii_whitespace() {
                i += 1;
                continue;
            }
            // Comments do not end the key position.
            if b == b'/' && !self.code[i] {
                while i < end && !self.code[i] {
                    i += 1;
                }
                continue;
            }

            if depth == 0 && expect_key {
                if let Some((key, after_key)) = self.property_key(i) {
                    let after = self.skip_ws(after_key);
                    if key == "data" {
                        return match bytes.get(after) {
                            Some(b':') => self.resolve_value(self.skip_ws(after + 1), call_start),
                            // Shorthand `{ data }`
                            Some(b',') | Some(b'}') => {
                                let expr = self.binding_before("data", call_start)?;
                                self.object_at(expr.start)
                            }
                            _ => None,
                        };
                    }
                    expect_key = false;
                    i = after_key;
                    continue;
                }
            }

            if self.code[i] {
                match b {
                    b'(' | b'[' | b'{' => depth += 1,
                    b')' | b']' | b'}' => depth = depth.saturating_sub(1),
                    b',' if depth == 0 => {
                        expect_key = true;
                        i += 1;
                        continue;
                    }
                    _ => {}
                }
            }
            expect_key = false;
            i += 1;
        }

        None
    }

    /// An object literal at `start`, or an identifier bound to one earlier.
    fn resolve_value(&self, start: usize, call_start: usize) -> Option<Range<usize>> {
        if let Some(range) = self.object_at(start) {
            return Some(range);
        }
        let ident = leading_ident(&self.text[start..])?;
        if self.text.as_bytes().get(start + ident.len()).is_some_and(|b| *b == b'.' || *b == b'(') {
            return None;
        }
        let expr = self.binding_before(ident, call_start)?;
        self.object_at(expr.start)
    }

    fn object_at(&self, start: usize) -> Option<Range<usize>> {
        if self.text.as_bytes().get(start) != Some(&b'{') || !self.code[start] {
            return None;
        }
        let end = self.matching(start)?;
        Some(start..end + 1)
    }

    /// A property key (bare or quoted) starting at `i`, with the offset after it.
    fn property_key(&self, i: usize) -> Option<(&str, usize)> {
        let bytes = self.text.as_bytes();
        match bytes[i] {
            q @ (b'\'' | b'"') => {
                let close = self.text[i + 1..].find(q as char)? + i + 1;
                Some((&self.text[i + 1..close], close + 1))
            }
            b if is_ident_byte(b) && self.code[i] => {
                let ident = leading_ident(&self.text[i..])?;
                Some((ident, i + ident.len()))
            }
            _ => None,
        }
    }

    /// The expression assigned to `ident` by the last assignment before `before`.
    fn binding_before(&self, ident: &str, before: usize) -> Option<Range<usize>> {
        let bytes = self.text.as_bytes();
        let mut found = None;
        let mut from = 0;

        while let Some(offset) = self.text[from..before].find(ident) {
            let at = from + offset;
            from = at + ident.len();

            let boundary_before = at == 0 || !(is_ident_byte(bytes[at - 1]) || bytes[at - 1] == b'.');
            let boundary_after = bytes.get(from).is_none_or(|b| !is_ident_byte(*b));
            if !self.code[at] || !boundary_before || !boundary_after {
                continue;
            }

            let eq = self.skip_ws(from);
            let is_assignment = bytes.get(eq) == Some(&b'=')
                && !matches!(bytes.get(eq + 1), Some(b'=') | Some(b'>'));
            if is_assignment && eq < before {
                let start = self.skip_ws(eq + 1);
                found = Some(start..self.expression_end(start));
            }
        }

        found
    }

    /// End of the expression starting at `start`: the first top-level `;`, `,` or newline.
    fn expression_end(&self, start: usize) -> usize {
        let bytes = self.text.as_bytes();
        let mut depth = 0usize;
        for (i, &b) in bytes.iter().enumerate().skip(start) {
            if !self.code[i] {
                continue;
            }
            match b {
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' | b'}' if depth == 0 => return i,
                b')' | b']' | b'}' => depth -= 1,
                b';' | b',' | b'\n' if depth == 0 => return i,
                _ => {}
            }
        }
        bytes.len()
    }

    /// Index of the bracket closing the one at `open`, ignoring strings and comments.
    fn matching(&self, open: usize) -> Option<usize> {
        let bytes = self.text.as_bytes();
        let mut depth = 0usize;
        for (i, &b) in bytes.iter().enumerate().skip(open) {
            if !self.code[i] {
                continue;
            }
            match b {
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' | b'}' => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Split an argument list into trimmed argument ranges at top-level commas.
    fn split_args(&self, range: Range<usize>) -> Vec<Range<usize>> {
        let bytes = self.text.as_bytes();
        let mut args = Vec::new();
        let mut depth = 0usize;
        let mut arg_start = range.start;

        for i in range.clone() {
            if !self.code[i] {
                continue;
            }
            match bytes[i] {
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' | b'}' => depth = depth.saturating_sub(1),
                b',' if depth == 0 => {
                    args.push(self.trim(arg_start..i));
                    arg_start = i + 1;
                }
                _ => {}
            }
        }
        let last = self.trim(arg_start..range.end);
        if !last.is_empty() {
            args.push(last);
        }

        args
    }

    fn trim(&self, range: Range<usize>) -> Range<usize> {
        let slice = &self.text[range.clone()];
        let start = range.start + (slice.len() - slice.trim_start().len());
        let end = range.end - (slice.len() - slice.trim_end().len());
        start..end.max(start)
    }

    fn skip_ws(&self, mut i: usize) -> usize {
        let bytes = self.text.as_bytes();
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        i
    }

    // =========================================================================
    // Pattern strategy
    // =========================================================================

    fn pattern(&self, slug: &str) -> Option<String> {
        let pattern = format!(
            r#"(?s)new chart\(.*?['"]chart-{}['"].*?data:\s*(\{{.*?\}}),\s*options:"#,
            regex::escape(&slug.to_lowercase())
        );
        let re = Regex::new(&pattern).ok()?;
        let haystack = self.text.to_lowercase();
        let captures = re.captures(&haystack)?;
        Some(captures.get(1)?.as_str().to_string())
    }
}

/// Mark which bytes of a script are code (true) versus string literal or comment.
fn classify(src: &[u8]) -> Vec<bool> {
    let mut code = vec![true; src.len()];
    let mut i = 0;

    while i < src.len() {
        let end = match (src[i], src.get(i + 1)) {
            (q @ (b'\'' | b'"' | b'`'), _) => string_end(src, i, q),
            (b'/', Some(b'/')) => src[i..]
                .iter()
                .position(|&b| b == b'\n')
                .map_or(src.len(), |p| i + p),
            (b'/', Some(b'*')) => src[i + 2..]
                .windows(2)
                .position(|w| w == b"*/")
                .map_or(src.len(), |p| i + 2 + p + 2),
            _ => {
                i += 1;
                continue;
            }
        };
        code[i..end].iter_mut().for_each(|c| *c = false);
        i = end;
    }

    code
}

/// Offset just past the string literal opened by `quote` at `start`.
///
/// Single- and double-quoted strings also end at an unescaped newline.
fn string_end(src: &[u8], start: usize, quote: u8) -> usize {
    let mut i = start + 1;
    while i < src.len() {
        match src[i] {
            b'\\' => i += 2,
            b if b == quote => return i + 1,
            b'\n' if quote != b'`' => return i,
            _ => i += 1,
        }
    }
    src.len()
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// The identifier at the start of `s`, if any.
fn leading_ident(s: &str) -> Option<&str> {
    let len = s.bytes().take_while(|b| is_ident_byte(*b)).count();
    if len == 0 || s.as_bytes()[0].is_ascii_digit() {
        None
    } else {
        Some(&s[..len])
    }
}

/// Whether `needle` occurs in `haystack` not immediately followed or preceded by an alphanumeric.
fn contains_token(haystack: &str, needle: &str) -> bool {
    let bytes = haystack.as_bytes();
    haystack.match_indices(needle).any(|(at, _)| {
        let end = at + needle.len();
        let clean_before = at == 0 || !bytes[at - 1].is_ascii_alphanumeric();
        let clean_after = bytes.get(end).is_none_or(|b| !b.is_ascii_alphanumeric());
        clean_before && clean_after
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(script: &str, slug: &str) -> String {
        ScriptBuffer::new(script.to_string()).correlate(slug, CorrelationStrategy::Scan)
    }

    fn pattern(script: &str, slug: &str) -> String {
        ScriptBuffer::new(script.to_string()).correlate(slug, CorrelationStrategy::Pattern)
    }

    const INLINE_TARGET: &str = r#"
        new Chart(document.getElementById('chart-aapl'), {
            type: 'line',
            data:{"labels":[1,2,3]}, options:{}
        });
    "#;

    #[test]
    fn test_scan_inline_target() {
        assert_eq!(scan(INLINE_TARGET, "aapl"), r#"{"labels":[1,2,3]}"#);
    }

    #[test]
    fn test_pattern_inline_target() {
        assert_eq!(pattern(INLINE_TARGET, "aapl"), r#"{"labels":[1,2,3]}"#);
    }

    #[test]
    fn test_no_match_is_empty_object() {
        assert_eq!(scan(INLINE_TARGET, "msft"), EMPTY_CHART);
        assert_eq!(pattern(INLINE_TARGET, "msft"), EMPTY_CHART);
        assert_eq!(scan("", "aapl"), EMPTY_CHART);
    }

    #[test]
    fn test_scan_preserves_case_and_bytes() {
        let script = r#"new Chart('chart-aapl', { data: { labels: ['Mon', 'Tue'],
            datasets: [{ label: 'Close', data: [1.5, 2] }] }, options: {} });"#;
        assert_eq!(
            scan(script, "aapl"),
            "{ labels: ['Mon', 'Tue'],\n            datasets: [{ label: 'Close', data: [1.5, 2] }] }"
        );
    }

    #[test]
    fn test_nested_options_key_inside_data() {
        let script = "new Chart('chart-spy', { data: { a: { b: 1 }, options: 2 }, options: {} });";
        assert_eq!(scan(script, "spy"), "{ a: { b: 1 }, options: 2 }");
        // The textual search stops at the first `}, options:`.
        assert_eq!(pattern(script, "spy"), "{ a: { b: 1 }");
    }

    #[test]
    fn test_scan_ignores_brackets_in_strings_and_comments() {
        let script = r#"
            new Chart('chart-tsla', {
                // a stray } in a comment
                data: { labels: ['}', "{", `)`], /* ] */ values: [1] },
                options: {}
            });
        "#;
        assert_eq!(
            scan(script, "tsla"),
            r#"{ labels: ['}', "{", `)`], /* ] */ values: [1] }"#
        );
    }

    #[test]
    fn test_scan_resolves_context_variable() {
        let script = r#"
            const ctx = document.getElementById('chart-msft').getContext('2d');
            new Chart(ctx, { type: 'line', data: { labels: [1] }, options: {} });
            const other = document.getElementById('chart-nvda').getContext('2d');
            new Chart(other, { type: 'line', data: { labels: [2] }, options: {} });
        "#;
        assert_eq!(scan(script, "msft"), "{ labels: [1] }");
        assert_eq!(scan(script, "nvda"), "{ labels: [2] }");
    }

    #[test]
    fn test_scan_follows_canvas_chain() {
        let script = r#"
            var canvas = document.getElementById("chart-amd");
            var ctx = canvas.getContext("2d");
            new Chart(ctx, { data: { labels: ['q1'] } });
        "#;
        assert_eq!(scan(script, "amd"), "{ labels: ['q1'] }");
    }

    #[test]
    fn test_scan_resolves_data_variable() {
        let script = r#"
            const amznData = { labels: ['Jan', 'Feb'], datasets: [{ data: [3, 4] }] };
            new Chart(document.getElementById('chart-amzn'), { type: 'line', data: amznData, options: {} });
        "#;
        assert_eq!(
            scan(script, "amzn"),
            "{ labels: ['Jan', 'Feb'], datasets: [{ data: [3, 4] }] }"
        );
    }

    #[test]
    fn test_scan_shorthand_data_property() {
        let script = r#"
            const data = { labels: [7] };
            new Chart('chart-qqq', { type: 'line', data });
        "#;
        assert_eq!(scan(script, "qqq"), "{ labels: [7] }");
    }

    #[test]
    fn test_scan_quoted_data_key() {
        let script = r#"new Chart('chart-dia', { "type": "line", "data": {"labels": [9]} });"#;
        assert_eq!(scan(script, "dia"), r#"{"labels": [9]}"#);
    }

    #[test]
    fn test_scan_ignores_nested_data_keys() {
        let script = "new Chart('chart-iwm', { plugins: { data: { wrong: 1 } }, data: { right: 2 } });";
        assert_eq!(scan(script, "iwm"), "{ right: 2 }");
    }

    #[test]
    fn test_first_match_wins() {
        let script = r#"
            new Chart('chart-aapl', { data: { first: 1 }, options: {} });
            new Chart('chart-aapl', { data: { second: 2 }, options: {} });
        "#;
        assert_eq!(scan(script, "aapl"), "{ first: 1 }");
        assert_eq!(pattern(script, "aapl"), "{ first: 1 }");
    }

    #[test]
    fn test_slug_must_end_at_token_boundary() {
        let script = r#"
            new Chart('chart-aapl2', { data: { wrong: 1 } });
            new Chart('chart-aapl', { data: { right: 1 } });
        "#;
        assert_eq!(scan(script, "aapl"), "{ right: 1 }");
    }

    #[test]
    fn test_target_match_is_case_insensitive() {
        let script = "new Chart('Chart-BRKB', { data: { Labels: [1] } });";
        assert_eq!(scan(script, "brkb"), "{ Labels: [1] }");
        // The textual search lower-cases everything it returns.
        assert_eq!(
            pattern("new Chart('Chart-BRKB', { data: {Labels: [1]}, options: {} });", "brkb"),
            "{labels: [1]}"
        );
    }

    #[test]
    fn test_call_in_comment_or_string_is_ignored() {
        let script = r#"
            // new Chart('chart-ko', { data: { commented: 1 } });
            var s = "new Chart('chart-ko', { data: { quoted: 1 } })";
            new Chart('chart-ko', { data: { real: 1 } });
        "#;
        assert_eq!(scan(script, "ko"), "{ real: 1 }");
    }

    #[test]
    fn test_pattern_accepts_double_quoted_target() {
        let script = r#"new Chart(document.getElementById("chart-aapl"), { data: {"a":1}, options: {} });"#;
        assert_eq!(pattern(script, "aapl"), r#"{"a":1}"#);
        assert_eq!(scan(script, "aapl"), r#"{"a":1}"#);
    }

    #[test]
    fn test_chart_calls_resolved_once_for_many_cards() {
        let script: String = (0..300)
            .map(|i| {
                format!(
                    "const ctx = document.getElementById('chart-t{i}').getContext('2d');\n\
                     new Chart(ctx, {{ data: {{ n: {i} }}, options: {{}} }});\n"
                )
            })
            .collect();
        let buffer = ScriptBuffer::new(script);

        assert_eq!(buffer.charts.len(), 300);
        for i in [0, 1, 150, 299] {
            assert_eq!(
                buffer.correlate(&format!("t{i}"), CorrelationStrategy::Scan),
                format!("{{ n: {i} }}")
            );
        }
        assert_eq!(buffer.correlate("t300", CorrelationStrategy::Scan), EMPTY_CHART);
    }

    #[test]
    fn test_target_bindings_stop_after_max_hops() {
        let script = r#"
            var a = 'chart-deep';
            var b = a;
            var c = b;
            var d = c;
            new Chart(d, { data: { x: 1 } });
        "#;
        let buffer = ScriptBuffer::new(script.to_string());
        assert_eq!(buffer.charts[0].targets.len(), MAX_BINDING_HOPS + 1);
        assert_eq!(buffer.correlate("deep", CorrelationStrategy::Scan), EMPTY_CHART);
    }

    #[test]
    fn test_unbalanced_call_yields_empty() {
        assert_eq!(scan("new Chart('chart-x', { data: { a: 1 }", "x"), EMPTY_CHART);
    }

    #[test]
    fn test_classify_marks_literals() {
        let code = classify(br#"a'b'c"#);
        assert_eq!(code, vec![true, false, false, false, true]);
    }

    #[test]
    fn test_contains_token() {
        assert!(contains_token("'chart-aapl'", "chart-aapl"));
        assert!(!contains_token("'chart-aapl2'", "chart-aapl"));
        assert!(!contains_token("'mychart-aapl'", "chart-aapl"));
    }
}
