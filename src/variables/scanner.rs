//! Expression scanner for `{{...}}` spans.
//!
//! Only innermost spans are reported: a span whose inner text still contains
//! `{{` is skipped until its nested spans have been reduced. Repeating
//! scan-and-replace therefore resolves nested expressions inside-out.

use std::ops::Range;

/// An innermost `{{...}}` span found in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Byte range of the whole span, braces included.
    pub range: Range<usize>,

    /// Inner expression with surrounding whitespace stripped.
    pub expression: String,
}

/// Returns every innermost `{{...}}` span of `text`, left to right.
///
/// Spans never overlap. For each closing `}}` the nearest preceding `{{` that
/// lies after the previous span is paired with it; a closing `}}` with no
/// such opener is ordinary text.
///
/// # Examples
///
/// ```
/// use rest_chain::variables::scanner::scan;
///
/// let spans = scan("{{steps.a.response.body.{{i}}.id}}");
/// assert_eq!(spans.len(), 1);
/// assert_eq!(spans[0].expression, "i");
/// ```
pub fn scan(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut cursor = 0;

    while let Some(close_rel) = text[cursor..].find("}}") {
        let close = cursor + close_rel;
        if let Some(open_rel) = text[cursor..close].rfind("{{") {
            let open = cursor + open_rel;
            spans.push(Span {
                range: open..close + 2,
                expression: text[open + 2..close].trim().to_string(),
            });
        }
        cursor = close + 2;
    }

    spans
}

/// Returns true if `text` contains at least one span that [`scan`] would report.
pub fn has_expressions(text: &str) -> bool {
    text.contains("{{") && !scan(text).is_empty()
}

/// Replaces each span with the corresponding value, in one pass.
///
/// `values` must be parallel to `spans` as returned by [`scan`] for `text`.
pub fn splice(text: &str, spans: &[Span], values: &[String]) -> String {
    let mut result = String::with_capacity(text.len() + text.len() / 4);
    let mut last_end = 0;

    for (span, value) in spans.iter().zip(values) {
        result.push_str(&text[last_end..span.range.start]);
        result.push_str(value);
        last_end = span.range.end;
    }

    result.push_str(&text[last_end..]);
    result
}
