//! Size bounding for rendered documents.
//!
//! Two policies, chosen by the caller:
//!
//! - [`TruncationStrategy::HeadTail`]: keep roughly the first 60% and last
//!   20% of the budget, joined by a notice. Both cuts snap to a natural
//!   boundary (paragraph break, heading, closing code fence, horizontal rule,
//!   sentence end) when one is close to the raw cut.
//! - [`TruncationStrategy::Head`]: keep only the beginning, snapped back to a
//!   paragraph or sentence end, followed by a short notice.
//!
//! All lengths are counted in `char`s so cuts never split a code point.

use regex::{Match, Regex};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Approximate chars-per-token ratio used in notices.
const CHARS_PER_TOKEN: usize = 4;

/// Smallest accepted `max_length`. Below it the notice alone would not fit.
pub const MIN_MAX_LENGTH: usize = 500;

/// Text that appears exactly once in every truncated output.
pub const TRUNCATION_MARKER: &str = "Content truncated";

/// Paragraph break, heading, code fence, horizontal rule, or sentence end.
static NATURAL_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\n\n|\n#{1,6} |\n```\n|\n---\n|[.!?]\s").expect("valid boundary regex")
});

/// Paragraph break or sentence end only, for the single-cut policy.
static PARAGRAPH_OR_SENTENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\n|[.!?]\s").expect("valid sentence regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncationStrategy {
    #[default]
    HeadTail,
    Head,
}

impl std::str::FromStr for TruncationStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "head_tail" | "head-tail" => Ok(TruncationStrategy::HeadTail),
            "head" => Ok(TruncationStrategy::Head),
            other => anyhow::bail!(
                "invalid truncation strategy '{}'. Use head_tail or head.",
                other
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TruncationResult {
    pub content: String,
    pub was_truncated: bool,
    pub original_length: usize,
    pub truncated_length: usize,
}

impl TruncationResult {
    fn unchanged(text: &str, length: usize) -> Self {
        Self {
            content: text.to_string(),
            was_truncated: false,
            original_length: length,
            truncated_length: length,
        }
    }

    fn truncated(content: String, original_length: usize) -> Self {
        let truncated_length = content.chars().count();
        Self {
            content,
            was_truncated: true,
            original_length,
            truncated_length,
        }
    }
}

/// Bound `text` to `max_length` chars with the given policy.
pub fn truncate(text: &str, max_length: usize, strategy: TruncationStrategy) -> TruncationResult {
    match strategy {
        TruncationStrategy::HeadTail => truncate_head_tail(text, max_length),
        TruncationStrategy::Head => truncate_head(text, max_length),
    }
}

/// Keep the beginning and the end of `text`, dropping the middle.
pub fn truncate_head_tail(text: &str, max_length: usize) -> TruncationResult {
    let total = text.chars().count();
    if total <= max_length {
        return TruncationResult::unchanged(text, total);
    }

    let mut head_budget = max_length * 6 / 10;
    let mut tail_budget = max_length * 2 / 10;

    // The worst-case notice must fit in what the slices leave over.
    let notice_room = head_tail_notice(total, total, max_length).chars().count();
    if head_budget + tail_budget + notice_room > max_length {
        let available = max_length.saturating_sub(notice_room);
        head_budget = available * 3 / 4;
        tail_budget = available - head_budget;
    }

    let head = snap_head(text, head_budget, 5, &NATURAL_BOUNDARY);
    let tail = snap_tail(text, tail_budget);

    let kept = head.chars().count() + tail.chars().count();
    let omitted = total - kept;
    let notice = head_tail_notice(total, omitted, max_length);

    let mut content = String::with_capacity(head.len() + notice.len() + tail.len());
    content.push_str(head);
    content.push_str(&notice);
    content.push_str(tail);

    TruncationResult::truncated(content, total)
}

/// Keep only the beginning of `text`, for content where the end carries no
/// extra value.
pub fn truncate_head(text: &str, max_length: usize) -> TruncationResult {
    let total = text.chars().count();
    if total <= max_length {
        return TruncationResult::unchanged(text, total);
    }

    let notice_room = head_notice(total, total).chars().count();
    let keep = max_length.saturating_sub(notice_room);
    let head = snap_head(text, keep, 10, &PARAGRAPH_OR_SENTENCE);

    let notice = head_notice(head.chars().count(), total);
    let mut content = String::with_capacity(head.len() + notice.len());
    content.push_str(head);
    content.push_str(&notice);

    TruncationResult::truncated(content, total)
}

fn head_tail_notice(total: usize, omitted: usize, max_length: usize) -> String {
    let percent = omitted as f64 * 100.0 / total.max(1) as f64;
    format!(
        "\n\n---\n\n> **{}**: the original document has {} characters (~{} tokens). \
         {} characters ({:.1}%) were omitted from the middle to fit the {}-character limit; \
         the beginning and the end are shown.\n\n---\n\n",
        TRUNCATION_MARKER,
        total,
        estimate_tokens(total),
        omitted,
        percent,
        max_length
    )
}

fn head_notice(shown: usize, total: usize) -> String {
    format!(
        "\n\n---\n\n*[{}: showing the first {} of {} characters (~{} tokens).]*",
        TRUNCATION_MARKER,
        shown,
        total,
        estimate_tokens(total)
    )
}

fn estimate_tokens(chars: usize) -> usize {
    chars.div_ceil(CHARS_PER_TOKEN)
}

/// Byte offset of the `n`th char, or `text.len()` past the end.
fn byte_offset(text: &str, n: usize) -> usize {
    text.char_indices()
        .nth(n)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// First `budget` chars of `text`, cut back to the last boundary found in
/// the final `1/window_divisor` of the slice.
fn snap_head<'a>(text: &'a str, budget: usize, window_divisor: usize, boundary: &Regex) -> &'a str {
    let raw = &text[..byte_offset(text, budget)];
    let window_start = byte_offset(raw, budget - budget / window_divisor);

    let cut = boundary
        .find_iter(&raw[window_start..])
        .filter(|m| !is_fence(m) || closes_fence(text, window_start + m.end()))
        .last()
        .map(|m| window_start + head_cut(&m));

    match cut {
        Some(end) => raw[..end].trim_end(),
        None => raw,
    }
}

/// Last `budget` chars of `text`, advanced past the first boundary found in
/// the leading fifth of the slice.
fn snap_tail(text: &str, budget: usize) -> &str {
    let total = text.chars().count();
    let tail_offset = byte_offset(text, total - budget.min(total));
    let raw = &text[tail_offset..];
    let window_end = byte_offset(raw, budget / 5);

    let start = NATURAL_BOUNDARY
        .find_iter(&raw[..window_end])
        .find(|m| !is_fence(m) || closes_fence(text, tail_offset + m.end()))
        .map(|m| tail_cut(&m));

    match start {
        Some(start) => raw[start..].trim_start(),
        None => raw,
    }
}

fn is_fence(m: &Match<'_>) -> bool {
    m.as_str() == "\n```\n"
}

/// Whether the fence ending at `end` closes a block opened earlier.
fn closes_fence(text: &str, end: usize) -> bool {
    text[..end].matches("```").count() % 2 == 0
}

/// Where the head stops for a boundary match. Headings and rules start the
/// next section, so the head ends before them.
fn head_cut(m: &Match<'_>) -> usize {
    let s = m.as_str();
    if s.starts_with("\n#") || s == "\n---\n" {
        m.start()
    } else {
        m.end()
    }
}

/// Where the tail starts for a boundary match. A heading is kept as the
/// tail's first line.
fn tail_cut(m: &Match<'_>) -> usize {
    if m.as_str().starts_with("\n#") {
        m.start() + 1
    } else {
        m.end()
    }
}
