use std::collections::BTreeMap;

use super::markdown::{heading_text, lines};
use super::terms::term_counts;
use super::tokens::TokenCounter;

/// A heading-delimited slice of a resolved document.
///
/// `content` includes the heading line itself so that heading words take part
/// in scoring and the emitted context reads naturally.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    /// Empty for a preamble section.
    pub heading: String,
    /// Position within the owning document. Used for tie-breaking.
    pub order: usize,
    /// Byte range in the resolved text.
    pub start: usize,
    pub end: usize,
    pub content: String,
    pub tokens: usize,
    pub term_counts: BTreeMap<String, u32>,
}

impl Section {
    pub fn new(
        heading: impl Into<String>,
        order: usize,
        start: usize,
        content: impl Into<String>,
        counter: &dyn TokenCounter,
    ) -> Self {
        let content = content.into();
        let tokens = counter.count_tokens(&content);
        let term_counts = term_counts(&content);
        Self {
            heading: heading.into(),
            order,
            start,
            end: start + content.len(),
            content,
            tokens,
            term_counts,
        }
    }

    pub fn term_frequency(&self, term: &str) -> u32 {
        self.term_counts.get(term).copied().unwrap_or(0)
    }
}

/// Split resolved text into sections at ATX headings outside fenced code.
///
/// Text before the first heading becomes a preamble section with an empty
/// heading, unless it is blank.
pub fn parse_sections(text: &str, counter: &dyn TokenCounter) -> Vec<Section> {
    section_ranges(text)
        .into_iter()
        .enumerate()
        .map(|(order, range)| {
            Section::new(
                range.heading.unwrap_or_default(),
                order,
                range.start,
                &text[range.start..range.end],
                counter,
            )
        })
        .collect()
}

/// The text of the first section whose heading matches `heading`,
/// ignoring ASCII case.
pub fn section_slice<'t>(text: &'t str, heading: &str) -> Option<&'t str> {
    section_ranges(text)
        .into_iter()
        .find(|r| {
            r.heading
                .as_deref()
                .map(|h| h.eq_ignore_ascii_case(heading.trim()))
                .unwrap_or(false)
        })
        .map(|r| &text[r.start..r.end])
}

struct SectionRange {
    heading: Option<String>,
    start: usize,
    end: usize,
}

fn section_ranges(text: &str) -> Vec<SectionRange> {
    let mut ranges = Vec::new();
    let mut current_start = 0;
    let mut current_heading: Option<String> = None;

    for line in lines(text) {
        if line.fenced {
            continue;
        }
        let Some(heading) = heading_text(line.text) else {
            continue;
        };
        push_range(&mut ranges, text, current_heading.take(), current_start, line.offset);
        current_start = line.offset;
        current_heading = Some(heading.to_string());
    }
    push_range(&mut ranges, text, current_heading, current_start, text.len());

    ranges
}

fn push_range(
    ranges: &mut Vec<SectionRange>,
    text: &str,
    heading: Option<String>,
    start: usize,
    end: usize,
) {
    if heading.is_none() && text[start..end].trim().is_empty() {
        return;
    }
    ranges.push(SectionRange { heading, start, end });
}
