use crate::document::markdown::lines;

/// The target of an inclusion directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference<'a> {
    /// The directive argument as written, for error reporting.
    pub raw: &'a str,
    pub target: &'a str,
    pub fragment: Option<&'a str>,
}

/// A run of literal text or one inclusion directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Include(Reference<'a>),
}

/// Split `text` into literal runs and directives. Directive lines are
/// consumed whole, newline included.
pub fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut text_start = 0;

    for line in lines(text) {
        if line.fenced {
            continue;
        }
        let Some(reference) = directive_reference(line.text) else {
            continue;
        };
        if text_start < line.offset {
            out.push(Segment::Text(&text[text_start..line.offset]));
        }
        out.push(Segment::Include(reference));
        text_start = line.offset + line.text.len();
    }
    if text_start < text.len() {
        out.push(Segment::Text(&text[text_start..]));
    }

    out
}

/// Parse `@include <ref>` or `![[<ref>]]`. Anything else on the line means it
/// is not a directive.
pub fn directive_reference(line: &str) -> Option<Reference<'_>> {
    let trimmed = line.trim();

    let raw = if let Some(rest) = trimmed.strip_prefix("@include") {
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        rest.trim()
    } else if let Some(inner) = trimmed
        .strip_prefix("![[")
        .and_then(|rest| rest.strip_suffix("]]"))
    {
        // ![[target|alias]]
        inner.split('|').next().unwrap_or(inner).trim()
    } else {
        return None;
    };

    if raw.is_empty() {
        return None;
    }

    let (target, fragment) = match raw.split_once('#') {
        Some((target, fragment)) => (target.trim(), Some(fragment.trim()).filter(|f| !f.is_empty())),
        None => (raw, None),
    };
    if target.is_empty() {
        return None;
    }

    Some(Reference {
        raw,
        target,
        fragment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_directive_forms() {
        let at = directive_reference("@include shared/style.md\n").unwrap();
        assert_eq!(at.target, "shared/style.md");
        assert_eq!(at.fragment, None);

        let wiki = directive_reference("  ![[notes/api#Errors|see errors]]").unwrap();
        assert_eq!(wiki.target, "notes/api");
        assert_eq!(wiki.fragment, Some("Errors"));
        assert_eq!(wiki.raw, "notes/api#Errors");
    }

    #[test]
    fn rejects_non_directives() {
        assert_eq!(directive_reference("@includes other.md"), None);
        assert_eq!(directive_reference("@include"), None);
        assert_eq!(directive_reference("see ![[inline]] here"), None);
        assert_eq!(directive_reference("![[#only-fragment]]"), None);
    }

    #[test]
    fn splits_text_around_directives() {
        let text = "before\n@include a.md\nafter\n";
        assert_eq!(
            segments(text),
            vec![
                Segment::Text("before\n"),
                Segment::Include(Reference {
                    raw: "a.md",
                    target: "a.md",
                    fragment: None
                }),
                Segment::Text("after\n"),
            ]
        );
    }

    #[test]
    fn directives_in_code_fences_stay_literal() {
        let text = "```\n@include a.md\n```\n";
        assert_eq!(segments(text), vec![Segment::Text(text)]);
    }
}
