//! Line-level Markdown helpers: fenced code tracking and ATX headings.

/// One line of a text, with its byte offset and whether it sits inside a
/// fenced code block. Fence delimiter lines count as fenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    pub offset: usize,
    /// Includes the trailing newline, if any.
    pub text: &'a str,
    pub fenced: bool,
}

/// Iterate the lines of `text`, tracking ``` and ~~~ fences.
pub fn lines(text: &str) -> impl Iterator<Item = Line<'_>> {
    let mut offset = 0;
    let mut open_fence: Option<(char, usize)> = None;

    text.split_inclusive('\n').map(move |raw| {
        let line_offset = offset;
        offset += raw.len();

        let fenced = match (open_fence, fence_marker(raw)) {
            (None, Some(marker)) => {
                open_fence = Some(marker);
                true
            }
            (Some((ch, len)), Some((close_ch, close_len))) if ch == close_ch && close_len >= len => {
                open_fence = None;
                true
            }
            (Some(_), _) => true,
            (None, None) => false,
        };

        Line {
            offset: line_offset,
            text: raw,
            fenced,
        }
    })
}

fn fence_marker(line: &str) -> Option<(char, usize)> {
    let trimmed = line.trim_start();
    let ch = trimmed.chars().next()?;
    if ch != '`' && ch != '~' {
        return None;
    }
    let len = trimmed.chars().take_while(|c| *c == ch).count();
    (len >= 3).then_some((ch, len))
}

/// Heading text of an ATX heading line (`#` to `######` followed by a space),
/// with closing hashes removed.
pub fn heading_text(line: &str) -> Option<&str> {
    let trimmed = line.trim_end_matches(['\n', '\r']);
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.is_empty() && !rest.starts_with(' ') && !rest.starts_with('\t') {
        return None;
    }
    Some(rest.trim().trim_end_matches('#').trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_atx_headings() {
        assert_eq!(heading_text("# Title\n"), Some("Title"));
        assert_eq!(heading_text("### Deep ###"), Some("Deep"));
        assert_eq!(heading_text("#"), Some(""));
        assert_eq!(heading_text("#hashtag"), None);
        assert_eq!(heading_text("####### seven"), None);
        assert_eq!(heading_text("plain"), None);
    }

    #[test]
    fn tracks_fenced_blocks() {
        let text = "a\n```rust\n# not a heading\n```\nb\n";
        let fenced: Vec<bool> = lines(text).map(|l| l.fenced).collect();
        assert_eq!(fenced, vec![false, true, true, true, false]);
    }

    #[test]
    fn offsets_cover_the_whole_text() {
        let text = "one\ntwo\nthree";
        let collected: Vec<(usize, &str)> = lines(text).map(|l| (l.offset, l.text)).collect();
        assert_eq!(collected, vec![(0, "one\n"), (4, "two\n"), (8, "three")]);
    }
}
