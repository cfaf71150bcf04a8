//! Lexical term extraction shared by section indexing and query parsing.

use std::collections::BTreeMap;

/// Lowercase terms, split on every non-alphanumeric character.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Occurrence count per term. Ordered so iteration is reproducible.
pub fn term_counts(text: &str) -> BTreeMap<String, u32> {
    let mut counts = BTreeMap::new();
    for term in tokenize(text) {
        *counts.entry(term).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_punctuation_and_lowercases() {
        assert_eq!(
            tokenize("Use `cargo fmt`, then RUN tests!"),
            vec!["use", "cargo", "fmt", "then", "run", "tests"]
        );
    }

    #[test]
    fn empty_and_symbol_only_input_has_no_terms() {
        assert!(tokenize("").is_empty());
        assert!(tokenize(" -- ## ** ").is_empty());
    }

    #[test]
    fn counts_repeated_terms() {
        let counts = term_counts("deploy Deploy DEPLOY guide");
        assert_eq!(counts.get("deploy"), Some(&3));
        assert_eq!(counts.get("guide"), Some(&1));
    }
}
