//! Citation parsing
//!
//! Answers cite evidence by 1-based number: `[2]`, `[1, 3]`, `[Document 2]`
//! or `[Source 2]`. Numbers outside the retrieved range are ignored.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

fn citation_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\[\s*(?:(?:document|doc|source)s?\s*)?(\d+(?:\s*(?:,|and)\s*\d+)*)\s*\]")
            .expect("citation pattern is valid")
    })
}

/// Zero-based indices of cited evidence, ascending and deduplicated
pub fn cited_indices(answer: &str, retrieved: usize) -> Vec<usize> {
    let mut cited = BTreeSet::new();
    for capture in citation_pattern().captures_iter(answer) {
        let numbers = capture.get(1).map_or("", |m| m.as_str());
        for number in numbers
            .split(|c: char| !c.is_ascii_digit())
            .filter_map(|n| n.parse::<usize>().ok())
        {
            if (1..=retrieved).contains(&number) {
                cited.insert(number - 1);
            }
        }
    }
    cited.into_iter().collect()
}

/// Cited indices, or every retrieved index when nothing valid is cited
pub fn evidence_indices(answer: &str, retrieved: usize) -> Vec<usize> {
    let cited = cited_indices(answer, retrieved);
    if cited.is_empty() {
        (0..retrieved).collect()
    } else {
        cited
    }
}
