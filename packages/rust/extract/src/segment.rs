//! Cell segmentation: noise filtering, topic splitting, bullet fragments.
//!
//! Cells arrive as free text with hand-typed bullets, line breaks from the
//! PDF layout and teaching-time annotations such as `(2 hrs)`.

use std::sync::LazyLock;

use regex::Regex;

/// Boilerplate found in page headers, footers and sign-off blocks.
const NOISE_PATTERNS: &[&str] = &[
    "teacher:",
    "signature:",
    "date:",
    "curr adv:",
    "school stamp",
    "department of education",
    "annual teaching plan",
    "page",
    "copyright",
];

/// Header labels repeated inside data cells.
const LABEL_ECHOES: &[&str] = &["week", "term"];

/// Characters ending a topic title.
const TITLE_BREAKS: &[char] = &['\n', '•', '-'];

/// A bullet marker at the start of the text or of a line.
static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\n)\s*[•\-]\s*").expect("bullet regex")
});

/// Teaching-time annotation, e.g. `(2 hrs)` or `(1hr)`.
static HOURS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\(\d+\s*hrs?\)").expect("hours regex")
});

/// Whether a cell is page boilerplate rather than curriculum content.
pub fn is_noise(text: &str) -> bool {
    let lower = text.to_lowercase();
    NOISE_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Whether a cell only repeats a header label such as "Week".
pub fn is_label_echo(text: &str) -> bool {
    let lower = text.to_lowercase();
    LABEL_ECHOES.contains(&lower.as_str())
}

/// A topic cell split into its title and the text that follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicParts {
    pub title: String,
    pub remainder: Option<String>,
}

/// Split a topic cell at the first newline or bullet character.
pub fn split_topic(text: &str) -> TopicParts {
    match text.char_indices().find(|(_, c)| TITLE_BREAKS.contains(c)) {
        Some((idx, brk)) => {
            let rest = text[idx + brk.len_utf8()..].trim();
            TopicParts {
                title: text[..idx].trim().to_string(),
                remainder: (!rest.is_empty()).then(|| rest.to_string()),
            }
        }
        None => TopicParts {
            title: text.trim().to_string(),
            remainder: None,
        },
    }
}

/// Split content text into cleaned bullet fragments.
///
/// Text without line-leading bullets is a single fragment.
pub fn segment_content(text: &str) -> Vec<String> {
    if !BULLET_RE.is_match(text) {
        return clean_fragment(text).into_iter().collect();
    }

    BULLET_RE.split(text).filter_map(clean_fragment).collect()
}

/// Flatten assessment text onto one line.
pub fn clean_assessment(text: &str) -> String {
    text.replace('\n', " ").trim().to_string()
}

/// Drop hour annotations, fold newlines, trim. `None` if nothing is left.
fn clean_fragment(fragment: &str) -> Option<String> {
    let stripped = HOURS_RE.replace_all(fragment, "");
    let cleaned = stripped.replace('\n', " ");
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}
