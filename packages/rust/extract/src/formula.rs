//! Equation detection in content fragments.
//!
//! A formula is a run of short tokens on both sides of `=`, where a token is
//! a whole word of at most four word characters or a single operator symbol.
//! Long words never qualify, which keeps prose like "Force = mass ×
//! acceleration" out while catching `F = ma` or `E = mc^2`.

use std::sync::LazyLock;

use regex::Regex;

/// Matches shorter than this (after trimming) are noise.
const MIN_FORMULA_CHARS: usize = 4;

static FORMULA_RE: LazyLock<Regex> = LazyLock::new(|| {
    let token = r"(?:\b\w{1,4}\b|[+\-*/½().^])";
    Regex::new(&format!(r"(?:{token}\s*)+\s*=\s*(?:{token}\s*)+")).expect("formula regex")
});

/// All formula-like spans in `fragment`, trimmed.
pub fn detect_formulas(fragment: &str) -> Vec<String> {
    FORMULA_RE
        .find_iter(fragment)
        .map(|m| m.as_str().trim())
        .filter(|f| f.chars().count() >= MIN_FORMULA_CHARS)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_token_formula() {
        assert_eq!(detect_formulas("F = ma"), vec!["F = ma"]);
    }

    #[test]
    fn long_words_are_not_formulas() {
        assert!(detect_formulas("Force = mass × acceleration").is_empty());
    }

    #[test]
    fn operators_and_powers() {
        assert_eq!(detect_formulas("Energy: E = mc^2"), vec!["E = mc^2"]);
        assert_eq!(detect_formulas("Ek = ½mv^2"), vec!["Ek = ½mv^2"]);
    }

    #[test]
    fn formula_inside_sentence() {
        let found = detect_formulas("Ohm's law V = IR applied to circuits");
        assert_eq!(found.len(), 1);
        assert!(found[0].contains("V = IR"));
    }

    #[test]
    fn bracketed_formula() {
        assert_eq!(detect_formulas("(F Δt = mΔv)"), vec!["(F Δt = mΔv)"]);
    }

    #[test]
    fn tiny_matches_are_dropped() {
        assert!(detect_formulas("x=y").is_empty());
        assert_eq!(detect_formulas("x = y"), vec!["x = y"]);
    }

    #[test]
    fn no_equals_no_formula() {
        assert!(detect_formulas("Newton's second law").is_empty());
    }
}
