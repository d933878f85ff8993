//! Title-to-filename normalization.
//!
//! Archived objects are keyed by their bookmark title, so the title has to be
//! reduced to something that is safe both as a filesystem name and as a path
//! segment in a storage key. The substitution list below is ordered and must
//! stay that way: later patterns match substrings produced (or left
//! unmatched) by earlier ones, and storage paths for previously archived
//! items depend on the exact output.

use std::sync::LazyLock;

use regex::Regex;

/// Emoji and pictographic blocks, regional indicators, enclosed marks, and
/// the zero-width joiner used to compose multi-part emoji.
static EMOJI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        "[\\x{1f300}-\\x{1f5ff}\\x{1f900}-\\x{1f9ff}\\x{1f600}-\\x{1f64f}\
         \\x{1f680}-\\x{1f6ff}\\x{2600}-\\x{26ff}\\x{2700}-\\x{27bf}\
         \\x{1f1e6}-\\x{1f1ff}\\x{1f191}-\\x{1f251}\\x{1f004}\\x{1f0cf}\
         \\x{1f170}-\\x{1f171}\\x{1f17e}-\\x{1f17f}\\x{1f18e}\\x{3030}\
         \\x{2b50}\\x{2b55}\\x{2934}-\\x{2935}\\x{2b05}-\\x{2b07}\
         \\x{2b1b}-\\x{2b1c}\\x{3297}\\x{3299}\\x{303d}\\x{00a9}\\x{00ae}\
         \\x{2122}\\x{23f3}\\x{24c2}\\x{23e9}-\\x{23ef}\\x{25b6}\
         \\x{23f8}-\\x{23fa}\\x{200d}]",
    )
    .expect("emoji pattern is valid")
});

static DASH_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-|\\]+").expect("dash-run pattern is valid"));

static INVALID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_\- ]+").expect("invalid-char pattern is valid"));

static COMBINING_MARKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{Mn}+").expect("combining-mark pattern is valid"));

/// Textual separators collapsed to a single hyphen, in application order.
const SEPARATORS: &[&str] = &[
    ". ", ", ", " :: ", " : ", ": ", " - ", " -- ", " \u{2013} ", " \u{2013}\u{2013} ",
    " \u{2014} ", " \u{2014}\u{2014} ",
];

/// Normalize a bookmark title into a filename-safe token.
///
/// Total and deterministic: unrecognized characters are dropped, never
/// rejected, and `normalize(normalize(s)) == normalize(s)` for any input.
#[must_use]
pub fn normalize(title: &str) -> String {
    let mut name = EMOJI.replace_all(title, "").into_owned();

    name = name
        .trim_matches([' ', '\t', '\n', '\r', '\u{b}', '\u{c}'])
        .to_string();

    for suffix in [".", "?", "!"] {
        if let Some(stripped) = name.strip_suffix(suffix) {
            name = stripped.to_string();
        }
    }

    for separator in SEPARATORS {
        name = name.replace(separator, "-");
    }
    name = name.replace("\u{2026} ", "_");

    name = DASH_RUNS.replace_all(&name, "-").into_owned();
    name = name.replace(" & ", "_and_").replace('&', "_and_");
    name = name.replace('?', "");
    name = INVALID.replace_all(&name, "").into_owned();
    name = name.replace(' ', "_");
    name = COMBINING_MARKS.replace_all(&name, "").into_owned();

    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separators_collapse_to_hyphens() {
        assert_eq!(normalize("Intro: A Guide"), "Intro-A_Guide");
        assert_eq!(normalize("Part One - Part Two"), "Part_One-Part_Two");
        assert_eq!(normalize("A \u{2014} B"), "A-B");
        assert_eq!(normalize("One. Two, Three"), "One-Two-Three");
    }

    #[test]
    fn test_trailing_punctuation_stripped() {
        assert_eq!(normalize("Really?"), "Really");
        assert_eq!(normalize("Done!"), "Done");
        assert_eq!(normalize("The End."), "The_End");
    }

    #[test]
    fn test_ampersand_becomes_and() {
        assert_eq!(normalize("Salt & Pepper"), "Salt_and_Pepper");
        assert_eq!(normalize("AT&T"), "AT_and_T");
    }

    #[test]
    fn test_emoji_stripped() {
        // The emoji is removed outright; its surrounding spaces survive into
        // the underscore substitution.
        assert_eq!(normalize("Hello \u{1f600} World"), "Hello__World");
        assert_eq!(normalize("Hello\u{1f600} World"), "Hello_World");
        assert_eq!(normalize("\u{1f680}\u{1f680}\u{1f680}"), "");
    }

    #[test]
    fn test_diacritics_and_dashes() {
        // "Résumé: A Story — Part One!" -> ASCII, space-free token
        let out = normalize("R\u{e9}sum\u{e9}: A Story \u{2014} Part One!");
        assert_eq!(out, "Rsum-A_Story-Part_One");
        assert!(out.is_ascii());
        assert!(!out.contains(' '));
    }

    #[test]
    fn test_combining_marks_stripped() {
        // NFD-style decomposed accent: base letter survives, mark does not.
        assert_eq!(normalize("Cafe\u{301}"), "Cafe");
    }

    #[test]
    fn test_backslash_and_pipe_runs() {
        assert_eq!(normalize(r"a\\b||c"), "a-b-c");
    }

    #[test]
    fn test_total_on_degenerate_inputs() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("!?."), "");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "",
            "R\u{e9}sum\u{e9}: A Story \u{2014} Part One!",
            "My Cool Video!",
            "\u{1f600}\u{1f600}",
            "a & b :: c \u{2026} d",
            "...???!!!",
            "Mixed \t whitespace \u{b} here",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {input:?}");
        }
    }
}
