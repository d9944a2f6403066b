//! Text preparation for speech — markdown cleaning, whitespace and quote handling.
//!
//! Pure functions, no I/O.

use regex::Regex;
use std::sync::LazyLock;

// Compiled regexes — allocated once, reused across calls.
static RE_FENCED_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*?```").unwrap());
static RE_INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());
static RE_BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static RE_ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*]+)\*").unwrap());
static RE_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#{1,6}\s*").unwrap());
static RE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").unwrap());
static RE_BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[\s]*[-*]\s+").unwrap());
static RE_MULTI_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());
static RE_SOURCE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+[-–|]\s+[^-–|]+$").unwrap());

/// Strip markdown from a generated answer so it reads naturally when spoken.
pub fn clean_text_for_speech(text: &str) -> String {
    let mut c = RE_FENCED_CODE.replace_all(text, " ").into_owned();
    c = RE_INLINE_CODE.replace_all(&c, "$1").into_owned();
    c = RE_BOLD.replace_all(&c, "$1").into_owned();
    c = RE_ITALIC.replace_all(&c, "$1").into_owned();
    c = RE_HEADING.replace_all(&c, "").into_owned();
    c = RE_LINK.replace_all(&c, "$1").into_owned();
    c = RE_BULLET.replace_all(&c, "").into_owned();
    normalize_whitespace(&c)
}

/// Replace control characters (newlines, tabs, NUL) with spaces and collapse runs.
///
/// Synthesizers read a single argv element; a stray newline or NUL would
/// otherwise truncate or split the utterance.
pub fn normalize_whitespace(text: &str) -> String {
    let spaced: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    RE_MULTI_SPACE.replace_all(&spaced, " ").trim().to_string()
}

/// Render `text` as the body of a PowerShell single-quoted string literal.
///
/// Every character PowerShell accepts as a single quote (ASCII `'` and the
/// curly forms U+2018..U+201B) is doubled, which is PowerShell's own escape.
/// Double quotes, straight or curly, are removed because the script itself
/// travels inside `-Command "..."`.
pub fn powershell_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\'' | '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' => {
                out.push(c);
                out.push(c);
            }
            '"' | '\u{201C}' | '\u{201D}' | '\u{201E}' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Drop the trailing ` - Source Name` that news APIs append to titles.
pub fn strip_source_suffix(title: &str) -> String {
    RE_SOURCE_SUFFIX.replace(title.trim(), "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input() {
        assert_eq!(clean_text_for_speech(""), "");
        assert_eq!(normalize_whitespace("   "), "");
    }

    #[test]
    fn plain_text_unchanged() {
        let t = "The weather is nice today.";
        assert_eq!(clean_text_for_speech(t), t);
    }

    #[test]
    fn strips_markdown() {
        let md = "# Answer\n\n**Rust** is a *systems* language. See [docs](https://rust-lang.org).\n- fast\n- safe";
        assert_eq!(
            clean_text_for_speech(md),
            "Answer Rust is a systems language. See docs. fast safe"
        );
    }

    #[test]
    fn drops_fenced_code() {
        let md = "Try this:\n```rust\nfn main() {}\n```\nDone.";
        assert_eq!(clean_text_for_speech(md), "Try this: Done.");
    }

    #[test]
    fn control_chars_become_spaces() {
        assert_eq!(normalize_whitespace("one\ntwo\tthree\0four"), "one two three four");
    }

    #[test]
    fn powershell_literal_doubles_single_quotes() {
        assert_eq!(powershell_literal("it's"), "it''s");
        assert_eq!(powershell_literal(r#"the "best""#), "the best");
    }

    #[test]
    fn powershell_literal_doubles_curly_single_quotes() {
        assert_eq!(powershell_literal("it\u{2019}s"), "it\u{2019}\u{2019}s");
        assert_eq!(
            powershell_literal("\u{2018}a\u{201A}b\u{201B}"),
            "\u{2018}\u{2018}a\u{201A}\u{201A}b\u{201B}\u{201B}"
        );
        assert_eq!(powershell_literal("\u{201C}quoted\u{201D}"), "quoted");
    }

    #[test]
    fn strips_news_source() {
        assert_eq!(
            strip_source_suffix("Markets rally on rate news - Reuters"),
            "Markets rally on rate news"
        );
        assert_eq!(strip_source_suffix("No source here"), "No source here");
    }
}
