//! Post-processing of assembled translations.
//!
//! `format_result` splits the segmented output into sentences on newlines,
//! capitalizes each one (looking past an opening quote), wraps them in
//! `<p>` paragraphs and finally applies cosmetic spacing fixes.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::utils::capitalize_first;

/// Marker some phrase tables use for entries that render as nothing.
const NO_MEANING: &str = "no-meaning";

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: Lazy<Regex> = Lazy::new(|| Regex::new($re).expect("static pattern is valid"));
    };
}

pattern!(DOUBLE_COLON, r"(\d+):{2}");
pattern!(AT_SPACE, r"@\s+");
pattern!(WWW_DOMAIN, r"www\.\s*([a-zA-Z0-9_-]+)\s*\.\s*([a-zA-Z0-9_-]+)");
pattern!(OPEN_PAREN_SPACE, r"\(\s+");
pattern!(CLOSE_PAREN_SPACE, r"\s+\)");
pattern!(OPEN_BRACKET_SPACE, r"\[\s+");
pattern!(CLOSE_BRACKET_SPACE, r"\s+\]");
pattern!(SPACE_BEFORE_PUNCT, r"\s+([,.!?:;])");
pattern!(TABLE_ROW, r"[^\n]+:[^\n]+\t[^\n]+:[^\n]+");
pattern!(COLON_SPACES, r":\s+");
pattern!(TAB_SPACES, r"\t\s+");

/// Format a segmented translation into paragraphs.
pub fn format_result(text: &str) -> String {
    let text = text
        .replace(['“', '”'], "\"")
        .replace(NO_MEANING, "")
        .replace('、', ",")
        .replace(" ,", ",")
        .replace(" .", ".");

    let mut out = String::with_capacity(text.len() + 16);
    for sentence in text.split('\n') {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            continue;
        }
        out.push_str("<p>");
        out.push_str(&capitalize_sentence(sentence));
        out.push_str("</p>");
    }

    apply_fixes(&out)
}

/// Uppercase the first letter of a sentence. When it opens with a quote,
/// the letter after the quote is capitalized and one space right after the
/// quote is dropped.
fn capitalize_sentence(sentence: &str) -> String {
    match sentence.chars().next() {
        Some(quote @ ('"' | '\'')) => {
            let rest = &sentence[quote.len_utf8()..];
            let rest = rest.strip_prefix(' ').unwrap_or(rest);
            format!("{quote}{}", capitalize_first(rest))
        }
        _ => capitalize_first(sentence),
    }
}

/// Cosmetic spacing fixes applied to formatted output.
pub fn apply_fixes(text: &str) -> String {
    let text = DOUBLE_COLON.replace_all(text, "${1}:");
    let text = AT_SPACE.replace_all(&text, "@");
    let text = WWW_DOMAIN.replace_all(&text, "www.${1}.${2}");
    let text = OPEN_PAREN_SPACE.replace_all(&text, "(");
    let text = CLOSE_PAREN_SPACE.replace_all(&text, ")");
    let text = OPEN_BRACKET_SPACE.replace_all(&text, "[");
    let text = CLOSE_BRACKET_SPACE.replace_all(&text, "]");
    let text = SPACE_BEFORE_PUNCT.replace_all(&text, "${1}");

    // tab-separated `key: value` rows keep one space after each colon
    TABLE_ROW
        .replace_all(&text, |caps: &Captures| {
            let row = COLON_SPACES.replace_all(&caps[0], ": ");
            TAB_SPACES.replace_all(&row, "\t").into_owned()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_each_line_in_a_paragraph() {
        assert_eq!(
            format_result("xin chào\n\n thế giới \n"),
            "<p>Xin chào</p><p>Thế giới</p>"
        );
        assert_eq!(format_result("\n \n"), "");
    }

    #[test]
    fn capitalizes_after_opening_quote() {
        assert_eq!(format_result("\" xin chào\""), "<p>\"Xin chào\"</p>");
        assert_eq!(format_result("'đi thôi'"), "<p>'Đi thôi'</p>");
        assert_eq!(format_result("“ được”"), "<p>\"Được\"</p>");
    }

    #[test]
    fn strips_marker_and_normalizes_commas() {
        assert_eq!(format_result("a no-meaning、b ,c ."), "<p>A,b,c.</p>");
    }

    #[test]
    fn fixes_colons_and_brackets() {
        assert_eq!(apply_fixes("Chương 1:: mở đầu"), "Chương 1: mở đầu");
        assert_eq!(apply_fixes("( chú thích ) [ ghi ]"), "(chú thích) [ghi]");
        assert_eq!(apply_fixes("tốt , rồi !"), "tốt, rồi!");
    }

    #[test]
    fn fixes_addresses() {
        assert_eq!(apply_fixes("a@ b"), "a@b");
        assert_eq!(apply_fixes("www. abc . com"), "www.abc.com");
    }

    #[test]
    fn keeps_table_rows_aligned() {
        assert_eq!(apply_fixes("Tên:   A\t  Tuổi:  3"), "Tên: A\tTuổi: 3");
    }
}
