//! Text normalization applied before segmentation.
//!
//! `normalize` is pure and idempotent. The steps are ordered so that no
//! step can recreate a pattern an earlier step removes:
//! 1. strip carriage returns
//! 2. collapse pairs of ideographic spaces
//! 3. expand `&nbsp;` / `&ensp;` / `&emsp;` into space runs
//! 4. NFC
//! 5. repair mis-encoded punctuation sequences
//! 6. drop 的 between two Han characters, then 了 after a Han character
//! 7. full-width , . : ? ! to ASCII
//! 8. trim

use once_cell::sync::Lazy;
use phf::phf_map;
use regex::{Captures, Regex};
use unicode_normalization::UnicodeNormalization;

use crate::utils::is_han;

/// Mojibake left behind by legacy encodings, longest sequences first.
const MISENCODED: &[(&str, &str)] = &[
    ("ă€‚", "."),
    ("ï¼Œ", ","),
    ("ă€", ","),
    ("â€œ", "\""),
    ("â€", "\""),
    ("ï¼", ":"),
];

static FULLWIDTH_PUNCTUATION: phf::Map<char, char> = phf_map! {
    '，' => ',',
    '。' => '.',
    '：' => ':',
    '？' => '?',
    '！' => '!',
};

static ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)&(nbsp|ensp|emsp);").expect("entity pattern is valid"));

const LINKING_PARTICLE: char = '的';
const ASPECT_PARTICLE: char = '了';

/// Canonicalize punctuation and whitespace and drop semantically empty
/// particles.
pub fn normalize(text: &str) -> String {
    let text = text.replace('\r', "");
    let text = text.replace("\u{3000}\u{3000}", "");
    let text = expand_entities(&text);
    let text: String = text.nfc().collect();
    let text = repair_misencoded(text);
    let text = drop_particles(&text);
    let text: String = text
        .chars()
        .map(|c| FULLWIDTH_PUNCTUATION.get(&c).copied().unwrap_or(c))
        .collect();
    text.trim().to_string()
}

fn expand_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &Captures| {
            match caps[1].to_ascii_lowercase().as_str() {
                "nbsp" => " ",
                "ensp" => "  ",
                _ => "    ",
            }
        })
        .into_owned()
}

fn repair_misencoded(mut text: String) -> String {
    for (from, to) in MISENCODED {
        if text.contains(from) {
            text = text.replace(from, to);
        }
    }
    text
}

/// Remove 的 sitting between two Han characters, then 了 following a Han
/// character. Neighbours are judged on the input of each pass.
fn drop_particles(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();

    let mut kept: Vec<char> = Vec::with_capacity(chars.len());
    for (i, &c) in chars.iter().enumerate() {
        let between_han = i > 0
            && is_han(chars[i - 1])
            && chars.get(i + 1).is_some_and(|&next| is_han(next));
        if c == LINKING_PARTICLE && between_han {
            continue;
        }
        kept.push(c);
    }

    let mut out = String::with_capacity(text.len());
    for (i, &c) in kept.iter().enumerate() {
        if c == ASPECT_PARTICLE && i > 0 && is_han(kept[i - 1]) {
            continue;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fullwidth_punctuation_becomes_ascii() {
        assert_eq!(normalize("你好，世界。真的吗？是！注意："), "你好,世界.真吗?是!注意:");
    }

    #[test]
    fn trims_and_strips_carriage_returns() {
        assert_eq!(normalize("  你好\r\n再见  "), "你好\n再见");
    }

    #[test]
    fn expands_whitespace_entities_case_insensitively() {
        assert_eq!(normalize("a&nbsp;b&ENSP;c&emsp;d"), "a b  c    d");
    }

    #[test]
    fn drops_linking_particle_only_between_han() {
        assert_eq!(normalize("我的书"), "我书");
        assert_eq!(normalize("的书"), "的书");
        assert_eq!(normalize("我的"), "我的");
        assert_eq!(normalize("a的b"), "a的b");
    }

    #[test]
    fn drops_aspect_particle_after_han() {
        assert_eq!(normalize("他走了"), "他走");
        assert_eq!(normalize("他走了。"), "他走.");
        assert_eq!(normalize("了解"), "了解");
        assert_eq!(normalize("ok了"), "ok了");
    }

    #[test]
    fn collapses_ideographic_space_pairs() {
        assert_eq!(normalize("第一章\u{3000}\u{3000}开始"), "第一章开始");
    }

    #[test]
    fn repairs_misencoded_punctuation() {
        assert_eq!(normalize("好ă€‚坏ï¼Œ"), "好.坏,");
        assert_eq!(normalize("â€œ你â€"), "\"你\"");
    }

    #[test]
    fn idempotent_on_tricky_inputs() {
        let samples = [
            "中\u{3000}\u{3000}的国",
            "&nb\u{3000}\u{3000}sp;x",
            "中的的的国",
            "A的了国",
            "中了的A",
            "\u{F9BA}",
            "  &nbsp;你好，&emsp; ",
            "ă\r€‚",
            "他说：“好了！”",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "input {:?}", s);
        }
    }
}
