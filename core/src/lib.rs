//! libvietphrase-core
//!
//! Dictionary-driven Chinese → Vietnamese translation engine shared by the
//! front crate (`libvietphrase`).
//!
//! The engine segments normalized Chinese text into the longest recognizable
//! units (names, phrases, rule templates, single characters), renders each
//! unit in Vietnamese or Sino-Vietnamese, and records which source span
//! produced which output span.
//!
//! Public API:
//! - `Dictionary` / `parse_dictionary` - flat `key=value` tables
//! - `DictionarySet` / `DictionaryTables` - immutable dictionary snapshot
//! - `normalize` - punctuation and particle canonicalization
//! - `RuleSet` - rule templates with one `{0}` slot
//! - `Segmenter` - the longest-match segmentation loop
//! - `format_result` - sentence capitalization and paragraph wrapping
//! - `HtmlTree` / `translate_tree` - parser-agnostic HTML text translation
//! - `Engine` - snapshot handle with atomic reload and a result cache
//! - `Config` - configuration and defaults
use serde::{Deserialize, Serialize};

pub mod buffer;
pub use buffer::{CharRange, OutputBuffer};

pub mod dictionary;
pub use dictionary::{parse_dictionary, Dictionary, DictionarySet, DictionaryTables};

pub mod error;
pub use error::DictionaryError;

pub mod normalize;
pub use normalize::normalize;

pub mod rules;
pub use rules::{RuleMatch, RuleSet, RuleTemplate, SlotPosition};

pub mod segment;
pub use segment::{Algorithm, SegmentOptions, Segmenter, TranslationResult, WrapMode};

pub mod format;
pub use format::{apply_fixes, format_result};

pub mod html;
pub use html::{translate_tree, HtmlTree};

pub mod engine;
pub use engine::{Engine, Snapshot};

/// Engine configuration.
///
/// Every field has a default so partial TOML files are accepted. The
/// front crate flattens this struct into its own `TranslatorConfig`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Longest candidate unit tried at each cursor position (code points).
    pub max_phrase_length: usize,

    /// Default algorithm variant for `Engine::translate`.
    pub algorithm: Algorithm,
    /// Names win over phrases when both contain the candidate.
    pub prioritize_names: bool,
    /// Default wrap mode for `Engine::translate`.
    pub wrap: WrapMode,
    /// Run the result formatter after segmentation.
    pub format_result: bool,

    // Rule template settings
    /// Fail the dictionary load on a malformed rule template instead of
    /// skipping it with a warning.
    pub strict_rules: bool,
    /// Upper bound (code points) of the variable part captured by a rule.
    pub max_rule_capture: usize,
    /// How far past a failed rule window the scan is extended to mark the
    /// region as free of rules.
    pub rule_scan_extension: usize,

    // Cache Management
    /// Maximum number of cached segmentation results (0 disables caching).
    pub max_cache_size: usize,

    // HTML
    /// Elements whose subtrees are never translated.
    pub skipped_elements: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_phrase_length: 20,
            algorithm: Algorithm::Greedy,
            prioritize_names: true,
            wrap: WrapMode::None,
            format_result: true,
            strict_rules: false,
            max_rule_capture: 10,
            rule_scan_extension: 100,
            max_cache_size: 1000,
            skipped_elements: vec!["script".to_string(), "style".to_string()],
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(
        path: P,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize configuration to TOML string.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Segmentation options built from the configured defaults.
    pub fn segment_options(&self) -> SegmentOptions {
        SegmentOptions {
            wrap: self.wrap,
            algorithm: self.algorithm,
            prioritize_names: self.prioritize_names,
        }
    }

    /// Check whether an element's subtree is excluded from HTML translation.
    pub fn is_skipped_element(&self, name: &str) -> bool {
        self.skipped_elements
            .iter()
            .any(|skipped| skipped.eq_ignore_ascii_case(name))
    }
}

/// Character classification and small string helpers.
pub mod utils {
    /// True for code points in the Han ideograph blocks.
    ///
    /// ASCII digits are never Han; callers that accept digits use
    /// `is_han_or_digit`.
    pub fn is_han(ch: char) -> bool {
        matches!(ch,
            '\u{3400}'..='\u{4DBF}'
            | '\u{4E00}'..='\u{9FFF}'
            | '\u{F900}'..='\u{FAFF}'
            | '\u{20000}'..='\u{2FA1F}')
    }

    /// Han ideograph or ASCII digit.
    pub fn is_han_or_digit(ch: char) -> bool {
        is_han(ch) || ch.is_ascii_digit()
    }

    /// Convert full-width characters back to ASCII (half-width).
    pub fn to_halfwidth(s: &str) -> String {
        s.chars().map(to_halfwidth_char).collect()
    }

    /// Single-character form of `to_halfwidth`.
    pub fn to_halfwidth_char(ch: char) -> char {
        match ch {
            // Ideographic space -> ASCII space
            '\u{3000}' => ' ',
            // Full-width range (0xFF01-0xFF5E) -> ASCII (0x21-0x7E)
            '\u{FF01}'..='\u{FF5E}' => {
                let code = ch as u32;
                char::from_u32(code - 0xFF01 + 0x21).unwrap_or(ch)
            }
            _ => ch,
        }
    }

    /// Uppercase the first character, leaving the rest untouched.
    pub fn capitalize_first(s: &str) -> String {
        let mut chars = s.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// Reduce a multi-meaning dictionary value to its first meaning.
    ///
    /// Alternatives are separated by `/` or `|`; an annotation in
    /// parentheses after the meaning is dropped as well.
    pub fn first_meaning(value: &str) -> &str {
        let value = value.split(['/', '|']).next().unwrap_or(value);
        let value = value.split('(').next().unwrap_or(value);
        value.trim()
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn han_detection_excludes_digits_and_punctuation() {
            assert!(is_han('山'));
            assert!(is_han('㐀'));
            assert!(!is_han('1'));
            assert!(!is_han('，'));
            assert!(!is_han('a'));
            assert!(is_han_or_digit('7'));
        }

        #[test]
        fn halfwidth_maps_fullwidth_block_only() {
            assert_eq!(to_halfwidth("ＡＢ！"), "AB!");
            assert_eq!(to_halfwidth("山"), "山");
        }

        #[test]
        fn first_meaning_takes_leading_alternative() {
            assert_eq!(first_meaning("xin chào/chào"), "xin chào");
            assert_eq!(first_meaning("ta|tôi"), "ta");
            assert_eq!(first_meaning("cha (bố)/phụ"), "cha");
            assert_eq!(first_meaning("  một  "), "một");
        }

        #[test]
        fn capitalize_handles_vietnamese_letters() {
            assert_eq!(capitalize_first("đại ca"), "Đại ca");
            assert_eq!(capitalize_first(""), "");
        }
    }
}
