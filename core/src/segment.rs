// core/src/segment.rs
//
// Longest-match segmentation of normalized Chinese text.
//
// At each cursor position candidate windows are tried from the longest
// bound down to one code point. A window is accepted as a name (when names
// are prioritized), then as a phrase, then as a rule template occurrence;
// when no window matches, exactly one code point goes through the single
// character fallback. Every consumed span is recorded in `source_ranges`
// and the text it produced in `output_ranges`.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::buffer::{CharRange, OutputBuffer};
use crate::dictionary::{Dictionary, DictionarySet};
use crate::normalize::normalize;
use crate::rules::RuleTemplate;
use crate::utils::{first_meaning, is_han, is_han_or_digit, to_halfwidth_char};
use crate::Config;

/// Whether each emitted unit is wrapped in square brackets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WrapMode {
    #[default]
    None,
    Brackets,
}

/// Strictness of the longest-phrase lookahead.
///
/// Integer codes: 0 `Longest`, 1 `Greedy`, 2 `Balanced`. Unknown codes
/// behave like 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Reject a phrase when any strictly longer phrase starts inside it.
    Longest,
    /// Accept the first phrase match.
    #[default]
    Greedy,
    /// Reject a phrase when a phrase longer than three code points (or
    /// than the candidate) starts inside it.
    Balanced,
}

impl Algorithm {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Algorithm::Longest,
            2 => Algorithm::Balanced,
            _ => Algorithm::Greedy,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Algorithm::Longest => 0,
            Algorithm::Greedy => 1,
            Algorithm::Balanced => 2,
        }
    }

    fn checks_phrases(self) -> bool {
        !matches!(self, Algorithm::Greedy)
    }

    /// Competing phrases must be strictly longer than this.
    fn min_competing(self, len: usize) -> usize {
        match self {
            Algorithm::Longest => len,
            Algorithm::Greedy | Algorithm::Balanced => len.max(3),
        }
    }
}

/// Per-call segmentation switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentOptions {
    pub wrap: WrapMode,
    pub algorithm: Algorithm,
    pub prioritize_names: bool,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            wrap: WrapMode::None,
            algorithm: Algorithm::Greedy,
            prioritize_names: true,
        }
    }
}

/// Output of one segmentation pass.
///
/// `source` is the normalized input the source ranges index into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResult {
    pub source: String,
    pub text: String,
    pub source_ranges: Vec<CharRange>,
    pub output_ranges: Vec<CharRange>,
}

/// Segmentation engine bound to one dictionary snapshot.
pub struct Segmenter<'a> {
    dicts: &'a DictionarySet,
    max_len: usize,
    rule_scan_extension: usize,
}

/// Rule occurrence found by scanning the longest eligible window at a
/// cursor. Bounds are absolute code point indices.
#[derive(Debug, Clone, Copy)]
struct RuleHit<'r> {
    cursor: usize,
    start: usize,
    end: usize,
    rule: &'r RuleTemplate,
}

/// Mutable state of one segmentation pass.
struct Pass<'t, 'r> {
    source: &'t str,
    chars: Vec<char>,
    /// Byte offset of every code point, plus the total length.
    offsets: Vec<usize>,
    out: OutputBuffer,
    source_ranges: Vec<CharRange>,
    output_ranges: Vec<CharRange>,
    /// Windows ending at or before this index hold no rule occurrence.
    dead_until: usize,
    rule_hit: Option<RuleHit<'r>>,
    /// Rule scans run so far.
    rule_scans: usize,
}

impl<'t, 'r> Pass<'t, 'r> {
    fn new(source: &'t str) -> Self {
        let (offsets, chars): (Vec<usize>, Vec<char>) = source.char_indices().unzip();
        let mut offsets = offsets;
        offsets.push(source.len());
        Self {
            source,
            chars,
            offsets,
            out: OutputBuffer::new(),
            source_ranges: Vec::new(),
            output_ranges: Vec::new(),
            dead_until: 0,
            rule_hit: None,
            rule_scans: 0,
        }
    }

    /// Record a unit. A separator space dropped by a hugging unit shrinks
    /// the previous output range so ranges never overlap.
    fn record(&mut self, start: usize, len: usize, output: CharRange) {
        if let Some(last) = self.output_ranges.last_mut() {
            if last.end() > output.start_index {
                last.length = output.start_index.saturating_sub(last.start_index);
            }
        }
        self.source_ranges.push(CharRange::new(start, len));
        self.output_ranges.push(output);
    }

    fn window(&self, start: usize, len: usize) -> &'t str {
        let source = self.source;
        &source[self.offsets[start]..self.offsets[start + len]]
    }

    fn next_is_han(&self, index: usize) -> bool {
        self.chars.get(index).copied().is_some_and(is_han)
    }

    fn finish(self) -> TranslationResult {
        TranslationResult {
            source: self.source.to_string(),
            text: self.out.into_string(),
            source_ranges: self.source_ranges,
            output_ranges: self.output_ranges,
        }
    }
}

fn wrap(unit: &str, mode: WrapMode) -> String {
    match mode {
        WrapMode::None => unit.to_string(),
        WrapMode::Brackets => format!("[{unit}]"),
    }
}

/// Copied through as-is by the single character fallback.
fn is_direct_copy(ch: char) -> bool {
    ch.is_ascii_alphanumeric()
        || ch.is_whitespace()
        || matches!(
            ch,
            '-' | ',' | '.' | '?' | '!' | '=' | ':' | ';' | '(' | ')' | '[' | ']' | '/' | '\\'
        )
}

impl<'a> Segmenter<'a> {
    pub fn new(dicts: &'a DictionarySet, config: &Config) -> Self {
        Self {
            dicts,
            max_len: config.max_phrase_length.max(1),
            rule_scan_extension: config.rule_scan_extension,
        }
    }

    /// Segment and translate `text`.
    ///
    /// The input is normalized first; every code point of the normalized
    /// text ends up in exactly one source range.
    pub fn segment(&self, text: &str, opts: SegmentOptions) -> TranslationResult {
        let source = normalize(text);
        let pass = self.run(&source, opts);
        debug!(
            units = pass.source_ranges.len(),
            rule_scans = pass.rule_scans,
            "segmented"
        );
        pass.finish()
    }

    fn run<'t>(&self, source: &'t str, opts: SegmentOptions) -> Pass<'t, 'a> {
        let mut pass = Pass::new(source);

        let mut p = 0;
        while p < pass.chars.len() {
            if pass.chars[p] == '\n' {
                let range = pass.out.push_raw("\n");
                pass.record(p, 1, range);
                p += 1;
                continue;
            }

            match self.match_at(&mut pass, p, opts) {
                Some((len, rendered)) => {
                    let range = pass.out.append_word(&wrap(&rendered, opts.wrap));
                    pass.record(p, len, range);
                    p += len;
                    if pass.next_is_han(p) {
                        pass.out.soft_space();
                    } else if pass.chars.get(p) == Some(&'\n') {
                        pass.out.push_raw("\n");
                    }
                }
                None => {
                    self.single_char(&mut pass, p, opts.wrap);
                    p += 1;
                }
            }
        }

        pass
    }

    /// Longest unit starting at `p`, as `(length, rendered text)`.
    fn match_at(&self, pass: &mut Pass<'_, 'a>, p: usize, opts: SegmentOptions) -> Option<(usize, String)> {
        let longest = self.max_len.min(pass.chars.len() - p);
        for len in (1..=longest).rev() {
            let window = pass.window(p, len);

            if opts.prioritize_names {
                if let Some(name) = self.dicts.name(window) {
                    trace!(%window, "name");
                    return Some((len, name.to_string()));
                }
            }

            if let Some(phrase) = self.dicts.phrase(window) {
                let shadowed_by_name = opts.prioritize_names && self.dicts.is_name(window);
                let passes_lookahead = !opts.algorithm.checks_phrases()
                    || self.is_longest_in_sentence(pass, p, len, opts.algorithm.min_competing(len));
                if !shadowed_by_name && passes_lookahead {
                    trace!(%window, "phrase");
                    return Some((len, phrase.to_string()));
                }
            }

            if let Some(rendered) = self.match_rule(pass, p, len, window, opts) {
                trace!(%window, "rule");
                return Some((len, rendered));
            }
        }
        None
    }

    /// Try the window `[p, p + len)` as a rule template occurrence.
    ///
    /// The first eligible (longest) window at a cursor is scanned once and
    /// the occurrence found is kept; shorter windows are accepted only when
    /// they equal it, and are scanned again only once it no longer fits.
    fn match_rule(
        &self,
        pass: &mut Pass<'_, 'a>,
        p: usize,
        len: usize,
        window: &str,
        opts: SegmentOptions,
    ) -> Option<String> {
        let rules = self.dicts.rules();
        let lookup = self.dicts.rule_lookup()?;
        let min_window = rules.min_window()?.max(3);
        let end = p + len;
        if len < min_window
            || end <= pass.dead_until
            || !pass.chars[p..end].iter().all(|&c| is_han_or_digit(c))
        {
            return None;
        }

        let cached = pass.rule_hit.filter(|hit| hit.cursor == p && hit.end <= end);
        let hit = match cached {
            Some(hit) => hit,
            None => {
                pass.rule_scans += 1;
                let Some(found) = rules.find(window, Some(lookup)) else {
                    pass.rule_hit = None;
                    let dead = self.dead_region_end(pass, lookup, p, len);
                    pass.dead_until = pass.dead_until.max(dead);
                    return None;
                };
                let hit = RuleHit {
                    cursor: p,
                    start: p + found.index,
                    end: p + found.index + found.length,
                    rule: found.rule,
                };
                pass.rule_hit = Some(hit);
                hit
            }
        };

        if hit.start != p || hit.end != end {
            return None;
        }
        let min = opts.algorithm.min_competing(len);
        if !self.is_longest_in_sentence(pass, p, len, min) {
            return None;
        }
        let rendered = hit
            .rule
            .apply(window, lookup)
            .unwrap_or_else(|| rules.apply(window, Some(lookup)));
        Some(first_meaning(&rendered).to_string())
    }

    /// Nothing resolves in `[p, p + len)`. Extend over the following run of
    /// Han characters and digits and report how far the region is dead.
    fn dead_region_end(&self, pass: &mut Pass<'_, 'a>, lookup: &Dictionary, p: usize, len: usize) -> usize {
        let limit = (p + len + self.rule_scan_extension).min(pass.chars.len());
        let mut end = p + len;
        while end < limit && is_han_or_digit(pass.chars[end]) {
            end += 1;
        }
        if end == p + len {
            return end;
        }
        pass.rule_scans += 1;
        let extended = pass.window(p, end - p);
        if self.dicts.rules().find(extended, Some(lookup)).is_none() {
            end
        } else {
            p + len
        }
    }

    /// False when a phrase longer than `min_len` starts inside the window
    /// `[start, start + len)` and runs past position `start`.
    fn is_longest_in_sentence(&self, pass: &Pass<'_, '_>, start: usize, len: usize, min_len: usize) -> bool {
        if len < 2 {
            return true;
        }
        let phrases: &Dictionary = self.dicts.phrases();
        let upper = self.max_len.min(phrases.max_key_len());
        let total = pass.chars.len();
        for i in start + 1..start + len {
            for j in (min_len + 1..=upper).rev() {
                if i + j > total {
                    continue;
                }
                if phrases.contains_key(pass.window(i, j)) {
                    return false;
                }
            }
        }
        true
    }

    /// Translate exactly one code point at `p`.
    fn single_char(&self, pass: &mut Pass<'_, 'a>, p: usize, mode: WrapMode) {
        let ch = pass.chars[p];

        let range = if is_han(ch) {
            let syllable = match self.dicts.han_viet(ch) {
                Some(syllable) => syllable.to_string(),
                None => to_halfwidth_char(ch).to_string(),
            };
            let range = pass.out.append_word(&wrap(&syllable, mode));
            if pass.next_is_han(p + 1) {
                pass.out.soft_space();
            }
            range
        } else if is_direct_copy(ch) {
            let mut buf = [0u8; 4];
            pass.out.push_raw(ch.encode_utf8(&mut buf))
        } else if matches!(ch, '"' | '\'') && !self.quote_opens_clause(pass, p) {
            pass.out.push_spaced(ch)
        } else if matches!(ch, '"' | '\'') {
            let mut buf = [0u8; 4];
            pass.out.push_raw(ch.encode_utf8(&mut buf))
        } else {
            pass.out.push_spaced(ch)
        };

        pass.record(p, 1, range);
    }

    /// A quote right after a boundary, at the end of the text, or before a
    /// space or comma is attached without an extra space.
    fn quote_opens_clause(&self, pass: &Pass<'_, '_>, p: usize) -> bool {
        let out = &pass.out;
        out.is_empty()
            || [" ", ".", "?", "!", "\t", "\n"].iter().any(|tail| out.ends_with(tail))
            || p + 1 >= pass.chars.len()
            || matches!(pass.chars[p + 1], ' ' | ',')
    }

    /// Per-character Sino-Vietnamese transliteration with mapping.
    ///
    /// Han characters go through the Han-Viet table (with the half-width
    /// fallback); everything else is copied. The input is not normalized.
    pub fn han_viet(&self, text: &str) -> TranslationResult {
        let mut pass = Pass::new(text);

        for p in 0..pass.chars.len() {
            let ch = pass.chars[p];
            let range = if is_han(ch) {
                let syllable = match self.dicts.han_viet(ch) {
                    Some(syllable) => syllable.to_string(),
                    None => to_halfwidth_char(ch).to_string(),
                };
                let range = pass.out.append_word(&syllable);
                if pass.next_is_han(p + 1) {
                    pass.out.soft_space();
                }
                range
            } else {
                let mut buf = [0u8; 4];
                pass.out.push_raw(ch.encode_utf8(&mut buf))
            };
            pass.record(p, 1, range);
        }

        pass.finish()
    }
}
