// core/src/rules.rs
//
// Rule templates: dictionary entries with a single `{0}` slot, e.g.
// `{0}之父=cha của {0}`. Each template is compiled once per snapshot into
// a scan matcher (bounded capture, used to find candidates inside a window)
// and an exact matcher (anchored, used when the rule is applied).

use regex::Regex;
use tracing::{debug, warn};

use crate::dictionary::Dictionary;
use crate::error::DictionaryError;

/// Placeholder token in rule keys and values.
pub const PLACEHOLDER: &str = "{0}";

/// Characters a scan capture never spans.
const CAPTURE_EXCLUDED: &str = r",\. ?";

/// Where the variable slot sits inside a rule key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPosition {
    /// `{0}X`: the capture is tightened from the left.
    Start,
    /// `X{0}`: the capture is tightened from the right.
    End,
    /// `X{0}Y`: the capture must resolve as a whole.
    Middle,
}

/// One compiled rule template.
#[derive(Debug, Clone)]
pub struct RuleTemplate {
    key: String,
    value: String,
    slot: SlotPosition,
    /// Code points of literal text in the key.
    literal_len: usize,
    scan: Regex,
    exact: Regex,
}

impl RuleTemplate {
    /// Compile a single `key=value` template.
    pub fn compile(key: &str, value: &str, max_capture: usize) -> Result<Self, DictionaryError> {
        let malformed = |reason: &str| DictionaryError::MalformedRule {
            key: key.to_string(),
            reason: reason.to_string(),
        };

        if key.matches(PLACEHOLDER).count() != 1 {
            return Err(malformed("key must contain exactly one {0}"));
        }
        if value.matches(PLACEHOLDER).count() != 1 {
            return Err(malformed("value must contain exactly one {0}"));
        }
        let (prefix, suffix) = key
            .split_once(PLACEHOLDER)
            .ok_or_else(|| malformed("key must contain exactly one {0}"))?;
        let slot = match (prefix.is_empty(), suffix.is_empty()) {
            (true, true) => return Err(malformed("key has no literal text")),
            (true, false) => SlotPosition::Start,
            (false, true) => SlotPosition::End,
            (false, false) => SlotPosition::Middle,
        };

        let prefix = regex::escape(prefix);
        let suffix = regex::escape(suffix);
        let invalid = |source| DictionaryError::InvalidPattern {
            key: key.to_string(),
            source,
        };
        let scan = Regex::new(&format!(
            "{prefix}([^{CAPTURE_EXCLUDED}]{{1,{}}}){suffix}",
            max_capture.max(1)
        ))
        .map_err(invalid)?;
        let exact = Regex::new(&format!("^{prefix}(.+){suffix}$")).map_err(invalid)?;

        Ok(Self {
            key: key.to_string(),
            value: value.to_string(),
            slot,
            literal_len: key.chars().count() - PLACEHOLDER.len(),
            scan,
            exact,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn slot(&self) -> SlotPosition {
        self.slot
    }

    /// Shortest window this template can match (literal text plus one
    /// captured character).
    pub fn min_window(&self) -> usize {
        self.literal_len + 1
    }

    /// Render the value template with one translation of the slot.
    fn render(&self, translation: &str) -> String {
        self.value.replacen(PLACEHOLDER, translation, 1)
    }

    /// Rewrite `window` if this template matches it exactly.
    ///
    /// Every alternative meaning of the captured text is substituted into
    /// the value and the results are joined with `/`.
    pub fn apply(&self, window: &str, lookup: &Dictionary) -> Option<String> {
        let capture = self.exact.captures(window)?.get(1)?.as_str();
        let translations: Vec<&str> = match lookup.get(capture) {
            Some(value) => value.split(['/', '|']).collect(),
            None if is_number(capture) => vec![capture],
            None => return None,
        };
        let rendered = translations
            .iter()
            .map(|t| self.render(t))
            .collect::<Vec<_>>()
            .join("/");
        Some(rendered.trim_end_matches('/').to_string())
    }
}

/// A rule occurrence inside a window. Offsets are in code points.
#[derive(Debug, Clone, Copy)]
pub struct RuleMatch<'a> {
    pub index: usize,
    pub length: usize,
    pub rule: &'a RuleTemplate,
}

/// All rule templates of a snapshot, ordered longest literal first, then
/// by key.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    templates: Vec<RuleTemplate>,
}

impl RuleSet {
    /// Compile every entry of a rule template table.
    ///
    /// Without `strict`, malformed templates are logged and skipped.
    pub fn compile(
        table: &Dictionary,
        max_capture: usize,
        strict: bool,
    ) -> Result<Self, DictionaryError> {
        let mut templates = Vec::with_capacity(table.len());
        for (key, value) in table.iter() {
            match RuleTemplate::compile(key, value, max_capture) {
                Ok(template) => templates.push(template),
                Err(e) if strict => return Err(e),
                Err(e) => warn!(error = %e, "skipping rule template"),
            }
        }
        templates.sort_by(|a, b| {
            b.literal_len
                .cmp(&a.literal_len)
                .then_with(|| a.key.cmp(&b.key))
        });
        Ok(Self { templates })
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RuleTemplate> {
        self.templates.iter()
    }

    /// Shortest window any template can match, `None` without templates.
    pub fn min_window(&self) -> Option<usize> {
        self.templates.iter().map(RuleTemplate::min_window).min()
    }

    /// First rule occurrence in `window`, trying templates in order and at
    /// most two scan hits per template.
    pub fn find<'a>(&'a self, window: &str, lookup: Option<&Dictionary>) -> Option<RuleMatch<'a>> {
        self.matches(window, lookup).next()
    }

    fn matches<'a, 'w>(
        &'a self,
        window: &'w str,
        lookup: Option<&'w Dictionary>,
    ) -> impl Iterator<Item = RuleMatch<'a>> + 'w
    where
        'a: 'w,
    {
        let len = window.chars().count();
        if lookup.is_none() {
            debug!("rule lookup table not loaded, rule matching disabled");
        }
        lookup.into_iter().flat_map(move |lookup| {
            self.templates
                .iter()
                .filter(move |t| t.min_window() <= len)
                .flat_map(move |t| {
                    t.scan
                        .captures_iter(window)
                        .take(2)
                        .filter_map(move |caps| {
                            let whole = caps.get(0)?;
                            let capture = caps.get(1)?.as_str();
                            let start = window[..whole.start()].chars().count();
                            let whole_len = whole.as_str().chars().count();
                            tighten(t, capture, lookup).map(|(skip, trim)| RuleMatch {
                                index: start + skip,
                                length: whole_len - skip - trim,
                                rule: t,
                            })
                        })
                })
        })
    }

    /// Rewrite a window that one template matches exactly, trying
    /// templates in order. When none applies the window comes back
    /// unchanged.
    pub fn apply(&self, window: &str, lookup: Option<&Dictionary>) -> String {
        let Some(lookup) = lookup else {
            debug!("rule lookup table not loaded, rule matching disabled");
            return window.to_string();
        };
        if let Some(rendered) = self.templates.iter().find_map(|t| t.apply(window, lookup)) {
            return rendered;
        }
        warn!(window, "no rule template applies to window");
        window.to_string()
    }
}

/// Shrink a scan capture until it resolves. Returns the number of code
/// points dropped on the left and on the right of the whole match.
fn tighten(template: &RuleTemplate, capture: &str, lookup: &Dictionary) -> Option<(usize, usize)> {
    match template.slot {
        SlotPosition::Start => capture
            .char_indices()
            .enumerate()
            .find(|&(_, (byte, _))| lookup.contains_key(&capture[byte..]))
            .map(|(skipped, _)| (skipped, 0)),
        SlotPosition::End => {
            let ends: Vec<usize> = capture
                .char_indices()
                .map(|(byte, ch)| byte + ch.len_utf8())
                .collect();
            ends.iter()
                .rev()
                .enumerate()
                .find(|&(_, &end)| lookup.contains_key(&capture[..end]))
                .map(|(trimmed, _)| (0, trimmed))
        }
        SlotPosition::Middle => {
            (lookup.contains_key(capture) || is_number(capture)).then_some((0, 0))
        }
    }
}

fn is_number(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}
