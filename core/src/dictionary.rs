//! Dictionary store for libvietphrase-core
//!
//! This module provides the flat key → value tables the engine looks units
//! up in, the parser for the hand-maintained text format they are shipped
//! in, and `DictionarySet`, the immutable snapshot that bundles every table
//! together with the compiled rule templates.
//!
//! Public API:
//! - `Dictionary` - one table, hash-backed, tracks its longest key
//! - `parse_dictionary` - `key=value` / `key<TAB>value` text → `Dictionary`
//! - `DictionaryTables` - the raw tables handed to a load call
//! - `DictionarySet` - compiled snapshot, bincode (de)serialization helpers
//!
//! Notes:
//! - Values may hold several meanings (`a/b`, `a|b`); lookups used by the
//!   segmentation engine reduce them with `utils::first_meaning`.
//! - Duplicate keys: the last occurrence wins, both in the parser and in
//!   `Dictionary::insert`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::error::DictionaryError;
use crate::rules::RuleSet;
use crate::utils::first_meaning;
use crate::Config;

/// A single key → value table.
///
/// Keys are short Chinese-script strings; values are Vietnamese renderings,
/// possibly holding several meanings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dictionary {
    map: HashMap<String, String, ahash::RandomState>,
    /// Length of the longest key, in code points.
    max_key_len: usize,
}

impl Dictionary {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, replacing any previous value for the key.
    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        let key = key.into();
        self.max_key_len = self.max_key_len.max(key.chars().count());
        self.map.insert(key, value.into());
    }

    /// Raw value stored for a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }

    /// First meaning of the value stored for a key.
    pub fn first_meaning(&self, key: &str) -> Option<&str> {
        self.get(key).map(first_meaning)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Return the number of entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Return true if the dictionary is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Length of the longest key in code points.
    pub fn max_key_len(&self) -> usize {
        self.max_key_len
    }

    /// Iterate over `(key, value)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dict = Dictionary::new();
        dict.extend(iter);
        dict
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Dictionary {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

/// Parse the flat dictionary text format.
///
/// One entry per line, `key=value` or `key<TAB>value`, split at the first
/// separator. Blank lines and lines starting with `#` are skipped; lines
/// without a separator or with an empty key or value are dropped silently.
/// When a key repeats, the last occurrence wins.
pub fn parse_dictionary(content: &str) -> Dictionary {
    let content = content.strip_prefix('\u{FEFF}').unwrap_or(content);
    let mut dict = Dictionary::new();
    let mut dropped = 0usize;

    for line in content.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let Some(sep) = line.find(['=', '\t']) else {
            dropped += 1;
            continue;
        };
        let key = line[..sep].trim();
        // both separators are one byte wide
        let value = line[sep + 1..].trim();
        if key.is_empty() || value.is_empty() {
            dropped += 1;
            continue;
        }
        dict.insert(key, value);
    }

    if dropped > 0 {
        debug!(dropped, kept = dict.len(), "dictionary lines without a usable entry");
    }
    dict
}

/// The raw tables handed to a dictionary load.
///
/// `names_secondary` and `rule_lookup` are optional; without a rule lookup
/// table rule templates never match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DictionaryTables {
    /// Proper names (primary table).
    pub names: Dictionary,
    /// Alternate name table, consulted after `names`.
    pub names_secondary: Option<Dictionary>,
    /// Phrase table ("VietPhrase").
    pub phrases: Dictionary,
    /// Single character → Sino-Vietnamese syllable.
    pub han_viet: Dictionary,
    /// Rule templates, `{0}` marks the variable slot in key and value.
    pub rule_templates: Dictionary,
    /// Companion table resolving the variable part of a rule.
    pub rule_lookup: Option<Dictionary>,
}

/// Immutable dictionary snapshot used by every translation call.
///
/// Built once by `compile` and never mutated afterwards; reloading builds a
/// new snapshot and swaps it in (see `Engine::install`).
#[derive(Debug, Default)]
pub struct DictionarySet {
    tables: DictionaryTables,
    rules: RuleSet,
}

impl DictionarySet {
    /// Empty snapshot: every unit falls back to single-character handling.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile raw tables into a snapshot.
    ///
    /// Rule templates are turned into matchers here, once per snapshot.
    /// Malformed templates are skipped with a warning unless
    /// `config.strict_rules` is set, in which case the load fails.
    pub fn compile(tables: DictionaryTables, config: &Config) -> Result<Self, DictionaryError> {
        let rules = RuleSet::compile(
            &tables.rule_templates,
            config.max_rule_capture,
            config.strict_rules,
        )?;

        info!(
            names = tables.names.len(),
            phrases = tables.phrases.len(),
            han_viet = tables.han_viet.len(),
            rules = rules.len(),
            rule_lookup = tables.rule_lookup.as_ref().map_or(0, Dictionary::len),
            "dictionary snapshot compiled"
        );

        Ok(Self { tables, rules })
    }

    /// Raw tables this snapshot was compiled from.
    pub fn tables(&self) -> &DictionaryTables {
        &self.tables
    }

    /// Compiled rule templates.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn phrases(&self) -> &Dictionary {
        &self.tables.phrases
    }

    /// Rule companion table, if one was loaded.
    pub fn rule_lookup(&self) -> Option<&Dictionary> {
        self.tables.rule_lookup.as_ref()
    }

    /// True when either name table holds the key.
    pub fn is_name(&self, key: &str) -> bool {
        self.tables.names.contains_key(key)
            || self
                .tables
                .names_secondary
                .as_ref()
                .is_some_and(|d| d.contains_key(key))
    }

    /// First meaning of a name, primary table first.
    pub fn name(&self, key: &str) -> Option<&str> {
        self.tables.names.first_meaning(key).or_else(|| {
            self.tables
                .names_secondary
                .as_ref()
                .and_then(|d| d.first_meaning(key))
        })
    }

    /// First meaning of a phrase.
    pub fn phrase(&self, key: &str) -> Option<&str> {
        self.tables.phrases.first_meaning(key)
    }

    /// Sino-Vietnamese syllable for a single character.
    pub fn han_viet(&self, ch: char) -> Option<&str> {
        let mut buf = [0u8; 4];
        self.tables.han_viet.first_meaning(ch.encode_utf8(&mut buf))
    }

    /// Serialize the raw tables with bincode.
    ///
    /// Compiled rule matchers are not part of the bytes; `from_bytes`
    /// rebuilds them.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DictionaryError> {
        Ok(bincode::serialize(&self.tables)?)
    }

    /// Decode bytes produced by `to_bytes` and compile them.
    pub fn from_bytes(bytes: &[u8], config: &Config) -> Result<Self, DictionaryError> {
        let tables: DictionaryTables = bincode::deserialize(bytes)?;
        Self::compile(tables, config)
    }
}
