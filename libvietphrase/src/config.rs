use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use libvietphrase_core::{parse_dictionary, Config, Dictionary, DictionaryTables};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Front-end configuration that extends the base `Config` from core.
///
/// This configuration includes:
/// - All engine options from `libvietphrase_core::Config` (flattened via serde)
/// - The directory holding the dictionary text files
/// - The file name of every table inside that directory
///
/// # Example
///
/// ```rust
/// use libvietphrase::TranslatorConfig;
///
/// let config = TranslatorConfig::from_toml_str("dictionary_dir = \"dicts\"\nwrap = \"brackets\"").unwrap();
/// assert_eq!(config.phrases_file, "VietPhrase.txt");
/// let base = config.into_base();
/// assert_eq!(base.wrap, libvietphrase_core::WrapMode::Brackets);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Engine options (phrase length, algorithm, cache, skipped elements...)
    #[serde(flatten)]
    pub base: Config,

    /// Directory the table files below are resolved against.
    pub dictionary_dir: PathBuf,

    // Table file names
    pub names_file: String,
    /// Optional second name table.
    pub names_secondary_file: String,
    pub phrases_file: String,
    /// Per-character Sino-Vietnamese readings.
    pub han_viet_file: String,
    /// Rule templates (`{0}` slot).
    pub rules_file: String,
    /// Pronoun table used to fill rule slots; rules are off without it.
    pub pronouns_file: String,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            base: Config::default(),
            dictionary_dir: PathBuf::from("dicts"),
            names_file: "Names.txt".to_string(),
            names_secondary_file: "Names2.txt".to_string(),
            phrases_file: "VietPhrase.txt".to_string(),
            han_viet_file: "ChinesePhienAmWords.txt".to_string(),
            rules_file: "LuatNhan.txt".to_string(),
            pronouns_file: "Pronouns.txt".to_string(),
        }
    }
}

impl TranslatorConfig {
    /// Convert this config into the engine config for use with `Engine::new()`
    pub fn into_base(self) -> Config {
        self.base
    }

    /// Get a reference to the base config
    pub fn base(&self) -> &Config {
        &self.base
    }

    /// Get a mutable reference to the base config
    pub fn base_mut(&mut self) -> &mut Config {
        &mut self.base
    }

    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Read every dictionary table from `dictionary_dir`.
    ///
    /// The phrase and Han-Viet tables are required. A missing name or rule
    /// table loads as empty; a missing secondary name table or pronoun table
    /// is left out entirely.
    pub fn load_tables(&self) -> Result<DictionaryTables> {
        let dir = &self.dictionary_dir;
        let tables = DictionaryTables {
            names: read_table(dir, &self.names_file)?.unwrap_or_default(),
            names_secondary: read_table(dir, &self.names_secondary_file)?,
            phrases: read_required(dir, &self.phrases_file)?,
            han_viet: read_required(dir, &self.han_viet_file)?,
            rule_templates: read_table(dir, &self.rules_file)?.unwrap_or_default(),
            rule_lookup: read_table(dir, &self.pronouns_file)?,
        };

        if tables.rule_lookup.is_none() {
            warn!(file = %self.pronouns_file, "pronoun table missing, rule templates disabled");
        }
        debug!(
            names = tables.names.len(),
            phrases = tables.phrases.len(),
            han_viet = tables.han_viet.len(),
            rules = tables.rule_templates.len(),
            "dictionary files read"
        );
        Ok(tables)
    }
}

fn read_required(dir: &Path, file: &str) -> Result<Dictionary> {
    read_table(dir, file)?
        .with_context(|| format!("required dictionary {} not found", dir.join(file).display()))
}

/// `Ok(None)` when the file does not exist.
fn read_table(dir: &Path, file: &str) -> Result<Option<Dictionary>> {
    let path = dir.join(file);
    if !path.is_file() {
        return Ok(None);
    }
    let bytes = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
    let content = match String::from_utf8_lossy(&bytes) {
        Cow::Borrowed(text) => Cow::Borrowed(text),
        Cow::Owned(text) => {
            warn!(path = %path.display(), "dictionary is not valid UTF-8, bad bytes replaced");
            Cow::Owned(text)
        }
    };
    Ok(Some(parse_dictionary(&content)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use libvietphrase_core::{Algorithm, WrapMode};

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = TranslatorConfig::from_toml_str("algorithm = \"balanced\"\npronouns_file = \"Nhan.txt\"").unwrap();
        assert_eq!(config.base.algorithm, Algorithm::Balanced);
        assert_eq!(config.base.max_phrase_length, 20);
        assert_eq!(config.pronouns_file, "Nhan.txt");
        assert_eq!(config.names_file, "Names.txt");
    }

    #[test]
    fn toml_round_trip() {
        let mut config = TranslatorConfig::default();
        config.base_mut().wrap = WrapMode::Brackets;
        config.dictionary_dir = PathBuf::from("/srv/vp");
        let text = config.to_toml_string().unwrap();
        assert_eq!(TranslatorConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn missing_required_table_is_an_error() {
        let config = TranslatorConfig {
            dictionary_dir: PathBuf::from("/nonexistent/vietphrase/dicts"),
            ..TranslatorConfig::default()
        };
        let err = config.load_tables().unwrap_err();
        assert!(err.to_string().contains("VietPhrase.txt"));
    }
}
