//! libvietphrase crate root
//!
//! Front end over `libvietphrase-core`: reads the dictionary text files from
//! disk, translates HTML documents parsed with html5ever, and backs the
//! `vietphrase` command-line tool.
//!
//! Public API exported here:
//! - `TranslatorConfig` from `config`
//! - `RcDomTree` and `translate_html` from `dom`
//! - `open_engine`, which builds an `Engine` from a config

pub mod cli;
pub mod config;
pub mod dom;

pub use config::TranslatorConfig;
pub use dom::{translate_html, RcDomTree};

// Convenience re-exports for common types used by callers.
pub use libvietphrase_core::{
    format_result, parse_dictionary, Algorithm, CharRange, Config, DictionaryError, DictionarySet,
    DictionaryTables, Engine, SegmentOptions, TranslationResult, WrapMode,
};

use anyhow::{Context, Result};
use std::path::Path;

/// Build an engine from `config`, loading its dictionaries either from a
/// snapshot file or from the text files in `dictionary_dir`.
pub fn open_engine(config: &TranslatorConfig, snapshot: Option<&Path>) -> Result<Engine> {
    let engine = Engine::new(config.base().clone());
    match snapshot {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("reading snapshot {}", path.display()))?;
            engine
                .load_snapshot_bytes(&bytes)
                .with_context(|| format!("loading snapshot {}", path.display()))?;
        }
        None => {
            let tables = config.load_tables()?;
            engine.load_dictionaries(tables)?;
        }
    }
    Ok(engine)
}
