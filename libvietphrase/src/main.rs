use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use libvietphrase::cli::{Cli, Commands, TranslateArgs};
use libvietphrase::{
    format_result, open_engine, translate_html, Algorithm, DictionarySet, SegmentOptions,
    TranslatorConfig, WrapMode,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => TranslatorConfig::load_toml(path)?,
        None => TranslatorConfig::default(),
    };

    match cli.command {
        Commands::Translate(args) => {
            if let Some(dir) = &args.source.dicts {
                config.dictionary_dir = dir.clone();
            }
            translate(&config, args)
        }
        Commands::Compile { dicts, out } => {
            if let Some(dir) = dicts {
                config.dictionary_dir = dir;
            }
            compile(&config, &out)
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn translate(config: &TranslatorConfig, args: TranslateArgs) -> Result<()> {
    let engine = open_engine(config, args.source.snapshot.as_deref())?;
    let input = read_input(args.file.as_deref())?;

    let output = if args.html {
        translate_html(&engine, &input)
    } else {
        let defaults = config.base().segment_options();
        let opts = SegmentOptions {
            wrap: if args.brackets { WrapMode::Brackets } else { defaults.wrap },
            algorithm: args.algorithm.map_or(defaults.algorithm, Algorithm::from_code),
            prioritize_names: defaults.prioritize_names && !args.no_names,
        };
        let result = if args.han_viet {
            engine.han_viet(&input)
        } else {
            engine.segment_with(&input, opts)
        };

        if args.json {
            serde_json::to_string_pretty(&result)?
        } else if args.raw || !config.base().format_result {
            result.text
        } else {
            format_result(&result.text)
        }
    };

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{output}")?;
    Ok(())
}

fn compile(config: &TranslatorConfig, out: &Path) -> Result<()> {
    let tables = config.load_tables()?;
    let dicts = DictionarySet::compile(tables, config.base())?;
    let bytes = dicts.to_bytes()?;
    fs::write(out, &bytes).with_context(|| format!("writing snapshot {}", out.display()))?;
    info!(bytes = bytes.len(), path = %out.display(), "snapshot written");
    Ok(())
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => fs::read_to_string(path).with_context(|| format!("reading {}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).context("reading stdin")?;
            Ok(buf)
        }
    }
}
