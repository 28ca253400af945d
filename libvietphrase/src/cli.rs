use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "vietphrase", author, version, about = "Chinese to Vietnamese dictionary translation", long_about = None)]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Translate a file, or stdin when no file is given
    Translate(TranslateArgs),

    /// Parse the dictionary text files once and write a snapshot
    Compile {
        /// Directory holding the dictionary text files
        #[arg(long)]
        dicts: Option<PathBuf>,

        /// Snapshot file to write
        #[arg(short, long)]
        out: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct TranslateArgs {
    #[command(flatten)]
    pub source: DictionarySource,

    /// Input is an HTML document; only text nodes are translated
    #[arg(long, conflicts_with = "han_viet")]
    pub html: bool,

    /// Per-character Sino-Vietnamese reading instead of translation
    #[arg(long)]
    pub han_viet: bool,

    /// Print the result with its range mapping as JSON
    #[arg(long, conflicts_with = "html")]
    pub json: bool,

    /// Wrap every dictionary unit in brackets
    #[arg(long)]
    pub brackets: bool,

    /// Algorithm variant: 0 longest, 1 greedy, 2 balanced
    #[arg(long)]
    pub algorithm: Option<i64>,

    /// Do not let names win over phrases
    #[arg(long)]
    pub no_names: bool,

    /// Skip the result formatter
    #[arg(long)]
    pub raw: bool,

    /// Input file
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DictionarySource {
    /// Directory holding the dictionary text files
    #[arg(long, conflicts_with = "snapshot")]
    pub dicts: Option<PathBuf>,

    /// Snapshot written by `vietphrase compile`
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_flags_parse() {
        let cli = Cli::try_parse_from([
            "vietphrase", "-v", "translate", "--dicts", "d", "--brackets", "--algorithm", "2", "--no-names", "in.txt",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Commands::Translate(args) = cli.command else {
            panic!("expected translate");
        };
        assert_eq!(args.source.dicts, Some(PathBuf::from("d")));
        assert!(args.brackets && args.no_names);
        assert_eq!(args.algorithm, Some(2));
        assert_eq!(args.file, Some(PathBuf::from("in.txt")));
    }

    #[test]
    fn dictionary_sources_conflict() {
        let err = Cli::try_parse_from(["vietphrase", "translate", "--dicts", "d", "--snapshot", "s"]);
        assert!(err.is_err());
    }

    #[test]
    fn html_conflicts_with_han_viet() {
        assert!(Cli::try_parse_from(["vietphrase", "translate", "--html", "--han-viet"]).is_err());
    }
}
