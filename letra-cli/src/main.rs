use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use letra_core::{
    Backfill, BackfillReport, Expression, Locator, Token, TokenLine, load_corpus, save_corpus,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "letra")]
#[command(about = "Locate catalogued phrases and slang terms in song lines", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find where an expression occurs in a single line
    Locate {
        /// The line text
        #[arg(short, long)]
        line: String,

        /// The phrase or slang term to look for
        #[arg(short, long)]
        expr: String,

        /// Tokens as a JSON array (e.g., '[{"text": "la", "position": 6}]').
        /// Defaults to the line's whitespace-separated words, numbered from 1.
        #[arg(short, long)]
        tokens: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Record occurrences of every catalogued phrase and slang term in a corpus
    Backfill {
        /// Path to the corpus file
        #[arg(short, long, env = "LETRA_CORPUS")]
        corpus: PathBuf,

        /// Only process songs whose title contains this text
        #[arg(short, long)]
        song: Option<String>,

        /// Report what would be recorded without saving the corpus
        #[arg(long)]
        dry_run: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::NotFound) => CliError::NotFound.exit_code(),
        Err(e) => {
            eprintln!("Error: {e}");
            e.exit_code()
        }
    }
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

#[derive(Debug)]
enum CliError {
    Corpus(letra_core::IoError),
    Store(letra_core::StoreError),
    InvalidArgs(String),
    Output(serde_json::Error),
    NotFound,
    Incomplete(usize),
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Corpus(_) => ExitCode::from(2),
            CliError::Store(_) => ExitCode::from(2),
            CliError::InvalidArgs(_) => ExitCode::from(2),
            CliError::Output(_) => ExitCode::from(2),
            CliError::NotFound => ExitCode::from(1),
            CliError::Incomplete(_) => ExitCode::from(1),
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Corpus(e) => write!(f, "Corpus error: {e}"),
            CliError::Store(e) => write!(f, "Store error: {e}"),
            CliError::InvalidArgs(msg) => write!(f, "{msg}"),
            CliError::Output(e) => write!(f, "Output error: {e}"),
            CliError::NotFound => write!(f, "Expression not found"),
            CliError::Incomplete(n) => write!(f, "Backfill finished with {n} error(s)"),
        }
    }
}

impl From<letra_core::IoError> for CliError {
    fn from(e: letra_core::IoError) -> Self {
        CliError::Corpus(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output(e)
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Locate {
            line,
            expr,
            tokens,
            format,
        } => cmd_locate(&line, &expr, tokens.as_deref(), &format),
        Commands::Backfill {
            corpus,
            song,
            dry_run,
            format,
        } => cmd_backfill(&corpus, song.as_deref(), dry_run, &format),
    }
}

fn parse_tokens(line: &str, tokens_json: Option<&str>) -> Result<TokenLine, CliError> {
    match tokens_json {
        Some(json) => {
            let tokens: Vec<Token> = serde_json::from_str(json)
                .map_err(|e| CliError::InvalidArgs(format!("Invalid tokens JSON: {e}")))?;
            TokenLine::new(tokens)
                .map_err(|e| CliError::InvalidArgs(format!("Invalid tokens: {e}")))
        }
        None => Ok(TokenLine::from_words(line.split_whitespace())),
    }
}

fn cmd_locate(
    line: &str,
    expr: &str,
    tokens_json: Option<&str>,
    format: &OutputFormat,
) -> Result<(), CliError> {
    let expression: Expression = expr
        .parse()
        .map_err(|e| CliError::InvalidArgs(format!("Invalid expression: {e}")))?;
    let tokens = parse_tokens(line, tokens_json)?;
    let span = Locator::new().locate(line, &expression, &tokens);

    match format {
        OutputFormat::Text => match span {
            Some(span) => {
                let words: Vec<&str> = tokens.within(span).map(|t| t.text.as_str()).collect();
                println!("✓ Found \"{expr}\" at positions {span}: {}", words.join(" "));
            }
            None => println!("✗ \"{expr}\" not found"),
        },
        OutputFormat::Json => {
            let output = match span {
                Some(span) => serde_json::json!({
                    "found": true,
                    "start_position": span.start_position,
                    "end_position": span.end_position,
                    "tokens": tokens.within(span).collect::<Vec<_>>(),
                }),
                None => serde_json::json!({
                    "found": false,
                    "start_position": null,
                    "end_position": null,
                    "tokens": [],
                }),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    match span {
        Some(_) => Ok(()),
        None => Err(CliError::NotFound),
    }
}

fn cmd_backfill(
    corpus_path: &Path,
    title_filter: Option<&str>,
    dry_run: bool,
    format: &OutputFormat,
) -> Result<(), CliError> {
    let mut store = load_corpus(corpus_path)?;
    log::info!(
        "loaded {} songs from {}",
        store.all_songs().len(),
        corpus_path.display()
    );

    let backfill = Backfill::new(Locator::new()).dry_run(dry_run);
    let report = backfill
        .run(&mut store, title_filter)
        .map_err(CliError::Store)?;

    if !backfill.is_dry_run() && report.total_occurrences() > 0 {
        save_corpus(&store, corpus_path)?;
        log::info!("saved corpus to {}", corpus_path.display());
    }

    match format {
        OutputFormat::Text => print_summary(&report, backfill.is_dry_run()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if report.errors.is_empty() {
        Ok(())
    } else {
        Err(CliError::Incomplete(report.errors.len()))
    }
}

fn print_summary(report: &BackfillReport, dry_run: bool) {
    for song in &report.songs {
        if song.errors.is_empty() {
            println!(
                "  {}: {} phrases, {} slang",
                song.title, song.phrase_occurrences, song.slang_occurrences
            );
        } else {
            println!("  {}: {} error(s)", song.title, song.errors.len());
        }
    }

    println!();
    println!("Summary{}:", if dry_run { " (dry run, nothing saved)" } else { "" });
    println!("  Songs processed:        {}", report.songs_processed);
    println!("  Phrase occurrences:     {}", report.phrase_occurrences);
    println!("  Slang occurrences:      {}", report.slang_occurrences);

    print_truncated("Phrases not found", &report.phrases_not_found, 10);
    print_truncated("Slang not found", &report.slang_not_found, 10);
    print_truncated("Errors", &report.errors, 5);
}

fn print_truncated(label: &str, items: &[String], limit: usize) {
    if items.is_empty() {
        return;
    }

    println!();
    println!("  {label} ({}):", items.len());
    for item in items.iter().take(limit) {
        println!("    - {item}");
    }
    if items.len() > limit {
        println!("    ... and {} more", items.len() - limit);
    }
}
