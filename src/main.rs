use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use flashlearn::error::AppError;
use flashlearn::import::{
    self, csv_prompt, DelimiterMode, Field, ImportOptions, ParseOptions, PromptStyle,
};
use flashlearn::Flashlearn;

#[derive(Parser)]
#[command(name = "flashlearn", about = "Flashcard decks with CSV import")]
struct Cli {
    /// Path to the SQLite database file (default: ~/.flashlearn.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log progress to stderr (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage decks
    Deck {
        #[command(subcommand)]
        action: DeckAction,
    },
    /// List cards, optionally for one deck
    Cards {
        #[arg(long)]
        deck: Option<String>,
    },
    /// Import cards from a CSV/TSV file
    Import(ImportArgs),
    /// Print instructions for generating an importable CSV with an LLM
    Template {
        /// Include deck, tags and notes columns
        #[arg(long)]
        advanced: bool,
    },
}

#[derive(Subcommand)]
enum DeckAction {
    /// Create a new deck
    Create {
        #[arg(long)]
        name: String,
    },
    /// List all decks
    List,
}

#[derive(clap::Args)]
struct ImportArgs {
    /// Path to the CSV file
    #[arg(long)]
    file: PathBuf,
    /// auto, comma, semicolon, tab, or the character itself
    #[arg(long, default_value = "auto")]
    delimiter: DelimiterMode,
    /// Treat the first row as data instead of column names
    #[arg(long)]
    no_header: bool,
    /// Deck for rows that do not name one
    #[arg(long)]
    deck: Option<String>,
    /// Put every row into --deck, ignoring any deck column
    #[arg(long, requires = "deck")]
    lock_deck: bool,
    /// Separator between tags inside the tags column
    #[arg(long, default_value_t = ',')]
    tag_separator: char,
    /// Reject rows whose deck does not exist instead of creating it
    #[arg(long)]
    no_create_decks: bool,
    /// Import rows even if the same card already exists in the target deck
    #[arg(long)]
    keep_duplicates: bool,
    /// Override the inferred mapping, e.g. --map front=2 or --map notes=none
    #[arg(long = "map", value_parser = parse_mapping_override)]
    overrides: Vec<(Field, Option<usize>)>,
    /// Validate and report without importing
    #[arg(long)]
    dry_run: bool,
    /// Write rejected rows as CSV to this file (or into this directory)
    #[arg(long)]
    errors_out: Option<PathBuf>,
}

fn parse_mapping_override(s: &str) -> Result<(Field, Option<usize>), String> {
    let (field, column) = s
        .split_once('=')
        .ok_or_else(|| format!("expected field=column, got '{s}'"))?;
    let field: Field = field.parse()?;
    let column = match column.trim() {
        "" | "none" => None,
        n => Some(
            n.parse::<usize>()
                .map_err(|_| format!("column must be a 0-based index or 'none', got '{n}'"))?,
        ),
    };
    Ok((field, column))
}

fn default_db_path() -> Result<PathBuf, AppError> {
    dirs::home_dir()
        .map(|home| home.join(".flashlearn.db"))
        .ok_or_else(|| AppError::InvalidArgument("could not determine home directory".into()))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn write_error_report(path: &Path, csv: &str) -> Result<PathBuf, AppError> {
    let target = if path.is_dir() {
        path.join(import::error_report_filename(chrono::Local::now().date_naive()))
    } else {
        path.to_path_buf()
    };
    std::fs::write(&target, csv)?;
    Ok(target)
}

fn run_import(fl: &Flashlearn, args: ImportArgs) -> Result<serde_json::Value, AppError> {
    let text = std::fs::read_to_string(&args.file)?;
    let parse_options = ParseOptions {
        delimiter: args.delimiter,
        has_header_row: !args.no_header,
    };
    let table = fl.parse_csv(&text, &parse_options)?;

    let mut mapping = import::infer(&table.headers);
    for (field, column) in &args.overrides {
        mapping.set(*field, *column);
    }
    if args.lock_deck {
        mapping.deck = None;
    }
    mapping.check(table.headers.len())?;

    let default_deck_id = args
        .deck
        .as_deref()
        .map(|name| fl.deck_by_name(name).map(|d| d.id))
        .transpose()?;
    let options = ImportOptions {
        default_deck_id,
        tag_separator: args.tag_separator,
        create_missing_decks: !args.no_create_decks,
        skip_duplicates: !args.keep_duplicates,
        lock_to_default_deck: args.lock_deck,
    };

    let result = fl.validate_csv(&table, &mapping, &options)?;
    let mut summary = result.summary();
    if !args.dry_run && !result.valid_rows.is_empty() {
        summary.imported = fl.import_csv(&result)?;
    }

    let errors_file = match (&args.errors_out, result.error_rows.is_empty()) {
        (Some(path), false) => {
            let csv = import::error_rows_to_csv(&result.error_rows)?;
            Some(write_error_report(path, &csv)?)
        }
        _ => None,
    };

    Ok(serde_json::json!({
        "delimiter": table.delimiter_name(),
        "rows": table.rows.len(),
        "headers": table.headers,
        "mapping": mapping,
        "summary": summary,
        "preview": result.preview,
        "errors": result.error_rows,
        "errors_file": errors_file,
    }))
}

fn open_db(db: Option<PathBuf>) -> Result<Flashlearn, AppError> {
    let path = match db {
        Some(path) => path,
        None => default_db_path()?,
    };
    Flashlearn::new(&path)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Deck { action } => {
            let fl = open_db(cli.db)?;
            match action {
                DeckAction::Create { name } => {
                    let deck = fl.create_deck(&name)?;
                    println!("{}", serde_json::to_string(&deck)?);
                }
                DeckAction::List => {
                    let decks = fl.list_decks()?;
                    println!("{}", serde_json::to_string(&decks)?);
                }
            }
        }

        Commands::Cards { deck } => {
            let fl = open_db(cli.db)?;
            let cards = fl.list_cards(deck.as_deref())?;
            println!("{}", serde_json::to_string(&cards)?);
        }

        Commands::Import(args) => {
            let fl = open_db(cli.db)?;
            let report = run_import(&fl, args)?;
            println!("{}", serde_json::to_string(&report)?);
        }

        Commands::Template { advanced } => {
            let style = if advanced {
                PromptStyle::Advanced
            } else {
                PromptStyle::Simple
            };
            println!("{}", csv_prompt(style));
        }
    }

    Ok(())
}
