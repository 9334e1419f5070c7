use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use dhammapada_core::{load_store, parse_text, Error, Language, SaverConfig, VerseEngine, VerseSaver};
use dhammapada_term::run_saver;

#[derive(Parser)]
#[command(name = "dhammapada", version, about = "Dhammapada verse screensaver")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the screensaver in this terminal. Any key exits, `n` skips ahead.
    Run {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Verse database (JSON); overrides the config
        #[arg(short, long)]
        verses: Option<PathBuf>,
        #[arg(short, long, value_parser = parse_language)]
        language: Option<Language>,
        /// Log file; defaults to dhammapada.log in the temp directory
        #[arg(long)]
        log_file: Option<PathBuf>,
    },
    /// Convert a plain-text edition into the chapter-map JSON
    Prepare {
        input: PathBuf,
        /// Defaults to stdout
        output: Option<PathBuf>,
    },
    /// Print the verses that would be shown
    List {
        #[arg(short, long)]
        verses: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run {
            config,
            verses,
            language,
            log_file,
        } => {
            init_logging(LogTarget::File(&run_log_path(log_file)))?;
            let mut config = match config {
                Some(path) => SaverConfig::load(&path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => SaverConfig::default(),
            };
            if verses.is_some() {
                config.verses = verses;
            }
            if let Some(language) = language {
                config.language = language;
            }
            play(config)
        }
        Command::Prepare { input, output } => {
            init_logging(LogTarget::Stderr)?;
            prepare(&input, output.as_deref())
        }
        Command::List { verses } => {
            init_logging(LogTarget::Stderr)?;
            let config = SaverConfig {
                verses,
                ..SaverConfig::default()
            };
            let store = load_store(&config)?;
            for (i, verse) in store.iter().enumerate() {
                println!("{:>4}  {}", i + 1, verse.heading());
            }
            Ok(())
        }
    }
}

fn play(config: SaverConfig) -> Result<()> {
    let store = load_store(&config).context("Failed to load verses")?;
    info!("Dhammapada saver starting with {} verses", store.len());
    let mut saver = VerseSaver::new(VerseEngine::new(config, store));
    run_saver(&mut saver).map_err(|e| anyhow::anyhow!("{e}"))?;
    Ok(())
}

fn prepare(input: &Path, output: Option<&Path>) -> Result<()> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let prepared = parse_text(&text);
    if prepared.stanza_count() == 0 {
        return Err(Error::EmptyInput(input.display().to_string()).into());
    }
    let json = prepared.to_json_string_pretty()?;
    match output {
        Some(path) => {
            fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "Wrote {} stanzas in {} chapters to {}",
                prepared.stanza_count(),
                prepared.chapters.len(),
                path.display()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn parse_language(value: &str) -> std::result::Result<Language, String> {
    match value.to_ascii_lowercase().as_str() {
        "pali" => Ok(Language::Pali),
        "english" | "en" => Ok(Language::English),
        "vietnamese" | "vi" => Ok(Language::Vietnamese),
        other => Err(format!("unknown language {other:?} (pali, english, vietnamese)")),
    }
}

enum LogTarget<'a> {
    Stderr,
    File(&'a Path),
}

/// The saver owns the terminal while running, so `run` always logs to a
/// file.
fn run_log_path(flag: Option<PathBuf>) -> PathBuf {
    flag.unwrap_or_else(|| std::env::temp_dir().join("dhammapada.log"))
}

fn init_logging(target: LogTarget<'_>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = FmtSubscriber::builder().with_env_filter(filter);
    let installed = match target {
        LogTarget::Stderr => tracing::subscriber::set_global_default(
            builder.with_writer(std::io::stderr).finish(),
        ),
        LogTarget::File(path) => {
            let file = fs::File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            tracing::subscriber::set_global_default(
                builder.with_ansi(false).with_writer(Mutex::new(file)).finish(),
            )
        }
    };
    let _ = installed;
    Ok(())
}
