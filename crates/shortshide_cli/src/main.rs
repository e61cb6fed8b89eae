//! Command-line host for the shorts-hiding engine.
//!
//! # Responsibility
//! - Drive the core engine over a saved HTML page with file-backed
//!   preferences and rules.
//! - Report hidden counts and preference decisions deterministically.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{error, info};

use shortshide_core::{
    core_version, default_log_level, init_logging, ContentEngine, EventLoop, HostDocument,
    JsonFilePreferenceStore, LogTarget, MemoryDocument, MemoryPreferenceStore, PreferenceStatus,
    PreferenceStore, Preferences, Rules, SweepReport,
};

/// Shorts hiding engine CLI.
#[derive(Parser)]
#[command(name = "shortshide")]
#[command(about = "Hide YouTube Shorts shelves and items in saved pages")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; stderr when omitted
    #[arg(long, global = true)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the engine start-up sequence over an HTML file
    Sweep {
        /// HTML file to process
        html: PathBuf,

        /// Host name the page was served from
        #[arg(long, default_value = "www.youtube.com")]
        host: String,

        /// Preferences JSON file (bare object or `{"settings": ...}`)
        #[arg(long)]
        prefs: Option<PathBuf>,

        /// Rules override JSON file
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Print the resulting HTML
        #[arg(long)]
        emit: bool,
    },

    /// Print the active decision for a host
    Resolve {
        /// Host name to resolve
        #[arg(long)]
        host: String,

        /// Preferences JSON file
        #[arg(long)]
        prefs: Option<PathBuf>,
    },

    /// Print the core version
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| default_log_level().to_string());
    let target = match cli.log_dir.as_deref() {
        Some(dir) => match LogTarget::directory(dir) {
            Ok(target) => target,
            Err(err) => {
                eprintln!("shortshide: {err}");
                return ExitCode::from(2);
            }
        },
        None => LogTarget::Stderr,
    };
    if let Err(err) = init_logging(&level, target) {
        eprintln!("shortshide: {err}");
        return ExitCode::from(2);
    }

    let result = match cli.command {
        Commands::Sweep {
            html,
            host,
            prefs,
            rules,
            emit,
        } => run_sweep(&html, &host, prefs, rules, emit),
        Commands::Resolve { host, prefs } => run_resolve(&host, prefs),
        Commands::Version => {
            println!("shortshide_core version={}", core_version());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_failed module=cli status=error error={}", message);
            eprintln!("shortshide: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run_sweep(
    html: &Path,
    host: &str,
    prefs: Option<PathBuf>,
    rules: Option<PathBuf>,
    emit: bool,
) -> Result<(), String> {
    let source = std::fs::read_to_string(html)
        .map_err(|err| format!("failed to read `{}`: {err}", html.display()))?;
    let rules = load_rules(rules)?;
    let document = MemoryDocument::parse_html(&source);

    let mut event_loop = EventLoop::new(ContentEngine::new(document, rules, host));
    let store = open_store(prefs);
    let mut total = event_loop.start_with(store.as_ref()).sweep;
    let mut restored = 0;
    for report in event_loop.run_until_idle() {
        total.absorb(report.sweep);
        restored += report.restored;
    }

    let engine = event_loop.engine();
    info!(
        "event=cli_sweep module=cli status=ok host={} decision={} hidden={} restored={}",
        host,
        engine.decision().as_str(),
        total.total(),
        restored
    );
    print_summary(host, engine.decision().as_str(), &total, restored);

    if emit {
        let document = engine.document();
        println!("{}", document.to_html(document.root()));
    }
    Ok(())
}

fn run_resolve(host: &str, prefs: Option<PathBuf>) -> Result<(), String> {
    let store = open_store(prefs);
    let preferences = store
        .get()
        .map_err(|err| err.to_string())?
        .unwrap_or_default();
    let decision = preferences.decision_for(host);
    println!("host={host}");
    println!("decision={}", decision.as_str());
    println!("status={}", PreferenceStatus::describe(&preferences, host));
    Ok(())
}

fn open_store(prefs: Option<PathBuf>) -> Box<dyn PreferenceStore> {
    match prefs {
        Some(path) => Box::new(JsonFilePreferenceStore::new(path)),
        None => Box::new(MemoryPreferenceStore::with_value(Preferences::default())),
    }
}

fn load_rules(path: Option<PathBuf>) -> Result<Rules, String> {
    let Some(path) = path else {
        return Ok(Rules::default());
    };
    let raw = std::fs::read_to_string(&path)
        .map_err(|err| format!("failed to read `{}`: {err}", path.display()))?;
    Rules::from_json(&raw).map_err(|err| format!("invalid rules `{}`: {err}", path.display()))
}

fn print_summary(host: &str, decision: &str, report: &SweepReport, restored: usize) {
    println!("host={host}");
    println!("decision={decision}");
    println!(
        "hidden={} shelves={} items={} containers={} loose_links={}",
        report.total(),
        report.shelves,
        report.items,
        report.containers,
        report.loose_links
    );
    println!("restored={restored}");
}
