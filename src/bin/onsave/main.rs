mod run;
mod watch;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use onsave::load_config;
use onsave::logger;
use onsave::session::messages::format_status_message;
use onsave::state::{ENABLED_KEY, JsonStateStore, StateStore};

#[derive(Parser, Debug)]
#[command(
    name = "onsave",
    about = "Runs configured shell commands when files are saved"
)]
struct Cli {
    /// Path to config file (auto-detected if not specified)
    #[arg(short, long)]
    config: Option<String>,

    /// Log file path (logs go to stderr and, when set, this file)
    #[arg(long)]
    log_file: Option<String>,

    /// Additional workspace roots (default: the config file's directory)
    #[arg(long = "root")]
    roots: Vec<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run shortcut-only rules against a file right now
    Run(run::RunArgs),
    /// Enable running commands on save
    Enable,
    /// Disable running commands on save
    Disable,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn run() -> Result<ExitCode, Box<dyn Error>> {
    let cli = Cli::parse();

    let log_file = cli
        .log_file
        .as_ref()
        .map(std::fs::File::create)
        .transpose()?;
    logger::init(log_file);

    let (config, cwd, config_path) = load_config(cli.config.as_deref())?;

    let mut roots = vec![cwd.clone()];
    roots.extend(cli.roots.iter().cloned());

    match cli.command {
        Some(Commands::Run(ref args)) => run::run(args, &config, &cwd, &config_path, &roots),
        Some(Commands::Enable) => set_enabled(&cwd, true),
        Some(Commands::Disable) => set_enabled(&cwd, false),
        None => watch::run(&config, &config_path, roots).await,
    }
}

fn set_enabled(cwd: &Path, enabled: bool) -> Result<ExitCode, Box<dyn Error>> {
    let mut store = JsonStateStore::for_config_dir(cwd);
    store.set_bool(ENABLED_KEY, enabled)?;
    println!(
        "{}",
        format_status_message(if enabled {
            "run on save enabled"
        } else {
            "run on save disabled"
        })
    );
    Ok(ExitCode::SUCCESS)
}
