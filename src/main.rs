use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use jules_cli::app::{App, Command};
use jules_cli::config::Config;
use jules_cli::init;
use jules_cli::jules::JulesClient;
use jules_cli::ui::{TerminalOptions, TerminalPresenter};

#[derive(Parser, Debug)]
#[command(name = "jules")]
#[command(about = "Terminal client for Jules coding-agent sessions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Print lists and details as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Disable coloured output (also honours NO_COLOR)
    #[arg(long, global = true)]
    no_color: bool,

    /// More logging on stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "jules_cli=debug,jules=debug,warn",
        _ => "trace",
    };
    let filter = if verbose > 0 {
        EnvFilter::new(default)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_app(cli: &Cli) -> Result<App<JulesClient, TerminalPresenter>> {
    let config = Config::load()?;
    let client = JulesClient::new(config.client_config()).context("Failed to build HTTP client")?;
    let options = TerminalOptions {
        json: cli.json,
        color: !cli.no_color && std::env::var_os("NO_COLOR").is_none(),
        interactive: true,
        editor: config.editor.clone(),
    };
    Ok(App::new(client, TerminalPresenter::stdio(options), config))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // init must work even when the existing config does not parse
    if let Command::Init { force } = cli.command {
        return match init::run_init(force) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("Error: {:#}", err);
                ExitCode::FAILURE
            }
        };
    }

    let mut app = match build_app(&cli) {
        Ok(app) => app,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            return ExitCode::FAILURE;
        }
    };

    // Command failures are already reported by the presenter
    match app.run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
