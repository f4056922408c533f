pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use regimen_core::config::{AppConfig, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "regimen",
    about = "Regimen operator CLI",
    long_about = "Run skincare consultation analyses, inspect stored consultations, \
                  and audit product catalogs.",
    after_help = "Examples:\n  \
                  regimen analyze --responses answers.json --sample-catalog\n  \
                  regimen catalog-check --catalog products.json\n  \
                  regimen config"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        help = "Explicit config file (defaults to regimen.toml or config/regimen.toml)"
    )]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Analyze questionnaire responses against a product catalog")]
    Analyze {
        #[arg(long, help = "JSON file with the raw questionnaire responses")]
        responses: PathBuf,
        #[arg(long, help = "JSON catalog file (array or {\"products\": [...]})")]
        catalog: Option<PathBuf>,
        #[arg(long, help = "Use the bundled sample catalog when --catalog is absent")]
        sample_catalog: bool,
        #[arg(long, help = "Store the consultation and report its id")]
        persist: bool,
    },
    #[command(about = "Print a stored consultation")]
    Show {
        #[arg(long)]
        id: String,
    },
    #[command(about = "Save the routine of a stored consultation")]
    SaveRoutine {
        #[arg(long)]
        id: String,
    },
    #[command(about = "Validate catalog records and list every issue found")]
    CatalogCheck {
        #[arg(long)]
        catalog: PathBuf,
    },
    #[command(about = "Report how well a catalog covers the representative profile grid")]
    Coverage {
        #[arg(long)]
        catalog: Option<PathBuf>,
        #[arg(long)]
        sample_catalog: bool,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

fn init_logging(config_path: Option<&PathBuf>) -> anyhow::Result<()> {
    use tracing::Level;

    let options = LoadOptions { config_path: config_path.cloned(), ..LoadOptions::default() };
    let logging = AppConfig::load(options).map(|config| config.logging).unwrap_or_default();
    let log_level = logging.level.parse::<Level>().unwrap_or(Level::INFO);

    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);
    let installed = match logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|error| anyhow::anyhow!("failed to install tracing subscriber: {error}"))
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    if let Err(error) = init_logging(cli.config.as_ref()) {
        eprintln!("warning: logging disabled: {error}");
    }
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Command::Analyze { responses, catalog, sample_catalog, persist } => {
            commands::analyze::run(
                config_path,
                &commands::analyze::AnalyzeArgs { responses, catalog, sample_catalog, persist },
            )
        }
        Command::Show { id } => commands::show::run(config_path, &id),
        Command::SaveRoutine { id } => commands::show::save_routine(config_path, &id),
        Command::CatalogCheck { catalog } => commands::catalog_check::run(&catalog),
        Command::Coverage { catalog, sample_catalog } => {
            commands::coverage::run(config_path, catalog.as_deref(), sample_catalog)
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(config_path) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
