use clap::{Parser, Subcommand, builder::styling};
use eyre::Result;
use nba_stats_etl::cli;
use nba_stats_etl::config::Entity;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::process::ExitCode;

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// Load NBA stats into DuckDB / MotherDuck tables
#[derive(Parser)]
#[command(name = "nba-etl", version, styles = STYLES)]
struct Cli {
    /// The dotenv file to source credentials from
    #[arg(short, long, global = true, default_value = ".env")]
    env: String,

    /// More verbose logging
    #[arg(long, global = true)]
    debug: bool,

    /// Directory of pipeline definitions overriding the built-in ones
    #[arg(short, long, global = true)]
    pipelines: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, rename and load entities (all of them by default)
    Run {
        /// Entities to load, in order
        #[arg(value_enum)]
        entities: Vec<Entity>,
    },

    /// Test the connection and token for the sink database
    Check,

    /// Show how an entity's provider columns are renamed
    Columns {
        #[arg(value_enum)]
        entity: Entity,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    match dotenvy::from_filename(&cli.env) {
        Ok(_) => {}
        Err(e) if e.not_found() => {}
        Err(e) => return Err(e.into()),
    }

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    let pipelines = cli.pipelines.as_deref();

    match cli.command {
        Commands::Run { entities } => {
            let summary = cli::run_pipelines(&entities, pipelines).await?;
            Ok(ExitCode::from(summary.exit_code()))
        }
        Commands::Check => match cli::check_sink() {
            Ok(()) => Ok(ExitCode::SUCCESS),
            Err(e) => {
                log::error!("{} [{}] {}", "✗".red(), e.kind(), e);
                Ok(ExitCode::from(e.exit_code()))
            }
        },
        Commands::Columns { entity } => {
            cli::print_columns(entity, pipelines)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
