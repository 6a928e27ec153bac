use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

const EXIT_SUCCESS: u8 = 0;
const EXIT_ERROR: u8 = 1;
/// `--strict` run that finished with warnings or match errors.
const EXIT_UNCLEAN: u8 = 2;

#[derive(Parser)]
#[command(name = "almoner")]
#[command(about = "Reconcile donor exports, recharacterize donations and derive follow-ups")]
#[command(version)]
struct Cli {
    /// Log filter, e.g. `info` or `almoner_reconcile=debug`. Falls back to
    /// RUST_LOG, then `warn`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every stage and write the output tables
    Run {
        /// Run file with thresholds and optional [inputs]/[output] dirs
        #[arg(long, short = 'c', env = "ALMONER_CONFIG")]
        config: PathBuf,

        #[arg(long, short = 'i')]
        input_dir: Option<PathBuf>,

        #[arg(long, short = 'o')]
        output_dir: Option<PathBuf>,

        /// Date the sponsorship season is computed for (default: today)
        #[arg(long, value_name = "YYYY-MM-DD")]
        as_of: Option<NaiveDate>,

        /// Exit with status 2 when the report has warnings or match errors
        #[arg(long)]
        strict: bool,
    },
    /// Validate the run file and inputs without writing anything
    Check {
        #[arg(long, short = 'c', env = "ALMONER_CONFIG")]
        config: PathBuf,

        #[arg(long, short = 'i')]
        input_dir: Option<PathBuf>,
    },
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let result = match cli.command {
        Commands::Run {
            config,
            input_dir,
            output_dir,
            as_of,
            strict,
        } => commands::load_settings(&config, input_dir, output_dir).and_then(|settings| {
            let as_of = as_of.unwrap_or_else(|| chrono::Local::now().date_naive());
            let output = commands::cmd_run(&settings, as_of)?;
            println!("{}", commands::summarize(&output));
            println!("Outputs written to {}", settings.output_dir.display());
            Ok(if strict && !output.report.is_clean() {
                EXIT_UNCLEAN
            } else {
                EXIT_SUCCESS
            })
        }),
        Commands::Check { config, input_dir } => commands::load_settings(&config, input_dir, None)
            .and_then(|settings| {
                let as_of = chrono::Local::now().date_naive();
                let output = commands::reconcile_dir(&settings, as_of)?;
                println!("{}", commands::summarize(&output));
                Ok(EXIT_SUCCESS)
            }),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}
