//! Contest accounts CLI
//!
//! Entry point for the `contest-accounts` command-line tool.

use clap::{Parser, Subcommand};
use contest_accounts::output::Wkhtmltopdf;
use contest_accounts::{Config, Pipeline, ScopeReport, Validator};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "contest-accounts")]
#[command(about = "Generate contest accounts and password sheets", version)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, short = 'c', global = true, default_value = "config.yaml")]
    config: PathBuf,

    /// Skip rendering PDF password sheets
    #[arg(long, global = true)]
    no_pdf: bool,

    /// Log debug output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate accounts for one or more contests
    Contest {
        /// Contest directory names
        #[arg(required_unless_present = "all")]
        names: Vec<String>,

        /// Generate every discovered contest
        #[arg(long, conflicts_with = "names")]
        all: bool,
    },

    /// Generate CDS accounts for every server
    Cds,

    /// Generate challenge accounts
    Challenge,

    /// Validate every scope without writing anything
    Validate,

    /// List discovered contests
    List,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{}", e);
        process::exit(e.exit_code());
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> contest_accounts::Result<()> {
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::List => {
            run_list(&config);
            Ok(())
        }
        Commands::Validate => run_validate(&config),
        Commands::Contest { names, all } => {
            let reports = generate(&config, cli.no_pdf, |pipeline| {
                if all {
                    pipeline.run_all_contests()
                } else {
                    names.iter().map(|name| pipeline.run_contest(name)).collect()
                }
            })?;
            print_reports(&reports);
            Ok(())
        }
        Commands::Cds => {
            let report = generate(&config, cli.no_pdf, |pipeline| pipeline.run_cds())?;
            print_reports(&[report]);
            Ok(())
        }
        Commands::Challenge => {
            let report = generate(&config, cli.no_pdf, |pipeline| pipeline.run_challenge())?;
            print_reports(&[report]);
            Ok(())
        }
    }
}

/// Build the password generator and pipeline, then run `f` on it
fn generate<T>(
    config: &Config,
    no_pdf: bool,
    f: impl FnOnce(&mut Pipeline<'_>) -> contest_accounts::Result<T>,
) -> contest_accounts::Result<T> {
    let mut generator = config.password_generator()?;
    let renderer = Wkhtmltopdf::default();

    let mut pipeline = Pipeline::new(config, &mut generator);
    if !no_pdf {
        pipeline = pipeline.with_renderer(&renderer);
    }
    f(&mut pipeline)
}

fn run_list(config: &Config) {
    if config.contests.is_empty() {
        println!("No contests found in {}", config.contests_folder.display());
        return;
    }
    for scope in config.contests.values() {
        let contest = &scope.contest;
        let layout = if contest.uses_config_folder() {
            " (config folder)"
        } else {
            ""
        };
        println!(
            "{:<20} {:<40} {}{}",
            contest.dir_name, contest.name, contest.start_time, layout
        );
    }
}

fn run_validate(config: &Config) -> contest_accounts::Result<()> {
    let report = Validator::new(config).all()?;

    println!("Configuration valid");
    for contest in &report.contests {
        println!(
            "  Contest {}: page size {}, {} words per password",
            contest.contest.dir_name, contest.sheet.page_size, contest.number_of_words_per_password
        );
    }
    if let Some(cds) = &report.cds {
        println!("  CDS: descriptor {}", cds.descriptor.display());
    }
    if let Some(challenge) = &report.challenge {
        println!(
            "  Challenge: {} account file(s)",
            challenge.account_files.len()
        );
    }
    Ok(())
}

fn print_reports(reports: &[ScopeReport]) {
    for report in reports {
        println!(
            "{}: {} account(s), {} file(s) written",
            report.scope,
            report.accounts,
            report.written.len()
        );
    }
}
