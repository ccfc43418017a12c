#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # sqlfe
//! ## Introduction
//!
//! Grades a folder of SQL submissions against an assignment catalog.
//!
//! ## Usage
//!
//! `sqlfe grade --catalog lab3.toml --submissions submissions/ --init-script schema.sql`
//!
//! Connection settings can also come from the environment (or a `.env` file):
//! `SQLFE_DBMS`, `SQLFE_SCHEMA`, `SQLFE_INIT_SCRIPT` and friends.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use bpaf::*;
use colored::Colorize;
use dotenvy::dotenv;
use sqlfe::{
    CheckRegistry, ConnectionParams, DbmsKind, ReportFormat, RunConfig,
    constants::{
        DEFAULT_DECIMALS, ENV_CATALOG, ENV_DBMS, ENV_HOST, ENV_INIT_SCRIPT, ENV_PASSWORD,
        ENV_PORT, ENV_SCHEMA, ENV_USER, EVALUATIONS_DIR, GRADE_SUMMARY_FILE, SQLITE_IN_MEMORY,
        SUBMISSION_EXTENSION,
    },
    grade::spawn,
};
use tabled::{
    Table,
    settings::{Panel, Style},
};
use tracing::{Level, metadata::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Arguments of the `grade` subcommand.
#[derive(Debug, Clone)]
struct GradeArgs {
    /// Assignment catalog
    catalog:          PathBuf,
    /// Folder of submissions
    submissions:      PathBuf,
    /// Grade summary destination
    report:           Option<PathBuf>,
    /// Folder for evaluation files
    evaluations:      PathBuf,
    /// Do not write evaluation files
    skip_evaluations: bool,
    /// Backend
    dbms:             DbmsKind,
    /// Host
    host:             Option<String>,
    /// Port
    port:             Option<u16>,
    /// Schema or SQLite database path
    schema:           String,
    /// User
    user:             Option<String>,
    /// Password
    password:         Option<String>,
    /// Script run on every new session
    init_script:      Option<PathBuf>,
    /// Digits after the decimal point
    decimals:         usize,
    /// Print the run summary as JSON
    json:             bool,
}

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Grade a folder of submissions
    Grade(GradeArgs),
    /// List the registered checks
    Checks,
}

/// Parse the command line arguments and return a `Cmd` enum along with the
/// verbosity flag
fn options() -> (Cmd, bool) {
    let catalog = long("catalog")
        .short('c')
        .env(ENV_CATALOG)
        .help("Assignment catalog (TOML)")
        .argument::<PathBuf>("PATH");
    let submissions = long("submissions")
        .short('s')
        .help("Folder holding one file per submission")
        .argument::<PathBuf>("DIR");
    let report = long("report")
        .help("Grade summary file [default: <evaluations>/AAA_grade_summary.out]")
        .argument::<PathBuf>("PATH")
        .optional();
    let evaluations = long("evaluations")
        .help("Folder for per-submission evaluation files")
        .argument::<PathBuf>("DIR")
        .fallback(PathBuf::from(EVALUATIONS_DIR));
    let skip_evaluations = long("skip-evaluations")
        .help("Only write the grade summary")
        .switch();
    let dbms = long("dbms")
        .env(ENV_DBMS)
        .help("Database backend: sqlite or mock")
        .argument::<DbmsKind>("DBMS")
        .fallback(DbmsKind::Sqlite);
    let host = long("host")
        .env(ENV_HOST)
        .help("Database host")
        .argument::<String>("HOST")
        .optional();
    let port = long("port")
        .env(ENV_PORT)
        .help("Database port")
        .argument::<u16>("PORT")
        .optional();
    let schema = long("schema")
        .env(ENV_SCHEMA)
        .help("Schema, or SQLite database path")
        .argument::<String>("SCHEMA")
        .fallback(SQLITE_IN_MEMORY.to_string());
    let user = long("user")
        .env(ENV_USER)
        .help("Database user")
        .argument::<String>("USER")
        .optional();
    let password = long("password")
        .env(ENV_PASSWORD)
        .help("Database password")
        .argument::<String>("PASSWORD")
        .optional();
    let init_script = long("init-script")
        .env(ENV_INIT_SCRIPT)
        .help("SQL script run on every new session")
        .argument::<PathBuf>("PATH")
        .optional();
    let decimals = long("decimals")
        .help("Digits after the decimal point in reports")
        .argument::<usize>("N")
        .fallback(DEFAULT_DECIMALS);
    let json = long("json").help("Print the run summary as JSON").switch();

    let grade = construct!(GradeArgs {
        catalog,
        submissions,
        report,
        evaluations,
        skip_evaluations,
        dbms,
        host,
        port,
        schema,
        user,
        password,
        init_script,
        decimals,
        json,
    })
    .map(Cmd::Grade)
    .to_options()
    .command("grade")
    .help("Grade a folder of SQL submissions");

    let checks = pure(Cmd::Checks)
        .to_options()
        .command("checks")
        .help("List the checks a catalog can use");

    let verbose = short('v')
        .long("verbose")
        .help("Log every check as it runs")
        .switch();
    let cmd = construct!([grade, checks]);

    construct!(cmd, verbose)
        .to_options()
        .descr("Batch grader for SQL submissions")
        .run()
}

/// Builds the run configuration from CLI arguments.
fn run_config(args: &GradeArgs) -> RunConfig {
    let connection = ConnectionParams {
        kind:        args.dbms,
        host:        args.host.clone(),
        port:        args.port,
        schema:      args.schema.clone(),
        username:    args.user.clone(),
        password:    args.password.clone(),
        init_script: args.init_script.clone(),
    };
    let report = args
        .report
        .clone()
        .unwrap_or_else(|| args.evaluations.join(GRADE_SUMMARY_FILE));

    let config = RunConfig::builder()
        .connection(connection)
        .catalog_path(args.catalog.clone())
        .submissions_dir(args.submissions.clone())
        .submission_extension(SUBMISSION_EXTENSION)
        .report_path(report)
        .format(ReportFormat::new(args.decimals));

    if args.skip_evaluations {
        config.build()
    } else {
        config.evaluations_dir(args.evaluations.clone()).build()
    }
}

/// Runs the `grade` subcommand.
async fn grade(args: GradeArgs) -> Result<()> {
    let config = run_config(&args);
    tracing::debug!("{config:?}");

    let handle = spawn(config, Arc::new(CheckRegistry::builtin()));
    let flag = handle.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Stopping after the current submission");
            flag.cancel();
        }
    });

    let summary = handle
        .join()
        .await
        .with_context(|| format!("Failed to grade submissions in {}", args.submissions.display()))?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialize run summary")?
        );
        return Ok(());
    }

    if !summary.totals.is_empty() {
        eprintln!(
            "{}",
            Table::new(&summary.totals)
                .with(Panel::header(format!("Assignment: {}", summary.assignment)))
                .with(Style::modern())
        );
    }
    for diagnostic in &summary.diagnostics {
        eprintln!("{}", diagnostic.to_string().yellow());
    }

    let status = format!(
        "Graded {} submissions, skipped {}, {} diagnostics",
        summary.processed,
        summary.skipped,
        summary.diagnostics.len()
    );
    if summary.cancelled {
        eprintln!("{} {}", status.yellow(), "(cancelled)".red());
    } else if summary.skipped > 0 {
        eprintln!("{}", status.yellow());
    } else {
        eprintln!("{}", status.green());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let (cmd, verbose) = options();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false);
    let filter_layer = LevelFilter::from_level(if verbose { Level::DEBUG } else { Level::INFO });
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    match cmd {
        Cmd::Grade(args) => grade(args).await?,
        Cmd::Checks => {
            for id in CheckRegistry::builtin().ids() {
                println!("{id}");
            }
        }
    };

    Ok(())
}
