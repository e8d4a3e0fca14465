//! bwdb - BioWave test database management
//!
//! Usage:
//!   bwdb create -R -D <imagedir> -d <devfile> -e <evalfile>
//!   bwdb dumplist --protocol all --group dev --purpose enroll
//!   bwdb checkfiles -d <directory>
//!   bwdb reverse Person_01/Left/BioPic_20160425_114336
//!   bwdb path 2

use anyhow::Result;
use biowave_cli::commands::{self, PathFormat, SourceOverrides};
use biowave_cli::output::{print_json, print_json_files, print_paths};
use biowave_core::{BiowaveConfig, Group, ObjectQuery, Purpose};
use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "bwdb")]
#[command(about = "Create and query the BioWave test vein database", long_about = None)]
struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file (overrides config)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Creates or re-creates this database
    Create(CreateArgs),
    /// Dumps the list of files matching the query
    Dumplist(DumplistArgs),
    /// Checks that all database files exist on disk
    Checkfiles(CheckfilesArgs),
    /// Prints the ids of files stored under the given paths
    Reverse(ReverseArgs),
    /// Prints the full paths of files with the given ids
    Path(PathArgs),
    /// Prints the database file name
    Files,
}

#[derive(ClapArgs, Debug)]
struct CreateArgs {
    /// Erase the current database first
    #[arg(short = 'R', long)]
    recreate: bool,

    /// Directory containing the database images
    #[arg(short = 'D', long)]
    imagedir: Option<PathBuf>,

    /// File list of the dev group
    #[arg(short = 'd', long)]
    devfile: Option<PathBuf>,

    /// File list of the eval group
    #[arg(short = 'e', long)]
    evalfile: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
struct FormatArgs {
    /// Directory prepended to every file path
    #[arg(short = 'd', long)]
    directory: Option<PathBuf>,

    /// Extension appended to every file path
    #[arg(short = 'e', long)]
    extension: Option<String>,
}

#[derive(ClapArgs, Debug)]
struct DumplistArgs {
    #[command(flatten)]
    format: FormatArgs,

    /// Protocol(s) to select
    #[arg(short = 'p', long)]
    protocol: Vec<String>,

    /// Group(s) to select (dev, eval)
    #[arg(short = 'g', long = "group")]
    groups: Vec<Group>,

    /// Purpose(s) to select (enroll, probe)
    #[arg(short = 'u', long = "purpose")]
    purposes: Vec<Purpose>,

    /// Model id(s) to select, e.g. c_7_i_1
    #[arg(short = 'm', long, value_delimiter = ',')]
    models: Vec<String>,

    /// Print JSON instead of one path per line
    #[arg(long)]
    json: bool,

    /// Only check that the command runs
    #[arg(long)]
    self_test: bool,
}

#[derive(ClapArgs, Debug)]
struct CheckfilesArgs {
    #[command(flatten)]
    format: FormatArgs,

    /// Only check that the command runs
    #[arg(long)]
    self_test: bool,
}

#[derive(ClapArgs, Debug)]
struct ReverseArgs {
    /// Stored paths (relative, without extension)
    #[arg(required = true)]
    paths: Vec<String>,

    /// Only check that the command runs
    #[arg(long)]
    self_test: bool,
}

#[derive(ClapArgs, Debug)]
struct PathArgs {
    /// File ids
    #[arg(required = true)]
    ids: Vec<i64>,

    #[command(flatten)]
    format: FormatArgs,

    /// Only check that the command runs
    #[arg(long)]
    self_test: bool,
}

fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level(args.verbose)))
        .init();

    let config = resolve_config(args.config.as_deref(), args.db)?;
    run(&config, args.command)
}

/// Configuration file (or defaults) with the `--db` override applied
fn resolve_config(path: Option<&Path>, db: Option<PathBuf>) -> Result<BiowaveConfig> {
    let mut config = BiowaveConfig::load_or_default(path)?;
    if let Some(db) = db {
        config.database.file = db;
    }
    Ok(config)
}

fn run(config: &BiowaveConfig, command: Command) -> Result<()> {
    match command {
        Command::Create(create) => {
            let overrides = SourceOverrides {
                imagedir: create.imagedir,
                devfile: create.devfile,
                evalfile: create.evalfile,
            };
            let summary = commands::create(config, overrides, create.recreate)?;
            print_json(&summary);
        }
        Command::Dumplist(dump) => {
            let db = commands::open_database(config)?;
            let format = PathFormat::resolve(config, dump.format.directory, dump.format.extension);
            let query = ObjectQuery {
                protocol: dump.protocol,
                groups: dump.groups,
                purposes: dump.purposes,
                model_ids: dump.models,
            };
            let files = commands::dumplist(&db, &query)?;
            if dump.self_test {
                return Ok(());
            }
            if dump.json {
                print_json_files(&files, &format);
            } else {
                let paths: Vec<PathBuf> = files.iter().map(|f| format.full_path(f)).collect();
                print_paths(&paths);
            }
        }
        Command::Checkfiles(check) => {
            let db = commands::open_database(config)?;
            let format = PathFormat::resolve(config, check.format.directory, check.format.extension);
            let report = commands::checkfiles(&db, &format)?;
            if check.self_test {
                return Ok(());
            }
            print_paths(&report.missing);
            if !report.missing.is_empty() {
                anyhow::bail!(
                    "{} files (of {}) could not be found in {}",
                    report.missing.len(),
                    report.total,
                    format.directory.display()
                );
            }
            log::info!("All {} files found", report.total);
        }
        Command::Reverse(reverse) => {
            let db = commands::open_database(config)?;
            let ids = commands::reverse(&db, &reverse.paths)?;
            if reverse.self_test {
                return Ok(());
            }
            if ids.is_empty() {
                anyhow::bail!("No file matches the given paths");
            }
            for id in ids {
                println!("{}", id);
            }
        }
        Command::Path(path) => {
            let db = commands::open_database(config)?;
            let format = PathFormat::resolve(config, path.format.directory, path.format.extension);
            let paths = commands::paths(&db, &path.ids, &format)?;
            if path.self_test {
                return Ok(());
            }
            if paths.is_empty() {
                anyhow::bail!("No file matches the given ids");
            }
            print_paths(&paths);
        }
        Command::Files => {
            println!("{}", config.database.file.display());
        }
    }
    Ok(())
}
