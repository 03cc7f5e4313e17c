//! Command line front end for spread-maximising member selection
//!
//! # Usage
//!
//! ```bash
//! climsips pool --ensemble CMIP6 --predictors tos,pr,tas
//! climsips plan --ensemble CMIP5
//! climsips select --config run.toml --with-points
//! climsips select --ensemble CMIP6 --scenario JJA_CEU --data-dir responses/
//! ```
//!
//! Results go to stdout, one member per line. Logs go to stderr and are
//! controlled through `RUST_LOG` (`--verbose` lowers the default level to `debug`).

use clap::{Parser, Subcommand};
use climsips_core::catalog::{catalog, Ensemble, Field};
use climsips_core::errors::{ClimsipsError, ClimsipsResult};
use climsips_core::plan::{plan, SelectionPlan};
use climsips_core::scenario::Scenario;
use climsips_core::selector::{Origin, Selection};
use climsips_core::workflow::{self, SelectionConfig};
use log::debug;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Spread-maximising selection of climate model ensemble members
#[derive(Parser, Debug)]
#[command(name = "climsips")]
#[command(about = "Select ensemble members that maximise the temperature and precipitation spread")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the members with data for every predictor field
    Pool {
        #[arg(short, long)]
        ensemble: Ensemble,

        /// Comma-separated predictor fields, defaults to tos,swcre,pr,tas,ECS
        #[arg(short, long, value_delimiter = ',')]
        predictors: Vec<Field>,
    },
    /// Print the fixed members and sibling groups used by the selection
    Plan {
        #[arg(short, long)]
        ensemble: Ensemble,
    },
    /// Run the spread-maximising selection
    Select {
        /// TOML run configuration
        #[arg(short, long, conflicts_with_all = ["ensemble", "scenario", "data_dir"])]
        config: Option<PathBuf>,

        #[arg(short, long, required_unless_present = "config")]
        ensemble: Option<Ensemble>,

        /// Season and region, e.g. JJA_CEU
        #[arg(short, long, required_unless_present = "config")]
        scenario: Option<Scenario>,

        /// Directory holding the response files
        #[arg(short, long, required_unless_present = "config")]
        data_dir: Option<PathBuf>,

        /// Comma-separated predictor fields, defaults to tos,swcre,pr,tas,ECS
        #[arg(short, long, value_delimiter = ',')]
        predictors: Vec<Field>,

        /// Also print the normalised temperature and precipitation of each member
        #[arg(long)]
        with_points: bool,
    },
}

fn predictors_or_default(predictors: Vec<Field>) -> Vec<Field> {
    if predictors.is_empty() {
        Field::DEFAULT_PREDICTORS.to_vec()
    } else {
        predictors
    }
}

fn missing_argument(name: &str) -> ClimsipsError {
    ClimsipsError::InvalidInput(format!("--{} is required without --config", name))
}

fn print_selection(selection: &Selection, with_points: bool) {
    for entry in selection.entries() {
        if with_points {
            println!("{} {} {}", entry.member, entry.point.x, entry.point.y);
        } else {
            println!("{}", entry.member);
        }
        if let Origin::Group {
            model,
            nearest_distance,
        } = &entry.origin
        {
            debug!(
                "{} chosen from {} at distance {:.4}",
                entry.member, model, nearest_distance
            );
        }
    }
}

fn print_plan(plan: &SelectionPlan) {
    println!("fixed:");
    for member in &plan.fixed {
        println!("  {}", member);
    }
    for group in &plan.groups {
        match &group.note {
            Some(note) => println!("{} ({}):", group.model, note),
            None => println!("{}:", group.model),
        }
        for member in &group.members {
            println!("  {}", member);
        }
    }
}

fn run(args: Args) -> ClimsipsResult<()> {
    match args.command {
        Command::Pool {
            ensemble,
            predictors,
        } => {
            let predictors = predictors_or_default(predictors);
            for member in catalog(ensemble)?.candidate_pool(&predictors)? {
                println!("{}", member);
            }
        }
        Command::Plan { ensemble } => match plan(ensemble)? {
            Some(curated) => print_plan(curated),
            None => print_plan(&SelectionPlan::from_pool(
                &catalog(ensemble)?.candidate_pool(&Field::DEFAULT_PREDICTORS)?,
            )),
        },
        Command::Select {
            config,
            ensemble,
            scenario,
            data_dir,
            predictors,
            with_points,
        } => {
            let mut config = match config {
                Some(path) => SelectionConfig::from_file(path)?,
                None => SelectionConfig::new(
                    ensemble.ok_or_else(|| missing_argument("ensemble"))?,
                    scenario.ok_or_else(|| missing_argument("scenario"))?,
                    data_dir.ok_or_else(|| missing_argument("data-dir"))?,
                ),
            };
            if !predictors.is_empty() {
                config.predictors = predictors;
            }
            let selection = workflow::run(&config)?;
            print_selection(&selection, with_points);
        }
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
