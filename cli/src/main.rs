mod error_formatter;
mod formatter;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use formatter::Formatter;
use numen::{Catalog, Engine, Id, Storehouse};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Type under which names seeded on the command line are registered when
/// the catalog does not declare them
const INPUT_TYPE: &str = "input";

#[derive(Parser)]
#[command(name = "numen")]
#[command(about = "Evaluate numen formulas, conditions, operations and processes.")]
#[command(
    long_about = "numen is a small numeric rule engine. Names are declared in a JSON catalog,\nvalues are seeded with name=value pairs and expressions are evaluated against them."
)]
#[command(version)]
struct Cli {
    /// JSON catalog declaring types, names and engine configuration
    #[arg(short = 'c', long, global = true)]
    catalog: Option<PathBuf>,

    /// Log engine activity (equivalent to RUST_LOG=debug)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a formula
    ///
    /// Examples:
    ///   numen eval "atk*2 - Min(def, 10)" atk=12 def=4
    Eval {
        formula: String,
        /// Values to seed before evaluating (format: name=value)
        values: Vec<String>,
        /// Output the value only
        #[arg(short = 'r', long)]
        raw: bool,
    },
    /// Check a condition
    ///
    /// Exits with status 0 when the condition holds and 2 when it does not.
    Check {
        condition: String,
        /// Values to seed before checking (format: name=value)
        values: Vec<String>,
        /// Output true/false only
        #[arg(short = 'r', long)]
        raw: bool,
    },
    /// Run an operation list, or a process with --process
    ///
    /// Prints the values of every name the statements assigned.
    Run {
        /// The statements followed by values to seed (format: name=value).
        /// With --file every argument is a value.
        #[arg(value_name = "[STATEMENTS] [NAME=VALUE]")]
        args: Vec<String>,
        /// Read the statements from a file
        #[arg(short = 'f', long)]
        file: Option<PathBuf>,
        /// Treat the statements as a process with Return(...) steps
        #[arg(short = 'p', long)]
        process: bool,
        /// Log every process step with its values
        #[arg(short = 't', long, requires = "process")]
        trace: bool,
        /// Output the return value (or the last assigned value) only
        #[arg(short = 'r', long)]
        raw: bool,
    },
    /// List the names declared by the catalog
    Names,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Commands::Eval {
            formula,
            values,
            raw,
        } => eval_command(cli.catalog.as_deref(), formula, values, *raw),
        Commands::Check {
            condition,
            values,
            raw,
        } => check_command(cli.catalog.as_deref(), condition, values, *raw),
        Commands::Run {
            args,
            file,
            process,
            trace,
            raw,
        } => run_command(
            cli.catalog.as_deref(),
            args,
            file.as_deref(),
            *process,
            *trace,
            *raw,
        ),
        Commands::Names => names_command(cli.catalog.as_deref()),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            if let Some(numen_err) = e.downcast_ref::<numen::NumenError>() {
                eprintln!("{}", error_formatter::format_error(numen_err));
            } else {
                eprintln!("Error: {:#}", e);
            }
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn eval_command(catalog: Option<&Path>, text: &str, values: &[String], raw: bool) -> Result<i32> {
    let seeds = parse_values(values)?;
    let engine = build_engine(catalog, &seeds, false)?;
    let formula = engine.parse_formula(text)?;
    let mut store = engine.storehouse();
    seed_store(&engine, &mut store, &seeds)?;

    let value = formula.evaluate(&store);
    let formatter = Formatter::default();
    if raw {
        println!("{}", formatter.format_raw(value));
    } else {
        print!(
            "{}",
            formatter.format_result(&formula.to_string(), &formula.render_values(&store), value)
        );
    }
    Ok(0)
}

fn check_command(catalog: Option<&Path>, text: &str, values: &[String], raw: bool) -> Result<i32> {
    let seeds = parse_values(values)?;
    let engine = build_engine(catalog, &seeds, false)?;
    let condition = engine.parse_condition(text)?;
    let mut store = engine.storehouse();
    seed_store(&engine, &mut store, &seeds)?;

    let holds = condition.check(&store);
    if raw {
        println!("{}", holds);
    } else {
        print!(
            "{}",
            Formatter::default().format_check(
                &condition.to_string(),
                &condition.render_values(&store),
                holds
            )
        );
    }
    Ok(if holds { 0 } else { 2 })
}

fn run_command(
    catalog: Option<&Path>,
    args: &[String],
    file: Option<&Path>,
    process: bool,
    trace: bool,
    raw: bool,
) -> Result<i32> {
    let (text, values) = match (file, args.split_first()) {
        (Some(path), _) => (
            fs::read_to_string(path)
                .with_context(|| format!("cannot read '{}'", path.display()))?,
            args,
        ),
        (None, Some((text, values))) => (text.clone(), values),
        (None, None) => bail!("nothing to run: pass the statements or --file <PATH>"),
    };

    let seeds = parse_values(values)?;
    let engine = build_engine(catalog, &seeds, trace)?;
    let workstation = engine.workstation();
    let mut store = engine.storehouse();
    seed_store(&engine, &mut store, &seeds)?;

    let formatter = Formatter::default();
    let result = if process {
        let process = engine.parse_process(&text)?;
        debug!(process = %process, slots = process.slots().len(), "parsed process");
        Some(workstation.exec_proc(&mut store, &process, true))
    } else {
        let operations = engine.parse_operations(&text)?;
        debug!(operations = %operations, "parsed operations");
        workstation.exec_oper(&mut store, &operations, true);
        None
    };

    let produced = workstation.produced(&store);
    if raw {
        let value = result.or_else(|| produced.last().map(|id| store.get(*id)));
        println!("{}", formatter.format_raw(value.unwrap_or(0.0)));
        return Ok(0);
    }

    let rows = named_values(&engine, &store, &produced);
    print!("{}", formatter.format_values(&rows, result));
    Ok(0)
}

fn names_command(catalog: Option<&Path>) -> Result<i32> {
    let path = catalog.ok_or_else(|| anyhow!("the names command needs --catalog <PATH>"))?;
    let catalog = Catalog::from_path(path)?;
    let engine = Engine::from_catalog(&catalog)?;

    let declared: Vec<Id> = catalog
        .names
        .iter()
        .map(|entry| entry.name.as_str())
        .chain(catalog.ordered.iter().map(|entry| entry.name.as_str()))
        .filter_map(|name| engine.registry().id_by_name(name))
        .collect();
    print!("{}", Formatter::default().format_names(engine.registry(), &declared));
    Ok(0)
}

/// Load the catalog (if any) and register every seeded name it lacks
fn build_engine(catalog: Option<&Path>, seeds: &[(String, f64)], trace: bool) -> Result<Engine> {
    let mut catalog = match catalog {
        Some(path) => Catalog::from_path(path)?,
        None => Catalog::default(),
    };
    if trace {
        catalog.config.get_or_insert_with(Default::default).trace_steps = true;
    }

    let mut engine = Engine::from_catalog(&catalog)?;
    for (name, _) in seeds {
        if engine.registry().id_by_name(name).is_none() {
            debug!(name = %name, "registering seeded name");
            engine.registry_mut().register_name(INPUT_TYPE, name, 0)?;
        }
    }
    Ok(engine)
}

fn seed_store(engine: &Engine, store: &mut Storehouse<'_>, seeds: &[(String, f64)]) -> Result<()> {
    for (name, value) in seeds {
        let id = engine
            .registry()
            .id_by_name(name)
            .ok_or_else(|| anyhow!("unknown name '{}'", name))?;
        store.set(id, *value);
    }
    Ok(())
}

fn named_values(engine: &Engine, store: &Storehouse<'_>, ids: &[Id]) -> Vec<(String, f64)> {
    ids.iter()
        .filter_map(|id| {
            let name = engine.registry().name_by_id(*id)?;
            Some((name.to_string(), store.get(*id)))
        })
        .collect()
}

/// Parse `name=value` pairs
fn parse_values(values: &[String]) -> Result<Vec<(String, f64)>> {
    values
        .iter()
        .map(|pair| {
            let (name, value) = pair
                .split_once('=')
                .ok_or_else(|| anyhow!("invalid value '{}': expected name=value", pair))?;
            let name = name.trim();
            if name.is_empty() {
                bail!("invalid value '{}': missing name", pair);
            }
            let value: f64 = value
                .trim()
                .parse()
                .with_context(|| format!("invalid number in '{}'", pair))?;
            Ok((name.to_string(), value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_values() {
        let values = parse_values(&["atk=12".to_string(), " def = -4.5".to_string()]).unwrap();
        assert_eq!(values, vec![("atk".to_string(), 12.0), ("def".to_string(), -4.5)]);
    }

    #[test]
    fn test_parse_values_rejects_malformed_pairs() {
        assert!(parse_values(&["atk".to_string()]).is_err());
        assert!(parse_values(&["=3".to_string()]).is_err());
        assert!(parse_values(&["atk=lots".to_string()]).is_err());
    }

    #[test]
    fn test_seeded_names_are_registered() {
        let seeds = vec![("hp".to_string(), 10.0)];
        let engine = build_engine(None, &seeds, false).unwrap();
        let hp = engine.registry().id_by_name("hp").unwrap();
        assert_eq!(engine.registry().type_label(hp), Some(INPUT_TYPE));
    }
}
