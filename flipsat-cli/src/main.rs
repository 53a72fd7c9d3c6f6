use std::env;
use std::fs;
use std::io::{self, Write};
use std::time::Duration;

use anyhow::{bail, Context, Error};
use clap::{value_t, values_t, App, AppSettings, Arg};
use env_logger::{fmt, Builder, Target};
use log::{error, info};
use log::{Level, LevelFilter, Record};

use flipsat::config::{OptionTable, Options};
use flipsat::solver::{SolveResult, Solver};

fn main() {
    let exit_code = match main_with_err() {
        Err(err) => {
            error!("{:#}", err);
            1
        }
        Ok(exit_code) => exit_code,
    };
    std::process::exit(exit_code);
}

fn init_logging() {
    let format = |buf: &mut fmt::Formatter, record: &Record| {
        if record.level() == Level::Info {
            writeln!(buf, "c {}", record.args())
        } else {
            writeln!(buf, "c {}: {}", record.level(), record.args())
        }
    };

    let mut builder = Builder::new();
    builder
        .target(Target::Stdout)
        .format(format)
        .filter(None, LevelFilter::Info);

    if let Ok(ref env_var) = env::var("FLIPSAT_LOG") {
        builder.parse_filters(env_var);
    }

    builder.init();
}

fn banner() {
    info!("This is flipsat {}", env!("FLIPSAT_VERSION"));
    info!(
        "  {} build - {}",
        env!("FLIPSAT_PROFILE"),
        env!("FLIPSAT_RUSTC_VERSION")
    );
}

/// Splits `NAME=VALUE` into its parts.
fn parse_option(option: &str) -> Result<(&str, i32), Error> {
    let mut parts = option.splitn(2, '=');
    let name = parts.next().unwrap_or_default().trim();
    let value = match parts.next() {
        Some(value) => value.trim(),
        None => bail!("expected NAME=VALUE, got '{}'", option),
    };
    let value = value
        .parse()
        .with_context(|| format!("invalid value for option '{}'", name))?;
    Ok((name, value))
}

/// Parses a time limit in seconds.
fn parse_time_limit(text: &str) -> Result<Duration, Error> {
    let seconds: f64 = text
        .trim()
        .parse()
        .with_context(|| format!("invalid time limit '{}'", text))?;
    Duration::try_from_secs_f64(seconds)
        .with_context(|| format!("time limit {} is out of range", seconds))
}

/// Prints the model as DIMACS value lines.
fn print_witness(model: &[i32]) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut line_len = 1;
    write!(out, "v")?;
    for &lit in model.iter().chain(Some(&0)) {
        let text = lit.to_string();
        if line_len + 1 + text.len() > 78 {
            write!(out, "\nv")?;
            line_len = 1;
        }
        write!(out, " {}", text)?;
        line_len += 1 + text.len();
    }
    writeln!(out)
}

fn main_with_err() -> Result<i32, Error> {
    let matches = App::new("flipsat")
        .version(env!("FLIPSAT_VERSION"))
        .setting(AppSettings::DisableHelpSubcommand)
        .arg_from_usage("[INPUT] 'The input file to use (stdin if omitted)'")
        .arg(
            Arg::from_usage("[config-option] -C --config-option")
                .value_name("NAME>=<VALUE")
                .help(
                    "Specify a single option, see 'flipsat -C help' for a list of options.",
                )
                .multiple(true)
                .number_of_values(1),
        )
        .arg_from_usage("[seed] -s --seed=[SEED] 'Seed of the random source'")
        .arg_from_usage("[flips] --flips=[FLIPS] 'Stop after this many flips'")
        .arg_from_usage("[mems] --mems=[MEMS] 'Stop after this many memory accesses'")
        .arg_from_usage("[time-limit] --time-limit=[SECONDS] 'Stop after this many seconds'")
        .get_matches();

    let config_options = values_t!(matches, "config-option", String).unwrap_or_default();

    if config_options.iter().any(|option| option == "help") {
        print!("{}", Options::help());
        return Ok(0);
    }

    init_logging();
    banner();

    let mut solver = Solver::new();

    for option in config_options.iter() {
        let (name, value) = parse_option(option)?;
        solver.set_option(name, value)?;
        info!("option {}={}", name, value);
    }

    if matches.is_present("seed") {
        let seed = value_t!(matches, "seed", u64)?;
        info!("seed {}", seed);
        solver.seed(seed);
    }
    if matches.is_present("flips") {
        solver.set_flips_limit(Some(value_t!(matches, "flips", u64)?));
    }
    if matches.is_present("mems") {
        solver.set_mems_limit(Some(value_t!(matches, "mems", u64)?));
    }
    if let Some(text) = matches.value_of("time-limit") {
        solver.set_time_limit(Some(parse_time_limit(text)?));
    }

    let stdin = io::stdin();

    let mut locked_stdin;
    let mut opened_file;

    let file = match matches.value_of("INPUT") {
        Some(path) => {
            info!("Reading file '{}'", path);
            opened_file =
                fs::File::open(path).with_context(|| format!("cannot open '{}'", path))?;
            &mut opened_file as &mut dyn io::Read
        }
        None => {
            info!("Reading from stdin");
            locked_stdin = stdin.lock();
            &mut locked_stdin as &mut dyn io::Read
        }
    };

    solver.add_dimacs_cnf(file)?;

    let result = solver.solve()?;
    solver.print_stats();

    match result {
        SolveResult::Satisfiable => {
            println!("s SATISFIABLE");
            if solver.get_option("witness")? != 0 {
                if let Some(model) = solver.model() {
                    print_witness(&model)?;
                }
            }
            Ok(10)
        }
        SolveResult::Unknown => {
            if solver.trivially_unsat() {
                info!("unit propagation refuted the formula");
            } else if let Some(minimum) = solver.minimum() {
                info!("minimum of {} unsatisfied clauses", minimum);
            }
            println!("s UNKNOWN");
            Ok(0)
        }
    }
}
