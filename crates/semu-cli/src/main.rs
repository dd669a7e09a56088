mod common;
mod repl;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use tracing_subscriber::{fmt, EnvFilter};

use semu_engine::Engine;
use semu_syntax::error::Error;

use common::{print_record, render_error};

#[derive(Parser, Debug)]
#[command(name = "semu", version, about = "Expand and run S-language programs")]
struct Cli {
    /// Stop a run after this many executed instructions
    #[arg(long = "max-steps", env = "SEMU_MAX_STEPS", global = true)]
    max_steps: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a program and print y
    Run {
        file: PathBuf,
        /// Expansion degree to run at
        #[arg(short = 'd', long = "degree", default_value_t = 0)]
        degree: usize,
        /// Values of x1, x2, ... separated by commas
        #[arg(short = 'i', long = "inputs", value_delimiter = ',')]
        inputs: Vec<u64>,
        /// Print every executed instruction
        #[arg(long = "trace", default_value_t = false)]
        trace: bool,
        /// Print the run record as JSON
        #[arg(long = "json", default_value_t = false)]
        json: bool,
    },
    /// Print the program listing at a degree
    Show {
        file: PathBuf,
        #[arg(short = 'd', long = "degree", default_value_t = 0)]
        degree: usize,
    },
    /// Print the instructions a line was expanded from
    Lineage {
        file: PathBuf,
        #[arg(short = 'd', long = "degree")]
        degree: usize,
        /// 1-based line at that degree
        line: usize,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads `path`, keeping its text around so errors can point into it.
fn load(path: &Path, max_steps: Option<u64>) -> (Engine, String) {
    let source = fs::read_to_string(path).unwrap_or_default();
    let mut engine = Engine::new();
    engine.set_step_limit(max_steps);
    if let Err(e) = engine.load_from_path(path) {
        fail(&source, &e);
    }
    (engine, source)
}

fn fail(source: &str, err: &Error) -> ! {
    render_error(Some(source), err);
    process::exit(1);
}

fn run(path: &Path, degree: usize, inputs: &[u64], trace: bool, json: bool, max_steps: Option<u64>) {
    let (mut engine, source) = load(path, max_steps);
    let record = if trace {
        let listing = engine.render(degree).unwrap_or_else(|e| fail(&source, &e));
        if let Err(e) = engine.debug_start(degree, inputs) {
            fail(&source, &e);
        }
        while engine.is_debugging() {
            let step = engine.debug_step().unwrap_or_else(|e| fail(&source, &e));
            let text = listing.get(step.line - 1).map(String::as_str).unwrap_or("");
            println!("{}", text.bright_black());
            println!("    {}", semu_vm::render_variables(&engine.variables()));
        }
        engine.history().last().cloned()
    } else {
        Some(engine.run_and_record(degree, inputs).unwrap_or_else(|e| fail(&source, &e)))
    };
    let record = match record {
        Some(r) => r,
        None => fail(&source, &Error::host_misuse("The run left no record")),
    };
    if json {
        match engine.history_json() {
            Ok(s) => println!("{}", s),
            Err(e) => fail(&source, &e),
        }
    } else {
        print_record(&record);
    }
}

fn show(path: &Path, degree: usize, max_steps: Option<u64>) {
    let (mut engine, source) = load(path, max_steps);
    let max = engine.max_degree().unwrap_or_else(|e| fail(&source, &e));
    let lines = engine.render(degree).unwrap_or_else(|e| fail(&source, &e));
    let cycles = engine.cycles(degree).unwrap_or_else(|e| fail(&source, &e));
    let summary = engine.instruction_summary(degree).unwrap_or_else(|e| fail(&source, &e));
    println!(
        "{} {} (degree {} of {})",
        "Program".bold(),
        engine.program_name().unwrap_or("?").bold().green(),
        degree,
        max
    );
    for line in lines {
        println!("{}", line);
    }
    println!(
        "{}",
        format!(
            "{} instructions ({} basic, {} synthetic), {} cycles",
            summary.total(),
            summary.basic,
            summary.synthetic,
            cycles
        )
        .bright_black()
    );
    let inputs: Vec<String> = engine
        .used_inputs()
        .unwrap_or_default()
        .iter()
        .map(|v| v.to_string())
        .collect();
    if !inputs.is_empty() {
        println!("{}", format!("inputs: {}", inputs.join(", ")).bright_black());
    }
}

fn lineage(path: &Path, degree: usize, line: usize, max_steps: Option<u64>) {
    let (mut engine, source) = load(path, max_steps);
    let chain = engine.lineage(degree, line).unwrap_or_else(|e| fail(&source, &e));
    for (i, (d, instr)) in chain.iter().enumerate() {
        println!(
            "{}{} #{} {}",
            "  ".repeat(i),
            format!("[degree {}]", d).yellow(),
            instr.line,
            instr
        );
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging();
    match cli.command {
        None => repl::start_repl(cli.max_steps),
        Some(Command::Run { file, degree, inputs, trace, json }) => {
            run(&file, degree, &inputs, trace, json, cli.max_steps)
        }
        Some(Command::Show { file, degree }) => show(&file, degree, cli.max_steps),
        Some(Command::Lineage { file, degree, line }) => lineage(&file, degree, line, cli.max_steps),
    }
}
