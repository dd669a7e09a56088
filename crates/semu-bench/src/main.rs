use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::{Duration, Instant};

use clap::{ArgAction, Parser};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use semu_engine::Engine;
use semu_syntax::error::Result;

#[derive(Parser, Debug)]
#[command(name = "semu-bench", about = "Expand and run S-Emulator programs at every degree")]
struct Cli {
    /// Specific program(s) to run (by file stem, e.g. add). If omitted, runs all discovered programs.
    #[arg(short = 't', long = "test", action = ArgAction::Append)]
    tests: Vec<String>,

    /// Iterations per program and degree (measured)
    #[arg(short = 'n', long = "iterations", default_value_t = 10)]
    iterations: u32,

    /// Warmup iterations (not measured)
    #[arg(short = 'w', long = "warmup", default_value_t = 2)]
    warmup: u32,

    /// Values of x1, x2, ... for every run
    #[arg(short = 'i', long = "inputs", value_delimiter = ',', default_value = "3,2")]
    inputs: Vec<u64>,

    /// Step budget per run
    #[arg(long = "max-steps", default_value_t = 10_000_000)]
    max_steps: u64,

    /// Output JSON file path; default: benchmark/results/<timestamp>.json
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// List discovered programs and exit
    #[arg(long = "list", default_value_t = false)]
    list: bool,
}

#[derive(Debug, Serialize)]
struct BenchResult {
    name: String,
    degree: usize,
    iterations: u32,
    instructions: usize,
    static_cycles: u64,
    executed_cycles: u64,
    y: u64,
    avg_total_ms: f64,
    min_total_ms: f64,
    max_total_ms: f64,
    avg_load_ms: f64,
    avg_expand_ms: f64,
    avg_exec_ms: f64,
}

#[derive(Debug, Serialize)]
struct OutputDoc {
    timestamp: String,
    semu_version: String,
    inputs: Vec<u64>,
    benchmarks: Vec<BenchResult>,
}

#[derive(Debug, Clone)]
struct ProgramCase {
    name: String,
    path: PathBuf,
}

/// Per-iteration timings of one program at one degree.
#[derive(Debug, Default)]
struct Samples {
    totals: Vec<f64>,
    loads: Vec<f64>,
    expands: Vec<f64>,
    execs: Vec<f64>,
}

/// What the last measured run computed.
#[derive(Debug, Default)]
struct Outcome {
    instructions: usize,
    static_cycles: u64,
    executed_cycles: u64,
    y: u64,
}

fn workspace_root() -> PathBuf {
    // crates/semu-bench -> crates -> root
    let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest
        .parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or(manifest)
}

fn discover_programs() -> Vec<ProgramCase> {
    let root = workspace_root();
    let mut out = Vec::new();
    for dir in [root.join("benchmark/programs"), root.join("demos")] {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };
        for e in entries.flatten() {
            let p = e.path();
            let ext = p.extension().and_then(|s| s.to_str());
            if ext == Some("xml") || ext == Some("json") {
                let name = p.file_stem().and_then(|s| s.to_str()).unwrap_or("").to_string();
                out.push(ProgramCase { name, path: p });
            }
        }
    }
    out.sort_by(|a, b| a.name.cmp(&b.name));
    out
}

fn fresh_engine(src: &str, max_steps: u64) -> Result<Engine> {
    let mut engine = Engine::new();
    engine.set_step_limit(Some(max_steps));
    engine.load_from_str(src)?;
    Ok(engine)
}

fn measure(src: &str, degree: usize, cli: &Cli) -> Result<(Samples, Outcome)> {
    for _ in 0..cli.warmup {
        let mut engine = fresh_engine(src, cli.max_steps)?;
        engine.run_and_record(degree, &cli.inputs)?;
    }

    let mut samples = Samples::default();
    let mut outcome = Outcome::default();
    for _ in 0..cli.iterations {
        let t0 = Instant::now();
        let mut t = Instant::now();
        let mut engine = fresh_engine(src, cli.max_steps)?;
        let t_load = t.elapsed();

        t = Instant::now();
        outcome.instructions = engine.program(degree)?.len();
        let t_expand = t.elapsed();

        t = Instant::now();
        let record = engine.run_and_record(degree, &cli.inputs)?;
        let t_exec = t.elapsed();

        samples.totals.push(dur_ms(t0.elapsed()));
        samples.loads.push(dur_ms(t_load));
        samples.expands.push(dur_ms(t_expand));
        samples.execs.push(dur_ms(t_exec));
        outcome.static_cycles = record.cycles;
        outcome.executed_cycles = record.executed_cycles;
        outcome.y = record.y;
    }
    Ok((samples, outcome))
}

fn dur_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn stats(vals: &[f64]) -> (f64, f64, f64) {
    if vals.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    let min = vals.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = vals.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let avg = vals.iter().sum::<f64>() / (vals.len() as f64);
    (avg, min, max)
}

fn die(msg: String) -> ! {
    eprintln!("{}", msg);
    process::exit(1)
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let mut programs = discover_programs();

    if cli.list {
        println!("Discovered programs:");
        for p in &programs {
            println!("- {} ({})", p.name, p.path.display());
        }
        return;
    }

    if !cli.tests.is_empty() {
        let wanted: Vec<String> = cli.tests.iter().map(|s| s.to_lowercase()).collect();
        programs.retain(|p| wanted.contains(&p.name.to_lowercase()));
        if programs.is_empty() {
            eprintln!("No matching programs. Use --list to see available.");
            process::exit(2);
        }
    }

    if programs.is_empty() {
        eprintln!("No .xml or .json programs found in benchmark/programs or demos.");
        process::exit(2);
    }

    let mut results = Vec::new();
    for case in &programs {
        let src = fs::read_to_string(&case.path)
            .unwrap_or_else(|e| die(format!("Failed to read {}: {}", case.path.display(), e)));
        let max_degree = fresh_engine(&src, cli.max_steps)
            .and_then(|e| e.max_degree())
            .unwrap_or_else(|e| die(format!("{}: {}", case.name, e)));

        for degree in 0..=max_degree {
            let (samples, outcome) = measure(&src, degree, &cli)
                .unwrap_or_else(|e| die(format!("{} at degree {}: {}", case.name, degree, e)));
            let (avg_t, min_t, max_t) = stats(&samples.totals);
            let (avg_l, _, _) = stats(&samples.loads);
            let (avg_x, _, _) = stats(&samples.expands);
            let (avg_e, _, _) = stats(&samples.execs);

            println!(
                "{:>12} d={}: total avg={:.3}ms min={:.3}ms max={:.3}ms | load={:.3}ms expand={:.3}ms exec={:.3}ms | {} instr, {} cycles, y={}",
                case.name, degree, avg_t, min_t, max_t, avg_l, avg_x, avg_e,
                outcome.instructions, outcome.executed_cycles, outcome.y
            );
            info!(program = %case.name, degree, y = outcome.y, "benchmark finished");

            results.push(BenchResult {
                name: case.name.clone(),
                degree,
                iterations: cli.iterations,
                instructions: outcome.instructions,
                static_cycles: outcome.static_cycles,
                executed_cycles: outcome.executed_cycles,
                y: outcome.y,
                avg_total_ms: avg_t,
                min_total_ms: min_t,
                max_total_ms: max_t,
                avg_load_ms: avg_l,
                avg_expand_ms: avg_x,
                avg_exec_ms: avg_e,
            });
        }
    }

    let out_path = match cli.output.clone() {
        Some(p) => p,
        None => {
            let ts_file = chrono::Utc::now().format("%Y-%m-%d_%H-%M-%SZ").to_string();
            workspace_root().join("benchmark/results").join(format!("{}.json", ts_file))
        }
    };

    let doc = OutputDoc {
        timestamp: chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        semu_version: env!("CARGO_PKG_VERSION").to_string(),
        inputs: cli.inputs.clone(),
        benchmarks: results,
    };

    let json = serde_json::to_string_pretty(&doc)
        .unwrap_or_else(|e| die(format!("Failed to serialize results: {}", e)));
    if let Some(parent) = out_path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            die(format!("Failed to create {}: {}", parent.display(), e));
        }
    }
    if let Err(e) = fs::write(&out_path, json) {
        die(format!("Failed to write {}: {}", out_path.display(), e));
    }

    println!("\nSaved results to {}", out_path.display());
}
