use std::fs;
use std::io::{self, Write};

use owo_colors::OwoColorize;

use semu_engine::Engine;
use semu_syntax::error::{Error, Result};

use crate::common::{parse_inputs, print_record, render_error};

/// Interactive console over one engine.
pub fn start_repl(max_steps: Option<u64>) {
    println!("{}", "S-Emulator console. Type :help for help, :quit to exit.".bold().green());

    let mut engine = Engine::new();
    engine.set_step_limit(max_steps);
    let mut source = String::new();

    loop {
        let prompt = if engine.is_debugging() { "semu(debug)> " } else { "semu> " };
        print!("{}", prompt.cyan());
        let _ = io::stdout().flush();

        let mut line = String::new();
        let n = match io::stdin().read_line(&mut line) {
            Ok(n) => n,
            Err(_) => {
                println!("<input error>");
                break;
            }
        };
        if n == 0 {
            println!("\nGoodbye.");
            break;
        }
        let mut words = line.split_whitespace();
        let command = match words.next() {
            Some(c) => c,
            None => continue,
        };
        let args: Vec<&str> = words.collect();

        let result = match command {
            ":quit" | ":q" | ":exit" => {
                println!("Goodbye.");
                break;
            }
            ":help" | ":h" => {
                print_help();
                Ok(())
            }
            ":load" => load(&mut engine, &mut source, &args),
            ":show" => show(&mut engine, &args),
            ":run" => run(&mut engine, &args),
            ":rerun" => number(&args, 0, "run id").and_then(|id| engine.rerun(id)).map(|r| print_record(&r)),
            ":debug" => debug(&mut engine, &args),
            ":step" => step(&mut engine),
            ":resume" => engine.debug_resume().map(|_| {
                if let Some(r) = engine.history().last() {
                    print_record(r);
                }
            }),
            ":stop" => {
                engine.debug_stop();
                println!("{}", "Debug session stopped.".yellow());
                Ok(())
            }
            ":vars" => {
                print_vars(&engine);
                Ok(())
            }
            ":history" => history(&engine, &args),
            ":lineage" => lineage(&mut engine, &args),
            ":functions" => {
                print_functions(&engine);
                Ok(())
            }
            _ => {
                println!("{}", "Unknown command. Type :help.".red());
                Ok(())
            }
        };
        if let Err(e) = result {
            render_error(Some(&source), &e);
        }
    }
}

fn print_help() {
    println!("{}", "Commands:".bold());
    let rows = [
        (":load FILE", "Load a program (.xml or .json)"),
        (":show [D]", "List the program at degree D"),
        (":run [D] [X1,X2,..]", "Run at degree D and record the run"),
        (":rerun ID", "Repeat a recorded run"),
        (":debug [D] [X1,X2,..]", "Start a step-by-step session"),
        (":step", "Execute one instruction"),
        (":resume", "Run the session to its end"),
        (":stop", "Abandon the session"),
        (":vars", "Show every cell"),
        (":history [json]", "Show recorded runs"),
        (":lineage D LINE", "Show what a line was expanded from"),
        (":functions", "List loaded functions"),
        (":quit", "Exit the console"),
    ];
    for (cmd, what) in rows {
        println!("  {:<24} {}", cmd.yellow(), what);
    }
}

fn number(args: &[&str], index: usize, what: &str) -> Result<usize> {
    match args.get(index) {
        Some(s) => s
            .parse()
            .map_err(|_| Error::host_misuse(format!("Expected a {}, found '{}'", what, s))),
        None => Err(Error::host_misuse(format!("Missing {}", what))),
    }
}

/// Degree and inputs from `[D] [X1,X2,..]`.
fn degree_and_inputs(args: &[&str]) -> Result<(usize, Vec<u64>)> {
    let degree = if args.is_empty() { 0 } else { number(args, 0, "degree")? };
    let inputs = match args.get(1) {
        Some(text) => parse_inputs(text).map_err(Error::host_misuse)?,
        None => Vec::new(),
    };
    Ok((degree, inputs))
}

fn load(engine: &mut Engine, source: &mut String, args: &[&str]) -> Result<()> {
    let path = match args.first() {
        Some(p) => *p,
        None => return Err(Error::host_misuse("Usage: :load FILE")),
    };
    *source = fs::read_to_string(path).unwrap_or_default();
    engine.load_from_path(path)?;
    println!(
        "{} {} (maximum degree {})",
        "Loaded".green(),
        engine.program_name().unwrap_or("?").bold(),
        engine.max_degree()?
    );
    Ok(())
}

fn show(engine: &mut Engine, args: &[&str]) -> Result<()> {
    let degree = if args.is_empty() { 0 } else { number(args, 0, "degree")? };
    let current = if engine.debug_degree() == Some(degree) { engine.debug_line() } else { None };
    for (i, line) in engine.render(degree)?.iter().enumerate() {
        if current == Some(i + 1) {
            println!("{} {}", ">".green().bold(), line.bold());
        } else {
            println!("  {}", line);
        }
    }
    println!("{}", format!("{} cycles", engine.cycles(degree)?).bright_black());
    Ok(())
}

fn run(engine: &mut Engine, args: &[&str]) -> Result<()> {
    let (degree, inputs) = degree_and_inputs(args)?;
    let record = engine.run_and_record(degree, &inputs)?;
    print_record(&record);
    Ok(())
}

fn debug(engine: &mut Engine, args: &[&str]) -> Result<()> {
    let (degree, inputs) = degree_and_inputs(args)?;
    engine.debug_start(degree, &inputs)?;
    match engine.debug_line() {
        Some(line) => println!("{} at line {}", "Debugging".yellow(), line),
        None => {
            if let Some(r) = engine.history().last() {
                print_record(r);
            }
        }
    }
    Ok(())
}

fn step(engine: &mut Engine) -> Result<()> {
    let degree = engine.debug_degree();
    let step = engine.debug_step()?;
    if let Some(d) = degree {
        if let Some(text) = engine.render(d)?.get(step.line - 1) {
            println!("{}", text);
        }
    }
    print_vars(engine);
    match (step.halt, engine.debug_line()) {
        (Some(halt), _) => {
            println!("{} ({})", "Finished".green(), halt);
            if let Some(r) = engine.history().last() {
                print_record(r);
            }
        }
        (None, Some(next)) => println!("{}", format!("next: line {}", next).bright_black()),
        (None, None) => {}
    }
    Ok(())
}

fn print_vars(engine: &Engine) {
    let cells = engine.variables();
    if cells.is_empty() {
        println!("{}", "<no cells>".dimmed());
        return;
    }
    for (v, n) in cells {
        println!("{} = {}", v.to_string().yellow(), n.to_string().bright_blue());
    }
}

fn print_functions(engine: &Engine) {
    let functions = engine.functions();
    if functions.is_empty() {
        println!("{}", "<no functions>".dimmed());
        return;
    }
    for (name, shown) in functions {
        if name == shown {
            println!("{}", name.yellow());
        } else {
            println!("{} ({})", name.yellow(), shown);
        }
    }
}

fn history(engine: &Engine, args: &[&str]) -> Result<()> {
    if args.first() == Some(&"json") {
        println!("{}", engine.history_json()?);
        return Ok(());
    }
    if engine.history().is_empty() {
        println!("{}", "<no runs>".dimmed());
    }
    for r in engine.history() {
        let inputs: Vec<String> = r.inputs.iter().map(u64::to_string).collect();
        println!(
            "#{:<3} degree {:<2} inputs [{}] -> y = {} ({} cycles)",
            r.id,
            r.degree,
            inputs.join(", "),
            r.y.to_string().bright_blue(),
            r.cycles
        );
    }
    Ok(())
}

fn lineage(engine: &mut Engine, args: &[&str]) -> Result<()> {
    let degree = number(args, 0, "degree")?;
    let line = number(args, 1, "line")?;
    for (i, (d, instr)) in engine.lineage(degree, line)?.iter().enumerate() {
        println!("{}{} #{} {}", "  ".repeat(i), format!("[degree {}]", d).yellow(), instr.line, instr);
    }
    Ok(())
}
