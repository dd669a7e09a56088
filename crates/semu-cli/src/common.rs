use owo_colors::OwoColorize;

use semu_engine::RunRecord;
use semu_syntax::error::Error;

/// Prints `err` to stderr, pointing into `source` when the error has a span.
pub fn render_error(source: Option<&str>, err: &Error) {
    eprintln!("{}: {}", err.kind.title().red().bold(), err.msg.red());
    if let (Some(line), Some(col)) = (err.line, err.col) {
        eprintln!("  --> line {}, column {}", line, col);
        if let Some(src_line) = source.and_then(|s| s.lines().nth(line - 1)) {
            let gutter = format!("{:3} | ", line);
            eprintln!("     |");
            eprintln!("{}{}", gutter.bright_black(), src_line);
            let mut marker = " ".repeat(gutter.len() + col.saturating_sub(1));
            marker.push('^');
            eprintln!("{}{}", marker.red(), " error here".red());
            eprintln!("     |");
        }
    }
    provide_error_suggestions(&err.msg);
}

pub fn provide_error_suggestions(err_msg: &str) {
    if err_msg.contains("Unknown instruction") {
        eprintln!("{}", "Help: instruction names are fixed.".yellow());
        eprintln!(
            "    {}",
            "Basic: INCREASE, DECREASE, JUMP_NOT_ZERO (JNZ), NEUTRAL (NO_OP)".bright_black()
        );
        eprintln!(
            "    {}",
            "Synthetic: ZERO_VARIABLE, GOTO_LABEL, ASSIGNMENT, CONSTANT_ASSIGNMENT, JUMP_ZERO,"
                .bright_black()
        );
        eprintln!(
            "    {}",
            "           JUMP_EQUAL_CONSTANT, JUMP_EQUAL_VARIABLE, QUOTE, JUMP_EQUAL_FUNCTION"
                .bright_black()
        );
    } else if err_msg.contains("undefined label") {
        eprintln!("{}", "Help: every jump target must be a label some instruction carries, or EXIT.".yellow());
    } else if err_msg.contains("Unknown function") {
        eprintln!("{}", "Help: QUOTE can only call functions defined in the same file.".yellow());
        eprintln!(
            "    {}",
            "Example: <S-Functions><S-Function name=\"Const3\">...</S-Function></S-Functions>".bright_black()
        );
    } else if err_msg.contains("Recursive QUOTE") {
        eprintln!("{}", "Help: a function may not QUOTE itself, directly or through other functions.".yellow());
    } else if err_msg.contains("requires the") {
        eprintln!("{}", "Help: add the missing argument under <S-Instruction-Arguments>.".yellow());
        eprintln!(
            "    {}",
            "Example: <S-Instruction-Argument name=\"JNZLabel\" value=\"L1\"/>".bright_black()
        );
    } else if err_msg.contains("requires a variable") {
        eprintln!("{}", "Help: add an <S-Variable> element, e.g. <S-Variable>x1</S-Variable>.".yellow());
    } else if err_msg.contains("more than one instruction") {
        eprintln!("{}", "Help: each label may mark only one instruction of a program.".yellow());
    } else if err_msg.contains("exceeds the maximum degree") {
        eprintln!("{}", "Help: use `semu show FILE` to see the maximum degree.".yellow());
    } else if err_msg.contains("No program is loaded") {
        eprintln!("{}", "Help: load a program first with :load FILE".yellow());
    } else if err_msg.contains("debug session is active") {
        eprintln!("{}", "Help: finish the session with :resume or abandon it with :stop".yellow());
    } else if err_msg.contains("Unterminated") || err_msg.contains("Expected") {
        eprintln!("{}", "Help: the file is not well-formed XML.".yellow());
        eprintln!("    {}", "Check that every element is closed and every attribute is quoted".bright_black());
    } else if err_msg.contains("Not an .xml or .json file") {
        eprintln!("{}", "Help: program files end in .xml (or .json for the JSON form).".yellow());
    }
}

/// Parses `1,2,3` into input values for `x1, x2, x3`.
pub fn parse_inputs(text: &str) -> Result<Vec<u64>, String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u64>()
                .map_err(|_| format!("Input values must be non-negative integers, found '{}'", s))
        })
        .collect()
}

pub fn print_record(record: &RunRecord) {
    println!("y = {}", record.y);
    println!(
        "{}",
        format!(
            "run #{} at degree {}: {} cycles executed, {} static, halted at {}",
            record.id, record.degree, record.executed_cycles, record.cycles, record.halt
        )
        .bright_black()
    );
}
