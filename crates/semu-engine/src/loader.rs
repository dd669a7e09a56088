//! Maps a [`ProgramDoc`] onto typed programs.

use std::collections::BTreeMap;

use semu_program::{Instruction, Label, Op, Program, VarKind, Variable};
use semu_syntax::ast::{InstructionDoc, ProgramDoc};
use semu_syntax::error::{Error, Result};

/// Every program of one document, not yet validated against each other.
#[derive(Debug, Clone)]
pub struct LoadedDoc {
    pub main: Program,
    pub functions: Vec<Program>,
    /// Function name -> user-facing string.
    pub display_names: BTreeMap<String, String>,
}

/// Builds typed programs from `doc`; the first error wins.
pub fn load_document(doc: &ProgramDoc) -> Result<LoadedDoc> {
    let main = load_program(&doc.name, &doc.instructions)?;
    let mut functions = Vec::with_capacity(doc.functions.len());
    let mut display_names = BTreeMap::new();
    for f in &doc.functions {
        if f.name == doc.name || display_names.contains_key(&f.name) {
            return Err(Error::new(format!("Function '{}' is defined twice", f.name)));
        }
        display_names.insert(f.name.clone(), f.display_name().to_string());
        functions.push(load_program(&f.name, &f.instructions)?);
    }
    Ok(LoadedDoc { main, functions, display_names })
}

/// Builds one program and rejects duplicate self-labels.
pub fn load_program(name: &str, docs: &[InstructionDoc]) -> Result<Program> {
    let mut vars = Interner::new(docs);
    let code = docs
        .iter()
        .map(|d| instruction(d, &mut vars).map_err(|e| e.at(d.line, d.col)))
        .collect::<Result<Vec<_>>>()?;
    let program = Program::new(name, code).with_aliases(vars.aliases);
    if let Some((line, label)) = program.duplicate_labels().first() {
        let d = &docs[line - 1];
        return Err(Error::new(format!(
            "Label {} is used by more than one instruction of '{}'",
            label, name
        ))
        .at(d.line, d.col));
    }
    Ok(program)
}

/// Resolves variable tokens, interning unknown ones as fresh inputs.
struct Interner {
    aliases: BTreeMap<String, Variable>,
    next_input: u32,
}

impl Interner {
    fn new(docs: &[InstructionDoc]) -> Self {
        // Declared inputs come first so interned names never shadow them.
        let declared = docs
            .iter()
            .flat_map(|d| {
                d.variable
                    .iter()
                    .map(String::as_str)
                    .chain(d.argument("assignedVariable"))
                    .chain(d.argument("variableName"))
                    .chain(d.argument("functionArguments").into_iter().flat_map(|a| a.split(',')))
            })
            .filter_map(Variable::parse)
            .filter(|v| v.kind == VarKind::Input)
            .map(|v| v.index)
            .max()
            .unwrap_or(0);
        Self {
            aliases: BTreeMap::new(),
            next_input: declared,
        }
    }

    fn resolve(&mut self, token: &str) -> Result<Variable> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::new("Empty variable name"));
        }
        if let Some(v) = Variable::parse(token) {
            return Ok(v);
        }
        let key = token.to_ascii_lowercase();
        if let Some(v) = self.aliases.get(&key) {
            return Ok(*v);
        }
        self.next_input += 1;
        let v = Variable::input(self.next_input);
        self.aliases.insert(key, v);
        Ok(v)
    }
}

fn canonical_name(name: &str) -> Option<&'static str> {
    Some(match name.trim().to_ascii_uppercase().as_str() {
        "INCREASE" => "INCREASE",
        "DECREASE" => "DECREASE",
        "JUMP_NOT_ZERO" | "JNZ" => "JUMP_NOT_ZERO",
        "NEUTRAL" | "NO_OP" => "NEUTRAL",
        "ZERO_VARIABLE" => "ZERO_VARIABLE",
        "GOTO_LABEL" => "GOTO_LABEL",
        "ASSIGNMENT" => "ASSIGNMENT",
        "CONSTANT_ASSIGNMENT" => "CONSTANT_ASSIGNMENT",
        "JUMP_ZERO" => "JUMP_ZERO",
        "JUMP_EQUAL_CONSTANT" => "JUMP_EQUAL_CONSTANT",
        "JUMP_EQUAL_VARIABLE" => "JUMP_EQUAL_VARIABLE",
        "QUOTE" => "QUOTE",
        "JUMP_EQUAL_FUNCTION" => "JUMP_EQUAL_FUNCTION",
        _ => return None,
    })
}

fn required<'d>(d: &'d InstructionDoc, kind: &str, arg: &str) -> Result<&'d str> {
    match d.argument(arg).map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::new(format!("{} requires the '{}' argument", kind, arg))),
    }
}

fn target(d: &InstructionDoc, kind: &str, arg: &str) -> Result<Label> {
    let raw = required(d, kind, arg)?;
    match Label::parse(raw)? {
        Label::Empty => Err(Error::new(format!("Invalid jump target '{}' in {}", raw, kind))),
        l => Ok(l),
    }
}

/// Largest `constantValue` accepted; expansion emits one instruction per unit.
pub const MAX_CONSTANT: u64 = 1_000_000;

fn constant(d: &InstructionDoc, kind: &str) -> Result<u64> {
    let raw = required(d, kind, "constantValue")?;
    let k = raw
        .parse::<u64>()
        .map_err(|_| Error::new(format!("constantValue must be a non-negative integer, found '{}'", raw)))?;
    if k > MAX_CONSTANT {
        return Err(Error::new(format!(
            "constantValue {} is larger than the maximum of {}",
            k, MAX_CONSTANT
        )));
    }
    Ok(k)
}

fn primary(d: &InstructionDoc, kind: &str, vars: &mut Interner) -> Result<Variable> {
    match d.variable.as_deref() {
        Some(v) if !v.trim().is_empty() => vars.resolve(v),
        _ => Err(Error::new(format!("{} requires a variable", kind))),
    }
}

fn instruction(d: &InstructionDoc, vars: &mut Interner) -> Result<Instruction> {
    let kind = canonical_name(&d.name)
        .ok_or_else(|| Error::new(format!("Unknown instruction '{}'", d.name.trim())))?;
    let label = match &d.label {
        Some(l) => Label::parse(l)?,
        None => Label::Empty,
    };
    let op = match kind {
        "INCREASE" => Op::Increase(primary(d, kind, vars)?),
        "DECREASE" => Op::Decrease(primary(d, kind, vars)?),
        "NEUTRAL" => Op::Neutral(primary(d, kind, vars)?),
        "JUMP_NOT_ZERO" => Op::JumpNotZero(primary(d, kind, vars)?, target(d, kind, "JNZLabel")?),
        "ZERO_VARIABLE" => Op::ZeroVariable(primary(d, kind, vars)?),
        "GOTO_LABEL" => Op::GoToLabel(target(d, kind, "gotoLabel")?),
        "ASSIGNMENT" => {
            let dst = primary(d, kind, vars)?;
            let src = vars.resolve(required(d, kind, "assignedVariable")?)?;
            Op::Assignment { dst, src }
        }
        "CONSTANT_ASSIGNMENT" => Op::ConstantAssignment(primary(d, kind, vars)?, constant(d, kind)?),
        "JUMP_ZERO" => Op::JumpZero(primary(d, kind, vars)?, target(d, kind, "JZLabel")?),
        "JUMP_EQUAL_CONSTANT" => Op::JumpEqualConstant(
            primary(d, kind, vars)?,
            constant(d, kind)?,
            target(d, kind, "JEConstantLabel")?,
        ),
        "JUMP_EQUAL_VARIABLE" => {
            let a = primary(d, kind, vars)?;
            let b = vars.resolve(required(d, kind, "variableName")?)?;
            Op::JumpEqualVariable(a, b, target(d, kind, "JEVariableLabel")?)
        }
        "QUOTE" => {
            let dst = primary(d, kind, vars)?;
            let function = required(d, kind, "functionName")?.to_string();
            let args = arguments(d, vars)?;
            Op::Quote { dst, function, args }
        }
        _ => {
            let var = primary(d, kind, vars)?;
            let function = required(d, kind, "functionName")?.to_string();
            let args = arguments(d, vars)?;
            let jump = target(d, kind, "JEFunctionLabel")?;
            Op::JumpEqualFunction { var, function, args, target: jump }
        }
    };
    Ok(Instruction::new(label, op))
}

fn arguments(d: &InstructionDoc, vars: &mut Interner) -> Result<Vec<Variable>> {
    d.argument("functionArguments")
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(|a| vars.resolve(a))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use semu_syntax::ErrorKind;

    fn instr(name: &str) -> InstructionDoc {
        InstructionDoc::new(name)
    }

    #[test]
    fn maps_every_kind() {
        let docs = vec![
            instr("increase").with_variable("X1").with_label("L1"),
            instr("JNZ").with_variable("x1").with_argument("JNZLabel", "L1"),
            instr("NO_OP").with_variable("y"),
            instr("GOTO_LABEL").with_argument("gotoLabel", "EXIT"),
            instr("ASSIGNMENT").with_variable("y").with_argument("assignedVariable", "z2"),
            instr("CONSTANT_ASSIGNMENT").with_variable("y").with_argument("constantValue", "4"),
            instr("JUMP_EQUAL_VARIABLE")
                .with_variable("x1")
                .with_argument("variableName", "x2")
                .with_argument("JEVariableLabel", "l1"),
            instr("QUOTE")
                .with_variable("z1")
                .with_argument("functionName", "Id")
                .with_argument("functionArguments", "x2, x1"),
        ];
        let p = load_program("All", &docs).unwrap();
        let rendered: Vec<String> = p.instructions.iter().map(|i| i.to_string()).collect();
        assert_eq!(
            rendered,
            [
                "L1: x1 <- x1 + 1",
                "IF x1 != 0 GOTO L1",
                "y <- y",
                "GOTO EXIT",
                "y <- z2",
                "y <- 4",
                "IF x1 = x2 GOTO L1",
                "z1 <- (Id,x2,x1)",
            ]
        );
    }

    #[test]
    fn interns_unknown_names_above_declared_inputs() {
        let docs = vec![
            instr("INCREASE").with_variable("counter"),
            instr("ASSIGNMENT").with_variable("y").with_argument("assignedVariable", "x3"),
            instr("DECREASE").with_variable("Counter"),
            instr("INCREASE").with_variable("x0"),
        ];
        let p = load_program("Names", &docs).unwrap();
        assert_eq!(p.instructions[0].op, Op::Increase(Variable::input(4)));
        assert_eq!(p.instructions[2].op, Op::Decrease(Variable::input(4)));
        assert_eq!(p.instructions[3].op, Op::Increase(Variable::input(5)));
        assert_eq!(p.resolve_name("counter"), Some(Variable::input(4)));
        assert_eq!(p.resolve_name("X0"), Some(Variable::input(5)));
    }

    #[test]
    fn reports_errors_with_positions() {
        let mut bad = instr("FLY").with_variable("y");
        bad.line = Some(7);
        bad.col = Some(5);
        let err = load_program("Bad", &[bad]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Load);
        assert_eq!((err.line, err.col), (Some(7), Some(5)));
        assert!(err.msg.contains("Unknown instruction 'FLY'"));

        let err = load_program("Bad", &[instr("INCREASE")]).unwrap_err();
        assert!(err.msg.contains("requires a variable"));

        let missing = instr("JUMP_ZERO").with_variable("x1");
        let err = load_program("Bad", &[missing]).unwrap_err();
        assert!(err.msg.contains("'JZLabel'"));

        let negative = instr("CONSTANT_ASSIGNMENT").with_variable("y").with_argument("constantValue", "-2");
        assert!(load_program("Bad", &[negative]).is_err());

        let mut huge = instr("JUMP_EQUAL_CONSTANT")
            .with_variable("x1")
            .with_argument("constantValue", "1000000000000")
            .with_argument("JEConstantLabel", "EXIT");
        huge.line = Some(3);
        huge.col = Some(9);
        let err = load_program("Bad", &[huge]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Load);
        assert_eq!((err.line, err.col), (Some(3), Some(9)));
        assert!(err.msg.contains("larger than the maximum"));
        let largest = instr("CONSTANT_ASSIGNMENT")
            .with_variable("y")
            .with_argument("constantValue", MAX_CONSTANT.to_string());
        assert!(load_program("Big", &[largest]).is_ok());

        let bad_label = instr("INCREASE").with_variable("y").with_label("Lx");
        assert!(load_program("Bad", &[bad_label]).is_err());

        let dup = vec![
            instr("INCREASE").with_variable("y").with_label("L1"),
            instr("DECREASE").with_variable("y").with_label("L1"),
        ];
        let err = load_program("Dup", &dup).unwrap_err();
        assert!(err.msg.contains("Label L1"));
    }
}
