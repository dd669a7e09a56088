//! Synthetic depth and static cycle cost.
//!
//! Both are defined by expansion: a synthetic operation has depth one more
//! than the deepest instruction it expands to, and costs exactly what the
//! instructions it expands to cost. QUOTE-like operations depend on their
//! callee, so every query goes through the [`Repository`] and rejects unknown
//! or recursive callees.

use std::collections::HashMap;

use semu_syntax::error::{invalid, Result};

use crate::instruction::Op;
use crate::program::Program;
use crate::repository::Repository;

/// Cost of the argument copies, state reset and output delivery that wrap an
/// inlined callee body.
pub fn quote_overhead(callee: &Program) -> u64 {
    let inputs = callee.inputs().len() as u64;
    let temps = callee.temps().len() as u64;
    4 * inputs + (temps + 1) + 4
}

#[derive(Debug, Clone, Copy)]
struct Metrics {
    degree: usize,
    cycles: u64,
}

/// Walks callee chains with a recursion guard, memoizing per program name.
pub struct Analyzer<'a> {
    repo: &'a Repository,
    stack: Vec<String>,
    memo: HashMap<String, Metrics>,
}

impl<'a> Analyzer<'a> {
    pub fn new(repo: &'a Repository) -> Self {
        Self {
            repo,
            stack: Vec::new(),
            memo: HashMap::new(),
        }
    }

    fn callee(&mut self, name: &str) -> Result<Metrics> {
        if let Some(m) = self.memo.get(name) {
            return Ok(*m);
        }
        if self.stack.iter().any(|n| n == name) {
            let mut chain = self.stack.join(" -> ");
            chain.push_str(" -> ");
            chain.push_str(name);
            return invalid(format!("Recursive QUOTE: {}", chain));
        }
        let repo = self.repo;
        let program = match repo.get(name) {
            Some(p) => p,
            None => {
                let caller = self.stack.last().map(String::as_str).unwrap_or("?");
                return invalid(format!(
                    "Unknown function '{}' quoted by '{}'",
                    name, caller
                ));
            }
        };
        let m = self.metrics(program)?;
        self.memo.insert(name.to_string(), m);
        Ok(m)
    }

    fn metrics(&mut self, program: &Program) -> Result<Metrics> {
        self.stack.push(program.name.clone());
        let mut degree = 0;
        let mut cycles = 0u64;
        for instr in &program.instructions {
            match self.op(&instr.op) {
                Ok((d, c)) => {
                    degree = degree.max(d);
                    cycles = cycles.saturating_add(c);
                }
                Err(e) => {
                    self.stack.pop();
                    return Err(e);
                }
            }
        }
        self.stack.pop();
        Ok(Metrics { degree, cycles })
    }

    /// `(depth, cycles)` of one operation.
    fn op(&mut self, op: &Op) -> Result<(usize, u64)> {
        let depth = match op {
            Op::Increase(_) | Op::Decrease(_) | Op::Neutral(_) | Op::JumpNotZero(..) => 0,
            Op::ZeroVariable(_) | Op::GoToLabel(_) => 1,
            Op::ConstantAssignment(_, 0) => 1,
            Op::ConstantAssignment(..) => 2,
            Op::Assignment { dst, src } if dst == src => 1,
            Op::Assignment { .. } | Op::JumpZero(..) => 2,
            Op::JumpEqualConstant(..) | Op::JumpEqualVariable(..) => 3,
            Op::Quote { function, .. } | Op::JumpEqualFunction { function, .. } => {
                let repo = self.repo;
                let m = self.callee(function)?;
                let overhead = repo.get(function).map(quote_overhead).unwrap_or(0);
                let quote_depth = 1 + m.degree.max(2);
                let quote_cycles = overhead.saturating_add(m.cycles);
                return Ok(match op {
                    Op::Quote { .. } => (quote_depth, quote_cycles),
                    _ => (1 + quote_depth.max(3), quote_cycles.saturating_add(2)),
                });
            }
        };
        // Only QUOTE-like operations lack a base cost, and they returned above.
        Ok((depth, op.base_cycles().unwrap_or(0)))
    }

    /// Synthetic depth of one operation.
    pub fn depth(&mut self, op: &Op) -> Result<usize> {
        self.op(op).map(|(d, _)| d)
    }

    /// Static cycle cost of one operation.
    pub fn cycles(&mut self, op: &Op) -> Result<u64> {
        self.op(op).map(|(_, c)| c)
    }

    /// Deepest synthetic depth in `program`; the number of expansion rounds
    /// needed to reach a basics-only program.
    pub fn max_degree(&mut self, program: &Program) -> Result<usize> {
        self.metrics(program).map(|m| m.degree)
    }

    /// Sum of the static cycle costs of every instruction in `program`.
    pub fn program_cycles(&mut self, program: &Program) -> Result<u64> {
        self.metrics(program).map(|m| m.cycles)
    }
}

/// Checks that every QUOTE callee reachable from `program` exists and that no
/// call chain returns to a program already on it.
pub fn check_calls(program: &Program, repo: &Repository) -> Result<()> {
    Analyzer::new(repo).metrics(program).map(|_| ())
}

pub fn max_degree(program: &Program, repo: &Repository) -> Result<usize> {
    Analyzer::new(repo).max_degree(program)
}

pub fn program_cycles(program: &Program, repo: &Repository) -> Result<u64> {
    Analyzer::new(repo).program_cycles(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::Instruction;
    use crate::label::Label;
    use crate::variable::Variable;
    use semu_syntax::ErrorKind;

    fn program(name: &str, ops: Vec<Op>) -> Program {
        Program::new(name, ops.into_iter().map(Instruction::unlabeled).collect())
    }

    fn quote(function: &str, args: Vec<Variable>) -> Op {
        Op::Quote { dst: Variable::Y, function: function.into(), args }
    }

    #[test]
    fn depths_of_plain_operations() {
        let repo = Repository::new();
        let mut a = Analyzer::new(&repo);
        let x1 = Variable::input(1);
        assert_eq!(a.depth(&Op::Increase(x1)).unwrap(), 0);
        assert_eq!(a.depth(&Op::ZeroVariable(x1)).unwrap(), 1);
        assert_eq!(a.depth(&Op::ConstantAssignment(x1, 0)).unwrap(), 1);
        assert_eq!(a.depth(&Op::ConstantAssignment(x1, 4)).unwrap(), 2);
        assert_eq!(a.depth(&Op::Assignment { dst: x1, src: x1 }).unwrap(), 1);
        assert_eq!(a.depth(&Op::Assignment { dst: Variable::Y, src: x1 }).unwrap(), 2);
        assert_eq!(a.depth(&Op::JumpEqualConstant(x1, 2, Label::Exit)).unwrap(), 3);
    }

    #[test]
    fn quote_costs_follow_the_callee() {
        let mut repo = Repository::new();
        repo.register(program("Const3", vec![Op::ConstantAssignment(Variable::Y, 3)]));
        repo.register(program(
            "Id",
            vec![Op::Assignment { dst: Variable::Y, src: Variable::input(1) }],
        ));
        let main = program("Main", vec![quote("Const3", vec![])]);

        // 0 inputs, 0 temps: (0 + 1) + 2 + 4
        assert_eq!(program_cycles(&main, &repo).unwrap(), 7);
        assert_eq!(max_degree(&main, &repo).unwrap(), 3);

        let jef = Op::JumpEqualFunction {
            var: Variable::input(1),
            function: "Id".into(),
            args: vec![Variable::input(1)],
            target: Label::Exit,
        };
        let mut a = Analyzer::new(&repo);
        // Quote: 4 + 1 + 4 + 4 = 13, plus the variable comparison
        assert_eq!(a.cycles(&jef).unwrap(), 15);
        assert_eq!(a.depth(&jef).unwrap(), 4);
    }

    #[test]
    fn rejects_unknown_and_recursive_callees() {
        let mut repo = Repository::new();
        let err = max_degree(&program("Main", vec![quote("Nope", vec![])]), &repo).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidProgram);
        assert!(err.msg.contains("Unknown function 'Nope'"));

        repo.register(program("A", vec![quote("B", vec![])]));
        repo.register(program("B", vec![quote("A", vec![])]));
        let err = check_calls(&program("Main", vec![quote("A", vec![])]), &repo).unwrap_err();
        assert!(err.msg.contains("Recursive QUOTE: Main -> A -> B -> A"), "{}", err.msg);
    }
}
