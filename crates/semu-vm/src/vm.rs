//! Interpreter core.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use semu_program::{quote_overhead, Analyzer, Label, Op, Program, Repository, Variable};
use semu_syntax::error::{misuse, Result};

use crate::store::VarStore;

/// Why a run stopped. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Halt {
    /// A jump to EXIT.
    Exit,
    /// Fell through past the last instruction.
    FellOff,
    /// A jump to a label no instruction carries.
    UnknownLabel(Label),
    /// The host's step budget ran out.
    StepLimit,
}

impl fmt::Display for Halt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Halt::Exit => write!(f, "exit"),
            Halt::FellOff => write!(f, "end of program"),
            Halt::UnknownLabel(l) => write!(f, "jump to undefined label {}", l),
            Halt::StepLimit => write!(f, "step limit"),
        }
    }
}

/// Execution position of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    /// 0-based index of the next instruction.
    pub pc: usize,
    /// Cycles executed so far.
    pub cycles: u64,
    pub steps: u64,
    pub limit: Option<u64>,
    pub halted: Option<Halt>,
}

impl Cursor {
    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    /// 1-based line of the next instruction, while running.
    pub fn line(&self) -> Option<usize> {
        if self.is_halted() {
            None
        } else {
            Some(self.pc + 1)
        }
    }
}

/// What one step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// 1-based line that was executed.
    pub line: usize,
    /// Label outcome: `Empty` falls through, anything else is a jump.
    pub outcome: Label,
    pub cycles: u64,
    pub halt: Option<Halt>,
}

/// Result of a run to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub y: u64,
    pub cycles: u64,
    pub steps: u64,
    pub halt: Halt,
}

pub struct Vm<'a> {
    program: &'a Program,
    repo: &'a Repository,
    costs: Vec<u64>,
    /// Prepared callees, built on their first call.
    callees: RefCell<HashMap<String, Rc<Vm<'a>>>>,
}

impl<'a> Vm<'a> {
    /// Prepares `program` for execution; QUOTE callees must resolve in `repo`.
    pub fn new(program: &'a Program, repo: &'a Repository) -> Result<Self> {
        let mut analyzer = Analyzer::new(repo);
        let costs = program
            .instructions
            .iter()
            .map(|i| analyzer.cycles(&i.op))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { program, repo, costs, callees: RefCell::new(HashMap::new()) })
    }

    pub fn program(&self) -> &Program {
        self.program
    }

    /// Static cycle cost of the instruction at `pos`.
    pub fn cost(&self, pos: usize) -> u64 {
        self.costs.get(pos).copied().unwrap_or(0)
    }

    /// Zeroes `y` and the temps and returns a cursor on the first instruction.
    pub fn start(&self, store: &mut VarStore, limit: Option<u64>) -> Cursor {
        store.reset_work_cells();
        Cursor {
            pc: 0,
            cycles: 0,
            steps: 0,
            limit,
            halted: if self.program.is_empty() { Some(Halt::FellOff) } else { None },
        }
    }

    /// Runs from the first instruction until the program halts.
    pub fn run(&self, store: &mut VarStore, limit: Option<u64>) -> Result<Run> {
        let mut cursor = self.start(store, limit);
        while !cursor.is_halted() {
            self.step(store, &mut cursor)?;
        }
        Ok(Run {
            y: store.get(Variable::Y),
            cycles: cursor.cycles,
            steps: cursor.steps,
            halt: cursor.halted.unwrap_or(Halt::FellOff),
        })
    }

    /// Executes the instruction under the cursor and moves the cursor.
    pub fn step(&self, store: &mut VarStore, cursor: &mut Cursor) -> Result<Step> {
        if let Some(h) = cursor.halted {
            return misuse(format!("'{}' has already halted ({})", self.program.name, h));
        }
        let pos = cursor.pc;
        let line = pos + 1;
        if cursor.limit.map_or(false, |l| cursor.steps >= l) {
            cursor.halted = Some(Halt::StepLimit);
            return Ok(Step { line, outcome: Label::Empty, cycles: 0, halt: cursor.halted });
        }
        let instr = &self.program.instructions[pos];
        cursor.steps += 1;

        let (outcome, cycles) = match &instr.op {
            Op::Quote { dst, function, args } => {
                match self.call(function, args, store, cursor)? {
                    Some((value, cycles)) => {
                        store.set(*dst, value);
                        (Label::Empty, cycles)
                    }
                    None => return Ok(self.stop(cursor, line)),
                }
            }
            Op::JumpEqualFunction { var, function, args, target } => {
                match self.call(function, args, store, cursor)? {
                    Some((value, cycles)) => {
                        let outcome = if store.get(*var) == value { *target } else { Label::Empty };
                        (outcome, cycles + 2)
                    }
                    None => return Ok(self.stop(cursor, line)),
                }
            }
            op => (execute(op, store), self.cost(pos)),
        };
        cursor.cycles += cycles;
        trace!(line, op = %instr.op, %outcome, cycles, "step");

        let halt = match outcome {
            Label::Empty => {
                cursor.pc += 1;
                if cursor.pc >= self.program.len() {
                    Some(Halt::FellOff)
                } else {
                    None
                }
            }
            Label::Exit => Some(Halt::Exit),
            target => match self.program.position_of(target) {
                Some(p) => {
                    cursor.pc = p;
                    None
                }
                None => {
                    warn!(program = %self.program.name, line, label = %target, "jump to undefined label");
                    Some(Halt::UnknownLabel(target))
                }
            },
        };
        cursor.halted = halt;
        Ok(Step { line, outcome, cycles, halt })
    }

    fn stop(&self, cursor: &mut Cursor, line: usize) -> Step {
        cursor.halted = Some(Halt::StepLimit);
        Step { line, outcome: Label::Empty, cycles: 0, halt: cursor.halted }
    }

    /// Evaluates a callee in a fresh store with `x_n` bound to the n-th argument.
    ///
    /// Returns the callee's `y` and the cycles charged, or `None` when the step
    /// budget ran out inside the callee.
    fn call(
        &self,
        function: &str,
        args: &[Variable],
        store: &VarStore,
        cursor: &mut Cursor,
    ) -> Result<Option<(u64, u64)>> {
        let vm = self.callee(function)?;
        let mut inner = VarStore::new();
        for (n, a) in args.iter().enumerate() {
            inner.set(Variable::input(n as u32 + 1), store.get(*a));
        }
        let limit = cursor.limit.map(|l| l.saturating_sub(cursor.steps));
        let run = vm.run(&mut inner, limit)?;
        cursor.steps += run.steps;
        if run.halt == Halt::StepLimit {
            return Ok(None);
        }
        Ok(Some((run.y, quote_overhead(vm.program) + run.cycles)))
    }

    fn callee(&self, function: &str) -> Result<Rc<Vm<'a>>> {
        if let Some(vm) = self.callees.borrow().get(function) {
            return Ok(Rc::clone(vm));
        }
        let repo = self.repo;
        let callee = match repo.get(function) {
            Some(p) => p,
            None => return misuse(format!("Function '{}' is no longer in the repository", function)),
        };
        let vm = Rc::new(Vm::new(callee, repo)?);
        self.callees.borrow_mut().insert(function.to_string(), Rc::clone(&vm));
        Ok(vm)
    }

    /// Number of callees prepared so far.
    #[cfg(test)]
    pub(crate) fn prepared_callees(&self) -> usize {
        self.callees.borrow().len()
    }
}

/// Applies one non-calling operation to `store` and returns its label outcome.
pub fn execute(op: &Op, store: &mut VarStore) -> Label {
    let jump_if = |cond: bool, target: &Label| if cond { *target } else { Label::Empty };
    match op {
        Op::Increase(v) => {
            store.increase(*v);
            Label::Empty
        }
        Op::Decrease(v) => {
            store.decrease(*v);
            Label::Empty
        }
        Op::Neutral(_) => Label::Empty,
        Op::JumpNotZero(v, l) => jump_if(store.get(*v) != 0, l),
        Op::ZeroVariable(v) => {
            store.set(*v, 0);
            Label::Empty
        }
        Op::ConstantAssignment(v, k) => {
            store.set(*v, *k);
            Label::Empty
        }
        Op::Assignment { dst, src } => {
            let value = store.get(*src);
            store.set(*dst, value);
            Label::Empty
        }
        Op::GoToLabel(l) => *l,
        Op::JumpZero(v, l) => jump_if(store.get(*v) == 0, l),
        Op::JumpEqualConstant(v, k, l) => jump_if(store.get(*v) == *k, l),
        Op::JumpEqualVariable(a, b, l) => jump_if(store.get(*a) == store.get(*b), l),
        // Calls need the repository; `Vm::step` handles them.
        Op::Quote { .. } | Op::JumpEqualFunction { .. } => Label::Empty,
    }
}
