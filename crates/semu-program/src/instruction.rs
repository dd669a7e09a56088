//! Instruction set of the S-language.

use std::fmt;

use crate::label::Label;
use crate::variable::Variable;

/// One operation with its operands.
///
/// The first four variants are basic; every other variant is synthetic and is
/// defined by its expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Increase(Variable),
    Decrease(Variable),
    Neutral(Variable),
    JumpNotZero(Variable, Label),

    ZeroVariable(Variable),
    ConstantAssignment(Variable, u64),
    Assignment { dst: Variable, src: Variable },
    GoToLabel(Label),
    JumpZero(Variable, Label),
    JumpEqualConstant(Variable, u64, Label),
    JumpEqualVariable(Variable, Variable, Label),

    // Calls into another program of the repository
    Quote { dst: Variable, function: String, args: Vec<Variable> },
    JumpEqualFunction { var: Variable, function: String, args: Vec<Variable>, target: Label },
}

impl Op {
    /// Canonical upper-case name, as used in program descriptions.
    pub fn name(&self) -> &'static str {
        match self {
            Op::Increase(_) => "INCREASE",
            Op::Decrease(_) => "DECREASE",
            Op::Neutral(_) => "NEUTRAL",
            Op::JumpNotZero(..) => "JUMP_NOT_ZERO",
            Op::ZeroVariable(_) => "ZERO_VARIABLE",
            Op::ConstantAssignment(..) => "CONSTANT_ASSIGNMENT",
            Op::Assignment { .. } => "ASSIGNMENT",
            Op::GoToLabel(_) => "GOTO_LABEL",
            Op::JumpZero(..) => "JUMP_ZERO",
            Op::JumpEqualConstant(..) => "JUMP_EQUAL_CONSTANT",
            Op::JumpEqualVariable(..) => "JUMP_EQUAL_VARIABLE",
            Op::Quote { .. } => "QUOTE",
            Op::JumpEqualFunction { .. } => "JUMP_EQUAL_FUNCTION",
        }
    }

    pub fn is_basic(&self) -> bool {
        matches!(
            self,
            Op::Increase(_) | Op::Decrease(_) | Op::Neutral(_) | Op::JumpNotZero(..)
        )
    }

    /// Static cycle cost, or `None` for QUOTE-like operations whose cost
    /// depends on the callee.
    pub fn base_cycles(&self) -> Option<u64> {
        match self {
            Op::Increase(_) | Op::Decrease(_) => Some(1),
            Op::Neutral(_) => Some(0),
            Op::JumpNotZero(..) => Some(2),
            Op::ZeroVariable(_) => Some(1),
            Op::ConstantAssignment(..) => Some(2),
            Op::Assignment { .. } => Some(4),
            Op::GoToLabel(_) => Some(1),
            Op::JumpZero(..) | Op::JumpEqualConstant(..) | Op::JumpEqualVariable(..) => Some(2),
            Op::Quote { .. } | Op::JumpEqualFunction { .. } => None,
        }
    }

    /// Variables referenced by this operation, in operand order.
    pub fn variables(&self) -> Vec<Variable> {
        match self {
            Op::Increase(v)
            | Op::Decrease(v)
            | Op::Neutral(v)
            | Op::JumpNotZero(v, _)
            | Op::ZeroVariable(v)
            | Op::ConstantAssignment(v, _)
            | Op::JumpZero(v, _)
            | Op::JumpEqualConstant(v, _, _) => vec![*v],
            Op::Assignment { dst, src } => vec![*dst, *src],
            Op::JumpEqualVariable(a, b, _) => vec![*a, *b],
            Op::GoToLabel(_) => Vec::new(),
            Op::Quote { dst, args, .. } => std::iter::once(*dst).chain(args.iter().copied()).collect(),
            Op::JumpEqualFunction { var, args, .. } => {
                std::iter::once(*var).chain(args.iter().copied()).collect()
            }
        }
    }

    /// The jump target, if this operation can jump.
    pub fn target(&self) -> Option<Label> {
        match self {
            Op::JumpNotZero(_, l)
            | Op::GoToLabel(l)
            | Op::JumpZero(_, l)
            | Op::JumpEqualConstant(_, _, l)
            | Op::JumpEqualVariable(_, _, l) => Some(*l),
            Op::JumpEqualFunction { target, .. } => Some(*target),
            _ => None,
        }
    }

    /// Name of the program this operation calls.
    pub fn callee(&self) -> Option<&str> {
        match self {
            Op::Quote { function, .. } | Op::JumpEqualFunction { function, .. } => Some(function),
            _ => None,
        }
    }

    /// Rebuilds the operation with every variable and target rewritten.
    pub fn remap(
        &self,
        mut var: impl FnMut(Variable) -> Variable,
        mut label: impl FnMut(Label) -> Label,
    ) -> Op {
        match self {
            Op::Increase(v) => Op::Increase(var(*v)),
            Op::Decrease(v) => Op::Decrease(var(*v)),
            Op::Neutral(v) => Op::Neutral(var(*v)),
            Op::JumpNotZero(v, l) => Op::JumpNotZero(var(*v), label(*l)),
            Op::ZeroVariable(v) => Op::ZeroVariable(var(*v)),
            Op::ConstantAssignment(v, k) => Op::ConstantAssignment(var(*v), *k),
            Op::Assignment { dst, src } => Op::Assignment { dst: var(*dst), src: var(*src) },
            Op::GoToLabel(l) => Op::GoToLabel(label(*l)),
            Op::JumpZero(v, l) => Op::JumpZero(var(*v), label(*l)),
            Op::JumpEqualConstant(v, k, l) => Op::JumpEqualConstant(var(*v), *k, label(*l)),
            Op::JumpEqualVariable(a, b, l) => Op::JumpEqualVariable(var(*a), var(*b), label(*l)),
            Op::Quote { dst, function, args } => Op::Quote {
                dst: var(*dst),
                function: function.clone(),
                args: args.iter().map(|a| var(*a)).collect(),
            },
            Op::JumpEqualFunction { var: v, function, args, target } => Op::JumpEqualFunction {
                var: var(*v),
                function: function.clone(),
                args: args.iter().map(|a| var(*a)).collect(),
                target: label(*target),
            },
        }
    }
}

fn call(f: &mut fmt::Formatter<'_>, function: &str, args: &[Variable]) -> fmt::Result {
    write!(f, "({}", function)?;
    for a in args {
        write!(f, ",{}", a)?;
    }
    write!(f, ")")
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Increase(v) => write!(f, "{0} <- {0} + 1", v),
            Op::Decrease(v) => write!(f, "{0} <- {0} - 1", v),
            Op::Neutral(v) => write!(f, "{0} <- {0}", v),
            Op::JumpNotZero(v, l) => write!(f, "IF {} != 0 GOTO {}", v, l),
            Op::ZeroVariable(v) => write!(f, "{} <- 0", v),
            Op::ConstantAssignment(v, k) => write!(f, "{} <- {}", v, k),
            Op::Assignment { dst, src } => write!(f, "{} <- {}", dst, src),
            Op::GoToLabel(l) => write!(f, "GOTO {}", l),
            Op::JumpZero(v, l) => write!(f, "IF {} = 0 GOTO {}", v, l),
            Op::JumpEqualConstant(v, k, l) => write!(f, "IF {} = {} GOTO {}", v, k, l),
            Op::JumpEqualVariable(a, b, l) => write!(f, "IF {} = {} GOTO {}", a, b, l),
            Op::Quote { dst, function, args } => {
                write!(f, "{} <- ", dst)?;
                call(f, function, args)
            }
            Op::JumpEqualFunction { var, function, args, target } => {
                write!(f, "IF {} = ", var)?;
                call(f, function, args)?;
                write!(f, " GOTO {}", target)
            }
        }
    }
}

/// An instruction placed in a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Where jumps land; `Label::Empty` when unlabeled.
    pub label: Label,
    pub op: Op,
    /// 1-based position in the owning program.
    pub line: usize,
    /// 0-based index of the instruction this one was expanded from, in the
    /// program one degree lower.
    pub parent: Option<usize>,
}

impl Instruction {
    pub fn new(label: Label, op: Op) -> Self {
        Instruction { label, op, line: 0, parent: None }
    }

    pub fn unlabeled(op: Op) -> Self {
        Self::new(Label::Empty, op)
    }

    pub fn with_parent(mut self, parent: usize) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Self-label and target label, skipping empty ones.
    pub fn labels(&self) -> impl Iterator<Item = Label> {
        std::iter::once(self.label)
            .chain(self.op.target())
            .filter(|l| !l.is_empty())
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.label.is_empty() {
            write!(f, "{}", self.op)
        } else {
            write!(f, "{}: {}", self.label, self.op)
        }
    }
}
