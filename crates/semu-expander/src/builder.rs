//! One expansion step: rewrites every synthetic instruction one level down.

use semu_program::{Instruction, Label, Op, Program, Repository, Variable};
use semu_syntax::error::Result;
use tracing::debug;

use crate::generator::{LabelGenerator, TempGenerator};

pub(crate) struct StepBuilder<'a> {
    pub(crate) repo: &'a Repository,
    pub(crate) labels: LabelGenerator,
    pub(crate) temps: TempGenerator,
    code: Vec<Instruction>,
    parent: usize,
    // Self-label of the instruction being expanded, consumed by the first emit
    pending: Label,
}

impl<'a> StepBuilder<'a> {
    pub(crate) fn new(repo: &'a Repository) -> Self {
        Self {
            repo,
            labels: LabelGenerator::new(),
            temps: TempGenerator::new(),
            code: Vec::new(),
            parent: 0,
            pending: Label::Empty,
        }
    }

    /// Emits `op`; the first emission for an instruction inherits its self-label.
    pub(crate) fn emit(&mut self, op: Op) -> usize {
        let label = std::mem::take(&mut self.pending);
        self.push(label, op)
    }

    /// Emits `op` under a label introduced by the expansion itself.
    pub(crate) fn emit_at(&mut self, label: Label, op: Op) -> usize {
        debug_assert!(self.pending.is_empty(), "first emission must carry the self-label");
        self.push(label, op)
    }

    fn push(&mut self, label: Label, op: Op) -> usize {
        self.code.push(Instruction::new(label, op).with_parent(self.parent));
        self.code.len() - 1
    }

    /// Expands `program` by one degree.
    pub(crate) fn expand(mut self, program: &Program) -> Result<Program> {
        self.labels.clear();
        self.labels.load_from(&program.instructions);
        self.temps.clear();
        self.temps.load_from(&program.instructions);
        for (pos, instr) in program.instructions.iter().enumerate() {
            self.parent = pos;
            self.pending = instr.label;
            self.emit_instruction(instr)?;
        }
        debug!(
            program = %program.name,
            from = program.len(),
            to = self.code.len(),
            "expanded one degree"
        );
        Ok(Program::new(program.name.clone(), self.code).with_aliases(program.aliases.clone()))
    }

    fn emit_instruction(&mut self, instr: &Instruction) -> Result<()> {
        match &instr.op {
            Op::Increase(_) | Op::Decrease(_) | Op::Neutral(_) | Op::JumpNotZero(..) => {
                self.emit(instr.op.clone());
            }
            Op::ZeroVariable(v) => self.zero_loop(*v),
            Op::ConstantAssignment(v, 0) => self.zero_loop(*v),
            Op::ConstantAssignment(v, k) => {
                self.emit(Op::ZeroVariable(*v));
                for _ in 0..*k {
                    self.emit(Op::Increase(*v));
                }
            }
            Op::Assignment { dst, src } if dst == src => {
                self.emit(Op::Increase(*dst));
                self.emit(Op::Decrease(*dst));
                self.emit(Op::Increase(*dst));
                self.emit(Op::Decrease(*dst));
            }
            Op::Assignment { dst, src } => self.copy(*dst, *src),
            Op::GoToLabel(target) => {
                let t = self.temps.fresh();
                self.emit(Op::Increase(t));
                self.emit(Op::JumpNotZero(t, *target));
            }
            Op::JumpZero(v, target) => {
                let skip = self.labels.fresh();
                self.emit(Op::JumpNotZero(*v, skip));
                self.emit(Op::GoToLabel(*target));
                self.emit_at(skip, Op::Neutral(*v));
            }
            Op::JumpEqualConstant(v, k, target) => {
                let t = self.temps.fresh();
                let not_equal = self.labels.fresh();
                self.emit(Op::Assignment { dst: t, src: *v });
                for _ in 0..*k {
                    self.emit(Op::JumpZero(t, not_equal));
                    self.emit(Op::Decrease(t));
                }
                self.emit(Op::JumpNotZero(t, not_equal));
                self.emit(Op::GoToLabel(*target));
                self.emit_at(not_equal, Op::Neutral(t));
            }
            Op::JumpEqualVariable(a, b, target) => {
                let t1 = self.temps.fresh();
                let t2 = self.temps.fresh();
                let compare = self.labels.fresh();
                let a_done = self.labels.fresh();
                let not_equal = self.labels.fresh();
                self.emit(Op::Assignment { dst: t1, src: *a });
                self.emit(Op::Assignment { dst: t2, src: *b });
                self.emit_at(compare, Op::JumpZero(t1, a_done));
                self.emit(Op::JumpZero(t2, not_equal));
                self.emit(Op::Decrease(t1));
                self.emit(Op::Decrease(t2));
                self.emit(Op::GoToLabel(compare));
                self.emit_at(a_done, Op::JumpZero(t2, *target));
                self.emit_at(not_equal, Op::Neutral(t1));
            }
            Op::Quote { dst, function, args } => self.inline(*dst, function, args)?,
            Op::JumpEqualFunction { var, function, args, target } => {
                let t = self.temps.fresh();
                self.emit(Op::Quote {
                    dst: t,
                    function: function.clone(),
                    args: args.clone(),
                });
                self.emit(Op::JumpEqualVariable(*var, t, *target));
            }
        }
        Ok(())
    }

    fn zero_loop(&mut self, v: Variable) {
        let again = self.labels.fresh();
        self.emit(Op::JumpNotZero(v, again));
        self.emit_at(again, Op::Decrease(v));
        self.emit(Op::JumpNotZero(v, again));
    }

    /// `dst <- src` leaving `src` intact: drain src into a helper, then pour
    /// the helper back into both.
    fn copy(&mut self, dst: Variable, src: Variable) {
        let helper = self.temps.fresh();
        let drain = self.labels.fresh();
        let pour = self.labels.fresh();
        let done = self.labels.fresh();
        self.emit(Op::ZeroVariable(dst));
        self.emit(Op::JumpNotZero(src, drain));
        self.emit(Op::GoToLabel(done));
        self.emit_at(drain, Op::Decrease(src));
        self.emit(Op::Increase(helper));
        self.emit(Op::JumpNotZero(src, drain));
        self.emit_at(pour, Op::Decrease(helper));
        self.emit(Op::Increase(dst));
        self.emit(Op::Increase(src));
        self.emit(Op::JumpNotZero(helper, pour));
        self.emit_at(done, Op::Neutral(dst));
    }
}
