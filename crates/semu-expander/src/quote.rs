//! QUOTE inlining.
//!
//! The callee's body is copied into the caller with every variable moved to a
//! fresh caller temp and every numeric label moved to a fresh caller label.
//! Callee input `x_n` is bound to the n-th argument; a missing argument binds
//! to a temp that is never written and therefore reads 0. A jump to EXIT (or
//! to a label the callee never defines) lands on a join point placed just
//! before the output is delivered:
//!
//! ```text
//!      [s] z_x1 <- a1          argument copies, first-appearance order
//!          z_t  <- 0           reset of every callee temp and of z_y
//!          ...  body, renamed
//!   [Lend] z_y  <- z_y
//!          dst  <- z_y
//! ```

use std::collections::BTreeMap;

use semu_program::{Label, Op, VarKind, Variable};
use semu_syntax::error::{invalid, Result};
use tracing::debug;

use crate::builder::StepBuilder;

impl<'a> StepBuilder<'a> {
    pub(crate) fn inline(&mut self, dst: Variable, function: &str, args: &[Variable]) -> Result<()> {
        let repo = self.repo;
        let callee = match repo.get(function) {
            Some(p) => p,
            None => return invalid(format!("Unknown function '{}' in QUOTE", function)),
        };

        // Keep the renamed body clear of the callee's own names.
        self.temps.advance_past(callee.max_index(VarKind::Temp));
        self.labels.advance_past(callee.max_label());

        let inputs = callee.inputs();
        let temps = callee.temps();
        let mut vars: BTreeMap<Variable, Variable> = BTreeMap::new();
        for v in inputs.iter().chain(temps.iter()) {
            let fresh = self.temps.fresh();
            vars.insert(*v, fresh);
        }
        let zy = self.temps.fresh();
        vars.insert(Variable::Y, zy);

        let mut labels: BTreeMap<Label, Label> = BTreeMap::new();
        for instr in &callee.instructions {
            if let Label::Numeric(_) = instr.label {
                if !labels.contains_key(&instr.label) {
                    let fresh = self.labels.fresh();
                    labels.insert(instr.label, fresh);
                }
            }
        }
        let end = self.labels.fresh();

        for input in &inputs {
            let arg = match args.get(input.index as usize - 1) {
                Some(a) => *a,
                None => self.temps.fresh(),
            };
            self.emit(Op::Assignment { dst: vars[input], src: arg });
        }
        for t in &temps {
            self.emit(Op::ZeroVariable(vars[t]));
        }
        self.emit(Op::ZeroVariable(zy));

        for instr in &callee.instructions {
            let label = match instr.label {
                Label::Numeric(_) => labels.get(&instr.label).copied().unwrap_or(Label::Empty),
                _ => Label::Empty,
            };
            let op = instr.op.remap(
                |v| vars.get(&v).copied().unwrap_or(v),
                |l| match l {
                    Label::Empty => Label::Empty,
                    Label::Exit => end,
                    numeric => labels.get(&numeric).copied().unwrap_or(end),
                },
            );
            if label.is_empty() {
                self.emit(op);
            } else {
                self.emit_at(label, op);
            }
        }

        self.emit_at(end, Op::Neutral(zy));
        self.emit(Op::Assignment { dst, src: zy });
        debug!(
            callee = %callee.name,
            inputs = inputs.len(),
            temps = temps.len(),
            join = %end,
            "inlined QUOTE"
        );
        Ok(())
    }
}
