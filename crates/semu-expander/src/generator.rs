//! Fresh label and temp allocation for one expansion step.

use semu_program::{Instruction, Label, VarKind, Variable};

/// Hands out numeric labels above every label it has seen.
#[derive(Debug, Default)]
pub struct LabelGenerator {
    max: u32,
}

impl LabelGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.max = 0;
    }

    /// Records every self-label and target label of `instructions`.
    pub fn load_from(&mut self, instructions: &[Instruction]) {
        for l in instructions.iter().flat_map(Instruction::labels) {
            self.record(l);
        }
    }

    pub fn record(&mut self, label: Label) {
        if let Some(n) = label.number() {
            self.max = self.max.max(n);
        }
    }

    /// Makes sure later labels are above `L{n}`.
    pub fn advance_past(&mut self, n: u32) {
        self.max = self.max.max(n);
    }

    pub fn fresh(&mut self) -> Label {
        self.max += 1;
        Label::Numeric(self.max)
    }
}

/// Hands out temps `z{k}` above every temp it has seen.
#[derive(Debug, Default)]
pub struct TempGenerator {
    max: u32,
}

impl TempGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.max = 0;
    }

    pub fn load_from(&mut self, instructions: &[Instruction]) {
        for v in instructions.iter().flat_map(|i| i.op.variables()) {
            if v.kind == VarKind::Temp {
                self.max = self.max.max(v.index);
            }
        }
    }

    pub fn advance_past(&mut self, n: u32) {
        self.max = self.max.max(n);
    }

    pub fn fresh(&mut self) -> Variable {
        self.max += 1;
        Variable::temp(self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semu_program::Op;

    #[test]
    fn fresh_labels_avoid_loaded_ones() {
        let code = vec![
            Instruction::new(Label::Numeric(2), Op::Neutral(Variable::Y)),
            Instruction::unlabeled(Op::JumpNotZero(Variable::Y, Label::Numeric(7))),
            Instruction::unlabeled(Op::GoToLabel(Label::Exit)),
        ];
        let mut g = LabelGenerator::new();
        g.load_from(&code);
        assert_eq!(g.fresh(), Label::Numeric(8));
        assert_eq!(g.fresh(), Label::Numeric(9));
        g.advance_past(20);
        assert_eq!(g.fresh(), Label::Numeric(21));
        g.clear();
        assert_eq!(g.fresh(), Label::Numeric(1));
    }

    #[test]
    fn fresh_temps_avoid_loaded_ones() {
        let code = vec![Instruction::unlabeled(Op::Assignment {
            dst: Variable::temp(4),
            src: Variable::input(9),
        })];
        let mut g = TempGenerator::new();
        g.load_from(&code);
        assert_eq!(g.fresh(), Variable::temp(5));
        g.advance_past(3);
        assert_eq!(g.fresh(), Variable::temp(6));
    }
}
