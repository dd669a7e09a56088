//! Programs: an ordered instruction list with a label index.

use std::collections::{BTreeMap, BTreeSet};

use crate::instruction::Instruction;
use crate::label::Label;
use crate::variable::{VarKind, Variable};

/// Counts of basic and synthetic instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub basic: usize,
    pub synthetic: usize,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.basic + self.synthetic
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub name: String,
    pub instructions: Vec<Instruction>,
    /// Self-label -> 0-based position; the first instruction wins on duplicates.
    labels: BTreeMap<Label, usize>,
    /// Free-form variable tokens from the description, lower-cased, and the
    /// cells they were interned as.
    pub aliases: BTreeMap<String, Variable>,
}

impl Program {
    /// Creates a program, numbering instructions `1..=n` and indexing labels.
    pub fn new(name: impl Into<String>, mut instructions: Vec<Instruction>) -> Self {
        let mut labels = BTreeMap::new();
        for (pos, instr) in instructions.iter_mut().enumerate() {
            instr.line = pos + 1;
            if !instr.label.is_empty() {
                labels.entry(instr.label).or_insert(pos);
            }
        }
        Program {
            name: name.into(),
            instructions,
            labels,
            aliases: BTreeMap::new(),
        }
    }

    pub fn with_aliases(mut self, aliases: BTreeMap<String, Variable>) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Position of the instruction carrying `label`.
    pub fn position_of(&self, label: Label) -> Option<usize> {
        self.labels.get(&label).copied()
    }

    /// Self-labels that occur on more than one instruction.
    pub fn duplicate_labels(&self) -> Vec<(usize, Label)> {
        let mut seen = BTreeSet::new();
        self.instructions
            .iter()
            .filter(|i| !i.label.is_empty() && !seen.insert(i.label))
            .map(|i| (i.line, i.label))
            .collect()
    }

    /// Jumps whose target is neither EXIT nor a self-label of this program,
    /// as `(line, target)`.
    pub fn unresolved_targets(&self) -> Vec<(usize, Label)> {
        self.instructions
            .iter()
            .filter_map(|i| i.op.target().map(|t| (i.line, t)))
            .filter(|(_, t)| !t.is_empty() && !t.is_exit() && !self.labels.contains_key(t))
            .collect()
    }

    /// True iff every target label resolves or is EXIT.
    pub fn check_labels(&self) -> bool {
        self.unresolved_targets().is_empty()
    }

    /// Every variable referenced, in first-appearance order.
    pub fn variables(&self) -> Vec<Variable> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for v in self.instructions.iter().flat_map(|i| i.op.variables()) {
            if seen.insert(v) {
                out.push(v);
            }
        }
        out
    }

    /// Input cells in first-appearance order.
    pub fn inputs(&self) -> Vec<Variable> {
        self.variables().into_iter().filter(Variable::is_input).collect()
    }

    /// Temp cells in first-appearance order.
    pub fn temps(&self) -> Vec<Variable> {
        self.variables().into_iter().filter(Variable::is_temp).collect()
    }

    /// Highest index used by a variable of `kind`, or 0.
    pub fn max_index(&self, kind: VarKind) -> u32 {
        self.instructions
            .iter()
            .flat_map(|i| i.op.variables())
            .filter(|v| v.kind == kind)
            .map(|v| v.index)
            .max()
            .unwrap_or(0)
    }

    /// Highest numeric label, self or target, or 0.
    pub fn max_label(&self) -> u32 {
        self.instructions
            .iter()
            .flat_map(Instruction::labels)
            .filter_map(|l| l.number())
            .max()
            .unwrap_or(0)
    }

    /// Every non-empty label, sorted with EXIT last.
    pub fn labels_used(&self) -> BTreeSet<Label> {
        self.instructions.iter().flat_map(Instruction::labels).collect()
    }

    /// Names of all variables (output, inputs, temps) followed by all labels.
    pub fn names_and_labels(&self) -> Vec<String> {
        let vars: BTreeSet<Variable> = self.variables().into_iter().collect();
        vars.iter()
            .map(Variable::to_string)
            .chain(self.labels_used().iter().map(Label::to_string))
            .collect()
    }

    /// Names of programs called by QUOTE-like instructions, deduplicated.
    pub fn callees(&self) -> BTreeSet<&str> {
        self.instructions.iter().filter_map(|i| i.op.callee()).collect()
    }

    pub fn summary(&self) -> Summary {
        let basic = self.instructions.iter().filter(|i| i.op.is_basic()).count();
        Summary {
            basic,
            synthetic: self.instructions.len() - basic,
        }
    }

    /// Resolves a host-supplied name: an alias first, then `y`/`xN`/`zN`.
    pub fn resolve_name(&self, token: &str) -> Option<Variable> {
        self.aliases
            .get(&token.trim().to_ascii_lowercase())
            .copied()
            .or_else(|| Variable::parse(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::Op;

    fn l(n: u32) -> Label {
        Label::Numeric(n)
    }

    fn sample() -> Program {
        let x1 = Variable::input(1);
        Program::new(
            "Sample",
            vec![
                Instruction::new(l(1), Op::JumpZero(x1, l(2))),
                Instruction::unlabeled(Op::Increase(Variable::Y)),
                Instruction::unlabeled(Op::Decrease(x1)),
                Instruction::unlabeled(Op::JumpNotZero(Variable::temp(3), l(1))),
                Instruction::new(l(2), Op::GoToLabel(Label::Exit)),
            ],
        )
    }

    #[test]
    fn numbers_and_indexes() {
        let p = sample();
        assert_eq!(p.instructions[4].line, 5);
        assert_eq!(p.position_of(l(2)), Some(4));
        assert_eq!(p.position_of(l(9)), None);
        assert!(p.check_labels());
        assert!(p.duplicate_labels().is_empty());
    }

    #[test]
    fn finds_unresolved_and_duplicate_labels() {
        let p = Program::new(
            "Bad",
            vec![
                Instruction::new(l(1), Op::GoToLabel(l(5))),
                Instruction::new(l(1), Op::Neutral(Variable::Y)),
            ],
        );
        assert_eq!(p.unresolved_targets(), vec![(1, l(5))]);
        assert_eq!(p.duplicate_labels(), vec![(2, l(1))]);
        assert_eq!(p.position_of(l(1)), Some(0));
    }

    #[test]
    fn collects_variables_and_labels() {
        let p = sample();
        assert_eq!(
            p.variables(),
            vec![Variable::input(1), Variable::Y, Variable::temp(3)]
        );
        assert_eq!(p.inputs(), vec![Variable::input(1)]);
        assert_eq!(p.max_index(VarKind::Temp), 3);
        assert_eq!(p.max_label(), 2);
        assert_eq!(p.names_and_labels(), ["y", "x1", "z3", "L1", "L2", "EXIT"]);
        assert_eq!(p.summary(), Summary { basic: 3, synthetic: 2 });
    }

    #[test]
    fn resolves_aliases_before_names() {
        let mut aliases = BTreeMap::new();
        aliases.insert("counter".to_string(), Variable::input(4));
        let p = sample().with_aliases(aliases);
        assert_eq!(p.resolve_name("Counter"), Some(Variable::input(4)));
        assert_eq!(p.resolve_name("x1"), Some(Variable::input(1)));
        assert_eq!(p.resolve_name("what"), None);
    }
}
