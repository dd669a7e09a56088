//! Degree-by-degree expansion of S-language programs.
//!
//! Degree 0 is a program as loaded. Degree `d + 1` is produced from degree `d`
//! by rewriting every synthetic instruction into instructions of strictly
//! lower synthetic depth, so after `max_degree` rounds only the four basic
//! instructions remain. Every round is semantics-preserving and never lowers
//! the static cycle count.

mod builder;
pub mod generator;
mod quote;

pub use generator::{LabelGenerator, TempGenerator};

use semu_program::{analysis, Instruction, Program, Repository};
use semu_syntax::error::{misuse, Result};

use crate::builder::StepBuilder;

/// Expands `program` by exactly one degree.
pub fn expand_once(program: &Program, repo: &Repository) -> Result<Program> {
    StepBuilder::new(repo).expand(program)
}

/// The expansion cache: entry `d` is the program at degree `d`.
#[derive(Debug, Clone)]
pub struct Expander {
    degrees: Vec<Program>,
    max_degree: usize,
}

impl Expander {
    /// Validates QUOTE callees of `program` and computes its maximum degree.
    pub fn new(program: Program, repo: &Repository) -> Result<Self> {
        let max_degree = analysis::max_degree(&program, repo)?;
        Ok(Self {
            degrees: vec![program],
            max_degree,
        })
    }

    pub fn max_degree(&self) -> usize {
        self.max_degree
    }

    /// The program as loaded.
    pub fn original(&self) -> &Program {
        &self.degrees[0]
    }

    /// Number of degrees already computed.
    pub fn cached(&self) -> usize {
        self.degrees.len()
    }

    /// The program at `degree`, expanding lazily.
    pub fn program(&mut self, degree: usize, repo: &Repository) -> Result<&Program> {
        if degree > self.max_degree {
            return misuse(format!(
                "Degree {} exceeds the maximum degree {} of '{}'",
                degree,
                self.max_degree,
                self.original().name
            ));
        }
        while self.degrees.len() <= degree {
            let last = &self.degrees[self.degrees.len() - 1];
            let next = expand_once(last, repo)?;
            self.degrees.push(next);
        }
        Ok(&self.degrees[degree])
    }

    /// The chain of instructions that produced line `line` of the degree-`degree`
    /// program: the instruction itself first, then its parent one degree lower,
    /// down to degree 0. Each entry is `(degree, instruction)`.
    pub fn lineage(
        &mut self,
        degree: usize,
        line: usize,
        repo: &Repository,
    ) -> Result<Vec<(usize, &Instruction)>> {
        let len = self.program(degree, repo)?.len();
        if line == 0 || line > len {
            return misuse(format!(
                "Line {} is out of range 1..={} at degree {}",
                line, len, degree
            ));
        }
        let mut chain = Vec::new();
        let mut pos = Some(line - 1);
        let mut d = degree;
        while let Some(p) = pos {
            let instr = &self.degrees[d].instructions[p];
            chain.push((d, instr));
            if d == 0 {
                break;
            }
            pos = instr.parent;
            d -= 1;
        }
        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semu_program::{Label, Op, Variable};
    use semu_syntax::ErrorKind;

    fn x(n: u32) -> Variable {
        Variable::input(n)
    }

    fn program(name: &str, code: Vec<Instruction>) -> Program {
        Program::new(name, code)
    }

    fn ops(p: &Program) -> Vec<String> {
        p.instructions.iter().map(|i| i.to_string()).collect()
    }

    #[test]
    fn zero_variable_becomes_a_loop() {
        let repo = Repository::new();
        let p = program(
            "Zero",
            vec![Instruction::new(Label::Numeric(1), Op::ZeroVariable(Variable::Y))],
        );
        let next = expand_once(&p, &repo).unwrap();
        assert_eq!(
            ops(&next),
            ["L1: IF y != 0 GOTO L2", "L2: y <- y - 1", "IF y != 0 GOTO L2"]
        );
        assert!(next.instructions.iter().all(|i| i.parent == Some(0)));
        assert!(next.check_labels());
        assert_eq!(analysis::program_cycles(&next, &repo).unwrap(), 5);
    }

    #[test]
    fn constant_assignment_keeps_label_on_first_instruction() {
        let repo = Repository::new();
        let p = program(
            "Three",
            vec![Instruction::new(Label::Numeric(4), Op::ConstantAssignment(Variable::Y, 3))],
        );
        let next = expand_once(&p, &repo).unwrap();
        assert_eq!(
            ops(&next),
            ["L4: y <- 0", "y <- y + 1", "y <- y + 1", "y <- y + 1"]
        );
    }

    #[test]
    fn assignment_copies_without_destroying_the_source() {
        let repo = Repository::new();
        let p = program(
            "Copy",
            vec![Instruction::unlabeled(Op::Assignment { dst: Variable::Y, src: x(1) })],
        );
        let next = expand_once(&p, &repo).unwrap();
        assert_eq!(
            ops(&next),
            [
                "y <- 0",
                "IF x1 != 0 GOTO L1",
                "GOTO L3",
                "L1: x1 <- x1 - 1",
                "z1 <- z1 + 1",
                "IF x1 != 0 GOTO L1",
                "L2: z1 <- z1 - 1",
                "y <- y + 1",
                "x1 <- x1 + 1",
                "IF z1 != 0 GOTO L2",
                "L3: y <- y",
            ]
        );
        assert_eq!(analysis::program_cycles(&next, &repo).unwrap(), 13);
    }

    #[test]
    fn jump_equal_variable_layout() {
        let repo = Repository::new();
        let p = program(
            "Eq",
            vec![Instruction::new(
                Label::Numeric(1),
                Op::JumpEqualVariable(x(1), x(2), Label::Exit),
            )],
        );
        let next = expand_once(&p, &repo).unwrap();
        assert_eq!(
            ops(&next),
            [
                "L1: z1 <- x1",
                "z2 <- x2",
                "L2: IF z1 = 0 GOTO L3",
                "IF z2 = 0 GOTO L4",
                "z1 <- z1 - 1",
                "z2 <- z2 - 1",
                "GOTO L2",
                "L3: IF z2 = 0 GOTO EXIT",
                "L4: z1 <- z1",
            ]
        );
        assert_eq!(analysis::program_cycles(&next, &repo).unwrap(), 17);
    }

    #[test]
    fn quote_is_inlined_with_fresh_names() {
        let mut repo = Repository::new();
        repo.register(program(
            "Succ",
            vec![
                Instruction::unlabeled(Op::Assignment { dst: Variable::Y, src: x(1) }),
                Instruction::new(Label::Numeric(1), Op::Increase(Variable::Y)),
                Instruction::unlabeled(Op::GoToLabel(Label::Exit)),
            ],
        ));
        let p = program(
            "Main",
            vec![Instruction::new(
                Label::Numeric(1),
                Op::Quote { dst: Variable::Y, function: "Succ".into(), args: vec![x(2)] },
            )],
        );
        let next = expand_once(&p, &repo).unwrap();
        assert_eq!(
            ops(&next),
            [
                "L1: z1 <- x2",
                "z2 <- 0",
                "z2 <- z1",
                "L2: z2 <- z2 + 1",
                "GOTO L3",
                "L3: z2 <- z2",
                "y <- z2",
            ]
        );
        assert!(next.check_labels());
        assert_eq!(
            analysis::program_cycles(&next, &repo).unwrap(),
            analysis::program_cycles(&p, &repo).unwrap()
        );
    }

    #[test]
    fn expander_caches_and_rejects_high_degrees() {
        let repo = Repository::new();
        let p = program(
            "Jz",
            vec![
                Instruction::unlabeled(Op::JumpZero(x(1), Label::Exit)),
                Instruction::unlabeled(Op::Increase(Variable::Y)),
            ],
        );
        let mut e = Expander::new(p, &repo).unwrap();
        assert_eq!(e.max_degree(), 2);
        assert!(e.program(2, &repo).unwrap().instructions.iter().all(|i| i.op.is_basic()));
        assert_eq!(e.cached(), 3);
        let err = e.program(3, &repo).unwrap_err();
        assert_eq!(err.kind, ErrorKind::HostMisuse);

        // degree 2 line 2 is the GOTO's increment, from the JZ at degree 0
        let chain = e.lineage(2, 2, &repo).unwrap();
        let degrees: Vec<usize> = chain.iter().map(|(d, _)| *d).collect();
        assert_eq!(degrees, [2, 1, 0]);
        assert_eq!(chain[2].1.op, Op::JumpZero(x(1), Label::Exit));
    }
}
