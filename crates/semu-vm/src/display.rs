//! Text rendering of instructions and cells.

use semu_program::{Instruction, Variable};

/// `#3 (B) [ L1 ] x1 <- x1 + 1 (1)`
pub fn render_instruction(instr: &Instruction, cycles: u64) -> String {
    let kind = if instr.op.is_basic() { 'B' } else { 'S' };
    format!(
        "#{} ({}) [ {:<2} ] {} ({})",
        instr.line,
        kind,
        instr.label.to_string(),
        instr.op,
        cycles
    )
}

/// `y = 3, x1 = 5, z1 = 0`
pub fn render_variables(cells: &[(Variable, u64)]) -> String {
    let mut s = String::new();
    for (i, (v, n)) in cells.iter().enumerate() {
        if i > 0 {
            s.push_str(", ");
        }
        s.push_str(&format!("{} = {}", v, n));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use semu_program::{Label, Op};

    #[test]
    fn renders_listing_lines() {
        let mut i = Instruction::new(Label::Numeric(1), Op::Increase(Variable::input(1)));
        i.line = 3;
        assert_eq!(render_instruction(&i, 1), "#3 (B) [ L1 ] x1 <- x1 + 1 (1)");
        let mut j = Instruction::unlabeled(Op::GoToLabel(Label::Exit));
        j.line = 12;
        assert_eq!(render_instruction(&j, 1), "#12 (S) [    ] GOTO EXIT (1)");
    }

    #[test]
    fn renders_cells() {
        let cells = vec![(Variable::Y, 3), (Variable::input(1), 5)];
        assert_eq!(render_variables(&cells), "y = 3, x1 = 5");
    }
}
