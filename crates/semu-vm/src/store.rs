//! The variable store shared by the host and the interpreter.

use std::collections::BTreeMap;

use semu_program::{VarKind, Variable};

/// Cells holding non-negative integers. Unwritten cells read as 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VarStore {
    cells: BTreeMap<Variable, u64>,
}

impl VarStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, v: Variable) -> u64 {
        self.cells.get(&v).copied().unwrap_or(0)
    }

    pub fn set(&mut self, v: Variable, value: u64) {
        self.cells.insert(v, value);
    }

    pub fn increase(&mut self, v: Variable) {
        let cell = self.cells.entry(v).or_insert(0);
        *cell = cell.saturating_add(1);
    }

    /// Decrements, clamping at 0.
    pub fn decrease(&mut self, v: Variable) {
        let cell = self.cells.entry(v).or_insert(0);
        *cell = cell.saturating_sub(1);
    }

    /// Zeroes `y` and every temp; inputs keep their values.
    pub fn reset_work_cells(&mut self) {
        for (v, value) in self.cells.iter_mut() {
            if v.kind != VarKind::Input {
                *value = 0;
            }
        }
    }

    pub fn clear_inputs(&mut self) {
        self.cells.retain(|v, _| v.kind != VarKind::Input);
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Makes sure `vars` show up in snapshots even before they are written.
    pub fn touch(&mut self, vars: impl IntoIterator<Item = Variable>) {
        for v in vars {
            self.cells.entry(v).or_insert(0);
        }
    }

    /// Every known cell, sorted `y`, inputs, temps.
    pub fn snapshot(&self) -> Vec<(Variable, u64)> {
        self.cells.iter().map(|(v, n)| (*v, *n)).collect()
    }

    /// Input values keyed by index.
    pub fn inputs(&self) -> Vec<(u32, u64)> {
        self.cells
            .iter()
            .filter(|(v, _)| v.is_input())
            .map(|(v, n)| (v.index, *n))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_default_to_zero_and_decrease_clamps() {
        let mut s = VarStore::new();
        let x1 = Variable::input(1);
        assert_eq!(s.get(x1), 0);
        s.decrease(x1);
        assert_eq!(s.get(x1), 0);
        s.increase(x1);
        s.increase(x1);
        s.decrease(x1);
        assert_eq!(s.get(x1), 1);
    }

    #[test]
    fn reset_keeps_inputs() {
        let mut s = VarStore::new();
        s.set(Variable::Y, 4);
        s.set(Variable::temp(2), 9);
        s.set(Variable::input(1), 7);
        s.reset_work_cells();
        assert_eq!(
            s.snapshot(),
            vec![(Variable::Y, 0), (Variable::input(1), 7), (Variable::temp(2), 0)]
        );
        s.clear_inputs();
        assert!(s.inputs().is_empty());
    }
}
