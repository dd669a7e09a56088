//! Run history.

use serde::{Deserialize, Serialize};

use semu_vm::Halt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: usize,
    pub degree: usize,
    /// Values of `x1..xn`.
    pub inputs: Vec<u64>,
    pub y: u64,
    /// Static cycle count of the program at `degree`.
    pub cycles: u64,
    /// Cycles of the instructions this run actually executed.
    pub executed_cycles: u64,
    pub halt: Halt,
}

#[derive(Debug, Clone, Default)]
pub struct History {
    records: Vec<RunRecord>,
}

impl History {
    /// Appends a record, assigning it the next id (ids start at 1).
    pub fn push(
        &mut self,
        degree: usize,
        inputs: Vec<u64>,
        y: u64,
        cycles: u64,
        executed_cycles: u64,
        halt: Halt,
    ) -> &RunRecord {
        let id = self.records.len() + 1;
        self.records.push(RunRecord { id, degree, inputs, y, cycles, executed_cycles, halt });
        &self.records[id - 1]
    }

    pub fn get(&self, id: usize) -> Option<&RunRecord> {
        id.checked_sub(1).and_then(|i| self.records.get(i))
    }

    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.records)
    }
}
