//! Name -> program registry used to resolve QUOTE callees.

use std::collections::BTreeMap;

use crate::program::Program;

#[derive(Debug, Clone, Default)]
pub struct Repository {
    programs: BTreeMap<String, Program>,
}

impl Repository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `program` under its name, replacing any previous entry.
    pub fn register(&mut self, program: Program) {
        self.programs.insert(program.name.clone(), program);
    }

    pub fn get(&self, name: &str) -> Option<&Program> {
        self.programs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.programs.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.programs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    pub fn clear(&mut self) {
        self.programs.clear();
    }
}
