//! The engine facade.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::info;

use semu_expander::Expander;
use semu_program::{analysis, Instruction, Program, Repository, Summary, VarKind, Variable};
use semu_syntax::ast::ProgramDoc;
use semu_syntax::error::{invalid, misuse, Error, Result};
use semu_vm::{render_instruction, Run, VarStore, Vm};

use crate::debug::DebugSession;
use crate::history::{History, RunRecord};
use crate::loader;

const NOT_LOADED: &str = "No program is loaded";

pub(crate) struct Current {
    pub(crate) expander: Expander,
    /// Lower-cased host names -> cells, seeded from the loader's aliases.
    pub(crate) aliases: BTreeMap<String, Variable>,
    pub(crate) display_names: BTreeMap<String, String>,
}

/// Loads programs, serves their expansions, runs them and keeps the history.
pub struct Engine {
    pub(crate) repo: Repository,
    pub(crate) current: Option<Current>,
    pub(crate) store: VarStore,
    pub(crate) history: History,
    pub(crate) debug: Option<DebugSession>,
    pub(crate) step_limit: Option<u64>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            repo: Repository::new(),
            current: None,
            store: VarStore::new(),
            history: History::default(),
            debug: None,
            step_limit: None,
        }
    }

    /// Caps the number of instructions one run may execute.
    pub fn set_step_limit(&mut self, limit: Option<u64>) {
        self.step_limit = limit;
    }

    pub fn step_limit(&self) -> Option<u64> {
        self.step_limit
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Forgets every registered program, including the loaded one.
    pub fn clear_repository(&mut self) {
        self.repo.clear();
        self.current = None;
        self.debug = None;
        self.history.clear();
        self.store.clear();
    }

    // ---- loading ----

    /// Loads a program description (XML, or JSON when it starts with `{`).
    pub fn load_from_str(&mut self, src: &str) -> Result<()> {
        let doc = semu_parser::parse_program_str(src)?;
        self.load_doc(&doc)
    }

    /// Loads a `.xml` or `.json` file.
    pub fn load_from_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::new(format!("File does not exist: {}", path.display())));
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if ext != "xml" && ext != "json" {
            return Err(Error::new(format!(
                "Not an .xml or .json file: {}",
                path.display()
            )));
        }
        let src = fs::read_to_string(path)
            .map_err(|e| Error::new(format!("Failed to read {}: {}", path.display(), e)))?;
        self.load_from_str(&src)
    }

    /// Validates every program of `doc`, then registers them and makes the
    /// root program current. Nothing is registered when any check fails.
    pub fn load_doc(&mut self, doc: &ProgramDoc) -> Result<()> {
        let loaded = loader::load_document(doc)?;
        for p in std::iter::once(&loaded.main).chain(&loaded.functions) {
            if let Some((line, label)) = p.unresolved_targets().first() {
                return invalid(format!(
                    "Instruction #{} of '{}' jumps to undefined label {}",
                    line, p.name, label
                ));
            }
        }
        let mut staged = self.repo.clone();
        for f in &loaded.functions {
            staged.register(f.clone());
        }
        staged.register(loaded.main.clone());
        for p in std::iter::once(&loaded.main).chain(&loaded.functions) {
            analysis::check_calls(p, &staged)?;
        }
        let aliases = loaded.main.aliases.clone();
        let variables = loaded.main.variables();
        let expander = Expander::new(loaded.main, &staged)?;

        info!(
            program = %doc.name,
            instructions = doc.instructions.len(),
            functions = loaded.functions.len(),
            max_degree = expander.max_degree(),
            "program loaded"
        );
        self.repo = staged;
        self.current = Some(Current {
            expander,
            aliases,
            display_names: loaded.display_names,
        });
        self.store.clear();
        self.store.touch(variables);
        self.history.clear();
        self.debug = None;
        Ok(())
    }

    // ---- queries ----

    pub fn is_loaded(&self) -> bool {
        self.current.is_some()
    }

    fn loaded(&self) -> Result<&Current> {
        match &self.current {
            Some(c) => Ok(c),
            None => misuse(NOT_LOADED),
        }
    }

    pub fn program_name(&self) -> Option<&str> {
        self.current.as_ref().map(|c| c.expander.original().name.as_str())
    }

    pub fn max_degree(&self) -> Result<usize> {
        self.loaded().map(|c| c.expander.max_degree())
    }

    /// The program at `degree`, expanding as needed.
    pub fn program(&mut self, degree: usize) -> Result<&Program> {
        match self.current.as_mut() {
            Some(c) => c.expander.program(degree, &self.repo),
            None => misuse(NOT_LOADED),
        }
    }

    pub fn instructions(&mut self, degree: usize) -> Result<&[Instruction]> {
        self.program(degree).map(|p| p.instructions.as_slice())
    }

    /// True iff every jump target at `degree` resolves or is EXIT.
    pub fn validate_program(&mut self, degree: usize) -> Result<bool> {
        self.program(degree).map(Program::check_labels)
    }

    /// Static cycle count at `degree`.
    pub fn cycles(&mut self, degree: usize) -> Result<u64> {
        let current = match self.current.as_mut() {
            Some(c) => c,
            None => return misuse(NOT_LOADED),
        };
        let program = current.expander.program(degree, &self.repo)?;
        analysis::program_cycles(program, &self.repo)
    }

    pub fn instruction_summary(&mut self, degree: usize) -> Result<Summary> {
        self.program(degree).map(Program::summary)
    }

    pub fn names_and_labels(&mut self, degree: usize) -> Result<Vec<String>> {
        self.program(degree).map(Program::names_and_labels)
    }

    /// Listing lines `#n (B|S) [ L ] op (cycles)` for `degree`.
    pub fn render(&mut self, degree: usize) -> Result<Vec<String>> {
        let current = match self.current.as_mut() {
            Some(c) => c,
            None => return misuse(NOT_LOADED),
        };
        let program = current.expander.program(degree, &self.repo)?;
        let vm = Vm::new(program, &self.repo)?;
        Ok(program
            .instructions
            .iter()
            .enumerate()
            .map(|(pos, i)| render_instruction(i, vm.cost(pos)))
            .collect())
    }

    /// Line `line` at `degree` followed by the instructions it was expanded
    /// from, down to degree 0.
    pub fn lineage(&mut self, degree: usize, line: usize) -> Result<Vec<(usize, Instruction)>> {
        match self.current.as_mut() {
            Some(c) => c
                .expander
                .lineage(degree, line, &self.repo)
                .map(|chain| chain.into_iter().map(|(d, i)| (d, i.clone())).collect()),
            None => misuse(NOT_LOADED),
        }
    }

    /// Input cells referenced by the program as loaded, sorted by index.
    pub fn used_inputs(&self) -> Result<Vec<Variable>> {
        let mut inputs = self.loaded()?.expander.original().inputs();
        inputs.sort();
        Ok(inputs)
    }

    /// Loaded functions as `(name, user-facing string)`.
    pub fn functions(&self) -> Vec<(String, String)> {
        self.current
            .iter()
            .flat_map(|c| c.display_names.iter())
            .map(|(n, s)| (n.clone(), s.clone()))
            .collect()
    }

    /// Snapshot of every known cell: `y`, then inputs, then temps.
    pub fn variables(&self) -> Vec<(Variable, u64)> {
        self.store.snapshot()
    }

    pub fn value_of(&self, name: &str) -> Option<u64> {
        self.resolve(name).map(|v| self.store.get(v))
    }

    fn resolve(&self, name: &str) -> Option<Variable> {
        let key = name.trim().to_ascii_lowercase();
        self.current
            .as_ref()
            .and_then(|c| c.aliases.get(&key).copied())
            .or_else(|| Variable::parse(name))
    }

    // ---- inputs ----

    /// Sets input cells by name. Unknown names create new input cells; naming
    /// `y` or a temp is rejected and leaves every cell unchanged.
    pub fn load_inputs(&mut self, values: &[(&str, u64)]) -> Result<()> {
        let current = match self.current.as_mut() {
            Some(c) => c,
            None => return misuse(NOT_LOADED),
        };
        // Cells the program reads may be absent from the store after a run
        // cleared the inputs, so they bound the fresh index too.
        let mut next = self
            .store
            .inputs()
            .last()
            .map(|(i, _)| *i)
            .unwrap_or(0)
            .max(current.expander.original().max_index(VarKind::Input))
            .max(
                current
                    .aliases
                    .values()
                    .filter(|v| v.is_input())
                    .map(|v| v.index)
                    .max()
                    .unwrap_or(0),
            );
        let mut resolved = Vec::with_capacity(values.len());
        let mut fresh = Vec::new();
        for (name, value) in values {
            let key = name.trim().to_ascii_lowercase();
            let known = current.aliases.get(&key).copied().or_else(|| Variable::parse(name));
            let var = match known {
                Some(v) if v.is_input() => v,
                Some(v) => return misuse(format!("'{}' is not an input cell", v)),
                None if key.is_empty() => return misuse("Empty input name"),
                None => match fresh.iter().find(|(k, _)| *k == key) {
                    Some((_, v)) => *v,
                    None => {
                        next += 1;
                        let v = Variable::input(next);
                        fresh.push((key, v));
                        v
                    }
                },
            };
            resolved.push((var, *value));
        }
        current.aliases.extend(fresh);
        for (var, value) in resolved {
            self.store.set(var, value);
        }
        Ok(())
    }

    /// Sets `x1..xn` to `values`, dropping any previous inputs.
    pub fn load_input_values(&mut self, values: &[u64]) {
        self.store.clear_inputs();
        for (i, v) in values.iter().enumerate() {
            self.store.set(Variable::input(i as u32 + 1), *v);
        }
    }

    /// Zeroes every cell.
    pub fn reset_vars(&mut self) {
        let cells: Vec<Variable> = self.store.snapshot().into_iter().map(|(v, _)| v).collect();
        for v in cells {
            self.store.set(v, 0);
        }
    }

    // ---- runs ----

    /// Zeroes `y` and the temps and runs the degree-`degree` program on the
    /// current inputs.
    pub fn run_program(&mut self, degree: usize) -> Result<Run> {
        if self.debug.is_some() {
            return misuse("A debug session is active; stop it before running");
        }
        let current = match self.current.as_mut() {
            Some(c) => c,
            None => return misuse(NOT_LOADED),
        };
        let program = current.expander.program(degree, &self.repo)?;
        let vm = Vm::new(program, &self.repo)?;
        let run = vm.run(&mut self.store, self.step_limit)?;
        info!(
            program = %program.name,
            degree,
            y = run.y,
            cycles = run.cycles,
            steps = run.steps,
            halt = %run.halt,
            "run finished"
        );
        Ok(run)
    }

    /// Runs with `x1..xn = inputs` and appends a record to the history.
    pub fn run_and_record(&mut self, degree: usize, inputs: &[u64]) -> Result<RunRecord> {
        if self.debug.is_some() {
            return misuse("A debug session is active; stop it before running");
        }
        let cycles = self.cycles(degree)?;
        self.load_input_values(inputs);
        let run = self.run_program(degree)?;
        Ok(self
            .history
            .push(degree, inputs.to_vec(), run.y, cycles, run.cycles, run.halt)
            .clone())
    }

    /// Repeats a recorded run with the same degree and inputs, recording it anew.
    pub fn rerun(&mut self, id: usize) -> Result<RunRecord> {
        let (degree, inputs) = match self.history.get(id) {
            Some(r) => (r.degree, r.inputs.clone()),
            None => return misuse(format!("No run #{} in the history", id)),
        };
        self.run_and_record(degree, &inputs)
    }

    pub fn history(&self) -> &[RunRecord] {
        self.history.records()
    }

    pub fn history_json(&self) -> Result<String> {
        self.history
            .to_json()
            .map_err(|e| Error::host_misuse(format!("Failed to serialize history: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semu_syntax::ErrorKind;

    const COUNTER: &str = r#"<S-Program name="Counter">
  <S-Instructions>
    <S-Instruction type="synthetic" name="ASSIGNMENT">
      <S-Variable>y</S-Variable>
      <S-Instruction-Arguments>
        <S-Instruction-Argument name="assignedVariable" value="total"/>
      </S-Instruction-Arguments>
    </S-Instruction>
    <S-Instruction type="basic" name="INCREASE">
      <S-Variable>y</S-Variable>
    </S-Instruction>
  </S-Instructions>
</S-Program>"#;

    #[test]
    fn rejects_calls_before_loading() {
        let mut e = Engine::new();
        assert!(!e.is_loaded());
        assert_eq!(e.max_degree().unwrap_err().kind, ErrorKind::HostMisuse);
        assert_eq!(e.run_program(0).unwrap_err().kind, ErrorKind::HostMisuse);
        assert_eq!(e.load_inputs(&[("x1", 1)]).unwrap_err().kind, ErrorKind::HostMisuse);
    }

    #[test]
    fn loads_aliases_and_runs() {
        let mut e = Engine::new();
        e.load_from_str(COUNTER).unwrap();
        assert_eq!(e.program_name(), Some("Counter"));
        assert_eq!(e.max_degree().unwrap(), 2);
        e.load_inputs(&[("Total", 6)]).unwrap();
        assert_eq!(e.value_of("total"), Some(6));
        assert_eq!(e.run_program(0).unwrap().y, 7);
        assert_eq!(e.run_program(2).unwrap().y, 7);
        assert_eq!(e.value_of("x1"), Some(6));

        let err = e.load_inputs(&[("fresh", 1), ("y", 3)]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::HostMisuse);
        assert_eq!(e.value_of("fresh"), None);

        e.load_inputs(&[("fresh", 2)]).unwrap();
        assert_eq!(e.value_of("x2"), Some(2));
        e.reset_vars();
        assert!(e.variables().iter().all(|(_, n)| *n == 0));
    }

    #[test]
    fn named_inputs_after_a_run_get_their_own_cells() {
        let second = r#"<S-Program name="Second"><S-Instructions>
            <S-Instruction name="ASSIGNMENT"><S-Variable>y</S-Variable><S-Instruction-Arguments>
              <S-Instruction-Argument name="assignedVariable" value="x2"/>
            </S-Instruction-Arguments></S-Instruction>
            <S-Instruction name="INCREASE"><S-Variable>x1</S-Variable></S-Instruction>
          </S-Instructions></S-Program>"#;
        let mut e = Engine::new();
        e.load_from_str(second).unwrap();
        e.run_and_record(0, &[7]).unwrap();
        e.load_inputs(&[("x2", 5), ("fresh", 9)]).unwrap();
        assert_eq!(e.value_of("x2"), Some(5));
        assert_eq!(e.value_of("fresh"), Some(9));
        assert_eq!(e.value_of("x3"), Some(9));

        let mut e = Engine::new();
        e.load_from_str(second).unwrap();
        e.run_and_record(0, &[1]).unwrap();
        e.load_inputs(&[("other", 9)]).unwrap();
        assert_eq!(e.run_program(0).unwrap().y, 0);
    }

    #[test]
    fn records_and_reruns() {
        let mut e = Engine::new();
        e.load_from_str(COUNTER).unwrap();
        let r = e.run_and_record(1, &[3]).unwrap();
        assert_eq!((r.id, r.degree, r.y, r.cycles), (1, 1, 4, 14));
        let again = e.rerun(1).unwrap();
        assert_eq!((again.id, again.y, again.executed_cycles), (2, 4, r.executed_cycles));
        assert_eq!(e.history().len(), 2);
        assert_eq!(e.rerun(9).unwrap_err().kind, ErrorKind::HostMisuse);
        assert!(e.history_json().unwrap().starts_with('['));

        // reloading clears the history but keeps the repository
        e.load_from_str(COUNTER).unwrap();
        assert!(e.history().is_empty());
        assert!(e.repository().contains("Counter"));
    }

    #[test]
    fn invalid_programs_are_not_registered() {
        let mut e = Engine::new();
        let bad_label = r#"<S-Program name="Bad"><S-Instructions>
            <S-Instruction name="GOTO_LABEL"><S-Instruction-Arguments>
              <S-Instruction-Argument name="gotoLabel" value="L4"/>
            </S-Instruction-Arguments></S-Instruction>
          </S-Instructions></S-Program>"#;
        let err = e.load_from_str(bad_label).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidProgram);
        assert!(e.repository().is_empty());

        let bad_call = r#"<S-Program name="Caller"><S-Instructions>
            <S-Instruction name="QUOTE"><S-Variable>y</S-Variable><S-Instruction-Arguments>
              <S-Instruction-Argument name="functionName" value="Missing"/>
            </S-Instruction-Arguments></S-Instruction>
          </S-Instructions></S-Program>"#;
        let err = e.load_from_str(bad_call).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidProgram);
        assert!(!e.is_loaded());
    }

    #[test]
    fn listing_and_queries() {
        let mut e = Engine::new();
        e.load_from_str(COUNTER).unwrap();
        let lines = e.render(0).unwrap();
        assert_eq!(lines[0], "#1 (S) [    ] y <- x1 (4)");
        assert_eq!(lines[1], "#2 (B) [    ] y <- y + 1 (1)");
        assert_eq!(e.used_inputs().unwrap(), vec![Variable::input(1)]);
        assert_eq!(e.instruction_summary(0).unwrap(), Summary { basic: 1, synthetic: 1 });
        assert_eq!(e.names_and_labels(0).unwrap(), ["y", "x1"]);
        assert!(e.validate_program(2).unwrap());
        assert_eq!(e.cycles(0).unwrap(), 5);
        assert!(e.cycles(1).unwrap() >= 5);
        let chain = e.lineage(1, 1).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[1].0, 0);
        assert_eq!(e.instructions(3).unwrap_err().kind, ErrorKind::HostMisuse);
    }
}
