//! Step-by-step execution.
//!
//! A session owns a cursor into the program at one degree. Each step executes
//! exactly one instruction and follows its label outcome, so the next line is
//! always what the interpreter itself would execute. A session that reaches a
//! halt is recorded in the history like a normal run.

use tracing::debug;

use semu_syntax::error::{misuse, Result};
use semu_program::Variable;
use semu_vm::{Cursor, Halt, Run, Step, Vm};

use crate::engine::Engine;
use crate::history::RunRecord;

#[derive(Debug, Clone)]
pub struct DebugSession {
    pub degree: usize,
    pub inputs: Vec<u64>,
    pub cursor: Cursor,
}

const IDLE: &str = "No debug session is active";

impl Engine {
    /// Starts a session at `degree` with `x1..xn = inputs`.
    ///
    /// A program that halts before its first instruction (an empty one) is
    /// recorded right away and leaves no session behind.
    pub fn debug_start(&mut self, degree: usize, inputs: &[u64]) -> Result<()> {
        self.cycles(degree)?;
        self.load_input_values(inputs);
        let current = match self.current.as_mut() {
            Some(c) => c,
            None => return misuse("No program is loaded"),
        };
        let program = current.expander.program(degree, &self.repo)?;
        let vm = Vm::new(program, &self.repo)?;
        let cursor = vm.start(&mut self.store, self.step_limit);
        debug!(program = %program.name, degree, "debug session started");
        self.debug = Some(DebugSession {
            degree,
            inputs: inputs.to_vec(),
            cursor,
        });
        if self.debug.as_ref().map_or(false, |s| s.cursor.is_halted()) {
            self.finish_debug()?;
        }
        Ok(())
    }

    /// Executes one instruction. The returned step names the line it executed;
    /// [`Engine::debug_line`] then names the line that runs next.
    pub fn debug_step(&mut self) -> Result<Step> {
        let session = match self.debug.as_mut() {
            Some(s) => s,
            None => return misuse(IDLE),
        };
        let current = match self.current.as_mut() {
            Some(c) => c,
            None => return misuse(IDLE),
        };
        let program = current.expander.program(session.degree, &self.repo)?;
        let vm = Vm::new(program, &self.repo)?;
        let step = vm.step(&mut self.store, &mut session.cursor)?;
        if step.halt.is_some() {
            self.finish_debug()?;
        }
        Ok(step)
    }

    /// Runs the session to its halt.
    pub fn debug_resume(&mut self) -> Result<Run> {
        let session = match self.debug.as_mut() {
            Some(s) => s,
            None => return misuse(IDLE),
        };
        let current = match self.current.as_mut() {
            Some(c) => c,
            None => return misuse(IDLE),
        };
        let program = current.expander.program(session.degree, &self.repo)?;
        let vm = Vm::new(program, &self.repo)?;
        while !session.cursor.is_halted() {
            vm.step(&mut self.store, &mut session.cursor)?;
        }
        let run = Run {
            y: self.store.get(Variable::Y),
            cycles: session.cursor.cycles,
            steps: session.cursor.steps,
            halt: session.cursor.halted.unwrap_or(Halt::FellOff),
        };
        self.finish_debug()?;
        Ok(run)
    }

    /// Abandons the session without recording it.
    pub fn debug_stop(&mut self) {
        if self.debug.take().is_some() {
            debug!("debug session stopped");
        }
    }

    pub fn is_debugging(&self) -> bool {
        self.debug.is_some()
    }

    /// 1-based line that the next step executes.
    pub fn debug_line(&self) -> Option<usize> {
        self.debug.as_ref().and_then(|s| s.cursor.line())
    }

    /// Cycles executed so far in the session.
    pub fn debug_cycles(&self) -> Option<u64> {
        self.debug.as_ref().map(|s| s.cursor.cycles)
    }

    pub fn debug_degree(&self) -> Option<usize> {
        self.debug.as_ref().map(|s| s.degree)
    }

    fn finish_debug(&mut self) -> Result<RunRecord> {
        let session = match self.debug.take() {
            Some(s) => s,
            None => return misuse(IDLE),
        };
        let cycles = self.cycles(session.degree)?;
        let halt = session.cursor.halted.unwrap_or(Halt::FellOff);
        let y = self.store.get(Variable::Y);
        debug!(degree = session.degree, y, %halt, "debug session finished");
        Ok(self
            .history
            .push(session.degree, session.inputs, y, cycles, session.cursor.cycles, halt)
            .clone())
    }
}
