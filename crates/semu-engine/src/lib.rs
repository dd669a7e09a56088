//! Host-facing engine of the S-Emulator.
//!
//! [`Engine`] is the single entry point a front end needs: it loads a program
//! description, registers its functions, serves the program at any expansion
//! degree, runs it, keeps a history of runs and drives step-by-step debug
//! sessions. Misuse (running before loading, asking for a degree beyond the
//! maximum, running while a debug session is active) is reported as
//! [`ErrorKind::HostMisuse`](semu_syntax::ErrorKind::HostMisuse) and leaves the
//! engine unchanged.

pub mod debug;
pub mod engine;
pub mod history;
pub mod loader;

pub use debug::DebugSession;
pub use engine::Engine;
pub use history::{History, RunRecord};
pub use semu_vm::{Halt, Run, Step};
