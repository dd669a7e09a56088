//! S-language interpreter.
//!
//! A [`Vm`] runs one program over a [`VarStore`]: it fetches the instruction
//! at the program counter, applies it, and follows the label outcome (fall
//! through, jump, or exit). Running off the end or jumping to an undefined
//! label halts cleanly. QUOTE-like instructions evaluate their callee in a
//! fresh store, so unexpanded programs compute the same output as their
//! expansions.

pub mod display;
pub mod store;
pub mod vm;

pub use display::{render_instruction, render_variables};
pub use store::VarStore;
pub use vm::{execute, Cursor, Halt, Run, Step, Vm};
