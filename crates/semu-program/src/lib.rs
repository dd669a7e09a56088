//! Program model of the S-language.
//!
//! This crate defines the value types naming cells and jump targets, the
//! tagged instruction set, programs with their label index, the repository
//! QUOTE resolves callees through, and the depth/cost analysis every other
//! stage relies on.

pub mod analysis;
pub mod instruction;
pub mod label;
pub mod program;
pub mod repository;
pub mod variable;

pub use analysis::{check_calls, max_degree, program_cycles, quote_overhead, Analyzer};
pub use instruction::{Instruction, Op};
pub use label::Label;
pub use program::{Program, Summary};
pub use repository::Repository;
pub use variable::{VarKind, Variable};
