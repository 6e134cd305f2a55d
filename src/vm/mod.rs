// src/vm/mod.rs

//! Program representation and interpreter for mixed classical/quantum
//! execution.

mod interpreter;
mod program;

pub use interpreter::Vm;
pub use program::{Instruction, Program, ProgramBuilder};
