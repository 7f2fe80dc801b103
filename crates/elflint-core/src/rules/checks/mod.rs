//! Rule evaluators, grouped by the structure they look at.
//!
//! Every evaluator has the `Evaluator` signature and is registered in
//! `rules::eval::RULES`.

pub mod archive;
pub mod calls;
pub mod failure;
pub mod shlib;
pub mod stack;
