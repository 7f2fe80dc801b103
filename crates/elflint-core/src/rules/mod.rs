pub mod catalog;
pub mod checks;
pub mod classify;
pub mod context;
pub mod eval;
pub mod patterns;
