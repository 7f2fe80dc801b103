pub mod classify;
pub mod dynamic;
pub mod invoke;
pub mod model;
pub mod parse;
pub mod program_headers;
pub mod read;
pub mod sections;
pub mod sniff;
pub mod symbols;
