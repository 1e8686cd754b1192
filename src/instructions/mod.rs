//! Natural-language batch task updates: date phrases and one-line commands
//! such as `move Call plumber to next friday`.

pub mod date;
pub mod parser;

pub use date::resolve_date;
pub use parser::{parse_instructions, Instruction, ParsedInstructions, Rejected};
