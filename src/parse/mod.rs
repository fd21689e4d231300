pub mod command;
pub mod date;

pub use command::{ParseError, ParsedCommand, parse};
pub use date::{DateError, parse_date};
