pub mod parse;

pub use parse::{parse_loose_date, ymd_from_compact};
