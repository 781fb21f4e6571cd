pub mod parse;
pub mod types;
pub mod validate;

pub use parse::{parse_parameters, InputError};
pub use types::{Assignment, Candidate, Pair, Parameter, ParameterSet, TestSuite};
