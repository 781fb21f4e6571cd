pub mod analytics;
pub mod generate;
pub mod limits;
pub mod rpc;

pub use generate::{generate, generate_async, GenerateError, GenerateRequest, Generation, Strategy, Verdict};
pub use limits::SolveLimits;
