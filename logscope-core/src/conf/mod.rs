mod error;
mod loader;
mod report;
pub mod types;
mod validate;

#[cfg(test)]
mod tests;

pub use error::ConfigError;
pub use loader::{load_config, load_spec, parse_spec};
pub use report::{ValidationIssue, ValidationReport};
pub use types::AnalyzerSpec;
pub use validate::{parse_delimiter, validate};
