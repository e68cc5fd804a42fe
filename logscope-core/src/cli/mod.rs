mod analyze;
mod check;

#[cfg(test)]
mod tests;

pub use analyze::*;
pub use check::{check, config_error_hint};
