use crate::conf::error::ConfigError;
use crate::conf::types::AnalyzerSpec;
use crate::conf::validate::validate;
use crate::pipeline::PipelineConfig;

use std::fs;
use std::path::Path;

/// Reads and parses an HCL config file without validating it.
pub fn load_spec(path: &Path) -> Result<AnalyzerSpec, ConfigError> {
    //--------------------------------------------------------------------------
    // Hard fail: IO and parsing
    //--------------------------------------------------------------------------
    let raw = fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    parse_spec(&raw, path)
}

pub fn parse_spec(raw: &str, path: &Path) -> Result<AnalyzerSpec, ConfigError> {
    hcl::from_str(raw).map_err(|e| ConfigError::parse(path, e))
}

/// Loads, parses and validates a config file in one step.
pub fn load_config(path: &Path, streaming: bool) -> Result<PipelineConfig, ConfigError> {
    let spec = load_spec(path)?;

    //--------------------------------------------------------------------------
    // Semantic validation (aggregate all errors)
    //--------------------------------------------------------------------------
    validate(&spec, streaming).map_err(|report| ConfigError::Validation { report })
}
