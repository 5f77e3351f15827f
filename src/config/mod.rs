mod schema;

pub use schema::*;

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Load a setup file (YAML, JSON or TOML).
///
/// The result is not validated yet: headless runs may still have to ask for
/// the CIFS password.
pub fn load(path: &Path) -> Result<SetupConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read setup file: {}", path.display()))?;

    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match extension {
        "yaml" | "yml" => parse_yaml(&content),
        "json" => parse_json(&content),
        "toml" => parse_toml(&content),
        _ => parse_auto(&content),
    }
}

fn parse_yaml(content: &str) -> Result<SetupConfig> {
    serde_yaml::from_str(content).context("Failed to parse YAML setup file")
}

fn parse_json(content: &str) -> Result<SetupConfig> {
    serde_json::from_str(content).context("Failed to parse JSON setup file")
}

fn parse_toml(content: &str) -> Result<SetupConfig> {
    toml::from_str(content).context("Failed to parse TOML setup file")
}

/// Auto-detect format and parse
fn parse_auto(content: &str) -> Result<SetupConfig> {
    let trimmed = content.trim();

    if trimmed.starts_with('{') {
        return parse_json(content);
    }

    // `key = value` is not a YAML mapping, so TOML is the fallback
    match parse_yaml(content) {
        Ok(config) => Ok(config),
        Err(yaml_err) => parse_toml(content).map_err(|_| yaml_err),
    }
}
