use anyhow::Context;
use murmur_core::config::SimConfig;
use std::path::Path;

/// Reads and validates `path`, or returns the defaults when the file does not exist.
pub fn load_config(path: &Path) -> anyhow::Result<SimConfig> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "Config file not found, using defaults");
        return Ok(SimConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config = SimConfig::from_toml(&content)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    tracing::info!(path = %path.display(), fingerprint = %config.fingerprint(), "Config loaded");
    Ok(config)
}

/// Renders `config` as it would be written to `murmur.toml`.
pub fn dump_config(config: &SimConfig) -> anyhow::Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize config")
}
