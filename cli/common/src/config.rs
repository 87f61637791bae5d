//! Config-file loading shared by every subcommand.

use anyhow::{Context, Result};
use inv_types::{ConfigSection, InventoryConfig};
use std::path::Path;

/// Load the config file and check the sections a command depends on.
pub fn load_config(path: &Path, sections: &[ConfigSection]) -> Result<InventoryConfig> {
    let config = InventoryConfig::from_file(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    config
        .require(sections)
        .with_context(|| format!("Incomplete config in {}", path.display()))?;
    Ok(config)
}

/// Render the effective configuration with secrets masked.
pub fn render_config(config: &InventoryConfig) -> Result<String> {
    toml::to_string_pretty(&config.redacted()).context("Failed to render config")
}
