//! Config Command
//!
//! Manage Coursewright configuration.
//!
//! Usage:
//!   coursewright config show [-f json]
//!   coursewright config path
//!   coursewright config init [--force]

use std::path::Path;

use crate::cli::Output;
use crate::config::ConfigLoader;
use crate::types::Result;

/// Show the merged effective configuration
pub fn show(config_path: Option<&Path>, format: &str) -> Result<()> {
    let config = ConfigLoader::load_with(config_path)?;
    let rendered = ConfigLoader::render_config(&config, format == "json")?;
    println!("{}", rendered.trim_end());
    Ok(())
}

/// Show configuration paths
pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}

/// Initialize global configuration
pub fn init(force: bool) -> Result<()> {
    let config_path = ConfigLoader::init_global(force)?;
    let out = Output::new();
    out.success("Initialized global configuration");
    out.info(&format!("Config: {}", config_path.display()));
    Ok(())
}
