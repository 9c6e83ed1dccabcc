use crate::config::EditorConfig;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{debug, info};
use std::fs::File;
use std::path::Path;

/// Load and parse configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<EditorConfig> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration '{}'", config_path.display()))?;

    let config: EditorConfig = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse configuration '{}'", config_path.display()))?;

    config.validate()?;

    Ok(config)
}

/// Load the configuration at `config_path`, or defaults when no file is given
/// or the file does not exist
pub fn load_or_default(config_path: Option<&Path>) -> Result<EditorConfig> {
    match config_path {
        Some(path) if path.exists() => load_config(path),
        Some(path) => {
            info!("Configuration {:?} not found, using defaults", path);
            Ok(EditorConfig::default())
        }
        None => {
            debug!("No configuration given, using defaults");
            Ok(EditorConfig::default())
        }
    }
}
