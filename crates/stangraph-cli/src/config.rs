//! Configuration file loading for the CLI
//!
//! This module handles finding and loading TOML configuration files
//! from various locations (explicit path, local directory, system directory).

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use stangraph::{StangraphError, config::AppConfig};

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ConfigError> for StangraphError {
    fn from(err: ConfigError) -> Self {
        StangraphError::Config(err.to_string())
    }
}

/// Find and load configuration from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (stangraph/config.toml)
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed
/// - A configured color is not a valid CSS color
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, StangraphError> {
    // 1. Try the explicitly provided path first if available
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    // 2. Try the local project directory
    let local_config = Path::new("stangraph/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    // 3. Try the platform-specific config directory
    if let Some(proj_dirs) = ProjectDirs::from("com", "stangraph", "stangraph") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    // 4. If no config is found, return default config
    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

/// Load and validate configuration from a TOML file
fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, StangraphError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;

    debug!(config:?; "Configuration loaded");
    Ok(config)
}

/// Parse TOML content and check that every configured color resolves.
fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

    let style = config.style();
    style.node_color().map_err(ConfigError::Validation)?;
    style.edge_color().map_err(ConfigError::Validation)?;
    style.background_color().map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use stangraph::config::{NodeShape, OutputFormat};

    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(
            r##"
[render]
explicit = true
formats = ["svg", "dot"]
statement_shape = "box"
leaf_shape = "circle"
splines = true

[style]
node_color = "steelblue"
edge_color = "#333333"
background_color = "white"
font_size = 12
"##,
        )
        .unwrap();

        let render = config.render();
        assert!(render.explicit());
        assert!(render.splines());
        assert_eq!(render.formats(), vec![OutputFormat::Svg, OutputFormat::Dot]);
        assert_eq!(render.statement_shape(), NodeShape::Box);
        assert_eq!(render.leaf_shape(), NodeShape::Circle);
        assert_eq!(config.style().font_size(), 12);
        assert!(config.style().background_color().unwrap().is_some());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();

        assert!(!config.render().explicit());
        assert_eq!(config.render().formats(), OutputFormat::defaults());
    }

    #[test]
    fn test_invalid_color_is_rejected() {
        let err = parse_config("[style]\nedge_color = \"bluish\"\n").unwrap_err();

        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("Invalid edge color in config"));
    }

    #[test]
    fn test_unknown_shape_is_rejected() {
        let err = parse_config("[render]\nleaf_shape = \"hexagon\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[render]\nexplicit = true").unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert!(config.render().explicit());

        let missing = file.path().with_extension("missing");
        let err = load_config(Some(&missing)).unwrap_err();
        assert!(matches!(err, StangraphError::Config(_)));
    }
}
