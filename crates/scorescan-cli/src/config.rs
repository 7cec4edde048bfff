//! Configuration file loading for the CLI
//!
//! This module handles finding and loading TOML configuration files
//! from various locations (explicit path, local directory, system directory).

use std::{
    fs,
    ops::Range,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};

use scorescan::config::AppConfig;

use crate::error::{CliError, ConfigError};

/// Find and load configuration from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (scorescan/config.toml)
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed or holds invalid values
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, CliError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new("scorescan/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("org", "scorescan", "scorescan") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

/// Load and validate configuration from a TOML file
fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, CliError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;
    let config = parse_config(path.to_path_buf(), content)?;

    config
        .validate()
        .map_err(|err| ConfigError::Validation(err.to_string()))?;

    Ok(config)
}

fn parse_config(path: PathBuf, content: String) -> Result<AppConfig, ConfigError> {
    toml::from_str(&content).map_err(|err| {
        let span: Option<Range<usize>> = err.span();
        ConfigError::Parse {
            path,
            message: err.message().to_string(),
            span,
            content,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sections() {
        let content = r#"
            [grid]
            line_count = 4

            [reducer]
            mode = "relaxed"
            vip_inters = [3, 8]
        "#;
        let config = parse_config(PathBuf::from("config.toml"), content.to_string()).unwrap();

        assert_eq!(config.grid().line_count(), 4);
        assert_eq!(config.reducer().vip_inters(), &[3, 8]);
    }

    #[test]
    fn test_parse_error_has_span() {
        let content = "[reducer]\nmode = 12\n";
        let err = parse_config(PathBuf::from("config.toml"), content.to_string()).unwrap_err();

        match err {
            ConfigError::Parse { span, .. } => {
                let span = span.expect("span of the offending value");
                assert!(span.start >= "[reducer]\n".len());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = load_config(Some("does/not/exist.toml"));
        assert!(matches!(
            result,
            Err(CliError::Config(ConfigError::MissingFile(_)))
        ));
    }
}
