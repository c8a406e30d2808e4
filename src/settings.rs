//! Configuration management for gamess-log.
//!
//! Settings are read from INI files with the following precedence:
//!
//! 1. Local configuration (`./gamess_log.cfg`)
//! 2. User configuration (`~/.config/gamess-log/gamess_log.cfg`)
//! 3. System configuration (`/etc/gamess-log/gamess_log.cfg`)
//! 4. Built-in defaults
//!
//! Files are applied from lowest to highest precedence, and a file only
//! overrides the keys it actually sets.
//!
//! # Configuration File Format
//!
//! ```ini
//! [parser]
//! extension = log
//!
//! [logging]
//! level = info
//! file_logging = false
//!
//! [output]
//! json = false
//! xyz = false
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use gamess_log::settings::SettingsManager;
//!
//! let settings = SettingsManager::load().unwrap();
//! println!("Reading *.{} files", settings.parser().extension);
//! ```

use configparser::ini::Ini;
use log::{debug, info, warn, LevelFilter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file at every level
pub const CONFIG_FILE_NAME: &str = "gamess_log.cfg";

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// I/O error when reading or writing configuration files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// INI parsing error
    #[error("INI parsing error: {0}")]
    IniParse(String),
    /// Invalid configuration value
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

type Section = HashMap<String, Option<String>>;

/// All program settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Settings {
    /// Input file settings
    pub parser: ParserSettings,
    /// Logging configuration
    pub logging: LoggingSettings,
    /// Export settings
    pub output: OutputSettings,
}

/// Input file settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParserSettings {
    /// Expected extension of GAMESS output files (default: "log")
    pub extension: String,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            extension: "log".to_string(),
        }
    }
}

/// Logging configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    /// Log level (default: "info")
    pub level: String,
    /// Write log messages to `gamess_log_<stem>.log` instead of the console
    pub file_logging: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_logging: false,
        }
    }
}

impl LoggingSettings {
    /// Level filter for `env_logger`; unknown names fall back to `Info`.
    pub fn level_filter(&self) -> LevelFilter {
        self.level.parse().unwrap_or(LevelFilter::Info)
    }
}

/// Export settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OutputSettings {
    /// Write a JSON snapshot next to the log
    pub json: bool,
    /// Write an XYZ geometry next to the log
    pub xyz: bool,
}

/// Configuration manager that handles loading and accessing program settings.
pub struct SettingsManager {
    settings: Settings,
    config_source: String,
}

impl SettingsManager {
    /// Loads configuration from the standard locations.
    ///
    /// A file that exists but fails to parse is skipped with a warning.
    pub fn load() -> Result<Self, ConfigError> {
        let mut paths = Vec::new();
        paths.extend(Self::get_system_config_path());
        paths.extend(Self::get_user_config_path());
        paths.push(PathBuf::from(CONFIG_FILE_NAME));

        let manager = Self::load_from(&paths)?;
        info!("Configuration loaded from: {}", manager.config_source);
        Ok(manager)
    }

    /// Loads configuration from `paths`, lowest precedence first.
    pub fn load_from(paths: &[PathBuf]) -> Result<Self, ConfigError> {
        let mut settings = Settings::default();
        let mut config_source = "built-in defaults".to_string();

        for path in paths.iter().filter(|p| p.exists()) {
            match Self::load_config(path, settings.clone()) {
                Ok(loaded) => {
                    settings = loaded;
                    config_source = path.display().to_string();
                    debug!("Loaded configuration from: {}", path.display());
                }
                Err(e) => warn!("Failed to load config from {}: {}", path.display(), e),
            }
        }

        Ok(Self {
            settings,
            config_source,
        })
    }

    /// Wraps already-built settings.
    pub fn from_settings(settings: Settings) -> Self {
        Self {
            settings,
            config_source: "built-in defaults".to_string(),
        }
    }

    /// Returns the source of the loaded configuration.
    pub fn config_source(&self) -> &str {
        &self.config_source
    }

    /// Gets a reference to the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Gets the parser settings.
    pub fn parser(&self) -> &ParserSettings {
        &self.settings.parser
    }

    /// Gets the logging settings.
    pub fn logging(&self) -> &LoggingSettings {
        &self.settings.logging
    }

    /// Gets the output settings.
    pub fn output(&self) -> &OutputSettings {
        &self.settings.output
    }

    /// Applies one INI file on top of `base`.
    fn load_config(path: &Path, base: Settings) -> Result<Settings, ConfigError> {
        let content = fs::read_to_string(path)?;
        let mut ini = Ini::new();
        ini.read(content)
            .map_err(|e| ConfigError::IniParse(format!("Failed to parse INI: {}", e)))?;

        let mut settings = base;
        let map = ini.get_map_ref();

        if let Some(section) = map.get("parser") {
            Self::parse_parser(section, &mut settings.parser)?;
        }
        if let Some(section) = map.get("logging") {
            Self::parse_logging(section, &mut settings.logging)?;
        }
        if let Some(section) = map.get("output") {
            Self::parse_output(section, &mut settings.output)?;
        }

        Ok(settings)
    }

    fn parse_parser(section: &Section, parser: &mut ParserSettings) -> Result<(), ConfigError> {
        if let Some(Some(extension)) = section.get("extension") {
            let extension = extension.trim_start_matches('.');
            if extension.is_empty() {
                return Err(ConfigError::InvalidValue("Empty extension".to_string()));
            }
            parser.extension = extension.to_string();
        }
        Ok(())
    }

    fn parse_logging(section: &Section, logging: &mut LoggingSettings) -> Result<(), ConfigError> {
        if let Some(Some(level)) = section.get("level") {
            level
                .parse::<LevelFilter>()
                .map_err(|_| ConfigError::InvalidValue(format!("Invalid log level: {}", level)))?;
            logging.level = level.to_lowercase();
        }
        if let Some(Some(file_logging)) = section.get("file_logging") {
            logging.file_logging = parse_bool("file_logging", file_logging)?;
        }
        Ok(())
    }

    fn parse_output(section: &Section, output: &mut OutputSettings) -> Result<(), ConfigError> {
        if let Some(Some(json)) = section.get("json") {
            output.json = parse_bool("json", json)?;
        }
        if let Some(Some(xyz)) = section.get("xyz") {
            output.xyz = parse_bool("xyz", xyz)?;
        }
        Ok(())
    }

    /// Gets the system configuration file path.
    fn get_system_config_path() -> Option<PathBuf> {
        #[cfg(unix)]
        {
            Some(PathBuf::from("/etc/gamess-log").join(CONFIG_FILE_NAME))
        }
        #[cfg(windows)]
        {
            std::env::var("PROGRAMDATA")
                .ok()
                .map(|pd| PathBuf::from(pd).join("gamess-log").join(CONFIG_FILE_NAME))
        }
    }

    /// Gets the user configuration file path.
    fn get_user_config_path() -> Option<PathBuf> {
        #[cfg(unix)]
        {
            std::env::var("HOME").ok().map(|home| {
                PathBuf::from(home)
                    .join(".config")
                    .join("gamess-log")
                    .join(CONFIG_FILE_NAME)
            })
        }
        #[cfg(windows)]
        {
            std::env::var("APPDATA")
                .ok()
                .map(|appdata| PathBuf::from(appdata).join("gamess-log").join(CONFIG_FILE_NAME))
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidValue(format!(
            "Invalid {} value: {}",
            key, value
        ))),
    }
}

impl SettingsManager {
    /// Writes a commented `gamess_log.cfg` template holding the defaults.
    pub fn create_template(path: &Path) -> Result<(), ConfigError> {
        fs::write(path, Self::generate_template_content())?;
        info!("Created settings template at: {}", path.display());
        Ok(())
    }

    fn generate_template_content() -> String {
        let defaults = Settings::default();
        format!(
            r#"# gamess-log configuration file
#
# Files are loaded in this order, later files overriding earlier ones:
#
# 1. System config (/etc/gamess-log/gamess_log.cfg)
# 2. User config (~/.config/gamess-log/gamess_log.cfg)
# 3. Current working directory (./gamess_log.cfg)
#
# Missing sections or keys keep the built-in defaults shown below.

[parser]
# Extension of GAMESS output files, without the dot (default: log)
extension = {}

[logging]
# Log level: error, warn, info, debug, trace (default: info)
level = {}

# Write log messages to gamess_log_<input stem>.log instead of the console
file_logging = {}

[output]
# Write <input stem>.json with the parsed molecule (default: false)
json = {}

# Write <input stem>.xyz with the geometry in Angstrom (default: false)
xyz = {}
"#,
            defaults.parser.extension,
            defaults.logging.level,
            defaults.logging.file_logging,
            defaults.output.json,
            defaults.output.xyz,
        )
    }
}
