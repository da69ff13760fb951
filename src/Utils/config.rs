//! Engine settings read from a TOML document:
//! ```toml
//! [mesh]
//! theta_steps = 50
//! r_steps = 30
//! z_steps = 30
//! [surface]
//! r_steps = 30
//! theta_steps = 30
//! [integration]
//! quadrature_degree = 32
//! [logging]
//! level = "info"
//! ```
//! Every section and key is optional; missing ones keep their defaults.

use crate::Utils::logger::parse_log_level;
use crate::cylindrical::mesh::{MeshResolution, SurfaceResolution};
use crate::symbolic::symbolic_lambdify::DEFAULT_QUADRATURE_DEGREE;
use log::LevelFilter;
use std::fs;
use std::path::Path;
use thiserror::Error;
use toml::{Table, Value};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("can not read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("[{section}] {key}: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub mesh: MeshResolution,
    pub surface: SurfaceResolution,
    pub quadrature_degree: usize,
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            mesh: MeshResolution::default(),
            surface: SurfaceResolution::default(),
            quadrature_degree: DEFAULT_QUADRATURE_DEGREE,
            log_level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let document = text.parse::<Table>()?;
        let mut config = EngineConfig::default();

        if let Some(mesh) = section(&document, "mesh")? {
            read_steps(mesh, "mesh", "theta_steps", &mut config.mesh.theta_steps)?;
            read_steps(mesh, "mesh", "r_steps", &mut config.mesh.r_steps)?;
            read_steps(mesh, "mesh", "z_steps", &mut config.mesh.z_steps)?;
        }
        if let Some(surface) = section(&document, "surface")? {
            read_steps(surface, "surface", "r_steps", &mut config.surface.r_steps)?;
            read_steps(surface, "surface", "theta_steps", &mut config.surface.theta_steps)?;
        }
        if let Some(integration) = section(&document, "integration")? {
            read_steps(
                integration,
                "integration",
                "quadrature_degree",
                &mut config.quadrature_degree,
            )?;
        }
        if let Some(logging) = section(&document, "logging")? {
            if let Some(value) = logging.get("level") {
                let level = value
                    .as_str()
                    .ok_or_else(|| invalid("logging", "level", "expected a string"))?;
                if parse_log_level(level).is_none() {
                    return Err(invalid(
                        "logging",
                        "level",
                        "expected debug, info, warn, error or off",
                    ));
                }
                config.log_level = level.trim().to_lowercase();
            }
        }
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// validated at load time, so unknown strings can not reach here
    pub fn level_filter(&self) -> LevelFilter {
        parse_log_level(&self.log_level).unwrap_or(LevelFilter::Info)
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn section<'a>(document: &'a Table, name: &str) -> Result<Option<&'a Table>, ConfigError> {
    match document.get(name) {
        None => Ok(None),
        Some(Value::Table(table)) => Ok(Some(table)),
        Some(_) => Err(invalid(name, "", "expected a table")),
    }
}

/// integer >= 2
fn read_steps(table: &Table, section: &str, key: &str, target: &mut usize) -> Result<(), ConfigError> {
    let Some(value) = table.get(key) else {
        return Ok(());
    };
    let steps = value
        .as_integer()
        .ok_or_else(|| invalid(section, key, "expected an integer"))?;
    if steps < 2 {
        return Err(invalid(section, key, "must be at least 2"));
    }
    *target = steps as usize;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.mesh.theta_steps, 50);
        assert_eq!(config.mesh.r_steps, 30);
        assert_eq!(config.mesh.z_steps, 30);
        assert_eq!(config.surface.r_steps, 30);
        assert_eq!(config.quadrature_degree, 32);
        assert_eq!(config.level_filter(), LevelFilter::Info);
    }

    #[test]
    fn test_partial_document() {
        let text = r#"
            [mesh]
            theta_steps = 12
            [integration]
            quadrature_degree = 64
            [logging]
            level = "Debug"
        "#;
        let config = EngineConfig::from_toml_str(text).unwrap();
        assert_eq!(config.mesh.theta_steps, 12);
        assert_eq!(config.mesh.r_steps, 30);
        assert_eq!(config.quadrature_degree, 64);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.level_filter(), LevelFilter::Debug);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            EngineConfig::from_toml_str("[mesh]\nr_steps = 1"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("[surface]\ntheta_steps = \"many\""),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("[logging]\nlevel = \"loud\""),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("mesh = 3"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("[mesh"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[surface]\nr_steps = 8\ntheta_steps = 9").unwrap();
        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.surface.r_steps, 8);
        assert_eq!(config.surface.theta_steps, 9);

        assert!(matches!(
            EngineConfig::from_file("/definitely/not/here.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
