//! Configuration handling for the shape CLI
//!
//! Configuration is stored in `.shape/config.toml` (project) and the
//! platform config directory, e.g. `~/.config/shape/config.toml` (global).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validation::{builtins, ModelValidator, Severity, ValidatorError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Validator settings from the `[validators]` table
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ValidatorsConfig {
    /// Validators that never run
    pub disabled: Vec<String>,

    /// Extra regular expressions for the timestamp linter
    pub timestamp_patterns: Vec<String>,

    /// Enables the opt-in linters
    pub lint: bool,
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectConfig {
    /// Model files or directories loaded when none are given
    pub sources: Vec<PathBuf>,

    /// Report unknown traits as warnings
    pub allow_unknown_traits: bool,

    /// Minimum severity to report
    pub severity: String,

    pub validators: ValidatorsConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            sources: vec![PathBuf::from("model")],
            allow_unknown_traits: false,
            severity: "warning".to_string(),
            validators: ValidatorsConfig::default(),
        }
    }
}

impl ProjectConfig {
    /// The configured minimum severity
    pub fn min_severity(&self) -> Result<Severity, ConfigError> {
        self.severity
            .parse()
            .map_err(|e: String| ConfigError::Invalid(format!("severity: {}", e)))
    }

    /// Builds the model validator these settings describe
    pub fn model_validator(&self) -> Result<ModelValidator, ValidatorError> {
        let mut validator = ModelValidator::new();
        for name in &self.validators.disabled {
            validator = validator.disable(name.as_str());
        }
        if self.validators.lint {
            let configuration = serde_json::json!({
                "additionalPatterns": self.validators.timestamp_patterns,
            });
            validator = validator.enable(builtins::SHOULD_HAVE_USED_TIMESTAMP, &configuration)?;
        }
        Ok(validator)
    }
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Combined configuration (global + project)
#[derive(Debug, Clone)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,
    pub project_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from default locations
    pub fn load() -> Result<Self> {
        let global = Self::load_global()?;
        let (project, project_root) = Self::load_project()?;

        Ok(Self {
            project,
            global,
            project_root,
        })
    }

    /// Loads configuration for a specific project
    pub fn for_project(project_root: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project_config(project_root)?;

        Ok(Self {
            project,
            global,
            project_root: Some(project_root.to_path_buf()),
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "shape", "shape").map(|dirs| dirs.config_dir().to_path_buf())
    }

    fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    fn load_project() -> Result<(ProjectConfig, Option<PathBuf>)> {
        match Self::find_project_root() {
            Some(root) => {
                let config = Self::load_project_config(&root)?;
                Ok((config, Some(root)))
            }
            None => Ok((ProjectConfig::default(), None)),
        }
    }

    fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
        let config_path = project_root.join(".shape").join("config.toml");

        if !config_path.exists() {
            return Ok(ProjectConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read project config: {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse project config")?;
        config
            .min_severity()
            .with_context(|| format!("Invalid project config: {}", config_path.display()))?;
        Ok(config)
    }

    /// Finds the project root by looking for a `.shape/` directory
    pub fn find_project_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::find_project_root_from(&current)
    }

    pub fn find_project_root_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            if current.join(".shape").is_dir() {
                return Some(current);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    pub fn is_in_project(&self) -> bool {
        self.project_root.is_some()
    }

    /// Configured sources, resolved against the project root
    pub fn sources(&self) -> Vec<PathBuf> {
        let root = self.project_root.as_deref().unwrap_or(Path::new("."));
        self.project
            .sources
            .iter()
            .map(|source| {
                if source.is_absolute() {
                    source.clone()
                } else {
                    root.join(source)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Model, Shape, ShapeId, ShapeType};
    use tempfile::TempDir;

    #[test]
    fn default_config() {
        let config = Config {
            project: ProjectConfig::default(),
            global: GlobalConfig::default(),
            project_root: None,
        };

        assert_eq!(config.project.min_severity().unwrap(), Severity::Warning);
        assert!(!config.project.allow_unknown_traits);
        assert_eq!(config.global.default_format, OutputFormat::Text);
        assert!(!config.is_in_project());
    }

    #[test]
    fn parse_project_config() {
        let toml = r#"
sources = ["models", "/abs/extra.json"]
allow_unknown_traits = true
severity = "danger"

[validators]
disabled = ["HttpQueryParamsTrait"]
timestamp_patterns = ["^expiry$"]
lint = true
"#;

        let config: ProjectConfig = toml::from_str(toml).unwrap();
        assert!(config.allow_unknown_traits);
        assert_eq!(config.min_severity().unwrap(), Severity::Danger);
        assert_eq!(config.validators.disabled, vec!["HttpQueryParamsTrait"]);
        assert!(config.validators.lint);

        let wrapped = Config {
            project: config,
            global: GlobalConfig::default(),
            project_root: Some(PathBuf::from("/project")),
        };
        assert_eq!(
            wrapped.sources(),
            vec![PathBuf::from("/project/models"), PathBuf::from("/abs/extra.json")]
        );
    }

    #[test]
    fn invalid_severity() {
        let config: ProjectConfig = toml::from_str(r#"severity = "loud""#).unwrap();
        assert!(matches!(config.min_severity(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn parse_global_config() {
        let config: GlobalConfig = toml::from_str(r#"default_format = "json""#).unwrap();
        assert_eq!(config.default_format, OutputFormat::Json);
    }

    #[test]
    fn lint_enables_the_timestamp_linter() {
        let model = Model::builder()
            .add_shape(
                Shape::builder(ShapeType::String)
                    .id(ShapeId::parse("ns#expiry").unwrap())
                    .build()
                    .unwrap(),
            )
            .build();

        let mut config = ProjectConfig::default();
        assert!(config.model_validator().unwrap().validate(&model).is_empty());

        config.validators.lint = true;
        config.validators.timestamp_patterns = vec!["^expiry$".to_string()];
        let events = config.model_validator().unwrap().validate(&model);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_id(), builtins::SHOULD_HAVE_USED_TIMESTAMP);

        config.validators.disabled = vec![builtins::SHOULD_HAVE_USED_TIMESTAMP.to_string()];
        assert!(config.model_validator().unwrap().validate(&model).is_empty());

        config.validators.timestamp_patterns = vec!["(".to_string()];
        assert!(config.model_validator().is_err());
    }

    #[test]
    fn find_project_root() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".shape")).unwrap();
        let sub_dir = dir.path().join("sub").join("dir");
        fs::create_dir_all(&sub_dir).unwrap();

        let root = Config::find_project_root_from(&sub_dir);
        assert_eq!(root.as_deref(), Some(dir.path()));
    }
}
