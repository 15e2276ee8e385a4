// src/config.rs
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::MAX_EVENTS_PER_OPERATION;
use crate::types::EventType;

/// Top-level benchmark configuration (YAML)
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Shape of the fill-events workload
    pub fill_events: FillEventsConfig,

    /// Number of write requests to pre-generate during set-up and replay
    /// during the run phase.
    #[serde(default = "default_num_operations")]
    pub num_operations: u64,

    /// Optional seed for the workload's generator. Omit for a random seed.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Optional bound on consecutive rejected draws while searching for an
    /// unused OUTPUT artifact.
    #[serde(default)]
    pub max_consecutive_rejections: Option<u64>,

    /// Population seeded into the in-memory store used by the CLI
    #[serde(default)]
    pub population: PopulationConfig,
}

fn default_num_operations() -> u64 {
    crate::constants::DEFAULT_NUM_OPERATIONS
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FillEventsConfig {
    /// Which kind of event the workload writes: INPUT or OUTPUT
    pub specification: EventType,

    /// Events per write request, drawn uniformly from [minimum, maximum]
    pub num_events: UniformRange,

    /// Popularity of existing artifacts as event targets
    #[serde(default)]
    pub artifact_node_popularity: CategoricalDistribution,

    /// Popularity of existing executions as event targets
    #[serde(default)]
    pub execution_node_popularity: CategoricalDistribution,
}

/// Inclusive integer range
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct UniformRange {
    pub minimum: u64,
    pub maximum: u64,
}

/// Categorical distribution with a symmetric Dirichlet prior
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct CategoricalDistribution {
    #[serde(default = "default_dirichlet_alpha")]
    pub dirichlet_alpha: f64,
}

impl Default for CategoricalDistribution {
    fn default() -> Self {
        Self {
            dirichlet_alpha: default_dirichlet_alpha(),
        }
    }
}

fn default_dirichlet_alpha() -> f64 {
    crate::constants::DEFAULT_DIRICHLET_ALPHA
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct PopulationConfig {
    #[serde(default = "default_population_artifacts")]
    pub artifacts: u64,
    #[serde(default = "default_population_executions")]
    pub executions: u64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            artifacts: default_population_artifacts(),
            executions: default_population_executions(),
        }
    }
}

fn default_population_artifacts() -> u64 {
    crate::constants::DEFAULT_POPULATION_ARTIFACTS
}

fn default_population_executions() -> u64 {
    crate::constants::DEFAULT_POPULATION_EXECUTIONS
}

impl Config {
    /// Read and parse a YAML config file without validating it
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let buf = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
        serde_yaml::from_slice(&buf).with_context(|| format!("parse {}", path.display()))
    }

    /// Read, parse and validate a YAML config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let cfg = Self::parse_file(path)?;
        cfg.validate()
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        self.fill_events.validate()?;
        if self.num_operations == 0 {
            bail!("num_operations must be > 0");
        }
        if self.max_consecutive_rejections == Some(0) {
            bail!("max_consecutive_rejections must be > 0 when set");
        }
        if self.population.artifacts == 0 || self.population.executions == 0 {
            bail!(
                "population needs at least one artifact and one execution (got {} / {})",
                self.population.artifacts,
                self.population.executions
            );
        }
        Ok(())
    }
}

impl FillEventsConfig {
    pub fn validate(&self) -> Result<()> {
        let range = self.num_events;
        if range.minimum > range.maximum {
            bail!(
                "num_events: minimum ({}) > maximum ({})",
                range.minimum,
                range.maximum
            );
        }
        if range.maximum > MAX_EVENTS_PER_OPERATION {
            bail!(
                "num_events: maximum ({}) exceeds the limit of {} events per operation",
                range.maximum,
                MAX_EVENTS_PER_OPERATION
            );
        }
        check_alpha("artifact_node_popularity", self.artifact_node_popularity.dirichlet_alpha)?;
        check_alpha("execution_node_popularity", self.execution_node_popularity.dirichlet_alpha)?;
        Ok(())
    }
}

fn check_alpha(field: &str, alpha: f64) -> Result<()> {
    if !alpha.is_finite() || alpha <= 0.0 {
        bail!("{}.dirichlet_alpha must be a finite value > 0 (got {})", field, alpha);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
fill_events:
  specification: OUTPUT
  num_events: { minimum: 2, maximum: 5 }
  artifact_node_popularity: { dirichlet_alpha: 0.5 }
  execution_node_popularity: { dirichlet_alpha: 3.0 }
num_operations: 50
seed: 1234
max_consecutive_rejections: 1000
population:
  artifacts: 200
  executions: 20
"#;

    #[test]
    fn test_parse_full_config() {
        let cfg: Config = serde_yaml::from_str(FULL).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.fill_events.specification, EventType::Output);
        assert_eq!(cfg.fill_events.num_events, UniformRange { minimum: 2, maximum: 5 });
        assert_eq!(cfg.fill_events.artifact_node_popularity.dirichlet_alpha, 0.5);
        assert_eq!(cfg.fill_events.execution_node_popularity.dirichlet_alpha, 3.0);
        assert_eq!(cfg.num_operations, 50);
        assert_eq!(cfg.seed, Some(1234));
        assert_eq!(cfg.max_consecutive_rejections, Some(1000));
        assert_eq!(cfg.population.artifacts, 200);
    }

    #[test]
    fn test_defaults() {
        let yaml = r#"
fill_events:
  specification: INPUT
  num_events: { minimum: 1, maximum: 1 }
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.num_operations, crate::constants::DEFAULT_NUM_OPERATIONS);
        assert_eq!(cfg.seed, None);
        assert_eq!(cfg.max_consecutive_rejections, None);
        assert_eq!(cfg.fill_events.artifact_node_popularity.dirichlet_alpha, 1.0);
        assert_eq!(cfg.population, PopulationConfig::default());
        assert_eq!(cfg.fill_events.specification.as_str(), "INPUT");
    }

    #[test]
    fn test_unknown_specification_rejected() {
        let yaml = r#"
fill_events:
  specification: SIDEWAYS
  num_events: { minimum: 1, maximum: 1 }
"#;
        assert!(serde_yaml::from_str::<Config>(yaml).is_err());
    }

    #[test]
    fn test_validation_errors() {
        let mut cfg: Config = serde_yaml::from_str(FULL).unwrap();
        cfg.fill_events.num_events = UniformRange { minimum: 5, maximum: 2 };
        assert!(cfg.validate().unwrap_err().to_string().contains("minimum"));

        let mut cfg: Config = serde_yaml::from_str(FULL).unwrap();
        cfg.fill_events.artifact_node_popularity.dirichlet_alpha = 0.0;
        assert!(cfg.validate().unwrap_err().to_string().contains("artifact_node_popularity"));

        let mut cfg: Config = serde_yaml::from_str(FULL).unwrap();
        cfg.fill_events.execution_node_popularity.dirichlet_alpha = f64::NAN;
        assert!(cfg.validate().is_err());

        let mut cfg: Config = serde_yaml::from_str(FULL).unwrap();
        cfg.fill_events.num_events = UniformRange { minimum: 1, maximum: u64::MAX };
        assert!(cfg.validate().unwrap_err().to_string().contains("exceeds the limit"));
        cfg.fill_events.num_events.maximum = MAX_EVENTS_PER_OPERATION;
        cfg.validate().unwrap();

        let mut cfg: Config = serde_yaml::from_str(FULL).unwrap();
        cfg.num_operations = 0;
        assert!(cfg.validate().is_err());

        let mut cfg: Config = serde_yaml::from_str(FULL).unwrap();
        cfg.max_consecutive_rejections = Some(0);
        assert!(cfg.validate().is_err());

        let mut cfg: Config = serde_yaml::from_str(FULL).unwrap();
        cfg.population.executions = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fill.yaml");
        std::fs::write(&path, FULL).unwrap();
        let cfg = Config::from_file(&path).unwrap();
        assert_eq!(cfg.num_operations, 50);

        std::fs::write(&path, FULL.replace("num_operations: 50", "num_operations: 0")).unwrap();
        assert!(Config::from_file(&path).is_err());
        assert!(Config::from_file(dir.path().join("missing.yaml")).is_err());
    }

    #[test]
    fn test_parse_file_skips_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fill.yaml");
        std::fs::write(&path, FULL.replace("num_operations: 50", "num_operations: 0")).unwrap();

        let cfg = Config::parse_file(&path).unwrap();
        assert_eq!(cfg.num_operations, 0);
        assert!(cfg.validate().is_err());

        std::fs::write(&path, "fill_events: [").unwrap();
        let err = Config::parse_file(&path).unwrap_err();
        assert!(err.to_string().starts_with("parse "));
    }
}
