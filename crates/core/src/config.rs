use std::env;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AmslaError, Result};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanConfig {
    /// Active profile name (empty = default).
    #[serde(default)]
    pub profile: String,
    #[serde(default)]
    pub partition: PartitionConfig,
}

impl PlanConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `AMSLA_PROFILE`. When set (e.g. `PROD`), every key
    /// is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Result<Self> {
        let profile = env_or("AMSLA_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Result<Self> {
        let p = profile.to_uppercase();
        let config = Self {
            profile: p.clone(),
            partition: PartitionConfig::from_env_profiled(&p)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.partition.validate()
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  partition:   algorithm={}, max_sub_graph_size={}",
            self.partition.algorithm,
            self.partition.max_sub_graph_size
        );
        match &self.partition.densities {
            Some(d) => tracing::info!("  densities:   {:?}", d),
            None => tracing::info!("  densities:   (default)"),
        }
    }

    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "partition": {
                "algorithm": self.partition.algorithm,
                "max_sub_graph_size": self.partition.max_sub_graph_size,
                "densities": self.partition.densities,
            },
        })
    }
}

// ── Partitioning ──────────────────────────────────────────────

/// Which partitioner a plan is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlgorithmKind {
    /// One sub-graph per breadth-first dependency layer.
    LevelSet,
    /// Capacity-bounded bin packing over connected components (TASSL).
    Balanced,
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlgorithmKind::LevelSet => write!(f, "level-set"),
            AlgorithmKind::Balanced => write!(f, "balanced"),
        }
    }
}

impl FromStr for AlgorithmKind {
    type Err = AmslaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "level-set" | "levelset" | "level_set" => Ok(AlgorithmKind::LevelSet),
            "balanced" | "tassl" => Ok(AlgorithmKind::Balanced),
            other => Err(AmslaError::InvalidInput(format!(
                "unknown partition algorithm '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionConfig {
    #[serde(default = "default_algorithm")]
    pub algorithm: AlgorithmKind,
    /// Hard bound on nodes per sub-graph. Ignored by the level-set partitioner.
    #[serde(default = "default_max_sub_graph_size")]
    pub max_sub_graph_size: usize,
    /// Root densities tried by the balanced partitioner, in order. `None`
    /// keeps the built-in list.
    #[serde(default)]
    pub densities: Option<Vec<f64>>,
}

fn default_algorithm() -> AlgorithmKind { AlgorithmKind::Balanced }
fn default_max_sub_graph_size() -> usize { 64 }

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            algorithm: default_algorithm(),
            max_sub_graph_size: default_max_sub_graph_size(),
            densities: None,
        }
    }
}

impl PartitionConfig {
    fn from_env_profiled(p: &str) -> Result<Self> {
        let algorithm = match profiled_env_opt(p, "PARTITION_ALGORITHM") {
            Some(v) => v.parse()?,
            None => default_algorithm(),
        };

        let max_sub_graph_size = match profiled_env_opt(p, "MAX_SUBGRAPH_SIZE") {
            Some(v) => parse_max_size(&v)?,
            None => default_max_sub_graph_size(),
        };

        let densities = profiled_env_opt(p, "PARTITION_DENSITIES")
            .map(|v| parse_densities(&v))
            .transpose()?;

        Ok(Self {
            algorithm,
            max_sub_graph_size,
            densities,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_sub_graph_size == 0 {
            return Err(AmslaError::InvalidInput(
                "max_sub_graph_size must be a positive integer".into(),
            ));
        }
        if let Some(densities) = &self.densities {
            if densities.is_empty() {
                return Err(AmslaError::InvalidInput(
                    "densities must not be empty when given".into(),
                ));
            }
            for &d in densities {
                check_density(d)?;
            }
        }
        Ok(())
    }
}

/// Densities must lie in (0, 1].
pub fn check_density(density: f64) -> Result<()> {
    if density.is_finite() && density > 0.0 && density <= 1.0 {
        Ok(())
    } else {
        Err(AmslaError::InvalidInput(format!(
            "density {} is outside (0, 1]",
            density
        )))
    }
}

fn parse_max_size(raw: &str) -> Result<usize> {
    let value: i64 = raw.trim().parse().map_err(|_| {
        AmslaError::InvalidInput(format!("MAX_SUBGRAPH_SIZE '{}' is not an integer", raw))
    })?;
    if value <= 0 {
        return Err(AmslaError::InvalidInput(format!(
            "MAX_SUBGRAPH_SIZE must be positive, got {}",
            value
        )));
    }
    usize::try_from(value)
        .map_err(|_| AmslaError::InvalidInput(format!("MAX_SUBGRAPH_SIZE {} is too large", value)))
}

fn parse_densities(raw: &str) -> Result<Vec<f64>> {
    raw.split(',')
        .map(|part| {
            part.trim().parse::<f64>().map_err(|_| {
                AmslaError::InvalidInput(format!("density '{}' is not a number", part.trim()))
            })
        })
        .collect()
}
