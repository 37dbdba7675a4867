//! Deployment manifest for the workflow orchestrator.
//!
//! `deploy/deployments.toml` declares how each flow is deployed: container
//! image, work pool, flow parameters and cron cadence. Schedule evaluation
//! and dispatch stay with the orchestrator; this module validates the
//! declarations before they are applied and answers operator questions
//! (`quanterra deployments list`).

use chrono::{DateTime, Utc};
use cron::Schedule;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::str::FromStr;

use crate::config::Environment;
use crate::utils::error::{QuanterraError, Result};

/// Runner subcommands a deployment entrypoint may reference.
pub const KNOWN_ENTRYPOINTS: [&str; 6] = [
    "eodhd",
    "oanda",
    "yahoo-finance",
    "interactive-investor",
    "hargreaves-lansdown",
    "ingestion",
];

/// The managed pool every deployment targets.
pub const WORK_POOL: &str = "cloud-run-push";

/// One deployment entry: a flow, how to invoke it, and when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentSpec {
    pub name: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub description: String,

    /// Runner subcommand the container executes for this deployment.
    pub entrypoint: String,

    /// Flow parameters passed on the invocation, e.g. dataset switches.
    #[serde(default)]
    pub parameters: BTreeMap<String, toml::Value>,

    pub work_pool: String,

    #[serde(default)]
    pub work_queue: Option<String>,

    /// Job image reference, tag required.
    pub image: String,

    /// Cron cadence, 5 or 6 fields. None for on-demand deployments
    /// triggered by the upload CLI.
    #[serde(default)]
    pub schedule: Option<String>,

    pub env: Environment,
}

impl DeploymentSpec {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(QuanterraError::ValidationError {
                message: "Deployment requires a name".to_string(),
            });
        }

        if !KNOWN_ENTRYPOINTS.contains(&self.entrypoint.as_str()) {
            return Err(QuanterraError::InvalidConfigValueError {
                field: format!("deployment.{}.entrypoint", self.name),
                value: self.entrypoint.clone(),
                reason: format!("Unknown entrypoint. Known: {}", KNOWN_ENTRYPOINTS.join(", ")),
            });
        }

        if self.work_pool != WORK_POOL {
            return Err(QuanterraError::InvalidConfigValueError {
                field: format!("deployment.{}.work_pool", self.name),
                value: self.work_pool.clone(),
                reason: format!("Deployments run on the '{WORK_POOL}' pool"),
            });
        }

        if !self.image.contains(':') {
            return Err(QuanterraError::InvalidConfigValueError {
                field: format!("deployment.{}.image", self.name),
                value: self.image.clone(),
                reason: "Image reference requires an explicit tag".to_string(),
            });
        }

        self.cron_schedule()?;
        Ok(())
    }

    /// Parsed schedule, normalized to the seconds-first form the `cron`
    /// crate expects. None for on-demand deployments.
    pub fn cron_schedule(&self) -> Result<Option<Schedule>> {
        let Some(expression) = &self.schedule else {
            return Ok(None);
        };

        let schedule = Schedule::from_str(&normalize_cron(expression)).map_err(|e| {
            QuanterraError::ScheduleError {
                expression: expression.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(Some(schedule))
    }

    /// The next `n` fire times, empty for on-demand deployments.
    pub fn next_runs(&self, n: usize) -> Result<Vec<DateTime<Utc>>> {
        Ok(self
            .cron_schedule()?
            .map(|schedule| schedule.upcoming(Utc).take(n).collect())
            .unwrap_or_default())
    }
}

/// Standard 5-field cron lacks the seconds field the `cron` crate wants;
/// prepend second zero. 6-field expressions pass through.
fn normalize_cron(expression: &str) -> String {
    if expression.split_whitespace().count() == 5 {
        format!("0 {expression}")
    } else {
        expression.to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentManifest {
    #[serde(rename = "deployment")]
    pub deployments: Vec<DeploymentSpec>,
}

impl DeploymentManifest {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(QuanterraError::ConfigError {
                message: format!("Deployment manifest not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(QuanterraError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let manifest: DeploymentManifest =
            toml::from_str(content).map_err(|e| QuanterraError::ConfigValidationError {
                field: "toml_parsing".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<()> {
        if self.deployments.is_empty() {
            return Err(QuanterraError::ValidationError {
                message: "Deployment manifest has no deployments".to_string(),
            });
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for deployment in &self.deployments {
            if !seen.insert(deployment.name.as_str()) {
                return Err(QuanterraError::ValidationError {
                    message: format!(
                        "Deployment '{}' is declared more than once",
                        deployment.name
                    ),
                });
            }
            deployment.validate()?;
        }

        Ok(())
    }

    pub fn for_environment(
        &self,
        environment: Environment,
    ) -> impl Iterator<Item = &DeploymentSpec> {
        self.deployments
            .iter()
            .filter(move |d| d.env == environment)
    }
}
