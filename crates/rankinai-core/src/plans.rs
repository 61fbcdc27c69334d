use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, CoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Plan {
    Trial,
    Starter,
    Growth,
    Pro,
}

impl Plan {
    pub const ALL: [Plan; 4] = [Plan::Trial, Plan::Starter, Plan::Growth, Plan::Pro];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Plan::Trial => "TRIAL",
            Plan::Starter => "STARTER",
            Plan::Growth => "GROWTH",
            Plan::Pro => "PRO",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TRIAL" => Ok(Plan::Trial),
            "STARTER" => Ok(Plan::Starter),
            "GROWTH" => Ok(Plan::Growth),
            "PRO" => Ok(Plan::Pro),
            _ => Err(CoreError::InvalidPlan(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanAllotment {
    pub plan: Plan,
    pub monthly_credits: i32,
}

/// Credits granted per plan and the cost of each metered operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTable {
    pub plans: Vec<PlanAllotment>,
    #[serde(default = "default_cost")]
    pub scan_cost: i32,
    #[serde(default = "default_cost")]
    pub recommendation_cost: i32,
}

fn default_cost() -> i32 {
    1
}

impl Default for PricingTable {
    fn default() -> Self {
        Self {
            plans: vec![
                PlanAllotment {
                    plan: Plan::Trial,
                    monthly_credits: 10,
                },
                PlanAllotment {
                    plan: Plan::Starter,
                    monthly_credits: 100,
                },
                PlanAllotment {
                    plan: Plan::Growth,
                    monthly_credits: 300,
                },
                PlanAllotment {
                    plan: Plan::Pro,
                    monthly_credits: 1000,
                },
            ],
            scan_cost: 1,
            recommendation_cost: 1,
        }
    }
}

impl PricingTable {
    /// Credits granted to `plan` at the start of each cycle.
    ///
    /// Validated tables contain every plan, so the zero fallback is only
    /// reachable for hand-built tables.
    #[must_use]
    pub fn credits_for(&self, plan: Plan) -> i32 {
        self.plans
            .iter()
            .find(|a| a.plan == plan)
            .map_or(0, |a| a.monthly_credits)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for allotment in &self.plans {
            if !seen.insert(allotment.plan) {
                return Err(ConfigError::Validation(format!(
                    "duplicate plan entry: {}",
                    allotment.plan
                )));
            }
            if allotment.monthly_credits < 0 {
                return Err(ConfigError::Validation(format!(
                    "plan {} has negative monthly_credits {}",
                    allotment.plan, allotment.monthly_credits
                )));
            }
        }

        if let Some(missing) = Plan::ALL.iter().find(|p| !seen.contains(p)) {
            return Err(ConfigError::Validation(format!(
                "plans file is missing plan {missing}"
            )));
        }

        if self.scan_cost < 1 || self.recommendation_cost < 1 {
            return Err(ConfigError::Validation(
                "scan_cost and recommendation_cost must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Load the pricing table from a YAML file, or the built-in table when no
/// path is configured.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_pricing(path: Option<&Path>) -> Result<PricingTable, ConfigError> {
    let Some(path) = path else {
        return Ok(PricingTable::default());
    };

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::PlansFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_pricing(&content)
}

fn parse_pricing(content: &str) -> Result<PricingTable, ConfigError> {
    let table: PricingTable = serde_yaml::from_str(content)?;
    table.validate()?;
    Ok(table)
}
