use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{CoreError, Plan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BillingInterval {
    Monthly,
    Yearly,
}

impl BillingInterval {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BillingInterval::Monthly => "MONTHLY",
            BillingInterval::Yearly => "YEARLY",
        }
    }

    /// Length of one credit cycle.
    #[must_use]
    pub fn cycle_length(self) -> Duration {
        match self {
            BillingInterval::Monthly => Duration::days(30),
            BillingInterval::Yearly => Duration::days(365),
        }
    }
}

impl fmt::Display for BillingInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingInterval {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MONTHLY" | "EVERY_30_DAYS" => Ok(BillingInterval::Monthly),
            "YEARLY" | "ANNUAL" => Ok(BillingInterval::Yearly),
            _ => Err(CoreError::InvalidBillingInterval(s.to_string())),
        }
    }
}

/// One storefront tenant.
///
/// `credits` never goes below zero: it is only decremented by a conditional
/// debit and only incremented by a cycle recharge or a refund.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shop {
    pub id: i64,
    /// Storefront domain, e.g. `"acme-yoga.myshopify.com"`.
    pub domain: String,
    pub plan: Plan,
    pub credits: i32,
    pub credit_cap: i32,
    pub billing_interval: BillingInterval,
    pub cycle_started_at: DateTime<Utc>,
    pub cycle_ends_at: DateTime<Utc>,
    pub installed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn billing_interval_round_trips_through_str() {
        for interval in [BillingInterval::Monthly, BillingInterval::Yearly] {
            assert_eq!(
                interval.to_string().parse::<BillingInterval>().unwrap(),
                interval
            );
        }
    }

    #[test]
    fn yearly_cycle_is_longer_than_monthly() {
        assert!(BillingInterval::Yearly.cycle_length() > BillingInterval::Monthly.cycle_length());
        assert_eq!(BillingInterval::Monthly.cycle_length().num_days(), 30);
    }
}
