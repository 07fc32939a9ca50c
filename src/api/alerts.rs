use serde::{Deserialize, Serialize};

use super::{resource_path, Page};
use crate::error::ClientResult;
use crate::gateway::Gateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    #[serde(default)]
    pub patient_name: Option<String>,
    pub message: String,
    pub severity: Severity,
    pub status: AlertStatus,
    pub triggered_at: String,
}

/// Threshold rule evaluated server-side against incoming vital signs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRule {
    pub id: String,
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub patient_name: Option<String>,
    /// e.g. `BLOOD_PRESSURE`, `HEART_RATE`, `GLUCOSE`
    pub vital_sign_type: String,
    /// `GREATER_THAN`, `LESS_THAN`, `BETWEEN` or `EQUALS`
    pub operator: String,
    #[serde(default)]
    pub threshold_min: Option<f64>,
    #[serde(default)]
    pub threshold_max: Option<f64>,
    pub severity: Severity,
    pub is_active: bool,
}

impl AlertRule {
    pub fn condition(&self) -> String {
        let fmt = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_else(|| "?".into());
        match self.operator.as_str() {
            "GREATER_THAN" => format!("{} > {}", self.vital_sign_type, fmt(self.threshold_max.or(self.threshold_min))),
            "LESS_THAN" => format!("{} < {}", self.vital_sign_type, fmt(self.threshold_min.or(self.threshold_max))),
            "BETWEEN" => format!("{} between {} and {}", self.vital_sign_type, fmt(self.threshold_min), fmt(self.threshold_max)),
            "EQUALS" => format!("{} = {}", self.vital_sign_type, fmt(self.threshold_min.or(self.threshold_max))),
            other => format!("{} {}", self.vital_sign_type, other),
        }
    }
}

/// Counts shown on the alerts summary cards: active rules only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlertRuleSummary {
    pub critical: usize,
    pub warning: usize,
}

impl AlertRuleSummary {
    pub fn from_rules(rules: &[AlertRule]) -> Self {
        let count = |sev: Severity| rules.iter().filter(|r| r.is_active && r.severity == sev).count();
        Self { critical: count(Severity::Critical), warning: count(Severity::Warning) }
    }
}

pub struct AlertsApi<'a> {
    gw: &'a Gateway,
}

impl<'a> AlertsApi<'a> {
    pub fn new(gw: &'a Gateway) -> Self { Self { gw } }

    /// First page of active alerts, as shown on the dashboard.
    pub async fn active(&self) -> ClientResult<Page<Alert>> {
        let query = [("status", "ACTIVE".to_string()), ("page", "0".to_string()), ("size", "5".to_string())];
        self.gw.get("/api/alerts", &query).await
    }

    pub async fn rules(&self) -> ClientResult<Vec<AlertRule>> {
        self.gw.get("/api/alert-rules", &[]).await
    }

    pub async fn by_patient(&self, patient_id: &str) -> ClientResult<Vec<Alert>> {
        self.gw.get(&resource_path("/api/alerts/patient", patient_id, ""), &[]).await
    }
}
