use serde::{Deserialize, Serialize};

use super::{resource_path, validated, Page};
use crate::error::ClientResult;
use crate::forms::{FieldErrors, Validate};
use crate::gateway::Gateway;
use crate::identity::Action;

const BASE: &str = "/api/care-plans";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CarePlanPriority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CarePlanStatus {
    Draft,
    Active,
    OnHold,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarePlan {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub priority: CarePlanPriority,
    pub status: CarePlanStatus,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    pub patient_id: String,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub total_tasks: u32,
    #[serde(default)]
    pub completed_tasks: u32,
    #[serde(default)]
    pub completion_percentage: f64,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarePlanInput {
    pub patient_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub priority: CarePlanPriority,
    pub start_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl Validate for CarePlanInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut e = FieldErrors::new();
        e.require_id("patientId", &self.patient_id);
        e.require("title", &self.title);
        let start = if self.start_date.trim().is_empty() {
            e.add("startDate", "is required");
            None
        } else {
            e.date("startDate", &self.start_date)
        };
        let end = self.end_date.as_deref().and_then(|d| e.date("endDate", d));
        if let (Some(s), Some(end)) = (start, end) {
            if end < s {
                e.add("endDate", "must not be before the start date");
            }
        }
        e.into_result()
    }
}

pub struct CarePlansApi<'a> {
    gw: &'a Gateway,
}

impl<'a> CarePlansApi<'a> {
    pub fn new(gw: &'a Gateway) -> Self { Self { gw } }

    pub async fn list(&self, page: u32, size: u32) -> ClientResult<Page<CarePlan>> {
        self.gw.get(BASE, &[("page", page.to_string()), ("size", size.to_string())]).await
    }

    pub async fn by_patient(&self, patient_id: &str) -> ClientResult<Page<CarePlan>> {
        let query = [("patientId", patient_id.to_string()), ("page", "0".to_string()), ("size", "20".to_string())];
        self.gw.get(BASE, &query).await
    }

    pub async fn create(&self, input: &CarePlanInput) -> ClientResult<CarePlan> {
        self.gw.store().authorize(Action::CreateCarePlan)?;
        validated(input)?;
        self.gw.post(BASE, input).await
    }

    pub async fn activate(&self, id: &str) -> ClientResult<CarePlan> {
        self.gw.store().authorize(Action::TransitionCarePlan)?;
        self.gw.patch(&resource_path(BASE, id, "/activate")).await
    }

    pub async fn complete(&self, id: &str) -> ClientResult<CarePlan> {
        self.gw.store().authorize(Action::TransitionCarePlan)?;
        self.gw.patch(&resource_path(BASE, id, "/complete")).await
    }
}
