use serde::{Deserialize, Serialize};

use super::{resource_path, validated, Page};
use crate::error::ClientResult;
use crate::forms::{FieldErrors, Validate};
use crate::gateway::Gateway;
use crate::identity::Action;

const BASE: &str = "/api/patients";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub full_name: String,
    pub date_of_birth: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub medical_conditions: Option<String>,
    #[serde(default)]
    pub emergency_contact: Option<String>,
    #[serde(default)]
    pub emergency_phone: Option<String>,
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientInput {
    pub first_name: String,
    pub last_name: String,
    /// `YYYY-MM-DD`
    pub date_of_birth: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_conditions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_phone: Option<String>,
}

impl Validate for PatientInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut e = FieldErrors::new();
        e.require("firstName", &self.first_name);
        e.require("lastName", &self.last_name);
        if self.date_of_birth.trim().is_empty() {
            e.add("dateOfBirth", "is required");
        } else if let Some(dob) = e.date("dateOfBirth", &self.date_of_birth) {
            e.not_in_future("dateOfBirth", dob);
        }
        if let Some(phone) = self.emergency_phone.as_deref() {
            if !phone.chars().all(|c| c.is_ascii_digit() || " +-()".contains(c)) {
                e.add("emergencyPhone", "must contain only digits and + - ( ) separators");
            }
        }
        e.into_result()
    }
}

pub struct PatientsApi<'a> {
    gw: &'a Gateway,
}

impl<'a> PatientsApi<'a> {
    pub fn new(gw: &'a Gateway) -> Self { Self { gw } }

    pub async fn list(&self, page: u32, size: u32, search: Option<&str>) -> ClientResult<Page<Patient>> {
        let mut query = vec![("page", page.to_string()), ("size", size.to_string())];
        if let Some(s) = search.map(str::trim).filter(|s| !s.is_empty()) {
            query.push(("search", s.to_string()));
        }
        self.gw.get(BASE, &query).await
    }

    pub async fn get(&self, id: &str) -> ClientResult<Patient> {
        self.gw.get(&resource_path(BASE, id, ""), &[]).await
    }

    pub async fn create(&self, input: &PatientInput) -> ClientResult<Patient> {
        self.gw.store().authorize(Action::CreatePatient)?;
        validated(input)?;
        self.gw.post(BASE, input).await
    }

    pub async fn update(&self, id: &str, input: &PatientInput) -> ClientResult<Patient> {
        self.gw.store().authorize(Action::EditPatient)?;
        validated(input)?;
        self.gw.put(&resource_path(BASE, id, ""), input).await
    }

    pub async fn deactivate(&self, id: &str) -> ClientResult<()> {
        self.gw.store().authorize(Action::DeactivatePatient)?;
        self.gw.patch_empty(&resource_path(BASE, id, "/deactivate")).await
    }
}
