//! Thin per-resource wrappers over the gateway.
//! DTO shapes mirror the care API's camelCase JSON and carry no client-side invariants
//! beyond the input validation in `forms`.

mod alerts;
mod auth;
mod care_plans;
mod medications;
mod patients;
mod vital_signs;

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};
use crate::forms::Validate;
use crate::gateway::Gateway;

pub use alerts::{Alert, AlertRule, AlertRuleSummary, AlertStatus, AlertsApi, Severity};
pub use auth::{AuthApi, AuthResponse, LoginRequest};
pub use care_plans::{CarePlan, CarePlanInput, CarePlanPriority, CarePlanStatus, CarePlansApi};
pub use medications::{Medication, MedicationInput, MedicationsApi};
pub use patients::{Patient, PatientInput, PatientsApi};
pub use vital_signs::{VitalSign, VitalSignInput, VitalSignsApi};

/// Spring-style page envelope returned by the list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool { self.number + 1 < self.total_pages }
}

/// Entry point to every resource wrapper. Borrowing the gateway keeps a single request path.
#[derive(Clone, Copy)]
pub struct Api<'a> {
    gw: &'a Gateway,
}

impl<'a> Api<'a> {
    pub fn new(gw: &'a Gateway) -> Self { Self { gw } }

    pub fn gateway(&self) -> &'a Gateway { self.gw }
    pub fn auth(&self) -> AuthApi<'a> { AuthApi::new(self.gw) }
    pub fn patients(&self) -> PatientsApi<'a> { PatientsApi::new(self.gw) }
    pub fn medications(&self) -> MedicationsApi<'a> { MedicationsApi::new(self.gw) }
    pub fn vital_signs(&self) -> VitalSignsApi<'a> { VitalSignsApi::new(self.gw) }
    pub fn care_plans(&self) -> CarePlansApi<'a> { CarePlansApi::new(self.gw) }
    pub fn alerts(&self) -> AlertsApi<'a> { AlertsApi::new(self.gw) }
}

/// Build `/prefix/{id}/suffix` with the id percent-encoded.
pub(crate) fn resource_path(prefix: &str, id: &str, suffix: &str) -> String {
    format!("{}/{}{}", prefix, urlencoding::encode(id), suffix)
}

pub(crate) fn validated<T: Validate>(input: &T) -> ClientResult<()> {
    input.validate().map_err(ClientError::Validation)
}
