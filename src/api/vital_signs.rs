use serde::{Deserialize, Serialize};

use super::{resource_path, validated};
use crate::error::ClientResult;
use crate::forms::{FieldErrors, Validate};
use crate::gateway::Gateway;
use crate::identity::Action;

const BASE: &str = "/api/vital-signs";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalSign {
    pub id: String,
    pub patient_id: String,
    pub measured_at: String,
    pub blood_pressure_systolic: Option<i32>,
    pub blood_pressure_diastolic: Option<i32>,
    pub heart_rate: Option<i32>,
    pub temperature: Option<f64>,
    pub respiratory_rate: Option<i32>,
    pub oxygen_saturation: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub recorded_by: Option<String>,
}

impl VitalSign {
    /// `120/80` style reading, when both halves were captured.
    pub fn blood_pressure(&self) -> Option<String> {
        match (self.blood_pressure_systolic, self.blood_pressure_diastolic) {
            (Some(s), Some(d)) => Some(format!("{}/{}", s, d)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalSignInput {
    pub patient_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_pressure_systolic: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_pressure_diastolic: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub respiratory_rate: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oxygen_saturation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Validate for VitalSignInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut e = FieldErrors::new();
        e.require_id("patientId", &self.patient_id);
        let measured = [
            self.blood_pressure_systolic.is_some(),
            self.blood_pressure_diastolic.is_some(),
            self.heart_rate.is_some(),
            self.temperature.is_some(),
            self.respiratory_rate.is_some(),
            self.oxygen_saturation.is_some(),
        ];
        if !measured.iter().any(|m| *m) {
            e.add("measurements", "at least one measurement is required");
        }
        if self.blood_pressure_systolic.is_some() != self.blood_pressure_diastolic.is_some() {
            e.add("bloodPressure", "systolic and diastolic must be given together");
        }
        e.range("bloodPressureSystolic", self.blood_pressure_systolic, 40, 300);
        e.range("bloodPressureDiastolic", self.blood_pressure_diastolic, 20, 200);
        e.range("heartRate", self.heart_rate, 20, 250);
        e.range("temperature", self.temperature, 30.0, 45.0);
        e.range("respiratoryRate", self.respiratory_rate, 4, 60);
        e.range("oxygenSaturation", self.oxygen_saturation, 0.0, 100.0);
        e.into_result()
    }
}

pub struct VitalSignsApi<'a> {
    gw: &'a Gateway,
}

impl<'a> VitalSignsApi<'a> {
    pub fn new(gw: &'a Gateway) -> Self { Self { gw } }

    pub async fn by_patient(&self, patient_id: &str) -> ClientResult<Vec<VitalSign>> {
        self.gw.get(&resource_path(&format!("{}/patient", BASE), patient_id, ""), &[]).await
    }

    pub async fn latest(&self, patient_id: &str) -> ClientResult<VitalSign> {
        self.gw.get(&resource_path(&format!("{}/patient", BASE), patient_id, "/latest"), &[]).await
    }

    pub async fn create(&self, input: &VitalSignInput) -> ClientResult<VitalSign> {
        self.gw.store().authorize(Action::RecordVitalSign)?;
        validated(input)?;
        self.gw.post(BASE, input).await
    }

    pub async fn delete(&self, id: &str) -> ClientResult<()> {
        self.gw.store().authorize(Action::RecordVitalSign)?;
        self.gw.delete(&resource_path(BASE, id, "")).await
    }
}
