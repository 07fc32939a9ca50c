use serde::{Deserialize, Serialize};

use super::{resource_path, validated};
use crate::error::ClientResult;
use crate::forms::{FieldErrors, Validate};
use crate::gateway::Gateway;
use crate::identity::Action;

const BASE: &str = "/api/medications";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub generic_name: Option<String>,
    pub dosage: String,
    #[serde(default)]
    pub form: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub expiration_date: Option<String>,
    pub quantity_in_stock: i64,
    pub reorder_level: i64,
    #[serde(default)]
    pub is_low_stock: bool,
    #[serde(default)]
    pub is_expired: bool,
    #[serde(default)]
    pub is_expiring_soon: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generic_name: Option<String>,
    pub dosage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    pub quantity_in_stock: i64,
    pub reorder_level: i64,
}

impl Validate for MedicationInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut e = FieldErrors::new();
        e.require("name", &self.name);
        e.require("dosage", &self.dosage);
        if self.quantity_in_stock < 0 {
            e.add("quantityInStock", "must not be negative");
        }
        if self.reorder_level < 0 {
            e.add("reorderLevel", "must not be negative");
        }
        if let Some(exp) = self.expiration_date.as_deref() {
            e.date("expirationDate", exp);
        }
        e.into_result()
    }
}

pub struct MedicationsApi<'a> {
    gw: &'a Gateway,
}

impl<'a> MedicationsApi<'a> {
    pub fn new(gw: &'a Gateway) -> Self { Self { gw } }

    pub async fn list(&self) -> ClientResult<Vec<Medication>> {
        self.gw.get(BASE, &[]).await
    }

    pub async fn low_stock(&self) -> ClientResult<Vec<Medication>> {
        self.gw.get(&format!("{}/low-stock", BASE), &[]).await
    }

    pub async fn create(&self, input: &MedicationInput) -> ClientResult<Medication> {
        self.gw.store().authorize(Action::ManageMedications)?;
        validated(input)?;
        self.gw.post(BASE, input).await
    }

    pub async fn update(&self, id: &str, input: &MedicationInput) -> ClientResult<Medication> {
        self.gw.store().authorize(Action::ManageMedications)?;
        validated(input)?;
        self.gw.put(&resource_path(BASE, id, ""), input).await
    }

    pub async fn delete(&self, id: &str) -> ClientResult<()> {
        self.gw.store().authorize(Action::ManageMedications)?;
        self.gw.delete(&resource_path(BASE, id, "")).await
    }
}
