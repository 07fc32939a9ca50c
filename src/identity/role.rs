use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Physician,
    Caregiver,
    Family,
}

impl Role {
    pub const ALL: &'static [Role] = &[Role::Admin, Role::Physician, Role::Caregiver, Role::Family];
    /// Everyone who works on the care team; excludes family members.
    pub const STAFF: &'static [Role] = &[Role::Admin, Role::Physician, Role::Caregiver];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Physician => "PHYSICIAN",
            Role::Caregiver => "CAREGIVER",
            Role::Family => "FAMILY",
        }
    }

    /// Human label used in greetings.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Physician => "Physician",
            Role::Caregiver => "Caregiver",
            Role::Family => "Family member",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "PHYSICIAN" => Ok(Role::Physician),
            "CAREGIVER" => Ok(Role::Caregiver),
            "FAMILY" => Ok(Role::Family),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// The single authorization primitive. Every role gate in the crate goes through here.
pub fn has_role(session: Option<&Session>, roles: &[Role]) -> bool {
    match session {
        Some(s) => roles.contains(&s.role),
        None => false,
    }
}

/// Named convenience flags, derived from `has_role` and never the other way round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub is_admin: bool,
    pub is_physician: bool,
    pub is_caregiver: bool,
    pub is_family: bool,
}

impl Capabilities {
    pub fn for_session(session: Option<&Session>) -> Self {
        Self {
            is_admin: has_role(session, &[Role::Admin]),
            is_physician: has_role(session, &[Role::Physician]),
            is_caregiver: has_role(session, &[Role::Caregiver]),
            is_family: has_role(session, &[Role::Family]),
        }
    }
}

/// Role-gated actions exposed by the record pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    CreatePatient,
    EditPatient,
    DeactivatePatient,
    ManageMedications,
    RecordVitalSign,
    CreateCarePlan,
    TransitionCarePlan,
}

impl Action {
    pub const ALL: &'static [Action] = &[
        Action::CreatePatient,
        Action::EditPatient,
        Action::DeactivatePatient,
        Action::ManageMedications,
        Action::RecordVitalSign,
        Action::CreateCarePlan,
        Action::TransitionCarePlan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::CreatePatient => "create-patient",
            Action::EditPatient => "edit-patient",
            Action::DeactivatePatient => "deactivate-patient",
            Action::ManageMedications => "manage-medications",
            Action::RecordVitalSign => "record-vital-sign",
            Action::CreateCarePlan => "create-care-plan",
            Action::TransitionCarePlan => "transition-care-plan",
        }
    }

    pub fn allowed_roles(&self) -> &'static [Role] {
        match self {
            Action::CreatePatient => Role::STAFF,
            Action::EditPatient => &[Role::Admin, Role::Physician],
            Action::DeactivatePatient => &[Role::Admin],
            Action::ManageMedications
            | Action::RecordVitalSign
            | Action::CreateCarePlan
            | Action::TransitionCarePlan => Role::STAFF,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}
