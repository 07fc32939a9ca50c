//! Dashboard summary cards.

use tracing::warn;

use crate::api::Api;
use crate::error::{ClientError, ClientResult};
use crate::identity::Role;

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub greeting: String,
    pub role: Role,
    pub total_patients: Option<u64>,
    /// `None` when the card failed to load or is hidden for the role.
    pub active_alerts: Option<u64>,
    pub care_plans: Option<u64>,
    pub medications: Option<u64>,
}

impl Dashboard {
    /// Fetch every card concurrently. A rejected session fails the whole load (the gateway has
    /// already logged out); any other card failure only blanks that card.
    pub async fn load(api: Api<'_>) -> ClientResult<Self> {
        let store = api.gateway().store();
        let session = store
            .current()
            .ok_or_else(|| ClientError::Unauthorized { message: "login required".into() })?;
        let staff = store.has_role(Role::STAFF);

        let patients = api.patients();
        let alerts = api.alerts();
        let care_plans = api.care_plans();
        let medications = api.medications();

        let (p, a, c, m) = tokio::join!(
            async { patients.list(0, 1, None).await.map(|pg| pg.total_elements) },
            async {
                if staff { Some(alerts.active().await.map(|pg| pg.total_elements)) } else { None }
            },
            async { care_plans.list(0, 1).await.map(|pg| pg.total_elements) },
            async {
                if staff { Some(medications.list().await.map(|v| v.len() as u64)) } else { None }
            },
        );

        Ok(Self {
            greeting: format!("Welcome, {} ({})", session.first_name, session.role.label()),
            role: session.role,
            total_patients: card("patients", p)?,
            active_alerts: a.map(|r| card("alerts", r)).transpose()?.flatten(),
            care_plans: card("care_plans", c)?,
            medications: m.map(|r| card("medications", r)).transpose()?.flatten(),
        })
    }
}

fn card(name: &str, result: ClientResult<u64>) -> ClientResult<Option<u64>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.is_session_rejection() => Err(e),
        Err(e) => {
            warn!(target: "ghcs::dashboard", card = name, error = %e, "card failed to load");
            Ok(None)
        }
    }
}
