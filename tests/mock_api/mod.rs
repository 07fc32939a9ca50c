//! In-process stand-in for the care API, served by axum on an ephemeral port.
//! Records the method, path, query, Authorization header and JSON body of every request it sees.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::sync::Notify;

pub const PATIENT_ID: &str = "3b241101-e2bb-4255-8caf-4136c566a962";

#[derive(Debug, Clone, PartialEq)]
pub struct Seen {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

#[derive(Clone, Default)]
pub struct MockState {
    pub seen: Arc<Mutex<Vec<Seen>>>,
    pub valid_tokens: Arc<Mutex<HashSet<String>>>,
    issued: Arc<AtomicUsize>,
    /// When set, gated endpoints park after recording the request until `release` fires.
    pub hold: Arc<AtomicBool>,
    pub received: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl MockState {
    pub fn revoke(&self, token: &str) {
        self.valid_tokens.lock().unwrap().remove(token);
    }

    pub fn seen_paths(&self) -> Vec<String> {
        self.seen.lock().unwrap().iter().map(|s| s.path.clone()).collect()
    }

    pub fn last(&self) -> Option<Seen> {
        self.seen.lock().unwrap().last().cloned()
    }

    pub fn last_authorization(&self) -> Option<String> {
        self.last().and_then(|s| s.authorization)
    }
}

pub async fn spawn(state: MockState) -> anyhow::Result<String> {
    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/patients", get(patients).post(create_patient))
        .route("/api/patients/{id}", get(patient).put(update_patient))
        .route("/api/patients/{id}/deactivate", patch(no_content))
        .route("/api/medications", get(medications).post(save_medication))
        .route("/api/medications/low-stock", get(medications))
        .route("/api/medications/{id}", put(save_medication).delete(no_content))
        .route("/api/vital-signs", post(record_vital))
        .route("/api/vital-signs/{id}", axum::routing::delete(no_content))
        .route("/api/vital-signs/patient/{id}", get(vitals_for_patient))
        .route("/api/vital-signs/patient/{id}/latest", get(latest_vital))
        .route("/api/care-plans", get(care_plans).post(create_care_plan))
        .route("/api/care-plans/{id}/activate", patch(transition_care_plan))
        .route("/api/care-plans/{id}/complete", patch(transition_care_plan))
        .route("/api/alerts", get(alerts))
        .route("/api/alerts/patient/{id}", get(alerts_for_patient))
        .route("/api/alert-rules", get(alert_rules))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{}", addr))
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({"code": "unauthorized", "message": "token expired or invalid"}))).into_response()
}

fn record(st: &MockState, method: &Method, uri: &Uri, headers: &HeaderMap, body: Option<Value>) -> Option<String> {
    let auth = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()).map(|s| s.to_string());
    st.seen.lock().unwrap().push(Seen {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(|q| q.to_string()),
        authorization: auth.clone(),
        body,
    });
    auth
}

/// Record, optionally park, then check the bearer against the issued tokens.
async fn gatekeep(st: &MockState, method: &Method, uri: &Uri, headers: &HeaderMap, body: Option<Value>) -> Result<(), Response> {
    let auth = record(st, method, uri, headers, body);
    if st.hold.load(Ordering::SeqCst) {
        st.received.notify_one();
        st.release.notified().await;
    }
    let ok = auth
        .as_deref()
        .and_then(|a| a.strip_prefix("Bearer "))
        .map(|t| st.valid_tokens.lock().unwrap().contains(t))
        .unwrap_or(false);
    if ok { Ok(()) } else { Err(unauthorized()) }
}

async fn login(State(st): State<MockState>, method: Method, uri: Uri, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    record(&st, &method, &uri, &headers, None);
    let email = body.get("email").and_then(|v| v.as_str()).unwrap_or("");
    let password = body.get("password").and_then(|v| v.as_str()).unwrap_or("");
    if password != "secret" {
        return unauthorized();
    }
    let n = st.issued.fetch_add(1, Ordering::SeqCst) + 1;
    let token = format!("T{}", n);
    st.valid_tokens.lock().unwrap().insert(token.clone());
    let role = if email.starts_with("family") {
        "FAMILY"
    } else if email.starts_with("carer") {
        "CAREGIVER"
    } else {
        "ADMIN"
    };
    Json(json!({
        "token": token,
        "type": "Bearer",
        "userId": format!("user-{}", n),
        "email": email,
        "firstName": "Marta",
        "lastName": "Soler",
        "role": role,
        "expiresAt": "2099-01-01T00:00:00"
    }))
    .into_response()
}

async fn no_content(State(st): State<MockState>, method: Method, uri: Uri, headers: HeaderMap) -> Response {
    if let Err(r) = gatekeep(&st, &method, &uri, &headers, None).await { return r; }
    StatusCode::NO_CONTENT.into_response()
}

fn patient_json() -> Value {
    json!({
        "id": PATIENT_ID,
        "firstName": "Rosa",
        "lastName": "Vidal",
        "fullName": "Rosa Vidal",
        "dateOfBirth": "1941-05-12",
        "age": 83,
        "medicalConditions": "hypertension",
        "emergencyContact": "Pau Vidal",
        "emergencyPhone": "+34 600 000 000",
        "isActive": true,
        "createdAt": "2024-01-10T09:00:00"
    })
}

async fn patients(State(st): State<MockState>, method: Method, uri: Uri, headers: HeaderMap) -> Response {
    if let Err(r) = gatekeep(&st, &method, &uri, &headers, None).await { return r; }
    Json(json!({"content": [patient_json()], "totalElements": 1, "totalPages": 1, "number": 0, "size": 10})).into_response()
}

async fn patient(State(st): State<MockState>, Path(id): Path<String>, method: Method, uri: Uri, headers: HeaderMap) -> Response {
    if let Err(r) = gatekeep(&st, &method, &uri, &headers, None).await { return r; }
    if id == PATIENT_ID {
        Json(patient_json()).into_response()
    } else {
        (StatusCode::NOT_FOUND, Json(json!({"code": "not_found", "message": format!("patient {} not found", id)}))).into_response()
    }
}

fn merged(mut base: Value, body: &Value) -> Value {
    if let (Some(b), Some(fields)) = (base.as_object_mut(), body.as_object()) {
        for (k, v) in fields {
            b.insert(k.clone(), v.clone());
        }
    }
    base
}

async fn create_patient(State(st): State<MockState>, method: Method, uri: Uri, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(r) = gatekeep(&st, &method, &uri, &headers, Some(body.clone())).await { return r; }
    let mut created = merged(patient_json(), &body);
    created["id"] = json!("9d6e1c1e-1b5a-4f5e-9f7e-2a1d3c4b5a60");
    created["fullName"] = json!(format!("{} {}", body["firstName"].as_str().unwrap_or(""), body["lastName"].as_str().unwrap_or("")));
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn update_patient(State(st): State<MockState>, Path(id): Path<String>, method: Method, uri: Uri, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(r) = gatekeep(&st, &method, &uri, &headers, Some(body.clone())).await { return r; }
    let mut updated = merged(patient_json(), &body);
    updated["id"] = json!(id);
    Json(updated).into_response()
}

fn medication_json() -> Value {
    json!({
        "id": "m1", "name": "Enalapril", "genericName": null, "dosage": "10mg", "form": "tablet",
        "manufacturer": null, "expirationDate": "2026-01-01", "quantityInStock": 3, "reorderLevel": 10,
        "isLowStock": true, "isExpired": false, "isExpiringSoon": false
    })
}

async fn medications(State(st): State<MockState>, method: Method, uri: Uri, headers: HeaderMap) -> Response {
    if let Err(r) = gatekeep(&st, &method, &uri, &headers, None).await { return r; }
    Json(json!([medication_json()])).into_response()
}

async fn save_medication(State(st): State<MockState>, method: Method, uri: Uri, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(r) = gatekeep(&st, &method, &uri, &headers, Some(body.clone())).await { return r; }
    let mut saved = merged(medication_json(), &body);
    if method == Method::POST {
        saved["id"] = json!("m2");
    }
    let low = body["quantityInStock"].as_i64().unwrap_or(0) <= body["reorderLevel"].as_i64().unwrap_or(0);
    saved["isLowStock"] = json!(low);
    Json(saved).into_response()
}

fn vital_json() -> Value {
    json!({
        "id": "v1",
        "patientId": PATIENT_ID,
        "measuredAt": "2024-06-01T08:30:00",
        "bloodPressureSystolic": 135,
        "bloodPressureDiastolic": 85,
        "heartRate": 72,
        "temperature": 36.6,
        "respiratoryRate": null,
        "oxygenSaturation": 96.0,
        "notes": null,
        "recordedBy": "Marta Soler"
    })
}

async fn record_vital(State(st): State<MockState>, method: Method, uri: Uri, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(r) = gatekeep(&st, &method, &uri, &headers, Some(body.clone())).await { return r; }
    let mut recorded = json!({
        "id": "v2",
        "measuredAt": "2024-06-02T09:00:00",
        "bloodPressureSystolic": null,
        "bloodPressureDiastolic": null,
        "heartRate": null,
        "temperature": null,
        "respiratoryRate": null,
        "oxygenSaturation": null
    });
    recorded = merged(recorded, &body);
    (StatusCode::CREATED, Json(recorded)).into_response()
}

async fn vitals_for_patient(State(st): State<MockState>, method: Method, uri: Uri, headers: HeaderMap) -> Response {
    if let Err(r) = gatekeep(&st, &method, &uri, &headers, None).await { return r; }
    Json(json!([vital_json()])).into_response()
}

async fn latest_vital(State(st): State<MockState>, method: Method, uri: Uri, headers: HeaderMap) -> Response {
    if let Err(r) = gatekeep(&st, &method, &uri, &headers, None).await { return r; }
    Json(vital_json()).into_response()
}

fn care_plan_json(status: &str) -> Value {
    json!({
        "id": "cp1",
        "title": "Fall prevention",
        "description": null,
        "priority": "HIGH",
        "status": status,
        "startDate": "2024-06-01",
        "endDate": null,
        "isActive": status == "ACTIVE",
        "patientId": PATIENT_ID,
        "patientName": "Rosa Vidal",
        "totalTasks": 4,
        "completedTasks": 1,
        "completionPercentage": 25.0,
        "createdAt": "2024-06-01T10:00:00"
    })
}

async fn care_plans(State(st): State<MockState>, method: Method, uri: Uri, headers: HeaderMap) -> Response {
    if let Err(r) = gatekeep(&st, &method, &uri, &headers, None).await { return r; }
    let content = if uri.query().unwrap_or("").contains("patientId=") { vec![care_plan_json("ACTIVE")] } else { vec![] };
    Json(json!({"content": content, "totalElements": 4, "totalPages": 4, "number": 0, "size": 1})).into_response()
}

async fn create_care_plan(State(st): State<MockState>, method: Method, uri: Uri, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(r) = gatekeep(&st, &method, &uri, &headers, Some(body.clone())).await { return r; }
    (StatusCode::CREATED, Json(merged(care_plan_json("DRAFT"), &body))).into_response()
}

async fn transition_care_plan(State(st): State<MockState>, Path(id): Path<String>, method: Method, uri: Uri, headers: HeaderMap) -> Response {
    if let Err(r) = gatekeep(&st, &method, &uri, &headers, None).await { return r; }
    let status = if uri.path().ends_with("/activate") { "ACTIVE" } else { "COMPLETED" };
    let mut plan = care_plan_json(status);
    plan["id"] = json!(id);
    Json(plan).into_response()
}

fn alert_json() -> Value {
    json!({
        "id": "a1",
        "patientName": "Rosa Vidal",
        "message": "Blood pressure above threshold",
        "severity": "CRITICAL",
        "status": "ACTIVE",
        "triggeredAt": "2024-06-01T08:31:00"
    })
}

async fn alerts(State(st): State<MockState>, method: Method, uri: Uri, headers: HeaderMap) -> Response {
    if let Err(r) = gatekeep(&st, &method, &uri, &headers, None).await { return r; }
    Json(json!({"content": [], "totalElements": 2})).into_response()
}

async fn alerts_for_patient(State(st): State<MockState>, method: Method, uri: Uri, headers: HeaderMap) -> Response {
    if let Err(r) = gatekeep(&st, &method, &uri, &headers, None).await { return r; }
    let mut acknowledged = alert_json();
    acknowledged["id"] = json!("a2");
    acknowledged["severity"] = json!("WARNING");
    acknowledged["status"] = json!("ACKNOWLEDGED");
    Json(json!([alert_json(), acknowledged])).into_response()
}

async fn alert_rules(State(st): State<MockState>, method: Method, uri: Uri, headers: HeaderMap) -> Response {
    if let Err(r) = gatekeep(&st, &method, &uri, &headers, None).await { return r; }
    Json(json!([
        {
            "id": "r1", "patientId": PATIENT_ID, "patientName": "Rosa Vidal",
            "vitalSignType": "BLOOD_PRESSURE", "operator": "GREATER_THAN",
            "thresholdMin": null, "thresholdMax": 140.0, "severity": "CRITICAL", "isActive": true
        },
        {
            "id": "r2", "patientId": null, "patientName": null,
            "vitalSignType": "HEART_RATE", "operator": "BETWEEN",
            "thresholdMin": 50.0, "thresholdMax": 110.0, "severity": "WARNING", "isActive": false
        },
        {
            "id": "r3", "vitalSignType": "GLUCOSE", "operator": "LESS_THAN",
            "thresholdMin": 70.0, "severity": "WARNING", "isActive": true
        }
    ]))
    .into_response()
}
