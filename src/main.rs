//!
//! ghcs CLI binary
//! ---------------
//! Command-line front end for the Geriatric Home Care System API. The session is persisted
//! under GHCS_STATE_DIR so `login` once and later commands reuse it until logout or until the
//! server rejects the token.

use std::env;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, EnvFilter};

use ghcs::api::{
    AlertRuleSummary, CarePlanInput, CarePlanPriority, LoginRequest, MedicationInput, PatientInput, VitalSignInput,
};
use ghcs::cli::{print_record, print_records};
use ghcs::config::ClientConfig;
use ghcs::dashboard::Dashboard;
use ghcs::identity::Action;
use ghcs::nav::{sidebar, Route};
use ghcs::AppContext;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} <command> [options]\n\nCommands:\n  login --email <e> --password <p>   authenticate and store the session\n  logout                             forget the stored session\n  whoami                             show the current user, role and permitted actions\n  dashboard                          summary counts for the current role\n  nav                                sidebar entries visible to the current role\n  patients [--page N] [--size N] [--search S]\n  patient <id>\n  patient-create --first-name F --last-name L --dob YYYY-MM-DD [--conditions C] [--contact N] [--phone P]\n  patient-deactivate <id>\n  medications [--low-stock]\n  medication-create --name N --dosage D --stock N --reorder N [--form F] [--expires YYYY-MM-DD]\n  medication-delete <id>\n  vitals <patientId> [--latest]\n  vitals-record <patientId> [--bp SYS/DIA] [--hr N] [--temp C] [--rr N] [--spo2 P] [--notes S]\n  care-plans [--page N] [--size N] [--patient ID]\n  care-plan-create <patientId> --title T --start YYYY-MM-DD [--end YYYY-MM-DD] [--priority P] [--description S]\n  care-plan-activate <id>\n  care-plan-complete <id>\n  alerts [--patient ID]              active alerts, or every alert for one patient\n  alert-rules                        alert rules with severity summary\n\nEnvironment:\n  GHCS_API_BASE_URL   API base URL (default http://localhost:8080)\n  GHCS_STATE_DIR      directory for the persisted session (default .ghcs)\n  GHCS_OUTPUT=json    print raw JSON instead of tables\n  RUST_LOG            log filter (default info)"
    );
}

/// `--name value` lookup over the remaining args.
fn flag(args: &[String], name: &str) -> Option<String> {
    args.iter().position(|a| a == name).and_then(|i| args.get(i + 1)).cloned()
}

fn flag_num(args: &[String], name: &str, default: u32) -> Result<u32> {
    match flag(args, name) {
        Some(v) => v.parse().map_err(|_| anyhow!("{} expects a number, got '{}'", name, v)),
        None => Ok(default),
    }
}

/// `--name value` parsed into `T`; absent flags are `None`.
fn flag_parse<T: FromStr>(args: &[String], name: &str) -> Result<Option<T>> {
    match flag(args, name) {
        Some(v) => v.parse().map(Some).map_err(|_| anyhow!("{} got an invalid value '{}'", name, v)),
        None => Ok(None),
    }
}

fn required(args: &[String], name: &str) -> Result<String> {
    flag(args, name).ok_or_else(|| anyhow!("{} is required", name))
}

/// `120/80` into its two halves.
fn blood_pressure(raw: &str) -> Result<(i32, i32)> {
    let (sys, dia) = raw.split_once('/').ok_or_else(|| anyhow!("--bp expects SYS/DIA, got '{}'", raw))?;
    let half = |v: &str| v.trim().parse::<i32>().map_err(|_| anyhow!("--bp expects SYS/DIA, got '{}'", raw));
    Ok((half(sys)?, half(dia)?))
}

fn priority(raw: &str) -> Result<CarePlanPriority> {
    serde_json::from_value(serde_json::Value::String(raw.to_ascii_uppercase()))
        .map_err(|_| anyhow!("--priority expects low, medium, high or critical, got '{}'", raw))
}

fn positional(args: &[String], what: &str) -> Result<String> {
    args.first().filter(|a| !a.starts_with("--")).cloned().ok_or_else(|| anyhow!("missing {}", what))
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let argv: Vec<String> = env::args().collect();
    let program = argv.first().cloned().unwrap_or_else(|| "ghcs".to_string());
    let Some(command) = argv.get(1).cloned() else {
        print_usage(&program);
        std::process::exit(2);
    };
    let args = &argv[2..];
    if command == "-h" || command == "--help" || command == "help" {
        print_usage(&program);
        return Ok(());
    }

    let ctx = AppContext::init(ClientConfig::from_env()?)?;
    let api = ctx.api();
    let nav = ctx.navigator();

    match command.as_str() {
        "login" => {
            let email = flag(args, "--email").ok_or_else(|| anyhow!("--email is required"))?;
            let password = flag(args, "--password").ok_or_else(|| anyhow!("--password is required"))?;
            let resp = api.auth().login(&LoginRequest { email, password }).await?;
            println!("logged in as {} {} ({})", resp.first_name, resp.last_name, resp.role);
        }
        "logout" => {
            api.auth().logout()?;
            println!("logged out");
        }
        "whoami" => match ctx.store().current() {
            Some(s) => {
                let caps = ctx.store().capabilities();
                println!("{} <{}> role={}", s.display_name(), s.email, s.role);
                println!(
                    "admin={} physician={} caregiver={} family={}",
                    caps.is_admin, caps.is_physician, caps.is_caregiver, caps.is_family
                );
                let allowed: Vec<&str> =
                    Action::ALL.iter().filter(|a| ctx.store().can(**a)).map(|a| a.as_str()).collect();
                println!("actions: {}", if allowed.is_empty() { "none".to_string() } else { allowed.join(", ") });
            }
            None => println!("not logged in"),
        },
        "nav" => {
            for item in sidebar(ctx.store()) {
                println!("{:14} {}", item.label, item.route.path());
            }
        }
        "dashboard" => {
            nav.guard(&Route::Dashboard)?;
            let d = Dashboard::load(api).await?;
            let show = |v: Option<u64>| v.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string());
            println!("{}", d.greeting);
            println!("patients:     {}", show(d.total_patients));
            println!("alerts:       {}", show(d.active_alerts));
            println!("care plans:   {}", show(d.care_plans));
            println!("medications:  {}", show(d.medications));
        }
        "patients" => {
            nav.guard(&Route::Patients)?;
            let page = api
                .patients()
                .list(flag_num(args, "--page", 0)?, flag_num(args, "--size", 10)?, flag(args, "--search").as_deref())
                .await?;
            print_records(&page.content, &["id", "fullName", "age", "medicalConditions", "isActive"])?;
            println!("page {} of {} ({} total)", page.number + 1, page.total_pages.max(1), page.total_elements);
        }
        "patient" => {
            let id = positional(args, "patient id")?;
            nav.guard(&Route::PatientDetail(id.clone()))?;
            print_record(&api.patients().get(&id).await?)?;
        }
        "patient-create" => {
            nav.guard(&Route::Patients)?;
            let input = PatientInput {
                first_name: required(args, "--first-name")?,
                last_name: required(args, "--last-name")?,
                date_of_birth: required(args, "--dob")?,
                medical_conditions: flag(args, "--conditions"),
                emergency_contact: flag(args, "--contact"),
                emergency_phone: flag(args, "--phone"),
            };
            let created = api.patients().create(&input).await?;
            println!("created patient {} ({})", created.id, created.full_name);
        }
        "patient-deactivate" => {
            let id = positional(args, "patient id")?;
            nav.guard(&Route::PatientDetail(id.clone()))?;
            api.patients().deactivate(&id).await?;
            println!("deactivated patient {}", id);
        }
        "medications" => {
            nav.guard(&Route::Medications)?;
            let meds = if args.iter().any(|a| a == "--low-stock") {
                api.medications().low_stock().await?
            } else {
                api.medications().list().await?
            };
            print_records(&meds, &["id", "name", "dosage", "quantityInStock", "reorderLevel", "isLowStock", "expirationDate"])?;
        }
        "medication-create" => {
            nav.guard(&Route::Medications)?;
            let input = MedicationInput {
                name: required(args, "--name")?,
                generic_name: flag(args, "--generic-name"),
                dosage: required(args, "--dosage")?,
                form: flag(args, "--form"),
                manufacturer: flag(args, "--manufacturer"),
                expiration_date: flag(args, "--expires"),
                quantity_in_stock: flag_parse(args, "--stock")?.ok_or_else(|| anyhow!("--stock is required"))?,
                reorder_level: flag_parse(args, "--reorder")?.ok_or_else(|| anyhow!("--reorder is required"))?,
            };
            let created = api.medications().create(&input).await?;
            println!("created medication {} ({} {})", created.id, created.name, created.dosage);
        }
        "medication-delete" => {
            nav.guard(&Route::Medications)?;
            let id = positional(args, "medication id")?;
            api.medications().delete(&id).await?;
            println!("deleted medication {}", id);
        }
        "vitals" => {
            nav.guard(&Route::VitalSigns)?;
            let patient_id = positional(args, "patient id")?;
            if args.iter().any(|a| a == "--latest") {
                print_record(&api.vital_signs().latest(&patient_id).await?)?;
            } else {
                let vitals = api.vital_signs().by_patient(&patient_id).await?;
                print_records(&vitals, &["measuredAt", "bloodPressureSystolic", "bloodPressureDiastolic", "heartRate", "temperature", "oxygenSaturation"])?;
            }
        }
        "vitals-record" => {
            nav.guard(&Route::VitalSigns)?;
            let patient_id = positional(args, "patient id")?;
            let bp = flag(args, "--bp").map(|raw| blood_pressure(&raw)).transpose()?;
            let input = VitalSignInput {
                patient_id,
                blood_pressure_systolic: bp.map(|(s, _)| s),
                blood_pressure_diastolic: bp.map(|(_, d)| d),
                heart_rate: flag_parse(args, "--hr")?,
                temperature: flag_parse(args, "--temp")?,
                respiratory_rate: flag_parse(args, "--rr")?,
                oxygen_saturation: flag_parse(args, "--spo2")?,
                notes: flag(args, "--notes"),
            };
            let recorded = api.vital_signs().create(&input).await?;
            print_record(&recorded)?;
        }
        "care-plans" => {
            nav.guard(&Route::CarePlans)?;
            let page = match flag(args, "--patient") {
                Some(patient_id) => api.care_plans().by_patient(&patient_id).await?,
                None => api.care_plans().list(flag_num(args, "--page", 0)?, flag_num(args, "--size", 10)?).await?,
            };
            print_records(&page.content, &["id", "title", "patientName", "priority", "status", "completionPercentage"])?;
        }
        "care-plan-create" => {
            nav.guard(&Route::CarePlans)?;
            let input = CarePlanInput {
                patient_id: positional(args, "patient id")?,
                title: required(args, "--title")?,
                description: flag(args, "--description"),
                priority: flag(args, "--priority").map(|p| priority(&p)).transpose()?.unwrap_or(CarePlanPriority::Medium),
                start_date: required(args, "--start")?,
                end_date: flag(args, "--end"),
            };
            let created = api.care_plans().create(&input).await?;
            println!("created care plan {} ({:?})", created.id, created.status);
        }
        "care-plan-activate" | "care-plan-complete" => {
            nav.guard(&Route::CarePlans)?;
            let id = positional(args, "care plan id")?;
            let plan = if command == "care-plan-activate" {
                api.care_plans().activate(&id).await?
            } else {
                api.care_plans().complete(&id).await?
            };
            println!("care plan {} is now {:?}", plan.id, plan.status);
        }
        "alerts" => {
            nav.guard(&Route::Alerts)?;
            let alerts = match flag(args, "--patient") {
                Some(patient_id) => api.alerts().by_patient(&patient_id).await?,
                None => api.alerts().active().await?.content,
            };
            print_records(&alerts, &["triggeredAt", "patientName", "severity", "status", "message"])?;
        }
        "alert-rules" => {
            nav.guard(&Route::Alerts)?;
            let rules = api.alerts().rules().await?;
            let summary = AlertRuleSummary::from_rules(&rules);
            print_records(&rules, &["id", "patientName", "vitalSignType", "operator", "severity", "isActive"])?;
            println!("active critical: {}, active warning: {}", summary.critical, summary.warning);
        }
        other => {
            eprintln!("unknown command '{}'", other);
            print_usage(&program);
            std::process::exit(2);
        }
    }
    Ok(())
}
