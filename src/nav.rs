//! Navigation boundary: routes, role gating, and the forced redirect to login.

use std::future::Future;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::{ClientError, ClientResult};
use crate::identity::{Role, SessionEvent, SessionStore, SubscriptionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
    Patients,
    PatientDetail(String),
    VitalSigns,
    Medications,
    CarePlans,
    Alerts,
    NotFound(String),
}

impl Route {
    pub fn parse(path: &str) -> Route {
        let trimmed = path.trim().trim_end_matches('/');
        let segments: Vec<&str> = trimmed.trim_start_matches('/').split('/').collect();
        match segments.as_slice() {
            ["login"] => Route::Login,
            [""] | ["dashboard"] => Route::Dashboard,
            ["patients"] => Route::Patients,
            ["patients", id] if !id.is_empty() => Route::PatientDetail(id.to_string()),
            ["vital-signs"] => Route::VitalSigns,
            ["medications"] => Route::Medications,
            ["care-plans"] => Route::CarePlans,
            ["alerts"] => Route::Alerts,
            _ => Route::NotFound(path.to_string()),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".into(),
            Route::Dashboard => "/dashboard".into(),
            Route::Patients => "/patients".into(),
            Route::PatientDetail(id) => format!("/patients/{}", id),
            Route::VitalSigns => "/vital-signs".into(),
            Route::Medications => "/medications".into(),
            Route::CarePlans => "/care-plans".into(),
            Route::Alerts => "/alerts".into(),
            Route::NotFound(p) => p.clone(),
        }
    }

    /// Roles that may open the route; `None` means no session is required.
    pub fn allowed_roles(&self) -> Option<&'static [Role]> {
        match self {
            Route::Login | Route::NotFound(_) => None,
            Route::Medications | Route::Alerts => Some(Role::STAFF),
            Route::Dashboard
            | Route::Patients
            | Route::PatientDetail(_)
            | Route::VitalSigns
            | Route::CarePlans => Some(Role::ALL),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItem {
    pub route: Route,
    pub label: &'static str,
}

/// Sidebar entries visible to the current session.
pub fn sidebar(store: &SessionStore) -> Vec<NavItem> {
    let items = [
        (Route::Dashboard, "Dashboard"),
        (Route::Patients, "Patients"),
        (Route::VitalSigns, "Vital signs"),
        (Route::Medications, "Medications"),
        (Route::CarePlans, "Care plans"),
        (Route::Alerts, "Alerts"),
    ];
    items
        .into_iter()
        .filter(|(route, _)| route.allowed_roles().map(|r| store.has_role(r)).unwrap_or(true))
        .map(|(route, label)| NavItem { route, label })
        .collect()
}

#[derive(Debug)]
struct NavState {
    current: Route,
    history: Vec<String>,
    // bumped on every navigation; view scopes compare against it
    visit: u64,
}

pub struct Navigator {
    store: Arc<SessionStore>,
    login_route: String,
    state: RwLock<NavState>,
}

impl Navigator {
    pub fn new<S: Into<String>>(store: Arc<SessionStore>, login_route: S) -> Self {
        Self {
            store,
            login_route: login_route.into(),
            state: RwLock::new(NavState { current: Route::Login, history: Vec::new(), visit: 0 }),
        }
    }

    /// Subscribe to the session store so a logout or a server-side rejection lands on login.
    pub fn attach(self: &Arc<Self>) -> SubscriptionId {
        let weak: Weak<Navigator> = Arc::downgrade(self);
        self.store.subscribe(move |event| {
            if let Some(nav) = weak.upgrade() {
                match event {
                    SessionEvent::Invalidated | SessionEvent::LoggedOut => nav.redirect_to_login(),
                    SessionEvent::LoggedIn { .. } => {}
                }
            }
        })
    }

    pub fn current(&self) -> Route { self.state.read().current.clone() }

    pub fn history(&self) -> Vec<String> { self.state.read().history.clone() }

    pub fn login_route(&self) -> &str { &self.login_route }

    /// Apply the protected-route rules and move to wherever the request resolves.
    pub fn navigate(&self, target: Route) -> Route {
        let resolved = self.resolve(target);
        self.enter(resolved.clone());
        resolved
    }

    /// Like `navigate`, but refuse instead of redirecting.
    pub fn guard(&self, target: &Route) -> ClientResult<()> {
        let Some(roles) = target.allowed_roles() else { return Ok(()); };
        if !self.store.is_authenticated() {
            return Err(ClientError::Unauthorized { message: "login required".into() });
        }
        if !self.store.has_role(roles) {
            return Err(ClientError::Forbidden { target: target.path() });
        }
        Ok(())
    }

    pub fn redirect_to_login(&self) {
        info!(target: "ghcs::nav", route = %self.login_route, "redirecting to login");
        self.enter(Route::Login);
    }

    /// Capture the current visit so a page can drop results that arrive after it was left.
    pub fn scope(&self) -> ViewScope<'_> {
        ViewScope { nav: self, visit: self.state.read().visit }
    }

    fn resolve(&self, target: Route) -> Route {
        let target = match target {
            Route::NotFound(p) => {
                debug!(target: "ghcs::nav", path = %p, "unknown route");
                Route::Dashboard
            }
            other => other,
        };
        let authenticated = self.store.is_authenticated();
        match target.allowed_roles() {
            None if target == Route::Login && authenticated => Route::Dashboard,
            None => target,
            Some(_) if !authenticated => Route::Login,
            Some(roles) if !self.store.has_role(roles) => Route::Dashboard,
            Some(_) => target,
        }
    }

    fn enter(&self, route: Route) {
        let path = match &route {
            Route::Login => self.login_route.clone(),
            other => other.path(),
        };
        let mut st = self.state.write();
        st.current = route;
        st.history.push(path);
        st.visit += 1;
    }
}

pub struct ViewScope<'a> {
    nav: &'a Navigator,
    visit: u64,
}

impl<'a> ViewScope<'a> {
    pub fn is_current(&self) -> bool { self.nav.state.read().visit == self.visit }

    /// Await `fut`; yield its output only if the page is still the one on screen.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        let out = fut.await;
        if self.is_current() {
            Some(out)
        } else {
            debug!(target: "ghcs::nav", "discarding result for a page no longer shown");
            None
        }
    }
}
