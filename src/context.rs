//! Application context: the single owner of the session store, gateway and navigator.

use std::sync::Arc;

use tracing::info;

use crate::api::Api;
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::gateway::Gateway;
use crate::identity::{FileSlotStorage, MemorySlotStorage, SessionStore, SlotStorage, SubscriptionId};
use crate::nav::Navigator;

pub struct AppContext {
    store: Arc<SessionStore>,
    gateway: Gateway,
    navigator: Arc<Navigator>,
    nav_subscription: SubscriptionId,
}

impl AppContext {
    /// Session slots persisted under `config.state_dir`.
    pub fn init(config: ClientConfig) -> ClientResult<Self> {
        let storage = FileSlotStorage::new(&config.state_dir)?;
        Self::with_storage(config, Arc::new(storage))
    }

    /// Session kept only for the lifetime of the process.
    pub fn ephemeral(config: ClientConfig) -> ClientResult<Self> {
        Self::with_storage(config, Arc::new(MemorySlotStorage::new()))
    }

    pub fn with_storage(config: ClientConfig, storage: Arc<dyn SlotStorage>) -> ClientResult<Self> {
        let store = Arc::new(SessionStore::open(storage));
        let navigator = Arc::new(Navigator::new(store.clone(), config.login_route.clone()));
        let nav_subscription = navigator.attach();
        info!(target: "ghcs", api = %config.api_base_url, authenticated = store.is_authenticated(), "client context ready");
        let gateway = Gateway::new(config, store.clone())?;
        Ok(Self { store, gateway, navigator, nav_subscription })
    }

    pub fn api(&self) -> Api<'_> { Api::new(&self.gateway) }

    pub fn store(&self) -> &Arc<SessionStore> { &self.store }

    pub fn gateway(&self) -> &Gateway { &self.gateway }

    pub fn navigator(&self) -> &Arc<Navigator> { &self.navigator }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        self.store.unsubscribe(self.nav_subscription);
    }
}
