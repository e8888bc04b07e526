use crate::agents::AnalysisGateway;
use crate::config::Config;
use crate::db::RecordStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub gateway: Arc<dyn AnalysisGateway>,
    pub config: Arc<Config>,
}

#[cfg(test)]
pub fn test_state_with(
    gateway: crate::agents::stub::StubAgent,
) -> (
    Arc<AppState>,
    Arc<crate::db::memory::MemoryStore>,
    Arc<crate::agents::stub::StubAgent>,
) {
    let store = Arc::new(crate::db::memory::MemoryStore::new());
    let gateway = Arc::new(gateway);
    let state = Arc::new(AppState {
        store: store.clone(),
        gateway: gateway.clone(),
        config: Arc::new(crate::config::test_config()),
    });
    (state, store, gateway)
}

#[cfg(test)]
pub fn test_state() -> (
    Arc<AppState>,
    Arc<crate::db::memory::MemoryStore>,
    Arc<crate::agents::stub::StubAgent>,
) {
    test_state_with(crate::agents::stub::StubAgent::text("This signature reflects..."))
}
