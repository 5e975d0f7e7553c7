use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use event_staffing::config::TransportConfig;
use event_staffing::workflows::staffing::{InMemoryStaffingStore, StaffingEngine};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Engine over a fresh process-local store.
pub(crate) fn in_memory_engine(
    transport: TransportConfig,
) -> (Arc<StaffingEngine<InMemoryStaffingStore>>, Arc<InMemoryStaffingStore>) {
    let store = Arc::new(InMemoryStaffingStore::new());
    let engine = Arc::new(StaffingEngine::new(
        store.clone(),
        transport.downgrade_ratio,
    ));
    (engine, store)
}
