//! Shared handler state.

use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use crate::application::services::RedirectResolver;
use crate::infrastructure::cache::SharedCache;

/// State injected into every HTTP handler.
///
/// All components are constructed by [`crate::server::run`] (or a test) and
/// passed in; nothing here is process-global.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<RedirectResolver>,
    pub shared_cache: Arc<SharedCache>,
    /// Present when a Prometheus recorder was installed.
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(
        resolver: Arc<RedirectResolver>,
        shared_cache: Arc<SharedCache>,
        metrics_handle: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            resolver,
            shared_cache,
            metrics_handle,
        }
    }
}
