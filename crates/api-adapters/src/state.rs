use std::sync::Arc;

use domains::IdentityResolver;
use services::Services;

use crate::metrics::ApiMetrics;

/// Page size defaults applied to `limit` query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
        }
    }
}

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub identity: Arc<dyn IdentityResolver>,
    pub metrics: Arc<ApiMetrics>,
    pub paging: Paging,
}

impl AppState {
    pub fn new(services: Services, identity: Arc<dyn IdentityResolver>, paging: Paging) -> Self {
        Self {
            services,
            identity,
            metrics: Arc::new(ApiMetrics::new()),
            paging,
        }
    }
}
