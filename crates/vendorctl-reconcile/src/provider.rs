use std::sync::Arc;

use vendorctl_api::{HttpVendorApi, VendorApi};
use vendorctl_config::ProviderConfig;

use crate::cluster::ClusterReconciler;
use crate::customer::CustomerReconciler;
use crate::error::{ReconcileError, Result};
use crate::observability::configure_logging;
use crate::wait::{Clock, TokioClock};

/// Dependencies shared by every reconciler, built once at configure time.
#[derive(Clone)]
pub struct Provider {
    api: Arc<dyn VendorApi>,
    clock: Arc<dyn Clock>,
}

impl Provider {
    /// Builds the HTTP gateway from validated configuration and applies
    /// the configured log level.
    pub fn configure(config: &ProviderConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| ReconcileError::validation(e.to_string()))?;
        configure_logging(&config.logging);

        let api = HttpVendorApi::new(&config.endpoint, &config.api_token, config.request_timeout)?;
        tracing::info!(
            endpoint = %api.base_url(),
            timeout = ?config.request_timeout,
            "provider configured"
        );
        Ok(Self::with_api(Arc::new(api)))
    }

    pub fn with_api(api: Arc<dyn VendorApi>) -> Self {
        Self {
            api,
            clock: Arc::new(TokioClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn api(&self) -> &Arc<dyn VendorApi> {
        &self.api
    }

    pub fn clusters(&self) -> ClusterReconciler {
        ClusterReconciler::new(Arc::clone(&self.api), Arc::clone(&self.clock))
    }

    pub fn customers(&self) -> CustomerReconciler {
        CustomerReconciler::new(Arc::clone(&self.api))
    }
}
