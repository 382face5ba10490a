//! Shared application state for the notification gateway.
//!
//! Owns the hub handle (passed by handle to every caller, never a global),
//! the metrics registry, and the validated config.

use std::sync::Arc;
use std::time::Instant;

use notifyhub_core::error::Result;

use crate::config::GatewayConfig;
use crate::obs::metrics::GatewayMetrics;
use crate::realtime::Hub;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    hub: Hub,
    metrics: Arc<GatewayMetrics>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    started: Instant,
}

impl AppState {
    /// Build application state and start the hub control loop.
    /// Must run inside a tokio runtime.
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        cfg.validate()?;

        let metrics = Arc::new(GatewayMetrics::default());
        let hub = Hub::spawn(&cfg.hub, Arc::clone(&metrics));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                started: Instant::now(),
            }),
            hub,
            metrics,
        })
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    pub fn metrics(&self) -> Arc<GatewayMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.inner.started.elapsed().as_secs()
    }

    pub fn is_draining(&self) -> bool {
        self.metrics.is_draining()
    }

    /// Stop accepting work: readiness flips to draining and the hub drops
    /// every connection.
    pub fn begin_shutdown(&self) {
        self.metrics.set_draining();
        self.hub.shutdown();
    }

    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        vec![("notifyhub_uptime_seconds", self.uptime_secs())]
    }
}
