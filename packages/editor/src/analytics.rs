//! Product analytics hooks.

/// Sink for named usage events.
pub trait Analytics: Send + Sync {
    fn capture(&self, event: &str);
}

/// Records every event as a `tracing` info record.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAnalytics;

impl Analytics for TracingAnalytics {
    fn capture(&self, event: &str) {
        tracing::info!(target: "onlook::analytics", event, "captured analytics event");
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAnalytics;

impl Analytics for NoopAnalytics {
    fn capture(&self, _event: &str) {}
}
