//! Outbound reporting surfaces.
//!
//! [`AlertSink`] receives human-readable alerts, [`ParamSink`] receives
//! parameter reports. Both are synchronous and cheap: they are called with
//! the state lock released but still on the loop that produced the change.

use std::sync::{Arc, Mutex, PoisonError};

use homeguard_core::{ParamKey, ParamUpdate, ParamValue};
use tracing::info;

/// Destination for alert texts (push notifications, a log, a test record).
pub trait AlertSink: Send + Sync {
    fn report(&self, message: &str);
}

/// Destination for parameter reports.
pub trait ParamSink: Send + Sync {
    fn publish(&self, update: &ParamUpdate);
}

/// Sink that writes everything to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl AlertSink for LogSink {
    fn report(&self, message: &str) {
        info!(target: "homeguard::alert", "{}", message);
    }
}

impl ParamSink for LogSink {
    fn publish(&self, update: &ParamUpdate) {
        info!(target: "homeguard::param", param = %update.key, value = %update.value, "Param reported");
    }
}

/// Sink that keeps everything it receives. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    alerts: Arc<Mutex<Vec<String>>>,
    params: Arc<Mutex<Vec<ParamUpdate>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<String> {
        lock(&self.alerts).clone()
    }

    pub fn params(&self) -> Vec<ParamUpdate> {
        lock(&self.params).clone()
    }

    /// Last reported value of a parameter.
    pub fn last_param(&self, key: ParamKey) -> Option<ParamValue> {
        lock(&self.params)
            .iter()
            .rev()
            .find(|update| update.key == key)
            .map(|update| update.value.clone())
    }

    pub fn clear(&self) {
        lock(&self.alerts).clear();
        lock(&self.params).clear();
    }
}

impl AlertSink for RecordingSink {
    fn report(&self, message: &str) {
        lock(&self.alerts).push(message.to_string());
    }
}

impl ParamSink for RecordingSink {
    fn publish(&self, update: &ParamUpdate) {
        lock(&self.params).push(update.clone());
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_tracks_last_param() {
        let sink = RecordingSink::new();
        let observer = sink.clone();

        sink.publish(&ParamUpdate::new(ParamKey::LightPower, true));
        sink.publish(&ParamUpdate::new(ParamKey::LightPower, false));
        sink.report("Light Turned OFF via App");

        assert_eq!(
            observer.last_param(ParamKey::LightPower),
            Some(ParamValue::Bool(false))
        );
        assert_eq!(observer.last_param(ParamKey::TvPower), None);
        assert_eq!(observer.alerts(), vec!["Light Turned OFF via App"]);

        observer.clear();
        assert!(sink.params().is_empty());
    }
}
