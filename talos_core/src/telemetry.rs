//! Dashboard telemetry
//!
//! One-way, best-effort publishing of named values for operator dashboards
//! and logging. Components register a provider closure per key; `update()`
//! queries every provider once per tick and forwards the values to the
//! attached sinks. A sink failure is logged and dropped; it never affects
//! scheduling.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::TalosResult;

/// A published telemetry value
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryValue {
    Number(f64),
    Boolean(bool),
    Text(String),
}

/// Destination for published values. Implementations must be best-effort:
/// the dashboard logs and discards any error they return.
pub trait TelemetrySink: Send {
    fn publish_number(&mut self, key: &str, value: f64) -> TalosResult<()>;
    fn publish_boolean(&mut self, key: &str, value: bool) -> TalosResult<()>;
    fn publish_text(&mut self, key: &str, value: &str) -> TalosResult<()>;
}

enum Provider {
    Number(Box<dyn Fn() -> f64 + Send>),
    Boolean(Box<dyn Fn() -> bool + Send>),
    Text(Box<dyn Fn() -> String + Send>),
}

/// Registry of named value providers, published to sinks once per tick
#[derive(Default)]
pub struct Dashboard {
    providers: Vec<(String, Provider)>,
    sinks: Vec<Box<dyn TelemetrySink>>,
}

impl Dashboard {
    /// Create an empty dashboard with no sinks
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a sink (builder pattern)
    pub fn with_sink(mut self, sink: Box<dyn TelemetrySink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Attach a sink
    pub fn add_sink(&mut self, sink: Box<dyn TelemetrySink>) {
        self.sinks.push(sink);
    }

    /// Register a numeric value that will be re-queried on every update.
    /// Registering an existing key replaces its provider.
    pub fn add_number<F: Fn() -> f64 + Send + 'static>(&mut self, key: &str, provider: F) {
        self.insert(key, Provider::Number(Box::new(provider)));
    }

    /// Register a boolean value that will be re-queried on every update
    pub fn add_boolean<F: Fn() -> bool + Send + 'static>(&mut self, key: &str, provider: F) {
        self.insert(key, Provider::Boolean(Box::new(provider)));
    }

    /// Register a text value that will be re-queried on every update
    pub fn add_text<F: Fn() -> String + Send + 'static>(&mut self, key: &str, provider: F) {
        self.insert(key, Provider::Text(Box::new(provider)));
    }

    /// Remove a registered value, stopping its updates
    pub fn remove(&mut self, key: &str) {
        self.providers.retain(|(k, _)| k != key);
    }

    /// Number of registered providers
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether no providers are registered
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Query every provider and publish the current values to all sinks
    pub fn update(&mut self) {
        for (key, provider) in &self.providers {
            let value = match provider {
                Provider::Number(f) => TelemetryValue::Number(f()),
                Provider::Boolean(f) => TelemetryValue::Boolean(f()),
                Provider::Text(f) => TelemetryValue::Text(f()),
            };
            for sink in &mut self.sinks {
                publish_to(sink.as_mut(), key, &value);
            }
        }
    }

    /// Publish a one-off number directly, bypassing the provider registry
    pub fn publish_number(&mut self, key: &str, value: f64) {
        for sink in &mut self.sinks {
            publish_to(sink.as_mut(), key, &TelemetryValue::Number(value));
        }
    }

    /// Publish a one-off boolean directly, bypassing the provider registry
    pub fn publish_boolean(&mut self, key: &str, value: bool) {
        for sink in &mut self.sinks {
            publish_to(sink.as_mut(), key, &TelemetryValue::Boolean(value));
        }
    }

    /// Publish a one-off text value directly, bypassing the provider registry
    pub fn publish_text(&mut self, key: &str, value: &str) {
        for sink in &mut self.sinks {
            publish_to(sink.as_mut(), key, &TelemetryValue::Text(value.to_string()));
        }
    }

    fn insert(&mut self, key: &str, provider: Provider) {
        if let Some(slot) = self.providers.iter_mut().find(|(k, _)| k == key) {
            slot.1 = provider;
        } else {
            self.providers.push((key.to_string(), provider));
        }
    }
}

fn publish_to(sink: &mut dyn TelemetrySink, key: &str, value: &TelemetryValue) {
    let result = match value {
        TelemetryValue::Number(v) => sink.publish_number(key, *v),
        TelemetryValue::Boolean(v) => sink.publish_boolean(key, *v),
        TelemetryValue::Text(v) => sink.publish_text(key, v),
    };
    if let Err(e) = result {
        log::warn!("telemetry sink failed publishing '{}': {}", key, e);
    }
}

/// Sink that writes values to the log at debug level
#[derive(Debug, Default)]
pub struct LogSink;

impl TelemetrySink for LogSink {
    fn publish_number(&mut self, key: &str, value: f64) -> TalosResult<()> {
        log::debug!("telemetry {}={}", key, value);
        Ok(())
    }

    fn publish_boolean(&mut self, key: &str, value: bool) -> TalosResult<()> {
        log::debug!("telemetry {}={}", key, value);
        Ok(())
    }

    fn publish_text(&mut self, key: &str, value: &str) -> TalosResult<()> {
        log::debug!("telemetry {}={}", key, value);
        Ok(())
    }
}

/// In-memory sink retaining the latest value per key. The handle returned by
/// [`MemorySink::handle`] stays readable after the sink is boxed into a
/// dashboard, which makes this the sink of choice for tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    values: Arc<Mutex<HashMap<String, TelemetryValue>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared view of the retained values
    pub fn handle(&self) -> Arc<Mutex<HashMap<String, TelemetryValue>>> {
        self.values.clone()
    }
}

impl TelemetrySink for MemorySink {
    fn publish_number(&mut self, key: &str, value: f64) -> TalosResult<()> {
        self.values
            .lock()
            .insert(key.to_string(), TelemetryValue::Number(value));
        Ok(())
    }

    fn publish_boolean(&mut self, key: &str, value: bool) -> TalosResult<()> {
        self.values
            .lock()
            .insert(key.to_string(), TelemetryValue::Boolean(value));
        Ok(())
    }

    fn publish_text(&mut self, key: &str, value: &str) -> TalosResult<()> {
        self.values
            .lock()
            .insert(key.to_string(), TelemetryValue::Text(value.to_string()));
        Ok(())
    }
}
