use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;
use crate::utils::error::{PoolError, Result};

/// Install the global tracing subscriber from logging configuration.
///
/// Call once from the composition root; embedders with their own
/// subscriber can skip this entirely.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_new(&config.level)
        .map_err(|e| PoolError::Config(format!("Invalid log level: {}", e)))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => registry.with(fmt::layer().json()).init(),
        _ => registry.with(fmt::layer()).init(),
    }

    Ok(())
}

/// What happened to a pooled connection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Removed from the registry by maintenance and closed.
    Evicted,
    /// Dropped on a request path without ever (re)entering the registry.
    Discarded,
}

/// Single pool lifecycle event describing an operational observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// In-memory history of pool events that can be queried for observability.
#[derive(Debug)]
pub struct EventHistory {
    events: Mutex<VecDeque<PoolEvent>>,
    max_events: usize,
    max_age: ChronoDuration,
}

impl EventHistory {
    /// Create a new event history buffer.
    pub fn new(max_events: usize, retention_hours: u64) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events.max(1))),
            max_events: max_events.max(1),
            max_age: ChronoDuration::hours(retention_hours as i64),
        }
    }

    /// Record an event, trimming the buffer by age and size.
    pub fn record_event(
        &self,
        kind: EventKind,
        address: impl ToString,
        details: Option<Value>,
    ) {
        let event = PoolEvent {
            timestamp: Utc::now(),
            kind,
            address: address.to_string(),
            details,
        };

        let mut events = self.events.lock().unwrap();

        // Drop expired events first.
        let cutoff = Utc::now() - self.max_age;
        while let Some(front) = events.front() {
            if front.timestamp < cutoff {
                events.pop_front();
            } else {
                break;
            }
        }

        events.push_back(event);

        while events.len() > self.max_events {
            events.pop_front();
        }
    }

    /// Return all retained events.
    pub fn get_events(&self) -> Vec<PoolEvent> {
        let events = self.events.lock().unwrap();
        events.iter().cloned().collect()
    }

    /// Return events recorded within the last `minutes`.
    pub fn get_events_since(&self, minutes: i64) -> Vec<PoolEvent> {
        let events = self.events.lock().unwrap();
        let cutoff = Utc::now() - ChronoDuration::minutes(minutes);

        events
            .iter()
            .filter(|event| event.timestamp >= cutoff)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn history_trims_to_capacity() {
        let history = EventHistory::new(3, 24);
        for i in 0..5 {
            history.record_event(EventKind::Evicted, format!("http://host-{}:80", i), None);
        }

        let events = history.get_events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].address, "http://host-2:80");
        assert_eq!(events[2].address, "http://host-4:80");
    }

    #[test]
    fn events_serialize_with_details() {
        let history = EventHistory::new(8, 24);
        history.record_event(
            EventKind::Evicted,
            "http://example.com:80",
            Some(json!({"reason": "expired"})),
        );

        let events = history.get_events_since(1);
        assert_eq!(events.len(), 1);

        let encoded = serde_json::to_value(&events[0]).unwrap();
        assert_eq!(encoded["kind"], "evicted");
        assert_eq!(encoded["details"]["reason"], "expired");
    }
}
