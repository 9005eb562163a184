use std::time::Duration;

/// Simulator configuration, defaults overridable from the environment.
#[derive(Clone, Debug)]
pub struct SimConfig {
    /// Delay between published events
    pub tick: Duration,
    /// Number of events to publish before exiting
    pub event_count: usize,
    /// Per-subscription channel capacity
    pub bus_capacity: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(1500),
            event_count: 12,
            bus_capacity: 64,
        }
    }
}

impl SimConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            tick: std::env::var("NOTIFY_SIM_TICK_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.tick),
            event_count: std::env::var("NOTIFY_SIM_EVENT_COUNT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.event_count),
            bus_capacity: std::env::var("NOTIFY_SIM_BUS_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.bus_capacity),
        }
    }
}
