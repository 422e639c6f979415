use std::time::Duration;

use foundation::time::DEFAULT_REFRESH_SECS;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Bound of the command queue between handles and the engine task.
    pub command_capacity: usize,
    /// Used when a view has no usable `refresh_rate`.
    pub default_refresh: Duration,
    /// Entries kept in the engine's event log.
    pub event_capacity: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            command_capacity: 64,
            default_refresh: Duration::from_secs_f64(DEFAULT_REFRESH_SECS),
            event_capacity: runtime::EventBus::DEFAULT_CAPACITY,
        }
    }
}
