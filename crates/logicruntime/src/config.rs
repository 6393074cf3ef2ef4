use serde::{Deserialize, Serialize};

/// Configuration for the runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Node executions allowed per run before it is aborted as a dead loop
    pub step_ceiling: usize,
    /// Finished runs kept for inspection
    pub history_limit: usize,
    pub event_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            step_ceiling: 1000,
            history_limit: 16,
            event_buffer_size: 1000,
        }
    }
}

impl RuntimeConfig {
    /// Parse a (possibly partial) JSON config; missing fields keep defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = RuntimeConfig::from_json(r#"{"step_ceiling": 5}"#).unwrap();
        assert_eq!(config.step_ceiling, 5);
        assert_eq!(config.history_limit, RuntimeConfig::default().history_limit);
    }
}
