use crate::config::{
    default_demo_enabled, default_demo_exit_when_done, default_demo_step_delay_ms,
};

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Scripted demo session over simulated tabs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Run the demo session at startup.
    #[serde(default = "default_demo_enabled")]
    pub enabled: bool,

    /// Pause between demo steps, in milliseconds.
    #[serde(default = "default_demo_step_delay_ms")]
    pub step_delay_ms: u64,

    /// Shut the application down once the demo has finished.
    #[serde(default = "default_demo_exit_when_done")]
    pub exit_when_done: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            enabled: default_demo_enabled(),
            step_delay_ms: default_demo_step_delay_ms(),
            exit_when_done: default_demo_exit_when_done(),
        }
    }
}

impl DemoConfig {
    /// Pause between demo steps.
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }
}
