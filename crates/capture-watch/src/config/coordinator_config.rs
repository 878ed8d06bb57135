use crate::config::default_channel_capacity;

use serde::{Deserialize, Serialize};

/// Coordinator actor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Inbound channel capacity.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}
