mod indicator;
mod registry;
mod service;

pub use {
    indicator::{
        DEFAULT_INDICATOR_COLOR, DEFAULT_RECORDING_TEXT, Indicator, IndicatorState,
        IndicatorStyle,
    },
    registry::{CLOSED_TAB_LIMIT, TabRegistry},
    service::{
        Coordinator, CoordinatorHandle, CoordinatorLink, CoordinatorMessage,
        DEFAULT_CHANNEL_CAPACITY,
    },
};
