mod badge_indicator;
mod server;
mod sessions;

use crate::{BadgeIndicator, QueryConsumer, TabSessions};

use capture_watch_core::{
    Coordinator, CoordinatorHandle, Indicator, IndicatorStyle, PipelineTiming,
};

use std::{sync::Arc, time::Duration};

use tokio::sync::Mutex;

/// Coordinator, badges, tab sessions and a consumer wired together.
pub(crate) struct Fixture {
    pub(crate) coordinator: CoordinatorHandle,
    pub(crate) badges: Arc<BadgeIndicator>,
    pub(crate) sessions: Arc<Mutex<TabSessions>>,
    pub(crate) consumer: QueryConsumer,
}

pub(crate) fn fixture() -> Fixture {
    let badges = Arc::new(BadgeIndicator::new());
    let (coordinator, _) = Coordinator::spawn(
        Arc::clone(&badges) as Arc<dyn Indicator>,
        IndicatorStyle::default(),
        16,
    );
    let sessions = Arc::new(Mutex::new(TabSessions::new(
        coordinator.clone(),
        PipelineTiming::default(),
    )));
    let consumer = QueryConsumer::new(coordinator.clone(), Arc::clone(&sessions));

    Fixture {
        coordinator,
        badges,
        sessions,
        consumer,
    }
}

/// Let spawned tasks run. Under a paused clock this also advances time.
pub(crate) async fn settle(millis: u64) {
    tokio::time::sleep(Duration::from_millis(millis)).await;
}
