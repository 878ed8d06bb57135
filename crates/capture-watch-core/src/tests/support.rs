use crate::{
    Coordinator, CoordinatorHandle, Indicator, IndicatorState, IndicatorStyle, PipelineTiming,
    TabId,
    status::{StatusChange, StatusEngine, new_listener},
};

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

/// Indicator that remembers every update it was asked to show.
#[derive(Default)]
pub(crate) struct RecordingIndicator {
    updates: Mutex<Vec<(TabId, IndicatorState)>>,
}

impl RecordingIndicator {
    pub(crate) fn updates(&self) -> Vec<(TabId, IndicatorState)> {
        self.updates
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub(crate) fn texts_for(&self, tab_id: TabId) -> Vec<String> {
        self.updates()
            .into_iter()
            .filter(|(tab, _)| *tab == tab_id)
            .map(|(_, state)| state.text)
            .collect()
    }
}

impl Indicator for RecordingIndicator {
    fn apply(&self, tab_id: TabId, state: &IndicatorState) {
        self.updates
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((tab_id, state.clone()));
    }
}

pub(crate) fn spawn_coordinator() -> (CoordinatorHandle, Arc<RecordingIndicator>) {
    let indicator = Arc::new(RecordingIndicator::default());
    let (handle, _) = Coordinator::spawn(
        Arc::clone(&indicator) as Arc<dyn Indicator>,
        IndicatorStyle::default(),
        16,
    );
    (handle, indicator)
}

/// Collect every transition an engine emits.
pub(crate) fn collect_changes(engine: &StatusEngine) -> Arc<Mutex<Vec<StatusChange>>> {
    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&changes);
    engine.subscribe(new_listener(move |change| {
        sink.lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(change.clone());
    }));
    changes
}

pub(crate) fn timing() -> PipelineTiming {
    PipelineTiming::default()
}

/// Let spawned tasks run. Under a paused clock this also advances time.
pub(crate) async fn settle(millis: u64) {
    tokio::time::sleep(Duration::from_millis(millis)).await;
}
